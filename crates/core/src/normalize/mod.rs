// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::LazyLock;

use regex::Regex;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Prefix for numbering files and titles by disc.
///
/// Single-disc releases are not numbered.
#[must_use]
pub fn disc_prefix(disc_number: Option<u32>) -> String {
    match disc_number {
        None | Some(1) => String::new(),
        Some(disc_number) => format!("{disc_number}-"),
    }
}

/// Content advisory rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, Display, EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rating {
    Explicit,
    Clean,
}

impl Rating {
    pub const EXPLICIT_AGE_LIMIT: i64 = 18;
    pub const CLEAN_AGE_LIMIT: i64 = 0;

    /// Only the two age limits reported by music catalogs are mapped.
    #[must_use]
    pub const fn from_age_limit(age_limit: Option<i64>) -> Option<Self> {
        match age_limit {
            Some(Self::EXPLICIT_AGE_LIMIT) => Some(Self::Explicit),
            Some(Self::CLEAN_AGE_LIMIT) => Some(Self::Clean),
            _ => None,
        }
    }

    /// Value of the iTunes content advisory (`rtng`) tag.
    #[must_use]
    pub const fn itunes_advisory(self) -> u8 {
        match self {
            Self::Explicit => 1,
            Self::Clean => 2,
        }
    }
}

static RELEASE_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<year>\d{4})-?(?P<month>\d{2})-?(?P<day>\d{2})(?:$|[T ])")
        .expect("valid release date pattern")
});

/// Normalize a release date into the `YYYY-MM-DD` format.
///
/// Accepts `YYYYMMDD`, `YYYY-MM-DD` and date-time strings starting
/// with a date.
#[must_use]
pub fn normalize_release_date(input: &str) -> Option<String> {
    let captures = RELEASE_DATE_REGEX.captures(input.trim())?;
    let year = &captures["year"];
    let month = &captures["month"];
    let day = &captures["day"];
    let month_valid = month.parse::<u8>().is_ok_and(|month| (1..=12).contains(&month));
    let day_valid = day.parse::<u8>().is_ok_and(|day| (1..=31).contains(&day));
    (month_valid && day_valid).then(|| format!("{year}-{month}-{day}"))
}

#[cfg(test)]
mod tests;
