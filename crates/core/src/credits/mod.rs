// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::BTreeMap;

use crate::locale::primary_language;

/// Role label → person names
pub type Credits = BTreeMap<String, Vec<String>>;

/// Credits as delivered for a single language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditVariant {
    /// `None` for the unlabelled default variant
    pub language: Option<String>,
    pub roles: Credits,
}

impl CreditVariant {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.values().all(|names| names.iter().all(|name| name.trim().is_empty()))
    }
}

/// Role labels are restricted to ISO-8859-1 without control characters.
#[must_use]
pub fn is_supported_char(ch: char) -> bool {
    (ch as u32) <= 0xFF && !ch.is_control()
}

#[must_use]
pub fn is_supported_role_label(label: &str) -> bool {
    !label.trim().is_empty() && label.chars().all(is_supported_char)
}

/// Select the credits for a language.
///
/// Variants are matched by exact language tag, then by primary
/// language subtag and finally the unlabelled variant is used.
/// Empty variants never match.
#[must_use]
pub fn select_credit_variant<'a>(
    variants: &'a [CreditVariant],
    language: &str,
) -> Option<&'a CreditVariant> {
    let candidates = || variants.iter().filter(|variant| !variant.is_empty());
    candidates()
        .find(|variant| {
            variant
                .language
                .as_deref()
                .is_some_and(|tag| tag.eq_ignore_ascii_case(language))
        })
        .or_else(|| {
            let primary = primary_language(language);
            candidates().find(|variant| {
                variant
                    .language
                    .as_deref()
                    .is_some_and(|tag| primary_language(tag).eq_ignore_ascii_case(primary))
            })
        })
        .or_else(|| candidates().find(|variant| variant.language.is_none()))
}

/// Split credits into supported entries and rejected role labels.
///
/// Names are trimmed and empty names are removed. Roles without
/// any remaining names are omitted entirely.
#[must_use]
pub fn partition_credits(roles: &Credits) -> (Credits, Vec<String>) {
    let mut supported = Credits::new();
    let mut rejected = Vec::new();
    for (role, names) in roles {
        let names = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if names.is_empty() {
            continue;
        }
        let role = role.trim();
        if is_supported_role_label(role) {
            supported.entry(role.to_owned()).or_default().extend(names);
        } else {
            rejected.push(role.to_owned());
        }
    }
    (supported, rejected)
}
