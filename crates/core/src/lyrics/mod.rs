// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Lyrics as delivered in TTML documents.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lyrics {
    pub text: String,

    /// The text carries timing information, i.e. is a TTML document
    pub synced: bool,
}

impl Lyrics {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            synced: false,
        }
    }

    /// Import lyrics from a TTML document.
    ///
    /// Documents without timing are converted to plain text.
    #[must_use]
    pub fn from_ttml(ttml: &str) -> Self {
        if has_timing(ttml) {
            Self {
                text: ttml.to_owned(),
                synced: true,
            }
        } else {
            Self::plain(ttml_to_text(ttml))
        }
    }

    /// Import lyrics from either TTML or plain text.
    #[must_use]
    pub fn detect(input: &str) -> Self {
        if is_ttml(input) {
            Self::from_ttml(input)
        } else {
            Self::plain(input.trim())
        }
    }
}

static UNTIMED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itunes:timing=['"]None"#).expect("valid regex"));

static SONGWRITER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<songwriter>([^<]+)</songwriter>").expect("valid regex"));

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*<\s*br\s*/?\s*>\s*").expect("valid regex"));

static PARAGRAPH_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*/\s*p\s*>\s*<\s*p[^>]*>").expect("valid regex"));

static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static MARKUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("valid regex"));

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#(?P<dec>[0-9]+)|#[xX](?P<hex>[0-9a-fA-F]+)|(?P<name>[a-zA-Z]+));")
        .expect("valid regex")
});

static SECONDS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<offset>\d+(?:\.\d+)?)s?$").expect("valid regex"));

static CLOCK_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<h>\d+):)?(?P<m>\d{1,2}):(?P<s>\d\d(?:[.:]\d+)?)$").expect("valid regex")
});

#[must_use]
pub fn is_ttml(input: &str) -> bool {
    input.trim_start().starts_with('<') && input.contains("<tt")
}

#[must_use]
pub fn has_timing(ttml: &str) -> bool {
    !UNTIMED_REGEX.is_match(ttml)
}

/// Convert an untimed TTML document to plain text.
///
/// Songwriters are prepended as `Written By:` lines and verses are
/// separated by an empty line.
#[must_use]
pub fn ttml_to_text(ttml: &str) -> String {
    let html = SONGWRITER_REGEX.replace_all(ttml, "Written By: $1<br/>");
    let html = html.replace("<div", "<br/><br/><div");
    clean_html(&html)
}

fn clean_html(html: &str) -> String {
    let text = html.replace('\n', " ");
    let text = LINE_BREAK_REGEX.replace_all(&text, "\n");
    let text = PARAGRAPH_BREAK_REGEX.replace_all(&text, "\n");
    let text = MARKUP_REGEX.replace_all(&text, "");
    let text = BLANK_LINES_REGEX.replace_all(&text, "\n\n");
    unescape_entities(&text).trim().to_owned()
}

fn unescape_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |captures: &regex::Captures<'_>| {
            let decoded = if let Some(dec) = captures.name("dec") {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = captures.name("hex") {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                match captures.name("name").map(|name| name.as_str()) {
                    Some("amp") => Some('&'),
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    Some("nbsp") => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| captures[0].to_owned(), String::from)
        })
        .into_owned()
}

/// Parse a TTML time expression into seconds.
///
/// Besides offsets like `12.5s` the clock times published by music
/// catalogs are accepted, including a colon as fraction separator,
/// e.g. `1:01.100` or `00:01:100`.
#[must_use]
pub fn parse_time_expr(expr: &str) -> Option<f64> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }
    if let Some(captures) = SECONDS_REGEX.captures(expr) {
        return captures["offset"].parse().ok();
    }
    let captures = CLOCK_TIME_REGEX.captures(expr)?;
    let hours = captures
        .name("h")
        .map_or(Ok(0), |hours| hours.as_str().parse::<u32>())
        .ok()?;
    let minutes = captures["m"].parse::<u32>().ok()?;
    let seconds = captures["s"].replace(':', ".").parse::<f64>().ok()?;
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}
