// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Classification of raw codec and format strings into display labels.

use std::sync::LazyLock;

use itertools::Itertools as _;
use regex::{NoExpand, Regex};

/// A single rewrite step of the classification cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecRule {
    pub label: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// The classification cascade, applied strictly in this order.
///
/// Each rule operates on the output of its predecessor. The lossless and
/// Atmos rules must precede the AAC rule, otherwise strings that mention
/// an AAC profile code would be misclassified.
pub const CODEC_RULES: [CodecRule; 6] = [
    CodecRule {
        label: "ALAC",
        pattern: r"(?i)^.*alac$",
        replacement: "ALAC",
    },
    CodecRule {
        label: "Dolby Atmos",
        pattern: r"(?i)^.*(?:\bec-3|\be-?ac-?3)$",
        replacement: "Dolby Atmos",
    },
    CodecRule {
        label: "AAC",
        pattern: r"(?i)^.*\bmp4a\.40\.2\b.*$",
        replacement: "AAC",
    },
    CodecRule {
        label: "Dolby Surround",
        pattern: r"(?i)^.*\bac-?3$",
        replacement: "Dolby Surround",
    },
    CodecRule {
        label: "HE-AAC",
        pattern: r"(?i)^.*\bmp4a\.40\.(?:5|29)\b.*$",
        replacement: "HE-AAC",
    },
    CodecRule {
        label: "",
        pattern: r"(?i) ?\bnone$",
        replacement: "",
    },
];

static COMPILED_CODEC_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CODEC_RULES
        .iter()
        .map(|rule| {
            let regex = Regex::new(rule.pattern).expect("valid codec rule pattern");
            (regex, rule.replacement)
        })
        .collect()
});

/// Compose the classifier input from a format note and an audio codec.
///
/// Absent or blank parts are omitted.
#[must_use]
pub fn compose_codec_source(format_note: Option<&str>, acodec: Option<&str>) -> String {
    [format_note, acodec]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .join(" ")
}

/// Classify a raw codec string into a display label.
///
/// Never fails. Input that matches no rule is returned unchanged.
#[must_use]
pub fn classify_codec(raw: &str) -> String {
    COMPILED_CODEC_RULES
        .iter()
        .fold(raw.trim().to_owned(), |label, (regex, replacement)| {
            regex.replace(&label, NoExpand(replacement)).into_owned()
        })
}

/// The bracketed annotation for a codec label, e.g. `[ALAC]`.
#[must_use]
pub fn codec_annotation(label: &str) -> Option<String> {
    let label = label.trim();
    (!label.is_empty()).then(|| format!("[{label}]"))
}

/// Audio codecs of the Dolby Digital Plus family.
#[must_use]
pub fn is_eac3_codec(acodec: &str) -> bool {
    matches!(acodec, "ec-3" | "eac3")
}

/// Derive a format note from the attributes of an audio stream variant.
///
/// Known channel layouts take precedence over the bit depth.
#[must_use]
pub fn stream_format_note(bit_depth: Option<u32>, channels: Option<&str>) -> Option<String> {
    let layout_note = channels.and_then(|channels| match channels {
        "16/JOC" => Some("Dolby Atmos"),
        "2/-/DOWNMIX" => Some("Downmix"),
        "2/-/BINAURAL" => Some("Binaural"),
        _ => None,
    });
    if let Some(note) = layout_note {
        return Some(note.to_owned());
    }
    bit_depth
        .filter(|depth| *depth > 0)
        .map(|depth| format!("{depth}-bit"))
}
