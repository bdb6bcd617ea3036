// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Raw and canonical tag records.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
};

use strum::IntoStaticStr;

use crate::{
    credits::{CreditVariant, Credits},
    lyrics::Lyrics,
    normalize::Rating,
    thumbnail::ThumbnailSource,
};

mod builder;
pub use self::builder::{BuiltTagRecord, build_canonical_record};

///////////////////////////////////////////////////////////////////////
// RawValue
///////////////////////////////////////////////////////////////////////

/// A loosely typed value as delivered by an extractor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    /// Non-empty text, trimmed.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.trim()).filter(|text| !text.is_empty()),
            _ => None,
        }
    }

    /// Integers, integral floats and decimal text.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                Some(*value as i64)
            }
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Null, blank text and empty collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(values) => values.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Bool(_) | Self::Integer(_) | Self::Float(_) => false,
        }
    }
}

impl From<&str> for RawValue {
    fn from(from: &str) -> Self {
        Self::Text(from.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(from: String) -> Self {
        Self::Text(from)
    }
}

impl From<i64> for RawValue {
    fn from(from: i64) -> Self {
        Self::Integer(from)
    }
}

impl From<u32> for RawValue {
    fn from(from: u32) -> Self {
        Self::Integer(from.into())
    }
}

impl From<f64> for RawValue {
    fn from(from: f64) -> Self {
        Self::Float(from)
    }
}

impl From<bool> for RawValue {
    fn from(from: bool) -> Self {
        Self::Bool(from)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(from: Vec<T>) -> Self {
        Self::List(from.into_iter().map(Into::into).collect())
    }
}

///////////////////////////////////////////////////////////////////////
// RawMetadataRecord
///////////////////////////////////////////////////////////////////////

/// Prefix of fields that override their unprefixed counterparts.
pub const META_FIELD_PREFIX: &str = "meta_";

/// Key of the unlabelled credits.
pub const CREDITS_KEY: &str = "credits";

/// Prefix of localized credits, followed by a language tag, e.g. `credits_de`.
pub const LOCALIZED_CREDITS_KEY_PREFIX: &str = "credits_";

/// Metadata of a single media item as produced by an extractor.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RawMetadataRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawMetadataRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with_credits(mut self, language: Option<&str>, roles: &Credits) -> Self {
        let key = language.map_or_else(
            || CREDITS_KEY.to_owned(),
            |language| format!("{LOCALIZED_CREDITS_KEY_PREFIX}{language}"),
        );
        let roles = roles
            .iter()
            .map(|(role, names)| {
                let names = names.iter().map(|name| RawValue::from(name.as_str()));
                (role.clone(), RawValue::List(names.collect()))
            })
            .collect();
        self.fields.insert(key, RawValue::Map(roles));
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The overriding `meta_<key>` field followed by `<key>`.
    fn candidates<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a RawValue> + 'a {
        let meta_key = format!("{META_FIELD_PREFIX}{key}");
        let key = key.to_owned();
        [meta_key, key]
            .into_iter()
            .filter_map(move |key| self.fields.get(&key))
    }

    /// The first non-empty text of `meta_<key>` or `<key>`.
    #[must_use]
    pub fn resolve_text(&self, key: &str) -> Option<&str> {
        self.candidates(key).find_map(RawValue::as_text)
    }

    /// The first integer of `meta_<key>` or `<key>`.
    #[must_use]
    pub fn resolve_integer(&self, key: &str) -> Option<i64> {
        self.candidates(key).find_map(RawValue::as_integer)
    }

    /// The first integer of the list field `<key>`.
    #[must_use]
    pub fn first_list_integer(&self, key: &str) -> Option<i64> {
        self.get(key)
            .and_then(RawValue::as_list)
            .and_then(<[RawValue]>::first)
            .and_then(RawValue::as_integer)
    }

    /// All credit variants, localized ones first.
    #[must_use]
    pub fn credit_variants(&self) -> Vec<CreditVariant> {
        let localized = self.fields.iter().filter_map(|(key, value)| {
            let language = key.strip_prefix(LOCALIZED_CREDITS_KEY_PREFIX)?;
            Some(credit_variant(Some(language), value))
        });
        let unlabelled = self
            .get(CREDITS_KEY)
            .map(|value| credit_variant(None, value));
        localized.chain(unlabelled).collect()
    }

    /// Paths of thumbnails that have been written to disk.
    #[must_use]
    pub fn thumbnail_paths(&self) -> Vec<PathBuf> {
        self.get("thumbnails")
            .and_then(RawValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(RawValue::as_map)
            .filter_map(|thumbnail| thumbnail.get("filepath").and_then(RawValue::as_text))
            .map(PathBuf::from)
            .collect()
    }

    /// Inline lyrics, either plain text or TTML.
    ///
    /// The `lyrics` field takes precedence over lyrics delivered as
    /// subtitles.
    #[must_use]
    pub fn lyrics_source(&self) -> Option<&str> {
        if let Some(lyrics) = self.resolve_text("lyrics") {
            return Some(lyrics);
        }
        let subtitles = self.get("subtitles").and_then(RawValue::as_map)?;
        ["lyrics", "syllable-lyrics"].into_iter().find_map(|key| {
            subtitles
                .get(key)
                .and_then(RawValue::as_list)
                .unwrap_or_default()
                .iter()
                .filter_map(RawValue::as_map)
                .find_map(|entry| entry.get("data").and_then(RawValue::as_text))
        })
    }
}

fn credit_variant(language: Option<&str>, value: &RawValue) -> CreditVariant {
    let roles = value
        .as_map()
        .into_iter()
        .flatten()
        .map(|(role, names)| {
            let names = match names {
                RawValue::List(names) => names
                    .iter()
                    .filter_map(RawValue::as_text)
                    .map(ToOwned::to_owned)
                    .collect(),
                names => names.as_text().map(ToOwned::to_owned).into_iter().collect(),
            };
            (role.clone(), names)
        })
        .collect();
    CreditVariant {
        language: language.map(ToOwned::to_owned),
        roles,
    }
}

///////////////////////////////////////////////////////////////////////
// Field
///////////////////////////////////////////////////////////////////////

/// An embeddable field of the canonical tag record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Title,
    Album,
    Artist,
    AlbumArtist,
    Composer,
    Genre,
    ReleaseDate,
    Compilation,
    Rating,
    Copyright,
    TrackNumber,
    DiscNumber,
    Language,
    CodecLabel,
    Thumbnail,
    Lyrics,
    RecordLabel,
    Isrc,
    Upc,
    AlbumId,
    ContentId,
    ArtistId,
    GenreId,
    StorefrontId,
    Credit(String),
}

impl Field {
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Credit(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit(role) => write!(f, "credit:{role}"),
            field => f.write_str(field.into()),
        }
    }
}

pub type FieldSet = BTreeSet<Field>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The value contains characters outside the supported character set.
    UnsupportedCharacters,

    /// None of the selected backends is able to express the field.
    UnsupportedByBackend,

    /// The referenced file does not exist.
    SourceMissing,

    /// The backend that was responsible for the field failed.
    BackendFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedCharacters => f.write_str("unsupported characters"),
            Self::UnsupportedByBackend => f.write_str("unsupported by the selected backends"),
            Self::SourceMissing => f.write_str("source file is missing"),
            Self::BackendFailed(message) => write!(f, "backend failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    pub field: Field,
    pub reason: SkipReason,
}

impl SkippedField {
    #[must_use]
    pub const fn new(field: Field, reason: SkipReason) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for SkippedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { field, reason } = self;
        write!(f, "{field}: {reason}")
    }
}

///////////////////////////////////////////////////////////////////////
// CanonicalTagRecord
///////////////////////////////////////////////////////////////////////

/// The normalized, embedding-ready metadata of a single media item.
///
/// Absent values are never embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanonicalTagRecord {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,

    /// Formatted as `YYYY-MM-DD`
    pub release_date: Option<String>,

    pub copyright: Option<String>,
    pub compilation: Option<bool>,

    pub track_number: Option<u32>,
    pub track_count: Option<u32>,

    /// Only present for releases with more than one disc
    pub disc_number: Option<u32>,

    pub codec_label: Option<String>,
    pub rating: Option<Rating>,
    pub lyrics: Option<Lyrics>,

    /// Role label → person names
    pub credits: Credits,

    pub thumbnail: Option<ThumbnailSource>,

    /// Audio language
    pub language: Option<String>,

    pub record_label: Option<String>,
    pub isrc: Option<String>,
    pub upc: Option<String>,

    // Catalog ids
    pub album_id: Option<i64>,
    pub content_id: Option<i64>,
    pub artist_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub storefront_id: Option<i64>,

    /// File extension of the media file, e.g. `m4a`
    pub ext: Option<String>,

    /// Audio codec as reported by the extractor, e.g. `ec-3`
    pub acodec: Option<String>,
}

impl CanonicalTagRecord {
    /// All fields with a value.
    #[must_use]
    pub fn fields(&self) -> FieldSet {
        let Self {
            title,
            album,
            artist,
            album_artist,
            composer,
            genre,
            release_date,
            copyright,
            compilation,
            track_number,
            track_count: _,
            disc_number,
            codec_label,
            rating,
            lyrics,
            credits,
            thumbnail,
            language,
            record_label,
            isrc,
            upc,
            album_id,
            content_id,
            artist_id,
            genre_id,
            storefront_id,
            ext: _,
            acodec: _,
        } = self;
        let present = [
            (title.is_some(), Field::Title),
            (album.is_some(), Field::Album),
            (artist.is_some(), Field::Artist),
            (album_artist.is_some(), Field::AlbumArtist),
            (composer.is_some(), Field::Composer),
            (genre.is_some(), Field::Genre),
            (release_date.is_some(), Field::ReleaseDate),
            (compilation.is_some(), Field::Compilation),
            (rating.is_some(), Field::Rating),
            (copyright.is_some(), Field::Copyright),
            (track_number.is_some(), Field::TrackNumber),
            (disc_number.is_some(), Field::DiscNumber),
            (language.is_some(), Field::Language),
            (codec_label.is_some(), Field::CodecLabel),
            (
                thumbnail.as_ref().is_some_and(|source| !source.is_empty()),
                Field::Thumbnail,
            ),
            (lyrics.is_some(), Field::Lyrics),
            (record_label.is_some(), Field::RecordLabel),
            (isrc.is_some(), Field::Isrc),
            (upc.is_some(), Field::Upc),
            (album_id.is_some(), Field::AlbumId),
            (content_id.is_some(), Field::ContentId),
            (artist_id.is_some(), Field::ArtistId),
            (genre_id.is_some(), Field::GenreId),
            (storefront_id.is_some(), Field::StorefrontId),
        ];
        present
            .into_iter()
            .filter_map(|(is_present, field)| is_present.then_some(field))
            .chain(credits.keys().cloned().map(Field::Credit))
            .collect()
    }

    /// `n/total` or `n`
    #[must_use]
    pub fn track_position(&self) -> Option<String> {
        let number = self.track_number?;
        Some(match self.track_count {
            Some(count) => format!("{number}/{count}"),
            None => number.to_string(),
        })
    }
}

#[cfg(test)]
mod tests;
