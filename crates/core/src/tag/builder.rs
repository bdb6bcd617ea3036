// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::{
    codec::{classify_codec, compose_codec_source},
    credits::{Credits, partition_credits, select_credit_variant},
    locale::{LocaleContext, language_code_or_none},
    lyrics::Lyrics,
    normalize::{Rating, normalize_release_date},
    thumbnail::ThumbnailSource,
};

use super::{CanonicalTagRecord, Field, RawMetadataRecord, SkipReason, SkippedField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTagRecord {
    pub record: CanonicalTagRecord,

    /// Values that have been dropped while building the record
    pub skipped: Vec<SkippedField>,
}

/// Build the canonical tag record of a media item.
///
/// Each field is resolved from `meta_<key>` before `<key>` and the first
/// usable value wins. Credits are selected for the effective language of
/// `locale`. Credit roles with unsupported characters are dropped and
/// reported in [`BuiltTagRecord::skipped`].
#[must_use]
pub fn build_canonical_record(raw: &RawMetadataRecord, locale: &LocaleContext) -> BuiltTagRecord {
    let text = |key: &str| raw.resolve_text(key).map(ToOwned::to_owned);
    let positive = |key: &str| {
        raw.resolve_integer(key)
            .and_then(|value| u32::try_from(value).ok())
            .filter(|value| *value > 0)
    };

    let disc_count = positive("disc_count").or_else(|| positive("disc_total"));
    let disc_number = positive("disc_number")
        .filter(|number| disc_count.map_or(*number > 1, |count| count > 1));

    let codec_source =
        compose_codec_source(raw.resolve_text("format_note"), raw.resolve_text("acodec"));
    let codec_label = Some(classify_codec(&codec_source)).filter(|label| !label.is_empty());

    let (credits, skipped) = select_credits(raw, locale);

    let thumbnail = Some(ThumbnailSource {
        candidates: raw.thumbnail_paths(),
    })
    .filter(|source| !source.is_empty());

    let record = CanonicalTagRecord {
        title: text("title"),
        album: text("album"),
        artist: text("artist"),
        album_artist: text("album_artist"),
        composer: text("composer"),
        genre: text("genre"),
        release_date: raw
            .resolve_text("release_date")
            .and_then(normalize_release_date),
        copyright: text("copyright"),
        compilation: raw
            .resolve_text("album_type")
            .map(|album_type| album_type.eq_ignore_ascii_case("compilation")),
        track_number: positive("track_number"),
        track_count: positive("track_count"),
        disc_number,
        codec_label,
        rating: Rating::from_age_limit(raw.resolve_integer("age_limit")),
        lyrics: raw.lyrics_source().map(Lyrics::detect),
        credits,
        thumbnail,
        language: raw
            .resolve_text("language")
            .and_then(language_code_or_none)
            .map(ToOwned::to_owned),
        record_label: text("record_label"),
        isrc: text("isrc"),
        upc: text("upc"),
        album_id: raw.resolve_integer("album_id"),
        content_id: raw.resolve_integer("id"),
        artist_id: raw
            .resolve_integer("artist_id")
            .or_else(|| raw.first_list_integer("artist_ids")),
        genre_id: raw
            .resolve_integer("genre_id")
            .or_else(|| raw.first_list_integer("genre_ids")),
        storefront_id: raw
            .resolve_integer("storefront_id")
            .or_else(|| locale.storefront_id().map(i64::from)),
        ext: text("ext"),
        acodec: text("acodec"),
    };

    BuiltTagRecord { record, skipped }
}

fn select_credits(
    raw: &RawMetadataRecord,
    locale: &LocaleContext,
) -> (Credits, Vec<SkippedField>) {
    let variants = raw.credit_variants();
    let Some(variant) = select_credit_variant(&variants, locale.effective_language()) else {
        return Default::default();
    };
    let (supported, rejected) = partition_credits(&variant.roles);
    let skipped = rejected
        .into_iter()
        .map(|role| SkippedField::new(Field::Credit(role), SkipReason::UnsupportedCharacters))
        .collect();
    (supported, skipped)
}
