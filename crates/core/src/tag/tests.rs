// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::*;
use crate::locale::LocaleContext;

fn credits(roles: &[(&str, &[&str])]) -> Credits {
    roles
        .iter()
        .map(|(role, names)| {
            (
                (*role).to_owned(),
                names.iter().map(|name| (*name).to_owned()).collect(),
            )
        })
        .collect()
}

fn song() -> RawMetadataRecord {
    RawMetadataRecord::new()
        .with("id", "1536311546")
        .with("title", "Song")
        .with("meta_title", "Song (Remastered)")
        .with("album", "Album")
        .with("artist", "Artist")
        .with("album_artist", "Artist")
        .with("composer", "Composer")
        .with("genre", "Pop")
        .with("release_date", "20200102")
        .with("copyright", "℗ 2020 Label")
        .with("album_type", "Compilation")
        .with("track_number", 3_i64)
        .with("track_count", 12_i64)
        .with("disc_number", 2_i64)
        .with("disc_count", 2_i64)
        .with("format_note", "24-bit")
        .with("acodec", "alac")
        .with("age_limit", 18_i64)
        .with("language", "en")
        .with("record_label", "Label")
        .with("isrc", "USAAA2000001")
        .with("upc", "00602000000000")
        .with("album_id", 1_536_311_545_i64)
        .with("artist_ids", vec![42_i64, 43])
        .with("genre_ids", vec![14_i64])
        .with("ext", "m4a")
}

#[test]
fn meta_fields_take_precedence() {
    let record = build_canonical_record(&song(), &LocaleContext::default()).record;
    assert_eq!(Some("Song (Remastered)"), record.title.as_deref());
    assert_eq!(Some("Album"), record.album.as_deref());
}

#[test]
fn empty_meta_fields_are_ignored() {
    let raw = song().with("meta_album", " ").with("meta_track_number", RawValue::Null);
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(Some("Album"), record.album.as_deref());
    assert_eq!(Some(3), record.track_number);
}

#[test]
fn derived_fields() {
    let record = build_canonical_record(&song(), &LocaleContext::default()).record;
    assert_eq!(Some("ALAC"), record.codec_label.as_deref());
    assert_eq!(Some(Rating::Explicit), record.rating);
    assert_eq!(Some(true), record.compilation);
    assert_eq!(Some("2020-01-02"), record.release_date.as_deref());
    assert_eq!(Some("3/12".to_owned()), record.track_position());
    assert_eq!(Some(1_536_311_546), record.content_id);
    assert_eq!(Some(42), record.artist_id);
    assert_eq!(Some(14), record.genre_id);
}

#[test]
fn disc_number_requires_multiple_discs() {
    let raw = song().with("disc_number", 1_i64).with("disc_count", 1_i64);
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(None, record.disc_number);
    assert!(!record.fields().contains(&Field::DiscNumber));

    let raw = song().with("disc_number", 1_i64).with("disc_count", 2_i64);
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(Some(1), record.disc_number);
}

#[test]
fn disc_number_without_count() {
    let raw = song().with("disc_count", RawValue::Null);
    let first_disc = raw.clone().with("disc_number", 1_i64);
    let record = build_canonical_record(&first_disc, &LocaleContext::default()).record;
    assert_eq!(None, record.disc_number);
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(Some(2), record.disc_number);
}

#[test]
fn storefront_id_from_locale() {
    let locale = LocaleContext::new(Some("gb"), None);
    let record = build_canonical_record(&song(), &locale).record;
    assert_eq!(Some(143_444), record.storefront_id);

    let raw = song().with("storefront_id", 143_441_i64);
    let record = build_canonical_record(&raw, &locale).record;
    assert_eq!(Some(143_441), record.storefront_id);
}

#[test]
fn credits_for_requested_language() {
    let raw = song()
        .with_credits(None, &credits(&[("Producer", &["A"])]))
        .with_credits(Some("de"), &credits(&[("Produzent", &["A"])]));
    let locale = LocaleContext::new(Some("us"), Some("de-DE"));
    let built = build_canonical_record(&raw, &locale);
    assert_eq!(credits(&[("Produzent", &["A"])]), built.record.credits);
    assert!(built.skipped.is_empty());
}

#[test]
fn credits_for_region_language() {
    let raw = song()
        .with_credits(None, &credits(&[("Producer", &["A"])]))
        .with_credits(Some("fr"), &credits(&[("Réalisateur", &["A"])]));
    let locale = LocaleContext::new(Some("fr"), None);
    let built = build_canonical_record(&raw, &locale);
    assert_eq!(credits(&[("Réalisateur", &["A"])]), built.record.credits);
}

#[test]
fn unsupported_credit_roles_are_dropped() {
    let raw = song().with_credits(
        Some("ja"),
        &credits(&[("作曲", &["A"]), ("Producer", &["B"]), ("Mixer", &["C"])]),
    );
    let locale = LocaleContext::new(Some("jp"), None);
    let built = build_canonical_record(&raw, &locale);
    assert_eq!(
        credits(&[("Mixer", &["C"]), ("Producer", &["B"])]),
        built.record.credits
    );
    assert_eq!(
        vec![SkippedField::new(
            Field::Credit("作曲".to_owned()),
            SkipReason::UnsupportedCharacters
        )],
        built.skipped
    );
}

#[test]
fn build_is_idempotent() {
    let raw = song().with_credits(None, &credits(&[("Producer", &["A"]), ("作曲", &["B"])]));
    let locale = LocaleContext::new(Some("us"), Some("en-US"));
    assert_eq!(
        build_canonical_record(&raw, &locale),
        build_canonical_record(&raw, &locale)
    );
}

#[test]
fn no_language_codes() {
    let raw = song().with("language", "zxx");
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(None, record.language);
}

#[test]
fn thumbnails_and_lyrics() {
    let mut thumbnail = BTreeMap::new();
    thumbnail.insert("id".to_owned(), RawValue::from("0"));
    thumbnail.insert("filepath".to_owned(), RawValue::from("/tmp/cover.jpg"));
    let mut subtitle = BTreeMap::new();
    subtitle.insert("ext".to_owned(), RawValue::from("txt"));
    subtitle.insert("data".to_owned(), RawValue::from("Some words"));
    let mut subtitles = BTreeMap::new();
    subtitles.insert(
        "lyrics".to_owned(),
        RawValue::List(vec![RawValue::Map(subtitle)]),
    );
    let raw = song()
        .with("thumbnails", RawValue::List(vec![RawValue::Map(thumbnail)]))
        .with("subtitles", RawValue::Map(subtitles));
    let record = build_canonical_record(&raw, &LocaleContext::default()).record;
    assert_eq!(
        Some(ThumbnailSource {
            candidates: vec![PathBuf::from("/tmp/cover.jpg")]
        }),
        record.thumbnail
    );
    assert_eq!(Some(Lyrics::plain("Some words")), record.lyrics);
}

#[test]
fn fields_of_record() {
    let record = CanonicalTagRecord {
        title: Some("Song".to_owned()),
        credits: credits(&[("Producer", &["A"])]),
        thumbnail: Some(ThumbnailSource::default()),
        ..Default::default()
    };
    let fields = record.fields();
    assert_eq!(2, fields.len());
    assert!(fields.contains(&Field::Title));
    assert!(fields.contains(&Field::Credit("Producer".to_owned())));
}

#[test]
fn field_display() {
    assert_eq!("album_artist", Field::AlbumArtist.to_string());
    assert_eq!("credit:Producer", Field::Credit("Producer".to_owned()).to_string());
}

#[test]
fn integers_from_text_and_floats() {
    assert_eq!(Some(3), RawValue::from("3").as_integer());
    assert_eq!(Some(3), RawValue::from(3.0).as_integer());
    assert_eq!(None, RawValue::from(3.5).as_integer());
    assert_eq!(None, RawValue::from("three").as_integer());
}
