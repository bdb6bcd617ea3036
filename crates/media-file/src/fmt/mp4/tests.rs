// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use muxtag_core::{credits::Credits, lyrics::Lyrics};

use super::*;

fn record() -> CanonicalTagRecord {
    let mut credits = Credits::new();
    credits.insert(
        "Producer".to_owned(),
        vec!["Alice".to_owned(), "Bob".to_owned()],
    );
    CanonicalTagRecord {
        title: Some("Song".to_owned()),
        artist: Some("Artist".to_owned()),
        compilation: Some(true),
        rating: Some(Rating::Explicit),
        track_number: Some(3),
        track_count: Some(12),
        disc_number: Some(2),
        codec_label: Some("ALAC".to_owned()),
        lyrics: Some(Lyrics::plain("La la la")),
        record_label: Some("Label".to_owned()),
        isrc: Some("USAAA2000001".to_owned()),
        album_id: Some(1_500_000_000_123),
        content_id: Some(1_234_567),
        storefront_id: Some(143_441),
        credits,
        ..Default::default()
    }
}

fn plan(record: CanonicalTagRecord) -> LibraryPlan {
    let fields = record.fields();
    LibraryPlan { record, fields }
}

fn first_data<'a>(ilst: &'a Ilst, ident: &AtomIdent<'_>) -> Option<&'a AtomData> {
    ilst.get(ident).and_then(|atom| atom.data().next())
}

fn text<'a>(ilst: &'a Ilst, ident: &AtomIdent<'_>) -> Option<&'a str> {
    match first_data(ilst, ident)? {
        AtomData::UTF8(text) => Some(text.as_str()),
        _ => None,
    }
}

#[test]
fn export_all_fields() {
    let plan = plan(record());
    let mut ilst = Ilst::default();
    let exported = export_record_to_ilst(&mut ilst, &plan);
    assert_eq!(plan.fields, exported);

    assert_eq!(Some("Song"), text(&ilst, &AtomIdent::Fourcc(*b"\xa9nam")));
    assert_eq!(Some("Artist"), text(&ilst, &AtomIdent::Fourcc(*b"\xa9ART")));
    assert_eq!(
        Some("[ALAC]"),
        text(&ilst, &AtomIdent::Fourcc(*b"\xa9cmt"))
    );
    assert_eq!(
        Some("La la la"),
        text(&ilst, &AtomIdent::Fourcc(*b"\xa9lyr"))
    );
    assert_eq!(
        Some("Label"),
        text(&ilst, &freeform_ident(RECORD_LABEL_FREEFORM_NAME))
    );
    assert_eq!(
        Some("USAAA2000001"),
        text(&ilst, &freeform_ident(ISRC_FREEFORM_NAME))
    );
    assert_eq!(
        Some(&AtomData::Bool(true)),
        first_data(&ilst, &AtomIdent::Fourcc(*b"cpil"))
    );
    assert_eq!(Some(AdvisoryRating::Explicit), ilst.advisory_rating());
    assert_eq!(Some(3), ilst.track());
    assert_eq!(Some(12), ilst.track_total());
    assert_eq!(Some(2), ilst.disk());
    assert_eq!(
        Some(&AtomData::Unknown {
            code: DataType::BeSignedInteger,
            data: 1_500_000_000_123_i64.to_be_bytes().to_vec(),
        }),
        first_data(&ilst, &AtomIdent::Fourcc(*b"plID"))
    );
    assert_eq!(
        Some(&AtomData::SignedInteger(1_234_567)),
        first_data(&ilst, &AtomIdent::Fourcc(*b"cnID"))
    );
    assert_eq!(
        Some(&AtomData::SignedInteger(143_441)),
        first_data(&ilst, &AtomIdent::Fourcc(*b"sfID"))
    );
    let producers = ilst
        .get(&freeform_ident("Producer"))
        .unwrap()
        .data()
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(
        vec![
            AtomData::UTF8("Alice".to_owned()),
            AtomData::UTF8("Bob".to_owned())
        ],
        producers
    );
}

#[test]
fn export_is_idempotent() {
    let plan = plan(record());
    let mut ilst = Ilst::default();
    export_record_to_ilst(&mut ilst, &plan);
    let once = ilst.clone();
    export_record_to_ilst(&mut ilst, &plan);
    assert_eq!(once, ilst);
}

#[test]
fn export_only_planned_fields() {
    let record = record();
    let fields = [Field::Title, Field::Thumbnail, Field::Language]
        .into_iter()
        .collect();
    let plan = LibraryPlan { record, fields };
    let mut ilst = Ilst::default();
    let exported = export_record_to_ilst(&mut ilst, &plan);
    assert_eq!([Field::Title].into_iter().collect::<FieldSet>(), exported);
    assert!(ilst.get(&AtomIdent::Fourcc(*b"\xa9ART")).is_none());
    assert!(ilst.get(&freeform_ident("Producer")).is_none());
}

#[test]
fn identifiers_out_of_range_are_not_written() {
    let record = CanonicalTagRecord {
        genre_id: Some(i64::from(i32::MAX) + 1),
        ..Default::default()
    };
    let plan = plan(record);
    let mut ilst = Ilst::default();
    let exported = export_record_to_ilst(&mut ilst, &plan);
    assert!(exported.is_empty());
    assert!(ilst.get(&AtomIdent::Fourcc(*b"geID")).is_none());
}

#[test]
fn abandoned_export_leaves_file_untouched() {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/assets/empty.m4a");
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::copy(&fixture, file.path()).unwrap();
    let original = std::fs::read(file.path()).unwrap();

    let exported =
        export_record_to_file_unless_abandoned(file.path(), &plan(record()), &AtomicBool::new(true))
            .unwrap();

    assert_eq!(None, exported);
    assert_eq!(original, std::fs::read(file.path()).unwrap());
}
