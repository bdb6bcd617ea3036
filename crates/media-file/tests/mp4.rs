// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fs::File, path::Path, time::Duration};

use lofty::{
    config::ParseOptions,
    file::AudioFile as _,
    mp4::{AdvisoryRating, AtomData, AtomIdent, DataType, Ilst, Mp4File},
    tag::Accessor as _,
};
use tempfile::NamedTempFile;
use tokio::time::Instant;

use muxtag_core::{CanonicalTagRecord, Field, credits::Credits, normalize::Rating};
use muxtag_media_file::{
    backend::{LibraryBackend as _, LibraryPlan},
    fmt::mp4::{LoftyLibrary, export_record_to_file, freeform_ident},
};

const EMPTY_M4A: &str = "tests/assets/empty.m4a";

fn copy_named_temp_file<T: AsRef<Path>>(file_path: T) -> NamedTempFile {
    let temp_file = ::tempfile::Builder::new()
        .suffix(".m4a")
        .tempfile()
        .unwrap();
    std::fs::copy(file_path, temp_file.path()).unwrap();
    temp_file
}

fn read_ilst(path: &Path) -> Ilst {
    let mut file = File::open(path).unwrap();
    let mp4_file = Mp4File::read_from(&mut file, ParseOptions::new()).unwrap();
    mp4_file.ilst().cloned().unwrap_or_default()
}

fn plan() -> LibraryPlan {
    let mut credits = Credits::new();
    credits.insert(
        "Producer".to_owned(),
        vec!["Alice".to_owned(), "Bob".to_owned()],
    );
    let record = CanonicalTagRecord {
        title: Some("Song".to_owned()),
        artist: Some("Artist".to_owned()),
        rating: Some(Rating::Explicit),
        record_label: Some("Label".to_owned()),
        isrc: Some("USAAA2000001".to_owned()),
        album_id: Some(1_500_000_000_123),
        content_id: Some(1_234_567),
        credits,
        ..Default::default()
    };
    let fields = record.fields();
    LibraryPlan { record, fields }
}

fn text<'a>(ilst: &'a Ilst, ident: &AtomIdent<'_>) -> Vec<&'a str> {
    ilst.get(ident)
        .map(|atom| {
            atom.data()
                .filter_map(|data| match data {
                    AtomData::UTF8(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn assert_exported(ilst: &Ilst) {
    assert_eq!(Some("Song"), ilst.title().as_deref());
    assert_eq!(Some("Artist"), ilst.artist().as_deref());
    assert_eq!(Some(AdvisoryRating::Explicit), ilst.advisory_rating());
    assert_eq!(
        Some(&AtomData::Unknown {
            code: DataType::BeSignedInteger,
            data: 1_500_000_000_123_i64.to_be_bytes().to_vec(),
        }),
        ilst.get(&AtomIdent::Fourcc(*b"plID"))
            .and_then(|atom| atom.data().next())
    );
    assert_eq!(
        Some(&AtomData::SignedInteger(1_234_567)),
        ilst.get(&AtomIdent::Fourcc(*b"cnID"))
            .and_then(|atom| atom.data().next())
    );
    assert_eq!(vec!["Label"], text(ilst, &freeform_ident("LABEL")));
    assert_eq!(vec!["USAAA2000001"], text(ilst, &freeform_ident("ISRC")));
    assert_eq!(vec!["Alice", "Bob"], text(ilst, &freeform_ident("Producer")));
}

#[test]
fn export_record_to_m4a_file() {
    let file = copy_named_temp_file(EMPTY_M4A);
    assert_eq!(Ilst::default(), read_ilst(file.path()));
    let plan = plan();

    let exported = export_record_to_file(file.path(), &plan).unwrap();

    assert_eq!(plan.fields, exported);
    assert!(exported.contains(&Field::Credit("Producer".to_owned())));
    assert_exported(&read_ilst(file.path()));
}

#[test]
fn export_record_to_m4a_file_twice() {
    let file = copy_named_temp_file(EMPTY_M4A);
    let plan = plan();

    export_record_to_file(file.path(), &plan).unwrap();
    let once = read_ilst(file.path());
    export_record_to_file(file.path(), &plan).unwrap();
    let twice = read_ilst(file.path());

    assert_eq!(once, twice);
    assert_exported(&twice);
}

#[tokio::test]
async fn write_m4a_file_with_library_backend() {
    let file = copy_named_temp_file(EMPTY_M4A);
    let plan = plan();
    let fields = plan.fields.clone();

    let written = LoftyLibrary
        .write(file.path(), plan, Instant::now() + Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(fields, written);
    assert_exported(&read_ilst(file.path()));
}

#[tokio::test]
async fn write_non_mp4_file_with_library_backend_fails() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"not an mp4 file").unwrap();

    let result = LoftyLibrary
        .write(file.path(), plan(), Instant::now() + Duration::from_secs(60))
        .await;

    assert!(result.is_err());
    assert_eq!(
        b"not an mp4 file".as_slice(),
        std::fs::read(file.path()).unwrap()
    );
}
