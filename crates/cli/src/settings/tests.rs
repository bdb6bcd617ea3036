// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use semval::IsValid as _;

use super::*;

#[test]
fn defaults() {
    let settings = Settings::default();
    assert!(settings.is_valid());
    assert_eq!(ThumbnailConstraints::default(), settings.thumbnail_constraints());
    assert_eq!(EmbedFeatures::METADATA, settings.features());
    assert_eq!(BackendSelection::ContainerTool, settings.backends());
    assert_eq!(ThumbnailAction::Keep, settings.thumbnail_action());
    assert_eq!(Duration::from_secs(300), settings.timeout());
    assert_eq!(PathBuf::from("MP4Box"), settings.program());
}

#[test]
fn load_missing_file_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Settings::default(), Settings::load(dir.path()).unwrap());
}

#[test]
fn save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        max_thumbnail_width: 600,
        max_thumbnail_height: 600,
        embed_metadata: EmbedMetadata::Mutagen,
        embed_thumbnail: EmbedThumbnail::Delete,
        embed_credits: true,
        path: Some(PathBuf::from("/opt/gpac/bin/MP4Box")),
        ..Default::default()
    };
    settings.save(dir.path()).unwrap();
    assert!(dir.path().join("muxtag_settings.ron").is_file());
    assert_eq!(settings, Settings::load(dir.path()).unwrap());
}

#[test]
fn load_partial_file_with_alias() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("muxtag_settings.ron"),
        "(embed_metadata: library, timeout_secs: 30)",
    )
    .unwrap();
    let settings = Settings::load(dir.path()).unwrap();
    assert_eq!(EmbedMetadata::Mutagen, settings.embed_metadata);
    assert_eq!(Duration::from_secs(30), settings.timeout());
    assert_eq!(EmbedThumbnail::Off, settings.embed_thumbnail);
}

#[test]
fn load_malformed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("muxtag_settings.ron"), "(embed_metadata: 42").unwrap();
    assert!(Settings::load(dir.path()).is_err());
}

#[test]
fn thumbnail_without_metadata_uses_container_tool() {
    let settings = Settings {
        embed_metadata: EmbedMetadata::Off,
        embed_thumbnail: EmbedThumbnail::On,
        ..Default::default()
    };
    assert_eq!(EmbedFeatures::THUMBNAIL, settings.features());
    assert_eq!(BackendSelection::ContainerTool, settings.backends());
}

#[test]
fn everything_off_disables_backends() {
    let settings = Settings {
        embed_metadata: EmbedMetadata::Off,
        ..Default::default()
    };
    assert_eq!(BackendSelection::None, settings.backends());
    assert!(settings.features().is_empty());
}

#[test]
fn library_with_credits_and_delete() {
    let settings = Settings {
        embed_metadata: EmbedMetadata::Mutagen,
        embed_thumbnail: EmbedThumbnail::Delete,
        embed_credits: true,
        ..Default::default()
    };
    assert_eq!(EmbedFeatures::all(), settings.features());
    assert_eq!(BackendSelection::ContainerToolAndLibrary, settings.backends());
    assert_eq!(ThumbnailAction::Delete, settings.thumbnail_action());
}

#[test]
fn validate() {
    let invalid_quality = Settings {
        thumbnail_quality: 1000,
        ..Default::default()
    };
    assert!(!invalid_quality.is_valid());
    let zero_bounds = Settings {
        max_thumbnail_height: 0,
        ..Default::default()
    };
    assert!(!zero_bounds.is_valid());
    let zero_timeout = Settings {
        timeout_secs: 0,
        ..Default::default()
    };
    assert!(!zero_timeout.is_valid());
    let empty_path = Settings {
        path: Some(PathBuf::new()),
        ..Default::default()
    };
    assert!(!empty_path.is_valid());
}
