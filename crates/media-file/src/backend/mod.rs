// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The two embedding backends and the plans they execute.
//!
//! The container tool writes a baseline of tags together with the
//! artwork. The library backend writes everything else it is able to
//! express, without touching the artwork.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use strum::IntoStaticStr;
use tokio::time::Instant;

use muxtag_core::{
    CanonicalTagRecord, Field, FieldSet,
    codec::{codec_annotation, is_eac3_codec},
};

use crate::Result;

/// Fields the container tool is able to write.
pub const CONTAINER_FIELDS: [Field; 15] = [
    Field::Title,
    Field::Album,
    Field::Artist,
    Field::AlbumArtist,
    Field::Composer,
    Field::Genre,
    Field::ReleaseDate,
    Field::Compilation,
    Field::Rating,
    Field::Copyright,
    Field::TrackNumber,
    Field::DiscNumber,
    Field::Language,
    Field::CodecLabel,
    Field::Thumbnail,
];

#[must_use]
pub fn container_supports(field: &Field) -> bool {
    CONTAINER_FIELDS.contains(field)
}

/// The library backend never embeds artwork and has no access
/// to the track language of the container.
#[must_use]
pub fn library_supports(field: &Field) -> bool {
    !matches!(field, Field::Thumbnail | Field::Language)
}

/// Item tags of the container tool, in the order they are passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContainerTagKey {
    Name,
    Album,
    Artist,
    AlbumArtist,
    Writer,
    Disk,
    Performer,
    Genre,
    Compilation,
    Created,
    Rating,
    Copyright,
    Tracknum,
    Comment,
    Cover,
}

impl ContainerTagKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTag {
    pub key: ContainerTagKey,
    pub value: String,
}

/// Everything the container tool needs for a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPlan {
    /// File extension of the target, e.g. `m4a`
    pub ext: Option<String>,

    /// The audio stream is Dolby Digital Plus
    pub dolby_digital_plus: bool,

    pub language: Option<String>,
    pub tags: Vec<ContainerTag>,

    /// The fields covered by this plan
    pub fields: FieldSet,
}

impl ContainerPlan {
    /// Plan the container pass for the given fields.
    ///
    /// Fields the container tool cannot express are ignored. The
    /// thumbnail is only covered if a `cover` file is provided.
    #[must_use]
    pub fn new(record: &CanonicalTagRecord, fields: &FieldSet, cover: Option<&Path>) -> Self {
        let mut plan = Self {
            ext: record.ext.clone(),
            dolby_digital_plus: record.acodec.as_deref().is_some_and(is_eac3_codec),
            ..Default::default()
        };
        let wanted = |field: &Field| fields.contains(field);
        if wanted(&Field::Title) {
            plan.push_text(Field::Title, ContainerTagKey::Name, record.title.as_deref());
        }
        if wanted(&Field::Album) {
            plan.push_text(Field::Album, ContainerTagKey::Album, record.album.as_deref());
        }
        if wanted(&Field::Artist) {
            plan.push_text(Field::Artist, ContainerTagKey::Artist, record.artist.as_deref());
        }
        if wanted(&Field::AlbumArtist) {
            plan.push_text(
                Field::AlbumArtist,
                ContainerTagKey::AlbumArtist,
                record.album_artist.as_deref(),
            );
        }
        if wanted(&Field::Composer) {
            plan.push_text(
                Field::Composer,
                ContainerTagKey::Writer,
                record.composer.as_deref(),
            );
        }
        if wanted(&Field::DiscNumber) {
            let disk = record.disc_number.map(|disc| disc.to_string());
            plan.push_text(Field::DiscNumber, ContainerTagKey::Disk, disk.as_deref());
        }
        if wanted(&Field::Artist) {
            plan.push_text(
                Field::Artist,
                ContainerTagKey::Performer,
                record.artist.as_deref(),
            );
        }
        if wanted(&Field::Genre) {
            plan.push_text(Field::Genre, ContainerTagKey::Genre, record.genre.as_deref());
        }
        if wanted(&Field::Compilation) {
            let compilation = record
                .compilation
                .map(|compilation| if compilation { "yes" } else { "no" });
            plan.push_text(Field::Compilation, ContainerTagKey::Compilation, compilation);
        }
        if wanted(&Field::ReleaseDate) {
            plan.push_text(
                Field::ReleaseDate,
                ContainerTagKey::Created,
                record.release_date.as_deref(),
            );
        }
        if wanted(&Field::Rating) {
            let rating = record
                .rating
                .map(|rating| rating.itunes_advisory().to_string());
            plan.push_text(Field::Rating, ContainerTagKey::Rating, rating.as_deref());
        }
        if wanted(&Field::Copyright) {
            plan.push_text(
                Field::Copyright,
                ContainerTagKey::Copyright,
                record.copyright.as_deref(),
            );
        }
        if wanted(&Field::TrackNumber) {
            let position = record.track_position();
            plan.push_text(
                Field::TrackNumber,
                ContainerTagKey::Tracknum,
                position.as_deref(),
            );
        }
        if wanted(&Field::CodecLabel) {
            let annotation = record.codec_label.as_deref().and_then(codec_annotation);
            plan.push_text(
                Field::CodecLabel,
                ContainerTagKey::Comment,
                annotation.as_deref(),
            );
        }
        if wanted(&Field::Thumbnail) {
            let cover = cover.map(|path| path.to_string_lossy());
            plan.push_text(Field::Thumbnail, ContainerTagKey::Cover, cover.as_deref());
        }
        if wanted(&Field::Language) {
            if let Some(language) = &record.language {
                plan.language = Some(language.clone());
                plan.fields.insert(Field::Language);
            }
        }
        plan
    }

    fn push_text(&mut self, field: Field, key: ContainerTagKey, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            return;
        };
        self.tags.push(ContainerTag {
            key,
            value: value.to_owned(),
        });
        self.fields.insert(field);
    }

    #[must_use]
    pub fn tag(&self, key: ContainerTagKey) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

/// Everything the library backend needs for a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPlan {
    pub record: CanonicalTagRecord,

    /// The fields to write, all supported by the library backend
    pub fields: FieldSet,
}

/// Writes baseline tags and artwork by rewriting the container.
pub trait ContainerBackend {
    /// Check that the backend is usable before any file is touched.
    fn ensure_available(&self) -> Result<PathBuf>;

    /// Rewrite `target` according to `plan`.
    ///
    /// The target is either replaced as a whole or left untouched.
    fn write(&self, target: &Path, plan: &ContainerPlan) -> impl Future<Output = Result<()>> + Send;
}

/// Writes the extended tags in-process.
pub trait LibraryBackend {
    /// Write the planned fields into `target`.
    ///
    /// Returns the fields that have actually been written. A write that
    /// has not been committed when `deadline` elapses is abandoned and
    /// fails with [`Error::Timeout`](crate::Error::Timeout). The returned
    /// future only completes after the file is no longer accessed.
    fn write(
        &self,
        target: &Path,
        plan: LibraryPlan,
        deadline: Instant,
    ) -> impl Future<Output = Result<FieldSet>> + Send;
}
