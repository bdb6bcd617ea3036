// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;
use semval::prelude::*;
use serde::{Deserialize, Serialize};

use muxtag_core::thumbnail::{ThumbnailConstraints, ThumbnailConstraintsInvalidity};
use muxtag_media_file::{
    io::embed::{BackendSelection, DEFAULT_TIMEOUT, EmbedFeatures, ThumbnailAction},
    tool::mp4box::DEFAULT_PROGRAM,
};

pub const FILE_NAME: &str = "muxtag_settings";

pub const FILE_SUFFIX: &str = "ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMetadata {
    Off,

    /// Container tool only
    #[default]
    On,

    /// Container tool followed by the tag library
    #[serde(alias = "library")]
    #[value(alias = "library")]
    Mutagen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedThumbnail {
    #[default]
    Off,

    On,

    /// Delete the thumbnail files after a successful embed
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_thumbnail_width: u32,
    pub max_thumbnail_height: u32,
    pub thumbnail_extension: String,

    /// 0 (worst) ..= 999 (best)
    pub thumbnail_quality: i32,

    pub embed_metadata: EmbedMetadata,
    pub embed_thumbnail: EmbedThumbnail,

    /// Only effective together with the tag library
    pub embed_credits: bool,

    /// Location of the MP4Box executable.
    ///
    /// Resolved via `PATH` if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_thumbnail_width: ThumbnailConstraints::DEFAULT_MAX_WIDTH,
            max_thumbnail_height: ThumbnailConstraints::DEFAULT_MAX_HEIGHT,
            thumbnail_extension: ThumbnailConstraints::DEFAULT_EXTENSION.to_owned(),
            thumbnail_quality: ThumbnailConstraints::MAX_QUALITY,
            embed_metadata: Default::default(),
            embed_thumbnail: Default::default(),
            embed_credits: false,
            path: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn load(parent_dir: &Path) -> anyhow::Result<Settings> {
        let file_path = new_settings_file_path(parent_dir.to_path_buf());
        log::info!("Loading settings from file: {}", file_path.display());
        match fs::read_to_string(&file_path) {
            Ok(text) => ron::from_str(&text).map_err(Into::into),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Default::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, parent_dir: &Path) -> anyhow::Result<()> {
        let file_path = new_settings_file_path(parent_dir.to_path_buf());
        log::info!("Saving current settings into file: {}", file_path.display());
        let text = ron::ser::to_string_pretty(self, Default::default())?;
        if let Some(parent_path) = file_path.parent() {
            fs::create_dir_all(parent_path)?;
        }
        fs::write(&file_path, text)?;
        Ok(())
    }

    #[must_use]
    pub fn thumbnail_constraints(&self) -> ThumbnailConstraints {
        ThumbnailConstraints {
            max_width: self.max_thumbnail_width,
            max_height: self.max_thumbnail_height,
            extension: self.thumbnail_extension.clone(),
            quality: self.thumbnail_quality,
        }
    }

    #[must_use]
    pub fn features(&self) -> EmbedFeatures {
        let mut features = EmbedFeatures::empty();
        features.set(
            EmbedFeatures::METADATA,
            self.embed_metadata != EmbedMetadata::Off,
        );
        features.set(
            EmbedFeatures::THUMBNAIL,
            self.embed_thumbnail != EmbedThumbnail::Off,
        );
        features.set(EmbedFeatures::CREDITS, self.embed_credits);
        features
    }

    /// The artwork is embedded by the container tool, even if
    /// metadata is disabled.
    #[must_use]
    pub fn backends(&self) -> BackendSelection {
        match (self.embed_metadata, self.embed_thumbnail) {
            (EmbedMetadata::Off, EmbedThumbnail::Off) => BackendSelection::None,
            (EmbedMetadata::Mutagen, _) => BackendSelection::ContainerToolAndLibrary,
            (EmbedMetadata::Off | EmbedMetadata::On, _) => BackendSelection::ContainerTool,
        }
    }

    #[must_use]
    pub fn thumbnail_action(&self) -> ThumbnailAction {
        match self.embed_thumbnail {
            EmbedThumbnail::Delete => ThumbnailAction::Delete,
            EmbedThumbnail::Off | EmbedThumbnail::On => ThumbnailAction::Keep,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn program(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsInvalidity {
    Thumbnail(ThumbnailConstraintsInvalidity),
    TimeoutZero,
    PathEmpty,
}

impl Validate for Settings {
    type Invalidity = SettingsInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .validate_with(&self.thumbnail_constraints(), Self::Invalidity::Thumbnail)
            .invalidate_if(self.timeout_secs == 0, Self::Invalidity::TimeoutZero)
            .invalidate_if(
                self.path
                    .as_ref()
                    .is_some_and(|path| path.as_os_str().is_empty()),
                Self::Invalidity::PathEmpty,
            )
            .into()
    }
}

#[must_use]
fn new_settings_file_path(parent_dir: PathBuf) -> PathBuf {
    let mut path_buf = parent_dir;
    path_buf.push(FILE_NAME);
    path_buf.set_extension(FILE_SUFFIX);
    path_buf
}

#[cfg(test)]
mod tests;
