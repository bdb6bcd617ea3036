// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use crate::prelude::*;

/// Output formats for thumbnails, by file extension.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThumbnailConstraints {
    pub max_width: u32,
    pub max_height: u32,

    /// File extension of the output format
    pub extension: String,

    /// 0 (worst) ..= 999 (best)
    pub quality: i32,
}

impl ThumbnailConstraints {
    pub const DEFAULT_MAX_WIDTH: u32 = 12_000;
    pub const DEFAULT_MAX_HEIGHT: u32 = 12_000;
    pub const DEFAULT_EXTENSION: &'static str = "jpg";
    pub const MIN_QUALITY: i32 = 0;
    pub const MAX_QUALITY: i32 = 999;

    #[must_use]
    pub const fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }

    /// Largest dimensions within the bounds that preserve the aspect ratio.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.fits(width, height) || width == 0 || height == 0 {
            return (width, height);
        }
        let scale = f64::min(
            f64::from(self.max_width) / f64::from(width),
            f64::from(self.max_height) / f64::from(height),
        );
        let scaled = |value: u32, max: u32| {
            ((f64::from(value) * scale).floor() as u32).clamp(1, max)
        };
        (
            scaled(width, self.max_width),
            scaled(height, self.max_height),
        )
    }

    /// JPEG encoder quality in the range 1..=100.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn jpeg_quality(&self) -> u8 {
        let quality = self.quality.clamp(Self::MIN_QUALITY, Self::MAX_QUALITY);
        (1 + quality * 99 / Self::MAX_QUALITY) as u8
    }

    #[must_use]
    pub fn normalized_extension(&self) -> String {
        self.extension.trim().trim_start_matches('.').to_ascii_lowercase()
    }
}

impl Default for ThumbnailConstraints {
    fn default() -> Self {
        Self {
            max_width: Self::DEFAULT_MAX_WIDTH,
            max_height: Self::DEFAULT_MAX_HEIGHT,
            extension: Self::DEFAULT_EXTENSION.to_owned(),
            quality: Self::MAX_QUALITY,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ThumbnailConstraintsInvalidity {
    MaxWidthZero,
    MaxHeightZero,
    QualityOutOfRange,
    UnsupportedExtension,
}

impl Validate for ThumbnailConstraints {
    type Invalidity = ThumbnailConstraintsInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let extension = self.normalized_extension();
        ValidationContext::new()
            .invalidate_if(self.max_width == 0, Self::Invalidity::MaxWidthZero)
            .invalidate_if(self.max_height == 0, Self::Invalidity::MaxHeightZero)
            .invalidate_if(
                !(Self::MIN_QUALITY..=Self::MAX_QUALITY).contains(&self.quality),
                Self::Invalidity::QualityOutOfRange,
            )
            .invalidate_if(
                !SUPPORTED_EXTENSIONS.contains(&extension.as_str()),
                Self::Invalidity::UnsupportedExtension,
            )
            .into()
    }
}

/// Rewrite the size and format of a catalog artwork URL.
///
/// The last path segment is replaced by `{width}x{height}-{quality}.{extension}`.
#[must_use]
pub fn format_thumbnail_url(url: &str, constraints: &ThumbnailConstraints) -> String {
    let base = url.rsplit_once('/').map_or("", |(base, _)| base);
    let ThumbnailConstraints {
        max_width,
        max_height,
        quality,
        ..
    } = constraints;
    let extension = constraints.normalized_extension();
    format!("{base}/{max_width}x{max_height}-{quality}.{extension}")
}

/// Artwork files on disk that could be embedded, in order of preference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThumbnailSource {
    pub candidates: Vec<PathBuf>,
}

impl ThumbnailSource {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
