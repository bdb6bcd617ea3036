// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fitting artwork files into the configured size and format.

use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageFormat, codecs::jpeg::JpegEncoder, imageops::FilterType};
use tempfile::TempPath;

use semval::prelude::*;

use muxtag_core::thumbnail::ThumbnailConstraints;

use crate::{Error, Result};

/// An artwork file ready for embedding.
#[derive(Debug)]
pub struct PreparedThumbnail {
    pub width: u32,
    pub height: u32,
    path: PathBuf,

    /// The artwork file this thumbnail has been prepared from
    source: PathBuf,

    // Removes the derived file when dropped
    derived: Option<TempPath>,
}

impl PreparedThumbnail {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The file has been derived from the source and is temporary.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.derived.is_some()
    }
}

fn canonical_extension(extension: &str) -> &str {
    match extension {
        "jpeg" => "jpg",
        extension => extension,
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|ext| canonical_extension(&ext) == canonical_extension(extension))
}

fn encode_image(
    image: &DynamicImage,
    format: ImageFormat,
    constraints: &ThumbnailConstraints,
    file: File,
) -> Result<()> {
    let mut writer = BufWriter::new(file);
    match format {
        ImageFormat::Jpeg => {
            // No alpha channel
            let mut encoder =
                JpegEncoder::new_with_quality(&mut writer, constraints.jpeg_quality());
            encoder.encode_image(&image.to_rgb8())?;
        }
        ImageFormat::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut writer, format)?;
        }
        _ => {
            image.write_to(&mut writer, format)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn validate_constraints(constraints: &ThumbnailConstraints) -> Result<()> {
    constraints.validate().map_err(|err| {
        Error::Configuration(format!("invalid thumbnail constraints: {err:?}"))
    })
}

/// Select the source among the candidates.
///
/// The largest candidate within bounds is preferred over the largest
/// candidate that needs to be scaled down. Unreadable candidates are
/// ignored.
#[must_use]
pub fn select_thumbnail_candidate<'a>(
    candidates: &'a [PathBuf],
    constraints: &ThumbnailConstraints,
) -> Option<&'a Path> {
    let readable = candidates
        .iter()
        .filter_map(|path| match image::image_dimensions(path) {
            Ok((width, height)) => Some((path.as_path(), width, height)),
            Err(err) => {
                log::debug!("Ignoring thumbnail {path}: {err}", path = path.display());
                None
            }
        })
        .collect::<Vec<_>>();
    let area = |&(_, width, height): &(&Path, u32, u32)| u64::from(width) * u64::from(height);
    readable
        .iter()
        .filter(|(_, width, height)| constraints.fits(*width, *height))
        .max_by_key(|candidate| area(*candidate))
        .or_else(|| readable.iter().max_by_key(|candidate| area(*candidate)))
        .map(|(path, _, _)| *path)
}

/// Prepare the best of the candidate files for embedding.
///
/// See also [`select_thumbnail_candidate`] and [`prepare_thumbnail_file`].
pub fn prepare_thumbnail(
    candidates: &[PathBuf],
    constraints: &ThumbnailConstraints,
) -> Result<PreparedThumbnail> {
    validate_constraints(constraints)?;
    let Some(source) = select_thumbnail_candidate(candidates, constraints) else {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no readable thumbnail",
        )));
    };
    prepare_thumbnail_file(source, constraints)
}

/// Prepare the artwork file `source` for embedding.
///
/// The source is used as is if it already matches the constraints.
/// Otherwise a scaled and re-encoded copy is written next to it that
/// is removed when the returned value is dropped.
pub fn prepare_thumbnail_file(
    source: &Path,
    constraints: &ThumbnailConstraints,
) -> Result<PreparedThumbnail> {
    validate_constraints(constraints)?;
    let extension = canonical_extension(&constraints.normalized_extension()).to_owned();
    let Some(format) = ImageFormat::from_extension(&extension) else {
        return Err(Error::Configuration(format!(
            "unsupported thumbnail format: {extension}"
        )));
    };
    let (width, height) = image::image_dimensions(source)?;
    if constraints.fits(width, height) && has_extension(source, &extension) {
        log::debug!(
            "Using thumbnail {path} ({width}x{height}) as is",
            path = source.display()
        );
        return Ok(PreparedThumbnail {
            width,
            height,
            path: source.to_path_buf(),
            source: source.to_path_buf(),
            derived: None,
        });
    }
    let mut image = image::open(source)?;
    let (scaled_width, scaled_height) = constraints.scaled_dimensions(width, height);
    if (scaled_width, scaled_height) != (width, height) {
        log::debug!(
            "Scaling thumbnail {path} from {width}x{height} to {scaled_width}x{scaled_height}",
            path = source.display()
        );
        image = image.resize_exact(scaled_width, scaled_height, FilterType::Lanczos3);
    }
    let dir = source
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (file, path) = tempfile::Builder::new()
        .prefix(".muxtag-thumbnail-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?
        .into_parts();
    encode_image(&image, format, constraints, file)?;
    Ok(PreparedThumbnail {
        width: image.width(),
        height: image.height(),
        path: path.to_path_buf(),
        source: source.to_path_buf(),
        derived: Some(path),
    })
}
