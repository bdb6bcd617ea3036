// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Embedding of extracted catalog metadata and artwork into MP4/M4A files.
//!
//! The pure domain model is re-exported from `muxtag-core`. Everything
//! that touches files is available through [`media_file`].

pub use muxtag_core::*;

#[cfg(feature = "media-file")]
pub use muxtag_media_file as media_file;
