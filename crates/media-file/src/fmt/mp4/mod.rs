// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Extended iTunes-style tags written in-process with `lofty`.

use std::{
    borrow::Cow,
    fs::OpenOptions,
    io::Seek as _,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use lofty::{
    config::WriteOptions,
    file::AudioFile as _,
    mp4::{AdvisoryRating, Atom, AtomData, AtomIdent, DataType, Ilst, Mp4File},
    tag::Accessor as _,
};
use tokio::time::Instant;

use muxtag_core::{CanonicalTagRecord, Field, FieldSet, codec::codec_annotation, normalize::Rating};

use crate::{
    Error, Result,
    backend::{LibraryBackend, LibraryPlan},
};

/// The `mean` of all freeform atoms written by this module.
pub const ITUNES_FREEFORM_MEAN: &str = "com.apple.iTunes";

pub const RECORD_LABEL_FREEFORM_NAME: &str = "LABEL";
pub const ISRC_FREEFORM_NAME: &str = "ISRC";
pub const UPC_FREEFORM_NAME: &str = "UPC";

#[must_use]
pub fn freeform_ident(name: &str) -> AtomIdent<'static> {
    AtomIdent::Freeform {
        mean: Cow::Borrowed(ITUNES_FREEFORM_MEAN),
        name: Cow::Owned(name.to_owned()),
    }
}

fn replace_text(ilst: &mut Ilst, ident: AtomIdent<'static>, text: &str) {
    ilst.replace_atom(Atom::new(ident, AtomData::UTF8(text.to_owned())));
}

const fn advisory_rating(rating: Rating) -> AdvisoryRating {
    match rating {
        Rating::Explicit => AdvisoryRating::Explicit,
        Rating::Clean => AdvisoryRating::Clean,
    }
}

fn export_field(ilst: &mut Ilst, record: &CanonicalTagRecord, field: &Field) -> bool {
    match field {
        Field::Title => record.title.as_deref().is_some_and(|title| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9nam"), title);
            true
        }),
        Field::Album => record.album.as_deref().is_some_and(|album| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9alb"), album);
            true
        }),
        Field::Artist => record.artist.as_deref().is_some_and(|artist| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9ART"), artist);
            true
        }),
        Field::AlbumArtist => record.album_artist.as_deref().is_some_and(|album_artist| {
            replace_text(ilst, AtomIdent::Fourcc(*b"aART"), album_artist);
            true
        }),
        Field::Composer => record.composer.as_deref().is_some_and(|composer| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9wrt"), composer);
            true
        }),
        Field::Genre => record.genre.as_deref().is_some_and(|genre| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9gen"), genre);
            true
        }),
        Field::ReleaseDate => record.release_date.as_deref().is_some_and(|release_date| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9day"), release_date);
            true
        }),
        Field::Copyright => record.copyright.as_deref().is_some_and(|copyright| {
            replace_text(ilst, AtomIdent::Fourcc(*b"cprt"), copyright);
            true
        }),
        Field::Compilation => record.compilation.is_some_and(|compilation| {
            ilst.replace_atom(Atom::new(
                AtomIdent::Fourcc(*b"cpil"),
                AtomData::Bool(compilation),
            ));
            true
        }),
        Field::Rating => record.rating.is_some_and(|rating| {
            ilst.set_advisory_rating(advisory_rating(rating));
            true
        }),
        Field::TrackNumber => record.track_number.is_some_and(|track_number| {
            ilst.set_track(track_number);
            if let Some(track_count) = record.track_count {
                ilst.set_track_total(track_count);
            } else {
                ilst.remove_track_total();
            }
            true
        }),
        Field::DiscNumber => record.disc_number.is_some_and(|disc_number| {
            ilst.set_disk(disc_number);
            true
        }),
        Field::CodecLabel => record
            .codec_label
            .as_deref()
            .and_then(codec_annotation)
            .is_some_and(|annotation| {
                replace_text(ilst, AtomIdent::Fourcc(*b"\xa9cmt"), &annotation);
                true
            }),
        Field::Lyrics => record.lyrics.as_ref().is_some_and(|lyrics| {
            replace_text(ilst, AtomIdent::Fourcc(*b"\xa9lyr"), &lyrics.text);
            true
        }),
        Field::RecordLabel => record.record_label.as_deref().is_some_and(|record_label| {
            replace_text(ilst, freeform_ident(RECORD_LABEL_FREEFORM_NAME), record_label);
            true
        }),
        Field::Isrc => record.isrc.as_deref().is_some_and(|isrc| {
            replace_text(ilst, freeform_ident(ISRC_FREEFORM_NAME), isrc);
            true
        }),
        Field::Upc => record.upc.as_deref().is_some_and(|upc| {
            replace_text(ilst, freeform_ident(UPC_FREEFORM_NAME), upc);
            true
        }),
        Field::AlbumId => record.album_id.is_some_and(|album_id| {
            // 64-bit integer, flagged as a signed integer
            ilst.replace_atom(Atom::new(
                AtomIdent::Fourcc(*b"plID"),
                AtomData::Unknown {
                    code: DataType::BeSignedInteger,
                    data: album_id.to_be_bytes().to_vec(),
                },
            ));
            true
        }),
        Field::ContentId => replace_signed_integer(ilst, *b"cnID", record.content_id),
        Field::ArtistId => replace_signed_integer(ilst, *b"atID", record.artist_id),
        Field::GenreId => replace_signed_integer(ilst, *b"geID", record.genre_id),
        Field::StorefrontId => replace_signed_integer(ilst, *b"sfID", record.storefront_id),
        Field::Credit(role) => {
            let Some(names) = record.credits.get(role) else {
                return false;
            };
            let data = names
                .iter()
                .map(|name| AtomData::UTF8(name.clone()))
                .collect();
            let Some(atom) = Atom::from_collection(freeform_ident(role), data) else {
                return false;
            };
            ilst.replace_atom(atom);
            true
        }
        Field::Thumbnail | Field::Language => false,
    }
}

/// 32-bit identifiers. Values out of range are not written.
fn replace_signed_integer(ilst: &mut Ilst, fourcc: [u8; 4], value: Option<i64>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let Ok(value) = i32::try_from(value) else {
        log::warn!(
            "Identifier {value} exceeds the range of {fourcc}",
            fourcc = String::from_utf8_lossy(&fourcc)
        );
        return false;
    };
    ilst.replace_atom(Atom::new(
        AtomIdent::Fourcc(fourcc),
        AtomData::SignedInteger(value),
    ));
    true
}

/// Write the planned fields into the item list.
///
/// Existing atoms are replaced. Returns the fields that have been written.
pub fn export_record_to_ilst(ilst: &mut Ilst, plan: &LibraryPlan) -> FieldSet {
    plan.fields
        .iter()
        .filter(|field| export_field(ilst, &plan.record, field))
        .cloned()
        .collect()
}

pub fn export_record_to_file(path: &Path, plan: &LibraryPlan) -> Result<FieldSet> {
    let exported = export_record_to_file_unless_abandoned(path, plan, &AtomicBool::new(false))?;
    Ok(exported.unwrap_or_default())
}

/// Returns `None` without modifying the file if `abandoned` has been
/// set before saving.
fn export_record_to_file_unless_abandoned(
    path: &Path,
    plan: &LibraryPlan,
    abandoned: &AtomicBool,
) -> Result<Option<FieldSet>> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut mp4_file = Mp4File::read_from(&mut file, super::parse_options())?;
    let mut ilst = mp4_file.ilst_mut().map(std::mem::take).unwrap_or_default();
    let exported = export_record_to_ilst(&mut ilst, plan);
    mp4_file.set_ilst(ilst);
    if abandoned.load(Ordering::Acquire) {
        return Ok(None);
    }
    // Ensure that the file could be read again
    file.rewind()?;
    mp4_file.save_to(&mut file, WriteOptions::default())?;
    Ok(Some(exported))
}

/// Abandons a pending write if the caller stops waiting for it.
#[derive(Debug)]
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The in-process backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyLibrary;

impl LibraryBackend for LoftyLibrary {
    async fn write(&self, target: &Path, plan: LibraryPlan, deadline: Instant) -> Result<FieldSet> {
        let started = Instant::now();
        let abandoned = AbandonOnDrop(Arc::new(AtomicBool::new(false)));
        let mut task = tokio::task::spawn_blocking({
            let path: PathBuf = target.to_owned();
            let abandoned = Arc::clone(&abandoned.0);
            move || export_record_to_file_unless_abandoned(&path, &plan, &abandoned)
        });
        let joined = match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                abandoned.0.store(true, Ordering::Release);
                // Blocking tasks cannot be aborted
                task.await
            }
        };
        let Some(exported) = joined?? else {
            log::warn!(
                "Abandoned writing into {path} after {elapsed:?}",
                path = target.display(),
                elapsed = started.elapsed()
            );
            return Err(Error::Timeout(started.elapsed()));
        };
        log::debug!(
            "Wrote {count} field(s) into {path}",
            count = exported.len(),
            path = target.display()
        );
        Ok(exported)
    }
}

#[cfg(test)]
mod tests;
