// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Embedding a canonical tag record into a media file.
//!
//! The container tool establishes a baseline of tags together with
//! the artwork. Afterwards the library backend augments the file with
//! all remaining fields. Both passes share the set of fields that have
//! already been written.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use bitflags::bitflags;
use semval::prelude::*;
use tokio::time::Instant;

use muxtag_core::{
    CanonicalTagRecord, Field, FieldSet, SkipReason, SkippedField,
    thumbnail::ThumbnailConstraints,
};

use crate::{
    Error,
    backend::{
        ContainerBackend, ContainerPlan, LibraryBackend, LibraryPlan, container_supports,
        library_supports,
    },
    fmt::mp4::LoftyLibrary,
    tool::mp4box::Mp4Box,
    util::thumbnail::{PreparedThumbnail, prepare_thumbnail},
};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EmbedFeatures: u8 {
        const METADATA  = 0b0001;
        const THUMBNAIL = 0b0010;

        /// Requires the library backend
        const CREDITS   = 0b0100;
    }
}

impl Default for EmbedFeatures {
    fn default() -> Self {
        Self::METADATA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendSelection {
    /// Nothing is embedded
    None,

    #[default]
    ContainerTool,

    ContainerToolAndLibrary,
}

impl BackendSelection {
    #[must_use]
    pub const fn uses_container_tool(self) -> bool {
        matches!(self, Self::ContainerTool | Self::ContainerToolAndLibrary)
    }

    #[must_use]
    pub const fn uses_library(self) -> bool {
        matches!(self, Self::ContainerToolAndLibrary)
    }
}

/// What happens with the thumbnail files after embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailAction {
    #[default]
    Keep,

    /// Only after a successful embed
    Delete,
}

/// Precedence for fields that both backends are able to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOverlap {
    /// The library backend only adds fields that the container
    /// tool has not written.
    #[default]
    KeepContainer,

    /// The library backend overwrites fields written by the
    /// container tool.
    PreferLibrary,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct EmbeddingRequest<'a> {
    pub target: PathBuf,
    pub record: &'a CanonicalTagRecord,
    pub features: EmbedFeatures,
    pub backends: BackendSelection,
    pub thumbnail_action: ThumbnailAction,

    /// Thumbnails are embedded as is if absent
    pub thumbnail_constraints: Option<ThumbnailConstraints>,

    /// Applies to all passes together, excluding the deletion
    /// of the thumbnail afterwards
    pub timeout: Duration,

    /// Carried over from building the record
    pub skipped: Vec<SkippedField>,
}

impl<'a> EmbeddingRequest<'a> {
    #[must_use]
    pub fn new(target: impl Into<PathBuf>, record: &'a CanonicalTagRecord) -> Self {
        Self {
            target: target.into(),
            record,
            features: Default::default(),
            backends: Default::default(),
            thumbnail_action: Default::default(),
            thumbnail_constraints: None,
            timeout: DEFAULT_TIMEOUT,
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    BackendExecution,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Configuration => "configuration",
            Self::BackendExecution => "backend execution",
            Self::Timeout => "timeout",
        };
        f.write_str(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedStatus {
    Success,

    /// Some fields have been skipped
    Partial,

    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReport {
    pub status: EmbedStatus,

    /// Fields that have been written into the file
    pub embedded: FieldSet,

    pub skipped: Vec<SkippedField>,
    pub warnings: Vec<String>,

    /// Thumbnail files that have been deleted
    pub deleted: Vec<PathBuf>,
}

impl EmbedReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, EmbedStatus::Success)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, EmbedStatus::Failed { .. })
    }

    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self.status {
            EmbedStatus::Failed { kind, .. } => Some(kind),
            EmbedStatus::Success | EmbedStatus::Partial => None,
        }
    }
}

#[derive(Debug)]
struct Failure {
    kind: FailureKind,
    message: String,
}

impl Failure {
    fn configuration(err: impl fmt::Display) -> Self {
        Self {
            kind: FailureKind::Configuration,
            message: err.to_string(),
        }
    }

    fn timeout(timeout: Duration) -> Self {
        Self::backend(&Error::Timeout(timeout))
    }

    fn backend(err: &Error) -> Self {
        let kind = match err {
            Error::ToolNotFound(_) | Error::Configuration(_) => FailureKind::Configuration,
            Error::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::BackendExecution,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct EmbedState {
    embedded: FieldSet,
    skipped: Vec<SkippedField>,
    warnings: Vec<String>,
    deleted: Vec<PathBuf>,
}

impl EmbedState {
    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }

    /// Each field is skipped at most once.
    fn skip(&mut self, field: Field, reason: SkipReason) {
        if self.skipped.iter().any(|skipped| skipped.field == field) {
            return;
        }
        let skipped = SkippedField::new(field, reason);
        log::info!("Skipped {skipped}");
        self.skipped.push(skipped);
    }

    fn has_backend_failures(&self) -> bool {
        self.skipped
            .iter()
            .any(|skipped| matches!(skipped.reason, SkipReason::BackendFailed(_)))
    }

    fn into_report(self, status: EmbedStatus) -> EmbedReport {
        let Self {
            embedded,
            skipped,
            warnings,
            deleted,
        } = self;
        EmbedReport {
            status,
            embedded,
            skipped,
            warnings,
            deleted,
        }
    }

    fn finish(self) -> EmbedReport {
        let status = if self.skipped.is_empty() {
            EmbedStatus::Success
        } else {
            EmbedStatus::Partial
        };
        self.into_report(status)
    }

    fn fail(self, failure: Failure) -> EmbedReport {
        let Failure { kind, message } = failure;
        log::error!("Embedding failed ({kind}): {message}");
        self.into_report(EmbedStatus::Failed { kind, message })
    }
}

/// The artwork handed to the container tool.
#[derive(Debug)]
struct Cover {
    path: PathBuf,

    // Keeps a derived file alive until the container pass has finished
    _prepared: Option<PreparedThumbnail>,

    /// The thumbnail file the artwork has been taken from
    source: PathBuf,
}

/// The feature that enables embedding of `field`.
#[must_use]
pub const fn required_feature(field: &Field) -> EmbedFeatures {
    match field {
        Field::Thumbnail => EmbedFeatures::THUMBNAIL,
        Field::Credit(_) => EmbedFeatures::CREDITS,
        _ => EmbedFeatures::METADATA,
    }
}

/// Fields of the record that are requested by the enabled features.
#[must_use]
pub fn requested_fields(record: &CanonicalTagRecord, features: EmbedFeatures) -> FieldSet {
    record
        .fields()
        .into_iter()
        .filter(|field| features.contains(required_feature(field)))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Embedder<C, L> {
    container: C,
    library: L,
    overlap: FieldOverlap,
}

impl Embedder<Mp4Box, LoftyLibrary> {
    /// MP4Box at the given location together with `lofty`.
    #[must_use]
    pub fn with_mp4box(program: impl Into<PathBuf>) -> Self {
        Self::new(Mp4Box::new(program), LoftyLibrary)
    }
}

impl<C, L> Embedder<C, L>
where
    C: ContainerBackend,
    L: LibraryBackend,
{
    #[must_use]
    pub const fn new(container: C, library: L) -> Self {
        Self {
            container,
            library,
            overlap: FieldOverlap::KeepContainer,
        }
    }

    #[must_use]
    pub const fn with_overlap(mut self, overlap: FieldOverlap) -> Self {
        self.overlap = overlap;
        self
    }

    #[must_use]
    pub const fn overlap(&self) -> FieldOverlap {
        self.overlap
    }

    /// Embed the record into the target file.
    ///
    /// Never fails. The outcome including all skipped fields is
    /// reported. Skipped fields carried over with the request are
    /// only reported if they have been requested. The embedded
    /// thumbnail file is only deleted after a successful embed.
    pub async fn embed(&self, request: &EmbeddingRequest<'_>) -> EmbedReport {
        let mut state = EmbedState::default();
        if request.backends == BackendSelection::None {
            log::debug!(
                "Embedding into {target} is disabled",
                target = request.target.display()
            );
            return state.finish();
        }
        if let Err(failure) = self.check_configuration(request) {
            return state.fail(failure);
        }
        let mut features = request.features;
        if !request.backends.uses_library() && features.contains(EmbedFeatures::CREDITS) {
            if !request.record.credits.is_empty() {
                state.warn("Embedding of credits requires the library backend".to_owned());
            }
            features.remove(EmbedFeatures::CREDITS);
        }
        state.skipped = request
            .skipped
            .iter()
            .filter(|skipped| features.contains(required_feature(&skipped.field)))
            .cloned()
            .collect();
        let requested = requested_fields(request.record, features);
        let deadline = Instant::now() + request.timeout;
        let cover = match self.run(request, &requested, deadline, &mut state).await {
            Ok(cover) => cover,
            Err(failure) => return state.fail(failure),
        };
        if request.thumbnail_action == ThumbnailAction::Delete {
            if let Some(cover) = &cover {
                delete_thumbnail_source(cover, &mut state).await;
            }
        }
        state.finish()
    }

    /// Fails without touching any file.
    fn check_configuration(&self, request: &EmbeddingRequest<'_>) -> Result<(), Failure> {
        if request.features.contains(EmbedFeatures::THUMBNAIL) {
            if let Some(constraints) = &request.thumbnail_constraints {
                constraints.validate().map_err(|err| {
                    Failure::configuration(format!("invalid thumbnail constraints: {err:?}"))
                })?;
            }
        }
        let program = self
            .container
            .ensure_available()
            .map_err(|err| Failure::backend(&err))?;
        log::debug!("Using container tool {}", program.display());
        Ok(())
    }

    /// All passes must finish before `deadline`.
    ///
    /// Returns the embedded cover.
    async fn run(
        &self,
        request: &EmbeddingRequest<'_>,
        requested: &FieldSet,
        deadline: Instant,
        state: &mut EmbedState,
    ) -> Result<Option<Cover>, Failure> {
        let EmbeddingRequest {
            target,
            record,
            backends,
            timeout,
            ..
        } = request;
        let cover = if requested.contains(&Field::Thumbnail) {
            tokio::time::timeout_at(deadline, prepare_cover(request, state))
                .await
                .map_err(|_elapsed| Failure::timeout(*timeout))?
        } else {
            None
        };

        let container_fields = requested
            .iter()
            .filter(|field| container_supports(field))
            .cloned()
            .collect::<FieldSet>();
        let container_plan = ContainerPlan::new(
            record,
            &container_fields,
            cover.as_ref().map(|cover| cover.path.as_path()),
        );
        if !container_plan.fields.is_empty() {
            // Aborting the container tool leaves the target untouched
            tokio::time::timeout_at(deadline, self.container.write(target, &container_plan))
                .await
                .map_err(|_elapsed| Failure::timeout(*timeout))?
                .map_err(|err| Failure::backend(&err))?;
            log::info!(
                "Embedded {count} field(s) into {target} with the container tool",
                count = container_plan.fields.len(),
                target = target.display()
            );
            state.embedded.extend(container_plan.fields);
        }

        if backends.uses_library() {
            self.run_library_pass(target, record, requested, deadline, state)
                .await?;
        }

        for field in requested {
            if !state.embedded.contains(field) {
                state.skip(field.clone(), SkipReason::UnsupportedByBackend);
            }
        }
        Ok(cover)
    }

    /// Failures are recorded per field. Only an elapsed deadline
    /// aborts the request.
    async fn run_library_pass(
        &self,
        target: &Path,
        record: &CanonicalTagRecord,
        requested: &FieldSet,
        deadline: Instant,
        state: &mut EmbedState,
    ) -> Result<(), Failure> {
        let fields = requested
            .iter()
            .filter(|field| library_supports(field))
            .filter(|field| {
                self.overlap == FieldOverlap::PreferLibrary || !state.embedded.contains(field)
            })
            .cloned()
            .collect::<FieldSet>();
        if fields.is_empty() {
            return Ok(());
        }
        let plan = LibraryPlan {
            record: record.clone(),
            fields: fields.clone(),
        };
        match self.library.write(target, plan, deadline).await {
            Ok(written) => {
                log::info!(
                    "Embedded {count} field(s) into {target} with the library backend",
                    count = written.len(),
                    target = target.display()
                );
                state.embedded.extend(written);
            }
            Err(err @ Error::Timeout(_)) => {
                return Err(Failure::backend(&err));
            }
            Err(err) => {
                state.warn(format!(
                    "Failed to embed {count} field(s) with the library backend: {err}",
                    count = fields.len()
                ));
                let reason = SkipReason::BackendFailed(err.to_string());
                for field in fields {
                    if !state.embedded.contains(&field) {
                        state.skip(field, reason.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

async fn existing_files(candidates: &[PathBuf]) -> Vec<PathBuf> {
    let mut existing = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
            existing.push(candidate.clone());
        }
    }
    existing
}

async fn prepare_cover(request: &EmbeddingRequest<'_>, state: &mut EmbedState) -> Option<Cover> {
    let candidates = request
        .record
        .thumbnail
        .as_ref()
        .map(|thumbnail| thumbnail.candidates.as_slice())
        .unwrap_or_default();
    let sources = existing_files(candidates).await;
    let Some(first_source) = sources.first().cloned() else {
        state.warn(format!(
            "No thumbnail found for {target}",
            target = request.target.display()
        ));
        state.skip(Field::Thumbnail, SkipReason::SourceMissing);
        return None;
    };
    let Some(constraints) = request.thumbnail_constraints.clone() else {
        return Some(Cover {
            path: first_source.clone(),
            _prepared: None,
            source: first_source,
        });
    };
    let prepared = tokio::task::spawn_blocking(move || prepare_thumbnail(&sources, &constraints))
        .await
        .map_err(Error::from)
        .and_then(|prepared| prepared);
    match prepared {
        Ok(prepared) => Some(Cover {
            path: prepared.path().to_path_buf(),
            source: prepared.source().to_path_buf(),
            _prepared: Some(prepared),
        }),
        Err(err) => {
            state.warn(format!(
                "Embedding thumbnail {path} as is: {err}",
                path = first_source.display()
            ));
            Some(Cover {
                path: first_source.clone(),
                _prepared: None,
                source: first_source,
            })
        }
    }
}

/// Other thumbnail candidates are kept.
async fn delete_thumbnail_source(cover: &Cover, state: &mut EmbedState) {
    let source = &cover.source;
    if !state.embedded.contains(&Field::Thumbnail) || state.has_backend_failures() {
        log::info!("Keeping thumbnail {}", source.display());
        return;
    }
    match tokio::fs::remove_file(source).await {
        Ok(()) => {
            log::debug!("Deleted thumbnail {}", source.display());
            state.deleted.push(source.clone());
        }
        Err(err) => {
            state.warn(format!(
                "Failed to delete thumbnail {path}: {err}",
                path = source.display()
            ));
        }
    }
}
