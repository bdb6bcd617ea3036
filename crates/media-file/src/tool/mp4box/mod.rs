// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Container rewriting with [MP4Box](https://gpac.io/).

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use itertools::Itertools as _;
use tokio::process::Command;

use crate::{
    Error, Result,
    backend::{ContainerBackend, ContainerPlan},
};

use super::resolve_executable;

/// Resolved via `PATH`.
pub const DEFAULT_PROGRAM: &str = "MP4Box";

const COMPATIBLE_BRANDS: [&str; 2] = ["mp42", "isom"];

const DOLBY_BRAND: &str = "dby1";

// Leftovers of fragmented and CMAF sources.
const REMOVED_BRANDS: [&str; 4] = ["hlsf", "ccea", "cmfc", "iso5"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp4Box {
    program: PathBuf,
    extra_args: Vec<OsString>,
}

impl Default for Mp4Box {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Mp4Box {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Additional arguments, passed before all others.
    #[must_use]
    pub fn with_extra_args(
        mut self,
        extra_args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        self.extra_args = extra_args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// The major brand for the file extension.
#[must_use]
pub fn major_brand(ext: Option<&str>) -> &'static str {
    if ext.is_some_and(|ext| ext.eq_ignore_ascii_case("m4a")) {
        "M4A :0"
    } else {
        "mp42"
    }
}

/// Encode the item tags as `key=value` pairs separated by colons.
///
/// NUL characters cannot be passed on the command line and are removed.
/// Colons inside values cannot be escaped, but MP4Box usually attributes
/// them to the preceding tag.
#[must_use]
pub fn encode_item_tags(plan: &ContainerPlan) -> String {
    plan.tags
        .iter()
        .map(|tag| {
            format!("{key}={value}", key = tag.key.as_str(), value = tag.value).replace('\0', "")
        })
        .join(":")
}

/// Arguments for rewriting `input` into `output`.
#[must_use]
pub fn command_args(plan: &ContainerPlan, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args = Vec::<OsString>::new();
    let mut push = |arg: &str| args.push(arg.into());
    push("-brand");
    push(major_brand(plan.ext.as_deref()));
    for brand in COMPATIBLE_BRANDS {
        push("-ab");
        push(brand);
    }
    if plan.dolby_digital_plus {
        push("-ab");
        push(DOLBY_BRAND);
    }
    for brand in REMOVED_BRANDS {
        push("-rb");
        push(brand);
    }
    if let Some(language) = &plan.language {
        push("-lang");
        push(language.as_str());
    }
    let item_tags = encode_item_tags(plan);
    if !item_tags.is_empty() {
        push("-itags");
        push(item_tags.as_str());
    }
    args.push("-out".into());
    args.push(output.into());
    args.push(input.into());
    args
}

fn temp_file_suffix(target: &Path) -> String {
    target
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

impl ContainerBackend for Mp4Box {
    fn ensure_available(&self) -> Result<PathBuf> {
        resolve_executable(&self.program)
    }

    async fn write(&self, target: &Path, plan: &ContainerPlan) -> Result<()> {
        let program = self.ensure_available()?;
        let target_dir = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Deleted when dropped, i.e. if the pass fails or is cancelled
        let output = tempfile::Builder::new()
            .prefix(".muxtag-")
            .suffix(&temp_file_suffix(target))
            .tempfile_in(target_dir)?
            .into_temp_path();
        let args = self
            .extra_args
            .iter()
            .cloned()
            .chain(command_args(plan, target, &output))
            .collect::<Vec<_>>();
        log::debug!(
            "MP4Box command line: {program} {args}",
            program = program.display(),
            args = args.iter().map(|arg| arg.to_string_lossy()).join(" ")
        );
        let child_output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolNotFound(program.clone())
                } else {
                    Error::Io(err)
                }
            })?;
        let stdout = String::from_utf8_lossy(&child_output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            log::debug!("{stdout}");
        }
        // MP4Box reports progress on stderr
        let stderr = String::from_utf8_lossy(&child_output.stderr);
        if !child_output.status.success() {
            log::warn!("{stderr}", stderr = stderr.trim());
            return Err(Error::ToolFailed {
                program: program.display().to_string(),
                status: child_output.status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }
        if tokio::fs::metadata(&output).await?.len() == 0 {
            return Err(Error::ToolFailed {
                program: program.display().to_string(),
                status: child_output.status.to_string(),
                stderr: "no output has been written".to_owned(),
            });
        }
        output
            .persist(target)
            .map_err(|err| Error::Io(err.error))?;
        log::debug!("Rewrote container of {}", target.display());
        Ok(())
    }
}
