// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! External tools invoked as subprocesses.

use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

pub mod mp4box;

/// Resolve an executable, searching `PATH` for bare program names.
pub fn resolve_executable(program: &Path) -> Result<PathBuf> {
    if program.as_os_str().is_empty() {
        return Err(Error::ToolNotFound(program.to_path_buf()));
    }
    if program.components().count() > 1 || program.is_absolute() {
        return if is_executable(program) {
            Ok(program.to_path_buf())
        } else {
            Err(Error::ToolNotFound(program.to_path_buf()))
        };
    }
    let search_path = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&search_path)
        .flat_map(|dir| executable_candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(|| Error::ToolNotFound(program.to_path_buf()))
}

#[cfg(windows)]
fn executable_candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    let path = dir.join(program);
    if path.extension().is_some() {
        vec![path]
    } else {
        vec![path.with_extension("exe"), path]
    }
}

#[cfg(not(windows))]
fn executable_candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests;
