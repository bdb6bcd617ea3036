// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::*;

#[test]
fn empty_program_is_not_found() {
    assert!(matches!(
        resolve_executable(Path::new("")),
        Err(Error::ToolNotFound(_))
    ));
}

#[test]
fn missing_path_is_not_found() {
    assert!(matches!(
        resolve_executable(Path::new("/nonexistent/dir/MP4Box")),
        Err(Error::ToolNotFound(_))
    ));
}

#[test]
fn unknown_program_is_not_found() {
    assert!(matches!(
        resolve_executable(Path::new("muxtag-no-such-program-7f3a")),
        Err(Error::ToolNotFound(_))
    ));
}

#[cfg(unix)]
#[test]
fn resolve_from_search_path() {
    let resolved = resolve_executable(Path::new("sh")).unwrap();
    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("sh"));
}

#[cfg(unix)]
#[test]
fn regular_file_is_not_executable() {
    let file = tempfile::NamedTempFile::new().unwrap();
    assert!(matches!(
        resolve_executable(file.path()),
        Err(Error::ToolNotFound(_))
    ));
}
