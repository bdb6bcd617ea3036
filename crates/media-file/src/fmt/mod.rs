// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use lofty::config::ParseOptions;

pub mod mp4;

pub(crate) fn parse_options() -> ParseOptions {
    ParseOptions::new().read_properties(true)
}
