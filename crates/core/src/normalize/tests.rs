// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::*;

#[test]
fn disc_prefixes() {
    assert_eq!("", disc_prefix(Some(1)));
    assert_eq!("2-", disc_prefix(Some(2)));
    assert_eq!("12-", disc_prefix(Some(12)));
    assert_eq!("", disc_prefix(None));
}

#[test]
fn ratings_from_age_limit() {
    assert_eq!(Some(Rating::Explicit), Rating::from_age_limit(Some(18)));
    assert_eq!(Some(Rating::Clean), Rating::from_age_limit(Some(0)));
    assert_eq!(None, Rating::from_age_limit(Some(13)));
    assert_eq!(None, Rating::from_age_limit(Some(17)));
    assert_eq!(None, Rating::from_age_limit(None));
}

#[test]
fn rating_labels() {
    assert_eq!("Explicit", Rating::Explicit.to_string());
    assert_eq!("Clean", Rating::Clean.as_ref());
    assert_eq!(Ok(Rating::Clean), "Clean".parse());
}

#[test]
fn itunes_advisory() {
    assert_eq!(1, Rating::Explicit.itunes_advisory());
    assert_eq!(2, Rating::Clean.itunes_advisory());
}

#[test]
fn release_dates() {
    assert_eq!(
        Some("2023-05-19".to_owned()),
        normalize_release_date("20230519")
    );
    assert_eq!(
        Some("2023-05-19".to_owned()),
        normalize_release_date("2023-05-19")
    );
    assert_eq!(
        Some("2023-05-19".to_owned()),
        normalize_release_date("2023-05-19T07:00:00Z")
    );
    assert_eq!(None, normalize_release_date("2023"));
    assert_eq!(None, normalize_release_date("2023-13-01"));
    assert_eq!(None, normalize_release_date(""));
}
