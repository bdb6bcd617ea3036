// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::*;

#[test]
fn lookup_tables_are_sorted() {
    assert!(STOREFRONT_IDS.is_sorted_by_key(|(code, _)| *code));
    assert!(REGION_DEFAULT_LANGUAGES.is_sorted_by_key(|(code, _)| *code));
}

#[test]
fn storefront_ids() {
    assert_eq!(Some(143_441), storefront_id("US"));
    assert_eq!(Some(143_441), storefront_id("us"));
    assert_eq!(Some(143_444), storefront_id("GB"));
    assert_eq!(Some(143_462), storefront_id("JP"));
    assert_eq!(None, storefront_id("XX"));
}

#[test]
fn context_from_url_with_language() {
    let url = Url::parse("https://music.apple.com/mx/album/x/1536311545?i=1536311546&l=en")
        .unwrap();
    let context = LocaleContext::from_url(&url);
    assert_eq!(Some("MX"), context.region.as_deref());
    assert_eq!("en", context.effective_language());
    assert_eq!(Some(143_468), context.storefront_id());
}

#[test]
fn context_from_url_falls_back_to_region_language() {
    let url = Url::parse("https://music.apple.com/jp/song/x/1234").unwrap();
    let context = LocaleContext::from_url(&url);
    assert_eq!(None, context.language);
    assert_eq!("ja", context.effective_language());
}

#[test]
fn context_without_region_or_language() {
    let url = Url::parse("https://music.apple.com/album/x/1234").unwrap();
    let context = LocaleContext::from_url(&url);
    assert_eq!(LocaleContext::default(), context);
    assert_eq!(DEFAULT_LANGUAGE, context.effective_language());
}

#[test]
fn language_codes_without_language() {
    for code in ["zxx", "und", "mul", "mis", "", " "] {
        assert_eq!(None, language_code_or_none(code));
    }
    assert_eq!(Some("de"), language_code_or_none("de"));
    let context = LocaleContext::new(Some("de"), Some("und"));
    assert_eq!("de", context.effective_language());
}

#[test]
fn primary_language_subtag() {
    assert_eq!("pt", primary_language("pt-BR"));
    assert_eq!("zh", primary_language("zh_Hant"));
    assert_eq!("en", primary_language("en"));
}
