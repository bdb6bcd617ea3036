// SPDX-FileCopyrightText: Copyright (C) 2018-2025 Uwe Klotz <uwedotklotzatgmaildotcom> et al.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Region and language context of a catalog request.

use smol_str::SmolStr;
use url::Url;

/// Fallback if neither the request nor the region determine a language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// BCP 47 codes that carry no actual language and are treated as absent.
const NO_LANGUAGE_CODES: [&str; 4] = ["zxx", "und", "mul", "mis"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocaleContext {
    /// ISO 3166 alpha-2 code, upper case
    pub region: Option<SmolStr>,

    /// BCP 47 language tag as requested, e.g. `en-GB`
    pub language: Option<SmolStr>,
}

impl LocaleContext {
    #[must_use]
    pub fn new(region: Option<&str>, language: Option<&str>) -> Self {
        Self {
            region: region
                .map(str::trim)
                .filter(|region| is_region_code(region))
                .map(|region| region.to_ascii_uppercase().into()),
            language: language.and_then(language_code_or_none).map(Into::into),
        }
    }

    /// Derive the context from a catalog URL.
    ///
    /// The region is the first path segment and the language is
    /// the `l` query parameter, e.g. `https://music.apple.com/us/album/x/1?l=es-MX`.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let region = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| is_region_code(segment));
        let language = url
            .query_pairs()
            .find(|(key, _)| key == "l")
            .map(|(_, value)| value.into_owned());
        Self::new(region, language.as_deref())
    }

    /// The requested language, otherwise the default language of the region.
    #[must_use]
    pub fn effective_language(&self) -> &str {
        self.language
            .as_deref()
            .or_else(|| self.region.as_deref().and_then(region_default_language))
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    #[must_use]
    pub fn storefront_id(&self) -> Option<u32> {
        self.region.as_deref().and_then(storefront_id)
    }
}

fn is_region_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Filter out language codes that denote no particular language.
#[must_use]
pub fn language_code_or_none(code: &str) -> Option<&str> {
    let code = code.trim();
    if code.is_empty() || NO_LANGUAGE_CODES.contains(&code) {
        return None;
    }
    Some(code)
}

/// The primary language subtag, e.g. `pt` for `pt-BR`.
#[must_use]
pub fn primary_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[must_use]
pub fn storefront_id(region: &str) -> Option<u32> {
    let region = region.trim().to_ascii_uppercase();
    STOREFRONT_IDS
        .binary_search_by_key(&region.as_str(), |&(code, _)| code)
        .ok()
        .map(|index| STOREFRONT_IDS[index].1)
}

#[must_use]
pub fn region_default_language(region: &str) -> Option<&'static str> {
    let region = region.trim().to_ascii_uppercase();
    REGION_DEFAULT_LANGUAGES
        .binary_search_by_key(&region.as_str(), |&(code, _)| code)
        .ok()
        .map(|index| REGION_DEFAULT_LANGUAGES[index].1)
}

/// iTunes storefront ids by region, sorted by region code.
pub const STOREFRONT_IDS: &[(&str, u32)] = &[
    ("AD", 143611),
    ("AE", 143481),
    ("AF", 143610),
    ("AG", 143540),
    ("AI", 143538),
    ("AL", 143575),
    ("AM", 143524),
    ("AO", 143564),
    ("AR", 143505),
    ("AT", 143445),
    ("AU", 143460),
    ("AZ", 143568),
    ("BA", 143612),
    ("BB", 143541),
    ("BD", 143490),
    ("BE", 143446),
    ("BF", 143578),
    ("BG", 143526),
    ("BH", 143559),
    ("BJ", 143576),
    ("BM", 143542),
    ("BN", 143560),
    ("BO", 143556),
    ("BR", 143503),
    ("BS", 143539),
    ("BT", 143577),
    ("BW", 143525),
    ("BY", 143565),
    ("BZ", 143555),
    ("CA", 143455),
    ("CD", 143613),
    ("CF", 143623),
    ("CG", 143582),
    ("CH", 143459),
    ("CI", 143527),
    ("CL", 143483),
    ("CM", 143574),
    ("CN", 143465),
    ("CO", 143501),
    ("CR", 143495),
    ("CV", 143580),
    ("CY", 143557),
    ("CZ", 143489),
    ("DE", 143443),
    ("DK", 143458),
    ("DM", 143545),
    ("DO", 143508),
    ("DZ", 143563),
    ("EC", 143509),
    ("EE", 143518),
    ("EG", 143516),
    ("ES", 143454),
    ("ET", 143569),
    ("FI", 143447),
    ("FJ", 143583),
    ("FM", 143591),
    ("FR", 143442),
    ("GA", 143614),
    ("GB", 143444),
    ("GD", 143546),
    ("GE", 143615),
    ("GH", 143573),
    ("GM", 143584),
    ("GN", 143616),
    ("GR", 143448),
    ("GT", 143504),
    ("GW", 143585),
    ("GY", 143553),
    ("HK", 143463),
    ("HN", 143510),
    ("HR", 143494),
    ("HU", 143482),
    ("ID", 143476),
    ("IE", 143449),
    ("IL", 143491),
    ("IN", 143467),
    ("IQ", 143617),
    ("IS", 143558),
    ("IT", 143450),
    ("JM", 143511),
    ("JO", 143528),
    ("JP", 143462),
    ("KE", 143529),
    ("KG", 143586),
    ("KH", 143579),
    ("KN", 143548),
    ("KR", 143466),
    ("KW", 143493),
    ("KY", 143544),
    ("KZ", 143517),
    ("LA", 143587),
    ("LB", 143497),
    ("LC", 143549),
    ("LI", 143522),
    ("LK", 143486),
    ("LR", 143588),
    ("LT", 143520),
    ("LU", 143451),
    ("LV", 143519),
    ("LY", 143567),
    ("MA", 143620),
    ("MC", 143618),
    ("MD", 143523),
    ("ME", 143619),
    ("MG", 143531),
    ("MK", 143530),
    ("ML", 143532),
    ("MM", 143570),
    ("MN", 143592),
    ("MO", 143515),
    ("MR", 143590),
    ("MS", 143547),
    ("MT", 143521),
    ("MU", 143533),
    ("MV", 143488),
    ("MW", 143589),
    ("MX", 143468),
    ("MY", 143473),
    ("MZ", 143593),
    ("NA", 143594),
    ("NE", 143534),
    ("NG", 143561),
    ("NI", 143512),
    ("NL", 143452),
    ("NO", 143457),
    ("NP", 143484),
    ("NR", 143606),
    ("NZ", 143461),
    ("OM", 143562),
    ("PA", 143485),
    ("PE", 143507),
    ("PG", 143597),
    ("PH", 143474),
    ("PK", 143477),
    ("PL", 143478),
    ("PS", 143596),
    ("PT", 143453),
    ("PW", 143595),
    ("PY", 143513),
    ("QA", 143498),
    ("RO", 143487),
    ("RS", 143500),
    ("RU", 143469),
    ("RW", 143621),
    ("SA", 143479),
    ("SB", 143601),
    ("SC", 143599),
    ("SE", 143456),
    ("SG", 143464),
    ("SI", 143499),
    ("SK", 143496),
    ("SL", 143600),
    ("SN", 143535),
    ("SR", 143554),
    ("ST", 143598),
    ("SV", 143506),
    ("SZ", 143602),
    ("TC", 143552),
    ("TD", 143581),
    ("TH", 143475),
    ("TJ", 143603),
    ("TM", 143604),
    ("TN", 143536),
    ("TO", 143608),
    ("TR", 143480),
    ("TT", 143551),
    ("TW", 143470),
    ("TZ", 143572),
    ("UA", 143492),
    ("UG", 143537),
    ("US", 143441),
    ("UY", 143514),
    ("UZ", 143566),
    ("VC", 143550),
    ("VE", 143502),
    ("VG", 143543),
    ("VN", 143471),
    ("VU", 143609),
    ("WS", 143607),
    ("XK", 143624),
];

/// Catalog default languages by region, sorted by region code.
///
/// Regions that are missing default to English.
pub const REGION_DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("AE", "ar"),
    ("AR", "es-MX"),
    ("AT", "de"),
    ("BE", "fr"),
    ("BG", "bg"),
    ("BH", "ar"),
    ("BO", "es-MX"),
    ("BR", "pt-BR"),
    ("CA", "en-CA"),
    ("CH", "de-CH"),
    ("CL", "es-MX"),
    ("CN", "zh-Hans-CN"),
    ("CO", "es-MX"),
    ("CR", "es-MX"),
    ("CZ", "cs"),
    ("DE", "de"),
    ("DK", "da"),
    ("DO", "es-MX"),
    ("EC", "es-MX"),
    ("EE", "et"),
    ("EG", "ar"),
    ("ES", "es-ES"),
    ("FI", "fi"),
    ("FR", "fr"),
    ("GB", "en-GB"),
    ("GR", "el"),
    ("GT", "es-MX"),
    ("HK", "zh-Hant-HK"),
    ("HN", "es-MX"),
    ("HR", "hr"),
    ("HU", "hu"),
    ("ID", "id"),
    ("IE", "en-GB"),
    ("IL", "he"),
    ("IN", "en-GB"),
    ("IT", "it"),
    ("JO", "ar"),
    ("JP", "ja"),
    ("KR", "ko"),
    ("KW", "ar"),
    ("LB", "ar"),
    ("LT", "lt"),
    ("LU", "fr"),
    ("LV", "lv"),
    ("MO", "zh-Hant-HK"),
    ("MX", "es-MX"),
    ("MY", "ms"),
    ("NI", "es-MX"),
    ("NL", "nl"),
    ("NO", "nb"),
    ("NZ", "en-AU"),
    ("OM", "ar"),
    ("PA", "es-MX"),
    ("PE", "es-MX"),
    ("PL", "pl"),
    ("PT", "pt-PT"),
    ("PY", "es-MX"),
    ("QA", "ar"),
    ("RO", "ro"),
    ("RU", "ru"),
    ("SA", "ar"),
    ("SE", "sv"),
    ("SK", "sk"),
    ("SV", "es-MX"),
    ("TH", "th"),
    ("TR", "tr"),
    ("TW", "zh-Hant-TW"),
    ("UA", "uk"),
    ("US", "en-US"),
    ("UY", "es-MX"),
    ("VE", "es-MX"),
    ("VN", "vi"),
];

#[cfg(test)]
mod tests;
