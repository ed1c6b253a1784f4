//! Best-effort locale and timezone prediction from the host environment.
//!
//! The reference tables cover the countries reachable from the supported
//! locales; matching walks language -> country -> timezone and compares
//! the host UTC offset against each candidate's standard and DST offsets.

use chrono::{Local, Offset};

/// Locales the provisioned image ships language packs for.
pub const SUPPORTED_LOCALES: &[&str] = &[
    "en_US.UTF-8",
    "en_AU.UTF-8",
    "en_CA.UTF-8",
    "en_GB.UTF-8",
    "en_HK.UTF-8",
    "en_SG.UTF-8",
    "ja_JP.UTF-8",
    "zh_CN.UTF-8",
];

struct TimezoneRef {
    name: &'static str,
    country: &'static str,
    /// Standard offset from UTC, minutes.
    utc_offset: i32,
    /// Offset during daylight saving, minutes.
    dst_offset: i32,
}

const TIMEZONES: &[TimezoneRef] = &[
    TimezoneRef { name: "America/New_York", country: "US", utc_offset: -300, dst_offset: -240 },
    TimezoneRef { name: "America/Chicago", country: "US", utc_offset: -360, dst_offset: -300 },
    TimezoneRef { name: "America/Denver", country: "US", utc_offset: -420, dst_offset: -360 },
    TimezoneRef { name: "America/Phoenix", country: "US", utc_offset: -420, dst_offset: -420 },
    TimezoneRef { name: "America/Los_Angeles", country: "US", utc_offset: -480, dst_offset: -420 },
    TimezoneRef { name: "America/Anchorage", country: "US", utc_offset: -540, dst_offset: -480 },
    TimezoneRef { name: "Pacific/Honolulu", country: "US", utc_offset: -600, dst_offset: -600 },
    TimezoneRef { name: "America/St_Johns", country: "CA", utc_offset: -210, dst_offset: -150 },
    TimezoneRef { name: "America/Halifax", country: "CA", utc_offset: -240, dst_offset: -180 },
    TimezoneRef { name: "America/Toronto", country: "CA", utc_offset: -300, dst_offset: -240 },
    TimezoneRef { name: "America/Winnipeg", country: "CA", utc_offset: -360, dst_offset: -300 },
    TimezoneRef { name: "America/Edmonton", country: "CA", utc_offset: -420, dst_offset: -360 },
    TimezoneRef { name: "America/Vancouver", country: "CA", utc_offset: -480, dst_offset: -420 },
    TimezoneRef { name: "Europe/London", country: "GB", utc_offset: 0, dst_offset: 60 },
    TimezoneRef { name: "Australia/Sydney", country: "AU", utc_offset: 600, dst_offset: 660 },
    TimezoneRef { name: "Australia/Brisbane", country: "AU", utc_offset: 600, dst_offset: 600 },
    TimezoneRef { name: "Australia/Adelaide", country: "AU", utc_offset: 570, dst_offset: 630 },
    TimezoneRef { name: "Australia/Darwin", country: "AU", utc_offset: 570, dst_offset: 570 },
    TimezoneRef { name: "Australia/Perth", country: "AU", utc_offset: 480, dst_offset: 480 },
    TimezoneRef { name: "Asia/Hong_Kong", country: "HK", utc_offset: 480, dst_offset: 480 },
    TimezoneRef { name: "Asia/Singapore", country: "SG", utc_offset: 480, dst_offset: 480 },
    TimezoneRef { name: "Asia/Tokyo", country: "JP", utc_offset: 540, dst_offset: 540 },
    TimezoneRef { name: "Asia/Shanghai", country: "CN", utc_offset: 480, dst_offset: 480 },
];

const LANGUAGE_COUNTRIES: &[(&str, &[&str])] = &[
    ("en", &["US", "CA", "GB", "AU", "HK", "SG"]),
    ("ja", &["JP"]),
    ("zh", &["CN", "HK", "SG"]),
];

/// Predicted environment settings for the env-info wizard page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub timezone: String,
    pub language: String,
    pub country: String,
    /// Empty when the matched locale is not in [`SUPPORTED_LOCALES`].
    pub locale: String,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            country: "US".to_string(),
            locale: "en_US.UTF-8".to_string(),
        }
    }
}

/// Predicts from `LC_ALL`/`LANG` and the host's current UTC offset.
pub fn predict_locale_and_timezone() -> Prediction {
    let tag = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_default();
    let offset_minutes = Local::now().offset().fix().local_minus_utc() / 60;
    match_locale_and_timezone(&tag, offset_minutes)
}

/// Pure matching core: `tag` is a locale tag like `en_US.UTF-8` or
/// `ja-JP`; `offset_minutes` is the host offset from UTC.
pub fn match_locale_and_timezone(tag: &str, offset_minutes: i32) -> Prediction {
    let bare = tag.split('.').next().unwrap_or_default();
    if bare.is_empty() {
        return Prediction::default();
    }
    let parts: Vec<&str> = bare.split(['_', '-']).collect();
    let (language, explicit_country) = match parts.as_slice() {
        [lang] => (*lang, None),
        [lang, country] => (*lang, Some(*country)),
        _ => return Prediction::default(),
    };

    let Some((_, countries)) = LANGUAGE_COUNTRIES.iter().find(|(l, _)| *l == language) else {
        return Prediction::default();
    };

    let candidates: Vec<&TimezoneRef> = countries
        .iter()
        .flat_map(|country| TIMEZONES.iter().filter(move |tz| tz.country == *country))
        .collect();

    // Standard-offset matches outrank DST matches; first hit wins.
    let matched = candidates
        .iter()
        .find(|tz| tz.utc_offset == offset_minutes)
        .or_else(|| candidates.iter().find(|tz| tz.dst_offset == offset_minutes));
    let Some(tz) = matched else {
        return Prediction::default();
    };

    let country = explicit_country.unwrap_or(tz.country).to_uppercase();
    let locale = format!("{language}_{country}.UTF-8");
    let locale = if SUPPORTED_LOCALES.contains(&locale.as_str()) {
        locale
    } else {
        String::new()
    };
    Prediction {
        timezone: tz.name.to_string(),
        language: language.to_string(),
        country,
        locale,
    }
}

/// Reference-table lookup used to back-fill Wi-Fi country codes.
pub fn country_code_for_timezone(name: &str) -> Option<&'static str> {
    if name == "UTC" {
        return Some("US");
    }
    TIMEZONES
        .iter()
        .find(|tz| tz.name == name)
        .map(|tz| tz.country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn japanese_host_maps_to_tokyo() {
        let p = match_locale_and_timezone("ja_JP.UTF-8", 540);
        assert_eq!(p.timezone, "Asia/Tokyo");
        assert_eq!(p.locale, "ja_JP.UTF-8");
        assert_eq!(p.country, "JP");
    }

    #[test]
    fn bare_language_takes_the_matched_timezones_country() {
        let p = match_locale_and_timezone("en", -300);
        assert_eq!(p.timezone, "America/New_York");
        assert_eq!(p.locale, "en_US.UTF-8");
    }

    #[test]
    fn dst_offset_matches_when_standard_does_not() {
        let p = match_locale_and_timezone("en-GB", 60);
        assert_eq!(p.timezone, "Europe/London");
        assert_eq!(p.locale, "en_GB.UTF-8");
    }

    #[test]
    fn unknown_language_falls_back_to_defaults() {
        assert_eq!(match_locale_and_timezone("de_DE.UTF-8", 60), Prediction::default());
        assert_eq!(match_locale_and_timezone("", 0), Prediction::default());
    }

    #[test]
    fn unsupported_locale_is_cleared_but_timezone_kept() {
        let p = match_locale_and_timezone("en_IN", -300);
        assert_eq!(p.timezone, "America/New_York");
        assert_eq!(p.locale, "");
        assert_eq!(p.country, "IN");
    }

    #[test]
    fn timezone_country_lookup() {
        assert_eq!(country_code_for_timezone("Asia/Tokyo"), Some("JP"));
        assert_eq!(country_code_for_timezone("UTC"), Some("US"));
        assert_eq!(country_code_for_timezone("Mars/Olympus"), None);
    }
}
