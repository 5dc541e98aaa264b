//! Device preferences: cookie consent and UI language.

use serde::{Deserialize, Serialize};

use crate::device_store::{keys, LocalDeviceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieConsent {
    Accepted,
    Declined,
}

impl CookieConsent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookieConsent::Accepted => "accepted",
            CookieConsent::Declined => "declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accepted" => Some(CookieConsent::Accepted),
            "declined" => Some(CookieConsent::Declined),
            _ => None,
        }
    }
}

/// Stored choice, `None` until the banner is answered.
pub fn cookie_consent(store: &dyn LocalDeviceStore) -> Option<CookieConsent> {
    store
        .get(keys::COOKIE_CONSENT)
        .as_deref()
        .and_then(CookieConsent::parse)
}

pub fn set_cookie_consent(store: &dyn LocalDeviceStore, consent: CookieConsent) {
    store.set(keys::COOKIE_CONSENT, consent.as_str());
}

/// UI language. Turkish is the site default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Tr,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Tr => "tr",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "tr" => Some(Language::Tr),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

/// Stored language if known, otherwise English for an `en*` browser and
/// the default for anything else.
pub fn language(store: &dyn LocalDeviceStore, browser_language: Option<&str>) -> Language {
    if let Some(stored) = store.get(keys::LANGUAGE).as_deref().and_then(Language::from_code) {
        return stored;
    }
    let primary = browser_language
        .and_then(|tag| tag.split('-').next())
        .unwrap_or_default();
    if primary.eq_ignore_ascii_case("en") {
        Language::En
    } else {
        Language::default()
    }
}

pub fn set_language(store: &dyn LocalDeviceStore, language: Language) {
    store.set(keys::LANGUAGE, language.code());
}
