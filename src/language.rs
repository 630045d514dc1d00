//! Language codes of the form `base[-region]`.
//!
//! Every title in the content store carries a full language code such as
//! `en-us` or `pt-br`. The build tree is keyed by the *base* language only
//! (`en`, `pt`), while render URLs use the full code. [`LanguageCode`] parses
//! once and exposes both, so a malformed code fails at the boundary instead of
//! being silently truncated somewhere downstream.
//!
//! Accepted shapes:
//! - `"en"` → base `en`, no region
//! - `"en-us"` → base `en`, region `us`
//! - `"zh-hant-tw"` → base `zh`, region `hant-tw`
//!
//! Rejected: empty strings, a missing base (`"-us"`), a dangling delimiter
//! (`"en-"`, `"en--us"`), and anything outside ASCII letters, digits and `-`.
//!
//! A bare base with no region (`"en"`) is accepted on purpose, although
//! stored codes normally carry a `-region` part; it still maps to `build/en/`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the base language and the region/script subtags.
pub const DELIMITER: char = '-';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("empty language code")]
    Empty,
    #[error("malformed language code {0:?}: expected `base` or `base-region`")]
    Malformed(String),
}

/// A validated language code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode {
    full: String,
    base_len: usize,
}

impl LanguageCode {
    pub fn parse(code: &str) -> Result<Self, LanguageError> {
        if code.is_empty() {
            return Err(LanguageError::Empty);
        }
        let malformed = || LanguageError::Malformed(code.to_string());

        let mut parts = code.split(DELIMITER);
        let base = parts.next().ok_or_else(malformed)?;
        if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(malformed());
        }
        for subtag in parts {
            if subtag.is_empty() || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(malformed());
            }
        }

        Ok(Self {
            full: code.to_string(),
            base_len: base.len(),
        })
    }

    /// The full code as stored, e.g. `en-us`.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The base language, e.g. `en` for `en-us`.
    pub fn base(&self) -> &str {
        &self.full[..self.base_len]
    }

    /// Everything after the first delimiter, if any.
    pub fn region(&self) -> Option<&str> {
        self.full.get(self.base_len + 1..)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_and_region() {
        let code = LanguageCode::parse("en-us").unwrap();
        assert_eq!(code.base(), "en");
        assert_eq!(code.region(), Some("us"));
        assert_eq!(code.as_str(), "en-us");
        assert_eq!(code.to_string(), "en-us");
    }

    #[test]
    fn base_only() {
        let code = LanguageCode::parse("de").unwrap();
        assert_eq!(code.base(), "de");
        assert_eq!(code.region(), None);
    }

    #[test]
    fn multi_subtag_keeps_first_base() {
        let code = LanguageCode::parse("zh-hant-tw").unwrap();
        assert_eq!(code.base(), "zh");
        assert_eq!(code.region(), Some("hant-tw"));
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(LanguageCode::parse(""), Err(LanguageError::Empty));
    }

    #[test]
    fn malformed_codes_fail_fast() {
        for bad in ["-us", "en-", "en--us", "en us", "en_us", "e1-us", "en-u$"] {
            assert!(
                matches!(LanguageCode::parse(bad), Err(LanguageError::Malformed(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn deserializes_with_validation() {
        let ok: LanguageCode = serde_json::from_str("\"fr-ca\"").unwrap();
        assert_eq!(ok.base(), "fr");

        let err = serde_json::from_str::<LanguageCode>("\"fr-\"").unwrap_err();
        assert!(err.to_string().contains("malformed language code"));
    }
}
