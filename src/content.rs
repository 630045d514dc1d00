//! Content items and their per-language titles.
//!
//! The content store is the system of record for pages; the baker only reads
//! it. [`ContentStore`] is the seam: anything that can list published items
//! can drive a bake. [`ManifestStore`] is the bundled implementation, backed
//! by a JSON export of the CMS page tree:
//!
//! ```json
//! {
//!   "items": [
//!     {
//!       "key": "about",
//!       "path": "/about/",
//!       "titles": [
//!         { "language": "en-us", "slug": "about", "path": "/about/", "published": true },
//!         { "language": "de-de", "slug": "ueber-uns", "path": "/ueber-uns/", "published": true }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `path` on the item is the canonical, language-independent URL and decides
//! where every language variant is written. A title's own `path` is only used
//! to build the URL that is rendered.

use crate::config::SlugFilter;
use crate::language::LanguageCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error reading content manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in content manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Content item {0:?} has no titles")]
    NoTitles(String),
    #[error("Content item has an empty key")]
    EmptyKey,
}

/// One language variant of a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub language: LanguageCode,
    pub slug: String,
    /// Language-specific URL path. Falls back to the item's canonical path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// A publishable page, identified by a stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub key: String,
    /// Canonical URL path, e.g. `/section/page/`.
    pub path: String,
    pub titles: Vec<Title>,
}

impl ContentItem {
    /// Titles in storage order.
    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    /// The canonical URL path, or the path of the variant for `language`.
    pub fn canonical_url(&self, language: Option<&LanguageCode>) -> &str {
        language
            .and_then(|lang| self.titles.iter().find(|t| &t.language == lang))
            .and_then(|t| t.path.as_deref())
            .unwrap_or(&self.path)
    }

    /// Published when at least one language variant is published.
    pub fn is_published(&self) -> bool {
        self.titles.iter().any(|t| t.published)
    }
}

/// Read access to the content store.
pub trait ContentStore: Sync {
    /// Published items, restricted to `filter` when given, deduplicated by
    /// key, in storage order.
    fn list(&self, filter: Option<&SlugFilter>) -> Vec<ContentItem>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    items: Vec<ContentItem>,
}

/// Content store loaded from a JSON manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    items: Vec<ContentItem>,
}

impl ManifestStore {
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let file: ManifestFile = serde_json::from_str(json)?;
        Self::new(file.items)
    }

    pub fn new(items: Vec<ContentItem>) -> Result<Self, ContentError> {
        for item in &items {
            if item.key.is_empty() {
                return Err(ContentError::EmptyKey);
            }
            if item.titles.is_empty() {
                return Err(ContentError::NoTitles(item.key.clone()));
            }
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ContentStore for ManifestStore {
    fn list(&self, filter: Option<&SlugFilter>) -> Vec<ContentItem> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| item.is_published())
            .filter(|item| filter.is_none_or(|f| f.contains(&item.key)))
            .filter(|item| seen.insert(item.key.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "items": [
            {
                "key": "index",
                "path": "/",
                "titles": [
                    { "language": "en-us", "slug": "home", "published": true },
                    { "language": "de-de", "slug": "start", "published": true }
                ]
            },
            {
                "key": "about",
                "path": "/about/",
                "titles": [
                    { "language": "en-us", "slug": "about", "path": "/about/", "published": true },
                    { "language": "de-de", "slug": "ueber", "path": "/ueber/", "published": false }
                ]
            },
            {
                "key": "draft",
                "path": "/draft/",
                "titles": [
                    { "language": "en-us", "slug": "draft", "published": false }
                ]
            },
            {
                "key": "about",
                "path": "/about-duplicate/",
                "titles": [
                    { "language": "en-us", "slug": "about", "published": true }
                ]
            }
        ]
    }"#;

    fn keys(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn list_returns_published_deduplicated_in_order() {
        let store = ManifestStore::from_json(MANIFEST).unwrap();
        assert_eq!(store.len(), 4);

        let items = store.list(None);
        assert_eq!(keys(&items), vec!["index", "about"]);
        assert_eq!(items[1].path, "/about/");
    }

    #[test]
    fn list_applies_key_filter() {
        let store = ManifestStore::from_json(MANIFEST).unwrap();
        let filter = SlugFilter::parse("about,draft,missing").unwrap();
        assert_eq!(keys(&store.list(Some(&filter))), vec!["about"]);
    }

    #[test]
    fn listed_item_keeps_all_titles_in_storage_order() {
        let store = ManifestStore::from_json(MANIFEST).unwrap();
        let items = store.list(None);
        let langs: Vec<&str> = items[1].titles().iter().map(|t| t.language.as_str()).collect();
        assert_eq!(langs, vec!["en-us", "de-de"]);
    }

    #[test]
    fn canonical_url_per_language() {
        let store = ManifestStore::from_json(MANIFEST).unwrap();
        let about = &store.list(None)[1];
        let de = LanguageCode::parse("de-de").unwrap();
        let fr = LanguageCode::parse("fr-fr").unwrap();

        assert_eq!(about.canonical_url(None), "/about/");
        assert_eq!(about.canonical_url(Some(&de)), "/ueber/");
        // Unknown language falls back to the canonical path
        assert_eq!(about.canonical_url(Some(&fr)), "/about/");
    }

    #[test]
    fn title_without_path_falls_back_to_canonical() {
        let store = ManifestStore::from_json(MANIFEST).unwrap();
        let index = &store.list(None)[0];
        let de = LanguageCode::parse("de-de").unwrap();
        assert_eq!(index.canonical_url(Some(&de)), "/");
    }

    #[test]
    fn malformed_language_fails_to_load() {
        let json = r#"{"items": [{"key": "a", "path": "/a/",
            "titles": [{"language": "-us", "slug": "a", "published": true}]}]}"#;
        let err = ManifestStore::from_json(json).unwrap_err();
        assert!(matches!(err, ContentError::Json(_)));
        assert!(err.to_string().contains("malformed language code"));
    }

    #[test]
    fn item_without_titles_is_rejected() {
        let json = r#"{"items": [{"key": "a", "path": "/a/", "titles": []}]}"#;
        assert!(matches!(
            ManifestStore::from_json(json),
            Err(ContentError::NoTitles(key)) if key == "a"
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let json = r#"{"items": [{"key": "", "path": "/a/",
            "titles": [{"language": "en", "slug": "a", "published": true}]}]}"#;
        assert!(matches!(
            ManifestStore::from_json(json),
            Err(ContentError::EmptyKey)
        ));
    }
}
