//! Mapping from (canonical URL path, language) to a file in the build tree.
//!
//! ```text
//! /section/page/  +  en-us   →   <build_dir>/en/section/page/index.html
//! /               +  de-de   →   <build_dir>/de/index.html
//! ```
//!
//! The mapping is pure: directories are created by the caller. Every page is
//! written as a fixed-named index document so the output can be served by any
//! static file server that resolves `dir/` to `dir/index.html`.

use crate::language::LanguageCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name written in every leaf directory.
pub const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("URL path {url:?} contains a `{segment}` segment and would escape the build directory")]
    Traversal { url: String, segment: String },
}

/// Where a single rendered page lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDestination {
    /// Directory that must exist before writing.
    pub dir: PathBuf,
    /// Full path of the index document inside `dir`.
    pub file: PathBuf,
}

/// Compute the destination of a page for one language.
///
/// Only the path component of `canonical_url` is used, so absolute URLs
/// (`https://example.org/about/?x=1`) map the same as `/about/`. A trailing
/// separator is not significant.
pub fn page_destination(
    build_dir: &Path,
    canonical_url: &str,
    language: &LanguageCode,
) -> Result<PageDestination, PathError> {
    let mut dir = build_dir.join(language.base());
    for segment in url_segments(canonical_url) {
        if segment == "." || segment == ".." {
            return Err(PathError::Traversal {
                url: canonical_url.to_string(),
                segment: segment.to_string(),
            });
        }
        dir.push(segment);
    }
    let file = dir.join(INDEX_FILE);
    Ok(PageDestination { dir, file })
}

/// Non-empty path segments of a URL, ignoring scheme, host, query and fragment.
fn url_segments(url: &str) -> impl Iterator<Item = &str> {
    let path = match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = &url[scheme_end + 3..];
            after_scheme.find('/').map_or("", |i| &after_scheme[i..])
        }
        None => url,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}
