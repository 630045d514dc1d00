//! Promotion of the primary language to the build root.
//!
//! Every language is baked under its base code (`build/en/...`,
//! `build/de/...`). Visitors hitting `/about/` without a language prefix
//! should get the primary language, so its top-level entries are copied up:
//!
//! ```text
//! build/en/index.html   →  build/index.html     (file: overwritten)
//! build/en/about/       →  build/about/         (dir: removed, then copied)
//! ```
//!
//! Directories are replaced as a whole, never merged file by file, so a page
//! removed from the primary language does not survive at the root. The
//! language-coded subtree stays in place.

use crate::fsutil::{self, FilesystemError};
use crate::language::LanguageCode;
use std::path::Path;

/// One top-level entry copied to the build root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotedEntry {
    Dir(String),
    File(String),
}

impl PromotedEntry {
    pub fn name(&self) -> &str {
        match self {
            PromotedEntry::Dir(name) | PromotedEntry::File(name) => name,
        }
    }
}

/// Copy `<build_dir>/<primary base>/*` into `<build_dir>`.
///
/// Creates the language directory if it does not exist yet, in which case
/// there is nothing to promote. Entries are processed in file-name order.
pub fn promote_primary_language(
    build_dir: &Path,
    primary: &LanguageCode,
) -> Result<Vec<PromotedEntry>, FilesystemError> {
    let base = primary.base();
    let src_root = build_dir.join(base);
    fsutil::create_dir_all(&src_root)?;

    let mut promoted = Vec::new();
    for entry in fsutil::read_dir_sorted(&src_root)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == base {
            // Promoting `en/en` would delete the tree being copied from.
            log::warn!("skipping {}/{name}: it shadows its own language directory", base);
            continue;
        }
        let src = entry.path();
        let target = build_dir.join(&name);

        fsutil::remove_entry_if_exists(&target)?;
        if src.is_dir() {
            fsutil::copy_dir_recursive(&src, &target)?;
            promoted.push(PromotedEntry::Dir(name));
        } else {
            fsutil::copy_file(&src, &target)?;
            promoted.push(PromotedEntry::File(name));
        }
    }
    Ok(promoted)
}
