//! CLI output formatting for a bake.
//!
//! Each [`BakeEvent`] becomes one or more display lines, and a finished
//! [`BakeReport`] becomes a short summary:
//!
//! ```text
//! ==> Preparing build directory
//!     Recreated build
//! ==> Copying static files
//!     Copied 14 files → static
//! ==> Copying media files
//!     Skipped
//! ==> Rendering pages
//!     2 content items
//! 001 index
//!     en-us /en-us/ → en/index.html
//!     de-de /de-de/ → de/index.html
//! 002 about
//!     en-us /en-us/about/ → en/about/index.html
//! ==> Promoting primary language
//!     en/about/ → about/
//!     en/index.html → index.html
//!
//! Baked 3 pages from 2 items in 2 languages → build
//! ```
//!
//! `format_*` functions are pure and return lines for testability;
//! `print_*` wrappers write them to stdout.

use crate::assets::AssetOutcome;
use crate::promote::PromotedEntry;
use crate::session::{BakeEvent, BakeReport, PageRecord, Stage};
use std::collections::BTreeSet;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

pub fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::PrepareDirectory => "Preparing build directory",
        Stage::CopyStatic => "Copying static files",
        Stage::CopyMedia => "Copying media files",
        Stage::RenderItems => "Rendering pages",
        Stage::PromotePrimaryLanguage => "Promoting primary language",
    }
}

/// Format a single progress event as display lines.
///
/// A baked item carries its own header, so the printer needs no state.
pub fn format_bake_event(event: &BakeEvent) -> Vec<String> {
    match event {
        BakeEvent::StageStarted(stage) => vec![format!("==> {}", stage_title(*stage))],
        BakeEvent::DirectoryPrepared { path, deleted } => {
            let verb = if *deleted { "Recreated" } else { "Using" };
            vec![format!("{}{} {}", indent(1), verb, path.display())]
        }
        BakeEvent::AssetsCopied { dest, outcome, .. } => {
            let line = match outcome {
                AssetOutcome::Copied { files } => {
                    format!("Copied {} → {}", plural(*files, "file", "files"), dest.display())
                }
                AssetOutcome::MissingSource => "Nothing to copy (source missing)".to_string(),
                AssetOutcome::Skipped => "Skipped".to_string(),
            };
            vec![format!("{}{}", indent(1), line)]
        }
        BakeEvent::ItemsListed { count } => {
            vec![format!("{}{}", indent(1), plural(*count, "content item", "content items"))]
        }
        BakeEvent::ItemBaked { index, key, pages } => {
            let mut lines = vec![format_item_header(*index, key)];
            lines.extend(pages.iter().map(format_page_line));
            lines
        }
        BakeEvent::Promoted { language, entries } => {
            if entries.is_empty() {
                return vec![format!("{}Nothing to promote from {}/", indent(1), language)];
            }
            entries
                .iter()
                .map(|entry| match entry {
                    PromotedEntry::Dir(name) => {
                        format!("{}{}/{}/ → {}/", indent(1), language, name, name)
                    }
                    PromotedEntry::File(name) => {
                        format!("{}{}/{} → {}", indent(1), language, name, name)
                    }
                })
                .collect()
        }
    }
}

/// Item header printed above its pages.
pub fn format_item_header(index: usize, key: &str) -> String {
    format!("{} {}", format_index(index), key)
}

fn format_page_line(page: &PageRecord) -> String {
    format!(
        "{}{} {} → {}",
        indent(1),
        page.language,
        page.url,
        page.file.display()
    )
}

/// Format the end-of-run summary.
pub fn format_bake_summary(report: &BakeReport) -> Vec<String> {
    let languages: BTreeSet<&str> = report.pages.iter().map(|p| p.language.as_str()).collect();
    vec![
        String::new(),
        format!(
            "Baked {} from {} in {} → {}",
            plural(report.pages.len(), "page", "pages"),
            plural(report.items, "item", "items"),
            plural(languages.len(), "language", "languages"),
            report.build_dir.display()
        ),
    ]
}

/// Print events as they arrive.
pub fn print_bake_events(events: impl IntoIterator<Item = BakeEvent>) {
    for event in events {
        for line in format_bake_event(&event) {
            println!("{}", line);
        }
    }
}

pub fn print_bake_summary(report: &BakeReport) {
    for line in format_bake_summary(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageCode;
    use std::path::PathBuf;

    fn page(index: usize, key: &str, lang: &str, url: &str, file: &str) -> PageRecord {
        PageRecord {
            index,
            key: key.to_string(),
            language: LanguageCode::parse(lang).unwrap(),
            url: url.to_string(),
            file: PathBuf::from(file),
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn stage_started_line() {
        let lines = format_bake_event(&BakeEvent::StageStarted(Stage::RenderItems));
        assert_eq!(lines, vec!["==> Rendering pages"]);
    }

    #[test]
    fn directory_prepared_lines() {
        let recreated = BakeEvent::DirectoryPrepared {
            path: PathBuf::from("build"),
            deleted: true,
        };
        let reused = BakeEvent::DirectoryPrepared {
            path: PathBuf::from("build"),
            deleted: false,
        };
        assert_eq!(format_bake_event(&recreated), vec!["    Recreated build"]);
        assert_eq!(format_bake_event(&reused), vec!["    Using build"]);
    }

    #[test]
    fn asset_outcome_lines() {
        let event = |outcome| BakeEvent::AssetsCopied {
            stage: Stage::CopyStatic,
            dest: PathBuf::from("static"),
            outcome,
        };
        assert_eq!(
            format_bake_event(&event(AssetOutcome::Copied { files: 1 })),
            vec!["    Copied 1 file → static"]
        );
        assert_eq!(
            format_bake_event(&event(AssetOutcome::Copied { files: 3 })),
            vec!["    Copied 3 files → static"]
        );
        assert_eq!(
            format_bake_event(&event(AssetOutcome::Skipped)),
            vec!["    Skipped"]
        );
        assert_eq!(
            format_bake_event(&event(AssetOutcome::MissingSource)),
            vec!["    Nothing to copy (source missing)"]
        );
    }

    #[test]
    fn item_baked_lines() {
        let event = BakeEvent::ItemBaked {
            index: 2,
            key: "about".to_string(),
            pages: vec![
                page(2, "about", "en-us", "/en-us/about/", "en/about/index.html"),
                page(2, "about", "de-de", "/de-de/ueber-uns/", "de/about/index.html"),
            ],
        };
        assert_eq!(
            format_bake_event(&event),
            vec![
                "002 about",
                "    en-us /en-us/about/ → en/about/index.html",
                "    de-de /de-de/ueber-uns/ → de/about/index.html",
            ]
        );
    }

    #[test]
    fn promoted_lines() {
        let event = BakeEvent::Promoted {
            language: "en".to_string(),
            entries: vec![
                PromotedEntry::Dir("about".to_string()),
                PromotedEntry::File("index.html".to_string()),
            ],
        };
        assert_eq!(
            format_bake_event(&event),
            vec!["    en/about/ → about/", "    en/index.html → index.html"]
        );
    }

    #[test]
    fn promoted_nothing() {
        let event = BakeEvent::Promoted {
            language: "en".to_string(),
            entries: vec![],
        };
        assert_eq!(
            format_bake_event(&event),
            vec!["    Nothing to promote from en/"]
        );
    }

    #[test]
    fn item_header() {
        assert_eq!(format_item_header(7, "contact"), "007 contact");
    }

    #[test]
    fn summary_counts_pages_items_languages() {
        let report = BakeReport {
            build_dir: PathBuf::from("build"),
            deleted_existing: true,
            static_files: AssetOutcome::Skipped,
            media: AssetOutcome::Skipped,
            items: 2,
            pages: vec![
                page(1, "index", "en-us", "/en-us/", "en/index.html"),
                page(1, "index", "de-de", "/de-de/", "de/index.html"),
                page(2, "about", "en-us", "/en-us/about/", "en/about/index.html"),
            ],
            promoted: vec![],
        };
        assert_eq!(
            format_bake_summary(&report),
            vec![
                "".to_string(),
                "Baked 3 pages from 2 items in 2 languages → build".to_string(),
            ]
        );
    }

    #[test]
    fn summary_singular() {
        let report = BakeReport {
            build_dir: PathBuf::from("out"),
            deleted_existing: false,
            static_files: AssetOutcome::Skipped,
            media: AssetOutcome::Skipped,
            items: 1,
            pages: vec![page(1, "index", "en", "/en/", "en/index.html")],
            promoted: vec![],
        };
        assert_eq!(
            format_bake_summary(&report)[1],
            "Baked 1 page from 1 item in 1 language → out"
        );
    }
}
