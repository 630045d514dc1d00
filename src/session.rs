//! The bake itself.
//!
//! A [`BuildSession`] runs a fixed sequence of stages against one build
//! directory:
//!
//! ```text
//! prepare directory → copy static → copy media → render items → promote primary language
//! ```
//!
//! There is no branching back and no partial success: the first error aborts
//! the run and is returned as a [`BakeError`]. Output already written stays
//! on disk; a failed bake leaves the build directory in an undefined state.
//!
//! ## Rendering
//!
//! For each published content item, and for each of its titles in storage
//! order:
//!
//! 1. render `/<language><language path>` through the [`Renderer`]
//! 2. run the [`HtmlTransform`] over the result
//! 3. write it to `<build_dir>/<base language><canonical path>/index.html`
//!
//! Items are rendered one at a time unless `jobs > 1`, in which case they are
//! spread over a rayon pool. Items write disjoint paths so no locking is
//! needed. The directory is fully prepared before any render starts and
//! promotion waits for every item to finish. On failure in parallel mode,
//! items already in flight may still complete.
//!
//! ## Progress
//!
//! Stages and finished items are reported as [`BakeEvent`]s over an optional
//! channel, formatted for the terminal by [`crate::output`]. An item is
//! reported once all of its pages are written, in completion order, which in
//! parallel mode need not be item order.

use crate::assets::{self, AssetOutcome};
use crate::config::{AssetMount, BuildOptions, ConfigError, SiteConfig};
use crate::content::{ContentError, ContentItem, ContentStore, ManifestStore};
use crate::directive::{BakeDirectives, HtmlTransform};
use crate::fsutil::{self, FilesystemError};
use crate::language::LanguageCode;
use crate::paths::{self, PathError};
use crate::promote::{self, PromotedEntry};
use crate::render::{self, HttpRenderer, RenderError, Renderer};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    #[error("Failed to start render workers: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}

/// The stages of a bake, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PrepareDirectory,
    CopyStatic,
    CopyMedia,
    RenderItems,
    PromotePrimaryLanguage,
}

/// Progress reported while baking.
#[derive(Debug, Clone, PartialEq)]
pub enum BakeEvent {
    StageStarted(Stage),
    DirectoryPrepared {
        path: PathBuf,
        deleted: bool,
    },
    AssetsCopied {
        stage: Stage,
        dest: PathBuf,
        outcome: AssetOutcome,
    },
    ItemsListed {
        count: usize,
    },
    /// Every language variant of one item has been written. Sent once per
    /// item, so pages of different items never interleave.
    ItemBaked {
        index: usize,
        key: String,
        pages: Vec<PageRecord>,
    },
    Promoted {
        language: String,
        entries: Vec<PromotedEntry>,
    },
}

/// One page written to the build tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// 1-based position of the item in the listing.
    pub index: usize,
    pub key: String,
    pub language: LanguageCode,
    /// The URL that was rendered.
    pub url: String,
    /// Written file, relative to the build directory.
    pub file: PathBuf,
}

/// Result of a successful bake.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeReport {
    pub build_dir: PathBuf,
    pub deleted_existing: bool,
    pub static_files: AssetOutcome,
    pub media: AssetOutcome,
    pub items: usize,
    pub pages: Vec<PageRecord>,
    pub promoted: Vec<PromotedEntry>,
}

/// One bake of one build directory.
pub struct BuildSession<'a> {
    options: &'a BuildOptions,
    store: &'a dyn ContentStore,
    renderer: &'a dyn Renderer,
    transform: &'a dyn HtmlTransform,
    strip_preamble: bool,
    events: Option<Sender<BakeEvent>>,
}

impl<'a> BuildSession<'a> {
    pub fn new(
        options: &'a BuildOptions,
        store: &'a dyn ContentStore,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Self {
            options,
            store,
            renderer,
            transform: &BakeDirectives,
            strip_preamble: true,
            events: None,
        }
    }

    pub fn with_transform(mut self, transform: &'a dyn HtmlTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn strip_preamble(mut self, strip: bool) -> Self {
        self.strip_preamble = strip;
        self
    }

    pub fn with_events(mut self, events: Sender<BakeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run every stage. Consumes the session: a build directory is baked at
    /// most once per session.
    pub fn run(self) -> Result<BakeReport, BakeError> {
        let opts = self.options;

        self.enter(Stage::PrepareDirectory);
        self.prepare_directory()?;

        let static_files =
            self.copy_assets(Stage::CopyStatic, &opts.static_files, opts.skip_static)?;
        let media = self.copy_assets(Stage::CopyMedia, &opts.media, opts.skip_media)?;

        self.enter(Stage::RenderItems);
        let items = self.store.list(opts.slug_filter.as_ref());
        log::info!("{} content items to bake", items.len());
        self.emit(BakeEvent::ItemsListed { count: items.len() });
        let pages = self.render_all_items(&items)?;

        self.enter(Stage::PromotePrimaryLanguage);
        let promoted = promote::promote_primary_language(&opts.build_dir, &opts.primary_language)?;
        self.emit(BakeEvent::Promoted {
            language: opts.primary_language.base().to_string(),
            entries: promoted.clone(),
        });

        Ok(BakeReport {
            build_dir: opts.build_dir.clone(),
            deleted_existing: opts.delete_existing,
            static_files,
            media,
            items: items.len(),
            pages,
            promoted,
        })
    }

    fn prepare_directory(&self) -> Result<(), BakeError> {
        let dir = &self.options.build_dir;
        let deleted = if self.options.delete_existing {
            fsutil::remove_dir_if_exists(dir)?
        } else {
            false
        };
        fsutil::create_dir_all(dir)?;
        log::info!(
            "build directory {} ready (removed previous: {deleted})",
            dir.display()
        );
        self.emit(BakeEvent::DirectoryPrepared {
            path: dir.clone(),
            deleted,
        });
        Ok(())
    }

    fn copy_assets(
        &self,
        stage: Stage,
        mount: &AssetMount,
        skip: bool,
    ) -> Result<AssetOutcome, BakeError> {
        self.enter(stage);
        let outcome = if skip {
            AssetOutcome::Skipped
        } else {
            assets::copy_assets(mount)?
        };
        self.emit(BakeEvent::AssetsCopied {
            stage,
            dest: relative_to(&self.options.build_dir, &mount.dest),
            outcome,
        });
        Ok(outcome)
    }

    fn render_all_items(&self, items: &[ContentItem]) -> Result<Vec<PageRecord>, BakeError> {
        if self.options.jobs <= 1 {
            let mut pages = Vec::new();
            for (i, item) in items.iter().enumerate() {
                pages.extend(self.bake_item(i + 1, item)?);
            }
            return Ok(pages);
        }

        log::info!("rendering with {} workers", self.options.jobs);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()?;
        let per_item: Vec<Vec<PageRecord>> = pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(i, item)| self.bake_item(i + 1, item))
                .collect::<Result<_, _>>()
        })?;
        Ok(per_item.into_iter().flatten().collect())
    }

    /// Render and write every language variant of one item.
    fn bake_item(&self, index: usize, item: &ContentItem) -> Result<Vec<PageRecord>, BakeError> {
        let build_dir = &self.options.build_dir;
        let canonical = item.canonical_url(None);
        let mut pages = Vec::with_capacity(item.titles().len());

        for title in item.titles() {
            let language = &title.language;
            let url = language_url(language, item.canonical_url(Some(language)));
            log::debug!("rendering {} ({}) from {url}", item.key, title.slug);

            let artifact = render::render_page(self.renderer, &url, self.strip_preamble)?;
            let html = self.transform.apply(&artifact.html);

            let dest = paths::page_destination(build_dir, canonical, language)?;
            fsutil::create_dir_all(&dest.dir)?;
            fsutil::write_file(&dest.file, html.as_bytes())?;

            let record = PageRecord {
                index,
                key: item.key.clone(),
                language: language.clone(),
                url: artifact.url,
                file: relative_to(build_dir, &dest.file),
            };
            pages.push(record);
        }
        self.emit(BakeEvent::ItemBaked {
            index,
            key: item.key.clone(),
            pages: pages.clone(),
        });
        Ok(pages)
    }

    fn enter(&self, stage: Stage) {
        log::debug!("entering stage {stage:?}");
        self.emit(BakeEvent::StageStarted(stage));
    }

    fn emit(&self, event: BakeEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }
}

/// `/en-us` + `/about/` → `/en-us/about/`
fn language_url(language: &LanguageCode, path: &str) -> String {
    if path.starts_with('/') {
        format!("/{language}{path}")
    } else {
        format!("/{language}/{path}")
    }
}

fn relative_to(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

/// Bake with the bundled collaborators: the JSON content manifest named in
/// `config` and an HTTP renderer pointed at `config.render.base_url`.
pub fn bake(
    config: &SiteConfig,
    options: &BuildOptions,
    events: Option<Sender<BakeEvent>>,
) -> Result<BakeReport, BakeError> {
    let store = ManifestStore::load(&config.content)?;
    log::info!(
        "loaded {} content items from {}",
        store.len(),
        config.content.display()
    );
    let renderer = HttpRenderer::new(&config.render);

    let mut session = BuildSession::new(options, &store, &renderer)
        .strip_preamble(config.render.strip_preamble);
    if let Some(tx) = events {
        session = session.with_events(tx);
    }
    session.run()
}
