//! # Bakerman
//!
//! Bakes a dynamically rendered, multi-language CMS site into a directory of
//! flat HTML files that can be dropped on any CDN or static file server.
//!
//! # Pipeline
//!
//! ```text
//! 1. Prepare   build/ is recreated (or reused for a partial bake)
//! 2. Assets    static/ and media/ roots are copied in
//! 3. Render    every published page × every language → build/<lang>/<path>/index.html
//! 4. Promote   build/<primary lang>/* is copied up to build/
//! ```
//!
//! The content store and the renderer are collaborators behind traits
//! ([`content::ContentStore`], [`render::Renderer`]). The bundled
//! implementations read a JSON export of the page tree and request each page
//! from the running site over HTTP.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `bake.toml` loading/validation and per-run [`config::BuildOptions`] |
//! | [`language`] | `base-region` language codes |
//! | [`content`] | Content items, titles, and the JSON-backed content store |
//! | [`render`] | Renderer trait, HTTP renderer, preamble stripping |
//! | [`directive`] | `/*enable-on-bake*...*/` resolution |
//! | [`paths`] | (canonical URL, language) → file in the build tree |
//! | [`assets`] | Static and media directory copies |
//! | [`promote`] | Primary-language promotion to the build root |
//! | [`session`] | The bake orchestrator and its progress events |
//! | [`output`] | CLI formatting of progress and summary |
//! | [`fsutil`] | Filesystem helpers with path-carrying errors |
//!
//! # Design Decisions
//!
//! ## All or Nothing
//!
//! Any render failure, malformed language code or I/O error aborts the bake.
//! A static site with a silently missing page is worse than no deploy, so
//! there is no skip-and-continue mode.
//!
//! ## Explicit Configuration
//!
//! Settings are resolved once into an immutable [`config::BuildOptions`] and
//! passed down. Nothing reads process-wide state mid-run, which is what lets
//! the render stage run on a thread pool.
//!
//! ## Canonical Paths
//!
//! Every language variant is written under the item's canonical path
//! (`build/de/about/`), not its translated slug. Links between languages then
//! only differ in their first segment.

pub mod assets;
pub mod config;
pub mod content;
pub mod directive;
pub mod fsutil;
pub mod language;
pub mod output;
pub mod paths;
pub mod promote;
pub mod render;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
