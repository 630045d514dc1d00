//! Shared test utilities for the bakerman test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = sample_store();
//! let renderer = MockRenderer::echo().status("/de-de/", 500);
//! // ... run a session ...
//! assert_eq!(renderer.requested(), vec!["/en-us/", "/de-de/"]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

use crate::content::{ContentItem, ManifestStore, Title};
use crate::language::LanguageCode;
use crate::render::{RenderError, RenderResponse, Renderer};

// =========================================================================
// Renderer
// =========================================================================

/// Renderer that serves canned responses and records every requested URL.
/// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
#[derive(Default)]
pub struct MockRenderer {
    responses: HashMap<String, RenderResponse>,
    echo: bool,
    requested: Mutex<Vec<String>>,
}

impl MockRenderer {
    /// Unknown URLs get a 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown URLs get `BANNER\n\n<p>{url}</p>`.
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), RenderResponse::ok(body));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            url.to_string(),
            RenderResponse {
                status,
                body: b"error".to_vec(),
            },
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Renderer for MockRenderer {
    fn render(&self, url: &str) -> Result<RenderResponse, RenderError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(response) = self.responses.get(url) {
            return Ok(response.clone());
        }
        if self.echo {
            return Ok(RenderResponse::ok(format!("BANNER\n\n<p>{url}</p>")));
        }
        Ok(RenderResponse {
            status: 404,
            body: Vec::new(),
        })
    }
}

// =========================================================================
// HTTP
// =========================================================================

/// Canned answer from [`spawn_site`].
pub struct SiteReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
    /// Sleep before answering.
    pub delay: Duration,
}

impl SiteReply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok("error")
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            headers: vec![("Location", location.to_string())],
            ..Self::status(301)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A local site on an ephemeral port. Every connection is served on its own
/// thread; request paths are recorded in arrival order.
pub struct TestSite {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl TestSite {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

pub fn spawn_site<F>(reply: F) -> TestSite
where
    F: Fn(&str) -> SiteReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&hits);
    let reply = Arc::new(reply);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let log = Arc::clone(&log);
            let reply = Arc::clone(&reply);
            thread::spawn(move || {
                let Ok(read_half) = stream.try_clone() else { return };
                let mut reader = BufReader::new(read_half);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    return;
                }
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }
                let path = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                log.lock().unwrap().push(path.clone());

                let answer = reply(&path);
                thread::sleep(answer.delay);
                let mut head = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n",
                    answer.status,
                    answer.body.len()
                );
                for (name, value) in &answer.headers {
                    head.push_str(&format!("{name}: {value}\r\n"));
                }
                head.push_str("\r\n");
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&answer.body);
            });
        }
    });

    TestSite { base_url, hits }
}

// =========================================================================
// Content
// =========================================================================

pub fn title(language: &str, slug: &str, path: Option<&str>, published: bool) -> Title {
    Title {
        language: LanguageCode::parse(language).unwrap(),
        slug: slug.to_string(),
        path: path.map(str::to_string),
        published,
    }
}

/// Two published items in English and German, plus an unpublished draft:
///
/// ```text
/// index  /        en-us, de-de
/// draft  /draft/  en-us (unpublished)
/// about  /about/  en-us /about/, de-de /ueber-uns/
/// ```
pub fn sample_store() -> ManifestStore {
    ManifestStore::new(vec![
        ContentItem {
            key: "index".to_string(),
            path: "/".to_string(),
            titles: vec![
                title("en-us", "home", None, true),
                title("de-de", "start", None, true),
            ],
        },
        ContentItem {
            key: "draft".to_string(),
            path: "/draft/".to_string(),
            titles: vec![title("en-us", "draft", None, false)],
        },
        ContentItem {
            key: "about".to_string(),
            path: "/about/".to_string(),
            titles: vec![
                title("en-us", "about", Some("/about/"), true),
                title("de-de", "ueber-uns", Some("/ueber-uns/"), true),
            ],
        },
    ])
    .unwrap()
}

// =========================================================================
// Filesystem
// =========================================================================

/// Every file under `root`, keyed by `/`-separated relative path.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (key, std::fs::read(e.path()).unwrap())
        })
        .collect()
}
