//! Rendering one page variant to HTML.
//!
//! The baker does not know how pages are rendered. It asks a [`Renderer`] for
//! the response to a site-absolute URL (`/en-us/about/`) and treats anything
//! but a 2xx status as fatal for the whole bake.
//!
//! Two implementations ship:
//!
//! - [`HttpRenderer`]: requests the URL from a running instance of the site.
//! - Any `Fn(&str) -> Result<RenderResponse, RenderError> + Sync`, for
//!   in-process rendering and tests.
//!
//! ## Preamble
//!
//! Some render pipelines prefix the body with a debug banner separated from
//! the page by a blank line. With stripping enabled, everything up to and
//! including the first `\n\n` is dropped and the rest is trimmed. A body
//! without a blank line is all preamble and bakes to an empty page.
//!
//! ## HTTP
//!
//! Redirects are not followed: a 3xx is a non-success status like any other.
//! Bodies are read in full whatever their size. Only connection-level
//! failures (refused, reset, timed out) are retried.

use crate::config::RenderConfig;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("request for {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("rendering {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response for {url} is not valid UTF-8")]
    Encoding { url: String },
}

/// Raw response from the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RenderResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Produces the full response for a site-absolute URL.
pub trait Renderer: Sync {
    fn render(&self, url: &str) -> Result<RenderResponse, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<RenderResponse, RenderError> + Sync,
{
    fn render(&self, url: &str) -> Result<RenderResponse, RenderError> {
        self(url)
    }
}

/// Rendered HTML for one URL, held only until it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub url: String,
    pub html: String,
}

/// Render `url` and turn the response into page HTML.
pub fn render_page(
    renderer: &(impl Renderer + ?Sized),
    url: &str,
    strip: bool,
) -> Result<RenderedArtifact, RenderError> {
    let response = renderer.render(url)?;
    if !response.is_success() {
        return Err(RenderError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    let body = String::from_utf8(response.body).map_err(|_| RenderError::Encoding {
        url: url.to_string(),
    })?;

    let html = if strip {
        let stripped = strip_preamble(&body);
        if stripped.is_empty() && !body.trim().is_empty() {
            log::warn!("{url}: response has no blank line after its preamble, page is empty");
        }
        stripped.to_string()
    } else {
        body
    };

    Ok(RenderedArtifact {
        url: url.to_string(),
        html,
    })
}

/// Everything after the first blank line, trimmed.
pub fn strip_preamble(body: &str) -> &str {
    body.split_once("\n\n")
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default()
}

/// Renders pages by requesting them from a running site.
pub struct HttpRenderer {
    agent: Agent,
    base_url: String,
    retries: u32,
}

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

impl HttpRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            agent: create_agent(config.timeout()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
        }
    }

    fn request(&self, full_url: &str) -> Result<RenderResponse, ureq::Error> {
        let response = self.agent.get(full_url).call()?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        Ok(RenderResponse { status, body })
    }
}

/// Connection-level failures may succeed on a second attempt; protocol and
/// limit errors will not.
fn is_retryable(error: &ureq::Error) -> bool {
    !matches!(
        error,
        ureq::Error::StatusCode(_)
            | ureq::Error::BodyExceedsLimit(_)
            | ureq::Error::TooManyRedirects
            | ureq::Error::BadUri(_)
    )
}

impl Renderer for HttpRenderer {
    fn render(&self, url: &str) -> Result<RenderResponse, RenderError> {
        let full_url = format!("{}{}", self.base_url, url);
        let mut attempt = 0;
        loop {
            match self.request(&full_url) {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retries && is_retryable(&e) => {
                    attempt += 1;
                    log::warn!("{full_url}: {e}, retrying ({attempt}/{})", self.retries);
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(e) => {
                    return Err(RenderError::Transport {
                        url: full_url,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// HTTP agent with a global per-request timeout. Status codes, redirects
/// included, are returned as values so the caller decides what counts as
/// failure.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .max_redirects(0)
        .max_redirects_will_error(false)
        .build()
        .into()
}
