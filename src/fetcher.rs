//! Outbound HTTP: the size-capped GET behind `/fetch` and the HEAD probe
//! behind `/analyze`.

use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, CONTENT_LENGTH,
    CONTENT_TYPE, USER_AGENT,
};
use reqwest::{redirect, Client, ClientBuilder, Response};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::models::AccessibilityResult;
use crate::error::{AppError, Result};

/// Identity sent as `User-Agent` on every outbound request.
pub const CLIENT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; URL-Access-Tool/1.0; +https://github.com/open-webui/openapi-servers)";

/// Bodies larger than this abort the download.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const MAX_REDIRECTS: usize = 30;

/// A fully downloaded response body with its headline metadata.
#[derive(Debug)]
pub struct FetchedBody {
    pub status_code: u16,
    /// Lowercased `Content-Type`, empty when the header is missing.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pooled outbound clients, shared across requests for connection reuse.
///
/// Redirect policy is fixed per `reqwest::Client`, so one client exists for
/// each policy.
#[derive(Clone, Debug)]
pub struct HttpClients {
    following: Client,
    direct: Client,
}

impl HttpClients {
    pub fn new() -> Result<Self> {
        Ok(HttpClients {
            following: build_client(redirect::Policy::limited(MAX_REDIRECTS))?,
            direct: build_client(redirect::Policy::none())?,
        })
    }

    fn for_redirects(&self, follow: bool) -> &Client {
        if follow { &self.following } else { &self.direct }
    }

    /// Downloads `url`, failing on upstream 4xx/5xx and on bodies over
    /// [`MAX_BODY_BYTES`].
    pub async fn fetch(&self, url: &Url, follow_redirects: bool, timeout: Duration) -> Result<FetchedBody> {
        let start = Instant::now();
        let response = self
            .for_redirects(follow_redirects)
            .get(url.clone())
            .headers(browser_headers())
            .timeout(timeout)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(AppError::from_reqwest)?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        debug!(%url, status_code, %content_type, "response headers received");

        let bytes = read_capped(response, MAX_BODY_BYTES).await?;
        info!(
            %url,
            status_code,
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched body"
        );

        Ok(FetchedBody {
            status_code,
            content_type,
            bytes,
        })
    }

    /// Issues a HEAD request and describes the outcome. Never fails: every
    /// error is folded into the returned result.
    pub async fn analyze(&self, url: &Url, timeout: Duration) -> AccessibilityResult {
        let outcome = self
            .following
            .head(url.clone())
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .timeout(timeout)
            .send()
            .await;

        match outcome {
            Ok(response) => {
                let headers = response.headers();
                AccessibilityResult {
                    url: url.to_string(),
                    is_accessible: true,
                    content_type: Some(
                        headers
                            .get(CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    content_length: headers
                        .get(CONTENT_LENGTH)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_content_length),
                    status_code: Some(response.status().as_u16()),
                    error_message: None,
                }
            }
            Err(err) => {
                warn!(%url, error = %err, "HEAD probe failed");
                let status = err.status().map(|s| s.as_u16());
                AccessibilityResult::failure(url, status, probe_failure_message(&err))
            }
        }
    }
}

fn build_client(policy: redirect::Policy) -> Result<Client> {
    ClientBuilder::new()
        .redirect(policy)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Reads the body chunk by chunk. The limit is checked after each chunk is
/// appended, so up to one chunk beyond `limit` may be buffered before the
/// download is abandoned.
async fn read_capped(response: Response, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(AppError::from_reqwest)?;
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            warn!(read = body.len(), limit, "body exceeds size limit, aborting");
            return Err(AppError::PayloadTooLarge);
        }
    }

    Ok(body)
}

/// Accepts only plain ASCII digit strings.
fn parse_content_length(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Failure categories reported by the HEAD probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeFailure {
    Timeout,
    Connect,
    Http,
    Request,
    Internal,
}

impl ProbeFailure {
    fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else if err.is_connect() {
            ProbeFailure::Connect
        } else if err.is_status() {
            ProbeFailure::Http
        } else if err.is_builder() {
            ProbeFailure::Internal
        } else {
            ProbeFailure::Request
        }
    }
}

fn probe_failure_message(err: &reqwest::Error) -> String {
    match ProbeFailure::classify(err) {
        ProbeFailure::Timeout => AppError::Timeout.to_string(),
        ProbeFailure::Connect => AppError::ConnectionFailed.to_string(),
        ProbeFailure::Http => format!("HTTP error: {}", err),
        ProbeFailure::Request => format!("Request error: {}", err),
        ProbeFailure::Internal => format!("An internal error occurred: {}", err),
    }
}
