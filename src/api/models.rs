use std::ops::RangeInclusive;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};

/// Longest URL accepted on input.
const MAX_URL_LENGTH: usize = 2083;

const FETCH_TIMEOUT_SECS: RangeInclusive<u64> = 1..=120;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const ANALYZE_TIMEOUT_SECS: RangeInclusive<u64> = 1..=60;
const DEFAULT_ANALYZE_TIMEOUT_SECS: u64 = 10;

/// A metadata entry: a single string (`description`, `og_*`) or a list (`json_keys`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

/// Page metadata in the order entries were discovered.
pub type Metadata = IndexMap<String, MetadataValue>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResult {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_type: String,
    pub status_code: u16,
    pub word_count: usize,
    pub metadata: Metadata,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityResult {
    pub url: String,
    pub is_accessible: bool,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

impl AccessibilityResult {
    pub fn failure(url: &Url, status_code: Option<u16>, message: String) -> Self {
        AccessibilityResult {
            url: url.to_string(),
            is_accessible: false,
            status_code,
            error_message: Some(message),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

/// Last value given for `key`; repeated parameters override earlier ones.
fn last_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
}

/// Raw `/fetch` query string. Values are kept as text so that every
/// validation failure is reported the same way.
#[derive(Debug, Default)]
pub struct FetchQuery {
    pub url: Option<String>,
    pub extract_text: Option<String>,
    pub follow_redirects: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub url: Url,
    pub extract_text: bool,
    pub follow_redirects: bool,
    pub timeout: Duration,
}

impl FetchQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        FetchQuery {
            url: last_value(pairs, "url"),
            extract_text: last_value(pairs, "extract_text"),
            follow_redirects: last_value(pairs, "follow_redirects"),
            timeout: last_value(pairs, "timeout"),
        }
    }

    pub fn validate(self) -> Result<FetchParams> {
        Ok(FetchParams {
            url: parse_target_url(self.url.as_deref())?,
            extract_text: parse_flag("extract_text", self.extract_text.as_deref(), true)?,
            follow_redirects: parse_flag("follow_redirects", self.follow_redirects.as_deref(), true)?,
            timeout: parse_timeout(self.timeout.as_deref(), FETCH_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS)?,
        })
    }
}

/// Raw `/analyze` query string.
#[derive(Debug, Default)]
pub struct AnalyzeQuery {
    pub url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub url: Url,
    pub timeout: Duration,
}

impl AnalyzeQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        AnalyzeQuery {
            url: last_value(pairs, "url"),
            timeout: last_value(pairs, "timeout"),
        }
    }

    pub fn validate(self) -> Result<AnalyzeParams> {
        Ok(AnalyzeParams {
            url: parse_target_url(self.url.as_deref())?,
            timeout: parse_timeout(self.timeout.as_deref(), ANALYZE_TIMEOUT_SECS, DEFAULT_ANALYZE_TIMEOUT_SECS)?,
        })
    }
}

/// Accepts only absolute http(s) URLs with a host.
fn parse_target_url(raw: Option<&str>) -> Result<Url> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::validation("url", "field required"))?;

    if raw.len() > MAX_URL_LENGTH {
        return Err(AppError::validation(
            "url",
            format!("URL should have at most {MAX_URL_LENGTH} characters"),
        ));
    }

    let url = Url::parse(raw).map_err(|e| AppError::validation("url", format!("invalid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation("url", "URL scheme should be 'http' or 'https'"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::validation("url", "URL must include a host"));
    }

    Ok(url)
}

fn parse_flag(field: &'static str, raw: Option<&str>, default: bool) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(AppError::validation(field, "value could not be parsed to a boolean")),
    }
}

fn parse_timeout(raw: Option<&str>, bounds: RangeInclusive<u64>, default: u64) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };

    let secs = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::validation("timeout", "value is not a valid integer"))?;

    match u64::try_from(secs) {
        Ok(secs) if bounds.contains(&secs) => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::validation(
            "timeout",
            format!("value should be between {} and {}", bounds.start(), bounds.end()),
        )),
    }
}
