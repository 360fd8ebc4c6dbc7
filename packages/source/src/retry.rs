//! HTTP retry helpers for transient errors.
//!
//! Every request goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so timeouts, refused
//! connections, and interrupted body reads are retried with linear backoff.
//! Non-2xx responses and malformed JSON are permanent and fail on the first
//! attempt.
//!
//! # Usage
//!
//! ```ignore
//! use crate::retry::{self, RetryPolicy};
//!
//! let body = retry::send_json(|| client.get(&url).query(&params), &url, &RetryPolicy::default()).await?;
//! ```

use std::time::Duration;

use crate::{FetchFailure, SourceError, TransientKind};

/// Number of retries after the initial attempt.
pub const MAX_RETRIES: u32 = 3;

/// Base backoff delay. Retry `n` waits `n` times this.
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Retry budget and backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Linear backoff unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Total attempts, including the first.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// One failed attempt, before the retry decision.
enum Attempt {
    Transient(TransientKind, String),
    Permanent(FetchFailure),
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
/// `url` is only used for error reporting.
///
/// # Errors
///
/// * [`SourceError::Fetch`] for a non-2xx status, a body that is not JSON,
///   or a request that could not be built or sent
/// * [`SourceError::TransientFetch`] once every attempt has failed with a
///   timeout, connection error, or interrupted body read
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    url: &str,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last: Option<(TransientKind, String)> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!(
                "  retry {attempt}/{} for {url} in {delay:?}...",
                policy.max_retries
            );
            tokio::time::sleep(delay).await;
        }

        match try_once(&build_request, url).await {
            Ok(value) => return Ok(value),
            Err(Attempt::Permanent(reason)) => {
                return Err(SourceError::Fetch {
                    url: url.to_string(),
                    reason,
                });
            }
            Err(Attempt::Transient(kind, message)) => {
                log::warn!("  transient {kind} error from {url}: {message}");
                last = Some((kind, message));
            }
        }
    }

    let (kind, message) =
        last.unwrap_or_else(|| (TransientKind::Other, "no attempts were made".to_string()));
    Err(SourceError::TransientFetch {
        url: url.to_string(),
        kind,
        attempts: policy.attempts(),
        message,
    })
}

#[allow(clippy::future_not_send)]
async fn try_once<F>(build_request: &F, url: &str) -> Result<serde_json::Value, Attempt>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = build_request().send().await.map_err(classify_send)?;

    let status = response.status();
    if !status.is_success() {
        log::error!("HTTP {status} from {url}");
        return Err(Attempt::Permanent(FetchFailure::Status(status.as_u16())));
    }

    let text = response.text().await.map_err(|e| {
        let kind = if e.is_timeout() {
            TransientKind::Timeout
        } else {
            TransientKind::Other
        };
        Attempt::Transient(kind, e.to_string())
    })?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        Attempt::Permanent(FetchFailure::Parse(e.to_string()))
    })
}

fn classify_send(e: reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Transient(TransientKind::Timeout, e.to_string())
    } else if e.is_connect() {
        Attempt::Transient(TransientKind::Connection, e.to_string())
    } else if e.is_body() {
        Attempt::Transient(TransientKind::Other, e.to_string())
    } else {
        Attempt::Permanent(FetchFailure::Request(e.to_string()))
    }
}
