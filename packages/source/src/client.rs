//! HTTP client seam used by every adapter.
//!
//! Adapters depend on the [`JsonClient`] trait rather than on `reqwest`
//! directly so the fetch driver can be exercised against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use restaurant_health_source_models::AuthConfig;

use crate::retry::{self, RetryPolicy};
use crate::{FetchFailure, SourceError};

/// Identifies this client to the open-data portals.
pub const USER_AGENT: &str = "Restaurant-Health-Inspector/1.0";

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Issues a GET and returns the parsed JSON body.
#[async_trait]
pub trait JsonClient: Send + Sync {
    /// Sends `params` as URL-encoded query parameters to `url`.
    ///
    /// # Errors
    ///
    /// * [`SourceError::Fetch`] for permanent failures
    /// * [`SourceError::TransientFetch`] once retries are exhausted
    async fn request(
        &self,
        url: &str,
        params: &[(String, String)],
        auth: Option<&AuthConfig>,
    ) -> Result<serde_json::Value, SourceError>;
}

/// `reqwest`-backed [`JsonClient`] with retry and backoff.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl FetchClient {
    /// Builds a client with the default timeout, headers, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Fetch`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, SourceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Fetch {
                url: String::new(),
                reason: FetchFailure::Request(e.to_string()),
            })?;

        Ok(Self {
            client,
            policy: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl JsonClient for FetchClient {
    async fn request(
        &self,
        url: &str,
        params: &[(String, String)],
        auth: Option<&AuthConfig>,
    ) -> Result<serde_json::Value, SourceError> {
        let token = auth.and_then(resolve_token);
        let mut query = params.to_vec();
        if let (Some(auth), Some(token)) = (auth, token.as_deref())
            && let Some(param) = &auth.query_param
        {
            query.push((param.clone(), token.to_string()));
        }

        retry::send_json(
            || {
                let mut req = self.client.get(url).query(&query);
                if let (Some(auth), Some(token)) = (auth, token.as_deref())
                    && let Some(header) = &auth.header
                {
                    req = req.header(header.as_str(), token);
                }
                req
            },
            url,
            &self.policy,
        )
        .await
    }
}

/// Reads the app token from the environment, trying the jurisdiction's own
/// variable before the shared fallback.
fn resolve_token(auth: &AuthConfig) -> Option<String> {
    let lookup = |name: &str| {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let token = lookup(&auth.env_var).or_else(|| auth.fallback_env_var.as_deref().and_then(lookup));
    if token.is_none() {
        log::debug!(
            "{} is not set, sending unauthenticated requests",
            auth.env_var
        );
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransientKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serves one canned HTTP response per accepted connection.
    async fn serve(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/resource/test.json")
    }

    fn fast_client() -> FetchClient {
        FetchClient::new().unwrap().with_retry_policy(RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let url = serve("200 OK", r#"[{"dba":"JOE'S PIZZA"}]"#).await;
        let value = fast_client().request(&url, &[], None).await.unwrap();
        assert_eq!(value[0]["dba"], "JOE'S PIZZA");
    }

    #[tokio::test]
    async fn non_success_status_fails_without_retry() {
        let url = serve("404 Not Found", "{}").await;
        let err = fast_client().request(&url, &[], None).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Fetch {
                reason: FetchFailure::Status(404),
                ..
            }
        ));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn malformed_json_fails_with_parse_reason() {
        let url = serve("200 OK", "<html>not json</html>").await;
        let err = fast_client().request(&url, &[], None).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Fetch {
                reason: FetchFailure::Parse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn refused_connection_exhausts_retries() {
        let err = fast_client()
            .request("http://127.0.0.1:1/resource/test.json", &[], None)
            .await
            .unwrap_err();
        match err {
            SourceError::TransientFetch { kind, attempts, .. } => {
                assert_eq!(kind, TransientKind::Connection);
                assert_eq!(attempts, 4);
            }
            other => panic!("expected TransientFetch, got {other:?}"),
        }
    }

    #[test]
    fn missing_token_resolves_to_none() {
        let auth = AuthConfig {
            env_var: "RESTAURANT_HEALTH_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            fallback_env_var: None,
            header: Some("X-App-Token".to_string()),
            query_param: None,
        };
        assert_eq!(resolve_token(&auth), None);
    }
}
