//! In-memory [`JsonClient`] for adapter tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use restaurant_health_source_models::AuthConfig;

use crate::{JsonClient, SourceError};

/// Serves canned response bodies in order and records every request.
/// Once the queue is empty it answers with `[]`.
pub struct FakeClient {
    responses: Mutex<VecDeque<serde_json::Value>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
}

impl FakeClient {
    pub fn new(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Query parameters of every request made, in order.
    pub fn requests(&self) -> Vec<Vec<(String, String)>> {
        self.requests.lock().unwrap().clone()
    }

    /// Value of `name` in request number `index`.
    pub fn param(&self, index: usize, name: &str) -> Option<String> {
        self.requests()
            .get(index)?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl JsonClient for FakeClient {
    async fn request(
        &self,
        _url: &str,
        params: &[(String, String)],
        _auth: Option<&AuthConfig>,
    ) -> Result<serde_json::Value, SourceError> {
        self.requests.lock().unwrap().push(params.to_vec());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| serde_json::json!([])))
    }
}
