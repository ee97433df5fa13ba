//! External interfaces: generation endpoint and message store
//!
//! Both seams are async traits so tests can inject scripted doubles. The
//! generation endpoint accepts a request carrying the step's prompt, its
//! 1-based ordinal, the prior messages, and the accumulated context, and
//! returns an ordered stream of [`StreamEvent`]s terminating in `Done`.

use crate::stream::{Message, StreamEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Buffered events per in-flight stream channel
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// One step invocation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub pipeline_key: String,
    pub prompt: String,
    pub model: String,
    /// 1-based ordinal of the step within its strategy
    pub step_ordinal: usize,
    pub prior_messages: Vec<Message>,
    /// Raw results of prior steps, keyed by context key
    pub context: BTreeMap<String, Value>,
}

/// Generation endpoint errors
#[derive(Debug, Clone, Error)]
pub enum EndpointError {
    #[error("Endpoint not configured: {0}")]
    NotConfigured(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Streaming generation endpoint
#[async_trait]
pub trait GenerationEndpoint: Send + Sync {
    /// Endpoint name for logging
    fn name(&self) -> &str;

    /// Issue one step invocation and return its event stream
    ///
    /// Events must be delivered in emission order; the channel closing
    /// without a `Done` event is treated as a broken stream by the caller.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, EndpointError>;
}

/// Message store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Save failed: {0}")]
    SaveFailed(String),
    #[error("Load failed: {0}")]
    LoadFailed(String),
}

/// Append/read message persistence, keyed by pipeline
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save(&self, pipeline_key: &str, message: &Message) -> Result<(), StoreError>;
    async fn load(&self, pipeline_key: &str) -> Result<Vec<Message>, StoreError>;
}

/// In-memory message store
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<HashMap<String, Vec<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, pipeline_key: &str, message: &Message) -> Result<(), StoreError> {
        let mut messages = self.messages.lock().await;
        messages
            .entry(pipeline_key.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn load(&self, pipeline_key: &str) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.lock().await;
        Ok(messages.get(pipeline_key).cloned().unwrap_or_default())
    }
}

/// HTTP generation endpoint
///
/// Posts the request to `{base_url}/generate` and expects a JSON array of
/// stream events in emission order, which it replays through the channel.
pub struct HttpGenerationEndpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGenerationEndpoint {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EndpointError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerationEndpoint for HttpGenerationEndpoint {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, EndpointError> {
        let url = format!("{}/generate", self.base_url);
        debug!(
            url = %url,
            step_ordinal = request.step_ordinal,
            prior_messages = request.prior_messages.len(),
            "Issuing generation request"
        );

        let mut http_request = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| EndpointError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::RequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let events: Vec<StreamEvent> = response
            .json()
            .await
            .map_err(|e| EndpointError::InvalidResponse(e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    warn!("Stream consumer dropped before all events were delivered");
                    break;
                }
            }
        });

        Ok(rx)
    }
}
