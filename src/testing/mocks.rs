//! Mock implementations for testing
//!
//! Provides mock GenerationEndpoint and MessageStore implementations to
//! enable comprehensive testing without external dependencies. Endpoint
//! scripts are consumed in order, one per `generate` call, and every
//! request is recorded for assertions.

use crate::endpoint::{
    EndpointError, GenerationEndpoint, GenerationRequest, MessageStore, StoreError,
};
use crate::stream::{FinishReason, Message, StreamEvent, TokenUsage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Mock generation endpoint replaying scripted event sequences
#[derive(Debug, Default)]
pub struct MockGenerationEndpoint {
    scripts: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    /// Delay between replayed events, for cancellation tests
    event_delay: Option<Duration>,
    should_fail: bool,
}

impl MockGenerationEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint that replays the given scripts, one per `generate` call
    pub fn with_scripts(scripts: Vec<Vec<StreamEvent>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    pub async fn push_script(&self, script: Vec<StreamEvent>) {
        self.scripts.lock().await.push_back(script);
    }

    pub async fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl GenerationEndpoint for MockGenerationEndpoint {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, EndpointError> {
        self.requests.lock().await.push(request);

        if self.should_fail {
            return Err(EndpointError::RequestFailed(
                "mock endpoint failure".to_string(),
            ));
        }

        // An exhausted script queue replays an empty stream, which the
        // executor reports as a broken stream
        let script = self.scripts.lock().await.pop_front().unwrap_or_default();
        let delay = self.event_delay;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            for event in script {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

/// Mock message store recording saves per pipeline key
#[derive(Debug, Default)]
pub struct MockMessageStore {
    saved: Arc<Mutex<Vec<(String, Message)>>>,
    should_fail: bool,
}

impl MockMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub async fn saved_messages(&self) -> Vec<(String, Message)> {
        self.saved.lock().await.clone()
    }

    pub async fn saved_count(&self) -> usize {
        self.saved.lock().await.len()
    }
}

#[async_trait]
impl MessageStore for MockMessageStore {
    async fn save(&self, pipeline_key: &str, message: &Message) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(StoreError::SaveFailed("mock save failure".to_string()));
        }
        self.saved
            .lock()
            .await
            .push((pipeline_key.to_string(), message.clone()));
        Ok(())
    }

    async fn load(&self, pipeline_key: &str) -> Result<Vec<Message>, StoreError> {
        if self.should_fail {
            return Err(StoreError::LoadFailed("mock load failure".to_string()));
        }
        Ok(self
            .saved
            .lock()
            .await
            .iter()
            .filter(|(key, _)| key == pipeline_key)
            .map(|(_, message)| message.clone())
            .collect())
    }
}

/// Script builders for common stream shapes
pub mod scripts {
    use super::*;

    /// A stream delivering the payload through a `final_result` tool call
    pub fn valid_final_result(payload: Value) -> Vec<StreamEvent> {
        vec![
            StreamEvent::TextDelta {
                content: "Working on it...".to_string(),
            },
            StreamEvent::ToolCallStart {
                id: "call-1".to_string(),
                name: "final_result".to_string(),
                args: payload.clone(),
            },
            StreamEvent::ToolCallResult {
                id: "call-1".to_string(),
                name: "final_result".to_string(),
                args: payload,
                result: Value::Null,
            },
            StreamEvent::Done {
                finish_reason: FinishReason::ToolCalls,
                usage: TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 50,
                    total_tokens: 150,
                },
            },
        ]
    }

    /// A stream whose message has no content and no tool invocations
    pub fn invalid_empty() -> Vec<StreamEvent> {
        vec![StreamEvent::Done {
            finish_reason: FinishReason::Length,
            usage: TokenUsage::default(),
        }]
    }

    /// A stream aborted by an error event
    pub fn transport_error(reason: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::TextDelta {
                content: "partial".to_string(),
            },
            StreamEvent::Error {
                reason: reason.to_string(),
            },
        ]
    }

    /// A stream finished by explicit user cancellation
    pub fn user_stop() -> Vec<StreamEvent> {
        vec![
            StreamEvent::TextDelta {
                content: "partial".to_string(),
            },
            StreamEvent::Done {
                finish_reason: FinishReason::Stop,
                usage: TokenUsage::default(),
            },
        ]
    }
}
