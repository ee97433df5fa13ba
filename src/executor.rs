//! Step execution
//!
//! The Step Executor issues one step invocation against the generation
//! endpoint and consumes its event stream in emission order, buffering text
//! deltas, merging tool invocations (duplicates by `(name, args)` collapse
//! to one record), and finalizing on `Done`. Every finalized message is
//! persisted through the message store before validation runs, so history
//! survives later invalidation.

use crate::content::RawContent;
use crate::endpoint::{EndpointError, GenerationEndpoint, GenerationRequest, MessageStore};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::pipeline::state::ContextEntry;
use crate::strategy::StepDefinition;
use crate::stream::{
    merge_invocation, FinishReason, InvocationState, Message, StreamEvent, TokenUsage,
    ToolInvocation,
};
use crate::validator;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag, observed at StreamEvent boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal outcome of one step attempt
#[derive(Debug)]
pub enum StepOutcome {
    /// Validated result with its normalized payload
    Completed {
        message: Message,
        payload: RawContent,
    },
    /// Invalid or transport-failed attempt; retryable
    Invalid {
        message: Option<Message>,
        reason: String,
    },
    /// Explicit cancellation; no retry, no result recorded
    Cancelled,
}

/// Issues one step invocation and reports its terminal outcome
pub struct StepExecutor {
    endpoint: Arc<dyn GenerationEndpoint>,
    store: Arc<dyn MessageStore>,
    pipeline_key: String,
    cancel: CancelFlag,
}

impl StepExecutor {
    pub fn new(
        endpoint: Arc<dyn GenerationEndpoint>,
        store: Arc<dyn MessageStore>,
        pipeline_key: String,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            endpoint,
            store,
            pipeline_key,
            cancel,
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Execute one attempt of the given step with the accumulated context
    pub async fn execute(
        &self,
        step: &StepDefinition,
        context: &BTreeMap<String, ContextEntry>,
    ) -> OrchestratorResult<StepOutcome> {
        let prior_messages = self.store.load(&self.pipeline_key).await?;
        debug!(
            step_id = step.id,
            step_title = %step.title,
            endpoint = self.endpoint.name(),
            prior_messages = prior_messages.len(),
            "Executing step"
        );

        let request = GenerationRequest {
            pipeline_key: self.pipeline_key.clone(),
            prompt: step.prompt.clone(),
            model: step.model_name.clone(),
            step_ordinal: step.id,
            prior_messages,
            context: raw_context(context),
        };

        let mut events = match self.endpoint.generate(request).await {
            Ok(events) => events,
            // A misconfigured endpoint cannot be retried into working
            Err(EndpointError::NotConfigured(reason)) => {
                return Err(OrchestratorError::setup(reason));
            }
            Err(e) => {
                warn!(step_id = step.id, error = %e, "Generation request failed");
                return Ok(StepOutcome::Invalid {
                    message: None,
                    reason: e.to_string(),
                });
            }
        };

        let mut text = String::new();
        let mut invocations: Vec<ToolInvocation> = Vec::new();

        loop {
            if self.cancel.is_set() {
                info!(step_id = step.id, "Step cancelled mid-stream");
                return Ok(StepOutcome::Cancelled);
            }

            let Some(event) = events.recv().await else {
                warn!(step_id = step.id, "Stream closed before done event");
                return Ok(StepOutcome::Invalid {
                    message: None,
                    reason: "stream closed before done".to_string(),
                });
            };

            match event {
                StreamEvent::TextDelta { content } => text.push_str(&content),
                StreamEvent::ToolCallStart { id, name, args } => {
                    merge_invocation(
                        &mut invocations,
                        ToolInvocation {
                            id,
                            name,
                            args,
                            state: InvocationState::PartialCall,
                            result: None,
                        },
                    );
                }
                StreamEvent::ToolCallResult {
                    id,
                    name,
                    args,
                    result,
                } => {
                    merge_invocation(
                        &mut invocations,
                        ToolInvocation {
                            id,
                            name,
                            args,
                            state: InvocationState::Result,
                            result: Some(result),
                        },
                    );
                }
                StreamEvent::Error { reason } => {
                    warn!(step_id = step.id, reason = %reason, "Stream reported error");
                    return Ok(StepOutcome::Invalid {
                        message: None,
                        reason,
                    });
                }
                StreamEvent::Done {
                    finish_reason,
                    usage,
                } => {
                    return self
                        .finalize(step, text, invocations, finish_reason, usage)
                        .await;
                }
            }
        }
    }

    /// Build the message, persist it, then validate
    async fn finalize(
        &self,
        step: &StepDefinition,
        text: String,
        invocations: Vec<ToolInvocation>,
        finish_reason: FinishReason,
        usage: TokenUsage,
    ) -> OrchestratorResult<StepOutcome> {
        let message = Message::assistant(text, invocations, usage);

        // Persisted before validation so history survives invalidation
        self.store.save(&self.pipeline_key, &message).await?;

        if finish_reason == FinishReason::Stop {
            info!(step_id = step.id, "Generation stopped by user");
            return Ok(StepOutcome::Cancelled);
        }

        match validator::validate(&message) {
            validator::Validity::Valid => match validator::extract_payload(&message) {
                Some(payload) => {
                    debug!(
                        step_id = step.id,
                        tokens = message.token_usage.total_tokens,
                        "Step attempt produced a valid result"
                    );
                    Ok(StepOutcome::Completed { message, payload })
                }
                None => Ok(StepOutcome::Invalid {
                    message: Some(message),
                    reason: "result payload could not be extracted".to_string(),
                }),
            },
            validator::Validity::Invalid(reason) => {
                warn!(step_id = step.id, reason = %reason, "Step attempt invalid");
                Ok(StepOutcome::Invalid {
                    message: Some(message),
                    reason,
                })
            }
        }
    }
}

fn raw_context(context: &BTreeMap<String, ContextEntry>) -> BTreeMap<String, Value> {
    context
        .iter()
        .map(|(key, entry)| (key.clone(), entry.raw.clone()))
        .collect()
}
