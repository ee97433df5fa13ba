//! Streaming event model for step generation
//!
//! Defines the discriminated StreamEvent union emitted by a generation
//! endpoint, plus the Message and ToolInvocation records the Step Executor
//! accumulates while consuming a stream. Events are transient and never
//! persisted directly; only finalized messages reach the message store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single event in a step's generation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text content
    TextDelta { content: String },
    /// A tool call has been opened (arguments may still be partial)
    ToolCallStart {
        id: String,
        name: String,
        args: Value,
    },
    /// A tool call completed with a result
    ToolCallResult {
        id: String,
        name: String,
        args: Value,
        result: Value,
    },
    /// The stream failed mid-flight
    Error { reason: String },
    /// Terminal event - no further events follow
    Done {
        finish_reason: FinishReason,
        #[serde(default)]
        usage: TokenUsage,
    },
}

/// Reason why a stream finished
///
/// `Stop` marks an explicit user cancellation; every other reason means the
/// accumulated message should be validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Complete,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Accumulate usage from another attempt
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Message roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Lifecycle state of a tool invocation within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationState {
    PartialCall,
    Call,
    Result,
    Error,
}

/// One tool invocation recorded on a message
///
/// Two invocations with identical `(name, serialized-args)` are duplicates
/// and collapse to a single record via [`merge_invocation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub args: Value,
    pub state: InvocationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ToolInvocation {
    /// Deduplication key: name plus canonical serialized arguments
    pub fn dedup_key(&self) -> String {
        invocation_key(&self.name, &self.args)
    }
}

/// Canonical `(name, serialized-args)` key used for invocation deduplication
pub fn invocation_key(name: &str, args: &Value) -> String {
    format!("{name}:{args}")
}

/// Merge an invocation into a per-message list, collapsing duplicates
///
/// A later record with the same key replaces the stored state/result when it
/// carries more information (a `Result` upgrades a `PartialCall`/`Call`); a
/// duplicate partial record is dropped.
pub fn merge_invocation(invocations: &mut Vec<ToolInvocation>, incoming: ToolInvocation) {
    let key = incoming.dedup_key();
    match invocations.iter_mut().find(|i| i.dedup_key() == key) {
        Some(existing) => {
            if matches!(incoming.state, InvocationState::Result | InvocationState::Error) {
                existing.state = incoming.state;
                existing.result = incoming.result;
            }
        }
        None => invocations.push(incoming),
    }
}

/// A finalized message produced by one step attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub tool_invocations: Vec<ToolInvocation>,
    #[serde(default)]
    pub token_usage: TokenUsage,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create an assistant message from accumulated stream state
    pub fn assistant(
        content: String,
        tool_invocations: Vec<ToolInvocation>,
        token_usage: TokenUsage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            content,
            tool_invocations,
            token_usage,
            created_at: Utc::now(),
        }
    }
}
