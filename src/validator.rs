//! Response validation
//!
//! Pure, side-effect-free checks deciding whether a finalized message is a
//! complete, usable step result. A message is valid when it carries a
//! `final_result` tool invocation with non-empty args, or when its text
//! content parses as a structured object with a truthy completion marker and
//! a non-empty context payload. Everything else is invalid and triggers a
//! retry.

use crate::content::RawContent;
use crate::stream::{InvocationState, Message, ToolInvocation};
use serde_json::Value;

/// Tool name designating a step's terminal structured output
pub const FINAL_RESULT_TOOL: &str = "final_result";
/// Marker field for text-form structured results
pub const COMPLETION_MARKER_FIELD: &str = "completed";
/// Field holding the payload in text-form structured results
pub const CONTEXT_PAYLOAD_FIELD: &str = "context";

/// Outcome of validating a message
#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Decide whether a finalized message is a usable step result
pub fn validate(message: &Message) -> Validity {
    if final_result_invocation(message).is_some() {
        return Validity::Valid;
    }
    if structured_text_payload(message).is_some() {
        return Validity::Valid;
    }

    if message.content.is_empty() && message.tool_invocations.is_empty() {
        Validity::Invalid("empty response: no content, no tool invocations".to_string())
    } else {
        Validity::Invalid("no final result in response".to_string())
    }
}

/// Extract the normalized payload from a valid message
///
/// Returns `None` when the message has no extractable result; the caller
/// treats that as invalid.
pub fn extract_payload(message: &Message) -> Option<RawContent> {
    if let Some(invocation) = final_result_invocation(message) {
        return Some(RawContent::from_value(invocation.args.clone()));
    }
    structured_text_payload(message).map(RawContent::from_value)
}

/// The `final_result` invocation, if the message carries a usable one
fn final_result_invocation(message: &Message) -> Option<&ToolInvocation> {
    message.tool_invocations.iter().find(|invocation| {
        invocation.name == FINAL_RESULT_TOOL
            && matches!(
                invocation.state,
                InvocationState::Result | InvocationState::Call
            )
            && non_empty_args(&invocation.args)
    })
}

/// The context payload from text-form structured results, if present
fn structured_text_payload(message: &Message) -> Option<Value> {
    let parsed: Value = serde_json::from_str(&message.content).ok()?;
    let obj = parsed.as_object()?;

    let completed = obj
        .get(COMPLETION_MARKER_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !completed {
        return None;
    }

    let context = obj.get(CONTEXT_PAYLOAD_FIELD)?;
    if non_empty_args(context) {
        Some(context.clone())
    } else {
        None
    }
}

fn non_empty_args(args: &Value) -> bool {
    match args {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
