//! Error types for pipeline orchestration
//!
//! Transport and validation failures are recovered through the retry path
//! and never surface here directly; this module covers the terminal error
//! taxonomy (retry exhaustion, fatal setup failures, store failures, bad
//! commands) plus sanitization of user-visible failure text.

use crate::config::ConfigError;
use crate::endpoint::{EndpointError, StoreError};
use thiserror::Error;

/// Main error type for orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Step {step_index} failed after {attempts} attempts")]
    RetryExhausted { step_index: usize, attempts: u32 },

    #[error("Setup failed: {message}")]
    Setup { message: String },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    #[error("Message store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl OrchestratorError {
    pub fn setup<S: Into<String>>(message: S) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    pub fn invalid_command<S: Into<String>>(message: S) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Sanitized form suitable for user-facing notifications
    pub fn user_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Sanitize error messages to prevent sensitive data leakage
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    // Remove common secret patterns
    sanitized = regex::Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+")
        .unwrap()
        .replace_all(&sanitized, "${1}=***")
        .to_string();

    // Remove potential file paths that might contain sensitive info
    sanitized =
        regex::Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
            .unwrap()
            .replace_all(&sanitized, "/***REDACTED***/")
            .to_string();

    // Truncate very long messages - ensure total length is <= 500
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let mut cut = 500 - truncate_suffix.len();
        // Walk back to a char boundary so multi-byte text cannot split
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_display() {
        let error = OrchestratorError::RetryExhausted {
            step_index: 2,
            attempts: 3,
        };
        assert_eq!(error.to_string(), "Step 2 failed after 3 attempts");
    }

    #[test]
    fn test_setup_constructor() {
        let error = OrchestratorError::setup("no API key configured");
        assert!(matches!(error, OrchestratorError::Setup { .. }));
    }

    #[test]
    fn test_user_message_redacts_secrets() {
        let error =
            OrchestratorError::setup("auth failed: password=hunter2 token=abc123 against endpoint");
        let message = error.user_message();

        assert!(!message.contains("hunter2"));
        assert!(!message.contains("abc123"));
        assert!(message.contains("password=***"));
        assert!(message.contains("token=***"));
    }

    #[test]
    fn test_sanitize_redacts_sensitive_paths() {
        let sanitized = sanitize_error_message("cannot read /home/user/.ssh/id_rsa");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains("id_rsa"));
    }

    #[test]
    fn test_sanitize_truncates_long_messages() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_sanitize_truncates_multibyte_on_char_boundary() {
        // 1 + 200*3 bytes puts the cut inside a multi-byte char
        let message = format!("a{}", "€".repeat(200));
        let sanitized = sanitize_error_message(&message);

        assert!(sanitized.len() <= 500);
        assert!(sanitized.ends_with("...[truncated]"));
        assert!(sanitized.trim_end_matches("...[truncated]").ends_with('€'));
    }

    #[test]
    fn test_sanitize_leaves_short_messages_alone() {
        assert_eq!(sanitize_error_message("plain failure"), "plain failure");
        assert_eq!(sanitize_error_message(""), "");
    }
}
