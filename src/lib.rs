//! docweave - Multi-step LLM documentation generation pipeline orchestrator
//!
//! # Overview
//!
//! This crate drives a sequence of LLM-backed generation steps (system
//! overview, component analysis, code documentation, ...) against a
//! streaming generation endpoint:
//! - Streaming event consumption with tool-invocation deduplication
//! - Validation of each step's structured result, with bounded retry
//! - Structural classification of results into fixed content variants
//! - Accumulated per-step context carried into later steps
//! - Replayable, append-only version history of pipeline state
//!
//! # Quick Start
//!
//! ```rust
//! use docweave::content::{classify, format_content, RawContent};
//! use docweave::strategy::{BuiltinCatalog, StrategyCatalog};
//! use serde_json::json;
//!
//! // Strategies are ordered lists of step definitions
//! let catalog = BuiltinCatalog::new();
//! let strategy = catalog.get_strategy("comprehensive").unwrap();
//! assert_eq!(strategy.step_count(), 5);
//!
//! // Step payloads classify structurally, first matching rule wins
//! let raw = RawContent::from_value(json!({
//!     "architecture_diagram": "flowchart TD; a-->b",
//!     "core_technologies": ["rust", "tokio"],
//!     "design_patterns": ["state machine"],
//! }));
//! let classified = classify(&raw);
//! let document = format_content(&classified);
//! assert!(document.contains("## Core Technologies"));
//! ```

pub mod config;
pub mod content;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod history;
pub mod observability;
pub mod pipeline;
pub mod retry;
pub mod strategy;
pub mod stream;
pub mod testing;
pub mod validator;

pub use config::OrchestratorConfig;
pub use content::{classify, format_content, ClassifiedContent, ContentVariant, RawContent};
pub use endpoint::{GenerationEndpoint, GenerationRequest, InMemoryMessageStore, MessageStore};
pub use error::{OrchestratorError, OrchestratorResult};
pub use executor::{CancelFlag, StepExecutor, StepOutcome};
pub use history::{VersionHistory, VersionSnapshot};
pub use pipeline::{
    ContextEntry, PipelineMachine, PipelineNotification, PipelinePhase, PipelineState,
    StepTermination,
};
pub use retry::RetryPolicy;
pub use strategy::{BuiltinCatalog, StepDefinition, Strategy, StrategyCatalog};
pub use stream::{FinishReason, Message, StreamEvent, TokenUsage, ToolInvocation};
