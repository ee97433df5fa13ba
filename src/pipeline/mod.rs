//! Pipeline state machine
//!
//! Owns the single [`state::PipelineState`] instance and drives the Step
//! Executor forward, one step at a time. All transitions are serialized
//! through [`machine::PipelineMachine`]; no two components ever mutate
//! pipeline state concurrently.

pub mod machine;
pub mod state;

pub use machine::{PipelineMachine, PipelineNotification, StepTermination};
pub use state::{ContextEntry, PipelinePhase, PipelineState};
