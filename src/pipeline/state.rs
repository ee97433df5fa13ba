//! Pipeline state and phases
//!
//! `PipelineState` is owned exclusively by the machine and mutated only
//! through the transition helpers here. `current_step` indexes into the
//! active strategy's step list; `completed_steps` holds indices in
//! `[0, step_count)` with no duplicates.

use crate::content::ContentVariant;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle phase of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Idle,
    Running,
    StepComplete,
    Retrying,
    Stopped,
    Done,
}

/// One accumulated step result: raw payload plus its rendered form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub raw: Value,
    pub formatted: String,
    pub variant: ContentVariant,
}

/// Pipeline progress, owned by the state machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub current_step: usize,
    pub completed_steps: BTreeSet<usize>,
    pub context: BTreeMap<String, ContextEntry>,
    pub step_results: BTreeMap<String, Value>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful step completion
    ///
    /// Stores raw and formatted forms under the step's context key, marks
    /// the index completed (idempotent on re-runs), and advances
    /// `current_step` past the completed index.
    pub fn record_step_result(&mut self, step_index: usize, key: &str, entry: ContextEntry) {
        self.step_results.insert(key.to_string(), entry.raw.clone());
        self.context.insert(key.to_string(), entry);
        self.completed_steps.insert(step_index);
        self.current_step = step_index + 1;
    }

    /// Whether a result has been recorded under the given context key
    pub fn has_result(&self, key: &str) -> bool {
        self.step_results.contains_key(key)
    }

    /// Reset progress for a fresh run
    ///
    /// Clears position and the completed set but keeps `step_results` and
    /// `context` history; only clearing version history as well discards
    /// prior results entirely.
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.completed_steps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(raw: Value) -> ContextEntry {
        ContextEntry {
            raw,
            formatted: "# doc".to_string(),
            variant: ContentVariant::SystemOverview,
        }
    }

    #[test]
    fn test_record_step_result_advances_current_step() {
        let mut state = PipelineState::new();
        state.record_step_result(0, "systemoverview", entry(json!({"a": 1})));

        assert_eq!(state.current_step, 1);
        assert!(state.completed_steps.contains(&0));
        assert!(state.has_result("systemoverview"));
        assert_eq!(state.step_results["systemoverview"], json!({"a": 1}));
    }

    #[test]
    fn test_rerun_does_not_duplicate_completed_index() {
        let mut state = PipelineState::new();
        state.record_step_result(0, "systemoverview", entry(json!({"a": 1})));
        state.record_step_result(0, "systemoverview", entry(json!({"a": 2})));

        assert_eq!(state.completed_steps.len(), 1);
        assert_eq!(state.step_results["systemoverview"], json!({"a": 2}));
    }

    #[test]
    fn test_reset_keeps_results_and_context() {
        let mut state = PipelineState::new();
        state.record_step_result(0, "systemoverview", entry(json!({"a": 1})));
        state.record_step_result(1, "componentanalysis", entry(json!({"b": 2})));

        state.reset();

        assert_eq!(state.current_step, 0);
        assert!(state.completed_steps.is_empty());
        assert_eq!(state.step_results.len(), 2);
        assert_eq!(state.context.len(), 2);
    }
}
