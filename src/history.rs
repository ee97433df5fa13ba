//! Version history for pipeline state
//!
//! An append-only log of snapshots, never a branching tree. Version
//! numbering starts at 1 for the live state, so the first snapshot is
//! version 2. Restoring never deletes later snapshots.

use crate::pipeline::state::PipelineState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// An immutable, versioned copy of pipeline progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub version: u32,
    pub step_results: BTreeMap<String, Value>,
    pub completed_steps: BTreeSet<usize>,
    pub taken_at: DateTime<Utc>,
}

/// Append-only snapshot log, ordered by version ascending
#[derive(Debug, Default, Clone)]
pub struct VersionHistory {
    snapshots: Vec<VersionSnapshot>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[VersionSnapshot] {
        &self.snapshots
    }

    pub fn get(&self, index: usize) -> Option<&VersionSnapshot> {
        self.snapshots.get(index)
    }

    /// Append a snapshot of the given state; returns its version number
    pub fn snapshot(&mut self, state: &PipelineState) -> u32 {
        let version = self.snapshots.len() as u32 + 2;
        self.snapshots.push(VersionSnapshot {
            version,
            step_results: state.step_results.clone(),
            completed_steps: state.completed_steps.clone(),
            taken_at: Utc::now(),
        });
        version
    }

    /// Drop all snapshots (used when the caller also resets result history)
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with_step(key: &str, step_index: usize) -> PipelineState {
        let mut state = PipelineState::new();
        state.step_results.insert(key.to_string(), json!({"x": 1}));
        state.completed_steps.insert(step_index);
        state
    }

    #[test]
    fn test_first_snapshot_is_version_two() {
        let mut history = VersionHistory::new();
        let version = history.snapshot(&state_with_step("systemoverview", 0));
        assert_eq!(version, 2);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_versions_increase_per_snapshot() {
        let mut history = VersionHistory::new();
        let state = state_with_step("systemoverview", 0);

        assert_eq!(history.snapshot(&state), 2);
        assert_eq!(history.snapshot(&state), 3);
        assert_eq!(history.snapshot(&state), 4);

        let versions: Vec<_> = history.snapshots().iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![2, 3, 4]);
    }

    #[test]
    fn test_snapshot_is_a_copy_not_a_view() {
        let mut history = VersionHistory::new();
        let mut state = state_with_step("systemoverview", 0);
        history.snapshot(&state);

        // Later mutation of live state must not alter the snapshot
        state.completed_steps.insert(1);
        state
            .step_results
            .insert("componentanalysis".to_string(), json!({"y": 2}));

        let snapshot = history.get(0).unwrap();
        assert_eq!(snapshot.completed_steps.len(), 1);
        assert_eq!(snapshot.step_results.len(), 1);
    }

    #[test]
    fn test_get_out_of_range() {
        let history = VersionHistory::new();
        assert!(history.get(0).is_none());
    }
}
