//! Pipeline state machine driving step execution
//!
//! Phases: `Idle → Running → {StepComplete → Running(next) | Retrying →
//! Running(same)} → ... → Done`, with `Stopped` reachable from `Running` on
//! explicit cancellation. At most one step invocation is active at a time;
//! step N+1 never starts before step N reaches a terminal outcome.

use crate::content::{classify, format_content};
use crate::endpoint::{GenerationEndpoint, MessageStore};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::executor::{CancelFlag, StepExecutor, StepOutcome};
use crate::history::VersionHistory;
use crate::pipeline::state::{ContextEntry, PipelinePhase, PipelineState};
use crate::retry::RetryPolicy;
use crate::strategy::Strategy;
use crate::stream::TokenUsage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Instrument};

/// Notifications emitted toward rendering/UI collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineNotification {
    StepCompleted {
        step_index: usize,
        context_key: String,
        usage: TokenUsage,
    },
    StepFailed {
        step_index: usize,
        reason: String,
    },
    AllDone,
}

/// Terminal outcome of driving one step through its retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum StepTermination {
    Completed,
    Cancelled,
    RetryExhausted { attempts: u32 },
}

/// The pipeline state machine
///
/// Owns the single `PipelineState` instance; all transitions are serialized
/// through `&mut self` methods. Cancellation from another task goes through
/// the handle returned by [`PipelineMachine::cancel_handle`].
pub struct PipelineMachine {
    strategy: Strategy,
    executor: StepExecutor,
    retry: RetryPolicy,
    state: PipelineState,
    phase: PipelinePhase,
    history: VersionHistory,
    notifier: Option<mpsc::UnboundedSender<PipelineNotification>>,
}

impl PipelineMachine {
    pub fn new(
        strategy: Strategy,
        endpoint: Arc<dyn GenerationEndpoint>,
        store: Arc<dyn MessageStore>,
        pipeline_key: String,
        retry: RetryPolicy,
    ) -> Self {
        let executor = StepExecutor::new(endpoint, store, pipeline_key, CancelFlag::new());
        Self {
            strategy,
            executor,
            retry,
            state: PipelineState::new(),
            phase: PipelinePhase::Idle,
            history: VersionHistory::new(),
            notifier: None,
        }
    }

    /// Attach a notification channel for step-completed/failed/all-done events
    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<PipelineNotification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Read-only snapshot of pipeline progress
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Cloneable handle for cancelling an in-flight run from another task
    pub fn cancel_handle(&self) -> CancelFlag {
        self.executor.cancel_flag()
    }

    /// Request cancellation of the in-flight step
    ///
    /// Observed at the next StreamEvent boundary; the interrupted step never
    /// transitions to StepComplete.
    pub fn stop(&self) {
        self.executor.cancel_flag().set();
    }

    /// Run the pipeline from the current step to a terminal phase
    pub async fn start(&mut self) -> OrchestratorResult<()> {
        let index = self.state.current_step;
        self.run_from(index)
            .instrument(crate::pipeline_span!(start_index = index))
            .await
    }

    /// Set the current step without altering completed steps
    ///
    /// Allowed from any non-running phase. When no result exists yet for the
    /// target step, a run starts there immediately.
    pub async fn jump_to(&mut self, step_index: usize) -> OrchestratorResult<()> {
        self.ensure_not_running("jump_to")?;
        let step = self
            .strategy
            .steps
            .get(step_index)
            .ok_or_else(|| Self::out_of_range(step_index, self.strategy.step_count()))?;

        let key = step.expected_variant.context_key();
        self.state.current_step = step_index;

        if self.state.has_result(key) {
            debug!(step_index, key, "Jump to step with existing result");
            Ok(())
        } else {
            info!(step_index, "Jump to unvisited step, starting generation");
            self.run_from(step_index).await
        }
    }

    /// Reset progress for a fresh run
    ///
    /// Keeps `step_results`/`context` history; call [`clear_history`] as
    /// well to discard prior results and snapshots entirely.
    ///
    /// [`clear_history`]: PipelineMachine::clear_history
    pub fn restart(&mut self) -> OrchestratorResult<()> {
        self.ensure_not_running("restart")?;
        self.state.reset();
        self.phase = PipelinePhase::Idle;
        info!("Pipeline restarted");
        Ok(())
    }

    /// Discard snapshots along with accumulated results and context
    pub fn clear_history(&mut self) -> OrchestratorResult<()> {
        self.ensure_not_running("clear_history")?;
        self.history.clear();
        self.state.step_results.clear();
        self.state.context.clear();
        Ok(())
    }

    /// Replace live progress with a snapshot's
    ///
    /// Later snapshots are never deleted; the log is append-only.
    pub fn restore_version(&mut self, index: usize) -> OrchestratorResult<()> {
        self.ensure_not_running("restore_version")?;
        let snapshot = self.history.get(index).cloned().ok_or_else(|| {
            OrchestratorError::invalid_command(format!("no snapshot at index {index}"))
        })?;

        info!(
            version = snapshot.version,
            completed = snapshot.completed_steps.len(),
            "Restoring pipeline state from snapshot"
        );

        self.state.current_step = snapshot.completed_steps.len();
        self.state.completed_steps = snapshot.completed_steps;
        self.state.step_results = snapshot.step_results;
        self.phase = PipelinePhase::Idle;
        Ok(())
    }

    /// Drive steps from `start_index` until Done, Stopped, or a terminal error
    async fn run_from(&mut self, start_index: usize) -> OrchestratorResult<()> {
        self.ensure_not_running("start")?;
        if start_index >= self.strategy.step_count() {
            return Err(Self::out_of_range(start_index, self.strategy.step_count()));
        }

        // A fresh run on a pipeline with prior progress gets a rollback point
        if !self.state.completed_steps.is_empty() {
            let version = self.history.snapshot(&self.state);
            debug!(version, "Snapshotted pipeline state before fresh run");
        }

        self.executor.cancel_flag().clear();
        self.state.current_step = start_index;

        loop {
            let index = self.state.current_step;
            if index >= self.strategy.step_count() {
                self.phase = PipelinePhase::Done;
                info!(steps = self.strategy.step_count(), "Pipeline complete");
                self.notify(PipelineNotification::AllDone);
                return Ok(());
            }

            let termination = match self.run_step_with_retry(index).await {
                Ok(termination) => termination,
                // Fatal errors (setup, store) park the machine in Idle
                Err(e) => {
                    self.phase = PipelinePhase::Idle;
                    return Err(e);
                }
            };

            match termination {
                StepTermination::Completed => {
                    self.phase = PipelinePhase::StepComplete;
                }
                StepTermination::Cancelled => {
                    self.phase = PipelinePhase::Stopped;
                    info!(step_index = index, "Pipeline stopped");
                    return Ok(());
                }
                StepTermination::RetryExhausted { attempts } => {
                    self.phase = PipelinePhase::Idle;
                    return Err(OrchestratorError::RetryExhausted {
                        step_index: index,
                        attempts,
                    });
                }
            }
        }
    }

    /// Run one step through the bounded retry loop to a terminal outcome
    async fn run_step_with_retry(&mut self, index: usize) -> OrchestratorResult<StepTermination> {
        let mut attempt = 1u32;
        let mut usage = TokenUsage::default();

        loop {
            self.phase = PipelinePhase::Running;
            let step = &self.strategy.steps[index];
            debug!(
                step_index = index,
                step_title = %step.title,
                attempt,
                "Running step"
            );

            let outcome = self
                .executor
                .execute(step, &self.state.context)
                .instrument(crate::step_span!(step_index = index, attempt))
                .await?;
            match outcome {
                StepOutcome::Completed { message, payload } => {
                    usage.accumulate(&message.token_usage);

                    let key = step.expected_variant.context_key();
                    let scoped = payload.scoped(key);
                    let classified = classify(&scoped);
                    if classified.variant() != step.expected_variant {
                        warn!(
                            step_index = index,
                            expected = %step.expected_variant,
                            actual = %classified.variant(),
                            "Step result classified as a different variant than expected"
                        );
                    }
                    let formatted = format_content(&classified);
                    let entry = ContextEntry {
                        raw: scoped.into_value(),
                        formatted,
                        variant: classified.variant(),
                    };

                    self.state.record_step_result(index, key, entry);
                    info!(
                        step_index = index,
                        key,
                        tokens = usage.total_tokens,
                        "Step complete"
                    );
                    self.notify(PipelineNotification::StepCompleted {
                        step_index: index,
                        context_key: key.to_string(),
                        usage,
                    });
                    return Ok(StepTermination::Completed);
                }
                StepOutcome::Cancelled => return Ok(StepTermination::Cancelled),
                StepOutcome::Invalid { message, reason } => {
                    if let Some(message) = &message {
                        usage.accumulate(&message.token_usage);
                    }

                    if attempt >= self.retry.max_attempts {
                        error!(
                            step_index = index,
                            attempts = attempt,
                            reason = %reason,
                            "Step failed, retries exhausted"
                        );
                        self.notify(PipelineNotification::StepFailed {
                            step_index: index,
                            reason: crate::error::sanitize_error_message(&reason),
                        });
                        return Ok(StepTermination::RetryExhausted { attempts: attempt });
                    }

                    let backoff = self.retry.backoff_for(attempt);
                    warn!(
                        step_index = index,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        reason = %reason,
                        "Step attempt invalid, retrying"
                    );
                    self.phase = PipelinePhase::Retrying;
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    fn ensure_not_running(&self, command: &str) -> OrchestratorResult<()> {
        if matches!(self.phase, PipelinePhase::Running | PipelinePhase::Retrying) {
            Err(OrchestratorError::invalid_command(format!(
                "{command} refused while a step is in flight"
            )))
        } else {
            Ok(())
        }
    }

    fn out_of_range(index: usize, count: usize) -> OrchestratorError {
        OrchestratorError::invalid_command(format!(
            "step index {index} out of range for strategy with {count} steps"
        ))
    }

    fn notify(&self, notification: PipelineNotification) {
        if let Some(notifier) = &self.notifier {
            // Receiver may be gone; notifications are best-effort
            let _ = notifier.send(notification);
        }
    }
}
