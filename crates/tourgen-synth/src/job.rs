//! Render job state machine.

use std::fmt;

use tourgen_models::SceneId;

use crate::service::{OperationHandle, OperationStatus};

/// Lifecycle of one generation.
///
/// `Submitted -> Polling -> {Done, Failed, TimedOut}`; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderJobState {
    Submitted,
    Polling,
    Done,
    Failed,
    TimedOut,
}

impl RenderJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderJobState::Submitted => "submitted",
            RenderJobState::Polling => "polling",
            RenderJobState::Done => "done",
            RenderJobState::Failed => "failed",
            RenderJobState::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderJobState::Done | RenderJobState::Failed | RenderJobState::TimedOut
        )
    }
}

impl fmt::Display for RenderJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks a single scene's generation from submission to a terminal state.
#[derive(Debug, Clone)]
pub struct RenderJob {
    scene_id: SceneId,
    operation: OperationHandle,
    attempts: u32,
    state: RenderJobState,
    last_status: Option<OperationStatus>,
}

impl RenderJob {
    pub fn new(scene_id: SceneId, operation: OperationHandle) -> Self {
        Self {
            scene_id,
            operation,
            attempts: 0,
            state: RenderJobState::Submitted,
            last_status: None,
        }
    }

    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    pub fn operation(&self) -> &OperationHandle {
        &self.operation
    }

    /// Status checks made so far, including ones that errored.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> RenderJobState {
        self.state
    }

    pub fn last_status(&self) -> Option<&OperationStatus> {
        self.last_status.as_ref()
    }

    /// Apply a status check. Terminal jobs ignore further input.
    pub fn observe(&mut self, status: OperationStatus) -> RenderJobState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.attempts += 1;
        self.state = match &status {
            OperationStatus::Pending => RenderJobState::Polling,
            OperationStatus::Succeeded(_) => RenderJobState::Done,
            OperationStatus::Failed { .. } => RenderJobState::Failed,
        };
        self.last_status = Some(status);
        self.state
    }

    /// Count a status check that could not be completed.
    pub fn observe_error(&mut self) -> RenderJobState {
        if !self.state.is_terminal() {
            self.attempts += 1;
            self.state = RenderJobState::Polling;
        }
        self.state
    }

    /// Mark the job failed outside of a status check.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = RenderJobState::Failed;
        }
    }

    pub fn time_out(&mut self) {
        if !self.state.is_terminal() {
            self.state = RenderJobState::TimedOut;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationOutput;

    fn job() -> RenderJob {
        RenderJob::new(SceneId::for_room(tourgen_models::Room::Kitchen, 1), OperationHandle::new("op/1"))
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        assert_eq!(job.state(), RenderJobState::Submitted);
        assert_eq!(job.observe(OperationStatus::Pending), RenderJobState::Polling);
        assert_eq!(job.observe(OperationStatus::Pending), RenderJobState::Polling);
        let done = job.observe(OperationStatus::Succeeded(OperationOutput::Videos(vec![])));
        assert_eq!(done, RenderJobState::Done);
        assert_eq!(job.attempts(), 3);
        assert_eq!(job.last_status().map(|s| s.as_str()), Some("done"));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut job = job();
        job.observe(OperationStatus::Failed {
            code: Some(13),
            message: "internal".into(),
        });
        assert_eq!(job.state(), RenderJobState::Failed);
        assert_eq!(job.observe(OperationStatus::Pending), RenderJobState::Failed);
        job.time_out();
        assert_eq!(job.state(), RenderJobState::Failed);
        assert_eq!(job.attempts(), 1);
    }

    #[test]
    fn test_errors_consume_attempts() {
        let mut job = job();
        job.observe_error();
        job.observe_error();
        assert_eq!(job.attempts(), 2);
        assert_eq!(job.state(), RenderJobState::Polling);
        job.time_out();
        assert_eq!(job.state(), RenderJobState::TimedOut);
        assert!(job.state().is_terminal());
    }
}
