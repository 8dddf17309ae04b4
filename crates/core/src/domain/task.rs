// Export Task - per-delivery state machine
//
// RECEIVED -> AGGREGATING -> DELIVERING -> COMPLETED
// any non-terminal state -> DISCARDED

use crate::domain::error::{DomainError, Result};
use crate::domain::{ExportJob, MessageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Received,
    Aggregating,
    Delivering,
    Completed,
    Discarded,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Discarded)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Received => write!(f, "RECEIVED"),
            TaskState::Aggregating => write!(f, "AGGREGATING"),
            TaskState::Delivering => write!(f, "DELIVERING"),
            TaskState::Completed => write!(f, "COMPLETED"),
            TaskState::Discarded => write!(f, "DISCARDED"),
        }
    }
}

/// Why a task was discarded instead of delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Body could not be decoded as an ExportJob
    MalformedMessage(String),
    /// Playlist deleted between enqueue and processing
    PlaylistNotFound(String),
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscardReason::MalformedMessage(e) => write!(f, "malformed message: {}", e),
            DiscardReason::PlaylistNotFound(id) => write!(f, "playlist not found: {}", id),
        }
    }
}

/// Processing state of one delivered message
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub message_id: MessageId,
    pub attempt: i32,
    state: TaskState,
    job: Option<ExportJob>,
}

impl ExportTask {
    pub fn received(message_id: impl Into<String>, attempt: i32) -> Self {
        Self {
            message_id: message_id.into(),
            attempt,
            state: TaskState::Received,
            job: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn job(&self) -> Option<&ExportJob> {
        self.job.as_ref()
    }

    /// RECEIVED -> AGGREGATING, attaching the parsed job
    pub fn begin_aggregating(&mut self, job: ExportJob) -> Result<()> {
        self.transition(TaskState::Received, TaskState::Aggregating)?;
        self.job = Some(job);
        Ok(())
    }

    /// AGGREGATING -> DELIVERING
    pub fn begin_delivering(&mut self) -> Result<()> {
        self.transition(TaskState::Aggregating, TaskState::Delivering)
    }

    /// DELIVERING -> COMPLETED
    pub fn complete(&mut self) -> Result<()> {
        self.transition(TaskState::Delivering, TaskState::Completed)
    }

    /// Any non-terminal state -> DISCARDED
    pub fn discard(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.invalid(TaskState::Discarded));
        }
        self.state = TaskState::Discarded;
        Ok(())
    }

    fn transition(&mut self, expected: TaskState, next: TaskState) -> Result<()> {
        if self.state != expected {
            return Err(self.invalid(next));
        }
        self.state = next;
        Ok(())
    }

    fn invalid(&self, to: TaskState) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
