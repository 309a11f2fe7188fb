use std::ops::Range;

use calloutpad_core::Editor;
use calloutpad_diff::{DiffResult, diff_text};

use crate::config::AssistConfig;
use crate::error::{AssistError, TransportError, ValidationError};
use crate::wire::{AssistRequest, AssistResponse};

/// Suggestions offered next to the prompt input.
pub const COMMON_PROMPTS: [&str; 4] = [
    "Make it more concise",
    "Make it more formal",
    "Fix grammar and spelling",
    "Simplify the language",
];

/// Shown when a failed transform carries no message of its own.
pub const DEFAULT_FAILURE: &str = "Failed to get AI response";

/// Tags one transform call. A result is accepted only by the session that
/// issued it, and only while that exact call is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub session: u64,
    pub sequence: u64,
}

/// A transform call the host should run and report back through
/// [`AssistSession::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub request: AssistRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistState {
    Idle,
    Loading(RequestId),
    Diff(DiffResult),
    Feedback,
    Error(String),
}

impl AssistState {
    pub fn name(&self) -> &'static str {
        match self {
            AssistState::Idle => "idle",
            AssistState::Loading(_) => "loading",
            AssistState::Diff(_) => "diff",
            AssistState::Feedback => "feedback",
            AssistState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Older,
    Newer,
}

/// One assist interaction over a fixed selection.
#[derive(Debug, Clone)]
pub struct AssistSession {
    id: u64,
    range: Range<usize>,
    selected_text: String,
    prompt: String,
    state: AssistState,
    history: Vec<String>,
    history_limit: usize,
    history_cursor: Option<usize>,
    sequence: u64,
}

impl AssistSession {
    pub fn new(
        id: u64,
        range: Range<usize>,
        selected_text: impl Into<String>,
        config: &AssistConfig,
    ) -> Self {
        Self {
            id,
            range,
            selected_text: selected_text.into(),
            prompt: String::new(),
            state: AssistState::Idle,
            history: Vec::new(),
            history_limit: config.history_limit,
            history_cursor: None,
            sequence: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn selected_text(&self) -> &str {
        &self.selected_text
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn state(&self) -> &AssistState {
        &self.state
    }

    /// Submitted prompts, most recent first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn diff(&self) -> Option<&DiffResult> {
        match &self.state {
            AssistState::Diff(diff) => Some(diff),
            _ => None,
        }
    }

    /// Sends the current prompt. Only valid while idle.
    pub fn submit(&mut self) -> Result<PendingRequest, AssistError> {
        self.expect("idle", matches!(self.state, AssistState::Idle))?;
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::MissingPrompt.into());
        }

        self.history.insert(0, self.prompt.clone());
        self.history.truncate(self.history_limit);
        self.history_cursor = None;

        self.sequence += 1;
        let id = RequestId {
            session: self.id,
            sequence: self.sequence,
        };
        self.state = AssistState::Loading(id);
        Ok(PendingRequest {
            id,
            request: AssistRequest::new(self.selected_text.clone(), self.prompt.clone()),
        })
    }

    /// Picks a suggestion and submits it.
    pub fn select_prompt(&mut self, prompt: &str) -> Result<PendingRequest, AssistError> {
        self.prompt = prompt.to_string();
        self.submit()
    }

    /// Delivers the outcome of a transform call. Returns `false` when the
    /// result belongs to a call this session is no longer waiting on.
    pub fn resolve(
        &mut self,
        id: RequestId,
        outcome: Result<AssistResponse, TransportError>,
    ) -> bool {
        if self.state != AssistState::Loading(id) {
            tracing::debug!(?id, state = self.state.name(), "discarding stale assist result");
            return false;
        }

        self.state = match outcome {
            Ok(response) => {
                AssistState::Diff(diff_text(&self.selected_text, &response.modified_text))
            }
            Err(err) if err.message.is_empty() => AssistState::Error(DEFAULT_FAILURE.to_string()),
            Err(err) => {
                tracing::debug!(status = err.status, message = %err.message, "assist request failed");
                AssistState::Error(err.message)
            }
        };
        true
    }

    /// Replaces the session's range with the suggested text as one undo step.
    pub fn apply(&mut self, editor: &mut Editor) -> Result<(), AssistError> {
        let AssistState::Diff(diff) = &self.state else {
            return Err(self.wrong_state("diff"));
        };
        editor.apply_changes(self.range.clone(), &diff.modified_text)?;
        self.state = AssistState::Feedback;
        Ok(())
    }

    /// Back to the prompt input from a suggestion or an error.
    pub fn reset(&mut self) -> Result<(), AssistError> {
        self.expect(
            "diff or error",
            matches!(self.state, AssistState::Diff(_) | AssistState::Error(_)),
        )?;
        self.state = AssistState::Idle;
        self.prompt.clear();
        self.history_cursor = None;
        Ok(())
    }

    /// Steps through earlier prompts. Walking past the newest entry clears
    /// the prompt.
    pub fn navigate_history(&mut self, direction: HistoryDirection) -> bool {
        if self.history.is_empty() || !matches!(self.state, AssistState::Idle) {
            return false;
        }

        self.history_cursor = match (direction, self.history_cursor) {
            (HistoryDirection::Older, None) => Some(0),
            (HistoryDirection::Older, Some(ix)) => Some((ix + 1).min(self.history.len() - 1)),
            (HistoryDirection::Newer, Some(ix)) if ix > 0 => Some(ix - 1),
            (HistoryDirection::Newer, _) => None,
        };
        self.prompt = match self.history_cursor {
            Some(ix) => self.history[ix].clone(),
            None => String::new(),
        };
        true
    }

    pub fn feedback(&mut self, positive: bool) -> Result<(), AssistError> {
        self.expect("feedback", self.state == AssistState::Feedback)?;
        tracing::info!(session = self.id, positive, "assist feedback");
        Ok(())
    }

    fn expect(&self, expected: &'static str, ok: bool) -> Result<(), AssistError> {
        if ok {
            Ok(())
        } else {
            Err(self.wrong_state(expected))
        }
    }

    fn wrong_state(&self, expected: &'static str) -> AssistError {
        AssistError::WrongState {
            expected,
            actual: self.state.name(),
        }
    }
}
