use std::ops::Range;

use calloutpad_core::{Editor, EditorRequest};

use crate::config::AssistConfig;
use crate::error::{AssistError, TransportError};
use crate::session::{AssistSession, AssistState, PendingRequest, RequestId};
use crate::wire::{AssistResponse, TextTransform};

/// Owns at most one assist session and the transform it talks to.
pub struct AssistManager<T> {
    transform: T,
    config: AssistConfig,
    session: Option<AssistSession>,
    opened: u64,
}

impl<T: TextTransform> AssistManager<T> {
    pub fn new(transform: T) -> Self {
        Self::with_config(transform, AssistConfig::default())
    }

    pub fn with_config(transform: T, config: AssistConfig) -> Self {
        Self {
            transform,
            config,
            session: None,
            opened: 0,
        }
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&AssistSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut AssistSession> {
        self.session.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a session for an assist request. Whitespace-only selections are
    /// ignored.
    pub fn handle_request(&mut self, request: EditorRequest) -> bool {
        match request {
            EditorRequest::Assist {
                range,
                selected_text,
            } => self.open(range, selected_text),
        }
    }

    /// Drains the editor's request queue into this manager.
    pub fn process_requests(&mut self, editor: &mut Editor) -> bool {
        let mut opened = false;
        for request in editor.drain_requests() {
            opened |= self.handle_request(request);
        }
        opened
    }

    pub fn open(&mut self, range: Range<usize>, selected_text: String) -> bool {
        if selected_text.trim().is_empty() {
            tracing::debug!(?range, "no text selected, not opening assist");
            return false;
        }
        if let Some(previous) = &self.session {
            tracing::debug!(session = previous.id(), "replacing open assist session");
        }
        self.opened += 1;
        self.session = Some(AssistSession::new(
            self.opened,
            range,
            selected_text,
            &self.config,
        ));
        true
    }

    /// Drops the session along with any result still in flight.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(session = session.id(), state = session.state().name(), "assist closed");
        }
    }

    /// Starts a transform call for the current prompt without running it.
    pub fn begin(&mut self) -> Result<PendingRequest, AssistError> {
        self.session
            .as_mut()
            .ok_or(AssistError::NoSession)?
            .submit()
    }

    /// Routes a finished transform call to its session. Results for closed
    /// or replaced sessions are dropped.
    pub fn complete(
        &mut self,
        id: RequestId,
        outcome: Result<AssistResponse, TransportError>,
    ) -> bool {
        match self.session.as_mut() {
            Some(session) if session.id() == id.session => session.resolve(id, outcome),
            _ => {
                tracing::debug!(?id, "discarding assist result for a closed session");
                false
            }
        }
    }

    /// Submits `prompt` and runs the transform to completion.
    pub fn submit(&mut self, prompt: &str) -> Result<&AssistState, AssistError> {
        let session = self.session.as_mut().ok_or(AssistError::NoSession)?;
        session.set_prompt(prompt);
        let pending = session.submit()?;
        let outcome = self.transform.transform(&pending.request);
        self.complete(pending.id, outcome);
        self.state().ok_or(AssistError::NoSession)
    }

    pub fn state(&self) -> Option<&AssistState> {
        self.session.as_ref().map(AssistSession::state)
    }

    pub fn apply(&mut self, editor: &mut Editor) -> Result<(), AssistError> {
        self.session
            .as_mut()
            .ok_or(AssistError::NoSession)?
            .apply(editor)
    }

    /// Records feedback on an applied suggestion and closes the session.
    pub fn feedback(&mut self, positive: bool) -> Result<(), AssistError> {
        self.session
            .as_mut()
            .ok_or(AssistError::NoSession)?
            .feedback(positive)?;
        self.close();
        Ok(())
    }

    /// Closes a session that has finished applying. The host calls this once
    /// its feedback window elapses.
    pub fn settle(&mut self) -> bool {
        if self.state() == Some(&AssistState::Feedback) {
            self.close();
            return true;
        }
        false
    }
}
