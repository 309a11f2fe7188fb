use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::Editor;

/// Keyboard shortcut that opens the assist popup.
pub const ASSIST_SHORTCUT: &str = "Shift-Mod-a";

/// Something the editor asks its host to do. Requests queue up on the editor
/// until the host drains them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorRequest {
    /// Open an assist session over the selected text.
    Assist {
        range: Range<usize>,
        selected_text: String,
    },
}

impl Editor {
    /// Queues an assist request for the current selection. Returns `false`
    /// and queues nothing when the selection is empty.
    pub fn trigger_assist(&mut self) -> bool {
        let selection = *self.selection();
        if selection.is_collapsed() {
            return false;
        }
        let selected_text = self
            .doc()
            .text_between(selection.from(), selection.to(), " ");
        tracing::debug!(range = ?selection.range(), "assist requested");
        self.requests.push_back(EditorRequest::Assist {
            range: selection.range(),
            selected_text,
        });
        true
    }

    pub fn drain_requests(&mut self) -> Vec<EditorRequest> {
        self.requests.drain(..).collect()
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}
