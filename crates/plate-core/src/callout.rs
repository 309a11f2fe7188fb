use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::{AttrPatch, Attrs, BlockKind, Editor, Node, Selection};
use crate::edit::Draft;
use crate::error::EditError;
use crate::ops::{Op, Path};

pub const CALLOUT_TYPE_ATTR: &str = "calloutType";

/// The semantic flavour of a callout block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalloutType {
    #[default]
    Information,
    BestPractice,
    Warning,
    Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown callout type: {0}")]
pub struct UnknownCalloutType(pub String);

impl CalloutType {
    /// Declaration order, which is also the retype cycle.
    pub const ALL: [CalloutType; 4] = [
        CalloutType::Information,
        CalloutType::BestPractice,
        CalloutType::Warning,
        CalloutType::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalloutType::Information => "information",
            CalloutType::BestPractice => "best-practice",
            CalloutType::Warning => "warning",
            CalloutType::Error => "error",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CalloutType::Information => "Information",
            CalloutType::BestPractice => "Best Practice",
            CalloutType::Warning => "Warning",
            CalloutType::Error => "Error",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            CalloutType::Information => "info",
            CalloutType::BestPractice => "check-circle",
            CalloutType::Warning => "alert-triangle",
            CalloutType::Error => "alert-circle",
        }
    }

    pub fn next(self) -> Self {
        let ix = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(ix + 1) % Self::ALL.len()]
    }

    /// Reads the type stored on a callout, falling back to information.
    pub fn from_attrs(attrs: &Attrs) -> Self {
        attrs
            .get(CALLOUT_TYPE_ATTR)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn attrs(self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert(CALLOUT_TYPE_ATTR.to_string(), Value::from(self.as_str()));
        attrs
    }
}

impl FromStr for CalloutType {
    type Err = UnknownCalloutType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownCalloutType(s.to_string()))
    }
}

impl fmt::Display for CalloutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn cycle_callout_type(current: CalloutType) -> CalloutType {
    current.next()
}

impl Draft<'_> {
    fn enclosing_callout(&self) -> Option<Path> {
        self.doc()
            .innermost_ancestor(self.selection().from(), BlockKind::Callout)
    }

    pub(crate) fn set_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        if self.enclosing_callout().is_some() {
            return Err(EditError::AlreadyInCallout);
        }
        let range = self.selection().range();
        self.wrap(range, BlockKind::Callout, callout_type.attrs())
    }

    pub(crate) fn toggle_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        if self.enclosing_callout().is_some() {
            return self.unwrap(self.selection().from(), BlockKind::Callout);
        }
        self.set_callout(callout_type)
    }

    pub(crate) fn create_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        if self.enclosing_callout().is_some() {
            self.unwrap(self.selection().from(), BlockKind::Callout)?;
        }
        self.set_callout(callout_type)
    }

    fn set_callout_type(&mut self, path: Path, callout_type: CalloutType) -> Result<(), EditError> {
        self.push(Op::SetNodeAttrs {
            path,
            patch: AttrPatch::set(CALLOUT_TYPE_ATTR, callout_type.as_str()),
        })
    }

    /// Path of the callout whose range starts at `pos`.
    fn callout_at(&self, pos: usize) -> Result<Path, EditError> {
        self.doc()
            .outline()
            .into_iter()
            .find(|block| block.kind == BlockKind::Callout && block.range.start == pos)
            .map(|block| block.path)
            .ok_or(EditError::NotFound {
                kind: BlockKind::Callout,
            })
    }
}

impl Editor {
    /// Wraps the selection in a new callout. Refused while the selection is
    /// inside a callout.
    pub fn set_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        self.commit("callout.set", |draft| draft.set_callout(callout_type))
            .inspect_err(|err| tracing::warn!("set_callout({callout_type}) refused: {err}"))
    }

    /// Unwraps the enclosing callout whatever its type, or wraps the selection
    /// in a new one.
    pub fn toggle_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        self.commit("callout.toggle", |draft| draft.toggle_callout(callout_type))
            .inspect_err(|err| tracing::warn!("toggle_callout({callout_type}) refused: {err}"))
    }

    /// Replaces any enclosing callout with a new one of `callout_type`.
    pub fn create_callout(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        self.commit("callout.create", |draft| draft.create_callout(callout_type))
            .inspect_err(|err| tracing::warn!("create_callout({callout_type}) refused: {err}"))
    }

    pub fn update_callout_type(&mut self, callout_type: CalloutType) -> Result<(), EditError> {
        self.commit("callout.update_type", |draft| {
            let path = draft.enclosing_callout().ok_or(EditError::NotFound {
                kind: BlockKind::Callout,
            })?;
            draft.set_callout_type(path, callout_type)
        })
    }

    /// Advances the callout starting at `pos` to the next type in the cycle.
    pub fn retype_callout(&mut self, pos: usize) -> Result<CalloutType, EditError> {
        let mut next = CalloutType::default();
        self.commit("callout.retype", |draft| {
            let path = draft.callout_at(pos)?;
            let current = draft
                .doc()
                .node(&path)
                .and_then(Node::attrs)
                .map(CalloutType::from_attrs)
                .unwrap_or_default();
            next = cycle_callout_type(current);
            draft.set_callout_type(path, next)
        })?;
        Ok(next)
    }

    /// Removes the callout starting at `pos` along with everything inside it.
    pub fn delete_callout(&mut self, pos: usize) -> Result<(), EditError> {
        self.commit("callout.delete", |draft| {
            let path = draft.callout_at(pos)?;
            draft.push(Op::RemoveNode { path })?;
            let caret = draft.doc().nearest_text_pos(pos);
            draft.set_selection(Selection::collapsed(caret));
            Ok(())
        })
    }

    /// Type of the callout enclosing the selection start, if any.
    pub fn active_callout_type(&self) -> Option<CalloutType> {
        let path = self
            .doc()
            .innermost_ancestor(self.selection().from(), BlockKind::Callout)?;
        self.doc()
            .node(&path)
            .and_then(Node::attrs)
            .map(CalloutType::from_attrs)
    }

    /// Whether the selection start sits inside a block of `kind`.
    pub fn is_active(&self, kind: BlockKind) -> bool {
        self.doc()
            .innermost_ancestor(self.selection().from(), kind)
            .is_some()
    }

    /// Like [`Editor::is_active`], additionally requiring every attribute in
    /// `attrs` to match.
    pub fn is_active_with(&self, kind: BlockKind, attrs: &Attrs) -> bool {
        self.doc()
            .ancestors(self.selection().from())
            .iter()
            .filter_map(|path| self.doc().node(path))
            .filter(|node| node.kind() == Some(kind))
            .filter_map(Node::attrs)
            .any(|node_attrs| attrs.iter().all(|(k, v)| node_attrs.get(k) == Some(v)))
    }
}
