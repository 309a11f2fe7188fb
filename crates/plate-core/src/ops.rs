use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::{AttrPatch, Node, Selection};

/// Child indices from the document root down to a node. Editing commands
/// take linear positions; they are resolved to paths before ops are built.
pub type Path = Vec<usize>;

/// One reversible change to the block tree.
///
/// Text ops address a text leaf and carry byte offsets into its string.
/// Commands count characters, so drafts convert with `char_to_byte` when
/// they plan text edits; an offset inside a multi-byte character is clamped
/// back to its start when the op is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    /// Inserts a whole subtree, e.g. a callout with its paragraphs.
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    /// Used for callout retyping and list `checked` toggles.
    SetNodeAttrs {
        #[serde(default)]
        path: Path,
        patch: AttrPatch,
    },
}

impl Op {
    pub fn path(&self) -> &[usize] {
        match self {
            Op::InsertText { path, .. }
            | Op::RemoveText { path, .. }
            | Op::InsertNode { path, .. }
            | Op::RemoveNode { path }
            | Op::SetNodeAttrs { path, .. } => path,
        }
    }

    /// Whether the op adds or removes blocks rather than editing in place.
    pub fn is_structural(&self) -> bool {
        matches!(self, Op::InsertNode { .. } | Op::RemoveNode { .. })
    }
}

/// Ops applied together as one undo step. `source` names the command that
/// produced them, e.g. `callout.set` or `assist.apply`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn structural_ops(&self) -> usize {
        self.ops.iter().filter(|op| op.is_structural()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_read_from_tagged_json() {
        let tx: Transaction = serde_json::from_str(
            r#"{"ops":[{"op":"insert_text","path":[0,0],"offset":1,"text":"é"},{"op":"remove_node"}],"source":"paste"}"#,
        )
        .unwrap();

        assert_eq!(tx.source.as_deref(), Some("paste"));
        assert_eq!(tx.ops[0].path(), &[0, 0]);
        assert!(tx.ops[1].path().is_empty());
        assert_eq!(tx.structural_ops(), 1);
    }
}
