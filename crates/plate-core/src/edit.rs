use std::ops::Range;

use crate::core::{
    Attrs, BlockKind, Document, Editor, ElementNode, Node, Selection, apply_op_to, char_to_byte,
};
use crate::error::{ApplyError, EditError};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::PluginRegistry;

/// Builds a transaction against a scratch copy of the document so later ops
/// can be planned against the effect of earlier ones.
pub(crate) struct Draft<'a> {
    registry: &'a PluginRegistry,
    doc: Document,
    selection: Selection,
    ops: Vec<Op>,
}

impl<'a> Draft<'a> {
    pub(crate) fn new(editor: &'a Editor) -> Self {
        Self {
            registry: editor.registry(),
            doc: editor.doc().clone(),
            selection: *editor.selection(),
            ops: Vec::new(),
        }
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn selection(&self) -> Selection {
        self.selection
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub(crate) fn push(&mut self, op: Op) -> Result<(), EditError> {
        apply_op_to(&mut self.doc, &mut self.selection, op.clone())?;
        self.ops.push(op);
        Ok(())
    }

    pub(crate) fn into_transaction(self, source: &str) -> Transaction {
        Transaction::new(self.ops)
            .selection_after(self.selection)
            .source(source)
    }

    fn check_known(&self, node: &Node) -> Result<(), EditError> {
        if let Some(kind) = node.kind() {
            if !self.registry.is_known_kind(kind) {
                return Err(EditError::UnknownKind(kind));
            }
        }
        if let Node::Element(el) = node {
            for child in &el.children {
                self.check_known(child)?;
            }
        }
        Ok(())
    }

    fn has_callout_ancestor(&self, path: &[usize]) -> bool {
        (1..=path.len()).any(|depth| {
            self.doc.node(&path[..depth]).and_then(Node::kind) == Some(BlockKind::Callout)
        })
    }

    /// Path of the text leaf of the text block at `block`, and its text.
    fn leaf_text(&self, block: &[usize]) -> Result<(Path, String), EditError> {
        let mut leaf = block.to_vec();
        leaf.push(0);
        match self.doc.node(&leaf) {
            Some(Node::Text(t)) => Ok((leaf, t.text.clone())),
            _ => Err(EditError::Apply(ApplyError::InvalidPath(format!(
                "No text leaf at {leaf:?}"
            )))),
        }
    }

    pub(crate) fn insert_text(
        &mut self,
        block: &[usize],
        char_offset: usize,
        text: &str,
    ) -> Result<(), EditError> {
        if text.is_empty() {
            return Ok(());
        }
        let (leaf, current) = self.leaf_text(block)?;
        self.push(Op::InsertText {
            path: leaf,
            offset: char_to_byte(&current, char_offset),
            text: text.to_string(),
        })
    }

    pub(crate) fn remove_chars(
        &mut self,
        block: &[usize],
        chars: Range<usize>,
    ) -> Result<(), EditError> {
        if chars.start >= chars.end {
            return Ok(());
        }
        let (leaf, current) = self.leaf_text(block)?;
        self.push(Op::RemoveText {
            path: leaf,
            range: char_to_byte(&current, chars.start)..char_to_byte(&current, chars.end),
        })
    }

    /// Replaces the node at `path` with `node`.
    pub(crate) fn replace_node(&mut self, path: &[usize], node: Node) -> Result<(), EditError> {
        self.push(Op::RemoveNode {
            path: path.to_vec(),
        })?;
        self.push(Op::InsertNode {
            path: path.to_vec(),
            node,
        })
    }

    pub(crate) fn delete(&mut self, range: Range<usize>) -> Result<(), EditError> {
        let invalid = EditError::InvalidRange {
            from: range.start,
            to: range.end,
        };
        if range.start > range.end {
            return Err(invalid);
        }
        if range.is_empty() {
            return Ok(());
        }
        let (Some(a), Some(b)) = (self.doc.resolve(range.start), self.doc.resolve(range.end))
        else {
            return Err(invalid);
        };

        match (a.in_text_block, b.in_text_block) {
            (true, true) if a.parent == b.parent => {
                self.remove_chars(&a.parent, a.parent_offset..b.parent_offset)
            }
            (false, false) if a.parent == b.parent => {
                for ix in (a.index..b.index).rev() {
                    let mut path = a.parent.clone();
                    path.push(ix);
                    self.push(Op::RemoveNode { path })?;
                }
                Ok(())
            }
            (true, true) => {
                let (a_parent, a_ix) = split_leaf(&a.parent);
                let (b_parent, b_ix) = split_leaf(&b.parent);
                if a_parent != b_parent {
                    let depth = a
                        .parent
                        .iter()
                        .zip(&b.parent)
                        .take_while(|(x, y)| x == y)
                        .count();
                    let ordered = matches!(
                        (a.parent.get(depth), b.parent.get(depth)),
                        (Some(x), Some(y)) if x < y
                    );
                    if !ordered {
                        return Err(invalid);
                    }
                    return self.delete_across(
                        (&a.parent, a.parent_offset),
                        (&b.parent, b.parent_offset),
                        depth,
                    );
                }
                if a_ix >= b_ix {
                    return Err(invalid);
                }
                let (_, tail) = self.leaf_text(&b.parent)?;
                let tail: String = tail.chars().skip(b.parent_offset).collect();
                let (_, head) = self.leaf_text(&a.parent)?;
                let head_len = head.chars().count();

                for ix in (a_ix + 1..=b_ix).rev() {
                    let mut path = a_parent.to_vec();
                    path.push(ix);
                    self.push(Op::RemoveNode { path })?;
                }
                self.remove_chars(&a.parent, a.parent_offset..head_len)?;
                self.insert_text(&a.parent, a.parent_offset, &tail)
            }
            _ => Err(invalid),
        }
    }

    /// Deletes between text blocks under different parents. Both blocks stay
    /// in place: `start` loses its text after `start_offset`, `end` loses its
    /// text before `end_offset`, and every block between them is removed.
    /// The paths first differ at `depth`.
    fn delete_across(
        &mut self,
        (start, start_offset): (&[usize], usize),
        (end, end_offset): (&[usize], usize),
        depth: usize,
    ) -> Result<(), EditError> {
        // Later paths first, so earlier ones stay valid.
        self.remove_chars(end, 0..end_offset)?;
        for level in (depth + 1..end.len()).rev() {
            for ix in (0..end[level]).rev() {
                let mut path = end[..level].to_vec();
                path.push(ix);
                self.push(Op::RemoveNode { path })?;
            }
        }
        for ix in (start[depth] + 1..end[depth]).rev() {
            let mut path = start[..depth].to_vec();
            path.push(ix);
            self.push(Op::RemoveNode { path })?;
        }
        for level in (depth + 1..start.len()).rev() {
            let siblings = self
                .doc
                .children_at(&start[..level])
                .map_or(0, <[Node]>::len);
            for ix in (start[level] + 1..siblings).rev() {
                let mut path = start[..level].to_vec();
                path.push(ix);
                self.push(Op::RemoveNode { path })?;
            }
        }
        let (_, head) = self.leaf_text(start)?;
        self.remove_chars(start, start_offset..head.chars().count())
    }

    /// Inserts `node` at `pos`. Inside a text block the block is split around
    /// the new node; an empty text block is replaced by it. Returns the path
    /// of the inserted node.
    pub(crate) fn insert_block(&mut self, pos: usize, node: Node) -> Result<Path, EditError> {
        self.check_known(&node)?;
        let resolved = self
            .doc
            .resolve(pos)
            .ok_or(EditError::InvalidRange { from: pos, to: pos })?;

        if node.contains_kind(BlockKind::Callout)
            && (node.has_nested_callout() || self.has_callout_ancestor(&resolved.parent))
        {
            return Err(EditError::StructuralViolation);
        }

        if !resolved.in_text_block {
            let mut path = resolved.parent;
            path.push(resolved.index);
            self.push(Op::InsertNode {
                path: path.clone(),
                node,
            })?;
            return Ok(path);
        }

        let block_path = resolved.parent;
        let (parent, ix) = split_leaf(&block_path);
        let (_, text) = self.leaf_text(&block_path)?;
        let len = text.chars().count();
        let offset = resolved.parent_offset;

        if len == 0 {
            self.replace_node(&block_path, node)?;
            return Ok(block_path);
        }
        if offset == 0 {
            self.push(Op::InsertNode {
                path: block_path.clone(),
                node,
            })?;
            return Ok(block_path);
        }

        let mut after = parent.to_vec();
        after.push(ix + 1);
        if offset < len {
            let Some(Node::Element(el)) = self.doc.node(&block_path) else {
                return Err(EditError::InvalidRange { from: pos, to: pos });
            };
            let tail = Node::Element(ElementNode {
                kind: el.kind,
                attrs: el.attrs.clone(),
                children: vec![Node::text(text.chars().skip(offset).collect::<String>())],
            });
            self.remove_chars(&block_path, offset..len)?;
            self.push(Op::InsertNode {
                path: after.clone(),
                node: tail,
            })?;
        }
        self.push(Op::InsertNode {
            path: after.clone(),
            node,
        })?;
        Ok(after)
    }

    /// Sibling block range covered by `[from, to)`: the parent path and the
    /// child index range. A position inside a text block stands for that block.
    fn block_range(&self, from: usize, to: usize) -> Result<(Path, Range<usize>), EditError> {
        let invalid = EditError::InvalidRange { from, to };
        let (Some(a), Some(b)) = (self.doc.resolve(from), self.doc.resolve(to)) else {
            return Err(invalid);
        };

        let (a_parent, a_index) = if a.in_text_block {
            let (parent, ix) = split_leaf(&a.parent);
            (parent.to_vec(), ix)
        } else {
            (a.parent.clone(), a.index)
        };
        let (b_parent, b_end) = if b.in_text_block {
            let (parent, ix) = split_leaf(&b.parent);
            (parent.to_vec(), ix + 1)
        } else {
            (b.parent.clone(), b.index)
        };

        let depth = a_parent
            .iter()
            .zip(&b_parent)
            .take_while(|(x, y)| x == y)
            .count();
        let start = a_parent.get(depth).copied().unwrap_or(a_index);
        let end = b_parent.get(depth).map(|ix| ix + 1).unwrap_or(b_end);
        if start >= end {
            return Err(invalid);
        }
        Ok((a_parent[..depth].to_vec(), start..end))
    }

    pub(crate) fn wrap(
        &mut self,
        range: Range<usize>,
        kind: BlockKind,
        attrs: Attrs,
    ) -> Result<(), EditError> {
        if !kind.is_container() {
            return Err(EditError::NotAContainer(kind));
        }
        if !self.registry.is_known_kind(kind) {
            return Err(EditError::UnknownKind(kind));
        }

        let (parent, indices) = self.block_range(range.start, range.end)?;
        let siblings = self
            .doc
            .children_at(&parent)
            .ok_or(EditError::InvalidRange {
                from: range.start,
                to: range.end,
            })?;
        let wrapped: Vec<Node> = siblings[indices.clone()].to_vec();

        if kind == BlockKind::Callout
            && (self.has_callout_ancestor(&parent)
                || wrapped.iter().any(|n| n.contains_kind(BlockKind::Callout)))
        {
            return Err(EditError::StructuralViolation);
        }

        let wrapped_start = self
            .doc
            .boundary_pos(&parent, indices.start)
            .unwrap_or(range.start);
        let wrapped_end = self
            .doc
            .boundary_pos(&parent, indices.end)
            .unwrap_or(range.end);
        let before = self.selection;

        for ix in indices.clone().rev() {
            let mut path = parent.clone();
            path.push(ix);
            self.push(Op::RemoveNode { path })?;
        }
        let mut path = parent;
        path.push(indices.start);
        self.push(Op::InsertNode {
            path,
            node: Node::Element(ElementNode {
                kind,
                attrs,
                children: wrapped,
            }),
        })?;

        let remap = |p: usize| {
            if p >= wrapped_end {
                p + 2
            } else if p > wrapped_start {
                p + 1
            } else {
                p
            }
        };
        self.selection = Selection::new(remap(before.anchor), remap(before.head));
        Ok(())
    }

    /// Lifts the children of the innermost `kind` ancestor of `pos` into its
    /// parent.
    pub(crate) fn unwrap(&mut self, pos: usize, kind: BlockKind) -> Result<(), EditError> {
        let path = self
            .doc
            .innermost_ancestor(pos, kind)
            .ok_or(EditError::NotFound { kind })?;
        let Some(Node::Element(el)) = self.doc.node(&path) else {
            return Err(EditError::NotFound { kind });
        };
        let children = el.children.clone();
        let (parent, ix) = split_leaf(&path);
        let parent = parent.to_vec();

        if children.iter().any(|n| n.contains_kind(BlockKind::Callout))
            && self.has_callout_ancestor(&parent)
        {
            return Err(EditError::StructuralViolation);
        }

        let range = self
            .doc
            .node_range(&path)
            .ok_or(EditError::NotFound { kind })?;
        let before = self.selection;

        self.push(Op::RemoveNode { path })?;
        for (offset, child) in children.into_iter().enumerate() {
            let mut child_path = parent.clone();
            child_path.push(ix + offset);
            self.push(Op::InsertNode {
                path: child_path,
                node: child,
            })?;
        }

        let remap = |p: usize| {
            if p >= range.end {
                p - 2
            } else if p > range.start {
                p - 1
            } else {
                p
            }
        };
        self.selection = Selection::new(remap(before.anchor), remap(before.head));
        Ok(())
    }
}

fn split_leaf(path: &[usize]) -> (&[usize], usize) {
    match path.split_last() {
        Some((&ix, parent)) => (parent, ix),
        None => (path, 0),
    }
}

impl Editor {
    /// Plans an edit on a draft and applies it as one transaction.
    pub(crate) fn commit(
        &mut self,
        source: &str,
        build: impl FnOnce(&mut Draft<'_>) -> Result<(), EditError>,
    ) -> Result<(), EditError> {
        let tx = {
            let mut draft = Draft::new(self);
            build(&mut draft)?;
            draft.into_transaction(source)
        };
        self.apply(tx)?;
        Ok(())
    }

    /// Removes `[range.start, range.end)`. Ranges may cover part of one text
    /// block, whole sibling blocks, or run from one text block into a later
    /// one. Sibling text blocks are joined; across nesting levels both ends
    /// keep their remaining text in their own containers.
    pub fn delete(&mut self, range: Range<usize>) -> Result<(), EditError> {
        let from = range.start;
        self.commit("edit.delete", |draft| {
            draft.delete(range)?;
            let pos = draft.doc().nearest_text_pos(from);
            draft.set_selection(Selection::collapsed(pos));
            Ok(())
        })
    }

    /// Deletes `range`, then inserts `node` where it started.
    pub fn insert(&mut self, range: Range<usize>, node: Node) -> Result<(), EditError> {
        self.commit("edit.insert", |draft| {
            let from = range.start;
            draft.delete(range)?;
            let path = draft.insert_block(from, node)?;
            let start = draft.doc().node_start(&path).unwrap_or(from);
            let pos = draft.doc().nearest_text_pos(start);
            draft.set_selection(Selection::collapsed(pos));
            Ok(())
        })
    }

    /// Substitutes `range` with inline text and puts the caret after it.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<(), EditError> {
        self.replace_with_source(range, text, "edit.replace")
    }

    pub(crate) fn replace_with_source(
        &mut self,
        range: Range<usize>,
        text: &str,
        source: &str,
    ) -> Result<(), EditError> {
        self.commit(source, |draft| {
            let from = range.start;
            draft.delete(range)?;
            let chars = text.chars().count();
            let resolved = draft
                .doc()
                .resolve(from)
                .ok_or(EditError::InvalidRange { from, to: from })?;
            let caret = if text.is_empty() {
                draft.doc().nearest_text_pos(from)
            } else if resolved.in_text_block {
                draft.insert_text(&resolved.parent, resolved.parent_offset, text)?;
                from + chars
            } else {
                let path = draft.insert_block(from, Node::paragraph(text))?;
                draft.doc().node_start(&path).unwrap_or(from) + 1 + chars
            };
            draft.set_selection(Selection::collapsed(caret));
            Ok(())
        })
    }

    /// Wraps the blocks covered by `range` in a new `kind` container.
    pub fn wrap(
        &mut self,
        range: Range<usize>,
        kind: BlockKind,
        attrs: Attrs,
    ) -> Result<(), EditError> {
        self.commit("edit.wrap", |draft| draft.wrap(range, kind, attrs))
    }

    /// Lifts the content of the nearest `kind` ancestor of `range.start` into
    /// its parent, removing the container.
    pub fn unwrap(&mut self, range: Range<usize>, kind: BlockKind) -> Result<(), EditError> {
        self.commit("edit.unwrap", |draft| draft.unwrap(range.start, kind))
    }

    /// Replaces `range` with `text` as one undoable step. Used to accept an
    /// assist rewrite.
    pub fn apply_changes(&mut self, range: Range<usize>, text: &str) -> Result<(), EditError> {
        self.replace_with_source(range, text, "assist.apply")
    }
}
