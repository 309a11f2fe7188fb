use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::callout::{CALLOUT_TYPE_ATTR, CalloutType};
use crate::error::{ApplyError, PathError};
use crate::ops::{Op, Transaction};
use crate::plugin::PluginRegistry;
use crate::request::EditorRequest;

pub type Attrs = BTreeMap<String, serde_json::Value>;

pub const LEVEL_ATTR: &str = "level";
pub const CHECKED_ATTR: &str = "checked";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    TaskList,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Callout,
}

/// What a block may hold: nested blocks, inline text, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::BulletList => "bullet_list",
            BlockKind::OrderedList => "ordered_list",
            BlockKind::TaskList => "task_list",
            BlockKind::Blockquote => "blockquote",
            BlockKind::CodeBlock => "code_block",
            BlockKind::HorizontalRule => "horizontal_rule",
            BlockKind::Callout => "callout",
        }
    }

    pub fn content(self) -> ChildConstraint {
        match self {
            BlockKind::Blockquote | BlockKind::Callout => ChildConstraint::BlockOnly,
            BlockKind::HorizontalRule => ChildConstraint::None,
            _ => ChildConstraint::InlineOnly,
        }
    }

    pub fn is_container(self) -> bool {
        self.content() == ChildConstraint::BlockOnly
    }

    pub fn is_text_block(self) -> bool {
        self.content() == ChildConstraint::InlineOnly
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            BlockKind::BulletList | BlockKind::OrderedList | BlockKind::TaskList
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Size of the document content in the linear addressing space.
    pub fn content_size(&self) -> usize {
        self.children.iter().map(Node::size).sum()
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &ix in rest {
            node = match node {
                Node::Element(el) => el.children.get(ix)?,
                Node::Void(_) | Node::Text(_) => return None,
            };
        }
        Some(node)
    }

    pub fn children_at(&self, parent_path: &[usize]) -> Option<&[Node]> {
        if parent_path.is_empty() {
            return Some(&self.children);
        }
        match self.node(parent_path)? {
            Node::Element(el) => Some(&el.children),
            Node::Void(_) | Node::Text(_) => None,
        }
    }

    /// Text of every text block, one block per line.
    pub fn plain_text(&self) -> String {
        fn walk(children: &[Node], lines: &mut Vec<String>) {
            for node in children {
                match node {
                    Node::Element(el) if el.kind.is_text_block() => lines.push(node.text_content()),
                    Node::Element(el) => walk(&el.children, lines),
                    Node::Void(_) | Node::Text(_) => {}
                }
            }
        }

        let mut lines = Vec::new();
        walk(&self.children, &mut lines);
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn text_block(kind: BlockKind, attrs: Attrs, text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind,
            attrs,
            children: vec![Node::text(text)],
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode { text: text.into() })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text_block(BlockKind::Paragraph, Attrs::default(), text)
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(LEVEL_ATTR.to_string(), serde_json::Value::from(level));
        Self::text_block(BlockKind::Heading, attrs, text)
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        Self::text_block(BlockKind::CodeBlock, Attrs::default(), text)
    }

    pub fn list_item(kind: BlockKind, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        if kind == BlockKind::TaskList {
            attrs.insert(CHECKED_ATTR.to_string(), serde_json::Value::Bool(false));
        }
        Self::text_block(kind, attrs, text)
    }

    pub fn task_item(text: impl Into<String>, checked: bool) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(CHECKED_ATTR.to_string(), serde_json::Value::Bool(checked));
        Self::text_block(BlockKind::TaskList, attrs, text)
    }

    pub fn horizontal_rule() -> Self {
        Node::Void(VoidNode {
            kind: BlockKind::HorizontalRule,
            attrs: Attrs::default(),
        })
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: BlockKind::Blockquote,
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn callout(callout_type: CalloutType, children: Vec<Node>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(
            CALLOUT_TYPE_ATTR.to_string(),
            serde_json::Value::from(callout_type.as_str()),
        );
        Node::Element(ElementNode {
            kind: BlockKind::Callout,
            attrs,
            children,
        })
    }

    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Node::Element(el) => Some(el.kind),
            Node::Void(v) => Some(v.kind),
            Node::Text(_) => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Node::Element(el) => Some(&el.attrs),
            Node::Void(v) => Some(&v.attrs),
            Node::Text(_) => None,
        }
    }

    /// Extent of the node in the linear addressing space: one token per
    /// character, one per void block, and an open/close pair per element.
    pub fn size(&self) -> usize {
        match self {
            Node::Text(t) => t.text.chars().count(),
            Node::Void(_) => 1,
            Node::Element(el) => 2 + el.children.iter().map(Node::size).sum::<usize>(),
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Void(_) => String::new(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Whether this node or any descendant is of `kind`.
    pub fn contains_kind(&self, kind: BlockKind) -> bool {
        if self.kind() == Some(kind) {
            return true;
        }
        match self {
            Node::Element(el) => el.children.iter().any(|child| child.contains_kind(kind)),
            Node::Void(_) | Node::Text(_) => false,
        }
    }

    /// Whether a callout appears anywhere below another callout in this subtree.
    pub fn has_nested_callout(&self) -> bool {
        match self {
            Node::Element(el) if el.kind == BlockKind::Callout => el
                .children
                .iter()
                .any(|child| child.contains_kind(BlockKind::Callout)),
            Node::Element(el) => el.children.iter().any(Node::has_nested_callout),
            Node::Void(_) | Node::Text(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: BlockKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: BlockKind,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

/// A selection in linear document positions. `anchor` stays put while `head`
/// follows the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn collapsed(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn range(&self) -> Range<usize> {
        self.from()..self.to()
    }
}

/// One history entry. `ops` take the document from one side of the edit to
/// the other; replaying them yields the entry for the opposite stack.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo: 200,
            max_normalize_iterations: 100,
        }
    }
}

impl EditorConfig {
    /// Zero means "unset" for both limits.
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    pub(crate) requests: VecDeque<EditorRequest>,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: config.with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            requests: VecDeque::new(),
        };
        editor.normalize_in_place();
        editor
    }

    /// An editor over `doc` with every block plugin enabled and the caret at
    /// the start of the first text block.
    pub fn from_document(doc: Document) -> Self {
        Self::new(doc, Selection::collapsed(0), PluginRegistry::standard())
    }

    pub fn with_standard_plugins() -> Self {
        Self::from_document(Document::new(vec![Node::paragraph("")]))
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.normalize_selection_in_place();
    }

    pub fn set_selection_range(&mut self, range: Range<usize>) {
        self.set_selection(Selection::new(range.start, range.end));
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };
        let selection = record.selection_before;
        let record = self.replay(record, selection);
        self.redo_stack.push(record);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };
        let selection = record.selection_after;
        let record = self.replay(record, selection);
        self.undo_stack.push(record);
        true
    }

    /// Applies a history entry's ops and returns the entry that reverses
    /// them. A failing op ends the replay with the document as far as it got.
    fn replay(&mut self, record: UndoRecord, selection: Selection) -> UndoRecord {
        let UndoRecord {
            ops,
            selection_before,
            selection_after,
        } = record;

        let mut reverse = Vec::with_capacity(ops.len());
        for op in ops {
            let path = op.path().to_vec();
            match self.apply_op(op) {
                Ok(inverse) => reverse.push(inverse),
                Err(err) => {
                    tracing::warn!(?path, "history replay stopped: {err}");
                    break;
                }
            }
        }
        reverse.reverse();

        self.selection = selection;
        self.normalize_in_place();
        UndoRecord {
            ops: reverse,
            selection_before,
            selection_after,
        }
    }

    /// Applies every op of `tx`, then normalizes. Either the whole transaction
    /// lands as one undo step or the document is left untouched.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        if tx.is_empty() && tx.selection_after.is_none() {
            return Ok(());
        }

        let selection_before = self.selection;

        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in tx.ops.iter().cloned() {
            match self.apply_op(op) {
                Ok(inv) => inverse_ops.push(inv),
                Err(err) => {
                    self.rollback(inverse_ops, selection_before);
                    return Err(err);
                }
            }
        }

        if let Some(sel) = tx.selection_after {
            self.selection = sel;
        }

        if let Err(err) = self.normalize_into(&mut inverse_ops) {
            self.rollback(inverse_ops, selection_before);
            return Err(err);
        }
        inverse_ops.reverse();

        self.normalize_selection_in_place();

        let selection_after = self.selection;

        tracing::trace!(
            source = tx.source.as_deref().unwrap_or("unknown"),
            ops = tx.ops.len(),
            structural = tx.structural_ops(),
            "applied transaction"
        );

        self.undo_stack.push(UndoRecord {
            ops: inverse_ops,
            selection_before,
            selection_after,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(())
    }

    fn rollback(&mut self, applied_inverse: Vec<Op>, selection: Selection) {
        for op in applied_inverse.into_iter().rev() {
            let path = op.path().to_vec();
            if let Err(err) = self.apply_op(op) {
                tracing::error!(?path, "rollback failed: {err}");
                break;
            }
        }
        self.selection = selection;
    }

    fn normalize_in_place(&mut self) {
        let mut discarded = Vec::new();
        if let Err(err) = self.normalize_into(&mut discarded) {
            tracing::warn!("normalization stopped early: {err}");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_selection_in_place(&mut self) {
        self.selection = Selection {
            anchor: self.doc.nearest_text_pos(self.selection.anchor),
            head: self.doc.nearest_text_pos(self.selection.head),
        };
    }

    fn normalize_into(&mut self, inverse_ops: &mut Vec<Op>) -> Result<(), ApplyError> {
        for _ in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&self.doc);
            if ops.is_empty() {
                return Ok(());
            }
            for op in ops {
                let inv = self.apply_op(op)?;
                inverse_ops.push(inv);
            }
        }
        Err(ApplyError::NormalizeDidNotConverge)
    }

    fn apply_op(&mut self, op: Op) -> Result<Op, ApplyError> {
        apply_op_to(&mut self.doc, &mut self.selection, op)
    }
}

/// Applies one op to `doc`, maps `selection` through it, and returns the op
/// that undoes it.
pub(crate) fn apply_op_to(
    doc: &mut Document,
    selection: &mut Selection,
    op: Op,
) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = node_text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&text_node.text, offset);
            text_node.text.insert_str(offset, &text);
            let pos = text_pos(doc, &path, offset)?;
            map_selection_insert(selection, pos, text.chars().count());
            Ok(Op::RemoveText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Op::RemoveText { path, range } => {
            let text_node = node_text_mut(doc, &path)?;
            let start =
                clamp_to_char_boundary(&text_node.text, range.start.min(text_node.text.len()));
            let end = clamp_to_char_boundary(&text_node.text, range.end.min(text_node.text.len()));
            if start >= end {
                return Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = text_node.text[start..end].to_string();
            text_node.text.replace_range(start..end, "");
            let pos = text_pos(doc, &path, start)?;
            map_selection_remove(selection, pos, removed.chars().count());
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            let size = node.size();
            insert_node(doc, &path, node)?;
            let pos = doc
                .node_start(&path)
                .ok_or_else(|| PathError(format!("Inserted node not addressable: {path:?}")))?;
            map_selection_insert(selection, pos, size);
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let pos = doc
                .node_start(&path)
                .ok_or_else(|| PathError(format!("Remove path not addressable: {path:?}")))?;
            let removed = remove_node(doc, &path)?;
            map_selection_remove(selection, pos, removed.size());
            Ok(Op::InsertNode {
                path,
                node: removed,
            })
        }
        Op::SetNodeAttrs { path, patch } => {
            let node = node_mut(doc, &path)?;
            let old = match node {
                Node::Element(el) => patch.apply_to(&mut el.attrs),
                Node::Void(v) => patch.apply_to(&mut v.attrs),
                Node::Text(_) => return Err(ApplyError::InvalidPath("Text has no attrs".into())),
            };
            Ok(Op::SetNodeAttrs { path, patch: old })
        }
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

/// Byte offset of the `char_offset`-th character of `s`, clamped to its end.
/// This is the only place linear character offsets become text-op offsets.
pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(ix, _)| ix)
        .unwrap_or(s.len())
}

fn text_pos(doc: &Document, path: &[usize], byte_offset: usize) -> Result<usize, PathError> {
    let start = doc
        .node_start(path)
        .ok_or_else(|| PathError(format!("Text path not addressable: {path:?}")))?;
    let Some(Node::Text(t)) = doc.node(path) else {
        return Err(PathError("Expected Text node".into()));
    };
    let byte_offset = clamp_to_char_boundary(&t.text, byte_offset);
    Ok(start + t.text[..byte_offset].chars().count())
}

fn map_selection_insert(selection: &mut Selection, pos: usize, len: usize) {
    for point in [&mut selection.anchor, &mut selection.head] {
        if *point >= pos {
            *point = point.saturating_add(len);
        }
    }
}

fn map_selection_remove(selection: &mut Selection, pos: usize, len: usize) {
    for point in [&mut selection.anchor, &mut selection.head] {
        if *point <= pos {
            continue;
        }
        if *point >= pos + len {
            *point -= len;
        } else {
            *point = pos;
        }
    }
}

fn child_mut<'a>(
    children: &'a mut [Node],
    path: &[usize],
    depth: usize,
) -> Result<&'a mut Node, PathError> {
    let Some((&ix, rest)) = path.split_first() else {
        return Err(PathError("Empty path".into()));
    };
    let len = children.len();
    let node = children.get_mut(ix).ok_or_else(|| {
        PathError(format!("Path out of bounds at depth {depth}: {ix} >= {len}"))
    })?;
    if rest.is_empty() {
        return Ok(node);
    }
    match node {
        Node::Element(el) => child_mut(&mut el.children, rest, depth + 1),
        Node::Void(_) | Node::Text(_) => {
            Err(PathError(format!("Non-container node at depth {depth}")))
        }
    }
}

fn node_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Node, PathError> {
    child_mut(&mut doc.children, path, 0)
}

fn node_text_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, PathError> {
    match node_mut(doc, path)? {
        Node::Text(t) => Ok(t),
        _ => Err(PathError("Expected Text node".into())),
    }
}

fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, PathError> {
    if parent_path.is_empty() {
        return Ok(&mut doc.children);
    }
    match node_mut(doc, parent_path)? {
        Node::Element(el) => Ok(&mut el.children),
        Node::Void(_) | Node::Text(_) => Err(PathError("Parent is not a container".into())),
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty insert path".into()));
    };

    let children = children_mut(doc, parent_path)?;
    if index > children.len() {
        return Err(PathError(format!(
            "Insert index out of bounds: {index} > {}",
            children.len()
        )));
    }
    children.insert(index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty remove path".into()));
    };

    let children = children_mut(doc, parent_path)?;
    if index >= children.len() {
        return Err(PathError(format!(
            "Remove index out of bounds: {index} >= {}",
            children.len()
        )));
    }
    Ok(children.remove(index))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut set = Attrs::new();
        set.insert(key.into(), value.into());
        Self {
            set,
            remove: Vec::new(),
        }
    }

    /// Writes the patch into `attrs` and returns the patch restoring them.
    fn apply_to(&self, attrs: &mut Attrs) -> AttrPatch {
        let mut restore = AttrPatch::default();
        for (key, value) in &self.set {
            match attrs.insert(key.clone(), value.clone()) {
                Some(prev) => {
                    restore.set.insert(key.clone(), prev);
                }
                None => restore.remove.push(key.clone()),
            }
        }
        for key in &self.remove {
            if let Some(prev) = attrs.remove(key) {
                restore.set.insert(key.clone(), prev);
            }
        }
        restore
    }
}
