use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    AttrPatch, Attrs, BlockKind, CHECKED_ATTR, Editor, ElementNode, LEVEL_ATTR, Node, Selection,
};
use crate::edit::Draft;
use crate::error::EditError;
use crate::ops::{Op, Path};
use crate::plugin::MAX_HEADING_LEVEL;
use crate::position::BlockRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Ordered,
    Task,
}

impl ListKind {
    pub fn block_kind(self) -> BlockKind {
        match self {
            ListKind::Bullet => BlockKind::BulletList,
            ListKind::Ordered => BlockKind::OrderedList,
            ListKind::Task => BlockKind::TaskList,
        }
    }
}

impl Draft<'_> {
    /// Text blocks touched by the selection, in document order.
    fn selected_text_blocks(&self) -> Result<Vec<BlockRange>, EditError> {
        let selection = self.selection();
        let (from, to) = (selection.from(), selection.to());
        let blocks: Vec<BlockRange> = self
            .doc()
            .text_blocks()
            .into_iter()
            .filter(|b| b.range.start < to && from < b.range.end)
            .collect();
        if blocks.is_empty() {
            return Err(EditError::InvalidRange { from, to });
        }
        Ok(blocks)
    }

    /// Changes the kind and attributes of a text block, keeping its text.
    fn retype_block(&mut self, path: &[usize], kind: BlockKind, attrs: Attrs) -> Result<(), EditError> {
        let Some(Node::Element(el)) = self.doc().node(path) else {
            return Err(EditError::InvalidRange { from: 0, to: 0 });
        };
        if !el.kind.is_text_block() {
            return Err(EditError::NotATextBlock(el.kind));
        }
        let node = Node::Element(ElementNode {
            kind,
            attrs,
            children: el.children.clone(),
        });
        self.replace_node(path, node)
    }

    /// Retypes every selected text block; block sizes are unchanged so the
    /// selection is restored afterwards.
    fn retype_selected(
        &mut self,
        mut target: impl FnMut(&BlockRange) -> (BlockKind, Attrs),
    ) -> Result<(), EditError> {
        let before = self.selection();
        for block in self.selected_text_blocks()? {
            let (kind, attrs) = target(&block);
            self.retype_block(&block.path, kind, attrs)?;
        }
        self.set_selection(before);
        Ok(())
    }

    fn all_selected_are(&self, kind: BlockKind) -> Result<bool, EditError> {
        Ok(self
            .selected_text_blocks()?
            .iter()
            .all(|block| block.kind == kind))
    }

    pub(crate) fn set_heading(&mut self, level: u8) -> Result<(), EditError> {
        let level = u64::from(level).clamp(1, MAX_HEADING_LEVEL);
        self.retype_selected(|_| {
            let mut attrs = Attrs::new();
            attrs.insert(LEVEL_ATTR.to_string(), Value::from(level));
            (BlockKind::Heading, attrs)
        })
    }

    pub(crate) fn set_paragraph(&mut self) -> Result<(), EditError> {
        self.retype_selected(|_| (BlockKind::Paragraph, Attrs::new()))
    }

    pub(crate) fn toggle_list(&mut self, list: ListKind) -> Result<(), EditError> {
        let kind = list.block_kind();
        if self.all_selected_are(kind)? {
            return self.set_paragraph();
        }
        self.retype_selected(|block| {
            if block.kind == kind {
                return (kind, Attrs::new());
            }
            let mut attrs = Attrs::new();
            if kind == BlockKind::TaskList {
                attrs.insert(CHECKED_ATTR.to_string(), Value::Bool(false));
            }
            (kind, attrs)
        })
    }

    pub(crate) fn toggle_code_block(&mut self) -> Result<(), EditError> {
        if self.all_selected_are(BlockKind::CodeBlock)? {
            return self.set_paragraph();
        }
        self.retype_selected(|_| (BlockKind::CodeBlock, Attrs::new()))
    }

    pub(crate) fn toggle_blockquote(&mut self) -> Result<(), EditError> {
        let from = self.selection().from();
        if self
            .doc()
            .innermost_ancestor(from, BlockKind::Blockquote)
            .is_some()
        {
            return self.unwrap(from, BlockKind::Blockquote);
        }
        let range = self.selection().range();
        self.wrap(range, BlockKind::Blockquote, Attrs::new())
    }

    pub(crate) fn toggle_task_checked(&mut self) -> Result<(), EditError> {
        let from = self.selection().from();
        let path = self
            .doc()
            .innermost_ancestor(from, BlockKind::TaskList)
            .ok_or(EditError::NotFound {
                kind: BlockKind::TaskList,
            })?;
        let checked = self
            .doc()
            .node(&path)
            .and_then(Node::attrs)
            .and_then(|attrs| attrs.get(CHECKED_ATTR))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        self.push(Op::SetNodeAttrs {
            path,
            patch: AttrPatch::set(CHECKED_ATTR, !checked),
        })
    }

    /// Puts a rule after the current block followed by a fresh paragraph for
    /// the caret. An empty paragraph is replaced by the rule.
    pub(crate) fn insert_horizontal_rule(&mut self) -> Result<(), EditError> {
        let from = self.selection().from();
        let resolved = self
            .doc()
            .resolve(from)
            .ok_or(EditError::InvalidRange { from, to: from })?;

        let rule_path: Path = if resolved.in_text_block {
            let block = resolved.parent;
            let empty_paragraph = matches!(
                self.doc().node(&block),
                Some(node) if node.kind() == Some(BlockKind::Paragraph) && node.text_content().is_empty()
            );
            if empty_paragraph {
                self.replace_node(&block, Node::horizontal_rule())?;
                block
            } else {
                let mut after = block;
                if let Some(last) = after.last_mut() {
                    *last += 1;
                }
                self.push(Op::InsertNode {
                    path: after.clone(),
                    node: Node::horizontal_rule(),
                })?;
                after
            }
        } else {
            let mut path = resolved.parent;
            path.push(resolved.index);
            self.push(Op::InsertNode {
                path: path.clone(),
                node: Node::horizontal_rule(),
            })?;
            path
        };

        let mut paragraph_path = rule_path;
        if let Some(last) = paragraph_path.last_mut() {
            *last += 1;
        }
        self.push(Op::InsertNode {
            path: paragraph_path.clone(),
            node: Node::paragraph(""),
        })?;
        let caret = self.doc().node_start(&paragraph_path).unwrap_or(from) + 1;
        self.set_selection(Selection::collapsed(caret));
        Ok(())
    }
}

impl Editor {
    /// Turns the selected text blocks into headings; `level` is clamped to 1..=3.
    pub fn set_heading(&mut self, level: u8) -> Result<(), EditError> {
        self.commit("block.set_heading", |draft| draft.set_heading(level))
    }

    pub fn set_paragraph(&mut self) -> Result<(), EditError> {
        self.commit("block.set_paragraph", |draft| draft.set_paragraph())
    }

    pub fn toggle_list(&mut self, list: ListKind) -> Result<(), EditError> {
        self.commit("block.toggle_list", |draft| draft.toggle_list(list))
    }

    pub fn toggle_code_block(&mut self) -> Result<(), EditError> {
        self.commit("block.toggle_code_block", |draft| draft.toggle_code_block())
    }

    pub fn toggle_blockquote(&mut self) -> Result<(), EditError> {
        self.commit("block.toggle_blockquote", |draft| draft.toggle_blockquote())
    }

    pub fn toggle_task_checked(&mut self) -> Result<(), EditError> {
        self.commit("block.toggle_task_checked", |draft| {
            draft.toggle_task_checked()
        })
    }

    pub fn insert_horizontal_rule(&mut self) -> Result<(), EditError> {
        self.commit("block.insert_horizontal_rule", |draft| {
            draft.insert_horizontal_rule()
        })
    }
}
