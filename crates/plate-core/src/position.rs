use std::ops::Range;

use serde::Serialize;

use crate::core::{BlockKind, Document, Node};
use crate::ops::Path;

/// A linear position resolved against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    /// Innermost node whose content holds `pos`; empty for the document itself.
    pub parent: Path,
    /// For a block boundary, the index of the child that starts at `pos`
    /// (equal to the child count at the end of the content).
    pub index: usize,
    /// Distance from the start of the parent's content. Inside a text block
    /// this is the character offset into its text.
    pub parent_offset: usize,
    pub in_text_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub path: Path,
    pub kind: BlockKind,
    pub range: Range<usize>,
}

impl Document {
    /// Position of the boundary before child `index` of `parent`.
    pub fn boundary_pos(&self, parent: &[usize], index: usize) -> Option<usize> {
        let mut pos = 0;
        let mut children: &[Node] = &self.children;
        for &ix in parent {
            let node = children.get(ix)?;
            pos += children[..ix].iter().map(Node::size).sum::<usize>();
            let Node::Element(el) = node else {
                return None;
            };
            pos += 1;
            children = &el.children;
        }
        if index > children.len() {
            return None;
        }
        Some(pos + children[..index].iter().map(Node::size).sum::<usize>())
    }

    pub fn node_start(&self, path: &[usize]) -> Option<usize> {
        let (&ix, parent) = path.split_last()?;
        self.node(path)?;
        self.boundary_pos(parent, ix)
    }

    pub fn node_range(&self, path: &[usize]) -> Option<Range<usize>> {
        let start = self.node_start(path)?;
        Some(start..start + self.node(path)?.size())
    }

    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        if pos > self.content_size() {
            return None;
        }

        let mut parent: Path = Vec::new();
        let mut children: &[Node] = &self.children;
        let mut content_start = 0;

        'descend: loop {
            let mut offset = content_start;
            for (ix, child) in children.iter().enumerate() {
                let end = offset + child.size();
                if pos == offset {
                    return Some(ResolvedPos {
                        pos,
                        parent,
                        index: ix,
                        parent_offset: pos - content_start,
                        in_text_block: false,
                    });
                }
                if pos < end {
                    let Node::Element(el) = child else {
                        return None;
                    };
                    parent.push(ix);
                    if el.kind.is_text_block() {
                        return Some(ResolvedPos {
                            pos,
                            parent,
                            index: 0,
                            parent_offset: pos - offset - 1,
                            in_text_block: true,
                        });
                    }
                    children = &el.children;
                    content_start = offset + 1;
                    continue 'descend;
                }
                offset = end;
            }

            return Some(ResolvedPos {
                pos,
                parent,
                index: children.len(),
                parent_offset: pos - content_start,
                in_text_block: false,
            });
        }
    }

    /// Every block in document order with its path and range.
    pub fn outline(&self) -> Vec<BlockRange> {
        fn walk(children: &[Node], path: &mut Path, start: usize, out: &mut Vec<BlockRange>) {
            let mut offset = start;
            for (ix, node) in children.iter().enumerate() {
                let size = node.size();
                path.push(ix);
                if let Some(kind) = node.kind() {
                    out.push(BlockRange {
                        path: path.clone(),
                        kind,
                        range: offset..offset + size,
                    });
                }
                if let Node::Element(el) = node
                    && el.kind.is_container()
                {
                    walk(&el.children, path, offset + 1, out);
                }
                path.pop();
                offset += size;
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), 0, &mut out);
        out
    }

    pub fn text_blocks(&self) -> Vec<BlockRange> {
        self.outline()
            .into_iter()
            .filter(|block| block.kind.is_text_block())
            .collect()
    }

    /// Text of `[from, to)`, with `separator` between text blocks.
    pub fn text_between(&self, from: usize, to: usize, separator: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        for block in self.text_blocks() {
            let content = block.range.start + 1..block.range.end - 1;
            if content.end < from || content.start > to {
                continue;
            }
            let Some(node) = self.node(&block.path) else {
                continue;
            };
            let start = from.max(content.start) - content.start;
            let end = to.min(content.end) - content.start;
            let text = node.text_content();
            parts.push(text.chars().skip(start).take(end.saturating_sub(start)).collect());
        }
        parts.join(separator)
    }

    /// Paths of the blocks enclosing `pos`, outermost first. Inside a text
    /// block the text block itself is the last entry.
    pub fn ancestors(&self, pos: usize) -> Vec<Path> {
        let Some(resolved) = self.resolve(pos) else {
            return Vec::new();
        };
        (1..=resolved.parent.len())
            .map(|depth| resolved.parent[..depth].to_vec())
            .collect()
    }

    /// Innermost ancestor of `pos` of the given kind.
    pub fn innermost_ancestor(&self, pos: usize, kind: BlockKind) -> Option<Path> {
        self.ancestors(pos)
            .into_iter()
            .rev()
            .find(|path| self.node(path).and_then(Node::kind) == Some(kind))
    }

    /// Maps `pos` onto the nearest position inside a text block, preferring
    /// the next one forward.
    pub fn nearest_text_pos(&self, pos: usize) -> usize {
        let pos = pos.min(self.content_size());
        if self.resolve(pos).is_some_and(|r| r.in_text_block) {
            return pos;
        }
        let blocks = self.text_blocks();
        if let Some(next) = blocks.iter().find(|b| b.range.start >= pos) {
            return next.range.start + 1;
        }
        blocks.last().map(|b| b.range.end - 1).unwrap_or(pos)
    }

    /// Start of the first text block's content.
    pub fn start_pos(&self) -> usize {
        self.nearest_text_pos(0)
    }
}
