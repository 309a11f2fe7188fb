use std::collections::HashMap;

use serde_json::Value;

use crate::callout::{CALLOUT_TYPE_ATTR, CalloutType};
use crate::core::{
    AttrPatch, BlockKind, CHECKED_ATTR, ChildConstraint, Document, ElementNode, LEVEL_ATTR, Node,
};
use crate::error::RegistryError;
use crate::ops::{Op, Path};

pub const MAX_HEADING_LEVEL: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub kind: BlockKind,
    pub is_void: bool,
    pub children: ChildConstraint,
}

impl NodeSpec {
    pub fn of(kind: BlockKind) -> Self {
        Self {
            kind,
            is_void: kind.content() == ChildConstraint::None,
            children: kind.content(),
        }
    }
}

/// A structural repair run after every transaction. Passes return ops in
/// reverse document order so each op's path is still valid when it lands.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait PlatePlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<BlockKind, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
}

impl PluginRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Box<dyn PlatePlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    /// Paragraphs plus the structural passes every document needs.
    pub fn core() -> Self {
        let plugins: Vec<Box<dyn PlatePlugin>> =
            vec![Box::new(CoreParagraphPlugin), Box::new(CoreNormalizePlugin)];
        Self::new(plugins).expect("core registry must be valid")
    }

    /// Every block kind the editor knows about.
    pub fn standard() -> Self {
        let plugins: Vec<Box<dyn PlatePlugin>> = vec![
            Box::new(CoreParagraphPlugin),
            Box::new(CoreNormalizePlugin),
            Box::new(HeadingPlugin),
            Box::new(ListPlugin),
            Box::new(CodeBlockPlugin),
            Box::new(BlockquotePlugin),
            Box::new(HorizontalRulePlugin),
            Box::new(CalloutPlugin),
        ];
        Self::new(plugins).expect("standard registry must be valid")
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn PlatePlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(RegistryError::DuplicateKind(spec.kind));
            }
            self.node_specs.insert(spec.kind, spec);
        }

        self.normalize_passes.extend(plugin.normalize_passes());
        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<BlockKind, NodeSpec> {
        &self.node_specs
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn is_known_kind(&self, kind: BlockKind) -> bool {
        self.node_specs.contains_key(&kind)
    }

    /// Ops of the first pass with something to fix. The editor re-runs
    /// normalization until no pass reports anything.
    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        for pass in &self.normalize_passes {
            let ops = pass.run(doc, self);
            if !ops.is_empty() {
                tracing::trace!(pass = pass.id(), ops = ops.len(), "normalize");
                return ops;
            }
        }
        Vec::new()
    }
}

/// Visits every element in reverse document order, children before their parent.
fn for_each_element_rev(
    children: &[Node],
    path: &mut Path,
    f: &mut dyn FnMut(&ElementNode, &[usize]),
) {
    for (ix, node) in children.iter().enumerate().rev() {
        let Node::Element(el) = node else {
            continue;
        };
        path.push(ix);
        for_each_element_rev(&el.children, path, f);
        f(el, path);
        path.pop();
    }
}

fn child_path(path: &[usize], ix: usize) -> Path {
    let mut child = path.to_vec();
    child.push(ix);
    child
}

struct CoreParagraphPlugin;

impl PlatePlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::Paragraph)]
    }
}

struct CoreNormalizePlugin;

impl PlatePlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(WrapStrayText),
            Box::new(EnsureTextBlocksHaveTextLeaf),
            Box::new(MergeAdjacentTextLeaves),
            Box::new(EnsureContainersNonEmpty),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// Text sitting directly in the document or in a container becomes a paragraph.
struct WrapStrayText;

impl NormalizePass for WrapStrayText {
    fn id(&self) -> &'static str {
        "core.wrap_stray_text"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        fn stray(children: &[Node], parent: &[usize], ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate().rev() {
                let Node::Text(t) = node else {
                    continue;
                };
                let path = child_path(parent, ix);
                ops.push(Op::RemoveNode { path: path.clone() });
                ops.push(Op::InsertNode {
                    path,
                    node: Node::paragraph(t.text.clone()),
                });
            }
        }

        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind.is_container() {
                stray(&el.children, path, &mut ops);
            }
        });
        stray(&doc.children, &[], &mut ops);
        ops
    }
}

struct EnsureTextBlocksHaveTextLeaf;

impl NormalizePass for EnsureTextBlocksHaveTextLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_text_blocks_have_text_leaf"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind.is_text_block() && !el.children.iter().any(|n| matches!(n, Node::Text(_)))
            {
                ops.push(Op::InsertNode {
                    path: child_path(path, 0),
                    node: Node::text(""),
                });
            }
        });
        ops
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if !el.kind.is_text_block() || el.children.len() < 2 {
                return;
            }

            let mut ix = el.children.len();
            while ix > 0 {
                ix -= 1;
                if !matches!(el.children[ix], Node::Text(_)) {
                    continue;
                }

                let mut start = ix;
                while start > 0 && matches!(el.children[start - 1], Node::Text(_)) {
                    start -= 1;
                }
                if start == ix {
                    continue;
                }

                let Node::Text(first) = &el.children[start] else {
                    continue;
                };
                let appended: String = el.children[start + 1..=ix]
                    .iter()
                    .map(Node::text_content)
                    .collect();

                if !appended.is_empty() {
                    ops.push(Op::InsertText {
                        path: child_path(path, start),
                        offset: first.text.len(),
                        text: appended,
                    });
                }
                for remove_ix in (start + 1..=ix).rev() {
                    ops.push(Op::RemoveNode {
                        path: child_path(path, remove_ix),
                    });
                }

                ix = start;
            }
        });
        ops
    }
}

struct EnsureContainersNonEmpty;

impl NormalizePass for EnsureContainersNonEmpty {
    fn id(&self) -> &'static str {
        "core.ensure_containers_non_empty"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind.is_container() && el.children.is_empty() {
                ops.push(Op::InsertNode {
                    path: child_path(path, 0),
                    node: Node::paragraph(""),
                });
            }
        });
        ops
    }
}

struct HeadingPlugin;

impl PlatePlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::Heading)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeHeadingLevels)]
    }
}

struct NormalizeHeadingLevels;

impl NormalizePass for NormalizeHeadingLevels {
    fn id(&self) -> &'static str {
        "heading.normalize_levels"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind != BlockKind::Heading {
                return;
            }
            let current = el.attrs.get(LEVEL_ATTR).and_then(Value::as_u64);
            let level = current.unwrap_or(1).clamp(1, MAX_HEADING_LEVEL);
            if current != Some(level) {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::set(LEVEL_ATTR, level),
                });
            }
        });
        ops
    }
}

struct ListPlugin;

impl PlatePlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec::of(BlockKind::BulletList),
            NodeSpec::of(BlockKind::OrderedList),
            NodeSpec::of(BlockKind::TaskList),
        ]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeTaskCheckedAttr)]
    }
}

struct NormalizeTaskCheckedAttr;

impl NormalizePass for NormalizeTaskCheckedAttr {
    fn id(&self) -> &'static str {
        "list.normalize_task_checked"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind == BlockKind::TaskList
                && el.attrs.get(CHECKED_ATTR).and_then(Value::as_bool).is_none()
            {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::set(CHECKED_ATTR, false),
                });
            }
        });
        ops
    }
}

struct CodeBlockPlugin;

impl PlatePlugin for CodeBlockPlugin {
    fn id(&self) -> &'static str {
        "code_block"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::CodeBlock)]
    }
}

struct BlockquotePlugin;

impl PlatePlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::Blockquote)]
    }
}

struct HorizontalRulePlugin;

impl PlatePlugin for HorizontalRulePlugin {
    fn id(&self) -> &'static str {
        "horizontal_rule"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::HorizontalRule)]
    }
}

struct CalloutPlugin;

impl PlatePlugin for CalloutPlugin {
    fn id(&self) -> &'static str {
        "callout"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::Callout)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(NormalizeCalloutType),
            Box::new(UnwrapNestedCallouts),
        ]
    }
}

struct NormalizeCalloutType;

impl NormalizePass for NormalizeCalloutType {
    fn id(&self) -> &'static str {
        "callout.normalize_type"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element_rev(&doc.children, &mut Vec::new(), &mut |el, path| {
            if el.kind != BlockKind::Callout {
                return;
            }
            let valid = el
                .attrs
                .get(CALLOUT_TYPE_ATTR)
                .and_then(Value::as_str)
                .is_some_and(|s| s.parse::<CalloutType>().is_ok());
            if !valid {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::set(CALLOUT_TYPE_ATTR, CalloutType::default().as_str()),
                });
            }
        });
        ops
    }
}

/// Lifts the children of any callout found inside another callout. One level
/// per run; deeper nesting is handled by the next normalization round.
struct UnwrapNestedCallouts;

impl NormalizePass for UnwrapNestedCallouts {
    fn id(&self) -> &'static str {
        "callout.unwrap_nested"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        fn walk(children: &[Node], path: &mut Path, inside_callout: bool, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate().rev() {
                let Node::Element(el) = node else {
                    continue;
                };
                path.push(ix);
                if el.kind == BlockKind::Callout && inside_callout {
                    ops.push(Op::RemoveNode { path: path.clone() });
                    for (child_ix, child) in el.children.iter().enumerate() {
                        ops.push(Op::InsertNode {
                            path: child_path(&path[..path.len() - 1], ix + child_ix),
                            node: child.clone(),
                        });
                    }
                } else if el.kind.is_container() {
                    walk(
                        &el.children,
                        path,
                        inside_callout || el.kind == BlockKind::Callout,
                        ops,
                    );
                }
                path.pop();
            }
        }

        let mut ops = Vec::new();
        walk(&doc.children, &mut Vec::new(), false, &mut ops);
        if !ops.is_empty() {
            tracing::debug!("lifting nested callout content");
        }
        ops
    }
}
