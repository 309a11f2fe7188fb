use calloutpad_core::{
    Attrs, BlockKind, BlockRange, CalloutType, Document, EditError, Editor, Node, Op,
    PlatePlugin, NodeSpec, PluginRegistry, RegistryError, Selection, Transaction,
};

fn editor_with(children: Vec<Node>) -> Editor {
    Editor::from_document(Document::new(children))
}

fn block(path: Vec<usize>, kind: BlockKind, start: usize, end: usize) -> BlockRange {
    BlockRange {
        path,
        kind,
        range: start..end,
    }
}

#[test]
fn outline_reports_linear_ranges() {
    let doc = Document::new(vec![
        Node::paragraph("ab"),
        Node::blockquote(vec![Node::paragraph("c")]),
        Node::horizontal_rule(),
    ]);

    assert_eq!(doc.content_size(), 10);
    assert_eq!(
        doc.outline(),
        vec![
            block(vec![0], BlockKind::Paragraph, 0, 4),
            block(vec![1], BlockKind::Blockquote, 4, 9),
            block(vec![1, 0], BlockKind::Paragraph, 5, 8),
            block(vec![2], BlockKind::HorizontalRule, 9, 10),
        ]
    );
    assert_eq!(doc.node_range(&[1, 0]), Some(5..8));
}

#[test]
fn resolve_distinguishes_text_and_block_boundaries() {
    let doc = Document::new(vec![
        Node::paragraph("ab"),
        Node::blockquote(vec![Node::paragraph("c")]),
        Node::horizontal_rule(),
    ]);

    let inside = doc.resolve(2).unwrap();
    assert!(inside.in_text_block);
    assert_eq!(inside.parent, vec![0]);
    assert_eq!(inside.parent_offset, 1);

    let between = doc.resolve(4).unwrap();
    assert!(!between.in_text_block);
    assert_eq!(between.parent, Vec::<usize>::new());
    assert_eq!(between.index, 1);

    let quote_start = doc.resolve(5).unwrap();
    assert_eq!(quote_start.parent, vec![1]);
    assert_eq!(quote_start.index, 0);

    assert_eq!(doc.resolve(10).unwrap().index, 3);
    assert!(doc.resolve(11).is_none());
}

#[test]
fn text_between_joins_blocks_with_separator() {
    let doc = Document::new(vec![
        Node::paragraph("ab"),
        Node::blockquote(vec![Node::paragraph("c")]),
    ]);

    assert_eq!(doc.text_between(1, 7, " "), "ab c");
    assert_eq!(doc.text_between(2, 3, " "), "b");
    assert_eq!(doc.plain_text(), "ab\nc");
}

#[test]
fn insert_shifts_ranges_of_following_blocks() {
    let mut editor = editor_with(vec![
        Node::paragraph("one"),
        Node::paragraph("two"),
        Node::paragraph("three"),
    ]);
    let before = editor.doc().outline();

    editor.insert(5..5, Node::heading(2, "new")).unwrap();

    let after = editor.doc().outline();
    assert_eq!(after.len(), 4);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].kind, BlockKind::Heading);
    assert_eq!(after[1].range, 5..10);
    assert_eq!(after[2].range, before[1].range.start + 5..before[1].range.end + 5);
    assert_eq!(after[3].range, before[2].range.start + 5..before[2].range.end + 5);
    assert_eq!(*editor.selection(), Selection::collapsed(6));
}

#[test]
fn insert_inside_text_block_splits_it() {
    let mut editor = editor_with(vec![Node::paragraph("abcd")]);

    editor.insert(3..3, Node::horizontal_rule()).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("ab"),
            Node::horizontal_rule(),
            Node::paragraph("cd"),
        ]
    );
}

#[test]
fn insert_into_empty_paragraph_replaces_it() {
    let mut editor = editor_with(vec![Node::paragraph(""), Node::paragraph("x")]);

    editor.insert(1..1, Node::code_block("fn main() {}")).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::code_block("fn main() {}"), Node::paragraph("x")]
    );
}

#[test]
fn insert_callout_inside_callout_is_refused() {
    let mut editor = editor_with(vec![Node::callout(
        CalloutType::Information,
        vec![Node::paragraph("inside")],
    )]);
    let before = editor.doc().clone();

    let err = editor
        .insert(
            3..3,
            Node::callout(CalloutType::Warning, vec![Node::paragraph("nested")]),
        )
        .unwrap_err();

    assert_eq!(err, EditError::StructuralViolation);
    assert_eq!(editor.doc(), &before);
}

#[test]
fn delete_inside_one_block() {
    let mut editor = editor_with(vec![Node::paragraph("hello world")]);

    editor.delete(6..12).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("hello")]);
    assert_eq!(*editor.selection(), Selection::collapsed(6));
}

#[test]
fn delete_across_sibling_text_blocks_joins_them() {
    let mut editor = editor_with(vec![Node::paragraph("abc"), Node::paragraph("def")]);

    editor.delete(2..7).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("aef")]);
    assert_eq!(*editor.selection(), Selection::collapsed(2));
}

#[test]
fn delete_whole_blocks() {
    let mut editor = editor_with(vec![
        Node::paragraph("a"),
        Node::paragraph("b"),
        Node::paragraph("c"),
    ]);

    editor.delete(3..6).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("a"), Node::paragraph("c")]
    );
}

#[test]
fn delete_into_a_callout_keeps_both_ends_in_place() {
    let mut editor = editor_with(vec![
        Node::paragraph("intro text"),
        Node::callout(CalloutType::Warning, vec![Node::paragraph("inside text")]),
    ]);

    editor.delete(3..17).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("in"),
            Node::callout(CalloutType::Warning, vec![Node::paragraph("ide text")]),
        ]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(3));
}

#[test]
fn delete_across_nesting_levels_removes_blocks_in_between() {
    let mut editor = editor_with(vec![
        Node::paragraph("ab"),
        Node::paragraph("mid"),
        Node::blockquote(vec![Node::paragraph("x"), Node::paragraph("cd")]),
        Node::paragraph("tail"),
    ]);

    editor.delete(2..15).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("a"),
            Node::blockquote(vec![Node::paragraph("d")]),
            Node::paragraph("tail"),
        ]
    );

    assert!(editor.undo());
    assert_eq!(editor.doc().children[1], Node::paragraph("mid"));
}

#[test]
fn delete_out_of_a_container_trims_trailing_siblings() {
    let mut editor = editor_with(vec![
        Node::blockquote(vec![Node::paragraph("ab"), Node::paragraph("c")]),
        Node::paragraph("de"),
    ]);

    editor.delete(3..11).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::blockquote(vec![Node::paragraph("a")]),
            Node::paragraph("e"),
        ]
    );
}

#[test]
fn replace_substitutes_text_and_moves_caret_after_it() {
    let mut editor = editor_with(vec![Node::paragraph("hello world")]);

    editor.replace(7..12, "there").unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("hello there")]);
    assert_eq!(*editor.selection(), Selection::collapsed(12));
}

#[test]
fn replace_counts_characters_not_bytes() {
    let mut editor = editor_with(vec![Node::paragraph("naïve café")]);

    editor.replace(7..11, "bar").unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("naïve bar")]);
    assert_eq!(*editor.selection(), Selection::collapsed(10));
}

#[test]
fn wrap_covers_sibling_range_and_remaps_selection() {
    let mut editor = editor_with(vec![
        Node::paragraph("a"),
        Node::paragraph("b"),
        Node::paragraph("c"),
    ]);
    editor.set_selection(Selection::new(1, 4));

    editor
        .wrap(1..4, BlockKind::Blockquote, Attrs::new())
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::blockquote(vec![Node::paragraph("a"), Node::paragraph("b")]),
            Node::paragraph("c"),
        ]
    );
    assert_eq!(*editor.selection(), Selection::new(2, 5));
    assert!(editor.is_active(BlockKind::Blockquote));
}

#[test]
fn wrap_rejects_non_container_kinds() {
    let mut editor = editor_with(vec![Node::paragraph("a")]);

    assert_eq!(
        editor.wrap(1..1, BlockKind::Paragraph, Attrs::new()),
        Err(EditError::NotAContainer(BlockKind::Paragraph))
    );
}

#[test]
fn unwrap_lifts_children_and_remaps_selection() {
    let mut editor = editor_with(vec![
        Node::blockquote(vec![Node::paragraph("one"), Node::paragraph("two")]),
        Node::paragraph("after"),
    ]);
    editor.set_selection(Selection::collapsed(8));

    editor.unwrap(8..8, BlockKind::Blockquote).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("one"),
            Node::paragraph("two"),
            Node::paragraph("after"),
        ]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(7));
}

#[test]
fn unwrap_without_matching_ancestor_is_not_found() {
    let mut editor = editor_with(vec![Node::paragraph("a")]);

    assert_eq!(
        editor.unwrap(1..1, BlockKind::Blockquote),
        Err(EditError::NotFound {
            kind: BlockKind::Blockquote
        })
    );
}

#[test]
fn failed_transaction_leaves_document_untouched() {
    let mut editor = editor_with(vec![Node::paragraph("abc")]);
    let before = editor.doc().clone();
    let selection = *editor.selection();

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "x".to_string(),
        },
        Op::RemoveNode { path: vec![5] },
    ]);

    assert!(editor.apply(tx).is_err());
    assert_eq!(editor.doc(), &before);
    assert_eq!(*editor.selection(), selection);
    assert!(!editor.can_undo());
}

#[test]
fn unregistered_kinds_are_rejected() {
    let mut editor = Editor::new(
        Document::new(vec![Node::paragraph("a")]),
        Selection::collapsed(1),
        PluginRegistry::core(),
    );

    assert_eq!(
        editor.wrap(1..1, BlockKind::Callout, CalloutType::Warning.attrs()),
        Err(EditError::UnknownKind(BlockKind::Callout))
    );
}

struct DuplicateParagraph;

impl PlatePlugin for DuplicateParagraph {
    fn id(&self) -> &'static str {
        "test.duplicate_paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::of(BlockKind::Paragraph)]
    }
}

#[test]
fn registry_rejects_duplicate_kinds() {
    let mut registry = PluginRegistry::core();

    assert_eq!(
        registry.register_plugin(Box::new(DuplicateParagraph)).err(),
        Some(RegistryError::DuplicateKind(BlockKind::Paragraph))
    );
}

#[test]
fn empty_document_normalizes_to_one_paragraph() {
    let editor = editor_with(Vec::new());

    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(*editor.selection(), Selection::collapsed(1));
}
