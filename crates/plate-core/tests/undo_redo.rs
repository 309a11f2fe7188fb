use calloutpad_core::{
    AttrPatch, CalloutType, Document, Editor, EditorConfig, Node, Op, PluginRegistry, Selection,
    Transaction,
};

fn editor_with_text(text: &str) -> Editor {
    let doc = Document::new(vec![Node::paragraph(text)]);
    Editor::new(doc, Selection::collapsed(1), PluginRegistry::core())
}

#[test]
fn undo_redo_handles_multi_op_insert_order() {
    let mut editor = editor_with_text("");

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(3))
    .source("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(*editor.selection(), Selection::collapsed(3));

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(*editor.selection(), Selection::collapsed(1));

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(*editor.selection(), Selection::collapsed(3));
}

#[test]
fn attribute_patches_undo_and_redo() {
    let doc = Document::new(vec![Node::callout(
        CalloutType::Warning,
        vec![Node::paragraph("x")],
    )]);
    let mut editor = Editor::new(doc, Selection::collapsed(2), PluginRegistry::core());

    editor
        .apply(Transaction::new(vec![Op::SetNodeAttrs {
            path: vec![0],
            patch: AttrPatch::set("calloutType", "error"),
        }]))
        .unwrap();
    assert_eq!(editor.active_callout_type(), Some(CalloutType::Error));

    assert!(editor.undo());
    assert_eq!(editor.active_callout_type(), Some(CalloutType::Warning));

    assert!(editor.redo());
    assert_eq!(editor.active_callout_type(), Some(CalloutType::Error));
}

#[test]
fn text_op_offsets_inside_a_character_clamp_to_its_start() {
    let mut editor = editor_with_text("é");

    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "x".to_string(),
        }]))
        .unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("xé")]);
}

#[test]
fn selection_follows_text_inserted_before_it() {
    let mut editor = editor_with_text("world");
    editor.set_selection(Selection::collapsed(6));

    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "hello ".to_string(),
        }]))
        .unwrap();

    assert_eq!(*editor.selection(), Selection::collapsed(12));
}

#[test]
fn applied_assist_edit_undoes_in_one_step() {
    let original = "I don't think it's cool.";
    let mut editor = editor_with_text(original);

    editor
        .apply_changes(1..25, "I do not think it is satisfactory.")
        .unwrap();
    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("I do not think it is satisfactory.")]
    );

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph(original)]);
    assert!(!editor.can_undo());
    assert!(editor.can_redo());
}

#[test]
fn apply_changes_touches_only_the_range() {
    let mut editor = editor_with_text("keep THIS keep");

    editor.apply_changes(6..10, "that").unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("keep that keep")]
    );
}

#[test]
fn undo_stack_is_bounded() {
    let config = EditorConfig {
        max_undo: 2,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(
        Document::new(vec![Node::paragraph("")]),
        Selection::collapsed(1),
        PluginRegistry::core(),
        config,
    );

    for text in ["a", "b", "c"] {
        let pos = editor.selection().head;
        editor.replace(pos..pos, text).unwrap();
    }
    assert_eq!(editor.doc().children, vec![Node::paragraph("abc")]);

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("a")]);
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = editor_with_text("x");
    editor.replace(2..2, "y").unwrap();
    assert!(editor.undo());
    assert!(editor.can_redo());

    editor.replace(2..2, "z").unwrap();

    assert!(!editor.can_redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("xz")]);
}
