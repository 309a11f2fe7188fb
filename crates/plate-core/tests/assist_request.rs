use calloutpad_core::{Document, Editor, EditorRequest, Node, Selection};

fn editor() -> Editor {
    Editor::from_document(Document::new(vec![
        Node::paragraph("Hello"),
        Node::paragraph("world"),
    ]))
}

#[test]
fn empty_selection_queues_nothing() {
    let mut editor = editor();

    assert!(!editor.trigger_assist());
    assert!(!editor.has_pending_requests());
    assert!(editor.drain_requests().is_empty());
}

#[test]
fn selection_is_sent_with_blocks_joined_by_spaces() {
    let mut editor = editor();
    editor.set_selection(Selection::new(13, 1));

    assert!(editor.trigger_assist());

    assert_eq!(
        editor.drain_requests(),
        vec![EditorRequest::Assist {
            range: 1..13,
            selected_text: "Hello world".to_string(),
        }]
    );
    assert!(editor.drain_requests().is_empty());
}
