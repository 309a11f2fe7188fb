use calloutpad_core::{
    BlockKind, CalloutType, Document, EditError, Editor, Node, Selection, cycle_callout_type,
};
use serde_json::json;

fn editor_at(children: Vec<Node>, pos: usize) -> Editor {
    let mut editor = Editor::from_document(Document::new(children));
    editor.set_selection(Selection::collapsed(pos));
    editor
}

#[test]
fn set_callout_wraps_current_block_and_remaps_selection() {
    let mut editor = editor_at(vec![Node::paragraph("hello"), Node::paragraph("world")], 3);

    editor.set_callout(CalloutType::Warning).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::callout(CalloutType::Warning, vec![Node::paragraph("hello")]),
            Node::paragraph("world"),
        ]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(4));
    assert!(editor.is_active(BlockKind::Callout));
    assert_eq!(editor.active_callout_type(), Some(CalloutType::Warning));
}

#[test]
fn set_callout_inside_callout_is_refused_without_changes() {
    let mut editor = editor_at(
        vec![Node::callout(
            CalloutType::Information,
            vec![Node::paragraph("inside")],
        )],
        4,
    );
    let before = editor.doc().clone();

    let err = editor.set_callout(CalloutType::Error).unwrap_err();

    assert_eq!(err, EditError::AlreadyInCallout);
    assert_eq!(editor.doc(), &before);
    assert_eq!(*editor.selection(), Selection::collapsed(4));
    assert!(!editor.can_undo());
}

#[test]
fn set_callout_over_existing_callout_is_a_structural_violation() {
    let mut editor = editor_at(
        vec![
            Node::paragraph("a"),
            Node::callout(CalloutType::Information, vec![Node::paragraph("b")]),
        ],
        1,
    );
    editor.set_selection(Selection::new(1, 5));

    let err = editor.set_callout(CalloutType::Warning).unwrap_err();

    assert_eq!(err, EditError::StructuralViolation);
    assert_eq!(editor.doc().children.len(), 2);
}

#[test]
fn toggle_callout_unwraps_regardless_of_type() {
    let mut editor = editor_at(
        vec![
            Node::callout(
                CalloutType::Error,
                vec![Node::paragraph("x"), Node::paragraph("y")],
            ),
            Node::paragraph("z"),
        ],
        2,
    );

    editor.toggle_callout(CalloutType::Information).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("x"),
            Node::paragraph("y"),
            Node::paragraph("z"),
        ]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(1));
    assert!(!editor.is_active(BlockKind::Callout));
}

#[test]
fn toggle_callout_wraps_when_outside() {
    let mut editor = editor_at(vec![Node::paragraph("plain")], 2);

    editor.toggle_callout(CalloutType::BestPractice).unwrap();

    assert_eq!(
        editor.active_callout_type(),
        Some(CalloutType::BestPractice)
    );
    assert!(editor.is_active_with(
        BlockKind::Callout,
        &serde_json::from_value(json!({ "calloutType": "best-practice" })).unwrap()
    ));
    assert!(!editor.is_active_with(
        BlockKind::Callout,
        &serde_json::from_value(json!({ "calloutType": "warning" })).unwrap()
    ));
}

#[test]
fn callout_type_cycle_wraps_around() {
    assert_eq!(
        cycle_callout_type(CalloutType::Information),
        CalloutType::BestPractice
    );
    assert_eq!(cycle_callout_type(CalloutType::Error), CalloutType::Information);

    for start in CalloutType::ALL {
        let mut current = start;
        for _ in 0..4 {
            current = cycle_callout_type(current);
        }
        assert_eq!(current, start);
    }
}

#[test]
fn callout_type_display_metadata() {
    assert_eq!(CalloutType::BestPractice.as_str(), "best-practice");
    assert_eq!(CalloutType::BestPractice.title(), "Best Practice");
    assert_eq!(CalloutType::Warning.icon(), "alert-triangle");
    assert_eq!("error".parse::<CalloutType>().unwrap(), CalloutType::Error);
    assert!("note".parse::<CalloutType>().is_err());
    assert_eq!(CalloutType::default(), CalloutType::Information);
}

#[test]
fn retype_callout_cycles_the_callout_at_position() {
    let mut editor = editor_at(
        vec![
            Node::paragraph("a"),
            Node::callout(CalloutType::Information, vec![Node::paragraph("b")]),
        ],
        1,
    );

    assert_eq!(editor.retype_callout(3), Ok(CalloutType::BestPractice));
    assert_eq!(
        editor.doc().children[1],
        Node::callout(CalloutType::BestPractice, vec![Node::paragraph("b")])
    );

    assert_eq!(
        editor.retype_callout(0),
        Err(EditError::NotFound {
            kind: BlockKind::Callout
        })
    );
}

#[test]
fn delete_callout_removes_whole_subtree_and_undo_restores_it() {
    let children = vec![
        Node::paragraph("a"),
        Node::callout(
            CalloutType::Warning,
            vec![Node::paragraph("b"), Node::paragraph("c")],
        ),
        Node::paragraph("d"),
    ];
    let mut editor = editor_at(children.clone(), 1);

    editor.delete_callout(3).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::paragraph("a"), Node::paragraph("d")]
    );

    assert!(editor.undo());
    assert_eq!(editor.doc().children, children);
}

#[test]
fn update_callout_type_requires_enclosing_callout() {
    let mut editor = editor_at(vec![Node::paragraph("outside")], 1);
    assert_eq!(
        editor.update_callout_type(CalloutType::Error),
        Err(EditError::NotFound {
            kind: BlockKind::Callout
        })
    );

    let mut editor = editor_at(
        vec![Node::callout(
            CalloutType::Information,
            vec![Node::paragraph("inside")],
        )],
        3,
    );
    editor.update_callout_type(CalloutType::Error).unwrap();
    assert_eq!(editor.active_callout_type(), Some(CalloutType::Error));
}

#[test]
fn create_callout_replaces_enclosing_callout_in_one_step() {
    let original = vec![Node::callout(
        CalloutType::Warning,
        vec![Node::paragraph("a")],
    )];
    let mut editor = editor_at(original.clone(), 2);

    editor.create_callout(CalloutType::Error).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::callout(CalloutType::Error, vec![Node::paragraph("a")])]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(2));

    assert!(editor.undo());
    assert_eq!(editor.doc().children, original);
}

#[test]
fn nested_callouts_are_flattened_on_load() {
    let editor = Editor::from_document(Document::new(vec![Node::callout(
        CalloutType::Information,
        vec![Node::callout(
            CalloutType::Warning,
            vec![Node::paragraph("deep")],
        )],
    )]));

    assert_eq!(
        editor.doc().children,
        vec![Node::callout(
            CalloutType::Information,
            vec![Node::paragraph("deep")],
        )]
    );
}

#[test]
fn unknown_callout_type_defaults_to_information() {
    let node: Node = serde_json::from_value(json!({
        "node": "element",
        "kind": "callout",
        "attrs": { "calloutType": "bogus" },
        "children": [
            { "node": "element", "kind": "paragraph", "children": [{ "node": "text", "text": "x" }] }
        ]
    }))
    .unwrap();

    let mut editor = Editor::from_document(Document::new(vec![node]));
    editor.set_selection(Selection::collapsed(2));

    assert_eq!(editor.active_callout_type(), Some(CalloutType::Information));
    assert_eq!(
        editor.doc().children[0],
        Node::callout(CalloutType::Information, vec![Node::paragraph("x")])
    );
}

#[test]
fn empty_callout_gets_a_paragraph() {
    let editor = Editor::from_document(Document::new(vec![Node::callout(
        CalloutType::Error,
        Vec::new(),
    )]));

    assert_eq!(
        editor.doc().children,
        vec![Node::callout(CalloutType::Error, vec![Node::paragraph("")])]
    );
    assert_eq!(*editor.selection(), Selection::collapsed(2));
}
