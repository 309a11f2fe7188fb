use calloutpad_assist::{
    AssistConfig, AssistError, AssistManager, AssistRequest, AssistResponse, AssistSession,
    AssistState, COMMON_PROMPTS, DEFAULT_FAILURE, HistoryDirection, RequestId, RuleEngine,
    TextTransform, TransportError, ValidationError,
};
use calloutpad_core::{CalloutType, Document, Editor, EditorRequest, Node, Selection};

const ORIGINAL: &str = "I don't think it's cool.";

fn editor_with_selection() -> Editor {
    let mut editor = Editor::from_document(Document::new(vec![
        Node::paragraph(ORIGINAL),
        Node::paragraph("untouched"),
    ]));
    editor.set_selection(Selection::new(1, 25));
    editor
}

fn open_manager(editor: &mut Editor) -> AssistManager<RuleEngine> {
    let mut manager = AssistManager::new(RuleEngine::standard());
    assert!(editor.trigger_assist());
    assert!(manager.process_requests(editor));
    manager
}

struct Failing(&'static str);

impl TextTransform for Failing {
    fn transform(&self, _: &AssistRequest) -> Result<AssistResponse, TransportError> {
        Err(TransportError::new(502, self.0))
    }
}

#[test]
fn whitespace_selection_does_not_open_a_session() {
    let mut manager = AssistManager::new(RuleEngine::standard());

    assert!(!manager.handle_request(EditorRequest::Assist {
        range: 1..3,
        selected_text: "  ".to_string(),
    }));
    assert!(!manager.is_open());
}

#[test]
fn submit_then_apply_replaces_only_the_selection() {
    let mut editor = editor_with_selection();
    let mut manager = open_manager(&mut editor);

    let state = manager.submit("make it formal").unwrap();
    let AssistState::Diff(diff) = state else {
        panic!("expected a diff, got {state:?}");
    };
    assert_eq!(diff.original_text, ORIGINAL);
    assert_eq!(diff.modified_text, "I do not think it is satisfactory.");
    assert!(diff.has_changes());

    manager.apply(&mut editor).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("I do not think it is satisfactory."),
            Node::paragraph("untouched"),
        ]
    );
    assert_eq!(manager.state(), Some(&AssistState::Feedback));

    assert!(editor.undo());
    assert_eq!(editor.doc().children[0], Node::paragraph(ORIGINAL));

    assert!(manager.settle());
    assert!(!manager.is_open());
}

#[test]
fn apply_over_a_selection_ending_inside_a_callout() {
    let mut editor = Editor::from_document(Document::new(vec![
        Node::paragraph("intro cool"),
        Node::callout(CalloutType::Information, vec![Node::paragraph("inside text")]),
    ]));
    editor.set_selection(Selection::new(3, 17));
    let mut manager = open_manager(&mut editor);
    assert_eq!(manager.session().unwrap().selected_text(), "tro cool ins");

    manager.submit("make it formal").unwrap();
    manager.apply(&mut editor).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("intro satisfactory ins"),
            Node::callout(CalloutType::Information, vec![Node::paragraph("ide text")]),
        ]
    );
    assert_eq!(manager.state(), Some(&AssistState::Feedback));
}

#[test]
fn apply_is_only_reachable_from_diff() {
    let mut editor = editor_with_selection();
    let mut manager = open_manager(&mut editor);
    let before = editor.doc().clone();

    assert_eq!(
        manager.apply(&mut editor),
        Err(AssistError::WrongState {
            expected: "diff",
            actual: "idle",
        })
    );
    assert_eq!(editor.doc(), &before);
    assert!(!manager.settle());
}

#[test]
fn blank_prompt_is_rejected() {
    let mut editor = editor_with_selection();
    let mut manager = open_manager(&mut editor);

    assert_eq!(
        manager.submit("   ").unwrap_err(),
        AssistError::Validation(ValidationError::MissingPrompt)
    );
    assert_eq!(manager.state(), Some(&AssistState::Idle));
}

#[test]
fn results_for_a_closed_session_are_discarded() {
    let mut editor = editor_with_selection();
    let mut manager = open_manager(&mut editor);
    manager.session_mut().unwrap().set_prompt("make it formal");
    let pending = manager.begin().unwrap();

    manager.close();
    assert!(editor.trigger_assist());
    manager.process_requests(&mut editor);

    let response = RuleEngine::standard().transform(&pending.request).unwrap();
    assert!(!manager.complete(pending.id, Ok(response)));
    assert_eq!(manager.state(), Some(&AssistState::Idle));
}

#[test]
fn session_only_accepts_its_outstanding_request() {
    let mut session = AssistSession::new(7, 1..25, ORIGINAL, &AssistConfig::default());
    let pending = session.select_prompt(COMMON_PROMPTS[1]).unwrap();
    assert_eq!(pending.id, RequestId { session: 7, sequence: 1 });
    assert_eq!(pending.request, AssistRequest::new(ORIGINAL, "Make it more formal"));

    let stale = RequestId {
        session: 7,
        sequence: 0,
    };
    assert!(!session.resolve(stale, Err(TransportError::internal())));
    assert_eq!(session.state(), &AssistState::Loading(pending.id));

    let response = RuleEngine::standard().transform(&pending.request).unwrap();
    assert!(session.resolve(pending.id, Ok(response.clone())));
    assert!(!session.resolve(pending.id, Ok(response)));
    assert!(session.diff().is_some());
}

#[test]
fn transport_failure_shows_error_and_retry_returns_to_idle() {
    let mut editor = editor_with_selection();
    let mut manager = AssistManager::new(Failing("upstream unavailable"));
    assert!(editor.trigger_assist());
    manager.process_requests(&mut editor);

    assert_eq!(
        manager.submit("formal").unwrap(),
        &AssistState::Error("upstream unavailable".to_string())
    );

    manager.session_mut().unwrap().reset().unwrap();
    let session = manager.session().unwrap();
    assert_eq!(session.state(), &AssistState::Idle);
    assert_eq!(session.prompt(), "");
}

#[test]
fn failure_without_message_uses_default_text() {
    let mut manager = AssistManager::new(Failing(""));
    manager.open(1..4, "abc".to_string());

    assert_eq!(
        manager.submit("formal").unwrap(),
        &AssistState::Error(DEFAULT_FAILURE.to_string())
    );
}

#[test]
fn prompt_history_is_bounded_and_navigable() {
    let config = AssistConfig { history_limit: 2 };
    let mut manager = AssistManager::with_config(RuleEngine::standard(), config);
    manager.open(1..4, "abc".to_string());

    for prompt in ["Make it more concise", "Make it more formal", "fix grammar"] {
        manager.submit(prompt).unwrap();
        manager.session_mut().unwrap().reset().unwrap();
    }

    let session = manager.session_mut().unwrap();
    assert_eq!(session.history(), ["fix grammar", "Make it more formal"]);

    assert!(session.navigate_history(HistoryDirection::Older));
    assert_eq!(session.prompt(), "fix grammar");
    session.navigate_history(HistoryDirection::Older);
    session.navigate_history(HistoryDirection::Older);
    assert_eq!(session.prompt(), "Make it more formal");

    session.navigate_history(HistoryDirection::Newer);
    assert_eq!(session.prompt(), "fix grammar");
    session.navigate_history(HistoryDirection::Newer);
    assert_eq!(session.prompt(), "");
}

#[test]
fn feedback_closes_the_session() {
    let mut editor = editor_with_selection();
    let mut manager = open_manager(&mut editor);
    manager.submit("make it formal").unwrap();
    manager.apply(&mut editor).unwrap();

    manager.feedback(true).unwrap();

    assert!(!manager.is_open());
    assert_eq!(manager.feedback(false), Err(AssistError::NoSession));
}
