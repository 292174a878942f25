use counsel_core::{
    fields, update, AppState, CollectionPath, CommChannel, CommDraftEdit, Effect, FieldValue,
    Identity, Msg, NewDocument, NoticeLevel, Record, RequestId, SubscriptionId, WriteOp,
    WriteRequest,
};
use pretty_assertions::assert_eq;

fn counselor() -> Identity {
    Identity {
        uid: "u1".to_string(),
        email: Some("counselor@x.com".to_string()),
    }
}

/// Signed in and viewing `s1`, with the profile delivered.
fn viewing_s1() -> (AppState, Vec<Effect>) {
    let (state, _) = update(AppState::new(), Msg::IdentityResolved(Some(counselor())));
    let (state, effects) = update(
        state,
        Msg::StudentOpened {
            student_id: "s1".to_string(),
        },
    );
    let profile = subscription(&effects, 0);
    let (state, _) = update(
        state,
        Msg::SnapshotDelivered {
            subscription: profile,
            records: vec![Record::new(
                "s1",
                fields([
                    ("name", "Ana Li"),
                    ("email", "ana@x.com"),
                    ("status", "Applying"),
                ]),
            )],
        },
    );
    (state, effects)
}

fn subscription(effects: &[Effect], nth: usize) -> SubscriptionId {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Subscribe { id, .. } => Some(*id),
            _ => None,
        })
        .nth(nth)
        .unwrap()
}

fn single_write(effects: Vec<Effect>) -> WriteRequest {
    assert_eq!(effects.len(), 1, "expected exactly one effect: {effects:?}");
    match effects.into_iter().next() {
        Some(Effect::Write(request)) => request,
        other => panic!("expected write, got {other:?}"),
    }
}

fn created(op: &WriteOp) -> &NewDocument {
    match op {
        WriteOp::Create(doc) => doc,
        other => panic!("expected create, got {other:?}"),
    }
}

#[test]
fn empty_note_is_a_complete_noop() {
    let (state, _) = viewing_s1();
    let (mut state, _) = update(state, Msg::NoteDraftChanged("   ".to_string()));
    state.consume_dirty();
    let before = state.clone();

    let (mut next, effects) = update(state, Msg::NoteSubmitted);

    assert!(effects.is_empty());
    assert_eq!(next, before);
    assert!(!next.consume_dirty());
    assert_eq!(next.view().notice, None);
}

#[test]
fn adding_a_note_creates_one_record_and_the_list_grows_by_one() {
    let (state, subscriptions) = viewing_s1();
    let notes = subscription(&subscriptions, 3);
    let (state, _) = update(state, Msg::NoteDraftChanged("call scheduled".to_string()));

    let (state, effects) = update(state, Msg::NoteSubmitted);
    let request = single_write(effects);
    assert_eq!(request.breadcrumb, None);
    let doc = created(&request.primary);
    assert_eq!(doc.collection, CollectionPath::of_student("s1", "notes"));
    assert_eq!(doc.fields["text"], FieldValue::from("call scheduled"));
    assert_eq!(doc.fields["authorUid"], FieldValue::from("u1"));
    assert_eq!(doc.fields["authorName"], FieldValue::from("counselor@x.com"));
    assert_eq!(doc.fields["createdAt"], FieldValue::ServerTimestamp);

    // No optimistic insert: the list only grows once the backend echoes it.
    assert_eq!(state.view().student.unwrap().notes.len(), 0);
    assert_eq!(state.view().pending_writes, 1);

    let (state, _) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Ok(()),
        },
    );
    let (state, _) = update(
        state,
        Msg::SnapshotDelivered {
            subscription: notes,
            records: vec![Record::new("n1", doc.fields.clone()).with_parent("s1")],
        },
    );
    let view = state.view();
    let student = view.student.unwrap();
    assert_eq!(student.notes.len(), 1);
    assert_eq!(student.notes[0].text, "call scheduled");
    assert_eq!(student.note_draft, "");
    assert_eq!(view.pending_writes, 0);
}

#[test]
fn task_and_comm_validation_reports_without_dispatch() {
    let (state, _) = viewing_s1();

    let (state, effects) = update(state, Msg::TaskSubmitted);
    assert!(effects.is_empty());
    let notice = state.view().notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Validation);
    assert_eq!(notice.text, "Please enter a task title.");

    let (state, effects) = update(state, Msg::CommLogged);
    assert!(effects.is_empty());
    assert_eq!(state.view().notice.unwrap().text, "Please enter a message.");
    assert_eq!(state.pending_writes(), 0);
}

#[test]
fn adding_a_task_carries_a_breadcrumb() {
    let (state, _) = viewing_s1();
    let (state, _) = update(state, Msg::TaskTitleChanged("  Draft essay ".to_string()));
    let (state, _) = update(state, Msg::TaskDueChanged("not a date".to_string()));

    let (state, effects) = update(state, Msg::TaskSubmitted);
    let request = single_write(effects);
    let doc = created(&request.primary);
    assert_eq!(doc.collection, CollectionPath::of_student("s1", "tasks"));
    assert_eq!(doc.fields["title"], FieldValue::from("Draft essay"));
    assert_eq!(doc.fields["status"], FieldValue::from("open"));
    assert_eq!(doc.fields["assignee"], FieldValue::from("counselor@x.com"));
    assert_eq!(doc.fields["dueAt"], FieldValue::Null);

    let crumb = request.breadcrumb.unwrap();
    assert_eq!(crumb.collection, CollectionPath::of_student("s1", "timeline"));
    assert_eq!(crumb.fields["type"], FieldValue::from("comm"));
    assert_eq!(crumb.fields["text"], FieldValue::from("Task created: Draft essay"));

    let (state, _) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Ok(()),
        },
    );
    let draft = state.view().student.unwrap().task_draft;
    assert_eq!(draft.title, "");
    assert_eq!(draft.assignee, "counselor@x.com");
}

#[test]
fn logged_email_defaults_recipient_and_truncates_breadcrumb() {
    let (state, _) = viewing_s1();
    let long = "x".repeat(120);
    let (state, _) = update(
        state,
        Msg::CommDraftChanged(CommDraftEdit::Subject("Essay".to_string())),
    );
    let (state, _) = update(state, Msg::CommDraftChanged(CommDraftEdit::Message(long)));

    let (_, effects) = update(state, Msg::CommLogged);
    let request = single_write(effects);
    let doc = created(&request.primary);
    assert_eq!(doc.fields["type"], FieldValue::from("email"));
    assert_eq!(doc.fields["direction"], FieldValue::from("out"));
    assert_eq!(doc.fields["to"], FieldValue::from("ana@x.com"));
    assert_eq!(doc.fields["from"], FieldValue::from("team@undergraduation.com"));
    assert_eq!(doc.fields["subject"], FieldValue::from("Essay"));
    assert_eq!(doc.fields["status"], FieldValue::from("sent"));

    let crumb = request.breadcrumb.unwrap();
    assert_eq!(
        crumb.fields["text"],
        FieldValue::Text(format!("EMAIL out: {}", "x".repeat(80)))
    );
}

#[test]
fn rejected_write_keeps_draft_and_shows_error() {
    let (state, _) = viewing_s1();
    let (state, _) = update(
        state,
        Msg::CommDraftChanged(CommDraftEdit::Channel(CommChannel::Sms)),
    );
    let (state, _) = update(
        state,
        Msg::CommDraftChanged(CommDraftEdit::Message("running late".to_string())),
    );
    let (state, effects) = update(state, Msg::CommLogged);
    let request = single_write(effects);

    let (state, effects) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Err("permission denied".to_string()),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    let notice = view.notice.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(
        notice.text,
        "Logging the communication failed: permission denied"
    );
    assert_eq!(view.student.unwrap().comm_draft.message, "running late");
    assert_eq!(view.pending_writes, 0);
}

#[test]
fn follow_up_reports_success_only_after_acknowledgement() {
    let (state, _) = viewing_s1();
    let (state, effects) = update(state, Msg::FollowUpTriggered);
    let request = single_write(effects);
    let doc = created(&request.primary);
    assert_eq!(doc.fields["status"], FieldValue::from("queued"));
    assert_eq!(doc.fields["to"], FieldValue::from("ana@x.com"));
    assert_eq!(
        request.breadcrumb.unwrap().fields["text"],
        FieldValue::from("Follow-up email queued")
    );
    assert_eq!(state.view().notice, None);

    let (state, _) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Ok(()),
        },
    );
    assert_eq!(
        state.view().notice.unwrap().text,
        "Mock follow-up email queued."
    );
}

#[test]
fn toggling_and_removing_tasks_target_the_document() {
    let (state, subscriptions) = viewing_s1();
    let tasks = subscription(&subscriptions, 4);
    let (state, _) = update(
        state,
        Msg::SnapshotDelivered {
            subscription: tasks,
            records: vec![Record::new(
                "t1",
                fields([("title", "Upload transcript"), ("status", "open")]),
            )
            .with_parent("s1")],
        },
    );

    let (state, effects) = update(
        state,
        Msg::TaskToggled {
            task_id: "t1".to_string(),
        },
    );
    let request = single_write(effects);
    match request.primary {
        WriteOp::Update { path, fields } => {
            assert_eq!(path, CollectionPath::of_student("s1", "tasks").doc("t1"));
            assert_eq!(fields["status"], FieldValue::from("done"));
        }
        other => panic!("expected update, got {other:?}"),
    }

    let (state, effects) = update(
        state,
        Msg::TaskToggled {
            task_id: "missing".to_string(),
        },
    );
    assert!(effects.is_empty());

    let (_, effects) = update(
        state,
        Msg::TaskRemoved {
            task_id: "t1".to_string(),
        },
    );
    assert_eq!(
        single_write(effects).primary,
        WriteOp::Delete {
            path: CollectionPath::of_student("s1", "tasks").doc("t1")
        }
    );
}

#[test]
fn note_edit_roundtrip_and_blank_edit_rejected() {
    let (state, subscriptions) = viewing_s1();
    let notes = subscription(&subscriptions, 3);
    let (state, _) = update(
        state,
        Msg::SnapshotDelivered {
            subscription: notes,
            records: vec![Record::new("n1", fields([("text", "first")])).with_parent("s1")],
        },
    );
    let (state, _) = update(
        state,
        Msg::NoteEditStarted {
            note_id: "n1".to_string(),
        },
    );
    assert_eq!(state.view().student.unwrap().editing.unwrap().text, "first");

    let (state, _) = update(state, Msg::NoteEditChanged(" ".to_string()));
    let (state, effects) = update(state, Msg::NoteEditSaved);
    assert!(effects.is_empty());
    assert_eq!(state.view().notice.unwrap().level, NoticeLevel::Validation);

    let (state, _) = update(state, Msg::NoteEditChanged("second".to_string()));
    let (state, effects) = update(state, Msg::NoteEditSaved);
    let request = single_write(effects);
    assert_eq!(request.id, RequestId(1));
    let (state, _) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Ok(()),
        },
    );
    assert_eq!(state.view().student.unwrap().editing, None);
}

#[test]
fn acknowledgement_after_switching_students_leaves_new_drafts_alone() {
    let (state, _) = viewing_s1();
    let (state, _) = update(state, Msg::NoteDraftChanged("for s1".to_string()));
    let (state, effects) = update(state, Msg::NoteSubmitted);
    let request = single_write(effects);

    let (state, _) = update(
        state,
        Msg::StudentOpened {
            student_id: "s2".to_string(),
        },
    );
    let (state, _) = update(state, Msg::NoteDraftChanged("for s2".to_string()));
    let (state, _) = update(
        state,
        Msg::WriteCompleted {
            request: request.id,
            result: Ok(()),
        },
    );
    assert_eq!(state.view().student.unwrap().note_draft, "for s2");
    assert_eq!(state.pending_writes(), 0);
}
