use counsel_core::{update, AppState, Msg};
use pretty_assertions::assert_eq;

#[test]
fn dismissing_without_a_notice_changes_nothing() {
    let state = AppState::new();
    let (mut next, effects) = update(state.clone(), Msg::NoticeDismissed);

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}

#[test]
fn detail_actions_without_a_mounted_student_are_ignored() {
    let state = AppState::new();
    let actions = [
        Msg::NoteDraftChanged("hello".to_string()),
        Msg::NoteSubmitted,
        Msg::TaskSubmitted,
        Msg::CommLogged,
        Msg::FollowUpTriggered,
        Msg::TaskToggled {
            task_id: "t1".to_string(),
        },
    ];
    for msg in actions {
        let (mut next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
        assert!(!next.consume_dirty());
    }
}
