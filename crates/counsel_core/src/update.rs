use counsel_logging::console_debug;

use crate::mutation::{self, NoteEdit, WriteKind};
use crate::state::Notice;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::IdentityResolved(identity) => state.resolve_identity(identity),
        Msg::SignOutClicked => state.sign_out(),
        Msg::ListOpened => state.mount_list(),
        Msg::SummaryOpened { now } => state.mount_summary(now),
        Msg::StudentOpened { student_id } => state.mount_student(student_id),
        Msg::ViewClosed => state.unmount(),
        Msg::Shutdown => state.shutdown(),
        Msg::SearchChanged(query) => {
            state.set_search(query);
            Vec::new()
        }
        Msg::StatusFilterChanged(filter) => {
            state.set_status_filter(filter);
            Vec::new()
        }
        Msg::SnapshotDelivered {
            subscription,
            records,
        } => state.apply_snapshot(subscription, records),
        Msg::SubscriptionFailed {
            subscription,
            error,
        } => {
            state.apply_subscription_failure(subscription, &error);
            Vec::new()
        }
        Msg::NoteDraftChanged(text) => {
            edit_detail(&mut state, |detail| detail.note_draft = text);
            Vec::new()
        }
        Msg::NoteSubmitted => submit_note(&mut state),
        Msg::NoteEditStarted { note_id } => {
            edit_detail(&mut state, |detail| {
                let text = detail
                    .notes
                    .iter()
                    .find(|note| note.id == note_id)
                    .map(|note| note.text.clone());
                if let Some(text) = text {
                    detail.editing = Some(NoteEdit { note_id, text });
                }
            });
            Vec::new()
        }
        Msg::NoteEditChanged(text) => {
            edit_detail(&mut state, |detail| {
                if let Some(editing) = detail.editing.as_mut() {
                    editing.text = text;
                }
            });
            Vec::new()
        }
        Msg::NoteEditSaved => save_note_edit(&mut state),
        Msg::NoteEditCancelled => {
            edit_detail(&mut state, |detail| detail.editing = None);
            Vec::new()
        }
        Msg::NoteDeleted { note_id } => match scope(&state) {
            Some(student_id) => state.begin_write(
                WriteKind::DeleteNote,
                mutation::delete_note(&student_id, &note_id),
                None,
            ),
            None => Vec::new(),
        },
        Msg::TaskTitleChanged(title) => {
            edit_detail(&mut state, |detail| detail.task_draft.title = title);
            Vec::new()
        }
        Msg::TaskDueChanged(due) => {
            edit_detail(&mut state, |detail| detail.task_draft.due = due);
            Vec::new()
        }
        Msg::TaskAssigneeChanged(assignee) => {
            edit_detail(&mut state, |detail| detail.task_draft.assignee = assignee);
            Vec::new()
        }
        Msg::TaskSubmitted => submit_task(&mut state),
        Msg::TaskToggled { task_id } => {
            let op = state.detail().and_then(|detail| {
                detail
                    .tasks
                    .iter()
                    .find(|task| task.id == task_id)
                    .map(|task| mutation::toggle_task(&detail.student_id, task))
            });
            match op {
                Some(op) => state.begin_write(WriteKind::ToggleTask, op, None),
                None => Vec::new(),
            }
        }
        Msg::TaskRemoved { task_id } => match scope(&state) {
            Some(student_id) => state.begin_write(
                WriteKind::RemoveTask,
                mutation::remove_task(&student_id, &task_id),
                None,
            ),
            None => Vec::new(),
        },
        Msg::CommDraftChanged(edit) => {
            edit_detail(&mut state, |detail| detail.comm_draft.apply(edit));
            Vec::new()
        }
        Msg::CommLogged => submit_comm(&mut state),
        Msg::FollowUpTriggered => {
            let built = state.detail().map(|detail| {
                mutation::follow_up(
                    &detail.student_id,
                    &detail.student_email(),
                    state.settings(),
                )
            });
            match built {
                Some((op, crumb)) => state.begin_write(WriteKind::FollowUp, op, Some(crumb)),
                None => Vec::new(),
            }
        }
        Msg::WriteCompleted { request, result } => {
            state.complete_write(request, result);
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.dismiss_notice();
            Vec::new()
        }
    };

    (state, effects)
}

fn scope(state: &AppState) -> Option<String> {
    state.detail().map(|detail| detail.student_id.clone())
}

fn edit_detail(state: &mut AppState, edit: impl FnOnce(&mut crate::state::DetailState)) {
    if let Some(detail) = state.detail_mut() {
        edit(detail);
        state.mark_dirty();
    }
}

/// A blank note is dropped silently: no request, no state change.
fn submit_note(state: &mut AppState) -> Vec<Effect> {
    let op = state.detail().and_then(|detail| {
        mutation::add_note(&detail.student_id, &detail.note_draft, state.identity())
    });
    match op {
        Some(op) => state.begin_write(WriteKind::AddNote, op, None),
        None => {
            console_debug!("Ignoring empty note");
            Vec::new()
        }
    }
}

fn save_note_edit(state: &mut AppState) -> Vec<Effect> {
    let Some(detail) = state.detail() else {
        return Vec::new();
    };
    let Some(editing) = detail.editing.as_ref() else {
        return Vec::new();
    };
    match mutation::save_note_edit(&detail.student_id, editing) {
        Some(op) => state.begin_write(WriteKind::SaveNoteEdit, op, None),
        None => reject(state, "Please enter note text."),
    }
}

fn submit_task(state: &mut AppState) -> Vec<Effect> {
    let Some(detail) = state.detail() else {
        return Vec::new();
    };
    match mutation::add_task(&detail.student_id, &detail.task_draft) {
        Some((op, crumb)) => state.begin_write(WriteKind::AddTask, op, Some(crumb)),
        None => reject(state, "Please enter a task title."),
    }
}

fn submit_comm(state: &mut AppState) -> Vec<Effect> {
    let Some(detail) = state.detail() else {
        return Vec::new();
    };
    let built = mutation::log_comm(
        &detail.student_id,
        &detail.comm_draft,
        &detail.student_email(),
        state.settings(),
    );
    match built {
        Some((op, crumb)) => state.begin_write(WriteKind::LogComm, op, Some(crumb)),
        None => reject(state, "Please enter a message."),
    }
}

fn reject(state: &mut AppState, text: &str) -> Vec<Effect> {
    console_debug!("Rejected before dispatch: {}", text);
    state.set_notice(Notice::validation(text));
    Vec::new()
}
