use chrono::{DateTime, Utc};

use crate::{CommDraftEdit, Identity, Record, RequestId, StatusFilter, SubscriptionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Result of the identity lookup; `None` routes to login.
    IdentityResolved(Option<Identity>),
    SignOutClicked,
    /// Student table mounted.
    ListOpened,
    /// Summary mounted; `now` anchors the contact window.
    SummaryOpened { now: DateTime<Utc> },
    /// Detail view mounted (or switched) to another student.
    StudentOpened { student_id: String },
    /// Current view unmounted.
    ViewClosed,
    /// Application exit: every subscription is released.
    Shutdown,
    SearchChanged(String),
    StatusFilterChanged(StatusFilter),
    /// Full ordered result set of a live query.
    SnapshotDelivered {
        subscription: SubscriptionId,
        records: Vec<Record>,
    },
    SubscriptionFailed {
        subscription: SubscriptionId,
        error: String,
    },
    NoteDraftChanged(String),
    NoteSubmitted,
    NoteEditStarted { note_id: String },
    NoteEditChanged(String),
    NoteEditSaved,
    NoteEditCancelled,
    NoteDeleted { note_id: String },
    TaskTitleChanged(String),
    TaskDueChanged(String),
    TaskAssigneeChanged(String),
    TaskSubmitted,
    TaskToggled { task_id: String },
    TaskRemoved { task_id: String },
    CommDraftChanged(CommDraftEdit),
    CommLogged,
    FollowUpTriggered,
    /// Backend acknowledgement of the primary write of a request.
    WriteCompleted {
        request: RequestId,
        result: Result<(), String>,
    },
    NoticeDismissed,
}
