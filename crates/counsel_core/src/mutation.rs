//! Construction of backend writes for operator actions.
//!
//! Builders validate their input and return `None` when required text is
//! blank, so no request is ever produced for a rejected action.

use serde::{Deserialize, Serialize};

use crate::normalize::parse_local_input;
use crate::query::{CollectionPath, DocumentPath, COMM_LOG, NOTES, TASKS, TIMELINE};
use crate::record::fields;
use crate::{
    CommChannel, CommDirection, ConsoleSettings, FieldValue, Fields, Identity, Task,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub collection: CollectionPath,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    Create(NewDocument),
    Update { path: DocumentPath, fields: Fields },
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn target(&self) -> String {
        match self {
            WriteOp::Create(doc) => doc.collection.to_string(),
            WriteOp::Update { path, .. } | WriteOp::Delete { path } => path.to_string(),
        }
    }
}

/// One logical write plus an optional timeline breadcrumb.
///
/// The breadcrumb is best-effort: it is attempted only after the primary write
/// succeeded and its failure does not change the outcome of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub id: RequestId,
    pub primary: WriteOp,
    pub breadcrumb: Option<NewDocument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    AddNote,
    SaveNoteEdit,
    DeleteNote,
    AddTask,
    ToggleTask,
    RemoveTask,
    LogComm,
    FollowUp,
}

impl WriteKind {
    pub const fn label(self) -> &'static str {
        match self {
            WriteKind::AddNote => "Adding the note",
            WriteKind::SaveNoteEdit => "Saving the note",
            WriteKind::DeleteNote => "Deleting the note",
            WriteKind::AddTask => "Adding the task",
            WriteKind::ToggleTask => "Updating the task",
            WriteKind::RemoveTask => "Removing the task",
            WriteKind::LogComm => "Logging the communication",
            WriteKind::FollowUp => "Queueing the follow-up",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteEdit {
    pub note_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    /// Operator-typed due date, parsed on submit.
    pub due: String,
    pub assignee: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommDraft {
    pub channel: CommChannel,
    pub direction: CommDirection,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub message: String,
}

/// Edits applied to the communication form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommDraftEdit {
    Channel(CommChannel),
    Direction(CommDirection),
    To(String),
    From(String),
    Subject(String),
    Message(String),
}

impl CommDraft {
    pub fn apply(&mut self, edit: CommDraftEdit) {
        match edit {
            CommDraftEdit::Channel(channel) => self.channel = channel,
            CommDraftEdit::Direction(direction) => self.direction = direction,
            CommDraftEdit::To(to) => self.to = to,
            CommDraftEdit::From(from) => self.from = from,
            CommDraftEdit::Subject(subject) => self.subject = subject,
            CommDraftEdit::Message(message) => self.message = message,
        }
    }
}

pub fn breadcrumb(student_id: &str, text: impl Into<String>) -> NewDocument {
    NewDocument {
        collection: CollectionPath::of_student(student_id, TIMELINE),
        fields: fields([
            ("type", FieldValue::from("comm")),
            ("text", FieldValue::Text(text.into())),
            ("timestamp", FieldValue::ServerTimestamp),
        ]),
    }
}

pub fn add_note(student_id: &str, text: &str, identity: Option<&Identity>) -> Option<WriteOp> {
    let text = non_blank(text)?;
    Some(WriteOp::Create(NewDocument {
        collection: CollectionPath::of_student(student_id, NOTES),
        fields: fields([
            ("text", FieldValue::from(text)),
            ("authorUid", FieldValue::Text(Identity::author_uid(identity))),
            ("authorName", FieldValue::Text(Identity::author_name(identity))),
            ("createdAt", FieldValue::ServerTimestamp),
            ("updatedAt", FieldValue::ServerTimestamp),
        ]),
    }))
}

pub fn save_note_edit(student_id: &str, edit: &NoteEdit) -> Option<WriteOp> {
    let text = non_blank(&edit.text)?;
    Some(WriteOp::Update {
        path: CollectionPath::of_student(student_id, NOTES).doc(&edit.note_id),
        fields: fields([
            ("text", FieldValue::from(text)),
            ("updatedAt", FieldValue::ServerTimestamp),
        ]),
    })
}

pub fn delete_note(student_id: &str, note_id: &str) -> WriteOp {
    WriteOp::Delete {
        path: CollectionPath::of_student(student_id, NOTES).doc(note_id),
    }
}

pub fn add_task(student_id: &str, draft: &TaskDraft) -> Option<(WriteOp, NewDocument)> {
    let title = non_blank(&draft.title)?;
    let op = WriteOp::Create(NewDocument {
        collection: CollectionPath::of_student(student_id, TASKS),
        fields: fields([
            ("title", FieldValue::from(title)),
            ("status", FieldValue::from("open")),
            ("assignee", FieldValue::from(non_blank(&draft.assignee))),
            ("dueAt", FieldValue::from(parse_local_input(&draft.due))),
            ("createdAt", FieldValue::ServerTimestamp),
        ]),
    });
    Some((op, breadcrumb(student_id, format!("Task created: {title}"))))
}

pub fn toggle_task(student_id: &str, task: &Task) -> WriteOp {
    WriteOp::Update {
        path: CollectionPath::of_student(student_id, TASKS).doc(&task.id),
        fields: fields([
            ("status", FieldValue::from(task.status.toggled().as_str())),
            ("updatedAt", FieldValue::ServerTimestamp),
        ]),
    }
}

pub fn remove_task(student_id: &str, task_id: &str) -> WriteOp {
    WriteOp::Delete {
        path: CollectionPath::of_student(student_id, TASKS).doc(task_id),
    }
}

pub fn log_comm(
    student_id: &str,
    draft: &CommDraft,
    student_email: &str,
    settings: &ConsoleSettings,
) -> Option<(WriteOp, NewDocument)> {
    let message = non_blank(&draft.message)?;
    let is_email = draft.channel == CommChannel::Email;
    let to = non_blank(&draft.to).unwrap_or(student_email.trim());
    let from = non_blank(&draft.from).unwrap_or(settings.team_address.as_str());
    let subject = non_blank(&draft.subject).filter(|_| is_email);
    let status = if is_email { Some("sent") } else { None };

    let op = WriteOp::Create(NewDocument {
        collection: CollectionPath::of_student(student_id, COMM_LOG),
        fields: fields([
            ("type", FieldValue::from(draft.channel.as_str())),
            ("direction", FieldValue::from(draft.direction.as_str())),
            ("to", FieldValue::from(to)),
            ("from", FieldValue::from(from)),
            ("subject", FieldValue::from(subject)),
            ("message", FieldValue::from(message)),
            ("status", FieldValue::from(status)),
            ("timestamp", FieldValue::ServerTimestamp),
        ]),
    });
    let preview: String = draft
        .message
        .chars()
        .take(settings.breadcrumb_preview_chars)
        .collect();
    let crumb = breadcrumb(
        student_id,
        format!(
            "{} {}: {}",
            draft.channel.as_str().to_uppercase(),
            draft.direction.as_str(),
            preview
        ),
    );
    Some((op, crumb))
}

pub fn follow_up(
    student_id: &str,
    student_email: &str,
    settings: &ConsoleSettings,
) -> (WriteOp, NewDocument) {
    let op = WriteOp::Create(NewDocument {
        collection: CollectionPath::of_student(student_id, COMM_LOG),
        fields: fields([
            ("type", FieldValue::from(CommChannel::Email.as_str())),
            ("direction", FieldValue::from(CommDirection::Outbound.as_str())),
            ("to", FieldValue::from(student_email)),
            ("from", FieldValue::from(settings.team_address.as_str())),
            ("subject", FieldValue::from(settings.follow_up_subject.as_str())),
            ("message", FieldValue::from(settings.follow_up_message.as_str())),
            ("status", FieldValue::from("queued")),
            ("timestamp", FieldValue::ServerTimestamp),
        ]),
    });
    (op, breadcrumb(student_id, "Follow-up email queued"))
}

fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
