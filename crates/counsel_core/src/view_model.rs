use crate::{CommDraft, NoteEdit, Notice, Slot, Stage, StageCounts, StatusFilter, TaskDraft};

/// Which screen is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// Identity lookup still outstanding.
    #[default]
    Checking,
    Login,
    /// Signed in, nothing mounted.
    Home,
    List,
    Summary,
    Student(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub signed_in_as: Option<String>,
    pub notice: Option<Notice>,
    pub pending_writes: usize,
    pub active_subscriptions: usize,
    pub list: Option<ListView>,
    pub summary: Option<SummaryView>,
    pub student: Option<StudentView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub loading: bool,
    pub query: String,
    pub status_filter: StatusFilter,
    pub counts: StageCounts,
    pub rows: Vec<StudentRowView>,
    /// Size of the unfiltered set.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub country: String,
    pub stage: Stage,
    pub last_active: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub loading: bool,
    pub counts: StageCounts,
    pub not_contacted: QuickListView,
    pub high_intent: QuickListView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickListView {
    pub title: String,
    /// Full size of the list; `entries` may be truncated.
    pub count: usize,
    pub entries: Vec<QuickEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickEntry {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentView {
    pub student_id: String,
    pub loading: bool,
    pub profile: Option<ProfileView>,
    pub timeline: Vec<TimelineRowView>,
    pub comm: Vec<CommRowView>,
    pub notes: Vec<NoteRowView>,
    pub tasks: Vec<TaskRowView>,
    pub note_draft: String,
    pub editing: Option<NoteEdit>,
    pub task_draft: TaskDraft,
    pub comm_draft: CommDraft,
    /// Live queries that reported a failure; their last data is still shown.
    pub stale: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub country: String,
    pub phone: Option<String>,
    pub grade: Option<String>,
    pub stage: Stage,
    pub stage_index: usize,
    pub progress_percent: u8,
    pub last_active: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRowView {
    pub id: String,
    pub label: &'static str,
    pub text: String,
    pub when: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommRowView {
    pub id: String,
    pub tag: String,
    pub subject: Option<String>,
    pub message: String,
    pub route: String,
    pub when: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRowView {
    pub id: String,
    pub text: String,
    pub author: String,
    pub created: String,
    pub edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRowView {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub due: String,
    pub assignee: String,
}
