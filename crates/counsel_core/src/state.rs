use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use counsel_logging::{console_debug, console_warn};

use crate::derive::{contact_partition, filter_students, high_intent, stage_counts};
use crate::normalize::format_instant;
use crate::query::{
    CollectionPath, DocumentPath, FilterOp, Query, COMM_LOG, NOTES, TASKS, TIMELINE,
};
use crate::view_model::{
    AppViewModel, CommRowView, ListView, NoteRowView, ProfileView, QuickEntry, QuickListView,
    Route, StudentRowView, StudentView, SummaryView, TaskRowView, TimelineRowView,
};
use crate::{
    CommDraft, CommItem, ConsoleSettings, Effect, FieldValue, Identity, NewDocument, Note,
    NoteEdit, Record, RequestId, StatusFilter, Student, SubscriptionId, Task, TaskDraft,
    TimelineEvent, WriteKind, WriteOp, WriteRequest,
};

/// A live query the state keeps open. At most one subscription per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Students,
    RecentComms,
    Profile,
    Timeline,
    CommLog,
    Notes,
    Tasks,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Students => "students",
            Slot::RecentComms => "recent communications",
            Slot::Profile => "profile",
            Slot::Timeline => "timeline",
            Slot::CommLog => "communication log",
            Slot::Notes => "notes",
            Slot::Tasks => "tasks",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    /// Client-side rejection; nothing was sent.
    Validation,
    /// Backend failure; must be acknowledged by the operator.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn validation(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Validation,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSubscription {
    id: SubscriptionId,
    scope: Option<String>,
}

/// Slot -> open subscription. Opening an occupied slot releases the previous
/// subscription first, so there is never more than one per slot.
#[derive(Debug, Clone, PartialEq, Default)]
struct SubscriptionTable {
    active: BTreeMap<Slot, ActiveSubscription>,
    next_id: u64,
}

impl SubscriptionTable {
    fn open(
        &mut self,
        slot: Slot,
        scope: Option<&str>,
        query: Query,
        effects: &mut Vec<Effect>,
    ) {
        if let Some(previous) = self.active.remove(&slot) {
            effects.push(Effect::Unsubscribe { id: previous.id });
        }
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.active.insert(
            slot,
            ActiveSubscription {
                id,
                scope: scope.map(ToOwned::to_owned),
            },
        );
        effects.push(Effect::Subscribe { id, query });
    }

    fn close_all(&mut self, effects: &mut Vec<Effect>) {
        for (_, subscription) in std::mem::take(&mut self.active) {
            effects.push(Effect::Unsubscribe {
                id: subscription.id,
            });
        }
    }

    fn lookup(&self, id: SubscriptionId) -> Option<(Slot, Option<&str>)> {
        self.active
            .iter()
            .find(|(_, active)| active.id == id)
            .map(|(slot, active)| (*slot, active.scope.as_deref()))
    }

    fn ids(&self) -> Vec<SubscriptionId> {
        self.active.values().map(|active| active.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ListState {
    loaded: bool,
    students: Vec<Student>,
    query: String,
    status_filter: StatusFilter,
    stale: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct SummaryState {
    now: DateTime<Utc>,
    students: Option<Vec<Student>>,
    recent_comms: Option<Vec<Record>>,
}

/// Everything held for the student currently being viewed. Each field is fed
/// by its own subscription and may be empty while others are loaded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetailState {
    pub(crate) student_id: String,
    pub(crate) profile: Option<Student>,
    pub(crate) timeline: Vec<TimelineEvent>,
    pub(crate) comm: Vec<CommItem>,
    pub(crate) notes: Vec<Note>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) note_draft: String,
    pub(crate) editing: Option<NoteEdit>,
    pub(crate) task_draft: TaskDraft,
    pub(crate) comm_draft: CommDraft,
    pub(crate) stale: BTreeSet<Slot>,
}

impl DetailState {
    fn new(student_id: String, identity: Option<&Identity>, settings: &ConsoleSettings) -> Self {
        Self {
            student_id,
            profile: None,
            timeline: Vec::new(),
            comm: Vec::new(),
            notes: Vec::new(),
            tasks: Vec::new(),
            note_draft: String::new(),
            editing: None,
            task_draft: TaskDraft {
                assignee: identity
                    .and_then(|identity| identity.email.clone())
                    .unwrap_or_default(),
                ..TaskDraft::default()
            },
            comm_draft: CommDraft {
                from: settings.team_address.clone(),
                ..CommDraft::default()
            },
            stale: BTreeSet::new(),
        }
    }

    pub(crate) fn student_email(&self) -> String {
        self.profile
            .as_ref()
            .map(|profile| profile.email.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum MountedView {
    #[default]
    None,
    Login,
    List(ListState),
    Summary(SummaryState),
    Student(Box<DetailState>),
}

#[derive(Debug, Clone, PartialEq)]
struct PendingWrite {
    kind: WriteKind,
    scope: String,
}

/// The view-model state of the console. Owned by a single driver loop and
/// only changed through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: ConsoleSettings,
    identity: Option<Identity>,
    auth_checked: bool,
    view: MountedView,
    subscriptions: SubscriptionTable,
    next_request: u64,
    pending: BTreeMap<RequestId, PendingWrite>,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ConsoleSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Ids of every live query the state currently relies on.
    pub fn active_subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscriptions.ids()
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether a re-render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn resolve_identity(&mut self, identity: Option<Identity>) -> Vec<Effect> {
        self.auth_checked = true;
        self.identity = identity;
        self.mark_dirty();
        if self.identity.is_none() {
            let mut effects = Vec::new();
            self.unmount_into(&mut effects);
            self.view = MountedView::Login;
            return effects;
        }
        if matches!(self.view, MountedView::None | MountedView::Login) {
            return self.mount_list();
        }
        Vec::new()
    }

    pub(crate) fn sign_out(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.unmount_into(&mut effects);
        self.identity = None;
        self.view = MountedView::Login;
        self.mark_dirty();
        effects.push(Effect::SignOut);
        effects
    }

    fn unmount_into(&mut self, effects: &mut Vec<Effect>) {
        self.subscriptions.close_all(effects);
        if !matches!(self.view, MountedView::None) {
            self.mark_dirty();
        }
        self.view = MountedView::None;
    }

    /// Routes to login instead of mounting when nobody is signed in.
    fn guard(&mut self, effects: &mut Vec<Effect>) -> bool {
        if self.identity.is_some() {
            return true;
        }
        self.unmount_into(effects);
        self.view = MountedView::Login;
        self.mark_dirty();
        false
    }

    pub(crate) fn mount_list(&mut self) -> Vec<Effect> {
        if matches!(self.view, MountedView::List(_)) {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if !self.guard(&mut effects) {
            return effects;
        }
        self.unmount_into(&mut effects);
        self.view = MountedView::List(ListState::default());
        let query = Query::collection(CollectionPath::students())
            .newest_first("lastActive")
            .limit(self.settings.list_limit);
        self.subscriptions
            .open(Slot::Students, None, query, &mut effects);
        self.mark_dirty();
        effects
    }

    pub(crate) fn mount_summary(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.guard(&mut effects) {
            return effects;
        }
        self.unmount_into(&mut effects);
        self.view = MountedView::Summary(SummaryState {
            now,
            students: None,
            recent_comms: None,
        });
        let students =
            Query::collection(CollectionPath::students()).limit(self.settings.list_limit);
        let cutoff = now - self.settings.contact_window();
        let recent = Query::group(COMM_LOG).filter(
            "timestamp",
            FilterOp::AtLeast,
            FieldValue::Timestamp(cutoff),
        );
        self.subscriptions
            .open(Slot::Students, None, students, &mut effects);
        self.subscriptions
            .open(Slot::RecentComms, None, recent, &mut effects);
        self.mark_dirty();
        effects
    }

    /// Mounts the detail view for `student_id`. Every subscription and every
    /// piece of data of the previous scope is dropped before the new
    /// subscriptions are requested.
    pub(crate) fn mount_student(&mut self, student_id: String) -> Vec<Effect> {
        if let MountedView::Student(detail) = &self.view {
            if detail.student_id == student_id {
                return Vec::new();
            }
        }
        let mut effects = Vec::new();
        if !self.guard(&mut effects) {
            return effects;
        }
        self.unmount_into(&mut effects);
        let scope = student_id.clone();
        self.view = MountedView::Student(Box::new(DetailState::new(
            student_id,
            self.identity.as_ref(),
            &self.settings,
        )));

        let plan = [
            (Slot::Profile, Query::document(DocumentPath::student(&scope))),
            (
                Slot::Timeline,
                Query::collection(CollectionPath::of_student(&scope, TIMELINE))
                    .newest_first("timestamp"),
            ),
            (
                Slot::CommLog,
                Query::collection(CollectionPath::of_student(&scope, COMM_LOG))
                    .newest_first("timestamp"),
            ),
            (
                Slot::Notes,
                Query::collection(CollectionPath::of_student(&scope, NOTES))
                    .newest_first("createdAt"),
            ),
            (
                Slot::Tasks,
                Query::collection(CollectionPath::of_student(&scope, TASKS))
                    .newest_first("createdAt"),
            ),
        ];
        for (slot, query) in plan {
            self.subscriptions
                .open(slot, Some(&scope), query, &mut effects);
        }
        self.mark_dirty();
        effects
    }

    pub(crate) fn unmount(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.unmount_into(&mut effects);
        effects
    }

    pub(crate) fn shutdown(&mut self) -> Vec<Effect> {
        let effects = self.unmount();
        if !self.pending.is_empty() {
            console_warn!(
                "Shutting down with {} unacknowledged write(s)",
                self.pending.len()
            );
        }
        effects
    }

    pub(crate) fn set_search(&mut self, query: String) {
        if let MountedView::List(list) = &mut self.view {
            if list.query != query {
                list.query = query;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn set_status_filter(&mut self, filter: StatusFilter) {
        if let MountedView::List(list) = &mut self.view {
            if list.status_filter != filter {
                list.status_filter = filter;
                self.dirty = true;
            }
        }
    }

    /// Replaces the data held for the subscription's slot. Snapshots of
    /// subscriptions that are no longer active are dropped.
    pub(crate) fn apply_snapshot(
        &mut self,
        subscription: SubscriptionId,
        records: Vec<Record>,
    ) -> Vec<Effect> {
        let Some((slot, scope)) = self.subscriptions.lookup(subscription) else {
            console_debug!(
                "Discarding snapshot of inactive subscription {:?} ({} records)",
                subscription,
                records.len()
            );
            return Vec::new();
        };
        let scope = scope.map(ToOwned::to_owned);
        let records = match scope.as_deref() {
            Some(scope) if slot != Slot::Profile => in_scope(records, scope, slot),
            _ => records,
        };

        if slot == Slot::Profile && records.is_empty() {
            if let Some(missing) = self.detail().map(|detail| detail.student_id.clone()) {
                console_debug!("Student {} does not exist; returning to list", missing);
                let effects = self.mount_list();
                self.set_notice(Notice::info(format!("Student {missing} was not found.")));
                return effects;
            }
        }

        match (&mut self.view, slot) {
            (MountedView::List(list), Slot::Students) => {
                list.students = records.iter().map(Student::from_record).collect();
                list.loaded = true;
                list.stale = false;
            }
            (MountedView::Summary(summary), Slot::Students) => {
                summary.students = Some(records.iter().map(Student::from_record).collect());
            }
            (MountedView::Summary(summary), Slot::RecentComms) => {
                summary.recent_comms = Some(records);
            }
            (MountedView::Student(detail), Slot::Profile) => {
                detail.profile = records.first().map(Student::from_record);
            }
            (MountedView::Student(detail), Slot::Timeline) => {
                detail.timeline = records.iter().map(TimelineEvent::from_record).collect();
            }
            (MountedView::Student(detail), Slot::CommLog) => {
                detail.comm = records.iter().map(CommItem::from_record).collect();
            }
            (MountedView::Student(detail), Slot::Notes) => {
                detail.notes = records.iter().map(Note::from_record).collect();
            }
            (MountedView::Student(detail), Slot::Tasks) => {
                detail.tasks = records.iter().map(Task::from_record).collect();
            }
            _ => {
                console_debug!("Snapshot for {} has no mounted consumer", slot);
                return Vec::new();
            }
        }
        if let MountedView::Student(detail) = &mut self.view {
            detail.stale.remove(&slot);
        }
        self.mark_dirty();
        Vec::new()
    }

    /// Keeps the last delivered data visible and tells the operator.
    pub(crate) fn apply_subscription_failure(&mut self, subscription: SubscriptionId, error: &str) {
        let Some((slot, _)) = self.subscriptions.lookup(subscription) else {
            console_debug!(
                "Ignoring failure of inactive subscription {:?}: {}",
                subscription,
                error
            );
            return;
        };
        console_warn!("Live query for {} failed: {}", slot, error);
        match &mut self.view {
            MountedView::List(list) => list.stale = true,
            MountedView::Student(detail) => {
                detail.stale.insert(slot);
            }
            _ => {}
        }
        self.set_notice(Notice::error(format!(
            "Live updates for {slot} stopped: {error}"
        )));
    }

    pub(crate) fn detail(&self) -> Option<&DetailState> {
        match &self.view {
            MountedView::Student(detail) => Some(&**detail),
            _ => None,
        }
    }

    pub(crate) fn detail_mut(&mut self) -> Option<&mut DetailState> {
        match &mut self.view {
            MountedView::Student(detail) => Some(&mut **detail),
            _ => None,
        }
    }

    /// Records a pending write for the mounted student and emits it.
    pub(crate) fn begin_write(
        &mut self,
        kind: WriteKind,
        primary: WriteOp,
        breadcrumb: Option<NewDocument>,
    ) -> Vec<Effect> {
        let Some(scope) = self.detail().map(|detail| detail.student_id.clone()) else {
            return Vec::new();
        };
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.pending.insert(id, PendingWrite { kind, scope });
        self.mark_dirty();
        vec![Effect::Write(WriteRequest {
            id,
            primary,
            breadcrumb,
        })]
    }

    pub(crate) fn complete_write(&mut self, request: RequestId, result: Result<(), String>) {
        let Some(pending) = self.pending.remove(&request) else {
            console_debug!("Acknowledgement for unknown write {:?}", request);
            return;
        };
        self.mark_dirty();
        if let Err(err) = result {
            console_warn!("{} failed: {}", pending.kind.label(), err);
            self.set_notice(Notice::error(format!(
                "{} failed: {err}",
                pending.kind.label()
            )));
            return;
        }

        let same_scope = self
            .detail()
            .is_some_and(|detail| detail.student_id == pending.scope);
        if same_scope {
            if let Some(detail) = self.detail_mut() {
                match pending.kind {
                    WriteKind::AddNote => detail.note_draft.clear(),
                    WriteKind::SaveNoteEdit => detail.editing = None,
                    WriteKind::AddTask => {
                        detail.task_draft.title.clear();
                        detail.task_draft.due.clear();
                    }
                    WriteKind::LogComm => {
                        detail.comm_draft.message.clear();
                        detail.comm_draft.subject.clear();
                    }
                    WriteKind::DeleteNote
                    | WriteKind::ToggleTask
                    | WriteKind::RemoveTask
                    | WriteKind::FollowUp => {}
                }
            }
        }
        if pending.kind == WriteKind::FollowUp {
            self.set_notice(Notice::info("Mock follow-up email queued."));
        }
    }

    pub fn view(&self) -> AppViewModel {
        let route = match &self.view {
            MountedView::None if !self.auth_checked => Route::Checking,
            MountedView::None => Route::Home,
            MountedView::Login => Route::Login,
            MountedView::List(_) => Route::List,
            MountedView::Summary(_) => Route::Summary,
            MountedView::Student(detail) => Route::Student(detail.student_id.clone()),
        };
        let signed_in_as = self
            .identity
            .as_ref()
            .map(|identity| identity.email.clone().unwrap_or_else(|| identity.uid.clone()));

        let mut view = AppViewModel {
            route,
            signed_in_as,
            notice: self.notice.clone(),
            pending_writes: self.pending.len(),
            active_subscriptions: self.subscriptions.active.len(),
            dirty: self.dirty,
            ..AppViewModel::default()
        };
        match &self.view {
            MountedView::List(list) => view.list = Some(list_view(list)),
            MountedView::Summary(summary) => {
                view.summary = Some(summary_view(summary, &self.settings))
            }
            MountedView::Student(detail) => view.student = Some(student_view(detail)),
            MountedView::None | MountedView::Login => {}
        }
        view
    }
}

/// Drops records that do not belong to `scope`.
fn in_scope(records: Vec<Record>, scope: &str, slot: Slot) -> Vec<Record> {
    let before = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| record.parent_id.as_deref().is_none_or(|parent| parent == scope))
        .collect();
    if kept.len() != before {
        console_warn!(
            "Dropped {} {} record(s) not owned by student {}",
            before - kept.len(),
            slot,
            scope
        );
    }
    kept
}

fn list_view(list: &ListState) -> ListView {
    let rows = filter_students(&list.students, &list.query, list.status_filter)
        .into_iter()
        .map(|student| StudentRowView {
            id: student.id.clone(),
            name: student.name.clone(),
            email: student.email.clone(),
            country: student.country.clone(),
            stage: student.stage(),
            last_active: format_instant(student.last_active),
        })
        .collect();
    ListView {
        loading: !list.loaded,
        query: list.query.clone(),
        status_filter: list.status_filter,
        counts: stage_counts(&list.students),
        rows,
        total: list.students.len(),
    }
}

fn summary_view(summary: &SummaryState, settings: &ConsoleSettings) -> SummaryView {
    let students = summary.students.as_deref().unwrap_or_default();
    let comms = summary.recent_comms.as_deref().unwrap_or_default();
    let partition = contact_partition(students, comms, summary.now, settings.contact_window());
    let by_id: BTreeMap<&str, &Student> = students
        .iter()
        .map(|student| (student.id.as_str(), student))
        .collect();
    let not_contacted: Vec<&Student> = partition
        .not_contacted
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .collect();

    SummaryView {
        loading: summary.students.is_none() || summary.recent_comms.is_none(),
        counts: stage_counts(students),
        not_contacted: quick_list(
            format!("Not contacted in {} days", settings.contact_window_days),
            &not_contacted,
            settings.quick_list_len,
        ),
        high_intent: quick_list(
            "High intent".to_string(),
            &high_intent(students),
            settings.quick_list_len,
        ),
    }
}

fn quick_list(title: String, students: &[&Student], max: usize) -> QuickListView {
    QuickListView {
        title,
        count: students.len(),
        entries: students
            .iter()
            .take(max)
            .map(|student| QuickEntry {
                id: student.id.clone(),
                label: student.label().to_string(),
            })
            .collect(),
    }
}

fn student_view(detail: &DetailState) -> StudentView {
    let profile = detail.profile.as_ref().map(|student| {
        let stage = student.stage();
        ProfileView {
            name: student.name.clone(),
            email: student.email.clone(),
            country: student.country.clone(),
            phone: student.phone.clone(),
            grade: student.grade.clone(),
            stage,
            stage_index: stage.index(),
            progress_percent: stage.progress_percent(),
            last_active: format_instant(student.last_active),
        }
    });
    StudentView {
        student_id: detail.student_id.clone(),
        loading: detail.profile.is_none(),
        profile,
        timeline: detail
            .timeline
            .iter()
            .map(|event| TimelineRowView {
                id: event.id.clone(),
                label: event.kind.label(),
                text: event.text.clone(),
                when: format_instant(event.timestamp),
            })
            .collect(),
        comm: detail
            .comm
            .iter()
            .map(|item| CommRowView {
                id: item.id.clone(),
                tag: format!("[{}/{}]", item.channel.as_str(), item.direction.as_str()),
                subject: item.subject.clone(),
                message: item.message.clone(),
                route: match &item.status {
                    Some(status) => format!("to: {} · from: {} · {}", item.to, item.from, status),
                    None => format!("to: {} · from: {}", item.to, item.from),
                },
                when: format_instant(item.timestamp),
            })
            .collect(),
        notes: detail
            .notes
            .iter()
            .map(|note| NoteRowView {
                id: note.id.clone(),
                text: note.text.clone(),
                author: note
                    .author_name
                    .clone()
                    .unwrap_or_else(|| note.author_uid.clone()),
                created: format_instant(note.created_at),
                edited: note.updated_at.is_some() && note.updated_at != note.created_at,
            })
            .collect(),
        tasks: detail
            .tasks
            .iter()
            .map(|task| TaskRowView {
                id: task.id.clone(),
                title: task.title.clone(),
                done: task.status == crate::TaskStatus::Done,
                due: format_instant(task.due_at),
                assignee: task.assignee.clone().unwrap_or_default(),
            })
            .collect(),
        note_draft: detail.note_draft.clone(),
        editing: detail.editing.clone(),
        task_draft: detail.task_draft.clone(),
        comm_draft: detail.comm_draft.clone(),
        stale: detail.stale.iter().copied().collect(),
    }
}
