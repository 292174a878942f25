use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Record;

/// Pipeline stage a student occupies, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Exploring,
    Shortlisting,
    Applying,
    Submitted,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Exploring,
        Stage::Shortlisting,
        Stage::Applying,
        Stage::Submitted,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Exploring => "Exploring",
            Stage::Shortlisting => "Shortlisting",
            Stage::Applying => "Applying",
            Stage::Submitted => "Submitted",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Stage::Exploring => 0,
            Stage::Shortlisting => 1,
            Stage::Applying => 2,
            Stage::Submitted => 3,
        }
    }

    /// Exact, case-sensitive match against the stored labels.
    pub fn parse(raw: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.as_str() == raw)
    }

    /// Completion percentage shown on the detail progress bar.
    pub fn progress_percent(self) -> u8 {
        let done = (self.index() + 1) as f64 / Stage::ALL.len() as f64;
        (done * 100.0).round() as u8
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Status filter of the student list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Stage),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<StatusFilter> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Some(StatusFilter::All);
        }
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(trimmed))
            .map(StatusFilter::Only)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(stage) => stage.as_str(),
        }
    }

    /// Exact match on the stored status; a missing or unknown status only
    /// passes `All`.
    pub fn admits(self, status: Option<Stage>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == Some(wanted),
        }
    }
}

/// Signed-in operator, threaded explicitly into author attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn author_uid(identity: Option<&Identity>) -> String {
        identity
            .map(|id| id.uid.clone())
            .filter(|uid| !uid.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn author_name(identity: Option<&Identity>) -> String {
        identity
            .and_then(|id| id.email.clone().filter(|email| !email.is_empty()))
            .unwrap_or_else(|| Identity::author_uid(identity))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub country: String,
    pub phone: Option<String>,
    pub grade: Option<String>,
    /// Stored status; `None` when missing or not one of the four stages.
    pub status: Option<Stage>,
    pub last_active: Option<DateTime<Utc>>,
    pub high_intent: bool,
}

impl Student {
    /// Stage used for display, counting and filtering.
    pub fn stage(&self) -> Stage {
        self.status.unwrap_or(Stage::Exploring)
    }

    /// Short label for quick lists.
    pub fn label(&self) -> &str {
        [self.name.as_str(), self.email.as_str()]
            .into_iter()
            .find(|text| !text.trim().is_empty())
            .unwrap_or(&self.id)
    }

    pub fn from_record(record: &Record) -> Student {
        let grade = match record.get("grade") {
            Some(crate::FieldValue::Integer(grade)) => Some(grade.to_string()),
            Some(crate::FieldValue::Text(grade)) if !grade.trim().is_empty() => {
                Some(grade.clone())
            }
            _ => None,
        };
        Student {
            id: record.id.clone(),
            name: record.text_or_empty("name"),
            email: record.text_or_empty("email"),
            country: record.text_or_empty("country"),
            phone: record.non_empty_text("phone"),
            grade,
            status: record.text("status").and_then(Stage::parse),
            last_active: record.instant("lastActive"),
            high_intent: record.flag("highIntent").unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKind {
    Login,
    AiQuestion,
    DocSubmission,
    Comm,
    Unknown,
}

impl TimelineKind {
    pub fn parse(raw: &str) -> TimelineKind {
        match raw {
            "login" => TimelineKind::Login,
            "ai_question" => TimelineKind::AiQuestion,
            "doc_submission" => TimelineKind::DocSubmission,
            "comm" => TimelineKind::Comm,
            _ => TimelineKind::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TimelineKind::Login => "login",
            TimelineKind::AiQuestion => "ai_question",
            TimelineKind::DocSubmission => "doc_submission",
            TimelineKind::Comm => "comm",
            TimelineKind::Unknown => "unknown",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TimelineKind::Login => "Login",
            TimelineKind::AiQuestion => "AI Question",
            TimelineKind::DocSubmission => "Doc Uploaded",
            TimelineKind::Comm => "Communication",
            TimelineKind::Unknown => "Event",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub id: String,
    pub kind: TimelineKind,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TimelineEvent {
    pub fn from_record(record: &Record) -> TimelineEvent {
        TimelineEvent {
            id: record.id.clone(),
            kind: TimelineKind::parse(record.text("type").unwrap_or_default()),
            text: record.text_or_empty("text"),
            timestamp: record.instant("timestamp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommChannel {
    #[default]
    Email,
    Sms,
}

impl CommChannel {
    pub fn parse(raw: &str) -> Option<CommChannel> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(CommChannel::Email),
            "sms" => Some(CommChannel::Sms),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CommChannel::Email => "email",
            CommChannel::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommDirection {
    #[default]
    Outbound,
    Inbound,
}

impl CommDirection {
    pub fn parse(raw: &str) -> Option<CommDirection> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "out" => Some(CommDirection::Outbound),
            "in" => Some(CommDirection::Inbound),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CommDirection::Outbound => "out",
            CommDirection::Inbound => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommItem {
    pub id: String,
    pub channel: CommChannel,
    pub direction: CommDirection,
    pub subject: Option<String>,
    pub message: String,
    pub to: String,
    pub from: String,
    pub status: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommItem {
    pub fn from_record(record: &Record) -> CommItem {
        CommItem {
            id: record.id.clone(),
            channel: record
                .text("type")
                .and_then(CommChannel::parse)
                .unwrap_or_default(),
            direction: record
                .text("direction")
                .and_then(CommDirection::parse)
                .unwrap_or_default(),
            subject: record.non_empty_text("subject"),
            message: record.text_or_empty("message"),
            to: record.text_or_empty("to"),
            from: record.text_or_empty("from"),
            status: record.non_empty_text("status"),
            timestamp: record.instant("timestamp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub author_uid: String,
    pub author_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn from_record(record: &Record) -> Note {
        Note {
            id: record.id.clone(),
            text: record.text_or_empty("text"),
            author_uid: record.text_or_empty("authorUid"),
            author_name: record.non_empty_text("authorName"),
            created_at: record.instant("createdAt"),
            updated_at: record.instant("updatedAt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Option<TaskStatus> {
        match raw {
            "open" => Some(TaskStatus::Open),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Done => "done",
        }
    }

    pub const fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Open => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn from_record(record: &Record) -> Task {
        Task {
            id: record.id.clone(),
            title: record.text_or_empty("title"),
            status: record
                .text("status")
                .and_then(TaskStatus::parse)
                .unwrap_or_default(),
            due_at: record.instant("dueAt"),
            assignee: record.non_empty_text("assignee"),
            created_at: record.instant("createdAt"),
            updated_at: record.instant("updatedAt"),
        }
    }
}
