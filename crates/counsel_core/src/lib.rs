//! Counsel core: pure view-model state machine for the counseling console.
//!
//! Backend snapshots and operator actions come in as [`Msg`]s, live queries
//! and writes go out as [`Effect`]s. Nothing in this crate performs I/O.
pub mod derive;
mod effect;
mod model;
mod msg;
pub mod mutation;
pub mod normalize;
pub mod query;
mod record;
mod settings;
mod state;
mod update;
mod view_model;

pub use derive::{ContactPartition, StageCounts};
pub use effect::{Effect, SubscriptionId};
pub use model::{
    CommChannel, CommDirection, CommItem, Identity, Note, Stage, StatusFilter, Student, Task,
    TaskStatus, TimelineEvent, TimelineKind,
};
pub use msg::Msg;
pub use mutation::{
    CommDraft, CommDraftEdit, NewDocument, NoteEdit, RequestId, TaskDraft, WriteKind, WriteOp,
    WriteRequest,
};
pub use query::{CollectionPath, DocumentPath, Filter, FilterOp, Query, SortDirection, Source};
pub use record::{fields, FieldValue, Fields, Record};
pub use settings::ConsoleSettings;
pub use state::{AppState, Notice, NoticeLevel, Slot};
pub use update::update;
pub use view_model::{
    AppViewModel, CommRowView, ListView, NoteRowView, ProfileView, QuickEntry, QuickListView,
    Route, StudentRowView, StudentView, SummaryView, TaskRowView, TimelineRowView,
};
