//! In-memory live document store.
//!
//! Every write re-evaluates the queries it can affect and pushes a complete
//! snapshot to their sinks. Snapshots are delivered while the store lock is
//! held, so each subscription sees them in write order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use counsel_core::normalize::normalize_instant;
use counsel_core::{
    CollectionPath, DocumentPath, FieldValue, Fields, Filter, FilterOp, Identity, Query, Record,
    SortDirection, Source,
};
use counsel_logging::{console_debug, console_trace};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{Backend, BackendError, SnapshotSink, SubscriptionHandle};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Serializable content of the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub documents: Vec<StoredDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub collection: CollectionPath,
    pub id: String,
    pub fields: Fields,
}

struct Watcher {
    query: Query,
    sink: Arc<dyn SnapshotSink>,
    token: CancellationToken,
}

#[derive(Default)]
struct Store {
    collections: BTreeMap<CollectionPath, BTreeMap<String, Fields>>,
    watchers: Vec<Watcher>,
    next_id: u64,
    rejected: BTreeSet<String>,
}

pub struct InMemoryBackend {
    store: Mutex<Store>,
    identity: Mutex<Option<Identity>>,
    clock: Clock,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            identity: Mutex::new(None),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_identity(self, identity: Option<Identity>) -> Self {
        *lock(&self.identity) = identity;
        self
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let backend = Self::new();
        {
            let mut store = lock(&backend.store);
            for doc in snapshot.documents {
                store.bump_id_counter(&doc.id);
                store
                    .collections
                    .entry(doc.collection)
                    .or_default()
                    .insert(doc.id, doc.fields);
            }
        }
        backend
    }

    pub fn export_snapshot(&self) -> StoreSnapshot {
        let store = lock(&self.store);
        let documents = store
            .collections
            .iter()
            .flat_map(|(collection, docs)| {
                docs.iter().map(move |(id, fields)| StoredDocument {
                    collection: collection.clone(),
                    id: id.clone(),
                    fields: fields.clone(),
                })
            })
            .collect();
        StoreSnapshot { documents }
    }

    /// Writes a document with a caller-chosen id, replacing any existing one.
    pub fn put(&self, path: &DocumentPath, fields: Fields) {
        let now = (self.clock)();
        let mut store = lock(&self.store);
        store.bump_id_counter(&path.id);
        store
            .collections
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), resolve_sentinels(fields, now));
        store.notify(&path.collection);
    }

    /// Makes every write to collections named `name` fail.
    pub fn reject_writes_to(&self, name: &str) {
        lock(&self.store).rejected.insert(name.to_string());
    }

    pub fn accept_all_writes(&self) {
        lock(&self.store).rejected.clear();
    }

    /// Fails every open live query with `reason` and closes it.
    pub fn fail_subscriptions(&self, reason: &str) {
        let mut store = lock(&self.store);
        for watcher in store.watchers.drain(..) {
            if !watcher.token.is_cancelled() {
                watcher
                    .sink
                    .deliver(Err(BackendError::Unavailable(reason.to_string())));
                watcher.token.cancel();
            }
        }
    }

    /// Number of live queries that have not been cancelled.
    pub fn active_watchers(&self) -> usize {
        lock(&self.store)
            .watchers
            .iter()
            .filter(|watcher| !watcher.token.is_cancelled())
            .count()
    }

    /// Current result of `query`, without subscribing.
    pub fn query(&self, query: &Query) -> Vec<Record> {
        lock(&self.store).evaluate(query)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolve_sentinels(fields: Fields, now: DateTime<Utc>) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| match value {
            FieldValue::ServerTimestamp => (name, FieldValue::Timestamp(now)),
            other => (name, other),
        })
        .collect()
}

impl Store {
    fn bump_id_counter(&mut self, id: &str) {
        if let Some(n) = id.strip_prefix('d').and_then(|n| n.parse::<u64>().ok()) {
            self.next_id = self.next_id.max(n);
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("d{:08}", self.next_id)
    }

    fn check_writable(
        &self,
        path: impl ToString,
        collection: &CollectionPath,
    ) -> Result<(), BackendError> {
        if self.rejected.contains(&collection.name) {
            return Err(BackendError::Rejected {
                path: path.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        Ok(())
    }

    fn evaluate(&self, query: &Query) -> Vec<Record> {
        let mut records: Vec<Record> = match &query.source {
            Source::Document(path) => self
                .collections
                .get(&path.collection)
                .and_then(|docs| docs.get(&path.id))
                .map(|fields| to_record(&path.collection, &path.id, fields))
                .into_iter()
                .collect(),
            Source::Collection(collection) => self
                .collections
                .get(collection)
                .into_iter()
                .flat_map(|docs| docs.iter().map(move |(id, f)| to_record(collection, id, f)))
                .collect(),
            Source::Group(name) => self
                .collections
                .iter()
                .filter(|(collection, _)| collection.parent.is_some() && &collection.name == name)
                .flat_map(|(collection, docs)| {
                    docs.iter().map(move |(id, f)| to_record(collection, id, f))
                })
                .collect(),
        };

        records.retain(|record| query.filters.iter().all(|filter| matches(record, filter)));
        if let Some((field, direction)) = &query.order_by {
            records.sort_by(|a, b| order(a.get(field), b.get(field), *direction));
        }
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        records
    }

    /// Pushes fresh snapshots to every live query reading `collection`.
    fn notify(&mut self, collection: &CollectionPath) {
        self.watchers.retain(|watcher| !watcher.token.is_cancelled());
        for watcher in &self.watchers {
            if reads(&watcher.query.source, collection) {
                let snapshot = self.evaluate(&watcher.query);
                console_trace!("Snapshot for {}: {} record(s)", watcher.query, snapshot.len());
                watcher.sink.deliver(Ok(snapshot));
            }
        }
    }
}

fn to_record(collection: &CollectionPath, id: &str, fields: &Fields) -> Record {
    Record {
        id: id.to_string(),
        parent_id: collection.parent.clone(),
        fields: fields.clone(),
    }
}

fn reads(source: &Source, changed: &CollectionPath) -> bool {
    match source {
        Source::Document(path) => &path.collection == changed,
        Source::Collection(collection) => collection == changed,
        Source::Group(name) => changed.parent.is_some() && &changed.name == name,
    }
}

fn compare(a: &FieldValue, b: &FieldValue) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (normalize_instant(a), normalize_instant(b)) {
        return Some(a.cmp(&b));
    }
    match (a, b) {
        (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
        (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
        (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
        (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
        (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn matches(record: &Record, filter: &Filter) -> bool {
    let Some(value) = record.get(&filter.field) else {
        return false;
    };
    match (compare(value, &filter.value), filter.op) {
        (Some(Ordering::Equal), FilterOp::Equal) => true,
        (Some(ordering), FilterOp::AtLeast) => ordering != Ordering::Less,
        (Some(ordering), FilterOp::AtMost) => ordering != Ordering::Greater,
        _ => false,
    }
}

/// Present values first, in `direction`; missing or null values last.
fn order(a: Option<&FieldValue>, b: Option<&FieldValue>, direction: SortDirection) -> Ordering {
    let a = a.filter(|value| !value.is_null());
    let b = b.filter(|value| !value.is_null());
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = compare(a, b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        Ok(lock(&self.identity).clone())
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        *lock(&self.identity) = None;
        Ok(())
    }

    fn subscribe(
        &self,
        query: Query,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<SubscriptionHandle, BackendError> {
        if let Source::Group(name) | Source::Collection(CollectionPath { name, .. }) =
            &query.source
        {
            if name.is_empty() {
                return Err(BackendError::InvalidPath(query.to_string()));
            }
        }
        let token = CancellationToken::new();
        let mut store = lock(&self.store);
        let snapshot = store.evaluate(&query);
        console_debug!("Live query opened: {} ({} record(s))", query, snapshot.len());
        sink.deliver(Ok(snapshot));
        store.watchers.push(Watcher {
            query,
            sink,
            token: token.clone(),
        });
        Ok(SubscriptionHandle::new(token))
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<String, BackendError> {
        let now = (self.clock)();
        let mut store = lock(&self.store);
        store.check_writable(collection, collection)?;
        let id = store.allocate_id();
        store
            .collections
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), resolve_sentinels(fields, now));
        store.notify(collection);
        Ok(id)
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError> {
        let now = (self.clock)();
        let mut store = lock(&self.store);
        store.check_writable(path, &path.collection)?;
        let existing = store
            .collections
            .get_mut(&path.collection)
            .and_then(|docs| docs.get_mut(&path.id))
            .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        existing.extend(resolve_sentinels(fields, now));
        store.notify(&path.collection);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), BackendError> {
        let mut store = lock(&self.store);
        store.check_writable(path, &path.collection)?;
        let removed = store
            .collections
            .get_mut(&path.collection)
            .and_then(|docs| docs.remove(&path.id))
            .is_some();
        if removed {
            store.notify(&path.collection);
        }
        Ok(())
    }
}
