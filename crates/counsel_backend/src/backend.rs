use std::sync::Arc;

use counsel_core::{CollectionPath, DocumentPath, Fields, Identity, Query, Record};
use tokio_util::sync::CancellationToken;

use crate::BackendError;

/// Receives every snapshot of one live query, in delivery order.
///
/// Implementations must not call back into the backend.
pub trait SnapshotSink: Send + Sync {
    fn deliver(&self, snapshot: Result<Vec<Record>, BackendError>);
}

/// Cancellation handle of a live query. Unsubscribing is synchronous and
/// idempotent; dropping the handle unsubscribes as well.
#[derive(Debug)]
pub struct SubscriptionHandle {
    token: CancellationToken,
}

impl SubscriptionHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn unsubscribe(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Document database plus authentication, as seen by the console.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Opens a live query. The sink receives the full ordered result set
    /// immediately and again after every change that affects it.
    fn subscribe(
        &self,
        query: Query,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<SubscriptionHandle, BackendError>;

    /// Creates a document with a backend-assigned id and returns that id.
    async fn create(&self, collection: &CollectionPath, fields: Fields)
        -> Result<String, BackendError>;

    /// Merges `fields` into an existing document.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), BackendError>;

    async fn delete(&self, path: &DocumentPath) -> Result<(), BackendError>;
}
