use counsel_core::{WriteOp, WriteRequest};
use counsel_logging::{console_info, console_warn};

use crate::{Backend, BackendError};

async fn apply(backend: &dyn Backend, op: WriteOp) -> Result<(), BackendError> {
    match op {
        WriteOp::Create(doc) => backend.create(&doc.collection, doc.fields).await.map(drop),
        WriteOp::Update { path, fields } => backend.update(&path, fields).await,
        WriteOp::Delete { path } => backend.delete(&path).await,
    }
}

/// Runs one write request. The outcome is that of the primary write; the
/// breadcrumb only runs after it succeeded and its failure is logged.
pub async fn execute(backend: &dyn Backend, request: WriteRequest) -> Result<(), BackendError> {
    let WriteRequest {
        id,
        primary,
        breadcrumb,
    } = request;
    let target = primary.target();
    apply(backend, primary).await?;
    console_info!("Request {:?} wrote {}", id, target);

    if let Some(crumb) = breadcrumb {
        let collection = crumb.collection.to_string();
        if let Err(err) = backend.create(&crumb.collection, crumb.fields).await {
            console_warn!(
                "Request {:?}: timeline entry in {} failed: {}",
                id,
                collection,
                err
            );
        }
    }
    Ok(())
}
