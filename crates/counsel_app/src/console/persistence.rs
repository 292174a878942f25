use std::path::Path;

use counsel_backend::{load_store, save_store, InMemoryBackend};
use counsel_logging::{console_error, console_info, console_warn};

/// Builds the backend from the saved store; any problem yields an empty store.
pub(crate) fn load_backend(path: &Path) -> InMemoryBackend {
    match load_store(path) {
        Ok(Some(snapshot)) => {
            console_info!(
                "Loaded {} document(s) from {:?}",
                snapshot.documents.len(),
                path
            );
            InMemoryBackend::from_snapshot(snapshot)
        }
        Ok(None) => {
            console_info!("No saved store at {:?}; starting empty", path);
            InMemoryBackend::new()
        }
        Err(err) => {
            console_warn!("Failed to load saved store from {:?}: {}", path, err);
            InMemoryBackend::new()
        }
    }
}

pub(crate) fn save_backend(path: &Path, backend: &InMemoryBackend) {
    let snapshot = backend.export_snapshot();
    match save_store(path, &snapshot) {
        Ok(()) => console_info!(
            "Saved {} document(s) to {:?}",
            snapshot.documents.len(),
            path
        ),
        Err(err) => console_error!("Failed to save store to {:?}: {}", path, err),
    }
}
