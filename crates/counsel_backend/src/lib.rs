//! Counsel backend: live document store access and effect execution.
mod backend;
mod dispatch;
mod error;
mod handle;
mod memory;
mod persist;
mod registry;

pub use backend::{Backend, SnapshotSink, SubscriptionHandle};
pub use dispatch::execute;
pub use error::BackendError;
pub use handle::ConsoleHandle;
pub use memory::{Clock, InMemoryBackend, StoreSnapshot, StoredDocument};
pub use persist::{ensure_state_dir, load_store, save_store, AtomicFileWriter, PersistError};
pub use registry::{RegistryStats, SubscriptionRegistry};
