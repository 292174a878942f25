use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use counsel_core::{Effect, Msg, Record, SubscriptionId};
use counsel_logging::{console_debug, console_error, console_info, console_warn};

use crate::registry::{RegistryStats, SubscriptionRegistry};
use crate::{dispatch, Backend, BackendError, SnapshotSink};

enum Command {
    Run(Effect),
    Shutdown(mpsc::Sender<RegistryStats>),
}

/// Forwards the snapshots of one live query to the console as messages.
struct ChannelSnapshotSink {
    subscription: SubscriptionId,
    msg_tx: mpsc::Sender<Msg>,
}

impl SnapshotSink for ChannelSnapshotSink {
    fn deliver(&self, snapshot: Result<Vec<Record>, BackendError>) {
        let msg = match snapshot {
            Ok(records) => Msg::SnapshotDelivered {
                subscription: self.subscription,
                records,
            },
            Err(err) => Msg::SubscriptionFailed {
                subscription: self.subscription,
                error: err.to_string(),
            },
        };
        let _ = self.msg_tx.send(msg);
    }
}

/// Executes effects against a [`Backend`] on a worker thread.
///
/// Live queries are opened and closed in the order the effects were
/// dispatched. Writes and identity lookups run on a tokio runtime and report
/// back through the message channel.
pub struct ConsoleHandle {
    cmd_tx: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl ConsoleHandle {
    pub fn new(backend: Arc<dyn Backend>, msg_tx: mpsc::Sender<Msg>) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| BackendError::Unavailable(format!("tokio runtime: {e}")))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let mut registry = SubscriptionRegistry::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    Command::Run(effect) => {
                        run_effect(&runtime, &backend, &mut registry, &msg_tx, effect);
                    }
                    Command::Shutdown(reply) => {
                        registry.close_all();
                        let _ = reply.send(registry.stats());
                        break;
                    }
                }
            }
            registry.close_all();
            runtime.shutdown_background();
        });

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            if self.cmd_tx.send(Command::Run(effect)).is_err() {
                console_error!("Console worker is gone; dropping effect");
                return;
            }
        }
    }

    /// Closes every live query still open and stops the worker.
    pub fn shutdown(mut self) -> RegistryStats {
        let (reply_tx, reply_rx) = mpsc::channel();
        let stats = if self.cmd_tx.send(Command::Shutdown(reply_tx)).is_ok() {
            reply_rx.recv().unwrap_or_default()
        } else {
            RegistryStats::default()
        };
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                console_error!("Console worker panicked");
            }
        }
        console_info!(
            "Console stopped: {} subscription(s) opened, {} closed",
            stats.opened,
            stats.closed
        );
        stats
    }
}

fn run_effect(
    runtime: &tokio::runtime::Runtime,
    backend: &Arc<dyn Backend>,
    registry: &mut SubscriptionRegistry,
    msg_tx: &mpsc::Sender<Msg>,
    effect: Effect,
) {
    match effect {
        Effect::Subscribe { id, query } => {
            console_debug!("Subscribing {:?}: {}", id, query);
            let sink = Arc::new(ChannelSnapshotSink {
                subscription: id,
                msg_tx: msg_tx.clone(),
            });
            match backend.subscribe(query, sink) {
                Ok(handle) => registry.insert(id, handle),
                Err(err) => {
                    console_warn!("Subscription {:?} failed to open: {}", id, err);
                    let _ = msg_tx.send(Msg::SubscriptionFailed {
                        subscription: id,
                        error: err.to_string(),
                    });
                }
            }
        }
        Effect::Unsubscribe { id } => {
            registry.close(id);
        }
        Effect::Write(request) => {
            let backend = Arc::clone(backend);
            let msg_tx = msg_tx.clone();
            runtime.spawn(async move {
                let id = request.id;
                let result = dispatch::execute(backend.as_ref(), request)
                    .await
                    .map_err(|err| err.to_string());
                if let Err(err) = &result {
                    console_warn!("Request {:?} failed: {}", id, err);
                }
                let _ = msg_tx.send(Msg::WriteCompleted {
                    request: id,
                    result,
                });
            });
        }
        Effect::ResolveIdentity => {
            let backend = Arc::clone(backend);
            let msg_tx = msg_tx.clone();
            runtime.spawn(async move {
                let identity = match backend.current_identity().await {
                    Ok(identity) => identity,
                    Err(err) => {
                        console_warn!("Identity lookup failed: {}", err);
                        None
                    }
                };
                let _ = msg_tx.send(Msg::IdentityResolved(identity));
            });
        }
        Effect::SignOut => {
            let backend = Arc::clone(backend);
            runtime.spawn(async move {
                if let Err(err) = backend.sign_out().await {
                    console_warn!("Sign-out failed: {}", err);
                }
            });
        }
    }
}
