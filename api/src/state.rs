//! API State Management

use crate::ApiResult;
use compost_core::{Ledger, TimeSource};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing as log;

#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<RwLock<Ledger>>,
    pub clock: Arc<dyn TimeSource>,
    pub snapshot_path: Option<PathBuf>,
    pub start_time: std::time::Instant,
    persistence_error: Arc<Mutex<Option<String>>>,
}

impl ApiState {
    pub fn new(ledger: Ledger, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            clock,
            snapshot_path: None,
            start_time: std::time::Instant::now(),
            persistence_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Persist the ledger to `path` after every successful mutation
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Last snapshot failure, cleared by the next successful save
    pub fn persistence_error(&self) -> Option<String> {
        self.persistence_error.lock().clone()
    }

    /// Run `op` under the write lock and snapshot the result if it succeeded.
    ///
    /// The snapshot is written while the lock is still held, so files on disk
    /// always follow commit order. A committed operation is reported as
    /// committed even when the save fails; the failure shows up on `/health`.
    pub async fn mutate<T, F>(&self, op: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Ledger, u64) -> compost_core::Result<T>,
    {
        let now = self.now();
        let mut ledger = self.ledger.write().await;
        let value = op(&mut ledger, now)?;

        if let Some(path) = &self.snapshot_path {
            match ledger.snapshot().save(path) {
                Ok(()) => {
                    self.persistence_error.lock().take();
                }
                Err(e) => {
                    log::error!(
                        "Ledger change committed but snapshot to {} failed: {}",
                        path.display(),
                        e
                    );
                    *self.persistence_error.lock() = Some(e.to_string());
                }
            }
        }
        Ok(value)
    }
}
