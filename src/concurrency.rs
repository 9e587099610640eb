//! Per-owner atomic transactions
//!
//! A transaction loads the owner's record, lets an operation edit an
//! in-memory copy (staging blob writes alongside), and commits both in one
//! step. The commit fails as stale if another transaction committed for the
//! same owner in between; the whole operation then reruns against fresh
//! state. Different owners never contend.

use crate::blob::{BlobSession, BlobStore};
use crate::error::ApiError;
use crate::store::{CommitOutcome, OwnerCommit, OwnerRecord, OwnerRepository};
use crate::types::OwnerId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for stale commits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Reruns allowed after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between attempts; attempt n waits n * retry_delay_ms
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    8
}

fn default_retry_delay_ms() -> u64 {
    2
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Working state of one transaction attempt
pub struct OwnerTxn<'a> {
    snapshot: OwnerRecord,
    record: OwnerRecord,
    blobs: BlobSession<'a>,
}

impl<'a> OwnerTxn<'a> {
    fn new(record: OwnerRecord, blobs: BlobSession<'a>) -> Self {
        Self {
            snapshot: record.clone(),
            record,
            blobs,
        }
    }

    pub fn record_mut(&mut self) -> &mut OwnerRecord {
        &mut self.record
    }

    pub fn blobs_mut(&mut self) -> &mut BlobSession<'a> {
        &mut self.blobs
    }

    /// Record and blob session together, for edits that touch both
    pub fn parts_mut(&mut self) -> (&mut OwnerRecord, &mut BlobSession<'a>) {
        (&mut self.record, &mut self.blobs)
    }

    fn has_changes(&self) -> bool {
        self.record != self.snapshot || !self.blobs.is_empty()
    }
}

/// Runs operations as atomic, retried per-owner transactions
pub struct TransactionCoordinator {
    repository: Arc<dyn OwnerRepository>,
    blobs: BlobStore,
    config: TransactionConfig,
}

impl TransactionCoordinator {
    pub fn new(repository: Arc<dyn OwnerRepository>, config: TransactionConfig) -> Self {
        Self {
            blobs: BlobStore::new(repository.clone()),
            repository,
            config,
        }
    }

    /// Run `operation` against the owner's current state and commit its edits.
    ///
    /// Errors returned by `operation` abort the attempt without a commit and
    /// are passed through. Stale commits rerun `operation` from a fresh load
    /// up to `max_retries` times, then fail with `RetriesExhausted`.
    /// Operations that change nothing commit nothing.
    pub fn run_atomic<T, F>(&self, owner: &OwnerId, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut(&mut OwnerTxn<'_>) -> Result<T, ApiError>,
    {
        let attempts = self.config.max_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let stored = self.repository.load(owner)?;
            let expected_revision = stored.as_ref().map(|record| record.revision);
            let record = stored.unwrap_or_else(|| OwnerRecord::new(owner.clone()));

            let mut txn = OwnerTxn::new(record, self.blobs.session(owner));
            let value = operation(&mut txn)?;
            if !txn.has_changes() {
                return Ok(value);
            }

            let OwnerTxn {
                record: mut next, blobs, ..
            } = txn;
            next.revision = expected_revision.map_or(1, |revision| revision + 1);
            next.updated_at = chrono::Utc::now().timestamp_millis();
            let change = OwnerCommit {
                expected_revision,
                record: next,
                blob_writes: blobs.into_writes(),
            };

            match self.repository.commit(&change)? {
                CommitOutcome::Committed => {
                    debug!(
                        owner = %owner,
                        attempt,
                        revision = change.record.revision,
                        "Transaction committed"
                    );
                    return Ok(value);
                }
                CommitOutcome::Stale => {
                    debug!(owner = %owner, attempt, "Stale snapshot, retrying transaction");
                    if attempt < attempts && self.config.retry_delay_ms > 0 {
                        std::thread::sleep(Duration::from_millis(
                            self.config.retry_delay_ms.saturating_mul(u64::from(attempt)),
                        ));
                    }
                }
            }
        }

        warn!(owner = %owner, attempts, "Transaction retries exhausted");
        Err(ApiError::RetriesExhausted {
            owner: owner.to_string(),
            attempts,
        })
    }
}
