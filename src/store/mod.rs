//! Owner Record Store
//!
//! Per-owner state (the tree document and its id counter) plus the owner's
//! blobs, fetched and committed through the `OwnerRepository` port.

pub mod persistence;

use crate::error::StorageError;
use crate::tree::node::Node;
use crate::types::{BlobId, OwnerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OwnerRecord: one owner's tree document and node id counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    pub owner: OwnerId,
    pub tree: Node,
    /// Last issued node id; 0 before the first allocation
    pub next_id: u64,
    /// Commit counter used to detect stale snapshots
    pub revision: u64,
    /// Unix milliseconds of the last commit
    pub updated_at: i64,
}

impl OwnerRecord {
    /// Fresh record: empty root folder, nothing allocated yet
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            tree: Node::default(),
            next_id: 0,
            revision: 0,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// JSON text of the tree document
    pub fn tree_document(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(&self.tree)?)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, StorageError> {
        let stored = StoredOwnerRecord {
            tree: self.tree_document()?,
            next_id: self.next_id,
            revision: self.revision,
            updated_at: self.updated_at,
        };
        Ok(bincode::serialize(&stored)?)
    }

    /// Revision stored in an encoded record, without parsing the tree
    pub(crate) fn decode_revision(bytes: &[u8]) -> Result<u64, StorageError> {
        let stored: StoredOwnerRecord = bincode::deserialize(bytes)?;
        Ok(stored.revision)
    }

    pub(crate) fn decode(owner: &OwnerId, bytes: &[u8]) -> Result<Self, StorageError> {
        let stored: StoredOwnerRecord = bincode::deserialize(bytes)?;
        let tree: Node = serde_json::from_str(&stored.tree)?;
        let corrupt = |reason: String| StorageError::CorruptRecord {
            owner: owner.to_string(),
            reason,
        };
        if tree.as_folder().is_none() {
            return Err(corrupt("root node is not a folder".to_string()));
        }
        if let Some(max) = tree.max_key() {
            if max.id() > stored.next_id {
                return Err(corrupt(format!(
                    "key {} exceeds id counter {}",
                    max, stored.next_id
                )));
            }
        }
        Ok(Self {
            owner: owner.clone(),
            tree,
            next_id: stored.next_id,
            revision: stored.revision,
            updated_at: stored.updated_at,
        })
    }
}

/// On-disk envelope; the tree stays a JSON text so it can be served verbatim
#[derive(Debug, Serialize, Deserialize)]
struct StoredOwnerRecord {
    tree: String,
    next_id: u64,
    revision: u64,
    updated_at: i64,
}

/// Staged blob writes: Some(content) upserts, None removes
pub type BlobWrites = BTreeMap<BlobId, Option<String>>;

/// A change set to commit for one owner
#[derive(Debug, Clone)]
pub struct OwnerCommit {
    /// Revision the change was computed against; None if the record did not exist
    pub expected_revision: Option<u64>,
    /// Record to store; its revision is already advanced
    pub record: OwnerRecord,
    pub blob_writes: BlobWrites,
}

/// Result of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Another transaction committed for this owner since the snapshot was taken
    Stale,
}

/// Owner repository interface
pub trait OwnerRepository: Send + Sync {
    /// Load the record for an owner, if one exists.
    fn load(&self, owner: &OwnerId) -> Result<Option<OwnerRecord>, StorageError>;

    /// Load the record, inserting a fresh one on first interaction.
    fn get_or_create(&self, owner: &OwnerId) -> Result<OwnerRecord, StorageError>;

    /// Read one blob scoped to its owner.
    fn read_blob(&self, owner: &OwnerId, id: BlobId) -> Result<Option<String>, StorageError>;

    /// Issue a fresh blob id.
    fn allocate_blob_id(&self) -> Result<BlobId, StorageError>;

    /// Apply the record and blob writes atomically if the stored revision
    /// still equals `expected_revision`.
    fn commit(&self, change: &OwnerCommit) -> Result<CommitOutcome, StorageError>;
}
