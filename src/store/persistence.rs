//! sled-backed owner repository
//!
//! Two trees share one database: `owners` maps an owner id to its encoded
//! record and `blobs` maps (owner, blob id) to content. Commits span both
//! trees in one sled transaction.

use super::{CommitOutcome, OwnerCommit, OwnerRecord, OwnerRepository};
use crate::error::StorageError;
use crate::types::{BlobId, OwnerId};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;
use tracing::{debug, info};

const OWNERS_TREE: &str = "owners";
const BLOBS_TREE: &str = "blobs";

pub struct SledOwnerRepository {
    db: sled::Db,
    owners: sled::Tree,
    blobs: sled::Tree,
}

impl SledOwnerRepository {
    /// Open (or create) a database at `path`
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let owners = db.open_tree(OWNERS_TREE)?;
        let blobs = db.open_tree(BLOBS_TREE)?;
        Ok(Self { db, owners, blobs })
    }

    /// Blob ids currently stored for an owner
    pub fn list_blob_ids(&self, owner: &OwnerId) -> Result<Vec<BlobId>, StorageError> {
        let prefix = owner_prefix(owner);
        let mut ids = Vec::new();
        for entry in self.blobs.scan_prefix(&prefix) {
            let (key, _) = entry?;
            let suffix = &key[prefix.len()..];
            let bytes: [u8; 8] = suffix.try_into().map_err(|_| StorageError::CorruptRecord {
                owner: owner.to_string(),
                reason: format!("malformed blob key of length {}", key.len()),
            })?;
            ids.push(BlobId(u64::from_be_bytes(bytes)));
        }
        Ok(ids)
    }
}

fn owner_key(owner: &OwnerId) -> Vec<u8> {
    owner.as_str().as_bytes().to_vec()
}

/// Length-prefixed owner id, so no owner's prefix is another owner's prefix
fn owner_prefix(owner: &OwnerId) -> Vec<u8> {
    let id = owner.as_str().as_bytes();
    let mut key = Vec::with_capacity(4 + id.len() + 8);
    key.extend_from_slice(&(id.len() as u32).to_be_bytes());
    key.extend_from_slice(id);
    key
}

fn blob_key(owner: &OwnerId, id: BlobId) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(&id.0.to_be_bytes());
    key
}

impl OwnerRepository for SledOwnerRepository {
    fn load(&self, owner: &OwnerId) -> Result<Option<OwnerRecord>, StorageError> {
        match self.owners.get(owner_key(owner))? {
            Some(bytes) => Ok(Some(OwnerRecord::decode(owner, &bytes)?)),
            None => Ok(None),
        }
    }

    fn get_or_create(&self, owner: &OwnerId) -> Result<OwnerRecord, StorageError> {
        if let Some(record) = self.load(owner)? {
            return Ok(record);
        }

        let fresh = OwnerRecord::new(owner.clone());
        let swapped = self.owners.compare_and_swap(
            owner_key(owner),
            None as Option<&[u8]>,
            Some(fresh.encode()?),
        )?;
        match swapped {
            Ok(()) => {
                info!(owner = %owner, "Created owner record");
                Ok(fresh)
            }
            // Lost the race to a concurrent first interaction.
            Err(sled::CompareAndSwapError {
                current: Some(bytes),
                ..
            }) => OwnerRecord::decode(owner, &bytes),
            Err(_) => Err(StorageError::CorruptRecord {
                owner: owner.to_string(),
                reason: "record vanished during creation".to_string(),
            }),
        }
    }

    fn read_blob(&self, owner: &OwnerId, id: BlobId) -> Result<Option<String>, StorageError> {
        match self.blobs.get(blob_key(owner, id))? {
            Some(bytes) => {
                let content = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    StorageError::CorruptRecord {
                        owner: owner.to_string(),
                        reason: format!("blob {} is not UTF-8: {}", id, e),
                    }
                })?;
                Ok(Some(content))
            }
            None => Ok(None),
        }
    }

    fn allocate_blob_id(&self) -> Result<BlobId, StorageError> {
        Ok(BlobId(self.db.generate_id()? + 1))
    }

    fn commit(&self, change: &OwnerCommit) -> Result<CommitOutcome, StorageError> {
        let owner = &change.record.owner;
        let key = owner_key(owner);
        let record_bytes = change.record.encode()?;
        let blob_writes: Vec<(Vec<u8>, Option<&str>)> = change
            .blob_writes
            .iter()
            .map(|(id, content)| (blob_key(owner, *id), content.as_deref()))
            .collect();

        let result = (&self.owners, &self.blobs).transaction(|(owners, blobs)| {
            let stored_revision = match owners.get(&key)? {
                Some(bytes) => Some(
                    OwnerRecord::decode_revision(&bytes)
                        .map_err(ConflictableTransactionError::Abort)?,
                ),
                None => None,
            };
            if stored_revision != change.expected_revision {
                return Ok(CommitOutcome::Stale);
            }

            for (blob_key, content) in &blob_writes {
                match content {
                    Some(content) => {
                        blobs.insert(blob_key.as_slice(), content.as_bytes())?;
                    }
                    None => {
                        blobs.remove(blob_key.as_slice())?;
                    }
                }
            }
            owners.insert(key.as_slice(), record_bytes.as_slice())?;
            Ok(CommitOutcome::Committed)
        });

        let outcome = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StorageError::Sled(e),
        })?;
        debug!(
            owner = %owner,
            revision = change.record.revision,
            blob_writes = blob_writes.len(),
            outcome = ?outcome,
            "Commit attempt finished"
        );
        Ok(outcome)
    }
}
