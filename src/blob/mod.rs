//! File content blobs
//!
//! Blobs belong to exactly one owner and are only reachable through that
//! owner. Reads go straight to the repository; writes are staged in a
//! `BlobSession` and land with the owner's next commit.

use crate::error::ApiError;
use crate::store::{BlobWrites, OwnerRepository};
use crate::types::{BlobId, OwnerId};
use std::sync::Arc;

/// Read access to committed blobs
pub struct BlobStore {
    repository: Arc<dyn OwnerRepository>,
}

impl BlobStore {
    pub fn new(repository: Arc<dyn OwnerRepository>) -> Self {
        Self { repository }
    }

    /// Committed content of a blob; `BlobNotFound` if absent or held by another owner
    pub fn read(&self, owner: &OwnerId, id: BlobId) -> Result<String, ApiError> {
        self.repository
            .read_blob(owner, id)?
            .ok_or(ApiError::BlobNotFound(id.0))
    }

    /// Open a staging session for one owner's transaction
    pub fn session(&self, owner: &OwnerId) -> BlobSession<'_> {
        BlobSession::new(self.repository.as_ref(), owner.clone())
    }
}

/// Blob operations staged inside one owner transaction
pub struct BlobSession<'a> {
    repository: &'a dyn OwnerRepository,
    owner: OwnerId,
    writes: BlobWrites,
}

impl<'a> BlobSession<'a> {
    pub fn new(repository: &'a dyn OwnerRepository, owner: OwnerId) -> Self {
        Self {
            repository,
            owner,
            writes: BlobWrites::new(),
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn create(&mut self, content: String) -> Result<BlobId, ApiError> {
        let id = self.repository.allocate_blob_id()?;
        self.writes.insert(id, Some(content));
        Ok(id)
    }

    pub fn exists(&self, id: BlobId) -> Result<bool, ApiError> {
        Ok(self.lookup(id)?.is_some())
    }

    pub fn update(&mut self, id: BlobId, content: String) -> Result<(), ApiError> {
        if !self.exists(id)? {
            return Err(ApiError::BlobNotFound(id.0));
        }
        self.writes.insert(id, Some(content));
        Ok(())
    }

    /// Remove a blob. Absent blobs are not an error; returns whether one existed.
    pub fn delete(&mut self, id: BlobId) -> Result<bool, ApiError> {
        let existed = self.exists(id)?;
        self.writes.insert(id, None);
        Ok(existed)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> BlobWrites {
        self.writes
    }

    /// Content as this transaction sees it, staged writes included
    fn lookup(&self, id: BlobId) -> Result<Option<String>, ApiError> {
        match self.writes.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.repository.read_blob(&self.owner, id)?),
        }
    }
}
