//! Drive API
//!
//! Entry point for every tree and file operation. Callers first obtain an
//! `OwnerScope` from [`DriveApi::authorize`]; all operations require one, so
//! no store is reachable without the identity check.

use crate::blob::BlobStore;
use crate::concurrency::{TransactionConfig, TransactionCoordinator};
use crate::config::DriveConfig;
use crate::error::{ApiError, StorageError};
use crate::store::persistence::SledOwnerRepository;
use crate::store::{OwnerRecord, OwnerRepository};
use crate::tree::{self, CreatedEntry, Node, TreePath};
use crate::types::{BlobId, OwnerId};
use std::sync::Arc;
use tracing::info;

/// Proof that the caller may act on this owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerScope {
    owner: OwnerId,
}

impl OwnerScope {
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

pub struct DriveApi {
    repository: Arc<dyn OwnerRepository>,
    blobs: BlobStore,
    coordinator: TransactionCoordinator,
}

impl DriveApi {
    pub fn new(repository: Arc<dyn OwnerRepository>, transactions: TransactionConfig) -> Self {
        Self {
            blobs: BlobStore::new(repository.clone()),
            coordinator: TransactionCoordinator::new(repository.clone(), transactions),
            repository,
        }
    }

    /// Open the sled store named by the configuration
    pub fn open(config: &DriveConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_path()?;
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let repository = Arc::new(SledOwnerRepository::new(&store_path)?);
        info!(path = %store_path.display(), "Opened tree store");
        Ok(Self::new(repository, config.transactions.clone()))
    }

    /// The single identity guard: the caller must be the owner.
    pub fn authorize(&self, caller: &OwnerId, owner: &str) -> Result<OwnerScope, ApiError> {
        if caller.as_str() != owner {
            return Err(ApiError::Forbidden {
                caller: caller.to_string(),
                owner: owner.to_string(),
            });
        }
        Ok(OwnerScope {
            owner: caller.clone(),
        })
    }

    /// Ensure the caller's record exists and return it.
    pub fn open_session(&self, caller: &OwnerId) -> Result<OwnerRecord, ApiError> {
        Ok(self.repository.get_or_create(caller)?)
    }

    pub fn fetch_tree(&self, scope: &OwnerScope) -> Result<Node, ApiError> {
        Ok(self.repository.get_or_create(&scope.owner)?.tree)
    }

    /// Tree document as JSON text
    pub fn fetch_tree_document(&self, scope: &OwnerScope) -> Result<String, ApiError> {
        let record = self.repository.get_or_create(&scope.owner)?;
        Ok(record.tree_document()?)
    }

    pub fn create_folder(
        &self,
        scope: &OwnerScope,
        parent: &str,
        text: Option<String>,
    ) -> Result<CreatedEntry, ApiError> {
        let parent = TreePath::parse(parent, true)?;
        let value = Node::folder(text.unwrap_or_default());
        let created = self.coordinator.run_atomic(&scope.owner, |txn| {
            tree::create_entry(txn.record_mut(), &parent, value.clone())
        })?;
        info!(owner = %scope.owner, parent = %parent, key = %created.key, "Created folder");
        Ok(created)
    }

    /// Create a content blob and the file entry linking it, in one transaction.
    pub fn create_file(
        &self,
        scope: &OwnerScope,
        parent: &str,
        content: String,
        text: Option<String>,
    ) -> Result<CreatedEntry, ApiError> {
        let parent = TreePath::parse(parent, true)?;
        let text = text.unwrap_or_default();
        let created = self.coordinator.run_atomic(&scope.owner, |txn| {
            let (record, blobs) = txn.parts_mut();
            let link = blobs.create(content.clone())?;
            tree::create_entry(record, &parent, Node::file(text.clone(), link))
        })?;
        info!(owner = %scope.owner, parent = %parent, key = %created.key, "Created file");
        Ok(created)
    }

    pub fn update_text(
        &self,
        scope: &OwnerScope,
        path: &str,
        text: Option<String>,
    ) -> Result<(), ApiError> {
        let path = TreePath::parse(path, false)?;
        let changed = self.coordinator.run_atomic(&scope.owner, |txn| {
            tree::update_text(txn.record_mut(), &path, text.clone())
        })?;
        if changed {
            info!(owner = %scope.owner, path = %path, "Updated entry text");
        }
        Ok(())
    }

    pub fn delete_entry(&self, scope: &OwnerScope, path: &str) -> Result<(), ApiError> {
        let path = TreePath::parse(path, false)?;
        let removed = self.coordinator.run_atomic(&scope.owner, |txn| {
            let (record, blobs) = txn.parts_mut();
            tree::delete_entry(record, blobs, &path)
        })?;
        info!(owner = %scope.owner, path = %path, kind = removed.kind_name(), "Deleted entry");
        Ok(())
    }

    pub fn fetch_file(&self, scope: &OwnerScope, id: BlobId) -> Result<String, ApiError> {
        self.blobs.read(&scope.owner, id)
    }

    pub fn update_file(
        &self,
        scope: &OwnerScope,
        id: BlobId,
        content: String,
    ) -> Result<(), ApiError> {
        self.coordinator.run_atomic(&scope.owner, |txn| {
            txn.blobs_mut().update(id, content.clone())
        })?;
        info!(owner = %scope.owner, blob = %id, "Updated file content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn create_test_api() -> (DriveApi, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DriveConfig {
            storage: crate::config::StorageConfig {
                path: Some(temp_dir.path().join("store")),
            },
            ..DriveConfig::default()
        };
        (DriveApi::open(&config).unwrap(), temp_dir)
    }

    #[test]
    fn test_authorize_requires_matching_identity() {
        let (api, _temp_dir) = create_test_api();
        let caller = OwnerId::new("alice");
        assert!(api.authorize(&caller, "alice").is_ok());
        let err = api.authorize(&caller, "bob").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_open_session_is_lazy_and_stable() {
        let (api, _temp_dir) = create_test_api();
        let caller = OwnerId::new("alice");
        let record = api.open_session(&caller).unwrap();
        assert_eq!(record.next_id, 0);
        assert_eq!(api.open_session(&caller).unwrap(), record);
    }

    #[test]
    fn test_first_fetch_returns_default_root() {
        let (api, _temp_dir) = create_test_api();
        let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
        assert_eq!(api.fetch_tree_document(&scope).unwrap(), r#"{"@type":"folder"}"#);
    }

    #[test]
    fn test_create_file_then_update_content() {
        let (api, _temp_dir) = create_test_api();
        let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
        let created = api
            .create_file(&scope, "", "hello".to_string(), Some("notes".to_string()))
            .unwrap();
        let link = match created.value {
            Node::File(file) => file.link,
            other => panic!("expected file, got {:?}", other),
        };

        assert_eq!(api.fetch_file(&scope, link).unwrap(), "hello");
        api.update_file(&scope, link, "bye".to_string()).unwrap();
        assert_eq!(api.fetch_file(&scope, link).unwrap(), "bye");

        let err = api
            .update_file(&scope, BlobId(link.0 + 1000), "x".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_failed_file_create_leaves_no_blob() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Arc::new(SledOwnerRepository::new(&temp_dir.path().join("store")).unwrap());
        let api = DriveApi::new(repo.clone(), TransactionConfig::default());
        let owner = OwnerId::new("alice");
        let scope = api.authorize(&owner, "alice").unwrap();

        let err = api
            .create_file(&scope, "f7", "orphan?".to_string(), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(repo.list_blob_ids(&owner).unwrap().is_empty());
    }

    #[test]
    fn test_update_text_without_field_is_noop() {
        let (api, _temp_dir) = create_test_api();
        let scope = api.authorize(&OwnerId::new("alice"), "alice").unwrap();
        api.create_folder(&scope, "", Some("Docs".to_string())).unwrap();
        let before = api.open_session(scope.owner()).unwrap();

        api.update_text(&scope, "f1", None).unwrap();
        assert_eq!(api.open_session(scope.owner()).unwrap(), before);

        let err = api.update_text(&scope, "", Some("root".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
    }
}
