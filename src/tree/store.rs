//! Tree mutations
//!
//! Each operation edits the owner's whole tree document in memory. The
//! caller persists the record (and any staged blob writes) as one unit.

use crate::blob::BlobSession;
use crate::error::ApiError;
use crate::store::OwnerRecord;
use crate::tree::ids;
use crate::tree::node::Node;
use crate::tree::path::{self, TreePath};
use crate::types::NodeKey;
use serde::Serialize;
use tracing::warn;

/// Key and value of a freshly inserted entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEntry {
    pub key: NodeKey,
    pub value: Node,
}

/// Insert `value` under the folder at `parent`, assigning it a fresh key.
pub fn create_entry(
    record: &mut OwnerRecord,
    parent: &TreePath,
    value: Node,
) -> Result<CreatedEntry, ApiError> {
    match path::resolve(&record.tree, parent) {
        None => return Err(ApiError::PathNotFound(parent.to_string())),
        Some(Node::File(_)) => return Err(ApiError::NotAFolder(parent.to_string())),
        Some(Node::Folder(_)) => {}
    }
    if parent.keys().len() >= path::MAX_DEPTH {
        return Err(ApiError::DepthExceeded {
            parent: parent.to_string(),
            max: path::MAX_DEPTH,
        });
    }

    let key = ids::next_key(record)?;
    let folder = path::resolve_mut(&mut record.tree, parent)
        .and_then(Node::as_folder_mut)
        .ok_or_else(|| ApiError::Internal(format!("parent {} vanished during insert", parent)))?;
    if folder.entries.contains_key(&key) {
        return Err(ApiError::Internal(format!(
            "allocated key {} already present under {}",
            key, parent
        )));
    }
    folder.entries.insert(key, value.clone());
    Ok(CreatedEntry { key, value })
}

/// Overwrite the text of the node at `path` when `text` is given.
///
/// Returns whether the record changed.
pub fn update_text(
    record: &mut OwnerRecord,
    path: &TreePath,
    text: Option<String>,
) -> Result<bool, ApiError> {
    let node = path::resolve_mut(&mut record.tree, path)
        .ok_or_else(|| ApiError::PathNotFound(path.to_string()))?;
    match text {
        Some(text) => {
            node.set_text(text);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Remove the node at `path`.
///
/// Non-empty folders are refused. A file's linked blob is deleted with it;
/// a blob that is already gone is tolerated.
pub fn delete_entry(
    record: &mut OwnerRecord,
    blobs: &mut BlobSession<'_>,
    path: &TreePath,
) -> Result<Node, ApiError> {
    let (parent, key) = path
        .split_last()
        .ok_or(ApiError::RootNotAllowed { allow: path::ROOT_ALLOW })?;
    let folder = path::resolve_mut(&mut record.tree, &parent)
        .and_then(Node::as_folder_mut)
        .ok_or_else(|| ApiError::PathNotFound(path.to_string()))?;

    match folder.entries.get(&key) {
        None => return Err(ApiError::PathNotFound(path.to_string())),
        Some(Node::Folder(target)) if !target.entries.is_empty() => {
            return Err(ApiError::FolderNotEmpty(path.to_string()));
        }
        Some(Node::File(file)) => {
            if !blobs.delete(file.link)? {
                warn!(
                    owner = %blobs.owner(),
                    path = %path,
                    blob = %file.link,
                    "Linked blob already missing during file delete"
                );
            }
        }
        Some(Node::Folder(_)) => {}
    }

    folder
        .entries
        .remove(&key)
        .ok_or_else(|| ApiError::PathNotFound(path.to_string()))
}
