//! Tree path parsing and resolution
//!
//! A wire path is a `/`-joined list of node keys, optionally with one leading
//! `/`. The empty path (or a lone `/`) addresses the root.

use crate::error::ApiError;
use crate::tree::node::Node;
use crate::types::NodeKey;
use std::fmt;

/// Methods allowed on the root of the tree resource.
pub const ROOT_ALLOW: &str = "GET, POST";

/// Deepest level a node may sit at; root children are at depth 1.
///
/// A node at depth d nests 2d + 1 JSON objects in the stored document, which
/// must stay under serde_json's recursion limit of 128 to be read back.
pub const MAX_DEPTH: usize = 48;

/// Root-relative sequence of node keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    keys: Vec<NodeKey>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: Vec<NodeKey>) -> Self {
        Self { keys }
    }

    /// Parse and validate a path string.
    ///
    /// Fails with `RootNotAllowed` for the root when `allow_root` is false and
    /// with `InvalidPath` when any segment is not a node key.
    pub fn parse(raw: &str, allow_root: bool) -> Result<Self, ApiError> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            if !allow_root {
                return Err(ApiError::RootNotAllowed { allow: ROOT_ALLOW });
            }
            return Ok(Self::root());
        }

        let keys = trimmed
            .split('/')
            .map(|segment| {
                segment
                    .parse::<NodeKey>()
                    .map_err(|_| ApiError::InvalidPath(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    /// Split into (parent path, last key); None for the root
    pub fn split_last(&self) -> Option<(TreePath, NodeKey)> {
        let (last, parent) = self.keys.split_last()?;
        Some((TreePath::from_keys(parent.to_vec()), *last))
    }

    pub fn child(&self, key: NodeKey) -> TreePath {
        let mut keys = self.keys.clone();
        keys.push(key);
        TreePath { keys }
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            return f.write_str("/");
        }
        for key in &self.keys {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

/// Walk from `root` along `path`; None as soon as a segment is missing
pub fn resolve<'a>(root: &'a Node, path: &TreePath) -> Option<&'a Node> {
    path.keys().iter().try_fold(root, |node, key| {
        node.as_folder().and_then(|folder| folder.entries.get(key))
    })
}

/// Mutable variant of [`resolve`]
pub fn resolve_mut<'a>(root: &'a mut Node, path: &TreePath) -> Option<&'a mut Node> {
    path.keys().iter().try_fold(root, |node, key| {
        node.as_folder_mut()
            .and_then(|folder| folder.entries.get_mut(key))
    })
}
