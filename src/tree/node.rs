//! Tree node types and their document shape.
//!
//! The persisted document is a nested mapping tagged by `@type`:
//! `{"@type":"folder","#text":..,"entry":{"f1":{..}}}` or
//! `{"@type":"file","#text":..,"@link":<blob id>}`.

use crate::types::{BlobId, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Folder node representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    #[serde(rename = "#text", default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(rename = "entry", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entries: BTreeMap<NodeKey, Node>,
}

/// File node representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    #[serde(rename = "#text", default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(rename = "@link")]
    pub link: BlobId,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "lowercase")]
pub enum Node {
    Folder(FolderNode),
    File(FileNode),
}

impl Node {
    pub fn folder(text: impl Into<String>) -> Self {
        Node::Folder(FolderNode {
            text: text.into(),
            entries: BTreeMap::new(),
        })
    }

    pub fn file(text: impl Into<String>, link: BlobId) -> Self {
        Node::File(FileNode {
            text: text.into(),
            link,
        })
    }

    pub fn text(&self) -> &str {
        match self {
            Node::Folder(folder) => &folder.text,
            Node::File(file) => &file.text,
        }
    }

    pub fn set_text(&mut self, text: String) {
        match self {
            Node::Folder(folder) => folder.text = text,
            Node::File(file) => file.text = text,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Folder(_) => "folder",
            Node::File(_) => "file",
        }
    }

    /// Largest node key anywhere below this node
    pub fn max_key(&self) -> Option<NodeKey> {
        let folder = self.as_folder()?;
        folder
            .entries
            .iter()
            .flat_map(|(key, child)| std::iter::once(*key).chain(child.max_key()))
            .max()
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Folder(FolderNode::default())
    }
}
