//! Owner tree documents
//!
//! Node model, path resolution, id allocation and the mutation operations
//! that keep the tree's structural invariants.

pub mod ids;
pub mod node;
pub mod path;
pub mod store;

pub use node::{FileNode, FolderNode, Node};
pub use path::{resolve, TreePath, MAX_DEPTH};
pub use store::{create_entry, delete_entry, update_text, CreatedEntry};
