//! Treedrive: per-owner folder/file trees
//!
//! Each owner holds one tree document of folders and files plus the content
//! blobs its files link to. Every edit runs as an atomic, retried per-owner
//! transaction that keeps the tree's structural invariants.

pub mod api;
pub mod blob;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use api::{DriveApi, OwnerScope};
pub use error::{ApiError, ErrorKind, StorageError};
pub use handler::{DriveHandler, Method, Request, Resource, Response};
pub use types::{BlobId, NodeKey, OwnerId};
