//! Core identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OwnerId: opaque principal identifier handed over by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// BlobId: identifier of a stored file content blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub u64);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NodeKey: `f<n>` key of a tree node, n >= 1, no leading zeros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeKey(u64);

impl NodeKey {
    pub fn from_id(id: u64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Error returned when a string is not a well-formed node key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNodeKey(pub String);

impl fmt::Display for InvalidNodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid node key {:?}", self.0)
    }
}

impl std::error::Error for InvalidNodeKey {}

impl FromStr for NodeKey {
    type Err = InvalidNodeKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidNodeKey(s.to_string());
        let digits = s.strip_prefix('f').ok_or_else(invalid)?;
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        digits.parse::<u64>().map(NodeKey).map_err(|_| invalid())
    }
}

impl TryFrom<String> for NodeKey {
    type Error = InvalidNodeKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeKey> for String {
    fn from(key: NodeKey) -> Self {
        key.to_string()
    }
}
