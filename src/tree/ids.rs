//! Node id allocation.
//!
//! Allocation mutates the owner record in place, so a key only becomes
//! permanent when the transaction carrying the record commits. Aborted
//! transactions leave gaps, never duplicates.

use crate::error::ApiError;
use crate::store::OwnerRecord;
use crate::types::NodeKey;

/// Advance the counter and return the new key
pub fn next_key(record: &mut OwnerRecord) -> Result<NodeKey, ApiError> {
    let next = record
        .next_id
        .checked_add(1)
        .ok_or_else(|| ApiError::Internal(format!("node id space exhausted for {}", record.owner)))?;
    let key = NodeKey::from_id(next)
        .ok_or_else(|| ApiError::Internal(format!("allocator produced id {}", next)))?;
    record.next_id = next;
    Ok(key)
}
