//! Result type for subtree removal.
//!
//! Deleting a note always removes its whole subtree. The closure is computed
//! breadth-first from the local collection and sent to the gateway as one
//! batch, so [`DeleteResult::affected_ids`] lists the target first, then its
//! children, then grandchildren.
//!
//! `DeleteResult` serializes in camelCase (`deletedCount`, `affectedIds`),
//! consistent with the other types handed to the presentation layer.
//!
//! ```rust
//! use snipnotes_core::DeleteResult;
//!
//! let result = DeleteResult {
//!     deleted_count: 2,
//!     affected_ids: vec!["a".to_string(), "b".to_string()],
//! };
//! let json = serde_json::to_string(&result).unwrap();
//! assert!(json.contains("deletedCount"));
//! assert!(json.contains("affectedIds"));
//! ```

use serde::{Deserialize, Serialize};

/// The outcome of a delete performed through a
/// [`NoteSession`](super::session::NoteSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// How many notes were removed from the local collection.
    pub deleted_count: usize,

    /// Every id sent to the gateway, target first, in breadth-first order.
    pub affected_ids: Vec<String>,
}
