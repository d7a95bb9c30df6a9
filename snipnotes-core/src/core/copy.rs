//! Failure policy and result type for subtree copies.
//!
//! A copy inserts one row per note, parent before children, because each
//! child must reference the id the gateway assigned to its copied parent.
//! There is no transaction spanning those inserts, so a failure part way
//! through leaves earlier copies behind unless
//! [`CopyFailurePolicy::Compensate`] is selected.

use serde::{Deserialize, Serialize};

/// What to do when an insert fails after part of the subtree was copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CopyFailurePolicy {
    /// Keep the copies that were inserted, merge them locally, skip the
    /// failed note and its descendants, and carry on with its siblings.
    #[default]
    KeepPartial,

    /// Delete every copy inserted so far and leave local state unchanged.
    Compensate,
}

/// The outcome of a copy performed through a
/// [`NoteSession`](super::session::NoteSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyReport {
    /// Id of the copied root, a sibling of the source note.
    pub root_id: String,

    /// Ids of every new note, in insertion (pre-order) order.
    pub created_ids: Vec<String>,

    /// Source ids whose copy failed; their descendants were not copied either.
    pub skipped: Vec<String>,
}

impl CopyReport {
    /// `true` when every note in the source subtree was copied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_serializes_pascal_case() {
        let json = serde_json::to_string(&CopyFailurePolicy::Compensate).unwrap();
        assert_eq!(json, r#""Compensate""#);
        assert_eq!(CopyFailurePolicy::default(), CopyFailurePolicy::KeepPartial);
    }

    #[test]
    fn test_report_completeness() {
        let mut report = CopyReport {
            root_id: "r".to_string(),
            created_ids: vec!["r".to_string()],
            skipped: vec![],
        };
        assert!(report.is_complete());
        report.skipped.push("x".to_string());
        assert!(!report.is_complete());
    }
}
