//! Note records as stored in the `notes` table, and the nested view derived from them.

use crate::{Result, SnipnotesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Syntax mode of a snippet. The set is closed; unknown values are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Typescript,
    Css,
    Json,
    /// HTML and XML.
    Markup,
    Bash,
}

impl Language {
    /// Every supported language, in menu order.
    pub const ALL: [Language; 6] = [
        Language::Javascript,
        Language::Typescript,
        Language::Css,
        Language::Json,
        Language::Markup,
        Language::Bash,
    ];

    /// The value stored in the `language` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Css => "css",
            Self::Json => "json",
            Self::Markup => "markup",
            Self::Bash => "bash",
        }
    }

    /// Human-readable label for pickers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Javascript => "JavaScript",
            Self::Typescript => "TypeScript",
            Self::Css => "CSS",
            Self::Json => "JSON",
            Self::Markup => "HTML/XML",
            Self::Bash => "Bash/Shell",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SnipnotesError;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| SnipnotesError::ValidationFailed(format!("Unsupported language: {s}")))
    }
}

/// A single persisted note. `id` and `created_at` are assigned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub code: String,
    pub comment: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

/// Insert payload: every column except the gateway-assigned ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    pub parent_id: Option<String>,
    pub title: String,
    pub code: String,
    pub comment: String,
    pub language: Language,
}

impl NewNote {
    /// A fresh note with empty code and comment under `parent_id`.
    pub fn blank(parent_id: Option<String>, title: impl Into<String>, language: Language) -> Self {
        Self {
            parent_id,
            title: title.into(),
            code: String::new(),
            comment: String::new(),
            language,
        }
    }

    /// Copies the content of `source` under `parent_id`, keeping its title.
    pub fn copy_of(source: &NoteRecord, parent_id: Option<String>) -> Self {
        Self {
            parent_id,
            title: source.title.clone(),
            code: source.code.clone(),
            comment: source.comment.clone(),
            language: source.language,
        }
    }
}

/// A field-level update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.code.is_none()
            && self.comment.is_none()
            && self.language.is_none()
    }
}

/// A note together with its children, built by the tree builder. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteNode {
    #[serde(flatten)]
    pub note: NoteRecord,
    pub children: Vec<NoteNode>,
}

impl NoteNode {
    /// Number of transitive descendants, excluding this node.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Depth-first search for `id` within this subtree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NoteNode> {
        if self.note.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}
