//! Core library for Snipnotes — a hierarchical notebook of code snippets
//! backed by a remote note table.
//!
//! The primary entry point is [`NoteSession`], which holds the local flat
//! collection of notes for one application session. All mutations go through
//! `NoteSession` methods; the nested view is derived on demand with
//! [`NoteSession::tree`].
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use crate::core::{
    copy::{CopyFailurePolicy, CopyReport},
    delete::DeleteResult,
    error::{ErrorKind, LastError, Result, SnipnotesError},
    gateway::{open_gateway, Gateway, GatewayConfig, SqliteGateway},
    note::{Language, NewNote, NoteNode, NotePatch, NoteRecord},
    session::{NoteSession, SessionOptions, SessionStatus},
    settings::{load_settings_from, save_settings_to, settings_file_path, Settings},
    store::FlatStore,
    tree::{build_children, build_forest, Forest},
};

#[cfg(feature = "remote")]
#[doc(inline)]
pub use crate::core::gateway::RestGateway;
