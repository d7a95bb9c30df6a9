//! Internal domain modules for the Snipnotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod copy;
pub mod delete;
pub mod error;
pub mod gateway;
pub mod note;
pub mod session;
pub mod settings;
pub mod store;
pub mod tree;

#[doc(inline)]
pub use copy::{CopyFailurePolicy, CopyReport};
#[doc(inline)]
pub use delete::DeleteResult;
#[doc(inline)]
pub use error::{ErrorKind, LastError, Result, SnipnotesError};
#[doc(inline)]
pub use gateway::{open_gateway, Gateway, GatewayConfig, SqliteGateway};
#[doc(inline)]
pub use note::{Language, NewNote, NoteNode, NotePatch, NoteRecord};
#[doc(inline)]
pub use session::{NoteSession, SessionOptions, SessionStatus};
#[doc(inline)]
pub use settings::Settings;
#[doc(inline)]
pub use store::FlatStore;
#[doc(inline)]
pub use tree::{build_children, build_forest, Forest};
