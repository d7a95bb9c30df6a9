//! The persistence boundary: a remote table of note rows.
//!
//! The session never talks to storage directly. It only needs the four
//! operations of [`Gateway`]; every implementation assigns `id` and
//! `created_at` itself and returns the authoritative row after each write.

pub mod sqlite;

#[cfg(feature = "remote")]
pub mod rest;

use crate::{NewNote, NotePatch, NoteRecord, Result, Settings};

#[doc(inline)]
pub use sqlite::SqliteGateway;

#[cfg(feature = "remote")]
#[doc(inline)]
pub use rest::RestGateway;

/// Row CRUD over the `notes` table.
///
/// Implementations classify their failures: reads fail with
/// [`Connection`](crate::SnipnotesError::Connection), writes with
/// [`Write`](crate::SnipnotesError::Write), and an update of a missing row with
/// [`NoteNotFound`](crate::SnipnotesError::NoteNotFound).
pub trait Gateway: Send + Sync {
    /// Every row, ordered by `created_at` ascending.
    fn select_all_ordered(&self) -> Result<Vec<NoteRecord>>;

    /// Inserts one row and returns it with its assigned `id` and `created_at`.
    fn insert_one(&self, fields: &NewNote) -> Result<NoteRecord>;

    /// Writes only the fields present in `patch` and returns the updated row.
    fn update_one(&self, id: &str, patch: &NotePatch) -> Result<NoteRecord>;

    /// Deletes every row whose id is in `ids`, all or nothing.
    fn delete_many(&self, ids: &[String]) -> Result<()>;
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn select_all_ordered(&self) -> Result<Vec<NoteRecord>> {
        (**self).select_all_ordered()
    }

    fn insert_one(&self, fields: &NewNote) -> Result<NoteRecord> {
        (**self).insert_one(fields)
    }

    fn update_one(&self, id: &str, patch: &NotePatch) -> Result<NoteRecord> {
        (**self).update_one(id, patch)
    }

    fn delete_many(&self, ids: &[String]) -> Result<()> {
        (**self).delete_many(ids)
    }
}

/// Which gateway to open, as stored in the settings file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GatewayConfig {
    /// A local SQLite file with the same table layout.
    Sqlite { path: std::path::PathBuf },
    /// A PostgREST-style table endpoint.
    #[serde(rename_all = "camelCase")]
    Rest {
        url: String,
        api_key: String,
        #[serde(default = "default_table")]
        table: String,
    },
}

fn default_table() -> String {
    "notes".to_string()
}

/// Opens the gateway named by `settings`.
///
/// # Errors
///
/// Returns [`crate::SnipnotesError::Connection`] if the store cannot be
/// opened, or [`crate::SnipnotesError::Settings`] if the configured gateway is
/// not compiled in.
pub fn open_gateway(settings: &Settings) -> Result<Box<dyn Gateway>> {
    match &settings.gateway {
        GatewayConfig::Sqlite { path } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Box::new(SqliteGateway::open(path)?))
        }
        #[cfg(feature = "remote")]
        GatewayConfig::Rest {
            url,
            api_key,
            table,
        } => Ok(Box::new(RestGateway::new(url, api_key, table)?)),
        #[cfg(not(feature = "remote"))]
        GatewayConfig::Rest { .. } => Err(crate::SnipnotesError::Settings(
            "REST gateway requires the `remote` feature".to_string(),
        )),
    }
}
