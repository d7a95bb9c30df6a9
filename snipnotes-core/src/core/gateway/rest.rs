//! PostgREST-style HTTP note table (the hosted backend).
//!
//! Every request carries the project API key both as `apikey` and as a bearer
//! token. Writes ask for `return=representation` so the server echoes the
//! authoritative row.

use super::Gateway;
use crate::{NewNote, NotePatch, NoteRecord, Result, SnipnotesError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RestGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestGateway {
    /// Creates a client for `<url>/rest/v1/<table>`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::Settings`] if `url` or `table` is empty, or
    /// [`SnipnotesError::Http`] if the HTTP client cannot be built.
    pub fn new(url: &str, api_key: &str, table: &str) -> Result<Self> {
        let url = url.trim_end_matches('/');
        if url.is_empty() || table.is_empty() {
            return Err(SnipnotesError::Settings(
                "REST gateway needs both a url and a table".to_string(),
            ));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{url}/rest/v1/{table}"),
            api_key: api_key.to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select_url(&self) -> String {
        format!("{}?select=*&order=created_at.asc", self.endpoint)
    }

    fn id_eq_url(&self, id: &str) -> String {
        format!("{}?id=eq.{}", self.endpoint, id)
    }

    fn id_in_url(&self, ids: &[String]) -> String {
        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{id}\"")).collect();
        format!("{}?id=in.({})", self.endpoint, quoted.join(","))
    }

    /// Reads the single row echoed by a write.
    fn single_row(response: Response, id_hint: Option<&str>) -> Result<NoteRecord> {
        let rows: Vec<NoteRecord> = response.json().map_err(write_error)?;
        match (rows.into_iter().next(), id_hint) {
            (Some(row), _) => Ok(row),
            (None, Some(id)) => Err(SnipnotesError::NoteNotFound(id.to_string())),
            (None, None) => Err(SnipnotesError::Write(
                "server returned no row for insert".to_string(),
            )),
        }
    }
}

impl Gateway for RestGateway {
    fn select_all_ordered(&self) -> Result<Vec<NoteRecord>> {
        let response = self
            .authorized(self.client.get(self.select_url()))
            .send()
            .map_err(|e| SnipnotesError::Connection(e.to_string()))?;
        let response = check_status(response, SnipnotesError::Connection)?;
        let rows: Vec<NoteRecord> = response
            .json()
            .map_err(|e| SnipnotesError::Connection(e.to_string()))?;
        log::debug!("selected {} note rows", rows.len());
        Ok(rows)
    }

    fn insert_one(&self, fields: &NewNote) -> Result<NoteRecord> {
        let response = self
            .authorized(self.client.post(&self.endpoint))
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .map_err(write_error)?;
        let row = Self::single_row(check_status(response, SnipnotesError::Write)?, None)?;
        log::debug!("inserted note {} under {:?}", row.id, row.parent_id);
        Ok(row)
    }

    fn update_one(&self, id: &str, patch: &NotePatch) -> Result<NoteRecord> {
        let response = self
            .authorized(self.client.patch(self.id_eq_url(id)))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .map_err(write_error)?;
        let row = Self::single_row(check_status(response, SnipnotesError::Write)?, Some(id))?;
        log::debug!("updated note {id}");
        Ok(row)
    }

    fn delete_many(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let response = self
            .authorized(self.client.delete(self.id_in_url(ids)))
            .send()
            .map_err(write_error)?;
        check_status(response, SnipnotesError::Write)?;
        log::debug!("deleted {} note rows", ids.len());
        Ok(())
    }
}

fn check_status(response: Response, classify: fn(String) -> SnipnotesError) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SnipnotesError::Connection(format!("{status}: {body}")));
    }
    Err(classify(format!("{status}: {body}")))
}

fn write_error(e: reqwest::Error) -> SnipnotesError {
    SnipnotesError::Write(e.to_string())
}
