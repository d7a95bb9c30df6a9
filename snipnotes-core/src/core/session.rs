//! High-level note operations over a [`Gateway`].
//!
//! A [`NoteSession`] owns the local [`FlatStore`] and coordinates every
//! mutation as remote write first, local apply second. The store is only
//! changed with rows the gateway returned, so it never holds anything that was
//! not persisted. Gateway calls run without holding the state lock; several
//! mutations may be in flight at once and the last response to arrive wins at
//! the merge step.
//!
//! Failures are returned to the caller and also recorded as the session's
//! [`LastError`], which is what the presentation layer polls.

use crate::{
    build_forest, CopyFailurePolicy, CopyReport, DeleteResult, FlatStore, Forest, Gateway,
    Language, LastError, NewNote, NotePatch, NoteRecord, Result, Settings, SnipnotesError,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Defaults applied by mutations, usually taken from [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub default_title: String,
    pub default_language: Language,
    pub copy_suffix: String,
    pub copy_failure: CopyFailurePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SessionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            default_title: settings.default_title.clone(),
            default_language: settings.default_language,
            copy_suffix: settings.copy_suffix.clone(),
            copy_failure: settings.copy_failure,
        }
    }
}

/// Snapshot of the load and error flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// A load is in flight.
    pub loading: bool,
    /// At least one load has succeeded.
    pub loaded: bool,
    pub last_error: Option<LastError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingWrite {
    Update,
    Delete,
}

#[derive(Default)]
struct State {
    store: FlatStore,
    status: SessionStatus,
    selected: Option<String>,
    in_flight: HashMap<String, PendingWrite>,
}

/// One application session over a note table.
///
/// Construct once, call [`load`](Self::load), then share by reference (or
/// `Arc`) with whatever renders the tree.
pub struct NoteSession<G: Gateway> {
    gateway: G,
    options: SessionOptions,
    state: Mutex<State>,
}

/// Marks ids as being written until dropped.
struct InFlightGuard<'a> {
    state: &'a Mutex<State>,
    ids: Vec<String>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for id in &self.ids {
            state.in_flight.remove(id);
        }
    }
}

impl<G: Gateway> NoteSession<G> {
    /// Creates an empty session with default options. Nothing is fetched yet.
    pub fn new(gateway: G) -> Self {
        Self::with_options(gateway, SessionOptions::default())
    }

    pub fn with_options(gateway: G, options: SessionOptions) -> Self {
        Self {
            gateway,
            options,
            state: Mutex::new(State::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `err` as the last error and hands it back.
    fn record(&self, action: &str, err: SnipnotesError) -> SnipnotesError {
        log::warn!("{action} failed: {err}");
        self.lock().status.last_error = Some(LastError::from(&err));
        err
    }

    /// Marks `ids` as in flight, or fails if any of them already is.
    fn claim(&self, ids: &[String], kind: PendingWrite) -> Result<InFlightGuard<'_>> {
        let mut state = self.lock();
        if let Some(busy) = ids.iter().find(|id| state.in_flight.contains_key(*id)) {
            return Err(SnipnotesError::InFlight(busy.clone()));
        }
        for id in ids {
            state.in_flight.insert(id.clone(), kind);
        }
        Ok(InFlightGuard {
            state: &self.state,
            ids: ids.to_vec(),
        })
    }

    // ── Loading ─────────────────────────────────────────────────

    /// Fetches every row and replaces the local collection wholesale.
    ///
    /// Returns the number of notes loaded. On failure the previous collection
    /// is kept untouched and a connection error is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::Connection`] (or whatever the gateway
    /// reported) if the rows could not be read.
    pub fn load(&self) -> Result<usize> {
        {
            let mut state = self.lock();
            state.status.loading = true;
            state.status.last_error = None;
        }

        let result = self.gateway.select_all_ordered();

        let mut state = self.lock();
        state.status.loading = false;
        match result {
            Ok(rows) => {
                let count = rows.len();
                state.store.replace_all(rows);
                state.status.loaded = true;
                if let Some(selected) = &state.selected {
                    if !state.store.contains(selected) {
                        state.selected = None;
                    }
                }
                log::info!("loaded {count} notes");
                Ok(count)
            }
            Err(err) => {
                drop(state);
                Err(self.record("load", err))
            }
        }
    }

    /// Re-runs [`load`](Self::load) after a connection error.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn retry_load(&self) -> Result<usize> {
        self.load()
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Inserts a blank note under `parent_id` (or at root) and selects it.
    ///
    /// Returns the id assigned by the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::NoteNotFound`] if `parent_id` is not in the
    /// local collection, [`SnipnotesError::InFlight`] if the parent is being
    /// deleted, or [`SnipnotesError::Write`] if the insert was rejected. The
    /// local collection is unchanged on failure.
    pub fn add_note(&self, parent_id: Option<&str>) -> Result<String> {
        if let Some(parent) = parent_id {
            let state = self.lock();
            if !state.store.contains(parent) {
                drop(state);
                return Err(self.record("add note", SnipnotesError::NoteNotFound(parent.to_string())));
            }
            if state.in_flight.get(parent) == Some(&PendingWrite::Delete) {
                drop(state);
                return Err(self.record("add note", SnipnotesError::InFlight(parent.to_string())));
            }
        }

        let fields = NewNote::blank(
            parent_id.map(str::to_string),
            self.options.default_title.clone(),
            self.options.default_language,
        );
        let row = self
            .gateway
            .insert_one(&fields)
            .map_err(|err| self.record("add note", err))?;

        let id = row.id.clone();
        let mut state = self.lock();
        state.store.apply_insert(row);
        state.selected = Some(id.clone());
        log::info!("added note {id} under {parent_id:?}");
        Ok(id)
    }

    /// Writes the fields present in `patch` and merges the returned row.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::InFlight`] if another write to `id` is
    /// outstanding, [`SnipnotesError::NoteNotFound`] if the row no longer
    /// exists remotely, or [`SnipnotesError::Write`] if the update was
    /// rejected. The local collection is unchanged on failure.
    pub fn update_note(&self, id: &str, patch: NotePatch) -> Result<()> {
        let ids = [id.to_string()];
        let _guard = self
            .claim(&ids, PendingWrite::Update)
            .map_err(|err| self.record("update note", err))?;

        let row = self
            .gateway
            .update_one(id, &patch)
            .map_err(|err| self.record("update note", err))?;

        let merged = self.lock().store.apply_update(id, row);
        if merged {
            log::info!("updated note {id}");
        } else {
            log::debug!("updated note {id} is not in the local collection");
        }
        Ok(())
    }

    /// Deletes `id` and every descendant in one batch.
    ///
    /// The closure is computed breadth-first over the local collection. Local
    /// removal only happens after the gateway confirmed the batch delete, and
    /// then removes the whole closure at once. A selected note inside the
    /// closure is deselected.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::InFlight`] if any note in the closure is being
    /// written, or [`SnipnotesError::Write`] if the batch delete was rejected.
    /// Nothing is removed locally on failure.
    pub fn delete_note(&self, id: &str) -> Result<DeleteResult> {
        let closure = self.lock().store.descendant_closure(id);
        let _guard = self
            .claim(&closure, PendingWrite::Delete)
            .map_err(|err| self.record("delete note", err))?;

        self.gateway
            .delete_many(&closure)
            .map_err(|err| self.record("delete note", err))?;

        let doomed: HashSet<String> = closure.iter().cloned().collect();
        let mut state = self.lock();
        let deleted_count = state.store.apply_delete(&doomed);
        if state
            .selected
            .as_ref()
            .is_some_and(|selected| doomed.contains(selected))
        {
            state.selected = None;
        }
        log::info!("deleted note {id} and {} descendant(s)", closure.len() - 1);
        Ok(DeleteResult {
            deleted_count,
            affected_ids: closure,
        })
    }

    /// Deep-copies the subtree rooted at `id` next to the original and selects
    /// the new root.
    ///
    /// Notes are inserted parent before children so each copy can point at
    /// its copied parent. Only a note whose new parent equals its original
    /// parent, which is the copied root, gets the copy suffix. What happens
    /// when an insert below the root fails depends on
    /// [`SessionOptions::copy_failure`].
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::NoteNotFound`] if `id` is not in the local
    /// collection, or the gateway error if the root insert failed. With
    /// [`CopyFailurePolicy::Compensate`] any failed insert is returned as an
    /// error after the inserted copies have been deleted again.
    pub fn copy_note(&self, id: &str) -> Result<CopyReport> {
        let found = {
            let state = self.lock();
            state
                .store
                .get(id)
                .cloned()
                .map(|source| (state.store.clone(), source))
        };
        let Some((snapshot, source)) = found else {
            return Err(self.record("copy note", SnipnotesError::NoteNotFound(id.to_string())));
        };

        let mut progress = CopyProgress {
            snapshot: &snapshot,
            created: Vec::new(),
            skipped: Vec::new(),
            first_error: None,
            visited: HashSet::from([source.id.clone()]),
        };
        let root_result = self.copy_subtree(&mut progress, &source, source.parent_id.clone());

        let CopyProgress {
            created,
            skipped,
            first_error,
            ..
        } = progress;

        let root_id = match root_result {
            Ok(root_id) => root_id,
            Err(err) => {
                self.compensate(&created);
                return Err(self.record("copy note", err));
            }
        };

        let created_ids: Vec<String> = created.iter().map(|row| row.id.clone()).collect();
        let mut state = self.lock();
        state.store.apply_insert_batch(created);
        state.selected = Some(root_id.clone());
        drop(state);

        if let Some(err) = first_error {
            log::warn!(
                "copy of {id} is partial: {} note(s) skipped",
                skipped.len()
            );
            let _ = self.record("copy note", err);
        } else {
            log::info!("copied note {id} as {root_id} ({} note(s))", created_ids.len());
        }

        Ok(CopyReport {
            root_id,
            created_ids,
            skipped,
        })
    }

    /// Inserts a copy of `source` under `new_parent`, then its children.
    ///
    /// Returns the new id. Fails only when `source` itself could not be
    /// inserted, or when any insert failed under the compensating policy.
    fn copy_subtree(
        &self,
        progress: &mut CopyProgress<'_>,
        source: &NoteRecord,
        new_parent: Option<String>,
    ) -> Result<String> {
        let mut fields = NewNote::copy_of(source, new_parent.clone());
        if new_parent == source.parent_id {
            fields.title = format!("{}{}", source.title, self.options.copy_suffix);
        }

        let row = self.gateway.insert_one(&fields)?;
        let new_id = row.id.clone();
        progress.created.push(row);

        let children: Vec<NoteRecord> = progress
            .snapshot
            .children_of(&source.id)
            .filter(|child| !progress.visited.contains(&child.id))
            .cloned()
            .collect();
        for child in children {
            progress.visited.insert(child.id.clone());
            if let Err(err) = self.copy_subtree(progress, &child, Some(new_id.clone())) {
                match self.options.copy_failure {
                    CopyFailurePolicy::Compensate => return Err(err),
                    CopyFailurePolicy::KeepPartial => {
                        log::warn!("skipping copy of {}: {err}", child.id);
                        progress.skipped.push(child.id.clone());
                        progress.first_error.get_or_insert(err);
                    }
                }
            }
        }
        Ok(new_id)
    }

    /// Best-effort removal of copies inserted before a failure.
    fn compensate(&self, created: &[NoteRecord]) {
        if created.is_empty() {
            return;
        }
        let ids: Vec<String> = created.iter().map(|row| row.id.clone()).collect();
        match self.gateway.delete_many(&ids) {
            Ok(()) => log::info!("rolled back {} partial copy row(s)", ids.len()),
            Err(err) => log::error!("could not roll back partial copy {ids:?}: {err}"),
        }
    }

    // ── Reads ───────────────────────────────────────────────────

    /// The nested view of the current collection.
    pub fn tree(&self) -> Forest {
        build_forest(self.lock().store.records())
    }

    pub fn note(&self, id: &str) -> Option<NoteRecord> {
        self.lock().store.get(id).cloned()
    }

    /// All notes in `created_at` order.
    pub fn notes(&self) -> Vec<NoteRecord> {
        self.lock().store.records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().status.loading
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.lock().status.last_error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().status.last_error = None;
    }

    // ── Selection ───────────────────────────────────────────────

    pub fn selected(&self) -> Option<String> {
        self.lock().selected.clone()
    }

    pub fn selected_note(&self) -> Option<NoteRecord> {
        let state = self.lock();
        state
            .selected
            .as_deref()
            .and_then(|id| state.store.get(id))
            .cloned()
    }

    /// Selects `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::NoteNotFound`] if `id` is not loaded.
    pub fn select(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.store.contains(id) {
            return Err(SnipnotesError::NoteNotFound(id.to_string()));
        }
        state.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.lock().selected = None;
    }
}

struct CopyProgress<'a> {
    snapshot: &'a FlatStore,
    created: Vec<NoteRecord>,
    skipped: Vec<String>,
    first_error: Option<SnipnotesError>,
    visited: HashSet<String>,
}
