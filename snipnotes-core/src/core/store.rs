//! In-memory flat collection of notes, the local source of truth.
//!
//! The store is only ever written with rows the gateway has already returned;
//! it never invents ids or timestamps. Records are kept in `created_at` order
//! and indexed by id.

use crate::NoteRecord;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Default, Clone)]
pub struct FlatStore {
    records: Vec<NoteRecord>,
    index: HashMap<String, usize>,
}

impl FlatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from rows already ordered by `created_at`.
    pub fn from_records(records: Vec<NoteRecord>) -> Self {
        let mut store = Self {
            records,
            index: HashMap::new(),
        };
        store.reindex();
        store
    }

    /// Replaces the whole collection, as after a successful load.
    pub fn replace_all(&mut self, records: Vec<NoteRecord>) {
        self.records = records;
        self.reindex();
    }

    /// Appends a freshly persisted record.
    pub fn apply_insert(&mut self, record: NoteRecord) {
        if let Some(&pos) = self.index.get(&record.id) {
            self.records[pos] = record;
            return;
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    /// Appends several records and restores `created_at` order.
    pub fn apply_insert_batch(&mut self, records: Vec<NoteRecord>) {
        if records.is_empty() {
            return;
        }
        for record in records {
            self.apply_insert(record);
        }
        // Stable, so equal timestamps keep arrival order.
        self.records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.reindex();
    }

    /// Merges the authoritative row returned by an update. No-op if `id` is absent.
    pub fn apply_update(&mut self, id: &str, row: NoteRecord) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                let current = &mut self.records[pos];
                current.title = row.title;
                current.code = row.code;
                current.comment = row.comment;
                current.language = row.language;
                true
            }
            None => false,
        }
    }

    /// Removes every record whose id is in `ids`. Returns how many were removed.
    pub fn apply_delete(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.records.len();
        self.records.retain(|note| !ids.contains(&note.id));
        let removed = before - self.records.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&NoteRecord> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All records in `created_at` order.
    pub fn records(&self) -> &[NoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Direct children of `parent_id`, in store order.
    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a NoteRecord> + 'a {
        self.records
            .iter()
            .filter(move |note| note.parent_id.as_deref() == Some(parent_id))
    }

    /// Returns `id` followed by all of its transitive descendants, breadth-first.
    ///
    /// `id` is always the first element, even when it is not in the store.
    /// Each id appears once, so a corrupt parent cycle cannot loop forever.
    pub fn descendant_closure(&self, id: &str) -> Vec<String> {
        let mut by_parent: HashMap<&str, Vec<&str>> = HashMap::new();
        for note in &self.records {
            if let Some(parent) = note.parent_id.as_deref() {
                by_parent.entry(parent).or_default().push(note.id.as_str());
            }
        }

        let mut closure = vec![id.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for &child in by_parent.get(current).into_iter().flatten() {
                if seen.insert(child) {
                    closure.push(child.to_string());
                    queue.push_back(child);
                }
            }
        }
        closure
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, note)| (note.id.clone(), pos))
            .collect();
    }
}
