//! Derives the nested note view from the flat collection.
//!
//! Records are grouped by `parent_id` in one pass, then assembled top-down by
//! lookup, so building is linear in the number of notes. Sibling order follows
//! the order of the flat collection.
//!
//! Rows with a dangling `parent_id` become [`Forest::orphans`] and are shown
//! root-like. Rows that cannot be reached from any root or orphan sit on a
//! parent cycle; they are left out of the nested view and listed in
//! [`Forest::unreachable`].

use crate::{NoteNode, NoteRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// The nested view of a flat note collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forest {
    /// Notes without a parent, with their subtrees.
    pub roots: Vec<NoteNode>,
    /// Notes whose parent does not exist, with their subtrees.
    pub orphans: Vec<NoteNode>,
    /// Ids of notes caught in a parent cycle.
    pub unreachable: Vec<String>,
}

impl Forest {
    /// Number of notes present in the nested view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots
            .iter()
            .chain(&self.orphans)
            .map(|node| 1 + node.descendant_count())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.orphans.is_empty()
    }

    /// Pre-order `(id, parent_id)` pairs of every node in the view, roots first.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, Option<String>)> {
        fn walk(node: &NoteNode, out: &mut Vec<(String, Option<String>)>) {
            out.push((node.note.id.clone(), node.note.parent_id.clone()));
            for child in &node.children {
                walk(child, out);
            }
        }

        let mut out = Vec::with_capacity(self.len());
        for node in self.roots.iter().chain(&self.orphans) {
            walk(node, &mut out);
        }
        out
    }

    /// Finds a node anywhere in the view.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NoteNode> {
        self.roots
            .iter()
            .chain(&self.orphans)
            .find_map(|node| node.find(id))
    }
}

/// Builds the nested view of `records`.
pub fn build_forest(records: &[NoteRecord]) -> Forest {
    let ids: HashSet<&str> = records.iter().map(|note| note.id.as_str()).collect();

    let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut root_indices = Vec::new();
    let mut orphan_indices = Vec::new();
    for (idx, note) in records.iter().enumerate() {
        match note.parent_id.as_deref() {
            None => root_indices.push(idx),
            Some(parent) => {
                by_parent.entry(parent).or_default().push(idx);
                if !ids.contains(parent) {
                    orphan_indices.push(idx);
                }
            }
        }
    }

    let mut builder = Builder {
        records,
        by_parent,
        visited: HashSet::with_capacity(records.len()),
    };
    let roots: Vec<NoteNode> = root_indices
        .into_iter()
        .filter_map(|idx| builder.assemble(idx))
        .collect();
    let orphans: Vec<NoteNode> = orphan_indices
        .into_iter()
        .filter_map(|idx| builder.assemble(idx))
        .collect();

    if !orphans.is_empty() {
        log::warn!("{} note(s) reference a missing parent", orphans.len());
    }

    let unreachable: Vec<String> = records
        .iter()
        .enumerate()
        .filter(|(idx, _)| !builder.visited.contains(idx))
        .map(|(_, note)| note.id.clone())
        .collect();
    if !unreachable.is_empty() {
        log::warn!(
            "{} note(s) sit on a parent cycle and are hidden: {:?}",
            unreachable.len(),
            unreachable
        );
    }

    Forest {
        roots,
        orphans,
        unreachable,
    }
}

/// Builds only the subtrees hanging under `parent_id` (`None` for the roots).
pub fn build_children(records: &[NoteRecord], parent_id: Option<&str>) -> Vec<NoteNode> {
    let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut top = Vec::new();
    for (idx, note) in records.iter().enumerate() {
        if note.parent_id.as_deref() == parent_id {
            top.push(idx);
        }
        if let Some(parent) = note.parent_id.as_deref() {
            by_parent.entry(parent).or_default().push(idx);
        }
    }

    let mut builder = Builder {
        records,
        by_parent,
        visited: HashSet::new(),
    };
    top.into_iter()
        .filter_map(|idx| builder.assemble(idx))
        .collect()
}

struct Builder<'a> {
    records: &'a [NoteRecord],
    by_parent: HashMap<&'a str, Vec<usize>>,
    visited: HashSet<usize>,
}

impl Builder<'_> {
    /// Returns `None` if `idx` was already emitted.
    fn assemble(&mut self, idx: usize) -> Option<NoteNode> {
        if !self.visited.insert(idx) {
            return None;
        }
        let note = &self.records[idx];
        let child_indices = self.by_parent.remove(note.id.as_str()).unwrap_or_default();
        let children = child_indices
            .into_iter()
            .filter_map(|child| self.assemble(child))
            .collect();
        Some(NoteNode {
            note: note.clone(),
            children,
        })
    }
}
