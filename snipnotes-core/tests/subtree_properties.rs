//! Subtree invariants checked over generated note trees.

use proptest::prelude::*;
use snipnotes_core::{NoteNode, NotePatch, NoteSession, SqliteGateway};
use std::collections::HashSet;

/// Parent choices for notes 1..n: `None` for a new root, `Some(i)` for an
/// earlier note. Note 0 is always a root; the first three notes form a chain
/// so every tree has depth of at least three.
fn arb_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(
        (any::<bool>(), any::<prop::sample::Index>()),
        0..25,
    )
    .prop_map(|picks| {
        let mut shape = vec![None, Some(0), Some(1)];
        for (i, (is_root, pick)) in picks.into_iter().enumerate() {
            let idx = i + 3;
            shape.push(if is_root { None } else { Some(pick.index(idx)) });
        }
        shape
    })
}

fn build(shape: &[Option<usize>]) -> (NoteSession<SqliteGateway>, Vec<String>) {
    let session = NoteSession::new(SqliteGateway::open_in_memory().unwrap());
    session.load().unwrap();
    let mut ids: Vec<String> = Vec::with_capacity(shape.len());
    for (i, parent) in shape.iter().enumerate() {
        let parent_id = parent.map(|p| ids[p].clone());
        let id = session.add_note(parent_id.as_deref()).unwrap();
        session
            .update_note(
                &id,
                NotePatch {
                    title: Some(format!("note {i}")),
                    code: Some(format!("console.log({i});")),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        ids.push(id);
    }
    (session, ids)
}

/// Shape and content of a subtree, ignoring ids.
fn signature(node: &NoteNode) -> String {
    let children: Vec<String> = node.children.iter().map(signature).collect();
    format!(
        "({}|{}|{}|{}[{}])",
        node.note.title,
        node.note.code,
        node.note.comment,
        node.note.language,
        children.join(",")
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn delete_removes_every_descendant(shape in arb_shape(), target in any::<prop::sample::Index>()) {
        let (session, ids) = build(&shape);
        let victim = ids[target.index(ids.len())].clone();
        let expected: HashSet<String> = {
            let tree = session.tree();
            let node = tree.find(&victim).unwrap();
            let mut out = HashSet::new();
            let mut stack = vec![node];
            while let Some(n) = stack.pop() {
                out.insert(n.note.id.clone());
                stack.extend(n.children.iter());
            }
            out
        };

        let result = session.delete_note(&victim).unwrap();
        prop_assert_eq!(result.deleted_count, expected.len());
        prop_assert_eq!(result.affected_ids.iter().cloned().collect::<HashSet<_>>(), expected.clone());

        let remaining = session.notes();
        prop_assert_eq!(remaining.len(), ids.len() - expected.len());
        for note in &remaining {
            prop_assert!(!expected.contains(&note.id));
            if let Some(parent) = &note.parent_id {
                prop_assert!(!expected.contains(parent));
            }
        }

        session.load().unwrap();
        prop_assert_eq!(session.len(), remaining.len());
    }

    #[test]
    fn copy_produces_isomorphic_sibling(shape in arb_shape(), target in any::<prop::sample::Index>()) {
        let (session, ids) = build(&shape);
        let source_id = ids[target.index(ids.len())].clone();
        let source = session.note(&source_id).unwrap();
        let before = session.len();

        let report = session.copy_note(&source_id).unwrap();

        let tree = session.tree();
        let original = tree.find(&source_id).unwrap();
        let copy = tree.find(&report.root_id).unwrap();
        let size = 1 + original.descendant_count();

        prop_assert!(report.is_complete());
        prop_assert_eq!(report.created_ids.len(), size);
        prop_assert_eq!(session.len(), before + size);
        prop_assert_eq!(&copy.note.parent_id, &source.parent_id);
        prop_assert_eq!(copy.note.title.clone(), format!("{} (Copy)", source.title));

        let mut renamed = copy.clone();
        renamed.note.title = source.title.clone();
        prop_assert_eq!(signature(&renamed), signature(original));

        let old: HashSet<&String> = ids.iter().collect();
        prop_assert!(report.created_ids.iter().all(|id| !old.contains(id)));
    }
}
