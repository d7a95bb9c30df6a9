//! Plain-text rendering of the note forest.

use snipnotes_core::{Forest, NoteNode, NoteRecord};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Renders roots, then detached subtrees, then hidden ids.
pub fn render_forest(forest: &Forest, selected: Option<&str>) -> String {
    let mut out = String::new();
    if forest.is_empty() && forest.unreachable.is_empty() {
        out.push_str("(no notes)\n");
        return out;
    }

    for node in &forest.roots {
        render_node(&mut out, node, 0, selected);
    }
    if !forest.orphans.is_empty() {
        out.push_str("\n(detached: parent missing)\n");
        for node in &forest.orphans {
            render_node(&mut out, node, 1, selected);
        }
    }
    if !forest.unreachable.is_empty() {
        let _ = writeln!(
            out,
            "\n(hidden: parent cycle) {}",
            forest.unreachable.join(", ")
        );
    }
    out
}

fn render_node(out: &mut String, node: &NoteNode, depth: usize, selected: Option<&str>) {
    let marker = if selected == Some(node.note.id.as_str()) {
        "> "
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "{}{marker}{} [{}] ({})",
        INDENT.repeat(depth),
        node.note.title,
        node.note.language.label(),
        node.note.id
    );
    for child in &node.children {
        render_node(out, child, depth + 1, selected);
    }
}

/// Renders one note with its code and comment.
pub fn render_note(note: &NoteRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", note.title, note.id);
    let _ = writeln!(out, "language: {}", note.language.label());
    if let Some(parent) = &note.parent_id {
        let _ = writeln!(out, "parent:   {parent}");
    }
    let _ = writeln!(out, "created:  {}", note.created_at.to_rfc3339());
    if !note.comment.is_empty() {
        let _ = writeln!(out, "\n{}", note.comment);
    }
    let _ = writeln!(out, "\n{}", note.code);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use snipnotes_core::{build_forest, Language};

    fn note(id: &str, parent: Option<&str>) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            title: format!("T{id}"),
            code: "x".to_string(),
            comment: String::new(),
            language: Language::Css,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_nested_with_selection() {
        let forest = build_forest(&[note("a", None), note("b", Some("a"))]);
        let text = render_forest(&forest, Some("b"));
        assert_eq!(text, "Ta [CSS] (a)\n  > Tb [CSS] (b)\n");
    }

    #[test]
    fn test_render_empty_and_orphans() {
        assert_eq!(render_forest(&Forest::default(), None), "(no notes)\n");

        let forest = build_forest(&[note("a", Some("gone"))]);
        let text = render_forest(&forest, None);
        assert!(text.contains("(detached: parent missing)"));
        assert!(text.contains("  Ta [CSS] (a)"));
    }
}
