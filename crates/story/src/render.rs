use std::fmt::Write as _;

use calloutpad_core::{
    BlockKind, CalloutType, CommandItem, Document, group_commands,
};
use calloutpad_diff::{DiffResult, DiffSegmentKind, split_rows};

/// Inline diff with `[-removed-]` and `{+added+}` markers.
pub fn inline_diff(diff: &DiffResult) -> String {
    let mut out = String::new();
    for segment in &diff.segments {
        match segment.kind {
            DiffSegmentKind::Unchanged => out.push_str(&segment.text),
            DiffSegmentKind::Removed => {
                let _ = write!(out, "[-{}-]", segment.text);
            }
            DiffSegmentKind::Added => {
                let _ = write!(out, "{{+{}+}}", segment.text);
            }
        }
    }
    out
}

/// Original and modified lines next to each other.
pub fn split_diff(diff: &DiffResult) -> String {
    let rows = split_rows(diff);
    let width = rows
        .iter()
        .filter_map(|row| row.old.as_ref())
        .map(|line| line.text.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in rows {
        let old = row.old.as_ref().map_or("", |line| line.text.as_str());
        let new = row.new.as_ref().map_or("", |line| line.text.as_str());
        let _ = writeln!(out, "{:<9} {old:<width$} | {new}", format!("{:?}", row.kind()));
    }
    out
}

pub fn outline(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.outline() {
        let indent = "  ".repeat(block.path.len().saturating_sub(1));
        let _ = write!(
            out,
            "{indent}{} [{}..{})",
            block.kind, block.range.start, block.range.end
        );
        if block.kind == BlockKind::Callout
            && let Some(attrs) = doc.node(&block.path).and_then(|node| node.attrs())
        {
            let callout_type = CalloutType::from_attrs(attrs);
            let _ = write!(out, " {} ({})", callout_type.title(), callout_type.icon());
        }
        if let Some(node) = doc.node(&block.path)
            && block.kind.is_text_block()
        {
            let _ = write!(out, " {:?}", node.text_content());
        }
        out.push('\n');
    }
    out
}

pub fn commands(items: &[&CommandItem]) -> String {
    let mut out = String::new();
    for group in group_commands(items) {
        let _ = writeln!(out, "{}", group.category);
        for (index, item) in group.items {
            let _ = write!(out, "  {index:>2}. {} - {}", item.title, item.description);
            if let Some(shortcut) = item.shortcut {
                let _ = write!(out, " [{shortcut}]");
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use calloutpad_core::{DEFAULT_CATALOG, Node, filter_commands};
    use calloutpad_diff::diff_text;

    use super::*;

    #[test]
    fn inline_markers() {
        assert_eq!(inline_diff(&diff_text("cat", "cut")), "c[-at-]{+ut+}");
    }

    #[test]
    fn outline_shows_callout_type_and_text() {
        let doc = Document::new(vec![Node::callout(
            CalloutType::Warning,
            vec![Node::paragraph("careful")],
        )]);

        assert_eq!(
            outline(&doc),
            "callout [0..11) Warning (alert-triangle)\n  paragraph [1..10) \"careful\"\n"
        );
    }

    #[test]
    fn commands_are_grouped_with_global_index() {
        let items = filter_commands(&DEFAULT_CATALOG, "heading 1");

        assert_eq!(
            commands(&items),
            "Basic blocks\n   0. Heading 1 - Large section heading [# + space]\n"
        );
    }
}
