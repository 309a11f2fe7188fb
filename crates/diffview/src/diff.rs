use crate::model::{DiffResult, DiffRow, DiffSegment, DiffSegmentKind, SideLine};

/// Greedy character diff.
///
/// Both cursors advance together while the characters agree. On a mismatch
/// the original side is consumed until it lines up with the modified cursor
/// again (or runs out), then the modified side is consumed the same way.
/// This is not a minimal edit script: `"abc"` against `"xbc"` yields one
/// removed and one added segment covering everything.
pub fn diff_text(original: &str, modified: &str) -> DiffResult {
    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = modified.chars().collect();
    let (old_len, new_len) = (old.len(), new.len());

    let mut segments = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < old_len || j < new_len {
        if i < old_len && j < new_len && old[i] == new[j] {
            let start = i;
            while i < old_len && j < new_len && old[i] == new[j] {
                i += 1;
                j += 1;
            }
            push_segment(&mut segments, DiffSegmentKind::Unchanged, &old[start..i]);
            continue;
        }

        if i < old_len {
            let start = i;
            i += 1;
            while i < old_len && (j >= new_len || old[i] != new[j]) {
                i += 1;
            }
            push_segment(&mut segments, DiffSegmentKind::Removed, &old[start..i]);
        }

        if j < new_len {
            let start = j;
            j += 1;
            while j < new_len && (i >= old_len || old[i] != new[j]) {
                j += 1;
            }
            push_segment(&mut segments, DiffSegmentKind::Added, &new[start..j]);
        }
    }

    DiffResult {
        original_text: original.to_string(),
        modified_text: modified.to_string(),
        segments,
    }
}

/// Side-by-side rows: each side is split into lines and paired by line index.
pub fn split_rows(result: &DiffResult) -> Vec<DiffRow> {
    let old_lines = side_lines(&result.segments, DiffSegmentKind::Removed);
    let new_lines = side_lines(&result.segments, DiffSegmentKind::Added);
    let row_len = old_lines.len().max(new_lines.len());

    let mut old_lines = old_lines.into_iter();
    let mut new_lines = new_lines.into_iter();
    (0..row_len)
        .map(|_| DiffRow {
            old: old_lines.next(),
            new: new_lines.next(),
        })
        .collect()
}

fn side_lines(segments: &[DiffSegment], changed: DiffSegmentKind) -> Vec<SideLine> {
    let mut lines = Vec::new();
    let mut current = side_line(0);

    for segment in segments {
        if segment.kind != DiffSegmentKind::Unchanged && segment.kind != changed {
            continue;
        }
        let mut parts = segment.text.split('\n');
        if let Some(first) = parts.next() {
            append(&mut current, segment.kind, first);
        }
        for part in parts {
            let next = side_line(current.line_index + 1);
            lines.push(std::mem::replace(&mut current, next));
            append(&mut current, segment.kind, part);
        }
    }

    if current.line_index > 0 || !current.text.is_empty() {
        lines.push(current);
    }
    lines
}

fn append(line: &mut SideLine, kind: DiffSegmentKind, text: &str) {
    if text.is_empty() {
        return;
    }
    line.text.push_str(text);
    match line.segments.last_mut() {
        Some(last) if last.kind == kind => last.text.push_str(text),
        _ => line.segments.push(DiffSegment::new(kind, text)),
    }
}

fn push_segment(segments: &mut Vec<DiffSegment>, kind: DiffSegmentKind, chars: &[char]) {
    if chars.is_empty() {
        return;
    }

    let text: String = chars.iter().collect();
    if let Some(last) = segments.last_mut() {
        if last.kind == kind {
            last.text.push_str(&text);
            return;
        }
    }

    segments.push(DiffSegment { kind, text });
}

fn side_line(line_index: usize) -> SideLine {
    SideLine {
        line_index,
        text: String::new(),
        segments: Vec::new(),
    }
}
