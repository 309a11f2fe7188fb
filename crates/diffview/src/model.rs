use serde::{Deserialize, Serialize};

/// Output of [`crate::diff_text`]: both inputs plus the ordered segments
/// that reconstruct each of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub original_text: String,
    pub modified_text: String,
    pub segments: Vec<DiffSegment>,
}

impl DiffResult {
    /// Unchanged and removed segments, concatenated.
    pub fn original(&self) -> String {
        self.side(DiffSegmentKind::Removed)
    }

    /// Unchanged and added segments, concatenated.
    pub fn modified(&self) -> String {
        self.side(DiffSegmentKind::Added)
    }

    pub fn has_changes(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.kind != DiffSegmentKind::Unchanged)
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for segment in &self.segments {
            let count = segment.text.chars().count();
            match segment.kind {
                DiffSegmentKind::Unchanged => stats.unchanged += count,
                DiffSegmentKind::Added => stats.added += count,
                DiffSegmentKind::Removed => stats.removed += count,
            }
        }
        stats
    }

    fn side(&self, changed: DiffSegmentKind) -> String {
        self.segments
            .iter()
            .filter(|segment| segment.kind == DiffSegmentKind::Unchanged || segment.kind == changed)
            .map(|segment| segment.text.as_str())
            .collect()
    }
}

/// Character counts per segment kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffRow {
    pub old: Option<SideLine>,
    pub new: Option<SideLine>,
}

impl DiffRow {
    pub fn kind(&self) -> DiffRowKind {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => {
                if old.is_unchanged() && new.is_unchanged() {
                    DiffRowKind::Unchanged
                } else {
                    DiffRowKind::Modified
                }
            }
            (Some(_), None) => DiffRowKind::Removed,
            (None, Some(_)) => DiffRowKind::Added,
            (None, None) => DiffRowKind::Unchanged,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffRowKind {
    Unchanged,
    Added,
    Removed,
    Modified,
}

/// One line of one side of the split view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideLine {
    pub line_index: usize,
    pub text: String,
    pub segments: Vec<DiffSegment>,
}

impl SideLine {
    fn is_unchanged(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| segment.kind == DiffSegmentKind::Unchanged)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub kind: DiffSegmentKind,
    pub text: String,
}

impl DiffSegment {
    pub fn new(kind: DiffSegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSegmentKind {
    Unchanged,
    Added,
    Removed,
}
