pub mod diff;
pub mod model;

pub use diff::{diff_text, split_rows};
pub use model::{
    DiffResult, DiffRow, DiffRowKind, DiffSegment, DiffSegmentKind, DiffStats, SideLine,
};
