//! Viewport control for the bucketed command list.
//!
//! The context detail body is a flat sequence of lines: every bucket
//! contributes a blank separator, a header, then one line per command.
//! Scrolling keeps the selected command visible and, when scrolling back
//! up into a bucket, reveals that bucket's header as well.

/// Rows taken by the header bar (3) and the footer (1).
pub const CHROME_LINES: u16 = 4;

/// One row of the flattened detail list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLine {
    Blank,
    Header { bucket: usize },
    Command { bucket: usize, index: usize },
}

/// Where a selected command sits in the flattened model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePosition {
    /// Line of the command itself.
    pub line: usize,
    /// Line of the blank separator that opens the command's bucket.
    pub bucket_start: usize,
}

/// Rows available to the list body for a terminal `height` rows tall.
pub fn available_lines(height: u16) -> usize {
    usize::from(height.saturating_sub(CHROME_LINES)).max(1)
}

/// Expand bucket sizes into the flattened line model.
pub fn flatten(bucket_sizes: &[usize]) -> Vec<DetailLine> {
    let mut lines = Vec::with_capacity(bucket_sizes.iter().map(|n| n + 2).sum());
    let mut index = 0;
    for (bucket, &size) in bucket_sizes.iter().enumerate() {
        lines.push(DetailLine::Blank);
        lines.push(DetailLine::Header { bucket });
        for _ in 0..size {
            lines.push(DetailLine::Command { bucket, index });
            index += 1;
        }
    }
    lines
}

/// Locate the command with flat index `selected`. `None` when out of range.
pub fn locate(bucket_sizes: &[usize], selected: usize) -> Option<LinePosition> {
    let mut bucket_start = 0;
    let mut first_index = 0;
    for &size in bucket_sizes {
        if selected < first_index + size {
            return Some(LinePosition {
                line: bucket_start + 2 + (selected - first_index),
                bucket_start,
            });
        }
        bucket_start += size + 2;
        first_index += size;
    }
    None
}

/// New scroll offset after the selection moved to `position`.
///
/// Above the viewport: jump to the bucket start so its header shows, unless
/// the bucket is taller than the viewport, in which case the selection goes
/// to the top row. Below the viewport: scroll the minimum amount so the
/// selection lands on the last visible row.
pub fn adjust_offset(offset: usize, position: LinePosition, available: usize) -> usize {
    let available = available.max(1);
    if position.line < offset {
        if position.line - position.bucket_start < available {
            position.bucket_start
        } else {
            position.line
        }
    } else if position.line >= offset + available {
        position.line + 1 - available
    } else {
        offset
    }
}

/// Convenience wrapper: recompute the offset for flat index `selected`.
pub fn scroll_to_selection(
    offset: usize,
    bucket_sizes: &[usize],
    selected: usize,
    available: usize,
) -> usize {
    match locate(bucket_sizes, selected) {
        Some(position) => adjust_offset(offset, position, available),
        None => 0,
    }
}
