use crate::Command;

/// Session-ordered neighbours of one command. The target is never part of
/// `before` or `after`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandWindow {
    pub before: Vec<Command>,
    pub target: Option<Command>,
    pub after: Vec<Command>,
}

impl CommandWindow {
    /// Trim `before`/`after` so their combined length fits `total`.
    pub fn balanced(self, total: usize) -> Self {
        let (before, after) = balance_window(self.before, self.after, total);
        Self {
            before,
            target: self.target,
            after,
        }
    }

    /// Flattened display order with the index of the target, if present.
    pub fn ordered(&self) -> (Vec<&Command>, Option<usize>) {
        let mut out: Vec<&Command> = self.before.iter().collect();
        let target_index = self.target.as_ref().map(|target| {
            out.push(target);
            out.len() - 1
        });
        out.extend(self.after.iter());
        (out, target_index)
    }

    /// Command immediately preceding the target in its session.
    pub fn previous(&self) -> Option<&Command> {
        self.before.last()
    }

    /// Command immediately following the target in its session.
    pub fn next(&self) -> Option<&Command> {
        self.after.first()
    }
}

/// Fit `before` and `after` (both oldest first) into `total` entries.
///
/// A short side hands its unused share to the other side. When both sides
/// are long, `before` keeps `total / 2` of its newest entries and `after`
/// keeps the rest of the budget from its oldest entries.
pub fn balance_window(
    mut before: Vec<Command>,
    mut after: Vec<Command>,
    total: usize,
) -> (Vec<Command>, Vec<Command>) {
    if before.len() + after.len() <= total {
        return (before, after);
    }
    let half = total / 2;
    if before.len() <= half {
        after.truncate(total - before.len());
    } else if after.len() <= total - half {
        let keep = total - after.len();
        before.drain(..before.len() - keep);
    } else {
        before.drain(..before.len() - half);
        after.truncate(total - half);
    }
    (before, after)
}

/// Window budget for a view `height` rows tall after `overhead` fixed rows.
pub fn window_budget(height: u16, overhead: u16) -> usize {
    usize::from(height.saturating_sub(overhead)).max(1)
}
