//! Viewport windowing.
//!
//! Pages are `height` rows aligned to index 0, so the visible window only moves
//! when the cursor crosses a page boundary.

use std::ops::Range;

/// The block of rows visible for a given cursor and viewport height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First visible index.
    pub start: usize,
    /// Last visible index, inclusive. May lie past the end of the roster.
    pub end: usize,
    /// Roster length the window was computed for.
    pub total: usize,
}

impl Window {
    /// Half-open slice range, clamped to the roster length.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let end = self.end.saturating_add(1).min(self.total);
        self.start.min(end)..end
    }

    /// Whether `index` falls inside the visible rows.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

/// Window containing `cursor` for a viewport of `height` rows.
///
/// A zero height is treated as a single row.
#[must_use]
pub fn visible_window(cursor: usize, height: usize, total: usize) -> Window {
    let height = height.max(1);
    let start = if cursor < height {
        0
    } else {
        (cursor / height) * height
    };
    Window {
        start,
        end: start + height - 1,
        total,
    }
}

/// Signed cursor delta for a page step of `height` rows.
#[must_use]
pub fn page_delta(height: usize) -> isize {
    isize::try_from(height.max(1)).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(visible_window(0, 10, 25).start, 0);
        assert_eq!(visible_window(9, 10, 25).start, 0);
    }

    #[test]
    fn page_aligned_starts() {
        assert_eq!(visible_window(10, 10, 25).start, 10);
        assert_eq!(visible_window(19, 10, 25).start, 10);
        assert_eq!(visible_window(23, 10, 25).start, 20);
    }

    #[test]
    fn window_end_is_inclusive_and_unclamped() {
        let w = visible_window(23, 10, 25);
        assert_eq!(w.end, 29);
        assert_eq!(w.range(), 20..25);
    }

    #[test]
    fn window_is_stable_within_a_page() {
        let starts: Vec<usize> = (10..20).map(|c| visible_window(c, 10, 40).start).collect();
        assert!(starts.iter().all(|&s| s == 10));
    }

    #[test]
    fn zero_height_behaves_like_one_row() {
        let w = visible_window(3, 0, 5);
        assert_eq!(w.start, 3);
        assert_eq!(w.range(), 3..4);
    }

    #[test]
    fn empty_roster_yields_empty_range() {
        let w = visible_window(0, 10, 0);
        assert!(w.range().is_empty());
        assert!(!w.contains(0));
    }

    #[test]
    fn page_delta_is_positive() {
        assert_eq!(page_delta(0), 1);
        assert_eq!(page_delta(24), 24);
    }
}
