//! Selection state
//!
//! Holds the raw anchors and the normalized span. Normalization, snapping,
//! scrolling, and text extraction need grid access and live on `Screen`.

use std::time::Instant;

/// A cell coordinate (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Selection shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionType {
    /// Stream selection following line flow
    #[default]
    Regular,
    /// Rectangular block selection
    Rectangular,
}

/// Anchor expansion applied during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionSnap {
    #[default]
    None,
    /// Expand to word boundaries (double click)
    Word,
    /// Expand to whole logical lines (triple click)
    Line,
}

/// Selection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No selection
    #[default]
    Idle,
    /// Anchored but not yet extended
    Empty,
    /// Has a usable span
    Ready,
}

/// Selection state
#[derive(Debug, Clone)]
pub struct Selection {
    pub mode: SelectionMode,
    pub ty: SelectionType,
    pub snap: SelectionSnap,
    /// Original anchors in click order
    pub ob: Point,
    pub oe: Point,
    /// Normalized span: top-left and bottom-right
    pub nb: Point,
    pub ne: Point,
    /// Most recent and previous click times, for multi-click detection
    pub tclick1: Option<Instant>,
    pub tclick2: Option<Instant>,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            mode: SelectionMode::Idle,
            ty: SelectionType::Regular,
            snap: SelectionSnap::None,
            ob: Point::default(),
            oe: Point::default(),
            nb: Point::default(),
            ne: Point::default(),
            tclick1: None,
            tclick2: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode != SelectionMode::Idle
    }

    pub fn clear(&mut self) {
        self.mode = SelectionMode::Idle;
    }

    /// Record a click time, shifting the previous one down
    pub fn record_click(&mut self, now: Instant) {
        self.tclick2 = self.tclick1;
        self.tclick1 = Some(now);
    }

    /// Whether (x, y) lies inside the normalized span
    pub fn contains(&self, x: usize, y: usize) -> bool {
        if self.mode != SelectionMode::Ready {
            return false;
        }

        if self.ty == SelectionType::Rectangular {
            return (self.nb.y..=self.ne.y).contains(&y)
                && (self.nb.x..=self.ne.x).contains(&x);
        }

        (self.nb.y..=self.ne.y).contains(&y)
            && (y != self.nb.y || x >= self.nb.x)
            && (y != self.ne.y || x <= self.ne.x)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(nb: Point, ne: Point, ty: SelectionType) -> Selection {
        let mut sel = Selection::new();
        sel.mode = SelectionMode::Ready;
        sel.ty = ty;
        sel.nb = nb;
        sel.ne = ne;
        sel
    }

    #[test]
    fn test_idle_contains_nothing() {
        let sel = Selection::new();
        assert!(!sel.contains(0, 0));
    }

    #[test]
    fn test_regular_contains() {
        let sel = ready(Point::new(5, 1), Point::new(3, 3), SelectionType::Regular);
        // First row: from column 5 onward.
        assert!(sel.contains(5, 1));
        assert!(sel.contains(99, 1));
        assert!(!sel.contains(4, 1));
        // Middle row: everything.
        assert!(sel.contains(0, 2));
        // Last row: up to column 3.
        assert!(sel.contains(3, 3));
        assert!(!sel.contains(4, 3));
        assert!(!sel.contains(0, 4));
    }

    #[test]
    fn test_rectangular_contains() {
        let sel = ready(Point::new(2, 1), Point::new(4, 3), SelectionType::Rectangular);
        assert!(sel.contains(2, 1));
        assert!(sel.contains(4, 3));
        assert!(!sel.contains(1, 2));
        assert!(!sel.contains(5, 2));
    }

    #[test]
    fn test_record_click_shifts() {
        let mut sel = Selection::new();
        let first = Instant::now();
        sel.record_click(first);
        let second = Instant::now();
        sel.record_click(second);
        assert_eq!(sel.tclick2, Some(first));
        assert_eq!(sel.tclick1, Some(second));
    }
}
