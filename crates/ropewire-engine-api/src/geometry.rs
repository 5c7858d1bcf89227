use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-based row/column position in buffer space.
///
/// Ordering is row-major then column-major; the derived `Ord` provides this
/// through field order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    /// The buffer origin, `(0, 0)`.
    pub const ZERO: Point = Point { row: 0, column: 0 };

    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A span of buffer content delimited by two points, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// The whole-buffer range from the origin to `extent`.
    #[must_use]
    pub const fn to_extent(extent: Point) -> Self {
        Self {
            start: Point::ZERO,
            end: extent,
        }
    }

    /// Returns true if the range spans no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn point_ordering_is_row_major() {
        assert!(Point::new(0, 9) < Point::new(1, 0));
        assert!(Point::new(2, 3) < Point::new(2, 4));
        assert!(Point::new(5, 0) > Point::new(4, 100));
    }

    #[test]
    fn whole_buffer_range_starts_at_origin() {
        let range = Range::to_extent(Point::new(10, 4));
        assert_eq!(range.start, Point::ZERO);
        assert_eq!(range.end, Point::new(10, 4));
        assert!(!range.is_empty());
    }

    #[test]
    fn empty_range_detection() {
        let p = Point::new(3, 7);
        assert!(Range::new(p, p).is_empty());
    }
}
