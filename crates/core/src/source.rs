//! Source positions for parse parts, events and trees.
//!
//! A [`Position`] is a half-open character range within one source identified
//! by a [`CodeLocation`]. Positions are cheap to clone; the location is shared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies the source a position points into (typically a file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeLocation(Arc<str>);

impl CodeLocation {
    pub fn new(name: impl AsRef<str>) -> Self {
        CodeLocation(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub loc: CodeLocation,
    pub left: usize,
    pub right: usize,
}

impl Position {
    pub fn new(loc: CodeLocation, left: usize, right: usize) -> Self {
        debug_assert!(left <= right, "inverted position {}..{}", left, right);
        Position { loc, left, right }
    }

    /// The zero-width position at the start of this one.
    pub fn left_edge(&self) -> Position {
        Position::new(self.loc.clone(), self.left, self.left)
    }

    /// The zero-width position at the end of this one.
    pub fn right_edge(&self) -> Position {
        Position::new(self.loc.clone(), self.right, self.right)
    }

    pub fn with_right(&self, right: usize) -> Position {
        Position::new(self.loc.clone(), self.left, right.max(self.left))
    }

    /// The smallest position covering every position yielded by `positions`,
    /// or `fallback` when there are none.
    pub fn spanning<'a>(
        positions: impl IntoIterator<Item = &'a Position>,
        fallback: &Position,
    ) -> Position {
        let mut iter = positions.into_iter();
        let Some(first) = iter.next() else {
            return fallback.clone();
        };
        let (left, right) = iter.fold((first.left, first.right), |(l, r), p| {
            (l.min(p.left), r.max(p.right))
        });
        Position::new(first.loc.clone(), left, right)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}-{}", self.loc, self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(left: usize, right: usize) -> Position {
        Position::new(CodeLocation::new("test"), left, right)
    }

    #[test]
    fn edges_are_zero_width() {
        let p = pos(3, 7);
        assert_eq!(p.left_edge(), pos(3, 3));
        assert_eq!(p.right_edge(), pos(7, 7));
    }

    #[test]
    fn spanning_covers_all_inputs() {
        let ps = [pos(4, 6), pos(1, 2), pos(8, 9)];
        assert_eq!(Position::spanning(&ps, &pos(0, 0)), pos(1, 9));
    }

    #[test]
    fn spanning_nothing_uses_fallback() {
        let fallback = pos(5, 5);
        assert_eq!(Position::spanning(std::iter::empty(), &fallback), fallback);
    }

    #[test]
    fn display_includes_location() {
        assert_eq!(pos(1, 2).to_string(), "test+1-2");
    }
}
