//! Source location tracking for diagnostics.
//!
//! Provides [`Loc`] to record where a declaration, expression, or error
//! sits in its source file.

use std::fmt;
use std::sync::Arc;

/// A position in a source file.
///
/// Line and column are 1-indexed the way editors count them; `offset` is
/// the 0-indexed byte offset into the file. The file name is shared so
/// cloning a `Loc` into a diagnostic stays cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    /// Source file name.
    pub file: Arc<str>,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Byte offset from the start of the file (0-indexed).
    pub offset: u32,
}

impl Loc {
    /// Create a new location.
    pub fn new(file: impl Into<Arc<str>>, line: u32, col: u32, offset: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            offset,
        }
    }

    /// Location for declarations that have no source file, such as the
    /// builtin environment and synthesized specializations.
    pub fn synthetic() -> Self {
        Self::new("<builtin>", 0, 0, 0)
    }

    /// Whether this location points into real source.
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self::synthetic()
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loc_display() {
        let loc = Loc::new("main.ke", 3, 15, 42);
        assert_eq!(format!("{}", loc), "main.ke:3:15");
    }

    #[test]
    fn loc_equality_by_content() {
        let a = Loc::new("main.ke", 1, 2, 1);
        let b = Loc::new(String::from("main.ke"), 1, 2, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn synthetic_loc() {
        let loc = Loc::synthetic();
        assert!(loc.is_synthetic());
        assert!(!Loc::new("a.ke", 1, 1, 0).is_synthetic());
    }
}
