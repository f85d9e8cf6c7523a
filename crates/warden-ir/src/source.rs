//! Source positions and the file set.
//!
//! A [`Pos`] is an opaque token minted by the source loader; the
//! [`SourceMap`] resolves it to a [`Position`] (file, line, column) for
//! human-readable output. Analysis code passes `Pos` values around and only
//! resolves them at the reporting boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::FileId;

/// Opaque source-position token. `Pos::NONE` marks synthetic entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos(pub u32);

impl Pos {
    pub const NONE: Pos = Pos(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Pos::NONE
    }
}

/// A resolved source position.
///
/// Ordering is (file, line, column), which gives the deterministic
/// position-sorted output the reporting layer relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// The position used for entities without a source location.
    pub fn none() -> Self {
        Position {
            file: "-".to_string(),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The file set: file names plus the table backing [`Pos`] tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<FileEntry>,
    positions: Vec<(FileId, u32, u32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileEntry {
    name: String,
    test: bool,
}

impl SourceMap {
    /// Registers a file and returns its id. `test` marks test sources,
    /// which discovery skips unless test inclusion is enabled.
    pub fn add_file(&mut self, name: &str, test: bool) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(FileEntry {
            name: name.to_string(),
            test,
        });
        id
    }

    /// Mints a position token for (file, line, column).
    pub fn add_pos(&mut self, file: FileId, line: u32, column: u32) -> Pos {
        let pos = Pos(self.positions.len() as u32);
        self.positions.push((file, line, column));
        pos
    }

    pub fn file_name(&self, file: FileId) -> &str {
        &self.files[file.0 as usize].name
    }

    pub fn is_test_file(&self, file: FileId) -> bool {
        self.files[file.0 as usize].test
    }

    /// Resolves a position token. `Pos::NONE` resolves to `-:0:0`.
    pub fn position(&self, pos: Pos) -> Position {
        if pos.is_none() {
            return Position::none();
        }
        let (file, line, column) = self.positions[pos.0 as usize];
        Position {
            file: self.file_name(file).to_string(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_display() {
        let mut map = SourceMap::default();
        let f = map.add_file("data.go", false);
        let pos = map.add_pos(f, 12, 3);
        assert_eq!(map.position(pos).to_string(), "data.go:12:3");
    }

    #[test]
    fn none_position() {
        let map = SourceMap::default();
        assert_eq!(map.position(Pos::NONE).to_string(), "-:0:0");
        assert!(Pos::NONE.is_none());
    }

    #[test]
    fn position_ordering_is_file_line_column() {
        let a = Position {
            file: "a.go".into(),
            line: 9,
            column: 1,
        };
        let b = Position {
            file: "a.go".into(),
            line: 2,
            column: 40,
        };
        let c = Position {
            file: "b.go".into(),
            line: 1,
            column: 1,
        };
        let mut v = vec![a.clone(), c.clone(), b.clone()];
        v.sort();
        assert_eq!(v, vec![b, a, c]);
    }

    #[test]
    fn test_files_are_flagged() {
        let mut map = SourceMap::default();
        let f = map.add_file("data_test.go", true);
        assert!(map.is_test_file(f));
        assert_eq!(map.file_name(f), "data_test.go");
    }
}
