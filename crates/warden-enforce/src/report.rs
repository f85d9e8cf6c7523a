//! Diagnostic collection.
//!
//! Checkers send [`Diagnostic`] records into a channel; a single consumer
//! folds them into [`Results`], a position-keyed, ordered, deduplicated
//! map. After the workers finish and the channel drains, the map is the
//! run's output.

use std::collections::BTreeMap;
use std::fmt;

use warden_ir::Position;

/// One diagnostic record: where, what, already resolved to a printable
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub pos: Position,
    pub message: String,
}

/// The run's diagnostics, keyed and ordered by source position.
#[derive(Debug, Default)]
pub struct Results {
    by_pos: BTreeMap<Position, Vec<String>>,
}

impl Results {
    /// Folds one diagnostic in. An identical message already present at the
    /// same position is dropped; distinct messages accumulate in arrival
    /// order.
    pub fn insert(&mut self, diagnostic: Diagnostic) {
        let messages = self.by_pos.entry(diagnostic.pos).or_default();
        if !messages.contains(&diagnostic.message) {
            messages.push(diagnostic.message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }

    /// Total message count across all positions.
    pub fn len(&self) -> usize {
        self.by_pos.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, &[String])> {
        self.by_pos.iter().map(|(pos, msgs)| (pos, msgs.as_slice()))
    }

    pub fn messages_at(&self, pos: &Position) -> &[String] {
        self.by_pos.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for Results {
    /// One `FILE:LINE:COL: MESSAGE` line per message, position-sorted.
    /// Multi-line messages carry their own indentation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, messages) in &self.by_pos {
            for message in messages {
                writeln!(f, "{pos}: {message}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(file: &str, line: u32) -> Position {
        Position {
            file: file.into(),
            line,
            column: 1,
        }
    }

    #[test]
    fn output_is_position_sorted() {
        let mut results = Results::default();
        results.insert(Diagnostic {
            pos: at("b.go", 1),
            message: "second".into(),
        });
        results.insert(Diagnostic {
            pos: at("a.go", 9),
            message: "first".into(),
        });
        assert_eq!(results.to_string(), "a.go:9:1: first\nb.go:1:1: second\n");
    }

    #[test]
    fn duplicate_messages_collapse() {
        let mut results = Results::default();
        for _ in 0..3 {
            results.insert(Diagnostic {
                pos: at("a.go", 1),
                message: "dup".into(),
            });
        }
        results.insert(Diagnostic {
            pos: at("a.go", 1),
            message: "other".into(),
        });
        assert_eq!(results.len(), 2);
        assert_eq!(results.messages_at(&at("a.go", 1)), ["dup", "other"]);
    }

    #[test]
    fn empty_results() {
        let results = Results::default();
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert_eq!(results.to_string(), "");
    }
}
