//! Stable id newtypes for program entities.
//!
//! All ids are distinct newtype wrappers over `u32`, providing type safety
//! so that a `FuncId` cannot be accidentally used where a `TypeId` is
//! expected. Ids index into the arenas owned by [`crate::Program`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a package in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PkgId(pub u32);

/// Identity of a type (named or structural) in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// Identity of a function or method in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncId(pub u32);

/// Identity of an SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

/// Identity of a source file in the file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl fmt::Display for PkgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", PkgId(3)), "3");
        assert_eq!(format!("{}", TypeId(7)), "7");
        assert_eq!(format!("{}", FuncId(0)), "0");
        assert_eq!(format!("{}", ValueId(99)), "99");
        assert_eq!(format!("{}", FileId(1)), "1");
    }

    #[test]
    fn id_types_are_distinct() {
        // Same inner value, different types; the type system keeps them apart.
        let ty = TypeId(1);
        let func = FuncId(1);
        assert_eq!(ty.0, func.0);
    }

    #[test]
    fn serde_roundtrip() {
        let id = FuncId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: FuncId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
