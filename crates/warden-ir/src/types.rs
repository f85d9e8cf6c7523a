//! The type vocabulary of the program model.
//!
//! Types are arena entries referenced by [`TypeId`](crate::TypeId). The
//! vocabulary is the closed set the analyzers care about: named types with
//! an underlying form, structs, interfaces (method names only), pointers,
//! slices, tuples, function types, and basic (universe scalar) types.
//!
//! No structural interning is performed; every query in the analyzers
//! compares named-type identities, so two structurally identical pointer
//! types with different ids are harmless.

use serde::{Deserialize, Serialize};

use crate::id::{FuncId, PkgId, TypeId};
use crate::source::Pos;

/// One type arena entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    pub id: TypeId,
    pub kind: TypeKind,
    pub pos: Pos,
}

/// The underlying form of a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeKind {
    /// A universe scalar such as `int` or `string`.
    Basic { name: String },
    /// A declared type. `pkg` is `None` for universe-scope names.
    Named {
        name: String,
        pkg: Option<PkgId>,
        underlying: TypeId,
    },
    /// A struct form. Field types are recorded but no analyzer walks them.
    Struct { fields: Vec<(String, TypeId)> },
    /// An interface form; only method names participate in satisfaction.
    Interface { methods: Vec<String> },
    Pointer { elem: TypeId },
    Slice { elem: TypeId },
    /// The result tuple of a multi-value call.
    Tuple { elems: Vec<TypeId> },
    /// A function type (used for interface members and func-valued params).
    Func {
        params: Vec<TypeId>,
        results: Vec<TypeId>,
    },
}

/// A concrete method bound to a named type.
///
/// `ptr_recv` distinguishes pointer-receiver methods: the value method set
/// of `T` excludes them, while the method set of `*T` includes everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    /// The named type the method is declared on.
    pub owner: TypeId,
    pub name: String,
    pub ptr_recv: bool,
    pub func: FuncId,
}
