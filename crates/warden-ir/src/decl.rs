//! Declaration-level source model consumed by contract discovery.
//!
//! The source loader attaches, per file, the top-level declarations with
//! their raw comment lines. Function bodies are never represented here;
//! interface bodies are, because contracts may be attached to interface
//! methods.

use serde::{Deserialize, Serialize};

use crate::id::{FileId, FuncId, PkgId, TypeId};
use crate::source::Pos;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    pub pkg: PkgId,
    pub decls: Vec<Decl>,
}

/// A top-level declaration with its attached comment lines.
///
/// Comment lines are raw source lines including the comment marker, e.g.
/// `//contract:RetLint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    /// A function or method declaration (the receiver lives on the func).
    Func {
        func: FuncId,
        comments: Vec<String>,
        pos: Pos,
    },
    /// A type declaration. `members` is non-empty only for interfaces.
    Type {
        ty: TypeId,
        comments: Vec<String>,
        members: Vec<TypeMember>,
        pos: Pos,
    },
    /// A top-level var declaration, `var name T = value`.
    Var {
        name: String,
        /// Declared type, when spelled out.
        declared: Option<TypeId>,
        /// Static type of the initializer expression, when present.
        value: Option<TypeId>,
        pos: Pos,
    },
}

/// One member of an interface body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeMember {
    pub name: String,
    /// True when the member's type is a function type (an interface
    /// method); embedded interfaces are `false`.
    pub is_func: bool,
    pub comments: Vec<String>,
    pub pos: Pos,
}
