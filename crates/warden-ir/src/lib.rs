//! Typed program and SSA data model for the warden analyzers.
//!
//! The source-loading front-end is an external collaborator; this crate
//! defines the frozen [`Program`] it produces, the construction API
//! ([`ProgramBuilder`]), and the read-only queries the analyzers consume:
//! package/function/type/value arenas, method tables, interface
//! satisfaction, name resolution, and source positions.

pub mod decl;
pub mod error;
pub mod func;
pub mod id;
pub mod program;
pub mod source;
pub mod types;
pub mod value;

pub use decl::{Decl, SourceFile, TypeMember};
pub use error::IrError;
pub use func::{is_exported, Block, FuncDef, Instr};
pub use id::{FileId, FuncId, PkgId, TypeId, ValueId};
pub use program::{PackageDef, Program, ProgramBuilder};
pub use source::{Pos, Position, SourceMap};
pub use types::{MethodDef, TypeDef, TypeKind};
pub use value::{CallTarget, ValueDef, ValueKind};
