//! Function definitions and their SSA bodies.
//!
//! A [`FuncDef`] carries the signature data the analyzers need (positional
//! result slots, optional receiver) plus a sequence of basic blocks. Blocks
//! hold instructions; value-defining instructions reference the value arena
//! by id, and `Return` carries its operand list inline.

use serde::{Deserialize, Serialize};

use crate::id::{FuncId, PkgId, TypeId, ValueId};
use crate::source::Pos;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDef {
    pub id: FuncId,
    pub name: String,
    /// Owning package. `None` only for synthetic functions.
    pub pkg: Option<PkgId>,
    /// Positional result slot types.
    pub results: Vec<TypeId>,
    /// Receiver type for methods (possibly a pointer type); `None` for
    /// top-level functions.
    pub receiver: Option<TypeId>,
    pub blocks: Vec<Block>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub instrs: Vec<Instr>,
}

/// One SSA instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Instr {
    /// A value-defining instruction; the payload lives in the value arena.
    Value(ValueId),
    /// A return site with one operand per result slot.
    Return { results: Vec<ValueId>, pos: Pos },
}

impl FuncDef {
    /// Returns every return site in block order.
    pub fn return_sites(&self) -> Vec<(&[ValueId], Pos)> {
        let mut out = Vec::new();
        for block in &self.blocks {
            for instr in &block.instrs {
                if let Instr::Return { results, pos } = instr {
                    out.push((results.as_slice(), *pos));
                }
            }
        }
        out
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Exported-name test: an identifier is exported when its first character
/// is uppercase.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
