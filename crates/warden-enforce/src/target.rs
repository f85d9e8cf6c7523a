//! Discovery outputs: targets, assertions, and alias bindings.

use indexmap::IndexMap;

use warden_contract::{Kind, MemberRef};
use warden_ir::{Pos, Program, TypeId};

/// A discovered contract binding. Created during discovery, possibly
/// multiplied by alias expansion, consumed exactly once by the scheduler.
#[derive(Debug, Clone)]
pub struct Target {
    pub contract: String,
    /// Raw JSON configuration payload; may be empty.
    pub config: String,
    pub kind: Kind,
    /// The annotated member.
    pub object: MemberRef,
    pub pos: Pos,
}

impl Target {
    /// Debug rendering, mirroring `name := contract config`.
    pub fn describe(&self, program: &Program) -> String {
        let thing = match &self.object {
            MemberRef::Func(f) => format!("func {}", program.func_rel_name(*f)),
            MemberRef::Type(t) => format!("type {}", program.type_string(*t)),
            MemberRef::IfaceMethod { iface, method } => {
                format!("field {}.{}", program.type_string(*iface), method)
            }
        };
        format!(
            "{} {} := {} {}",
            program.position(self.pos),
            thing,
            self.contract,
            self.config
        )
    }
}

/// A top-level declaration of the forms `var _ SomeInterface = SomeStruct{}`
/// or `var _ SomeInterface = &SomeStruct{}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// The named interface type.
    pub iface: TypeId,
    /// The named struct type.
    pub implementor: TypeId,
    /// True for the address-of form: the interface is implemented through
    /// pointer receivers.
    pub ptr: bool,
    pub pos: Pos,
}

/// One expansion of a contract alias: the alias name maps to this contract
/// with this pre-baked configuration.
#[derive(Debug, Clone)]
pub struct AliasBinding {
    /// Unique id across the run; the cycle detector keys on it.
    pub id: usize,
    pub contract: String,
    pub config: String,
    pub pos: Pos,
}

/// Alias name -> expansions, iterated in deterministic order.
pub type AliasTable = IndexMap<String, Vec<AliasBinding>>;

/// Everything the discovery phase produced, position-sorted.
#[derive(Debug, Default)]
pub struct Discovery {
    pub targets: Vec<Target>,
    pub assertions: Vec<Assertion>,
    pub aliases: AliasTable,
}
