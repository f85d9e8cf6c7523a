//! SSA values.
//!
//! The value vocabulary is a closed tagged sum, so the tightening analysis
//! is a single exhaustive `match` site. Anything outside the set the
//! analysis understands is an [`ValueKind::Opaque`] value carrying only its
//! static type.

use serde::{Deserialize, Serialize};

use crate::id::{FuncId, TypeId, ValueId};
use crate::source::Pos;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueDef {
    pub id: ValueId,
    /// Static type of the value (a tuple type for multi-result calls).
    pub ty: TypeId,
    pub kind: ValueKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueKind {
    /// A constant. `literal` is `None` for the nil constant.
    Const { literal: Option<String> },
    /// Selects element `index` of a tuple-valued SSA result.
    Extract { tuple: ValueId, index: usize },
    /// Wraps a concrete value into an interface-typed value.
    MakeInterface { operand: ValueId },
    /// Control-flow merge of the incoming edges.
    Phi { edges: Vec<ValueId> },
    /// Pointer dereference, `x := *y`.
    UnaryDeref { operand: ValueId },
    /// A type assertion; `comma_ok` marks the two-result form.
    TypeAssert {
        operand: ValueId,
        asserted: TypeId,
        comma_ok: bool,
    },
    /// A call instruction.
    Call { target: CallTarget },
    /// Any other value (parameter, field load, allocation, ...).
    Opaque { label: String },
}

/// How a call resolves its callee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallTarget {
    /// Statically dispatched to a known function.
    Static(FuncId),
    /// Dispatched through an interface method.
    Virtual { iface: TypeId, method: String },
    /// A func-valued callee; nothing static is known.
    Dynamic,
}
