//! Per-function analysis state.
//!
//! Each function with target-typed result slots owns one status record. The
//! state machine is Unknown -> Analyzing -> Clean | Dirty; Clean and Dirty
//! are terminal. Back-edges to dependents are stored as id maps, never as
//! owning references.

use indexmap::IndexMap;

use warden_ir::{FuncId, Pos, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unknown,
    Analyzing,
    Clean,
    Dirty,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            State::Unknown => "Unknown",
            State::Analyzing => "Analyzing",
            State::Clean => "Clean",
            State::Dirty => "Dirty",
        };
        f.write_str(s)
    }
}

/// One step of a dirtiness explanation: why, anchored at which SSA value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyReason {
    pub reason: String,
    pub value: ValueId,
}

impl DirtyReason {
    pub fn new(reason: impl Into<String>, value: ValueId) -> Self {
        DirtyReason {
            reason: reason.into(),
            value,
        }
    }
}

/// Builds a single-step explanation.
pub(crate) fn because(value: ValueId, reason: String) -> Vec<DirtyReason> {
    vec![DirtyReason { reason, value }]
}

/// The status record the tightener keeps per function.
#[derive(Debug)]
pub(crate) struct FuncStatus {
    pub func: FuncId,
    pub state: State,
    /// Return sites: operand list plus position, in block order.
    pub returns: Vec<(Vec<ValueId>, Pos)>,
    /// Indices of result slots whose static type is the target interface.
    pub target_indexes: Vec<usize>,
    /// Functions whose dirtiness depends on this one, with the call value
    /// that links them. Insertion-ordered so tie-breaking is first-seen.
    pub dependents: IndexMap<FuncId, ValueId>,
    /// The shortest explanation chain seen so far; empty means unset.
    pub why: Vec<DirtyReason>,
}

impl FuncStatus {
    pub fn new(func: FuncId) -> Self {
        FuncStatus {
            func,
            state: State::Unknown,
            returns: Vec::new(),
            target_indexes: Vec::new(),
            dependents: IndexMap::new(),
            why: Vec::new(),
        }
    }
}

/// A dirty function surfaced by the analysis, with its explanation chain.
#[derive(Debug, Clone)]
pub struct DirtyFunction {
    pub func: FuncId,
    pub why: Vec<DirtyReason>,
}
