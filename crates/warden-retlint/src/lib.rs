//! Return-type tightening analyzer.
//!
//! For every function returning a designated interface, decides whether the
//! set of concrete types that could actually be returned is contained in a
//! user-supplied allow-list. Functions that fail are *dirty* and carry a
//! shortest causal chain of SSA values explaining the violation.
//!
//! Two front doors:
//! - [`RetLint::run`] is the standalone entry point over a program and a
//!   package set.
//! - `RetLint` also implements the enforcement framework's `Contract`, so
//!   `contract:RetLint` annotations dispatch it with configuration decoded
//!   from the annotation payload.

mod analyze;
pub mod error;
pub mod report;
pub mod status;

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use warden_contract::{CheckerError, Context, Contract};
use warden_ir::{FuncId, PkgId, Program, TypeId};

use analyze::Tightener;

pub use error::RetLintError;
pub use report::{render, render_why};
pub use status::{DirtyFunction, DirtyReason, State};

/// Analyzes functions which return an interface type, verifying that every
/// concrete value which could flow out is a member of an acceptable set of
/// types.
///
/// Type names are either unqualified, like `"error"`, resolved against the
/// universe scope, or qualified like `"example.com/mypkg/SomeType"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct RetLint {
    /// The names of the allowed types.
    pub allowed_names: Vec<String>,
    /// The name of the target interface.
    pub target_name: String,
}

/// The outcome of one analysis run.
#[derive(Debug)]
pub struct Analysis {
    dirty: Vec<DirtyFunction>,
    states: HashMap<FuncId, State>,
}

impl Analysis {
    /// Dirty functions that are declared in the analyzed packages and
    /// exported by name, sorted by package-relative name.
    pub fn dirty(&self) -> &[DirtyFunction] {
        &self.dirty
    }

    /// The terminal state of a function, if the analysis touched it.
    pub fn state(&self, func: FuncId) -> Option<State> {
        self.states.get(&func).copied()
    }
}

impl RetLint {
    /// Runs the analysis over the given packages of a frozen program.
    pub fn run(&self, program: &Program, packages: &[PkgId]) -> Result<Analysis, RetLintError> {
        if self.target_name.is_empty() {
            return Err(RetLintError::NoTarget);
        }
        let target = program.resolve(&self.target_name)?;
        let mut allowed: HashSet<TypeId> = HashSet::new();
        for name in &self.allowed_names {
            allowed.insert(program.resolve(name)?);
        }

        let mut tightener = Tightener::new(program, target, allowed);
        tightener.run(packages)?;
        let dirty = tightener.dirty(packages);
        Ok(Analysis {
            dirty,
            states: tightener.states(),
        })
    }
}

impl Contract for RetLint {
    /// Runs the analysis over the user packages of the context's program
    /// and reports each dirty exported function at its declaration, with
    /// the explanation chain indented underneath.
    fn enforce(&mut self, ctx: &mut dyn Context) -> Result<(), CheckerError> {
        let program = ctx.program();
        let packages = program.user_packages();
        let analysis = self.run(program, &packages)?;
        for d in analysis.dirty() {
            let def = program.func(d.func);
            let message = format!(
                "func {}{}",
                program.func_rel_name(d.func),
                report::render_why(program, d)
            );
            ctx.report(def.pos, message);
        }
        Ok(())
    }
}
