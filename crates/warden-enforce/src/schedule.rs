//! The enforcement wave.
//!
//! Pairs each terminal target with its checker instance and a context, and
//! dispatches them across a CPU-sized worker pool. The first checker error
//! aborts the wave; checker panics are recovered at the dispatch boundary.
//! Diagnostics flow through an mpsc channel into a single collector thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use tracing::debug;

use warden_contract::{Context, Contract, Kind, MemberRef, TypeOracle};
use warden_ir::{Pos, Program};

use crate::cancel::CancelToken;
use crate::error::EnforceError;
use crate::report::{Diagnostic, Results};
use crate::target::Target;

/// A terminal target paired with its configured checker instance. Each one
/// is moved into its task and dropped when the checker returns.
pub(crate) struct ResolvedTarget {
    pub target: Target,
    pub checker: Box<dyn Contract>,
}

struct ContextImpl {
    contract: String,
    kind: Kind,
    declaration: MemberRef,
    objects: Vec<MemberRef>,
    program: Arc<Program>,
    oracle: Arc<TypeOracle>,
    reports: Sender<Diagnostic>,
    cancel: CancelToken,
}

impl Context for ContextImpl {
    fn contract(&self) -> &str {
        &self.contract
    }

    fn declaration(&self) -> &MemberRef {
        &self.declaration
    }

    fn kind(&self) -> Kind {
        self.kind
    }

    fn objects(&self) -> &[MemberRef] {
        &self.objects
    }

    fn oracle(&self) -> &TypeOracle {
        &self.oracle
    }

    fn program(&self) -> &Program {
        &self.program
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn report(&self, pos: Pos, message: String) {
        // The collector outlives every sender; a failed send only means the
        // run is already tearing down.
        let _ = self.reports.send(Diagnostic {
            pos: self.program.position(pos),
            message,
        });
    }
}

/// Runs every resolved target to completion, or aborts on cancellation or
/// the first checker failure.
pub(crate) fn enforce_all(
    program: &Arc<Program>,
    oracle: &Arc<TypeOracle>,
    resolved: Vec<ResolvedTarget>,
    cancel: &CancelToken,
) -> Result<Results, EnforceError> {
    let (tx, rx) = mpsc::channel::<Diagnostic>();
    let collector = thread::spawn(move || {
        let mut results = Results::default();
        for diagnostic in rx {
            results.insert(diagnostic);
        }
        results
    });

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build()
        .map_err(|e| EnforceError::Pool(e.to_string()))?;

    let outcome = pool.install(|| {
        resolved.into_par_iter().try_for_each_init(
            || tx.clone(),
            |tx, rt| enforce_one(program, oracle, rt, tx, cancel),
        )
    });

    drop(tx);
    let results = collector
        .join()
        .map_err(|_| EnforceError::Pool("report collector panicked".to_string()))?;
    outcome?;
    Ok(results)
}

/// Resolves one target into the member set its checker receives and runs
/// the checker behind a panic shield.
fn enforce_one(
    program: &Arc<Program>,
    oracle: &Arc<TypeOracle>,
    resolved: ResolvedTarget,
    reports: &mut Sender<Diagnostic>,
    cancel: &CancelToken,
) -> Result<(), EnforceError> {
    if cancel.is_cancelled() {
        return Err(EnforceError::Cancelled);
    }
    let ResolvedTarget { target, mut checker } = resolved;
    debug!(tgt = %target.describe(program), "enforce");

    let (declaration, objects) = resolve_objects(oracle, &target);
    let decl_name = member_name(program, &declaration);

    let mut ctx = ContextImpl {
        contract: target.contract.clone(),
        kind: target.kind,
        declaration,
        objects,
        program: Arc::clone(program),
        oracle: Arc::clone(oracle),
        reports: reports.clone(),
        cancel: cancel.clone(),
    };

    match panic::catch_unwind(AssertUnwindSafe(|| checker.enforce(&mut ctx))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(EnforceError::Checker {
            pos: program.position(target.pos),
            message: e.to_string(),
        }),
        Err(payload) => Err(EnforceError::CheckerPanic {
            contract: target.contract,
            declaration: decl_name,
            message: panic_message(payload),
        }),
    }
}

/// Maps a target to the declaration and object set its checker sees; see
/// the kind table on [`Kind`].
fn resolve_objects(oracle: &TypeOracle, target: &Target) -> (MemberRef, Vec<MemberRef>) {
    match (&target.kind, &target.object) {
        (Kind::Interface, MemberRef::Type(iface)) => {
            let objects = oracle
                .types_implementing(*iface, true)
                .into_iter()
                .map(MemberRef::Type)
                .collect();
            (MemberRef::Type(*iface), objects)
        }
        (Kind::InterfaceMethod, MemberRef::IfaceMethod { iface, method }) => {
            let objects = oracle
                .method_implementors(*iface, method, true)
                .into_iter()
                .flatten()
                .map(MemberRef::Func)
                .collect();
            (MemberRef::Type(*iface), objects)
        }
        _ => (target.object.clone(), vec![target.object.clone()]),
    }
}

fn member_name(program: &Program, member: &MemberRef) -> String {
    match member {
        MemberRef::Func(f) => program.func_rel_name(*f),
        MemberRef::Type(t) => program.type_string(*t),
        MemberRef::IfaceMethod { iface, method } => {
            format!("{}.{}", program.type_string(*iface), method)
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
