//! Human-readable rendering of dirty functions.
//!
//! The aggregate report enumerates every dirty function with its
//! explanation chain, one indented line per step. When a chain passes
//! through a callee that has already been printed, the chain is truncated
//! with "(already reported)".

use std::collections::HashSet;
use std::fmt::Write as _;

use warden_ir::{CallTarget, FuncId, Program, ValueKind};

use crate::status::DirtyFunction;

/// Renders the aggregate report with cross-function deduplication.
pub fn render(program: &Program, dirty: &[DirtyFunction]) -> String {
    let mut reported: HashSet<FuncId> = HashSet::new();
    let mut out = String::new();

    for d in dirty {
        if !reported.insert(d.func) {
            continue;
        }
        let def = program.func(d.func);
        let _ = write!(
            out,
            "{}: func {}",
            program.position(def.pos),
            program.func_rel_name(d.func)
        );

        for reason in &d.why {
            let _ = write!(
                out,
                "\n  {}: {}: {}",
                program.position(program.value(reason.value).pos),
                reason.reason,
                program.value_string(reason.value)
            );

            if let ValueKind::Call {
                target: CallTarget::Static(callee),
            } = &program.value(reason.value).kind
            {
                // Short-circuit chains through callees that have already
                // been explained for another caller.
                if !reported.insert(*callee) {
                    out.push_str(" (already reported)");
                    break;
                }
            }
        }
        out.push('\n');
    }

    out
}

/// The explanation chain for a single function, one indented line per step,
/// each `FILE:LINE:COL: REASON: VALUE`.
pub fn render_why(program: &Program, d: &DirtyFunction) -> String {
    let mut out = String::new();
    for reason in &d.why {
        let _ = write!(
            out,
            "\n  {}: {}: {}",
            program.position(program.value(reason.value).pos),
            reason.reason,
            program.value_string(reason.value)
        );
    }
    out
}
