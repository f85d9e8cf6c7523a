//! Contract-alias expansion.
//!
//! An alias binds a synonym name to one or more `(contract, config)` pairs.
//! Expansion replaces a target whose contract names an alias with copies of
//! the target carrying each terminal binding, recursing through aliases of
//! aliases. A `seen` set over binding identities rejects cycles.

use std::collections::HashSet;

use warden_ir::Program;

use crate::error::EnforceError;
use crate::target::{AliasBinding, AliasTable, Target};

/// Expands a single target into its terminal form(s). Targets that do not
/// name an alias are returned as-is, which makes expansion idempotent on
/// already-terminal targets.
pub(crate) fn expand(
    base: Target,
    aliases: &AliasTable,
    program: &Program,
) -> Result<Vec<Target>, EnforceError> {
    let Some(first) = aliases.get(&base.contract) else {
        return Ok(vec![base]);
    };

    let mut term = Vec::new();
    // Detect recursively-defined contracts. This only matters for alias
    // chains that are mutually referent.
    let mut seen: HashSet<usize> = HashSet::new();
    let mut non_term: Vec<&AliasBinding> = first.iter().collect();

    while !non_term.is_empty() {
        let work = std::mem::take(&mut non_term);
        for alias in work {
            if !seen.insert(alias.id) {
                return Err(EnforceError::AliasCycle {
                    pos: program.position(base.pos),
                    name: alias.contract.clone(),
                });
            }
            if let Some(more) = aliases.get(&alias.contract) {
                non_term.extend(more.iter());
            } else {
                let mut dup = base.clone();
                dup.contract = alias.contract.clone();
                dup.config = alias.config.clone();
                term.push(dup);
            }
        }
    }

    term.sort_by_key(|t| program.position(t.pos));
    Ok(term)
}

/// Expands every target in order.
pub(crate) fn expand_all(
    targets: Vec<Target>,
    aliases: &AliasTable,
    program: &Program,
) -> Result<Vec<Target>, EnforceError> {
    let mut expanded = Vec::with_capacity(targets.len());
    for target in targets {
        expanded.extend(expand(target, aliases, program)?);
    }
    Ok(expanded)
}
