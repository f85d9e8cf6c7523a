//! The tightening engine.
//!
//! For every function with result slots of the target interface type, a
//! backward structural walk over the SSA values reaching each return site
//! decides whether every concrete type that may flow out belongs to the
//! allow-list. Functions found wanting are marked dirty with a minimal
//! explanation chain; inter-procedural edges propagate dirtiness through
//! dependent back-edges, cycle-safe via deferred resolution.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use tracing::trace;

use warden_ir::{CallTarget, FuncId, PkgId, Program, TypeId, TypeKind, ValueId, ValueKind};

use crate::error::RetLintError;
use crate::status::{because, DirtyFunction, DirtyReason, FuncStatus, State};

pub(crate) struct Tightener<'p> {
    program: &'p Program,
    /// The interface that triggers the analysis.
    target: TypeId,
    /// The acceptable concrete named types.
    allowed: HashSet<TypeId>,
    stats: HashMap<FuncId, FuncStatus>,
    /// New status records are queued here and processed in batches.
    work: Vec<FuncId>,
}

impl<'p> Tightener<'p> {
    pub fn new(program: &'p Program, target: TypeId, allowed: HashSet<TypeId>) -> Self {
        Tightener {
            program,
            target,
            allowed,
            stats: HashMap::new(),
            work: Vec::new(),
        }
    }

    /// Seeds the work queue from the packages' top-level declarations and
    /// drives the fixed point until it stabilizes. After this returns, every
    /// touched function is terminally Clean or Dirty.
    pub fn run(&mut self, packages: &[PkgId]) -> Result<(), RetLintError> {
        // Bootstrap: top-level functions plus the value- and
        // pointer-receiver method sets of top-level named types.
        for &pkg in packages {
            let funcs = self.program.package(pkg).funcs.clone();
            for func in funcs {
                self.ensure(func);
            }
            let types = self.program.package(pkg).types.clone();
            for ty in types {
                let methods: Vec<FuncId> =
                    self.program.methods_of(ty).map(|m| m.func).collect();
                for func in methods {
                    self.ensure(func);
                }
            }
        }

        // Loop until no new functions have been discovered.
        while !self.work.is_empty() {
            let batch = std::mem::take(&mut self.work);
            for func in batch {
                // Defensive recovery: attach the function name if the
                // analyzer trips over an unexpected shape.
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.analyze(func)));
                if let Err(payload) = outcome {
                    return Err(RetLintError::AnalysisPanic {
                        function: self.program.func_rel_name(func),
                        message: panic_message(payload),
                    });
                }
            }
        }

        // Any function not dirty by now is clean.
        for stat in self.stats.values_mut() {
            if stat.state == State::Analyzing {
                stat.state = State::Clean;
            }
        }
        Ok(())
    }

    pub fn state(&self, func: FuncId) -> Option<State> {
        self.stats.get(&func).map(|s| s.state)
    }

    /// Dirty functions declared in the given packages and exported by name,
    /// sorted by package-relative name.
    pub fn dirty(&self, packages: &[PkgId]) -> Vec<DirtyFunction> {
        let pkgs: HashSet<PkgId> = packages.iter().copied().collect();
        let mut out: Vec<DirtyFunction> = self
            .stats
            .values()
            .filter(|s| s.state == State::Dirty)
            .filter(|s| {
                let def = self.program.func(s.func);
                warden_ir::is_exported(&def.name)
                    && def.pkg.is_some_and(|p| pkgs.contains(&p))
            })
            .map(|s| DirtyFunction {
                func: s.func,
                why: s.why.clone(),
            })
            .collect();
        out.sort_by_key(|d| self.program.func_rel_name(d.func));
        out
    }

    pub fn states(self) -> HashMap<FuncId, State> {
        self.stats.into_iter().map(|(f, s)| (f, s.state)).collect()
    }

    /// Allocates the status record for a function on first sight. Functions
    /// without target-typed result slots are immediately clean; the rest
    /// join the work queue with their return sites extracted.
    fn ensure(&mut self, func: FuncId) {
        if self.stats.contains_key(&func) {
            return;
        }
        let def = self.program.func(func);
        let target_indexes: Vec<usize> = def
            .results
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r == self.target)
            .map(|(i, _)| i)
            .collect();

        let mut status = FuncStatus::new(func);
        if target_indexes.is_empty() {
            status.state = State::Clean;
            self.stats.insert(func, status);
            return;
        }
        status.returns = def
            .return_sites()
            .into_iter()
            .map(|(results, pos)| (results.to_vec(), pos))
            .collect();
        status.target_indexes = target_indexes;
        self.stats.insert(func, status);
        self.work.push(func);
    }

    /// Begins the analysis of a function; a no-op unless the function is
    /// still Unknown.
    fn analyze(&mut self, func: FuncId) {
        if self.stats[&func].state != State::Unknown {
            return;
        }
        self.status_mut(func).state = State::Analyzing;
        trace!(func = %self.program.func_rel_name(func), "analyzing");

        let returns = self.stats[&func].returns.clone();
        let target_indexes = self.stats[&func].target_indexes.clone();
        // The visitation memo guards against phi-cycles.
        let mut seen = HashSet::new();
        for (results, _) in &returns {
            for &index in &target_indexes {
                let Some(&val) = results.get(index) else {
                    continue;
                };
                self.decide(func, val, &mut seen);
                if self.stats[&func].state != State::Analyzing {
                    return;
                }
            }
        }
    }

    /// Marks the function dirty if the value cannot be statically resolved
    /// to allowed concrete types.
    fn decide(&mut self, func: FuncId, val: ValueId, seen: &mut HashSet<ValueId>) {
        if !seen.insert(val) {
            return;
        }
        let vdef = self.program.value(val).clone();
        match vdef.kind {
            ValueKind::Call { target } => {
                // All functions the call could invoke must be clean. A
                // statically-resolvable call has exactly one; an interface
                // invocation conservatively considers every implementing
                // type in the program.
                let callees: Vec<FuncId> = match target {
                    CallTarget::Static(g) => vec![g],
                    CallTarget::Virtual { iface, method } => self.virtual_callees(iface, &method),
                    CallTarget::Dynamic => Vec::new(),
                };
                if callees.is_empty() {
                    self.mark_dirty(func, because(val, "callee not static".to_string()));
                } else {
                    for callee in callees {
                        self.ensure(callee);
                        self.analyze(callee);
                        match self.stats[&callee].state {
                            State::Clean => {
                                // Already proven clean, ignore.
                            }
                            State::Dirty => {
                                // Already proven dirty, propagate the reason.
                                let mut why = Vec::with_capacity(self.stats[&callee].why.len() + 1);
                                why.push(DirtyReason::new("calls", val));
                                why.extend(self.stats[&callee].why.iter().cloned());
                                self.mark_dirty(func, why);
                            }
                            State::Unknown | State::Analyzing => {
                                // Mark for future dirtying.
                                self.status_mut(callee).dependents.insert(func, val);
                            }
                        }
                    }
                }
            }

            ValueKind::Const { literal } => {
                // `return nil` never contributes to dirtiness.
                if literal.is_some() && !self.is_allowed(vdef.ty) {
                    let reason =
                        format!("constant of type \"{}\"", self.program.type_string(vdef.ty));
                    self.mark_dirty(func, because(val, reason));
                }
            }

            // How a (comma, ok) expression or multiple-return call is
            // unpacked.
            ValueKind::Extract { tuple, .. } => self.decide(func, tuple, seen),

            // A value being wrapped as an interface, often implicitly.
            ValueKind::MakeInterface { operand } => self.decide(func, operand, seen),

            ValueKind::Phi { edges } => {
                for edge in edges {
                    self.decide(func, edge, seen);
                }
            }

            ValueKind::TypeAssert { asserted, .. } => {
                // The asserted type is checked regardless of comma-ok
                // control flow; this over-approximates on purpose.
                if !self.is_allowed(asserted) {
                    let reason =
                        format!("assertion to \"{}\"", self.program.type_string(asserted));
                    self.mark_dirty(func, because(val, reason));
                }
            }

            ValueKind::UnaryDeref { operand } => self.decide(func, operand, seen),

            ValueKind::Opaque { .. } => {
                // A named result type (possibly behind one pointer level)
                // must be allow-listed; anything else is conservatively
                // clean for this edge.
                if self.program.deref_named(vdef.ty).is_some() && !self.is_allowed(vdef.ty) {
                    let reason = format!(
                        "result of disallowed type \"{}\"",
                        self.program.type_string(vdef.ty)
                    );
                    self.mark_dirty(func, because(val, reason));
                }
            }
        }
    }

    /// Every concrete implementation of `method` on types implementing the
    /// receiver interface, program-wide.
    fn virtual_callees(&self, iface: TypeId, method: &str) -> Vec<FuncId> {
        self.program
            .named_types()
            .into_iter()
            .filter(|&t| !self.program.is_interface(t))
            .filter(|&t| self.program.satisfies(t, iface, false))
            .filter_map(|t| self.program.method(t, method).map(|m| m.func))
            .collect()
    }

    /// Compares a type against the allow-list, treating a pointer to an
    /// acceptable type as acceptable. Tuples must have been unpacked at the
    /// extract step.
    fn is_allowed(&self, ty: TypeId) -> bool {
        let mut look = ty;
        loop {
            match &self.program.type_def(look).kind {
                TypeKind::Pointer { elem } => look = *elem,
                TypeKind::Named { .. } => return self.allowed.contains(&look),
                TypeKind::Tuple { .. } => {
                    panic!("should not see a tuple type; unpack at the extract step")
                }
                _ => return false,
            }
        }
    }

    /// Marks a function dirty and propagates the reason to its dependents.
    /// A strictly shorter explanation replaces the previous one and
    /// re-propagates.
    fn mark_dirty(&mut self, func: FuncId, why: Vec<DirtyReason>) {
        let stat = self.status_mut(func);
        let mut changed = false;
        if stat.why.is_empty() || why.len() < stat.why.len() {
            stat.why = why.clone();
            changed = true;
        }
        if stat.state == State::Dirty && !changed {
            return;
        }
        stat.state = State::Dirty;

        let dependents: Vec<(FuncId, ValueId)> =
            stat.dependents.iter().map(|(d, c)| (*d, *c)).collect();
        for (dependent, call) in dependents {
            let mut next = Vec::with_capacity(why.len() + 1);
            next.push(DirtyReason::new("calls", call));
            next.extend(why.iter().cloned());
            self.mark_dirty(dependent, next);
        }
    }

    fn status_mut(&mut self, func: FuncId) -> &mut FuncStatus {
        match self.stats.get_mut(&func) {
            Some(stat) => stat,
            // Every caller goes through ensure() first; the panic shield
            // turns a violation into an AnalysisPanic.
            None => panic!("no status record for function {func}"),
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
