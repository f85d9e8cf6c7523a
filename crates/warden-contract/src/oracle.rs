//! The type oracle.
//!
//! Answers questions about the program's type system. All methods are safe
//! to call from multiple checker threads. Asserted-implementor answers come
//! straight from the discovery phase; whole-program answers are computed on
//! first use under an exclusive lock and cached, so the first reader
//! computes and later readers wait.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use warden_ir::{FuncId, Program, TypeId};

pub struct TypeOracle {
    program: Arc<Program>,
    /// Interface -> implementing types, from explicit assertions.
    asserted: HashMap<TypeId, Vec<TypeId>>,
    /// Memo for the whole-program answer, built lazily per interface.
    all_cache: RwLock<HashMap<TypeId, Vec<TypeId>>>,
}

impl TypeOracle {
    /// Constructs an oracle over `(interface, implementor)` assertion
    /// pairs. Checkers should prefer the shared instance surfaced by their
    /// `Context` rather than constructing a new one.
    pub fn new(program: Arc<Program>, assertions: &[(TypeId, TypeId)]) -> Self {
        let mut asserted: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for &(iface, implementor) in assertions {
            asserted.entry(iface).or_default().push(implementor);
        }
        TypeOracle {
            program,
            asserted,
            all_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The named types implementing `iface`.
    ///
    /// With `asserted_only`, the answer is exactly the set gathered from
    /// blank-variable assertions, in assertion order. Otherwise it is every
    /// concrete named type in the program whose method set (value or
    /// pointer receiver) satisfies the interface, in stable
    /// (package path, name) order. The returned vector is the caller's to
    /// keep.
    pub fn types_implementing(&self, iface: TypeId, asserted_only: bool) -> Vec<TypeId> {
        if asserted_only {
            return self.asserted.get(&iface).cloned().unwrap_or_default();
        }

        if let Some(hit) = self
            .all_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&iface)
        {
            return hit.clone();
        }

        let mut cache = self
            .all_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another reader may have raced us to the write lock.
        if let Some(hit) = cache.get(&iface) {
            return hit.clone();
        }
        let computed: Vec<TypeId> = self
            .program
            .named_types()
            .into_iter()
            .filter(|&t| !self.program.is_interface(t))
            .filter(|&t| self.program.satisfies(t, iface, false))
            .collect();
        cache.insert(iface, computed.clone());
        computed
    }

    /// For each type implementing `iface`, the concrete function
    /// implementing method `name` on it. Entries are `None` when the type
    /// has no such method, preserving index alignment with
    /// [`types_implementing`](Self::types_implementing).
    pub fn method_implementors(
        &self,
        iface: TypeId,
        name: &str,
        asserted_only: bool,
    ) -> Vec<Option<FuncId>> {
        self.types_implementing(iface, asserted_only)
            .into_iter()
            .map(|t| self.program.method(t, name).map(|m| m.func))
            .collect()
    }
}
