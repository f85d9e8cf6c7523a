//! The contract enforcement runtime.
//!
//! An [`Enforcer`] drives the full pipeline over a frozen program: parallel
//! discovery of contract annotations and interface-implementation
//! assertions, alias expansion, checker instantiation from JSON payloads,
//! and the concurrent enforcement wave whose diagnostics funnel into a
//! position-sorted [`Results`] map.

pub mod alias;
pub mod cancel;
pub mod discover;
pub mod error;
pub mod report;
pub mod schedule;
pub mod target;

use std::sync::Arc;

use tracing::debug;

use warden_contract::{ContractProviders, TypeOracle};
use warden_ir::{Program, TypeId};

pub use cancel::CancelToken;
pub use error::EnforceError;
pub use report::{Diagnostic, Results};
pub use target::{AliasBinding, AliasTable, Assertion, Discovery, Target};

use schedule::ResolvedTarget;

/// The main entry point for an enforcement run.
pub struct Enforcer {
    /// The frozen typed program; outlives all analysis state.
    pub program: Arc<Program>,
    /// Providers for the contract types this run knows about.
    pub contracts: ContractProviders,
    /// The named-type underlying that marks alias declarations; `None`
    /// silently disables alias interpretation.
    pub contract_capability: Option<TypeId>,
    /// Display name of this enforcer instance.
    pub name: String,
    /// Include test sources during discovery.
    pub tests: bool,
}

impl Enforcer {
    pub fn new(program: Arc<Program>, contracts: ContractProviders) -> Self {
        Enforcer {
            program,
            contracts,
            contract_capability: None,
            name: "warden".to_string(),
            tests: false,
        }
    }

    /// Runs discovery only. Exposed so callers can inspect the raw target,
    /// assertion, and alias sets.
    pub fn discover(&self, cancel: &CancelToken) -> Result<Discovery, EnforceError> {
        discover::find_contracts(&self.program, self.contract_capability, self.tests, cancel)
    }

    /// Runs the whole pipeline and returns the position-sorted diagnostics.
    pub fn execute(&self, cancel: &CancelToken) -> Result<Results, EnforceError> {
        let discovery = self.discover(cancel)?;
        debug!(
            enforcer = %self.name,
            targets = discovery.targets.len(),
            assertions = discovery.assertions.len(),
            aliases = discovery.aliases.len(),
            "discovery complete"
        );

        let expanded = alias::expand_all(discovery.targets, &discovery.aliases, &self.program)?;
        let resolved = self.instantiate(expanded)?;

        let pairs: Vec<(TypeId, TypeId)> = discovery
            .assertions
            .iter()
            .map(|a| (a.iface, a.implementor))
            .collect();
        let oracle = Arc::new(TypeOracle::new(Arc::clone(&self.program), &pairs));

        schedule::enforce_all(&self.program, &oracle, resolved, cancel)
    }

    /// Pairs every terminal target with a configured checker instance.
    fn instantiate(&self, targets: Vec<Target>) -> Result<Vec<ResolvedTarget>, EnforceError> {
        targets
            .into_iter()
            .map(|target| {
                match self.contracts.instantiate(&target.contract, &target.config) {
                    None => Err(EnforceError::MissingProvider {
                        pos: self.program.position(target.pos),
                        name: target.contract.clone(),
                    }),
                    Some(Err(source)) => Err(EnforceError::BadConfig {
                        pos: self.program.position(target.pos),
                        source,
                    }),
                    Some(Ok(checker)) => Ok(ResolvedTarget { target, checker }),
                }
            })
            .collect()
    }
}
