//! The contract surface between checkers and the enforcer runtime.
//!
//! A checker is any [`Contract`] implementation. The enforcer constructs one
//! instance per terminal target through a registered provider, decodes the
//! annotation's JSON payload into it, and calls [`Contract::enforce`] with a
//! [`Context`] capability describing the target and exposing the program,
//! the [`TypeOracle`], and diagnostic reporting.

pub mod oracle;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use warden_ir::{FuncId, Pos, Program, TypeId};

pub use oracle::TypeOracle;

/// Errors a checker may surface from [`Contract::enforce`]. The enforcer
/// aborts the run on the first one, annotated with the target's position.
pub type CheckerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How and where a contract binding was declared.
///
/// The kind tells the checker what to expect from [`Context::declaration`]
/// and [`Context::objects`]:
///
/// | Kind            | `declaration()`        | `objects()`                  |
/// |-----------------|------------------------|------------------------------|
/// | Method          | the method             | `[declaration]`              |
/// | Function        | the function           | `[declaration]`              |
/// | Interface       | the interface type     | asserted implementing types  |
/// | InterfaceMethod | the interface type     | implementing functions       |
/// | Type            | the type               | `[declaration]`              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Method,
    Function,
    Interface,
    InterfaceMethod,
    Type,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Kind::Method => "Method",
            Kind::Function => "Function",
            Kind::Interface => "Interface",
            Kind::InterfaceMethod => "InterfaceMethod",
            Kind::Type => "Type",
        };
        f.write_str(s)
    }
}

/// A reference to a program member a contract binding names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    Func(FuncId),
    Type(TypeId),
    /// A method declared inside an interface body.
    IfaceMethod { iface: TypeId, method: String },
}

/// The capability surfaced to a checker while it runs.
pub trait Context {
    /// The contract name the binding was declared under.
    fn contract(&self) -> &str;
    /// The annotated member.
    fn declaration(&self) -> &MemberRef;
    fn kind(&self) -> Kind;
    /// The member set the binding maps to; see the table on [`Kind`].
    fn objects(&self) -> &[MemberRef];
    fn oracle(&self) -> &TypeOracle;
    fn program(&self) -> &Program;
    /// Observation point for run cancellation; long checkers should poll it.
    fn is_cancelled(&self) -> bool;
    /// Emits a diagnostic associated with a source position.
    fn report(&self, pos: Pos, message: String);
}

/// A checker implementing some correctness-checking logic.
pub trait Contract: Send {
    fn enforce(&mut self, ctx: &mut dyn Context) -> Result<(), CheckerError>;
}

/// Constructs a checker instance from a raw JSON payload (may be empty).
pub type Provider =
    Arc<dyn Fn(&str) -> Result<Box<dyn Contract>, serde_json::Error> + Send + Sync>;

/// The provider registry, keyed by contract name.
#[derive(Default, Clone)]
pub struct ContractProviders {
    providers: IndexMap<String, Provider>,
}

impl ContractProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a checker type constructed via `Default` and configured by
    /// decoding the JSON payload into it. Unknown payload fields are
    /// rejected when the type carries `#[serde(deny_unknown_fields)]`.
    pub fn register<T>(&mut self, name: &str)
    where
        T: Contract + DeserializeOwned + Default + 'static,
    {
        self.register_with(name, |config| {
            let checker: T = if config.is_empty() {
                T::default()
            } else {
                serde_json::from_str(config)?
            };
            Ok(Box::new(checker))
        });
    }

    /// Registers an arbitrary provider closure.
    pub fn register_with<F>(&mut self, name: &str, provider: F)
    where
        F: Fn(&str) -> Result<Box<dyn Contract>, serde_json::Error> + Send + Sync + 'static,
    {
        self.providers.insert(name.to_string(), Arc::new(provider));
    }

    /// Instantiates a checker for `name`, or `None` when no provider is
    /// registered under that name.
    pub fn instantiate(
        &self,
        name: &str,
        config: &str,
    ) -> Option<Result<Box<dyn Contract>, serde_json::Error>> {
        self.providers.get(name).map(|p| p(config))
    }

    /// Registered contract names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Configurable {
        #[serde(default, rename = "Expected")]
        expected: i64,
    }

    impl Contract for Configurable {
        fn enforce(&mut self, _ctx: &mut dyn Context) -> Result<(), CheckerError> {
            Ok(())
        }
    }

    #[test]
    fn empty_payload_uses_default() {
        let mut providers = ContractProviders::new();
        providers.register::<Configurable>("Configurable");
        assert!(providers.instantiate("Configurable", "").unwrap().is_ok());
    }

    #[test]
    fn payload_is_decoded() {
        let mut providers = ContractProviders::new();
        providers.register::<Configurable>("Configurable");
        let checker = providers
            .instantiate("Configurable", r#"{ "Expected": 1 }"#)
            .unwrap();
        assert!(checker.is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut providers = ContractProviders::new();
        providers.register::<Configurable>("Configurable");
        let checker = providers
            .instantiate("Configurable", r#"{ "Expectde": 1 }"#)
            .unwrap();
        assert!(checker.is_err());
    }

    #[test]
    fn missing_provider_is_none() {
        let providers = ContractProviders::new();
        assert!(providers.instantiate("NoSuch", "").is_none());
    }

    #[test]
    fn names_in_registration_order() {
        let mut providers = ContractProviders::new();
        providers.register::<Configurable>("B");
        providers.register::<Configurable>("A");
        let names: Vec<&str> = providers.names().collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
