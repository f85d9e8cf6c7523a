//! End-to-end enforcement over a statically-built demo program: annotation
//! discovery, assertion capture, alias expansion with baked configuration,
//! per-kind object resolution, and the failure policy.

use std::sync::{Arc, Mutex};

use serde::Deserialize;

use warden_contract::{
    CheckerError, Context, Contract, ContractProviders, Kind, MemberRef,
};
use warden_enforce::{CancelToken, EnforceError, Enforcer};
use warden_ir::{Instr, Program, ProgramBuilder, TypeId, ValueKind};

/// What one checker invocation observed.
#[derive(Debug, Clone)]
struct Observation {
    contract: String,
    kind: Kind,
    expected: i64,
    objects: usize,
}

type Log = Arc<Mutex<Vec<Observation>>>;

/// A configurable contract: every object must return the expected integer
/// constant.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct MustReturnInt {
    expected: i64,
    #[serde(skip)]
    log: Option<Log>,
}

impl Contract for MustReturnInt {
    fn enforce(&mut self, ctx: &mut dyn Context) -> Result<(), CheckerError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(Observation {
                contract: ctx.contract().to_string(),
                kind: ctx.kind(),
                expected: self.expected,
                objects: ctx.objects().len(),
            });
        }
        let program = ctx.program();
        for object in ctx.objects() {
            let MemberRef::Func(func) = object else {
                continue;
            };
            for block in &program.func(*func).blocks {
                for instr in &block.instrs {
                    let Instr::Return { results, pos } = instr else {
                        continue;
                    };
                    let [result] = results.as_slice() else {
                        ctx.report(*pos, "exactly one return value is required".into());
                        continue;
                    };
                    match &program.value(*result).kind {
                        ValueKind::Const {
                            literal: Some(lit),
                        } if *lit == self.expected.to_string() => {}
                        ValueKind::Const { literal } => ctx.report(
                            *pos,
                            format!(
                                "expecting {}, got {}",
                                self.expected,
                                literal.as_deref().unwrap_or("nil")
                            ),
                        ),
                        _ => ctx.report(*pos, "not a constant value".into()),
                    }
                }
            }
        }
        Ok(())
    }
}

/// The demo program: a contract-capability interface, an interface method
/// annotation, two implementors with assertions, and an alias with two
/// usages.
fn demo_program() -> (Program, TypeId) {
    let mut b = ProgramBuilder::new();

    let ext = b.import("example.com/warden/ext", "ext");
    let efile = b.file(ext, "ext.go");
    let epos = b.pos(efile, 5, 1);
    let capability = b.interface_form(&["Enforce"]);
    b.named(ext, "Contract", capability, epos);

    let pkg = b.package("example.com/demo", "demo");
    let file = b.file(pkg, "demo.go");

    // type ReturnsNumber interface {
    //   //contract:MustReturnInt { "Expected" : 1 }
    //   ReturnOne() int
    // }
    let p = b.pos(file, 10, 1);
    let returns_number = b.named_interface(pkg, "ReturnsNumber", &["ReturnOne"], p);
    let member_pos = b.pos(file, 12, 2);
    let member = warden_ir::TypeMember {
        name: "ReturnOne".into(),
        is_func: true,
        comments: vec![r#"//contract:MustReturnInt { "Expected" : 1 }"#.into()],
        pos: member_pos,
    };
    b.decl_type_with_members(file, returns_number, &[], vec![member], p);

    // type ShouldPass struct{}; func (ShouldPass) ReturnOne() int { return 1 }
    let p = b.pos(file, 20, 1);
    let should_pass = b.named_struct(pkg, "ShouldPass", p);
    b.decl_type(file, should_pass, &[], p);
    let ret_pos = b.pos(file, 21, 2);
    let pass_fn = b.method(should_pass, false, "ReturnOne", &[TypeId::INT], p);
    let one = b.const_val(pass_fn, TypeId::INT, Some("1"), ret_pos);
    b.ret(pass_fn, &[one], ret_pos);

    // type ShouldFail struct{}; func (ShouldFail) ReturnOne() int { return 0 }
    let p = b.pos(file, 30, 1);
    let should_fail = b.named_struct(pkg, "ShouldFail", p);
    b.decl_type(file, should_fail, &[], p);
    let fail_ret_pos = b.pos(file, 31, 2);
    let fail_fn = b.method(should_fail, false, "ReturnOne", &[TypeId::INT], p);
    let zero = b.const_val(fail_fn, TypeId::INT, Some("0"), fail_ret_pos);
    b.ret(fail_fn, &[zero], fail_ret_pos);

    // var _ ReturnsNumber = ShouldPass{}
    // var _ ReturnsNumber = &ShouldFail{}
    let p = b.pos(file, 40, 1);
    b.decl_var(file, "_", Some(returns_number), Some(should_pass), p);
    let p = b.pos(file, 41, 1);
    let ptr_fail = b.pointer(should_fail);
    b.decl_var(file, "_", Some(returns_number), Some(ptr_fail), p);

    // //contract:MustReturnInt { "Expected" : 1 }
    // type CheckedInt ext.Contract
    let p = b.pos(file, 50, 1);
    let checked_int = b.named(pkg, "CheckedInt", capability, p);
    b.decl_type(
        file,
        checked_int,
        &[r#"//contract:MustReturnInt { "Expected" : 1 }"#],
        p,
    );

    // Two usages of the alias.
    let p = b.pos(file, 60, 1);
    let type_a = b.named_struct(pkg, "TypeA", p);
    b.decl_type(file, type_a, &["//contract:CheckedInt"], p);
    let p = b.pos(file, 61, 1);
    let type_b = b.named_struct(pkg, "TypeB", p);
    b.decl_type(file, type_b, &["//contract:CheckedInt"], p);

    (b.build(), capability)
}

fn enforcer_with_recorder(log: Log) -> Enforcer {
    let (program, capability) = demo_program();
    let mut contracts = ContractProviders::new();
    contracts.register_with("MustReturnInt", move |config| {
        let mut checker: MustReturnInt = if config.is_empty() {
            MustReturnInt::default()
        } else {
            serde_json::from_str(config)?
        };
        checker.log = Some(log.clone());
        Ok(Box::new(checker))
    });
    let mut enforcer = Enforcer::new(Arc::new(program), contracts);
    enforcer.contract_capability = Some(capability);
    enforcer
}

#[test]
fn discovery_finds_targets_assertions_and_aliases() {
    let enforcer = enforcer_with_recorder(Log::default());
    let discovery = enforcer.discover(&CancelToken::new()).unwrap();

    // The interface-method annotation plus the two alias usages.
    assert_eq!(discovery.targets.len(), 3);
    assert_eq!(discovery.assertions.len(), 2);
    assert_eq!(discovery.aliases.len(), 1);
    assert!(discovery.aliases.contains_key("CheckedInt"));

    // The address-of form is recorded with its receiver flavor.
    assert!(!discovery.assertions[0].ptr);
    assert!(discovery.assertions[1].ptr);
}

#[test]
fn execute_runs_expanded_targets_with_decoded_config() {
    let log = Log::default();
    let enforcer = enforcer_with_recorder(log.clone());
    let results = enforcer.execute(&CancelToken::new()).unwrap();

    let observations = log.lock().unwrap().clone();
    assert_eq!(observations.len(), 3, "one run per terminal target");
    for obs in &observations {
        assert_eq!(obs.contract, "MustReturnInt");
        assert_eq!(obs.expected, 1, "alias carries the baked configuration");
    }
    let by_kind =
        |kind: Kind| observations.iter().filter(|o| o.kind == kind).count();
    assert_eq!(by_kind(Kind::InterfaceMethod), 1);
    assert_eq!(by_kind(Kind::Type), 2);

    // The interface-method target saw both asserted implementations.
    let iface_obs = observations
        .iter()
        .find(|o| o.kind == Kind::InterfaceMethod)
        .unwrap();
    assert_eq!(iface_obs.objects, 2);

    // ShouldFail.ReturnOne returns 0; exactly one diagnostic, at its
    // return site.
    assert_eq!(results.len(), 1);
    let rendered = results.to_string();
    assert_eq!(rendered, "demo.go:31:2: expecting 1, got 0\n");
}

#[test]
fn execute_is_idempotent() {
    let enforcer = enforcer_with_recorder(Log::default());
    let first = enforcer.execute(&CancelToken::new()).unwrap().to_string();
    let second = enforcer.execute(&CancelToken::new()).unwrap().to_string();
    assert_eq!(first, second);
}

#[test]
fn cancellation_aborts_the_run() {
    let enforcer = enforcer_with_recorder(Log::default());
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        enforcer.execute(&cancel),
        Err(EnforceError::Cancelled)
    ));
}

#[test]
fn missing_provider_is_a_config_error() {
    let (program, _) = demo_program();
    // No providers registered at all.
    let enforcer = Enforcer::new(Arc::new(program), ContractProviders::new());
    let err = enforcer.execute(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, EnforceError::MissingProvider { .. }));
    assert!(err.to_string().contains("MustReturnInt"));
}

#[test]
fn unknown_config_fields_are_rejected() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("example.com/demo", "demo");
    let file = b.file(pkg, "demo.go");
    let p = b.pos(file, 3, 1);
    let f = b.function(pkg, "Annotated", &[], p);
    b.ret(f, &[], p);
    b.decl_func(
        file,
        f,
        &[r#"//contract:MustReturnInt { "Expectde" : 1 }"#],
        p,
    );
    let mut contracts = ContractProviders::new();
    contracts.register::<MustReturnInt>("MustReturnInt");
    let enforcer = Enforcer::new(Arc::new(b.build()), contracts);
    let err = enforcer.execute(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, EnforceError::BadConfig { .. }));
    assert!(err.to_string().starts_with("demo.go:3:1"));
}

struct Failing;

impl Contract for Failing {
    fn enforce(&mut self, _ctx: &mut dyn Context) -> Result<(), CheckerError> {
        Err("nothing to see here".into())
    }
}

struct Panicking;

impl Contract for Panicking {
    fn enforce(&mut self, _ctx: &mut dyn Context) -> Result<(), CheckerError> {
        panic!("checker bug")
    }
}

fn single_target_program(contract: &str) -> Program {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("example.com/demo", "demo");
    let file = b.file(pkg, "demo.go");
    let p = b.pos(file, 7, 1);
    let f = b.function(pkg, "Annotated", &[], p);
    b.ret(f, &[], p);
    let comment = format!("//contract:{contract}");
    b.decl_func(file, f, &[comment.as_str()], p);
    b.build()
}

#[test]
fn checker_error_aborts_with_position_context() {
    let mut contracts = ContractProviders::new();
    contracts.register_with("Failing", |_| Ok(Box::new(Failing)));
    let enforcer = Enforcer::new(Arc::new(single_target_program("Failing")), contracts);
    let err = enforcer.execute(&CancelToken::new()).unwrap_err();
    match err {
        EnforceError::Checker { pos, message } => {
            assert_eq!(pos.to_string(), "demo.go:7:1");
            assert_eq!(message, "nothing to see here");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn checker_panic_is_recovered_with_names() {
    let mut contracts = ContractProviders::new();
    contracts.register_with("Panicking", |_| Ok(Box::new(Panicking)));
    let enforcer = Enforcer::new(Arc::new(single_target_program("Panicking")), contracts);
    let err = enforcer.execute(&CancelToken::new()).unwrap_err();
    match err {
        EnforceError::CheckerPanic {
            contract,
            declaration,
            message,
        } => {
            assert_eq!(contract, "Panicking");
            assert_eq!(declaration, "Annotated");
            assert_eq!(message, "checker bug");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_files_are_skipped_unless_enabled() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("example.com/demo", "demo");
    let file = b.test_file(pkg, "demo_test.go");
    let p = b.pos(file, 1, 1);
    let f = b.function(pkg, "Annotated", &[], p);
    b.ret(f, &[], p);
    b.decl_func(file, f, &["//contract:Anything"], p);
    let program = Arc::new(b.build());

    let enforcer = Enforcer::new(Arc::clone(&program), ContractProviders::new());
    let discovery = enforcer.discover(&CancelToken::new()).unwrap();
    assert!(discovery.targets.is_empty());

    let mut with_tests = Enforcer::new(program, ContractProviders::new());
    with_tests.tests = true;
    let discovery = with_tests.discover(&CancelToken::new()).unwrap();
    assert_eq!(discovery.targets.len(), 1);
}
