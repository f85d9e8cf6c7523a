//! Parallel contract discovery.
//!
//! Scans every (package, file) pair of the user packages for the magic
//! comment syntax and for interface-implementation assertions. Workers run
//! on a CPU-sized pool and write into shared collections under a single
//! lock; critical sections are O(1). Visitation does not descend into
//! function bodies, and descends into type bodies only for interfaces.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

use warden_contract::{Kind, MemberRef};
use warden_ir::{Decl, FileId, PkgId, Program, TypeId, TypeKind};

use crate::cancel::CancelToken;
use crate::error::EnforceError;
use crate::target::{AliasBinding, Assertion, Discovery, Target};

/// Example: `//contract:SomeContract {....}`
static COMMENT_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//[ \t]*contract:([[:alnum:]]+)(.*)$").unwrap());

/// How many visited declaration nodes between cancellation checks.
const CANCEL_STRIDE: usize = 1000;

struct Shared {
    discovery: Discovery,
    next_alias_id: usize,
}

/// Runs discovery over the user packages of `program`.
///
/// `contract_capability` is the named-type underlying that marks a type
/// declaration as a contract alias; `None` disables alias interpretation.
/// Test files are skipped unless `tests` is set.
pub(crate) fn find_contracts(
    program: &Program,
    contract_capability: Option<TypeId>,
    tests: bool,
    cancel: &CancelToken,
) -> Result<Discovery, EnforceError> {
    let shared = Mutex::new(Shared {
        discovery: Discovery::default(),
        next_alias_id: 0,
    });

    let mut files: Vec<(PkgId, FileId)> = Vec::new();
    for pkg in program.user_packages() {
        for &file in &program.package(pkg).files {
            if !tests && program.is_test_file(file) {
                continue;
            }
            files.push((pkg, file));
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build()
        .map_err(|e| EnforceError::Pool(e.to_string()))?;

    pool.install(|| {
        files.par_iter().try_for_each(|&(_, file)| {
            process_file(program, file, contract_capability, cancel, &shared)
        })
    })?;

    let mut shared = shared
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    // Produce stable output for downstream consumers.
    shared
        .discovery
        .targets
        .sort_by_key(|t| program.position(t.pos));
    shared
        .discovery
        .assertions
        .sort_by_key(|a| program.position(a.pos));
    shared.discovery.aliases.sort_keys();
    for bindings in shared.discovery.aliases.values_mut() {
        bindings.sort_by_key(|b| program.position(b.pos));
    }
    Ok(shared.discovery)
}

fn process_file(
    program: &Program,
    file: FileId,
    contract_capability: Option<TypeId>,
    cancel: &CancelToken,
    shared: &Mutex<Shared>,
) -> Result<(), EnforceError> {
    let mut visited = 0usize;
    let mut tick = |visited: &mut usize| -> Result<(), EnforceError> {
        *visited += 1;
        if *visited % CANCEL_STRIDE == 0 && cancel.is_cancelled() {
            return Err(EnforceError::Cancelled);
        }
        Ok(())
    };
    if cancel.is_cancelled() {
        return Err(EnforceError::Cancelled);
    }

    for decl in &program.source_file(file).decls {
        tick(&mut visited)?;
        match decl {
            Decl::Func { func, comments, pos } => {
                let def = program.func(*func);
                let kind = if def.is_method() {
                    Kind::Method
                } else {
                    Kind::Function
                };
                emit_contracts(
                    program,
                    comments,
                    MemberRef::Func(*func),
                    kind,
                    *pos,
                    contract_capability,
                    shared,
                );
            }

            Decl::Type {
                ty,
                comments,
                members,
                pos,
            } => {
                let kind = if program.is_interface(*ty) {
                    Kind::Interface
                } else {
                    Kind::Type
                };
                emit_contracts(
                    program,
                    comments,
                    MemberRef::Type(*ty),
                    kind,
                    *pos,
                    contract_capability,
                    shared,
                );
                // Descend into interface bodies only, to pick up contracts
                // applied to interface methods.
                if kind == Kind::Interface {
                    for member in members {
                        tick(&mut visited)?;
                        if !member.is_func {
                            continue;
                        }
                        emit_contracts(
                            program,
                            &member.comments,
                            MemberRef::IfaceMethod {
                                iface: *ty,
                                method: member.name.clone(),
                            },
                            Kind::InterfaceMethod,
                            member.pos,
                            contract_capability,
                            shared,
                        );
                    }
                }
            }

            Decl::Var {
                name,
                declared,
                value,
                pos,
            } => {
                if name != "_" {
                    continue;
                }
                let Some(assertion) = classify_assertion(program, *declared, *value, *pos) else {
                    continue;
                };
                debug!(
                    pos = %program.position(assertion.pos),
                    iface = %program.type_string(assertion.iface),
                    implementor = %program.type_string(assertion.implementor),
                    ptr = assertion.ptr,
                    "assertion"
                );
                let mut shared = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                shared.discovery.assertions.push(assertion);
            }
        }
    }
    Ok(())
}

/// Scans comment lines for the magic syntax and records targets, or alias
/// bindings when the annotated declaration is a named type whose underlying
/// is the contract-capability interface.
fn emit_contracts(
    program: &Program,
    comments: &[String],
    object: MemberRef,
    kind: Kind,
    pos: warden_ir::Pos,
    contract_capability: Option<TypeId>,
    shared: &Mutex<Shared>,
) {
    for line in comments {
        let Some(caps) = COMMENT_SYNTAX.captures(line) else {
            continue;
        };
        let contract = caps[1].to_string();
        let config = caps[2].trim().to_string();

        let mut shared = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // Special case for contract aliases of the form
        //   //contract:Foo { ... }
        //   type Alias Contract
        if let (Some(cap), MemberRef::Type(ty)) = (contract_capability, &object) {
            if let TypeKind::Named { name, underlying, .. } = &program.type_def(*ty).kind {
                if *underlying == cap {
                    debug!(alias = %name, contract = %contract, config = %config, "alias");
                    let id = shared.next_alias_id;
                    shared.next_alias_id += 1;
                    shared
                        .discovery
                        .aliases
                        .entry(name.clone())
                        .or_default()
                        .push(AliasBinding {
                            id,
                            contract,
                            config,
                            pos,
                        });
                    continue;
                }
            }
        }
        let target = Target {
            contract,
            config,
            kind,
            object: object.clone(),
            pos,
        };
        debug!(tgt = %target.describe(program), "target");
        shared.discovery.targets.push(target);
    }
}

/// Recognizes `var _ I = X{}` and `var _ I = &X{}` where `I` is a named
/// interface and `X` a named struct.
fn classify_assertion(
    program: &Program,
    declared: Option<TypeId>,
    value: Option<TypeId>,
    pos: warden_ir::Pos,
) -> Option<Assertion> {
    let iface = declared?;
    match &program.type_def(iface).kind {
        TypeKind::Named { .. } if program.is_interface(iface) => {}
        _ => return None,
    }
    let value = value?;
    let (implementor, ptr) = match &program.type_def(value).kind {
        TypeKind::Named { .. } => (value, false),
        TypeKind::Pointer { elem } => match &program.type_def(*elem).kind {
            TypeKind::Named { .. } => (*elem, true),
            _ => return None,
        },
        _ => return None,
    };
    match &program.type_def(program.underlying(implementor)).kind {
        TypeKind::Struct { .. } => Some(Assertion {
            iface,
            implementor,
            ptr,
            pos,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_syntax_anchors_at_line_start() {
        let caps = COMMENT_SYNTAX.captures("//contract:RetLint").unwrap();
        assert_eq!(&caps[1], "RetLint");
        assert_eq!(caps[2].trim(), "");

        let caps = COMMENT_SYNTAX
            .captures(r#"// contract:MustReturnInt { "Expected" : 1 }"#)
            .unwrap();
        assert_eq!(&caps[1], "MustReturnInt");
        assert_eq!(caps[2].trim(), r#"{ "Expected" : 1 }"#);

        assert!(COMMENT_SYNTAX.captures("// see contract:RetLint").is_none());
        assert!(COMMENT_SYNTAX.captures("//Contract:RetLint").is_none());
    }

    #[test]
    fn comment_syntax_requires_alnum_name() {
        assert!(COMMENT_SYNTAX.captures("//contract:").is_none());
        let caps = COMMENT_SYNTAX.captures("//contract:Abc123 rest").unwrap();
        assert_eq!(&caps[1], "Abc123");
        assert_eq!(caps[2].trim(), "rest");
    }
}
