//! The frozen typed program and its construction API.
//!
//! [`Program`] is the single entry point for querying a loaded program:
//! packages, named types, method tables, functions with SSA bodies, source
//! files with declaration lists, and the file set. It is immutable once
//! built; all analyses borrow it read-only.
//!
//! [`ProgramBuilder`] is the construction API the source-loading
//! collaborator uses. Built programs round-trip through a serde JSON
//! snapshot, which is the form the CLI consumes.
//!
//! # Universe scope
//!
//! The builder pre-registers the universe scope: `string`, `int`, `bool`,
//! and the `error` interface (a named type with an `Error` method on its
//! underlying interface form). [`TypeId`] constants expose the
//! pre-registered ids.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::decl::{Decl, SourceFile, TypeMember};
use crate::error::IrError;
use crate::func::{Block, FuncDef, Instr};
use crate::id::{FileId, FuncId, PkgId, TypeId, ValueId};
use crate::source::{Pos, Position, SourceMap};
use crate::types::{MethodDef, TypeDef, TypeKind};
use crate::value::{CallTarget, ValueDef, ValueKind};

/// Pre-registered universe type ids. See the module docs.
impl TypeId {
    pub const STRING: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    /// The unnamed `interface { Error() }` form underlying `error`.
    pub const ERROR_IFACE: TypeId = TypeId(3);
    /// The universe `error` named type.
    pub const ERROR: TypeId = TypeId(4);
}

const UNIVERSE_COUNT: u32 = 5;

/// One package in the program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDef {
    pub id: PkgId,
    /// Unique import path, e.g. `example.com/data`.
    pub path: String,
    pub name: String,
    /// True when the package was named by the user's patterns rather than
    /// pulled in as an import.
    pub user: bool,
    pub funcs: Vec<FuncId>,
    pub types: Vec<TypeId>,
    pub files: Vec<FileId>,
}

/// The frozen typed program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    packages: Vec<PackageDef>,
    types: Vec<TypeDef>,
    funcs: Vec<FuncDef>,
    values: Vec<ValueDef>,
    methods: Vec<MethodDef>,
    files: Vec<SourceFile>,
    sources: SourceMap,
    universe: IndexMap<String, TypeId>,
}

impl Program {
    // -- entity access ------------------------------------------------------

    pub fn package(&self, id: PkgId) -> &PackageDef {
        &self.packages[id.0 as usize]
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageDef> {
        self.packages.iter()
    }

    /// Packages named by the user's patterns, in load order.
    pub fn user_packages(&self) -> Vec<PkgId> {
        self.packages
            .iter()
            .filter(|p| p.user)
            .map(|p| p.id)
            .collect()
    }

    pub fn type_def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0 as usize]
    }

    pub fn func(&self, id: FuncId) -> &FuncDef {
        &self.funcs[id.0 as usize]
    }

    pub fn value(&self, id: ValueId) -> &ValueDef {
        &self.values[id.0 as usize]
    }

    pub fn source_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn source_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn is_test_file(&self, id: FileId) -> bool {
        self.sources.is_test_file(id)
    }

    /// Resolves a position token through the file set.
    pub fn position(&self, pos: Pos) -> Position {
        self.sources.position(pos)
    }

    // -- type queries -------------------------------------------------------

    /// Every named type in the program, in stable (package path, name)
    /// order. Universe names sort before all package-owned names.
    pub fn named_types(&self) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self
            .types
            .iter()
            .filter(|t| matches!(t.kind, TypeKind::Named { .. }))
            .map(|t| t.id)
            .collect();
        out.sort_by(|a, b| self.named_sort_key(*a).cmp(&self.named_sort_key(*b)));
        out
    }

    fn named_sort_key(&self, id: TypeId) -> (String, String) {
        match &self.type_def(id).kind {
            TypeKind::Named { name, pkg, .. } => {
                let path = pkg
                    .map(|p| self.package(p).path.clone())
                    .unwrap_or_default();
                (path, name.clone())
            }
            _ => (String::new(), String::new()),
        }
    }

    /// Chases one named layer to its underlying form; other types are their
    /// own underlying.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match &self.type_def(id).kind {
            TypeKind::Named { underlying, .. } => *underlying,
            _ => id,
        }
    }

    /// The method-name list of an interface (possibly through a named
    /// layer), or `None` when the type is not an interface.
    pub fn iface_methods(&self, id: TypeId) -> Option<&[String]> {
        match &self.type_def(self.underlying(id)).kind {
            TypeKind::Interface { methods } => Some(methods),
            _ => None,
        }
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        self.iface_methods(id).is_some()
    }

    /// Unwraps at most one pointer level, then returns the named type id if
    /// one is there.
    pub fn deref_named(&self, id: TypeId) -> Option<TypeId> {
        let target = match &self.type_def(id).kind {
            TypeKind::Pointer { elem } => *elem,
            _ => id,
        };
        match &self.type_def(target).kind {
            TypeKind::Named { .. } => Some(target),
            _ => None,
        }
    }

    /// Whether the method set of `concrete` satisfies interface `iface`.
    /// With `value_set_only`, pointer-receiver methods are excluded, as for
    /// a value of type `T` rather than `*T`.
    pub fn satisfies(&self, concrete: TypeId, iface: TypeId, value_set_only: bool) -> bool {
        let Some(wanted) = self.iface_methods(iface) else {
            return false;
        };
        wanted.iter().all(|name| {
            self.methods_of(concrete)
                .any(|m| m.name == *name && (!value_set_only || !m.ptr_recv))
        })
    }

    pub fn methods_of(&self, owner: TypeId) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter().filter(move |m| m.owner == owner)
    }

    pub fn method(&self, owner: TypeId, name: &str) -> Option<&MethodDef> {
        self.methods_of(owner).find(|m| m.name == name)
    }

    /// Resolves `"pkg/path/Name"` or a bare `"Name"` (universe scope) to a
    /// named type.
    pub fn resolve(&self, type_name: &str) -> Result<TypeId, IrError> {
        let found = match type_name.rsplit_once('/') {
            None => self.universe.get(type_name).copied(),
            Some((path, name)) => self
                .packages
                .iter()
                .find(|p| p.path == path)
                .and_then(|p| {
                    p.types.iter().copied().find(|&t| {
                        matches!(&self.type_def(t).kind,
                                 TypeKind::Named { name: n, .. } if n == name)
                    })
                }),
        };
        let id = found.ok_or_else(|| IrError::UnknownType {
            name: type_name.to_string(),
        })?;
        match self.type_def(id).kind {
            TypeKind::Named { .. } => Ok(id),
            _ => Err(IrError::NotNamed {
                name: type_name.to_string(),
            }),
        }
    }

    // -- rendering ----------------------------------------------------------

    /// Human-readable rendering of a type, package-relative.
    pub fn type_string(&self, id: TypeId) -> String {
        match &self.type_def(id).kind {
            TypeKind::Basic { name } => name.clone(),
            TypeKind::Named { name, .. } => name.clone(),
            TypeKind::Struct { .. } => "struct{...}".to_string(),
            TypeKind::Interface { .. } => "interface{...}".to_string(),
            TypeKind::Pointer { elem } => format!("*{}", self.type_string(*elem)),
            TypeKind::Slice { elem } => format!("[]{}", self.type_string(*elem)),
            TypeKind::Tuple { elems } => {
                let parts: Vec<String> = elems.iter().map(|e| self.type_string(*e)).collect();
                format!("({})", parts.join(", "))
            }
            TypeKind::Func { .. } => "func(...)".to_string(),
        }
    }

    /// Package-relative function name, `(Recv).Name` for methods.
    pub fn func_rel_name(&self, id: FuncId) -> String {
        let f = self.func(id);
        match f.receiver {
            Some(recv) => format!("({}).{}", self.type_string(recv), f.name),
            None => f.name.clone(),
        }
    }

    /// Compact rendering of an SSA value for diagnostics.
    pub fn value_string(&self, id: ValueId) -> String {
        let v = self.value(id);
        match &v.kind {
            ValueKind::Const { literal: Some(l) } => {
                format!("{}:{}", l, self.type_string(v.ty))
            }
            ValueKind::Const { literal: None } => format!("nil:{}", self.type_string(v.ty)),
            ValueKind::Extract { index, .. } => format!("extract #{index}"),
            ValueKind::MakeInterface { operand } => format!(
                "make {} <- {}",
                self.type_string(v.ty),
                self.type_string(self.value(*operand).ty)
            ),
            ValueKind::Phi { .. } => "phi".to_string(),
            ValueKind::UnaryDeref { .. } => "deref".to_string(),
            ValueKind::TypeAssert { asserted, .. } => {
                format!("typeassert {}", self.type_string(*asserted))
            }
            ValueKind::Call { target } => match target {
                CallTarget::Static(f) => format!("call {}()", self.func_rel_name(*f)),
                CallTarget::Virtual { iface, method } => {
                    format!("invoke {}.{}()", self.type_string(*iface), method)
                }
                CallTarget::Dynamic => "call (dynamic)()".to_string(),
            },
            ValueKind::Opaque { label } => label.clone(),
        }
    }

    // -- snapshots ----------------------------------------------------------

    pub fn from_snapshot(json: &str) -> Result<Program, IrError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_snapshot(&self) -> Result<String, IrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Construction API for [`Program`]. Consumed by `build()`.
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        let mut program = Program {
            packages: Vec::new(),
            types: Vec::new(),
            funcs: Vec::new(),
            values: Vec::new(),
            methods: Vec::new(),
            files: Vec::new(),
            sources: SourceMap::default(),
            universe: IndexMap::new(),
        };
        for name in ["string", "int", "bool"] {
            let id = TypeId(program.types.len() as u32);
            program.types.push(TypeDef {
                id,
                kind: TypeKind::Basic { name: name.into() },
                pos: Pos::NONE,
            });
            program.universe.insert(name.to_string(), id);
        }
        let iface = TypeId(program.types.len() as u32);
        program.types.push(TypeDef {
            id: iface,
            kind: TypeKind::Interface {
                methods: vec!["Error".into()],
            },
            pos: Pos::NONE,
        });
        let error = TypeId(program.types.len() as u32);
        program.types.push(TypeDef {
            id: error,
            kind: TypeKind::Named {
                name: "error".into(),
                pkg: None,
                underlying: iface,
            },
            pos: Pos::NONE,
        });
        program.universe.insert("error".to_string(), error);
        debug_assert_eq!(program.types.len() as u32, UNIVERSE_COUNT);
        ProgramBuilder { program }
    }

    // -- packages and files -------------------------------------------------

    /// Registers a user-pattern package.
    pub fn package(&mut self, path: &str, name: &str) -> PkgId {
        self.add_package(path, name, true)
    }

    /// Registers a package reached only through imports.
    pub fn import(&mut self, path: &str, name: &str) -> PkgId {
        self.add_package(path, name, false)
    }

    fn add_package(&mut self, path: &str, name: &str, user: bool) -> PkgId {
        let id = PkgId(self.program.packages.len() as u32);
        self.program.packages.push(PackageDef {
            id,
            path: path.to_string(),
            name: name.to_string(),
            user,
            funcs: Vec::new(),
            types: Vec::new(),
            files: Vec::new(),
        });
        id
    }

    pub fn file(&mut self, pkg: PkgId, name: &str) -> FileId {
        self.add_file(pkg, name, false)
    }

    pub fn test_file(&mut self, pkg: PkgId, name: &str) -> FileId {
        self.add_file(pkg, name, true)
    }

    fn add_file(&mut self, pkg: PkgId, name: &str, test: bool) -> FileId {
        let id = self.program.sources.add_file(name, test);
        self.program.files.push(SourceFile {
            id,
            pkg,
            decls: Vec::new(),
        });
        self.program.packages[pkg.0 as usize].files.push(id);
        id
    }

    pub fn pos(&mut self, file: FileId, line: u32, column: u32) -> Pos {
        self.program.sources.add_pos(file, line, column)
    }

    // -- types --------------------------------------------------------------

    pub fn named_struct(&mut self, pkg: PkgId, name: &str, pos: Pos) -> TypeId {
        let st = self.add_type(TypeKind::Struct { fields: Vec::new() }, Pos::NONE);
        self.named(pkg, name, st, pos)
    }

    pub fn named_interface(&mut self, pkg: PkgId, name: &str, methods: &[&str], pos: Pos) -> TypeId {
        let iface = self.interface_form(methods);
        self.named(pkg, name, iface, pos)
    }

    /// A bare interface form, usable as the underlying of several named
    /// types (e.g. a capability interface and its aliases).
    pub fn interface_form(&mut self, methods: &[&str]) -> TypeId {
        self.add_type(
            TypeKind::Interface {
                methods: methods.iter().map(|m| m.to_string()).collect(),
            },
            Pos::NONE,
        )
    }

    /// Declares a named type over an existing underlying form.
    pub fn named(&mut self, pkg: PkgId, name: &str, underlying: TypeId, pos: Pos) -> TypeId {
        let id = self.add_type(
            TypeKind::Named {
                name: name.to_string(),
                pkg: Some(pkg),
                underlying,
            },
            pos,
        );
        self.program.packages[pkg.0 as usize].types.push(id);
        id
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.add_type(TypeKind::Pointer { elem }, Pos::NONE)
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.add_type(TypeKind::Slice { elem }, Pos::NONE)
    }

    pub fn tuple(&mut self, elems: &[TypeId]) -> TypeId {
        self.add_type(TypeKind::Tuple { elems: elems.to_vec() }, Pos::NONE)
    }

    pub fn func_type(&mut self, params: &[TypeId], results: &[TypeId]) -> TypeId {
        self.add_type(
            TypeKind::Func {
                params: params.to_vec(),
                results: results.to_vec(),
            },
            Pos::NONE,
        )
    }

    fn add_type(&mut self, kind: TypeKind, pos: Pos) -> TypeId {
        let id = TypeId(self.program.types.len() as u32);
        self.program.types.push(TypeDef { id, kind, pos });
        id
    }

    // -- functions and methods ----------------------------------------------

    pub fn function(&mut self, pkg: PkgId, name: &str, results: &[TypeId], pos: Pos) -> FuncId {
        let id = self.add_func(name, Some(pkg), results, None, pos);
        self.program.packages[pkg.0 as usize].funcs.push(id);
        id
    }

    /// Declares a method on named type `owner`. The receiver is `*owner`
    /// when `ptr_recv` is set.
    pub fn method(
        &mut self,
        owner: TypeId,
        ptr_recv: bool,
        name: &str,
        results: &[TypeId],
        pos: Pos,
    ) -> FuncId {
        let pkg = match self.program.type_def(owner).kind {
            TypeKind::Named { pkg, .. } => pkg,
            _ => None,
        };
        let recv = if ptr_recv { self.pointer(owner) } else { owner };
        let id = self.add_func(name, pkg, results, Some(recv), pos);
        self.program.methods.push(MethodDef {
            owner,
            name: name.to_string(),
            ptr_recv,
            func: id,
        });
        id
    }

    fn add_func(
        &mut self,
        name: &str,
        pkg: Option<PkgId>,
        results: &[TypeId],
        receiver: Option<TypeId>,
        pos: Pos,
    ) -> FuncId {
        let id = FuncId(self.program.funcs.len() as u32);
        self.program.funcs.push(FuncDef {
            id,
            name: name.to_string(),
            pkg,
            results: results.to_vec(),
            receiver,
            blocks: vec![Block::default()],
            pos,
        });
        id
    }

    // -- SSA values ---------------------------------------------------------

    pub fn const_val(&mut self, func: FuncId, ty: TypeId, literal: Option<&str>, pos: Pos) -> ValueId {
        self.add_value(
            func,
            ty,
            ValueKind::Const {
                literal: literal.map(|l| l.to_string()),
            },
            pos,
        )
    }

    pub fn nil(&mut self, func: FuncId, ty: TypeId, pos: Pos) -> ValueId {
        self.const_val(func, ty, None, pos)
    }

    pub fn opaque(&mut self, func: FuncId, ty: TypeId, label: &str, pos: Pos) -> ValueId {
        self.add_value(
            func,
            ty,
            ValueKind::Opaque {
                label: label.to_string(),
            },
            pos,
        )
    }

    pub fn phi(&mut self, func: FuncId, ty: TypeId, edges: &[ValueId], pos: Pos) -> ValueId {
        self.add_value(
            func,
            ty,
            ValueKind::Phi {
                edges: edges.to_vec(),
            },
            pos,
        )
    }

    pub fn extract(&mut self, func: FuncId, tuple: ValueId, index: usize, pos: Pos) -> ValueId {
        let ty = match &self.program.type_def(self.program.value(tuple).ty).kind {
            TypeKind::Tuple { elems } => elems[index],
            _ => self.program.value(tuple).ty,
        };
        self.add_value(func, ty, ValueKind::Extract { tuple, index }, pos)
    }

    pub fn make_interface(&mut self, func: FuncId, iface: TypeId, operand: ValueId, pos: Pos) -> ValueId {
        self.add_value(func, iface, ValueKind::MakeInterface { operand }, pos)
    }

    pub fn deref(&mut self, func: FuncId, operand: ValueId, pos: Pos) -> ValueId {
        let ty = match self.program.type_def(self.program.value(operand).ty).kind {
            TypeKind::Pointer { elem } => elem,
            _ => self.program.value(operand).ty,
        };
        self.add_value(func, ty, ValueKind::UnaryDeref { operand }, pos)
    }

    pub fn type_assert(
        &mut self,
        func: FuncId,
        operand: ValueId,
        asserted: TypeId,
        comma_ok: bool,
        pos: Pos,
    ) -> ValueId {
        let ty = if comma_ok {
            self.tuple(&[asserted, TypeId::BOOL])
        } else {
            asserted
        };
        self.add_value(
            func,
            ty,
            ValueKind::TypeAssert {
                operand,
                asserted,
                comma_ok,
            },
            pos,
        )
    }

    /// A statically dispatched call; the value's type follows the callee's
    /// result slots (a tuple for multi-result callees).
    pub fn call_static(&mut self, func: FuncId, callee: FuncId, pos: Pos) -> ValueId {
        let results = self.program.func(callee).results.clone();
        let ty = self.result_type(&results);
        self.add_value(
            func,
            ty,
            ValueKind::Call {
                target: CallTarget::Static(callee),
            },
            pos,
        )
    }

    /// An interface-method invocation.
    pub fn call_virtual(
        &mut self,
        func: FuncId,
        iface: TypeId,
        method: &str,
        results: &[TypeId],
        pos: Pos,
    ) -> ValueId {
        let ty = self.result_type(results);
        self.add_value(
            func,
            ty,
            ValueKind::Call {
                target: CallTarget::Virtual {
                    iface,
                    method: method.to_string(),
                },
            },
            pos,
        )
    }

    /// A call through a func value; no static callee is known.
    pub fn call_dynamic(&mut self, func: FuncId, results: &[TypeId], pos: Pos) -> ValueId {
        let ty = self.result_type(results);
        self.add_value(
            func,
            ty,
            ValueKind::Call {
                target: CallTarget::Dynamic,
            },
            pos,
        )
    }

    fn result_type(&mut self, results: &[TypeId]) -> TypeId {
        match results {
            [single] => *single,
            many => self.tuple(many),
        }
    }

    fn add_value(&mut self, func: FuncId, ty: TypeId, kind: ValueKind, pos: Pos) -> ValueId {
        let id = ValueId(self.program.values.len() as u32);
        self.program.values.push(ValueDef { id, ty, kind, pos });
        self.program.funcs[func.0 as usize].blocks[0]
            .instrs
            .push(Instr::Value(id));
        id
    }

    /// Appends a return site to the function's body.
    pub fn ret(&mut self, func: FuncId, results: &[ValueId], pos: Pos) {
        self.program.funcs[func.0 as usize].blocks[0]
            .instrs
            .push(Instr::Return {
                results: results.to_vec(),
                pos,
            });
    }

    // -- declarations -------------------------------------------------------

    pub fn decl_func(&mut self, file: FileId, func: FuncId, comments: &[&str], pos: Pos) {
        self.push_decl(
            file,
            Decl::Func {
                func,
                comments: comments.iter().map(|c| c.to_string()).collect(),
                pos,
            },
        );
    }

    pub fn decl_type(&mut self, file: FileId, ty: TypeId, comments: &[&str], pos: Pos) {
        self.decl_type_with_members(file, ty, comments, Vec::new(), pos);
    }

    pub fn decl_type_with_members(
        &mut self,
        file: FileId,
        ty: TypeId,
        comments: &[&str],
        members: Vec<TypeMember>,
        pos: Pos,
    ) {
        self.push_decl(
            file,
            Decl::Type {
                ty,
                comments: comments.iter().map(|c| c.to_string()).collect(),
                members,
                pos,
            },
        );
    }

    pub fn decl_var(
        &mut self,
        file: FileId,
        name: &str,
        declared: Option<TypeId>,
        value: Option<TypeId>,
        pos: Pos,
    ) {
        self.push_decl(
            file,
            Decl::Var {
                name: name.to_string(),
                declared,
                value,
                pos,
            },
        );
    }

    fn push_decl(&mut self, file: FileId, decl: Decl) {
        self.program.files[file.0 as usize].decls.push(decl);
    }

    pub fn build(self) -> Program {
        self.program
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("example.com/data", "data");
        let file = b.file(pkg, "data.go");
        let pos = b.pos(file, 10, 1);
        let bad = b.named_struct(pkg, "BadError", pos);
        b.method(bad, true, "Error", &[TypeId::STRING], pos);
        b.build()
    }

    #[test]
    fn universe_resolution() {
        let p = sample();
        assert_eq!(p.resolve("error").unwrap(), TypeId::ERROR);
        assert!(p.resolve("nosuch").is_err());
    }

    #[test]
    fn qualified_resolution() {
        let p = sample();
        let bad = p.resolve("example.com/data/BadError").unwrap();
        assert_eq!(p.type_string(bad), "BadError");
        assert!(matches!(
            p.resolve("example.com/other/BadError"),
            Err(IrError::UnknownType { .. })
        ));
    }

    #[test]
    fn pointer_receiver_satisfies_error_only_through_pointer_set() {
        let p = sample();
        let bad = p.resolve("example.com/data/BadError").unwrap();
        // Error is declared with a pointer receiver: the value method set
        // does not satisfy `error`, the full set does.
        assert!(p.satisfies(bad, TypeId::ERROR, false));
        assert!(!p.satisfies(bad, TypeId::ERROR, true));
    }

    #[test]
    fn deref_named_unwraps_one_pointer() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let t = b.named_struct(pkg, "T", Pos::NONE);
        let pt = b.pointer(t);
        let ppt = b.pointer(pt);
        let p = b.build();
        assert_eq!(p.deref_named(t), Some(t));
        assert_eq!(p.deref_named(pt), Some(t));
        assert_eq!(p.deref_named(ppt), None);
    }

    #[test]
    fn rel_names() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let t = b.named_struct(pkg, "T", Pos::NONE);
        let m = b.method(t, true, "Self", &[TypeId::ERROR], Pos::NONE);
        let f = b.function(pkg, "Top", &[], Pos::NONE);
        let p = b.build();
        assert_eq!(p.func_rel_name(m), "(*T).Self");
        assert_eq!(p.func_rel_name(f), "Top");
    }

    #[test]
    fn snapshot_roundtrip() {
        let p = sample();
        let json = p.to_snapshot().unwrap();
        let back = Program::from_snapshot(&json).unwrap();
        assert_eq!(back.user_packages(), p.user_packages());
        assert_eq!(
            back.resolve("example.com/data/BadError").unwrap(),
            p.resolve("example.com/data/BadError").unwrap()
        );
    }

    #[test]
    fn named_types_are_stably_ordered() {
        let mut b = ProgramBuilder::new();
        let pb = b.package("b", "b");
        let pa = b.package("a", "a");
        let zed = b.named_struct(pb, "Zed", Pos::NONE);
        let abel = b.named_struct(pa, "Abel", Pos::NONE);
        let p = b.build();
        let named = p.named_types();
        // Universe `error` (empty path) first, then by package path.
        assert_eq!(named[0], TypeId::ERROR);
        let abel_idx = named.iter().position(|&t| t == abel).unwrap();
        let zed_idx = named.iter().position(|&t| t == zed).unwrap();
        assert!(abel_idx < zed_idx);
    }
}
