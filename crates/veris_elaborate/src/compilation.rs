//! The compilation: owner of all arenas, caches, built-in types, and the
//! elaborated hierarchy.

use std::collections::{HashMap, HashSet};

use crate::arena::{Arena, ExprId, StmtId, SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::expr::Expression;
use crate::lookup::LookupLocation;
use crate::scope::MemberCtx;
use crate::stmt::Statement;
use crate::symbols::{ScopeData, Symbol, SymbolKind};
use crate::types::{predef_signed, ConstantRange, IntegralFlags, Type, TypeKey};
use veris_common::{Ident, Interner};
use veris_diagnostics::{Diagnostic, DiagnosticSink};
use veris_parser::ast as syntax;
use veris_parser::ast::{
    DefinitionKind, NetKind, PredefIntKind, RealKind, ScalarKind, TimeScale,
};
use veris_source::Span;

/// Configuration options for a compilation.
#[derive(Clone, Debug)]
pub struct CompilationOptions {
    /// Maximum recursion depth for binding and canonicalization.
    pub max_recursion_depth: u32,
    /// The `default_nettype` for compilation units that don't set one.
    pub default_net_type: NetKind,
    /// The time scale used when nothing else specifies one.
    pub default_time_scale: Option<TimeScale>,
    /// The constant evaluator's step budget.
    pub max_eval_steps: u32,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1024,
            default_net_type: NetKind::Wire,
            default_time_scale: None,
            max_eval_steps: 100_000,
        }
    }
}

/// Type ids for the built-in types, materialized once per compilation.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    /// The error sentinel type.
    pub error_type: TypeId,
    /// `void`
    pub void_type: TypeId,
    /// The null type.
    pub null_type: TypeId,
    /// `string`
    pub string_type: TypeId,
    /// `chandle`
    pub chandle_type: TypeId,
    /// `event`
    pub event_type: TypeId,
    /// `int`
    pub int_type: TypeId,
    /// `integer`
    pub integer_type: TypeId,
    /// `logic`
    pub logic_type: TypeId,
    /// `bit`
    pub bit_type: TypeId,
    /// `real`
    pub real_type: TypeId,
    /// `shortreal`
    pub shortreal_type: TypeId,
}

/// The unit that owns the arenas, all symbols, diagnostics, and caches
/// produced by a single end-to-end run.
///
/// All lazy fields are idempotent but not safe for concurrent
/// initialization; external concurrency must partition by `Compilation`.
pub struct Compilation<'a> {
    /// The source database, used to recover literal text through spans.
    pub db: &'a veris_source::SourceDb,
    /// The shared string interner.
    pub interner: &'a Interner,
    /// The diagnostic sink.
    pub sink: &'a DiagnosticSink,
    /// The options this compilation was created with.
    pub options: CompilationOptions,
    pub(crate) symbols: Arena<SymbolId, Symbol<'a>>,
    pub(crate) types: Arena<TypeId, Type>,
    pub(crate) exprs: Arena<ExprId, Expression>,
    pub(crate) stmts: Arena<StmtId, Statement>,
    pub(crate) type_cache: HashMap<TypeKey, TypeId>,
    pub(crate) definitions: HashMap<Ident, SymbolId>,
    pub(crate) packages: HashMap<Ident, SymbolId>,
    pub(crate) builtins: Builtins,
    root: SymbolId,
    instantiated: HashSet<Ident>,
    root_elaborated: bool,
}

impl<'a> Compilation<'a> {
    /// Creates an empty compilation.
    pub fn new(
        db: &'a veris_source::SourceDb,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self::with_options(db, interner, sink, CompilationOptions::default())
    }

    /// Creates an empty compilation with the given options.
    pub fn with_options(
        db: &'a veris_source::SourceDb,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
        options: CompilationOptions,
    ) -> Self {
        let mut symbols = Arena::new();
        let root = symbols.alloc(Symbol::new(
            SymbolKind::Root(ScopeData::default()),
            None,
            Span::DUMMY,
        ));

        let mut types = Arena::new();
        let mut type_cache = HashMap::new();

        let error_type = types.alloc(Type::Error);
        let void_type = types.alloc(Type::Void);
        let null_type = types.alloc(Type::Null);
        let string_type = types.alloc(Type::String);
        let chandle_type = types.alloc(Type::CHandle);
        let event_type = types.alloc(Type::Event);

        let mut intern = |key: TypeKey, ty: Type| -> TypeId {
            let id = types.alloc(ty);
            type_cache.insert(key, id);
            id
        };

        let builtins = Builtins {
            error_type,
            void_type,
            null_type,
            string_type,
            chandle_type,
            event_type,
            int_type: intern(
                TypeKey::PredefInt(PredefIntKind::Int, true),
                Type::PredefInt {
                    kind: PredefIntKind::Int,
                    signed: true,
                },
            ),
            integer_type: intern(
                TypeKey::PredefInt(PredefIntKind::Integer, true),
                Type::PredefInt {
                    kind: PredefIntKind::Integer,
                    signed: true,
                },
            ),
            logic_type: intern(
                TypeKey::Scalar(ScalarKind::Logic, false),
                Type::Scalar {
                    kind: ScalarKind::Logic,
                    signed: false,
                },
            ),
            bit_type: intern(
                TypeKey::Scalar(ScalarKind::Bit, false),
                Type::Scalar {
                    kind: ScalarKind::Bit,
                    signed: false,
                },
            ),
            real_type: intern(
                TypeKey::Floating(RealKind::Real),
                Type::Floating {
                    kind: RealKind::Real,
                },
            ),
            shortreal_type: intern(
                TypeKey::Floating(RealKind::ShortReal),
                Type::Floating {
                    kind: RealKind::ShortReal,
                },
            ),
        };

        Self {
            db,
            interner,
            sink,
            options,
            symbols,
            types,
            exprs: Arena::new(),
            stmts: Arena::new(),
            type_cache,
            definitions: HashMap::new(),
            packages: HashMap::new(),
            builtins,
            root,
            instantiated: HashSet::new(),
            root_elaborated: false,
        }
    }

    /// The root symbol of the hierarchy.
    pub fn root_symbol(&self) -> SymbolId {
        self.root
    }

    /// Immutable access to a symbol.
    pub fn symbol(&self, id: SymbolId) -> &Symbol<'a> {
        &self.symbols[id]
    }

    /// The number of symbols currently in the arena; ids below this are
    /// valid. Useful for whole-design sweeps in tools and tests.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Immutable access to a type.
    pub fn get_type_data(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    /// Immutable access to a bound expression.
    pub fn expr(&self, id: ExprId) -> &Expression {
        &self.exprs[id]
    }

    /// Immutable access to a bound statement.
    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.stmts[id]
    }

    /// Appends a parsed source file's contents to the compilation as a
    /// fresh compilation unit under the root.
    pub fn add_syntax_tree(&mut self, unit: &'a syntax::SourceUnit) {
        let unit_sym = self.symbols.alloc(Symbol::new(
            SymbolKind::CompilationUnit(ScopeData::default()),
            None,
            unit.span,
        ));
        self.insert_member(self.root, unit_sym, false);

        for item in &unit.items {
            match item {
                syntax::Item::Definition(decl) => {
                    self.record_instantiations(&decl.items);
                    self.create_definition(unit_sym, decl);
                }
                syntax::Item::Package(decl) => {
                    self.create_package(unit_sym, decl);
                }
                syntax::Item::Import(decl) => {
                    self.add_import_members(unit_sym, decl);
                }
                syntax::Item::TimeUnits(_) => {}
                syntax::Item::Member(member) => {
                    let ctx = MemberCtx::default();
                    self.add_member_item(unit_sym, member, &ctx);
                }
            }
        }
    }

    fn record_instantiations(&mut self, items: &'a [syntax::ModuleItem]) {
        for item in items {
            match item {
                syntax::ModuleItem::Instantiation(inst) => {
                    self.instantiated.insert(inst.module);
                }
                syntax::ModuleItem::GenerateRegion(items, _) => self.record_instantiations(items),
                syntax::ModuleItem::IfGenerate {
                    then_block,
                    else_block,
                    ..
                } => {
                    self.record_gen_member(then_block);
                    if let Some(e) = else_block {
                        self.record_gen_member(e);
                    }
                }
                syntax::ModuleItem::CaseGenerate { items, .. } => {
                    for arm in items {
                        self.record_gen_member(&arm.body);
                    }
                }
                syntax::ModuleItem::LoopGenerate { body, .. } => self.record_gen_member(body),
                _ => {}
            }
        }
    }

    fn record_gen_member(&mut self, member: &'a syntax::GenMember) {
        match member {
            syntax::GenMember::Block(block) => self.record_instantiations(&block.items),
            syntax::GenMember::Item(item) => {
                self.record_instantiations(std::slice::from_ref(item))
            }
        }
    }

    /// Resolves a module/interface/program definition by name.
    pub fn get_definition(&self, name: Ident) -> Option<SymbolId> {
        self.definitions.get(&name).copied()
    }

    /// Resolves a package by name.
    pub fn get_package(&self, name: Ident) -> Option<SymbolId> {
        self.packages.get(&name).copied()
    }

    /// Lazily instantiates all top-level modules and returns the root.
    ///
    /// A module is top-level when nothing instantiates it and it has no
    /// interface ports. Interfaces and programs are never auto-instantiated.
    pub fn get_root(&mut self) -> SymbolId {
        if self.root_elaborated {
            return self.root;
        }
        self.root_elaborated = true;

        // Gather candidates in declaration order.
        let mut tops = Vec::new();
        let unit_members: Vec<SymbolId> = self
            .symbols[self.root]
            .scope()
            .map(|s| s.members.clone())
            .unwrap_or_default();
        for unit in unit_members {
            let members: Vec<SymbolId> = self.symbols[unit]
                .scope()
                .map(|s| s.members.clone())
                .unwrap_or_default();
            for member in members {
                if let SymbolKind::Definition {
                    def_kind: DefinitionKind::Module,
                    syntax: decl,
                    ..
                } = &self.symbols[member].kind
                {
                    let name = decl.name;
                    if self.instantiated.contains(&name) {
                        continue;
                    }
                    if self.definition_has_interface_ports(member) {
                        continue;
                    }
                    if !self.definition_params_resolved(member) {
                        continue;
                    }
                    tops.push(member);
                }
            }
        }

        for def in tops {
            let name = self.symbols[def].name;
            let span = self.symbols[def].span;
            let inst = self.create_default_instance(def, name, span);
            self.insert_member(self.root, inst, true);
        }
        self.root
    }

    fn definition_has_interface_ports(&self, def: SymbolId) -> bool {
        let SymbolKind::Definition { syntax: decl, .. } = &self.symbols[def].kind else {
            return false;
        };
        let syntax::PortList::Ansi(ports) = &decl.ports else {
            return false;
        };
        ports.iter().any(|p| {
            if p.direction.is_some() || p.net.is_some() || p.is_var {
                return false;
            }
            if let syntax::DataType::Named { package: None, name, .. } = &p.ty {
                if let Some(&target) = self.definitions.get(name) {
                    return matches!(
                        self.symbols[target].kind,
                        SymbolKind::Definition {
                            def_kind: DefinitionKind::Interface,
                            ..
                        }
                    );
                }
            }
            false
        })
    }

    /// Creates a script scope for binding expressions against fabricated
    /// symbols, as used by interactive tools and tests.
    pub fn create_script_scope(&mut self) -> SymbolId {
        let scope = self.symbols.alloc(Symbol::new(
            SymbolKind::CompilationUnit(ScopeData::default()),
            None,
            Span::DUMMY,
        ));
        self.insert_member(self.root, scope, false);
        scope
    }

    /// Forces complete elaboration of every reachable symbol and returns
    /// the diagnostics sorted by source location.
    pub fn get_all_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.get_root();

        // Forcing resolution may create more symbols; keep going until the
        // arena stops growing.
        let mut i = 0;
        while i < self.symbols.len() {
            let id = SymbolId::from_raw(i as u32);
            self.force_symbol(id);
            i += 1;
        }

        self.sink.sorted()
    }

    fn force_symbol(&mut self, id: SymbolId) {
        // Definition bodies are static templates; only their instances
        // elaborate. Members of unselected generate blocks exist but are
        // never elaborated into behaviors.
        if self.in_definition_scope(id) || self.in_uninstantiated_block(id) {
            return;
        }
        if self.symbols[id].is_scope() {
            self.elaborate_scope(id);
        }
        match &self.symbols[id].kind {
            SymbolKind::Parameter { .. } | SymbolKind::EnumValue { .. } => {
                self.parameter_value(id);
            }
            SymbolKind::Net { .. }
            | SymbolKind::Variable { .. }
            | SymbolKind::Port { .. }
            | SymbolKind::FormalArgument { .. } => {
                self.declared_type_of(id);
                self.initializer_of(id);
            }
            SymbolKind::TypeAlias { .. } | SymbolKind::TypeParameter { .. } => {
                self.declared_type_of(id);
            }
            SymbolKind::ContinuousAssign { .. } => {
                self.bind_continuous_assign(id);
            }
            SymbolKind::Subroutine { .. } => {
                self.subroutine_body(id);
            }
            SymbolKind::ExplicitImport { package, name } => {
                let (package, name) = (*package, *name);
                let span = self.symbols[id].span;
                match self.get_package(package) {
                    Some(pkg) => {
                        if self.lookup_in_scope(pkg, name).is_none() {
                            self.sink.emit(errors::error_undeclared_identifier(
                                self.interner.resolve(name),
                                span,
                            ));
                        }
                    }
                    None => {
                        self.sink.emit(errors::error_unknown_package(
                            self.interner.resolve(package),
                            span,
                        ));
                    }
                }
            }
            SymbolKind::ForwardingTypedef { .. } => {
                self.check_forward_typedef(id);
            }
            _ => {}
        }
    }

    /// True when a symbol is a definition or sits inside one.
    fn in_definition_scope(&self, id: SymbolId) -> bool {
        let mut current = Some(id);
        while let Some(sym) = current {
            if matches!(self.symbols[sym].kind, SymbolKind::Definition { .. }) {
                return true;
            }
            current = self.symbols[sym].parent;
        }
        false
    }

    /// True when a symbol sits (at any depth) inside a generate block that
    /// was not selected.
    fn in_uninstantiated_block(&self, id: SymbolId) -> bool {
        let mut current = Some(id);
        while let Some(sym) = current {
            if let SymbolKind::GenerateBlock {
                is_instantiated: false,
                ..
            } = self.symbols[sym].kind
            {
                return true;
            }
            current = self.symbols[sym].parent;
        }
        false
    }

    // ---- type construction and interning ----

    /// Returns an interned simple scalar type.
    pub fn scalar_type(&mut self, kind: ScalarKind, signed: bool) -> TypeId {
        let key = TypeKey::Scalar(kind, signed);
        if let Some(&id) = self.type_cache.get(&key) {
            return id;
        }
        let id = self.types.alloc(Type::Scalar { kind, signed });
        self.type_cache.insert(key, id);
        id
    }

    /// Returns an interned predefined integer type.
    pub fn predef_type(&mut self, kind: PredefIntKind, signed: Option<bool>) -> TypeId {
        let signed = signed.unwrap_or_else(|| predef_signed(kind));
        let key = TypeKey::PredefInt(kind, signed);
        if let Some(&id) = self.type_cache.get(&key) {
            return id;
        }
        let id = self.types.alloc(Type::PredefInt { kind, signed });
        self.type_cache.insert(key, id);
        id
    }

    /// Returns an interned floating type.
    pub fn floating_type(&mut self, kind: RealKind) -> TypeId {
        let key = TypeKey::Floating(kind);
        if let Some(&id) = self.type_cache.get(&key) {
            return id;
        }
        let id = self.types.alloc(Type::Floating { kind });
        self.type_cache.insert(key, id);
        id
    }

    /// Returns the interned simple bit vector type of the given width and
    /// flags, with the common `[width-1:0]` range.
    pub fn vector_type(&mut self, width: u32, flags: IntegralFlags) -> TypeId {
        let width = width.max(1);
        if width == 1 && !flags.reg {
            let kind = if flags.four_state {
                ScalarKind::Logic
            } else {
                ScalarKind::Bit
            };
            return self.scalar_type(kind, flags.signed);
        }
        let key = TypeKey::Vector(width, flags);
        if let Some(&id) = self.type_cache.get(&key) {
            return id;
        }
        let scalar_kind = if flags.reg {
            ScalarKind::Reg
        } else if flags.four_state {
            ScalarKind::Logic
        } else {
            ScalarKind::Bit
        };
        let elem = self.scalar_type(scalar_kind, false);
        let id = self.types.alloc(Type::PackedArray {
            elem,
            range: ConstantRange::new(width as i32 - 1, 0),
            width,
            signed: flags.signed,
            four_state: flags.four_state,
        });
        self.type_cache.insert(key, id);
        id
    }

    /// Returns an interned packed array of the given element and range.
    pub fn packed_array_type(&mut self, elem: TypeId, range: ConstantRange) -> TypeId {
        if self.is_error_type(elem) {
            return self.builtins.error_type;
        }
        let key = TypeKey::PackedArray(elem, range);
        if let Some(&id) = self.type_cache.get(&key) {
            return id;
        }
        let elem_width = self.bit_width(elem);
        let signed = self.is_signed(elem);
        let four_state = self.is_four_state(elem);
        let id = self.types.alloc(Type::PackedArray {
            elem,
            range,
            width: elem_width * range.width(),
            signed,
            four_state,
        });
        self.type_cache.insert(key, id);
        id
    }

    /// Creates an unpacked array of the given element and range.
    pub fn unpacked_array_type(&mut self, elem: TypeId, range: ConstantRange) -> TypeId {
        if self.is_error_type(elem) {
            return self.builtins.error_type;
        }
        self.types.alloc(Type::UnpackedArray { elem, range })
    }

    /// Wraps a base type in unpacked dimensions, outermost first.
    pub fn wrap_unpacked_dims(
        &mut self,
        base: TypeId,
        dims: &'a [syntax::UnpackedDim],
        scope: SymbolId,
        location: LookupLocation,
    ) -> TypeId {
        let mut result = base;
        for dim in dims.iter().rev() {
            match self.eval_unpacked_dim(dim, scope, location) {
                Some(range) => result = self.unpacked_array_type(result, range),
                None => return self.builtins.error_type,
            }
        }
        result
    }

    /// Evaluates a packed dimension to a constant range.
    pub fn eval_packed_dim(
        &mut self,
        dim: &'a syntax::PackedDim,
        scope: SymbolId,
        location: LookupLocation,
    ) -> Option<ConstantRange> {
        let left = self.eval_const_i32(&dim.left, scope, location);
        let right = self.eval_const_i32(&dim.right, scope, location);
        match (left, right) {
            (Some(left), Some(right)) => Some(ConstantRange::new(left, right)),
            _ => {
                self.sink.emit(errors::error_invalid_dimension(dim.span));
                None
            }
        }
    }

    /// Evaluates an unpacked dimension to a constant range.
    pub fn eval_unpacked_dim(
        &mut self,
        dim: &'a syntax::UnpackedDim,
        scope: SymbolId,
        location: LookupLocation,
    ) -> Option<ConstantRange> {
        match dim {
            syntax::UnpackedDim::Range(left, right, span) => {
                let l = self.eval_const_i32(left, scope, location);
                let r = self.eval_const_i32(right, scope, location);
                match (l, r) {
                    (Some(l), Some(r)) => Some(ConstantRange::new(l, r)),
                    _ => {
                        self.sink.emit(errors::error_invalid_dimension(*span));
                        None
                    }
                }
            }
            syntax::UnpackedDim::Size(size, span) => {
                match self.eval_const_i32(size, scope, location) {
                    Some(n) if n > 0 => Some(ConstantRange::new(0, n - 1)),
                    _ => {
                        self.sink.emit(errors::error_invalid_dimension(*span));
                        None
                    }
                }
            }
        }
    }

    /// Builds a type from type syntax at the given lookup location.
    pub fn type_from_syntax(
        &mut self,
        ty: &'a syntax::DataType,
        scope: SymbolId,
        location: LookupLocation,
        force_signed: bool,
    ) -> TypeId {
        match ty {
            syntax::DataType::Implicit { signed, dims, .. } => {
                self.vector_from_dims(
                    ScalarKind::Logic,
                    *signed || force_signed,
                    dims,
                    scope,
                    location,
                )
            }
            syntax::DataType::Scalar {
                kind, signed, dims, ..
            } => self.vector_from_dims(*kind, *signed || force_signed, dims, scope, location),
            syntax::DataType::PredefInt { kind, signed, .. } => {
                let signed = match signed {
                    Some(s) => Some(*s || force_signed),
                    None if force_signed => Some(true),
                    None => None,
                };
                self.predef_type(*kind, signed)
            }
            syntax::DataType::Real { kind, .. } => self.floating_type(*kind),
            syntax::DataType::String { .. } => self.builtins.string_type,
            syntax::DataType::Chandle { .. } => self.builtins.chandle_type,
            syntax::DataType::Event { .. } => self.builtins.event_type,
            syntax::DataType::Void { .. } => self.builtins.void_type,
            syntax::DataType::Named {
                package,
                name,
                name_span,
                dims,
                ..
            } => {
                let base = self.lookup_named_type(*package, *name, *name_span, scope, location);
                self.wrap_packed_dims(base, dims, scope, location)
            }
            syntax::DataType::Enum { .. } => self.enum_from_syntax(ty, scope, location, force_signed),
            syntax::DataType::Struct { .. } => {
                self.struct_from_syntax(ty, scope, location, force_signed)
            }
        }
    }

    fn vector_from_dims(
        &mut self,
        kind: ScalarKind,
        signed: bool,
        dims: &'a [syntax::PackedDim],
        scope: SymbolId,
        location: LookupLocation,
    ) -> TypeId {
        if dims.is_empty() {
            return self.scalar_type(kind, signed);
        }
        let mut ranges = Vec::new();
        for dim in dims {
            match self.eval_packed_dim(dim, scope, location) {
                Some(range) => ranges.push(range),
                None => return self.builtins.error_type,
            }
        }
        let flags = IntegralFlags {
            signed,
            four_state: kind != ScalarKind::Bit,
            reg: kind == ScalarKind::Reg,
        };
        if ranges.len() == 1 && ranges[0].right == 0 {
            // The common single-dimension [n:0] form shares one
            // representation per (width, flags).
            return self.vector_type(ranges[0].width(), flags);
        }
        let mut result = self.scalar_type(kind, false);
        for range in ranges.iter().rev() {
            result = self.packed_array_type(result, *range);
        }
        // Signedness applies to the outermost vector.
        if signed {
            if let Type::PackedArray {
                elem, range, width, four_state, ..
            } = self.types[result]
            {
                result = self.types.alloc(Type::PackedArray {
                    elem,
                    range,
                    width,
                    signed: true,
                    four_state,
                });
            }
        }
        result
    }

    /// Wraps a base type in packed dimensions, outermost first.
    pub fn wrap_packed_dims(
        &mut self,
        base: TypeId,
        dims: &'a [syntax::PackedDim],
        scope: SymbolId,
        location: LookupLocation,
    ) -> TypeId {
        let mut result = base;
        for dim in dims.iter().rev() {
            match self.eval_packed_dim(dim, scope, location) {
                Some(range) => result = self.packed_array_type(result, range),
                None => return self.builtins.error_type,
            }
        }
        result
    }

    fn lookup_named_type(
        &mut self,
        package: Option<Ident>,
        name: Ident,
        name_span: Span,
        scope: SymbolId,
        location: LookupLocation,
    ) -> TypeId {
        let found = if let Some(pkg) = package {
            match self.get_package(pkg) {
                Some(pkg_sym) => self.lookup_in_scope(pkg_sym, name),
                None => {
                    self.sink.emit(errors::error_unknown_package(
                        self.interner.resolve(pkg),
                        name_span,
                    ));
                    return self.builtins.error_type;
                }
            }
        } else {
            self.lookup_unqualified(scope, name, location)
        };

        let Some(found) = found else {
            self.sink.emit(errors::error_undeclared_identifier(
                self.interner.resolve(name),
                name_span,
            ));
            return self.builtins.error_type;
        };

        if !self.symbols[found].is_type() {
            self.sink.emit(errors::error_not_a_type(
                self.interner.resolve(name),
                name_span,
            ));
            return self.builtins.error_type;
        }
        self.get_alias_type(found)
    }

    /// Returns the alias type wrapping a typedef or type parameter symbol,
    /// creating it on first use.
    pub fn get_alias_type(&mut self, symbol: SymbolId) -> TypeId {
        let name = self.symbols[symbol]
            .name
            .unwrap_or_else(|| self.interner.get_or_intern("<anonymous>"));
        match &mut self.symbols[symbol].kind {
            SymbolKind::TypeAlias { alias_ty, .. }
            | SymbolKind::TypeParameter { alias_ty, .. } => {
                if let Some(id) = alias_ty {
                    return *id;
                }
            }
            _ => return self.builtins.error_type,
        }
        let id = self.types.alloc(Type::Alias { name, symbol });
        match &mut self.symbols[symbol].kind {
            SymbolKind::TypeAlias { alias_ty, .. }
            | SymbolKind::TypeParameter { alias_ty, .. } => *alias_ty = Some(id),
            _ => {}
        }
        id
    }

    // ---- definitions and packages ----

    fn create_definition(&mut self, unit: SymbolId, decl: &'a syntax::ModuleDecl) {
        let sym = self.symbols.alloc(Symbol::new(
            SymbolKind::Definition {
                scope: ScopeData::default(),
                syntax: decl,
                def_kind: decl.kind,
                parameters: Vec::new(),
                time_scale: self.merge_time_scale(decl.time_scale, &decl.items),
            },
            Some(decl.name),
            decl.name_span,
        ));
        self.insert_member(unit, sym, true);

        if let Some(&previous) = self.definitions.get(&decl.name) {
            let prev_span = self.symbols[previous].span;
            self.sink.emit(errors::error_redefinition(
                self.interner.resolve(decl.name),
                decl.name_span,
                prev_span,
            ));
        } else {
            self.definitions.insert(decl.name, sym);
        }

        self.populate_definition_scope(sym, decl);
    }

    fn merge_time_scale(
        &self,
        directive: Option<TimeScale>,
        items: &'a [syntax::ModuleItem],
    ) -> Option<TimeScale> {
        let mut result = directive.or(self.options.default_time_scale);
        for item in items {
            if let syntax::ModuleItem::TimeUnits(decl) = item {
                if let (Some(value), Some(current)) = (decl.value, result.as_mut()) {
                    if decl.is_unit {
                        current.base = value;
                        if let Some(p) = decl.precision {
                            current.precision = p;
                        }
                    } else {
                        current.precision = value;
                    }
                } else if let Some(value) = decl.value {
                    let precision = decl.precision.unwrap_or(value);
                    result = Some(TimeScale {
                        base: value,
                        precision,
                    });
                }
            }
        }
        result
    }

    /// Builds the definition scope: header imports, parameter ports, and
    /// body members, recording parameter metadata in declaration order.
    fn populate_definition_scope(&mut self, def: SymbolId, decl: &'a syntax::ModuleDecl) {
        for import in &decl.imports {
            self.add_import_members(def, import);
        }

        let has_port_params = decl.param_ports.is_some();
        let mut parameters = Vec::new();
        if let Some(param_ports) = &decl.param_ports {
            for param in param_ports {
                self.add_param_symbols(def, param, true, &mut parameters);
            }
        }

        let ctx = MemberCtx {
            has_port_params,
            ..MemberCtx::default()
        };
        for item in &decl.items {
            if let syntax::ModuleItem::Parameter(param) = item {
                // Body parameters of a definition with a parameter port
                // list are implicitly local.
                let is_local = has_port_params || param.is_local;
                self.add_param_symbols_with_local(def, param, false, is_local, &mut parameters);
            } else {
                self.add_member_item(def, item, &ctx);
            }
        }

        if let SymbolKind::Definition {
            parameters: slot, ..
        } = &mut self.symbols[def].kind
        {
            *slot = parameters;
        }
    }

    pub(crate) fn add_param_symbols(
        &mut self,
        scope: SymbolId,
        param: &'a syntax::ParamDecl,
        is_port: bool,
        out: &mut Vec<crate::symbols::ParamInfo>,
    ) {
        self.add_param_symbols_with_local(scope, param, is_port, param.is_local, out);
    }

    pub(crate) fn add_param_symbols_with_local(
        &mut self,
        scope: SymbolId,
        param: &'a syntax::ParamDecl,
        is_port: bool,
        is_local: bool,
        out: &mut Vec<crate::symbols::ParamInfo>,
    ) {
        for declarator in &param.declarators {
            self.add_one_param(scope, param, declarator, is_port, is_local, out);
        }
    }

    pub(crate) fn add_one_param(
        &mut self,
        scope: SymbolId,
        param: &'a syntax::ParamDecl,
        declarator: &'a syntax::Declarator,
        is_port: bool,
        is_local: bool,
        out: &mut Vec<crate::symbols::ParamInfo>,
    ) {
        let mut declared = crate::symbols::DeclaredType::from_declarator(&param.ty, declarator);
        declared.flags.infer_implicit = true;
        declared.flags.require_constant = true;
        let kind = if param.is_type {
            SymbolKind::TypeParameter {
                declared,
                is_local,
                is_port,
                alias_ty: None,
            }
        } else {
            SymbolKind::Parameter {
                declared,
                is_local,
                is_port,
                value: None,
            }
        };
        let sym = self.symbols.alloc(Symbol::new(
            kind,
            Some(declarator.name),
            declarator.name_span,
        ));
        self.insert_member(scope, sym, true);
        out.push(crate::symbols::ParamInfo {
            name: declarator.name,
            is_local,
            is_port,
            is_type: param.is_type,
            symbol: sym,
        });
    }

    fn create_package(&mut self, unit: SymbolId, decl: &'a syntax::PackageDecl) {
        let sym = self.symbols.alloc(Symbol::new(
            SymbolKind::Package {
                scope: ScopeData::default(),
                default_net_type: decl.default_net_type,
                time_scale: decl.time_scale.or(self.options.default_time_scale),
            },
            Some(decl.name),
            decl.name_span,
        ));
        self.insert_member(unit, sym, true);

        if let Some(&previous) = self.packages.get(&decl.name) {
            let prev_span = self.symbols[previous].span;
            self.sink.emit(errors::error_redefinition(
                self.interner.resolve(decl.name),
                decl.name_span,
                prev_span,
            ));
        } else {
            self.packages.insert(decl.name, sym);
        }

        let ctx = MemberCtx::default();
        for item in &decl.items {
            self.add_member_item(sym, item, &ctx);
        }
    }

    /// Looks up the enclosing instance's parameter cache, used when the
    /// evaluator reads a parameter's value.
    pub(crate) fn cached_parameter_value(&self, sym: SymbolId) -> Option<&ConstantValue> {
        match &self.symbols[sym].kind {
            SymbolKind::Parameter { value, .. } => value.as_ref(),
            SymbolKind::EnumValue { value, .. } => value.as_ref(),
            _ => None,
        }
    }
}
