//! Scope construction: member addition, name maps, and deferred
//! elaboration.
//!
//! Scopes are built incrementally: walking child syntax either emits a
//! concrete symbol or a deferred member for syntax whose elaboration must
//! wait until surrounding parameters and types are known (instantiations
//! and generate constructs). The first use of a scope triggers
//! [`Compilation::elaborate_scope`], which replaces each deferred member
//! with its materialized symbols in declaration order.

use std::collections::HashMap;

use crate::arena::{SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::symbols::{DeclaredType, Symbol, SymbolKind};
use crate::Compilation;
use veris_common::Ident;
use veris_parser::ast as syntax;
use veris_parser::ast::{Direction, ForwardTypedefCategory, NetKind};

/// A parameter pre-evaluated during instantiation, applied when the
/// instance body reaches the parameter's declaration.
#[derive(Clone, Debug)]
pub struct PreparedParam {
    /// True for local parameters.
    pub is_local: bool,
    /// True for parameters from the `#(...)` header.
    pub is_port: bool,
    /// True for type parameters.
    pub is_type: bool,
    /// The evaluated value for value parameters.
    pub value: Option<ConstantValue>,
    /// The resolved type of the parameter.
    pub ty: Option<TypeId>,
}

/// Context threaded through member addition.
#[derive(Clone, Copy)]
pub struct MemberCtx<'p> {
    /// True inside a definition that has a parameter port list (body
    /// parameters become local).
    pub has_port_params: bool,
    /// Pre-evaluated parameters by name, set while populating an instance
    /// body.
    pub prepared_params: Option<&'p HashMap<Ident, PreparedParam>>,
    /// The `default_nettype` for implicitly typed port declarations.
    pub default_net_type: NetKind,
}

impl Default for MemberCtx<'_> {
    fn default() -> Self {
        Self {
            has_port_params: false,
            prepared_params: None,
            default_net_type: NetKind::Wire,
        }
    }
}

impl<'a> Compilation<'a> {
    /// Inserts a symbol into a scope's member list (and name map when
    /// `named` is set), assigning its declaration-order index.
    pub(crate) fn insert_member(&mut self, scope: SymbolId, member: SymbolId, named: bool) {
        let index = {
            let data = self.symbols[scope]
                .scope_mut()
                .expect("insert_member target must be a scope");
            let index = data.next_index;
            data.next_index += 1;
            data.members.push(member);
            index
        };
        let sym = &mut self.symbols[member];
        sym.parent = Some(scope);
        sym.index_in_scope = index;

        if named {
            self.insert_name(scope, member);
        }
    }

    /// Inserts a member into the scope's name map. First-declared wins;
    /// duplicates are diagnosed and dropped, except that a forward typedef
    /// placeholder is replaced by the real typedef when it arrives.
    pub(crate) fn insert_name(&mut self, scope: SymbolId, member: SymbolId) {
        let Some(name) = self.symbols[member].name else {
            return;
        };

        let existing = self.symbols[scope]
            .scope()
            .and_then(|s| s.name_map.get(&name).copied());

        match existing {
            None => {
                if let Some(data) = self.symbols[scope].scope_mut() {
                    data.name_map.insert(name, member);
                }
            }
            Some(previous) => {
                let prev_is_forward = matches!(
                    self.symbols[previous].kind,
                    SymbolKind::ForwardingTypedef { .. }
                );
                let new_is_forward = matches!(
                    self.symbols[member].kind,
                    SymbolKind::ForwardingTypedef { .. }
                );
                if prev_is_forward && !new_is_forward {
                    if let Some(data) = self.symbols[scope].scope_mut() {
                        data.name_map.insert(name, member);
                    }
                } else if new_is_forward {
                    // Forward declarations may repeat freely.
                } else {
                    let span = self.symbols[member].span;
                    let prev_span = self.symbols[previous].span;
                    self.sink.emit(errors::error_redefinition(
                        self.interner.resolve(name),
                        span,
                        prev_span,
                    ));
                }
            }
        }
    }

    /// Adds members for an import declaration: explicit imports go in the
    /// name map under the imported name, wildcard imports into the
    /// sideband list.
    pub(crate) fn add_import_members(&mut self, scope: SymbolId, decl: &'a syntax::ImportDecl) {
        for spec in &decl.specs {
            match spec.item {
                Some(item) => {
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::ExplicitImport {
                            package: spec.package,
                            name: item,
                        },
                        Some(item),
                        spec.item_span,
                    ));
                    self.insert_member(scope, sym, true);
                }
                None => {
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::WildcardImport {
                            package: spec.package,
                        },
                        None,
                        spec.item_span,
                    ));
                    self.insert_member(scope, sym, false);
                    if let Some(data) = self.symbols[scope].scope_mut() {
                        data.wildcard_imports.push(sym);
                    }
                }
            }
        }
    }

    /// Walks one item of child syntax and adds the resulting symbols (or a
    /// deferred member) to the scope.
    pub(crate) fn add_member_item(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        ctx: &MemberCtx<'_>,
    ) {
        match item {
            syntax::ModuleItem::Import(decl) => self.add_import_members(scope, decl),
            syntax::ModuleItem::Parameter(param) => {
                self.add_param_decl(scope, param, ctx);
            }
            syntax::ModuleItem::Typedef(td) => {
                let mut declared = DeclaredType::from_type(&td.ty);
                declared.dims_syntax = &td.dims;
                let sym = self.symbols.alloc(Symbol::new(
                    SymbolKind::TypeAlias {
                        declared,
                        alias_ty: None,
                    },
                    Some(td.name),
                    td.name_span,
                ));
                self.insert_member(scope, sym, true);
            }
            syntax::ModuleItem::ForwardTypedef {
                category,
                name,
                name_span,
                ..
            } => {
                let sym = self.symbols.alloc(Symbol::new(
                    SymbolKind::ForwardingTypedef {
                        category: *category,
                    },
                    Some(*name),
                    *name_span,
                ));
                self.insert_member(scope, sym, true);
            }
            syntax::ModuleItem::Net(decl) => {
                for declarator in &decl.declarators {
                    let declared = DeclaredType::from_declarator(&decl.ty, declarator);
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::Net {
                            declared,
                            net_kind: decl.net_kind,
                        },
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(scope, sym, true);
                }
            }
            syntax::ModuleItem::Data(decl) => {
                for declarator in &decl.declarators {
                    let declared = DeclaredType::from_declarator(&decl.ty, declarator);
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::Variable {
                            declared,
                            is_const: decl.is_const,
                            is_compiler_generated: false,
                        },
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(scope, sym, true);
                }
            }
            syntax::ModuleItem::PortDecl {
                direction,
                net,
                is_var,
                ty,
                declarators,
                ..
            } => {
                // Non-ANSI bodies declare the port-backing net/variable.
                for declarator in declarators {
                    let declared = DeclaredType::from_declarator(ty, declarator);
                    let kind = if *is_var || *direction == Direction::Output {
                        SymbolKind::Variable {
                            declared,
                            is_const: false,
                            is_compiler_generated: false,
                        }
                    } else {
                        SymbolKind::Net {
                            declared,
                            net_kind: net.unwrap_or(ctx.default_net_type),
                        }
                    };
                    let sym = self.symbols.alloc(Symbol::new(
                        kind,
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(scope, sym, true);
                }
            }
            syntax::ModuleItem::Genvar { names, .. } => {
                for (name, span) in names {
                    let sym = self
                        .symbols
                        .alloc(Symbol::new(SymbolKind::Genvar, Some(*name), *span));
                    self.insert_member(scope, sym, true);
                }
            }
            syntax::ModuleItem::ContinuousAssign { assignments, .. } => {
                for assignment in assignments {
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::ContinuousAssign {
                            assignment,
                            bound: None,
                        },
                        None,
                        assignment.span(),
                    ));
                    self.insert_member(scope, sym, false);
                }
            }
            syntax::ModuleItem::GenerateRegion(items, _) => {
                // Generate regions are transparent; their items belong to
                // the surrounding scope.
                for inner in items {
                    self.add_member_item(scope, inner, ctx);
                }
            }
            syntax::ModuleItem::Instantiation(_)
            | syntax::ModuleItem::IfGenerate { .. }
            | syntax::ModuleItem::CaseGenerate { .. }
            | syntax::ModuleItem::LoopGenerate { .. } => {
                let sym = self.symbols.alloc(Symbol::new(
                    SymbolKind::DeferredMember(item),
                    None,
                    item.span(),
                ));
                self.insert_member(scope, sym, false);
                if let Some(data) = self.symbols[scope].scope_mut() {
                    data.has_deferred = true;
                }
            }
            syntax::ModuleItem::Subroutine(decl) => {
                self.create_subroutine(scope, decl);
            }
            syntax::ModuleItem::Modport { items, .. } => {
                for mp in items {
                    let ports = mp
                        .ports
                        .iter()
                        .map(|p| (p.direction, p.name, p.name_span))
                        .collect();
                    let sym = self.symbols.alloc(Symbol::new(
                        SymbolKind::Modport { ports },
                        Some(mp.name),
                        mp.name_span,
                    ));
                    self.insert_member(scope, sym, true);
                }
            }
            syntax::ModuleItem::Empty(span) => {
                let sym = self
                    .symbols
                    .alloc(Symbol::new(SymbolKind::EmptyMember, None, *span));
                self.insert_member(scope, sym, false);
            }
            // Procedural bodies are not elaborated by the front-end, and
            // time unit declarations were folded into the definition.
            syntax::ModuleItem::Procedural { .. }
            | syntax::ModuleItem::TimeUnits(_)
            | syntax::ModuleItem::Error(_) => {}
        }
    }

    fn add_param_decl(
        &mut self,
        scope: SymbolId,
        param: &'a syntax::ParamDecl,
        ctx: &MemberCtx<'_>,
    ) {
        // Inside an instance body, parameters were pre-evaluated during
        // instantiation; install them with their values.
        if let Some(prepared) = ctx.prepared_params {
            for declarator in &param.declarators {
                if let Some(p) = prepared.get(&declarator.name) {
                    let declared = match p.ty {
                        Some(ty) => DeclaredType::resolved(ty),
                        None => {
                            let mut d = DeclaredType::from_declarator(&param.ty, declarator);
                            d.flags.infer_implicit = true;
                            d.flags.require_constant = true;
                            d
                        }
                    };
                    let kind = if p.is_type {
                        SymbolKind::TypeParameter {
                            declared,
                            is_local: p.is_local,
                            is_port: p.is_port,
                            alias_ty: None,
                        }
                    } else {
                        SymbolKind::Parameter {
                            declared,
                            is_local: p.is_local,
                            is_port: p.is_port,
                            value: p.value.clone(),
                        }
                    };
                    let sym = self.symbols.alloc(Symbol::new(
                        kind,
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(scope, sym, true);
                    continue;
                }
                // Fall back to a fresh symbol for names the instantiation
                // didn't prepare (error recovery).
                let mut out = Vec::new();
                self.add_one_param(
                    scope,
                    param,
                    declarator,
                    false,
                    ctx.has_port_params || param.is_local,
                    &mut out,
                );
            }
            return;
        }

        let mut out = Vec::new();
        self.add_param_symbols_with_local(
            scope,
            param,
            false,
            ctx.has_port_params || param.is_local,
            &mut out,
        );
    }

    fn create_subroutine(&mut self, scope: SymbolId, decl: &'a syntax::FunctionDecl) {
        let return_declared = DeclaredType::from_type(&decl.return_type);
        let sub = self.symbols.alloc(Symbol::new(
            SymbolKind::Subroutine {
                scope: Default::default(),
                syntax: decl,
                return_declared: return_declared.clone(),
                args: Vec::new(),
                return_var: None,
                body: None,
                is_task: decl.kind == syntax::SubroutineKind::Task,
            },
            Some(decl.name),
            decl.name_span,
        ));
        self.insert_member(scope, sub, true);

        let mut args = Vec::new();
        for arg in &decl.args {
            let mut declared = DeclaredType::from_type(&arg.ty);
            declared.dims_syntax = &arg.dims;
            declared.init_syntax = arg.default.as_ref();
            let sym = self.symbols.alloc(Symbol::new(
                SymbolKind::FormalArgument {
                    declared,
                    direction: arg.direction,
                },
                Some(arg.name),
                arg.name_span,
            ));
            self.insert_member(sub, sym, true);
            args.push(sym);
        }

        // Functions get an implicit return-value variable with the same
        // name as the function, shadowing it inside the body.
        let mut return_var = None;
        if decl.kind == syntax::SubroutineKind::Function {
            let var = self.symbols.alloc(Symbol::new(
                SymbolKind::Variable {
                    declared: return_declared,
                    is_const: false,
                    is_compiler_generated: true,
                },
                Some(decl.name),
                decl.name_span,
            ));
            self.insert_member(sub, var, true);
            return_var = Some(var);
        }

        if let SymbolKind::Subroutine {
            args: slot,
            return_var: rv,
            ..
        } = &mut self.symbols[sub].kind
        {
            *slot = args;
            *rv = return_var;
        }
    }

    /// Elaborates a scope's deferred members in declaration order,
    /// replacing each placeholder with its materialized symbols.
    pub fn elaborate_scope(&mut self, scope: SymbolId) {
        {
            let Some(data) = self.symbols[scope].scope() else {
                return;
            };
            if !data.has_deferred || data.is_elaborating {
                return;
            }
        }
        if let Some(data) = self.symbols[scope].scope_mut() {
            data.is_elaborating = true;
        }

        let members = self.symbols[scope]
            .scope()
            .map(|s| s.members.clone())
            .unwrap_or_default();

        let mut rebuilt = Vec::with_capacity(members.len());
        for member in members {
            let deferred = match self.symbols[member].kind {
                SymbolKind::DeferredMember(item) => Some(item),
                _ => None,
            };
            match deferred {
                None => rebuilt.push(member),
                Some(item) => {
                    let index = self.symbols[member].index_in_scope;
                    let produced = self.elaborate_deferred(scope, item, index);
                    for new_member in produced {
                        // Materialized symbols share the deferred member's
                        // declaration-order index.
                        let sym = &mut self.symbols[new_member];
                        sym.parent = Some(scope);
                        sym.index_in_scope = index;
                        rebuilt.push(new_member);
                        let insert = match &self.symbols[new_member].kind {
                            // Uninstantiated generate blocks stay out of
                            // the name map so the selected block owns the
                            // label.
                            SymbolKind::GenerateBlock {
                                is_instantiated, ..
                            } => *is_instantiated,
                            _ => true,
                        };
                        if insert {
                            self.insert_name(scope, new_member);
                        }
                    }
                }
            }
        }

        if let Some(data) = self.symbols[scope].scope_mut() {
            data.members = rebuilt;
            data.has_deferred = false;
            data.is_elaborating = false;
        }
    }

    fn elaborate_deferred(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        index: u32,
    ) -> Vec<SymbolId> {
        match item {
            syntax::ModuleItem::Instantiation(inst) => {
                self.elaborate_instantiation(scope, inst, index)
            }
            syntax::ModuleItem::IfGenerate { .. }
            | syntax::ModuleItem::CaseGenerate { .. }
            | syntax::ModuleItem::LoopGenerate { .. } => {
                self.elaborate_generate(scope, item, index)
            }
            _ => Vec::new(),
        }
    }

    /// Checks a forward typedef against the typedef that resolved it.
    pub(crate) fn check_forward_typedef(&mut self, forward: SymbolId) {
        let SymbolKind::ForwardingTypedef { category } = self.symbols[forward].kind else {
            return;
        };
        if category == ForwardTypedefCategory::None {
            return;
        }
        let Some(name) = self.symbols[forward].name else {
            return;
        };
        let Some(parent) = self.symbols[forward].parent else {
            return;
        };
        let Some(&target) = self.symbols[parent]
            .scope()
            .and_then(|s| s.name_map.get(&name))
        else {
            return;
        };
        if !matches!(self.symbols[target].kind, SymbolKind::TypeAlias { .. }) {
            return;
        }

        let target_ty = self.declared_type_of(target);
        let canonical = self.canonical(target_ty);
        let actual = match &self.types[canonical] {
            crate::types::Type::PackedStruct { .. } | crate::types::Type::UnpackedStruct { .. } => {
                ForwardTypedefCategory::Struct
            }
            crate::types::Type::PackedUnion { .. } | crate::types::Type::UnpackedUnion { .. } => {
                ForwardTypedefCategory::Union
            }
            crate::types::Type::Enum { .. } => ForwardTypedefCategory::Enum,
            _ => return,
        };
        if actual != category {
            let span = self.symbols[forward].span;
            let decl = self.symbols[target].span;
            self.sink.emit(errors::error_forward_typedef_mismatch(
                self.interner.resolve(name),
                span,
                decl,
            ));
        }
    }
}
