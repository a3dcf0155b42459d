//! Instance elaboration: parameter override matching, temporary parameter
//! evaluation scopes, recursive instance-array materialization, and port
//! connection binding.

use std::collections::HashMap;

use crate::arena::{SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::eval::EvalContext;
use crate::expr::{BindContext, ExpressionKind};
use crate::lookup::LookupLocation;
use crate::scope::{MemberCtx, PreparedParam};
use crate::symbols::{DeclaredType, ParamInfo, ScopeData, Symbol, SymbolKind};
use crate::Compilation;
use veris_common::Ident;
use veris_parser::ast as syntax;
use veris_parser::ast::{DefinitionKind, Direction};
use veris_source::Span;

struct NamedAssignment<'a> {
    name_span: Span,
    expr: Option<&'a syntax::Expr>,
    used: bool,
}

impl<'a> Compilation<'a> {
    /// Elaborates one hierarchy instantiation inside a scope, producing
    /// the instance (or instance array) symbols.
    pub(crate) fn elaborate_instantiation(
        &mut self,
        scope: SymbolId,
        inst: &'a syntax::HierarchyInstantiation,
        index: u32,
    ) -> Vec<SymbolId> {
        let Some(def) = self.get_definition(inst.module) else {
            self.sink.emit(errors::error_unknown_module(
                self.interner.resolve(inst.module),
                inst.module_span,
            ));
            return Vec::new();
        };

        let location = LookupLocation::at(scope, index);
        let prepared = self.prepare_parameters(def, Some(inst), scope, location);

        let mut results = Vec::new();
        for instance in &inst.instances {
            let mut path = Vec::new();
            if let Some(sym) = self.recurse_instance_array(
                def,
                instance,
                &instance.dims,
                &prepared,
                scope,
                location,
                &mut path,
            ) {
                results.push(sym);
            }
        }
        results
    }

    /// Creates a top-level instance of a definition with default
    /// parameter values.
    pub(crate) fn create_default_instance(
        &mut self,
        def: SymbolId,
        name: Option<Ident>,
        span: Span,
    ) -> SymbolId {
        let location = LookupLocation::MAX;
        let root = self.root_symbol();
        let prepared = self.prepare_parameters(def, None, root, location);
        self.create_instance_leaf(def, name, span, None, &prepared, root, location, &[])
    }

    /// True if every non-local parameter port of the definition has a
    /// default value, so the definition can stand alone as a top module.
    pub(crate) fn definition_params_resolved(&self, def: SymbolId) -> bool {
        let SymbolKind::Definition { syntax: decl, .. } = &self.symbols[def].kind else {
            return false;
        };
        match &decl.param_ports {
            None => true,
            Some(params) => params.iter().all(|p| {
                p.is_local || p.declarators.iter().all(|d| d.init.is_some())
            }),
        }
    }

    /// Classifies parameter assignments, clones the definition parameters
    /// into a temporary scope parented to the definition's parent, applies
    /// overrides, and evaluates. Evaluation happens once here so instance
    /// arrays share one parameter set.
    fn prepare_parameters(
        &mut self,
        def: SymbolId,
        inst: Option<&'a syntax::HierarchyInstantiation>,
        scope: SymbolId,
        location: LookupLocation,
    ) -> HashMap<Ident, PreparedParam> {
        let (def_params, decl) = {
            let SymbolKind::Definition {
                parameters, syntax, ..
            } = &self.symbols[def].kind
            else {
                return HashMap::new();
            };
            (parameters.clone(), *syntax)
        };
        let def_name = decl.name;
        let def_parent = self.symbols[def].parent;

        // Classify the assignments as ordered or named.
        let mut ordered: Vec<&'a syntax::Expr> = Vec::new();
        let mut named: HashMap<Ident, NamedAssignment<'a>> = HashMap::new();
        let mut is_ordered = None;
        if let Some(inst) = inst {
            for assignment in &inst.param_assignments {
                let this_ordered = matches!(assignment, syntax::ParamAssignment::Ordered(_));
                match is_ordered {
                    None => is_ordered = Some(this_ordered),
                    Some(style) if style != this_ordered => {
                        self.sink.emit(errors::error_mixed_params(inst.span));
                        break;
                    }
                    _ => {}
                }
                match assignment {
                    syntax::ParamAssignment::Ordered(expr) => ordered.push(expr),
                    syntax::ParamAssignment::Named {
                        name,
                        name_span,
                        expr,
                    } => {
                        if let Some(previous) = named.get(name) {
                            self.sink.emit(errors::error_duplicate_param_assignment(
                                self.interner.resolve(*name),
                                *name_span,
                                previous.name_span,
                            ));
                            continue;
                        }
                        named.insert(
                            *name,
                            NamedAssignment {
                                name_span: *name_span,
                                expr: expr.as_ref(),
                                used: false,
                            },
                        );
                    }
                }
            }
        }

        // Match assignments against the declaration-ordered parameters.
        let mut overrides: HashMap<Ident, &'a syntax::Expr> = HashMap::new();
        if is_ordered == Some(true) {
            let mut next = 0usize;
            for info in &def_params {
                if next >= ordered.len() {
                    break;
                }
                if info.is_local {
                    continue;
                }
                overrides.insert(info.name, ordered[next]);
                next += 1;
            }
            if next < ordered.len() {
                let span = inst.map_or(Span::DUMMY, |i| i.span);
                self.sink.emit(errors::error_too_many_params(
                    self.interner.resolve(def_name),
                    ordered.len(),
                    next,
                    span,
                ));
            }
        } else {
            for info in &def_params {
                let Some(assignment) = named.get_mut(&info.name) else {
                    continue;
                };
                assignment.used = true;
                if info.is_local {
                    let decl_span = self.symbols[info.symbol].span;
                    let span = assignment.name_span;
                    self.sink.emit(errors::error_assigned_to_local_param(
                        self.interner.resolve(info.name),
                        info.is_port,
                        span,
                        decl_span,
                    ));
                    continue;
                }
                // An empty assignment keeps the default.
                if let Some(expr) = assignment.expr {
                    overrides.insert(info.name, expr);
                }
            }
            for (name, assignment) in &named {
                if !assignment.used {
                    self.sink.emit(errors::error_param_does_not_exist(
                        self.interner.resolve(*name),
                        self.interner.resolve(def_name),
                        assignment.name_span,
                    ));
                }
            }
        }

        // Build the temporary evaluation scope at the definition's parent
        // so defaults resolve in the definition's lexical context.
        let temp = self.symbols.alloc(Symbol::new(
            SymbolKind::ModuleInstance {
                scope: ScopeData::default(),
                definition: def,
            },
            Some(def_name),
            Span::DUMMY,
        ));
        self.symbols[temp].parent = def_parent;
        for import in &decl.imports {
            self.add_import_members(temp, import);
        }

        let inst_span = inst.map_or(Span::DUMMY, |i| i.span);
        let bind_ctx = BindContext {
            scope,
            location,
            constant: true,
        };

        let mut prepared = HashMap::new();
        for info in &def_params {
            let clone = self.clone_param_into(temp, info);
            let override_expr = overrides.get(&info.name).copied();

            if info.is_type {
                let target = self.resolve_type_param_override(clone, override_expr, &bind_ctx);
                match target {
                    Some(ty) => {
                        if let Some(declared) =
                            self.symbols[clone].declared_mut()
                        {
                            declared.resolved = Some(ty);
                            declared.initializer = Some(None);
                        }
                        prepared.insert(
                            info.name,
                            PreparedParam {
                                is_local: info.is_local,
                                is_port: info.is_port,
                                is_type: true,
                                value: None,
                                ty: Some(ty),
                            },
                        );
                    }
                    None if !info.is_local && info.is_port => {
                        self.sink.emit(errors::error_param_has_no_value(
                            self.interner.resolve(def_name),
                            self.interner.resolve(info.name),
                            inst_span,
                        ));
                    }
                    None => {}
                }
                continue;
            }

            // Value parameter: overridden initializers bind in the
            // instantiating scope against the declared type.
            let value = match override_expr {
                Some(expr) => {
                    let ty = self.declared_type_of(clone);
                    let bound = self.bind_assignment_like(ty, expr, &bind_ctx);
                    let mut ctx = EvalContext::new(self.options.max_eval_steps, location);
                    let value = self.eval_expr(&mut ctx, bound);
                    ctx.report_diags(self.sink);
                    if let SymbolKind::Parameter { value: slot, .. } =
                        &mut self.symbols[clone].kind
                    {
                        *slot = Some(value.clone());
                    }
                    Some(value)
                }
                None => {
                    let has_default = self.symbols[clone]
                        .declared()
                        .map_or(false, |d| d.init_syntax.is_some());
                    if !has_default {
                        if !info.is_local && info.is_port {
                            self.sink.emit(errors::error_param_has_no_value(
                                self.interner.resolve(def_name),
                                self.interner.resolve(info.name),
                                inst_span,
                            ));
                        }
                        None
                    } else if info.is_port {
                        // Defaults for header parameters evaluate up front
                        // and are shared across the whole instance array.
                        Some(self.parameter_value(clone))
                    } else {
                        // Body parameters re-evaluate inside the instance
                        // where body typedefs are visible.
                        None
                    }
                }
            };

            if let Some(value) = value {
                let ty = self.declared_type_of(clone);
                prepared.insert(
                    info.name,
                    PreparedParam {
                        is_local: info.is_local,
                        is_port: info.is_port,
                        is_type: false,
                        value: Some(value),
                        ty: Some(ty),
                    },
                );
            }
        }
        prepared
    }

    fn clone_param_into(&mut self, temp: SymbolId, info: &ParamInfo) -> SymbolId {
        let (declared, name, span) = {
            let source = &self.symbols[info.symbol];
            let declared = source
                .declared()
                .cloned()
                .unwrap_or_default();
            (declared, source.name, source.span)
        };
        let mut fresh = declared.clone();
        fresh.resolved = None;
        fresh.initializer = None;
        fresh.evaluating = false;
        let kind = if info.is_type {
            SymbolKind::TypeParameter {
                declared: fresh,
                is_local: info.is_local,
                is_port: info.is_port,
                alias_ty: None,
            }
        } else {
            SymbolKind::Parameter {
                declared: fresh,
                is_local: info.is_local,
                is_port: info.is_port,
                value: None,
            }
        };
        let clone = self.symbols.alloc(Symbol::new(kind, name, span));
        self.insert_member(temp, clone, true);
        clone
    }

    fn resolve_type_param_override(
        &mut self,
        clone: SymbolId,
        override_expr: Option<&'a syntax::Expr>,
        ctx: &BindContext,
    ) -> Option<TypeId> {
        match override_expr {
            Some(syntax::Expr::DataTypeExpr { ty, .. }) => {
                Some(self.type_from_syntax(ty, ctx.scope, ctx.location, false))
            }
            Some(syntax::Expr::Identifier { name, span }) => {
                let found = self.lookup_unqualified(ctx.scope, *name, ctx.location)?;
                if self.symbols[found].is_type() {
                    Some(self.get_alias_type(found))
                } else {
                    self.sink.emit(errors::error_not_a_type(
                        self.interner.resolve(*name),
                        *span,
                    ));
                    None
                }
            }
            Some(other) => {
                let name = self.symbols[clone]
                    .name
                    .map(|n| self.interner.resolve(n).to_string())
                    .unwrap_or_default();
                self.sink
                    .emit(errors::error_bad_type_param(&name, other.span()));
                None
            }
            None => {
                // No override: resolve the declared default, if any.
                let has_default = self.symbols[clone]
                    .declared()
                    .map_or(false, |d| d.type_syntax.is_some() || d.init_syntax.is_some());
                if !has_default {
                    return None;
                }
                // A type parameter's default rides in the initializer as a
                // data type expression.
                let init = self.symbols[clone].declared().and_then(|d| d.init_syntax);
                match init {
                    Some(syntax::Expr::DataTypeExpr { ty, .. }) => {
                        let parent = self.symbols[clone].parent.unwrap_or(self.root_symbol());
                        Some(self.type_from_syntax(ty, parent, LookupLocation::MAX, false))
                    }
                    _ => None,
                }
            }
        }
    }

    /// Recursively materializes instance arrays over the instance's
    /// dimensions; the leaf creates the actual instance.
    #[allow(clippy::too_many_arguments)]
    fn recurse_instance_array(
        &mut self,
        def: SymbolId,
        instance: &'a syntax::HierarchicalInstance,
        dims: &'a [syntax::UnpackedDim],
        prepared: &HashMap<Ident, PreparedParam>,
        scope: SymbolId,
        location: LookupLocation,
        path: &mut Vec<i32>,
    ) -> Option<SymbolId> {
        let Some((dim, rest)) = dims.split_first() else {
            return Some(self.create_instance_leaf(
                def,
                Some(instance.name),
                instance.name_span,
                Some(&instance.connections),
                prepared,
                scope,
                location,
                path,
            ));
        };

        // A bad dimension still produces an empty array so later
        // references don't cascade.
        let Some(range) = self.eval_unpacked_dim(dim, scope, location) else {
            let array = self.symbols.alloc(Symbol::new(
                SymbolKind::InstanceArray {
                    scope: ScopeData::default(),
                    elements: Vec::new(),
                    range: crate::types::ConstantRange::new(0, 0),
                },
                Some(instance.name),
                instance.name_span,
            ));
            return Some(array);
        };

        let array = self.symbols.alloc(Symbol::new(
            SymbolKind::InstanceArray {
                scope: ScopeData::default(),
                elements: Vec::new(),
                range,
            },
            Some(instance.name),
            instance.name_span,
        ));

        let mut elements = Vec::new();
        let mut index = range.lower();
        while index <= range.upper() {
            path.push(index);
            if let Some(element) = self.recurse_instance_array(
                def, instance, rest, prepared, scope, location, path,
            ) {
                // Array elements are addressed by index, not name.
                self.symbols[element].name = None;
                self.insert_member(array, element, false);
                elements.push(element);
            }
            path.pop();
            index += 1;
        }

        if let SymbolKind::InstanceArray {
            elements: slot, ..
        } = &mut self.symbols[array].kind
        {
            *slot = elements;
        }
        Some(array)
    }

    /// Creates one instance: imports, parameters, ports, connections, and
    /// body members, in that order.
    #[allow(clippy::too_many_arguments)]
    fn create_instance_leaf(
        &mut self,
        def: SymbolId,
        name: Option<Ident>,
        name_span: Span,
        connections: Option<&'a [syntax::PortConnection]>,
        prepared: &HashMap<Ident, PreparedParam>,
        parent_scope: SymbolId,
        location: LookupLocation,
        array_path: &[i32],
    ) -> SymbolId {
        let (decl, def_kind) = {
            let SymbolKind::Definition {
                syntax, def_kind, ..
            } = &self.symbols[def].kind
            else {
                unreachable!("instances are only created from definitions");
            };
            (*syntax, *def_kind)
        };

        let kind = match def_kind {
            DefinitionKind::Interface => SymbolKind::InterfaceInstance {
                scope: ScopeData::default(),
                definition: def,
            },
            // Programs elaborate exactly like modules; the definition kind
            // stays observable through the definition symbol.
            DefinitionKind::Module | DefinitionKind::Program => SymbolKind::ModuleInstance {
                scope: ScopeData::default(),
                definition: def,
            },
        };
        let instance = self.symbols.alloc(Symbol::new(kind, name, name_span));

        // Package imports from the header come first.
        for import in &decl.imports {
            self.add_import_members(instance, import);
        }

        // Header parameters, with the shared evaluated values.
        if let Some(param_ports) = &decl.param_ports {
            for param in param_ports {
                for declarator in &param.declarators {
                    let Some(p) = prepared.get(&declarator.name) else {
                        continue;
                    };
                    let declared = match p.ty {
                        Some(ty) => DeclaredType::resolved(ty),
                        None => DeclaredType::from_declarator(&param.ty, declarator),
                    };
                    let kind = if p.is_type {
                        SymbolKind::TypeParameter {
                            declared,
                            is_local: p.is_local,
                            is_port: true,
                            alias_ty: None,
                        }
                    } else {
                        SymbolKind::Parameter {
                            declared,
                            is_local: p.is_local,
                            is_port: true,
                            value: p.value.clone(),
                        }
                    };
                    let sym = self.symbols.alloc(Symbol::new(
                        kind,
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(instance, sym, true);
                }
            }
        }

        // Ports next, so connections can bind before the body elaborates.
        let ports = self.add_instance_ports(instance, decl);
        if let Some(connections) = connections {
            self.connect_ports(instance, &ports, connections, parent_scope, location, array_path);
        } else {
            self.check_unconnected(&ports);
        }

        // Finally the body, with prepared body parameters spliced in at
        // their declaration sites.
        let ctx = MemberCtx {
            has_port_params: decl.param_ports.is_some(),
            prepared_params: Some(prepared),
            default_net_type: decl.default_net_type,
        };
        for item in &decl.items {
            self.add_member_item(instance, item, &ctx);
        }

        instance
    }

    /// Creates the port symbols of an instance from the definition header.
    fn add_instance_ports(
        &mut self,
        instance: SymbolId,
        decl: &'a syntax::ModuleDecl,
    ) -> Vec<SymbolId> {
        let mut ports = Vec::new();
        match &decl.ports {
            syntax::PortList::Empty => {}
            syntax::PortList::Ansi(list) => {
                for port in list {
                    ports.push(self.add_ansi_port(instance, port));
                }
            }
            syntax::PortList::NonAnsi(names) => {
                // Port declarations live in the body; find each name's
                // declaration to type the external port.
                for (name, span) in names {
                    let mut created = None;
                    for item in &decl.items {
                        let syntax::ModuleItem::PortDecl {
                            direction,
                            ty,
                            declarators,
                            ..
                        } = item
                        else {
                            continue;
                        };
                        if let Some(declarator) =
                            declarators.iter().find(|d| d.name == *name)
                        {
                            let declared = DeclaredType::from_type(ty);
                            let sym = self.symbols.alloc(Symbol::new(
                                SymbolKind::Port {
                                    declared,
                                    direction: *direction,
                                    internal: None,
                                    connection: None,
                                },
                                Some(*name),
                                declarator.name_span,
                            ));
                            self.insert_member(instance, sym, false);
                            created = Some(sym);
                            break;
                        }
                    }
                    let port = created.unwrap_or_else(|| {
                        let sym = self.symbols.alloc(Symbol::new(
                            SymbolKind::Port {
                                declared: DeclaredType::default(),
                                direction: Direction::InOut,
                                internal: None,
                                connection: None,
                            },
                            Some(*name),
                            *span,
                        ));
                        self.insert_member(instance, sym, false);
                        sym
                    });
                    ports.push(port);
                }
            }
        }
        ports
    }

    fn add_ansi_port(&mut self, instance: SymbolId, port: &'a syntax::AnsiPort) -> SymbolId {
        // A bare named type that resolves to an interface definition makes
        // this an interface port.
        if port.direction.is_none() && port.net.is_none() && !port.is_var {
            if let syntax::DataType::Named {
                package: None,
                name,
                ..
            } = &port.ty
            {
                if let Some(&target) = self.definitions.get(name) {
                    if matches!(
                        self.symbols[target].kind,
                        SymbolKind::Definition {
                            def_kind: DefinitionKind::Interface,
                            ..
                        }
                    ) {
                        let sym = self.symbols.alloc(Symbol::new(
                            SymbolKind::InterfacePort {
                                interface_def: Some(target),
                                modport: port.modport,
                                connection: None,
                            },
                            Some(port.declarator.name),
                            port.declarator.name_span,
                        ));
                        self.insert_member(instance, sym, true);
                        return sym;
                    }
                }
            }
        }

        let direction = port.direction.unwrap_or(Direction::InOut);

        // The internal symbol backing the port: outputs with data types
        // become variables, everything else nets.
        let declared = DeclaredType::from_declarator(&port.ty, &port.declarator);
        let internal_kind = if port.is_var || direction == Direction::Output {
            SymbolKind::Variable {
                declared: declared.clone(),
                is_const: false,
                is_compiler_generated: false,
            }
        } else {
            SymbolKind::Net {
                declared: declared.clone(),
                net_kind: port.net.unwrap_or(veris_parser::ast::NetKind::Wire),
            }
        };
        let internal = self.symbols.alloc(Symbol::new(
            internal_kind,
            Some(port.declarator.name),
            port.declarator.name_span,
        ));
        self.insert_member(instance, internal, true);

        let sym = self.symbols.alloc(Symbol::new(
            SymbolKind::Port {
                declared,
                direction,
                internal: Some(internal),
                connection: None,
            },
            Some(port.declarator.name),
            port.declarator.name_span,
        ));
        self.insert_member(instance, sym, false);
        sym
    }

    fn check_unconnected(&mut self, ports: &[SymbolId]) {
        for &port in ports {
            let span = self.symbols[port].span;
            let name = self.symbols[port]
                .name
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_default();
            match &self.symbols[port].kind {
                SymbolKind::Port { declared, .. } => {
                    if declared.init_syntax.is_none() {
                        self.sink.emit(errors::warn_unconnected_port(&name, span));
                    }
                }
                SymbolKind::InterfacePort { .. } => {
                    self.sink
                        .emit(errors::error_interface_port_not_connected(&name, span));
                }
                _ => {}
            }
        }
    }

    /// Hooks up external connections to an instance's ports.
    #[allow(clippy::too_many_arguments)]
    fn connect_ports(
        &mut self,
        instance: SymbolId,
        ports: &[SymbolId],
        connections: &'a [syntax::PortConnection],
        parent_scope: SymbolId,
        location: LookupLocation,
        array_path: &[i32],
    ) {
        let mut ordered: Vec<(Option<&'a syntax::Expr>, Span)> = Vec::new();
        let mut named: HashMap<Ident, (Span, Option<&'a syntax::Expr>, bool, bool)> =
            HashMap::new();
        let mut wildcard: Option<Span> = None;
        let mut is_ordered = None;

        for connection in connections {
            match connection {
                syntax::PortConnection::Ordered(expr, span) => {
                    match is_ordered {
                        None => is_ordered = Some(true),
                        Some(false) => {
                            self.sink.emit(errors::error_mixed_ports(*span));
                            return;
                        }
                        _ => {}
                    }
                    ordered.push((expr.as_ref(), *span));
                }
                syntax::PortConnection::Named {
                    name,
                    name_span,
                    expr,
                    has_parens,
                    ..
                } => {
                    match is_ordered {
                        None => is_ordered = Some(false),
                        Some(true) => {
                            self.sink.emit(errors::error_mixed_ports(*name_span));
                            return;
                        }
                        _ => {}
                    }
                    if let Some((previous, ..)) = named.get(name) {
                        self.sink.emit(errors::error_duplicate_port_connection(
                            self.interner.resolve(*name),
                            *name_span,
                            *previous,
                        ));
                        continue;
                    }
                    named.insert(*name, (*name_span, expr.as_ref(), *has_parens, false));
                }
                syntax::PortConnection::Wildcard(span) => {
                    if wildcard.is_some() {
                        self.sink
                            .emit(errors::error_duplicate_wildcard_connection(*span));
                    } else {
                        wildcard = Some(*span);
                    }
                }
            }
        }

        let bind_ctx = BindContext {
            scope: parent_scope,
            location,
            constant: false,
        };

        let mut next_ordered = 0usize;
        for &port in ports {
            let port_name = self.symbols[port].name;
            let port_span = self.symbols[port].span;

            if is_ordered == Some(true) {
                let conn = ordered.get(next_ordered).copied();
                next_ordered += 1;
                match conn {
                    Some((Some(expr), _)) => {
                        self.connect_one(port, expr, &bind_ctx, array_path);
                    }
                    Some((None, span)) => self.warn_if_no_default(port, span),
                    None => self.warn_if_no_default(port, port_span),
                }
                continue;
            }

            let entry = port_name.and_then(|n| named.get_mut(&n));
            match entry {
                Some((name_span, expr, has_parens, used)) => {
                    *used = true;
                    let (name_span, expr, has_parens) = (*name_span, *expr, *has_parens);
                    match expr {
                        Some(expr) => self.connect_one(port, expr, &bind_ctx, array_path),
                        None if has_parens => {
                            // `.name()` leaves the port explicitly unconnected.
                            self.warn_if_no_default(port, name_span);
                        }
                        None => {
                            // `.name` connects implicitly to the same
                            // name, which must be type equivalent.
                            self.connect_implicit_named(port, name_span, &bind_ctx, true);
                        }
                    }
                }
                None => {
                    if wildcard.is_some() {
                        let span = wildcard.expect("checked above");
                        self.connect_implicit_named(port, span, &bind_ctx, false);
                    } else {
                        self.warn_if_no_default(port, port_span);
                    }
                }
            }
        }

        if is_ordered == Some(true) && next_ordered < ordered.len() {
            let def_name = self.symbols[instance]
                .name
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_default();
            self.sink.emit(errors::error_too_many_port_connections(
                &def_name,
                ordered[next_ordered].1,
            ));
        }

        for (name, (span, _, _, used)) in &named {
            if !used {
                self.sink.emit(errors::error_port_does_not_exist(
                    self.interner.resolve(*name),
                    *span,
                ));
            }
        }
    }

    fn warn_if_no_default(&mut self, port: SymbolId, span: Span) {
        let name = self.symbols[port]
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_default();
        match &self.symbols[port].kind {
            SymbolKind::Port { declared, .. } => {
                if declared.init_syntax.is_none() {
                    self.sink.emit(errors::warn_unconnected_port(&name, span));
                }
            }
            SymbolKind::InterfacePort { .. } => {
                self.sink
                    .emit(errors::error_interface_port_not_connected(&name, span));
            }
            _ => {}
        }
    }

    fn connect_one(
        &mut self,
        port: SymbolId,
        expr: &'a syntax::Expr,
        ctx: &BindContext,
        array_path: &[i32],
    ) {
        if matches!(self.symbols[port].kind, SymbolKind::InterfacePort { .. }) {
            self.connect_interface_port(port, expr, ctx, array_path);
            return;
        }

        let (port_ty, direction) = {
            let ty = self.declared_type_of(port);
            let SymbolKind::Port { direction, .. } = &self.symbols[port].kind else {
                return;
            };
            (ty, *direction)
        };

        let bound = match direction {
            Direction::Input => self.bind_assignment_like(port_ty, expr, ctx),
            _ => {
                let bound = self.bind_expression(expr, ctx);
                let conn_ty = self.exprs[bound].ty;
                if !self.is_error_type(conn_ty)
                    && !self.is_error_type(port_ty)
                    && !self.is_assignment_compatible(conn_ty, port_ty)
                {
                    let from = self.type_to_string(port_ty);
                    let to = self.type_to_string(conn_ty);
                    self.sink.emit(errors::error_no_implicit_conversion(
                        &from,
                        &to,
                        expr.span(),
                    ));
                }
                bound
            }
        };

        if let SymbolKind::Port { connection, .. } = &mut self.symbols[port].kind {
            *connection = Some(bound);
        }
    }

    fn connect_implicit_named(
        &mut self,
        port: SymbolId,
        span: Span,
        ctx: &BindContext,
        explicit: bool,
    ) {
        let Some(name) = self.symbols[port].name else {
            return;
        };

        if matches!(self.symbols[port].kind, SymbolKind::InterfacePort { .. }) {
            // `.*` and `.name` work for interface ports too: the
            // connection is whatever the name resolves to outside.
            let found = self.lookup_unqualified(ctx.scope, name, ctx.location);
            match found {
                Some(found) => self.attach_interface_connection(port, found, &[], span),
                None => {
                    let rendered = self.interner.resolve(name).to_string();
                    self.sink
                        .emit(errors::error_interface_port_not_connected(&rendered, span));
                }
            }
            return;
        }

        let Some(found) = self.lookup_unqualified(ctx.scope, name, ctx.location) else {
            let rendered = self.interner.resolve(name).to_string();
            if explicit {
                self.sink
                    .emit(errors::error_implicit_port_not_found(&rendered, span));
            } else {
                self.sink.emit(errors::warn_unconnected_port(&rendered, span));
            }
            return;
        };
        if !self.symbols[found].is_value() {
            let rendered = self.interner.resolve(name).to_string();
            self.sink
                .emit(errors::error_implicit_port_not_found(&rendered, span));
            return;
        }

        let port_ty = self.declared_type_of(port);
        let conn_ty = self.declared_type_of(found);
        // Implicit connections demand equivalence, not mere assignment
        // compatibility.
        if !self.is_error_type(port_ty)
            && !self.is_error_type(conn_ty)
            && !self.is_equivalent(port_ty, conn_ty)
        {
            let rendered = self.interner.resolve(name).to_string();
            let port_rendered = self.type_to_string(port_ty);
            let conn_rendered = self.type_to_string(conn_ty);
            self.sink.emit(errors::error_implicit_port_type_mismatch(
                &rendered,
                &port_rendered,
                &conn_rendered,
                span,
            ));
            return;
        }

        let bound = self.exprs.alloc(crate::expr::Expression {
            kind: ExpressionKind::NamedValue {
                symbol: found,
                hierarchical: false,
            },
            ty: conn_ty,
            span,
            constant: None,
        });
        if let SymbolKind::Port { connection, .. } = &mut self.symbols[port].kind {
            *connection = Some(bound);
        }
    }

    fn connect_interface_port(
        &mut self,
        port: SymbolId,
        expr: &'a syntax::Expr,
        ctx: &BindContext,
        array_path: &[i32],
    ) {
        let name = self.symbols[port]
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_default();

        // The connection must name an interface instance (or array).
        let resolved = match expr {
            syntax::Expr::Identifier { name, .. } => {
                self.lookup_unqualified(ctx.scope, *name, ctx.location)
            }
            _ => None,
        };
        let Some(found) = resolved else {
            self.sink.emit(errors::error_interface_port_invalid_expression(
                &name,
                expr.span(),
            ));
            return;
        };
        self.attach_interface_connection(port, found, array_path, expr.span());
    }

    fn attach_interface_connection(
        &mut self,
        port: SymbolId,
        mut found: SymbolId,
        array_path: &[i32],
        span: Span,
    ) {
        let name = self.symbols[port]
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_default();

        // When the connection is an instance array and this port lives in
        // an instance array of the same shape, slice per element.
        let mut path = array_path;
        loop {
            match &self.symbols[found].kind {
                SymbolKind::InstanceArray {
                    elements, range, ..
                } => {
                    let Some((&index, rest)) = path.split_first() else {
                        self.sink
                            .emit(errors::error_port_conn_dimensions(&name, span));
                        return;
                    };
                    if !range.contains(index) {
                        self.sink
                            .emit(errors::error_port_conn_dimensions(&name, span));
                        return;
                    }
                    let offset = range.translate_index(index) as usize;
                    let Some(&element) = elements.get(offset) else {
                        self.sink
                            .emit(errors::error_port_conn_dimensions(&name, span));
                        return;
                    };
                    found = element;
                    path = rest;
                }
                SymbolKind::InterfaceInstance { definition, .. } => {
                    let definition = *definition;
                    let expected = match &self.symbols[port].kind {
                        SymbolKind::InterfacePort { interface_def, .. } => *interface_def,
                        _ => None,
                    };
                    if expected.is_some() && expected != Some(definition) {
                        let expected_name = expected
                            .and_then(|d| self.symbols[d].name)
                            .map(|n| self.interner.resolve(n).to_string())
                            .unwrap_or_default();
                        self.sink.emit(errors::error_interface_port_type_mismatch(
                            &name,
                            &expected_name,
                            span,
                        ));
                        return;
                    }
                    if let SymbolKind::InterfacePort { connection, .. } =
                        &mut self.symbols[port].kind
                    {
                        *connection = Some(found);
                    }
                    return;
                }
                _ => {
                    self.sink
                        .emit(errors::error_interface_port_invalid_expression(&name, span));
                    return;
                }
            }
        }
    }
}
