//! Lazy resolution of declared types, initializers, and parameter values.
//!
//! Each value symbol carries a [`DeclaredType`](crate::symbols::DeclaredType)
//! holding unresolved syntax. Resolution happens on demand; at most one
//! resolution may be active per declared type, and re-entry fails with a
//! circular-dependency diagnostic rather than recursing.

use crate::arena::{ExprId, SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::eval::EvalContext;
use crate::expr::BindContext;
use crate::lookup::LookupLocation;
use crate::symbols::{Symbol, SymbolKind};
use crate::types::{FieldInfo, Type};
use crate::Compilation;
use veris_common::SvInt;
use veris_parser::ast as syntax;
use veris_source::Span;

impl<'a> Compilation<'a> {
    fn symbol_name_for_diag(&self, sym: SymbolId) -> String {
        self.symbols[sym]
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Marks a declared type as mid-resolution. Returns `false` (and
    /// diagnoses a circular dependency) if it already was.
    fn enter_resolution(&mut self, sym: SymbolId) -> bool {
        let span = self.symbols[sym].span;
        let Some(declared) = self.symbols[sym].declared_mut() else {
            return false;
        };
        if declared.evaluating {
            let name = self.symbol_name_for_diag(sym);
            self.sink.emit(errors::error_circular_type(&name, span));
            return false;
        }
        declared.evaluating = true;
        true
    }

    fn exit_resolution(&mut self, sym: SymbolId) {
        if let Some(declared) = self.symbols[sym].declared_mut() {
            declared.evaluating = false;
        }
    }

    /// Resolves the declared type of a value or type symbol.
    ///
    /// A fully implicit type with the infer-implicit flag takes the type
    /// of the initializer; otherwise the type is built from syntax at the
    /// symbol's lookup location and wrapped in any unpacked dimensions.
    pub fn declared_type_of(&mut self, sym: SymbolId) -> TypeId {
        let Some(declared) = self.symbols[sym].declared() else {
            return self.builtins.error_type;
        };
        if let Some(ty) = declared.resolved {
            return ty;
        }

        if !self.enter_resolution(sym) {
            if let Some(declared) = self.symbols[sym].declared_mut() {
                declared.resolved = Some(self.builtins.error_type);
            }
            return self.builtins.error_type;
        }

        let declared = self.symbols[sym].declared().expect("checked above");
        let type_syntax = declared.type_syntax;
        let dims = declared.dims_syntax;
        let init_syntax = declared.init_syntax;
        let flags = declared.flags;

        let scope = self.symbols[sym].parent.unwrap_or(self.root_symbol());
        let location = if flags.lookup_max {
            LookupLocation::MAX
        } else {
            self.location_after(sym)
        };

        let resolved = match type_syntax {
            None => self.builtins.error_type,
            Some(ts) if ts.is_fully_implicit() && flags.infer_implicit => {
                match init_syntax {
                    None => self.builtins.error_type,
                    Some(init) => {
                        let ctx = BindContext {
                            scope,
                            location,
                            constant: flags.require_constant,
                        };
                        let bound = self.bind_expression(init, &ctx);
                        if let Some(declared) = self.symbols[sym].declared_mut() {
                            declared.initializer = Some(Some(bound));
                        }
                        self.exprs[bound].ty
                    }
                }
            }
            Some(ts) => {
                let base = self.type_from_syntax(ts, scope, location, flags.force_signed);
                self.wrap_unpacked_dims(base, dims, scope, location)
            }
        };

        if let Some(declared) = self.symbols[sym].declared_mut() {
            declared.resolved = Some(resolved);
        }
        self.exit_resolution(sym);
        resolved
    }

    /// Binds the initializer of a value symbol against its resolved type.
    ///
    /// Enum members are special: their initializers target the base type
    /// of the enum instead of the enum type itself, so ordinary integral
    /// conversions are not rejected.
    pub fn initializer_of(&mut self, sym: SymbolId) -> Option<ExprId> {
        let ty = self.declared_type_of(sym);
        let declared = self.symbols[sym].declared()?;
        if let Some(cached) = declared.initializer {
            return cached;
        }
        let init_syntax = declared.init_syntax;
        let flags = declared.flags;
        let Some(init) = init_syntax else {
            if let Some(declared) = self.symbols[sym].declared_mut() {
                declared.initializer = Some(None);
            }
            return None;
        };

        if !self.enter_resolution(sym) {
            if let Some(declared) = self.symbols[sym].declared_mut() {
                declared.initializer = Some(None);
            }
            return None;
        }

        let target = match self.symbols[sym].kind {
            SymbolKind::EnumValue { base, .. } => base,
            _ => ty,
        };
        let scope = self.symbols[sym].parent.unwrap_or(self.root_symbol());
        let location = if flags.lookup_max {
            LookupLocation::MAX
        } else {
            self.location_after(sym)
        };
        let ctx = BindContext {
            scope,
            location,
            constant: flags.require_constant,
        };
        let bound = self.bind_assignment_like(target, init, &ctx);

        if let Some(declared) = self.symbols[sym].declared_mut() {
            declared.initializer = Some(Some(bound));
        }
        self.exit_resolution(sym);
        Some(bound)
    }

    /// Gets the compile-time value of a parameter or enum member,
    /// evaluating and caching it on first use.
    pub fn parameter_value(&mut self, sym: SymbolId) -> ConstantValue {
        if let Some(value) = self.cached_parameter_value(sym) {
            return value.clone();
        }
        let Some(init) = self.initializer_of(sym) else {
            return ConstantValue::Invalid;
        };

        let location = self.location_after(sym);
        let mut ctx = EvalContext::new(self.options.max_eval_steps, location);
        let value = self.eval_expr(&mut ctx, init);
        ctx.report_diags(self.sink);

        match &mut self.symbols[sym].kind {
            SymbolKind::Parameter { value: slot, .. } | SymbolKind::EnumValue { value: slot, .. } => {
                *slot = Some(value.clone());
            }
            _ => {}
        }
        value
    }

    /// Gets the constant value of any value symbol's initializer, or
    /// `Invalid` if it has none or it isn't constant.
    pub fn constant_value_of(&mut self, sym: SymbolId) -> ConstantValue {
        match self.symbols[sym].kind {
            SymbolKind::Parameter { .. } | SymbolKind::EnumValue { .. } => {
                self.parameter_value(sym)
            }
            _ => {
                let Some(init) = self.initializer_of(sym) else {
                    return ConstantValue::Invalid;
                };
                let location = self.location_after(sym);
                let mut ctx = EvalContext::new(self.options.max_eval_steps, location);
                let value = self.eval_expr(&mut ctx, init);
                ctx.report_diags(self.sink);
                value
            }
        }
    }

    /// Binds a constant expression and evaluates it to an `i32`.
    pub(crate) fn eval_const_i32(
        &mut self,
        expr: &'a syntax::Expr,
        scope: SymbolId,
        location: LookupLocation,
    ) -> Option<i32> {
        let ctx = BindContext {
            scope,
            location,
            constant: true,
        };
        let bound = self.bind_expression(expr, &ctx);
        let mut eval_ctx = EvalContext::new(self.options.max_eval_steps, location);
        let value = self.eval_expr(&mut eval_ctx, bound);
        eval_ctx.report_diags(self.sink);
        value.integer().and_then(SvInt::as_i32)
    }

    /// Binds a deferred continuous assignment.
    pub(crate) fn bind_continuous_assign(&mut self, sym: SymbolId) {
        let SymbolKind::ContinuousAssign {
            assignment, bound, ..
        } = &self.symbols[sym].kind
        else {
            return;
        };
        if bound.is_some() {
            return;
        }
        let assignment = *assignment;
        let scope = self.symbols[sym].parent.unwrap_or(self.root_symbol());
        let ctx = BindContext {
            scope,
            location: LookupLocation::MAX,
            constant: false,
        };
        let bound_expr = self.bind_expression(assignment, &ctx);
        if let SymbolKind::ContinuousAssign { bound, .. } = &mut self.symbols[sym].kind {
            *bound = Some(bound_expr);
        }
    }

    // ---- enum construction ----

    /// Builds an enum type, hoisting its members into the enclosing scope
    /// through transparent members.
    pub(crate) fn enum_from_syntax(
        &mut self,
        ty: &'a syntax::DataType,
        scope: SymbolId,
        location: LookupLocation,
        force_signed: bool,
    ) -> TypeId {
        let syntax::DataType::Enum {
            base,
            members,
            dims,
            span,
        } = ty
        else {
            return self.builtins.error_type;
        };

        // Default base is int; an explicit base must be a simple bit
        // vector.
        let base_ty = match base {
            None => self.builtins.int_type,
            Some(b) => {
                let built = self.type_from_syntax(b, scope, location, force_signed);
                if !self.is_error_type(built) && !self.is_simple_bit_vector(built) {
                    let rendered = self.type_to_string(built);
                    self.sink
                        .emit(errors::error_invalid_enum_base(&rendered, b.span()));
                    self.builtins.int_type
                } else if self.is_error_type(built) {
                    self.builtins.int_type
                } else {
                    built
                }
            }
        };

        let width = self.bit_width(base_ty).max(1);
        let signed = self.is_signed(base_ty);

        let enum_ty = self.types.alloc(Type::Enum {
            base: base_ty,
            values: Vec::new(),
            decl_span: *span,
        });

        let mut all_ones = SvInt::new(width, 0, signed);
        all_ones.set_all_ones();
        let one = SvInt::new(width, 1, signed);

        let mut used: Vec<(SvInt, Span)> = Vec::new();
        let mut previous: Option<SvInt> = None;
        let mut value_syms = Vec::new();

        let check_value = |comp: &Compilation<'a>,
                               used: &mut Vec<(SvInt, Span)>,
                               value: &SvInt,
                               span: Span|
         -> bool {
            if let Some((_, prev_span)) = used.iter().find(|(v, _)| v.exactly_equals(value)) {
                comp.sink.emit(errors::error_enum_value_duplicate(
                    &value.to_string(),
                    span,
                    *prev_span,
                ));
                return false;
            }
            used.push((value.clone(), span));
            true
        };

        for member in members {
            let expanded = match self.expand_enum_member(member, scope, location) {
                Some(list) => list,
                None => return self.builtins.error_type,
            };
            for (index, name, with_init) in expanded {
                let full_name = match index {
                    None => name,
                    Some(i) => {
                        let text = format!("{}{}", self.interner.resolve(name), i);
                        self.interner.get_or_intern(&text)
                    }
                };

                let value = if with_init {
                    let init = member.init.as_ref().expect("with_init requires an init");
                    let ctx = BindContext {
                        scope,
                        location,
                        constant: true,
                    };
                    let bound = self.bind_assignment_like(base_ty, init, &ctx);
                    let mut eval_ctx =
                        EvalContext::new(self.options.max_eval_steps, location);
                    let evaluated = self.eval_expr(&mut eval_ctx, bound);
                    eval_ctx.report_diags(self.sink);
                    match evaluated {
                        ConstantValue::Integer(v) => {
                            let v = v.resize(width, signed);
                            check_value(self, &mut used, &v, member.name_span);
                            Some(v)
                        }
                        _ => None,
                    }
                } else {
                    match &previous {
                        None => Some(SvInt::new(width, 0, signed)),
                        Some(prev) if prev.has_unknown() => {
                            self.sink
                                .emit(errors::error_enum_increment_unknown(member.name_span));
                            None
                        }
                        Some(prev) if prev.exactly_equals(&all_ones) => {
                            self.sink
                                .emit(errors::error_enum_value_overflow(member.name_span));
                            None
                        }
                        Some(prev) => {
                            let v = prev.add(&one);
                            if check_value(self, &mut used, &v, member.name_span) {
                                Some(v)
                            } else {
                                None
                            }
                        }
                    }
                };

                previous = value.clone().or(previous.take());

                let ev = self.symbols.alloc(Symbol::new(
                    SymbolKind::EnumValue {
                        declared: crate::symbols::DeclaredType::resolved(enum_ty),
                        base: base_ty,
                        value: value.clone().map(ConstantValue::Integer),
                    },
                    Some(full_name),
                    member.name_span,
                ));
                self.insert_member(scope, ev, false);
                value_syms.push(ev);

                let transparent = self.symbols.alloc(Symbol::new(
                    SymbolKind::TransparentMember { wrapped: ev },
                    Some(full_name),
                    member.name_span,
                ));
                self.insert_member(scope, transparent, true);

                // The hoisted members belong at the declaration that
                // produced the enum, not at the end of the scope, so
                // ordering-aware lookups can see them right away.
                if location.scope == Some(scope) {
                    let hoisted_index = location.index.saturating_sub(1);
                    self.symbols[ev].index_in_scope = hoisted_index;
                    self.symbols[transparent].index_in_scope = hoisted_index;
                }
            }
        }

        if let Type::Enum { values, .. } = &mut self.types[enum_ty] {
            *values = value_syms;
        }
        self.wrap_packed_dims(enum_ty, dims, scope, location)
    }

    /// Expands a ranged enum member into `(index, name, takes_initializer)`
    /// entries; plain members produce a single unindexed entry.
    fn expand_enum_member(
        &mut self,
        member: &'a syntax::EnumMember,
        scope: SymbolId,
        location: LookupLocation,
    ) -> Option<Vec<(Option<i32>, veris_common::Ident, bool)>> {
        let has_init = member.init.is_some();
        if member.dims.is_empty() {
            return Some(vec![(None, member.name, has_init)]);
        }
        if member.dims.len() > 1 {
            self.sink
                .emit(errors::error_enum_range_multidimensional(member.span));
            return None;
        }
        let range = self.eval_unpacked_dim(&member.dims[0], scope, location)?;
        let mut out = Vec::new();
        let mut index = range.left;
        let down = range.is_little_endian();
        loop {
            // Only the first generated member takes the initializer.
            out.push((Some(index), member.name, has_init && out.is_empty()));
            if index == range.right {
                break;
            }
            index = if down { index - 1 } else { index + 1 };
        }
        Some(out)
    }

    // ---- struct / union construction ----

    /// Builds a struct or union type from syntax.
    pub(crate) fn struct_from_syntax(
        &mut self,
        ty: &'a syntax::DataType,
        scope: SymbolId,
        location: LookupLocation,
        force_signed: bool,
    ) -> TypeId {
        let syntax::DataType::Struct {
            is_union,
            packed,
            signed,
            members,
            dims,
            span,
        } = ty
        else {
            return self.builtins.error_type;
        };

        if *packed {
            self.packed_struct_union(
                members,
                *is_union,
                *signed || force_signed,
                *span,
                dims,
                scope,
                location,
            )
        } else {
            let mut fields = Vec::new();
            for member in members {
                let member_ty = self.type_from_syntax(&member.ty, scope, location, false);
                for declarator in &member.declarators {
                    let field_ty =
                        self.wrap_unpacked_dims(member_ty, &declarator.dims, scope, location);
                    let offset = if *is_union { 0 } else { fields.len() as u32 };
                    fields.push(FieldInfo {
                        name: declarator.name,
                        ty: field_ty,
                        offset,
                        span: declarator.name_span,
                    });
                }
            }
            let data = if *is_union {
                Type::UnpackedUnion {
                    fields,
                    decl_span: *span,
                }
            } else {
                Type::UnpackedStruct {
                    fields,
                    decl_span: *span,
                }
            };
            let result = self.types.alloc(data);
            self.wrap_packed_dims(result, dims, scope, location)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn packed_struct_union(
        &mut self,
        members: &'a [syntax::StructMember],
        is_union: bool,
        signed: bool,
        decl_span: Span,
        dims: &'a [syntax::PackedDim],
        scope: SymbolId,
        location: LookupLocation,
    ) -> TypeId {
        let mut four_state = false;
        let mut width = 0u32;
        let mut fields = Vec::new();

        // Members are written MSB first, so walk them in reverse to
        // accumulate LSB offsets.
        for member in members.iter().rev() {
            let member_ty = self.type_from_syntax(&member.ty, scope, location, false);
            four_state |= self.is_four_state(member_ty);

            let mut issued_error = false;
            if !self.is_integral(member_ty) && !self.is_error_type(member_ty) {
                issued_error = true;
                let rendered = self.type_to_string(member_ty);
                self.sink.emit(errors::error_packed_member_not_integral(
                    &rendered,
                    member.ty.span(),
                ));
            }

            for declarator in &member.declarators {
                if !declarator.dims.is_empty() && !issued_error {
                    let rendered = self.type_to_string(member_ty);
                    self.sink.emit(errors::error_packed_member_not_integral(
                        &rendered,
                        declarator.name_span,
                    ));
                    issued_error = true;
                }
                if declarator.init.is_some() {
                    self.sink.emit(errors::error_packed_member_has_initializer(
                        declarator
                            .eq_span
                            .unwrap_or(declarator.name_span),
                    ));
                }

                let member_width = self.bit_width(member_ty);
                let offset = if is_union { 0 } else { width };
                if is_union {
                    if width == 0 {
                        width = member_width;
                    } else if width != member_width && !issued_error {
                        self.sink.emit(errors::error_packed_union_width_mismatch(
                            declarator.name_span,
                        ));
                        issued_error = true;
                    }
                } else {
                    width += member_width;
                }
                fields.push(FieldInfo {
                    name: declarator.name,
                    ty: member_ty,
                    offset,
                    span: declarator.name_span,
                });
            }
        }

        if width == 0 {
            return self.builtins.error_type;
        }

        // Restore declaration order for the field list.
        fields.reverse();

        let data = if is_union {
            Type::PackedUnion {
                fields,
                width,
                signed,
                four_state,
                decl_span,
            }
        } else {
            Type::PackedStruct {
                fields,
                width,
                signed,
                four_state,
                decl_span,
            }
        };
        let result = self.types.alloc(data);
        self.wrap_packed_dims(result, dims, scope, location)
    }
}
