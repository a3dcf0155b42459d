//! Generate construct elaboration: if/case selection and loop expansion.

use crate::arena::SymbolId;
use crate::const_value::ConstantValue;
use crate::errors;
use crate::eval::EvalContext;
use crate::expr::BindContext;
use crate::lookup::LookupLocation;
use crate::scope::MemberCtx;
use crate::symbols::{DeclaredType, ScopeData, Symbol, SymbolKind};
use crate::Compilation;
use veris_common::SvInt;
use veris_parser::ast as syntax;
use veris_source::Span;

impl<'a> Compilation<'a> {
    /// Elaborates one deferred generate construct, producing its block
    /// symbols. Unselected blocks are still materialized, just marked
    /// uninstantiated.
    pub(crate) fn elaborate_generate(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        index: u32,
    ) -> Vec<SymbolId> {
        let location = LookupLocation::at(scope, index);
        let mut results = Vec::new();
        match item {
            syntax::ModuleItem::IfGenerate { .. } => {
                self.elaborate_if_generate(scope, item, location, true, &mut results);
            }
            syntax::ModuleItem::CaseGenerate { .. } => {
                self.elaborate_case_generate(scope, item, location, true, &mut results);
            }
            syntax::ModuleItem::LoopGenerate { .. } => {
                if let Some(array) = self.elaborate_loop_generate(scope, item, location) {
                    results.push(array);
                }
            }
            _ => {}
        }
        results
    }

    fn elaborate_if_generate(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        location: LookupLocation,
        is_instantiated: bool,
        results: &mut Vec<SymbolId>,
    ) {
        let syntax::ModuleItem::IfGenerate {
            condition,
            then_block,
            else_block,
            ..
        } = item
        else {
            return;
        };

        // Evaluate the selector only when this construct is itself
        // selected; an X/Z predicate selects neither branch.
        let mut selector = None;
        if is_instantiated {
            let ctx = BindContext {
                scope,
                location,
                constant: true,
            };
            let bound = self.bind_expression(condition, &ctx);
            let cond_ty = self.exprs[bound].ty;
            if !self.is_error_type(cond_ty) && !self.is_boolean_convertible(cond_ty) {
                let rendered = self.type_to_string(cond_ty);
                self.sink.emit(errors::error_not_boolean_convertible(
                    &rendered,
                    condition.span(),
                ));
            } else {
                let mut eval_ctx = EvalContext::new(self.options.max_eval_steps, location);
                let value = self.eval_expr(&mut eval_ctx, bound);
                eval_ctx.report_diags(self.sink);
                if value.is_true() {
                    selector = Some(true);
                } else if value.is_false() {
                    selector = Some(false);
                }
            }
        }

        self.create_cond_gen_block(scope, then_block, location, selector == Some(true), results);
        if let Some(else_member) = else_block {
            self.create_cond_gen_block(
                scope,
                else_member,
                location,
                selector == Some(false),
                results,
            );
        }
    }

    fn elaborate_case_generate(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        location: LookupLocation,
        is_instantiated: bool,
        results: &mut Vec<SymbolId>,
    ) {
        let syntax::ModuleItem::CaseGenerate {
            condition, items, ..
        } = item
        else {
            return;
        };

        let ctx = BindContext {
            scope,
            location,
            constant: true,
        };
        let bound = self.bind_expression(condition, &ctx);
        let mut eval_ctx = EvalContext::new(self.options.max_eval_steps, location);
        let selector = self.eval_expr(&mut eval_ctx, bound);
        eval_ctx.report_diags(self.sink);
        if selector.is_invalid() {
            return;
        }

        let mut found = false;
        let mut match_span = Span::DUMMY;
        let mut warned = false;
        let mut default_arm: Option<&'a syntax::GenMember> = None;

        for arm in items {
            if arm.expressions.is_empty() {
                default_arm = Some(&arm.body);
                continue;
            }
            // The first matching expression selects the arm; later
            // matches only warn.
            let mut current_found = false;
            let mut current_span = Span::DUMMY;
            for expr in &arm.expressions {
                let arm_bound = self.bind_expression(expr, &ctx);
                let mut arm_ctx = EvalContext::new(self.options.max_eval_steps, location);
                let value = self.eval_expr(&mut arm_ctx, arm_bound);
                arm_ctx.report_diags(self.sink);
                if !current_found && !value.is_invalid() && value.equivalent_to(&selector) {
                    current_found = true;
                    current_span = expr.span();
                }
            }

            if current_found && !found {
                found = true;
                match_span = current_span;
                self.create_cond_gen_block(scope, &arm.body, location, is_instantiated, results);
            } else {
                if current_found && !warned {
                    let rendered = selector.to_string();
                    self.sink.emit(errors::warn_case_generate_dup(
                        &rendered,
                        current_span,
                        match_span,
                    ));
                    warned = true;
                }
                self.create_cond_gen_block(scope, &arm.body, location, false, results);
            }
        }

        match default_arm {
            Some(body) => {
                // The default is taken only when no arm matched.
                self.create_cond_gen_block(
                    scope,
                    body,
                    location,
                    is_instantiated && !found,
                    results,
                );
            }
            None if !found => {
                let rendered = selector.to_string();
                self.sink.emit(errors::error_case_generate_no_block(
                    &rendered,
                    condition.span(),
                ));
            }
            None => {}
        }
    }

    /// Creates a generate block for one conditional branch. A directly
    /// nested conditional generate without begin/end is not a separate
    /// scope; its blocks belong to the outer construct.
    fn create_cond_gen_block(
        &mut self,
        scope: SymbolId,
        member: &'a syntax::GenMember,
        location: LookupLocation,
        is_instantiated: bool,
        results: &mut Vec<SymbolId>,
    ) {
        if let syntax::GenMember::Item(item) = member {
            match item.as_ref() {
                nested @ syntax::ModuleItem::IfGenerate { .. } => {
                    self.elaborate_if_generate(scope, nested, location, is_instantiated, results);
                    return;
                }
                nested @ syntax::ModuleItem::CaseGenerate { .. } => {
                    self.elaborate_case_generate(scope, nested, location, is_instantiated, results);
                    return;
                }
                _ => {}
            }
        }

        let (label, span) = match member {
            syntax::GenMember::Block(block) => (block.label, block.span),
            syntax::GenMember::Item(item) => (None, item.span()),
        };

        let block = self.symbols.alloc(Symbol::new(
            SymbolKind::GenerateBlock {
                scope: ScopeData::default(),
                is_instantiated,
            },
            label,
            span,
        ));
        self.symbols[block].parent = Some(scope);

        let ctx = MemberCtx::default();
        match member {
            syntax::GenMember::Block(inner) => {
                for item in &inner.items {
                    self.add_member_item(block, item, &ctx);
                }
            }
            syntax::GenMember::Item(item) => {
                self.add_member_item(block, item, &ctx);
            }
        }
        results.push(block);
    }

    fn elaborate_loop_generate(
        &mut self,
        scope: SymbolId,
        item: &'a syntax::ModuleItem,
        location: LookupLocation,
    ) -> Option<SymbolId> {
        let syntax::ModuleItem::LoopGenerate {
            genvar_keyword,
            ident,
            ident_span,
            init,
            stop,
            iteration,
            body,
            span,
        } = item
        else {
            return None;
        };

        let label = match body {
            syntax::GenMember::Block(block) => block.label,
            syntax::GenMember::Item(_) => None,
        };
        let array = self.symbols.alloc(Symbol::new(
            SymbolKind::GenerateBlockArray {
                scope: ScopeData::default(),
                entries: Vec::new(),
            },
            label,
            *span,
        ));
        self.symbols[array].parent = Some(scope);

        // Without the genvar keyword the loop variable must name a genvar
        // declared somewhere visible.
        if !genvar_keyword {
            match self.lookup_unqualified(scope, *ident, location) {
                Some(found) => {
                    if !matches!(self.symbols[found].kind, SymbolKind::Genvar) {
                        self.sink.emit(errors::error_not_a_genvar(
                            self.interner.resolve(*ident),
                            *ident_span,
                        ));
                    }
                }
                None => {
                    self.sink.emit(errors::error_undeclared_identifier(
                        self.interner.resolve(*ident),
                        *ident_span,
                    ));
                    return Some(array);
                }
            }
        }

        // Bind the initializer at the construct's own location.
        let integer_ty = self.builtins.integer_type;
        let bind_ctx = BindContext {
            scope,
            location,
            constant: true,
        };
        let init_bound = self.bind_assignment_like(integer_ty, init, &bind_ctx);
        let mut init_ctx = EvalContext::new(self.options.max_eval_steps, location);
        let initial = self.eval_expr(&mut init_ctx, init_bound);
        init_ctx.report_diags(self.sink);
        if initial.is_invalid() {
            return Some(array);
        }

        // Fabricate a temporary iteration scope whose only member is the
        // loop-local variable, then bind stop and iteration against it.
        let iter_scope = self.symbols.alloc(Symbol::new(
            SymbolKind::GenerateBlock {
                scope: ScopeData::default(),
                is_instantiated: false,
            },
            None,
            *span,
        ));
        self.symbols[iter_scope].parent = Some(scope);
        let local = self.symbols.alloc(Symbol::new(
            SymbolKind::Variable {
                declared: DeclaredType::resolved(integer_ty),
                is_const: false,
                is_compiler_generated: true,
            },
            Some(*ident),
            *ident_span,
        ));
        self.insert_member(iter_scope, local, true);

        let iter_bind_ctx = BindContext {
            scope: iter_scope,
            location: LookupLocation::MAX,
            constant: true,
        };
        let stop_bound = self.bind_expression(stop, &iter_bind_ctx);
        let iter_bound = self.bind_expression(iteration, &iter_bind_ctx);
        let stop_ty = self.exprs[stop_bound].ty;
        if self.is_error_type(stop_ty) || self.is_error_type(self.exprs[iter_bound].ty) {
            return Some(array);
        }
        if !self.is_boolean_convertible(stop_ty) {
            let rendered = self.type_to_string(stop_ty);
            self.sink
                .emit(errors::error_not_boolean_convertible(&rendered, stop.span()));
            return Some(array);
        }

        // Both expressions must be constant-foldable before iterating.
        let mut verify_ctx = EvalContext::new(self.options.max_eval_steps, location);
        verify_ctx.is_verifying = true;
        let stop_ok = self.verify_constant(&mut verify_ctx, stop_bound);
        let iter_ok = stop_ok && self.verify_constant(&mut verify_ctx, iter_bound);
        verify_ctx.report_diags(self.sink);
        if !stop_ok || !iter_ok {
            return Some(array);
        }

        let mut eval_ctx = EvalContext::new(self.options.max_eval_steps, location);
        eval_ctx.create_local(local, initial.clone());

        let current_int = |value: &ConstantValue| -> Option<SvInt> {
            value.integer().cloned()
        };
        let Some(mut current) = current_int(&initial) else {
            return Some(array);
        };
        if current.has_unknown() {
            self.sink.emit(errors::error_genvar_unknown_bits(
                &current.to_string(),
                *ident_span,
            ));
        }

        let mut used: Vec<SvInt> = Vec::new();
        let mut entries = Vec::new();
        let mut any = false;
        loop {
            let stop_value = self.eval_expr(&mut eval_ctx, stop_bound);
            if stop_value.is_invalid() || !stop_value.is_true() {
                break;
            }

            // Refuse to revisit a previously seen genvar value.
            if used.iter().any(|v| v.exactly_equals(&current)) {
                self.sink.emit(errors::error_genvar_duplicate(
                    &current.to_string(),
                    *ident_span,
                ));
                break;
            }
            used.push(current.clone());

            any = true;
            let block = self.create_loop_block(
                array,
                body,
                *ident,
                *ident_span,
                ConstantValue::Integer(current.clone()),
                true,
            );
            if let Some(value) = current.as_i64() {
                entries.push((value, block));
            }

            if self.eval_expr(&mut eval_ctx, iter_bound).is_invalid() {
                break;
            }
            let Some(updated) = eval_ctx.find_local(local).and_then(|v| current_int(v)) else {
                break;
            };
            current = updated;
            if current.has_unknown() {
                self.sink.emit(errors::error_genvar_unknown_bits(
                    &current.to_string(),
                    *ident_span,
                ));
            }
        }
        eval_ctx.report_diags(self.sink);

        if let SymbolKind::GenerateBlockArray { entries: slot, .. } =
            &mut self.symbols[array].kind
        {
            *slot = entries;
        }

        // A loop that executes zero times still materializes one
        // uninstantiated block.
        if !any {
            self.create_loop_block(
                array,
                body,
                *ident,
                *ident_span,
                ConstantValue::Integer(SvInt::new(32, 0, true)),
                false,
            );
        }
        Some(array)
    }

    /// Creates one loop iteration's block, with an implicit localparam
    /// bound to the genvar's value.
    fn create_loop_block(
        &mut self,
        array: SymbolId,
        body: &'a syntax::GenMember,
        ident: veris_common::Ident,
        ident_span: Span,
        value: ConstantValue,
        is_instantiated: bool,
    ) -> SymbolId {
        let span = match body {
            syntax::GenMember::Block(block) => block.span,
            syntax::GenMember::Item(item) => item.span(),
        };
        let block = self.symbols.alloc(Symbol::new(
            SymbolKind::GenerateBlock {
                scope: ScopeData::default(),
                is_instantiated,
            },
            None,
            span,
        ));
        self.insert_member(array, block, false);

        let integer_ty = self.builtins.integer_type;
        let param = self.symbols.alloc(Symbol::new(
            SymbolKind::Parameter {
                declared: DeclaredType::resolved(integer_ty),
                is_local: true,
                is_port: false,
                value: Some(value),
            },
            Some(ident),
            ident_span,
        ));
        self.insert_member(block, param, true);

        let ctx = MemberCtx::default();
        match body {
            syntax::GenMember::Block(inner) => {
                for item in &inner.items {
                    self.add_member_item(block, item, &ctx);
                }
            }
            syntax::GenMember::Item(item) => {
                self.add_member_item(block, item, &ctx);
            }
        }
        block
    }
}
