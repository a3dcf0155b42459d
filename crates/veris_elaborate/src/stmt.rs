//! Bound statements and statement evaluation inside constant functions.
//!
//! Function bodies bind on first call: declarations become locals in the
//! subroutine scope and statements lower into a small bound tree the
//! evaluator can execute. Execution results flow through [`EvalResult`],
//! so `return`/`break`/`continue` unwind without exceptions.

use crate::arena::{ExprId, StmtId, SymbolId};
use crate::const_value::ConstantValue;
use crate::eval::EvalContext;
use crate::expr::BindContext;
use crate::lookup::LookupLocation;
use crate::symbols::{DeclaredType, Symbol, SymbolKind};
use crate::Compilation;
use veris_parser::ast as syntax;
use veris_source::Span;

/// The result of executing one bound statement.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EvalResult {
    /// Execution fell through normally.
    Success,
    /// A `return` unwound the current call.
    Return,
    /// A `break` unwound the innermost loop.
    Break,
    /// A `continue` advanced the innermost loop.
    Continue,
    /// Evaluation failed; diagnostics explain why.
    Fail,
}

/// A bound statement.
#[derive(Clone, Debug)]
pub struct Statement {
    /// The statement kind and children.
    pub kind: StatementKind,
    /// The source range.
    pub span: Span,
}

/// The kind of a bound statement.
#[derive(Clone, Debug)]
pub enum StatementKind {
    /// A binding failure placeholder.
    Invalid,
    /// An empty statement.
    Empty,
    /// A sequence of statements.
    List(Vec<StmtId>),
    /// A local variable declaration; evaluation creates the local.
    VarDecl {
        /// The declared variable symbol.
        symbol: SymbolId,
    },
    /// An expression statement (assignment or call).
    Expr(ExprId),
    /// A return statement.
    Return(Option<ExprId>),
    /// A break statement.
    Break,
    /// A continue statement.
    Continue,
    /// An if statement.
    Conditional {
        /// The predicate.
        cond: ExprId,
        /// The then branch.
        if_true: StmtId,
        /// The else branch.
        if_false: Option<StmtId>,
    },
    /// A case statement.
    Case {
        /// The selector.
        cond: ExprId,
        /// `(expressions, body)` arms in order.
        items: Vec<(Vec<ExprId>, StmtId)>,
        /// The default arm.
        default: Option<StmtId>,
    },
    /// A for loop.
    ForLoop {
        /// Initialization statements.
        inits: Vec<StmtId>,
        /// The stop condition.
        stop: Option<ExprId>,
        /// The step expressions.
        steps: Vec<ExprId>,
        /// The body.
        body: StmtId,
    },
    /// A while loop.
    WhileLoop {
        /// The condition.
        cond: ExprId,
        /// The body.
        body: StmtId,
    },
    /// A repeat loop.
    RepeatLoop {
        /// The repetition count.
        count: ExprId,
        /// The body.
        body: StmtId,
    },
}

impl<'a> Compilation<'a> {
    fn alloc_stmt(&mut self, kind: StatementKind, span: Span) -> StmtId {
        self.stmts.alloc(Statement { kind, span })
    }

    /// Returns the bound body of a subroutine, binding it on first use.
    pub fn subroutine_body(&mut self, sub: SymbolId) -> Option<StmtId> {
        let (cached, body_syntax) = match &self.symbols[sub].kind {
            SymbolKind::Subroutine { body, syntax, .. } => (*body, *syntax),
            _ => return None,
        };
        if let Some(body) = cached {
            return Some(body);
        }

        let ctx = BindContext {
            scope: sub,
            location: LookupLocation::MAX,
            constant: false,
        };
        let mut bound = Vec::new();
        for stmt in &body_syntax.body {
            bound.push(self.bind_stmt(stmt, &ctx));
        }
        let list = self.alloc_stmt(StatementKind::List(bound), body_syntax.span);

        if let SymbolKind::Subroutine { body, .. } = &mut self.symbols[sub].kind {
            *body = Some(list);
        }
        Some(list)
    }

    /// Binds one statement inside a subroutine scope.
    pub(crate) fn bind_stmt(&mut self, stmt: &'a syntax::Stmt, ctx: &BindContext) -> StmtId {
        match stmt {
            syntax::Stmt::Block { items, span, .. } => {
                let bound: Vec<StmtId> =
                    items.iter().map(|s| self.bind_stmt(s, ctx)).collect();
                self.alloc_stmt(StatementKind::List(bound), *span)
            }
            syntax::Stmt::VarDecl(decl) => {
                let mut ids = Vec::new();
                for declarator in &decl.declarators {
                    let declared = DeclaredType::from_declarator(&decl.ty, declarator);
                    let symbol = self.symbols.alloc(Symbol::new(
                        SymbolKind::Variable {
                            declared,
                            is_const: decl.is_const,
                            is_compiler_generated: false,
                        },
                        Some(declarator.name),
                        declarator.name_span,
                    ));
                    self.insert_member(ctx.scope, symbol, true);
                    ids.push(self.alloc_stmt(
                        StatementKind::VarDecl { symbol },
                        declarator.name_span,
                    ));
                }
                if ids.len() == 1 {
                    ids[0]
                } else {
                    self.alloc_stmt(StatementKind::List(ids), decl.span)
                }
            }
            syntax::Stmt::ExprStmt { expr, span } => {
                let bound = self.bind_expression(expr, ctx);
                self.alloc_stmt(StatementKind::Expr(bound), *span)
            }
            syntax::Stmt::If {
                cond,
                then_stmt,
                else_stmt,
                span,
            } => {
                let cond = self.bind_expression(cond, ctx);
                let if_true = self.bind_stmt(then_stmt, ctx);
                let if_false = else_stmt.as_ref().map(|s| self.bind_stmt(s, ctx));
                self.alloc_stmt(
                    StatementKind::Conditional {
                        cond,
                        if_true,
                        if_false,
                    },
                    *span,
                )
            }
            syntax::Stmt::Case {
                cond, items, span, ..
            } => {
                let cond = self.bind_expression(cond, ctx);
                let mut bound_items = Vec::new();
                let mut default = None;
                for item in items {
                    let body = self.bind_stmt(&item.body, ctx);
                    if item.expressions.is_empty() {
                        default = Some(body);
                    } else {
                        let exprs: Vec<ExprId> = item
                            .expressions
                            .iter()
                            .map(|e| self.bind_expression(e, ctx))
                            .collect();
                        bound_items.push((exprs, body));
                    }
                }
                self.alloc_stmt(
                    StatementKind::Case {
                        cond,
                        items: bound_items,
                        default,
                    },
                    *span,
                )
            }
            syntax::Stmt::For {
                inits,
                stop,
                steps,
                body,
                span,
            } => {
                let mut init_stmts = Vec::new();
                for init in inits {
                    match init {
                        syntax::ForInit::Decl {
                            ty,
                            name,
                            name_span,
                            init,
                            ..
                        } => {
                            let declared = DeclaredType {
                                type_syntax: Some(ty),
                                init_syntax: Some(init),
                                ..DeclaredType::default()
                            };
                            let symbol = self.symbols.alloc(Symbol::new(
                                SymbolKind::Variable {
                                    declared,
                                    is_const: false,
                                    is_compiler_generated: false,
                                },
                                Some(*name),
                                *name_span,
                            ));
                            self.insert_member(ctx.scope, symbol, true);
                            init_stmts
                                .push(self.alloc_stmt(StatementKind::VarDecl { symbol }, *name_span));
                        }
                        syntax::ForInit::Assign(expr) => {
                            let bound = self.bind_expression(expr, ctx);
                            init_stmts.push(self.alloc_stmt(StatementKind::Expr(bound), expr.span()));
                        }
                    }
                }
                let stop = stop.as_ref().map(|e| self.bind_expression(e, ctx));
                let steps: Vec<ExprId> =
                    steps.iter().map(|e| self.bind_expression(e, ctx)).collect();
                let body = self.bind_stmt(body, ctx);
                self.alloc_stmt(
                    StatementKind::ForLoop {
                        inits: init_stmts,
                        stop,
                        steps,
                        body,
                    },
                    *span,
                )
            }
            syntax::Stmt::While { cond, body, span } => {
                let cond = self.bind_expression(cond, ctx);
                let body = self.bind_stmt(body, ctx);
                self.alloc_stmt(StatementKind::WhileLoop { cond, body }, *span)
            }
            syntax::Stmt::Repeat { count, body, span } => {
                let count = self.bind_expression(count, ctx);
                let body = self.bind_stmt(body, ctx);
                self.alloc_stmt(StatementKind::RepeatLoop { count, body }, *span)
            }
            syntax::Stmt::Forever { body, span } => {
                // A forever loop in a constant context can only end via
                // return; the step budget catches runaways.
                let one = self.bind_true_expr(*span);
                let body = self.bind_stmt(body, ctx);
                self.alloc_stmt(StatementKind::WhileLoop { cond: one, body }, *span)
            }
            syntax::Stmt::Return { expr, span } => {
                let bound = match expr {
                    Some(e) => {
                        let return_ty = self.enclosing_return_type(ctx.scope);
                        Some(match return_ty {
                            Some(ty) => self.bind_assignment_like(ty, e, ctx),
                            None => self.bind_expression(e, ctx),
                        })
                    }
                    None => None,
                };
                self.alloc_stmt(StatementKind::Return(bound), *span)
            }
            syntax::Stmt::Break { span } => self.alloc_stmt(StatementKind::Break, *span),
            syntax::Stmt::Continue { span } => self.alloc_stmt(StatementKind::Continue, *span),
            syntax::Stmt::EventControl { body, span, .. } => {
                // Timing controls cannot execute in constant contexts; the
                // body is still bound for downstream tooling.
                let body = self.bind_stmt(body, ctx);
                let _ = body;
                self.alloc_stmt(StatementKind::Invalid, *span)
            }
            syntax::Stmt::Null { span } => self.alloc_stmt(StatementKind::Empty, *span),
            syntax::Stmt::Error { span } => self.alloc_stmt(StatementKind::Invalid, *span),
        }
    }

    fn bind_true_expr(&mut self, span: Span) -> ExprId {
        let ty = self.builtins.bit_type;
        let value = veris_common::SvInt::from_bool(true);
        self.exprs.alloc(crate::expr::Expression {
            kind: crate::expr::ExpressionKind::IntegerLiteral(value.clone()),
            ty,
            span,
            constant: Some(ConstantValue::Integer(value)),
        })
    }

    fn enclosing_return_type(&mut self, scope: SymbolId) -> Option<crate::arena::TypeId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if matches!(self.symbols[s].kind, SymbolKind::Subroutine { .. }) {
                return Some(self.subroutine_return_type(s));
            }
            current = self.symbols[s].parent;
        }
        None
    }

    /// Executes one bound statement.
    pub fn eval_stmt(&mut self, ctx: &mut EvalContext, stmt: StmtId) -> EvalResult {
        let span = self.stmts[stmt].span;
        if !ctx.step(span) {
            return EvalResult::Fail;
        }
        match self.stmts[stmt].kind.clone() {
            StatementKind::Invalid => EvalResult::Fail,
            StatementKind::Empty => EvalResult::Success,
            StatementKind::List(items) => {
                for item in items {
                    let result = self.eval_stmt(ctx, item);
                    if result != EvalResult::Success {
                        return result;
                    }
                }
                EvalResult::Success
            }
            StatementKind::VarDecl { symbol } => {
                let value = match self.initializer_of(symbol) {
                    Some(init) => self.eval_expr(ctx, init),
                    None => {
                        let ty = self.declared_type_of(symbol);
                        self.default_value(ty)
                    }
                };
                if value.is_invalid() {
                    return EvalResult::Fail;
                }
                ctx.create_local(symbol, value);
                EvalResult::Success
            }
            StatementKind::Expr(expr) => {
                if self.eval_expr(ctx, expr).is_invalid() {
                    EvalResult::Fail
                } else {
                    EvalResult::Success
                }
            }
            StatementKind::Return(expr) => {
                if let Some(expr) = expr {
                    let value = self.eval_expr(ctx, expr);
                    if value.is_invalid() {
                        return EvalResult::Fail;
                    }
                    let frame = ctx.top_frame();
                    let return_var = frame.subroutine.and_then(|sub| {
                        match &self.symbols[sub].kind {
                            SymbolKind::Subroutine { return_var, .. } => *return_var,
                            _ => None,
                        }
                    });
                    if let Some(rv) = return_var {
                        ctx.create_local(rv, value);
                    }
                }
                EvalResult::Return
            }
            StatementKind::Break => EvalResult::Break,
            StatementKind::Continue => EvalResult::Continue,
            StatementKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                let value = self.eval_expr(ctx, cond);
                if value.is_invalid() {
                    return EvalResult::Fail;
                }
                if value.is_true() {
                    self.eval_stmt(ctx, if_true)
                } else {
                    match if_false {
                        Some(stmt) => self.eval_stmt(ctx, stmt),
                        None => EvalResult::Success,
                    }
                }
            }
            StatementKind::Case {
                cond,
                items,
                default,
            } => {
                let selector = self.eval_expr(ctx, cond);
                if selector.is_invalid() {
                    return EvalResult::Fail;
                }
                for (exprs, body) in items {
                    for expr in exprs {
                        let value = self.eval_expr(ctx, expr);
                        if value.is_invalid() {
                            return EvalResult::Fail;
                        }
                        let matched = match (&selector, &value) {
                            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                                a.exactly_equals(b)
                            }
                            (a, b) => a.equivalent_to(b),
                        };
                        if matched {
                            return self.eval_stmt(ctx, body);
                        }
                    }
                }
                match default {
                    Some(body) => self.eval_stmt(ctx, body),
                    None => EvalResult::Success,
                }
            }
            StatementKind::ForLoop {
                inits,
                stop,
                steps,
                body,
            } => {
                for init in inits {
                    if self.eval_stmt(ctx, init) == EvalResult::Fail {
                        return EvalResult::Fail;
                    }
                }
                loop {
                    if let Some(stop) = stop {
                        let value = self.eval_expr(ctx, stop);
                        if value.is_invalid() {
                            return EvalResult::Fail;
                        }
                        if !value.is_true() {
                            break;
                        }
                    }
                    match self.eval_stmt(ctx, body) {
                        EvalResult::Success | EvalResult::Continue => {}
                        EvalResult::Break => break,
                        other => return other,
                    }
                    for &step in &steps {
                        if self.eval_expr(ctx, step).is_invalid() {
                            return EvalResult::Fail;
                        }
                    }
                    if !ctx.step(span) {
                        return EvalResult::Fail;
                    }
                }
                EvalResult::Success
            }
            StatementKind::WhileLoop { cond, body } => loop {
                let value = self.eval_expr(ctx, cond);
                if value.is_invalid() {
                    return EvalResult::Fail;
                }
                if !value.is_true() {
                    return EvalResult::Success;
                }
                match self.eval_stmt(ctx, body) {
                    EvalResult::Success | EvalResult::Continue => {}
                    EvalResult::Break => return EvalResult::Success,
                    other => return other,
                }
                if !ctx.step(span) {
                    return EvalResult::Fail;
                }
            },
            StatementKind::RepeatLoop { count, body } => {
                let value = self.eval_expr(ctx, count);
                let Some(times) = value.as_i64() else {
                    return EvalResult::Fail;
                };
                for _ in 0..times.max(0) {
                    match self.eval_stmt(ctx, body) {
                        EvalResult::Success | EvalResult::Continue => {}
                        EvalResult::Break => break,
                        other => return other,
                    }
                    if !ctx.step(span) {
                        return EvalResult::Fail;
                    }
                }
                EvalResult::Success
            }
        }
    }

    /// Structurally verifies that a statement can execute in a constant
    /// context.
    pub fn verify_stmt(&mut self, ctx: &mut EvalContext, stmt: StmtId) -> bool {
        match self.stmts[stmt].kind.clone() {
            StatementKind::Invalid => false,
            StatementKind::Empty | StatementKind::Break | StatementKind::Continue => true,
            StatementKind::List(items) => {
                items.iter().all(|&item| self.verify_stmt(ctx, item))
            }
            StatementKind::VarDecl { symbol } => match self.initializer_of(symbol) {
                Some(init) => self.verify_constant(ctx, init),
                None => true,
            },
            StatementKind::Expr(expr) => self.verify_constant(ctx, expr),
            StatementKind::Return(expr) => match expr {
                Some(expr) => self.verify_constant(ctx, expr),
                None => true,
            },
            StatementKind::Conditional {
                cond,
                if_true,
                if_false,
            } => {
                self.verify_constant(ctx, cond)
                    && self.verify_stmt(ctx, if_true)
                    && if_false.map_or(true, |stmt| self.verify_stmt(ctx, stmt))
            }
            StatementKind::Case {
                cond,
                items,
                default,
            } => {
                self.verify_constant(ctx, cond)
                    && items.iter().all(|(exprs, body)| {
                        exprs.iter().all(|&e| self.verify_constant(ctx, e))
                            && self.verify_stmt(ctx, *body)
                    })
                    && default.map_or(true, |stmt| self.verify_stmt(ctx, stmt))
            }
            StatementKind::ForLoop {
                inits,
                stop,
                steps,
                body,
            } => {
                inits.iter().all(|&init| self.verify_stmt(ctx, init))
                    && stop.map_or(true, |e| self.verify_constant(ctx, e))
                    && steps.iter().all(|&e| self.verify_constant(ctx, e))
                    && self.verify_stmt(ctx, body)
            }
            StatementKind::WhileLoop { cond, body } => {
                self.verify_constant(ctx, cond) && self.verify_stmt(ctx, body)
            }
            StatementKind::RepeatLoop { count, body } => {
                self.verify_constant(ctx, count) && self.verify_stmt(ctx, body)
            }
        }
    }
}
