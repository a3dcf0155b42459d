//! Bound expressions and the expression binder.
//!
//! Binding turns expression syntax into a typed tree following the
//! SystemVerilog propagation rules: self-determined operands (power RHS,
//! shift counts, conditional predicates, concatenation operands) keep
//! their own width, while context-determined operands propagate the
//! maximum operand width back down through implicit [`Conversion`]
//! (`ExpressionKind::Conversion`) nodes inserted at the leaves. Real
//! operands force real arithmetic; assignment targets set the RHS context
//! width.

use crate::arena::{ExprId, SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::eval::EvalContext;
use crate::lookup::{LookupLocation, PathSeg};
use crate::symbols::SymbolKind;
use crate::types::{ConstantRange, IntegralFlags, Type};
use crate::Compilation;
use veris_common::{Ident, Logic, LiteralError, SvInt};
use veris_parser::ast as syntax;
use veris_parser::ast::{BinaryOp, RangeSelectKind, RealKind, UnaryOp};
use veris_source::Span;

/// The scope, lookup location, and flags an expression binds under.
#[derive(Clone, Copy, Debug)]
pub struct BindContext {
    /// The scope names resolve in.
    pub scope: SymbolId,
    /// The ordering location for lookups.
    pub location: LookupLocation,
    /// True when the expression must be constant.
    pub constant: bool,
}

/// The recognized constant system functions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SystemFunction {
    /// `$clog2`
    Clog2,
    /// `$bits`
    Bits,
}

/// A bound (typed) expression.
#[derive(Clone, Debug)]
pub struct Expression {
    /// The expression kind and children.
    pub kind: ExpressionKind,
    /// The expression's type.
    pub ty: TypeId,
    /// The source range.
    pub span: Span,
    /// A pre-computed constant, when known at bind time.
    pub constant: Option<ConstantValue>,
}

/// The kind of a bound expression.
#[derive(Clone, Debug)]
pub enum ExpressionKind {
    /// A poison node; binding failed and a diagnostic was issued.
    Invalid,
    /// An integer literal (including based and string-as-vector forms).
    IntegerLiteral(SvInt),
    /// A real literal.
    RealLiteral(f64),
    /// A string literal with its vector interpretation.
    StringLiteral {
        /// The text without quotes.
        text: String,
    },
    /// An unbased unsized literal; fills the context width on propagation.
    UnbasedUnsizedLiteral(Logic),
    /// The `null` literal.
    NullLiteral,
    /// A reference to a named value.
    NamedValue {
        /// The referenced symbol.
        symbol: SymbolId,
        /// True if the name was resolved hierarchically.
        hierarchical: bool,
    },
    /// A unary operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: ExprId,
    },
    /// A binary operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: ExprId,
        /// The right operand.
        right: ExprId,
    },
    /// The conditional operator.
    Conditional {
        /// The predicate.
        pred: ExprId,
        /// The true arm.
        left: ExprId,
        /// The false arm.
        right: ExprId,
    },
    /// An assignment.
    Assignment {
        /// A compound operator, if any.
        op: Option<BinaryOp>,
        /// True for nonblocking assignments.
        nonblocking: bool,
        /// The target.
        left: ExprId,
        /// The value.
        right: ExprId,
    },
    /// An element select.
    ElementSelect {
        /// The selected value.
        value: ExprId,
        /// The index.
        selector: ExprId,
    },
    /// A range select.
    RangeSelect {
        /// The selected value.
        value: ExprId,
        /// The select form.
        select_kind: RangeSelectKind,
        /// The left/base bound.
        left: ExprId,
        /// The right/width bound.
        right: ExprId,
    },
    /// A struct/union member access.
    MemberAccess {
        /// The accessed value.
        value: ExprId,
        /// The field name.
        field: Ident,
        /// The field's bit offset (packed) or index (unpacked).
        offset: u32,
    },
    /// A concatenation.
    Concat {
        /// The operands, MSB first.
        operands: Vec<ExprId>,
    },
    /// A replication.
    Replication {
        /// The count.
        count: ExprId,
        /// The replicated concatenation.
        concat: ExprId,
    },
    /// A call to a user-defined subroutine.
    Call {
        /// The called subroutine.
        subroutine: SymbolId,
        /// The bound arguments.
        args: Vec<ExprId>,
    },
    /// A call to a constant system function.
    SystemCall {
        /// Which function.
        function: SystemFunction,
        /// The bound arguments.
        args: Vec<ExprId>,
    },
    /// An implicit or explicit conversion to this node's type.
    Conversion {
        /// The operand.
        operand: ExprId,
    },
    /// A data type used in expression position.
    DataType,
    /// An assignment pattern, normalized to per-element expressions.
    AssignmentPattern {
        /// The element expressions in target order.
        elements: Vec<ExprId>,
    },
}

impl<'a> Compilation<'a> {
    fn alloc_expr(
        &mut self,
        kind: ExpressionKind,
        ty: TypeId,
        span: Span,
        constant: Option<ConstantValue>,
    ) -> ExprId {
        self.exprs.alloc(Expression {
            kind,
            ty,
            span,
            constant,
        })
    }

    pub(crate) fn invalid_expr(&mut self, span: Span) -> ExprId {
        let err = self.builtins.error_type;
        self.alloc_expr(ExpressionKind::Invalid, err, span, None)
    }

    /// Binds an expression in a self-determined context.
    pub fn bind_expression(&mut self, expr: &'a syntax::Expr, ctx: &BindContext) -> ExprId {
        match expr {
            syntax::Expr::Literal { span } | syntax::Expr::SizedLiteral { span } => {
                self.bind_integer_literal(*span)
            }
            syntax::Expr::UnbasedUnsized { span } => {
                let text = self.db.snippet(*span);
                let logic = text
                    .chars()
                    .last()
                    .and_then(Logic::from_char)
                    .unwrap_or(Logic::X);
                let ty = self.builtins.logic_type;
                self.alloc_expr(
                    ExpressionKind::UnbasedUnsizedLiteral(logic),
                    ty,
                    *span,
                    Some(ConstantValue::Integer(SvInt::from_logic(logic))),
                )
            }
            syntax::Expr::RealLiteral { span } | syntax::Expr::TimeLiteral { span } => {
                self.bind_real_literal(*span)
            }
            syntax::Expr::StringLiteral { span } => self.bind_string_literal(*span),
            syntax::Expr::Null { span } => {
                let ty = self.builtins.null_type;
                self.alloc_expr(
                    ExpressionKind::NullLiteral,
                    ty,
                    *span,
                    Some(ConstantValue::NullPlaceholder),
                )
            }
            syntax::Expr::Identifier { .. }
            | syntax::Expr::Scoped { .. }
            | syntax::Expr::Member { .. }
            | syntax::Expr::Root { .. } => self.bind_name(expr, ctx),
            syntax::Expr::Unary { op, operand, span } => self.bind_unary(*op, operand, *span, ctx),
            syntax::Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.bind_binary(*op, left, right, *span, ctx),
            syntax::Expr::Conditional {
                pred,
                if_true,
                if_false,
                span,
            } => self.bind_conditional(pred, if_true, if_false, *span, ctx),
            syntax::Expr::Assignment {
                op,
                nonblocking,
                target,
                value,
                span,
            } => self.bind_assignment(*op, *nonblocking, target, value, *span, ctx),
            syntax::Expr::ElementSelect {
                value,
                selector,
                span,
            } => self.bind_element_select(value, selector, *span, ctx),
            syntax::Expr::RangeSelect {
                value,
                kind,
                left,
                right,
                span,
            } => self.bind_range_select(value, *kind, left, right, *span, ctx),
            syntax::Expr::Concat { elements, span } => self.bind_concat(elements, *span, ctx),
            syntax::Expr::Replication { count, concat, span } => {
                self.bind_replication(count, concat, *span, ctx)
            }
            syntax::Expr::Call { target, args, span } => self.bind_call(target, args, *span, ctx),
            syntax::Expr::SystemCall { name, args, span } => {
                self.bind_system_call(*name, args, *span, ctx)
            }
            syntax::Expr::Cast {
                target,
                operand,
                span,
            } => self.bind_cast(target, operand, *span, ctx),
            syntax::Expr::DataTypeExpr { ty, span } => {
                let built = self.type_from_syntax(ty, ctx.scope, ctx.location, false);
                self.alloc_expr(ExpressionKind::DataType, built, *span, None)
            }
            syntax::Expr::AssignmentPattern { ty, span, .. } => {
                // A type prefix shapes the pattern on its own; without
                // one there is no target type to shape against.
                if ty.is_some() {
                    let err = self.builtins.error_type;
                    self.bind_pattern(err, expr, ctx)
                } else {
                    self.sink.emit(errors::error_expression_not_constant(*span));
                    self.invalid_expr(*span)
                }
            }
            syntax::Expr::Paren { inner, .. } => self.bind_expression(inner, ctx),
            syntax::Expr::Error { span } => self.invalid_expr(*span),
        }
    }

    fn bind_integer_literal(&mut self, span: Span) -> ExprId {
        let text = self.db.snippet(span).to_string();
        match SvInt::parse_literal(&text) {
            Ok(parsed) => {
                if parsed.truncated {
                    self.sink.emit(errors::warn_literal_truncated(span));
                }
                let value = parsed.value;
                let flags = IntegralFlags {
                    signed: value.is_signed(),
                    four_state: value.has_unknown(),
                    reg: false,
                };
                let ty = self.vector_type(value.width(), flags);
                self.alloc_expr(
                    ExpressionKind::IntegerLiteral(value.clone()),
                    ty,
                    span,
                    Some(ConstantValue::Integer(value)),
                )
            }
            Err(err) => {
                let diag = match err {
                    LiteralError::SignedOverflow => errors::error_signed_literal_overflow(span),
                    LiteralError::SizeIsZero => {
                        errors::error_invalid_literal("size of vector literal cannot be zero", span)
                    }
                    LiteralError::SizeTooLarge => {
                        errors::error_invalid_literal("size of vector literal is too large", span)
                    }
                    LiteralError::MultipleUnknownDigits => errors::error_invalid_literal(
                        "decimal literals may have only a single X/Z digit",
                        span,
                    ),
                    LiteralError::LeadingUnderscore => errors::error_invalid_literal(
                        "literals must not start with a leading underscore",
                        span,
                    ),
                    _ => errors::error_invalid_literal("expected digits", span),
                };
                self.sink.emit(diag);
                self.invalid_expr(span)
            }
        }
    }

    fn bind_real_literal(&mut self, span: Span) -> ExprId {
        let text: String = self
            .db
            .snippet(span)
            .chars()
            .filter(|&c| c != '_')
            .collect();
        // Strip any time-literal unit suffix.
        let trimmed = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        let value: f64 = trimmed.parse().unwrap_or(0.0);
        let ty = self.builtins.real_type;
        self.alloc_expr(
            ExpressionKind::RealLiteral(value),
            ty,
            span,
            Some(ConstantValue::Real(value)),
        )
    }

    fn bind_string_literal(&mut self, span: Span) -> ExprId {
        let raw = self.db.snippet(span);
        let text = unescape_string(raw.trim_matches('"'));
        // String literals are bit vectors, eight bits per character.
        let width = (text.len() as u32 * 8).max(8);
        let flags = IntegralFlags::default();
        let ty = self.vector_type(width, flags);
        self.alloc_expr(
            ExpressionKind::StringLiteral { text: text.clone() },
            ty,
            span,
            Some(ConstantValue::Str(text)),
        )
    }

    // ---- names ----

    /// Flattens a dotted name into path segments; returns `None` when the
    /// expression is not a plain (optionally selected) dotted path.
    fn flatten_path(
        &mut self,
        expr: &'a syntax::Expr,
        ctx: &BindContext,
    ) -> Option<(bool, Vec<PathSeg>)> {
        match expr {
            syntax::Expr::Identifier { name, span } => Some((
                false,
                vec![PathSeg {
                    name: *name,
                    span: *span,
                    selects: Vec::new(),
                }],
            )),
            syntax::Expr::Root { .. } => Some((true, Vec::new())),
            syntax::Expr::Member {
                value, name, name_span, ..
            } => {
                let (root, mut path) = self.flatten_path(value, ctx)?;
                path.push(PathSeg {
                    name: *name,
                    span: *name_span,
                    selects: Vec::new(),
                });
                Some((root, path))
            }
            syntax::Expr::ElementSelect {
                value, selector, ..
            } => {
                let (root, mut path) = self.flatten_path(value, ctx)?;
                let index = self.eval_const_i32(selector, ctx.scope, ctx.location)?;
                path.last_mut()?.selects.push(index);
                Some((root, path))
            }
            _ => None,
        }
    }

    fn bind_name(&mut self, expr: &'a syntax::Expr, ctx: &BindContext) -> ExprId {
        let span = expr.span();
        match expr {
            syntax::Expr::Identifier { name, span } => {
                match self.lookup_unqualified(ctx.scope, *name, ctx.location) {
                    Some(found) => self.bind_symbol_reference(found, *span, false),
                    None => {
                        self.sink.emit(errors::error_undeclared_identifier(
                            self.interner.resolve(*name),
                            *span,
                        ));
                        self.invalid_expr(*span)
                    }
                }
            }
            syntax::Expr::Scoped {
                package,
                name,
                span,
            } => {
                let Some(pkg) = self.get_package(*package) else {
                    self.sink.emit(errors::error_unknown_package(
                        self.interner.resolve(*package),
                        *span,
                    ));
                    return self.invalid_expr(*span);
                };
                match self.lookup_in_scope(pkg, *name) {
                    Some(found) => self.bind_symbol_reference(found, *span, false),
                    None => {
                        self.sink.emit(errors::error_undeclared_identifier(
                            self.interner.resolve(*name),
                            *span,
                        ));
                        self.invalid_expr(*span)
                    }
                }
            }
            syntax::Expr::Member { value, name, name_span, .. } => {
                // First try ordinary member access on a bound value.
                if let Some(result) = self.try_member_access(value, *name, *name_span, span, ctx) {
                    return result;
                }
                // Otherwise resolve the whole dotted path hierarchically.
                match self.flatten_path(expr, ctx) {
                    Some((from_root, path)) if !path.is_empty() || from_root => {
                        match self.lookup_hierarchical(ctx.scope, &path, from_root) {
                            Some(found) if self.symbols[found].is_value() => {
                                self.bind_symbol_reference(found, span, true)
                            }
                            Some(_) => {
                                self.sink.emit(errors::error_not_a_value(
                                    self.interner.resolve(*name),
                                    span,
                                ));
                                self.invalid_expr(span)
                            }
                            None => {
                                self.sink
                                    .emit(errors::error_undeclared_identifier(
                                        self.interner.resolve(path[0].name),
                                        span,
                                    ));
                                self.invalid_expr(span)
                            }
                        }
                    }
                    _ => {
                        self.sink.emit(errors::error_undeclared_identifier(
                            self.interner.resolve(*name),
                            span,
                        ));
                        self.invalid_expr(span)
                    }
                }
            }
            syntax::Expr::Root { span } => {
                self.sink.emit(errors::error_not_a_value("$root", *span));
                self.invalid_expr(*span)
            }
            _ => self.invalid_expr(span),
        }
    }

    /// Attempts to bind `value.name` as struct/union member access.
    /// Returns `None` when the base doesn't resolve to a struct-typed
    /// value, so hierarchical resolution can take over.
    fn try_member_access(
        &mut self,
        value: &'a syntax::Expr,
        name: Ident,
        name_span: Span,
        span: Span,
        ctx: &BindContext,
    ) -> Option<ExprId> {
        // The base must itself resolve as a value expression; probe the
        // head of the path first so we don't emit spurious diagnostics.
        let head_is_value = {
            let mut probe = value;
            loop {
                match probe {
                    syntax::Expr::Identifier { name, .. } => {
                        break match self.lookup_unqualified(ctx.scope, *name, ctx.location) {
                            Some(found) => self.symbols[found].is_value(),
                            None => false,
                        };
                    }
                    syntax::Expr::Root { .. } => break false,
                    syntax::Expr::Member { value, .. }
                    | syntax::Expr::ElementSelect { value, .. } => probe = value,
                    syntax::Expr::Paren { inner, .. } => probe = inner,
                    _ => break true,
                }
            }
        };
        if !head_is_value {
            return None;
        }

        let base = self.bind_expression(value, ctx);
        let base_ty = self.exprs[base].ty;
        let canonical = self.canonical(base_ty);
        let fields = match &self.types[canonical] {
            Type::PackedStruct { fields, .. }
            | Type::UnpackedStruct { fields, .. }
            | Type::PackedUnion { fields, .. }
            | Type::UnpackedUnion { fields, .. } => fields,
            _ => {
                let rendered = self.type_to_string(base_ty);
                self.sink.emit(errors::error_unknown_member(
                    self.interner.resolve(name),
                    &rendered,
                    name_span,
                ));
                return Some(self.invalid_expr(span));
            }
        };
        match fields.iter().find(|f| f.name == name) {
            Some(field) => {
                let (ty, offset) = (field.ty, field.offset);
                Some(self.alloc_expr(
                    ExpressionKind::MemberAccess {
                        value: base,
                        field: name,
                        offset,
                    },
                    ty,
                    span,
                    None,
                ))
            }
            None => {
                let rendered = self.type_to_string(base_ty);
                self.sink.emit(errors::error_unknown_member(
                    self.interner.resolve(name),
                    &rendered,
                    name_span,
                ));
                Some(self.invalid_expr(span))
            }
        }
    }

    fn bind_symbol_reference(&mut self, sym: SymbolId, span: Span, hierarchical: bool) -> ExprId {
        if self.symbols[sym].is_value() {
            let ty = self.declared_type_of(sym);
            return self.alloc_expr(
                ExpressionKind::NamedValue {
                    symbol: sym,
                    hierarchical,
                },
                ty,
                span,
                None,
            );
        }
        let name = self.symbols[sym]
            .name
            .map(|n| self.interner.resolve(n).to_string())
            .unwrap_or_default();
        self.sink.emit(errors::error_not_a_value(&name, span));
        self.invalid_expr(span)
    }

    // ---- operators ----

    fn bind_unary(
        &mut self,
        op: UnaryOp,
        operand: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let bound = self.bind_expression(operand, ctx);
        let operand_ty = self.exprs[bound].ty;
        if self.is_error_type(operand_ty) {
            return self.invalid_expr(span);
        }

        let ty = match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if self.is_numeric(operand_ty) {
                    operand_ty
                } else {
                    let rendered = self.type_to_string(operand_ty);
                    self.sink.emit(errors::error_bad_unary(&rendered, span));
                    return self.invalid_expr(span);
                }
            }
            UnaryOp::BitwiseNot => {
                if self.is_integral(operand_ty) {
                    operand_ty
                } else {
                    let rendered = self.type_to_string(operand_ty);
                    self.sink.emit(errors::error_bad_unary(&rendered, span));
                    return self.invalid_expr(span);
                }
            }
            UnaryOp::LogicalNot => {
                if self.is_boolean_convertible(operand_ty) {
                    self.one_bit(false)
                } else {
                    let rendered = self.type_to_string(operand_ty);
                    self.sink.emit(errors::error_bad_unary(&rendered, span));
                    return self.invalid_expr(span);
                }
            }
            UnaryOp::ReductionAnd
            | UnaryOp::ReductionOr
            | UnaryOp::ReductionXor
            | UnaryOp::ReductionNand
            | UnaryOp::ReductionNor
            | UnaryOp::ReductionXnor => {
                if self.is_integral(operand_ty) {
                    let four_state = self.is_four_state(operand_ty);
                    self.one_bit(four_state)
                } else {
                    let rendered = self.type_to_string(operand_ty);
                    self.sink.emit(errors::error_bad_unary(&rendered, span));
                    return self.invalid_expr(span);
                }
            }
            UnaryOp::Preincrement
            | UnaryOp::Predecrement
            | UnaryOp::Postincrement
            | UnaryOp::Postdecrement => {
                if self.is_numeric(operand_ty) {
                    operand_ty
                } else {
                    let rendered = self.type_to_string(operand_ty);
                    self.sink.emit(errors::error_bad_unary(&rendered, span));
                    return self.invalid_expr(span);
                }
            }
        };
        self.alloc_expr(ExpressionKind::Unary { op, operand: bound }, ty, span, None)
    }

    fn one_bit(&mut self, four_state: bool) -> TypeId {
        if four_state {
            self.builtins.logic_type
        } else {
            self.builtins.bit_type
        }
    }

    fn bind_binary(
        &mut self,
        op: BinaryOp,
        left: &'a syntax::Expr,
        right: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let lhs = self.bind_expression(left, ctx);
        let rhs = self.bind_expression(right, ctx);
        let lt = self.exprs[lhs].ty;
        let rt = self.exprs[rhs].ty;
        if self.is_error_type(lt) || self.is_error_type(rt) {
            return self.invalid_expr(span);
        }
        self.bind_binary_bound(op, lhs, rhs, span)
    }

    pub(crate) fn bind_binary_bound(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        span: Span,
    ) -> ExprId {
        let lt = self.exprs[lhs].ty;
        let rt = self.exprs[rhs].ty;

        use BinaryOp::*;
        match op {
            Add | Subtract | Multiply | Divide | Mod | BinaryAnd | BinaryOr | BinaryXor
            | BinaryXnor => {
                if !self.is_numeric(lt) || !self.is_numeric(rt) {
                    return self.bad_binary(lt, rt, span);
                }
                let bitwise = matches!(op, BinaryAnd | BinaryOr | BinaryXor | BinaryXnor);
                if bitwise && (self.is_floating(lt) || self.is_floating(rt)) {
                    return self.bad_binary(lt, rt, span);
                }
                if self.is_floating(lt) || self.is_floating(rt) {
                    let ty = self.merge_real_type(lt, rt);
                    let lhs = self.propagated(lhs, ty);
                    let rhs = self.propagated(rhs, ty);
                    return self.alloc_expr(
                        ExpressionKind::Binary { op, left: lhs, right: rhs },
                        ty,
                        span,
                        None,
                    );
                }
                let force_four = matches!(op, Divide | Mod);
                let ty = self.merge_integral_type(lt, rt, force_four);
                let lhs = self.propagated(lhs, ty);
                let rhs = self.propagated(rhs, ty);
                self.alloc_expr(ExpressionKind::Binary { op, left: lhs, right: rhs }, ty, span, None)
            }
            Power => {
                if !self.is_numeric(lt) || !self.is_numeric(rt) {
                    return self.bad_binary(lt, rt, span);
                }
                if self.is_floating(lt) || self.is_floating(rt) {
                    let ty = self.merge_real_type(lt, rt);
                    let lhs = self.propagated(lhs, ty);
                    return self.alloc_expr(
                        ExpressionKind::Binary { op, left: lhs, right: rhs },
                        ty,
                        span,
                        None,
                    );
                }
                // The result is self-determined from the LHS; power always
                // produces four-state bits.
                let flags = IntegralFlags {
                    signed: self.is_signed(lt),
                    four_state: true,
                    reg: false,
                };
                let lhs_width = self.bit_width(lt).max(1);
                let ty = self.vector_type(lhs_width, flags);
                let lhs = self.propagated(lhs, ty);
                self.alloc_expr(ExpressionKind::Binary { op, left: lhs, right: rhs }, ty, span, None)
            }
            LogicalShiftLeft | LogicalShiftRight | ArithmeticShiftLeft | ArithmeticShiftRight => {
                if !self.is_integral(lt) || !self.is_integral(rt) {
                    return self.bad_binary(lt, rt, span);
                }
                // Shift counts are self-determined; the result follows the
                // LHS, except that a four-state count contaminates it.
                let ty = if self.is_four_state(rt) && !self.is_four_state(lt) {
                    let flags = IntegralFlags {
                        signed: self.is_signed(lt),
                        four_state: true,
                        reg: false,
                    };
                    let lhs_width = self.bit_width(lt).max(1);
                    self.vector_type(lhs_width, flags)
                } else {
                    lt
                };
                let lhs = self.propagated(lhs, ty);
                self.alloc_expr(ExpressionKind::Binary { op, left: lhs, right: rhs }, ty, span, None)
            }
            Equality | Inequality | CaseEquality | CaseInequality | WildcardEquality
            | WildcardInequality | LessThan | LessThanEqual | GreaterThan | GreaterThanEqual => {
                self.bind_comparison(op, lhs, rhs, span)
            }
            LogicalAnd | LogicalOr | LogicalImplication | LogicalEquivalence => {
                if !self.is_boolean_convertible(lt) || !self.is_boolean_convertible(rt) {
                    return self.bad_binary(lt, rt, span);
                }
                let ty = self.one_bit(false);
                self.alloc_expr(ExpressionKind::Binary { op, left: lhs, right: rhs }, ty, span, None)
            }
        }
    }

    fn bad_binary(&mut self, lt: TypeId, rt: TypeId, span: Span) -> ExprId {
        let ls = self.type_to_string(lt);
        let rs = self.type_to_string(rt);
        self.sink.emit(errors::error_bad_binary(&ls, &rs, span));
        self.invalid_expr(span)
    }

    fn bind_comparison(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, span: Span) -> ExprId {
        let lt = self.exprs[lhs].ty;
        let rt = self.exprs[rhs].ty;
        use BinaryOp::*;

        // Aggregates compare element-wise when equivalent; only the
        // equality family applies.
        let l_aggregate = self.is_unpacked_array(lt) || self.is_unpacked_struct(lt);
        let r_aggregate = self.is_unpacked_array(rt) || self.is_unpacked_struct(rt);
        if l_aggregate || r_aggregate {
            let equality = matches!(op, Equality | Inequality | CaseEquality | CaseInequality);
            if !equality || !self.is_equivalent(lt, rt) {
                return self.bad_binary(lt, rt, span);
            }
            let four_state = self.is_four_state(lt) || self.is_four_state(rt);
            let case = matches!(op, CaseEquality | CaseInequality);
            let ty = self.one_bit(four_state && !case);
            return self.alloc_expr(
                ExpressionKind::Binary { op, left: lhs, right: rhs },
                ty,
                span,
                None,
            );
        }

        let l_string = self.is_string_type(lt);
        let r_string = self.is_string_type(rt);
        if l_string || r_string {
            if !(l_string && r_string) {
                return self.bad_binary(lt, rt, span);
            }
            let ty = self.one_bit(false);
            return self.alloc_expr(
                ExpressionKind::Binary { op, left: lhs, right: rhs },
                ty,
                span,
                None,
            );
        }

        if !self.is_numeric(lt) || !self.is_numeric(rt) {
            return self.bad_binary(lt, rt, span);
        }

        let case = matches!(op, CaseEquality | CaseInequality);
        let real_involved = self.is_floating(lt) || self.is_floating(rt);
        let four_state = !case
            && !real_involved
            && (self.is_four_state(lt) || self.is_four_state(rt));
        let ty = self.one_bit(four_state);

        // Operands are context-determined against each other.
        let (lhs, rhs) = if real_involved {
            let merged = self.merge_real_type(lt, rt);
            (self.propagated(lhs, merged), self.propagated(rhs, merged))
        } else {
            let merged = self.merge_integral_type(lt, rt, false);
            (self.propagated(lhs, merged), self.propagated(rhs, merged))
        };
        self.alloc_expr(ExpressionKind::Binary { op, left: lhs, right: rhs }, ty, span, None)
    }

    /// The common real type of two numeric operands.
    fn merge_real_type(&mut self, lt: TypeId, rt: TypeId) -> TypeId {
        let lc = self.canonical(lt);
        let rc = self.canonical(rt);
        let l_short = matches!(
            self.types[lc],
            Type::Floating {
                kind: RealKind::ShortReal
            }
        );
        let r_short = matches!(
            self.types[rc],
            Type::Floating {
                kind: RealKind::ShortReal
            }
        );
        let l_real = self.is_floating(lt) && !l_short;
        let r_real = self.is_floating(rt) && !r_short;
        if l_real || r_real {
            self.builtins.real_type
        } else {
            self.builtins.shortreal_type
        }
    }

    /// The common integral type of two operands: maximum width, signed
    /// only if both are, four-state if either is.
    fn merge_integral_type(&mut self, lt: TypeId, rt: TypeId, force_four: bool) -> TypeId {
        let lw = self.bit_width(lt).max(1);
        let rw = self.bit_width(rt).max(1);
        let width = lw.max(rw);
        let flags = IntegralFlags {
            signed: self.is_signed(lt) && self.is_signed(rt),
            four_state: force_four || self.is_four_state(lt) || self.is_four_state(rt),
            reg: false,
        };
        // When one side already has exactly the merged shape, keep its
        // type so packed array ranges survive (`pa <<< b` keeps pa's
        // type).
        for candidate in [lt, rt] {
            if self.bit_width(candidate) == width
                && self.is_signed(candidate) == flags.signed
                && self.is_four_state(candidate) == flags.four_state
                && self.is_integral(candidate)
                && !self.is_enum(candidate)
            {
                return candidate;
            }
        }
        self.vector_type(width, flags)
    }

    /// Propagates a context type down into an expression, inserting
    /// conversion nodes at self-determined boundaries.
    pub(crate) fn propagated(&mut self, expr: ExprId, ty: TypeId) -> ExprId {
        if self.exprs[expr].ty == ty {
            return expr;
        }
        if self.is_matching(self.exprs[expr].ty, ty) {
            return expr;
        }
        let span = self.exprs[expr].span;
        match self.exprs[expr].kind.clone() {
            ExpressionKind::IntegerLiteral(value) => {
                let width = self.bit_width(ty).max(1);
                let signed = self.is_signed(ty);
                let four_state = self.is_four_state(ty);
                let converted = value.convert(width, signed, four_state);
                self.alloc_expr(
                    ExpressionKind::IntegerLiteral(converted.clone()),
                    ty,
                    span,
                    Some(ConstantValue::Integer(converted)),
                )
            }
            ExpressionKind::UnbasedUnsizedLiteral(logic) => {
                let width = self.bit_width(ty).max(1);
                let signed = self.is_signed(ty);
                let value = match logic {
                    Logic::Zero => SvInt::new(width, 0, signed),
                    Logic::One => {
                        let mut v = SvInt::new(width, 0, signed);
                        v.set_all_ones();
                        v
                    }
                    Logic::X => SvInt::filled_x(width, signed),
                    Logic::Z => SvInt::filled_z(width, signed),
                };
                self.alloc_expr(
                    ExpressionKind::IntegerLiteral(value.clone()),
                    ty,
                    span,
                    Some(ConstantValue::Integer(value)),
                )
            }
            ExpressionKind::Binary { op, left, right } => {
                use BinaryOp::*;
                match op {
                    Add | Subtract | Multiply | Divide | Mod | BinaryAnd | BinaryOr
                    | BinaryXor | BinaryXnor => {
                        let left = self.propagated(left, ty);
                        let right = self.propagated(right, ty);
                        self.alloc_expr(
                            ExpressionKind::Binary { op, left, right },
                            ty,
                            span,
                            None,
                        )
                    }
                    LogicalShiftLeft | LogicalShiftRight | ArithmeticShiftLeft
                    | ArithmeticShiftRight | Power => {
                        // Only the LHS is context-determined.
                        let left = self.propagated(left, ty);
                        self.alloc_expr(
                            ExpressionKind::Binary { op, left, right },
                            ty,
                            span,
                            None,
                        )
                    }
                    _ => self.wrap_conversion(expr, ty),
                }
            }
            ExpressionKind::Conditional { pred, left, right } => {
                let left = self.propagated(left, ty);
                let right = self.propagated(right, ty);
                self.alloc_expr(
                    ExpressionKind::Conditional { pred, left, right },
                    ty,
                    span,
                    None,
                )
            }
            ExpressionKind::Unary { op, operand }
                if matches!(op, UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitwiseNot) =>
            {
                let operand = self.propagated(operand, ty);
                self.alloc_expr(ExpressionKind::Unary { op, operand }, ty, span, None)
            }
            _ => self.wrap_conversion(expr, ty),
        }
    }

    pub(crate) fn wrap_conversion(&mut self, expr: ExprId, ty: TypeId) -> ExprId {
        let span = self.exprs[expr].span;
        self.alloc_expr(ExpressionKind::Conversion { operand: expr }, ty, span, None)
    }

    fn bind_conditional(
        &mut self,
        pred: &'a syntax::Expr,
        if_true: &'a syntax::Expr,
        if_false: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let pred_bound = self.bind_expression(pred, ctx);
        let pred_ty = self.exprs[pred_bound].ty;
        if !self.is_error_type(pred_ty) && !self.is_boolean_convertible(pred_ty) {
            let rendered = self.type_to_string(pred_ty);
            self.sink
                .emit(errors::error_not_boolean_convertible(&rendered, pred.span()));
            return self.invalid_expr(span);
        }

        let lhs = self.bind_expression(if_true, ctx);
        let rhs = self.bind_expression(if_false, ctx);
        let lt = self.exprs[lhs].ty;
        let rt = self.exprs[rhs].ty;
        if self.is_error_type(lt) || self.is_error_type(rt) {
            return self.invalid_expr(span);
        }

        let lc = self.canonical(lt);
        let rc = self.canonical(rt);
        let ty = if lc == rc || self.is_matching(lt, rt) {
            lt
        } else if self.is_integral(lt) && self.is_integral(rt) {
            self.merge_integral_type(lt, rt, false)
        } else if self.is_numeric(lt) && self.is_numeric(rt) {
            self.merge_real_type(lt, rt)
        } else if self.is_string_type(lt) && self.is_string_type(rt) {
            self.builtins.string_type
        } else if self.is_equivalent(lt, rt) {
            lt
        } else {
            let ls = self.type_to_string(lt);
            let rs = self.type_to_string(rt);
            self.sink.emit(errors::error_bad_conditional(&ls, &rs, span));
            return self.invalid_expr(span);
        };

        let lhs = self.propagated(lhs, ty);
        let rhs = self.propagated(rhs, ty);
        self.alloc_expr(
            ExpressionKind::Conditional {
                pred: pred_bound,
                left: lhs,
                right: rhs,
            },
            ty,
            span,
            None,
        )
    }

    fn bind_assignment(
        &mut self,
        op: Option<BinaryOp>,
        nonblocking: bool,
        target: &'a syntax::Expr,
        value: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let lhs = self.bind_expression(target, ctx);
        if !self.is_assignable(lhs) {
            self.sink.emit(errors::error_bad_assignment(target.span()));
            return self.invalid_expr(span);
        }
        let target_ty = self.exprs[lhs].ty;
        let rhs = self.bind_assignment_like(target_ty, value, ctx);
        self.alloc_expr(
            ExpressionKind::Assignment {
                op,
                nonblocking,
                left: lhs,
                right: rhs,
            },
            target_ty,
            span,
            None,
        )
    }

    fn is_assignable(&self, expr: ExprId) -> bool {
        match &self.exprs[expr].kind {
            ExpressionKind::NamedValue { .. }
            | ExpressionKind::ElementSelect { .. }
            | ExpressionKind::RangeSelect { .. }
            | ExpressionKind::MemberAccess { .. } => true,
            ExpressionKind::Concat { operands } => {
                operands.iter().all(|&o| self.is_assignable(o))
            }
            _ => false,
        }
    }

    /// Binds an expression against a target type: the assignment context
    /// determines the RHS's effective width and the result is converted to
    /// the target.
    pub fn bind_assignment_like(
        &mut self,
        target: TypeId,
        expr: &'a syntax::Expr,
        ctx: &BindContext,
    ) -> ExprId {
        let mut expr = expr;
        while let syntax::Expr::Paren { inner, .. } = expr {
            expr = inner;
        }
        if let syntax::Expr::AssignmentPattern { .. } = expr {
            return self.bind_pattern(target, expr, ctx);
        }

        let bound = self.bind_expression(expr, ctx);
        let source_ty = self.exprs[bound].ty;
        if self.is_error_type(source_ty) || self.is_error_type(target) {
            return bound;
        }

        // String literals assign to string targets directly.
        if self.is_string_type(target)
            && matches!(self.exprs[bound].kind, ExpressionKind::StringLiteral { .. })
        {
            return self.wrap_conversion(bound, target);
        }

        if !self.is_assignment_compatible(target, source_ty) {
            let from = self.type_to_string(source_ty);
            let to = self.type_to_string(target);
            self.sink
                .emit(errors::error_no_implicit_conversion(&from, &to, expr.span()));
            return self.invalid_expr(expr.span());
        }

        if self.is_integral(target) && self.is_integral(source_ty) {
            // The RHS computes in the wider of the two contexts, then
            // narrows to the target.
            let tw = self.bit_width(target);
            let sw = self.bit_width(source_ty);
            if sw > tw {
                let propagated = self.propagated(bound, source_ty);
                return self.wrap_conversion(propagated, target);
            }
            return self.propagated(bound, target);
        }
        if self.is_floating(target) {
            return self.propagated(bound, target);
        }
        if self.is_matching(target, source_ty) || self.is_equivalent(target, source_ty) {
            return bound;
        }
        self.wrap_conversion(bound, target)
    }

    // ---- selects ----

    fn bind_element_select(
        &mut self,
        value: &'a syntax::Expr,
        selector: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        // A dotted path with selects may be a hierarchical reference into
        // an instance array; let name binding try that first.
        if self.flattens_to_scope_path(value, ctx) {
            return self.bind_name_with_selects(value, selector, span, ctx);
        }

        let bound = self.bind_expression(value, ctx);
        let sel = self.bind_expression(selector, ctx);
        let value_ty = self.exprs[bound].ty;
        if self.is_error_type(value_ty) {
            return self.invalid_expr(span);
        }

        let canonical = self.canonical(value_ty);
        let value_is_integral = self.is_integral(value_ty);
        let elem_ty = match &self.types[canonical] {
            Type::UnpackedArray { elem, .. } | Type::PackedArray { elem, .. } => *elem,
            Type::String => {
                let flags = IntegralFlags::default();
                self.vector_type(8, flags)
            }
            _ if value_is_integral => {
                let four_state = self.is_four_state(value_ty);
                self.one_bit(four_state)
            }
            _ => {
                let rendered = self.type_to_string(value_ty);
                self.sink
                    .emit(errors::error_bad_range(&rendered, span));
                return self.invalid_expr(span);
            }
        };

        // A constant selector can be checked against the declared range
        // right away.
        if let Some(ConstantValue::Integer(index)) = &self.exprs[sel].constant {
            if let Some(i) = index.as_i32() {
                if !self.is_string_type(value_ty) {
                    let range = self.array_range(value_ty);
                    if !range.contains(i) {
                        let rendered = self.type_to_string(value_ty);
                        self.sink.emit(errors::error_index_value_invalid(
                            &i.to_string(),
                            &rendered,
                            span,
                        ));
                        return self.invalid_expr(span);
                    }
                }
            }
        }

        self.alloc_expr(
            ExpressionKind::ElementSelect {
                value: bound,
                selector: sel,
            },
            elem_ty,
            span,
            None,
        )
    }

    fn flattens_to_scope_path(&mut self, value: &'a syntax::Expr, ctx: &BindContext) -> bool {
        let head = {
            let mut probe = value;
            loop {
                match probe {
                    syntax::Expr::Identifier { name, .. } => break Some(*name),
                    syntax::Expr::Member { value, .. }
                    | syntax::Expr::ElementSelect { value, .. } => probe = value,
                    _ => break None,
                }
            }
        };
        match head {
            Some(name) => match self.lookup_unqualified(ctx.scope, name, LookupLocation::MAX) {
                Some(found) => !self.symbols[found].is_value() && self.symbols[found].is_scope(),
                None => false,
            },
            None => false,
        }
    }

    fn bind_name_with_selects(
        &mut self,
        value: &'a syntax::Expr,
        selector: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let Some((from_root, mut path)) = self.flatten_path(value, ctx) else {
            return self.invalid_expr(span);
        };
        let Some(index) = self.eval_const_i32(selector, ctx.scope, ctx.location) else {
            return self.invalid_expr(span);
        };
        if let Some(last) = path.last_mut() {
            last.selects.push(index);
        }
        match self.lookup_hierarchical(ctx.scope, &path, from_root) {
            Some(found) if self.symbols[found].is_value() => {
                self.bind_symbol_reference(found, span, true)
            }
            _ => {
                self.sink.emit(errors::error_undeclared_identifier(
                    self.interner.resolve(path[0].name),
                    span,
                ));
                self.invalid_expr(span)
            }
        }
    }

    fn bind_range_select(
        &mut self,
        value: &'a syntax::Expr,
        kind: RangeSelectKind,
        left: &'a syntax::Expr,
        right: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let bound = self.bind_expression(value, ctx);
        let lhs = self.bind_expression(left, ctx);
        let rhs = self.bind_expression(right, ctx);
        let value_ty = self.exprs[bound].ty;
        if self.is_error_type(value_ty) {
            return self.invalid_expr(span);
        }

        let canonical = self.canonical(value_ty);
        let value_is_integral = self.is_integral(value_ty);
        let (elem_ty, is_unpacked) = match &self.types[canonical] {
            Type::UnpackedArray { elem, .. } => (*elem, true),
            Type::PackedArray { elem, .. } => (*elem, false),
            _ if value_is_integral => {
                let four_state = self.is_four_state(value_ty);
                (self.one_bit(four_state), false)
            }
            _ => {
                let rendered = self.type_to_string(value_ty);
                self.sink.emit(errors::error_bad_range(&rendered, span));
                return self.invalid_expr(span);
            }
        };

        // The result width must be a compile-time constant.
        let width = match kind {
            RangeSelectKind::Simple => {
                let l = self.expr_const_i32(lhs);
                let r = self.expr_const_i32(rhs);
                match (l, r) {
                    (Some(l), Some(r)) => {
                        let declared = self.array_range(value_ty);
                        if !declared.contains(l) || !declared.contains(r) {
                            let rendered = self.type_to_string(value_ty);
                            self.sink.emit(errors::error_bad_range(&rendered, span));
                            return self.invalid_expr(span);
                        }
                        l.abs_diff(r) + 1
                    }
                    _ => {
                        self.sink.emit(errors::error_expression_not_constant(span));
                        return self.invalid_expr(span);
                    }
                }
            }
            RangeSelectKind::IndexedUp | RangeSelectKind::IndexedDown => {
                match self.expr_const_i32(rhs) {
                    Some(w) if w > 0 => {
                        // When the base is also constant the whole slice
                        // can be validated now.
                        if let Some(base) = self.expr_const_i32(lhs) {
                            let declared = self.array_range(value_ty);
                            let (a, b) = if kind == RangeSelectKind::IndexedUp {
                                (base, base + w - 1)
                            } else {
                                (base - w + 1, base)
                            };
                            if !declared.contains(a) || !declared.contains(b) {
                                let rendered = self.type_to_string(value_ty);
                                self.sink.emit(errors::error_bad_range(&rendered, span));
                                return self.invalid_expr(span);
                            }
                        }
                        w as u32
                    }
                    _ => {
                        self.sink.emit(errors::error_expression_not_constant(span));
                        return self.invalid_expr(span);
                    }
                }
            }
        };

        let ty = if is_unpacked {
            self.unpacked_array_type(elem_ty, ConstantRange::new(width as i32 - 1, 0))
        } else {
            let elem_width = self.bit_width(elem_ty).max(1);
            let flags = IntegralFlags {
                signed: false,
                four_state: self.is_four_state(value_ty),
                reg: false,
            };
            self.vector_type(width * elem_width, flags)
        };
        self.alloc_expr(
            ExpressionKind::RangeSelect {
                value: bound,
                select_kind: kind,
                left: lhs,
                right: rhs,
            },
            ty,
            span,
            None,
        )
    }

    /// Quietly evaluates a bound expression to an `i32` when it is
    /// constant-foldable.
    pub(crate) fn expr_const_i32(&mut self, expr: ExprId) -> Option<i32> {
        if let Some(value) = &self.exprs[expr].constant {
            return value.integer().and_then(SvInt::as_i32);
        }
        let mut ctx = EvalContext::new(self.options.max_eval_steps, LookupLocation::MAX);
        let value = self.eval_expr(&mut ctx, expr);
        // Diagnostics are dropped: this is a silent fold attempt.
        value.integer().and_then(SvInt::as_i32)
    }

    // ---- aggregates ----

    fn bind_concat(
        &mut self,
        elements: &'a [syntax::Expr],
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let mut operands = Vec::new();
        let mut width = 0u32;
        let mut four_state = false;
        let mut any_string = false;
        for element in elements {
            let bound = self.bind_expression(element, ctx);
            let ty = self.exprs[bound].ty;
            if self.is_error_type(ty) {
                return self.invalid_expr(span);
            }
            if self.is_string_type(ty) {
                any_string = true;
            } else if self.is_integral(ty) {
                width += self.bit_width(ty);
                four_state |= self.is_four_state(ty);
            } else {
                let rendered = self.type_to_string(ty);
                self.sink.emit(errors::error_bad_unary(&rendered, element.span()));
                return self.invalid_expr(span);
            }
            operands.push(bound);
        }
        let ty = if any_string {
            self.builtins.string_type
        } else {
            let flags = IntegralFlags {
                signed: false,
                four_state,
                reg: false,
            };
            self.vector_type(width.max(1), flags)
        };
        self.alloc_expr(ExpressionKind::Concat { operands }, ty, span, None)
    }

    fn bind_replication(
        &mut self,
        count: &'a syntax::Expr,
        concat: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let count_bound = self.bind_expression(count, ctx);
        let concat_bound = self.bind_expression(concat, ctx);
        let concat_ty = self.exprs[concat_bound].ty;
        if self.is_error_type(concat_ty) {
            return self.invalid_expr(span);
        }

        let Some(n) = self.expr_const_i32(count_bound) else {
            self.sink.emit(errors::error_expression_not_constant(count.span()));
            return self.invalid_expr(span);
        };
        if n < 0 {
            self.sink.emit(errors::error_replication_count_invalid(
                &n.to_string(),
                count.span(),
            ));
            return self.invalid_expr(span);
        }

        let ty = if self.is_string_type(concat_ty) {
            self.builtins.string_type
        } else if n == 0 {
            self.builtins.void_type
        } else {
            let width = self.bit_width(concat_ty).max(1) * n as u32;
            let four_state = self.is_four_state(concat_ty);
            let flags = IntegralFlags {
                signed: false,
                four_state,
                reg: false,
            };
            self.vector_type(width, flags)
        };
        self.alloc_expr(
            ExpressionKind::Replication {
                count: count_bound,
                concat: concat_bound,
            },
            ty,
            span,
            None,
        )
    }

    // ---- calls ----

    fn bind_call(
        &mut self,
        target: &'a syntax::Expr,
        args: &'a [syntax::Expr],
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let subroutine = match target {
            syntax::Expr::Identifier { name, .. } => {
                self.lookup_unqualified(ctx.scope, *name, ctx.location)
            }
            syntax::Expr::Scoped { package, name, .. } => self
                .get_package(*package)
                .and_then(|pkg| self.lookup_in_scope(pkg, *name)),
            _ => None,
        };
        let Some(subroutine) = subroutine.filter(|&s| {
            matches!(self.symbols[s].kind, SymbolKind::Subroutine { .. })
        }) else {
            self.sink.emit(errors::error_not_callable(span));
            return self.invalid_expr(span);
        };

        let (formals, return_ty) = {
            let SymbolKind::Subroutine { args: formals, .. } = &self.symbols[subroutine].kind
            else {
                unreachable!("filtered to subroutines above");
            };
            (formals.clone(), self.subroutine_return_type(subroutine))
        };

        if args.len() != formals.len() {
            let name = self.symbols[subroutine]
                .name
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_default();
            self.sink.emit(errors::error_arg_count(
                &name,
                formals.len(),
                args.len(),
                span,
            ));
            return self.invalid_expr(span);
        }

        let mut bound_args = Vec::new();
        for (arg, &formal) in args.iter().zip(&formals) {
            let formal_ty = self.declared_type_of(formal);
            bound_args.push(self.bind_assignment_like(formal_ty, arg, ctx));
        }

        // Make sure the body is bound so the evaluator can run it.
        self.subroutine_body(subroutine);

        self.alloc_expr(
            ExpressionKind::Call {
                subroutine,
                args: bound_args,
            },
            return_ty,
            span,
            None,
        )
    }

    pub(crate) fn subroutine_return_type(&mut self, sub: SymbolId) -> TypeId {
        let SymbolKind::Subroutine { return_var, .. } = &self.symbols[sub].kind else {
            return self.builtins.error_type;
        };
        match return_var {
            Some(rv) => {
                let rv = *rv;
                self.declared_type_of(rv)
            }
            None => self.builtins.void_type,
        }
    }

    fn bind_system_call(
        &mut self,
        name: Ident,
        args: &'a [syntax::Expr],
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let text = self.interner.resolve(name).to_string();
        let function = match text.as_str() {
            "$clog2" => SystemFunction::Clog2,
            "$bits" => SystemFunction::Bits,
            _ => {
                self.sink.emit(errors::error_unknown_system_function(&text, span));
                return self.invalid_expr(span);
            }
        };
        if args.len() != 1 {
            self.sink.emit(errors::error_arg_count(&text, 1, args.len(), span));
            return self.invalid_expr(span);
        }

        // `$bits` accepts a bare type name as well as an expression.
        let type_arg = match &args[0] {
            syntax::Expr::Identifier { name, span } => self
                .lookup_unqualified(ctx.scope, *name, ctx.location)
                .filter(|&found| self.symbols[found].is_type())
                .map(|found| (found, *span)),
            syntax::Expr::Scoped {
                package,
                name,
                span,
            } => self
                .get_package(*package)
                .and_then(|pkg| self.lookup_in_scope(pkg, *name))
                .filter(|&found| self.symbols[found].is_type())
                .map(|found| (found, *span)),
            _ => None,
        };
        let arg = match type_arg {
            Some((found, arg_span)) if function == SystemFunction::Bits => {
                let ty = self.get_alias_type(found);
                self.alloc_expr(ExpressionKind::DataType, ty, arg_span, None)
            }
            _ => self.bind_expression(&args[0], ctx),
        };
        let int_ty = self.builtins.int_type;

        if function == SystemFunction::Bits {
            // $bits resolves at bind time for types and typed expressions.
            let target_ty = self.exprs[arg].ty;
            let width = self.bit_width(target_ty);
            if width > 0 {
                return self.alloc_expr(
                    ExpressionKind::SystemCall {
                        function,
                        args: vec![arg],
                    },
                    int_ty,
                    span,
                    Some(ConstantValue::Integer(SvInt::new(32, u64::from(width), true))),
                );
            }
        }

        self.alloc_expr(
            ExpressionKind::SystemCall {
                function,
                args: vec![arg],
            },
            int_ty,
            span,
            None,
        )
    }

    fn bind_cast(
        &mut self,
        target: &'a syntax::CastTarget,
        operand: &'a syntax::Expr,
        span: Span,
        ctx: &BindContext,
    ) -> ExprId {
        let bound = self.bind_expression(operand, ctx);
        let source_ty = self.exprs[bound].ty;
        if self.is_error_type(source_ty) {
            return self.invalid_expr(span);
        }

        let ty = match target {
            syntax::CastTarget::Type(ty_syntax) => {
                self.type_from_syntax(ty_syntax, ctx.scope, ctx.location, false)
            }
            syntax::CastTarget::Size(size) => {
                let Some(width) = self.eval_const_i32(size, ctx.scope, ctx.location) else {
                    self.sink.emit(errors::error_expression_not_constant(size.span()));
                    return self.invalid_expr(span);
                };
                if width <= 0 {
                    self.sink.emit(errors::error_invalid_dimension(size.span()));
                    return self.invalid_expr(span);
                }
                let flags = IntegralFlags {
                    signed: self.is_signed(source_ty),
                    four_state: self.is_four_state(source_ty),
                    reg: false,
                };
                self.vector_type(width as u32, flags)
            }
            syntax::CastTarget::Signing(signed) => {
                let flags = IntegralFlags {
                    signed: *signed,
                    four_state: self.is_four_state(source_ty),
                    reg: false,
                };
                let width = self.bit_width(source_ty).max(1);
                self.vector_type(width, flags)
            }
        };

        if !self.is_error_type(ty) && !self.is_cast_compatible(ty, source_ty) {
            let from = self.type_to_string(source_ty);
            let to = self.type_to_string(ty);
            self.sink
                .emit(errors::error_no_implicit_conversion(&from, &to, span));
            return self.invalid_expr(span);
        }
        self.wrap_conversion(bound, ty)
    }

    // ---- assignment patterns ----

    fn bind_pattern(
        &mut self,
        target: TypeId,
        expr: &'a syntax::Expr,
        ctx: &BindContext,
    ) -> ExprId {
        let syntax::Expr::AssignmentPattern {
            kind,
            ty: ty_prefix,
            items,
            span,
        } = expr
        else {
            return self.invalid_expr(expr.span());
        };

        let target = match ty_prefix {
            Some(prefix) => self.type_from_syntax(prefix, ctx.scope, ctx.location, false),
            None => target,
        };
        let canonical = self.canonical(target);

        // Figure out the element shapes the pattern must fill.
        enum Shape {
            Array { elem: TypeId, count: usize },
            Struct { fields: Vec<(Ident, TypeId)> },
            Integral,
        }
        let target_is_integral = self.is_integral(target);
        let shape = match &self.types[canonical] {
            Type::UnpackedArray { elem, range } => Shape::Array {
                elem: *elem,
                count: range.width() as usize,
            },
            Type::UnpackedStruct { fields, .. } | Type::PackedStruct { fields, .. } => {
                Shape::Struct {
                    fields: fields.iter().map(|f| (f.name, f.ty)).collect(),
                }
            }
            _ if target_is_integral => Shape::Integral,
            _ => {
                let rendered = self.type_to_string(target);
                self.sink
                    .emit(errors::error_no_implicit_conversion("pattern", &rendered, *span));
                return self.invalid_expr(*span);
            }
        };

        // Expand replication up front.
        let mut flat: Vec<&'a syntax::PatternItem> = Vec::new();
        match kind {
            syntax::PatternKind::Replicated(count) => {
                let Some(n) = self.eval_const_i32(count, ctx.scope, ctx.location) else {
                    self.sink
                        .emit(errors::error_expression_not_constant(count.span()));
                    return self.invalid_expr(*span);
                };
                for _ in 0..n.max(0) {
                    flat.extend(items.iter());
                }
            }
            _ => flat.extend(items.iter()),
        }

        let elements = match shape {
            Shape::Integral => {
                let mut operands = Vec::new();
                for item in &flat {
                    operands.push(self.bind_expression(&item.value, ctx));
                }
                let bound = self.alloc_expr(
                    ExpressionKind::Concat { operands },
                    target,
                    *span,
                    None,
                );
                return bound;
            }
            Shape::Array { elem, count } => {
                let has_keys = flat.iter().any(|i| i.key.is_some());
                if !has_keys {
                    if flat.len() != count {
                        let rendered = self.type_to_string(target);
                        self.sink.emit(errors::error_no_implicit_conversion(
                            "pattern",
                            &rendered,
                            *span,
                        ));
                        return self.invalid_expr(*span);
                    }
                    let mut out = Vec::new();
                    for item in &flat {
                        out.push(self.bind_assignment_like(elem, &item.value, ctx));
                    }
                    out
                } else {
                    self.bind_structured_array(elem, count, &flat, *span, ctx)
                }
            }
            Shape::Struct { fields } => {
                let has_keys = flat.iter().any(|i| i.key.is_some());
                if !has_keys {
                    if flat.len() != fields.len() {
                        let rendered = self.type_to_string(target);
                        self.sink.emit(errors::error_no_implicit_conversion(
                            "pattern",
                            &rendered,
                            *span,
                        ));
                        return self.invalid_expr(*span);
                    }
                    let mut out = Vec::new();
                    for (item, (_, field_ty)) in flat.iter().zip(&fields) {
                        out.push(self.bind_assignment_like(*field_ty, &item.value, ctx));
                    }
                    out
                } else {
                    self.bind_structured_struct(&fields, &flat, *span, ctx)
                }
            }
        };

        self.alloc_expr(ExpressionKind::AssignmentPattern { elements }, target, *span, None)
    }

    fn bind_structured_array(
        &mut self,
        elem: TypeId,
        count: usize,
        items: &[&'a syntax::PatternItem],
        span: Span,
        ctx: &BindContext,
    ) -> Vec<ExprId> {
        let mut slots: Vec<Option<ExprId>> = vec![None; count];
        let mut default_value: Option<&'a syntax::Expr> = None;
        for item in items {
            match &item.key {
                Some(syntax::PatternKey::Default) => default_value = Some(&item.value),
                Some(syntax::PatternKey::Expr(key)) => {
                    if let Some(index) = self.eval_const_i32(key, ctx.scope, ctx.location) {
                        if index >= 0 && (index as usize) < count {
                            let bound = self.bind_assignment_like(elem, &item.value, ctx);
                            slots[index as usize] = Some(bound);
                        } else {
                            self.sink.emit(errors::error_index_value_invalid(
                                &index.to_string(),
                                "assignment pattern",
                                key.span(),
                            ));
                        }
                    }
                }
                Some(syntax::PatternKey::Type(key_ty)) => {
                    // A type key on an array acts like a default for
                    // elements of that type.
                    let built = self.type_from_syntax(key_ty, ctx.scope, ctx.location, false);
                    if self.is_equivalent(built, elem) {
                        default_value = Some(&item.value);
                    }
                }
                None => {}
            }
        }
        let mut out = Vec::new();
        for slot in slots {
            match slot {
                Some(e) => out.push(e),
                None => match default_value {
                    Some(value) => out.push(self.bind_assignment_like(elem, value, ctx)),
                    None => {
                        self.sink.emit(errors::error_expression_not_constant(span));
                        out.push(self.invalid_expr(span));
                    }
                },
            }
        }
        out
    }

    fn bind_structured_struct(
        &mut self,
        fields: &[(Ident, TypeId)],
        items: &[&'a syntax::PatternItem],
        span: Span,
        ctx: &BindContext,
    ) -> Vec<ExprId> {
        let mut named: Vec<Option<&'a syntax::Expr>> = vec![None; fields.len()];
        let mut typed: Vec<(TypeId, &'a syntax::Expr)> = Vec::new();
        let mut default_value: Option<&'a syntax::Expr> = None;

        for item in items {
            match &item.key {
                Some(syntax::PatternKey::Default) => default_value = Some(&item.value),
                Some(syntax::PatternKey::Type(key_ty)) => {
                    let built = self.type_from_syntax(key_ty, ctx.scope, ctx.location, false);
                    typed.push((built, &item.value));
                }
                Some(syntax::PatternKey::Expr(key)) => {
                    if let syntax::Expr::Identifier { name, .. } = key {
                        if let Some(pos) = fields.iter().position(|(n, _)| n == name) {
                            named[pos] = Some(&item.value);
                            continue;
                        }
                    }
                    self.sink
                        .emit(errors::error_expression_not_constant(key.span()));
                }
                None => {}
            }
        }

        let mut out = Vec::new();
        for (i, (_, field_ty)) in fields.iter().enumerate() {
            if let Some(value) = named[i] {
                out.push(self.bind_assignment_like(*field_ty, value, ctx));
                continue;
            }
            // Later type keys win over earlier ones.
            let type_match = typed
                .iter()
                .rev()
                .find(|(ty, _)| self.is_matching(*ty, *field_ty) || {
                    let canonical_field = self.canonical(*field_ty);
                    let canonical_key = self.canonical(*ty);
                    canonical_field == canonical_key
                })
                .map(|(_, value)| *value);
            if let Some(value) = type_match {
                out.push(self.bind_assignment_like(*field_ty, value, ctx));
                continue;
            }
            match default_value {
                Some(value) => out.push(self.bind_assignment_like(*field_ty, value, ctx)),
                None => {
                    self.sink.emit(errors::error_expression_not_constant(span));
                    out.push(self.invalid_expr(span));
                }
            }
        }
        out
    }
}

fn unescape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
