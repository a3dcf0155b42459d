//! Pratt expression parsing.
//!
//! Operator precedence follows IEEE 1800 table 11-2, from implication at
//! the bottom up through power, with unary operators and postfix forms
//! (selects, member access, calls, casts, assignment patterns) binding
//! tightest. Nesting depth is bounded; exceeding the limit produces a
//! poison node.

use crate::ast::*;
use crate::errors;
use crate::parser::SvParser;
use crate::token::TokenKind;

/// Binding power of the conditional operator.
const COND_BP: u8 = 4;

/// Binding power of unary prefix operators.
const UNARY_BP: u8 = 27;

fn binary_binding_power(kind: TokenKind) -> Option<(BinaryOp, u8, u8)> {
    use TokenKind::*;
    let entry = match kind {
        Arrow => (BinaryOp::LogicalImplication, 2, 1),
        LeftRightArrow => (BinaryOp::LogicalEquivalence, 2, 1),
        DoublePipe => (BinaryOp::LogicalOr, 5, 6),
        DoubleAmpersand => (BinaryOp::LogicalAnd, 7, 8),
        Pipe => (BinaryOp::BinaryOr, 9, 10),
        Caret => (BinaryOp::BinaryXor, 11, 12),
        TildeCaret => (BinaryOp::BinaryXnor, 11, 12),
        Ampersand => (BinaryOp::BinaryAnd, 13, 14),
        DoubleEquals => (BinaryOp::Equality, 15, 16),
        BangEquals => (BinaryOp::Inequality, 15, 16),
        TripleEquals => (BinaryOp::CaseEquality, 15, 16),
        BangDoubleEquals => (BinaryOp::CaseInequality, 15, 16),
        WildcardEq => (BinaryOp::WildcardEquality, 15, 16),
        WildcardNeq => (BinaryOp::WildcardInequality, 15, 16),
        LessThan => (BinaryOp::LessThan, 17, 18),
        LessEquals => (BinaryOp::LessThanEqual, 17, 18),
        GreaterThan => (BinaryOp::GreaterThan, 17, 18),
        GreaterEquals => (BinaryOp::GreaterThanEqual, 17, 18),
        DoubleLess => (BinaryOp::LogicalShiftLeft, 19, 20),
        DoubleGreater => (BinaryOp::LogicalShiftRight, 19, 20),
        TripleLess => (BinaryOp::ArithmeticShiftLeft, 19, 20),
        TripleGreater => (BinaryOp::ArithmeticShiftRight, 19, 20),
        Plus => (BinaryOp::Add, 21, 22),
        Minus => (BinaryOp::Subtract, 21, 22),
        Star => (BinaryOp::Multiply, 23, 24),
        Slash => (BinaryOp::Divide, 23, 24),
        Percent => (BinaryOp::Mod, 23, 24),
        DoubleStar => (BinaryOp::Power, 26, 25),
        _ => return None,
    };
    Some(entry)
}

pub(crate) fn compound_assign_op(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    let op = match kind {
        PlusEquals => BinaryOp::Add,
        MinusEquals => BinaryOp::Subtract,
        StarEquals => BinaryOp::Multiply,
        SlashEquals => BinaryOp::Divide,
        PercentEquals => BinaryOp::Mod,
        AmpersandEquals => BinaryOp::BinaryAnd,
        PipeEquals => BinaryOp::BinaryOr,
        CaretEquals => BinaryOp::BinaryXor,
        DoubleLessEquals => BinaryOp::LogicalShiftLeft,
        DoubleGreaterEquals => BinaryOp::LogicalShiftRight,
        TripleLessEquals => BinaryOp::ArithmeticShiftLeft,
        TripleGreaterEquals => BinaryOp::ArithmeticShiftRight,
        _ => return None,
    };
    Some(op)
}

impl<'a> SvParser<'a> {
    /// Parses an expression (no top-level assignment).
    pub(crate) fn parse_expression(&mut self) -> Expr {
        self.parse_subexpr(0)
    }

    /// Parses an expression that may be a blocking or compound assignment,
    /// as used in for-loop steps and statement position.
    pub(crate) fn parse_assignment_or_expr(&mut self) -> Expr {
        let target = self.parse_expression();
        let op = if self.at(TokenKind::Equals) {
            self.bump();
            None
        } else if let Some(op) = compound_assign_op(self.kind()) {
            self.bump();
            Some(op)
        } else {
            return target;
        };
        let value = self.parse_expression();
        let span = target.span().merge(value.span());
        Expr::Assignment {
            op,
            nonblocking: false,
            target: Box::new(target),
            value: Box::new(value),
            span,
        }
    }

    /// Parses an assignment target in statement position: binds tighter
    /// than the relational operators so a following `<=` reads as a
    /// nonblocking assignment, not a comparison.
    pub(crate) fn parse_stmt_target(&mut self) -> Expr {
        self.parse_subexpr(18)
    }

    fn parse_subexpr(&mut self, min_bp: u8) -> Expr {
        if self.depth >= self.max_depth {
            let here = self.peek().report_span();
            self.sink.emit(errors::error_too_deep(here));
            self.bump();
            return Expr::Error { span: here };
        }
        self.depth += 1;
        let result = self.parse_subexpr_inner(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_subexpr_inner(&mut self, min_bp: u8) -> Expr {
        let mut lhs = self.parse_prefix();

        loop {
            lhs = match self.kind() {
                // Postfix forms always bind.
                TokenKind::LeftBracket => self.parse_select(lhs),
                TokenKind::Dot => {
                    self.bump();
                    let (name, name_span) = self.ident();
                    let span = lhs.span().merge(name_span);
                    Expr::Member {
                        value: Box::new(lhs),
                        name,
                        name_span,
                        span,
                    }
                }
                TokenKind::LeftParen => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expression());
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let close = self.expect(TokenKind::RightParen, ")");
                    let span = lhs.span().merge(close.span);
                    Expr::Call {
                        target: Box::new(lhs),
                        args,
                        span,
                    }
                }
                TokenKind::Tick if self.kind_at(1) == TokenKind::LeftParen => {
                    self.bump(); // '
                    self.bump(); // (
                    let operand = self.parse_expression();
                    let close = self.expect(TokenKind::RightParen, ")");
                    let span = lhs.span().merge(close.span);
                    let target = match lhs {
                        Expr::Identifier { name, span } => CastTarget::Type(Box::new(
                            DataType::Named {
                                package: None,
                                name,
                                name_span: span,
                                dims: vec![],
                                span,
                            },
                        )),
                        Expr::Scoped {
                            package,
                            name,
                            span,
                        } => CastTarget::Type(Box::new(DataType::Named {
                            package: Some(package),
                            name,
                            name_span: span,
                            dims: vec![],
                            span,
                        })),
                        other => CastTarget::Size(Box::new(other)),
                    };
                    Expr::Cast {
                        target,
                        operand: Box::new(operand),
                        span,
                    }
                }
                TokenKind::ApostropheBrace => {
                    // `type_t'{...}` is a typed assignment pattern.
                    let ty = match &lhs {
                        Expr::Identifier { name, span } => Some(Box::new(DataType::Named {
                            package: None,
                            name: *name,
                            name_span: *span,
                            dims: vec![],
                            span: *span,
                        })),
                        _ => None,
                    };
                    if ty.is_none() {
                        break;
                    }
                    self.bump();
                    self.parse_assignment_pattern(ty, lhs.span())
                }
                TokenKind::PlusPlus => {
                    let tok = self.bump();
                    let span = lhs.span().merge(tok.span);
                    Expr::Unary {
                        op: UnaryOp::Postincrement,
                        operand: Box::new(lhs),
                        span,
                    }
                }
                TokenKind::MinusMinus => {
                    let tok = self.bump();
                    let span = lhs.span().merge(tok.span);
                    Expr::Unary {
                        op: UnaryOp::Postdecrement,
                        operand: Box::new(lhs),
                        span,
                    }
                }
                TokenKind::Question => {
                    if COND_BP < min_bp {
                        break;
                    }
                    self.bump();
                    let if_true = self.parse_subexpr(0);
                    self.expect(TokenKind::Colon, ":");
                    let if_false = self.parse_subexpr(COND_BP - 1);
                    let span = lhs.span().merge(if_false.span());
                    Expr::Conditional {
                        pred: Box::new(lhs),
                        if_true: Box::new(if_true),
                        if_false: Box::new(if_false),
                        span,
                    }
                }
                kind => {
                    let Some((op, l_bp, r_bp)) = binary_binding_power(kind) else {
                        break;
                    };
                    if l_bp < min_bp {
                        break;
                    }
                    self.bump();
                    let rhs = self.parse_subexpr(r_bp);
                    let span = lhs.span().merge(rhs.span());
                    Expr::Binary {
                        op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                        span,
                    }
                }
            };
        }
        lhs
    }

    fn parse_select(&mut self, value: Expr) -> Expr {
        self.bump(); // [
        let first = self.parse_expression();
        let result = match self.kind() {
            TokenKind::Colon => {
                self.bump();
                let right = self.parse_expression();
                let close = self.expect(TokenKind::RightBracket, "]");
                let span = value.span().merge(close.span);
                Expr::RangeSelect {
                    value: Box::new(value),
                    kind: RangeSelectKind::Simple,
                    left: Box::new(first),
                    right: Box::new(right),
                    span,
                }
            }
            TokenKind::PlusColon | TokenKind::MinusColon => {
                let kind = if self.bump().kind == TokenKind::PlusColon {
                    RangeSelectKind::IndexedUp
                } else {
                    RangeSelectKind::IndexedDown
                };
                let right = self.parse_expression();
                let close = self.expect(TokenKind::RightBracket, "]");
                let span = value.span().merge(close.span);
                Expr::RangeSelect {
                    value: Box::new(value),
                    kind,
                    left: Box::new(first),
                    right: Box::new(right),
                    span,
                }
            }
            _ => {
                let close = self.expect(TokenKind::RightBracket, "]");
                let span = value.span().merge(close.span);
                Expr::ElementSelect {
                    value: Box::new(value),
                    selector: Box::new(first),
                    span,
                }
            }
        };
        result
    }

    fn parse_prefix(&mut self) -> Expr {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntLiteral => {
                self.bump();
                Expr::Literal { span: tok.span }
            }
            TokenKind::SizedLiteral => {
                self.bump();
                Expr::SizedLiteral { span: tok.span }
            }
            TokenKind::UnbasedUnsizedLiteral => {
                self.bump();
                Expr::UnbasedUnsized { span: tok.span }
            }
            TokenKind::RealLiteral => {
                self.bump();
                Expr::RealLiteral { span: tok.span }
            }
            TokenKind::TimeLiteral => {
                self.bump();
                Expr::TimeLiteral { span: tok.span }
            }
            TokenKind::StringLiteral => {
                self.bump();
                Expr::StringLiteral { span: tok.span }
            }
            TokenKind::Null => {
                self.bump();
                Expr::Null { span: tok.span }
            }
            TokenKind::Identifier | TokenKind::EscapedIdentifier => {
                let first = self.bump();
                if self.at(TokenKind::ColonColon) {
                    self.bump();
                    let (name, name_span) = self.ident();
                    Expr::Scoped {
                        package: self.intern_tok(first),
                        name,
                        span: first.span.merge(name_span),
                    }
                } else {
                    Expr::Identifier {
                        name: self.intern_tok(first),
                        span: first.span,
                    }
                }
            }
            TokenKind::SystemIdentifier => {
                let name_tok = self.bump();
                if self.text(name_tok) == "$root" {
                    return Expr::Root {
                        span: name_tok.span,
                    };
                }
                let name = self.intern_tok(name_tok);
                let mut args = Vec::new();
                let mut span = name_tok.span;
                if self.eat(TokenKind::LeftParen).is_some() {
                    if !self.at(TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expression());
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    let close = self.expect(TokenKind::RightParen, ")");
                    span = span.merge(close.span);
                }
                Expr::SystemCall { name, args, span }
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Ampersand
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::TildeAmpersand
            | TokenKind::TildePipe
            | TokenKind::TildeCaret
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let op = match tok.kind {
                    TokenKind::Plus => UnaryOp::Plus,
                    TokenKind::Minus => UnaryOp::Minus,
                    TokenKind::Bang => UnaryOp::LogicalNot,
                    TokenKind::Tilde => UnaryOp::BitwiseNot,
                    TokenKind::Ampersand => UnaryOp::ReductionAnd,
                    TokenKind::Pipe => UnaryOp::ReductionOr,
                    TokenKind::Caret => UnaryOp::ReductionXor,
                    TokenKind::TildeAmpersand => UnaryOp::ReductionNand,
                    TokenKind::TildePipe => UnaryOp::ReductionNor,
                    TokenKind::TildeCaret => UnaryOp::ReductionXnor,
                    TokenKind::PlusPlus => UnaryOp::Preincrement,
                    _ => UnaryOp::Predecrement,
                };
                self.bump();
                let operand = self.parse_subexpr(UNARY_BP);
                let span = tok.span.merge(operand.span());
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    span,
                }
            }
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.parse_expression();
                let close = self.expect(TokenKind::RightParen, ")");
                Expr::Paren {
                    inner: Box::new(inner),
                    span: tok.span.merge(close.span),
                }
            }
            TokenKind::LeftBrace => self.parse_concat_or_replication(),
            TokenKind::ApostropheBrace => {
                self.bump();
                self.parse_assignment_pattern(None, tok.span)
            }
            TokenKind::Signed | TokenKind::Unsigned => {
                let signed = self.bump().kind == TokenKind::Signed;
                self.expect(TokenKind::Tick, "'");
                self.expect(TokenKind::LeftParen, "(");
                let operand = self.parse_expression();
                let close = self.expect(TokenKind::RightParen, ")");
                Expr::Cast {
                    target: CastTarget::Signing(signed),
                    operand: Box::new(operand),
                    span: tok.span.merge(close.span),
                }
            }
            kind if kind.is_data_type_start() => {
                let ty = self.parse_data_type();
                let ty_span = ty.span();
                if self.at(TokenKind::Tick) && self.kind_at(1) == TokenKind::LeftParen {
                    self.bump();
                    self.bump();
                    let operand = self.parse_expression();
                    let close = self.expect(TokenKind::RightParen, ")");
                    Expr::Cast {
                        target: CastTarget::Type(Box::new(ty)),
                        operand: Box::new(operand),
                        span: ty_span.merge(close.span),
                    }
                } else if self.at(TokenKind::ApostropheBrace) {
                    self.bump();
                    self.parse_assignment_pattern(Some(Box::new(ty)), ty_span)
                } else {
                    Expr::DataTypeExpr {
                        ty: Box::new(ty),
                        span: ty_span,
                    }
                }
            }
            _ => {
                let here = tok.report_span();
                self.sink.emit(errors::error_expected_expression(here));
                // Consume the offending token unless it's a likely
                // synchronization point for the caller.
                if !matches!(
                    tok.kind,
                    TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::RightParen
                        | TokenKind::RightBracket
                        | TokenKind::RightBrace
                        | TokenKind::Eof
                        | TokenKind::End
                        | TokenKind::Endmodule
                        | TokenKind::Endcase
                        | TokenKind::Endfunction
                ) {
                    self.bump();
                }
                Expr::Error { span: here }
            }
        }
    }

    fn parse_concat_or_replication(&mut self) -> Expr {
        let open = self.bump(); // {
        if self.at(TokenKind::RightBrace) {
            let close = self.bump();
            let span = open.span.merge(close.span);
            self.sink.emit(errors::error_expected_expression(span));
            return Expr::Error { span };
        }
        let first = self.parse_expression();
        if self.at(TokenKind::LeftBrace) {
            // `{count {a, b}}`
            let inner = self.parse_concat_or_replication();
            let close = self.expect(TokenKind::RightBrace, "}");
            return Expr::Replication {
                count: Box::new(first),
                concat: Box::new(inner),
                span: open.span.merge(close.span),
            };
        }
        let mut elements = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            elements.push(self.parse_expression());
        }
        let close = self.expect(TokenKind::RightBrace, "}");
        Expr::Concat {
            elements,
            span: open.span.merge(close.span),
        }
    }

    /// Parses the items of an assignment pattern; the `'{` has been
    /// consumed.
    fn parse_assignment_pattern(&mut self, ty: Option<Box<DataType>>, start: veris_source::Span) -> Expr {
        // Structured patterns start with `default:`, a type key, or an
        // expression followed by `:`. Replicated patterns start with an
        // expression followed by `{`.
        let structured_start =
            self.at(TokenKind::Default) || self.kind().is_data_type_start();

        if !structured_start {
            let first = self.parse_expression();
            if self.at(TokenKind::LeftBrace) {
                // `'{N {a, b}}`
                self.bump();
                let mut items = Vec::new();
                if !self.at(TokenKind::RightBrace) {
                    loop {
                        items.push(PatternItem {
                            key: None,
                            value: self.parse_expression(),
                        });
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightBrace, "}");
                let close = self.expect(TokenKind::RightBrace, "}");
                return Expr::AssignmentPattern {
                    kind: PatternKind::Replicated(Box::new(first)),
                    ty,
                    items,
                    span: start.merge(close.span),
                };
            }
            if self.at(TokenKind::Colon) {
                self.bump();
                let value = self.parse_expression();
                let mut items = vec![PatternItem {
                    key: Some(PatternKey::Expr(first)),
                    value,
                }];
                while self.eat(TokenKind::Comma).is_some() {
                    items.push(self.parse_pattern_keyed_item());
                }
                let close = self.expect(TokenKind::RightBrace, "}");
                return Expr::AssignmentPattern {
                    kind: PatternKind::Structured,
                    ty,
                    items,
                    span: start.merge(close.span),
                };
            }
            // Simple positional pattern.
            let mut items = vec![PatternItem {
                key: None,
                value: first,
            }];
            while self.eat(TokenKind::Comma).is_some() {
                items.push(PatternItem {
                    key: None,
                    value: self.parse_expression(),
                });
            }
            let close = self.expect(TokenKind::RightBrace, "}");
            return Expr::AssignmentPattern {
                kind: PatternKind::Simple,
                ty,
                items,
                span: start.merge(close.span),
            };
        }

        let mut items = vec![self.parse_pattern_keyed_item()];
        while self.eat(TokenKind::Comma).is_some() {
            items.push(self.parse_pattern_keyed_item());
        }
        let close = self.expect(TokenKind::RightBrace, "}");
        Expr::AssignmentPattern {
            kind: PatternKind::Structured,
            ty,
            items,
            span: start.merge(close.span),
        }
    }

    fn parse_pattern_keyed_item(&mut self) -> PatternItem {
        let key = if self.eat(TokenKind::Default).is_some() {
            PatternKey::Default
        } else if self.kind().is_data_type_start() {
            PatternKey::Type(self.parse_data_type())
        } else {
            PatternKey::Expr(self.parse_expression())
        };
        self.expect(TokenKind::Colon, ":");
        let value = self.parse_expression();
        PatternItem {
            key: Some(key),
            value,
        }
    }
}
