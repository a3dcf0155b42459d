//! Statement parsing.
//!
//! Covers the statement forms the front-end elaborates inside constant
//! functions (blocks, declarations, assignments, if/case, loops, return)
//! plus the timing controls that show up in procedural blocks, which are
//! parsed for tooling but never elaborated.

use crate::ast::*;
use crate::errors;
use crate::parser::SvParser;
use crate::token::TokenKind;

impl<'a> SvParser<'a> {
    /// Parses one statement.
    pub(crate) fn parse_statement(&mut self) -> Stmt {
        if self.depth >= self.max_depth {
            let here = self.peek().report_span();
            self.sink.emit(errors::error_too_deep(here));
            self.bump();
            return Stmt::Error { span: here };
        }
        self.depth += 1;
        let result = self.parse_statement_inner();
        self.depth -= 1;
        result
    }

    fn parse_statement_inner(&mut self) -> Stmt {
        // `unique`/`priority` qualifiers are accepted and dropped.
        if matches!(self.kind(), TokenKind::Unique | TokenKind::Priority)
            && matches!(
                self.kind_at(1),
                TokenKind::If | TokenKind::Case | TokenKind::Casex | TokenKind::Casez
            )
        {
            self.bump();
        }

        match self.kind() {
            TokenKind::Begin => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::Case | TokenKind::Casex | TokenKind::Casez => self.parse_case(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => {
                let start = self.bump().span;
                self.expect(TokenKind::LeftParen, "(");
                let cond = self.parse_expression();
                self.expect(TokenKind::RightParen, ")");
                let body = Box::new(self.parse_statement());
                Stmt::While {
                    cond,
                    body,
                    span: self.span_from(start),
                }
            }
            TokenKind::Repeat => {
                let start = self.bump().span;
                self.expect(TokenKind::LeftParen, "(");
                let count = self.parse_expression();
                self.expect(TokenKind::RightParen, ")");
                let body = Box::new(self.parse_statement());
                Stmt::Repeat {
                    count,
                    body,
                    span: self.span_from(start),
                }
            }
            TokenKind::Forever => {
                let start = self.bump().span;
                let body = Box::new(self.parse_statement());
                Stmt::Forever {
                    body,
                    span: self.span_from(start),
                }
            }
            TokenKind::Return => {
                let start = self.bump().span;
                let expr = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect(TokenKind::Semicolon, ";");
                Stmt::Return {
                    expr,
                    span: self.span_from(start),
                }
            }
            TokenKind::Break => {
                let start = self.bump().span;
                self.expect(TokenKind::Semicolon, ";");
                Stmt::Break {
                    span: self.span_from(start),
                }
            }
            TokenKind::Continue => {
                let start = self.bump().span;
                self.expect(TokenKind::Semicolon, ";");
                Stmt::Continue {
                    span: self.span_from(start),
                }
            }
            TokenKind::At => self.parse_event_control(),
            TokenKind::Hash => {
                // A delay control: `#10 stmt`. The delay is parsed and kept
                // only as a span.
                let start = self.bump().span;
                let delay = self.parse_expression();
                let sensitivity_span = start.merge(delay.span());
                let body = Box::new(self.parse_statement());
                Stmt::EventControl {
                    sensitivity_span,
                    body,
                    span: self.span_from(start),
                }
            }
            TokenKind::Semicolon => {
                let span = self.bump().span;
                Stmt::Null { span }
            }
            TokenKind::Const | TokenKind::Var => {
                Stmt::VarDecl(self.parse_stmt_data_decl())
            }
            kind if kind.is_data_type_start() => Stmt::VarDecl(self.parse_stmt_data_decl()),
            TokenKind::Identifier
                if self.kind_at(1) == TokenKind::Identifier
                    || (self.kind_at(1) == TokenKind::ColonColon
                        && self.kind_at(3) == TokenKind::Identifier) =>
            {
                Stmt::VarDecl(self.parse_stmt_data_decl())
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_stmt_data_decl(&mut self) -> DataDecl {
        let start = self.peek().span;
        let is_const = self.eat(TokenKind::Const).is_some();
        self.eat(TokenKind::Var);
        let ty = self.parse_optional_data_type();
        let declarators = self.parse_declarator_list();
        self.expect(TokenKind::Semicolon, ";");
        DataDecl {
            is_const,
            ty,
            declarators,
            span: self.span_from(start),
        }
    }

    fn parse_block(&mut self) -> Stmt {
        let start = self.bump().span; // begin
        let mut label = None;
        if self.eat(TokenKind::Colon).is_some() {
            label = Some(self.ident().0);
        }
        let mut items = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::Eof) {
            items.push(self.parse_statement());
        }
        self.expect(TokenKind::End, "end");
        if self.eat(TokenKind::Colon).is_some() {
            self.ident();
        }
        Stmt::Block {
            label,
            items,
            span: self.span_from(start),
        }
    }

    fn parse_if(&mut self) -> Stmt {
        let start = self.bump().span; // if
        self.expect(TokenKind::LeftParen, "(");
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen, ")");
        let then_stmt = Box::new(self.parse_statement());
        let mut else_stmt = None;
        if self.eat(TokenKind::Else).is_some() {
            else_stmt = Some(Box::new(self.parse_statement()));
        }
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
            span: self.span_from(start),
        }
    }

    fn parse_case(&mut self) -> Stmt {
        let start_tok = self.bump();
        let kind = match start_tok.kind {
            TokenKind::Casex => CaseKind::DontCareXZ,
            TokenKind::Casez => CaseKind::DontCareZ,
            _ => CaseKind::Normal,
        };
        self.expect(TokenKind::LeftParen, "(");
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen, ")");
        let mut items = Vec::new();
        while !self.at(TokenKind::Endcase) && !self.at(TokenKind::Eof) {
            let item_start = self.peek().span;
            let mut expressions = Vec::new();
            if self.eat(TokenKind::Default).is_none() {
                loop {
                    expressions.push(self.parse_expression());
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::Colon, ":");
            let body = self.parse_statement();
            items.push(CaseItem {
                expressions,
                body,
                span: self.span_from(item_start),
            });
        }
        self.expect(TokenKind::Endcase, "endcase");
        Stmt::Case {
            kind,
            cond,
            items,
            span: self.span_from(start_tok.span),
        }
    }

    fn parse_for(&mut self) -> Stmt {
        let start = self.bump().span; // for
        self.expect(TokenKind::LeftParen, "(");

        let mut inits = Vec::new();
        if !self.at(TokenKind::Semicolon) {
            loop {
                if self.kind().is_data_type_start()
                    || (self.at(TokenKind::Identifier) && self.kind_at(1) == TokenKind::Identifier)
                {
                    let init_start = self.peek().span;
                    let ty = self.parse_data_type();
                    let (name, name_span) = self.ident();
                    self.expect(TokenKind::Equals, "=");
                    let init = self.parse_expression();
                    inits.push(ForInit::Decl {
                        ty,
                        name,
                        name_span,
                        init,
                        span: self.span_from(init_start),
                    });
                } else {
                    inits.push(ForInit::Assign(self.parse_assignment_or_expr()));
                }
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::Semicolon, ";");

        let stop = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression())
        };
        self.expect(TokenKind::Semicolon, ";");

        let mut steps = Vec::new();
        if !self.at(TokenKind::RightParen) {
            loop {
                steps.push(self.parse_assignment_or_expr());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, ")");

        let body = Box::new(self.parse_statement());
        Stmt::For {
            inits,
            stop,
            steps,
            body,
            span: self.span_from(start),
        }
    }

    fn parse_event_control(&mut self) -> Stmt {
        let start = self.bump().span; // @
        let sensitivity_span;
        if self.at(TokenKind::LeftParen) {
            let open = self.bump().span;
            let mut depth = 1usize;
            let mut end = open;
            while depth > 0 && !self.at(TokenKind::Eof) {
                let tok = self.bump();
                match tok.kind {
                    TokenKind::LeftParen => depth += 1,
                    TokenKind::RightParen => depth -= 1,
                    _ => {}
                }
                end = tok.span;
            }
            sensitivity_span = start.merge(end);
        } else {
            // `@*` or a single event name.
            let tok = self.bump();
            sensitivity_span = start.merge(tok.span);
        }
        let body = Box::new(self.parse_statement());
        Stmt::EventControl {
            sensitivity_span,
            body,
            span: self.span_from(start),
        }
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        let start = self.peek().span;
        let target = self.parse_stmt_target();
        let expr = match self.kind() {
            TokenKind::Equals => {
                self.bump();
                let value = self.parse_expression();
                let span = target.span().merge(value.span());
                Expr::Assignment {
                    op: None,
                    nonblocking: false,
                    target: Box::new(target),
                    value: Box::new(value),
                    span,
                }
            }
            TokenKind::LessEquals => {
                self.bump();
                let value = self.parse_expression();
                let span = target.span().merge(value.span());
                Expr::Assignment {
                    op: None,
                    nonblocking: true,
                    target: Box::new(target),
                    value: Box::new(value),
                    span,
                }
            }
            kind => match crate::expr::compound_assign_op(kind) {
                Some(op) => {
                    self.bump();
                    let value = self.parse_expression();
                    let span = target.span().merge(value.span());
                    Expr::Assignment {
                        op: Some(op),
                        nonblocking: false,
                        target: Box::new(target),
                        value: Box::new(value),
                        span,
                    }
                }
                None => target,
            },
        };
        self.expect(TokenKind::Semicolon, ";");
        Stmt::ExprStmt {
            expr,
            span: self.span_from(start),
        }
    }
}
