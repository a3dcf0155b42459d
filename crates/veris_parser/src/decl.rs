//! Parsing of declarations and module items.

use crate::ast::*;
use crate::errors;
use crate::parser::SvParser;
use crate::token::TokenKind;

impl<'a> SvParser<'a> {
    /// Parses one item inside a module, interface, package, or generate
    /// block.
    pub(crate) fn parse_module_item(&mut self) -> ModuleItem {
        match self.kind() {
            TokenKind::Import => ModuleItem::Import(self.parse_import()),
            TokenKind::Parameter | TokenKind::Localparam => self.parse_parameter_item(),
            TokenKind::Typedef => self.parse_typedef_item(),
            TokenKind::Genvar => self.parse_genvar_item(),
            TokenKind::Assign => self.parse_continuous_assign(),
            TokenKind::Function | TokenKind::Task => {
                ModuleItem::Subroutine(self.parse_subroutine())
            }
            TokenKind::Modport => self.parse_modport_item(),
            TokenKind::Generate => {
                let start = self.bump().span;
                let mut items = Vec::new();
                while !self.at(TokenKind::Endgenerate) && !self.at(TokenKind::Eof) {
                    items.push(self.parse_module_item());
                }
                self.expect(TokenKind::Endgenerate, "endgenerate");
                ModuleItem::GenerateRegion(items, self.span_from(start))
            }
            TokenKind::If => self.parse_if_generate(),
            TokenKind::Case => self.parse_case_generate(),
            TokenKind::For => self.parse_loop_generate(),
            TokenKind::Always
            | TokenKind::AlwaysComb
            | TokenKind::AlwaysFf
            | TokenKind::AlwaysLatch
            | TokenKind::Initial
            | TokenKind::Final => self.parse_procedural_block(),
            TokenKind::Timeunit | TokenKind::Timeprecision => {
                ModuleItem::TimeUnits(self.parse_time_units())
            }
            TokenKind::Semicolon => {
                let span = self.bump().span;
                ModuleItem::Empty(span)
            }
            kind if kind.is_direction() => self.parse_port_declaration(),
            kind if kind.is_net_type() => self.parse_net_declaration(),
            TokenKind::Const | TokenKind::Var => self.parse_data_declaration(),
            kind if kind.is_data_type_start() => self.parse_data_declaration(),
            TokenKind::Identifier => self.parse_identifier_led_item(),
            _ => {
                let here = self.peek().report_span();
                self.sink.emit(errors::error_expected_member(here));
                let start = self.peek().span;
                self.recover_to_semi();
                ModuleItem::Error(self.span_from(start))
            }
        }
    }

    /// An item starting with an identifier is an instantiation or a
    /// variable declaration with a user-defined type.
    fn parse_identifier_led_item(&mut self) -> ModuleItem {
        let next = self.kind_at(1);
        if next == TokenKind::Hash {
            return ModuleItem::Instantiation(self.parse_instantiation());
        }
        if next == TokenKind::Identifier {
            // `Foo u1 (` is an instantiation, possibly with an array:
            // `Foo u1 [3:0] (`.
            let after = if self.kind_at(2) == TokenKind::LeftBracket {
                self.scan_past_brackets(2).map(|n| self.kind_at(n))
            } else {
                Some(self.kind_at(2))
            };
            if after == Some(TokenKind::LeftParen) {
                return ModuleItem::Instantiation(self.parse_instantiation());
            }
            return self.parse_data_declaration();
        }
        if next == TokenKind::ColonColon {
            return self.parse_data_declaration();
        }
        let here = self.peek().report_span();
        self.sink.emit(errors::error_expected_member(here));
        let start = self.peek().span;
        self.recover_to_semi();
        ModuleItem::Error(self.span_from(start))
    }

    fn parse_parameter_item(&mut self) -> ModuleItem {
        let start = self.peek().span;
        let is_local = self.bump().kind == TokenKind::Localparam;
        let is_type = self.eat(TokenKind::Type).is_some();
        let ty = if is_type {
            DataType::Implicit {
                signed: false,
                dims: vec![],
                span: self.peek().span,
            }
        } else {
            self.parse_optional_data_type()
        };
        let mut declarators = Vec::new();
        loop {
            declarators.push(self.parse_declarator(is_type));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Parameter(ParamDecl {
            is_local,
            is_type,
            ty,
            declarators,
            span: self.span_from(start),
        })
    }

    fn parse_typedef_item(&mut self) -> ModuleItem {
        let start = self.bump().span; // typedef

        // Forward typedefs: `typedef struct name;` and friends.
        let category = match self.kind() {
            TokenKind::Enum => Some(ForwardTypedefCategory::Enum),
            TokenKind::Struct => Some(ForwardTypedefCategory::Struct),
            TokenKind::Union => Some(ForwardTypedefCategory::Union),
            TokenKind::Identifier if self.kind_at(1) == TokenKind::Semicolon => {
                let (name, name_span) = self.ident();
                self.bump(); // ;
                return ModuleItem::ForwardTypedef {
                    category: ForwardTypedefCategory::None,
                    name,
                    name_span,
                    span: self.span_from(start),
                };
            }
            _ => None,
        };
        if let Some(category) = category {
            if self.kind_at(1) == TokenKind::Identifier && self.kind_at(2) == TokenKind::Semicolon
            {
                self.bump(); // the category keyword
                let (name, name_span) = self.ident();
                self.bump(); // ;
                return ModuleItem::ForwardTypedef {
                    category,
                    name,
                    name_span,
                    span: self.span_from(start),
                };
            }
        }

        let ty = self.parse_data_type();
        let (name, name_span) = self.ident();
        let dims = self.parse_unpacked_dims();
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Typedef(TypedefDecl {
            ty,
            name,
            name_span,
            dims,
            span: self.span_from(start),
        })
    }

    fn parse_genvar_item(&mut self) -> ModuleItem {
        let start = self.bump().span;
        let mut names = Vec::new();
        loop {
            let (name, span) = self.ident();
            names.push((name, span));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Genvar {
            names,
            span: self.span_from(start),
        }
    }

    fn parse_continuous_assign(&mut self) -> ModuleItem {
        let start = self.bump().span; // assign
        let mut assignments = Vec::new();
        loop {
            let target = self.parse_expression();
            let target_span = target.span();
            self.expect(TokenKind::Equals, "=");
            let value = self.parse_expression();
            let span = target_span.merge(value.span());
            assignments.push(Expr::Assignment {
                op: None,
                nonblocking: false,
                target: Box::new(target),
                value: Box::new(value),
                span,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::ContinuousAssign {
            assignments,
            span: self.span_from(start),
        }
    }

    fn parse_port_declaration(&mut self) -> ModuleItem {
        let start = self.peek().span;
        let direction = match self.bump().kind {
            TokenKind::Input => Direction::Input,
            TokenKind::Output => Direction::Output,
            TokenKind::Inout => Direction::InOut,
            _ => Direction::Ref,
        };
        let mut net = None;
        let mut is_var = false;
        if self.kind().is_net_type() {
            let tok = self.bump();
            net = NetKind::from_text(self.text(tok));
        } else if self.at(TokenKind::Var) {
            self.bump();
            is_var = true;
        }
        let ty = self.parse_optional_data_type();
        let declarators = self.parse_declarator_list();
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::PortDecl {
            direction,
            net,
            is_var,
            ty,
            declarators,
            span: self.span_from(start),
        }
    }

    fn parse_net_declaration(&mut self) -> ModuleItem {
        let start = self.peek().span;
        let tok = self.bump();
        let net_kind = NetKind::from_text(self.text(tok)).unwrap_or(NetKind::Wire);
        let ty = self.parse_optional_data_type();
        let declarators = self.parse_declarator_list();
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Net(NetDecl {
            net_kind,
            ty,
            declarators,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_data_declaration(&mut self) -> ModuleItem {
        let start = self.peek().span;
        let is_const = self.eat(TokenKind::Const).is_some();
        self.eat(TokenKind::Var);
        let ty = self.parse_optional_data_type();
        let declarators = self.parse_declarator_list();
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Data(DataDecl {
            is_const,
            ty,
            declarators,
            span: self.span_from(start),
        })
    }

    fn parse_procedural_block(&mut self) -> ModuleItem {
        let start_tok = self.bump();
        let kind = match start_tok.kind {
            TokenKind::Always => ProceduralKind::Always,
            TokenKind::AlwaysComb => ProceduralKind::AlwaysComb,
            TokenKind::AlwaysFf => ProceduralKind::AlwaysFf,
            TokenKind::AlwaysLatch => ProceduralKind::AlwaysLatch,
            TokenKind::Initial => ProceduralKind::Initial,
            _ => ProceduralKind::Final,
        };
        let stmt = self.parse_statement();
        ModuleItem::Procedural {
            kind,
            stmt,
            span: self.span_from(start_tok.span),
        }
    }

    fn parse_modport_item(&mut self) -> ModuleItem {
        let start = self.bump().span; // modport
        let mut items = Vec::new();
        loop {
            let item_start = self.peek().span;
            let (name, name_span) = self.ident();
            self.expect(TokenKind::LeftParen, "(");
            let mut ports = Vec::new();
            let mut direction = Direction::Input;
            while !self.at(TokenKind::RightParen) && !self.at(TokenKind::Eof) {
                if self.kind().is_direction() {
                    direction = match self.bump().kind {
                        TokenKind::Input => Direction::Input,
                        TokenKind::Output => Direction::Output,
                        TokenKind::Inout => Direction::InOut,
                        _ => Direction::Ref,
                    };
                }
                let (pname, pspan) = self.ident();
                ports.push(ModportPort {
                    direction,
                    name: pname,
                    name_span: pspan,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, ")");
            items.push(ModportItem {
                name,
                name_span,
                ports,
                span: self.span_from(item_start),
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");
        ModuleItem::Modport {
            items,
            span: self.span_from(start),
        }
    }

    /// Parses a hierarchy instantiation with its parameter assignments and
    /// instance list.
    fn parse_instantiation(&mut self) -> HierarchyInstantiation {
        let start = self.peek().span;
        let module_tok = self.bump();
        let module = self.intern_tok(module_tok);

        let mut param_assignments = Vec::new();
        if self.eat(TokenKind::Hash).is_some() {
            self.expect(TokenKind::LeftParen, "(");
            if !self.at(TokenKind::RightParen) {
                loop {
                    if self.at(TokenKind::Dot) {
                        self.bump();
                        let (name, name_span) = self.ident();
                        let mut expr = None;
                        if self.eat(TokenKind::LeftParen).is_some() {
                            if !self.at(TokenKind::RightParen) {
                                expr = Some(self.parse_param_value());
                            }
                            self.expect(TokenKind::RightParen, ")");
                        }
                        param_assignments.push(ParamAssignment::Named {
                            name,
                            name_span,
                            expr,
                        });
                    } else {
                        param_assignments.push(ParamAssignment::Ordered(self.parse_param_value()));
                    }
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen, ")");
        }

        let mut instances = Vec::new();
        loop {
            let inst_start = self.peek().span;
            let (name, name_span) = self.ident();
            let dims = self.parse_unpacked_dims();
            self.expect(TokenKind::LeftParen, "(");
            let connections = self.parse_port_connections();
            self.expect(TokenKind::RightParen, ")");
            instances.push(HierarchicalInstance {
                name,
                name_span,
                dims,
                connections,
                span: self.span_from(inst_start),
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");

        HierarchyInstantiation {
            module,
            module_span: module_tok.span,
            param_assignments,
            instances,
            span: self.span_from(start),
        }
    }

    /// A parameter value may be an expression or a bare data type (for type
    /// parameters).
    fn parse_param_value(&mut self) -> Expr {
        if self.kind().is_data_type_start() && self.kind_at(1) != TokenKind::Tick {
            let start = self.peek().span;
            let ty = self.parse_data_type();
            return Expr::DataTypeExpr {
                ty: Box::new(ty),
                span: self.span_from(start),
            };
        }
        self.parse_expression()
    }

    fn parse_port_connections(&mut self) -> Vec<PortConnection> {
        let mut connections = Vec::new();
        if self.at(TokenKind::RightParen) {
            return connections;
        }
        loop {
            if self.at(TokenKind::Dot) {
                let start = self.bump().span;
                if self.at(TokenKind::Star) {
                    let star = self.bump();
                    connections.push(PortConnection::Wildcard(start.merge(star.span)));
                } else {
                    let (name, name_span) = self.ident();
                    let mut expr = None;
                    let mut has_parens = false;
                    if self.eat(TokenKind::LeftParen).is_some() {
                        has_parens = true;
                        if !self.at(TokenKind::RightParen) {
                            expr = Some(self.parse_expression());
                        }
                        self.expect(TokenKind::RightParen, ")");
                    }
                    connections.push(PortConnection::Named {
                        name,
                        name_span,
                        expr,
                        has_parens,
                        span: self.span_from(start),
                    });
                }
            } else if matches!(self.kind(), TokenKind::Comma | TokenKind::RightParen) {
                connections.push(PortConnection::Ordered(None, self.peek().span));
            } else {
                let expr = self.parse_expression();
                let span = expr.span();
                connections.push(PortConnection::Ordered(Some(expr), span));
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        connections
    }

    // ---- generate constructs ----

    fn parse_gen_member(&mut self) -> GenMember {
        if self.at(TokenKind::Begin) {
            GenMember::Block(self.parse_generate_block())
        } else {
            GenMember::Item(Box::new(self.parse_module_item()))
        }
    }

    fn parse_generate_block(&mut self) -> GenerateBlockSyntax {
        let start = self.bump().span; // begin
        let mut label = None;
        let mut label_span = None;
        if self.eat(TokenKind::Colon).is_some() {
            let (name, span) = self.ident();
            label = Some(name);
            label_span = Some(span);
        }
        let mut items = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::Eof) {
            items.push(self.parse_module_item());
        }
        self.expect(TokenKind::End, "end");
        if self.eat(TokenKind::Colon).is_some() {
            self.ident();
        }
        GenerateBlockSyntax {
            label,
            label_span,
            items,
            span: self.span_from(start),
        }
    }

    fn parse_if_generate(&mut self) -> ModuleItem {
        let start = self.bump().span; // if
        self.expect(TokenKind::LeftParen, "(");
        let condition = self.parse_expression();
        self.expect(TokenKind::RightParen, ")");
        let then_block = self.parse_gen_member();
        let mut else_block = None;
        if self.eat(TokenKind::Else).is_some() {
            else_block = Some(self.parse_gen_member());
        }
        ModuleItem::IfGenerate {
            condition,
            then_block,
            else_block,
            span: self.span_from(start),
        }
    }

    fn parse_case_generate(&mut self) -> ModuleItem {
        let start = self.bump().span; // case
        self.expect(TokenKind::LeftParen, "(");
        let condition = self.parse_expression();
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
            let body = self.parse_gen_member();
            items.push(CaseGenerateItem {
                expressions,
                body,
                span: self.span_from(item_start),
            });
        }
        self.expect(TokenKind::Endcase, "endcase");
        ModuleItem::CaseGenerate {
            condition,
            items,
            span: self.span_from(start),
        }
    }

    fn parse_loop_generate(&mut self) -> ModuleItem {
        let start = self.bump().span; // for
        self.expect(TokenKind::LeftParen, "(");
        let genvar_keyword = self.eat(TokenKind::Genvar).is_some();
        let (ident, ident_span) = self.ident();
        self.expect(TokenKind::Equals, "=");
        let init = self.parse_expression();
        self.expect(TokenKind::Semicolon, ";");
        let stop = self.parse_expression();
        self.expect(TokenKind::Semicolon, ";");
        let iteration = self.parse_assignment_or_expr();
        self.expect(TokenKind::RightParen, ")");
        let body = self.parse_gen_member();
        ModuleItem::LoopGenerate {
            genvar_keyword,
            ident,
            ident_span,
            init,
            stop,
            iteration,
            body,
            span: self.span_from(start),
        }
    }

    // ---- subroutines ----

    fn parse_subroutine(&mut self) -> FunctionDecl {
        let start_tok = self.bump();
        let kind = if start_tok.kind == TokenKind::Function {
            SubroutineKind::Function
        } else {
            SubroutineKind::Task
        };
        let end_kind = match kind {
            SubroutineKind::Function => TokenKind::Endfunction,
            SubroutineKind::Task => TokenKind::Endtask,
        };
        // Lifetime specifiers are accepted and ignored.
        self.eat(TokenKind::Automatic);
        self.eat(TokenKind::Static);

        let return_type = if kind == SubroutineKind::Task {
            DataType::Void {
                span: start_tok.span,
            }
        } else if self.kind().is_data_type_start()
            || (self.at(TokenKind::Identifier) && self.kind_at(1) == TokenKind::Identifier)
            || (self.at(TokenKind::Identifier) && self.kind_at(1) == TokenKind::ColonColon)
        {
            self.parse_data_type()
        } else {
            DataType::Implicit {
                signed: false,
                dims: vec![],
                span: self.peek().span,
            }
        };
        let (name, name_span) = self.ident();

        let mut args = Vec::new();
        if self.eat(TokenKind::LeftParen).is_some() {
            if !self.at(TokenKind::RightParen) {
                let mut direction = Direction::Input;
                let mut last_ty = DataType::Implicit {
                    signed: false,
                    dims: vec![],
                    span: name_span,
                };
                loop {
                    let arg_start = self.peek().span;
                    if self.kind().is_direction() {
                        direction = match self.bump().kind {
                            TokenKind::Input => Direction::Input,
                            TokenKind::Output => Direction::Output,
                            TokenKind::Inout => Direction::InOut,
                            _ => Direction::Ref,
                        };
                        last_ty = self.parse_optional_data_type();
                    } else if self.kind().is_data_type_start()
                        || (self.at(TokenKind::Identifier)
                            && self.kind_at(1) == TokenKind::Identifier)
                    {
                        last_ty = self.parse_optional_data_type();
                    }
                    let (arg_name, arg_span) = self.ident();
                    let dims = self.parse_unpacked_dims();
                    let mut default = None;
                    if self.eat(TokenKind::Equals).is_some() {
                        default = Some(self.parse_expression());
                    }
                    args.push(FunctionArg {
                        direction,
                        ty: last_ty.clone(),
                        name: arg_name,
                        name_span: arg_span,
                        dims,
                        default,
                        span: self.span_from(arg_start),
                    });
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RightParen, ")");
        }
        self.expect(TokenKind::Semicolon, ";");

        let mut body = Vec::new();
        while !self.at(end_kind) && !self.at(TokenKind::Eof) {
            body.push(self.parse_statement());
        }
        self.expect(end_kind, "endfunction");
        let mut end_label = None;
        if self.eat(TokenKind::Colon).is_some() {
            end_label = Some(self.ident().0);
        }

        FunctionDecl {
            kind,
            name,
            name_span,
            return_type,
            args,
            body,
            end_label,
            span: self.span_from(start_tok.span),
        }
    }

    // ---- data types and declarators ----

    /// Parses a data type when one might be present, producing an implicit
    /// type when the next tokens must be a declarator instead.
    pub(crate) fn parse_optional_data_type(&mut self) -> DataType {
        if self.kind().is_data_type_start() {
            return self.parse_data_type();
        }
        if self.at(TokenKind::Signed) || self.at(TokenKind::LeftBracket) {
            let start = self.peek().span;
            let signed = self.eat(TokenKind::Signed).is_some();
            let dims = self.parse_packed_dims();
            return DataType::Implicit {
                signed,
                dims,
                span: self.span_from(start),
            };
        }
        if self.at(TokenKind::Identifier) {
            let is_type = self.kind_at(1) == TokenKind::Identifier
                || self.kind_at(1) == TokenKind::ColonColon
                || self
                    .scan_past_brackets(1)
                    .map_or(false, |n| self.kind_at(n) == TokenKind::Identifier);
            if is_type {
                return self.parse_data_type();
            }
        }
        DataType::Implicit {
            signed: false,
            dims: vec![],
            span: self.peek().span,
        }
    }

    /// Parses a data type that must be present.
    pub(crate) fn parse_data_type(&mut self) -> DataType {
        let start = self.peek().span;
        match self.kind() {
            TokenKind::Bit | TokenKind::Logic | TokenKind::Reg => {
                let kind = match self.bump().kind {
                    TokenKind::Bit => ScalarKind::Bit,
                    TokenKind::Reg => ScalarKind::Reg,
                    _ => ScalarKind::Logic,
                };
                let signed = if self.eat(TokenKind::Signed).is_some() {
                    true
                } else {
                    self.eat(TokenKind::Unsigned);
                    false
                };
                let dims = self.parse_packed_dims();
                DataType::Scalar {
                    kind,
                    signed,
                    dims,
                    span: self.span_from(start),
                }
            }
            TokenKind::Byte
            | TokenKind::Shortint
            | TokenKind::Int
            | TokenKind::Longint
            | TokenKind::Integer
            | TokenKind::Time => {
                let kind = match self.bump().kind {
                    TokenKind::Byte => PredefIntKind::Byte,
                    TokenKind::Shortint => PredefIntKind::ShortInt,
                    TokenKind::Int => PredefIntKind::Int,
                    TokenKind::Longint => PredefIntKind::LongInt,
                    TokenKind::Integer => PredefIntKind::Integer,
                    _ => PredefIntKind::Time,
                };
                let signed = if self.eat(TokenKind::Signed).is_some() {
                    Some(true)
                } else if self.eat(TokenKind::Unsigned).is_some() {
                    Some(false)
                } else {
                    None
                };
                DataType::PredefInt {
                    kind,
                    signed,
                    span: self.span_from(start),
                }
            }
            TokenKind::Real | TokenKind::Shortreal | TokenKind::Realtime => {
                let kind = match self.bump().kind {
                    TokenKind::Real => RealKind::Real,
                    TokenKind::Shortreal => RealKind::ShortReal,
                    _ => RealKind::RealTime,
                };
                DataType::Real {
                    kind,
                    span: self.span_from(start),
                }
            }
            TokenKind::String => {
                self.bump();
                DataType::String { span: start }
            }
            TokenKind::Chandle => {
                self.bump();
                DataType::Chandle { span: start }
            }
            TokenKind::Event => {
                self.bump();
                DataType::Event { span: start }
            }
            TokenKind::Void => {
                self.bump();
                DataType::Void { span: start }
            }
            TokenKind::Enum => self.parse_enum_type(),
            TokenKind::Struct | TokenKind::Union => self.parse_struct_type(),
            TokenKind::Identifier => {
                let first = self.bump();
                let (package, name, name_span) = if self.at(TokenKind::ColonColon) {
                    self.bump();
                    let (name, name_span) = self.ident();
                    (Some(self.intern_tok(first)), name, name_span)
                } else {
                    (None, self.intern_tok(first), first.span)
                };
                let dims = self.parse_packed_dims();
                DataType::Named {
                    package,
                    name,
                    name_span,
                    dims,
                    span: self.span_from(start),
                }
            }
            _ => {
                let signed = self.eat(TokenKind::Signed).is_some();
                let dims = self.parse_packed_dims();
                DataType::Implicit {
                    signed,
                    dims,
                    span: self.span_from(start),
                }
            }
        }
    }

    fn parse_enum_type(&mut self) -> DataType {
        let start = self.bump().span; // enum
        let base = if !self.at(TokenKind::LeftBrace) {
            Some(Box::new(self.parse_data_type()))
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace, "{");
        let mut members = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let member_start = self.peek().span;
            let (name, name_span) = self.ident();
            let dims = self.parse_unpacked_dims();
            let mut init = None;
            if self.eat(TokenKind::Equals).is_some() {
                init = Some(self.parse_expression());
            }
            members.push(EnumMember {
                name,
                name_span,
                dims,
                init,
                span: self.span_from(member_start),
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBrace, "}");
        let dims = self.parse_packed_dims();
        DataType::Enum {
            base,
            members,
            dims,
            span: self.span_from(start),
        }
    }

    fn parse_struct_type(&mut self) -> DataType {
        let start = self.peek().span;
        let is_union = self.bump().kind == TokenKind::Union;
        self.eat(TokenKind::Tagged);
        let packed = self.eat(TokenKind::Packed).is_some();
        let signed = if self.eat(TokenKind::Signed).is_some() {
            true
        } else {
            self.eat(TokenKind::Unsigned);
            false
        };
        self.expect(TokenKind::LeftBrace, "{");
        let mut members = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            let member_start = self.peek().span;
            let ty = self.parse_data_type();
            let declarators = self.parse_declarator_list();
            self.expect(TokenKind::Semicolon, ";");
            members.push(StructMember {
                ty,
                declarators,
                span: self.span_from(member_start),
            });
        }
        self.expect(TokenKind::RightBrace, "}");
        let dims = self.parse_packed_dims();
        DataType::Struct {
            is_union,
            packed,
            signed,
            members,
            dims,
            span: self.span_from(start),
        }
    }

    /// Parses zero or more packed dimensions `[msb:lsb]`.
    pub(crate) fn parse_packed_dims(&mut self) -> Vec<PackedDim> {
        let mut dims = Vec::new();
        while self.at(TokenKind::LeftBracket) {
            let start = self.bump().span;
            let left = self.parse_expression();
            self.expect(TokenKind::Colon, ":");
            let right = self.parse_expression();
            self.expect(TokenKind::RightBracket, "]");
            dims.push(PackedDim {
                left,
                right,
                span: self.span_from(start),
            });
        }
        dims
    }

    /// Parses zero or more unpacked dimensions `[size]` or `[msb:lsb]`.
    pub(crate) fn parse_unpacked_dims(&mut self) -> Vec<UnpackedDim> {
        let mut dims = Vec::new();
        while self.at(TokenKind::LeftBracket) {
            let start = self.bump().span;
            let first = self.parse_expression();
            if self.eat(TokenKind::Colon).is_some() {
                let right = self.parse_expression();
                self.expect(TokenKind::RightBracket, "]");
                dims.push(UnpackedDim::Range(first, right, self.span_from(start)));
            } else {
                self.expect(TokenKind::RightBracket, "]");
                dims.push(UnpackedDim::Size(first, self.span_from(start)));
            }
        }
        dims
    }

    /// Parses one declarator: name, dimensions, optional initializer.
    pub(crate) fn parse_declarator(&mut self, type_valued: bool) -> Declarator {
        let (name, name_span) = self.ident();
        let dims = self.parse_unpacked_dims();
        let mut init = None;
        let mut eq_span = None;
        if let Some(eq) = self.eat(TokenKind::Equals) {
            eq_span = Some(eq.span);
            if type_valued {
                let start = self.peek().span;
                let ty = self.parse_data_type();
                init = Some(Expr::DataTypeExpr {
                    ty: Box::new(ty),
                    span: self.span_from(start),
                });
            } else {
                init = Some(self.parse_expression());
            }
        }
        Declarator {
            name,
            name_span,
            dims,
            init,
            eq_span,
        }
    }

    /// Parses a comma-separated declarator list.
    pub(crate) fn parse_declarator_list(&mut self) -> Vec<Declarator> {
        let mut declarators = Vec::new();
        loop {
            declarators.push(self.parse_declarator(false));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        declarators
    }
}
