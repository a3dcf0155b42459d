//! Recursive descent parser for SystemVerilog with error recovery.
//!
//! The parser consumes the preprocessed token stream and produces the AST
//! in [`crate::ast`]. Parse errors are reported to the diagnostic sink and
//! recovered from by producing poison nodes and resynchronizing on
//! semicolons or item keywords, so one bad construct doesn't take out the
//! rest of the file.

use crate::ast::*;
use crate::errors;
use crate::preprocessor::PreprocessedSource;
use crate::token::{Token, TokenKind};
use crate::ParseOptions;
use veris_common::{Ident, Interner};
use veris_diagnostics::DiagnosticSink;
use veris_source::{SourceDb, Span};

/// The parser state over one preprocessed token stream.
pub struct SvParser<'a> {
    pub(crate) source: &'a PreprocessedSource,
    pub(crate) db: &'a SourceDb,
    pub(crate) interner: &'a Interner,
    pub(crate) sink: &'a DiagnosticSink,
    pub(crate) pos: usize,
    pub(crate) prev_span: Span,
    pub(crate) depth: u32,
    pub(crate) max_depth: u32,
}

impl<'a> SvParser<'a> {
    /// Creates a parser over a preprocessed token stream.
    pub fn new(
        source: &'a PreprocessedSource,
        db: &'a SourceDb,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
        options: &ParseOptions,
    ) -> Self {
        let first = source.tokens.first().map_or(Span::DUMMY, |t| t.span);
        Self {
            source,
            db,
            interner,
            sink,
            pos: 0,
            prev_span: first,
            depth: 0,
            max_depth: options.max_recursion_depth,
        }
    }

    pub(crate) fn peek_at(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.source.tokens.len() - 1);
        self.source.tokens[idx]
    }

    pub(crate) fn peek(&self) -> Token {
        self.peek_at(0)
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn kind_at(&self, n: usize) -> TokenKind {
        self.peek_at(n).kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        self.prev_span = tok.span;
        tok
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Consumes the expected token, or reports an error and fabricates an
    /// empty one at the current position.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Token {
        if let Some(tok) = self.eat(kind) {
            return tok;
        }
        let here = self.peek().report_span();
        self.sink.emit(errors::error_expected_token(what, here));
        Token::new(kind, Span::new(here.file, here.start, here.start))
    }

    pub(crate) fn text(&self, tok: Token) -> &str {
        self.db.snippet(tok.span)
    }

    pub(crate) fn intern_tok(&self, tok: Token) -> Ident {
        // Escaped identifiers drop the leading backslash.
        let text = self.text(tok);
        self.interner.get_or_intern(text.strip_prefix('\\').unwrap_or(text))
    }

    /// Consumes an identifier, or reports an error and returns a sentinel.
    pub(crate) fn ident(&mut self) -> (Ident, Span) {
        if matches!(self.kind(), TokenKind::Identifier | TokenKind::EscapedIdentifier) {
            let tok = self.bump();
            (self.intern_tok(tok), tok.span)
        } else {
            let here = self.peek().report_span();
            self.sink.emit(errors::error_expected_identifier(here));
            (self.interner.get_or_intern("<error>"), here)
        }
    }

    /// Merges a start span with the last consumed token's span.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.merge(self.prev_span)
    }

    /// Skips tokens until just past a semicolon or to a likely sync point.
    pub(crate) fn recover_to_semi(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::Eof
                | TokenKind::Endmodule
                | TokenKind::Endpackage
                | TokenKind::Endinterface
                | TokenKind::Endfunction
                | TokenKind::Endtask
                | TokenKind::End
                | TokenKind::Endgenerate
                | TokenKind::Endcase => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Scans past a balanced bracket group starting at relative token
    /// offset `n` (which must be a `[`), returning the offset just past the
    /// matching `]`, or `None` if unbalanced.
    pub(crate) fn scan_past_brackets(&self, mut n: usize) -> Option<usize> {
        if self.kind_at(n) != TokenKind::LeftBracket {
            return None;
        }
        let mut depth = 0usize;
        loop {
            match self.kind_at(n) {
                TokenKind::LeftBracket => depth += 1,
                TokenKind::RightBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(n + 1);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            n += 1;
        }
    }

    /// Parses a whole preprocessed file.
    pub fn parse_source_file(&mut self) -> SourceUnit {
        let start = self.peek().span;
        let mut items = Vec::new();
        while !self.at(TokenKind::Eof) {
            match self.kind() {
                TokenKind::Module | TokenKind::Macromodule | TokenKind::Interface | TokenKind::Program => {
                    items.push(Item::Definition(self.parse_definition()));
                }
                TokenKind::Package => items.push(Item::Package(self.parse_package())),
                TokenKind::Import => items.push(Item::Import(self.parse_import())),
                TokenKind::Timeunit | TokenKind::Timeprecision => {
                    items.push(Item::TimeUnits(self.parse_time_units()));
                }
                TokenKind::Parameter
                | TokenKind::Localparam
                | TokenKind::Typedef
                | TokenKind::Function
                | TokenKind::Task => {
                    items.push(Item::Member(Box::new(self.parse_module_item())));
                }
                _ => {
                    let here = self.peek().report_span();
                    self.sink.emit(errors::error_expected_member(here));
                    self.recover_to_semi();
                }
            }
        }
        SourceUnit {
            span: start.merge(self.prev_span),
            items,
        }
    }

    fn parse_definition(&mut self) -> ModuleDecl {
        let meta_index = self.pos;
        let start_tok = self.bump();
        let kind = match start_tok.kind {
            TokenKind::Interface => DefinitionKind::Interface,
            TokenKind::Program => DefinitionKind::Program,
            _ => DefinitionKind::Module,
        };
        let end_kind = match kind {
            DefinitionKind::Interface => TokenKind::Endinterface,
            DefinitionKind::Program => TokenKind::Endprogram,
            DefinitionKind::Module => TokenKind::Endmodule,
        };

        let (name, name_span) = self.ident();

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            imports.push(self.parse_import());
        }

        let param_ports = if self.at(TokenKind::Hash) && self.kind_at(1) == TokenKind::LeftParen {
            Some(self.parse_param_port_list())
        } else {
            None
        };

        let ports = if self.at(TokenKind::LeftParen) {
            self.parse_port_list()
        } else {
            PortList::Empty
        };
        self.expect(TokenKind::Semicolon, ";");

        let (items, end_label) = self.parse_items_until(end_kind);

        ModuleDecl {
            kind,
            name,
            name_span,
            imports,
            param_ports,
            ports,
            items,
            end_label,
            default_net_type: self.source.net_type_at(meta_index),
            time_scale: self.source.time_scale_at(meta_index),
            span: self.span_from(start_tok.span),
        }
    }

    fn parse_package(&mut self) -> PackageDecl {
        let meta_index = self.pos;
        let start_tok = self.bump();
        let (name, name_span) = self.ident();
        self.expect(TokenKind::Semicolon, ";");
        let (items, end_label) = self.parse_items_until(TokenKind::Endpackage);
        PackageDecl {
            name,
            name_span,
            items,
            end_label,
            default_net_type: self.source.net_type_at(meta_index),
            time_scale: self.source.time_scale_at(meta_index),
            span: self.span_from(start_tok.span),
        }
    }

    /// Parses body items until the given end keyword, consuming it and any
    /// trailing `: label`.
    pub(crate) fn parse_items_until(
        &mut self,
        end: TokenKind,
    ) -> (Vec<ModuleItem>, Option<Ident>) {
        let mut items = Vec::new();
        while !self.at(end) && !self.at(TokenKind::Eof) {
            items.push(self.parse_module_item());
        }
        self.eat(end);
        let mut end_label = None;
        if self.eat(TokenKind::Colon).is_some() {
            end_label = Some(self.ident().0);
        }
        (items, end_label)
    }

    /// Parses an `import` declaration.
    pub(crate) fn parse_import(&mut self) -> ImportDecl {
        let start = self.bump().span;
        let mut specs = Vec::new();
        loop {
            let (package, package_span) = self.ident();
            self.expect(TokenKind::ColonColon, "::");
            let (item, item_span) = if self.at(TokenKind::Star) {
                let tok = self.bump();
                (None, tok.span)
            } else {
                let (id, span) = self.ident();
                (Some(id), span)
            };
            specs.push(ImportSpec {
                package,
                package_span,
                item,
                item_span,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::Semicolon, ";");
        ImportDecl {
            specs,
            span: self.span_from(start),
        }
    }

    /// Parses a `timeunit`/`timeprecision` declaration.
    pub(crate) fn parse_time_units(&mut self) -> TimeUnitsDecl {
        let start_tok = self.bump();
        let is_unit = start_tok.kind == TokenKind::Timeunit;
        let mut parse_value = |this: &mut Self| -> Option<TimeScaleValue> {
            if this.at(TokenKind::TimeLiteral) {
                let tok = this.bump();
                let text: String = this
                    .text(tok)
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '_')
                    .collect();
                TimeScaleValue::from_text(&text)
            } else {
                None
            }
        };
        let value = parse_value(self);
        let mut precision = None;
        if self.eat(TokenKind::Slash).is_some() {
            precision = parse_value(self);
        }
        self.expect(TokenKind::Semicolon, ";");
        TimeUnitsDecl {
            is_unit,
            value,
            precision,
            span: self.span_from(start_tok.span),
        }
    }

    /// Parses a `#(...)` parameter port list.
    fn parse_param_port_list(&mut self) -> Vec<ParamDecl> {
        self.bump(); // #
        self.bump(); // (
        let mut params = Vec::new();
        if self.eat(TokenKind::RightParen).is_some() {
            return params;
        }

        // The parameter/localparam keyword may be left off; later entries
        // inherit it from the previous one.
        let mut is_local = false;
        loop {
            let start = self.peek().span;
            if matches!(self.kind(), TokenKind::Parameter | TokenKind::Localparam) {
                is_local = self.bump().kind == TokenKind::Localparam;
            }
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
            let declarator = self.parse_declarator(is_type);
            params.push(ParamDecl {
                is_local,
                is_type,
                ty,
                declarators: vec![declarator],
                span: self.span_from(start),
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen, ")");
        params
    }

    /// Parses the `(...)` port list of a definition header.
    fn parse_port_list(&mut self) -> PortList {
        self.bump(); // (
        if self.eat(TokenKind::RightParen).is_some() {
            return PortList::Ansi(Vec::new());
        }

        // Non-ANSI style: a bare list of names.
        if self.at(TokenKind::Identifier)
            && matches!(self.kind_at(1), TokenKind::Comma | TokenKind::RightParen)
        {
            let mut names = Vec::new();
            loop {
                let (name, span) = self.ident();
                names.push((name, span));
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, ")");
            return PortList::NonAnsi(names);
        }

        let mut ports: Vec<AnsiPort> = Vec::new();
        loop {
            let port = self.parse_ansi_port(ports.last());
            ports.push(port);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen, ")");
        PortList::Ansi(ports)
    }

    fn parse_ansi_port(&mut self, previous: Option<&AnsiPort>) -> AnsiPort {
        let start = self.peek().span;

        let mut direction = None;
        if self.kind().is_direction() {
            direction = Some(match self.bump().kind {
                TokenKind::Input => Direction::Input,
                TokenKind::Output => Direction::Output,
                TokenKind::Inout => Direction::InOut,
                _ => Direction::Ref,
            });
        }

        let mut net = None;
        let mut is_var = false;
        if self.kind().is_net_type() {
            let tok = self.bump();
            net = NetKind::from_text(self.text(tok));
        } else if self.at(TokenKind::Var) {
            self.bump();
            is_var = true;
        }

        let mut modport = None;
        let explicit_type = self.kind().is_data_type_start()
            || self.at(TokenKind::Signed)
            || self.at(TokenKind::LeftBracket);

        let ty;
        if explicit_type {
            ty = self.parse_data_type();
        } else if self.at(TokenKind::Identifier) {
            // Decide between `iface.modport name`, `type name`, and a bare
            // port name reusing the previous entry's type.
            if self.kind_at(1) == TokenKind::Dot
                && self.kind_at(2) == TokenKind::Identifier
                && self.kind_at(3) == TokenKind::Identifier
            {
                let iface_tok = self.bump();
                self.bump(); // .
                let mp_tok = self.bump();
                modport = Some(self.intern_tok(mp_tok));
                ty = DataType::Named {
                    package: None,
                    name: self.intern_tok(iface_tok),
                    name_span: iface_tok.span,
                    dims: vec![],
                    span: iface_tok.span,
                };
            } else if self.kind_at(1) == TokenKind::Identifier
                || self.kind_at(1) == TokenKind::ColonColon
                || self
                    .scan_past_brackets(1)
                    .map_or(false, |n| self.kind_at(n) == TokenKind::Identifier)
            {
                ty = self.parse_data_type();
            } else if direction.is_none() && net.is_none() && !is_var {
                // Inherit direction and type from the previous entry.
                if let Some(prev) = previous {
                    direction = prev.direction;
                    net = prev.net;
                    is_var = prev.is_var;
                    modport = prev.modport;
                    ty = prev.ty.clone();
                } else {
                    ty = DataType::Implicit {
                        signed: false,
                        dims: vec![],
                        span: self.peek().span,
                    };
                }
            } else {
                ty = DataType::Implicit {
                    signed: false,
                    dims: vec![],
                    span: self.peek().span,
                };
            }
        } else {
            ty = DataType::Implicit {
                signed: false,
                dims: vec![],
                span: self.peek().span,
            };
        }

        let declarator = self.parse_declarator(false);
        AnsiPort {
            direction,
            net,
            is_var,
            ty,
            modport,
            declarator,
            span: self.span_from(start),
        }
    }
}
