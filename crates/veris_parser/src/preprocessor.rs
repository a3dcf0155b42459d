//! The preprocessor: directive handling, include stacking, and macro
//! expansion.
//!
//! The preprocessor owns a stack of lexers (one per open include file) and
//! a stack of [`MacroExpander`]s, and delivers a single logical token
//! stream through [`Preprocessor::next_token`]. Directives are resolved
//! transparently: the parser never sees them, only their effects (tokens
//! from included files, expanded macro bodies, swapped keyword tables) plus
//! a trivia record attached to the following token. Tokens appear in
//! lexical order of the original source with macro-expansion bodies
//! interpolated at their invocation sites; every expanded token keeps its
//! macro-body span and records the invocation site, so locations always
//! trace back to real text.
//!
//! On any directive error the preprocessor resynchronizes by dropping the
//! remainder of the directive line.

use std::collections::HashMap;

use crate::ast::{NetKind, TimeScale, TimeScaleValue};
use crate::errors;
use crate::lexer::{Lexed, Lexer};
use crate::token::{
    directive_kind, lookup_keyword, DirectiveKind, KeywordVersion, Token, TokenKind, Trivia,
    TriviaSlice,
};
use crate::ParseOptions;
use veris_common::{Ident, Interner};
use veris_diagnostics::DiagnosticSink;
use veris_source::{FileId, SourceDb, Span};

/// Maximum `include` nesting depth.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Maximum macro expansion nesting depth.
const MAX_EXPANSION_DEPTH: usize = 64;

/// One token of a macro body, with its formal-argument slot precomputed.
#[derive(Clone, Copy)]
struct BodyToken {
    token: Token,
    /// Index into the formal list if this token names a formal argument.
    formal: Option<u32>,
}

/// A macro definition installed by `` `define ``.
pub struct MacroDef {
    /// The macro name.
    pub name: Ident,
    /// The span of the name in the definition.
    pub name_span: Span,
    /// Formal argument names; `None` for object-like macros.
    formals: Option<Vec<Ident>>,
    /// The body tokens.
    body: Vec<BodyToken>,
}

/// Expands one macro invocation.
///
/// Substitution happens up front: formal references are replaced by the
/// actual argument token spans and every produced token records the
/// invocation site. Tokens are then handed out one at a time; nested macro
/// usages in the output are re-dispatched by the preprocessor as they are
/// rescanned.
pub struct MacroExpander {
    tokens: Vec<Token>,
    pos: usize,
}

impl MacroExpander {
    /// Builds an expander for the given definition, actual arguments, and
    /// invocation site.
    pub fn start(def: &MacroDef, args: &[Vec<Token>], site: Span) -> Self {
        let mut tokens = Vec::new();
        for body in &def.body {
            match body.formal {
                Some(idx) => {
                    for &arg in &args[idx as usize] {
                        tokens.push(Token {
                            expansion_site: Some(site),
                            ..arg
                        });
                    }
                }
                None => tokens.push(Token {
                    expansion_site: Some(site),
                    ..body.token
                }),
            }
        }
        Self { tokens, pos: 0 }
    }

    /// Returns the next substituted token, or `None` when exhausted.
    pub fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).copied();
        self.pos += 1;
        tok
    }

    /// True while tokens remain.
    pub fn is_active(&self) -> bool {
        self.pos < self.tokens.len()
    }
}

/// One frame of the conditional-compilation stack.
struct CondFrame {
    /// True once some branch of this conditional has been taken.
    any_taken: bool,
}

/// The preprocessor state machine.
pub struct Preprocessor<'a> {
    db: &'a mut SourceDb,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    lexers: Vec<Lexer<'a>>,
    expanders: Vec<MacroExpander>,
    macros: HashMap<Ident, MacroDef>,
    /// A token read past a directive line, keyed by the lexer depth it
    /// belongs to so included files drain first.
    lookahead: Option<(usize, Lexed)>,
    trivia: Vec<Trivia>,
    pending_trivia: Vec<Trivia>,
    cond_stack: Vec<CondFrame>,
    keyword_stack: Vec<KeywordVersion>,
    default_keywords: KeywordVersion,
    initial_net_type: NetKind,
    net_type_changes: Vec<(u32, NetKind)>,
    time_scale_changes: Vec<(u32, Option<TimeScale>)>,
    emitted: u32,
    eof_span: Span,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor reading from the given file.
    pub fn new(
        file: FileId,
        db: &'a mut SourceDb,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
        options: &ParseOptions,
    ) -> Self {
        let content = db.get_file(file).content.clone();
        let eof_span = Span::new(file, content.len() as u32, content.len() as u32);
        let lexer = Lexer::new(content, file, sink);
        Self {
            db,
            interner,
            sink,
            lexers: vec![lexer],
            expanders: Vec::new(),
            macros: HashMap::new(),
            lookahead: None,
            trivia: Vec::new(),
            pending_trivia: Vec::new(),
            cond_stack: Vec::new(),
            keyword_stack: Vec::new(),
            default_keywords: options.keyword_version,
            initial_net_type: options.default_net_type,
            net_type_changes: Vec::new(),
            time_scale_changes: Vec::new(),
            emitted: 0,
            eof_span,
        }
    }

    /// Looks up an identifier in the active keyword table.
    pub fn lookup_keyword(&self, text: &str) -> Option<TokenKind> {
        let version = self
            .keyword_stack
            .last()
            .copied()
            .unwrap_or(self.default_keywords);
        lookup_keyword(text, version)
    }

    /// Returns `true` if a macro with the given name is currently defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.interner
            .get(name)
            .map_or(false, |id| self.macros.contains_key(&id))
    }

    fn snippet_owned(&self, span: Span) -> String {
        self.db.snippet(span).to_string()
    }

    /// Pulls the next raw token from the current lexer, honoring the
    /// directive-line lookahead.
    fn raw_lexer_next(&mut self) -> Lexed {
        if let Some((depth, tok)) = self.lookahead {
            if depth == self.lexers.len() {
                self.lookahead = None;
                return tok;
            }
        }
        self.lexers
            .last_mut()
            .expect("lexer stack is never empty")
            .next_token()
    }

    fn push_back(&mut self, tok: Lexed) {
        self.lookahead = Some((self.lexers.len(), tok));
    }

    /// Pulls the next token from the expansion stack or the lexers,
    /// converting comments to pending trivia. Used for macro arguments.
    fn next_any(&mut self) -> Token {
        loop {
            if let Some(exp) = self.expanders.last_mut() {
                match exp.next() {
                    Some(tok) => return tok,
                    None => {
                        self.expanders.pop();
                        continue;
                    }
                }
            }
            let raw = self.raw_lexer_next();
            match raw.kind {
                TokenKind::LineComment => {
                    self.pending_trivia.push(Trivia::LineComment(raw.span));
                }
                TokenKind::BlockComment => {
                    self.pending_trivia.push(Trivia::BlockComment(raw.span));
                }
                _ => return Token::new(raw.kind, raw.span),
            }
        }
    }

    fn flush_trivia(&mut self) -> TriviaSlice {
        let start = self.trivia.len() as u32;
        self.trivia.append(&mut self.pending_trivia);
        TriviaSlice {
            start,
            len: self.trivia.len() as u32 - start,
        }
    }

    fn finish_token(&mut self, mut tok: Token) -> Token {
        // Map raw identifiers through the active keyword table.
        if tok.kind == TokenKind::Identifier {
            let text = self.snippet_owned(tok.span);
            if let Some(kw) = self.lookup_keyword(&text) {
                tok.kind = kw;
            }
        }
        tok.trivia = self.flush_trivia();
        self.emitted += 1;
        tok
    }

    /// Returns the next fully processed token. End-of-file repeats
    /// indefinitely.
    pub fn next_token(&mut self) -> Token {
        loop {
            // Tokens from active macro expansions take precedence.
            if let Some(exp) = self.expanders.last_mut() {
                match exp.next() {
                    Some(tok) => {
                        if tok.kind == TokenKind::Directive {
                            self.parse_directive(tok);
                            continue;
                        }
                        return self.finish_token(tok);
                    }
                    None => {
                        self.expanders.pop();
                        continue;
                    }
                }
            }

            let raw = self.raw_lexer_next();
            match raw.kind {
                TokenKind::Eof => {
                    if self.lexers.len() > 1 {
                        self.lexers.pop();
                        continue;
                    }
                    let mut tok = Token::new(TokenKind::Eof, self.eof_span);
                    tok.trivia = self.flush_trivia();
                    return tok;
                }
                TokenKind::LineComment => {
                    self.pending_trivia.push(Trivia::LineComment(raw.span));
                }
                TokenKind::BlockComment => {
                    self.pending_trivia.push(Trivia::BlockComment(raw.span));
                }
                TokenKind::Directive => {
                    self.parse_directive(Token::new(raw.kind, raw.span));
                }
                _ => return self.finish_token(Token::new(raw.kind, raw.span)),
            }
        }
    }

    /// Drops the remainder of the current directive line.
    fn resync_to_line_end(&mut self) {
        loop {
            let raw = self.raw_lexer_next();
            if raw.kind == TokenKind::Eof || raw.newline_before {
                self.push_back(raw);
                return;
            }
        }
    }

    /// Reads the next lexer token expecting it on the same directive line.
    fn directive_arg(&mut self, directive_span: Span) -> Option<Lexed> {
        let raw = self.raw_lexer_next();
        if raw.kind == TokenKind::Eof || raw.newline_before {
            self.push_back(raw);
            self.sink
                .emit(errors::error_expected_end_of_directive(directive_span));
            return None;
        }
        Some(raw)
    }

    /// Checks that the directive line is over, dropping junk if not.
    fn expect_directive_end(&mut self) {
        let raw = self.raw_lexer_next();
        if raw.kind == TokenKind::Eof || raw.newline_before {
            self.push_back(raw);
            return;
        }
        self.sink
            .emit(errors::error_expected_end_of_directive(raw.span));
        self.resync_to_line_end();
    }

    /// Dispatches one directive token.
    fn parse_directive(&mut self, tok: Token) {
        let text = self.snippet_owned(tok.span);
        let name = text.trim_start_matches('`');
        let kind = directive_kind(name);
        self.pending_trivia.push(Trivia::Directive(kind, tok.span));
        match kind {
            DirectiveKind::Define => self.handle_define(tok.span),
            DirectiveKind::Undef => self.handle_undef(tok.span),
            DirectiveKind::UndefineAll => self.macros.clear(),
            DirectiveKind::ResetAll => {
                self.macros.clear();
                self.net_type_changes
                    .push((self.emitted, self.initial_net_type));
                self.time_scale_changes.push((self.emitted, None));
            }
            DirectiveKind::Include => self.handle_include(tok.span),
            DirectiveKind::IfDef => self.handle_conditional(tok.span, false),
            DirectiveKind::IfNDef => self.handle_conditional(tok.span, true),
            DirectiveKind::ElsIf | DirectiveKind::Else => {
                // Reached while the current branch is active: skip the
                // remaining branches of this conditional.
                if kind == DirectiveKind::ElsIf {
                    // The macro name argument is part of the directive line.
                    if let Some(raw) = self.directive_arg(tok.span) {
                        if raw.kind != TokenKind::Identifier {
                            self.push_back(raw);
                        }
                    }
                }
                if self.cond_stack.is_empty() {
                    self.sink
                        .emit(errors::error_unexpected_conditional(name, tok.span));
                } else {
                    self.skip_until_endif();
                }
            }
            DirectiveKind::EndIf => {
                if self.cond_stack.pop().is_none() {
                    self.sink
                        .emit(errors::error_unexpected_conditional(name, tok.span));
                }
            }
            DirectiveKind::Timescale => self.handle_timescale(tok.span),
            DirectiveKind::DefaultNetType => self.handle_default_nettype(tok.span),
            DirectiveKind::BeginKeywords => self.handle_begin_keywords(tok.span),
            DirectiveKind::EndKeywords => {
                if self.keyword_stack.pop().is_none() {
                    self.sink.emit(errors::error_invalid_directive_arg(
                        "`end_keywords without a matching `begin_keywords",
                        tok.span,
                    ));
                }
            }
            DirectiveKind::MacroUsage => self.handle_macro_usage(tok),
        }
    }

    fn handle_define(&mut self, dspan: Span) {
        let Some(name_tok) = self.directive_arg(dspan) else {
            return;
        };
        if name_tok.kind != TokenKind::Identifier {
            self.sink.emit(errors::error_expected_identifier(name_tok.span));
            self.resync_to_line_end();
            return;
        }
        let name_text = self.snippet_owned(name_tok.span);
        let name = self.interner.get_or_intern(&name_text);

        // A formal list exists only when `(` is glued to the macro name.
        let mut formals: Option<Vec<Ident>> = None;
        let mut pending: Option<Lexed> = None;
        let after = self.raw_lexer_next();
        if after.kind == TokenKind::LeftParen
            && !after.newline_before
            && after.span.start == name_tok.span.end
        {
            let mut list = Vec::new();
            loop {
                let arg = self.raw_lexer_next();
                match arg.kind {
                    TokenKind::Identifier => {
                        let text = self.snippet_owned(arg.span);
                        list.push(self.interner.get_or_intern(&text));
                    }
                    TokenKind::RightParen => break,
                    TokenKind::Comma => continue,
                    _ => {
                        self.sink.emit(errors::error_expected_identifier(arg.span));
                        self.resync_to_line_end();
                        return;
                    }
                }
            }
            formals = Some(list);
        } else {
            pending = Some(after);
        }

        // Collect the body: tokens up to the next unescaped newline.
        let mut raws = Vec::new();
        loop {
            let raw = match pending.take() {
                Some(raw) => raw,
                None => self.raw_lexer_next(),
            };
            if raw.kind == TokenKind::Eof || raw.newline_before {
                self.push_back(raw);
                break;
            }
            match raw.kind {
                TokenKind::LineComment => {
                    self.pending_trivia.push(Trivia::LineComment(raw.span));
                }
                TokenKind::BlockComment => {
                    self.pending_trivia.push(Trivia::BlockComment(raw.span));
                }
                _ => raws.push(raw),
            }
        }

        let mut body = Vec::new();
        for raw in raws {
            let formal = match (&formals, raw.kind) {
                (Some(list), TokenKind::Identifier) => {
                    let text = self.snippet_owned(raw.span);
                    self.interner
                        .get(&text)
                        .and_then(|id| list.iter().position(|&f| f == id))
                        .map(|i| i as u32)
                }
                _ => None,
            };
            body.push(BodyToken {
                token: Token::new(raw.kind, raw.span),
                formal,
            });
        }

        // Redefinition silently replaces the previous body.
        self.macros.insert(
            name,
            MacroDef {
                name,
                name_span: name_tok.span,
                formals,
                body,
            },
        );
    }

    fn handle_undef(&mut self, dspan: Span) {
        let Some(name_tok) = self.directive_arg(dspan) else {
            return;
        };
        if name_tok.kind != TokenKind::Identifier {
            self.sink.emit(errors::error_expected_identifier(name_tok.span));
            self.resync_to_line_end();
            return;
        }
        let text = self.snippet_owned(name_tok.span);
        if let Some(id) = self.interner.get(&text) {
            self.macros.remove(&id);
        }
        self.expect_directive_end();
    }

    fn handle_include(&mut self, dspan: Span) {
        let Some(first) = self.directive_arg(dspan) else {
            return;
        };
        let (name, system) = match first.kind {
            TokenKind::StringLiteral => {
                let text = self.snippet_owned(first.span);
                (text.trim_matches('"').to_string(), false)
            }
            TokenKind::LessThan => {
                // Bracketed form: take the raw text up to `>` on this line.
                let start = first.span.end;
                let mut end = start;
                loop {
                    let raw = self.raw_lexer_next();
                    if raw.kind == TokenKind::Eof || raw.newline_before {
                        self.push_back(raw);
                        self.sink.emit(errors::error_expected_include_name(dspan));
                        return;
                    }
                    if raw.kind == TokenKind::GreaterThan {
                        break;
                    }
                    end = raw.span.end;
                }
                let span = Span::new(first.span.file, start, end);
                (self.snippet_owned(span), true)
            }
            _ => {
                self.sink.emit(errors::error_expected_include_name(first.span));
                self.resync_to_line_end();
                return;
            }
        };
        self.expect_directive_end();

        if self.lexers.len() >= MAX_INCLUDE_DEPTH {
            self.sink
                .emit(errors::error_include_depth(MAX_INCLUDE_DEPTH, dspan));
            return;
        }
        let current = self.lexers.last().expect("lexer stack is never empty").file();
        match self.db.resolve_include(&name, current, system) {
            Some(file) => {
                let content = self.db.get_file(file).content.clone();
                self.lexers.push(Lexer::new(content, file, self.sink));
            }
            None => {
                self.sink.emit(errors::error_file_not_found(&name, dspan));
            }
        }
    }

    fn handle_conditional(&mut self, dspan: Span, negated: bool) {
        let Some(name_tok) = self.directive_arg(dspan) else {
            self.cond_stack.push(CondFrame { any_taken: true });
            return;
        };
        if name_tok.kind != TokenKind::Identifier {
            self.sink.emit(errors::error_expected_identifier(name_tok.span));
            self.resync_to_line_end();
            self.cond_stack.push(CondFrame { any_taken: true });
            return;
        }
        let text = self.snippet_owned(name_tok.span);
        let defined = self.is_defined(&text);
        let taken = defined != negated;
        self.cond_stack.push(CondFrame { any_taken: taken });
        if !taken {
            self.skip_inactive_branch();
        }
    }

    /// Consumes tokens until a branch of the innermost conditional becomes
    /// active or the conditional ends.
    fn skip_inactive_branch(&mut self) {
        let mut depth = 0usize;
        loop {
            let raw = self.raw_lexer_next();
            match raw.kind {
                TokenKind::Eof => {
                    self.push_back(raw);
                    return;
                }
                TokenKind::Directive => {
                    let text = self.snippet_owned(raw.span);
                    match directive_kind(text.trim_start_matches('`')) {
                        DirectiveKind::IfDef | DirectiveKind::IfNDef => depth += 1,
                        DirectiveKind::EndIf => {
                            if depth == 0 {
                                self.cond_stack.pop();
                                return;
                            }
                            depth -= 1;
                        }
                        DirectiveKind::ElsIf if depth == 0 => {
                            let Some(name_tok) = self.directive_arg(raw.span) else {
                                continue;
                            };
                            let name = self.snippet_owned(name_tok.span);
                            let frame = self
                                .cond_stack
                                .last_mut()
                                .expect("skipping requires a conditional frame");
                            if !frame.any_taken && self.interner.get(&name).map_or(false, |id| {
                                self.macros.contains_key(&id)
                            }) {
                                frame.any_taken = true;
                                return;
                            }
                        }
                        DirectiveKind::Else if depth == 0 => {
                            let frame = self
                                .cond_stack
                                .last_mut()
                                .expect("skipping requires a conditional frame");
                            if !frame.any_taken {
                                frame.any_taken = true;
                                return;
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    /// Consumes tokens until the `endif` matching the innermost frame.
    fn skip_until_endif(&mut self) {
        let mut depth = 0usize;
        loop {
            let raw = self.raw_lexer_next();
            match raw.kind {
                TokenKind::Eof => {
                    self.push_back(raw);
                    return;
                }
                TokenKind::Directive => {
                    let text = self.snippet_owned(raw.span);
                    match directive_kind(text.trim_start_matches('`')) {
                        DirectiveKind::IfDef | DirectiveKind::IfNDef => depth += 1,
                        DirectiveKind::EndIf => {
                            if depth == 0 {
                                self.cond_stack.pop();
                                return;
                            }
                            depth -= 1;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_timescale(&mut self, dspan: Span) {
        let parse_value = |this: &mut Self, raw: Lexed| -> Option<TimeScaleValue> {
            if raw.kind != TokenKind::TimeLiteral {
                return None;
            }
            let text: String = this
                .snippet_owned(raw.span)
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '_')
                .collect();
            TimeScaleValue::from_text(&text)
        };

        let base = self
            .directive_arg(dspan)
            .and_then(|raw| parse_value(self, raw));
        let slash = self.directive_arg(dspan);
        let precision = match slash {
            Some(raw) if raw.kind == TokenKind::Slash => self
                .directive_arg(dspan)
                .and_then(|raw| parse_value(self, raw)),
            _ => None,
        };

        match (base, precision) {
            (Some(base), Some(precision)) if precision.unit <= base.unit => {
                self.time_scale_changes
                    .push((self.emitted, Some(TimeScale { base, precision })));
                self.expect_directive_end();
            }
            _ => {
                self.sink
                    .emit(errors::error_invalid_directive_arg("time scale", dspan));
                self.resync_to_line_end();
            }
        }
    }

    fn handle_default_nettype(&mut self, dspan: Span) {
        let Some(raw) = self.directive_arg(dspan) else {
            return;
        };
        let text = self.snippet_owned(raw.span);
        match NetKind::from_text(&text) {
            Some(kind) => {
                self.net_type_changes.push((self.emitted, kind));
                self.expect_directive_end();
            }
            None => {
                self.sink
                    .emit(errors::error_invalid_directive_arg("default net type", raw.span));
                self.resync_to_line_end();
            }
        }
    }

    fn handle_begin_keywords(&mut self, dspan: Span) {
        let Some(raw) = self.directive_arg(dspan) else {
            return;
        };
        let text = self.snippet_owned(raw.span);
        match KeywordVersion::from_version_text(text.trim_matches('"')) {
            Some(version) => {
                self.keyword_stack.push(version);
                self.expect_directive_end();
            }
            None => {
                self.sink
                    .emit(errors::error_invalid_directive_arg("keyword version", raw.span));
                self.resync_to_line_end();
            }
        }
    }

    fn handle_macro_usage(&mut self, tok: Token) {
        let text = self.snippet_owned(tok.span);
        let name_text = text.trim_start_matches('`');
        let site = tok.report_span();

        let Some(name) = self.interner.get(name_text) else {
            self.sink.emit(errors::error_unknown_directive(name_text, site));
            return;
        };
        let Some(def) = self.macros.get(&name) else {
            self.sink.emit(errors::error_unknown_directive(name_text, site));
            return;
        };

        if self.expanders.len() >= MAX_EXPANSION_DEPTH {
            self.sink.emit(errors::error_macro_recursion(name_text, site));
            return;
        }

        let formal_count = def.formals.as_ref().map(Vec::len);
        let args = match formal_count {
            None => Vec::new(),
            Some(expected) => {
                let open = self.next_any();
                if open.kind != TokenKind::LeftParen {
                    self.sink
                        .emit(errors::error_macro_arg_count(name_text, expected, 0, site));
                    return;
                }
                let args = self.collect_macro_args();
                if args.len() != expected {
                    self.sink.emit(errors::error_macro_arg_count(
                        name_text,
                        expected,
                        args.len(),
                        site,
                    ));
                    return;
                }
                args
            }
        };

        // Re-borrow the definition: collect_macro_args needed `&mut self`.
        let def = &self.macros[&name];
        self.expanders.push(MacroExpander::start(def, &args, site));
    }

    /// Collects comma-separated, paren-balanced macro argument token lists.
    /// The opening parenthesis has already been consumed.
    fn collect_macro_args(&mut self) -> Vec<Vec<Token>> {
        let mut args = vec![Vec::new()];
        let mut depth = 0usize;
        loop {
            let tok = self.next_any();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::RightParen if depth == 0 => break,
                TokenKind::Comma if depth == 0 => args.push(Vec::new()),
                _ => {
                    match tok.kind {
                        TokenKind::LeftParen
                        | TokenKind::LeftBracket
                        | TokenKind::LeftBrace
                        | TokenKind::ApostropheBrace => depth += 1,
                        TokenKind::RightParen
                        | TokenKind::RightBracket
                        | TokenKind::RightBrace => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    args.last_mut().expect("argument list is never empty").push(tok);
                }
            }
        }
        // `FOO()` is a single empty argument only if the macro wants one;
        // an entirely empty list means zero arguments.
        if args.len() == 1 && args[0].is_empty() {
            args.clear();
        }
        args
    }
}

/// The result of running the preprocessor over a root file.
pub struct PreprocessedSource {
    /// The token stream, ending with a single EOF token.
    pub tokens: Vec<Token>,
    /// The trivia table tokens index into.
    pub trivia: Vec<Trivia>,
    /// The `default_nettype` in effect before any directives.
    pub default_net_type: NetKind,
    /// Net type changes keyed by token index.
    pub net_type_changes: Vec<(u32, NetKind)>,
    /// Time scale changes keyed by token index (None = reset).
    pub time_scale_changes: Vec<(u32, Option<TimeScale>)>,
}

impl PreprocessedSource {
    /// The `default_nettype` in effect at the given token index.
    pub fn net_type_at(&self, token_index: usize) -> NetKind {
        let mut current = self.default_net_type;
        for &(idx, kind) in &self.net_type_changes {
            if idx as usize <= token_index {
                current = kind;
            } else {
                break;
            }
        }
        current
    }

    /// The `timescale` in effect at the given token index.
    pub fn time_scale_at(&self, token_index: usize) -> Option<TimeScale> {
        let mut current = None;
        for &(idx, ts) in &self.time_scale_changes {
            if idx as usize <= token_index {
                current = ts;
            } else {
                break;
            }
        }
        current
    }
}

/// Runs the preprocessor over a file, producing the complete token stream.
pub fn preprocess(
    file: FileId,
    db: &mut SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
    options: &ParseOptions,
) -> PreprocessedSource {
    let mut pp = Preprocessor::new(file, db, interner, sink, options);
    let mut tokens = Vec::new();
    loop {
        let tok = pp.next_token();
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    PreprocessedSource {
        tokens,
        trivia: pp.trivia,
        default_net_type: options.default_net_type,
        net_type_changes: pp.net_type_changes,
        time_scale_changes: pp.time_scale_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (PreprocessedSource, SourceDb, Interner, DiagnosticSink) {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let options = ParseOptions::default();
        let pre = preprocess(file, &mut db, &interner, &sink, &options);
        (pre, db, interner, sink)
    }

    fn texts(pre: &PreprocessedSource, db: &SourceDb) -> Vec<String> {
        pre.tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| db.snippet(t.span).to_string())
            .collect()
    }

    #[test]
    fn object_macro_expansion() {
        let (pre, db, _, sink) = run("`define WIDTH 8\nwire [`WIDTH-1:0] w;");
        assert!(!sink.has_errors());
        let texts = texts(&pre, &db);
        assert_eq!(
            texts,
            vec!["wire", "[", "8", "-", "1", ":", "0", "]", "w", ";"]
        );
    }

    #[test]
    fn expanded_tokens_record_invocation_site() {
        let (pre, db, _, _) = run("`define VAL 42\n`VAL");
        let tok = pre.tokens[0];
        assert_eq!(db.snippet(tok.span), "42");
        let site = tok.expansion_site.expect("macro tokens carry their site");
        assert_eq!(db.snippet(site), "`VAL");
    }

    #[test]
    fn function_macro_with_args() {
        let (pre, db, _, sink) = run("`define ADD(a, b) (a + b)\nx = `ADD(1, 2);");
        assert!(!sink.has_errors());
        let texts = texts(&pre, &db);
        assert_eq!(
            texts,
            vec!["x", "=", "(", "1", "+", "2", ")", ";"]
        );
    }

    #[test]
    fn nested_macro_expansion() {
        let (pre, db, _, sink) = run("`define A 1\n`define B `A + 2\ny = `B;");
        assert!(!sink.has_errors());
        assert_eq!(texts(&pre, &db), vec!["y", "=", "1", "+", "2", ";"]);
    }

    #[test]
    fn macro_arg_count_mismatch() {
        let (_, _, _, sink) = run("`define ADD(a, b) (a + b)\nx = `ADD(1);");
        assert!(sink.has_errors());
        let diags = sink.diagnostics();
        assert!(diags.iter().any(|d| d.code == errors::E116));
    }

    #[test]
    fn undefined_macro_reports() {
        let (_, _, _, sink) = run("x = `NOPE;");
        assert!(sink.has_errors());
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E114));
    }

    #[test]
    fn undef_removes_macro() {
        let (_, _, _, sink) = run("`define FOO 1\n`undef FOO\nx = `FOO;");
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E114));
    }

    #[test]
    fn redefinition_is_silent() {
        let (pre, db, _, sink) = run("`define FOO 1\n`define FOO 2\nx = `FOO;");
        assert!(!sink.has_errors());
        assert_eq!(texts(&pre, &db), vec!["x", "=", "2", ";"]);
    }

    #[test]
    fn ifdef_skips_undefined_branch() {
        let (pre, db, _, sink) = run("`ifdef MISSING\nbad\n`else\ngood\n`endif");
        assert!(!sink.has_errors());
        assert_eq!(texts(&pre, &db), vec!["good"]);
    }

    #[test]
    fn ifdef_takes_defined_branch() {
        let (pre, db, _, _) = run("`define SEL\n`ifdef SEL\ngood\n`else\nbad\n`endif");
        assert_eq!(texts(&pre, &db), vec!["good"]);
    }

    #[test]
    fn ifndef_and_elsif() {
        let (pre, db, _, _) = run(
            "`define B\n`ifndef B\none\n`elsif B\ntwo\n`else\nthree\n`endif",
        );
        assert_eq!(texts(&pre, &db), vec!["two"]);
    }

    #[test]
    fn nested_conditionals_skip_together() {
        let (pre, db, _, _) = run(
            "`ifdef MISSING\n`ifdef ALSO\nx\n`endif\ny\n`else\nz\n`endif",
        );
        assert_eq!(texts(&pre, &db), vec!["z"]);
    }

    #[test]
    fn unmatched_endif_reports() {
        let (_, _, _, sink) = run("`endif");
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E118));
    }

    #[test]
    fn include_pushes_lexer() {
        let mut db = SourceDb::new();
        let main = db.add_source("main.sv", "before\n`include \"defs.svh\"\nafter".to_string());
        db.add_source("defs.svh", "middle".to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let options = ParseOptions::default();
        let pre = preprocess(main, &mut db, &interner, &sink, &options);
        assert!(!sink.has_errors());
        assert_eq!(texts(&pre, &db), vec!["before", "middle", "after"]);
    }

    #[test]
    fn include_missing_file_reports() {
        let (_, _, _, sink) = run("`include \"nope.svh\"");
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E111));
    }

    #[test]
    fn include_defines_are_visible_after() {
        let mut db = SourceDb::new();
        let main = db.add_source("main.sv", "`include \"defs.svh\"\nx = `W;".to_string());
        db.add_source("defs.svh", "`define W 16".to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let options = ParseOptions::default();
        let pre = preprocess(main, &mut db, &interner, &sink, &options);
        assert!(!sink.has_errors());
        assert_eq!(texts(&pre, &db), vec!["x", "=", "16", ";"]);
    }

    #[test]
    fn keywords_mapped_through_table() {
        let (pre, _, _, _) = run("module m; endmodule");
        let kinds: Vec<_> = pre.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Module,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Endmodule,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn begin_keywords_swaps_table() {
        let (pre, _, _, sink) = run(
            "`begin_keywords \"1364-2005\"\nlogic\n`end_keywords\nlogic",
        );
        assert!(!sink.has_errors());
        let kinds: Vec<_> = pre
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.kind)
            .collect();
        // Under 1364-2005, `logic` is a plain identifier.
        assert_eq!(kinds, vec![TokenKind::Identifier, TokenKind::Logic]);
    }

    #[test]
    fn default_nettype_recorded() {
        let (pre, _, _, _) = run("a\n`default_nettype none\nb");
        assert_eq!(pre.net_type_at(0), NetKind::Wire);
        assert_eq!(pre.net_type_at(1), NetKind::None);
    }

    #[test]
    fn timescale_recorded() {
        let (pre, _, _, sink) = run("`timescale 1ns / 1ps\nmodule");
        assert!(!sink.has_errors());
        let ts = pre.time_scale_at(0).expect("time scale set");
        assert_eq!(ts.base.magnitude, 1);
        assert_eq!(ts.base.unit, crate::ast::TimeUnit::Ns);
        assert_eq!(ts.precision.unit, crate::ast::TimeUnit::Ps);
    }

    #[test]
    fn invalid_timescale_reports() {
        let (_, _, _, sink) = run("`timescale 2ns / 1ps\n");
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E119));
    }

    #[test]
    fn resetall_clears_macros() {
        let (_, _, _, sink) = run("`define FOO 1\n`resetall\nx = `FOO;");
        assert!(sink.diagnostics().iter().any(|d| d.code == errors::E114));
    }

    #[test]
    fn comments_become_trivia_on_next_token() {
        let (pre, _, _, _) = run("// header\nmodule");
        let tok = pre.tokens[0];
        assert_eq!(tok.kind, TokenKind::Module);
        assert_eq!(tok.trivia.len, 1);
        assert!(matches!(
            pre.trivia[tok.trivia.start as usize],
            Trivia::LineComment(_)
        ));
    }

    #[test]
    fn directive_trivia_attached() {
        let (pre, _, _, _) = run("`define X 1\nmodule");
        let tok = pre.tokens[0];
        assert_eq!(tok.kind, TokenKind::Module);
        assert!((0..tok.trivia.len).any(|i| matches!(
            pre.trivia[(tok.trivia.start + i) as usize],
            Trivia::Directive(DirectiveKind::Define, _)
        )));
    }

    #[test]
    fn eof_repeats() {
        let mut db = SourceDb::new();
        let file = db.add_source("t.sv", "x".to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let options = ParseOptions::default();
        let mut pp = Preprocessor::new(file, &mut db, &interner, &sink, &options);
        assert_eq!(pp.next_token().kind, TokenKind::Identifier);
        assert_eq!(pp.next_token().kind, TokenKind::Eof);
        assert_eq!(pp.next_token().kind, TokenKind::Eof);
        assert_eq!(pp.next_token().kind, TokenKind::Eof);
    }
}
