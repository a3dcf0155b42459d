//! Lexical analyzer for SystemVerilog source text.
//!
//! Converts source text into raw tokens, handling operators, sized/based
//! literals (`4'b1010`), unbased unsized literals (`'0`), real and time
//! literals, string literals with C-style escapes, escaped identifiers,
//! system identifiers, and backtick directives. Identifiers are emitted as
//! [`TokenKind::Identifier`]; mapping to keyword kinds happens in the
//! preprocessor, which owns the active keyword table. Comments are emitted
//! as tokens so the preprocessor can turn them into trivia.

use crate::errors;
use crate::token::TokenKind;
use veris_diagnostics::DiagnosticSink;
use veris_source::{FileId, Span};

/// A raw token produced by the lexer, before keyword mapping and directive
/// handling.
#[derive(Clone, Copy, Debug)]
pub struct Lexed {
    /// The token kind (identifiers not yet mapped to keywords).
    pub kind: TokenKind,
    /// The source span of the token text.
    pub span: Span,
    /// True if at least one newline separated this token from the previous
    /// one. Backslash-newline continuations do not count.
    pub newline_before: bool,
}

/// A cursor that lexes one source buffer.
///
/// The preprocessor keeps a stack of these, one per open include file. Each
/// lexer owns a copy of its buffer so the source database stays free for
/// include loading while lexing is in progress.
pub struct Lexer<'a> {
    source: Vec<u8>,
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over the given file content.
    pub fn new(source: String, file: FileId, sink: &'a DiagnosticSink) -> Self {
        Self {
            source: source.into_bytes(),
            pos: 0,
            file,
            sink,
        }
    }

    /// The file this lexer reads from.
    pub fn file(&self) -> FileId {
        self.file
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        let idx = self.pos + offset;
        if idx < self.source.len() {
            self.source[idx]
        } else {
            0
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    /// Skips whitespace, returning whether a newline was crossed.
    /// Backslash-newline is treated as plain whitespace (a continuation).
    fn skip_whitespace(&mut self) -> bool {
        let mut newline = false;
        loop {
            match self.peek() {
                b'\n' => {
                    newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\\' if self.peek_at(1) == b'\n' => self.pos += 2,
                b'\\' if self.peek_at(1) == b'\r' && self.peek_at(2) == b'\n' => self.pos += 3,
                _ => return newline,
            }
        }
    }

    /// Lexes the next raw token.
    pub fn next_token(&mut self) -> Lexed {
        let newline_before = self.skip_whitespace();
        if self.pos >= self.source.len() {
            return Lexed {
                kind: TokenKind::Eof,
                span: Span::new(self.file, self.pos as u32, self.pos as u32),
                newline_before,
            };
        }
        let start = self.pos;
        // Comments come back as tokens; the preprocessor files them as
        // trivia on the next real token.
        if self.peek() == b'/' && self.peek_at(1) == b'/' {
            self.pos += 2;
            while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                self.pos += 1;
            }
            return Lexed {
                kind: TokenKind::LineComment,
                span: self.span_from(start),
                newline_before,
            };
        }
        if self.peek() == b'/' && self.peek_at(1) == b'*' {
            self.pos += 2;
            loop {
                if self.pos >= self.source.len() {
                    self.sink
                        .emit(errors::error_unterminated_comment(self.span_from(start)));
                    break;
                }
                if self.source[self.pos] == b'*' && self.peek_at(1) == b'/' {
                    self.pos += 2;
                    break;
                }
                self.pos += 1;
            }
            return Lexed {
                kind: TokenKind::BlockComment,
                span: self.span_from(start),
                newline_before,
            };
        }
        Lexed {
            newline_before,
            ..self.lex_one(start)
        }
    }

    fn lex_one(&mut self, start: usize) -> Lexed {
        let c = self.source[self.pos];
        let kind = match c {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => return self.lex_identifier(start),
            b'0'..=b'9' => return self.lex_number(start),
            b'"' => return self.lex_string(start),
            b'\\' => return self.lex_escaped_identifier(start),
            b'$' => return self.lex_system_identifier(start),
            b'`' => return self.lex_directive(start),
            b'\'' => return self.lex_tick(start),
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semicolon),
            b'#' => self.single(TokenKind::Hash),
            b'@' => self.single(TokenKind::At),
            b'?' => self.single(TokenKind::Question),
            b'.' => self.single(TokenKind::Dot),
            b':' => {
                if self.peek_at(1) == b':' {
                    self.multi(2, TokenKind::ColonColon)
                } else {
                    self.single(TokenKind::Colon)
                }
            }
            b'=' => match (self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
                (b'=', b'=', _) => self.multi(3, TokenKind::TripleEquals),
                (b'=', b'?', _) => self.multi(3, TokenKind::WildcardEq),
                (b'=', _, _) => self.multi(2, TokenKind::DoubleEquals),
                _ => self.single(TokenKind::Equals),
            },
            b'!' => match (self.peek_at(1), self.peek_at(2)) {
                (b'=', b'=') => self.multi(3, TokenKind::BangDoubleEquals),
                (b'=', b'?') => self.multi(3, TokenKind::WildcardNeq),
                (b'=', _) => self.multi(2, TokenKind::BangEquals),
                _ => self.single(TokenKind::Bang),
            },
            b'<' => match (self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
                (b'<', b'<', b'=') => self.multi(4, TokenKind::TripleLessEquals),
                (b'<', b'<', _) => self.multi(3, TokenKind::TripleLess),
                (b'<', b'=', _) => self.multi(3, TokenKind::DoubleLessEquals),
                (b'<', _, _) => self.multi(2, TokenKind::DoubleLess),
                (b'-', b'>', _) => self.multi(3, TokenKind::LeftRightArrow),
                (b'=', _, _) => self.multi(2, TokenKind::LessEquals),
                _ => self.single(TokenKind::LessThan),
            },
            b'>' => match (self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
                (b'>', b'>', b'=') => self.multi(4, TokenKind::TripleGreaterEquals),
                (b'>', b'>', _) => self.multi(3, TokenKind::TripleGreater),
                (b'>', b'=', _) => self.multi(3, TokenKind::DoubleGreaterEquals),
                (b'>', _, _) => self.multi(2, TokenKind::DoubleGreater),
                (b'=', _, _) => self.multi(2, TokenKind::GreaterEquals),
                _ => self.single(TokenKind::GreaterThan),
            },
            b'+' => match self.peek_at(1) {
                b'+' => self.multi(2, TokenKind::PlusPlus),
                b'=' => self.multi(2, TokenKind::PlusEquals),
                b':' => self.multi(2, TokenKind::PlusColon),
                _ => self.single(TokenKind::Plus),
            },
            b'-' => match self.peek_at(1) {
                b'-' => self.multi(2, TokenKind::MinusMinus),
                b'=' => self.multi(2, TokenKind::MinusEquals),
                b':' => self.multi(2, TokenKind::MinusColon),
                b'>' => self.multi(2, TokenKind::Arrow),
                _ => self.single(TokenKind::Minus),
            },
            b'*' => match self.peek_at(1) {
                b'*' => self.multi(2, TokenKind::DoubleStar),
                b'=' => self.multi(2, TokenKind::StarEquals),
                _ => self.single(TokenKind::Star),
            },
            b'/' => match self.peek_at(1) {
                b'=' => self.multi(2, TokenKind::SlashEquals),
                _ => self.single(TokenKind::Slash),
            },
            b'%' => match self.peek_at(1) {
                b'=' => self.multi(2, TokenKind::PercentEquals),
                _ => self.single(TokenKind::Percent),
            },
            b'&' => match self.peek_at(1) {
                b'&' => self.multi(2, TokenKind::DoubleAmpersand),
                b'=' => self.multi(2, TokenKind::AmpersandEquals),
                _ => self.single(TokenKind::Ampersand),
            },
            b'|' => match self.peek_at(1) {
                b'|' => self.multi(2, TokenKind::DoublePipe),
                b'=' => self.multi(2, TokenKind::PipeEquals),
                _ => self.single(TokenKind::Pipe),
            },
            b'^' => match self.peek_at(1) {
                b'~' => self.multi(2, TokenKind::TildeCaret),
                b'=' => self.multi(2, TokenKind::CaretEquals),
                _ => self.single(TokenKind::Caret),
            },
            b'~' => match self.peek_at(1) {
                b'^' => self.multi(2, TokenKind::TildeCaret),
                b'&' => self.multi(2, TokenKind::TildeAmpersand),
                b'|' => self.multi(2, TokenKind::TildePipe),
                _ => self.single(TokenKind::Tilde),
            },
            other => {
                self.pos += 1;
                self.sink.emit(errors::error_unexpected_char(
                    other as char,
                    self.span_from(start),
                ));
                TokenKind::Error
            }
        };
        Lexed {
            kind,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn multi(&mut self, len: usize, kind: TokenKind) -> TokenKind {
        self.pos += len;
        kind
    }

    fn lex_identifier(&mut self, start: usize) -> Lexed {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
            self.pos += 1;
        }
        Lexed {
            kind: TokenKind::Identifier,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn lex_escaped_identifier(&mut self, start: usize) -> Lexed {
        self.pos += 1;
        while self.pos < self.source.len() && !self.source[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Lexed {
            kind: TokenKind::EscapedIdentifier,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn lex_system_identifier(&mut self, start: usize) -> Lexed {
        self.pos += 1;
        let kind = if matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'_') {
            while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
                self.pos += 1;
            }
            TokenKind::SystemIdentifier
        } else {
            TokenKind::Dollar
        };
        Lexed {
            kind,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn lex_directive(&mut self, start: usize) -> Lexed {
        self.pos += 1;
        let kind = if matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'_') {
            while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
                self.pos += 1;
            }
            TokenKind::Directive
        } else {
            // A stray backtick (or a macro operator like ``` or `").
            self.sink
                .emit(errors::error_macro_ops_outside_definition(self.span_from(start)));
            TokenKind::Error
        };
        Lexed {
            kind,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn lex_string(&mut self, start: usize) -> Lexed {
        self.pos += 1;
        loop {
            match self.peek() {
                0 if self.pos >= self.source.len() => {
                    self.sink
                        .emit(errors::error_unterminated_string(self.span_from(start)));
                    break;
                }
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 2.min(self.source.len() - self.pos);
                }
                b'\n' => {
                    self.sink
                        .emit(errors::error_unterminated_string(self.span_from(start)));
                    break;
                }
                _ => self.pos += 1,
            }
        }
        Lexed {
            kind: TokenKind::StringLiteral,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn eat_digits(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        let mut any = false;
        while pred(self.peek()) || self.peek() == b'_' {
            any |= self.peek() != b'_';
            self.pos += 1;
        }
        any
    }

    fn lex_number(&mut self, start: usize) -> Lexed {
        self.eat_digits(|c| c.is_ascii_digit());

        // Real literal: fraction and/or exponent.
        let mut is_real = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_real = true;
            self.pos += 1;
            self.eat_digits(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), b'e' | b'E') {
            let mut ahead = 1;
            if matches!(self.peek_at(1), b'+' | b'-') {
                ahead = 2;
            }
            if self.peek_at(ahead).is_ascii_digit() {
                is_real = true;
                self.pos += ahead;
                if !self.eat_digits(|c| c.is_ascii_digit()) {
                    self.sink
                        .emit(errors::error_expected_digit(self.span_from(start)));
                }
            }
        }
        if is_real {
            // A trailing time unit makes this a time literal (e.g. `1.5ns`).
            if self.try_time_suffix() {
                return Lexed {
                    kind: TokenKind::TimeLiteral,
                    span: self.span_from(start),
                    newline_before: false,
                };
            }
            return Lexed {
                kind: TokenKind::RealLiteral,
                span: self.span_from(start),
                newline_before: false,
            };
        }

        if self.try_time_suffix() {
            return Lexed {
                kind: TokenKind::TimeLiteral,
                span: self.span_from(start),
                newline_before: false,
            };
        }

        // A size prefix followed by a based literal lexes as one token:
        // `4'b1010`, allowing spaces around the tick.
        let mut ahead = 0;
        while matches!(self.peek_at(ahead), b' ' | b'\t') {
            ahead += 1;
        }
        if self.peek_at(ahead) == b'\'' && self.based_body_len(ahead + 1).is_some() {
            self.pos += ahead;
            return self.lex_based_literal(start);
        }

        Lexed {
            kind: TokenKind::IntLiteral,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn try_time_suffix(&mut self) -> bool {
        let (a, b) = (self.peek(), self.peek_at(1));
        let len = match (a, b) {
            (b's', _) => 1,
            (b'm' | b'u' | b'n' | b'p' | b'f', b's') => 2,
            _ => return false,
        };
        // Must not continue as an identifier.
        if matches!(self.peek_at(len), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
            return false;
        }
        self.pos += len;
        true
    }

    /// If a based-literal body starts at `offset` past the current position
    /// (just after a tick), returns its length in bytes.
    fn based_body_len(&self, offset: usize) -> Option<usize> {
        let mut i = offset;
        if matches!(self.peek_at(i), b's' | b'S') {
            i += 1;
        }
        if !matches!(self.peek_at(i), b'b' | b'B' | b'o' | b'O' | b'd' | b'D' | b'h' | b'H') {
            return None;
        }
        i += 1;
        while matches!(self.peek_at(i), b' ' | b'\t') {
            i += 1;
        }
        let digit_start = i;
        while matches!(
            self.peek_at(i),
            b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' | b'x' | b'X' | b'z' | b'Z' | b'?' | b'_'
        ) {
            i += 1;
        }
        if i == digit_start {
            return None;
        }
        Some(i - offset)
    }

    fn lex_based_literal(&mut self, start: usize) -> Lexed {
        // Cursor is on the tick.
        let body = self.based_body_len(1).unwrap_or(0);
        self.pos += 1 + body;
        Lexed {
            kind: TokenKind::SizedLiteral,
            span: self.span_from(start),
            newline_before: false,
        }
    }

    fn lex_tick(&mut self, start: usize) -> Lexed {
        // `'{` opens an assignment pattern.
        if self.peek_at(1) == b'{' {
            self.pos += 2;
            return Lexed {
                kind: TokenKind::ApostropheBrace,
                span: self.span_from(start),
                newline_before: false,
            };
        }
        // `'0 '1 'x 'z` unbased unsized literals, unless a base char makes
        // this a based literal.
        if self.based_body_len(1).is_some() {
            return self.lex_based_literal(start);
        }
        if matches!(self.peek_at(1), b'0' | b'1' | b'x' | b'X' | b'z' | b'Z')
            && !matches!(
                self.peek_at(2),
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$'
            )
        {
            self.pos += 2;
            return Lexed {
                kind: TokenKind::UnbasedUnsizedLiteral,
                span: self.span_from(start),
                newline_before: false,
            };
        }
        self.pos += 1;
        Lexed {
            kind: TokenKind::Tick,
            span: self.span_from(start),
            newline_before: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veris_source::SourceDb;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new(db.get_file(file).content.clone(), file, &sink);
        let mut kinds = Vec::new();
        loop {
            let t = lexer.next_token();
            if t.kind == TokenKind::Eof {
                break;
            }
            kinds.push(t.kind);
        }
        kinds
    }

    #[test]
    fn identifiers_not_keyword_mapped() {
        assert_eq!(
            lex_kinds("module foo"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex_kinds("=== ==? <<< <<<= -> <-> +: ::"),
            vec![
                TokenKind::TripleEquals,
                TokenKind::WildcardEq,
                TokenKind::TripleLess,
                TokenKind::TripleLessEquals,
                TokenKind::Arrow,
                TokenKind::LeftRightArrow,
                TokenKind::PlusColon,
                TokenKind::ColonColon,
            ]
        );
    }

    #[test]
    fn sized_literal_is_one_token() {
        assert_eq!(lex_kinds("4'b1010"), vec![TokenKind::SizedLiteral]);
        assert_eq!(lex_kinds("16 'shA5"), vec![TokenKind::SizedLiteral]);
        assert_eq!(lex_kinds("'hFF"), vec![TokenKind::SizedLiteral]);
        assert_eq!(lex_kinds("'b ??0101?1"), vec![TokenKind::SizedLiteral]);
    }

    #[test]
    fn unbased_unsized_literals() {
        assert_eq!(
            lex_kinds("'0 '1 'x 'z"),
            vec![TokenKind::UnbasedUnsizedLiteral; 4]
        );
    }

    #[test]
    fn tick_for_cast() {
        assert_eq!(
            lex_kinds("int'(x)"),
            vec![
                TokenKind::Identifier,
                TokenKind::Tick,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn apostrophe_brace() {
        assert_eq!(
            lex_kinds("'{1}"),
            vec![
                TokenKind::ApostropheBrace,
                TokenKind::IntLiteral,
                TokenKind::RightBrace,
            ]
        );
    }

    #[test]
    fn real_and_time_literals() {
        assert_eq!(lex_kinds("3.5"), vec![TokenKind::RealLiteral]);
        assert_eq!(lex_kinds("1.0e-3"), vec![TokenKind::RealLiteral]);
        assert_eq!(lex_kinds("1ns"), vec![TokenKind::TimeLiteral]);
        assert_eq!(lex_kinds("100ps"), vec![TokenKind::TimeLiteral]);
        // `1nsec` is an integer followed by an identifier.
        assert_eq!(
            lex_kinds("1nsec"),
            vec![TokenKind::IntLiteral, TokenKind::Identifier]
        );
    }

    #[test]
    fn comments_are_tokens() {
        assert_eq!(
            lex_kinds("a // comment\nb /* block */ c"),
            vec![
                TokenKind::Identifier,
                TokenKind::LineComment,
                TokenKind::Identifier,
                TokenKind::BlockComment,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn directives_and_system_identifiers() {
        assert_eq!(
            lex_kinds("`define $clog2 $"),
            vec![
                TokenKind::Directive,
                TokenKind::SystemIdentifier,
                TokenKind::Dollar,
            ]
        );
    }

    #[test]
    fn newline_tracking_with_continuation() {
        let mut db = SourceDb::new();
        let file = db.add_source("t.sv", "a b\nc \\\nd".to_string());
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new(db.get_file(file).content.clone(), file, &sink);
        let a = lexer.next_token();
        let b = lexer.next_token();
        let c = lexer.next_token();
        let d = lexer.next_token();
        assert!(!a.newline_before);
        assert!(!b.newline_before);
        assert!(c.newline_before);
        // Backslash-newline is a continuation, not a line break.
        assert!(!d.newline_before);
    }

    #[test]
    fn string_literals() {
        assert_eq!(lex_kinds("\"hello \\\"x\\\"\""), vec![TokenKind::StringLiteral]);
        let mut db = SourceDb::new();
        let file = db.add_source("t.sv", "\"unterminated".to_string());
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new(db.get_file(file).content.clone(), file, &sink);
        lexer.next_token();
        assert!(sink.has_errors());
    }

    #[test]
    fn escaped_identifier() {
        assert_eq!(lex_kinds("\\my+sig rest"), vec![
            TokenKind::EscapedIdentifier,
            TokenKind::Identifier,
        ]);
    }

    #[test]
    fn unexpected_character_reports() {
        let mut db = SourceDb::new();
        let file = db.add_source("t.sv", "€".to_string());
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new(db.get_file(file).content.clone(), file, &sink);
        let t = lexer.next_token();
        assert_eq!(t.kind, TokenKind::Error);
        assert!(sink.has_errors());
    }
}
