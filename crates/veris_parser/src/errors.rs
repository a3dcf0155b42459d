//! Diagnostic codes and helper functions for lexing, preprocessing, and
//! parsing errors.
//!
//! Error codes `E100`--`E109` cover lexical failures, `E110`--`E129` cover
//! preprocessor failures, and `E150`--`E159` cover parse failures.

use veris_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use veris_source::Span;

/// Unterminated block comment.
pub const E100: DiagnosticCode = DiagnosticCode::new(Category::Error, 100);

/// Unexpected character in the input.
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// Unterminated string literal.
pub const E102: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);

/// Expected a digit (in a real literal's fraction or exponent).
pub const E103: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);

/// Include depth exceeded the maximum nesting level.
pub const E110: DiagnosticCode = DiagnosticCode::new(Category::Error, 110);

/// Include file could not be found.
pub const E111: DiagnosticCode = DiagnosticCode::new(Category::Error, 111);

/// Expected the end of a directive; extra tokens were dropped.
pub const E112: DiagnosticCode = DiagnosticCode::new(Category::Error, 112);

/// Macro operators used outside a macro definition.
pub const E113: DiagnosticCode = DiagnosticCode::new(Category::Error, 113);

/// Unknown macro or compiler directive.
pub const E114: DiagnosticCode = DiagnosticCode::new(Category::Error, 114);

/// Macro expansion recursed too deeply.
pub const E115: DiagnosticCode = DiagnosticCode::new(Category::Error, 115);

/// Wrong number of arguments for a function-like macro.
pub const E116: DiagnosticCode = DiagnosticCode::new(Category::Error, 116);

/// Expected a file name after `include`.
pub const E117: DiagnosticCode = DiagnosticCode::new(Category::Error, 117);

/// Conditional directive without a matching `ifdef`/`ifndef`.
pub const E118: DiagnosticCode = DiagnosticCode::new(Category::Error, 118);

/// Invalid argument to a directive (timescale, nettype, keyword version).
pub const E119: DiagnosticCode = DiagnosticCode::new(Category::Error, 119);

/// Expected an expression.
pub const E150: DiagnosticCode = DiagnosticCode::new(Category::Error, 150);

/// Expected an identifier.
pub const E151: DiagnosticCode = DiagnosticCode::new(Category::Error, 151);

/// Expected a particular token.
pub const E152: DiagnosticCode = DiagnosticCode::new(Category::Error, 152);

/// Parser recursion limit exceeded.
pub const E153: DiagnosticCode = DiagnosticCode::new(Category::Error, 153);

/// Expected a module item or declaration.
pub const E154: DiagnosticCode = DiagnosticCode::new(Category::Error, 154);

/// Creates a diagnostic for an unterminated block comment.
pub fn error_unterminated_comment(span: Span) -> Diagnostic {
    Diagnostic::error(E100, "unterminated block comment", span)
}

/// Creates a diagnostic for an unexpected character.
pub fn error_unexpected_char(c: char, span: Span) -> Diagnostic {
    Diagnostic::error(E101, format!("unexpected character `{c}`"), span)
}

/// Creates a diagnostic for an unterminated string literal.
pub fn error_unterminated_string(span: Span) -> Diagnostic {
    Diagnostic::error(E102, "unterminated string literal", span)
}

/// Creates a diagnostic for a missing digit in a numeric literal.
pub fn error_expected_digit(span: Span) -> Diagnostic {
    Diagnostic::error(E103, "expected a digit", span)
}

/// Creates a diagnostic for exceeding the include nesting limit.
pub fn error_include_depth(max: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E110,
        format!("exceeded maximum include depth of {max}"),
        span,
    )
}

/// Creates a diagnostic for an unresolved include file.
pub fn error_file_not_found(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E111, format!("could not find include file \"{name}\""), span)
}

/// Creates a diagnostic for trailing tokens on a directive line.
pub fn error_expected_end_of_directive(span: Span) -> Diagnostic {
    Diagnostic::error(E112, "expected end of directive", span)
}

/// Creates a diagnostic for macro operators outside a definition.
pub fn error_macro_ops_outside_definition(span: Span) -> Diagnostic {
    Diagnostic::error(
        E113,
        "macro operators may only appear inside a macro definition",
        span,
    )
}

/// Creates a diagnostic for an unknown directive or macro.
pub fn error_unknown_directive(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E114, format!("unknown macro or compiler directive `{name}`"), span)
}

/// Creates a diagnostic for runaway macro expansion.
pub fn error_macro_recursion(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E115, format!("expansion of macro `{name}` recursed too deeply"), span)
}

/// Creates a diagnostic for a macro argument count mismatch.
pub fn error_macro_arg_count(name: &str, expected: usize, got: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E116,
        format!("macro `{name}` expects {expected} argument(s), got {got}"),
        span,
    )
}

/// Creates a diagnostic for a malformed include file name.
pub fn error_expected_include_name(span: Span) -> Diagnostic {
    Diagnostic::error(E117, "expected a file name after `include", span)
}

/// Creates a diagnostic for an unmatched conditional directive.
pub fn error_unexpected_conditional(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E118,
        format!("`{name} without a matching `ifdef or `ifndef"),
        span,
    )
}

/// Creates a diagnostic for a bad directive argument.
pub fn error_invalid_directive_arg(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E119, format!("invalid {what}"), span)
}

/// Creates a diagnostic for a missing expression.
pub fn error_expected_expression(span: Span) -> Diagnostic {
    Diagnostic::error(E150, "expected an expression", span)
}

/// Creates a diagnostic for a missing identifier.
pub fn error_expected_identifier(span: Span) -> Diagnostic {
    Diagnostic::error(E151, "expected an identifier", span)
}

/// Creates a diagnostic for a missing token.
pub fn error_expected_token(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E152, format!("expected `{what}`"), span)
}

/// Creates a diagnostic for exceeding the parser recursion limit.
pub fn error_too_deep(span: Span) -> Diagnostic {
    Diagnostic::error(E153, "expression nesting is too deep to process", span)
}

/// Creates a diagnostic for an unexpected token at item level.
pub fn error_expected_member(span: Span) -> Diagnostic {
    Diagnostic::error(E154, "expected a declaration or module item", span)
}

/// Creates a diagnostic noting a previous definition location.
pub fn note_previous_definition(diag: Diagnostic, span: Span) -> Diagnostic {
    diag.with_label(Label::secondary(span, "previously defined here"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E100}"), "E100");
        assert_eq!(format!("{E110}"), "E110");
        assert_eq!(format!("{E153}"), "E153");
    }

    #[test]
    fn include_depth_diagnostic() {
        let d = error_include_depth(32, Span::DUMMY);
        assert_eq!(d.code, E110);
        assert!(d.message.contains("32"));
    }

    #[test]
    fn file_not_found_diagnostic() {
        let d = error_file_not_found("defs.svh", Span::DUMMY);
        assert_eq!(d.code, E111);
        assert!(d.message.contains("defs.svh"));
    }

    #[test]
    fn macro_arg_count_diagnostic() {
        let d = error_macro_arg_count("MAX", 2, 3, Span::DUMMY);
        assert_eq!(d.code, E116);
        assert!(d.message.contains("MAX"));
    }

    #[test]
    fn previous_definition_label() {
        let d = note_previous_definition(error_expected_identifier(Span::DUMMY), Span::DUMMY);
        assert_eq!(d.labels.len(), 1);
    }
}
