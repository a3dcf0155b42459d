//! Elaboration and semantic analysis for SystemVerilog.
//!
//! This crate turns parsed syntax into a fully elaborated, semantically
//! analyzed design: a hierarchical scope tree of [`symbols`], instantiated
//! modules and interfaces with parameter override semantics (including
//! instance arrays and generate constructs), ordering-aware name lookup,
//! a canonical alias-aware [`types`] lattice, and a recursive constant
//! [`eval`]uator that executes expressions and statements inside constant
//! functions.
//!
//! The entry point is [`Compilation`]: add parsed syntax trees, then ask
//! for the root hierarchy or the full diagnostic set. One compilation owns
//! every symbol, type, and bound expression it creates; all lazy fields
//! are idempotent but not safe for concurrent initialization, so external
//! concurrency must partition by compilation.

#![warn(missing_docs)]

pub mod arena;
mod compilation;
pub mod const_value;
mod declared;
/// Diagnostic codes for elaboration.
pub mod errors;
pub mod eval;
pub mod expr;
mod generate;
mod instance;
pub mod lookup;
pub mod scope;
pub mod stmt;
pub mod symbols;
pub mod types;

pub use arena::{ExprId, StmtId, SymbolId, TypeId};
pub use compilation::{Builtins, Compilation, CompilationOptions};
pub use const_value::ConstantValue;
pub use eval::{EvalContext, LValue};
pub use expr::{BindContext, Expression, ExpressionKind};
pub use lookup::{LookupLocation, PathSeg};
pub use stmt::EvalResult;
pub use types::{ConstantRange, IntegralFlags, Type};

impl<'a> Compilation<'a> {
    /// Resolves a dotted path like `top.block[2].value` from the root of
    /// the hierarchy; a convenience for tools and tests.
    pub fn lookup_path(&mut self, path: &str) -> Option<SymbolId> {
        let root = self.get_root();
        let mut segs = Vec::new();
        for part in path.split('.') {
            let (name_text, selects) = match part.find('[') {
                None => (part, Vec::new()),
                Some(open) => {
                    let mut selects = Vec::new();
                    for piece in part[open..].split('[').skip(1) {
                        let digits = piece.trim_end_matches(']');
                        selects.push(digits.parse::<i32>().ok()?);
                    }
                    (&part[..open], selects)
                }
            };
            segs.push(PathSeg {
                name: self.interner.get(name_text)?,
                span: veris_source::Span::DUMMY,
                selects,
            });
        }
        self.lookup_hierarchical(root, &segs, false)
    }

    /// Resolves a dotted path and returns the symbol's constant value, if
    /// it has one.
    pub fn value_of_path(&mut self, path: &str) -> ConstantValue {
        match self.lookup_path(path) {
            Some(sym) => self.constant_value_of(sym),
            None => ConstantValue::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veris_common::Interner;
    use veris_diagnostics::DiagnosticSink;
    use veris_parser::{parse_file, ParseOptions};
    use veris_source::SourceDb;

    fn compile_and_check(source: &str) -> (Vec<veris_diagnostics::Diagnostic>, String) {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let unit = parse_file(file, &mut db, &interner, &sink, &ParseOptions::default());
        let mut comp = Compilation::new(&db, &interner, &sink);
        comp.add_syntax_tree(&unit);
        let diags = comp.get_all_diagnostics();
        let rendered = diags
            .iter()
            .map(|d| format!("{}: {}", d.code, d.message))
            .collect::<Vec<_>>()
            .join("\n");
        (diags, rendered)
    }

    #[test]
    fn simple_module_no_diagnostics() {
        let (diags, rendered) = compile_and_check(
            "module Top; parameter foo = 4 + 5; endmodule",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {rendered}");
    }

    #[test]
    fn undeclared_identifier_diagnosed() {
        let (diags, _) = compile_and_check(
            "module Top; parameter foo = missing + 1; endmodule",
        );
        assert!(diags.iter().any(|d| d.code == errors::E202));
    }

    #[test]
    fn redefinition_diagnosed() {
        let (diags, _) = compile_and_check(
            "module Top; logic a; logic a; endmodule",
        );
        assert!(diags.iter().any(|d| d.code == errors::E300));
    }

    #[test]
    fn unknown_module_diagnosed() {
        let (diags, _) = compile_and_check(
            "module Top; missing_mod u1 (); endmodule",
        );
        assert!(diags.iter().any(|d| d.code == errors::E200));
    }

    #[test]
    fn circular_type_diagnosed() {
        let (diags, _) = compile_and_check(
            "module Top;
                typedef struct packed { self_t f; } self_t;
                self_t x;
            endmodule",
        );
        assert!(diags.iter().any(|d| d.code == errors::E309));
    }
}
