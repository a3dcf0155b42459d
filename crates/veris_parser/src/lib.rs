//! Preprocessor, lexer, and recursive descent parser for SystemVerilog.
//!
//! This crate turns source text into an immutable AST. The main entry point
//! is [`parse_file`], which runs the preprocessor (include stacking, macro
//! expansion, conditional compilation) and then the parser over the
//! resulting token stream. Errors are reported to the diagnostic sink and
//! represented as poison nodes in the AST for downstream processing.
//!
//! # Architecture
//!
//! - **Lexer** ([`lexer`]): converts source text to raw tokens; keyword
//!   mapping is deferred to the preprocessor so `begin_keywords` can swap
//!   tables mid-stream.
//! - **Preprocessor** ([`preprocessor`]): owns the lexer stack and the
//!   macro expander, resolves directives, and exposes one logical token
//!   stream.
//! - **Parser** ([`parser`]): recursive descent with Pratt expression
//!   parsing and error recovery via poison nodes.
//! - **AST** ([`ast`]): all AST node types with spans and serde support.

#![warn(missing_docs)]

/// AST node types for the parser.
pub mod ast;
mod decl;
/// Diagnostic codes for lexing, preprocessing, and parsing.
pub mod errors;
mod expr;
/// Lexical analyzer for SystemVerilog source text.
pub mod lexer;
/// The preprocessor: directives, includes, and macro expansion.
pub mod preprocessor;
/// Recursive descent parser with error recovery.
pub mod parser;
mod stmt;
/// Token types for the lexer and preprocessor.
pub mod token;

pub use ast::SourceUnit;
pub use preprocessor::{preprocess, PreprocessedSource, Preprocessor};
pub use token::{Token, TokenKind};

use ast::{NetKind, TimeScale};
use token::KeywordVersion;
use veris_common::Interner;
use veris_diagnostics::DiagnosticSink;
use veris_source::{FileId, SourceDb};

/// Configuration options recognized by the parser surface.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Maximum recursion depth while parsing nested expressions and
    /// statements.
    pub max_recursion_depth: u32,
    /// The `default_nettype` inherited by compilation units that don't set
    /// one.
    pub default_net_type: NetKind,
    /// The time scale used when no `timescale` directive or `timeunit`
    /// declaration is in effect.
    pub default_time_scale: Option<TimeScale>,
    /// The keyword table in effect before any `begin_keywords` directive.
    pub keyword_version: KeywordVersion,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1024,
            default_net_type: NetKind::Wire,
            default_time_scale: None,
            keyword_version: KeywordVersion::V1800_2017,
        }
    }
}

/// Preprocesses and parses a source file into an AST.
///
/// Errors are reported to the diagnostic sink; the returned AST contains
/// poison nodes where recovery happened.
pub fn parse_file(
    file: FileId,
    db: &mut SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
    options: &ParseOptions,
) -> SourceUnit {
    let preprocessed = preprocess(file, db, interner, sink, options);
    let mut parser = parser::SvParser::new(&preprocessed, db, interner, sink, options);
    parser.parse_source_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;

    fn parse_source(source: &str) -> (SourceUnit, Vec<veris_diagnostics::Diagnostic>) {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let unit = parse_file(file, &mut db, &interner, &sink, &ParseOptions::default());
        (unit, sink.take_all())
    }

    fn parse_ok(source: &str) -> SourceUnit {
        let (unit, errors) = parse_source(source);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        unit
    }

    #[test]
    fn integration_parameterized_counter() {
        let unit = parse_ok(
            "module counter #(parameter int WIDTH = 8)(
                input logic clk,
                input logic rst,
                output logic [WIDTH-1:0] count
            );
                wire enable;
                assign enable = rst;
            endmodule",
        );
        assert_eq!(unit.items.len(), 1);
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected a module");
        };
        assert_eq!(m.kind, ast::DefinitionKind::Module);
        assert_eq!(m.param_ports.as_ref().unwrap().len(), 1);
        let ast::PortList::Ansi(ref ports) = m.ports else {
            panic!("expected ANSI ports");
        };
        assert_eq!(ports.len(), 3);
        assert_eq!(m.items.len(), 2);
    }

    #[test]
    fn integration_package_and_import() {
        let unit = parse_ok(
            "package my_pkg;
                parameter int WIDTH = 8;
                typedef logic [WIDTH-1:0] data_t;
                function int max(input int a, input int b);
                    return (a > b) ? a : b;
                endfunction
            endpackage

            module top;
                import my_pkg::*;
                logic [7:0] data;
            endmodule",
        );
        assert_eq!(unit.items.len(), 2);
        assert!(matches!(unit.items[0], ast::Item::Package(_)));
        let ast::Item::Package(ref p) = unit.items[0] else {
            unreachable!()
        };
        assert_eq!(p.items.len(), 3);
        let ast::Item::Definition(ref m) = unit.items[1] else {
            panic!("expected module");
        };
        assert_eq!(m.items.len(), 2);
    }

    #[test]
    fn integration_interface_with_modport() {
        let unit = parse_ok(
            "interface axi_if;
                logic valid;
                logic ready;
                logic [31:0] data;

                modport master(output valid, output data, input ready);
                modport slave(input valid, input data, output ready);
            endinterface

            module producer(axi_if.master bus);
            endmodule",
        );
        assert_eq!(unit.items.len(), 2);
        let ast::Item::Definition(ref iface) = unit.items[0] else {
            panic!("expected interface");
        };
        assert_eq!(iface.kind, ast::DefinitionKind::Interface);
        assert_eq!(iface.items.len(), 5);
        let ast::Item::Definition(ref m) = unit.items[1] else {
            panic!("expected module");
        };
        let ast::PortList::Ansi(ref ports) = m.ports else {
            panic!("expected ANSI ports");
        };
        assert_eq!(ports.len(), 1);
        assert!(ports[0].modport.is_some());
    }

    #[test]
    fn integration_struct_and_enum_typedefs() {
        let unit = parse_ok(
            "module top;
                typedef struct packed {
                    logic [7:0] data;
                    logic valid;
                } packet_t;
                typedef enum logic [1:0] {IDLE, RUN, STOP} state_t;

                packet_t pkt;
                state_t state;
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        assert_eq!(m.items.len(), 4);
        assert!(matches!(m.items[0], ast::ModuleItem::Typedef(_)));
    }

    #[test]
    fn integration_generate_loop() {
        let unit = parse_ok(
            "module gen_test #(parameter int N = 4)(
                input logic [N-1:0] din,
                output logic [N-1:0] dout
            );
                genvar i;
                generate
                    for (i = 0; i < N; i = i + 1) begin : gen_buf
                        assign dout[i] = din[i];
                    end
                endgenerate
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        assert_eq!(m.items.len(), 2);
        let ast::ModuleItem::GenerateRegion(ref items, _) = m.items[1] else {
            panic!("expected generate region");
        };
        assert!(matches!(items[0], ast::ModuleItem::LoopGenerate { .. }));
    }

    #[test]
    fn integration_hierarchy_instantiation() {
        let unit = parse_ok(
            "module top;
                logic clk;
                logic [7:0] value;
                counter #(.WIDTH(8)) c1 (.clk(clk), .count(value));
                counter c2 (.*);
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        let ast::ModuleItem::Instantiation(ref inst) = m.items[2] else {
            panic!("expected instantiation");
        };
        assert_eq!(inst.param_assignments.len(), 1);
        assert_eq!(inst.instances.len(), 1);
        assert_eq!(inst.instances[0].connections.len(), 2);
        let ast::ModuleItem::Instantiation(ref inst2) = m.items[3] else {
            panic!("expected instantiation");
        };
        assert!(matches!(
            inst2.instances[0].connections[0],
            ast::PortConnection::Wildcard(_)
        ));
    }

    #[test]
    fn integration_non_ansi_ports() {
        let unit = parse_ok(
            "module counter(clk, rst, count);
                input logic clk;
                input logic rst;
                output logic [7:0] count;
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        let ast::PortList::NonAnsi(ref names) = m.ports else {
            panic!("expected non-ANSI ports");
        };
        assert_eq!(names.len(), 3);
        assert!(matches!(m.items[0], ast::ModuleItem::PortDecl { .. }));
    }

    #[test]
    fn integration_error_recovery() {
        let (unit, errors) = parse_source(
            "module bad;
                wire ;
            endmodule

            module good(input logic clk);
                logic [7:0] data;
            endmodule",
        );
        assert!(unit.items.len() >= 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn integration_end_labels() {
        let unit = parse_ok(
            "module top;
            endmodule : top

            package my_pkg;
            endpackage : my_pkg",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        assert!(m.end_label.is_some());
        let ast::Item::Package(ref p) = unit.items[1] else {
            panic!("expected package");
        };
        assert!(p.end_label.is_some());
    }

    #[test]
    fn integration_macros_through_parse() {
        let unit = parse_ok(
            "`define WIDTH 8
            module m;
                logic [`WIDTH-1:0] data;
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        assert_eq!(m.items.len(), 1);
    }

    #[test]
    fn integration_serde_roundtrip() {
        let unit = parse_ok(
            "module top(input logic clk, output logic [7:0] data);
                assign data = 8'hFF;
            endmodule",
        );
        let json = serde_json::to_string(&unit).unwrap();
        let back: SourceUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.items.len(), unit.items.len());
    }

    #[test]
    fn integration_default_nettype_metadata() {
        let unit = parse_ok(
            "`default_nettype none
            module m;
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        assert_eq!(m.default_net_type, ast::NetKind::None);
    }

    #[test]
    fn integration_timescale_metadata() {
        let unit = parse_ok(
            "`timescale 1ns / 1ps
            module m;
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        let ts = m.time_scale.expect("time scale captured");
        assert_eq!(ts.base.unit, ast::TimeUnit::Ns);
    }

    #[test]
    fn integration_function_with_statements() {
        let unit = parse_ok(
            "module top;
                function int clamp(input int v, input int lo, input int hi);
                    if (v < lo) return lo;
                    else if (v > hi) return hi;
                    return v;
                endfunction : clamp
            endmodule",
        );
        let ast::Item::Definition(ref m) = unit.items[0] else {
            panic!("expected module");
        };
        let ast::ModuleItem::Subroutine(ref f) = m.items[0] else {
            panic!("expected function");
        };
        assert_eq!(f.args.len(), 3);
        assert_eq!(f.body.len(), 2);
        assert_eq!(f.end_label, Some(f.name));
    }
}
