//! Preprocessor behavior observed through the full pipeline: macros,
//! includes, and conditional compilation feeding elaboration.

use veris_conformance::{render, Pipeline};
use veris_parser::errors as parse_errors;

#[test]
fn macro_flows_into_parameter_value() {
    let p = Pipeline::new(
        "`define WIDTH 8
        module m;
            localparam int W = `WIDTH;
            logic [`WIDTH-1:0] data;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.W").as_i64(), Some(8));

    let data = comp.lookup_path("m.data").expect("data resolves");
    let ty = comp.declared_type_of(data);
    assert_eq!(comp.bit_width(ty), 8);
}

#[test]
fn function_like_macro_in_expressions() {
    let p = Pipeline::new(
        "`define MAX(a, b) ((a) > (b) ? (a) : (b))
        module m;
            localparam int M = `MAX(3, 11);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.M").as_i64(), Some(11));
}

#[test]
fn include_provides_definitions() {
    let p = Pipeline::with_files(
        "`include \"defs.svh\"
        module m;
            localparam int W = `DATA_W;
            data_t bus;
        endmodule",
        &[(
            "defs.svh",
            "`define DATA_W 16
            typedef logic [15:0] data_t;",
        )],
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.W").as_i64(), Some(16));

    let bus = comp.lookup_path("m.bus").expect("bus resolves");
    let ty = comp.declared_type_of(bus);
    assert_eq!(comp.bit_width(ty), 16);
}

#[test]
fn conditional_compilation_selects_body() {
    let p = Pipeline::new(
        "`define FAST
        module m;
        `ifdef FAST
            localparam int MODE = 1;
        `else
            localparam int MODE = 2;
        `endif
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.MODE").as_i64(), Some(1));
}

#[test]
fn macro_in_parameter_override() {
    let p = Pipeline::new(
        "`define W 12
        module Leaf #(parameter int W = 1)();
        endmodule
        module Top;
            Leaf #(.W(`W)) u ();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.u.W").as_i64(), Some(12));
}

#[test]
fn include_depth_limit_reported() {
    let p = Pipeline::with_files(
        "`include \"loop.svh\"\nmodule m; endmodule",
        &[("loop.svh", "`include \"loop.svh\"")],
    );
    let diags = p.sink.diagnostics();
    assert!(diags.iter().any(|d| d.code == parse_errors::E110));
}

#[test]
fn missing_include_reported() {
    let p = Pipeline::new("`include \"nope.svh\"\nmodule m; endmodule");
    let diags = p.sink.diagnostics();
    assert!(diags.iter().any(|d| d.code == parse_errors::E111));
}

#[test]
fn macro_tokens_report_through_invocation_site() {
    // The undeclared name comes out of a macro body; the diagnostic must
    // land on real source text either way.
    let p = Pipeline::new(
        "`define BAD_INIT missing_name
        module m;
            localparam int x = `BAD_INIT;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    let undeclared = diags
        .iter()
        .find(|d| d.code == veris_elaborate::errors::E202)
        .expect("undeclared identifier surfaces");
    let snippet = p.db.snippet(undeclared.primary_span);
    assert_eq!(snippet, "missing_name");
}

#[test]
fn default_nettype_none_metadata() {
    let p = Pipeline::new(
        "`default_nettype none
        module m;
        endmodule",
    );
    let veris_parser::ast::Item::Definition(ref decl) = p.unit.items[0] else {
        panic!("expected a definition");
    };
    assert_eq!(decl.default_net_type, veris_parser::ast::NetKind::None);
}
