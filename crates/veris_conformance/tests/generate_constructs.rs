//! Generate constructs: if/case selection and loop expansion.

use veris_conformance::{full_pipeline, render, Pipeline};
use veris_elaborate::{errors, symbols::SymbolKind, SymbolId};

#[test]
fn loop_generate_creates_indexed_blocks() {
    let p = Pipeline::new(
        "module m;
            for (genvar i = 0; i < 4; i = i + 1) begin : g
                localparam int v = i * 2;
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    assert_eq!(comp.value_of_path("m.g[0].v").as_i64(), Some(0));
    assert_eq!(comp.value_of_path("m.g[2].v").as_i64(), Some(4));
    assert_eq!(comp.value_of_path("m.g[3].v").as_i64(), Some(6));

    // The loop variable is visible inside each block as a localparam.
    assert_eq!(comp.value_of_path("m.g[3].i").as_i64(), Some(3));
}

#[test]
fn zero_iteration_loop_creates_uninstantiated_block() {
    let p = Pipeline::new(
        "module m;
            for (genvar i = 0; i < 0; i = i + 1) begin : g
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    let mut found = false;
    for i in 0..comp.symbol_count() {
        let id = SymbolId::from_raw(i as u32);
        if let SymbolKind::GenerateBlockArray { entries, .. } = &comp.symbol(id).kind {
            assert!(entries.is_empty());
            let members = comp.symbol(id).scope().unwrap().members.clone();
            assert_eq!(members.len(), 1);
            assert!(matches!(
                comp.symbol(members[0]).kind,
                SymbolKind::GenerateBlock {
                    is_instantiated: false,
                    ..
                }
            ));
            found = true;
        }
    }
    assert!(found, "expected a generate block array");
}

#[test]
fn loop_generate_with_separate_genvar() {
    let p = Pipeline::new(
        "module m;
            genvar i;
            for (i = 0; i < 2; i = i + 1) begin : g
                localparam int v = i;
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.g[1].v").as_i64(), Some(1));
}

#[test]
fn loop_variable_must_be_a_genvar() {
    let diags = full_pipeline(
        "module m;
            int i;
            for (i = 0; i < 2; i = i + 1) begin : g
            end
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E802));
}

#[test]
fn undeclared_loop_variable() {
    let diags = full_pipeline(
        "module m;
            for (i = 0; i < 2; i = i + 1) begin : g
            end
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E202));
}

#[test]
fn genvar_with_unknown_bits() {
    let diags = full_pipeline(
        "module m;
            for (genvar i = 1'bx; i < 2; i = i + 1) begin : g
            end
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E800));
}

#[test]
fn case_generate_selects_first_match() {
    let p = Pipeline::new(
        "module m;
            parameter int MODE = 2;
            case (MODE)
                1: begin : cfg
                    localparam int r = 10;
                end
                2: begin : cfg
                    localparam int r = 20;
                end
                default: begin : cfg
                    localparam int r = 30;
                end
            endcase
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.cfg.r").as_i64(), Some(20));
}

#[test]
fn case_generate_default_taken_when_nothing_matches() {
    let p = Pipeline::new(
        "module m;
            parameter int MODE = 9;
            case (MODE)
                1: begin : cfg localparam int r = 10; end
                default: begin : cfg localparam int r = 30; end
            endcase
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.cfg.r").as_i64(), Some(30));
}

#[test]
fn case_generate_duplicate_match_warns() {
    let diags = full_pipeline(
        "module m;
            case (1)
                1: begin : a end
                1: begin : b end
            endcase
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::W800));
}

#[test]
fn case_generate_no_match_no_default() {
    let diags = full_pipeline(
        "module m;
            case (5)
                1: begin : a end
                2: begin : b end
            endcase
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E803));
}

#[test]
fn directly_nested_conditionals_share_identity() {
    let p = Pipeline::new(
        "module m;
            parameter A = 1;
            parameter B = 1;
            if (A)
                if (B) begin : g
                    localparam int v = 5;
                end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.g.v").as_i64(), Some(5));
}

#[test]
fn uninstantiated_branch_with_bad_content_stays_quiet() {
    let p = Pipeline::new(
        "module m;
            parameter USE_FAST = 0;
            if (USE_FAST) begin : impl
                missing_module u1 ();
            end else begin : impl
                localparam int v = 1;
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    // The unknown module sits in the unselected branch and is never
    // elaborated.
    assert!(
        !diags.iter().any(|d| d.code == errors::E200),
        "diagnostics:\n{}",
        render(&diags)
    );
    assert_eq!(comp.value_of_path("m.impl.v").as_i64(), Some(1));
}

#[test]
fn generate_region_is_transparent() {
    let p = Pipeline::new(
        "module m;
            parameter int N = 2;
            generate
                if (N == 2) begin : sized
                    localparam int v = 99;
                end
            endgenerate
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.sized.v").as_i64(), Some(99));
}

#[test]
fn generate_blocks_can_contain_instances() {
    let p = Pipeline::new(
        "module Leaf #(parameter int K = 0)();
        endmodule
        module m;
            for (genvar i = 0; i < 2; i = i + 1) begin : cells
                Leaf #(.K(i)) leaf ();
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.cells[0].leaf.K").as_i64(), Some(0));
    assert_eq!(comp.value_of_path("m.cells[1].leaf.K").as_i64(), Some(1));
}
