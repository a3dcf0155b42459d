//! Structural invariants of the elaborated design.

use std::collections::HashMap;

use veris_conformance::{render, Pipeline};
use veris_elaborate::{symbols::SymbolKind, SymbolId};

const DESIGN: &str = "package pkg;
    parameter int WIDTH = 8;
    typedef logic [WIDTH-1:0] word_t;
endpackage

module Leaf #(parameter int K = 1)(input logic clk, output logic [K-1:0] q);
endmodule

module Top;
    import pkg::*;
    word_t data;
    typedef word_t alias_t;
    alias_t more;
    logic c;
    logic [3:0] q4;
    Leaf #(.K(4)) leaf (.clk(c), .q(q4));
    localparam int lit = 42;
    for (genvar i = 0; i < 2; i = i + 1) begin : g
        localparam int v = i;
    end
endmodule";

#[test]
fn members_and_name_maps_are_consistent() {
    let p = Pipeline::new(DESIGN);
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    // Every symbol appears in at most one member list, with a matching
    // parent pointer; every name-map entry targets a member of the same
    // scope.
    let mut owner: HashMap<SymbolId, SymbolId> = HashMap::new();
    for i in 0..comp.symbol_count() {
        let scope_id = SymbolId::from_raw(i as u32);
        let Some(scope) = comp.symbol(scope_id).scope() else {
            continue;
        };
        for &member in &scope.members {
            let previous = owner.insert(member, scope_id);
            assert!(
                previous.is_none(),
                "symbol {member:?} appears in two member lists"
            );
            assert_eq!(comp.symbol(member).parent, Some(scope_id));
        }
        for (&name, &target) in &scope.name_map {
            assert!(
                scope.members.contains(&target),
                "name-map entry {name:?} does not target a member"
            );
        }
    }
}

#[test]
fn member_indices_are_monotonic() {
    let p = Pipeline::new(DESIGN);
    let mut comp = p.compile();
    comp.get_all_diagnostics();

    let top = comp.lookup_path("Top").unwrap();
    let members = comp.symbol(top).scope().unwrap().members.clone();
    let mut last = 0;
    for member in members {
        let index = comp.symbol(member).index_in_scope;
        assert!(index >= last, "indices must never move backwards");
        last = index;
    }
}

#[test]
fn canonical_is_idempotent() {
    let p = Pipeline::new(DESIGN);
    let mut comp = p.compile();
    comp.get_all_diagnostics();

    for path in ["Top.data", "Top.more", "Top.q4", "Top.lit"] {
        let sym = comp.lookup_path(path).unwrap();
        let ty = comp.declared_type_of(sym);
        let once = comp.canonical(ty);
        let twice = comp.canonical(once);
        assert_eq!(once, twice, "canonical must be a fixed point for {path}");
    }

    // The alias chain alias_t -> word_t -> logic[7:0] lands on the same
    // canonical type as the direct typedef.
    let data = comp.lookup_path("Top.data").unwrap();
    let more = comp.lookup_path("Top.more").unwrap();
    let data_ty = comp.declared_type_of(data);
    let more_ty = comp.declared_type_of(more);
    let a = comp.canonical(data_ty);
    let b = comp.canonical(more_ty);
    assert_eq!(a, b);
    assert!(comp.is_matching(data_ty, more_ty));
}

#[test]
fn integral_widths_match_ranges() {
    let p = Pipeline::new(DESIGN);
    let mut comp = p.compile();
    comp.get_all_diagnostics();

    for path in ["Top.data", "Top.q4", "Top.c"] {
        let sym = comp.lookup_path(path).unwrap();
        let ty = comp.declared_type_of(sym);
        let range = comp.array_range(ty);
        assert_eq!(
            comp.bit_width(ty),
            range.upper().abs_diff(range.lower()) + 1,
            "width/range mismatch for {path}"
        );
    }
}

#[test]
fn two_state_default_has_no_set_bits() {
    let p = Pipeline::new("module m; bit [7:0] b; logic [7:0] l; endmodule");
    let mut comp = p.compile();
    comp.get_all_diagnostics();

    let b = comp.lookup_path("m.b").unwrap();
    let ty = comp.declared_type_of(b);
    assert!(!comp.is_four_state(ty));
    let default = comp.default_value(ty);
    let v = default.integer().unwrap();
    assert!(v.is_false(), "two-state defaults are all zero");

    let l = comp.lookup_path("m.l").unwrap();
    let ty = comp.declared_type_of(l);
    assert!(comp.is_four_state(ty));
    let default = comp.default_value(ty);
    assert!(default.integer().unwrap().has_unknown());
}

#[test]
fn precomputed_constants_agree_with_evaluation() {
    let p = Pipeline::new(DESIGN);
    let mut comp = p.compile();
    comp.get_all_diagnostics();

    let lit = comp.lookup_path("Top.lit").unwrap();
    let init = comp.initializer_of(lit).unwrap();
    let precomputed = comp
        .expr(init)
        .constant
        .clone()
        .expect("literal initializers fold at bind time");
    assert!(precomputed.equivalent_to(&comp.value_of_path("Top.lit")));
}

#[test]
fn shadowing_prefers_the_closer_declaration() {
    let p = Pipeline::new(
        "module m;
            localparam int v = 1;
            if (1) begin : inner
                localparam int v = 2;
                localparam int probe = v;
            end
            localparam int outer_probe = v;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.inner.probe").as_i64(), Some(2));
    assert_eq!(comp.value_of_path("m.outer_probe").as_i64(), Some(1));
}

#[test]
fn ordered_overrides_skip_local_parameters() {
    let p = Pipeline::new(
        "module Leaf #(localparam int L = 7, parameter int A = 1)();
        endmodule
        module Top;
            Leaf #(10) u ();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    // The ordered override lands on A, not on the local L.
    assert_eq!(comp.value_of_path("Top.u.A").as_i64(), Some(10));
    assert_eq!(comp.value_of_path("Top.u.L").as_i64(), Some(7));
}

#[test]
fn symbol_cannot_see_itself_or_later_names() {
    let p = Pipeline::new(
        "module m;
            localparam int a = b;
            localparam int b = 1;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    // `b` is not visible at `a`'s declaration.
    assert!(diags
        .iter()
        .any(|d| d.code == veris_elaborate::errors::E202));
}
