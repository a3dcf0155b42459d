//! Hierarchy elaboration: instances, parameter overrides, ports,
//! packages, and imports.

use veris_conformance::{full_pipeline, render, Pipeline};
use veris_elaborate::{errors, symbols::SymbolKind, SymbolId};

#[test]
fn parameterized_instance_overrides() {
    let p = Pipeline::new(
        "module Adder #(parameter int W = 4)(
            input logic [W-1:0] a,
            input logic [W-1:0] b,
            output logic [W-1:0] s
        );
            assign s = a + b;
        endmodule

        module Top;
            logic [7:0] x, y, z;
            Adder #(.W(8)) add (.a(x), .b(y), .s(z));
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    assert_eq!(comp.value_of_path("Top.add.W").as_i64(), Some(8));
    let a = comp.lookup_path("Top.add.a").expect("port net resolves");
    let ty = comp.declared_type_of(a);
    assert_eq!(comp.bit_width(ty), 8);
}

#[test]
fn ordered_parameter_overrides() {
    let p = Pipeline::new(
        "module Pair #(parameter int A = 1, parameter int B = 2)();
        endmodule
        module Top;
            Pair #(10, 20) u ();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.u.A").as_i64(), Some(10));
    assert_eq!(comp.value_of_path("Top.u.B").as_i64(), Some(20));
}

#[test]
fn too_many_ordered_parameters() {
    let diags = full_pipeline(
        "module OneParam #(parameter int A = 1)();
        endmodule
        module Top;
            OneParam #(1, 2) u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E303));
}

#[test]
fn mixed_ordered_and_named_parameters() {
    let diags = full_pipeline(
        "module Pair #(parameter int A = 1, parameter int B = 2)();
        endmodule
        module Top;
            Pair #(10, .B(20)) u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E302));
}

#[test]
fn duplicate_named_parameter() {
    let diags = full_pipeline(
        "module OneParam #(parameter int A = 1)();
        endmodule
        module Top;
            OneParam #(.A(1), .A(2)) u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E301));
}

#[test]
fn assignment_to_local_parameter() {
    let diags = full_pipeline(
        "module Fixed #(localparam int A = 1)();
        endmodule
        module Top;
            Fixed #(.A(2)) u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E306));
}

#[test]
fn parameter_does_not_exist() {
    let diags = full_pipeline(
        "module NoParams ();
        endmodule
        module Top;
            NoParams #(.Q(1)) u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E304));
}

#[test]
fn unknown_module_reported() {
    let diags = full_pipeline("module Top; bogus u1 (); endmodule");
    assert!(diags.iter().any(|d| d.code == errors::E200));
}

#[test]
fn unconnected_port_warns() {
    let diags = full_pipeline(
        "module Leaf(input logic clk);
        endmodule
        module Top;
            Leaf u ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::W400));
}

#[test]
fn port_default_value_suppresses_warning() {
    let diags = full_pipeline(
        "module Leaf(input int cfg = 7);
        endmodule
        module Top;
            Leaf u ();
        endmodule",
    );
    assert!(
        !diags.iter().any(|d| d.code == errors::W400),
        "diagnostics:\n{}",
        render(&diags)
    );
}

#[test]
fn duplicate_port_connection() {
    let diags = full_pipeline(
        "module Leaf(input logic clk);
        endmodule
        module Top;
            logic c;
            Leaf u (.clk(c), .clk(c));
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E401));
}

#[test]
fn wildcard_connection_matches_names() {
    let diags = full_pipeline(
        "module Leaf(input logic [3:0] data);
        endmodule
        module Top;
            logic [3:0] data;
            Leaf u (.*);
        endmodule",
    );
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
}

#[test]
fn duplicate_wildcard_connection() {
    let diags = full_pipeline(
        "module Leaf(input logic a);
        endmodule
        module Top;
            logic a;
            Leaf u (.*, .*);
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E402));
}

#[test]
fn implicit_named_connection_requires_equivalence() {
    let diags = full_pipeline(
        "module Leaf(input logic [7:0] data);
        endmodule
        module Top;
            logic [3:0] data;
            Leaf u (.data);
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E405));
}

#[test]
fn instance_array_materializes_elements() {
    let p = Pipeline::new(
        "module Buf(input logic d, output logic q);
        endmodule
        module Top;
            logic [3:0] din, dout;
            Buf cells [3:0] (.d(din[0]), .q(dout[0]));
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    let array = comp.lookup_path("Top.cells").expect("array resolves");
    match &comp.symbol(array).kind {
        SymbolKind::InstanceArray {
            elements, range, ..
        } => {
            assert_eq!(elements.len(), 4);
            assert_eq!(range.width(), 4);
        }
        other => panic!("expected an instance array, got {other:?}"),
    }
    // Elements are addressable by index.
    assert!(comp.lookup_path("Top.cells[2].d").is_some());
}

#[test]
fn package_import_and_scoped_access() {
    let p = Pipeline::new(
        "package defs;
            parameter int WIDTH = 16;
            typedef logic [WIDTH-1:0] word_t;
        endpackage

        module Top;
            import defs::*;
            word_t data;
            localparam int W = defs::WIDTH;
            localparam int V = WIDTH;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.W").as_i64(), Some(16));
    assert_eq!(comp.value_of_path("Top.V").as_i64(), Some(16));

    let data = comp.lookup_path("Top.data").expect("data resolves");
    let ty = comp.declared_type_of(data);
    assert_eq!(comp.bit_width(ty), 16);
}

#[test]
fn ambiguous_wildcard_import() {
    let diags = full_pipeline(
        "package p1; parameter int K = 1; endpackage
        package p2; parameter int K = 2; endpackage
        module Top;
            import p1::*;
            import p2::*;
            localparam int X = K;
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E203));
}

#[test]
fn explicit_import_beats_wildcard() {
    let p = Pipeline::new(
        "package p1; parameter int K = 1; endpackage
        package p2; parameter int K = 2; endpackage
        module Top;
            import p1::*;
            import p2::K;
            localparam int X = K;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.X").as_i64(), Some(2));
}

#[test]
fn interface_port_connects_to_instance() {
    let p = Pipeline::new(
        "interface bus_if;
            logic valid;
            logic [7:0] data;
            modport consumer(input valid, input data);
        endinterface

        module Sink(bus_if.consumer bus);
        endmodule

        module Top;
            bus_if the_bus ();
            Sink sink (.bus(the_bus));
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    let port = comp.lookup_path("Top.sink.bus").expect("interface port resolves");
    match &comp.symbol(port).kind {
        SymbolKind::InterfacePort {
            connection,
            modport,
            ..
        } => {
            assert!(connection.is_some());
            assert!(modport.is_some());
        }
        other => panic!("expected an interface port, got {other:?}"),
    }
    // Names route through the port into the connected instance.
    assert!(comp.lookup_path("Top.sink.bus.data").is_some());
}

#[test]
fn interface_port_unconnected_errors() {
    let diags = full_pipeline(
        "interface bus_if; logic v; endinterface
        module Sink(bus_if bus);
        endmodule
        module Top;
            Sink sink ();
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E406));
}

#[test]
fn wrong_interface_type_errors() {
    let diags = full_pipeline(
        "interface a_if; logic v; endinterface
        interface b_if; logic v; endinterface
        module Sink(a_if bus);
        endmodule
        module Top;
            b_if wrong ();
            Sink sink (.bus(wrong));
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E408));
}

#[test]
fn enum_members_hoist_into_scope() {
    let p = Pipeline::new(
        "module m;
            typedef enum logic [1:0] {IDLE, RUN, STOP} state_t;
            localparam state_t first = IDLE;
            localparam int running = RUN;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.running").as_i64(), Some(1));
}

#[test]
fn enum_duplicate_value_diagnosed() {
    let diags = full_pipeline(
        "module m;
            typedef enum { A = 1, B = 1 } e_t;
            e_t e;
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E501));
}

#[test]
fn packed_union_width_mismatch() {
    let diags = full_pipeline(
        "module m;
            union packed { logic [7:0] a; logic [3:0] b; } u;
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E507));
}

#[test]
fn typedef_resolves_through_packages_and_dimensions() {
    let p = Pipeline::new(
        "module m;
            typedef logic [3:0] nibble_t;
            nibble_t pair [1:0];
            localparam int W = $bits(nibble_t);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.W").as_i64(), Some(4));

    let pair = comp.lookup_path("m.pair").expect("array resolves");
    let ty = comp.declared_type_of(pair);
    assert!(comp.is_unpacked_array(ty));
    assert_eq!(comp.array_range(ty).width(), 2);
}

#[test]
fn hierarchical_reference_across_instances() {
    let p = Pipeline::new(
        "module Leaf;
            parameter int DEPTH = 3;
        endmodule
        module Top;
            Leaf leaf ();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.leaf.DEPTH").as_i64(), Some(3));
}

#[test]
fn redefinition_in_one_scope() {
    let diags = full_pipeline("module Top; logic a; logic a; endmodule");
    assert!(diags.iter().any(|d| d.code == errors::E300));
}

#[test]
fn forward_typedef_category_mismatch() {
    let diags = full_pipeline(
        "module m;
            typedef enum fwd_t;
            typedef struct packed { logic a; } fwd_t;
            fwd_t x;
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E308));
}

#[test]
fn symbols_keep_declaration_order() {
    let p = Pipeline::new(
        "module m;
            logic first;
            logic second;
            logic third;
        endmodule",
    );
    let mut comp = p.compile();
    comp.get_all_diagnostics();
    let first = comp.lookup_path("m.first").unwrap();
    let second = comp.lookup_path("m.second").unwrap();
    let third = comp.lookup_path("m.third").unwrap();
    assert!(comp.symbol(first).index_in_scope < comp.symbol(second).index_in_scope);
    assert!(comp.symbol(second).index_in_scope < comp.symbol(third).index_in_scope);
    let m = comp.lookup_path("m").unwrap();
    assert_eq!(comp.symbol(first).parent, Some(m));
}
