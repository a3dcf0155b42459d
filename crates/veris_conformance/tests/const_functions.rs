//! Constant function evaluation: frames, locals, loops, and the rules on
//! what may appear in a constant context.

use veris_conformance::{full_pipeline, render, Pipeline};
use veris_elaborate::errors;

#[test]
fn function_with_branches() {
    let p = Pipeline::new(
        "module m;
            function int clamp(input int v, input int lo, input int hi);
                if (v < lo) return lo;
                else if (v > hi) return hi;
                return v;
            endfunction
            localparam int below = clamp(-4, 0, 10);
            localparam int inside = clamp(7, 0, 10);
            localparam int above = clamp(12, 0, 10);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.below").as_i64(), Some(0));
    assert_eq!(comp.value_of_path("m.inside").as_i64(), Some(7));
    assert_eq!(comp.value_of_path("m.above").as_i64(), Some(10));
}

#[test]
fn function_assigns_implicit_return_variable() {
    let p = Pipeline::new(
        "module m;
            function int answer;
                answer = 42;
            endfunction
            localparam int x = answer();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.x").as_i64(), Some(42));
}

#[test]
fn function_with_for_loop() {
    let p = Pipeline::new(
        "module m;
            function int sum_to(input int n);
                int acc;
                acc = 0;
                for (int i = 1; i <= n; i = i + 1)
                    acc = acc + i;
                return acc;
            endfunction
            localparam int s = sum_to(10);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.s").as_i64(), Some(55));
}

#[test]
fn function_with_case_and_while() {
    let p = Pipeline::new(
        "module m;
            function int log2ceil(input int n);
                int v;
                int r;
                v = n - 1;
                r = 0;
                while (v > 0) begin
                    v = v >> 1;
                    r = r + 1;
                end
                return r;
            endfunction
            function int pick(input int sel);
                case (sel)
                    0: return 100;
                    1, 2: return 200;
                    default: return 300;
                endcase
            endfunction
            localparam int L = log2ceil(64);
            localparam int P0 = pick(0);
            localparam int P2 = pick(2);
            localparam int P9 = pick(9);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.L").as_i64(), Some(6));
    assert_eq!(comp.value_of_path("m.P0").as_i64(), Some(100));
    assert_eq!(comp.value_of_path("m.P2").as_i64(), Some(200));
    assert_eq!(comp.value_of_path("m.P9").as_i64(), Some(300));
}

#[test]
fn functions_calling_functions() {
    let p = Pipeline::new(
        "module m;
            function int double_it(input int v);
                return v * 2;
            endfunction
            function int quad(input int v);
                return double_it(double_it(v));
            endfunction
            localparam int q = quad(5);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.q").as_i64(), Some(20));
}

#[test]
fn non_local_identifier_rejected() {
    let p = Pipeline::new(
        "module m;
            int a;
            function int f;
                return a;
            endfunction
            localparam int x = f();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(
        diags.iter().any(|d| d.code == errors::E707),
        "diagnostics:\n{}",
        render(&diags)
    );
    assert!(comp.value_of_path("m.x").is_invalid());
}

#[test]
fn parameter_used_before_declaration() {
    let diags = full_pipeline(
        "module m;
            function int f;
                return LATER;
            endfunction
            localparam int x = f();
            parameter int LATER = 5;
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E706));
}

#[test]
fn parameter_after_declaration_is_fine() {
    let p = Pipeline::new(
        "module m;
            parameter int EARLY = 5;
            function int f;
                return EARLY;
            endfunction
            localparam int x = f();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.x").as_i64(), Some(5));
}

#[test]
fn runaway_loop_hits_step_budget() {
    let p = Pipeline::new(
        "module m;
            function int spin;
                int i;
                i = 0;
                while (1) i = i + 1;
                return i;
            endfunction
            localparam int x = spin();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(
        diags.iter().any(|d| d.code == errors::E700),
        "diagnostics:\n{}",
        render(&diags)
    );
    assert!(comp.value_of_path("m.x").is_invalid());
}

#[test]
fn runaway_recursion_hits_budget() {
    let diags = full_pipeline(
        "module m;
            function int forever_down(input int n);
                return forever_down(n);
            endfunction
            localparam int x = forever_down(1);
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E700));
}

#[test]
fn clog2_system_function() {
    let p = Pipeline::new(
        "module m;
            localparam int A = $clog2(1);
            localparam int B = $clog2(2);
            localparam int C = $clog2(3);
            localparam int D = $clog2(256);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.A").as_i64(), Some(0));
    assert_eq!(comp.value_of_path("m.B").as_i64(), Some(1));
    assert_eq!(comp.value_of_path("m.C").as_i64(), Some(2));
    assert_eq!(comp.value_of_path("m.D").as_i64(), Some(8));
}

#[test]
fn bits_of_expression_and_type() {
    let p = Pipeline::new(
        "module m;
            logic [11:0] v;
            localparam int A = $bits(v);
            localparam int B = $bits(logic [3:0]);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.A").as_i64(), Some(12));
    assert_eq!(comp.value_of_path("m.B").as_i64(), Some(4));
}

#[test]
fn unknown_system_function_diagnosed() {
    let diags = full_pipeline(
        "module m;
            localparam int x = $mystery(3);
        endmodule",
    );
    assert!(diags.iter().any(|d| d.code == errors::E211));
}

#[test]
fn four_state_arithmetic_poisons() {
    let p = Pipeline::new(
        "module m;
            localparam logic [3:0] X = 4'b10x1;
            localparam logic [3:0] S = X + 4'd1;
        endmodule",
    );
    let mut comp = p.compile();
    comp.get_all_diagnostics();
    let s = comp.value_of_path("m.S");
    let v = s.integer().expect("S evaluates to an integer");
    assert!(v.has_unknown());
}

#[test]
fn short_circuit_skips_bad_side() {
    let p = Pipeline::new(
        "module m;
            function int explode;
                int i;
                i = 0;
                while (1) i = i + 1;
                return i;
            endfunction
            localparam int ok = (1 == 1) || (explode() == 0);
            localparam int also_ok = (1 == 2) && (explode() == 0);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.ok").as_i64(), Some(1));
    assert_eq!(comp.value_of_path("m.also_ok").as_i64(), Some(0));
}

#[test]
fn replication_and_concat_values() {
    let p = Pipeline::new(
        "module m;
            localparam logic [7:0] cat = {4'hA, 4'h5};
            localparam logic [5:0] rep = {3{2'b10}};
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.cat").as_i64(), Some(0xA5));
    assert_eq!(comp.value_of_path("m.rep").as_i64(), Some(0b10_10_10));
}

#[test]
fn element_select_out_of_range_during_eval() {
    let p = Pipeline::new(
        "module m;
            localparam logic [3:0] V = 4'b1010;
            localparam int IDX = 9;
            localparam logic B = V[IDX];
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(
        diags
            .iter()
            .any(|d| d.code == errors::E701 || d.code == errors::E605),
        "diagnostics:\n{}",
        render(&diags)
    );
    assert!(comp.value_of_path("m.B").is_invalid());
}

#[test]
fn part_select_values() {
    let p = Pipeline::new(
        "module m;
            localparam logic [7:0] V = 8'b1011_0100;
            localparam logic [3:0] HI = V[7:4];
            localparam logic [3:0] UP = V[2 +: 4];
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.HI").as_i64(), Some(0b1011));
    assert_eq!(comp.value_of_path("m.UP").as_i64(), Some(0b1101));
}

#[test]
fn assignment_patterns_for_arrays_and_structs() {
    let p = Pipeline::new(
        "module m;
            parameter int foo [2] = '{42, -39};
            typedef struct packed { logic [7:0] hi; logic [7:0] lo; } pair_t;
            localparam pair_t packed_pair = '{8'hDE, 8'hAD};
            parameter int filled [3] = '{default: 7};
            parameter int keyed [3] = '{0: 1, default: 0, 2: 3};
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    let foo = comp.value_of_path("m.foo");
    let elements = foo.elements().expect("foo is an aggregate");
    assert_eq!(elements[0].as_i64(), Some(42));
    assert_eq!(elements[1].as_i64(), Some(-39));

    assert_eq!(comp.value_of_path("m.packed_pair").as_i64(), Some(0xDEAD));

    let filled = comp.value_of_path("m.filled");
    let elements = filled.elements().expect("filled is an aggregate");
    assert!(elements.iter().all(|e| e.as_i64() == Some(7)));

    let keyed = comp.value_of_path("m.keyed");
    let elements = keyed.elements().expect("keyed is an aggregate");
    assert_eq!(elements[0].as_i64(), Some(1));
    assert_eq!(elements[1].as_i64(), Some(0));
    assert_eq!(elements[2].as_i64(), Some(3));
}

#[test]
fn casts_in_constant_context() {
    let p = Pipeline::new(
        "module m;
            localparam int A = int'(4'hF);
            localparam logic [2:0] B = 3'(8'hFF);
            localparam int C = signed'(4'b1111);
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.A").as_i64(), Some(15));
    assert_eq!(comp.value_of_path("m.B").as_i64(), Some(0b111));
    // signed'(4'b1111) reinterprets the nibble as -1, then widens.
    assert_eq!(comp.value_of_path("m.C").as_i64(), Some(-1));
}

#[test]
fn unbased_unsized_literals_fill_context() {
    let p = Pipeline::new(
        "module m;
            localparam logic [7:0] ONES = '1;
            localparam logic [7:0] ZEROS = '0;
            localparam logic [3:0] XS = 'x;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("m.ONES").as_i64(), Some(0xFF));
    assert_eq!(comp.value_of_path("m.ZEROS").as_i64(), Some(0));
    let xs = comp.value_of_path("m.XS");
    assert!(xs.integer().expect("XS is an integer").has_unknown());
}
