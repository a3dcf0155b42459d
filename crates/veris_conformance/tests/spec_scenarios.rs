//! End-to-end scenarios exercising parameter evaluation, packed structs,
//! generate selection, and constant-function rules.

use veris_conformance::{render, Pipeline};
use veris_elaborate::{errors, symbols::SymbolKind, SymbolId, Type};

#[test]
fn constant_parameter_arithmetic() {
    let p = Pipeline::new("module Top; parameter foo = 4 + 5; endmodule");
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.foo").as_i64(), Some(9));
}

#[test]
fn forward_parameter_reference() {
    let p = Pipeline::new("module Top; parameter bar = 9, foo = bar + 1; endmodule");
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));
    assert_eq!(comp.value_of_path("Top.bar").as_i64(), Some(9));
    assert_eq!(comp.value_of_path("Top.foo").as_i64(), Some(10));
}

#[test]
fn packed_struct_member_access() {
    let p = Pipeline::new(
        "module m;
            struct packed { logic [13:0] a; bit b; } foo;
            wire [13:0] w = foo.a;
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    let foo = comp.lookup_path("m.foo").expect("m.foo resolves");
    let ty = comp.declared_type_of(foo);
    assert_eq!(comp.bit_width(ty), 15);

    let canonical = comp.canonical(ty);
    let (a_ty, a_offset, b_offset) = match comp.get_type_data(canonical) {
        Type::PackedStruct { fields, width, .. } => {
            assert_eq!(*width, 15);
            assert_eq!(fields.len(), 2);
            (fields[0].ty, fields[0].offset, fields[1].offset)
        }
        other => panic!("expected a packed struct, got {other:?}"),
    };
    // Fields are listed in declaration order; offsets count from the LSB,
    // so the last-declared field sits at offset zero.
    assert_eq!(a_offset, 1);
    assert_eq!(b_offset, 0);
    assert_eq!(comp.bit_width(a_ty), 14);
    assert!(comp.is_four_state(a_ty));

    // The initializer of w sees foo.a as a 14-bit four-state value.
    let w = comp.lookup_path("m.w").expect("m.w resolves");
    let init = comp.initializer_of(w).expect("w has an initializer");
    let init_ty = comp.expr(init).ty;
    assert_eq!(comp.bit_width(init_ty), 14);
    assert!(comp.is_four_state(init_ty));
}

#[test]
fn generate_if_else_selection() {
    let p = Pipeline::new(
        "module m;
            parameter P = 1;
            if (P) begin : g1
                localparam x = 10;
            end else begin : g1
                localparam x = 20;
            end
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();
    assert!(diags.is_empty(), "unexpected diagnostics:\n{}", render(&diags));

    assert_eq!(comp.value_of_path("m.g1.x").as_i64(), Some(10));

    // Both branches were materialized; only one is instantiated.
    let m = comp.lookup_path("m").expect("top instance resolves");
    let members: Vec<SymbolId> = comp.symbol(m).scope().unwrap().members.clone();
    let mut instantiated = 0;
    let mut uninstantiated = 0;
    for member in members {
        if let SymbolKind::GenerateBlock {
            is_instantiated, ..
        } = comp.symbol(member).kind
        {
            if is_instantiated {
                instantiated += 1;
            } else {
                uninstantiated += 1;
            }
        }
    }
    assert_eq!(instantiated, 1);
    assert_eq!(uninstantiated, 1);
}

#[test]
fn loop_generate_duplicate_value_terminates() {
    let p = Pipeline::new("module m; for (genvar i = 0; i < 2; i = 0) begin end endmodule");
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();

    let dups: Vec<_> = diags.iter().filter(|d| d.code == errors::E801).collect();
    assert_eq!(dups.len(), 1, "diagnostics:\n{}", render(&diags));

    // One block was created for i=0 before the loop stopped.
    let mut entry_count = None;
    for i in 0..comp.symbol_count() {
        if let SymbolKind::GenerateBlockArray { entries, .. } =
            &comp.symbol(SymbolId::from_raw(i as u32)).kind
        {
            entry_count = Some(entries.len());
        }
    }
    assert_eq!(entry_count, Some(1));
}

#[test]
fn hierarchical_name_in_constant_function() {
    let p = Pipeline::new(
        "module m;
            int a;
            function int f;
                f = m.a;
            endfunction
            localparam int x = f();
        endmodule",
    );
    let mut comp = p.compile();
    let diags = comp.get_all_diagnostics();

    let hier: Vec<_> = diags.iter().filter(|d| d.code == errors::E208).collect();
    assert_eq!(
        hier.len(),
        1,
        "expected exactly one hierarchical-name error:\n{}",
        render(&diags)
    );
    assert!(comp.value_of_path("m.x").is_invalid());
}
