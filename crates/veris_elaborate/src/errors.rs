//! Diagnostic codes and helper functions for elaboration errors.
//!
//! Codes are grouped by subsystem: `E2xx` name resolution, `E3xx`
//! declarations and parameters, `E4xx` ports, `E5xx` types and literals,
//! `E6xx` expression binding, `E7xx` constant evaluation, `E8xx` generate
//! constructs. Warnings use `W` codes in the same ranges.

use veris_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use veris_source::Span;

macro_rules! codes {
    ($($(#[$meta:meta])* $name:ident = $cat:ident $num:literal;)*) => {
        $(
            $(#[$meta])*
            pub const $name: DiagnosticCode =
                DiagnosticCode::new(Category::$cat, $num);
        )*
    };
}

codes! {
    /// Unknown module/interface/program referenced by an instantiation.
    E200 = Error 200;
    /// Unknown member of a scope in a hierarchical name.
    E201 = Error 201;
    /// Use of an undeclared identifier.
    E202 = Error 202;
    /// A name is importable from more than one wildcard package.
    E203 = Error 203;
    /// A named entity was used where a modport is required.
    E204 = Error 204;
    /// A named entity was used where an interface is required.
    E205 = Error 205;
    /// A named entity was used where a type is required.
    E206 = Error 206;
    /// A named entity was used where a value is required.
    E207 = Error 207;
    /// Hierarchical names are not allowed in constant expressions.
    E208 = Error 208;
    /// Unknown package in an import or scoped name.
    E209 = Error 209;
    /// A construct that is recognized but not yet supported.
    E210 = Error 210;
    /// Unknown system function.
    E211 = Error 211;

    /// A name is already declared in this scope.
    E300 = Error 300;
    /// The same parameter is assigned more than once.
    E301 = Error 301;
    /// Ordered and named parameter assignments cannot be mixed.
    E302 = Error 302;
    /// More ordered parameter assignments than parameters.
    E303 = Error 303;
    /// A named parameter assignment targets a nonexistent parameter.
    E304 = Error 304;
    /// A parameter has no default and no override.
    E305 = Error 305;
    /// A local parameter in the port list cannot be assigned.
    E306 = Error 306;
    /// A local parameter in the body cannot be assigned.
    E307 = Error 307;
    /// A forward typedef does not match the kind of the resolved type.
    E308 = Error 308;
    /// A declared type or initializer depends on itself.
    E309 = Error 309;
    /// A type parameter was assigned a non-type expression.
    E310 = Error 310;

    /// Ordered and named port connections cannot be mixed.
    E400 = Error 400;
    /// The same port is connected more than once.
    E401 = Error 401;
    /// More than one `.*` connection.
    E402 = Error 402;
    /// An implicit named port connection found no matching name.
    E404 = Error 404;
    /// An implicit named port connection has a non-equivalent type.
    E405 = Error 405;
    /// An interface port was left unconnected.
    E406 = Error 406;
    /// An interface port connection is not an interface instance.
    E407 = Error 407;
    /// An interface port connection has the wrong interface type.
    E408 = Error 408;
    /// Interface array dimensions do not line up with the port's.
    E409 = Error 409;
    /// A named connection targets a nonexistent port.
    E410 = Error 410;
    /// More ordered port connections than ports.
    E411 = Error 411;

    /// An enum base type must be a simple bit vector.
    E500 = Error 500;
    /// Duplicate enum member value.
    E501 = Error 501;
    /// Enum auto-increment from a value with X/Z bits.
    E502 = Error 502;
    /// Enum auto-increment overflowed the base type.
    E503 = Error 503;
    /// Enum member ranges must be one-dimensional.
    E504 = Error 504;
    /// Packed struct/union members must be integral.
    E505 = Error 505;
    /// Packed struct/union members cannot have initializers.
    E506 = Error 506;
    /// Packed union members must share one width.
    E507 = Error 507;
    /// A dimension range did not evaluate to constant integers.
    E508 = Error 508;
    /// A numeric literal is malformed.
    E509 = Error 509;
    /// A plain decimal literal overflows 32 signed bits.
    E510 = Error 510;

    /// A unary operator was applied to an unsupported type.
    E600 = Error 600;
    /// A binary operator was applied to unsupported types.
    E601 = Error 601;
    /// The conditional operator has incompatible arms.
    E602 = Error 602;
    /// A predicate is not convertible to boolean.
    E603 = Error 603;
    /// No implicit conversion between the given types.
    E604 = Error 604;
    /// An index is out of bounds for the type at bind time.
    E605 = Error 605;
    /// A range select is invalid for the type at bind time.
    E606 = Error 606;
    /// The called expression is not a task or function.
    E607 = Error 607;
    /// An expression that must be constant is not.
    E608 = Error 608;
    /// Wrong number of call arguments.
    E609 = Error 609;
    /// The assignment target is not assignable.
    E610 = Error 610;

    /// Constant evaluation exceeded its step budget.
    E700 = Error 700;
    /// An array index was X/Z or out of range during evaluation.
    E701 = Error 701;
    /// A string index was out of range during evaluation.
    E702 = Error 702;
    /// A part select was outside the declared range during evaluation.
    E703 = Error 703;
    /// A replication count was invalid during evaluation.
    E704 = Error 704;
    /// A referenced variable has no constant value.
    E705 = Error 705;
    /// A parameter was used in a constant function before its declaration.
    E706 = Error 706;
    /// Identifiers in constant functions must be local.
    E707 = Error 707;

    /// A generate loop variable acquired X/Z bits.
    E800 = Error 800;
    /// A generate loop revisited a genvar value.
    E801 = Error 801;
    /// The loop variable of a generate loop is not a genvar.
    E802 = Error 802;
    /// No case-generate arm matched and there is no default.
    E803 = Error 803;

    /// A port was left unconnected.
    W400 = Warning 400;
    /// A vector literal was truncated to its declared size.
    W500 = Warning 500;
    /// A real literal overflowed to infinity.
    W501 = Warning 501;
    /// A real literal underflowed to zero.
    W502 = Warning 502;
    /// A later case-generate arm also matched the selector.
    W800 = Warning 800;
}

/// Creates a diagnostic for an unknown definition in an instantiation.
pub fn error_unknown_module(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E200, format!("unknown module `{name}`"), span)
}

/// Creates a diagnostic for an unknown member in a hierarchical name.
pub fn error_unknown_member(name: &str, scope_name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E201,
        format!("no member `{name}` in `{scope_name}`"),
        span,
    )
}

/// Creates a diagnostic for an undeclared identifier.
pub fn error_undeclared_identifier(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E202, format!("use of undeclared identifier `{name}`"), span)
}

/// Creates a diagnostic for an ambiguous wildcard import.
pub fn error_ambiguous_wildcard_import(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E203,
        format!("`{name}` is importable from more than one wildcard import"),
        span,
    )
}

/// Creates a diagnostic for a name that is not a type.
pub fn error_not_a_type(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E206, format!("`{name}` is not a type"), span)
}

/// Creates a diagnostic for a name that is not a value.
pub fn error_not_a_value(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E207, format!("`{name}` is not a value"), span)
}

/// Creates a diagnostic for a hierarchical name in a constant expression.
pub fn error_hierarchical_in_ce(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E208,
        format!("hierarchical name `{name}` is not allowed in a constant expression"),
        span,
    )
}

/// Creates a diagnostic for an unknown package.
pub fn error_unknown_package(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E209, format!("unknown package `{name}`"), span)
}

/// Creates a diagnostic for a recognized but unsupported construct.
pub fn error_not_yet_supported(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E210, format!("{what} is not yet supported"), span)
}

/// Creates a diagnostic for an unknown system function.
pub fn error_unknown_system_function(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E211, format!("unknown system function `{name}`"), span)
}

/// Creates a diagnostic for a duplicate declaration.
pub fn error_redefinition(name: &str, span: Span, previous: Span) -> Diagnostic {
    Diagnostic::error(E300, format!("redefinition of `{name}`"), span)
        .with_label(Label::secondary(previous, "previously defined here"))
}

/// Creates a diagnostic for a duplicate parameter assignment.
pub fn error_duplicate_param_assignment(name: &str, span: Span, previous: Span) -> Diagnostic {
    Diagnostic::error(E301, format!("duplicate assignment to parameter `{name}`"), span)
        .with_label(Label::secondary(previous, "previous assignment here"))
}

/// Creates a diagnostic for mixing ordered and named parameters.
pub fn error_mixed_params(span: Span) -> Diagnostic {
    Diagnostic::error(
        E302,
        "cannot mix ordered and named parameter assignments",
        span,
    )
}

/// Creates a diagnostic for too many ordered parameter assignments.
pub fn error_too_many_params(def: &str, got: usize, expected: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E303,
        format!("too many parameter assignments for `{def}`: got {got}, expected {expected}"),
        span,
    )
}

/// Creates a diagnostic for assigning to a nonexistent parameter.
pub fn error_param_does_not_exist(name: &str, def: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E304,
        format!("`{def}` has no parameter named `{name}`"),
        span,
    )
}

/// Creates a diagnostic for a parameter with no value.
pub fn error_param_has_no_value(def: &str, name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E305,
        format!("parameter `{name}` of `{def}` has no default and no override"),
        span,
    )
}

/// Creates a diagnostic for assigning to a local parameter.
pub fn error_assigned_to_local_param(name: &str, is_port: bool, span: Span, decl: Span) -> Diagnostic {
    let code = if is_port { E306 } else { E307 };
    Diagnostic::error(code, format!("cannot override local parameter `{name}`"), span)
        .with_label(Label::secondary(decl, "declared here"))
}

/// Creates a diagnostic for a mismatched forward typedef.
pub fn error_forward_typedef_mismatch(name: &str, span: Span, decl: Span) -> Diagnostic {
    Diagnostic::error(
        E308,
        format!("forward typedef of `{name}` does not match its definition"),
        span,
    )
    .with_label(Label::secondary(decl, "definition here"))
}

/// Creates a diagnostic for a circular declared-type dependency.
pub fn error_circular_type(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E309,
        format!("declaration of `{name}` depends on itself"),
        span,
    )
}

/// Creates a diagnostic for a bad type parameter assignment.
pub fn error_bad_type_param(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E310,
        format!("type parameter `{name}` must be assigned a type"),
        span,
    )
}

/// Creates a diagnostic for mixing ordered and named port connections.
pub fn error_mixed_ports(span: Span) -> Diagnostic {
    Diagnostic::error(E400, "cannot mix ordered and named port connections", span)
}

/// Creates a diagnostic for a duplicate port connection.
pub fn error_duplicate_port_connection(name: &str, span: Span, previous: Span) -> Diagnostic {
    Diagnostic::error(E401, format!("duplicate connection to port `{name}`"), span)
        .with_label(Label::secondary(previous, "previous connection here"))
}

/// Creates a diagnostic for multiple `.*` connections.
pub fn error_duplicate_wildcard_connection(span: Span) -> Diagnostic {
    Diagnostic::error(E402, "only one `.*` connection is allowed", span)
}

/// Creates a warning for an unconnected port.
pub fn warn_unconnected_port(name: &str, span: Span) -> Diagnostic {
    if name.is_empty() {
        Diagnostic::warning(W400, "unnamed port is unconnected", span)
    } else {
        Diagnostic::warning(W400, format!("port `{name}` is unconnected"), span)
    }
}

/// Creates a diagnostic for an implicit named port with no matching name.
pub fn error_implicit_port_not_found(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E404,
        format!("no name `{name}` in the instantiating scope for implicit port connection"),
        span,
    )
}

/// Creates a diagnostic for an implicit named port type mismatch.
pub fn error_implicit_port_type_mismatch(
    name: &str,
    port_ty: &str,
    conn_ty: &str,
    span: Span,
) -> Diagnostic {
    Diagnostic::error(
        E405,
        format!(
            "implicit connection to port `{name}` requires equivalent types; \
             port is `{port_ty}`, connection is `{conn_ty}`"
        ),
        span,
    )
}

/// Creates a diagnostic for an unconnected interface port.
pub fn error_interface_port_not_connected(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E406, format!("interface port `{name}` is not connected"), span)
}

/// Creates a diagnostic for a non-interface interface-port connection.
pub fn error_interface_port_invalid_expression(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E407,
        format!("connection to interface port `{name}` must be an interface instance"),
        span,
    )
}

/// Creates a diagnostic for a wrong-interface connection.
pub fn error_interface_port_type_mismatch(name: &str, expected: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E408,
        format!("interface port `{name}` requires an instance of `{expected}`"),
        span,
    )
}

/// Creates a diagnostic for mismatched interface array dimensions.
pub fn error_port_conn_dimensions(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E409,
        format!("connection dimensions do not match interface port `{name}`"),
        span,
    )
}

/// Creates a diagnostic for a connection to a nonexistent port.
pub fn error_port_does_not_exist(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E410, format!("no port named `{name}`"), span)
}

/// Creates a diagnostic for too many ordered port connections.
pub fn error_too_many_port_connections(def: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E411, format!("too many port connections for `{def}`"), span)
}

/// Creates a diagnostic for an invalid enum base type.
pub fn error_invalid_enum_base(ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E500,
        format!("`{ty}` is not a valid enum base type; expected a simple bit vector"),
        span,
    )
}

/// Creates a diagnostic for a duplicate enum value.
pub fn error_enum_value_duplicate(value: &str, span: Span, previous: Span) -> Diagnostic {
    Diagnostic::error(E501, format!("enum value {value} is already used"), span)
        .with_label(Label::secondary(previous, "previously used here"))
}

/// Creates a diagnostic for incrementing from an unknown enum value.
pub fn error_enum_increment_unknown(span: Span) -> Diagnostic {
    Diagnostic::error(
        E502,
        "cannot infer an enum value; the previous value has X/Z bits",
        span,
    )
}

/// Creates a diagnostic for enum auto-increment overflow.
pub fn error_enum_value_overflow(span: Span) -> Diagnostic {
    Diagnostic::error(E503, "enum value overflows its base type", span)
}

/// Creates a diagnostic for a multi-dimensional enum member range.
pub fn error_enum_range_multidimensional(span: Span) -> Diagnostic {
    Diagnostic::error(E504, "enum member ranges must have a single dimension", span)
}

/// Creates a diagnostic for a non-integral packed member.
pub fn error_packed_member_not_integral(ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E505,
        format!("packed members must be integral; `{ty}` is not"),
        span,
    )
}

/// Creates a diagnostic for an initializer on a packed member.
pub fn error_packed_member_has_initializer(span: Span) -> Diagnostic {
    Diagnostic::error(E506, "packed members cannot have initializers", span)
}

/// Creates a diagnostic for mismatched packed union member widths.
pub fn error_packed_union_width_mismatch(span: Span) -> Diagnostic {
    Diagnostic::error(E507, "packed union members must all have the same width", span)
}

/// Creates a diagnostic for a non-constant dimension.
pub fn error_invalid_dimension(span: Span) -> Diagnostic {
    Diagnostic::error(E508, "dimension bounds must be constant integers", span)
}

/// Creates a diagnostic for a malformed numeric literal.
pub fn error_invalid_literal(detail: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E509, format!("invalid numeric literal: {detail}"), span)
}

/// Creates a diagnostic for a plain decimal overflowing 32 signed bits.
pub fn error_signed_literal_overflow(span: Span) -> Diagnostic {
    Diagnostic::error(E510, "signed integer overflows 32 bits", span)
}

/// Creates a warning for a truncated vector literal.
pub fn warn_literal_truncated(span: Span) -> Diagnostic {
    Diagnostic::warning(
        W500,
        "vector literal too large for the given number of bits",
        span,
    )
}

/// Creates a diagnostic for a bad unary operand.
pub fn error_bad_unary(ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E600,
        format!("invalid operand type `{ty}` for unary operator"),
        span,
    )
}

/// Creates a diagnostic for bad binary operands.
pub fn error_bad_binary(lhs: &str, rhs: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E601,
        format!("invalid operand types `{lhs}` and `{rhs}` for binary operator"),
        span,
    )
}

/// Creates a diagnostic for incompatible conditional arms.
pub fn error_bad_conditional(lhs: &str, rhs: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E602,
        format!("conditional arms have incompatible types `{lhs}` and `{rhs}`"),
        span,
    )
}

/// Creates a diagnostic for a non-boolean predicate.
pub fn error_not_boolean_convertible(ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E603,
        format!("`{ty}` is not convertible to a boolean predicate"),
        span,
    )
}

/// Creates a diagnostic for a missing implicit conversion.
pub fn error_no_implicit_conversion(from: &str, to: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E604,
        format!("no implicit conversion from `{from}` to `{to}`"),
        span,
    )
}

/// Creates a diagnostic for an out-of-bounds index at bind time.
pub fn error_index_value_invalid(index: &str, ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E605,
        format!("index {index} is invalid for type `{ty}`"),
        span,
    )
}

/// Creates a diagnostic for a bad range select at bind time.
pub fn error_bad_range(ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E606, format!("invalid range select for type `{ty}`"), span)
}

/// Creates a diagnostic for calling a non-callable expression.
pub fn error_not_callable(span: Span) -> Diagnostic {
    Diagnostic::error(E607, "expression is not callable", span)
}

/// Creates a diagnostic for a non-constant expression in a constant
/// context.
pub fn error_expression_not_constant(span: Span) -> Diagnostic {
    Diagnostic::error(E608, "expression is not constant", span)
}

/// Creates a diagnostic for a call argument count mismatch.
pub fn error_arg_count(name: &str, expected: usize, got: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E609,
        format!("`{name}` expects {expected} argument(s), got {got}"),
        span,
    )
}

/// Creates a diagnostic for an invalid assignment target.
pub fn error_bad_assignment(span: Span) -> Diagnostic {
    Diagnostic::error(E610, "expression is not assignable", span)
}

/// Creates a diagnostic for exceeding the evaluation step budget.
pub fn error_eval_exceeded_steps(span: Span) -> Diagnostic {
    Diagnostic::error(
        E700,
        "constant evaluation exceeded the maximum number of steps",
        span,
    )
}

/// Creates a diagnostic for a bad array index during evaluation.
pub fn error_array_index_invalid(index: &str, ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E701,
        format!("index {index} is out of bounds for `{ty}`"),
        span,
    )
}

/// Creates a diagnostic for a bad string index during evaluation.
pub fn error_string_index_invalid(index: &str, len: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E702,
        format!("index {index} is out of bounds for a string of length {len}"),
        span,
    )
}

/// Creates a diagnostic for a bad part select during evaluation.
pub fn error_part_select_invalid(left: i32, right: i32, ty: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E703,
        format!("part select [{left}:{right}] is out of range for `{ty}`"),
        span,
    )
}

/// Creates a diagnostic for a bad replication count.
pub fn error_replication_count_invalid(count: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E704, format!("replication count {count} is invalid"), span)
}

/// Creates a diagnostic for referencing a non-constant variable.
pub fn error_non_const_variable(name: &str, span: Span, decl: Span) -> Diagnostic {
    Diagnostic::error(
        E705,
        format!("variable `{name}` does not have a constant value"),
        span,
    )
    .with_label(Label::secondary(decl, "declared here"))
}

/// Creates a diagnostic for a parameter used before its declaration in a
/// constant function.
pub fn error_param_used_before_decl(name: &str, span: Span, decl: Span) -> Diagnostic {
    Diagnostic::error(
        E706,
        format!("parameter `{name}` is used before its declaration in a constant function"),
        span,
    )
    .with_label(Label::secondary(decl, "declared here"))
}

/// Creates a diagnostic for a non-local identifier in a constant function.
pub fn error_function_identifiers_must_be_local(span: Span, decl: Span) -> Diagnostic {
    Diagnostic::error(
        E707,
        "identifiers in constant functions must be declared locally",
        span,
    )
    .with_label(Label::secondary(decl, "declared here"))
}

/// Creates a diagnostic for a genvar with X/Z bits.
pub fn error_genvar_unknown_bits(value: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E800,
        format!("generate loop variable acquired unknown bits: {value}"),
        span,
    )
}

/// Creates a diagnostic for a repeated genvar value.
pub fn error_genvar_duplicate(value: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E801,
        format!("generate loop revisited the value {value}"),
        span,
    )
}

/// Creates a diagnostic for a non-genvar loop variable.
pub fn error_not_a_genvar(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E802, format!("`{name}` is not a genvar"), span)
}

/// Creates a diagnostic for a case generate with no matching arm.
pub fn error_case_generate_no_block(value: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E803,
        format!("no case-generate arm matches {value} and there is no default"),
        span,
    )
}

/// Creates a warning for a duplicate case-generate match.
pub fn warn_case_generate_dup(value: &str, span: Span, previous: Span) -> Diagnostic {
    Diagnostic::warning(
        W800,
        format!("more than one case-generate arm matches {value}"),
        span,
    )
    .with_label(Label::secondary(previous, "first match here"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E200}"), "E200");
        assert_eq!(format!("{E309}"), "E309");
        assert_eq!(format!("{W800}"), "W800");
    }

    #[test]
    fn unknown_module_diagnostic() {
        let d = error_unknown_module("adder", Span::DUMMY);
        assert_eq!(d.code, E200);
        assert!(d.message.contains("adder"));
    }

    #[test]
    fn redefinition_carries_label() {
        let d = error_redefinition("x", Span::DUMMY, Span::DUMMY);
        assert_eq!(d.code, E300);
        assert_eq!(d.labels.len(), 1);
    }

    #[test]
    fn local_param_codes_differ() {
        let port = error_assigned_to_local_param("p", true, Span::DUMMY, Span::DUMMY);
        let body = error_assigned_to_local_param("p", false, Span::DUMMY, Span::DUMMY);
        assert_eq!(port.code, E306);
        assert_eq!(body.code, E307);
    }

    #[test]
    fn warnings_are_warnings() {
        assert_eq!(
            warn_case_generate_dup("1", Span::DUMMY, Span::DUMMY).severity,
            veris_diagnostics::Severity::Warning
        );
        assert_eq!(
            warn_unconnected_port("clk", Span::DUMMY).severity,
            veris_diagnostics::Severity::Warning
        );
    }
}
