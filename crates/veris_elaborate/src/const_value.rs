//! Compile-time constant values.

use veris_common::SvInt;

/// A resolved compile-time constant value.
///
/// The `Invalid` variant is the failure sentinel used throughout the
/// evaluator: operations never abort, they produce `Invalid` plus a
/// diagnostic and let downstream consumers filter it.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    /// Evaluation failed; diagnostics explain why.
    Invalid,
    /// The `null` literal (class handles, chandles, events).
    NullPlaceholder,
    /// A four-state integer of arbitrary width.
    Integer(SvInt),
    /// A 64-bit real.
    Real(f64),
    /// A 32-bit shortreal.
    ShortReal(f32),
    /// A string.
    Str(String),
    /// Elements of an unpacked array, struct, or union, in declaration
    /// order.
    Elements(Vec<ConstantValue>),
}

impl ConstantValue {
    /// Returns `true` if this is the failure sentinel.
    pub fn is_invalid(&self) -> bool {
        matches!(self, ConstantValue::Invalid)
    }

    /// Returns `true` for a known-true value (nonzero integer, nonzero
    /// real, nonempty string).
    pub fn is_true(&self) -> bool {
        match self {
            ConstantValue::Integer(v) => v.is_true(),
            ConstantValue::Real(v) => *v != 0.0,
            ConstantValue::ShortReal(v) => *v != 0.0,
            ConstantValue::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Returns `true` for a known-false value.
    pub fn is_false(&self) -> bool {
        match self {
            ConstantValue::Integer(v) => v.is_false(),
            ConstantValue::Real(v) => *v == 0.0,
            ConstantValue::ShortReal(v) => *v == 0.0,
            ConstantValue::Str(s) => s.is_empty(),
            ConstantValue::NullPlaceholder => true,
            _ => false,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn integer(&self) -> Option<&SvInt> {
        match self {
            ConstantValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the element list, if this is an aggregate.
    pub fn elements(&self) -> Option<&[ConstantValue]> {
        match self {
            ConstantValue::Elements(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to an `i64` if this is a fully known integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.integer().and_then(SvInt::as_i64)
    }

    /// Compares two values for equivalence: integers compare by value
    /// (including unknown bits exactly), aggregates element-wise.
    pub fn equivalent_to(&self, other: &ConstantValue) -> bool {
        match (self, other) {
            (ConstantValue::Integer(a), ConstantValue::Integer(b)) => a.exactly_equals(b),
            (ConstantValue::Elements(a), ConstantValue::Elements(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent_to(y))
            }
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Invalid => write!(f, "<invalid>"),
            ConstantValue::NullPlaceholder => write!(f, "null"),
            ConstantValue::Integer(v) => write!(f, "{v}"),
            ConstantValue::Real(v) => write!(f, "{v}"),
            ConstantValue::ShortReal(v) => write!(f, "{v}"),
            ConstantValue::Str(s) => write!(f, "\"{s}\""),
            ConstantValue::Elements(elements) => {
                write!(f, "'{{")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(ConstantValue::Integer(SvInt::new(32, 9, true)).is_true());
        assert!(ConstantValue::Integer(SvInt::new(32, 0, true)).is_false());
        assert!(ConstantValue::Real(1.5).is_true());
        assert!(ConstantValue::Str(String::new()).is_false());
        assert!(!ConstantValue::Invalid.is_true());
        assert!(!ConstantValue::Invalid.is_false());
    }

    #[test]
    fn unknown_integer_is_neither() {
        let v = ConstantValue::Integer(SvInt::filled_x(4, false));
        assert!(!v.is_true());
        assert!(!v.is_false());
    }

    #[test]
    fn equivalence() {
        let a = ConstantValue::Integer(SvInt::new(32, 5, true));
        let b = ConstantValue::Integer(SvInt::new(32, 5, true));
        assert!(a.equivalent_to(&b));

        let list_a = ConstantValue::Elements(vec![a.clone(), b.clone()]);
        let list_b = ConstantValue::Elements(vec![a.clone(), b.clone()]);
        assert!(list_a.equivalent_to(&list_b));

        let shorter = ConstantValue::Elements(vec![a]);
        assert!(!list_a.equivalent_to(&shorter));
    }

    #[test]
    fn display_forms() {
        assert_eq!(format!("{}", ConstantValue::Invalid), "<invalid>");
        assert_eq!(
            format!("{}", ConstantValue::Integer(SvInt::new(32, 7, true))),
            "7"
        );
        let agg = ConstantValue::Elements(vec![
            ConstantValue::Integer(SvInt::new(32, 1, true)),
            ConstantValue::Integer(SvInt::new(32, 2, true)),
        ]);
        assert_eq!(format!("{agg}"), "'{1,2}");
    }

    #[test]
    fn as_i64_conversion() {
        assert_eq!(
            ConstantValue::Integer(SvInt::from_i64(32, -3, true)).as_i64(),
            Some(-3)
        );
        assert_eq!(ConstantValue::Real(1.0).as_i64(), None);
    }
}
