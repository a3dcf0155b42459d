//! Four-state logic values with truth-table-based operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A single 4-state logic value as defined by IEEE 1800.
///
/// The four states represent:
/// - `Zero` — logic low (driven 0)
/// - `One` — logic high (driven 1)
/// - `X` — unknown or uninitialized value
/// - `Z` — high-impedance (tri-state, not driven)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or uninitialized.
    X = 2,
    /// High-impedance (tri-state).
    Z = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X', 'z'/'Z', and '?' (an alias for Z in
    /// literals).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' | '?' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Converts a boolean to `Zero` or `One`.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// Returns `true` if this value is `X` or `Z`.
    pub fn is_unknown(self) -> bool {
        matches!(self, Logic::X | Logic::Z)
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "x"),
            Logic::Z => write!(f, "z"),
        }
    }
}

/// AND truth table:
/// ```text
///     0  1  X  Z
/// 0 | 0  0  0  0
/// 1 | 0  1  X  X
/// X | 0  X  X  X
/// Z | 0  X  X  X
/// ```
impl BitAnd for Logic {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (Zero, _) | (_, Zero) => Zero,
            (One, One) => One,
            _ => X,
        }
    }
}

/// OR truth table:
/// ```text
///     0  1  X  Z
/// 0 | 0  1  X  X
/// 1 | 1  1  1  1
/// X | X  1  X  X
/// Z | X  1  X  X
/// ```
impl BitOr for Logic {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (One, _) | (_, One) => One,
            (Zero, Zero) => Zero,
            _ => X,
        }
    }
}

/// XOR truth table:
/// ```text
///     0  1  X  Z
/// 0 | 0  1  X  X
/// 1 | 1  0  X  X
/// X | X  X  X  X
/// Z | X  X  X  X
/// ```
impl BitXor for Logic {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        use Logic::*;
        match (self, rhs) {
            (Zero, Zero) | (One, One) => Zero,
            (Zero, One) | (One, Zero) => One,
            _ => X,
        }
    }
}

/// NOT: `!0 = 1`, `!1 = 0`, `!X = X`, `!Z = X`
impl Not for Logic {
    type Output = Self;

    fn not(self) -> Self {
        use Logic::*;
        match self {
            Zero => One,
            One => Zero,
            X | Z => X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Logic::*;
    use super::*;

    #[test]
    fn and_truth_table() {
        assert_eq!(Zero & Zero, Zero);
        assert_eq!(Zero & X, Zero);
        assert_eq!(Z & Zero, Zero);
        assert_eq!(One & One, One);
        assert_eq!(One & X, X);
        assert_eq!(One & Z, X);
        assert_eq!(X & Z, X);
        assert_eq!(Z & Z, X);
    }

    #[test]
    fn or_truth_table() {
        assert_eq!(One | Zero, One);
        assert_eq!(One | X, One);
        assert_eq!(Z | One, One);
        assert_eq!(Zero | Zero, Zero);
        assert_eq!(Zero | X, X);
        assert_eq!(X | Z, X);
    }

    #[test]
    fn xor_truth_table() {
        assert_eq!(Zero ^ Zero, Zero);
        assert_eq!(Zero ^ One, One);
        assert_eq!(One ^ One, Zero);
        assert_eq!(One ^ X, X);
        assert_eq!(Z ^ Zero, X);
    }

    #[test]
    fn not_values() {
        assert_eq!(!Zero, One);
        assert_eq!(!One, Zero);
        assert_eq!(!X, X);
        assert_eq!(!Z, X);
    }

    #[test]
    fn from_char() {
        assert_eq!(Logic::from_char('0'), Some(Zero));
        assert_eq!(Logic::from_char('1'), Some(One));
        assert_eq!(Logic::from_char('X'), Some(X));
        assert_eq!(Logic::from_char('z'), Some(Z));
        assert_eq!(Logic::from_char('?'), Some(Z));
        assert_eq!(Logic::from_char('2'), None);
    }

    #[test]
    fn unknown_predicate() {
        assert!(!Zero.is_unknown());
        assert!(!One.is_unknown());
        assert!(X.is_unknown());
        assert!(Z.is_unknown());
    }

    #[test]
    fn display_lowercase() {
        assert_eq!(format!("{Zero}{One}{X}{Z}"), "01xz");
    }
}
