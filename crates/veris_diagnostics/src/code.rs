//! Diagnostic codes with category prefixes for structured error
//! identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier, displayed as e.g. `E101` or `W203`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Error, 101)), "E101");
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Warning, 3)), "W003");
    }

    #[test]
    fn ordering_by_category_then_number() {
        let a = DiagnosticCode::new(Category::Error, 5);
        let b = DiagnosticCode::new(Category::Error, 6);
        let c = DiagnosticCode::new(Category::Warning, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
