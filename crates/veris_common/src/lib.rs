//! Shared foundational types used across the veris SystemVerilog front-end.
//!
//! This crate provides core types including interned identifiers, content
//! hashing, 4-state logic values, the arbitrary-width 4-state integer
//! [`SvInt`], and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod logic;
pub mod result;
pub mod svint;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use result::{InternalError, VerisResult};
pub use svint::{LiteralError, ParsedLiteral, SvInt};
