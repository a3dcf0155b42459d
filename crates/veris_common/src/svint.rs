//! Arbitrary-width integers where each bit is one of `{0, 1, X, Z}`.
//!
//! [`SvInt`] is the numeric workhorse of constant evaluation. Values are
//! stored in two bit planes packed into `u64` words: a value plane and an
//! unknown plane. A bit with the unknown-plane bit clear is `0` or `1`
//! according to the value plane; with it set, the value plane distinguishes
//! `X` (0) from `Z` (1). Arithmetic follows the SystemVerilog rules: any
//! unknown operand bit poisons arithmetic results to all-X, while bitwise
//! operators combine bits through the [`Logic`] truth tables.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Number of bits per storage word.
const BITS_PER_WORD: u32 = 64;

/// Maximum allowed width of a vector literal, in bits.
pub const MAX_LITERAL_WIDTH: u32 = (1 << 24) - 1;

/// An arbitrary-width integer with per-bit four-state values.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SvInt {
    width: u32,
    signed: bool,
    /// Value plane: bit set means 1 (or Z when the unknown bit is set).
    val: Vec<u64>,
    /// Unknown plane: bit set means X or Z.
    unk: Vec<u64>,
}

fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}

impl SvInt {
    /// Creates a value of the given width from a `u64`, zero-extending.
    pub fn new(width: u32, value: u64, signed: bool) -> Self {
        assert!(width > 0, "SvInt width must be nonzero");
        let mut v = Self {
            width,
            signed,
            val: vec![0; word_count(width)],
            unk: vec![0; word_count(width)],
        };
        v.val[0] = value;
        v.mask_top();
        v
    }

    /// Creates a value of the given width from an `i64`, sign-extending.
    pub fn from_i64(width: u32, value: i64, signed: bool) -> Self {
        assert!(width > 0, "SvInt width must be nonzero");
        let fill = if value < 0 { u64::MAX } else { 0 };
        let mut v = Self {
            width,
            signed,
            val: vec![fill; word_count(width)],
            unk: vec![0; word_count(width)],
        };
        v.val[0] = value as u64;
        v.mask_top();
        v
    }

    /// Creates a single-bit unsigned value from a boolean.
    pub fn from_bool(b: bool) -> Self {
        Self::new(1, b as u64, false)
    }

    /// Creates a single-bit value from a [`Logic`].
    pub fn from_logic(l: Logic) -> Self {
        let mut v = Self::new(1, 0, false);
        v.set(0, l);
        v
    }

    /// Creates a value with every bit set to `X`.
    pub fn filled_x(width: u32, signed: bool) -> Self {
        let mut v = Self::new(width, 0, signed);
        for w in v.unk.iter_mut() {
            *w = u64::MAX;
        }
        v.mask_top();
        v
    }

    /// Creates a value with every bit set to `Z`.
    pub fn filled_z(width: u32, signed: bool) -> Self {
        let mut v = Self::filled_x(width, signed);
        v.val.copy_from_slice(&v.unk);
        v
    }

    /// Sets every bit to `1`.
    pub fn set_all_ones(&mut self) {
        for w in self.val.iter_mut() {
            *w = u64::MAX;
        }
        for w in self.unk.iter_mut() {
            *w = 0;
        }
        self.mask_top();
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns whether this value participates in signed arithmetic.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Returns a copy with the given signedness.
    pub fn as_signed(&self, signed: bool) -> Self {
        let mut v = self.clone();
        v.signed = signed;
        v
    }

    /// Returns `true` if any bit is `X` or `Z`.
    pub fn has_unknown(&self) -> bool {
        self.unk.iter().any(|&w| w != 0)
    }

    /// Gets the logic value of the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(index < self.width, "bit {index} out of range");
        let w = (index / BITS_PER_WORD) as usize;
        let b = index % BITS_PER_WORD;
        let v = (self.val[w] >> b) & 1;
        let u = (self.unk[w] >> b) & 1;
        match (u, v) {
            (0, 0) => Logic::Zero,
            (0, 1) => Logic::One,
            (1, 0) => Logic::X,
            _ => Logic::Z,
        }
    }

    /// Sets the bit at `index` to the given logic value.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(index < self.width, "bit {index} out of range");
        let w = (index / BITS_PER_WORD) as usize;
        let b = index % BITS_PER_WORD;
        let (u, v) = match value {
            Logic::Zero => (0u64, 0u64),
            Logic::One => (0, 1),
            Logic::X => (1, 0),
            Logic::Z => (1, 1),
        };
        self.val[w] = (self.val[w] & !(1 << b)) | (v << b);
        self.unk[w] = (self.unk[w] & !(1 << b)) | (u << b);
    }

    /// The sign bit interpreted as a logic value.
    pub fn msb(&self) -> Logic {
        self.get(self.width - 1)
    }

    /// Returns `true` if the value is a known nonzero number.
    pub fn is_true(&self) -> bool {
        !self.has_unknown() && self.val.iter().any(|&w| w != 0)
    }

    /// Returns `true` if the value is known and zero.
    pub fn is_false(&self) -> bool {
        !self.has_unknown() && self.val.iter().all(|&w| w == 0)
    }

    /// Converts the value to a single [`Logic`] predicate: `X` if any bit is
    /// unknown, otherwise whether any bit is set.
    pub fn to_logic(&self) -> Logic {
        if self.has_unknown() {
            Logic::X
        } else {
            Logic::from_bool(self.val.iter().any(|&w| w != 0))
        }
    }

    /// Converts to `u64` if the value is fully known and fits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.has_unknown() {
            return None;
        }
        if self.val.iter().skip(1).any(|&w| w != 0) {
            return None;
        }
        Some(self.val[0])
    }

    /// Converts to `i64`, honoring the value's signedness.
    pub fn as_i64(&self) -> Option<i64> {
        if self.has_unknown() {
            return None;
        }
        let narrowed = self.resize(64, self.signed);
        if !self.exactly_equals(&narrowed.resize(self.width, self.signed)) {
            return None;
        }
        let v = narrowed.val[0];
        if self.signed {
            Some(v as i64)
        } else {
            i64::try_from(v).ok()
        }
    }

    /// Converts to `i32`, honoring the value's signedness.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    fn mask_top(&mut self) {
        let rem = self.width % BITS_PER_WORD;
        if rem != 0 {
            let mask = (1u64 << rem) - 1;
            if let Some(last) = self.val.last_mut() {
                *last &= mask;
            }
            if let Some(last) = self.unk.last_mut() {
                *last &= mask;
            }
        }
    }

    /// Resizes to a new width, truncating or extending.
    ///
    /// Extension replicates the top bit when the value is signed (including
    /// X/Z sign bits) and fills with zero otherwise.
    pub fn resize(&self, width: u32, signed: bool) -> Self {
        let mut out = Self::new(width, 0, signed);
        let fill = if self.signed { self.msb() } else { Logic::Zero };
        for i in 0..width {
            let bit = if i < self.width { self.get(i) } else { fill };
            out.set(i, bit);
        }
        out
    }

    /// Converts to a new width/signedness, flattening X/Z to 0 when the
    /// target is two-state.
    pub fn convert(&self, width: u32, signed: bool, four_state: bool) -> Self {
        let mut out = self.resize(width, signed);
        if !four_state {
            for i in 0..width {
                if out.get(i).is_unknown() {
                    out.set(i, Logic::Zero);
                }
            }
        }
        out
    }

    // ---- arithmetic ----

    fn both_prepared(&self, rhs: &Self) -> (Self, Self, bool) {
        let width = self.width.max(rhs.width);
        let signed = self.signed && rhs.signed;
        (
            self.resize(width, signed),
            rhs.resize(width, signed),
            signed,
        )
    }

    fn negate_val(words: &mut [u64], width: u32) {
        let mut carry = 1u64;
        for w in words.iter_mut() {
            let (inv, _) = (!*w).overflowing_add(0);
            let (sum, c) = inv.overflowing_add(carry);
            *w = sum;
            carry = c as u64;
        }
        let rem = width % BITS_PER_WORD;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    /// Arithmetic negation.
    pub fn negate(&self) -> Self {
        if self.has_unknown() {
            return Self::filled_x(self.width, self.signed);
        }
        let mut out = self.clone();
        Self::negate_val(&mut out.val, out.width);
        out
    }

    /// Addition; any unknown bit yields all-X.
    pub fn add(&self, rhs: &Self) -> Self {
        let (a, b, signed) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() {
            return Self::filled_x(a.width, signed);
        }
        let mut out = Self::new(a.width, 0, signed);
        let mut carry = 0u64;
        for i in 0..a.val.len() {
            let (s1, c1) = a.val[i].overflowing_add(b.val[i]);
            let (s2, c2) = s1.overflowing_add(carry);
            out.val[i] = s2;
            carry = (c1 as u64) | (c2 as u64);
        }
        out.mask_top();
        out
    }

    /// Subtraction; any unknown bit yields all-X.
    pub fn sub(&self, rhs: &Self) -> Self {
        let (a, b, signed) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() {
            return Self::filled_x(a.width, signed);
        }
        a.add(&b.negate())
    }

    /// Multiplication (truncating); any unknown bit yields all-X.
    pub fn mul(&self, rhs: &Self) -> Self {
        let (a, b, signed) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() {
            return Self::filled_x(a.width, signed);
        }
        let n = a.val.len();
        let mut acc = vec![0u64; n];
        for i in 0..n {
            let mut carry = 0u128;
            for j in 0..n - i {
                let prod = (a.val[i] as u128) * (b.val[j] as u128)
                    + (acc[i + j] as u128)
                    + carry;
                acc[i + j] = prod as u64;
                carry = prod >> 64;
            }
        }
        let mut out = Self::new(a.width, 0, signed);
        out.val = acc;
        out.mask_top();
        out
    }

    fn cmp_magnitude(a: &[u64], b: &[u64]) -> Ordering {
        for i in (0..a.len()).rev() {
            match a[i].cmp(&b[i]) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }

    fn is_zero_words(words: &[u64]) -> bool {
        words.iter().all(|&w| w == 0)
    }

    fn udivrem(a: &[u64], b: &[u64], width: u32) -> (Vec<u64>, Vec<u64>) {
        let n = a.len();
        let mut quot = vec![0u64; n];
        let mut rem = vec![0u64; n];
        for i in (0..width).rev() {
            // rem = (rem << 1) | a[i]
            let mut carry = (a[(i / BITS_PER_WORD) as usize] >> (i % BITS_PER_WORD)) & 1;
            for w in rem.iter_mut() {
                let top = *w >> 63;
                *w = (*w << 1) | carry;
                carry = top;
            }
            if Self::cmp_magnitude(&rem, b) != Ordering::Less {
                let mut borrow = 0u64;
                for j in 0..n {
                    let (d1, b1) = rem[j].overflowing_sub(b[j]);
                    let (d2, b2) = d1.overflowing_sub(borrow);
                    rem[j] = d2;
                    borrow = (b1 as u64) | (b2 as u64);
                }
                quot[(i / BITS_PER_WORD) as usize] |= 1 << (i % BITS_PER_WORD);
            }
        }
        (quot, rem)
    }

    fn signed_negative(&self) -> bool {
        self.signed && self.msb() == Logic::One
    }

    fn divrem(&self, rhs: &Self, want_rem: bool) -> Self {
        let (a, b, signed) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() || Self::is_zero_words(&b.val) {
            // Division by zero produces all-X per the LRM.
            return Self::filled_x(a.width, signed);
        }
        let neg_a = a.signed_negative();
        let neg_b = b.signed_negative();
        let mut av = a.val.clone();
        let mut bv = b.val.clone();
        if neg_a {
            Self::negate_val(&mut av, a.width);
        }
        if neg_b {
            Self::negate_val(&mut bv, b.width);
        }
        let (quot, rem) = Self::udivrem(&av, &bv, a.width);
        let mut out = Self::new(a.width, 0, signed);
        out.val = if want_rem { rem } else { quot };
        let negate_out = if want_rem { neg_a } else { neg_a != neg_b };
        if negate_out {
            Self::negate_val(&mut out.val, out.width);
        }
        out.mask_top();
        out
    }

    /// Division; unknown operands or a zero divisor yield all-X.
    pub fn div(&self, rhs: &Self) -> Self {
        self.divrem(rhs, false)
    }

    /// Remainder; the result takes the dividend's sign.
    pub fn rem(&self, rhs: &Self) -> Self {
        self.divrem(rhs, true)
    }

    /// Power operator per the LRM's integer table.
    pub fn pow(&self, rhs: &Self) -> Self {
        if self.has_unknown() || rhs.has_unknown() {
            return Self::filled_x(self.width, self.signed);
        }
        let one = Self::new(self.width, 1, self.signed);
        let exp_negative = rhs.signed_negative();
        if exp_negative {
            // base 1 -> 1; base -1 -> alternates; base 0 -> x; else 0.
            if self.exactly_equals(&one.resize(self.width, self.signed)) {
                return one;
            }
            let minus_one = one.negate();
            if self.signed && self.exactly_equals(&minus_one) {
                let exp_even = rhs.get(0) == Logic::Zero;
                return if exp_even { one } else { minus_one };
            }
            if Self::is_zero_words(&self.val) {
                return Self::filled_x(self.width, self.signed);
            }
            return Self::new(self.width, 0, self.signed);
        }
        let Some(mut e) = rhs.resize(64.min(rhs.width.max(1)), false).as_u64() else {
            return Self::filled_x(self.width, self.signed);
        };
        let mut base = self.clone();
        let mut result = one;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base);
            }
            base = base.mul(&base);
            e >>= 1;
        }
        result
    }

    // ---- bitwise ----

    fn bitwise(&self, rhs: &Self, f: impl Fn(Logic, Logic) -> Logic) -> Self {
        let (a, b, signed) = self.both_prepared(rhs);
        let mut out = Self::new(a.width, 0, signed);
        for i in 0..a.width {
            out.set(i, f(a.get(i), b.get(i)));
        }
        out
    }

    /// Bitwise AND through the four-state truth table.
    pub fn and(&self, rhs: &Self) -> Self {
        self.bitwise(rhs, |a, b| a & b)
    }

    /// Bitwise OR through the four-state truth table.
    pub fn or(&self, rhs: &Self) -> Self {
        self.bitwise(rhs, |a, b| a | b)
    }

    /// Bitwise XOR through the four-state truth table.
    pub fn xor(&self, rhs: &Self) -> Self {
        self.bitwise(rhs, |a, b| a ^ b)
    }

    /// Bitwise XNOR through the four-state truth table.
    pub fn xnor(&self, rhs: &Self) -> Self {
        self.bitwise(rhs, |a, b| !(a ^ b))
    }

    /// Bitwise NOT.
    pub fn not(&self) -> Self {
        let mut out = Self::new(self.width, 0, self.signed);
        for i in 0..self.width {
            out.set(i, !self.get(i));
        }
        out
    }

    /// AND reduction over all bits.
    pub fn reduction_and(&self) -> Logic {
        let mut acc = Logic::One;
        for i in 0..self.width {
            acc = acc & self.get(i);
        }
        acc
    }

    /// OR reduction over all bits.
    pub fn reduction_or(&self) -> Logic {
        let mut acc = Logic::Zero;
        for i in 0..self.width {
            acc = acc | self.get(i);
        }
        acc
    }

    /// XOR reduction over all bits.
    pub fn reduction_xor(&self) -> Logic {
        let mut acc = Logic::Zero;
        for i in 0..self.width {
            acc = acc ^ self.get(i);
        }
        acc
    }

    // ---- shifts ----

    fn shift_amount(&self) -> Option<u32> {
        if self.has_unknown() {
            return None;
        }
        // Amounts are always treated as unsigned.
        let v = self.as_signed(false).as_u64()?;
        Some(v.min(u64::from(u32::MAX)) as u32)
    }

    /// Logical shift left; an unknown amount yields all-X.
    pub fn shl(&self, amount: &Self) -> Self {
        match amount.shift_amount() {
            Some(n) => self.shl_u32(n),
            None => Self::filled_x(self.width, self.signed),
        }
    }

    /// Logical shift left by a known amount.
    pub fn shl_u32(&self, amount: u32) -> Self {
        let mut out = Self::new(self.width, 0, self.signed);
        for i in 0..self.width {
            if i >= amount {
                out.set(i, self.get(i - amount));
            }
        }
        out
    }

    /// Logical shift right; an unknown amount yields all-X.
    pub fn lshr(&self, amount: &Self) -> Self {
        match amount.shift_amount() {
            Some(n) => self.lshr_u32(n),
            None => Self::filled_x(self.width, self.signed),
        }
    }

    /// Logical shift right by a known amount.
    pub fn lshr_u32(&self, amount: u32) -> Self {
        let mut out = Self::new(self.width, 0, self.signed);
        for i in 0..self.width {
            if let Some(src) = i.checked_add(amount) {
                if src < self.width {
                    out.set(i, self.get(src));
                }
            }
        }
        out
    }

    /// Arithmetic shift right: fills with the sign bit when signed.
    pub fn ashr(&self, amount: &Self) -> Self {
        let Some(n) = amount.shift_amount() else {
            return Self::filled_x(self.width, self.signed);
        };
        if !self.signed {
            return self.lshr_u32(n);
        }
        let fill = self.msb();
        let mut out = Self::new(self.width, 0, self.signed);
        for i in 0..self.width {
            let src = i.checked_add(n);
            let bit = match src {
                Some(s) if s < self.width => self.get(s),
                _ => fill,
            };
            out.set(i, bit);
        }
        out
    }

    // ---- comparisons ----

    /// Four-state equality: `X` if either side has unknown bits.
    pub fn eq_logic(&self, rhs: &Self) -> Logic {
        let (a, b, _) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() {
            return Logic::X;
        }
        Logic::from_bool(a.val == b.val)
    }

    /// Case equality (`===`): X and Z bits must match exactly.
    pub fn exactly_equals(&self, rhs: &Self) -> bool {
        let (a, b, _) = self.both_prepared(rhs);
        a.val == b.val && a.unk == b.unk
    }

    /// Wildcard equality (`==?`): X/Z bits in `rhs` match anything;
    /// remaining unknown bits make the result `X`.
    pub fn wildcard_equals(&self, rhs: &Self) -> Logic {
        let (a, b, _) = self.both_prepared(rhs);
        let mut result = Logic::One;
        for i in 0..a.width {
            let rb = b.get(i);
            if rb.is_unknown() {
                continue;
            }
            let lb = a.get(i);
            if lb.is_unknown() {
                result = Logic::X;
            } else if lb != rb {
                return Logic::Zero;
            }
        }
        result
    }

    fn compare(&self, rhs: &Self) -> Option<Ordering> {
        let (a, b, signed) = self.both_prepared(rhs);
        if a.has_unknown() || b.has_unknown() {
            return None;
        }
        if signed {
            let na = a.signed_negative();
            let nb = b.signed_negative();
            if na != nb {
                return Some(if na { Ordering::Less } else { Ordering::Greater });
            }
        }
        Some(Self::cmp_magnitude(&a.val, &b.val))
    }

    /// Four-state `<`.
    pub fn lt(&self, rhs: &Self) -> Logic {
        match self.compare(rhs) {
            Some(ord) => Logic::from_bool(ord == Ordering::Less),
            None => Logic::X,
        }
    }

    /// Four-state `<=`.
    pub fn le(&self, rhs: &Self) -> Logic {
        match self.compare(rhs) {
            Some(ord) => Logic::from_bool(ord != Ordering::Greater),
            None => Logic::X,
        }
    }

    /// Four-state `>`.
    pub fn gt(&self, rhs: &Self) -> Logic {
        !self.le(rhs)
    }

    /// Four-state `>=`.
    pub fn ge(&self, rhs: &Self) -> Logic {
        !self.lt(rhs)
    }

    // ---- structure ----

    /// Extracts bits `lsb..=msb` (zero-based offsets from the LSB).
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie within the value.
    pub fn slice(&self, msb: u32, lsb: u32) -> Self {
        assert!(msb >= lsb && msb < self.width, "slice out of range");
        let mut out = Self::new(msb - lsb + 1, 0, false);
        for i in lsb..=msb {
            out.set(i - lsb, self.get(i));
        }
        out
    }

    /// Concatenates values MSB-first into one unsigned result.
    pub fn concat(parts: &[SvInt]) -> Self {
        let total: u32 = parts.iter().map(|p| p.width).sum();
        let mut out = Self::new(total.max(1), 0, false);
        let mut pos = total;
        for part in parts {
            pos -= part.width;
            for i in 0..part.width {
                out.set(pos + i, part.get(i));
            }
        }
        out
    }

    /// Replicates this value `count` times, MSB-first.
    pub fn replicate(&self, count: u32) -> Self {
        let parts: Vec<SvInt> = (0..count).map(|_| self.clone()).collect();
        if parts.is_empty() {
            return Self::new(1, 0, false);
        }
        Self::concat(&parts)
    }

    /// Merges two values per the conditional-operator rule for unknown
    /// predicates: bits that agree are kept, all others become `X`.
    pub fn merge_conditional(a: &Self, b: &Self) -> Self {
        let width = a.width.max(b.width);
        let signed = a.signed && b.signed;
        let av = a.resize(width, signed);
        let bv = b.resize(width, signed);
        let mut out = Self::new(width, 0, signed);
        for i in 0..width {
            let (la, lb) = (av.get(i), bv.get(i));
            out.set(i, if la == lb && !la.is_unknown() { la } else { Logic::X });
        }
        out
    }
}

impl fmt::Display for SvInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_unknown() && self.width <= 64 {
            if let Some(v) = self.as_i64() {
                return write!(f, "{v}");
            }
            if let Some(v) = self.as_u64() {
                return write!(f, "{v}");
            }
        }
        write!(f, "{}'b", self.width)?;
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for SvInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SvInt({self})")
    }
}

/// Why a numeric literal failed to parse.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralError {
    /// The size prefix evaluated to zero.
    SizeIsZero,
    /// The size prefix exceeds [`MAX_LITERAL_WIDTH`].
    SizeTooLarge,
    /// A digit was invalid for the literal's base.
    InvalidDigit,
    /// A decimal literal mixed X/Z with other digits.
    MultipleUnknownDigits,
    /// The digits began with an underscore.
    LeadingUnderscore,
    /// No digits followed the base specifier.
    MissingDigits,
    /// A plain decimal literal overflowed 32 signed bits.
    SignedOverflow,
}

/// Result of parsing a vector literal.
#[derive(Clone, Debug)]
pub struct ParsedLiteral {
    /// The parsed value.
    pub value: SvInt,
    /// True if digits were truncated to fit the declared size.
    pub truncated: bool,
}

impl SvInt {
    /// Parses a SystemVerilog integer literal: plain decimals (`42`), sized
    /// and unsized based literals (`4'b10xz`, `'hFF`, `16'shA5`), with
    /// underscore separators.
    pub fn parse_literal(text: &str) -> Result<ParsedLiteral, LiteralError> {
        let Some(tick) = text.find('\'') else {
            return Self::parse_plain_decimal(text);
        };

        let size_text: String = text[..tick]
            .chars()
            .filter(|&c| c != '_' && !c.is_whitespace())
            .collect();
        let explicit_size = if size_text.is_empty() {
            None
        } else {
            let size: u32 = size_text.parse().map_err(|_| LiteralError::SizeTooLarge)?;
            if size == 0 {
                return Err(LiteralError::SizeIsZero);
            }
            if size > MAX_LITERAL_WIDTH {
                return Err(LiteralError::SizeTooLarge);
            }
            Some(size)
        };

        let mut rest = text[tick + 1..].trim_start();
        let mut signed = false;
        if rest.starts_with('s') || rest.starts_with('S') {
            signed = true;
            rest = &rest[1..];
        }
        let base = match rest.bytes().next() {
            Some(b'b' | b'B') => 2u32,
            Some(b'o' | b'O') => 8,
            Some(b'd' | b'D') => 10,
            Some(b'h' | b'H') => 16,
            _ => return Err(LiteralError::MissingDigits),
        };
        let digits: Vec<char> = rest[1..]
            .trim_start()
            .chars()
            .filter(|&c| !c.is_whitespace())
            .collect();
        if digits.is_empty() {
            return Err(LiteralError::MissingDigits);
        }
        if digits[0] == '_' {
            return Err(LiteralError::LeadingUnderscore);
        }
        let digits: Vec<char> = digits.into_iter().filter(|&c| c != '_').collect();

        if base == 10 {
            return Self::parse_based_decimal(&digits, explicit_size, signed);
        }

        let bits_per_digit = match base {
            2 => 1,
            8 => 3,
            _ => 4,
        };

        // Build the bit string LSB-first.
        let mut bits: Vec<Logic> = Vec::new();
        for &c in digits.iter().rev() {
            if let Some(l) = Logic::from_char(c) {
                if l.is_unknown() {
                    for _ in 0..bits_per_digit {
                        bits.push(l);
                    }
                    continue;
                }
            }
            let d = c.to_digit(base).ok_or(LiteralError::InvalidDigit)?;
            for b in 0..bits_per_digit {
                bits.push(Logic::from_bool((d >> b) & 1 != 0));
            }
        }

        let natural = (bits.len() as u32).max(1);
        let width = explicit_size.unwrap_or_else(|| natural.max(32));
        let mut value = SvInt::new(width, 0, signed);
        let mut truncated = false;
        for (i, &bit) in bits.iter().enumerate() {
            if (i as u32) < width {
                value.set(i as u32, bit);
            } else if bit != Logic::Zero {
                truncated = true;
            }
        }
        // A leading unknown digit extends through the full width.
        if bits.len() < width as usize {
            if let Some(&top) = bits.last() {
                if top.is_unknown() {
                    for i in bits.len() as u32..width {
                        value.set(i, top);
                    }
                }
            }
        }
        Ok(ParsedLiteral { value, truncated })
    }

    fn parse_plain_decimal(text: &str) -> Result<ParsedLiteral, LiteralError> {
        let clean: String = text.chars().filter(|&c| c != '_').collect();
        if clean.is_empty() {
            return Err(LiteralError::MissingDigits);
        }
        let v: u64 = clean.parse().map_err(|_| LiteralError::SignedOverflow)?;
        if v > i32::MAX as u64 {
            return Err(LiteralError::SignedOverflow);
        }
        Ok(ParsedLiteral {
            value: SvInt::new(32, v, true),
            truncated: false,
        })
    }

    fn parse_based_decimal(
        digits: &[char],
        explicit_size: Option<u32>,
        signed: bool,
    ) -> Result<ParsedLiteral, LiteralError> {
        let width = explicit_size.unwrap_or(32);
        // A decimal literal may be a single x/z digit covering all bits.
        if digits.iter().any(|c| Logic::from_char(*c).map_or(false, Logic::is_unknown)) {
            if digits.len() > 1 {
                return Err(LiteralError::MultipleUnknownDigits);
            }
            let fill = Logic::from_char(digits[0]).unwrap();
            let value = match fill {
                Logic::Z => SvInt::filled_z(width, signed),
                _ => SvInt::filled_x(width, signed),
            };
            return Ok(ParsedLiteral {
                value,
                truncated: false,
            });
        }
        let mut acc = SvInt::new(width.max(64), 0, false);
        let ten = SvInt::new(width.max(64), 10, false);
        let mut truncated = false;
        for &c in digits {
            let d = c.to_digit(10).ok_or(LiteralError::InvalidDigit)?;
            acc = acc.mul(&ten).add(&SvInt::new(width.max(64), u64::from(d), false));
        }
        for i in width..acc.width() {
            if acc.get(i) != Logic::Zero {
                truncated = true;
            }
        }
        Ok(ParsedLiteral {
            value: acc.resize(width, false).as_signed(signed),
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_read_back() {
        let v = SvInt::new(8, 0xA5, false);
        assert_eq!(v.as_u64(), Some(0xA5));
        assert_eq!(v.width(), 8);
        assert!(!v.has_unknown());
    }

    #[test]
    fn from_i64_sign_extends() {
        let v = SvInt::from_i64(16, -2, true);
        assert_eq!(v.as_i64(), Some(-2));
        assert_eq!(v.as_u64(), Some(0xFFFE));
    }

    #[test]
    fn set_get_four_state() {
        let mut v = SvInt::new(4, 0, false);
        v.set(0, Logic::One);
        v.set(1, Logic::X);
        v.set(2, Logic::Z);
        assert_eq!(v.get(0), Logic::One);
        assert_eq!(v.get(1), Logic::X);
        assert_eq!(v.get(2), Logic::Z);
        assert_eq!(v.get(3), Logic::Zero);
        assert!(v.has_unknown());
        assert_eq!(v.as_u64(), None);
    }

    #[test]
    fn add_basic_and_wrap() {
        let a = SvInt::new(8, 250, false);
        let b = SvInt::new(8, 10, false);
        assert_eq!(a.add(&b).as_u64(), Some(4));

        let a = SvInt::new(32, 4, true);
        let b = SvInt::new(32, 5, true);
        assert_eq!(a.add(&b).as_i64(), Some(9));
    }

    #[test]
    fn sub_goes_negative() {
        let a = SvInt::from_i64(32, 3, true);
        let b = SvInt::from_i64(32, 5, true);
        assert_eq!(a.sub(&b).as_i64(), Some(-2));
    }

    #[test]
    fn mul_truncates_to_width() {
        let a = SvInt::new(8, 16, false);
        let b = SvInt::new(8, 17, false);
        // 272 wraps to 16 in 8 bits.
        assert_eq!(a.mul(&b).as_u64(), Some(16));
    }

    #[test]
    fn div_and_rem_signed() {
        let a = SvInt::from_i64(32, -7, true);
        let b = SvInt::from_i64(32, 2, true);
        assert_eq!(a.div(&b).as_i64(), Some(-3));
        assert_eq!(a.rem(&b).as_i64(), Some(-1));
    }

    #[test]
    fn div_by_zero_is_x() {
        let a = SvInt::new(8, 5, false);
        let b = SvInt::new(8, 0, false);
        assert!(a.div(&b).has_unknown());
    }

    #[test]
    fn unknown_poisons_arithmetic() {
        let mut a = SvInt::new(8, 1, false);
        a.set(3, Logic::X);
        let b = SvInt::new(8, 1, false);
        let sum = a.add(&b);
        assert!((0..8).all(|i| sum.get(i) == Logic::X));
    }

    #[test]
    fn wide_arithmetic_crosses_words() {
        let mut a = SvInt::new(128, 0, false);
        a.set(63, Logic::One);
        let sum = a.add(&a);
        assert_eq!(sum.get(64), Logic::One);
        assert_eq!(sum.get(63), Logic::Zero);
    }

    #[test]
    fn bitwise_four_state() {
        let mut a = SvInt::new(4, 0b1100, false);
        let b = SvInt::new(4, 0b1010, false);
        assert_eq!(a.and(&b).as_u64(), Some(0b1000));
        assert_eq!(a.or(&b).as_u64(), Some(0b1110));
        assert_eq!(a.xor(&b).as_u64(), Some(0b0110));

        a.set(0, Logic::X);
        let r = a.and(&b);
        // 0 & x = 0
        assert_eq!(r.get(0), Logic::Zero);
    }

    #[test]
    fn reductions() {
        let v = SvInt::new(4, 0b1111, false);
        assert_eq!(v.reduction_and(), Logic::One);
        assert_eq!(v.reduction_xor(), Logic::Zero);
        let v = SvInt::new(4, 0b0001, false);
        assert_eq!(v.reduction_or(), Logic::One);
        assert_eq!(v.reduction_and(), Logic::Zero);
    }

    #[test]
    fn shifts() {
        let v = SvInt::new(8, 0b0001_0110, false);
        assert_eq!(v.shl_u32(2).as_u64(), Some(0b0101_1000));
        assert_eq!(v.lshr_u32(2).as_u64(), Some(0b0000_0101));

        let v = SvInt::from_i64(8, -64, true);
        let amt = SvInt::new(8, 2, false);
        assert_eq!(v.ashr(&amt).as_i64(), Some(-16));
    }

    #[test]
    fn shift_past_width_clears() {
        let v = SvInt::new(8, 0xFF, false);
        assert_eq!(v.shl_u32(8).as_u64(), Some(0));
        assert_eq!(v.lshr_u32(9).as_u64(), Some(0));
    }

    #[test]
    fn comparisons_signed_unsigned() {
        let a = SvInt::from_i64(8, -1, true);
        let b = SvInt::new(8, 1, true);
        assert_eq!(a.lt(&b), Logic::One);

        let a = SvInt::new(8, 0xFF, false);
        assert_eq!(a.gt(&b), Logic::One);
    }

    #[test]
    fn equality_with_unknowns() {
        let mut a = SvInt::new(4, 0b1010, false);
        let b = SvInt::new(4, 0b1010, false);
        assert_eq!(a.eq_logic(&b), Logic::One);
        a.set(0, Logic::X);
        assert_eq!(a.eq_logic(&b), Logic::X);
        assert!(!a.exactly_equals(&b));
        assert!(a.exactly_equals(&a.clone()));
    }

    #[test]
    fn wildcard_equality() {
        let a = SvInt::new(4, 0b1010, false);
        let mut pattern = SvInt::new(4, 0b1000, false);
        pattern.set(1, Logic::Z);
        pattern.set(0, Logic::Z);
        assert_eq!(a.wildcard_equals(&pattern), Logic::One);
    }

    #[test]
    fn slice_and_concat() {
        let v = SvInt::new(8, 0b1011_0100, false);
        assert_eq!(v.slice(5, 2).as_u64(), Some(0b1101));

        let hi = SvInt::new(4, 0b1011, false);
        let lo = SvInt::new(4, 0b0100, false);
        assert_eq!(SvInt::concat(&[hi, lo]).as_u64(), Some(0b1011_0100));
    }

    #[test]
    fn replicate() {
        let v = SvInt::new(2, 0b10, false);
        assert_eq!(v.replicate(3).as_u64(), Some(0b10_10_10));
    }

    #[test]
    fn resize_sign_extension() {
        let v = SvInt::from_i64(4, -3, true);
        assert_eq!(v.resize(8, true).as_i64(), Some(-3));
        let v = SvInt::new(4, 0b1101, false);
        assert_eq!(v.resize(8, false).as_u64(), Some(0b1101));
    }

    #[test]
    fn convert_flattens_unknowns() {
        let v = SvInt::filled_x(4, false);
        let two_state = v.convert(4, false, false);
        assert_eq!(two_state.as_u64(), Some(0));
    }

    #[test]
    fn merge_conditional_combines() {
        let a = SvInt::new(4, 0b1100, false);
        let b = SvInt::new(4, 0b1010, false);
        let m = SvInt::merge_conditional(&a, &b);
        assert_eq!(m.get(3), Logic::One);
        assert_eq!(m.get(0), Logic::Zero);
        assert_eq!(m.get(2), Logic::X);
        assert_eq!(m.get(1), Logic::X);
    }

    #[test]
    fn pow_cases() {
        let b = SvInt::new(32, 2, true);
        let e = SvInt::new(32, 10, true);
        assert_eq!(b.pow(&e).as_i64(), Some(1024));

        let e0 = SvInt::new(32, 0, true);
        assert_eq!(b.pow(&e0).as_i64(), Some(1));

        let neg = SvInt::from_i64(32, -2, true);
        assert_eq!(b.pow(&neg).as_i64(), Some(0));

        let one = SvInt::new(32, 1, true);
        assert_eq!(one.pow(&neg).as_i64(), Some(1));
    }

    #[test]
    fn parse_plain_decimal() {
        let p = SvInt::parse_literal("42").unwrap();
        assert_eq!(p.value.as_i64(), Some(42));
        assert_eq!(p.value.width(), 32);
        assert!(p.value.is_signed());
    }

    #[test]
    fn parse_sized_binary() {
        let p = SvInt::parse_literal("4'b1010").unwrap();
        assert_eq!(p.value.width(), 4);
        assert_eq!(p.value.as_u64(), Some(10));
    }

    #[test]
    fn parse_sized_hex_with_unknown() {
        let p = SvInt::parse_literal("8'b10xz0101").unwrap();
        assert_eq!(p.value.get(5), Logic::X);
        assert_eq!(p.value.get(4), Logic::Z);
    }

    #[test]
    fn parse_signed_base() {
        let p = SvInt::parse_literal("16'shA5").unwrap();
        assert!(p.value.is_signed());
        assert_eq!(p.value.as_u64(), Some(0xA5));
    }

    #[test]
    fn parse_unsized_based() {
        let p = SvInt::parse_literal("'hFF").unwrap();
        assert_eq!(p.value.width(), 32);
        assert_eq!(p.value.as_u64(), Some(255));
    }

    #[test]
    fn parse_underscores() {
        let p = SvInt::parse_literal("8'hF_F").unwrap();
        assert_eq!(p.value.as_u64(), Some(255));
        assert_eq!(SvInt::parse_literal("1_000").unwrap().value.as_i64(), Some(1000));
    }

    #[test]
    fn parse_truncation_flagged() {
        let p = SvInt::parse_literal("3'hf").unwrap();
        assert!(p.truncated);
        assert_eq!(p.value.as_u64(), Some(0b111));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            SvInt::parse_literal("0'd1").unwrap_err(),
            LiteralError::SizeIsZero
        );
        assert_eq!(
            SvInt::parse_literal("16777216'd1").unwrap_err(),
            LiteralError::SizeTooLarge
        );
        assert_eq!(
            SvInt::parse_literal("'b3").unwrap_err(),
            LiteralError::InvalidDigit
        );
        assert_eq!(
            SvInt::parse_literal("'d x1").unwrap_err(),
            LiteralError::MultipleUnknownDigits
        );
        assert_eq!(
            SvInt::parse_literal("'b _1").unwrap_err(),
            LiteralError::LeadingUnderscore
        );
        assert_eq!(
            SvInt::parse_literal("'d").unwrap_err(),
            LiteralError::MissingDigits
        );
        assert_eq!(
            SvInt::parse_literal("999999999999").unwrap_err(),
            LiteralError::SignedOverflow
        );
    }

    #[test]
    fn parse_decimal_unknown_fill() {
        let p = SvInt::parse_literal("'d z_").unwrap();
        assert!((0..32).all(|i| p.value.get(i) == Logic::Z));
    }

    #[test]
    fn display_decimal_and_binary() {
        assert_eq!(format!("{}", SvInt::new(32, 9, true)), "9");
        assert_eq!(format!("{}", SvInt::from_i64(32, -4, true)), "-4");
        let mut v = SvInt::new(4, 0b1010, false);
        v.set(1, Logic::X);
        assert_eq!(format!("{v}"), "4'b10x0");
    }

    #[test]
    fn serde_roundtrip() {
        let mut v = SvInt::new(12, 0x5A5, false);
        v.set(7, Logic::Z);
        let json = serde_json::to_string(&v).unwrap();
        let back: SvInt = serde_json::from_str(&json).unwrap();
        assert!(v.exactly_equals(&back));
    }
}
