//! The type system: canonical forms, integral traits, and the
//! matching/equivalent/assignment/cast compatibility relations.
//!
//! Every type lives in the compilation's type arena and is referred to by
//! [`TypeId`]. A type alias knows its target through its typedef symbol;
//! every semantic query first resolves the canonical (alias-free) form.
//! Simple bit vector types are interned so canonical types can be compared
//! by id.

use crate::arena::{SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::symbols::SymbolKind;
use crate::Compilation;
use veris_common::{Ident, SvInt};
use veris_parser::ast::{PredefIntKind, RealKind, ScalarKind};
use veris_source::Span;

/// A constant range, as written `[left:right]`.
///
/// `left >= right` is little-endian (bit `right` is the LSB), the common
/// `[7:0]` form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ConstantRange {
    /// The left bound.
    pub left: i32,
    /// The right bound.
    pub right: i32,
}

impl ConstantRange {
    /// Creates a range from its bounds.
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// The number of elements in the range.
    pub fn width(&self) -> u32 {
        self.left.abs_diff(self.right) + 1
    }

    /// True if the left bound is the MSB (`[7:0]` style).
    pub fn is_little_endian(&self) -> bool {
        self.left >= self.right
    }

    /// The smaller bound.
    pub fn lower(&self) -> i32 {
        self.left.min(self.right)
    }

    /// The larger bound.
    pub fn upper(&self) -> i32 {
        self.left.max(self.right)
    }

    /// True if the index lies within the range.
    pub fn contains(&self, index: i32) -> bool {
        index >= self.lower() && index <= self.upper()
    }

    /// Translates a logical index into a zero-based offset from the LSB
    /// end of the range.
    pub fn translate_index(&self, index: i32) -> i32 {
        if self.is_little_endian() {
            index - self.right
        } else {
            self.right - index
        }
    }

    /// Swaps the bounds.
    pub fn reverse(&self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

/// Traits of an integral type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct IntegralFlags {
    /// The type participates in signed arithmetic.
    pub signed: bool,
    /// Bits can be X/Z.
    pub four_state: bool,
    /// The type was declared with the `reg` keyword.
    pub reg: bool,
}

/// A field of a struct or union type.
///
/// For packed parents the offset is in bits from the LSB; for unpacked
/// parents it is the index into the field list.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    /// The field name.
    pub name: Ident,
    /// The field type.
    pub ty: TypeId,
    /// Bit offset (packed) or field index (unpacked).
    pub offset: u32,
    /// The declaration site.
    pub span: Span,
}

/// A data type. Aliases resolve to their canonical form through the
/// typedef symbol recorded on the alias.
#[derive(Clone, Debug)]
pub enum Type {
    /// A placeholder produced when type resolution failed.
    Error,
    /// The void type.
    Void,
    /// The null type.
    Null,
    /// A DPI-style C handle.
    CHandle,
    /// The string type.
    String,
    /// An event handle.
    Event,
    /// A single-bit scalar (`bit`, `logic`, `reg`).
    Scalar {
        /// Which scalar keyword.
        kind: ScalarKind,
        /// Declared signedness.
        signed: bool,
    },
    /// A predefined integer type.
    PredefInt {
        /// Which predefined type.
        kind: PredefIntKind,
        /// Effective signedness.
        signed: bool,
    },
    /// A floating-point type.
    Floating {
        /// Which floating keyword.
        kind: RealKind,
    },
    /// A packed array of an integral element type.
    PackedArray {
        /// The element type.
        elem: TypeId,
        /// The declared range.
        range: ConstantRange,
        /// Total width in bits.
        width: u32,
        /// Signedness of the whole vector.
        signed: bool,
        /// Whether bits are four-state.
        four_state: bool,
    },
    /// An unpacked array.
    UnpackedArray {
        /// The element type.
        elem: TypeId,
        /// The declared range.
        range: ConstantRange,
    },
    /// A packed struct.
    PackedStruct {
        /// Fields with bit offsets from the LSB.
        fields: Vec<FieldInfo>,
        /// Total width in bits.
        width: u32,
        /// Declared signedness.
        signed: bool,
        /// Whether any member is four-state.
        four_state: bool,
        /// The declaration site, used for syntax-identity matching.
        decl_span: Span,
    },
    /// An unpacked struct.
    UnpackedStruct {
        /// Fields with index offsets.
        fields: Vec<FieldInfo>,
        /// The declaration site, used for syntax-identity matching.
        decl_span: Span,
    },
    /// A packed union; all members share the same width.
    PackedUnion {
        /// Fields, all at offset 0.
        fields: Vec<FieldInfo>,
        /// The shared width in bits.
        width: u32,
        /// Declared signedness.
        signed: bool,
        /// Whether any member is four-state.
        four_state: bool,
        /// The declaration site, used for syntax-identity matching.
        decl_span: Span,
    },
    /// An unpacked union.
    UnpackedUnion {
        /// Fields, all at index 0.
        fields: Vec<FieldInfo>,
        /// The declaration site, used for syntax-identity matching.
        decl_span: Span,
    },
    /// An enumerated type.
    Enum {
        /// The integral base type.
        base: TypeId,
        /// The enum value symbols, in declaration order.
        values: Vec<SymbolId>,
        /// The declaration site, used for syntax-identity matching.
        decl_span: Span,
    },
    /// A type alias introduced by a typedef or type parameter. The
    /// canonical type comes from the symbol's declared target.
    Alias {
        /// The alias name.
        name: Ident,
        /// The typedef symbol carrying the target type.
        symbol: SymbolId,
    },
}

/// Structural identity key for the interning cache of shared types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum TypeKey {
    Scalar(ScalarKind, bool),
    PredefInt(PredefIntKind, bool),
    Floating(RealKind),
    /// A single-dimension vector of scalars: (width, flags).
    Vector(u32, IntegralFlags),
    /// A packed array of an interned element: (element, range).
    PackedArray(TypeId, ConstantRange),
}

impl<'a> Compilation<'a> {
    /// Resolves the canonical (alias-free) form of a type.
    ///
    /// Walking an alias chain resolves the targets through each typedef
    /// symbol. A circular chain is diagnosed once and poisoned to the
    /// error type so every later query resolves quietly.
    pub fn canonical(&mut self, ty: TypeId) -> TypeId {
        let mut visited: Vec<TypeId> = Vec::new();
        let mut current = ty;
        loop {
            let (symbol, name) = match &self.types[current] {
                Type::Alias { symbol, name } => (*symbol, *name),
                _ => return current,
            };
            if visited.contains(&current) {
                let span = self.symbols[symbol].span;
                self.sink.emit(crate::errors::error_circular_type(
                    self.interner.resolve(name),
                    span,
                ));
                if let Some(declared) = self.symbols[symbol].declared_mut() {
                    declared.resolved = Some(self.builtins.error_type);
                }
                return self.builtins.error_type;
            }
            visited.push(current);
            current = self.alias_target_type(symbol);
        }
    }

    /// Resolves the target type of a typedef/type-parameter symbol.
    pub(crate) fn alias_target_type(&mut self, symbol: SymbolId) -> TypeId {
        match &self.symbols[symbol].kind {
            SymbolKind::TypeAlias { .. } | SymbolKind::TypeParameter { .. } => {
                self.declared_type_of(symbol)
            }
            _ => self.builtins.error_type,
        }
    }

    /// True if the canonical type is the error type.
    pub fn is_error_type(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::Error)
    }

    /// True for scalars, predefined integers, enums, packed arrays, packed
    /// structs, and packed unions.
    pub fn is_integral(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(
            self.types[c],
            Type::Scalar { .. }
                | Type::PredefInt { .. }
                | Type::Enum { .. }
                | Type::PackedArray { .. }
                | Type::PackedStruct { .. }
                | Type::PackedUnion { .. }
        )
    }

    /// True for floating-point types.
    pub fn is_floating(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::Floating { .. })
    }

    /// True for numeric (integral or floating) types.
    pub fn is_numeric(&mut self, ty: TypeId) -> bool {
        self.is_integral(ty) || self.is_floating(ty)
    }

    /// True for enum types.
    pub fn is_enum(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::Enum { .. })
    }

    /// True for the string type.
    pub fn is_string_type(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::String)
    }

    /// True for unpacked arrays.
    pub fn is_unpacked_array(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::UnpackedArray { .. })
    }

    /// True for packed arrays.
    pub fn is_packed_array(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::PackedArray { .. })
    }

    /// True for unpacked structs.
    pub fn is_unpacked_struct(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::UnpackedStruct { .. })
    }

    /// True for single-bit scalar types.
    pub fn is_scalar_type(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::Scalar { .. })
    }

    /// True for predefined integer types.
    pub fn is_predefined_integer(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        matches!(self.types[c], Type::PredefInt { .. })
    }

    /// True for simple bit vectors: predefined integers, scalars, and
    /// packed arrays of scalars.
    pub fn is_simple_bit_vector(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        match self.types[c] {
            Type::Scalar { .. } | Type::PredefInt { .. } => true,
            Type::PackedArray { elem, .. } => self.is_scalar_type(elem),
            _ => false,
        }
    }

    /// True if a value of this type can gate a conditional.
    pub fn is_boolean_convertible(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        match self.types[c] {
            Type::Null | Type::CHandle | Type::String | Type::Event => true,
            _ => self.is_numeric(ty),
        }
    }

    /// The bit width of the canonical type; zero when not statically known.
    pub fn bit_width(&mut self, ty: TypeId) -> u32 {
        let c = self.canonical(ty);
        match &self.types[c] {
            Type::Scalar { .. } => 1,
            Type::PredefInt { kind, .. } => predef_width(*kind),
            Type::Floating { kind } => match kind {
                RealKind::ShortReal => 32,
                _ => 64,
            },
            Type::PackedArray { width, .. }
            | Type::PackedStruct { width, .. }
            | Type::PackedUnion { width, .. } => *width,
            Type::Enum { base, .. } => {
                let base = *base;
                self.bit_width(base)
            }
            _ => 0,
        }
    }

    /// Signedness of the canonical type; false for non-integral types.
    pub fn is_signed(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        match &self.types[c] {
            Type::Scalar { signed, .. } => *signed,
            Type::PredefInt { signed, .. } => *signed,
            Type::PackedArray { signed, .. }
            | Type::PackedStruct { signed, .. }
            | Type::PackedUnion { signed, .. } => *signed,
            Type::Enum { base, .. } => {
                let base = *base;
                self.is_signed(base)
            }
            _ => false,
        }
    }

    /// Four-statedness, drilling into unpacked aggregates.
    pub fn is_four_state(&mut self, ty: TypeId) -> bool {
        let c = self.canonical(ty);
        match &self.types[c] {
            Type::Scalar { kind, .. } => *kind != ScalarKind::Bit,
            Type::PredefInt { kind, .. } => predef_four_state(*kind),
            Type::PackedArray { four_state, .. }
            | Type::PackedStruct { four_state, .. }
            | Type::PackedUnion { four_state, .. } => *four_state,
            Type::Enum { base, .. } => {
                let base = *base;
                self.is_four_state(base)
            }
            Type::UnpackedArray { elem, .. } => {
                let elem = *elem;
                self.is_four_state(elem)
            }
            Type::UnpackedStruct { fields, .. } | Type::UnpackedUnion { fields, .. } => {
                let field_types: Vec<TypeId> = fields.iter().map(|f| f.ty).collect();
                field_types.into_iter().any(|t| self.is_four_state(t))
            }
            _ => false,
        }
    }

    /// The integral flags of the canonical type; all clear for
    /// non-integral types.
    pub fn integral_flags(&mut self, ty: TypeId) -> IntegralFlags {
        if !self.is_integral(ty) {
            return IntegralFlags::default();
        }
        IntegralFlags {
            signed: self.is_signed(ty),
            four_state: self.is_four_state(ty),
            reg: self.is_declared_reg(ty),
        }
    }

    /// True if the underlying scalar was declared with `reg`.
    pub fn is_declared_reg(&mut self, ty: TypeId) -> bool {
        let mut c = self.canonical(ty);
        loop {
            match self.types[c] {
                Type::PackedArray { elem, .. } => c = self.canonical(elem),
                Type::Scalar { kind, .. } => return kind == ScalarKind::Reg,
                _ => return false,
            }
        }
    }

    /// The bit-vector or array range of the canonical type.
    ///
    /// Integral types report their bit range; unpacked arrays their
    /// declared range; everything else an empty `[0:0]`.
    pub fn array_range(&mut self, ty: TypeId) -> ConstantRange {
        let c = self.canonical(ty);
        match self.types[c] {
            Type::PackedArray { range, .. } => range,
            Type::UnpackedArray { range, .. } => range,
            _ => {
                if self.is_integral(ty) {
                    ConstantRange::new(self.bit_width(ty) as i32 - 1, 0)
                } else {
                    ConstantRange::new(0, 0)
                }
            }
        }
    }

    /// The default (uninitialized) value of the type.
    ///
    /// Four-state integrals default to all-X, two-state to zero; unpacked
    /// aggregates default element-wise.
    pub fn default_value(&mut self, ty: TypeId) -> ConstantValue {
        let c = self.canonical(ty);
        match &self.types[c] {
            Type::Error | Type::Void => ConstantValue::Invalid,
            Type::Null | Type::CHandle | Type::Event => ConstantValue::NullPlaceholder,
            Type::String => ConstantValue::Str(String::new()),
            Type::Floating { kind } => match kind {
                RealKind::ShortReal => ConstantValue::ShortReal(0.0),
                _ => ConstantValue::Real(0.0),
            },
            Type::Enum { base, .. } => {
                let base = *base;
                self.default_value(base)
            }
            Type::UnpackedArray { elem, range } => {
                let (elem, count) = (*elem, range.width());
                let element = self.default_value(elem);
                ConstantValue::Elements(vec![element; count as usize])
            }
            Type::UnpackedStruct { fields, .. } => {
                let field_types: Vec<TypeId> = fields.iter().map(|f| f.ty).collect();
                ConstantValue::Elements(
                    field_types.into_iter().map(|t| self.default_value(t)).collect(),
                )
            }
            Type::UnpackedUnion { fields, .. } => match fields.first() {
                Some(field) => {
                    let t = field.ty;
                    self.default_value(t)
                }
                None => ConstantValue::NullPlaceholder,
            },
            _ => {
                let width = self.bit_width(ty).max(1);
                let signed = self.is_signed(ty);
                if self.is_four_state(ty) {
                    ConstantValue::Integer(SvInt::filled_x(width, signed))
                } else {
                    ConstantValue::Integer(SvInt::new(width, 0, signed))
                }
            }
        }
    }

    // ---- type relations ----

    /// Determines whether two types "match": for most purposes they are
    /// completely identical.
    pub fn is_matching(&mut self, a: TypeId, b: TypeId) -> bool {
        let l = self.canonical(a);
        let r = self.canonical(b);
        if l == r {
            return true;
        }

        // Same declaration site means the same syntax produced both.
        if let (Some(ls), Some(rs)) = (decl_span_of(&self.types[l]), decl_span_of(&self.types[r]))
        {
            if !ls.is_dummy() && ls == rs {
                return true;
            }
        }

        // logic and reg are interchangeable.
        if let (Type::Scalar { kind: lk, signed: lsg }, Type::Scalar { kind: rk, signed: rsg }) =
            (&self.types[l], &self.types[r])
        {
            return lsg == rsg
                && *lk != ScalarKind::Bit
                && *rk != ScalarKind::Bit;
        }

        // real and realtime are interchangeable.
        if let (Type::Floating { kind: lk }, Type::Floating { kind: rk }) =
            (&self.types[l], &self.types[r])
        {
            return (*lk == RealKind::Real || *lk == RealKind::RealTime)
                && (*rk == RealKind::Real || *rk == RealKind::RealTime);
        }

        // Simple bit vectors match on signedness, four-statedness, and
        // bit range.
        if self.is_simple_bit_vector(l) && self.is_simple_bit_vector(r) {
            let lf = self.integral_flags(l);
            let rf = self.integral_flags(r);
            let lr = self.array_range(l);
            let rr = self.array_range(r);
            return lf.signed == rf.signed && lf.four_state == rf.four_state && lr == rr;
        }

        // Arrays match element-wise with equal ranges.
        if let (
            Type::PackedArray { elem: le, range: lr, .. },
            Type::PackedArray { elem: re, range: rr, .. },
        ) = (&self.types[l], &self.types[r])
        {
            let (le, re, lr, rr) = (*le, *re, *lr, *rr);
            return lr == rr && self.is_matching(le, re);
        }
        if let (
            Type::UnpackedArray { elem: le, range: lr },
            Type::UnpackedArray { elem: re, range: rr },
        ) = (&self.types[l], &self.types[r])
        {
            let (le, re, lr, rr) = (*le, *re, *lr, *rr);
            return lr == rr && self.is_matching(le, re);
        }

        false
    }

    /// Determines whether two types are "equivalent": implicitly
    /// convertible between one another.
    pub fn is_equivalent(&mut self, a: TypeId, b: TypeId) -> bool {
        let l = self.canonical(a);
        let r = self.canonical(b);
        if self.is_matching(l, r) {
            return true;
        }

        if self.is_integral(l) && self.is_integral(r) && !self.is_enum(l) && !self.is_enum(r) {
            let lf = self.integral_flags(l);
            let rf = self.integral_flags(r);
            return lf.signed == rf.signed
                && lf.four_state == rf.four_state
                && self.bit_width(l) == self.bit_width(r);
        }

        if let (
            Type::UnpackedArray { elem: le, range: lr },
            Type::UnpackedArray { elem: re, range: rr },
        ) = (&self.types[l], &self.types[r])
        {
            let (le, re, lw, rw) = (*le, *re, lr.width(), rr.width());
            return lw == rw && self.is_equivalent(le, re);
        }

        false
    }

    /// Determines whether a value of type `rhs` may be assigned to a
    /// target of type `lhs`.
    pub fn is_assignment_compatible(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        let l = self.canonical(lhs);
        let r = self.canonical(rhs);
        if self.is_equivalent(l, r) {
            return true;
        }

        // Any integral or floating value converts implicitly to a packed
        // integral or floating target.
        if (self.is_integral(l) && !self.is_enum(l)) || self.is_floating(l) {
            return self.is_integral(r) || self.is_floating(r);
        }

        false
    }

    /// Determines whether a value of type `rhs` may be cast to `lhs`.
    pub fn is_cast_compatible(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        let l = self.canonical(lhs);
        let r = self.canonical(rhs);
        if self.is_assignment_compatible(l, r) {
            return true;
        }
        if self.is_enum(l) {
            return self.is_integral(r) || self.is_floating(r);
        }
        if self.is_string_type(l) {
            return self.is_integral(r);
        }
        if self.is_string_type(r) {
            return self.is_integral(l);
        }
        false
    }

    /// Renders a type for diagnostics.
    pub fn type_to_string(&mut self, ty: TypeId) -> String {
        let c = self.canonical(ty);
        match &self.types[c] {
            Type::Error => "<error>".to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "null".to_string(),
            Type::CHandle => "chandle".to_string(),
            Type::String => "string".to_string(),
            Type::Event => "event".to_string(),
            Type::Scalar { kind, signed } => {
                let name = match kind {
                    ScalarKind::Bit => "bit",
                    ScalarKind::Logic => "logic",
                    ScalarKind::Reg => "reg",
                };
                if *signed {
                    format!("{name} signed")
                } else {
                    name.to_string()
                }
            }
            Type::PredefInt { kind, signed } => {
                let name = match kind {
                    PredefIntKind::Byte => "byte",
                    PredefIntKind::ShortInt => "shortint",
                    PredefIntKind::Int => "int",
                    PredefIntKind::LongInt => "longint",
                    PredefIntKind::Integer => "integer",
                    PredefIntKind::Time => "time",
                };
                let default_signed = predef_signed(*kind);
                if *signed != default_signed {
                    if *signed {
                        format!("{name} signed")
                    } else {
                        format!("{name} unsigned")
                    }
                } else {
                    name.to_string()
                }
            }
            Type::Floating { kind } => match kind {
                RealKind::Real => "real".to_string(),
                RealKind::ShortReal => "shortreal".to_string(),
                RealKind::RealTime => "realtime".to_string(),
            },
            Type::PackedArray { elem, range, .. } => {
                let (elem, range) = (*elem, *range);
                format!(
                    "{}[{}:{}]",
                    self.type_to_string(elem),
                    range.left,
                    range.right
                )
            }
            Type::UnpackedArray { elem, range } => {
                let (elem, range) = (*elem, *range);
                format!(
                    "{}$[{}:{}]",
                    self.type_to_string(elem),
                    range.left,
                    range.right
                )
            }
            Type::PackedStruct { .. } => "struct packed".to_string(),
            Type::UnpackedStruct { .. } => "struct".to_string(),
            Type::PackedUnion { .. } => "union packed".to_string(),
            Type::UnpackedUnion { .. } => "union".to_string(),
            Type::Enum { .. } => "enum".to_string(),
            Type::Alias { name, .. } => self.interner.resolve(*name).to_string(),
        }
    }
}

fn decl_span_of(ty: &Type) -> Option<Span> {
    match ty {
        Type::PackedStruct { decl_span, .. }
        | Type::UnpackedStruct { decl_span, .. }
        | Type::PackedUnion { decl_span, .. }
        | Type::UnpackedUnion { decl_span, .. }
        | Type::Enum { decl_span, .. } => Some(*decl_span),
        _ => None,
    }
}

/// The fixed width of a predefined integer type.
pub fn predef_width(kind: PredefIntKind) -> u32 {
    match kind {
        PredefIntKind::Byte => 8,
        PredefIntKind::ShortInt => 16,
        PredefIntKind::Int => 32,
        PredefIntKind::LongInt => 64,
        PredefIntKind::Integer => 32,
        PredefIntKind::Time => 64,
    }
}

/// The default signedness of a predefined integer type.
pub fn predef_signed(kind: PredefIntKind) -> bool {
    !matches!(kind, PredefIntKind::Time)
}

/// Whether a predefined integer type is four-state.
pub fn predef_four_state(kind: PredefIntKind) -> bool {
    matches!(kind, PredefIntKind::Integer | PredefIntKind::Time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_basics() {
        let r = ConstantRange::new(7, 0);
        assert_eq!(r.width(), 8);
        assert!(r.is_little_endian());
        assert_eq!(r.lower(), 0);
        assert_eq!(r.upper(), 7);
        assert!(r.contains(3));
        assert!(!r.contains(8));
        assert!(!r.contains(-1));
    }

    #[test]
    fn range_big_endian() {
        let r = ConstantRange::new(0, 7);
        assert_eq!(r.width(), 8);
        assert!(!r.is_little_endian());
        assert_eq!(r.translate_index(0), 7);
        assert_eq!(r.translate_index(7), 0);
        assert_eq!(r.reverse(), ConstantRange::new(7, 0));
    }

    #[test]
    fn range_translate_little_endian() {
        let r = ConstantRange::new(7, 2);
        assert_eq!(r.translate_index(2), 0);
        assert_eq!(r.translate_index(7), 5);
    }

    #[test]
    fn predef_traits() {
        assert_eq!(predef_width(PredefIntKind::Int), 32);
        assert_eq!(predef_width(PredefIntKind::Byte), 8);
        assert_eq!(predef_width(PredefIntKind::Time), 64);
        assert!(predef_signed(PredefIntKind::Int));
        assert!(!predef_signed(PredefIntKind::Time));
        assert!(predef_four_state(PredefIntKind::Integer));
        assert!(!predef_four_state(PredefIntKind::LongInt));
    }
}
