//! The constant evaluator: expression evaluation, lvalues, and the rules
//! for what may appear in a constant context.
//!
//! Evaluation never panics and never throws: failures produce
//! [`ConstantValue::Invalid`] plus diagnostics queued on the
//! [`EvalContext`], which the caller reports once. The context carries a
//! stack of frames (one per constant function call), a bounded step
//! budget, and the verifying/script-eval flags.

use std::collections::HashMap;

use crate::arena::{ExprId, SymbolId};
use crate::const_value::ConstantValue;
use crate::errors;
use crate::expr::{ExpressionKind, SystemFunction};
use crate::lookup::LookupLocation;
use crate::stmt::EvalResult;
use crate::symbols::SymbolKind;
use crate::types::Type;
use crate::Compilation;
use veris_common::{Logic, SvInt};
use veris_diagnostics::{Diagnostic, DiagnosticSink};
use veris_parser::ast::{BinaryOp, RangeSelectKind, UnaryOp};
use veris_source::Span;

/// One stack frame of constant evaluation, bound to a subroutine call or
/// the synthetic top frame.
pub struct Frame {
    /// The called subroutine; `None` for the top frame.
    pub subroutine: Option<SymbolId>,
    /// Storage for locals created in this frame.
    pub locals: HashMap<SymbolId, ConstantValue>,
    /// The lookup location of the invocation, used for
    /// parameter-ordering checks.
    pub lookup_location: LookupLocation,
    /// The call site.
    pub call_span: Span,
}

/// The mutable state of one constant evaluation.
pub struct EvalContext {
    frames: Vec<Frame>,
    steps: u32,
    max_steps: u32,
    budget_reported: bool,
    /// True while only constant-ness is being checked; side effects are
    /// skipped.
    pub is_verifying: bool,
    /// True for interactive scopes, which may use hierarchical names.
    pub is_script_eval: bool,
    diags: Vec<Diagnostic>,
}

impl EvalContext {
    /// Creates a context with a synthetic top frame at the given lookup
    /// location.
    pub fn new(max_steps: u32, location: LookupLocation) -> Self {
        Self {
            frames: vec![Frame {
                subroutine: None,
                locals: HashMap::new(),
                lookup_location: location,
                call_span: Span::DUMMY,
            }],
            steps: 0,
            max_steps,
            budget_reported: false,
            is_verifying: false,
            is_script_eval: false,
            diags: Vec::new(),
        }
    }

    /// Creates a local in the top frame with the given value.
    pub fn create_local(&mut self, symbol: SymbolId, value: ConstantValue) {
        self.frames
            .last_mut()
            .expect("the frame stack is never empty")
            .locals
            .insert(symbol, value);
    }

    /// Finds a local in the top frame.
    pub fn find_local(&self, symbol: SymbolId) -> Option<&ConstantValue> {
        self.frames.last()?.locals.get(&symbol)
    }

    /// Finds a local in the top frame, mutably.
    pub fn find_local_mut(&mut self, symbol: SymbolId) -> Option<&mut ConstantValue> {
        self.frames.last_mut()?.locals.get_mut(&symbol)
    }

    /// Pushes a call frame.
    pub fn push_frame(
        &mut self,
        subroutine: SymbolId,
        call_span: Span,
        location: LookupLocation,
    ) {
        self.frames.push(Frame {
            subroutine: Some(subroutine),
            locals: HashMap::new(),
            lookup_location: location,
            call_span,
        });
    }

    /// Pops the top call frame.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// The top frame.
    pub fn top_frame(&self) -> &Frame {
        self.frames.last().expect("the frame stack is never empty")
    }

    /// The current call depth.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Queues a diagnostic on the context.
    pub fn add_diag(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// Reports the queued diagnostics to a sink, draining them.
    pub fn report_diags(&mut self, sink: &DiagnosticSink) {
        for diag in self.diags.drain(..) {
            sink.emit(diag);
        }
    }

    /// Counts one evaluation step against the budget.
    pub fn step(&mut self, span: Span) -> bool {
        self.steps += 1;
        if self.steps > self.max_steps {
            if !self.budget_reported {
                self.budget_reported = true;
                self.diags.push(errors::error_eval_exceeded_steps(span));
            }
            return false;
        }
        true
    }
}

/// One selection step applied to a storage location.
#[derive(Clone, Copy, Debug)]
pub enum Selector {
    /// An element of an unpacked aggregate, already translated to a
    /// zero-based offset.
    Element(usize),
    /// A bit range of an integral value, offsets from the LSB.
    Bits {
        /// The most significant selected bit.
        msb: u32,
        /// The least significant selected bit.
        lsb: u32,
    },
    /// A byte of a string, zero-based from the start of the text.
    StringByte(usize),
}

/// A reference to a storable location used by the constant evaluator.
#[derive(Debug)]
pub enum LValue {
    /// A frame-local slot with a selection path.
    Slot {
        /// The local's symbol.
        symbol: SymbolId,
        /// The selection path, outermost first.
        path: Vec<Selector>,
    },
    /// A concatenation of locations, MSB first.
    Concat(Vec<LValue>),
}

impl LValue {
    /// Appends an element selection.
    pub fn select_index(mut self, index: usize) -> LValue {
        if let LValue::Slot { path, .. } = &mut self {
            path.push(Selector::Element(index));
        }
        self
    }

    /// Appends a bit-range selection.
    pub fn select_range(mut self, msb: u32, lsb: u32) -> LValue {
        if let LValue::Slot { path, .. } = &mut self {
            path.push(Selector::Bits { msb, lsb });
        }
        self
    }

    /// Loads the referenced value.
    pub fn load(&self, ctx: &EvalContext) -> ConstantValue {
        match self {
            LValue::Slot { symbol, path } => {
                let Some(mut value) = ctx.find_local(*symbol).cloned() else {
                    return ConstantValue::Invalid;
                };
                for selector in path {
                    value = apply_selector(&value, *selector);
                }
                value
            }
            LValue::Concat(parts) => {
                let mut ints = Vec::new();
                for part in parts {
                    match part.load(ctx) {
                        ConstantValue::Integer(v) => ints.push(v),
                        _ => return ConstantValue::Invalid,
                    }
                }
                ConstantValue::Integer(SvInt::concat(&ints))
            }
        }
    }

    /// Stores a value into the referenced location.
    pub fn store(&self, ctx: &mut EvalContext, value: ConstantValue) {
        match self {
            LValue::Slot { symbol, path } => {
                if let Some(slot) = ctx.find_local_mut(*symbol) {
                    store_into(slot, path, value);
                }
            }
            LValue::Concat(parts) => {
                let ConstantValue::Integer(v) = value else {
                    return;
                };
                // Distribute bits MSB first across the parts.
                let mut remaining = v.width();
                for part in parts {
                    let width = part_width(part, ctx);
                    if width == 0 || width > remaining {
                        return;
                    }
                    let slice = v.slice(remaining - 1, remaining - width);
                    part.store(ctx, ConstantValue::Integer(slice));
                    remaining -= width;
                }
            }
        }
    }
}

fn part_width(lv: &LValue, ctx: &EvalContext) -> u32 {
    match lv.load(ctx) {
        ConstantValue::Integer(v) => v.width(),
        _ => 0,
    }
}

fn apply_selector(value: &ConstantValue, selector: Selector) -> ConstantValue {
    match (value, selector) {
        (ConstantValue::Elements(elements), Selector::Element(i)) => {
            elements.get(i).cloned().unwrap_or(ConstantValue::Invalid)
        }
        (ConstantValue::Integer(v), Selector::Bits { msb, lsb }) => {
            if msb < v.width() {
                ConstantValue::Integer(v.slice(msb, lsb))
            } else {
                ConstantValue::Invalid
            }
        }
        (ConstantValue::Str(s), Selector::StringByte(i)) => s
            .as_bytes()
            .get(i)
            .map(|&b| ConstantValue::Integer(SvInt::new(8, u64::from(b), false)))
            .unwrap_or(ConstantValue::Invalid),
        _ => ConstantValue::Invalid,
    }
}

fn store_into(slot: &mut ConstantValue, path: &[Selector], value: ConstantValue) {
    let Some((first, rest)) = path.split_first() else {
        *slot = value;
        return;
    };
    match (slot, first) {
        (ConstantValue::Elements(elements), Selector::Element(i)) => {
            if let Some(element) = elements.get_mut(*i) {
                store_into(element, rest, value);
            }
        }
        (ConstantValue::Integer(v), Selector::Bits { msb, lsb }) => {
            let ConstantValue::Integer(new_bits) = value else {
                return;
            };
            if *msb >= v.width() {
                return;
            }
            for (offset, bit) in (*lsb..=*msb).enumerate() {
                let b = if (offset as u32) < new_bits.width() {
                    new_bits.get(offset as u32)
                } else {
                    Logic::Zero
                };
                v.set(bit, b);
            }
        }
        (ConstantValue::Str(s), Selector::StringByte(i)) => {
            let ConstantValue::Integer(new_byte) = value else {
                return;
            };
            if let Some(b) = new_byte.as_u64() {
                let mut bytes = s.clone().into_bytes();
                if *i < bytes.len() && b != 0 {
                    bytes[*i] = b as u8;
                    if let Ok(updated) = String::from_utf8(bytes) {
                        *s = updated;
                    }
                }
            }
        }
        _ => {}
    }
}

impl<'a> Compilation<'a> {
    /// Evaluates a bound expression to a constant value. Returns
    /// `Invalid` on failure; never panics.
    pub fn eval_expr(&mut self, ctx: &mut EvalContext, expr: ExprId) -> ConstantValue {
        let span = self.exprs[expr].span;
        if let Some(value) = &self.exprs[expr].constant {
            return value.clone();
        }
        if !ctx.step(span) {
            return ConstantValue::Invalid;
        }

        match self.exprs[expr].kind.clone() {
            ExpressionKind::Invalid => ConstantValue::Invalid,
            ExpressionKind::IntegerLiteral(v) => ConstantValue::Integer(v),
            ExpressionKind::RealLiteral(v) => ConstantValue::Real(v),
            ExpressionKind::StringLiteral { text } => ConstantValue::Str(text),
            ExpressionKind::UnbasedUnsizedLiteral(logic) => {
                ConstantValue::Integer(SvInt::from_logic(logic))
            }
            ExpressionKind::NullLiteral => ConstantValue::NullPlaceholder,
            ExpressionKind::NamedValue {
                symbol,
                hierarchical,
            } => self.eval_named_value(ctx, symbol, hierarchical, span),
            ExpressionKind::Unary { op, operand } => self.eval_unary(ctx, op, operand, span),
            ExpressionKind::Binary { op, left, right } => {
                self.eval_binary(ctx, op, left, right)
            }
            ExpressionKind::Conditional { pred, left, right } => {
                self.eval_conditional(ctx, pred, left, right, expr)
            }
            ExpressionKind::Assignment {
                op, left, right, ..
            } => {
                let Some(lvalue) = self.eval_lvalue(ctx, left) else {
                    return ConstantValue::Invalid;
                };
                let mut rvalue = self.eval_expr(ctx, right);
                if rvalue.is_invalid() {
                    return ConstantValue::Invalid;
                }
                if let Some(op) = op {
                    rvalue = eval_binary_op(op, &lvalue.load(ctx), &rvalue);
                    if rvalue.is_invalid() {
                        return ConstantValue::Invalid;
                    }
                }
                lvalue.store(ctx, rvalue.clone());
                rvalue
            }
            ExpressionKind::ElementSelect { value, selector } => {
                self.eval_element_select(ctx, value, selector, expr, span)
            }
            ExpressionKind::RangeSelect {
                value,
                select_kind,
                left,
                right,
            } => self.eval_range_select(ctx, value, select_kind, left, right, expr, span),
            ExpressionKind::MemberAccess { value, offset, .. } => {
                let base = self.eval_expr(ctx, value);
                if base.is_invalid() {
                    return ConstantValue::Invalid;
                }
                let base_ty = self.exprs[value].ty;
                if self.is_unpacked_struct(base_ty) || !self.is_integral(base_ty) {
                    match base.elements() {
                        Some(elements) => elements
                            .get(offset as usize)
                            .cloned()
                            .unwrap_or(ConstantValue::Invalid),
                        None => ConstantValue::Invalid,
                    }
                } else {
                    let width = self.bit_width(self.exprs[expr].ty).max(1);
                    match base.integer() {
                        Some(v) if offset + width <= v.width() => {
                            ConstantValue::Integer(v.slice(offset + width - 1, offset))
                        }
                        _ => ConstantValue::Invalid,
                    }
                }
            }
            ExpressionKind::Concat { operands } => self.eval_concat(ctx, &operands, expr),
            ExpressionKind::Replication { count, concat } => {
                self.eval_replication(ctx, count, concat, expr, span)
            }
            ExpressionKind::Call { subroutine, args } => {
                self.eval_call(ctx, subroutine, &args, span)
            }
            ExpressionKind::SystemCall { function, args } => {
                self.eval_system_call(ctx, function, &args, span)
            }
            ExpressionKind::Conversion { operand } => {
                let value = self.eval_expr(ctx, operand);
                if value.is_invalid() {
                    return ConstantValue::Invalid;
                }
                let ty = self.exprs[expr].ty;
                self.convert_value(value, ty)
            }
            ExpressionKind::DataType => ConstantValue::Invalid,
            ExpressionKind::AssignmentPattern { elements } => {
                let ty = self.exprs[expr].ty;
                if self.is_integral(ty) {
                    let mut ints = Vec::new();
                    for &element in &elements {
                        match self.eval_expr(ctx, element) {
                            ConstantValue::Integer(v) => ints.push(v),
                            _ => return ConstantValue::Invalid,
                        }
                    }
                    ConstantValue::Integer(SvInt::concat(&ints))
                } else {
                    let mut out = Vec::new();
                    for &element in &elements {
                        let value = self.eval_expr(ctx, element);
                        if value.is_invalid() {
                            return ConstantValue::Invalid;
                        }
                        out.push(value);
                    }
                    ConstantValue::Elements(out)
                }
            }
        }
    }

    /// Evaluates an expression to a storable location. Only defined for
    /// named values, selects, member access, and concatenations.
    pub fn eval_lvalue(&mut self, ctx: &mut EvalContext, expr: ExprId) -> Option<LValue> {
        let span = self.exprs[expr].span;
        match self.exprs[expr].kind.clone() {
            ExpressionKind::NamedValue {
                symbol,
                hierarchical,
            } => {
                if !self.verify_named_value(ctx, symbol, hierarchical, span) {
                    return None;
                }
                if ctx.find_local(symbol).is_none() {
                    let name = self.symbols[symbol]
                        .name
                        .map(|n| self.interner.resolve(n).to_string())
                        .unwrap_or_default();
                    let decl = self.symbols[symbol].span;
                    ctx.add_diag(errors::error_non_const_variable(&name, span, decl));
                    return None;
                }
                Some(LValue::Slot {
                    symbol,
                    path: Vec::new(),
                })
            }
            ExpressionKind::ElementSelect { value, selector } => {
                let lv = self.eval_lvalue(ctx, value)?;
                let index = self.eval_expr(ctx, selector);
                let value_ty = self.exprs[value].ty;
                if self.is_string_type(value_ty) {
                    let loaded = lv.load(ctx);
                    let len = match &loaded {
                        ConstantValue::Str(s) => s.len(),
                        _ => 0,
                    };
                    let i = self.check_string_index(ctx, &index, len, span)?;
                    let mut lv = lv;
                    if let LValue::Slot { path, .. } = &mut lv {
                        path.push(Selector::StringByte(i));
                    }
                    return Some(lv);
                }
                let translated = self.check_array_index(ctx, value_ty, &index, span)?;
                if self.is_unpacked_array(value_ty) {
                    Some(lv.select_index(translated as usize))
                } else {
                    let width = self.bit_width(self.exprs[expr].ty).max(1);
                    let lsb = translated as u32 * width;
                    Some(lv.select_range(lsb + width - 1, lsb))
                }
            }
            ExpressionKind::RangeSelect {
                value,
                select_kind,
                left,
                right,
            } => {
                let lv = self.eval_lvalue(ctx, value)?;
                let (msb, lsb, unpacked) =
                    self.range_select_offsets(ctx, value, select_kind, left, right, span)?;
                if unpacked {
                    // Unpacked slices are not storable piecewise.
                    None
                } else {
                    Some(lv.select_range(msb, lsb))
                }
            }
            ExpressionKind::MemberAccess { value, offset, .. } => {
                let lv = self.eval_lvalue(ctx, value)?;
                let base_ty = self.exprs[value].ty;
                if self.is_unpacked_struct(base_ty) || !self.is_integral(base_ty) {
                    Some(lv.select_index(offset as usize))
                } else {
                    let width = self.bit_width(self.exprs[expr].ty).max(1);
                    Some(lv.select_range(offset + width - 1, offset))
                }
            }
            ExpressionKind::Concat { operands } => {
                let mut parts = Vec::new();
                for operand in operands {
                    parts.push(self.eval_lvalue(ctx, operand)?);
                }
                Some(LValue::Concat(parts))
            }
            _ => None,
        }
    }

    /// Structurally checks that an expression can be constant without
    /// fully evaluating it.
    pub fn verify_constant(&mut self, ctx: &mut EvalContext, expr: ExprId) -> bool {
        let span = self.exprs[expr].span;
        match self.exprs[expr].kind.clone() {
            ExpressionKind::Invalid => false,
            ExpressionKind::NamedValue {
                symbol,
                hierarchical,
            } => self.verify_named_value(ctx, symbol, hierarchical, span),
            ExpressionKind::Unary { operand, .. } => self.verify_constant(ctx, operand),
            ExpressionKind::Binary { left, right, .. }
            | ExpressionKind::Assignment { left, right, .. } => {
                self.verify_constant(ctx, left) && self.verify_constant(ctx, right)
            }
            ExpressionKind::Conditional { pred, left, right } => {
                self.verify_constant(ctx, pred)
                    && self.verify_constant(ctx, left)
                    && self.verify_constant(ctx, right)
            }
            ExpressionKind::ElementSelect { value, selector } => {
                self.verify_constant(ctx, value) && self.verify_constant(ctx, selector)
            }
            ExpressionKind::RangeSelect {
                value, left, right, ..
            } => {
                self.verify_constant(ctx, value)
                    && self.verify_constant(ctx, left)
                    && self.verify_constant(ctx, right)
            }
            ExpressionKind::MemberAccess { value, .. } => self.verify_constant(ctx, value),
            ExpressionKind::Concat { operands }
            | ExpressionKind::AssignmentPattern { elements: operands } => operands
                .iter()
                .all(|&operand| self.verify_constant(ctx, operand)),
            ExpressionKind::Replication { count, concat } => {
                self.verify_constant(ctx, count) && self.verify_constant(ctx, concat)
            }
            ExpressionKind::Call { subroutine, args } => {
                for &arg in &args {
                    if !self.verify_constant(ctx, arg) {
                        return false;
                    }
                }
                let location = ctx.top_frame().lookup_location;
                ctx.push_frame(subroutine, span, location);
                let result = match self.subroutine_body(subroutine) {
                    Some(body) => self.verify_stmt(ctx, body),
                    None => false,
                };
                ctx.pop_frame();
                result
            }
            ExpressionKind::SystemCall { args, .. } => args
                .iter()
                .all(|&arg| self.verify_constant(ctx, arg)),
            ExpressionKind::Conversion { operand } => self.verify_constant(ctx, operand),
            _ => true,
        }
    }

    /// Enforces the constant-function rules on a named value reference.
    pub(crate) fn verify_named_value(
        &mut self,
        ctx: &mut EvalContext,
        symbol: SymbolId,
        hierarchical: bool,
        span: Span,
    ) -> bool {
        if ctx.is_script_eval {
            return true;
        }
        // Hierarchical names are disallowed in constant expressions and
        // constant functions.
        if hierarchical {
            let name = self.symbols[symbol]
                .name
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_default();
            ctx.add_diag(errors::error_hierarchical_in_ce(&name, span));
            return false;
        }

        let frame = ctx.top_frame();
        let Some(subroutine) = frame.subroutine else {
            return true;
        };
        let frame_location = frame.lookup_location;

        let is_elab_constant = matches!(
            self.symbols[symbol].kind,
            SymbolKind::Parameter { .. } | SymbolKind::EnumValue { .. }
        );
        if !is_elab_constant {
            // Identifiers that are not parameters must be local to the
            // enclosing function.
            let mut scope = self.symbols[symbol].parent;
            while let Some(s) = scope {
                if s == subroutine {
                    return true;
                }
                scope = self.symbols[s].parent;
            }
            let decl = self.symbols[symbol].span;
            ctx.add_diag(errors::error_function_identifiers_must_be_local(span, decl));
            return false;
        }

        // Parameters must be declared before the invoking call site.
        if let SymbolKind::Parameter { .. } = self.symbols[symbol].kind {
            if let Some(loc_scope) = frame_location.scope {
                if self.symbols[symbol].parent == Some(loc_scope)
                    && self.symbols[symbol].index_in_scope >= frame_location.index
                {
                    let name = self.symbols[symbol]
                        .name
                        .map(|n| self.interner.resolve(n).to_string())
                        .unwrap_or_default();
                    let decl = self.symbols[symbol].span;
                    ctx.add_diag(errors::error_param_used_before_decl(&name, span, decl));
                    return false;
                }
            }
        }
        true
    }

    fn eval_named_value(
        &mut self,
        ctx: &mut EvalContext,
        symbol: SymbolId,
        hierarchical: bool,
        span: Span,
    ) -> ConstantValue {
        if !self.verify_named_value(ctx, symbol, hierarchical, span) {
            return ConstantValue::Invalid;
        }
        match &self.symbols[symbol].kind {
            SymbolKind::Parameter { .. } => {
                // A parameter still sitting in a definition (never
                // instantiated) has no real value; stay quiet and let the
                // instance report anything real.
                if let Some(parent) = self.symbols[symbol].parent {
                    if matches!(self.symbols[parent].kind, SymbolKind::Definition { .. }) {
                        return ConstantValue::Invalid;
                    }
                }
                self.parameter_value(symbol)
            }
            SymbolKind::EnumValue { .. } => self.parameter_value(symbol),
            _ => {
                if let Some(value) = ctx.find_local(symbol) {
                    return value.clone();
                }
                let name = self.symbols[symbol]
                    .name
                    .map(|n| self.interner.resolve(n).to_string())
                    .unwrap_or_default();
                let decl = self.symbols[symbol].span;
                ctx.add_diag(errors::error_non_const_variable(&name, span, decl));
                ConstantValue::Invalid
            }
        }
    }

    fn eval_unary(
        &mut self,
        ctx: &mut EvalContext,
        op: UnaryOp,
        operand: ExprId,
        _span: Span,
    ) -> ConstantValue {
        use UnaryOp::*;
        if matches!(op, Preincrement | Predecrement | Postincrement | Postdecrement) {
            let Some(lvalue) = self.eval_lvalue(ctx, operand) else {
                return ConstantValue::Invalid;
            };
            let loaded = lvalue.load(ctx);
            let ConstantValue::Integer(v) = loaded else {
                return ConstantValue::Invalid;
            };
            let one = SvInt::new(v.width(), 1, v.is_signed());
            let updated = match op {
                Preincrement | Postincrement => v.add(&one),
                _ => v.sub(&one),
            };
            lvalue.store(ctx, ConstantValue::Integer(updated.clone()));
            let result = match op {
                Preincrement | Predecrement => updated,
                _ => v,
            };
            return ConstantValue::Integer(result);
        }

        let value = self.eval_expr(ctx, operand);
        if value.is_invalid() {
            return ConstantValue::Invalid;
        }
        match value {
            ConstantValue::Integer(v) => {
                let result = match op {
                    Plus => v,
                    Minus => v.negate(),
                    BitwiseNot => v.not(),
                    ReductionAnd => SvInt::from_logic(v.reduction_and()),
                    ReductionOr => SvInt::from_logic(v.reduction_or()),
                    ReductionXor => SvInt::from_logic(v.reduction_xor()),
                    ReductionNand => SvInt::from_logic(!v.reduction_and()),
                    ReductionNor => SvInt::from_logic(!v.reduction_or()),
                    ReductionXnor => SvInt::from_logic(!v.reduction_xor()),
                    LogicalNot => SvInt::from_logic(!v.to_logic()),
                    _ => return ConstantValue::Invalid,
                };
                ConstantValue::Integer(result)
            }
            ConstantValue::Real(v) => match op {
                Plus => ConstantValue::Real(v),
                Minus => ConstantValue::Real(-v),
                LogicalNot => ConstantValue::Integer(SvInt::from_bool(v == 0.0)),
                _ => ConstantValue::Invalid,
            },
            ConstantValue::ShortReal(v) => match op {
                Plus => ConstantValue::ShortReal(v),
                Minus => ConstantValue::ShortReal(-v),
                LogicalNot => ConstantValue::Integer(SvInt::from_bool(v == 0.0)),
                _ => ConstantValue::Invalid,
            },
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_binary(
        &mut self,
        ctx: &mut EvalContext,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> ConstantValue {
        let lhs = self.eval_expr(ctx, left);
        if lhs.is_invalid() {
            return ConstantValue::Invalid;
        }

        // Short-circuiting operators avoid evaluating the RHS entirely.
        match op {
            BinaryOp::LogicalOr if lhs.is_true() => {
                return ConstantValue::Integer(SvInt::from_bool(true));
            }
            BinaryOp::LogicalAnd if lhs.is_false() => {
                return ConstantValue::Integer(SvInt::from_bool(false));
            }
            BinaryOp::LogicalImplication if lhs.is_false() => {
                return ConstantValue::Integer(SvInt::from_bool(true));
            }
            _ => {}
        }

        let rhs = self.eval_expr(ctx, right);
        if rhs.is_invalid() {
            return ConstantValue::Invalid;
        }
        eval_binary_op(op, &lhs, &rhs)
    }

    fn eval_conditional(
        &mut self,
        ctx: &mut EvalContext,
        pred: ExprId,
        left: ExprId,
        right: ExprId,
        expr: ExprId,
    ) -> ConstantValue {
        let p = self.eval_expr(ctx, pred);
        if p.is_invalid() {
            return ConstantValue::Invalid;
        }

        // An unknown predicate combines both sides per the standard's
        // merging rules.
        if let ConstantValue::Integer(pi) = &p {
            if pi.has_unknown() {
                let lv = self.eval_expr(ctx, left);
                let rv = self.eval_expr(ctx, right);
                if lv.is_invalid() || rv.is_invalid() {
                    return ConstantValue::Invalid;
                }
                return match (lv, rv) {
                    (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
                        ConstantValue::Integer(SvInt::merge_conditional(&a, &b))
                    }
                    (ConstantValue::Elements(a), ConstantValue::Elements(b)) => {
                        let ty = self.exprs[expr].ty;
                        let mut out = self.default_value(ty);
                        if let ConstantValue::Elements(slots) = &mut out {
                            for (i, slot) in slots.iter_mut().enumerate() {
                                match (a.get(i), b.get(i)) {
                                    (Some(x), Some(y)) if x.equivalent_to(y) => {
                                        *slot = x.clone();
                                    }
                                    _ => {}
                                }
                            }
                        }
                        out
                    }
                    _ => {
                        let ty = self.exprs[expr].ty;
                        self.default_value(ty)
                    }
                };
            }
        }

        if p.is_true() {
            self.eval_expr(ctx, left)
        } else {
            self.eval_expr(ctx, right)
        }
    }

    /// Checks an evaluated index against a type's declared range and
    /// translates it to a zero-based offset.
    fn check_array_index(
        &mut self,
        ctx: &mut EvalContext,
        ty: crate::arena::TypeId,
        index: &ConstantValue,
        span: Span,
    ) -> Option<i32> {
        let i = index.integer().and_then(SvInt::as_i32);
        let range = self.array_range(ty);
        match i {
            Some(i) if range.contains(i) => Some(range.translate_index(i)),
            _ => {
                let rendered_index = match index {
                    ConstantValue::Integer(v) => v.to_string(),
                    other => other.to_string(),
                };
                let rendered_ty = self.type_to_string(ty);
                ctx.add_diag(errors::error_array_index_invalid(
                    &rendered_index,
                    &rendered_ty,
                    span,
                ));
                None
            }
        }
    }

    fn check_string_index(
        &mut self,
        ctx: &mut EvalContext,
        index: &ConstantValue,
        len: usize,
        span: Span,
    ) -> Option<usize> {
        match index.integer().and_then(SvInt::as_i64) {
            Some(i) if i >= 0 && (i as usize) < len => Some(i as usize),
            _ => {
                let rendered = index.to_string();
                ctx.add_diag(errors::error_string_index_invalid(&rendered, len, span));
                None
            }
        }
    }

    fn eval_element_select(
        &mut self,
        ctx: &mut EvalContext,
        value: ExprId,
        selector: ExprId,
        expr: ExprId,
        span: Span,
    ) -> ConstantValue {
        let base = self.eval_expr(ctx, value);
        let index = self.eval_expr(ctx, selector);
        if base.is_invalid() || index.is_invalid() {
            return ConstantValue::Invalid;
        }

        let value_ty = self.exprs[value].ty;
        if self.is_string_type(value_ty) {
            let text = match &base {
                ConstantValue::Str(s) => s.clone(),
                _ => return ConstantValue::Invalid,
            };
            let i = match self.check_string_index(ctx, &index, text.len(), span) {
                Some(i) => i,
                None => return ConstantValue::Invalid,
            };
            return ConstantValue::Integer(SvInt::new(8, u64::from(text.as_bytes()[i]), false));
        }

        let Some(translated) = self.check_array_index(ctx, value_ty, &index, span) else {
            return ConstantValue::Invalid;
        };

        if self.is_unpacked_array(value_ty) {
            return match base.elements() {
                Some(elements) => elements
                    .get(translated as usize)
                    .cloned()
                    .unwrap_or(ConstantValue::Invalid),
                None => ConstantValue::Invalid,
            };
        }

        // Packed values select element-width bit ranges.
        let width = self.bit_width(self.exprs[expr].ty).max(1);
        let lsb = translated as u32 * width;
        match base.integer() {
            Some(v) if lsb + width <= v.width() => {
                ConstantValue::Integer(v.slice(lsb + width - 1, lsb))
            }
            _ => ConstantValue::Invalid,
        }
    }

    /// Computes the bit (or element) offsets of a range select against
    /// the value's declared range.
    fn range_select_offsets(
        &mut self,
        ctx: &mut EvalContext,
        value: ExprId,
        kind: RangeSelectKind,
        left: ExprId,
        right: ExprId,
        span: Span,
    ) -> Option<(u32, u32, bool)> {
        let value_ty = self.exprs[value].ty;
        let declared = self.array_range(value_ty);

        let l = self.eval_expr(ctx, left);
        let r = self.eval_expr(ctx, right);
        let l = l.integer().and_then(SvInt::as_i32)?;
        let r = r.integer().and_then(SvInt::as_i32)?;

        let (mut a, mut b) = match kind {
            RangeSelectKind::Simple => (l, r),
            RangeSelectKind::IndexedUp => (l + r - 1, l),
            RangeSelectKind::IndexedDown => (l, l - r + 1),
        };

        if !declared.contains(a) || !declared.contains(b) {
            let rendered = self.type_to_string(value_ty);
            ctx.add_diag(errors::error_part_select_invalid(a, b, &rendered, span));
            return None;
        }

        // Normalize to ascending offsets from the LSB end.
        if !declared.is_little_endian() {
            std::mem::swap(&mut a, &mut b);
        }
        let upper = declared.translate_index(a).max(declared.translate_index(b)) as u32;
        let lower = declared.translate_index(a).min(declared.translate_index(b)) as u32;

        let canonical = self.canonical(value_ty);
        match &self.types[canonical] {
            Type::UnpackedArray { .. } => Some((upper, lower, true)),
            Type::PackedArray { elem, .. } => {
                let elem_width = {
                    let elem = *elem;
                    self.bit_width(elem).max(1)
                };
                Some((
                    upper * elem_width + elem_width - 1,
                    lower * elem_width,
                    false,
                ))
            }
            _ => Some((upper, lower, false)),
        }
    }

    fn eval_range_select(
        &mut self,
        ctx: &mut EvalContext,
        value: ExprId,
        kind: RangeSelectKind,
        left: ExprId,
        right: ExprId,
        _expr: ExprId,
        span: Span,
    ) -> ConstantValue {
        let base = self.eval_expr(ctx, value);
        if base.is_invalid() {
            return ConstantValue::Invalid;
        }
        let Some((msb, lsb, unpacked)) =
            self.range_select_offsets(ctx, value, kind, left, right, span)
        else {
            return ConstantValue::Invalid;
        };

        if unpacked {
            return match base.elements() {
                Some(elements) => {
                    let lo = lsb as usize;
                    let hi = msb as usize;
                    if hi < elements.len() {
                        ConstantValue::Elements(elements[lo..=hi].to_vec())
                    } else {
                        ConstantValue::Invalid
                    }
                }
                None => ConstantValue::Invalid,
            };
        }

        match base.integer() {
            Some(v) if msb < v.width() => ConstantValue::Integer(v.slice(msb, lsb)),
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_concat(
        &mut self,
        ctx: &mut EvalContext,
        operands: &[ExprId],
        expr: ExprId,
    ) -> ConstantValue {
        let ty = self.exprs[expr].ty;
        if self.is_string_type(ty) {
            let mut out = String::new();
            for &operand in operands {
                let value = self.eval_expr(ctx, operand);
                if value.is_invalid() {
                    return ConstantValue::Invalid;
                }
                match value {
                    ConstantValue::Str(s) => out.push_str(&s),
                    ConstantValue::Integer(v) => {
                        // Integral operands contribute their bytes.
                        let mut bytes = Vec::new();
                        let mut width = v.width();
                        while width >= 8 {
                            let b = v.slice(width - 1, width - 8);
                            bytes.push(b.as_u64().unwrap_or(0) as u8);
                            width -= 8;
                        }
                        let filtered: Vec<u8> =
                            bytes.into_iter().filter(|&b| b != 0).collect();
                        out.push_str(&String::from_utf8_lossy(&filtered));
                    }
                    _ => return ConstantValue::Invalid,
                }
            }
            return ConstantValue::Str(out);
        }

        let mut ints = Vec::new();
        for &operand in operands {
            let operand_ty = self.exprs[operand].ty;
            let value = self.eval_expr(ctx, operand);
            if value.is_invalid() {
                return ConstantValue::Invalid;
            }
            // Zero-width replications vanish from the concatenation.
            let canonical = self.canonical(operand_ty);
            if matches!(self.types[canonical], Type::Void) {
                continue;
            }
            match value {
                ConstantValue::Integer(v) => ints.push(v),
                ConstantValue::Str(s) => ints.push(string_to_bits(&s)),
                _ => return ConstantValue::Invalid,
            }
        }
        ConstantValue::Integer(SvInt::concat(&ints))
    }

    fn eval_replication(
        &mut self,
        ctx: &mut EvalContext,
        count: ExprId,
        concat: ExprId,
        expr: ExprId,
        span: Span,
    ) -> ConstantValue {
        // Operands are always evaluated, even when the count is zero.
        let inner = self.eval_expr(ctx, concat);
        let n = self.eval_expr(ctx, count);
        if inner.is_invalid() || n.is_invalid() {
            return ConstantValue::Invalid;
        }

        let ty = self.exprs[expr].ty;
        let canonical = self.canonical(ty);
        if matches!(self.types[canonical], Type::Void) {
            return ConstantValue::NullPlaceholder;
        }

        let Some(times) = n.integer().and_then(SvInt::as_i32).filter(|&t| t >= 0) else {
            let rendered = n.to_string();
            ctx.add_diag(errors::error_replication_count_invalid(&rendered, span));
            return ConstantValue::Invalid;
        };

        if self.is_string_type(ty) {
            let text = match inner {
                ConstantValue::Str(s) => s,
                _ => return ConstantValue::Invalid,
            };
            return ConstantValue::Str(text.repeat(times as usize));
        }

        match inner {
            ConstantValue::Integer(v) => ConstantValue::Integer(v.replicate(times as u32)),
            _ => ConstantValue::Invalid,
        }
    }

    fn eval_call(
        &mut self,
        ctx: &mut EvalContext,
        subroutine: SymbolId,
        args: &[ExprId],
        span: Span,
    ) -> ConstantValue {
        // Runaway recursion burns the budget long before it overflows the
        // native stack.
        if ctx.frame_depth() >= 128 {
            ctx.add_diag(errors::error_eval_exceeded_steps(span));
            return ConstantValue::Invalid;
        }
        // Evaluate all arguments in the caller's frame.
        let mut values = Vec::new();
        for &arg in args {
            let value = self.eval_expr(ctx, arg);
            if value.is_invalid() {
                return ConstantValue::Invalid;
            }
            values.push(value);
        }

        let (formals, return_var) = {
            let SymbolKind::Subroutine {
                args, return_var, ..
            } = &self.symbols[subroutine].kind
            else {
                return ConstantValue::Invalid;
            };
            (args.clone(), *return_var)
        };
        let Some(return_var) = return_var else {
            return ConstantValue::Invalid;
        };
        let Some(body) = self.subroutine_body(subroutine) else {
            return ConstantValue::Invalid;
        };

        let location = ctx.top_frame().lookup_location;
        ctx.push_frame(subroutine, span, location);
        for (&formal, value) in formals.iter().zip(values) {
            ctx.create_local(formal, value);
        }
        let return_ty = self.subroutine_return_type(subroutine);
        let default = self.default_value(return_ty);
        ctx.create_local(return_var, default);

        let result = self.eval_stmt(ctx, body);
        let value = ctx
            .find_local(return_var)
            .cloned()
            .unwrap_or(ConstantValue::Invalid);
        ctx.pop_frame();

        match result {
            EvalResult::Fail => ConstantValue::Invalid,
            _ => value,
        }
    }

    fn eval_system_call(
        &mut self,
        ctx: &mut EvalContext,
        function: SystemFunction,
        args: &[ExprId],
        _span: Span,
    ) -> ConstantValue {
        match function {
            SystemFunction::Clog2 => {
                let value = self.eval_expr(ctx, args[0]);
                let Some(n) = value.integer().and_then(SvInt::as_i64) else {
                    return ConstantValue::Invalid;
                };
                ConstantValue::Integer(SvInt::from_i64(32, clog2(n), true))
            }
            SystemFunction::Bits => {
                let ty = self.exprs[args[0]].ty;
                let width = self.bit_width(ty);
                if width == 0 {
                    return ConstantValue::Invalid;
                }
                ConstantValue::Integer(SvInt::new(32, u64::from(width), true))
            }
        }
    }

    /// Converts a constant value to a target type.
    pub(crate) fn convert_value(
        &mut self,
        value: ConstantValue,
        ty: crate::arena::TypeId,
    ) -> ConstantValue {
        if self.is_integral(ty) {
            let width = self.bit_width(ty).max(1);
            let signed = self.is_signed(ty);
            let four_state = self.is_four_state(ty);
            return match value {
                ConstantValue::Integer(v) => {
                    ConstantValue::Integer(v.convert(width, signed, four_state))
                }
                ConstantValue::Real(v) => {
                    ConstantValue::Integer(SvInt::from_i64(width, v.round() as i64, signed))
                }
                ConstantValue::ShortReal(v) => ConstantValue::Integer(SvInt::from_i64(
                    width,
                    f64::from(v).round() as i64,
                    signed,
                )),
                ConstantValue::Str(s) => {
                    let bits = string_to_bits(&s);
                    ConstantValue::Integer(bits.convert(width, signed, four_state))
                }
                _ => ConstantValue::Invalid,
            };
        }
        if self.is_floating(ty) {
            let short = self.bit_width(ty) == 32;
            let as_f64 = match value {
                ConstantValue::Integer(v) => match v.as_i64() {
                    Some(i) => i as f64,
                    None => return ConstantValue::Invalid,
                },
                ConstantValue::Real(v) => v,
                ConstantValue::ShortReal(v) => f64::from(v),
                _ => return ConstantValue::Invalid,
            };
            return if short {
                ConstantValue::ShortReal(as_f64 as f32)
            } else {
                ConstantValue::Real(as_f64)
            };
        }
        if self.is_string_type(ty) {
            return match value {
                ConstantValue::Str(s) => ConstantValue::Str(s),
                ConstantValue::Integer(v) => {
                    let mut bytes = Vec::new();
                    let mut width = v.width();
                    while width >= 8 {
                        let b = v.slice(width - 1, width - 8);
                        bytes.push(b.as_u64().unwrap_or(0) as u8);
                        width -= 8;
                    }
                    let filtered: Vec<u8> = bytes.into_iter().filter(|&b| b != 0).collect();
                    ConstantValue::Str(String::from_utf8_lossy(&filtered).into_owned())
                }
                _ => ConstantValue::Invalid,
            };
        }
        value
    }
}

/// Converts a string to its bit-vector interpretation, eight bits per
/// character, first character most significant.
pub(crate) fn string_to_bits(text: &str) -> SvInt {
    let width = (text.len() as u32 * 8).max(8);
    let mut value = SvInt::new(width, 0, false);
    for (i, &byte) in text.as_bytes().iter().rev().enumerate() {
        for bit in 0..8 {
            if byte >> bit & 1 != 0 {
                value.set(i as u32 * 8 + bit, Logic::One);
            }
        }
    }
    value
}

fn clog2(n: i64) -> i64 {
    if n <= 1 {
        return 0;
    }
    let mut result = 0;
    let mut value = n - 1;
    while value > 0 {
        result += 1;
        value >>= 1;
    }
    result
}

fn bool_logic(l: Logic) -> ConstantValue {
    ConstantValue::Integer(SvInt::from_logic(l))
}

/// Applies a binary operator to two constant operands.
pub(crate) fn eval_binary_op(
    op: BinaryOp,
    lhs: &ConstantValue,
    rhs: &ConstantValue,
) -> ConstantValue {
    use BinaryOp::*;

    if let (ConstantValue::Integer(l), ConstantValue::Integer(r)) = (lhs, rhs) {
        return match op {
            Add => ConstantValue::Integer(l.add(r)),
            Subtract => ConstantValue::Integer(l.sub(r)),
            Multiply => ConstantValue::Integer(l.mul(r)),
            Divide => ConstantValue::Integer(l.div(r)),
            Mod => ConstantValue::Integer(l.rem(r)),
            Power => ConstantValue::Integer(l.pow(r)),
            BinaryAnd => ConstantValue::Integer(l.and(r)),
            BinaryOr => ConstantValue::Integer(l.or(r)),
            BinaryXor => ConstantValue::Integer(l.xor(r)),
            BinaryXnor => ConstantValue::Integer(l.xnor(r)),
            LogicalShiftLeft | ArithmeticShiftLeft => ConstantValue::Integer(l.shl(r)),
            LogicalShiftRight => ConstantValue::Integer(l.lshr(r)),
            ArithmeticShiftRight => ConstantValue::Integer(l.ashr(r)),
            Equality => bool_logic(l.eq_logic(r)),
            Inequality => bool_logic(!l.eq_logic(r)),
            CaseEquality => ConstantValue::Integer(SvInt::from_bool(l.exactly_equals(r))),
            CaseInequality => ConstantValue::Integer(SvInt::from_bool(!l.exactly_equals(r))),
            WildcardEquality => bool_logic(l.wildcard_equals(r)),
            WildcardInequality => bool_logic(!l.wildcard_equals(r)),
            LessThan => bool_logic(l.lt(r)),
            LessThanEqual => bool_logic(l.le(r)),
            GreaterThan => bool_logic(l.gt(r)),
            GreaterThanEqual => bool_logic(l.ge(r)),
            LogicalAnd => bool_logic(l.to_logic() & r.to_logic()),
            LogicalOr => bool_logic(l.to_logic() | r.to_logic()),
            LogicalImplication => bool_logic(!l.to_logic() | r.to_logic()),
            LogicalEquivalence => bool_logic(!(l.to_logic() ^ r.to_logic())),
        };
    }

    // Mixed or floating arithmetic promotes both sides to f64.
    let as_real = |v: &ConstantValue| -> Option<f64> {
        match v {
            ConstantValue::Real(x) => Some(*x),
            ConstantValue::ShortReal(x) => Some(f64::from(*x)),
            ConstantValue::Integer(x) => x.as_i64().map(|i| i as f64),
            _ => None,
        }
    };
    if let (Some(l), Some(r)) = (as_real(lhs), as_real(rhs)) {
        let keep_short = matches!(
            (lhs, rhs),
            (ConstantValue::ShortReal(_), ConstantValue::ShortReal(_))
        );
        let wrap = |v: f64| -> ConstantValue {
            if keep_short {
                ConstantValue::ShortReal(v as f32)
            } else {
                ConstantValue::Real(v)
            }
        };
        return match op {
            Add => wrap(l + r),
            Subtract => wrap(l - r),
            Multiply => wrap(l * r),
            Divide => wrap(l / r),
            Power => wrap(l.powf(r)),
            Equality | CaseEquality => ConstantValue::Integer(SvInt::from_bool(l == r)),
            Inequality | CaseInequality => ConstantValue::Integer(SvInt::from_bool(l != r)),
            LessThan => ConstantValue::Integer(SvInt::from_bool(l < r)),
            LessThanEqual => ConstantValue::Integer(SvInt::from_bool(l <= r)),
            GreaterThan => ConstantValue::Integer(SvInt::from_bool(l > r)),
            GreaterThanEqual => ConstantValue::Integer(SvInt::from_bool(l >= r)),
            LogicalAnd => ConstantValue::Integer(SvInt::from_bool(l != 0.0 && r != 0.0)),
            LogicalOr => ConstantValue::Integer(SvInt::from_bool(l != 0.0 || r != 0.0)),
            LogicalImplication => ConstantValue::Integer(SvInt::from_bool(l == 0.0 || r != 0.0)),
            LogicalEquivalence => {
                ConstantValue::Integer(SvInt::from_bool((l != 0.0) == (r != 0.0)))
            }
            _ => ConstantValue::Invalid,
        };
    }

    if let (ConstantValue::Str(l), ConstantValue::Str(r)) = (lhs, rhs) {
        return match op {
            Equality | CaseEquality => ConstantValue::Integer(SvInt::from_bool(l == r)),
            Inequality | CaseInequality => ConstantValue::Integer(SvInt::from_bool(l != r)),
            LessThan => ConstantValue::Integer(SvInt::from_bool(l < r)),
            LessThanEqual => ConstantValue::Integer(SvInt::from_bool(l <= r)),
            GreaterThan => ConstantValue::Integer(SvInt::from_bool(l > r)),
            GreaterThanEqual => ConstantValue::Integer(SvInt::from_bool(l >= r)),
            _ => ConstantValue::Invalid,
        };
    }

    // Element-wise equality for unpacked aggregates.
    if let (ConstantValue::Elements(l), ConstantValue::Elements(r)) = (lhs, rhs) {
        let equal = l.len() == r.len()
            && l.iter().zip(r).all(|(a, b)| {
                matches!(
                    eval_binary_op(Equality, a, b),
                    ConstantValue::Integer(v) if v.is_true()
                )
            });
        return match op {
            Equality | CaseEquality => ConstantValue::Integer(SvInt::from_bool(equal)),
            Inequality | CaseInequality => ConstantValue::Integer(SvInt::from_bool(!equal)),
            _ => ConstantValue::Invalid,
        };
    }

    ConstantValue::Invalid
}
