//! Symbols: every named construct in the elaborated design.
//!
//! A [`Symbol`] is a tagged union over the closed set of construct kinds,
//! with per-variant payloads. Scope-bearing kinds own a [`ScopeData`] with
//! the ordered member list, the name map, wildcard-import sideband, and a
//! deferred flag. Interior references are [`SymbolId`]s into the
//! compilation's arena, so the cyclic symbol/scope/type graph needs no
//! reference counting; cycle safety during lazy resolution comes from the
//! `evaluating` guard on each [`DeclaredType`].

use std::collections::HashMap;

use crate::arena::{ExprId, StmtId, SymbolId, TypeId};
use crate::const_value::ConstantValue;
use crate::types::ConstantRange;
use veris_common::Ident;
use veris_parser::ast as syntax;
use veris_parser::ast::{DefinitionKind, Direction, ForwardTypedefCategory, NetKind, TimeScale};
use veris_source::Span;

/// The members, name map, and bookkeeping of a scope-bearing symbol.
#[derive(Debug, Default)]
pub struct ScopeData {
    /// Member symbols in declaration order.
    pub members: Vec<SymbolId>,
    /// Named members; first-declared wins, duplicates are diagnosed.
    pub name_map: HashMap<Ident, SymbolId>,
    /// Wildcard imports, kept out of the name map.
    pub wildcard_imports: Vec<SymbolId>,
    /// True while deferred members remain to be elaborated.
    pub has_deferred: bool,
    /// Guard against re-entrant elaboration.
    pub is_elaborating: bool,
    /// The next declaration-order index to hand out.
    pub next_index: u32,
}

/// The lazy glue between a symbol and its declared type and initializer.
///
/// Resolution is on demand and guarded: re-entering an in-progress
/// resolution fails with a circular-dependency diagnostic instead of
/// recursing forever.
#[derive(Clone, Debug, Default)]
pub struct DeclaredType<'a> {
    /// The unresolved type syntax.
    pub type_syntax: Option<&'a syntax::DataType>,
    /// Unpacked dimensions applied over the type.
    pub dims_syntax: &'a [syntax::UnpackedDim],
    /// The unresolved initializer syntax.
    pub init_syntax: Option<&'a syntax::Expr>,
    /// The location of the `=` introducing the initializer.
    pub init_span: Option<Span>,
    /// The resolved type, once computed.
    pub resolved: Option<TypeId>,
    /// The bound initializer: outer `None` = not yet resolved, inner
    /// `None` = no initializer.
    pub initializer: Option<Option<ExprId>>,
    /// Cycle guard; set while a resolution is in progress.
    pub evaluating: bool,
    /// Behavior flags captured at declaration time.
    pub flags: DeclaredTypeFlags,
}

/// Flags modifying declared-type resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredTypeFlags {
    /// An implicit type takes the initializer's type (parameters).
    pub infer_implicit: bool,
    /// The initializer must be constant.
    pub require_constant: bool,
    /// Resolve names without ordering checks.
    pub lookup_max: bool,
    /// Force the type signed (used by cast construction).
    pub force_signed: bool,
}

impl<'a> DeclaredType<'a> {
    /// Creates a declared type from type syntax alone.
    pub fn from_type(ty: &'a syntax::DataType) -> Self {
        Self {
            type_syntax: Some(ty),
            ..Self::default()
        }
    }

    /// Creates a declared type from type syntax and a declarator's
    /// dimensions and initializer.
    pub fn from_declarator(ty: &'a syntax::DataType, decl: &'a syntax::Declarator) -> Self {
        Self {
            type_syntax: Some(ty),
            dims_syntax: &decl.dims,
            init_syntax: decl.init.as_ref(),
            init_span: decl.eq_span,
            ..Self::default()
        }
    }

    /// Creates an already-resolved declared type.
    pub fn resolved(ty: TypeId) -> Self {
        Self {
            resolved: Some(ty),
            initializer: Some(None),
            ..Self::default()
        }
    }
}

/// Metadata about one parameter of a definition, in declaration order.
#[derive(Clone, Copy, Debug)]
pub struct ParamInfo {
    /// The parameter name.
    pub name: Ident,
    /// True for `localparam` (and body params of definitions with a
    /// parameter port list).
    pub is_local: bool,
    /// True for parameters declared in the `#(...)` header.
    pub is_port: bool,
    /// True for type parameters.
    pub is_type: bool,
    /// The parameter symbol inside the definition scope.
    pub symbol: SymbolId,
}

/// The payload of a symbol, tagged by construct kind.
#[derive(Debug)]
pub enum SymbolKind<'a> {
    /// The root of the elaborated hierarchy.
    Root(ScopeData),
    /// One compilation unit (one source file).
    CompilationUnit(ScopeData),
    /// A package.
    Package {
        /// The package scope.
        scope: ScopeData,
        /// The `default_nettype` captured at parse time.
        default_net_type: NetKind,
        /// The time scale in effect for the package.
        time_scale: Option<TimeScale>,
    },
    /// The static template of a module/interface/program.
    Definition {
        /// The definition scope (used as the lexical template).
        scope: ScopeData,
        /// The definition syntax.
        syntax: &'a syntax::ModuleDecl,
        /// Module, interface, or program.
        def_kind: DefinitionKind,
        /// All parameters in declaration order.
        parameters: Vec<ParamInfo>,
        /// The time scale in effect for the definition.
        time_scale: Option<TimeScale>,
    },
    /// A module (or program) instance.
    ModuleInstance {
        /// The instance scope.
        scope: ScopeData,
        /// The instantiated definition.
        definition: SymbolId,
    },
    /// An interface instance.
    InterfaceInstance {
        /// The instance scope.
        scope: ScopeData,
        /// The instantiated definition.
        definition: SymbolId,
    },
    /// An array of instances.
    InstanceArray {
        /// Scope holding the elements.
        scope: ScopeData,
        /// The element instances, in range order.
        elements: Vec<SymbolId>,
        /// The declared range.
        range: ConstantRange,
    },
    /// A generate block.
    GenerateBlock {
        /// The block scope.
        scope: ScopeData,
        /// False when the gating condition deselected this block.
        is_instantiated: bool,
    },
    /// The array of blocks produced by a loop generate.
    GenerateBlockArray {
        /// Scope holding the blocks.
        scope: ScopeData,
        /// `(genvar value, block)` pairs for instantiated entries.
        entries: Vec<(i64, SymbolId)>,
    },
    /// A value parameter.
    Parameter {
        /// Type and initializer resolution state.
        declared: DeclaredType<'a>,
        /// True for `localparam`.
        is_local: bool,
        /// True for parameters in the `#(...)` header.
        is_port: bool,
        /// The evaluated value, cached after first computation.
        value: Option<ConstantValue>,
    },
    /// A type parameter.
    TypeParameter {
        /// The target type resolution state.
        declared: DeclaredType<'a>,
        /// True for `localparam type`.
        is_local: bool,
        /// True for type parameters in the `#(...)` header.
        is_port: bool,
        /// The alias type wrapping this parameter, created on demand.
        alias_ty: Option<TypeId>,
    },
    /// The external side of a data port.
    Port {
        /// Type resolution state (the default value rides along as the
        /// initializer).
        declared: DeclaredType<'a>,
        /// Data flow direction.
        direction: Direction,
        /// The internal net/variable the port connects to.
        internal: Option<SymbolId>,
        /// The bound external connection, if any.
        connection: Option<ExprId>,
    },
    /// An interface port.
    InterfacePort {
        /// The interface definition this port requires.
        interface_def: Option<SymbolId>,
        /// An optional modport restriction.
        modport: Option<Ident>,
        /// The connected interface instance (or array), if any.
        connection: Option<SymbolId>,
    },
    /// A net.
    Net {
        /// Type resolution state.
        declared: DeclaredType<'a>,
        /// The net kind.
        net_kind: NetKind,
    },
    /// A variable.
    Variable {
        /// Type resolution state.
        declared: DeclaredType<'a>,
        /// True if declared `const`.
        is_const: bool,
        /// True for synthesized variables (loop iterators, return slots).
        is_compiler_generated: bool,
    },
    /// A formal argument of a subroutine.
    FormalArgument {
        /// Type resolution state.
        declared: DeclaredType<'a>,
        /// The argument direction.
        direction: Direction,
    },
    /// A task or function.
    Subroutine {
        /// The subroutine scope: formals, the return slot, and locals.
        scope: ScopeData,
        /// The declaration syntax.
        syntax: &'a syntax::FunctionDecl,
        /// Return type resolution state.
        return_declared: DeclaredType<'a>,
        /// The formal arguments in order.
        args: Vec<SymbolId>,
        /// The implicit return-value variable.
        return_var: Option<SymbolId>,
        /// The bound body, cached after first binding.
        body: Option<StmtId>,
        /// True for tasks.
        is_task: bool,
    },
    /// A modport inside an interface.
    Modport {
        /// The listed names with directions.
        ports: Vec<(Direction, Ident, Span)>,
    },
    /// A continuous assignment.
    ContinuousAssign {
        /// The assignment syntax.
        assignment: &'a syntax::Expr,
        /// The bound assignment, cached after first binding.
        bound: Option<ExprId>,
    },
    /// A genvar declaration.
    Genvar,
    /// An enum member.
    EnumValue {
        /// Type and initializer resolution state.
        declared: DeclaredType<'a>,
        /// The base type of the owning enum.
        base: TypeId,
        /// The member's value, set during enum construction.
        value: Option<ConstantValue>,
    },
    /// An explicit import of one name from a package.
    ExplicitImport {
        /// The package name.
        package: Ident,
        /// The imported name.
        name: Ident,
    },
    /// A wildcard import; lives in the sideband list, not the name map.
    WildcardImport {
        /// The package name.
        package: Ident,
    },
    /// A forward typedef declaration.
    ForwardingTypedef {
        /// The category keyword, if any.
        category: ForwardTypedefCategory,
    },
    /// A wrapper making a nested symbol (an enum member) visible in an
    /// outer scope; lookups unwrap it.
    TransparentMember {
        /// The wrapped symbol.
        wrapped: SymbolId,
    },
    /// A standalone semicolon.
    EmptyMember,
    /// A placeholder for syntax whose elaboration is postponed until the
    /// scope is first used.
    DeferredMember(&'a syntax::ModuleItem),
    /// A typedef.
    TypeAlias {
        /// The target type resolution state.
        declared: DeclaredType<'a>,
        /// The alias type wrapping this symbol, created on demand.
        alias_ty: Option<TypeId>,
    },
}

/// A symbol: one named (or anonymous) construct in the design.
#[derive(Debug)]
pub struct Symbol<'a> {
    /// The construct kind and payload.
    pub kind: SymbolKind<'a>,
    /// The name; `None` for anonymous constructs.
    pub name: Option<Ident>,
    /// The declaration site.
    pub span: Span,
    /// The owning scope; only the root has none.
    pub parent: Option<SymbolId>,
    /// The declaration-order index within the parent scope. Immutable
    /// once the symbol has been inserted.
    pub index_in_scope: u32,
}

impl<'a> Symbol<'a> {
    /// Creates a detached symbol; the scope insertion fills in parent and
    /// index.
    pub fn new(kind: SymbolKind<'a>, name: Option<Ident>, span: Span) -> Self {
        Self {
            kind,
            name,
            span,
            parent: None,
            index_in_scope: 0,
        }
    }

    /// Returns the scope data if this symbol is scope-bearing.
    pub fn scope(&self) -> Option<&ScopeData> {
        match &self.kind {
            SymbolKind::Root(s)
            | SymbolKind::CompilationUnit(s)
            | SymbolKind::Package { scope: s, .. }
            | SymbolKind::Definition { scope: s, .. }
            | SymbolKind::ModuleInstance { scope: s, .. }
            | SymbolKind::InterfaceInstance { scope: s, .. }
            | SymbolKind::InstanceArray { scope: s, .. }
            | SymbolKind::GenerateBlock { scope: s, .. }
            | SymbolKind::GenerateBlockArray { scope: s, .. }
            | SymbolKind::Subroutine { scope: s, .. } => Some(s),
            _ => None,
        }
    }

    /// Returns the scope data mutably if this symbol is scope-bearing.
    pub fn scope_mut(&mut self) -> Option<&mut ScopeData> {
        match &mut self.kind {
            SymbolKind::Root(s)
            | SymbolKind::CompilationUnit(s)
            | SymbolKind::Package { scope: s, .. }
            | SymbolKind::Definition { scope: s, .. }
            | SymbolKind::ModuleInstance { scope: s, .. }
            | SymbolKind::InterfaceInstance { scope: s, .. }
            | SymbolKind::InstanceArray { scope: s, .. }
            | SymbolKind::GenerateBlock { scope: s, .. }
            | SymbolKind::GenerateBlockArray { scope: s, .. }
            | SymbolKind::Subroutine { scope: s, .. } => Some(s),
            _ => None,
        }
    }

    /// True if this symbol also acts as a scope.
    pub fn is_scope(&self) -> bool {
        self.scope().is_some()
    }

    /// True if this symbol names a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::TypeAlias { .. } | SymbolKind::TypeParameter { .. }
        )
    }

    /// True if this symbol has a value (and thus a declared type).
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Parameter { .. }
                | SymbolKind::Port { .. }
                | SymbolKind::Net { .. }
                | SymbolKind::Variable { .. }
                | SymbolKind::FormalArgument { .. }
                | SymbolKind::EnumValue { .. }
        )
    }

    /// True if this symbol is a module, interface, or program instance.
    pub fn is_instance(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::ModuleInstance { .. } | SymbolKind::InterfaceInstance { .. }
        )
    }

    /// Returns the declared type of a value or type symbol, if it has one.
    pub fn declared(&self) -> Option<&DeclaredType<'a>> {
        match &self.kind {
            SymbolKind::Parameter { declared, .. }
            | SymbolKind::TypeParameter { declared, .. }
            | SymbolKind::Port { declared, .. }
            | SymbolKind::Net { declared, .. }
            | SymbolKind::Variable { declared, .. }
            | SymbolKind::FormalArgument { declared, .. }
            | SymbolKind::EnumValue { declared, .. }
            | SymbolKind::TypeAlias { declared, .. } => Some(declared),
            _ => None,
        }
    }

    /// Returns the declared type mutably.
    pub fn declared_mut(&mut self) -> Option<&mut DeclaredType<'a>> {
        match &mut self.kind {
            SymbolKind::Parameter { declared, .. }
            | SymbolKind::TypeParameter { declared, .. }
            | SymbolKind::Port { declared, .. }
            | SymbolKind::Net { declared, .. }
            | SymbolKind::Variable { declared, .. }
            | SymbolKind::FormalArgument { declared, .. }
            | SymbolKind::EnumValue { declared, .. }
            | SymbolKind::TypeAlias { declared, .. } => Some(declared),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_detection() {
        let root = Symbol::new(SymbolKind::Root(ScopeData::default()), None, Span::DUMMY);
        assert!(root.is_scope());
        assert!(!root.is_value());

        let genvar = Symbol::new(SymbolKind::Genvar, None, Span::DUMMY);
        assert!(!genvar.is_scope());
    }

    #[test]
    fn value_and_type_detection() {
        let param = Symbol::new(
            SymbolKind::Parameter {
                declared: DeclaredType::default(),
                is_local: false,
                is_port: true,
                value: None,
            },
            Some(Ident::from_raw(0)),
            Span::DUMMY,
        );
        assert!(param.is_value());
        assert!(!param.is_type());
        assert!(param.declared().is_some());

        let alias = Symbol::new(
            SymbolKind::TypeAlias {
                declared: DeclaredType::default(),
                alias_ty: None,
            },
            Some(Ident::from_raw(1)),
            Span::DUMMY,
        );
        assert!(alias.is_type());
        assert!(!alias.is_value());
    }

    #[test]
    fn declared_type_constructors() {
        let d = DeclaredType::resolved(crate::arena::TypeId::from_raw(3));
        assert_eq!(d.resolved, Some(crate::arena::TypeId::from_raw(3)));
        assert!(!d.evaluating);
    }
}
