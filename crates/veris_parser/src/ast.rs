//! AST node types for the SystemVerilog parser.
//!
//! All nodes carry source spans. Names are interned [`Ident`]s; literal
//! values are recovered from source text through the spans during binding.
//! Module nodes additionally carry the default net type and time scale that
//! were in effect at parse time, captured from preprocessor state.

use serde::{Deserialize, Serialize};
use veris_common::Ident;
use veris_source::Span;

/// The kind of net a net declaration creates, or the active
/// `default_nettype` setting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NetKind {
    /// `wire`
    Wire,
    /// `wand`
    WAnd,
    /// `wor`
    WOr,
    /// `tri`
    Tri,
    /// `triand`
    TriAnd,
    /// `trior`
    TriOr,
    /// `tri0`
    Tri0,
    /// `tri1`
    Tri1,
    /// `trireg`
    TriReg,
    /// `supply0`
    Supply0,
    /// `supply1`
    Supply1,
    /// `uwire`
    UWire,
    /// `default_nettype none` — implicit nets are errors.
    None,
}

impl NetKind {
    /// Maps a net keyword's text to a net kind, including `none` as used by
    /// `default_nettype`.
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "wire" => Some(NetKind::Wire),
            "wand" => Some(NetKind::WAnd),
            "wor" => Some(NetKind::WOr),
            "tri" => Some(NetKind::Tri),
            "triand" => Some(NetKind::TriAnd),
            "trior" => Some(NetKind::TriOr),
            "tri0" => Some(NetKind::Tri0),
            "tri1" => Some(NetKind::Tri1),
            "trireg" => Some(NetKind::TriReg),
            "supply0" => Some(NetKind::Supply0),
            "supply1" => Some(NetKind::Supply1),
            "uwire" => Some(NetKind::UWire),
            "none" => Some(NetKind::None),
            _ => None,
        }
    }
}

/// A time unit for time scales and time literals.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum TimeUnit {
    /// femtoseconds
    Fs,
    /// picoseconds
    Ps,
    /// nanoseconds
    Ns,
    /// microseconds
    Us,
    /// milliseconds
    Ms,
    /// seconds
    S,
}

/// One half of a time scale: a magnitude of 1, 10, or 100 and a unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TimeScaleValue {
    /// The magnitude; one of 1, 10, or 100.
    pub magnitude: u16,
    /// The time unit.
    pub unit: TimeUnit,
}

impl TimeScaleValue {
    /// Parses a time scale value like `1ns` or `100ps`.
    pub fn from_text(text: &str) -> Option<Self> {
        let split = text.find(|c: char| !c.is_ascii_digit())?;
        let magnitude: u16 = text[..split].parse().ok()?;
        if !matches!(magnitude, 1 | 10 | 100) {
            return None;
        }
        let unit = match &text[split..] {
            "s" => TimeUnit::S,
            "ms" => TimeUnit::Ms,
            "us" => TimeUnit::Us,
            "ns" => TimeUnit::Ns,
            "ps" => TimeUnit::Ps,
            "fs" => TimeUnit::Fs,
            _ => return None,
        };
        Some(Self { magnitude, unit })
    }
}

/// A `timescale` setting: time unit and precision.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TimeScale {
    /// The unit of time values.
    pub base: TimeScaleValue,
    /// The precision of time values.
    pub precision: TimeScaleValue,
}

/// A parsed source file: the compilation-unit items in declaration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Top-level items.
    pub items: Vec<Item>,
    /// The span of the whole file.
    pub span: Span,
}

/// A top-level item in a compilation unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Item {
    /// A module, interface, or program definition.
    Definition(ModuleDecl),
    /// A package declaration.
    Package(PackageDecl),
    /// An import at compilation-unit scope.
    Import(ImportDecl),
    /// A timeunit/timeprecision declaration.
    TimeUnits(TimeUnitsDecl),
    /// Any other item shared with module bodies (typedefs, parameters).
    Member(Box<ModuleItem>),
}

/// Which kind of definition a [`ModuleDecl`] introduces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DefinitionKind {
    /// `module`
    Module,
    /// `interface`
    Interface,
    /// `program`
    Program,
}

/// A module, interface, or program definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// Module, interface, or program.
    pub kind: DefinitionKind,
    /// The definition name.
    pub name: Ident,
    /// The span of the name token.
    pub name_span: Span,
    /// Package imports in the header.
    pub imports: Vec<ImportDecl>,
    /// The parameter port list, if a `#(...)` header is present.
    pub param_ports: Option<Vec<ParamDecl>>,
    /// The port list.
    pub ports: PortList,
    /// Body items in declaration order.
    pub items: Vec<ModuleItem>,
    /// The label after `endmodule :`, if any.
    pub end_label: Option<Ident>,
    /// The `default_nettype` in effect when this definition was parsed.
    pub default_net_type: NetKind,
    /// The `timescale` in effect when this definition was parsed.
    pub time_scale: Option<TimeScale>,
    /// The span of the whole definition.
    pub span: Span,
}

/// A package declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageDecl {
    /// The package name.
    pub name: Ident,
    /// The span of the name token.
    pub name_span: Span,
    /// Body items in declaration order.
    pub items: Vec<ModuleItem>,
    /// The label after `endpackage :`, if any.
    pub end_label: Option<Ident>,
    /// The `default_nettype` in effect when this package was parsed.
    pub default_net_type: NetKind,
    /// The `timescale` in effect when this package was parsed.
    pub time_scale: Option<TimeScale>,
    /// The span of the whole package.
    pub span: Span,
}

/// A `timeunit` or `timeprecision` declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeUnitsDecl {
    /// True for `timeunit`, false for `timeprecision`.
    pub is_unit: bool,
    /// The declared value.
    pub value: Option<TimeScaleValue>,
    /// For `timeunit 1ns / 1ps`, the precision divider.
    pub precision: Option<TimeScaleValue>,
    /// The span of the declaration.
    pub span: Span,
}

/// One import specification like `pkg::*` or `pkg::name`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportSpec {
    /// The package name.
    pub package: Ident,
    /// The span of the package name.
    pub package_span: Span,
    /// The imported name, or `None` for a wildcard.
    pub item: Option<Ident>,
    /// The span of the imported name or `*`.
    pub item_span: Span,
}

/// An `import` declaration carrying one or more specs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportDecl {
    /// The imported specifications.
    pub specs: Vec<ImportSpec>,
    /// The span of the declaration.
    pub span: Span,
}

/// A port direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    InOut,
    /// `ref`
    Ref,
}

/// The port list style of a definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PortList {
    /// ANSI-style ports declared in the header.
    Ansi(Vec<AnsiPort>),
    /// Non-ANSI: names in the header, declarations in the body.
    NonAnsi(Vec<(Ident, Span)>),
    /// No port list at all.
    Empty,
}

/// One ANSI-style port declaration.
///
/// A port whose type is a bare [`DataType::Named`] may turn out to be an
/// interface port; elaboration decides once definitions are known.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnsiPort {
    /// The explicit direction, if written.
    pub direction: Option<Direction>,
    /// `wire` etc., when the port is explicitly a net.
    pub net: Option<NetKind>,
    /// True if declared with the `var` keyword.
    pub is_var: bool,
    /// The port's type.
    pub ty: DataType,
    /// A modport restriction for interface ports (`bus_if.master`).
    pub modport: Option<Ident>,
    /// The name, dimensions, and default value.
    pub declarator: Declarator,
    /// The span of the port entry.
    pub span: Span,
}

/// A declared name with optional unpacked dimensions and initializer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Declarator {
    /// The declared name.
    pub name: Ident,
    /// The span of the name token.
    pub name_span: Span,
    /// Unpacked dimensions after the name.
    pub dims: Vec<UnpackedDim>,
    /// The initializer expression, if present.
    pub init: Option<Expr>,
    /// The span of the `=` token introducing the initializer.
    pub eq_span: Option<Span>,
}

/// A packed dimension `[msb:lsb]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackedDim {
    /// The MSB expression.
    pub left: Expr,
    /// The LSB expression.
    pub right: Expr,
    /// The span of the dimension.
    pub span: Span,
}

/// An unpacked dimension after a declarator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum UnpackedDim {
    /// `[msb:lsb]`
    Range(Expr, Expr, Span),
    /// `[size]`
    Size(Expr, Span),
}

impl UnpackedDim {
    /// The span of the dimension.
    pub fn span(&self) -> Span {
        match self {
            UnpackedDim::Range(_, _, s) | UnpackedDim::Size(_, s) => *s,
        }
    }
}

/// The scalar type keywords.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ScalarKind {
    /// `bit` (two-state)
    Bit,
    /// `logic` (four-state)
    Logic,
    /// `reg` (synonym for `logic`)
    Reg,
}

/// The predefined integer type keywords.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PredefIntKind {
    /// `byte`
    Byte,
    /// `shortint`
    ShortInt,
    /// `int`
    Int,
    /// `longint`
    LongInt,
    /// `integer`
    Integer,
    /// `time`
    Time,
}

/// The floating-point type keywords.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RealKind {
    /// `real`
    Real,
    /// `shortreal`
    ShortReal,
    /// `realtime`
    RealTime,
}

/// A data type as written in source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DataType {
    /// No type keyword: optional signing and packed dimensions only.
    Implicit {
        /// True if `signed` was written.
        signed: bool,
        /// Packed dimensions.
        dims: Vec<PackedDim>,
        /// The span of the (possibly empty) type syntax.
        span: Span,
    },
    /// `bit`, `logic`, or `reg` with optional signing and dimensions.
    Scalar {
        /// Which scalar keyword.
        kind: ScalarKind,
        /// True if `signed` was written.
        signed: bool,
        /// Packed dimensions.
        dims: Vec<PackedDim>,
        /// The span of the type syntax.
        span: Span,
    },
    /// A predefined integer type, with optional explicit signing.
    PredefInt {
        /// Which predefined type.
        kind: PredefIntKind,
        /// Explicit `signed`/`unsigned`, if written.
        signed: Option<bool>,
        /// The span of the type syntax.
        span: Span,
    },
    /// `real`, `shortreal`, or `realtime`.
    Real {
        /// Which floating type.
        kind: RealKind,
        /// The span of the type syntax.
        span: Span,
    },
    /// `string`
    String {
        /// The span of the keyword.
        span: Span,
    },
    /// `chandle`
    Chandle {
        /// The span of the keyword.
        span: Span,
    },
    /// `event`
    Event {
        /// The span of the keyword.
        span: Span,
    },
    /// `void`
    Void {
        /// The span of the keyword.
        span: Span,
    },
    /// A named (possibly package-scoped) type, with packed dimensions.
    Named {
        /// The package qualifier in `pkg::name`, if any.
        package: Option<Ident>,
        /// The type name.
        name: Ident,
        /// The span of the name.
        name_span: Span,
        /// Packed dimensions applied to the named type.
        dims: Vec<PackedDim>,
        /// The span of the type syntax.
        span: Span,
    },
    /// An enum type declaration.
    Enum {
        /// The base type, if written.
        base: Option<Box<DataType>>,
        /// The enumerated members.
        members: Vec<EnumMember>,
        /// Packed dimensions applied to the enum.
        dims: Vec<PackedDim>,
        /// The span of the type syntax.
        span: Span,
    },
    /// A struct or union type declaration.
    Struct {
        /// True for `union`, false for `struct`.
        is_union: bool,
        /// True if declared `packed`.
        packed: bool,
        /// True if declared `signed`.
        signed: bool,
        /// The member declarations.
        members: Vec<StructMember>,
        /// Packed dimensions applied to the struct.
        dims: Vec<PackedDim>,
        /// The span of the type syntax.
        span: Span,
    },
}

impl DataType {
    /// The span of the type syntax.
    pub fn span(&self) -> Span {
        match self {
            DataType::Implicit { span, .. }
            | DataType::Scalar { span, .. }
            | DataType::PredefInt { span, .. }
            | DataType::Real { span, .. }
            | DataType::String { span }
            | DataType::Chandle { span }
            | DataType::Event { span }
            | DataType::Void { span }
            | DataType::Named { span, .. }
            | DataType::Enum { span, .. }
            | DataType::Struct { span, .. } => *span,
        }
    }

    /// True if this is an implicit type with no dimensions or signing,
    /// i.e. nothing was written at all.
    pub fn is_fully_implicit(&self) -> bool {
        matches!(
            self,
            DataType::Implicit {
                signed: false,
                dims,
                ..
            } if dims.is_empty()
        )
    }
}

/// One member of an enum declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnumMember {
    /// The member name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// A generated range `[N]` or `[a:b]`, if present.
    pub dims: Vec<UnpackedDim>,
    /// The initializer expression, if present.
    pub init: Option<Expr>,
    /// The span of the member.
    pub span: Span,
}

/// One member declaration inside a struct or union.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructMember {
    /// The member type.
    pub ty: DataType,
    /// The declared names.
    pub declarators: Vec<Declarator>,
    /// The span of the member declaration.
    pub span: Span,
}

/// A value or type parameter declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamDecl {
    /// True for `localparam`.
    pub is_local: bool,
    /// True for `parameter type`.
    pub is_type: bool,
    /// The declared type (implicit if omitted).
    pub ty: DataType,
    /// The declared parameters.
    pub declarators: Vec<Declarator>,
    /// The span of the declaration.
    pub span: Span,
}

/// A typedef declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypedefDecl {
    /// The aliased type.
    pub ty: DataType,
    /// The new type name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// Unpacked dimensions after the name.
    pub dims: Vec<UnpackedDim>,
    /// The span of the declaration.
    pub span: Span,
}

/// The category keyword on a forward typedef, if any.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ForwardTypedefCategory {
    /// Plain `typedef name;`
    None,
    /// `typedef enum name;`
    Enum,
    /// `typedef struct name;`
    Struct,
    /// `typedef union name;`
    Union,
}

/// A net declaration (`wire [7:0] w;`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetDecl {
    /// The net kind keyword.
    pub net_kind: NetKind,
    /// The data type of the nets.
    pub ty: DataType,
    /// The declared names.
    pub declarators: Vec<Declarator>,
    /// The span of the declaration.
    pub span: Span,
}

/// A variable declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataDecl {
    /// True if declared `const`.
    pub is_const: bool,
    /// The data type of the variables.
    pub ty: DataType,
    /// The declared names.
    pub declarators: Vec<Declarator>,
    /// The span of the declaration.
    pub span: Span,
}

/// A parameter value assignment in an instantiation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ParamAssignment {
    /// A positional assignment.
    Ordered(Expr),
    /// A named assignment `.NAME(expr)`; `expr` may be omitted.
    Named {
        /// The parameter name.
        name: Ident,
        /// The span of the name.
        name_span: Span,
        /// The assigned expression, if present.
        expr: Option<Expr>,
    },
}

/// A port connection in an instantiation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PortConnection {
    /// A positional connection; `None` leaves the port open.
    Ordered(Option<Expr>, Span),
    /// A named connection `.name(expr)`, `.name()`, or implicit `.name`.
    Named {
        /// The port name.
        name: Ident,
        /// The span of the name.
        name_span: Span,
        /// The connected expression, if present.
        expr: Option<Expr>,
        /// True if parentheses were written (so `.name()` is explicit open).
        has_parens: bool,
        /// The span of the connection.
        span: Span,
    },
    /// The `.*` wildcard connection.
    Wildcard(Span),
}

/// One instance in an instantiation list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HierarchicalInstance {
    /// The instance name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// Array dimensions on the instance.
    pub dims: Vec<UnpackedDim>,
    /// The port connections.
    pub connections: Vec<PortConnection>,
    /// The span of the instance.
    pub span: Span,
}

/// A hierarchy instantiation: `Adder #(.W(8)) a1 (.clk(clk)), a2 (...);`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HierarchyInstantiation {
    /// The definition name being instantiated.
    pub module: Ident,
    /// The span of the definition name.
    pub module_span: Span,
    /// Parameter assignments from `#(...)`, in written order.
    pub param_assignments: Vec<ParamAssignment>,
    /// The instances.
    pub instances: Vec<HierarchicalInstance>,
    /// The span of the whole instantiation.
    pub span: Span,
}

/// A generate block body: either an explicit begin/end block or a single
/// directly nested item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenMember {
    /// `begin [: label] ... end`
    Block(GenerateBlockSyntax),
    /// A single item without begin/end.
    Item(Box<ModuleItem>),
}

/// An explicit generate block with an optional label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerateBlockSyntax {
    /// The block label, from `begin : label` or a label before `begin`.
    pub label: Option<Ident>,
    /// The span of the label, if present.
    pub label_span: Option<Span>,
    /// The items inside the block.
    pub items: Vec<ModuleItem>,
    /// The span of the block.
    pub span: Span,
}

/// One arm of a case generate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseGenerateItem {
    /// The matching expressions; empty means `default`.
    pub expressions: Vec<Expr>,
    /// The arm body.
    pub body: GenMember,
    /// The span of the arm.
    pub span: Span,
}

/// A subroutine kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SubroutineKind {
    /// `function`
    Function,
    /// `task`
    Task,
}

/// A formal argument of a function or task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionArg {
    /// The argument direction (defaults to `input`).
    pub direction: Direction,
    /// The argument type.
    pub ty: DataType,
    /// The argument name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// Unpacked dimensions.
    pub dims: Vec<UnpackedDim>,
    /// A default value, if present.
    pub default: Option<Expr>,
    /// The span of the argument.
    pub span: Span,
}

/// A function or task declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Function or task.
    pub kind: SubroutineKind,
    /// The subroutine name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// The return type (void for tasks).
    pub return_type: DataType,
    /// The formal arguments.
    pub args: Vec<FunctionArg>,
    /// The body statements.
    pub body: Vec<Stmt>,
    /// The label after `endfunction :`, if any.
    pub end_label: Option<Ident>,
    /// The span of the declaration.
    pub span: Span,
}

/// One name listed in a modport declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModportPort {
    /// The direction of the listed name.
    pub direction: Direction,
    /// The listed name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
}

/// One named modport in a modport declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModportItem {
    /// The modport name.
    pub name: Ident,
    /// The span of the name.
    pub name_span: Span,
    /// The listed port directions.
    pub ports: Vec<ModportPort>,
    /// The span of the item.
    pub span: Span,
}

/// The kind of procedural block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ProceduralKind {
    /// `always`
    Always,
    /// `always_comb`
    AlwaysComb,
    /// `always_ff`
    AlwaysFf,
    /// `always_latch`
    AlwaysLatch,
    /// `initial`
    Initial,
    /// `final`
    Final,
}

/// An item inside a module, interface, package, or generate block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ModuleItem {
    /// A package import.
    Import(ImportDecl),
    /// A parameter or localparam declaration.
    Parameter(ParamDecl),
    /// A typedef.
    Typedef(TypedefDecl),
    /// A forward typedef (`typedef struct name;`).
    ForwardTypedef {
        /// The category keyword, if any.
        category: ForwardTypedefCategory,
        /// The declared name.
        name: Ident,
        /// The span of the name.
        name_span: Span,
        /// The span of the declaration.
        span: Span,
    },
    /// A net declaration.
    Net(NetDecl),
    /// A variable declaration.
    Data(DataDecl),
    /// A port declaration in a non-ANSI body.
    PortDecl {
        /// The port direction.
        direction: Direction,
        /// An explicit net keyword, if present.
        net: Option<NetKind>,
        /// True if declared with `var`.
        is_var: bool,
        /// The port type.
        ty: DataType,
        /// The declared names.
        declarators: Vec<Declarator>,
        /// The span of the declaration.
        span: Span,
    },
    /// A genvar declaration.
    Genvar {
        /// The declared names with their spans.
        names: Vec<(Ident, Span)>,
        /// The span of the declaration.
        span: Span,
    },
    /// A continuous assignment statement.
    ContinuousAssign {
        /// The assignments (each an assignment expression).
        assignments: Vec<Expr>,
        /// The span of the statement.
        span: Span,
    },
    /// A module/interface/program instantiation.
    Instantiation(HierarchyInstantiation),
    /// A `generate ... endgenerate` region.
    GenerateRegion(Vec<ModuleItem>, Span),
    /// An if-generate construct.
    IfGenerate {
        /// The condition.
        condition: Expr,
        /// The then branch.
        then_block: GenMember,
        /// The else branch, if present.
        else_block: Option<GenMember>,
        /// The span of the construct.
        span: Span,
    },
    /// A case-generate construct.
    CaseGenerate {
        /// The selector.
        condition: Expr,
        /// The arms.
        items: Vec<CaseGenerateItem>,
        /// The span of the construct.
        span: Span,
    },
    /// A loop-generate construct.
    LoopGenerate {
        /// True if the init declares its own genvar.
        genvar_keyword: bool,
        /// The loop variable name.
        ident: Ident,
        /// The span of the loop variable name.
        ident_span: Span,
        /// The initialization expression.
        init: Expr,
        /// The stop condition.
        stop: Expr,
        /// The iteration expression.
        iteration: Expr,
        /// The loop body.
        body: GenMember,
        /// The span of the construct.
        span: Span,
    },
    /// A function or task declaration.
    Subroutine(FunctionDecl),
    /// A modport declaration inside an interface.
    Modport {
        /// The declared modports.
        items: Vec<ModportItem>,
        /// The span of the declaration.
        span: Span,
    },
    /// An always/initial/final block. Bodies are kept for tooling but are
    /// not elaborated by the front-end.
    Procedural {
        /// Which kind of block.
        kind: ProceduralKind,
        /// The body statement.
        stmt: Stmt,
        /// The span of the block.
        span: Span,
    },
    /// A timeunit/timeprecision declaration.
    TimeUnits(TimeUnitsDecl),
    /// A standalone semicolon.
    Empty(Span),
    /// A parse error placeholder; children were skipped.
    Error(Span),
}

impl ModuleItem {
    /// The span of the item.
    pub fn span(&self) -> Span {
        match self {
            ModuleItem::Import(i) => i.span,
            ModuleItem::Parameter(p) => p.span,
            ModuleItem::Typedef(t) => t.span,
            ModuleItem::ForwardTypedef { span, .. } => *span,
            ModuleItem::Net(n) => n.span,
            ModuleItem::Data(d) => d.span,
            ModuleItem::PortDecl { span, .. } => *span,
            ModuleItem::Genvar { span, .. } => *span,
            ModuleItem::ContinuousAssign { span, .. } => *span,
            ModuleItem::Instantiation(i) => i.span,
            ModuleItem::GenerateRegion(_, span) => *span,
            ModuleItem::IfGenerate { span, .. } => *span,
            ModuleItem::CaseGenerate { span, .. } => *span,
            ModuleItem::LoopGenerate { span, .. } => *span,
            ModuleItem::Subroutine(f) => f.span,
            ModuleItem::Modport { span, .. } => *span,
            ModuleItem::Procedural { span, .. } => *span,
            ModuleItem::TimeUnits(t) => t.span,
            ModuleItem::Empty(span) => *span,
            ModuleItem::Error(span) => *span,
        }
    }
}

/// A unary operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    LogicalNot,
    /// `~`
    BitwiseNot,
    /// `&`
    ReductionAnd,
    /// `|`
    ReductionOr,
    /// `^`
    ReductionXor,
    /// `~&`
    ReductionNand,
    /// `~|`
    ReductionNor,
    /// `~^`
    ReductionXnor,
    /// `++x`
    Preincrement,
    /// `--x`
    Predecrement,
    /// `x++`
    Postincrement,
    /// `x--`
    Postdecrement,
}

/// A binary operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Mod,
    /// `**`
    Power,
    /// `&`
    BinaryAnd,
    /// `|`
    BinaryOr,
    /// `^`
    BinaryXor,
    /// `~^`
    BinaryXnor,
    /// `==`
    Equality,
    /// `!=`
    Inequality,
    /// `===`
    CaseEquality,
    /// `!==`
    CaseInequality,
    /// `==?`
    WildcardEquality,
    /// `!=?`
    WildcardInequality,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `->`
    LogicalImplication,
    /// `<->`
    LogicalEquivalence,
    /// `<<`
    LogicalShiftLeft,
    /// `>>`
    LogicalShiftRight,
    /// `<<<`
    ArithmeticShiftLeft,
    /// `>>>`
    ArithmeticShiftRight,
}

/// The kind of a range select.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RangeSelectKind {
    /// `[msb:lsb]`
    Simple,
    /// `[base +: width]`
    IndexedUp,
    /// `[base -: width]`
    IndexedDown,
}

/// The target of a cast expression.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CastTarget {
    /// `int'(x)` and friends.
    Type(Box<DataType>),
    /// `N'(x)` size cast.
    Size(Box<Expr>),
    /// `signed'(x)` / `unsigned'(x)`.
    Signing(bool),
}

/// The kind of an assignment pattern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PatternKind {
    /// `'{a, b, c}`
    Simple,
    /// `'{N {a, b}}`
    Replicated(Box<Expr>),
    /// `'{key: value, ...}`
    Structured,
}

/// A key in a structured assignment pattern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PatternKey {
    /// `default:`
    Default,
    /// A type key like `int:`.
    Type(DataType),
    /// A member name or constant expression key.
    Expr(Expr),
}

/// One item in an assignment pattern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternItem {
    /// The key for structured patterns.
    pub key: Option<PatternKey>,
    /// The value expression.
    pub value: Expr,
}

/// An expression as written in source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    /// A plain integer literal.
    Literal {
        /// The literal's span (text recovered through it).
        span: Span,
    },
    /// A sized/based literal.
    SizedLiteral {
        /// The literal's span.
        span: Span,
    },
    /// An unbased unsized literal (`'0`, `'1`, `'x`, `'z`).
    UnbasedUnsized {
        /// The literal's span.
        span: Span,
    },
    /// A real literal.
    RealLiteral {
        /// The literal's span.
        span: Span,
    },
    /// A time literal.
    TimeLiteral {
        /// The literal's span.
        span: Span,
    },
    /// A string literal (quotes included in the span).
    StringLiteral {
        /// The literal's span.
        span: Span,
    },
    /// The `null` keyword.
    Null {
        /// The keyword's span.
        span: Span,
    },
    /// A simple identifier reference.
    Identifier {
        /// The referenced name.
        name: Ident,
        /// The identifier's span.
        span: Span,
    },
    /// A package-scoped name `pkg::name`.
    Scoped {
        /// The package name.
        package: Ident,
        /// The member name.
        name: Ident,
        /// The full span.
        span: Span,
    },
    /// The `$root` prefix.
    Root {
        /// The keyword's span.
        span: Span,
    },
    /// A unary operator application.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A binary operator application.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<Expr>,
        /// The right operand.
        right: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// The conditional operator.
    Conditional {
        /// The predicate.
        pred: Box<Expr>,
        /// The true branch.
        if_true: Box<Expr>,
        /// The false branch.
        if_false: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// An assignment (procedural or in a for-loop header).
    Assignment {
        /// A compound operator, if any (`+=` etc.).
        op: Option<BinaryOp>,
        /// True for nonblocking `<=` assignments.
        nonblocking: bool,
        /// The target.
        target: Box<Expr>,
        /// The value.
        value: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// An element select `a[i]`.
    ElementSelect {
        /// The selected value.
        value: Box<Expr>,
        /// The index.
        selector: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A range select `a[msb:lsb]`, `a[i +: w]`, `a[i -: w]`.
    RangeSelect {
        /// The selected value.
        value: Box<Expr>,
        /// Which select form.
        kind: RangeSelectKind,
        /// The left/base expression.
        left: Box<Expr>,
        /// The right/width expression.
        right: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A member access `a.b`. Dotted hierarchical names parse as chains of
    /// member accesses; elaboration decides which is which.
    Member {
        /// The accessed value.
        value: Box<Expr>,
        /// The member name.
        name: Ident,
        /// The span of the member name.
        name_span: Span,
        /// The full span.
        span: Span,
    },
    /// A concatenation `{a, b}`.
    Concat {
        /// The operands.
        elements: Vec<Expr>,
        /// The full span.
        span: Span,
    },
    /// A replication `{n{a, b}}`.
    Replication {
        /// The replication count.
        count: Box<Expr>,
        /// The replicated concatenation.
        concat: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A subroutine call.
    Call {
        /// The call target.
        target: Box<Expr>,
        /// The arguments.
        args: Vec<Expr>,
        /// The full span.
        span: Span,
    },
    /// A system function call (`$clog2(...)`).
    SystemCall {
        /// The system function name (with the `$`).
        name: Ident,
        /// The arguments.
        args: Vec<Expr>,
        /// The full span.
        span: Span,
    },
    /// A cast `target'(operand)`.
    Cast {
        /// The cast target.
        target: CastTarget,
        /// The operand.
        operand: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A data type used in expression position (`$bits(logic[3:0])`,
    /// type parameter assignments).
    DataTypeExpr {
        /// The referenced type.
        ty: Box<DataType>,
        /// The full span.
        span: Span,
    },
    /// An assignment pattern.
    AssignmentPattern {
        /// The pattern kind.
        kind: PatternKind,
        /// A type prefix (`type_t'{...}`), if present.
        ty: Option<Box<DataType>>,
        /// The items.
        items: Vec<PatternItem>,
        /// The full span.
        span: Span,
    },
    /// A parenthesized expression.
    Paren {
        /// The inner expression.
        inner: Box<Expr>,
        /// The full span.
        span: Span,
    },
    /// A poison node from error recovery.
    Error {
        /// The span of the skipped text.
        span: Span,
    },
}

impl Expr {
    /// The span of the expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span }
            | Expr::SizedLiteral { span }
            | Expr::UnbasedUnsized { span }
            | Expr::RealLiteral { span }
            | Expr::TimeLiteral { span }
            | Expr::StringLiteral { span }
            | Expr::Null { span }
            | Expr::Identifier { span, .. }
            | Expr::Scoped { span, .. }
            | Expr::Root { span }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::ElementSelect { span, .. }
            | Expr::RangeSelect { span, .. }
            | Expr::Member { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Replication { span, .. }
            | Expr::Call { span, .. }
            | Expr::SystemCall { span, .. }
            | Expr::Cast { span, .. }
            | Expr::DataTypeExpr { span, .. }
            | Expr::AssignmentPattern { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Error { span } => *span,
        }
    }
}

/// The kind of a case statement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CaseKind {
    /// `case`
    Normal,
    /// `casex`
    DontCareXZ,
    /// `casez`
    DontCareZ,
}

/// One arm of a case statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseItem {
    /// The matching expressions; empty means `default`.
    pub expressions: Vec<Expr>,
    /// The arm body.
    pub body: Stmt,
    /// The span of the arm.
    pub span: Span,
}

/// A for-loop initializer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ForInit {
    /// `int i = 0`
    Decl {
        /// The loop variable type.
        ty: DataType,
        /// The loop variable name.
        name: Ident,
        /// The span of the name.
        name_span: Span,
        /// The initial value.
        init: Expr,
        /// The span of the initializer.
        span: Span,
    },
    /// `i = 0`
    Assign(Expr),
}

/// A statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Stmt {
    /// A begin/end block with an optional label.
    Block {
        /// The block label.
        label: Option<Ident>,
        /// The contained statements.
        items: Vec<Stmt>,
        /// The span of the block.
        span: Span,
    },
    /// A local variable declaration.
    VarDecl(DataDecl),
    /// An expression statement (assignment or call).
    ExprStmt {
        /// The expression.
        expr: Expr,
        /// The span of the statement.
        span: Span,
    },
    /// An if statement.
    If {
        /// The condition.
        cond: Expr,
        /// The then branch.
        then_stmt: Box<Stmt>,
        /// The else branch, if present.
        else_stmt: Option<Box<Stmt>>,
        /// The span of the statement.
        span: Span,
    },
    /// A case statement.
    Case {
        /// Which case keyword.
        kind: CaseKind,
        /// The selector.
        cond: Expr,
        /// The arms.
        items: Vec<CaseItem>,
        /// The span of the statement.
        span: Span,
    },
    /// A for loop.
    For {
        /// The initializers.
        inits: Vec<ForInit>,
        /// The stop condition, if present.
        stop: Option<Expr>,
        /// The step expressions.
        steps: Vec<Expr>,
        /// The body.
        body: Box<Stmt>,
        /// The span of the statement.
        span: Span,
    },
    /// A while loop.
    While {
        /// The condition.
        cond: Expr,
        /// The body.
        body: Box<Stmt>,
        /// The span of the statement.
        span: Span,
    },
    /// A repeat loop.
    Repeat {
        /// The repetition count.
        count: Expr,
        /// The body.
        body: Box<Stmt>,
        /// The span of the statement.
        span: Span,
    },
    /// A forever loop.
    Forever {
        /// The body.
        body: Box<Stmt>,
        /// The span of the statement.
        span: Span,
    },
    /// A return statement.
    Return {
        /// The returned value, if present.
        expr: Option<Expr>,
        /// The span of the statement.
        span: Span,
    },
    /// A break statement.
    Break {
        /// The span of the statement.
        span: Span,
    },
    /// A continue statement.
    Continue {
        /// The span of the statement.
        span: Span,
    },
    /// An event control (`@(...) stmt`); the sensitivity is kept as raw
    /// span only, since the front-end does not elaborate processes.
    EventControl {
        /// The span of the sensitivity list.
        sensitivity_span: Span,
        /// The controlled statement.
        body: Box<Stmt>,
        /// The span of the statement.
        span: Span,
    },
    /// A null statement (bare semicolon).
    Null {
        /// The span of the semicolon.
        span: Span,
    },
    /// A poison node from error recovery.
    Error {
        /// The span of the skipped text.
        span: Span,
    },
}

impl Stmt {
    /// The span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block { span, .. }
            | Stmt::ExprStmt { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Case { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::Forever { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::EventControl { span, .. }
            | Stmt::Null { span }
            | Stmt::Error { span } => *span,
            Stmt::VarDecl(d) => d.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_kind_from_text() {
        assert_eq!(NetKind::from_text("wire"), Some(NetKind::Wire));
        assert_eq!(NetKind::from_text("none"), Some(NetKind::None));
        assert_eq!(NetKind::from_text("logic"), None);
    }

    #[test]
    fn time_scale_value_parsing() {
        let v = TimeScaleValue::from_text("1ns").unwrap();
        assert_eq!(v.magnitude, 1);
        assert_eq!(v.unit, TimeUnit::Ns);

        let v = TimeScaleValue::from_text("100ps").unwrap();
        assert_eq!(v.magnitude, 100);
        assert_eq!(v.unit, TimeUnit::Ps);

        assert!(TimeScaleValue::from_text("2ns").is_none());
        assert!(TimeScaleValue::from_text("1xs").is_none());
    }

    #[test]
    fn fully_implicit_type() {
        let t = DataType::Implicit {
            signed: false,
            dims: vec![],
            span: Span::DUMMY,
        };
        assert!(t.is_fully_implicit());

        let t = DataType::Implicit {
            signed: true,
            dims: vec![],
            span: Span::DUMMY,
        };
        assert!(!t.is_fully_implicit());
    }

    #[test]
    fn time_unit_ordering() {
        assert!(TimeUnit::Fs < TimeUnit::Ps);
        assert!(TimeUnit::Ns < TimeUnit::S);
    }

    #[test]
    fn serde_roundtrip_expr() {
        let e = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::Literal { span: Span::DUMMY }),
            right: Box::new(Expr::Literal { span: Span::DUMMY }),
            span: Span::DUMMY,
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Expr::Binary { op: BinaryOp::Add, .. }));
    }
}
