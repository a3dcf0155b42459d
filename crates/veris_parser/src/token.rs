//! Token types for the SystemVerilog lexer and preprocessor.
//!
//! Defines the [`TokenKind`] enum covering keywords, operators,
//! punctuation, literals, and preprocessor directives, plus the [`Token`]
//! struct pairing a token kind with its source [`Span`], leading trivia,
//! and (for macro-expanded tokens) the invocation site. Literal values are
//! not stored in the token; they are recovered from the source text using
//! the token's span.

use serde::{Deserialize, Serialize};
use veris_source::Span;

/// A SystemVerilog token kind.
///
/// Keywords are case-sensitive. Raw identifier tokens produced by the lexer
/// are mapped to keyword kinds by the preprocessor, which owns the active
/// keyword table (`begin_keywords` can swap it mid-stream).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    // === Declarations and structure ===
    /// `module`
    Module,
    /// `endmodule`
    Endmodule,
    /// `macromodule`
    Macromodule,
    /// `interface`
    Interface,
    /// `endinterface`
    Endinterface,
    /// `program`
    Program,
    /// `endprogram`
    Endprogram,
    /// `package`
    Package,
    /// `endpackage`
    Endpackage,
    /// `import`
    Import,
    /// `export`
    Export,
    /// `parameter`
    Parameter,
    /// `localparam`
    Localparam,
    /// `defparam`
    Defparam,
    /// `typedef`
    Typedef,
    /// `enum`
    Enum,
    /// `struct`
    Struct,
    /// `union`
    Union,
    /// `packed`
    Packed,
    /// `tagged`
    Tagged,
    /// `signed`
    Signed,
    /// `unsigned`
    Unsigned,
    /// `genvar`
    Genvar,
    /// `generate`
    Generate,
    /// `endgenerate`
    Endgenerate,
    /// `modport`
    Modport,
    /// `function`
    Function,
    /// `endfunction`
    Endfunction,
    /// `task`
    Task,
    /// `endtask`
    Endtask,
    /// `automatic`
    Automatic,
    /// `static`
    Static,
    /// `const`
    Const,
    /// `var`
    Var,
    /// `type`
    Type,
    /// `timeunit`
    Timeunit,
    /// `timeprecision`
    Timeprecision,

    // === Data types ===
    /// `logic`
    Logic,
    /// `bit`
    Bit,
    /// `reg`
    Reg,
    /// `byte`
    Byte,
    /// `shortint`
    Shortint,
    /// `int`
    Int,
    /// `longint`
    Longint,
    /// `integer`
    Integer,
    /// `time`
    Time,
    /// `real`
    Real,
    /// `shortreal`
    Shortreal,
    /// `realtime`
    Realtime,
    /// `string`
    String,
    /// `chandle`
    Chandle,
    /// `event`
    Event,
    /// `void`
    Void,
    /// `null`
    Null,

    // === Nets ===
    /// `wire`
    Wire,
    /// `wand`
    Wand,
    /// `wor`
    Wor,
    /// `tri`
    Tri,
    /// `triand`
    Triand,
    /// `trior`
    Trior,
    /// `tri0`
    Tri0,
    /// `tri1`
    Tri1,
    /// `trireg`
    Trireg,
    /// `supply0`
    Supply0,
    /// `supply1`
    Supply1,
    /// `uwire`
    Uwire,

    // === Ports ===
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
    /// `ref`
    Ref,

    // === Statements ===
    /// `begin`
    Begin,
    /// `end`
    End,
    /// `if`
    If,
    /// `else`
    Else,
    /// `case`
    Case,
    /// `casex`
    Casex,
    /// `casez`
    Casez,
    /// `endcase`
    Endcase,
    /// `default`
    Default,
    /// `for`
    For,
    /// `while`
    While,
    /// `do`
    Do,
    /// `repeat`
    Repeat,
    /// `forever`
    Forever,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `assign`
    Assign,
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
    /// `posedge`
    Posedge,
    /// `negedge`
    Negedge,
    /// `unique`
    Unique,
    /// `priority`
    Priority,
    /// `disable`
    Disable,
    /// `wait`
    Wait,

    // === Literals ===
    /// Plain integer literal (e.g., `42`)
    IntLiteral,
    /// Sized/based literal (e.g., `4'b1010`, `'hFF`, `16'shA5`)
    SizedLiteral,
    /// Unbased unsized literal (`'0`, `'1`, `'x`, `'z`)
    UnbasedUnsizedLiteral,
    /// Real literal (e.g., `3.5`, `1.0e-3`)
    RealLiteral,
    /// Time literal (e.g., `1ns`, `100ps`)
    TimeLiteral,
    /// String literal (e.g., `"hello"`)
    StringLiteral,

    // === Operators and punctuation ===
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `'{` (assignment pattern opener)
    ApostropheBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `::` (scope resolution)
    ColonColon,
    /// `.`
    Dot,
    /// `#`
    Hash,
    /// `@`
    At,
    /// `$`
    Dollar,
    /// `=`
    Equals,
    /// `==`
    DoubleEquals,
    /// `!=`
    BangEquals,
    /// `===`
    TripleEquals,
    /// `!==`
    BangDoubleEquals,
    /// `==?` (wildcard equality)
    WildcardEq,
    /// `!=?` (wildcard inequality)
    WildcardNeq,
    /// `<`
    LessThan,
    /// `<=`
    LessEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEquals,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Ampersand,
    /// `&&`
    DoubleAmpersand,
    /// `|`
    Pipe,
    /// `||`
    DoublePipe,
    /// `^`
    Caret,
    /// `~^` or `^~` (XNOR)
    TildeCaret,
    /// `~`
    Tilde,
    /// `~&` (reduction NAND)
    TildeAmpersand,
    /// `~|` (reduction NOR)
    TildePipe,
    /// `!`
    Bang,
    /// `<<`
    DoubleLess,
    /// `>>`
    DoubleGreater,
    /// `<<<`
    TripleLess,
    /// `>>>`
    TripleGreater,
    /// `?`
    Question,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `+=`
    PlusEquals,
    /// `-=`
    MinusEquals,
    /// `*=`
    StarEquals,
    /// `/=`
    SlashEquals,
    /// `%=`
    PercentEquals,
    /// `&=`
    AmpersandEquals,
    /// `|=`
    PipeEquals,
    /// `^=`
    CaretEquals,
    /// `<<=`
    DoubleLessEquals,
    /// `>>=`
    DoubleGreaterEquals,
    /// `<<<=`
    TripleLessEquals,
    /// `>>>=`
    TripleGreaterEquals,
    /// `->` (logical implication / event trigger)
    Arrow,
    /// `<->` (logical equivalence)
    LeftRightArrow,
    /// `+:` (indexed part select up)
    PlusColon,
    /// `-:` (indexed part select down)
    MinusColon,
    /// `'` (tick, used for casts like `type'(expr)`)
    Tick,

    // === Identifiers and special ===
    /// A regular identifier
    Identifier,
    /// An escaped identifier (e.g., `\my+signal `)
    EscapedIdentifier,
    /// A system identifier (e.g., `$display`, `$clog2`)
    SystemIdentifier,
    /// A backtick directive or macro usage (span covers `` `name ``)
    Directive,
    /// A line comment (emitted by the lexer, converted to trivia)
    LineComment,
    /// A block comment (emitted by the lexer, converted to trivia)
    BlockComment,
    /// End of file; repeats indefinitely
    Eof,
    /// Lexer error — unrecognized or malformed token
    Error,
}

impl TokenKind {
    /// Returns `true` if this token is a port direction keyword.
    pub fn is_direction(self) -> bool {
        matches!(
            self,
            TokenKind::Input | TokenKind::Output | TokenKind::Inout | TokenKind::Ref
        )
    }

    /// Returns `true` if this token is a built-in net type keyword.
    pub fn is_net_type(self) -> bool {
        matches!(
            self,
            TokenKind::Wire
                | TokenKind::Wand
                | TokenKind::Wor
                | TokenKind::Tri
                | TokenKind::Triand
                | TokenKind::Trior
                | TokenKind::Tri0
                | TokenKind::Tri1
                | TokenKind::Trireg
                | TokenKind::Supply0
                | TokenKind::Supply1
                | TokenKind::Uwire
        )
    }

    /// Returns `true` if this token begins a data type.
    pub fn is_data_type_start(self) -> bool {
        matches!(
            self,
            TokenKind::Logic
                | TokenKind::Bit
                | TokenKind::Reg
                | TokenKind::Byte
                | TokenKind::Shortint
                | TokenKind::Int
                | TokenKind::Longint
                | TokenKind::Integer
                | TokenKind::Time
                | TokenKind::Real
                | TokenKind::Shortreal
                | TokenKind::Realtime
                | TokenKind::String
                | TokenKind::Chandle
                | TokenKind::Event
                | TokenKind::Void
                | TokenKind::Enum
                | TokenKind::Struct
                | TokenKind::Union
        )
    }

    /// Returns `true` if this token is a compound assignment operator.
    pub fn is_compound_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::DoubleLessEquals
                | TokenKind::DoubleGreaterEquals
                | TokenKind::TripleLessEquals
                | TokenKind::TripleGreaterEquals
        )
    }
}

/// Which keyword table the preprocessor consults.
///
/// `begin_keywords "1364-2005"` restricts the stream to the Verilog-2005
/// keyword set until the matching `end_keywords`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum KeywordVersion {
    /// IEEE 1364-2005 (classic Verilog) keywords only.
    V1364_2005,
    /// The full IEEE 1800-2017 SystemVerilog keyword set.
    V1800_2017,
}

impl KeywordVersion {
    /// Parses the version string used by `begin_keywords`.
    pub fn from_version_text(text: &str) -> Option<Self> {
        match text {
            "1364-1995" | "1364-2001" | "1364-2001-noconfig" | "1364-2005" => {
                Some(KeywordVersion::V1364_2005)
            }
            "1800-2005" | "1800-2009" | "1800-2012" | "1800-2017" => {
                Some(KeywordVersion::V1800_2017)
            }
            _ => None,
        }
    }
}

/// Looks up a keyword in the given keyword table.
///
/// Returns `None` if the string is a regular identifier under that table.
/// Keywords are case-sensitive.
pub fn lookup_keyword(s: &str, version: KeywordVersion) -> Option<TokenKind> {
    let kind = lookup_keyword_sv(s)?;
    if version == KeywordVersion::V1364_2005 && !is_v2005_keyword(kind) {
        return None;
    }
    Some(kind)
}

fn lookup_keyword_sv(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match s {
        "module" => Module,
        "endmodule" => Endmodule,
        "macromodule" => Macromodule,
        "interface" => Interface,
        "endinterface" => Endinterface,
        "program" => Program,
        "endprogram" => Endprogram,
        "package" => Package,
        "endpackage" => Endpackage,
        "import" => Import,
        "export" => Export,
        "parameter" => Parameter,
        "localparam" => Localparam,
        "defparam" => Defparam,
        "typedef" => Typedef,
        "enum" => Enum,
        "struct" => Struct,
        "union" => Union,
        "packed" => Packed,
        "tagged" => Tagged,
        "signed" => Signed,
        "unsigned" => Unsigned,
        "genvar" => Genvar,
        "generate" => Generate,
        "endgenerate" => Endgenerate,
        "modport" => Modport,
        "function" => Function,
        "endfunction" => Endfunction,
        "task" => Task,
        "endtask" => Endtask,
        "automatic" => Automatic,
        "static" => Static,
        "const" => Const,
        "var" => Var,
        "type" => Type,
        "timeunit" => Timeunit,
        "timeprecision" => Timeprecision,
        "logic" => Logic,
        "bit" => Bit,
        "reg" => Reg,
        "byte" => Byte,
        "shortint" => Shortint,
        "int" => Int,
        "longint" => Longint,
        "integer" => Integer,
        "time" => Time,
        "real" => Real,
        "shortreal" => Shortreal,
        "realtime" => Realtime,
        "string" => String,
        "chandle" => Chandle,
        "event" => Event,
        "void" => Void,
        "null" => Null,
        "wire" => Wire,
        "wand" => Wand,
        "wor" => Wor,
        "tri" => Tri,
        "triand" => Triand,
        "trior" => Trior,
        "tri0" => Tri0,
        "tri1" => Tri1,
        "trireg" => Trireg,
        "supply0" => Supply0,
        "supply1" => Supply1,
        "uwire" => Uwire,
        "input" => Input,
        "output" => Output,
        "inout" => Inout,
        "ref" => Ref,
        "begin" => Begin,
        "end" => End,
        "if" => If,
        "else" => Else,
        "case" => Case,
        "casex" => Casex,
        "casez" => Casez,
        "endcase" => Endcase,
        "default" => Default,
        "for" => For,
        "while" => While,
        "do" => Do,
        "repeat" => Repeat,
        "forever" => Forever,
        "return" => Return,
        "break" => Break,
        "continue" => Continue,
        "assign" => Assign,
        "always" => Always,
        "always_comb" => AlwaysComb,
        "always_ff" => AlwaysFf,
        "always_latch" => AlwaysLatch,
        "initial" => Initial,
        "final" => Final,
        "posedge" => Posedge,
        "negedge" => Negedge,
        "unique" => Unique,
        "priority" => Priority,
        "disable" => Disable,
        "wait" => Wait,
        _ => return None,
    };
    Some(kind)
}

fn is_v2005_keyword(kind: TokenKind) -> bool {
    use TokenKind::*;
    !matches!(
        kind,
        Interface
            | Endinterface
            | Program
            | Endprogram
            | Package
            | Endpackage
            | Import
            | Export
            | Typedef
            | Enum
            | Struct
            | Union
            | Packed
            | Tagged
            | Logic
            | Bit
            | Byte
            | Shortint
            | Int
            | Longint
            | Shortreal
            | String
            | Chandle
            | Void
            | Null
            | Ref
            | AlwaysComb
            | AlwaysFf
            | AlwaysLatch
            | Final
            | Unique
            | Priority
            | Return
            | Break
            | Continue
            | Do
            | Const
            | Var
            | Type
            | Timeunit
            | Timeprecision
            | Modport
            | Uwire
    )
}

/// The preprocessor directives recognized after a backtick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `` `define ``
    Define,
    /// `` `undef ``
    Undef,
    /// `` `undefineall ``
    UndefineAll,
    /// `` `resetall ``
    ResetAll,
    /// `` `include ``
    Include,
    /// `` `ifdef ``
    IfDef,
    /// `` `ifndef ``
    IfNDef,
    /// `` `elsif ``
    ElsIf,
    /// `` `else ``
    Else,
    /// `` `endif ``
    EndIf,
    /// `` `timescale ``
    Timescale,
    /// `` `default_nettype ``
    DefaultNetType,
    /// `` `begin_keywords ``
    BeginKeywords,
    /// `` `end_keywords ``
    EndKeywords,
    /// Not a built-in directive: a macro usage.
    MacroUsage,
}

/// Classifies the text after a backtick as a directive or macro usage.
pub fn directive_kind(name: &str) -> DirectiveKind {
    match name {
        "define" => DirectiveKind::Define,
        "undef" => DirectiveKind::Undef,
        "undefineall" => DirectiveKind::UndefineAll,
        "resetall" => DirectiveKind::ResetAll,
        "include" => DirectiveKind::Include,
        "ifdef" => DirectiveKind::IfDef,
        "ifndef" => DirectiveKind::IfNDef,
        "elsif" => DirectiveKind::ElsIf,
        "else" => DirectiveKind::Else,
        "endif" => DirectiveKind::EndIf,
        "timescale" => DirectiveKind::Timescale,
        "default_nettype" => DirectiveKind::DefaultNetType,
        "begin_keywords" => DirectiveKind::BeginKeywords,
        "end_keywords" => DirectiveKind::EndKeywords,
        _ => DirectiveKind::MacroUsage,
    }
}

/// A range into the preprocessed stream's trivia table.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TriviaSlice {
    /// Index of the first trivia entry.
    pub start: u32,
    /// Number of trivia entries.
    pub len: u32,
}

/// A piece of leading trivia attached to a token.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Trivia {
    /// A `//` comment.
    LineComment(Span),
    /// A `/* */` comment.
    BlockComment(Span),
    /// A preprocessor directive that was consumed at this point.
    Directive(DirectiveKind, Span),
}

/// A lexed token with its kind and source location.
///
/// Tokens produced by macro expansion keep the span of the macro body text
/// (their lexical origin) and additionally record the invocation site in
/// `expansion_site`, so every token can be traced through expansion back to
/// original text.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The kind of this token.
    pub kind: TokenKind,
    /// The source span covering this token's text.
    pub span: Span,
    /// For macro-expanded tokens, the span of the invocation site.
    pub expansion_site: Option<Span>,
    /// The token's leading trivia.
    pub trivia: TriviaSlice,
}

impl Token {
    /// Creates a token with no expansion origin and no trivia.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            expansion_site: None,
            trivia: TriviaSlice::default(),
        }
    }

    /// The span a diagnostic should point at: the invocation site for
    /// macro-expanded tokens, the token's own span otherwise.
    pub fn report_span(&self) -> Span {
        self.expansion_site.unwrap_or(self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_case_sensitive() {
        assert_eq!(
            lookup_keyword("module", KeywordVersion::V1800_2017),
            Some(TokenKind::Module)
        );
        assert_eq!(lookup_keyword("Module", KeywordVersion::V1800_2017), None);
    }

    #[test]
    fn sv_keywords_not_in_2005_table() {
        assert_eq!(
            lookup_keyword("logic", KeywordVersion::V1800_2017),
            Some(TokenKind::Logic)
        );
        assert_eq!(lookup_keyword("logic", KeywordVersion::V1364_2005), None);
        assert_eq!(
            lookup_keyword("wire", KeywordVersion::V1364_2005),
            Some(TokenKind::Wire)
        );
    }

    #[test]
    fn keyword_version_parsing() {
        assert_eq!(
            KeywordVersion::from_version_text("1800-2017"),
            Some(KeywordVersion::V1800_2017)
        );
        assert_eq!(
            KeywordVersion::from_version_text("1364-2005"),
            Some(KeywordVersion::V1364_2005)
        );
        assert_eq!(KeywordVersion::from_version_text("2022"), None);
    }

    #[test]
    fn directive_classification() {
        assert_eq!(directive_kind("define"), DirectiveKind::Define);
        assert_eq!(directive_kind("include"), DirectiveKind::Include);
        assert_eq!(directive_kind("MY_MACRO"), DirectiveKind::MacroUsage);
    }

    #[test]
    fn direction_predicate() {
        assert!(TokenKind::Input.is_direction());
        assert!(TokenKind::Ref.is_direction());
        assert!(!TokenKind::Wire.is_direction());
    }

    #[test]
    fn net_type_predicate() {
        assert!(TokenKind::Wire.is_net_type());
        assert!(TokenKind::Supply1.is_net_type());
        assert!(!TokenKind::Logic.is_net_type());
    }

    #[test]
    fn data_type_start_predicate() {
        assert!(TokenKind::Logic.is_data_type_start());
        assert!(TokenKind::Struct.is_data_type_start());
        assert!(!TokenKind::Wire.is_data_type_start());
    }

    #[test]
    fn report_span_prefers_expansion_site() {
        use veris_source::FileId;
        let body = Span::new(FileId::from_raw(0), 10, 12);
        let site = Span::new(FileId::from_raw(0), 50, 55);
        let mut tok = Token::new(TokenKind::IntLiteral, body);
        assert_eq!(tok.report_span(), body);
        tok.expansion_site = Some(site);
        assert_eq!(tok.report_span(), site);
    }
}
