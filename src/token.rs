use serde::{Deserialize, Serialize};

/// One pre-lexed token. The stream is produced upstream; the parser never
/// mutates it and only ever looks a bounded number of tokens ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token<'src> {
    pub kind: TokenKind,
    #[serde(borrow, default)]
    pub text: &'src str,
    #[serde(default = "default_line")]
    pub line: u32,
}

fn default_line() -> u32 {
    1
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, line: u32) -> Self {
        Self { kind, text, line }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    Function,
    ExternFunction,
    Class,
    Extends,
    Namespace,
    Use,
    As,
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Try,
    Catch,
    Throw,
    Echo,
    Print,
    Exit,
    Require,
    RequireOnce,
    Global,
    Static,
    Var,
    Const,
    New,
    Isset,
    Unset,
    VarDump,
    Define,
    Defined,
    List,
    Tuple,
    Array,
    Public,
    Private,
    Protected,
    Throws,
    Resumable,
    Auto,
    True,
    False,
    Null,
    Exception,

    // Magic constants
    MagicLine,
    MagicFile,
    MagicFunction,

    // Literals and names
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    Variable,
    Identifier,

    // Explicit conversions
    ConvInt,
    ConvBool,
    ConvFloat,
    ConvString,
    ConvArray,

    // Interpolated string structure
    StrBegin,
    StrFragment,
    ExprBegin,
    ExprEnd,
    StrEnd,

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Dot,
    Inc,
    Dec,
    Eq,
    PlusEq,
    MinusEq,
    MulEq,
    DivEq,
    ModEq,
    DotEq,
    AndEq,
    OrEq,
    XorEq,
    ShlEq,
    ShrEq,
    EqEq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    Bang,
    Question,
    Colon,
    DoubleArrow,
    Arrow,
    At,

    // Type-rule introducers
    TripleColon,
    TripleEq,
    TripleLt,
    TripleGt,

    // Punctuation
    SemiColon,
    Comma,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,

    // Stream terminator; exactly one, last
    End,
}

impl TokenKind {
    /// Tokens that may start an access-modified class member declaration.
    pub fn is_access_modifier(self) -> bool {
        matches!(self, TokenKind::Public | TokenKind::Private | TokenKind::Protected)
    }
}
