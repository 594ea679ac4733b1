/// All lexemes of the CUDA C subset the translator understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Type specifier keywords
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Bool,

    // Qualifiers and storage classes
    Const,
    Volatile,
    Restrict,
    Static,
    Extern,
    Inline,

    // Aggregate and alias declarations
    Struct,
    Union,
    Enum,
    Typedef,

    // Statement keywords
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Sizeof,

    // CUDA execution-space and memory-space qualifiers
    CudaGlobal,   // __global__
    CudaDevice,   // __device__
    CudaHost,     // __host__
    CudaShared,   // __shared__
    CudaConstant, // __constant__

    // Symbols
    LParen,      // (
    RParen,      // )
    LBrace,      // {
    RBrace,      // }
    LBracket,    // [
    RBracket,    // ]
    Comma,       // ,
    Semicolon,   // ;
    Colon,       // :
    Question,    // ?
    Dot,         // .
    Arrow,       // ->
    Ellipsis,    // ...
    Plus,        // +
    Minus,       // -
    Star,        // *
    Slash,       // /
    Percent,     // %
    Amp,         // &
    Pipe,        // |
    Caret,       // ^
    Tilde,       // ~
    Bang,        // !
    PlusPlus,    // ++
    MinusMinus,  // --
    Shl,         // <<
    Shr,         // >>
    Lt,          // <
    Gt,          // >
    Le,          // <=
    Ge,          // >=
    EqEq,        // ==
    Ne,          // !=
    AmpAmp,      // &&
    PipePipe,    // ||
    Eq,          // =
    PlusEq,      // +=
    MinusEq,     // -=
    StarEq,      // *=
    SlashEq,     // /=
    PercentEq,   // %=
    AmpEq,       // &=
    PipeEq,      // |=
    CaretEq,     // ^=
    ShlEq,       // <<=
    ShrEq,       // >>=
    LaunchOpen,  // <<<
    LaunchClose, // >>>

    // Literals
    Integer(u64),
    FloatLit(String),
    Str(String),
    CharLit(String),
    Ident(String),

    // A whole preprocessor line, kept opaque: `#include <stdio.h>`
    Directive(String),

    // End of file
    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword lexeme.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "void" => Some(Lexeme::Void),
            "char" => Some(Lexeme::Char),
            "short" => Some(Lexeme::Short),
            "int" => Some(Lexeme::Int),
            "long" => Some(Lexeme::Long),
            "float" => Some(Lexeme::Float),
            "double" => Some(Lexeme::Double),
            "signed" => Some(Lexeme::Signed),
            "unsigned" => Some(Lexeme::Unsigned),
            "bool" | "_Bool" => Some(Lexeme::Bool),
            "const" => Some(Lexeme::Const),
            "volatile" => Some(Lexeme::Volatile),
            "restrict" | "__restrict__" | "__restrict" => Some(Lexeme::Restrict),
            "static" => Some(Lexeme::Static),
            "extern" => Some(Lexeme::Extern),
            "inline" | "__inline__" | "__forceinline__" | "__noinline__" => Some(Lexeme::Inline),
            "struct" => Some(Lexeme::Struct),
            "union" => Some(Lexeme::Union),
            "enum" => Some(Lexeme::Enum),
            "typedef" => Some(Lexeme::Typedef),
            "if" => Some(Lexeme::If),
            "else" => Some(Lexeme::Else),
            "for" => Some(Lexeme::For),
            "while" => Some(Lexeme::While),
            "do" => Some(Lexeme::Do),
            "switch" => Some(Lexeme::Switch),
            "case" => Some(Lexeme::Case),
            "default" => Some(Lexeme::Default),
            "return" => Some(Lexeme::Return),
            "break" => Some(Lexeme::Break),
            "continue" => Some(Lexeme::Continue),
            "sizeof" => Some(Lexeme::Sizeof),
            "__global__" => Some(Lexeme::CudaGlobal),
            "__device__" => Some(Lexeme::CudaDevice),
            "__host__" => Some(Lexeme::CudaHost),
            "__shared__" => Some(Lexeme::CudaShared),
            "__constant__" => Some(Lexeme::CudaConstant),
            _ => None,
        }
    }

    /// Built-in type specifier keyword (`int`, `unsigned`, ...).
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Lexeme::Void
                | Lexeme::Char
                | Lexeme::Short
                | Lexeme::Int
                | Lexeme::Long
                | Lexeme::Float
                | Lexeme::Double
                | Lexeme::Signed
                | Lexeme::Unsigned
                | Lexeme::Bool
        )
    }

    /// Keyword that can only start a declaration.
    pub fn starts_declaration(&self) -> bool {
        self.is_type_keyword()
            || matches!(
                self,
                Lexeme::Const
                    | Lexeme::Volatile
                    | Lexeme::Static
                    | Lexeme::Extern
                    | Lexeme::Inline
                    | Lexeme::Struct
                    | Lexeme::Union
                    | Lexeme::Enum
                    | Lexeme::Typedef
                    | Lexeme::CudaGlobal
                    | Lexeme::CudaDevice
                    | Lexeme::CudaHost
                    | Lexeme::CudaShared
                    | Lexeme::CudaConstant
            )
    }

    /// Human-readable description for error messages.
    pub fn description(&self) -> String {
        match self {
            Lexeme::Integer(n) => format!("integer literal '{}'", n),
            Lexeme::FloatLit(s) => format!("float literal '{}'", s),
            Lexeme::Str(_) => "string literal".to_string(),
            Lexeme::CharLit(_) => "character literal".to_string(),
            Lexeme::Ident(s) => format!("identifier '{}'", s),
            Lexeme::Directive(_) => "preprocessor directive".to_string(),
            Lexeme::Eof => "end of file".to_string(),
            other => format!("'{}'", other.spelling()),
        }
    }

    /// Source spelling of keyword and symbol lexemes.
    pub fn spelling(&self) -> &'static str {
        match self {
            Lexeme::Void => "void",
            Lexeme::Char => "char",
            Lexeme::Short => "short",
            Lexeme::Int => "int",
            Lexeme::Long => "long",
            Lexeme::Float => "float",
            Lexeme::Double => "double",
            Lexeme::Signed => "signed",
            Lexeme::Unsigned => "unsigned",
            Lexeme::Bool => "bool",
            Lexeme::Const => "const",
            Lexeme::Volatile => "volatile",
            Lexeme::Restrict => "restrict",
            Lexeme::Static => "static",
            Lexeme::Extern => "extern",
            Lexeme::Inline => "inline",
            Lexeme::Struct => "struct",
            Lexeme::Union => "union",
            Lexeme::Enum => "enum",
            Lexeme::Typedef => "typedef",
            Lexeme::If => "if",
            Lexeme::Else => "else",
            Lexeme::For => "for",
            Lexeme::While => "while",
            Lexeme::Do => "do",
            Lexeme::Switch => "switch",
            Lexeme::Case => "case",
            Lexeme::Default => "default",
            Lexeme::Return => "return",
            Lexeme::Break => "break",
            Lexeme::Continue => "continue",
            Lexeme::Sizeof => "sizeof",
            Lexeme::CudaGlobal => "__global__",
            Lexeme::CudaDevice => "__device__",
            Lexeme::CudaHost => "__host__",
            Lexeme::CudaShared => "__shared__",
            Lexeme::CudaConstant => "__constant__",
            Lexeme::LParen => "(",
            Lexeme::RParen => ")",
            Lexeme::LBrace => "{",
            Lexeme::RBrace => "}",
            Lexeme::LBracket => "[",
            Lexeme::RBracket => "]",
            Lexeme::Comma => ",",
            Lexeme::Semicolon => ";",
            Lexeme::Colon => ":",
            Lexeme::Question => "?",
            Lexeme::Dot => ".",
            Lexeme::Arrow => "->",
            Lexeme::Ellipsis => "...",
            Lexeme::Plus => "+",
            Lexeme::Minus => "-",
            Lexeme::Star => "*",
            Lexeme::Slash => "/",
            Lexeme::Percent => "%",
            Lexeme::Amp => "&",
            Lexeme::Pipe => "|",
            Lexeme::Caret => "^",
            Lexeme::Tilde => "~",
            Lexeme::Bang => "!",
            Lexeme::PlusPlus => "++",
            Lexeme::MinusMinus => "--",
            Lexeme::Shl => "<<",
            Lexeme::Shr => ">>",
            Lexeme::Lt => "<",
            Lexeme::Gt => ">",
            Lexeme::Le => "<=",
            Lexeme::Ge => ">=",
            Lexeme::EqEq => "==",
            Lexeme::Ne => "!=",
            Lexeme::AmpAmp => "&&",
            Lexeme::PipePipe => "||",
            Lexeme::Eq => "=",
            Lexeme::PlusEq => "+=",
            Lexeme::MinusEq => "-=",
            Lexeme::StarEq => "*=",
            Lexeme::SlashEq => "/=",
            Lexeme::PercentEq => "%=",
            Lexeme::AmpEq => "&=",
            Lexeme::PipeEq => "|=",
            Lexeme::CaretEq => "^=",
            Lexeme::ShlEq => "<<=",
            Lexeme::ShrEq => ">>=",
            Lexeme::LaunchOpen => "<<<",
            Lexeme::LaunchClose => ">>>",
            Lexeme::Integer(_)
            | Lexeme::FloatLit(_)
            | Lexeme::Str(_)
            | Lexeme::CharLit(_)
            | Lexeme::Ident(_)
            | Lexeme::Directive(_)
            | Lexeme::Eof => "",
        }
    }
}
