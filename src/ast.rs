pub mod display;
pub mod navigate;

use crate::cuda::Builtin;
use crate::span::{Span, Spanned};

/// Identity of a variable, parameter or enumerator declaration.
///
/// Assigned once by the parser; two declarations that share a name in
/// different scopes always have different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// A parsed CUDA translation unit.
#[derive(Clone, Debug)]
pub struct File {
    pub items: Vec<Spanned<Item>>,
    /// Number of `DeclId`s handed out while parsing.
    pub decl_count: u32,
}

/// Top-level items.
#[derive(Clone, Debug)]
pub enum Item {
    /// An opaque preprocessor line, e.g. `#include <cuda.h>`.
    Directive(String),
    Function(FnDef),
    Vars(DeclGroup),
    Typedef(DeclGroup),
    Record(RecordDef),
    Enum(EnumDef),
    /// A stray `;` at file scope.
    Empty,
}

/// CUDA execution-space and memory-space attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CudaAttr {
    Global,
    Device,
    Host,
    Shared,
    Constant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Static,
    Extern,
    Inline,
}

#[derive(Clone, Debug)]
pub struct FnDef {
    pub cuda: Vec<CudaAttr>,
    pub storage: Vec<Storage>,
    pub return_ty: Type,
    pub name: Spanned<String>,
    pub params: Vec<VarDecl>,
    pub variadic: bool,
    pub body: Option<Spanned<Block>>,
}

impl FnDef {
    /// `__global__` or `__device__`: the body runs on the accelerator.
    pub fn runs_on_device(&self) -> bool {
        self.cuda
            .iter()
            .any(|a| matches!(a, CudaAttr::Global | CudaAttr::Device))
    }
}

/// One declaration statement: shared specifiers, one or more declarators.
#[derive(Clone, Debug)]
pub struct DeclGroup {
    pub cuda: Vec<CudaAttr>,
    pub storage: Vec<Storage>,
    pub vars: Vec<VarDecl>,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub id: DeclId,
    pub name: Spanned<String>,
    pub ty: Type,
    /// Source range of this declarator's type: the shared specifiers plus
    /// its own `*`s. Empty for declarators without a written type.
    pub type_span: Span,
    /// True for every declarator of `float *a, *b;`: the specifiers are
    /// written once for the whole group.
    pub shares_specifiers: bool,
    pub init: Option<Initializer>,
}

#[derive(Clone, Debug)]
pub enum Initializer {
    /// `T x = expr;` or `T x = { ... };`
    Assign(Spanned<Expr>),
    /// `dim3 grid(2, 1);`
    Construct(Spanned<Vec<Spanned<Expr>>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

#[derive(Clone, Debug)]
pub struct RecordDef {
    pub kind: RecordKind,
    pub name: Option<Spanned<String>>,
    pub fields: Vec<VarDecl>,
    /// Variables declared after the closing brace: `struct P { ... } p;`
    pub vars: Vec<VarDecl>,
}

#[derive(Clone, Debug)]
pub struct EnumDef {
    pub name: Option<Spanned<String>>,
    pub variants: Vec<Enumerator>,
    /// Variables declared after the closing brace: `enum Mode { A, B } m;`
    pub vars: Vec<VarDecl>,
}

#[derive(Clone, Debug)]
pub struct Enumerator {
    pub id: DeclId,
    pub name: Spanned<String>,
    pub value: Option<Spanned<Expr>>,
}

/// A declared type as written in source.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Type {
    /// Qualifier and specifier words in source order: `const unsigned int`.
    pub base: Vec<String>,
    /// Levels of pointer indirection.
    pub pointers: usize,
    /// Array extents as written; `None` for `[]`.
    pub arrays: Vec<Option<String>>,
}

impl Type {
    pub fn named(name: &str) -> Self {
        Self {
            base: vec![name.to_string()],
            pointers: 0,
            arrays: Vec::new(),
        }
    }

    pub fn is_pointer(&self) -> bool {
        self.pointers > 0
    }

    /// The unqualified specifier name, e.g. `dim3` for `const dim3`.
    pub fn specifier(&self) -> Option<&str> {
        self.base
            .iter()
            .map(String::as_str)
            .find(|w| !matches!(*w, "const" | "volatile"))
    }
}

/// A braced block of statements; the span covers both braces.
#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Decl(DeclGroup),
    Expr(Spanned<Expr>),
    Block(Block),
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        cond: Spanned<Expr>,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<Spanned<Expr>>,
        step: Option<Spanned<Expr>>,
        body: Box<Spanned<Stmt>>,
    },
    Switch {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Case(Spanned<Expr>),
    Default,
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
    Empty,
}

/// What an identifier reference denotes, filled in by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Variable(DeclId),
    Enumerator(DeclId),
    Function,
    Builtin(Builtin),
    /// Declared outside this file (a header the front-end does not read).
    External,
}

#[derive(Clone, Debug)]
pub struct Ident {
    pub name: String,
    pub resolution: Resolution,
}

impl Ident {
    pub fn new(name: String) -> Self {
        Self {
            name,
            resolution: Resolution::Unresolved,
        }
    }

    /// The variable declaration this reference binds to, if any.
    pub fn variable(&self) -> Option<DeclId> {
        match self.resolution {
            Resolution::Variable(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    IntLit(u64),
    FloatLit(String),
    StrLit(String),
    CharLit(String),
    Ident(Ident),
    Member {
        base: Box<Spanned<Expr>>,
        member: Spanned<String>,
        arrow: bool,
    },
    Index {
        base: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    /// `kernel<<<grid, block>>>(args)`
    Launch {
        kernel: Box<Spanned<Expr>>,
        config: Vec<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    /// Functional construction of a named type: `dim3(2, 1, 1)`.
    Construct {
        ty: Spanned<Type>,
        args: Vec<Spanned<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Assign {
        op: AssignOp,
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    Conditional {
        cond: Box<Spanned<Expr>>,
        then_expr: Box<Spanned<Expr>>,
        else_expr: Box<Spanned<Expr>>,
    },
    Cast {
        ty: Spanned<Type>,
        expr: Box<Spanned<Expr>>,
    },
    SizeofType(Spanned<Type>),
    SizeofExpr(Box<Spanned<Expr>>),
    Paren(Box<Spanned<Expr>>),
    InitList(Vec<Spanned<Expr>>),
}

impl Expr {
    /// The callee name of a direct call: `foo` in `foo(1)`.
    pub fn callee_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Call { callee, .. } => match &callee.node {
                Expr::Ident(ident) => Some(ident),
                _ => None,
            },
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren(inner) => inner.node.unparen(),
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Comma,
}

impl BinOp {
    /// Returns (left binding power, right binding power).
    /// Higher binding power = higher precedence; all C binary operators
    /// are left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        match self {
            BinOp::Comma => (1, 2),
            BinOp::Or => (3, 4),
            BinOp::And => (5, 6),
            BinOp::BitOr => (7, 8),
            BinOp::BitXor => (9, 10),
            BinOp::BitAnd => (11, 12),
            BinOp::Eq | BinOp::Ne => (13, 14),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => (15, 16),
            BinOp::Shl | BinOp::Shr => (17, 18),
            BinOp::Add | BinOp::Sub => (19, 20),
            BinOp::Mul | BinOp::Div | BinOp::Rem => (21, 22),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinOp),
}
