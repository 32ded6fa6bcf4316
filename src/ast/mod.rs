pub mod printer;

use std::fmt;

use serde::Serialize;

/// A parsed source file with all includes spliced in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    pub declarations: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Block(BlockStmt),
    Expression(ExprStmt),
    VarDecl(VarDecl),
    Return(ReturnStmt),
    If(IfStmt),
    While(WhileStmt),
    Break { line: usize },
    Continue { line: usize },
    FuncDecl(FuncDecl),
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Self::Block(s) => s.line,
            Self::Expression(s) => s.line,
            Self::VarDecl(s) => s.line,
            Self::Return(s) => s.line,
            Self::If(s) => s.line,
            Self::While(s) => s.line,
            Self::Break { line } | Self::Continue { line } => *line,
            Self::FuncDecl(s) => s.line,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExprStmt {
    pub expression: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub declared_type: Type,
    pub initializer: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub line: usize,
}

/// A `while` loop. Desugared `for` loops with an increment set
/// `is_for_loop`; their body is then a block whose last statement is the
/// increment.
#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub is_for_loop: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub declared_type: Type,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: BlockStmt,
    pub line: usize,
}

/// A declared type annotation. Kept in the tree but never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Type {
    Value { name: String },
    Pointer { inner: Box<Type> },
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value { name } => write!(f, "{name}"),
            Self::Pointer { inner } => write!(f, "{inner}*"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Literal(LiteralExpr),
    Identifier(IdentifierExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    MemberAccess(MemberAccessExpr),
    Call(CallExpr),
    Parenthesized(ParenthesizedExpr),
    Assign(AssignExpr),
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Self::Literal(e) => e.line,
            Self::Identifier(e) => e.line,
            Self::Unary(e) => e.line,
            Self::Binary(e) => e.line,
            Self::MemberAccess(e) => e.line,
            Self::Call(e) => e.line,
            Self::Parenthesized(e) => e.line,
            Self::Assign(e) => e.line,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteralExpr {
    pub value: LiteralValue,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Int(i64),
    Double(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifierExpr {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum UnaryOp {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "!")]
    Not,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberAccessExpr {
    pub object: Box<Expr>,
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParenthesizedExpr {
    pub expression: Box<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignExpr {
    pub name: String,
    pub value: Box<Expr>,
    pub line: usize,
}
