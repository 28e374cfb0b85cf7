// lang/src/ast.rs

/// Byte-offset range into the original source buffer. Nodes never hold
/// parent pointers; diagnostics resolve spans against `OriginMap::source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}
impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

pub type NodeId = u64;

/// Root of one parsed source file. Owns the whole tree exclusively;
/// cloning yields a fresh tree with no shared ownership.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub classes: Vec<ClassDecl>,
    pub origin: OriginMap,
}

#[derive(Debug, Clone)]
pub struct OriginMap {
    pub file_path: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Abstract,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub id: NodeId,
    pub span: Span,
    pub doc: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub id: NodeId,
    pub span: Span,
    pub doc: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub type_name: TypeName,
    pub decls: Vec<Declarator>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub id: NodeId,
    pub span: Span,
    pub doc: Option<String>,
    pub modifiers: Vec<Modifier>,
    /// `void` dummy for constructors; see `is_ctor`.
    pub return_type: TypeName,
    pub name: String,
    pub params: Vec<Param>,
    /// Recorded, not semantically checked.
    pub throws: Vec<String>,
    pub body: Option<Block>,
    pub is_ctor: bool,
    /// Set by the canonicalizer for private methods never referenced
    /// inside their class. Tagged, never removed.
    pub unreachable: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub id: NodeId,
    pub span: Span,
    pub modifiers: Vec<Modifier>,
    pub type_name: TypeName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    /// Array dimension count; `int[][]` has dims 2.
    pub dims: u8,
}

impl TypeName {
    pub fn simple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dims: 0,
        }
    }

    pub fn is_void(&self) -> bool {
        self.dims == 0 && self.name == "void"
    }

    /// Widening rank for primitive numeric types; `None` for everything
    /// else (including arrays).
    pub fn numeric_rank(&self) -> Option<u8> {
        if self.dims != 0 {
            return None;
        }
        match self.name.as_str() {
            "byte" => Some(0),
            "short" => Some(1),
            "int" => Some(2),
            "long" => Some(3),
            "float" => Some(4),
            "double" => Some(5),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        let mut s = self.name.clone();
        for _ in 0..self.dims {
            s.push_str("[]");
        }
        s
    }
}

/// True iff `to` can hold every value of `from` without truncation.
pub fn is_widening(from: &TypeName, to: &TypeName) -> bool {
    match (from.numeric_rank(), to.numeric_rank()) {
        (Some(f), Some(t)) => f < t,
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

/// Statements wrap their kind in a struct so the node id, span and the
/// unreachable tag live in one place for every variant.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub unreachable: bool,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl {
        is_final: bool,
        type_name: TypeName,
        decls: Vec<Declarator>,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Break,
    Continue,
    Block(Block),
    Empty,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Decl {
        is_final: bool,
        type_name: TypeName,
        decls: Vec<Declarator>,
    },
    Exprs(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        receiver: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    FieldAccess {
        target: Box<Expr>,
        name: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    New {
        type_name: TypeName,
        args: Vec<Expr>,
    },
    NewArray {
        elem: TypeName,
        len: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

impl PostfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PostfixOp::Inc => "++",
            PostfixOp::Dec => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding strength; assignment sits below all of these at 1.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Long(i64),
    /// Raw digits with any suffix stripped; kept textual so printing is
    /// exact and comparison never goes through float equality.
    Float(String),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

impl Literal {
    /// Same numeric value observed through an int-to-long widening.
    pub fn same_value_widened(&self, other: &Literal) -> bool {
        match (self, other) {
            (Literal::Int(a), Literal::Long(b)) | (Literal::Long(a), Literal::Int(b)) => a == b,
            _ => false,
        }
    }
}
