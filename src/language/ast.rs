//! Tree handed over by the parser. Leaf expressions carry the source line they
//! came from; composite nodes recover a line from their leaves.

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Assign(AssignStmt),
    If(IfStmt),
    IfElse(IfElseStmt),
    While(WhileStmt),
    For(ForStmt),
    Break { line: usize },
    Continue { line: usize },
    Print(Vec<Expr>),
    Return(Vec<Expr>),
    Block(Block),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfElseStmt {
    pub condition: Expr,
    pub then_branch: Box<Statement>,
    pub else_branch: Box<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Statement>,
}

/// `for binding = start:end body`, end exclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub binding: Identifier,
    pub start: Expr,
    pub end: Expr,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub line: usize,
}

impl Identifier {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    MatMul {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Transpose(Box<Expr>),
    Relation {
        op: RelOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Vector(Vec<Expr>),
    Zeros(Vec<Expr>),
    Ones(Vec<Expr>),
    Eye(Box<Expr>),
    Index {
        target: Box<Expr>,
        indices: Vec<Expr>,
    },
    Identifier(Identifier),
    Int {
        value: i64,
        line: usize,
    },
    Float {
        value: f64,
        line: usize,
    },
    Str {
        value: String,
        line: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl RelOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Ne)
    }
}

impl Expr {
    pub fn int(value: i64, line: usize) -> Self {
        Expr::Int { value, line }
    }

    pub fn float(value: f64, line: usize) -> Self {
        Expr::Float { value, line }
    }

    pub fn string(value: impl Into<String>, line: usize) -> Self {
        Expr::Str {
            value: value.into(),
            line,
        }
    }

    pub fn ident(name: impl Into<String>, line: usize) -> Self {
        Expr::Identifier(Identifier::new(name, line))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn relation(op: RelOp, left: Expr, right: Expr) -> Self {
        Expr::Relation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn matmul(left: Expr, right: Expr) -> Self {
        Expr::MatMul {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn transpose(expr: Expr) -> Self {
        Expr::Transpose(Box::new(expr))
    }

    pub fn index(target: Expr, indices: Vec<Expr>) -> Self {
        Expr::Index {
            target: Box::new(target),
            indices,
        }
    }

    pub fn eye(size: Expr) -> Self {
        Expr::Eye(Box::new(size))
    }

    /// The line of the first leaf found in evaluation order.
    pub fn line(&self) -> Option<usize> {
        match self {
            Expr::Int { line, .. } | Expr::Float { line, .. } | Expr::Str { line, .. } => {
                Some(*line)
            }
            Expr::Identifier(ident) => Some(ident.line),
            Expr::Binary { left, right, .. }
            | Expr::MatMul { left, right }
            | Expr::Relation { left, right, .. } => left.line().or_else(|| right.line()),
            Expr::Unary { expr, .. } | Expr::Transpose(expr) | Expr::Eye(expr) => expr.line(),
            Expr::Vector(items) | Expr::Zeros(items) | Expr::Ones(items) => {
                items.iter().find_map(Expr::line)
            }
            Expr::Index { target, indices } => target
                .line()
                .or_else(|| indices.iter().find_map(Expr::line)),
        }
    }
}

impl Statement {
    pub fn assign(target: Expr, value: Expr) -> Self {
        Statement::Assign(AssignStmt { target, value })
    }

    pub fn if_then(condition: Expr, body: Statement) -> Self {
        Statement::If(IfStmt {
            condition,
            body: Box::new(body),
        })
    }

    pub fn if_else(condition: Expr, then_branch: Statement, else_branch: Statement) -> Self {
        Statement::IfElse(IfElseStmt {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    pub fn while_loop(condition: Expr, body: Statement) -> Self {
        Statement::While(WhileStmt {
            condition,
            body: Box::new(body),
        })
    }

    pub fn for_range(binding: Identifier, start: Expr, end: Expr, body: Statement) -> Self {
        Statement::For(ForStmt {
            binding,
            start,
            end,
            body: Box::new(body),
        })
    }

    pub fn block(statements: Vec<Statement>) -> Self {
        Statement::Block(Block { statements })
    }
}
