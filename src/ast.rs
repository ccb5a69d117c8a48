//! Абстрактное синтаксическое дерево.
//!
//! Каждый узел владеет своими детьми; ссылок на родителя нет.

use serde::Serialize;

/// Корень программы.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Составной оператор `{ ... }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// Тип в объявлении.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeSpec {
    Int,
}

impl TypeSpec {
    /// Имя встроенного типа, которым объявление разрешается в таблице символов.
    pub fn builtin_name(self) -> &'static str {
        match self {
            TypeSpec::Int => "INTEGER",
        }
    }
}

/// Ссылка на переменную.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarRef {
    pub name: String,
    pub line: usize,
}

impl VarRef {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

/// Метка ветви `switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaseLabel {
    /// `case 3:` или `case -3:`
    Value(i64),
    /// `default:`
    Default,
}

/// Оператор.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    VarDecl {
        name: String,
        declared_type: TypeSpec,
        initializer: Option<Expr>,
        is_const: bool,
        line: usize,
    },
    Assign {
        target: String,
        value: Expr,
        line: usize,
    },
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    DoWhile {
        body: Block,
        condition: Expr,
    },
    For {
        init: Box<Stmt>,
        condition: Expr,
        step: Box<Stmt>,
        body: Block,
    },
    Switch {
        subject: VarRef,
        cases: Vec<(CaseLabel, Block)>,
    },
    Break {
        line: usize,
    },
    Empty,
}

/// Арифметическая операция.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Мнемоника в IR.
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Унарная операция.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// Логическая связка или сравнение.
///
/// Все связки одного приоритета и левоассоциативны.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelOp {
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
}

impl RelOp {
    /// Мнемоника в IR: имя вида токена.
    pub fn mnemonic(self) -> &'static str {
        match self {
            RelOp::And => "AND",
            RelOp::Or => "OR",
            RelOp::Not => "NOT",
            RelOp::Equal => "EQUAL",
            RelOp::NotEqual => "NOT_EQUAL",
            RelOp::LessEqual => "LESS_EQUAL",
            RelOp::GreaterEqual => "GREATER_EQUAL",
            RelOp::Less => "LESS",
            RelOp::Greater => "GREATER",
        }
    }
}

/// Выражение.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    BinOp {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        left: Box<Expr>,
        op: RelOp,
        right: Box<Expr>,
    },
    Number(i64),
    Bool(bool),
    Var(VarRef),
}

impl Expr {
    pub fn binary(left: Expr, op: ArithOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn relation(left: Expr, op: RelOp, right: Expr) -> Self {
        Expr::BoolOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn var(name: impl Into<String>, line: usize) -> Self {
        Expr::Var(VarRef::new(name, line))
    }
}
