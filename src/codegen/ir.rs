//! Трёхадресное промежуточное представление.

use std::fmt;

use serde::Serialize;

use crate::ast::{ArithOp, RelOp};

/// Временный регистр `R<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Register(pub usize);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Метка перехода `L<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Label(pub usize);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Операнд инструкции.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Operand {
    Number(i64),
    Bool(bool),
    /// Имя переменной, а не её значение.
    Var(String),
    Register(Register),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Bool(true) => f.write_str("TRUE"),
            Operand::Bool(false) => f.write_str("FALSE"),
            Operand::Var(name) => f.write_str(name),
            Operand::Register(r) => write!(f, "{}", r),
        }
    }
}

/// Код операции трёхадресной инструкции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Opcode {
    Arith(ArithOp),
    Negate,
    Copy,
    /// Сравнение субъекта `switch` с меткой ветви.
    CaseEqual,
    Relation(RelOp),
    Not,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Arith(op) => op.mnemonic(),
            Opcode::Negate => "uminus",
            Opcode::Copy => "=",
            Opcode::CaseEqual => "equal",
            Opcode::Relation(op) => op.mnemonic(),
            Opcode::Not => "NOT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Инструкция или метка.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Instr {
    Label(Label),
    Op {
        opcode: Opcode,
        arg1: Operand,
        arg2: Option<Operand>,
        dest: Operand,
    },
    Jump(Label),
    JumpIfFalse { target: Label, cond: Operand },
    JumpIfTrue { target: Label, cond: Operand },
}

impl Instr {
    /// Регистр, в который пишет инструкция.
    pub fn dest_register(&self) -> Option<Register> {
        match self {
            Instr::Op {
                dest: Operand::Register(r),
                ..
            } => Some(*r),
            _ => None,
        }
    }

    /// Определяемая метка, если это строка метки.
    pub fn defined_label(&self) -> Option<Label> {
        match self {
            Instr::Label(label) => Some(*label),
            _ => None,
        }
    }

    /// Цель перехода, если это переход.
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Instr::Jump(target)
            | Instr::JumpIfFalse { target, .. }
            | Instr::JumpIfTrue { target, .. } => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Label(label) => write!(f, "{}:", label),
            Instr::Op {
                opcode,
                arg1,
                arg2,
                dest,
            } => match arg2 {
                Some(arg2) => write!(f, "({}, {}, {}, {})", opcode, arg1, arg2, dest),
                None => write!(f, "({}, {}, , {})", opcode, arg1, dest),
            },
            Instr::Jump(target) => write!(f, "(jmp, {}, , )", target),
            Instr::JumpIfFalse { target, cond } => write!(f, "(jfalse, {}, {}, )", target, cond),
            Instr::JumpIfTrue { target, cond } => write!(f, "(jtrue, {}, {}, )", target, cond),
        }
    }
}

/// Текст IR: по одной инструкции или метке на строку.
pub fn render(instrs: &[Instr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}
