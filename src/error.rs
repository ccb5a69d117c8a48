//! Определения ошибок компилятора.

use crate::parser::ParseError;
use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type CompileResult<T> = Result<T, CompileError>;

/// Фатальная ошибка семантического анализа.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Variable {name} is not defined at line: {line}")]
    UndefinedVariable { name: String, line: usize },

    #[error("Type {name} is not defined at line: {line}")]
    UnknownType { name: String, line: usize },
}

impl SemanticError {
    /// Номер строки, на которой возникла ошибка.
    pub fn line(&self) -> usize {
        match self {
            Self::UndefinedVariable { line, .. } | Self::UnknownType { line, .. } => *line,
        }
    }
}

/// Перечисление всех фатальных ошибок компиляции.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Semantic Error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CompileError {
    /// Номер строки, если ошибка к ней привязана.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse(e) => Some(e.line()),
            Self::Semantic(e) => Some(e.line()),
            Self::IoError(_) | Self::ConfigError(_) => None,
        }
    }
}
