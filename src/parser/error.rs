//! Ошибки лексера и парсера.

use super::token::{Span, Token, TokenKind};
use thiserror::Error;

/// Ошибка разбора: лексическая или синтаксическая.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Символ не подходит ни под одно правило лексера.
    #[error("Lexical Error: Invalid character {found:?} at line: {}", span.line)]
    Lexical { span: Span, found: String },

    /// Комментарий `#` без закрывающего `#`.
    #[error("Lexical Error: Unterminated comment at line: {}", span.line)]
    UnterminatedComment { span: Span },

    /// Целочисленный литерал не помещается в i64.
    #[error("Lexical Error: Integer literal {literal} out of range at line: {}", span.line)]
    IntegerOverflow { span: Span, literal: String },

    /// Токен не совпал с ожидаемым.
    #[error("Syntax Error: expected {expected}, found {found} at line: {}", span.line)]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    /// После программы остались токены.
    #[error("Syntax Error: unexpected {found} after end of program at line: {}", span.line)]
    TrailingInput { span: Span, found: String },

    /// Запрошен токен после EndOfInput.
    #[error("Syntax Error: read past end of input at line: {}", span.line)]
    PastEndOfInput { span: Span },
}

impl ParseError {
    /// Создать ошибку "неожиданный токен".
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: &Token) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Ошибка при несовпадении вида токена в `eat`.
    pub fn expected_kind(span: Span, expected: TokenKind, found: &Token) -> Self {
        Self::unexpected_token(span, expected.to_string(), found)
    }

    /// Получить позицию ошибки.
    pub fn span(&self) -> Span {
        match self {
            Self::Lexical { span, .. } => *span,
            Self::UnterminatedComment { span } => *span,
            Self::IntegerOverflow { span, .. } => *span,
            Self::UnexpectedToken { span, .. } => *span,
            Self::TrailingInput { span, .. } => *span,
            Self::PastEndOfInput { span } => *span,
        }
    }

    /// Номер строки, на которой возникла ошибка.
    pub fn line(&self) -> usize {
        self.span().line
    }

    /// Лексическая ли это ошибка.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            Self::Lexical { .. } | Self::UnterminatedComment { .. } | Self::IntegerOverflow { .. }
        )
    }
}
