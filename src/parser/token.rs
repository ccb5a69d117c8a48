//! Токены и позиции исходного кода.

use serde::{Deserialize, Serialize};

/// Позиция в исходном коде.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Начальная позиция (байт).
    pub start: usize,
    /// Конечная позиция (байт).
    pub end: usize,
    /// Номер строки (с единицы).
    pub line: usize,
}

impl Span {
    /// Создать новый Span.
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }
}

/// Значение с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Вид токена.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    IntType,
    IntValue,
    Constant,
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Break,
    Default,
    True,
    False,
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Colon,
    Comma,
    Assign,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Multiply,
    Divide,
    Identifier,
    EndOfInput,
}

impl TokenKind {
    /// Может ли токен начинать оператор.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Break
                | TokenKind::If
                | TokenKind::Switch
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Identifier
                | TokenKind::IntType
                | TokenKind::Constant
                | TokenKind::Semicolon
        )
    }

    /// Является ли токен бинарной логической связкой или сравнением.
    pub fn is_bool_op(self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Or
                | TokenKind::Not
                | TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::LessEqual
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::Greater
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Полезная нагрузка токена.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    /// Модуль целочисленного литерала. Знак применяет парсер, поэтому
    /// допустим и модуль `i64::MIN`.
    Int(u64),
    /// Текст лексемы: имя идентификатора, ключевое слово или оператор.
    Text(String),
}

/// Лексический токен.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
}

impl Token {
    /// Токен с текстовой лексемой.
    pub fn text(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            value: TokenValue::Text(text.into()),
        }
    }

    /// Целочисленный литерал.
    pub fn int(value: u64) -> Self {
        Self {
            kind: TokenKind::IntValue,
            value: TokenValue::Int(value),
        }
    }

    /// Маркер конца ввода.
    pub fn end_of_input() -> Self {
        Self::text(TokenKind::EndOfInput, "")
    }

    /// Модуль целочисленного литерала.
    pub fn as_int(&self) -> Option<u64> {
        match self.value {
            TokenValue::Int(n) => Some(n),
            TokenValue::Text(_) => None,
        }
    }

    /// Текст лексемы.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(s) => Some(s),
            TokenValue::Int(_) => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            TokenValue::Int(n) => write!(f, "Token({}, {})", self.kind, n),
            TokenValue::Text(s) => write!(f, "Token({}, {:?})", self.kind, s),
        }
    }
}
