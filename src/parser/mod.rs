//! Модуль парсера.
//!
//! Лексер выдаёт токены по одному, парсер рекурсивного спуска строит из них
//! [`Program`](crate::ast::Program).
//!
//! # Синтаксис
//!
//! ```text
//! # комментарий #
//! int a = 3;                      # объявление #
//! const int n = 10;               # константа #
//! a = a + n * 2;                  # присваивание #
//!
//! if (a > 5) { a = 0; } else { a = 1; }
//! while (a < n) { a = a + 1; }
//! do { a = a - 1; } while (a > 0);
//! for (int i = 0; i < n; i = i + 1) { a = a + i; }
//! switch (a) { case 1: { a = 2; } case -1: { } default: { a = 0; } }
//! ```
//!
//! # Пример
//!
//! ```rust
//! use tac_compiler::parser::parse;
//!
//! let program = parse("int x = 1 + 2;").unwrap();
//! assert_eq!(program.statements.len(), 1);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::ParseError;
pub use lexer::{tokenize, Lexer};
pub use parser::Parser;
pub use token::{Span, Spanned, Token, TokenKind, TokenValue};

use crate::ast::Program;

/// Разобрать исходный текст в AST.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse()
}
