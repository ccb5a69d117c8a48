//! Лексер исходного текста.

use logos::Logos;

use super::error::ParseError;
use super::token::{Span, Spanned, Token, TokenKind};

/// Внутренние токены для logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")] // Пропускаем пробелы
#[logos(skip r"#[^#]*#")] // Пропускаем комментарии #...#
enum LogosToken {
    // Ключевые слова (до идентификаторов!)
    #[token("int")]
    IntType,
    #[token("const")]
    Constant,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("break")]
    Break,
    #[token("default")]
    Default,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    #[regex(r"[0-9]+")]
    IntValue,

    // Двухсимвольные операторы сначала
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,

    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,

    #[regex(r"[a-zA-Z][a-zA-Z0-9]*")]
    Identifier,
}

impl LogosToken {
    fn kind(self) -> TokenKind {
        match self {
            LogosToken::IntType => TokenKind::IntType,
            LogosToken::Constant => TokenKind::Constant,
            LogosToken::If => TokenKind::If,
            LogosToken::Else => TokenKind::Else,
            LogosToken::For => TokenKind::For,
            LogosToken::While => TokenKind::While,
            LogosToken::Do => TokenKind::Do,
            LogosToken::Switch => TokenKind::Switch,
            LogosToken::Case => TokenKind::Case,
            LogosToken::Break => TokenKind::Break,
            LogosToken::Default => TokenKind::Default,
            LogosToken::True => TokenKind::True,
            LogosToken::False => TokenKind::False,
            LogosToken::And => TokenKind::And,
            LogosToken::Or => TokenKind::Or,
            LogosToken::Not => TokenKind::Not,
            LogosToken::IntValue => TokenKind::IntValue,
            LogosToken::Equal => TokenKind::Equal,
            LogosToken::NotEqual => TokenKind::NotEqual,
            LogosToken::LessEqual => TokenKind::LessEqual,
            LogosToken::GreaterEqual => TokenKind::GreaterEqual,
            LogosToken::Less => TokenKind::Less,
            LogosToken::Greater => TokenKind::Greater,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Assign => TokenKind::Assign,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Multiply => TokenKind::Multiply,
            LogosToken::Divide => TokenKind::Divide,
            LogosToken::Identifier => TokenKind::Identifier,
        }
    }
}

/// Лексер: выдаёт токены по одному, отслеживая номер строки.
pub struct Lexer<'a> {
    logos: logos::Lexer<'a, LogosToken>,
    source: &'a str,
    /// Байтовая позиция, до которой строки уже посчитаны.
    cursor: usize,
    line: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Создать новый лексер.
    pub fn new(source: &'a str) -> Self {
        Self {
            logos: LogosToken::lexer(source),
            source,
            cursor: 0,
            line: 1,
            finished: false,
        }
    }

    /// Получить следующий токен.
    ///
    /// После единственного `EndOfInput` любой следующий вызов возвращает ошибку.
    pub fn next_token(&mut self) -> Result<Spanned<Token>, ParseError> {
        if self.finished {
            let pos = self.source.len();
            return Err(ParseError::PastEndOfInput {
                span: Span::new(pos, pos, self.line),
            });
        }

        match self.logos.next() {
            Some(Ok(raw)) => {
                let span = self.advance_to(self.logos.span());
                let slice = self.logos.slice();
                let token = match raw {
                    LogosToken::IntValue => {
                        let value = slice
                            .parse::<u64>()
                            .ok()
                            .filter(|n| *n <= i64::MIN.unsigned_abs())
                            .ok_or_else(|| ParseError::IntegerOverflow {
                                span,
                                literal: slice.to_string(),
                            })?;
                        Token::int(value)
                    }
                    other => Token::text(other.kind(), slice),
                };
                Ok(Spanned::new(token, span))
            }
            Some(Err(())) => {
                let span = self.advance_to(self.logos.span());
                let slice = self.logos.slice();
                if slice.starts_with('#') {
                    Err(ParseError::UnterminatedComment { span })
                } else {
                    Err(ParseError::Lexical {
                        span,
                        found: slice.to_string(),
                    })
                }
            }
            None => {
                let pos = self.source.len();
                let span = self.advance_to(pos..pos);
                self.finished = true;
                Ok(Spanned::new(Token::end_of_input(), span))
            }
        }
    }

    /// Сдвинуть счётчик строк до начала токена.
    fn advance_to(&mut self, range: std::ops::Range<usize>) -> Span {
        let skipped = &self.source[self.cursor..range.start];
        self.line += skipped.bytes().filter(|b| *b == b'\n').count();
        self.cursor = range.start;
        Span::new(range.start, range.end, self.line)
    }

    /// Текущий номер строки.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Разбить весь исходник на токены, включая завершающий `EndOfInput`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.value.kind == TokenKind::EndOfInput;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
