//! Парсер рекурсивного спуска с предпросмотром на один токен.

use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{Spanned, Token, TokenKind};
use crate::ast::{ArithOp, Block, CaseLabel, Expr, Program, RelOp, Stmt, TypeSpec, UnaryOp, VarRef};

/// Парсер программы.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned<Token>,
}

impl<'a> Parser<'a> {
    /// Создать новый парсер и прочитать первый токен.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Разобрать всю программу.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let program = self.program()?;
        if self.kind() != TokenKind::EndOfInput {
            return Err(ParseError::TrailingInput {
                span: self.current.span,
                found: self.current.value.to_string(),
            });
        }
        log::debug!(
            "parsed {} top-level statements",
            program.statements.len()
        );
        Ok(program)
    }

    fn kind(&self) -> TokenKind {
        self.current.value.kind
    }

    fn line(&self) -> usize {
        self.current.span.line
    }

    /// Съесть токен ожидаемого вида и вернуть его.
    ///
    /// `EndOfInput` не продвигает лексер.
    fn eat(&mut self, kind: TokenKind) -> Result<Spanned<Token>, ParseError> {
        if self.kind() != kind {
            return Err(ParseError::expected_kind(
                self.current.span,
                kind,
                &self.current.value,
            ));
        }
        if kind == TokenKind::EndOfInput {
            return Ok(self.current.clone());
        }
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// program : statement+
    fn program(&mut self) -> Result<Program, ParseError> {
        let statements = self.statement_list()?;
        Ok(Program { statements })
    }

    /// statement_list : statement statement*
    fn statement_list(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![self.statement()?];
        while self.kind().starts_statement() {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    /// statement : BREAK ';' | selection | iteration | assignment ';'
    ///           | declaration ';' | const_declaration ';' | ';'
    fn statement(&mut self) -> Result<Stmt, ParseError> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match self.kind() {
            TokenKind::Break => {
                let line = self.line();
                self.eat(TokenKind::Break)?;
                self.eat(TokenKind::Semicolon)?;
                Ok(Stmt::Break { line })
            }
            TokenKind::If | TokenKind::Switch => self.selection_statement(),
            TokenKind::While | TokenKind::Do | TokenKind::For => self.iteration_statement(),
            TokenKind::Identifier => {
                let node = self.assignment_statement()?;
                self.eat(TokenKind::Semicolon)?;
                Ok(node)
            }
            TokenKind::IntType => {
                let node = self.variable_declaration()?;
                self.eat(TokenKind::Semicolon)?;
                Ok(node)
            }
            TokenKind::Constant => {
                let node = self.const_declaration()?;
                self.eat(TokenKind::Semicolon)?;
                Ok(node)
            }
            TokenKind::Semicolon => {
                self.eat(TokenKind::Semicolon)?;
                Ok(Stmt::Empty)
            }
            _ => Err(ParseError::unexpected_token(
                self.current.span,
                "statement",
                &self.current.value,
            )),
        })
    }

    /// compound_statement : '{' statement* '}'
    fn compound_statement(&mut self) -> Result<Block, ParseError> {
        self.eat(TokenKind::LBrace)?;
        let statements = if self.kind().starts_statement() {
            self.statement_list()?
        } else {
            Vec::new()
        };
        self.eat(TokenKind::RBrace)?;
        Ok(Block::new(statements))
    }

    /// variable : ID
    fn variable(&mut self) -> Result<VarRef, ParseError> {
        let token = self.eat(TokenKind::Identifier)?;
        let name = token.value.as_text().unwrap_or_default().to_string();
        Ok(VarRef::new(name, token.span.line))
    }

    /// type_spec : INT
    fn type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        self.eat(TokenKind::IntType)?;
        Ok(TypeSpec::Int)
    }

    /// assignment_statement : variable '=' expr
    fn assignment_statement(&mut self) -> Result<Stmt, ParseError> {
        let target = self.variable()?;
        self.eat(TokenKind::Assign)?;
        let value = self.expr()?;
        Ok(Stmt::Assign {
            target: target.name,
            value,
            line: target.line,
        })
    }

    /// variable_declaration : type_spec variable ('=' expr)?
    fn variable_declaration(&mut self) -> Result<Stmt, ParseError> {
        let declared_type = self.type_spec()?;
        let var = self.variable()?;
        let initializer = if self.kind() == TokenKind::Assign {
            self.eat(TokenKind::Assign)?;
            Some(self.expr()?)
        } else {
            None
        };
        Ok(Stmt::VarDecl {
            name: var.name,
            declared_type,
            initializer,
            is_const: false,
            line: var.line,
        })
    }

    /// const_declaration : CONST type_spec variable '=' expr
    fn const_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.eat(TokenKind::Constant)?;
        let declared_type = self.type_spec()?;
        let var = self.variable()?;
        self.eat(TokenKind::Assign)?;
        let value = self.expr()?;
        Ok(Stmt::VarDecl {
            name: var.name,
            declared_type,
            initializer: Some(value),
            is_const: true,
            line: var.line,
        })
    }

    /// init_for : assignment_statement | variable_declaration | ε
    fn init_for(&mut self) -> Result<Stmt, ParseError> {
        match self.kind() {
            TokenKind::Identifier => self.assignment_statement(),
            TokenKind::IntType => self.variable_declaration(),
            _ => Ok(Stmt::Empty),
        }
    }

    /// selection_statement : IF '(' bool_expr ')' block (ELSE block)?
    ///                     | SWITCH '(' variable ')' '{' case+ default? '}'
    fn selection_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.kind() == TokenKind::If {
            self.eat(TokenKind::If)?;
            self.eat(TokenKind::LParen)?;
            let condition = self.boolean_expression()?;
            self.eat(TokenKind::RParen)?;
            let then_block = self.compound_statement()?;
            let else_block = if self.kind() == TokenKind::Else {
                self.eat(TokenKind::Else)?;
                Some(self.compound_statement()?)
            } else {
                None
            };
            return Ok(Stmt::If {
                condition,
                then_block,
                else_block,
            });
        }

        self.eat(TokenKind::Switch)?;
        self.eat(TokenKind::LParen)?;
        let subject = self.variable()?;
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::LBrace)?;

        let mut cases = vec![self.case_clause()?];
        while self.kind() == TokenKind::Case {
            cases.push(self.case_clause()?);
        }
        if self.kind() == TokenKind::Default {
            self.eat(TokenKind::Default)?;
            self.eat(TokenKind::Colon)?;
            cases.push((CaseLabel::Default, self.compound_statement()?));
        }
        self.eat(TokenKind::RBrace)?;

        Ok(Stmt::Switch { subject, cases })
    }

    /// case : CASE ('-')? INT ':' block
    fn case_clause(&mut self) -> Result<(CaseLabel, Block), ParseError> {
        self.eat(TokenKind::Case)?;
        let negative = if self.kind() == TokenKind::Minus {
            self.eat(TokenKind::Minus)?;
            true
        } else {
            false
        };
        let value = self.int_literal(negative)?;
        self.eat(TokenKind::Colon)?;
        let block = self.compound_statement()?;
        Ok((CaseLabel::Value(value), block))
    }

    /// Съесть литерал и применить знак. Модуль `i64::MIN` допустим только
    /// с минусом.
    fn int_literal(&mut self, negative: bool) -> Result<i64, ParseError> {
        let token = self.eat(TokenKind::IntValue)?;
        let magnitude = token.value.as_int().unwrap_or_default();
        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.ok_or_else(|| ParseError::IntegerOverflow {
            span: token.span,
            literal: magnitude.to_string(),
        })
    }

    /// iteration_statement : WHILE '(' bool_expr ')' block
    ///                     | DO block WHILE '(' bool_expr ')' ';'
    ///                     | FOR '(' init_for ';' bool_expr ';' assignment ')' block
    fn iteration_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.kind() {
            TokenKind::While => {
                self.eat(TokenKind::While)?;
                self.eat(TokenKind::LParen)?;
                let condition = self.boolean_expression()?;
                self.eat(TokenKind::RParen)?;
                let body = self.compound_statement()?;
                Ok(Stmt::While { condition, body })
            }
            TokenKind::Do => {
                self.eat(TokenKind::Do)?;
                let body = self.compound_statement()?;
                self.eat(TokenKind::While)?;
                self.eat(TokenKind::LParen)?;
                let condition = self.boolean_expression()?;
                self.eat(TokenKind::RParen)?;
                self.eat(TokenKind::Semicolon)?;
                Ok(Stmt::DoWhile { body, condition })
            }
            _ => {
                self.eat(TokenKind::For)?;
                self.eat(TokenKind::LParen)?;
                let init = self.init_for()?;
                self.eat(TokenKind::Semicolon)?;
                let condition = self.boolean_expression()?;
                self.eat(TokenKind::Semicolon)?;
                let step = self.assignment_statement()?;
                self.eat(TokenKind::RParen)?;
                let body = self.compound_statement()?;
                Ok(Stmt::For {
                    init: Box::new(init),
                    condition,
                    step: Box::new(step),
                    body,
                })
            }
        }
    }

    /// expr : term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.term()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => return Ok(node),
            };
            self.eat(self.kind())?;
            node = Expr::binary(node, op, self.term()?);
        }
    }

    /// term : factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.factor()?;
        loop {
            let op = match self.kind() {
                TokenKind::Multiply => ArithOp::Mul,
                TokenKind::Divide => ArithOp::Div,
                _ => return Ok(node),
            };
            self.eat(self.kind())?;
            node = Expr::binary(node, op, self.factor()?);
        }
    }

    /// factor : ('+' | '-') factor | INT | '(' expr ')' | variable
    fn factor(&mut self) -> Result<Expr, ParseError> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match self.kind() {
            TokenKind::Plus => {
                self.eat(TokenKind::Plus)?;
                Ok(Expr::unary(UnaryOp::Plus, self.factor()?))
            }
            TokenKind::Minus => {
                self.eat(TokenKind::Minus)?;
                Ok(Expr::unary(UnaryOp::Minus, self.factor()?))
            }
            TokenKind::IntValue => Ok(Expr::Number(self.int_literal(false)?)),
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                let node = self.expr()?;
                self.eat(TokenKind::RParen)?;
                Ok(node)
            }
            _ => Ok(Expr::Var(self.variable()?)),
        })
    }

    /// boolean_expression : boolean_term (bool_op boolean_term)*
    fn boolean_expression(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.boolean_term()?;
        while self.kind().is_bool_op() {
            let op = match self.kind() {
                TokenKind::And => RelOp::And,
                TokenKind::Or => RelOp::Or,
                TokenKind::Not => RelOp::Not,
                TokenKind::Equal => RelOp::Equal,
                TokenKind::NotEqual => RelOp::NotEqual,
                TokenKind::LessEqual => RelOp::LessEqual,
                TokenKind::GreaterEqual => RelOp::GreaterEqual,
                TokenKind::Less => RelOp::Less,
                _ => RelOp::Greater,
            };
            self.eat(self.kind())?;
            node = Expr::relation(node, op, self.boolean_term()?);
        }
        Ok(node)
    }

    /// boolean_term : NOT boolean_term | TRUE | FALSE
    ///              | '(' boolean_expression ')' | INT | variable
    fn boolean_term(&mut self) -> Result<Expr, ParseError> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match self.kind() {
            TokenKind::Not => {
                self.eat(TokenKind::Not)?;
                Ok(Expr::unary(UnaryOp::Not, self.boolean_term()?))
            }
            TokenKind::True => {
                self.eat(TokenKind::True)?;
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.eat(TokenKind::False)?;
                Ok(Expr::Bool(false))
            }
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                let node = self.boolean_expression()?;
                self.eat(TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::IntValue => Ok(Expr::Number(self.int_literal(false)?)),
            _ => Ok(Expr::Var(self.variable()?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program, ParseError> {
        Parser::new(source)?.parse()
    }

    #[test]
    fn test_parse_declarations() {
        let program = parse("int a = 3; const int b = 4; int c;").unwrap();
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(
            &program.statements[0],
            Stmt::VarDecl { name, initializer: Some(Expr::Number(3)), is_const: false, .. } if name == "a"
        ));
        assert!(matches!(
            &program.statements[1],
            Stmt::VarDecl { is_const: true, .. }
        ));
        assert!(matches!(
            &program.statements[2],
            Stmt::VarDecl { initializer: None, .. }
        ));
    }

    #[test]
    fn test_parse_precedence() {
        let program = parse("x = a + b * 2;").unwrap();
        let Stmt::Assign { value, .. } = &program.statements[0] else {
            panic!("Expected assignment");
        };
        let expected = Expr::binary(
            Expr::var("a", 1),
            ArithOp::Add,
            Expr::binary(Expr::var("b", 1), ArithOp::Mul, Expr::Number(2)),
        );
        assert_eq!(value, &expected);
    }

    #[test]
    fn test_parse_left_associative() {
        let program = parse("x = 1 - 2 - 3;").unwrap();
        let Stmt::Assign { value, .. } = &program.statements[0] else {
            panic!("Expected assignment");
        };
        let expected = Expr::binary(
            Expr::binary(Expr::Number(1), ArithOp::Sub, Expr::Number(2)),
            ArithOp::Sub,
            Expr::Number(3),
        );
        assert_eq!(value, &expected);
    }

    #[test]
    fn test_parse_unary_and_parens() {
        let program = parse("x = -(1 + 2);").unwrap();
        let Stmt::Assign { value, .. } = &program.statements[0] else {
            panic!("Expected assignment");
        };
        assert!(matches!(value, Expr::UnaryOp { op: UnaryOp::Minus, .. }));
    }

    #[test]
    fn test_parse_bool_ops_flat() {
        let program = parse("while (a < 1 and b) { }").unwrap();
        let Stmt::While { condition, body } = &program.statements[0] else {
            panic!("Expected while");
        };
        let expected = Expr::relation(
            Expr::relation(Expr::var("a", 1), RelOp::Less, Expr::Number(1)),
            RelOp::And,
            Expr::var("b", 1),
        );
        assert_eq!(condition, &expected);
        assert!(body.statements.is_empty());
    }

    #[test]
    fn test_parse_if_else() {
        let program = parse("if (not true) { a = 1; } else { a = 2; }").unwrap();
        let Stmt::If {
            condition,
            then_block,
            else_block,
        } = &program.statements[0]
        else {
            panic!("Expected if");
        };
        assert!(matches!(condition, Expr::UnaryOp { op: UnaryOp::Not, .. }));
        assert_eq!(then_block.statements.len(), 1);
        assert_eq!(else_block.as_ref().map(|b| b.statements.len()), Some(1));
    }

    #[test]
    fn test_parse_do_while_and_for() {
        let program = parse(
            "do { a = a + 1; } while (a < 10);\nfor (int i = 0; i < 3; i = i + 1) { break; }",
        )
        .unwrap();
        assert!(matches!(&program.statements[0], Stmt::DoWhile { .. }));
        let Stmt::For { init, step, body, .. } = &program.statements[1] else {
            panic!("Expected for");
        };
        assert!(matches!(init.as_ref(), Stmt::VarDecl { name, .. } if name == "i"));
        assert!(matches!(step.as_ref(), Stmt::Assign { target, .. } if target == "i"));
        assert!(matches!(body.statements[0], Stmt::Break { line: 2 }));
    }

    #[test]
    fn test_parse_for_empty_init() {
        let program = parse("for (; i < 3; i = i + 1) { }").unwrap();
        assert!(matches!(
            &program.statements[0],
            Stmt::For { init, .. } if matches!(init.as_ref(), Stmt::Empty)
        ));
    }

    #[test]
    fn test_parse_switch() {
        let program =
            parse("switch (x) { case 1: { a = 1; } case -2: { } default: { a = 0; } }").unwrap();
        let Stmt::Switch { subject, cases } = &program.statements[0] else {
            panic!("Expected switch");
        };
        assert_eq!(subject.name, "x");
        let labels: Vec<CaseLabel> = cases.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            vec![CaseLabel::Value(1), CaseLabel::Value(-2), CaseLabel::Default]
        );
    }

    #[test]
    fn test_parse_case_value_limits() {
        let program = parse(
            "switch (x) { case -9223372036854775808: { } case 9223372036854775807: { } }",
        )
        .unwrap();
        let Stmt::Switch { cases, .. } = &program.statements[0] else {
            panic!("Expected switch");
        };
        assert_eq!(cases[0].0, CaseLabel::Value(i64::MIN));
        assert_eq!(cases[1].0, CaseLabel::Value(i64::MAX));

        let err = parse("switch (x) { case 9223372036854775808: { } }").unwrap_err();
        assert!(matches!(
            err,
            ParseError::IntegerOverflow { ref literal, .. } if literal == "9223372036854775808"
        ));
        assert!(matches!(
            parse("int a = 9223372036854775808;"),
            Err(ParseError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_parse_switch_requires_case() {
        assert!(parse("switch (x) { default: { } }").is_err());
    }

    #[test]
    fn test_parse_empty_statement() {
        let program = parse(";;").unwrap();
        assert_eq!(program.statements, vec![Stmt::Empty, Stmt::Empty]);
    }

    #[test]
    fn test_parse_missing_semicolon() {
        let err = parse("int a = 1\nint b = 2;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "Semicolon"));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_parse_trailing_input() {
        let err = parse("int a = 1; }").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
    }

    #[test]
    fn test_parse_empty_source_is_error() {
        assert!(matches!(
            parse(""),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_parse_lexical_error_propagates() {
        assert!(parse("int a = 1 @ 2;").unwrap_err().is_lexical());
    }
}
