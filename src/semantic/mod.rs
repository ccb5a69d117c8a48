//! Семантический анализ.
//!
//! Проверяет, что каждое использование переменной видит её объявление в
//! текущей цепочке областей. AST не изменяется. Повторное объявление в той же
//! области даёт предупреждение, неизвестная переменная даёт фатальную ошибку,
//! прерывающую анализ.

pub mod scope;

pub use scope::{Namespace, Scope, ScopeId, ScopeKind, ScopeTable, Symbol};

use crate::ast::{Block, Expr, Program, Stmt, TypeSpec, VarRef};
use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;

/// Встроенные типы глобальной области.
const BUILTIN_TYPES: [&str; 2] = ["INTEGER", "REAL"];

/// Обходчик AST, строящий области видимости.
pub struct SemanticAnalyzer<'d> {
    scopes: ScopeTable,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> SemanticAnalyzer<'d> {
    /// Создать анализатор, пишущий в переданные каналы диагностики.
    pub fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            scopes: ScopeTable::new(),
            diagnostics,
        }
    }

    /// Проверить программу.
    pub fn analyze(&mut self, program: &Program) -> Result<(), SemanticError> {
        self.scopes = ScopeTable::new();
        self.enter(ScopeKind::Global);
        for name in BUILTIN_TYPES {
            self.scopes.insert(Symbol::builtin(name));
        }

        for stmt in &program.statements {
            self.visit_stmt(stmt)?;
        }

        self.leave();
        Ok(())
    }

    fn enter(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
        log::debug!("ENTER scope: {} (depth {})", kind, self.scopes.depth());
    }

    fn leave(&mut self) {
        if let Some((scope, parent)) = self.scopes.pop() {
            for line in scope.dump(parent) {
                self.diagnostics.scope(line);
            }
            log::debug!("LEAVE scope: {} (depth {})", scope.kind, self.scopes.depth());
        }
    }

    /// Записать ошибку в канал ошибок и вернуть её.
    fn fail(&mut self, error: SemanticError) -> SemanticError {
        self.diagnostics.error(error.to_string());
        error
    }

    fn resolve(&mut self, name: &str, line: usize) -> Result<(), SemanticError> {
        if let Some(Symbol::Var { .. }) = self.scopes.lookup(Namespace::Value, name) {
            return Ok(());
        }
        Err(self.fail(SemanticError::UndefinedVariable {
            name: name.to_string(),
            line,
        }))
    }

    /// Открыть область конструкции, предварительно отметив её в текущей.
    fn with_construct<F>(&mut self, kind: ScopeKind, body: F) -> Result<(), SemanticError>
    where
        F: FnOnce(&mut Self) -> Result<(), SemanticError>,
    {
        self.scopes.insert(Symbol::Construct { kind });
        self.enter(kind);
        body(self)?;
        self.leave();
        Ok(())
    }

    /// Обойти оператор. Для объявления и присваивания возвращает имя
    /// переменной (нужно заголовку `for`).
    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Option<String>, SemanticError> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match stmt {
            Stmt::VarDecl {
                name,
                declared_type,
                initializer,
                is_const,
                line,
            } => {
                self.visit_var_decl(name, *declared_type, *is_const, *line)?;
                if let Some(init) = initializer {
                    self.visit_expr(init)?;
                }
                Ok(Some(name.clone()))
            }
            Stmt::Assign {
                target,
                value,
                line,
            } => {
                self.resolve(target, *line)?;
                self.visit_expr(value)?;
                Ok(Some(target.clone()))
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => {
                self.with_construct(ScopeKind::If, |this| {
                    this.visit_expr(condition)?;
                    this.visit_block(then_block)?;
                    if let Some(else_block) = else_block {
                        this.visit_block(else_block)?;
                    }
                    Ok(())
                })?;
                Ok(None)
            }
            Stmt::While { condition, body } => {
                self.with_construct(ScopeKind::While, |this| {
                    this.visit_expr(condition)?;
                    this.visit_block(body)
                })?;
                Ok(None)
            }
            Stmt::DoWhile { body, condition } => {
                self.with_construct(ScopeKind::DoWhile, |this| {
                    this.visit_block(body)?;
                    this.visit_expr(condition)
                })?;
                Ok(None)
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                self.with_construct(ScopeKind::For, |this| {
                    if let Some(name) = this.visit_stmt(init)? {
                        this.resolve(&name, stmt_line(init))?;
                    }
                    this.visit_expr(condition)?;
                    this.visit_block(body)?;
                    this.visit_stmt(step)?;
                    Ok(())
                })?;
                Ok(None)
            }
            Stmt::Switch { subject, cases } => {
                self.visit_var(subject)?;
                self.with_construct(ScopeKind::Switch, |this| {
                    for (_, block) in cases {
                        this.visit_block(block)?;
                    }
                    Ok(())
                })?;
                Ok(None)
            }
            Stmt::Break { .. } | Stmt::Empty => Ok(None),
        })
    }

    fn visit_var_decl(
        &mut self,
        name: &str,
        declared_type: TypeSpec,
        is_const: bool,
        line: usize,
    ) -> Result<(), SemanticError> {
        let type_name = declared_type.builtin_name();
        let ty = match self.scopes.lookup(Namespace::Type, type_name) {
            Some(Symbol::Builtin { name }) => Some(name.clone()),
            _ => None,
        };
        let Some(ty) = ty else {
            return Err(self.fail(SemanticError::UnknownType {
                name: type_name.to_string(),
                line,
            }));
        };

        if self.scopes.lookup_current(Namespace::Value, name).is_some() {
            self.diagnostics.warn(format!(
                "Warning: Duplicate identifier {} found at line: {}",
                name, line
            ));
        }
        self.scopes.insert(Symbol::Var {
            name: name.to_string(),
            ty: Some(ty),
            is_const,
        });
        Ok(())
    }

    fn visit_block(&mut self, block: &Block) -> Result<(), SemanticError> {
        for stmt in &block.statements {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_var(&mut self, var: &VarRef) -> Result<(), SemanticError> {
        self.resolve(&var.name, var.line)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match expr {
            Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
                self.visit_expr(left)?;
                self.visit_expr(right)
            }
            Expr::UnaryOp { operand, .. } => self.visit_expr(operand),
            Expr::Var(var) => self.visit_var(var),
            Expr::Number(_) | Expr::Bool(_) => Ok(()),
        })
    }
}

/// Строка, к которой относится оператор заголовка `for`.
fn stmt_line(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::VarDecl { line, .. } | Stmt::Assign { line, .. } => *line,
        _ => 0,
    }
}

/// Проверить программу, записывая диагностику в `diagnostics`.
pub fn analyze(program: &Program, diagnostics: &mut Diagnostics) -> Result<(), SemanticError> {
    SemanticAnalyzer::new(diagnostics).analyze(program)
}
