//! Таблица областей видимости.
//!
//! Области лежат в арене; родитель задаётся индексом, а не владеющей ссылкой.
//! Закрытие области удаляет её из арены.

use std::collections::HashMap;
use std::fmt;

/// Индекс области видимости в арене.
pub type ScopeId = usize;

/// Вид области: глобальная или открытая управляющей конструкцией.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    If,
    While,
    DoWhile,
    For,
    Switch,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::If => "if",
            ScopeKind::While => "while",
            ScopeKind::DoWhile => "do-while",
            ScopeKind::For => "for",
            ScopeKind::Switch => "switch",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Пространство имён символа. Имена из разных пространств не конфликтуют:
/// переменная `INTEGER` не скрывает встроенный тип.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Type,
    Value,
    Construct,
}

/// Символ таблицы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Встроенный тип.
    Builtin { name: String },
    /// Объявленная переменная.
    Var {
        name: String,
        ty: Option<String>,
        is_const: bool,
    },
    /// Маркер вложенной конструкции (только для трассы).
    Construct { kind: ScopeKind },
}

impl Symbol {
    pub fn builtin(name: impl Into<String>) -> Self {
        Symbol::Builtin { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Builtin { name } | Symbol::Var { name, .. } => name,
            Symbol::Construct { kind } => kind.as_str(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            Symbol::Builtin { .. } => Namespace::Type,
            Symbol::Var { .. } => Namespace::Value,
            Symbol::Construct { .. } => Namespace::Construct,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Builtin { name } => write!(f, "<BuiltinSymbol(name='{}')>", name),
            Symbol::Var { name, ty, is_const } => write!(
                f,
                "<VarSymbol(name='{}', type='{}'{})>",
                name,
                ty.as_deref().unwrap_or("None"),
                if *is_const { ", const" } else { "" }
            ),
            Symbol::Construct { kind } => write!(f, "<ConstructSymbol(name={})>", kind),
        }
    }
}

/// Одна область видимости.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub level: usize,
    pub enclosing: Option<ScopeId>,
    /// Символы в порядке первого объявления.
    symbols: Vec<Symbol>,
    index: HashMap<(Namespace, String), usize>,
}

impl Scope {
    fn new(kind: ScopeKind, level: usize, enclosing: Option<ScopeId>) -> Self {
        Self {
            kind,
            level,
            enclosing,
            symbols: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Вставить символ; возвращает заменённый, если имя уже было в том же
    /// пространстве имён.
    fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        let key = (symbol.namespace(), symbol.name().to_string());
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.symbols[slot], symbol)),
            None => {
                self.index.insert(key, self.symbols.len());
                self.symbols.push(symbol);
                None
            }
        }
    }

    pub fn get(&self, namespace: Namespace, name: &str) -> Option<&Symbol> {
        self.index
            .get(&(namespace, name.to_string()))
            .map(|&slot| &self.symbols[slot])
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Человекочитаемый дамп таблицы символов.
    pub fn dump(&self, enclosing: Option<ScopeKind>) -> Vec<String> {
        let h1 = "SCOPE (SCOPED SYMBOL TABLE)";
        let h2 = "Scope (Scoped symbol table) contents";
        let mut lines = vec![
            h1.to_string(),
            "=".repeat(h1.len()),
            format!("{:<15}: {}", "Scope name", self.kind),
            format!("{:<15}: {}", "Scope level", self.level),
            format!(
                "{:<15}: {}",
                "Enclosing scope",
                enclosing.map_or("None", ScopeKind::as_str)
            ),
            h2.to_string(),
            "-".repeat(h2.len()),
        ];
        lines.extend(
            self.symbols
                .iter()
                .map(|symbol| format!("{:>7}: {}", symbol.name(), symbol)),
        );
        lines
    }
}

/// Арена областей видимости с текущей цепочкой.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    current: Option<ScopeId>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Открыть дочернюю область текущей.
    pub fn push(&mut self, kind: ScopeKind) -> ScopeId {
        let level = self.current().map_or(1, |scope| scope.level + 1);
        let id = self.scopes.len();
        self.scopes.push(Scope::new(kind, level, self.current));
        self.current = Some(id);
        id
    }

    /// Закрыть текущую область и вернуть её вместе с видом родителя.
    pub fn pop(&mut self) -> Option<(Scope, Option<ScopeKind>)> {
        let id = self.current?;
        // Области закрываются строго в обратном порядке открытия.
        debug_assert_eq!(id + 1, self.scopes.len());
        let scope = self.scopes.pop()?;
        self.current = scope.enclosing;
        let parent = self.current().map(|s| s.kind);
        Some((scope, parent))
    }

    pub fn current(&self) -> Option<&Scope> {
        self.current.and_then(|id| self.scopes.get(id))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Вставить символ в текущую область.
    pub fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        let id = self.current?;
        self.scopes[id].insert(symbol)
    }

    /// Найти символ только в текущей области.
    pub fn lookup_current(&self, namespace: Namespace, name: &str) -> Option<&Symbol> {
        self.current().and_then(|scope| scope.get(namespace, name))
    }

    /// Найти символ по цепочке объемлющих областей.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<&Symbol> {
        let mut next = self.current;
        while let Some(id) = next {
            let scope = &self.scopes[id];
            if let Some(symbol) = scope.get(namespace, name) {
                return Some(symbol);
            }
            next = scope.enclosing;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Symbol {
        Symbol::Var {
            name: name.to_string(),
            ty: Some("INTEGER".to_string()),
            is_const: false,
        }
    }

    #[test]
    fn test_levels_and_enclosing() {
        let mut table = ScopeTable::new();
        let global = table.push(ScopeKind::Global);
        let inner = table.push(ScopeKind::While);

        let scope = table.current().unwrap();
        assert_eq!(scope.level, 2);
        assert_eq!(scope.enclosing, Some(global));
        assert_ne!(global, inner);
    }

    #[test]
    fn test_lookup_walks_outward() {
        let mut table = ScopeTable::new();
        table.push(ScopeKind::Global);
        table.insert(var("a"));
        table.push(ScopeKind::If);
        table.insert(var("b"));

        assert!(table.lookup(Namespace::Value, "a").is_some());
        assert!(table.lookup(Namespace::Value, "b").is_some());
        assert!(table.lookup_current(Namespace::Value, "a").is_none());

        table.pop();
        assert!(table.lookup(Namespace::Value, "b").is_none());
        assert!(table.lookup(Namespace::Value, "a").is_some());
    }

    #[test]
    fn test_insert_replaces_and_keeps_order() {
        let mut table = ScopeTable::new();
        table.push(ScopeKind::Global);
        table.insert(var("x"));
        table.insert(var("y"));
        let previous = table.insert(Symbol::Var {
            name: "x".to_string(),
            ty: None,
            is_const: true,
        });

        assert_eq!(previous, Some(var("x")));
        let names: Vec<&str> = table
            .current()
            .unwrap()
            .symbols()
            .iter()
            .map(Symbol::name)
            .collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(matches!(
            table.lookup(Namespace::Value, "x"),
            Some(Symbol::Var { is_const: true, .. })
        ));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let mut table = ScopeTable::new();
        table.push(ScopeKind::Global);
        table.insert(Symbol::builtin("INTEGER"));
        let previous = table.insert(var("INTEGER"));

        assert_eq!(previous, None);
        assert!(matches!(
            table.lookup(Namespace::Type, "INTEGER"),
            Some(Symbol::Builtin { .. })
        ));
        assert!(matches!(
            table.lookup(Namespace::Value, "INTEGER"),
            Some(Symbol::Var { .. })
        ));
        assert!(table.lookup(Namespace::Value, "REAL").is_none());
        assert_eq!(table.current().unwrap().symbols().len(), 2);
    }

    #[test]
    fn test_pop_reports_parent() {
        let mut table = ScopeTable::new();
        table.push(ScopeKind::Global);
        table.push(ScopeKind::For);

        let (scope, parent) = table.pop().unwrap();
        assert_eq!(scope.kind, ScopeKind::For);
        assert_eq!(parent, Some(ScopeKind::Global));

        let (_, parent) = table.pop().unwrap();
        assert_eq!(parent, None);
        assert!(table.pop().is_none());
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_dump_lists_symbols() {
        let mut table = ScopeTable::new();
        table.push(ScopeKind::Global);
        table.insert(Symbol::builtin("INTEGER"));
        table.insert(var("a"));

        let lines = table.current().unwrap().dump(None);
        assert!(lines.contains(&"Scope name     : global".to_string()));
        assert!(lines.contains(&"Enclosing scope: None".to_string()));
        assert!(lines
            .iter()
            .any(|l| l == "      a: <VarSymbol(name='a', type='INTEGER')>"));
    }
}
