//! Модуль `compiler`
//!
//! Конвейер одной единицы компиляции:
//! текст → токены → AST → семантический анализ → IR.
//!
//! Лексические и синтаксические ошибки прерывают компиляцию до генерации.
//! Что делать после семантической ошибки, решает
//! [`CompileOptions::codegen_on_semantic_error`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::Program;
use crate::codegen::{self, CodegenOptions, Instr};
use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, CompileResult, SemanticError};
use crate::parser;
use crate::semantic;

/// Конфигурация компиляции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Генерировать IR даже после семантической ошибки.
    /// Ошибка тогда возвращается в [`Compilation::semantic_error`].
    pub codegen_on_semantic_error: bool,
    /// Настройки генератора.
    pub codegen: CodegenOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            codegen_on_semantic_error: true,
            codegen: CodegenOptions::default(),
        }
    }
}

impl CompileOptions {
    /// Не генерировать IR после семантической ошибки.
    pub fn strict() -> Self {
        Self {
            codegen_on_semantic_error: false,
            ..Self::default()
        }
    }

    /// Прочитать настройки из JSON.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::ConfigError(e.to_string()))
    }
}

/// Результат компиляции одной единицы.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub program: Program,
    pub instructions: Vec<Instr>,
    /// Семантическая ошибка, после которой генерация всё же выполнялась.
    pub semantic_error: Option<SemanticError>,
}

impl Compilation {
    /// IR в текстовом виде, по строке на инструкцию.
    pub fn ir_text(&self) -> String {
        codegen::render(&self.instructions)
    }

    pub fn ir_lines(&self) -> Vec<String> {
        self.instructions.iter().map(ToString::to_string).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.semantic_error.is_none()
    }
}

/// Скомпилировать исходный текст.
pub fn compile(
    source: &str,
    options: &CompileOptions,
    diagnostics: &mut Diagnostics,
) -> CompileResult<Compilation> {
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(e) => {
            diagnostics.error(e.to_string());
            return Err(e.into());
        }
    };

    let semantic_error = match semantic::analyze(&program, diagnostics) {
        Ok(()) => None,
        Err(e) if options.codegen_on_semantic_error => {
            log::warn!("continuing to code generation after semantic error: {}", e);
            Some(e)
        }
        Err(e) => return Err(e.into()),
    };

    let instructions = codegen::generate(&program, options.codegen);
    Ok(Compilation {
        program,
        instructions,
        semantic_error,
    })
}

/// Прочитать файл и скомпилировать его.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
    diagnostics: &mut Diagnostics,
) -> CompileResult<Compilation> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| CompileError::IoError(format!("{}: {}", path.display(), e)))?;
    compile(&source, options, diagnostics)
}

/// Скомпилировать с настройками по умолчанию и буферизованной диагностикой.
pub fn compile_str(source: &str) -> CompileResult<Compilation> {
    compile(source, &CompileOptions::default(), &mut Diagnostics::new())
}
