//! # TAC Compiler
//!
//! Компилятор небольшого C-подобного языка в трёхадресный код.
//!
//! ## Основные модули
//!
//! - [`parser`] - лексер и парсер рекурсивного спуска
//! - [`ast`] - абстрактное синтаксическое дерево
//! - [`semantic`] - области видимости и проверка объявлений
//! - [`codegen`] - генерация трёхадресного IR
//! - [`diagnostics`] - каналы предупреждений, ошибок и трассы областей
//! - [`compiler`] - конвейер компиляции и его настройки
//!
//! ## Пример
//!
//! ```rust
//! use tac_compiler::compile_str;
//!
//! let compilation = compile_str("int a = 3; int b = 4; int c = a + b * 2;").unwrap();
//! assert_eq!(
//!     compilation.ir_lines(),
//!     vec![
//!         "(=, 3, , a)",
//!         "(=, 4, , b)",
//!         "(*, b, 2, R0)",
//!         "(+, a, R0, R1)",
//!         "(=, R1, , c)",
//!     ]
//! );
//! ```

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod semantic;

// === Re-exports для удобства ===
pub use codegen::{CodeGenerator, CodegenOptions, Instr};
pub use compiler::{compile, compile_file, compile_str, CompileOptions, Compilation};
pub use diagnostics::{Diagnostics, LogSink, Sink};
pub use error::{CompileError, CompileResult, SemanticError};
pub use parser::{parse, ParseError};
pub use semantic::{analyze, SemanticAnalyzer};
