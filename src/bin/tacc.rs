//! tacc - компилятор в трёхадресный код.
//!
//! Использование:
//!   tacc                - запустить REPL
//!   tacc <file>         - скомпилировать файл
//!   tacc -e "source"    - скомпилировать строку
//!   tacc --help         - справка

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs;
use std::process;

use tac_compiler::parser::{parse, tokenize};
use tac_compiler::{compile, CompileOptions, Compilation, Diagnostics, LogSink};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
tacc - compiler for a small C-like language into three-address code

USAGE:
    tacc                      Start REPL (interactive mode)
    tacc <file> [FLAGS]       Compile a source file, print IR
    tacc -e "<src>" [FLAGS]   Compile inline source
    tacc --help, -h           Show this help
    tacc --version, -v        Show version

FLAGS:
    --json                    Print IR as JSON
    --ast                     Print the AST as JSON instead of IR
    --tokens                  Print the token stream instead of IR
    --scopes                  Print the scope trace to stdout
    --lower-break             Lower `break` to a jump out of the loop/switch
    --strict                  Do not generate IR after a semantic error
    --config <file.json>      Load compile options from a JSON file

REPL COMMANDS:
    :help, :h                 Show help
    :quit, :q, :exit          Exit REPL
    :tokens <src>             Show tokens
    :ast <src>                Show AST
    :scopes <src>             Show scope trace
    :strict                   Toggle strict mode
    :break                    Toggle break lowering

EXAMPLE:
    tacc -e "int a = 3; int b = 4; int c = a + b * 2;"
"#;

/// Что печатать.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Ir,
    Json,
    Ast,
    Tokens,
}

/// Разобранные аргументы командной строки.
struct Cli {
    source: Option<Source>,
    emit: Emit,
    show_scopes: bool,
    options: CompileOptions,
}

enum Source {
    File(String),
    Inline(String),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => return,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    match cli.source {
        None => run_repl(cli.options),
        Some(Source::File(ref path)) => {
            let source = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("Error reading file '{}': {}", path, e);
                    process::exit(1);
                }
            };
            run_source(&source, &cli);
        }
        Some(Source::Inline(ref source)) => run_source(source, &cli),
    }
}

/// Разобрать аргументы. `Ok(None)`: справка или версия уже напечатаны.
///
/// `--config` задаёт основу, `--strict` и `--lower-break` применяются
/// поверх неё независимо от порядка флагов.
fn parse_args(args: &[String]) -> Result<Option<Cli>, String> {
    let mut cli = Cli {
        source: None,
        emit: Emit::Ir,
        show_scopes: false,
        options: CompileOptions::default(),
    };
    let mut strict = false;
    let mut lower_break = false;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", HELP);
                return Ok(None);
            }
            "--version" | "-v" => {
                println!("tacc {}", VERSION);
                return Ok(None);
            }
            "-e" | "--eval" => {
                let source = iter.next().ok_or("Missing source after -e")?;
                cli.set_source(Source::Inline(source.clone()))?;
            }
            "--json" => cli.emit = Emit::Json,
            "--ast" => cli.emit = Emit::Ast,
            "--tokens" => cli.emit = Emit::Tokens,
            "--scopes" => cli.show_scopes = true,
            "--lower-break" => lower_break = true,
            "--strict" => strict = true,
            "--config" => {
                let path = iter.next().ok_or("Missing path after --config")?;
                let json = fs::read_to_string(path)
                    .map_err(|e| format!("Error reading config '{}': {}", path, e))?;
                cli.options = CompileOptions::from_json(&json).map_err(|e| e.to_string())?;
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
            file => cli.set_source(Source::File(file.to_string()))?,
        }
    }

    if strict {
        cli.options.codegen_on_semantic_error = false;
    }
    if lower_break {
        cli.options.codegen.lower_break = true;
    }
    Ok(Some(cli))
}

impl Cli {
    fn set_source(&mut self, source: Source) -> Result<(), String> {
        if self.source.is_some() {
            return Err("Only one source may be given.".to_string());
        }
        self.source = Some(source);
        Ok(())
    }
}

/// Диагностика CLI: предупреждения и ошибки в stderr, трасса по желанию.
fn cli_diagnostics(show_scopes: bool) -> Diagnostics {
    let diagnostics = Diagnostics::new()
        .with_warning_sink(|line: &str| eprintln!("{}", line))
        .with_error_sink(|line: &str| eprintln!("{}", line));
    if show_scopes {
        diagnostics.with_scope_sink(|line: &str| println!("{}", line))
    } else {
        diagnostics.with_scope_sink(LogSink::new(log::Level::Debug, "tacc::scopes"))
    }
}

fn run_source(source: &str, cli: &Cli) {
    match cli.emit {
        Emit::Tokens => {
            if !show_tokens(source) {
                process::exit(1);
            }
            return;
        }
        Emit::Ast => {
            if !show_ast(source) {
                process::exit(1);
            }
            return;
        }
        Emit::Ir | Emit::Json => {}
    }

    let mut diagnostics = cli_diagnostics(cli.show_scopes);
    match compile(source, &cli.options, &mut diagnostics) {
        Ok(compilation) => {
            print_compilation(&compilation, cli.emit);
            if !compilation.is_clean() {
                eprintln!("note: IR generated despite a semantic error (use --strict to refuse)");
            }
        }
        Err(e) => {
            // Ошибки разбора и анализа уже записаны в канал ошибок.
            if !diagnostics.has_errors() {
                eprintln!("{}", e);
            }
            process::exit(1);
        }
    }
}

fn print_compilation(compilation: &Compilation, emit: Emit) {
    if emit == Emit::Json {
        match serde_json::to_string_pretty(&compilation.instructions) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Serialization error: {}", e),
        }
    } else {
        print!("{}", compilation.ir_text());
    }
}

fn show_tokens(source: &str) -> bool {
    match tokenize(source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{:>4}  {}", token.span.line, token.value);
            }
            true
        }
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    }
}

fn show_ast(source: &str) -> bool {
    let program = match parse(source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            return false;
        }
    };
    match serde_json::to_string_pretty(&program) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            false
        }
    }
}

/// Запустить REPL. Каждая строка компилируется отдельно.
fn run_repl(mut options: CompileOptions) {
    println!("tacc {} - three-address code compiler", VERSION);
    println!("Type :help for commands, :quit to exit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            process::exit(1);
        }
    };

    let history_path = dirs_next::data_dir()
        .map(|p| p.join("tacc").join("history.txt"))
        .unwrap_or_else(|| std::path::PathBuf::from(".tacc_history"));

    // Загрузить историю
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("tacc> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    if !handle_command(line, &mut options) {
                        break;
                    }
                    continue;
                }

                let mut diagnostics = cli_diagnostics(false);
                if let Ok(compilation) = compile(line, &options, &mut diagnostics) {
                    print_compilation(&compilation, Emit::Ir);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    // Сохранить историю
    if let Some(parent) = history_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);
}

/// Обработать команду REPL. Возвращает `false` для выхода.
fn handle_command(cmd: &str, options: &mut CompileOptions) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match (command, arg) {
        (":help" | ":h", _) => println!("{}", HELP),
        (":quit" | ":q" | ":exit", _) => return false,
        (":tokens", Some(src)) => {
            show_tokens(src);
        }
        (":ast", Some(src)) => {
            show_ast(src);
        }
        (":scopes", Some(src)) => {
            let mut diagnostics = cli_diagnostics(true);
            let _ = compile(src, options, &mut diagnostics);
        }
        (":tokens" | ":ast" | ":scopes", None) => println!("Usage: {} <source>", command),
        (":strict", _) => {
            options.codegen_on_semantic_error = !options.codegen_on_semantic_error;
            println!("Strict mode: {}", !options.codegen_on_semantic_error);
        }
        (":break", _) => {
            options.codegen.lower_break = !options.codegen.lower_break;
            println!("Break lowering: {}", options.codegen.lower_break);
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type :help for available commands.");
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_survive_config_in_any_order() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("tacc.json");
        fs::write(&config, r#"{"codegen_on_semantic_error": true}"#).unwrap();
        let config = config.to_string_lossy().to_string();

        for list in [
            vec!["--strict", "--lower-break", "--config", config.as_str(), "-e", "int a;"],
            vec!["-e", "int a;", "--config", config.as_str(), "--strict", "--lower-break"],
        ] {
            let cli = parse_args(&args(&list)).unwrap().unwrap();
            assert!(!cli.options.codegen_on_semantic_error);
            assert!(cli.options.codegen.lower_break);
        }
    }

    #[test]
    fn test_config_alone_sets_options() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("tacc.json");
        fs::write(&config, r#"{"codegen": {"lower_break": true}}"#).unwrap();
        let config = config.to_string_lossy().to_string();

        let cli = parse_args(&args(&["--config", config.as_str()]))
            .unwrap()
            .unwrap();
        assert!(cli.options.codegen_on_semantic_error);
        assert!(cli.options.codegen.lower_break);
        assert!(cli.source.is_none());
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.src", "b.src"])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
    }
}
