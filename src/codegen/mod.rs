//! Генерация трёхадресного кода.
//!
//! Второй независимый обход AST. Генератор считает дерево уже проверенным и
//! сам ничего не валидирует. Счётчики регистров и меток принадлежат экземпляру
//! генератора: новый генератор на каждую единицу компиляции.

pub mod ir;

pub use ir::{render, Instr, Label, Opcode, Operand, Register};

use serde::{Deserialize, Serialize};

use crate::ast::{Block, CaseLabel, Expr, Program, Stmt, UnaryOp, VarRef};

/// Настройки генератора.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    /// Понижать `break` в переход на выход из ближайшего цикла или `switch`.
    /// По умолчанию `break` не генерирует ничего.
    pub lower_break: bool,
}

/// Генератор IR.
#[derive(Debug)]
pub struct CodeGenerator {
    options: CodegenOptions,
    next_register: usize,
    next_label: usize,
    out: Vec<Instr>,
    /// Метки выхода объемлющих циклов и `switch` (только при `lower_break`).
    exits: Vec<Label>,
}

impl CodeGenerator {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            options,
            next_register: 0,
            next_label: 1,
            out: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Сгенерировать IR программы.
    pub fn generate(mut self, program: &Program) -> Vec<Instr> {
        for stmt in &program.statements {
            self.visit_stmt(stmt);
        }
        log::debug!(
            "generated {} instructions, {} registers, {} labels",
            self.out.len(),
            self.next_register,
            self.next_label - 1
        );
        self.out
    }

    fn new_register(&mut self) -> Register {
        let register = Register(self.next_register);
        self.next_register += 1;
        register
    }

    fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn emit(&mut self, instr: Instr) {
        log::trace!("{}", instr);
        self.out.push(instr);
    }

    fn emit_op(&mut self, opcode: Opcode, arg1: Operand, arg2: Option<Operand>) -> Operand {
        let dest = Operand::Register(self.new_register());
        self.emit(Instr::Op {
            opcode,
            arg1,
            arg2,
            dest: dest.clone(),
        });
        dest
    }

    fn emit_copy(&mut self, value: Operand, name: &str) {
        self.emit(Instr::Op {
            opcode: Opcode::Copy,
            arg1: value,
            arg2: None,
            dest: Operand::Var(name.to_string()),
        });
    }

    /// Выполнить `body` с меткой выхода на стеке `break`.
    fn with_exit<F: FnOnce(&mut Self)>(&mut self, exit: Option<Label>, body: F) {
        match exit {
            Some(label) => {
                self.exits.push(label);
                body(self);
                self.exits.pop();
            }
            None => body(self),
        }
    }

    /// Метка выхода, если включено понижение `break`.
    fn exit_label(&mut self) -> Option<Label> {
        if self.options.lower_break {
            Some(self.new_label())
        } else {
            None
        }
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match stmt {
            Stmt::VarDecl {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    let value = self.visit_expr(init);
                    self.emit_copy(value, name);
                }
            }
            Stmt::Assign { target, value, .. } => {
                let value = self.visit_expr(value);
                self.emit_copy(value, target);
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => self.visit_if(condition, then_block, else_block.as_ref()),
            Stmt::While { condition, body } => {
                let top = self.new_label();
                self.emit(Instr::Label(top));
                let cond = self.visit_expr(condition);
                let bottom = self.new_label();
                self.emit(Instr::JumpIfFalse {
                    target: bottom,
                    cond,
                });
                let exit = self.options.lower_break.then_some(bottom);
                self.with_exit(exit, |this| this.visit_block(body));
                self.emit(Instr::Jump(top));
                self.emit(Instr::Label(bottom));
            }
            Stmt::DoWhile { body, condition } => {
                let top = self.new_label();
                self.emit(Instr::Label(top));
                let exit = self.exit_label();
                self.with_exit(exit, |this| this.visit_block(body));
                let cond = self.visit_expr(condition);
                self.emit(Instr::JumpIfTrue { target: top, cond });
                if let Some(exit) = exit {
                    self.emit(Instr::Label(exit));
                }
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                self.visit_stmt(init);
                let top = self.new_label();
                self.emit(Instr::Label(top));
                let cond = self.visit_expr(condition);
                let bottom = self.new_label();
                self.emit(Instr::JumpIfFalse {
                    target: bottom,
                    cond,
                });
                let exit = self.options.lower_break.then_some(bottom);
                self.with_exit(exit, |this| this.visit_block(body));
                self.visit_stmt(step);
                self.emit(Instr::Jump(top));
                self.emit(Instr::Label(bottom));
            }
            Stmt::Switch { subject, cases } => self.visit_switch(subject, cases),
            Stmt::Break { line } => {
                if !self.options.lower_break {
                    return;
                }
                match self.exits.last().copied() {
                    Some(exit) => self.emit(Instr::Jump(exit)),
                    None => log::warn!("break outside of loop or switch at line {}", line),
                }
            }
            Stmt::Empty => {}
        })
    }

    /// `jfalse La, c; then; [jmp Lb; La:; else; Lb:] | [La:]`
    fn visit_if(&mut self, condition: &Expr, then_block: &Block, else_block: Option<&Block>) {
        let cond = self.visit_expr(condition);
        let else_label = self.new_label();
        self.emit(Instr::JumpIfFalse {
            target: else_label,
            cond,
        });
        self.visit_block(then_block);

        match else_block {
            Some(else_block) => {
                let end = self.new_label();
                self.emit(Instr::Jump(end));
                self.emit(Instr::Label(else_label));
                self.visit_block(else_block);
                self.emit(Instr::Label(end));
            }
            None => self.emit(Instr::Label(else_label)),
        }
    }

    /// Последовательная проверка ветвей без таблицы переходов.
    ///
    /// Метки ветвей выделяются заранее, поэтому `jfalse` каждой проверки
    /// указывает на метку следующей ветви даже при вложенных конструкциях.
    /// Блоки идут подряд: без `break` управление проваливается в следующую
    /// проверку.
    fn visit_switch(&mut self, subject: &VarRef, cases: &[(CaseLabel, Block)]) {
        let last_guarded = matches!(cases.last(), Some((CaseLabel::Value(_), _)));
        let label_count = if last_guarded || self.options.lower_break {
            cases.len() + 1
        } else {
            cases.len()
        };
        let labels: Vec<Label> = (0..label_count).map(|_| self.new_label()).collect();
        let exit = (label_count > cases.len()).then(|| labels[cases.len()]);
        let exit_for_break = if self.options.lower_break { exit } else { None };

        for (i, (case_label, block)) in cases.iter().enumerate() {
            self.emit(Instr::Label(labels[i]));
            if let CaseLabel::Value(value) = case_label {
                let test = self.emit_op(
                    Opcode::CaseEqual,
                    Operand::Var(subject.name.clone()),
                    Some(Operand::Number(*value)),
                );
                self.emit(Instr::JumpIfFalse {
                    target: labels[i + 1],
                    cond: test,
                });
            }
            self.with_exit(exit_for_break, |this| this.visit_block(block));
        }

        if let Some(exit) = exit {
            self.emit(Instr::Label(exit));
        }
    }

    fn visit_expr(&mut self, expr: &Expr) -> Operand {
        stacker::maybe_grow(64 * 1024, 2 * 1024 * 1024, || match expr {
            Expr::Number(n) => Operand::Number(*n),
            Expr::Bool(b) => Operand::Bool(*b),
            Expr::Var(var) => Operand::Var(var.name.clone()),
            Expr::BinOp { left, op, right } => {
                let left = self.visit_expr(left);
                let right = self.visit_expr(right);
                self.emit_op(Opcode::Arith(*op), left, Some(right))
            }
            Expr::BoolOp { left, op, right } => {
                let left = self.visit_expr(left);
                let right = self.visit_expr(right);
                self.emit_op(Opcode::Relation(*op), left, Some(right))
            }
            Expr::UnaryOp { op, operand } => {
                let value = self.visit_expr(operand);
                match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => self.emit_op(Opcode::Negate, value, None),
                    UnaryOp::Not => self.emit_op(Opcode::Not, value, None),
                }
            }
        })
    }
}

/// Сгенерировать IR программы новым генератором.
pub fn generate(program: &Program, options: CodegenOptions) -> Vec<Instr> {
    CodeGenerator::new(options).generate(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::HashSet;

    fn ir(source: &str) -> Vec<String> {
        ir_with(source, CodegenOptions::default())
    }

    fn ir_with(source: &str, options: CodegenOptions) -> Vec<String> {
        let program = parse(source).unwrap();
        generate(&program, options)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_straight_line_example() {
        assert_eq!(
            ir("int a = 3; int b = 4; int c = a + b * 2;"),
            vec![
                "(=, 3, , a)",
                "(=, 4, , b)",
                "(*, b, 2, R0)",
                "(+, a, R0, R1)",
                "(=, R1, , c)",
            ]
        );
    }

    #[test]
    fn test_declaration_without_initializer_emits_nothing() {
        assert!(ir("int a; ;").is_empty());
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            ir("int a = -b; a = +a; a = -(a - 1);"),
            vec![
                "(uminus, b, , R0)",
                "(=, R0, , a)",
                "(=, a, , a)",
                "(-, a, 1, R1)",
                "(uminus, R1, , R2)",
                "(=, R2, , a)",
            ]
        );
    }

    #[test]
    fn test_while_shape() {
        assert_eq!(
            ir("while (i < 10) { i = i + 1; }"),
            vec![
                "L1:",
                "(LESS, i, 10, R0)",
                "(jfalse, L2, R0, )",
                "(+, i, 1, R1)",
                "(=, R1, , i)",
                "(jmp, L1, , )",
                "L2:",
            ]
        );
    }

    #[test]
    fn test_do_while_shape() {
        assert_eq!(
            ir("do { i = i - 1; } while (i > 0);"),
            vec![
                "L1:",
                "(-, i, 1, R0)",
                "(=, R0, , i)",
                "(GREATER, i, 0, R1)",
                "(jtrue, L1, R1, )",
            ]
        );
    }

    #[test]
    fn test_for_shape_step_after_body() {
        assert_eq!(
            ir("for (int i = 0; i < 3; i = i + 1) { s = s + i; }"),
            vec![
                "(=, 0, , i)",
                "L1:",
                "(LESS, i, 3, R0)",
                "(jfalse, L2, R0, )",
                "(+, s, i, R1)",
                "(=, R1, , s)",
                "(+, i, 1, R2)",
                "(=, R2, , i)",
                "(jmp, L1, , )",
                "L2:",
            ]
        );
    }

    #[test]
    fn test_if_without_else() {
        assert_eq!(
            ir("if (a == 1) { a = 2; }"),
            vec![
                "(EQUAL, a, 1, R0)",
                "(jfalse, L1, R0, )",
                "(=, 2, , a)",
                "L1:",
            ]
        );
    }

    #[test]
    fn test_if_else_places_both_targets() {
        assert_eq!(
            ir("if (a) { a = 1; } else { a = 2; a = 3; }"),
            vec![
                "(jfalse, L1, a, )",
                "(=, 1, , a)",
                "(jmp, L2, , )",
                "L1:",
                "(=, 2, , a)",
                "(=, 3, , a)",
                "L2:",
            ]
        );
    }

    #[test]
    fn test_switch_dispatch_order() {
        assert_eq!(
            ir("switch (x) { case 1: { a = 1; } case 2: { a = 2; } default: { a = 3; } }"),
            vec![
                "L1:",
                "(equal, x, 1, R0)",
                "(jfalse, L2, R0, )",
                "(=, 1, , a)",
                "L2:",
                "(equal, x, 2, R1)",
                "(jfalse, L3, R1, )",
                "(=, 2, , a)",
                "L3:",
                "(=, 3, , a)",
            ]
        );
    }

    #[test]
    fn test_switch_negative_case_and_trailing_label() {
        assert_eq!(
            ir("switch (x) { case -1: { } }"),
            vec!["L1:", "(equal, x, -1, R0)", "(jfalse, L2, R0, )", "L2:"]
        );
    }

    #[test]
    fn test_switch_nested_labels_keep_case_targets() {
        let lines = ir("switch (x) { case 1: { while (a) { } } case 2: { } default: { } }");
        let jfalse: Vec<&String> = lines
            .iter()
            .filter(|l| l.starts_with("(jfalse"))
            .collect();
        // Первая проверка ветви ведёт на метку второй ветви, а не на метку цикла.
        assert_eq!(jfalse[0], "(jfalse, L2, R0, )");
        let second = lines.iter().position(|l| l == "L2:").unwrap();
        assert_eq!(lines[second + 1], "(equal, x, 2, R1)");
    }

    #[test]
    fn test_break_is_noop_by_default() {
        let with_break = ir("while (a) { break; }");
        let without = ir("while (a) { }");
        assert_eq!(with_break, without);
    }

    #[test]
    fn test_break_lowered_when_enabled() {
        let options = CodegenOptions { lower_break: true };
        assert_eq!(
            ir_with("while (a) { break; }", options),
            vec![
                "L1:",
                "(jfalse, L2, a, )",
                "(jmp, L2, , )",
                "(jmp, L1, , )",
                "L2:",
            ]
        );
        assert_eq!(
            ir_with("do { break; } while (a);", options),
            vec!["L1:", "(jmp, L2, , )", "(jtrue, L1, a, )", "L2:"]
        );
        assert_eq!(
            ir_with("switch (x) { case 1: { break; } default: { } }", options),
            vec![
                "L1:",
                "(equal, x, 1, R0)",
                "(jfalse, L2, R0, )",
                "(jmp, L3, , )",
                "L2:",
                "L3:",
            ]
        );
    }

    #[test]
    fn test_break_targets_innermost_construct() {
        let options = CodegenOptions { lower_break: true };
        let lines = ir_with("while (a) { for (; b; i = i + 1) { break; } break; }", options);
        let jumps: Vec<&String> = lines.iter().filter(|l| l.starts_with("(jmp")).collect();
        // break внутреннего for, переход for назад, break внешнего while, переход while назад
        assert_eq!(
            jumps,
            vec![
                "(jmp, L4, , )",
                "(jmp, L3, , )",
                "(jmp, L2, , )",
                "(jmp, L1, , )"
            ]
        );
    }

    #[test]
    fn test_registers_and_labels_never_reused() {
        let program = parse(
            "int a = 1;\n\
             while (a < 10) { if (a == 5) { a = a * 2; } else { a = a + 1; } }\n\
             for (int i = 0; i < a; i = i + 1) { switch (i) { case 1: { a = -a; } default: { } } }\n\
             do { a = a - 1; } while (a > 0 and not false);",
        )
        .unwrap();
        let instrs = generate(&program, CodegenOptions::default());

        let registers: Vec<Register> = instrs.iter().filter_map(Instr::dest_register).collect();
        assert!(registers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(registers[0], Register(0));

        let labels: Vec<Label> = instrs.iter().filter_map(Instr::defined_label).collect();
        let unique: HashSet<Label> = labels.iter().copied().collect();
        assert_eq!(unique.len(), labels.len());

        for target in instrs.iter().filter_map(Instr::jump_target) {
            assert!(unique.contains(&target), "dangling jump to {}", target);
        }
    }

    #[test]
    fn test_bool_literals_and_not() {
        assert_eq!(
            ir("while (not true or false) { }"),
            vec![
                "L1:",
                "(NOT, TRUE, , R0)",
                "(OR, R0, FALSE, R1)",
                "(jfalse, L2, R1, )",
                "(jmp, L1, , )",
                "L2:",
            ]
        );
    }

    #[test]
    fn test_fresh_generator_restarts_counters() {
        let program = parse("int a = 1 + 2; while (a) { }").unwrap();
        let first = generate(&program, CodegenOptions::default());
        let second = generate(&program, CodegenOptions::default());
        assert_eq!(first, second);
    }
}
