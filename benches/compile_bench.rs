//! Benchmark for the compilation pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tac_compiler::parser::{parse, tokenize};
use tac_compiler::{analyze, codegen, compile_str, CodegenOptions, Diagnostics};

const STRAIGHT_LINE: &str = "int a = 3; int b = 4; int c = a + b * 2;";

const CONTROL_FLOW: &str = r#"
# sum of the first ten numbers #
int s = 0;
for (int i = 0; i < 10; i = i + 1) {
    if (i == 5) { s = s + 2 * i; } else { s = s + i; }
}
int k = 3;
do { k = k - 1; } while (k > 0);
switch (s) {
    case 1: { s = 0; }
    case -1: { s = 1; }
    default: { s = s / 2; }
}
"#;

fn large_program() -> String {
    let mut source = String::from("int acc = 0;\n");
    for i in 0..500 {
        source.push_str(&format!(
            "int v{i} = {i};\nwhile (acc < v{i}) {{ acc = acc + v{i} * 2 - 1; }}\n"
        ));
    }
    source
}

fn benchmark_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize control flow", |b| {
        b.iter(|| black_box(tokenize(CONTROL_FLOW).unwrap()));
    });
}

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse control flow", |b| {
        b.iter(|| black_box(parse(CONTROL_FLOW).unwrap()));
    });
}

fn benchmark_analyze(c: &mut Criterion) {
    let program = parse(CONTROL_FLOW).unwrap();
    c.bench_function("analyze control flow", |b| {
        b.iter(|| {
            let mut diagnostics = Diagnostics::new();
            analyze(&program, &mut diagnostics).unwrap();
            black_box(diagnostics)
        });
    });
}

fn benchmark_codegen(c: &mut Criterion) {
    let program = parse(CONTROL_FLOW).unwrap();
    c.bench_function("codegen control flow", |b| {
        b.iter(|| black_box(codegen::generate(&program, CodegenOptions::default())));
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    c.bench_function("compile straight line", |b| {
        b.iter(|| black_box(compile_str(STRAIGHT_LINE).unwrap()));
    });

    let source = large_program();
    c.bench_function("compile 500 loops", |b| {
        b.iter(|| black_box(compile_str(&source).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_parse,
    benchmark_analyze,
    benchmark_codegen,
    benchmark_pipeline,
);
criterion_main!(benches);
