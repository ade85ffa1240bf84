#![allow(unused)]
extern crate pathscope;

use criterion::{criterion_group, criterion_main, Criterion};
use pathscope::{
    engine::Strategy,
    explorer::SelectorKind,
    ir::{BinaryOperator, Constant, FunctionBuilder, Program, Type},
    AnalysisConfig, Analyzer,
};
use std::hint::black_box;

/// A chain of `depth` independent comparisons: `2^depth` feasible paths.
fn ladder(depth: usize) -> Program {
    let mut b = FunctionBuilder::new("ladder");
    let params: Vec<_> = (0..depth)
        .map(|i| b.param(format!("x{i}"), Type::INT))
        .collect();
    b.set_result(Type::INT);

    let mut acc = b.binop(BinaryOperator::Add, params[0], Constant::int(0));
    for (i, param) in params.iter().enumerate() {
        let then_block = b.new_block();
        let else_block = b.new_block();
        let join = b.new_block();
        let cond = b.binop(BinaryOperator::Gt, *param, Constant::int(i as i64));
        b.branch(cond, then_block, else_block);
        b.switch_to(then_block);
        let up = b.binop(BinaryOperator::Add, acc, *param);
        b.jump(join);
        b.switch_to(else_block);
        let down = b.binop(BinaryOperator::Sub, acc, *param);
        b.jump(join);
        b.switch_to(join);
        acc = b.phi(Type::INT, &[(up.into(), then_block), (down.into(), else_block)]);
    }
    b.ret(acc);

    let mut program = Program::new();
    program.add_function(b.build().unwrap());
    program
}

/// Benchmark dynamic exploration under each path selector
fn bench_selectors(c: &mut Criterion) {
    let program = ladder(6);

    let mut group = c.benchmark_group("explore_dynamic");
    group.sample_size(20);
    for kind in [
        SelectorKind::Dfs,
        SelectorKind::Bfs,
        SelectorKind::Random,
        SelectorKind::DepthJitter,
    ] {
        let config = AnalysisConfig::new().with_selector(kind).with_seed(1);
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| {
                let analysis = Analyzer::new(&program, config.clone())
                    .analyze_function(black_box("ladder"))
                    .unwrap();
                black_box(analysis.len())
            });
        });
    }
    group.finish();
}

/// Benchmark static exploration, which never queries the solver while exploring
fn bench_static(c: &mut Criterion) {
    let program = ladder(6);
    let config = AnalysisConfig::new().with_strategy(Strategy::Static);

    let mut group = c.benchmark_group("explore_static");
    group.bench_function("decision_table", |b| {
        b.iter(|| {
            let analysis = Analyzer::new(&program, config.clone())
                .analyze_function(black_box("ladder"))
                .unwrap();
            black_box(analysis.len())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_selectors, bench_static);
criterion_main!(benches);
