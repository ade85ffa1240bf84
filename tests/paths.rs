//! Path enumeration over integer functions.
//!
//! Explores a three-way comparison, checks the shape and the logical
//! properties of the reported path conditions, and replays generated test
//! cases through plain evaluation.

use pathscope::{
    expr::{eval, BinaryOp, Bindings, Concrete, Expr},
    ir::{BinaryOperator, FunctionBuilder, Program, Type},
    smt::{SolveOutcome, SolverSession},
    testgen, AnalysisConfig, Analyzer, Result,
};

/// `f(a, b int) int { if a > b { return a+b } else if a < b { return a-b } else { return a*b } }`
fn three_way() -> Result<Program> {
    let mut b = FunctionBuilder::new("f");
    let a_ = b.param("a", Type::INT);
    let b_ = b.param("b", Type::INT);
    b.set_result(Type::INT);
    let greater = b.new_block();
    let not_greater = b.new_block();
    let less = b.new_block();
    let equal = b.new_block();

    let gt = b.binop(BinaryOperator::Gt, a_, b_);
    b.branch(gt, greater, not_greater);
    b.switch_to(greater);
    let sum = b.binop(BinaryOperator::Add, a_, b_);
    b.ret(sum);
    b.switch_to(not_greater);
    let lt = b.binop(BinaryOperator::Lt, a_, b_);
    b.branch(lt, less, equal);
    b.switch_to(less);
    let difference = b.binop(BinaryOperator::Sub, a_, b_);
    b.ret(difference);
    b.switch_to(equal);
    let product = b.binop(BinaryOperator::Mul, a_, b_);
    b.ret(product);

    let mut program = Program::new();
    program.add_function(b.build()?);
    Ok(program)
}

fn a() -> Expr {
    Expr::input("a", Type::INT)
}

fn b() -> Expr {
    Expr::input("b", Type::INT)
}

/// The path conditions and returned expressions, in a fixed order.
fn expected_paths() -> Vec<(Expr, Expr)> {
    let gt = Expr::gt(a(), b());
    let lt = Expr::lt(a(), b());
    vec![
        (gt.clone(), Expr::binary(BinaryOp::Add, a(), b())),
        (
            Expr::create_and(Expr::create_not(gt.clone()), lt.clone()),
            Expr::binary(BinaryOp::Sub, a(), b()),
        ),
        (
            Expr::create_and(Expr::create_not(gt), Expr::create_not(lt)),
            Expr::binary(BinaryOp::Mul, a(), b()),
        ),
    ]
}

fn explored(program: &Program) -> Result<Vec<(Expr, Expr)>> {
    let analysis = Analyzer::new(program, AnalysisConfig::default()).analyze_function("f")?;
    let paths = analysis.paths().unwrap_or_default();
    Ok(paths
        .iter()
        .filter_map(|p| p.return_value().map(|r| (p.path_condition().clone(), r.clone())))
        .collect())
}

/// Exactly three paths with the expected conditions and results
#[test]
fn test_three_way_paths() -> Result<()> {
    let program = three_way()?;
    let found = explored(&program)?;
    assert_eq!(found.len(), 3);
    for expected in expected_paths() {
        assert!(found.contains(&expected), "missing path {} => {}", expected.0, expected.1);
    }
    Ok(())
}

/// No two path conditions hold at once, and together they cover every input
#[test]
fn test_conditions_partition_the_inputs() -> Result<()> {
    let program = three_way()?;
    let conditions: Vec<Expr> = explored(&program)?.into_iter().map(|(c, _)| c).collect();
    let mut session = SolverSession::default();

    for (i, left) in conditions.iter().enumerate() {
        for right in &conditions[i + 1..] {
            let both = Expr::create_and(left.clone(), right.clone());
            assert_eq!(session.probe(&both)?, SolveOutcome::Unsat);
        }
    }

    let any = conditions
        .iter()
        .cloned()
        .fold(Expr::boolean(false), Expr::create_or);
    assert_eq!(session.probe(&Expr::create_not(any))?, SolveOutcome::Unsat);
    assert_eq!(session.depth(), 0);
    Ok(())
}

/// Generated inputs reproduce the solver's result under plain evaluation
#[test]
fn test_generated_cases_replay() -> Result<()> {
    let program = three_way()?;
    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("f")?;
    let mut session = SolverSession::default();

    for path in analysis.paths().unwrap_or_default() {
        let case = testgen::generate(path, &mut session)?.ok_or_else(|| {
            pathscope::Error::Solver(format!("no model for {}", path.path_condition()))
        })?;
        assert_eq!(case.inputs.len(), 2);
        assert_eq!(case.replay(path.path_condition())?, Concrete::Bool(true));
        let returned = path
            .return_value()
            .ok_or_else(|| pathscope::Error::Solver("path without result".to_string()))?;
        assert_eq!(Some(case.replay(returned)?), case.expected);
    }
    assert_eq!(session.depth(), 0);
    Ok(())
}

/// The equal branch multiplies with 64-bit wraparound in both the solver and the evaluator
#[test]
fn test_equal_branch_wraps() -> Result<()> {
    const INPUT: i64 = 13_217_643_890_510_138;
    const WRAPPED: i64 = 6_778_761_081_452_962_084;

    let (condition, product) = expected_paths().remove(2);
    let pinned = Expr::create_and(
        condition,
        Expr::create_and(
            Expr::equals(a(), Expr::int(INPUT)),
            Expr::equals(b(), Expr::int(INPUT)),
        ),
    );
    let mut session = SolverSession::default();
    assert_eq!(
        testgen::check_result(&pinned, &product, &mut session)?,
        Some(Concrete::int(WRAPPED))
    );

    let mut bindings = Bindings::default();
    bindings.insert("a".to_string(), Concrete::int(INPUT));
    bindings.insert("b".to_string(), Concrete::int(INPUT));
    assert_eq!(eval::evaluate(&product, &bindings)?, Concrete::int(WRAPPED));
    Ok(())
}

/// Folding constructors return their operands unchanged or the absorbing literal
#[test]
fn test_connective_identities() {
    let e = Expr::gt(a(), b());
    let yes = Expr::boolean(true);
    let no = Expr::boolean(false);

    assert_eq!(Expr::create_and(e.clone(), yes.clone()), e);
    assert_eq!(Expr::create_and(yes.clone(), e.clone()), e);
    assert_eq!(Expr::create_and(e.clone(), no.clone()), no);
    assert_eq!(Expr::create_or(e.clone(), no.clone()), e);
    assert_eq!(Expr::create_or(no, e.clone()), e);
    assert_eq!(Expr::create_or(e, yes.clone()), yes);
}
