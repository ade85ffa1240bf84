//! Float functions end to end.
//!
//! Explores functions over doubles, generates test cases for every path and
//! replays them through plain evaluation. The solver's results must agree
//! bit for bit with native IEEE arithmetic.

use pathscope::{
    engine::ExecutionState,
    expr::Concrete,
    ir::{BinaryOperator, Constant, FunctionBuilder, Intrinsic, Program, Type},
    smt::SolverSession,
    testgen::{self, TestCase},
    AnalysisConfig, Analyzer, Error, Result,
};

fn init_logging() {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
}

/// ```text
/// compare(x, y float64, n int) float64 {
///     m := float64(n)
///     s := x + y
///     if s > m { return (s - m) / 3 }
///     if s < m { return sqrt(m - s) }
///     return x * y
/// }
/// ```
fn compare_sum() -> Result<Program> {
    let mut b = FunctionBuilder::new("compare");
    let x = b.param("x", Type::Float64);
    let y = b.param("y", Type::Float64);
    let n = b.param("n", Type::INT);
    b.set_result(Type::Float64);
    let above = b.new_block();
    let not_above = b.new_block();
    let below = b.new_block();
    let level = b.new_block();

    let m = b.convert(n, Type::Float64);
    let s = b.binop(BinaryOperator::Add, x, y);
    let gt = b.binop(BinaryOperator::Gt, s, m);
    b.branch(gt, above, not_above);

    b.switch_to(above);
    let excess = b.binop(BinaryOperator::Sub, s, m);
    let third = b.binop(BinaryOperator::Div, excess, Constant::Float64(3.0));
    b.ret(third);

    b.switch_to(not_above);
    let lt = b.binop(BinaryOperator::Lt, s, m);
    b.branch(lt, below, level);

    b.switch_to(below);
    let gap = b.binop(BinaryOperator::Sub, m, s);
    let root = b
        .intrinsic(Intrinsic::Sqrt, vec![gap.into()], Some(Type::Float64))
        .ok_or_else(|| Error::Solver("sqrt without result".to_string()))?;
    b.ret(root);

    b.switch_to(level);
    let product = b.binop(BinaryOperator::Mul, x, y);
    b.ret(product);

    let mut program = Program::new();
    program.add_function(b.build()?);
    Ok(program)
}

/// `name(x float64) float64 { assume(x == pinned); return x <op> operand }`
fn pinned_binop(name: &str, pinned: f64, op: BinaryOperator, operand: f64) -> Result<Program> {
    let mut b = FunctionBuilder::new(name);
    let x = b.param("x", Type::Float64);
    b.set_result(Type::Float64);
    let fixed = b.binop(BinaryOperator::Eq, x, Constant::Float64(pinned));
    b.intrinsic(Intrinsic::Assume, vec![fixed.into()], None);
    let result = b.binop(op, x, Constant::Float64(operand));
    b.ret(result);

    let mut program = Program::new();
    program.add_function(b.build()?);
    Ok(program)
}

/// Float equality up to NaN payloads; signed zeros are distinct.
fn same_float(left: &Concrete, right: &Concrete) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) if a.is_nan() || b.is_nan() => a.is_nan() && b.is_nan(),
        (Some(a), Some(b)) => a.to_bits() == b.to_bits(),
        _ => left == right,
    }
}

fn generated_case(path: &ExecutionState, session: &mut SolverSession) -> Result<TestCase> {
    testgen::generate(path, session)?
        .ok_or_else(|| Error::Solver(format!("no model for {}", path.path_condition())))
}

/// Replays `case` against its path and returns the evaluated result.
fn replayed(path: &ExecutionState, case: &TestCase) -> Result<Concrete> {
    assert_eq!(case.replay(path.path_condition())?, Concrete::Bool(true));
    let returned = path
        .return_value()
        .ok_or_else(|| Error::Solver("path without result".to_string()))?;
    case.replay(returned)
}

/// Every path of a float comparison gets inputs whose native result matches the solver's
#[test]
fn test_float_cases_replay() -> Result<()> {
    init_logging();
    let program = compare_sum()?;
    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("compare")?;
    assert_eq!(analysis.len(), 3);

    let mut session = SolverSession::default();
    for path in analysis.paths().unwrap_or_default() {
        let case = generated_case(path, &mut session)?;
        assert_eq!(case.inputs.len(), 3);
        let native = replayed(path, &case)?;
        let expected = case
            .expected
            .clone()
            .ok_or_else(|| Error::Solver(format!("no expected value for {case}")))?;
        assert!(same_float(&native, &expected), "{case}: replay gave {native}");
    }
    assert_eq!(session.depth(), 0);
    Ok(())
}

/// `0.1 + 0.2` is the nearest double to the exact sum, not the truncated one
#[test]
fn test_sum_rounds_to_nearest() -> Result<()> {
    let program = pinned_binop("tenths", 0.1, BinaryOperator::Add, 0.2)?;
    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("tenths")?;
    let paths = analysis.paths().unwrap_or_default();
    assert_eq!(paths.len(), 1);

    let mut session = SolverSession::default();
    let case = generated_case(&paths[0], &mut session)?;
    assert_eq!(case.expected, Some(Concrete::Float64(0.300_000_000_000_000_04)));
    assert_eq!(replayed(&paths[0], &case)?, Concrete::Float64(0.1 + 0.2));
    Ok(())
}

/// Float `%` keeps the dividend's sign in the solver and in the evaluator
#[test]
fn test_float_remainder_replays() -> Result<()> {
    let program = pinned_binop("wrap", -7.5, BinaryOperator::Rem, 2.0)?;
    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("wrap")?;
    let paths = analysis.paths().unwrap_or_default();
    assert_eq!(paths.len(), 1);

    let mut session = SolverSession::default();
    let case = generated_case(&paths[0], &mut session)?;
    assert_eq!(case.expected, Some(Concrete::Float64(-1.5)));
    assert_eq!(replayed(&paths[0], &case)?, Concrete::Float64(-1.5));
    Ok(())
}

/// Converting a large integer rounds the same way in the solver and natively
#[test]
fn test_int_conversion_replays() -> Result<()> {
    let mut b = FunctionBuilder::new("widen");
    let n = b.param("n", Type::INT);
    b.set_result(Type::Float64);
    let big = b.binop(BinaryOperator::Gt, n, Constant::int(1 << 60));
    b.intrinsic(Intrinsic::Assume, vec![big.into()], None);
    let widened = b.convert(n, Type::Float64);
    b.ret(widened);
    let mut program = Program::new();
    program.add_function(b.build()?);

    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("widen")?;
    let mut session = SolverSession::default();
    for path in analysis.paths().unwrap_or_default() {
        let case = generated_case(path, &mut session)?;
        let native = replayed(path, &case)?;
        assert_eq!(Some(native), case.expected, "{case}");
    }
    Ok(())
}
