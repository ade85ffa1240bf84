//! Solver session behavior: scopes, tracked assumptions and value extraction.

use pathscope::{
    expr::{BinaryOp, Concrete, Expr},
    ir::{BinaryOperator, FunctionBuilder, Intrinsic, Program, Type},
    smt::{SolveOutcome, SolverConfig, SolverSession},
    testgen, AnalysisConfig, Analyzer, Error, Result,
};

fn int(name: &str) -> Expr {
    Expr::input(name, Type::INT)
}

/// A scoped constraint is gone after the pop; the base formula survives
#[test]
fn test_push_pop_restores_context() -> Result<()> {
    let mut session = SolverSession::default();
    let x = int("x");
    let base = Expr::gt(x.clone(), Expr::int(0));
    let derived = Expr::gt(x, Expr::int(100));

    session.assert_expr(&base)?;
    session.push();
    session.assert_expr(&derived)?;
    assert_eq!(session.check()?, SolveOutcome::Sat);
    session.pop()?;

    assert_eq!(session.depth(), 0);
    assert_eq!(session.check()?, SolveOutcome::Sat);
    assert_eq!(
        session.probe(&Expr::create_not(derived))?,
        SolveOutcome::Sat
    );
    Ok(())
}

/// Nested scopes retract in order
#[test]
fn test_nested_scopes() -> Result<()> {
    let mut session = SolverSession::default();
    let x = int("x");
    session.push();
    session.assert_expr(&Expr::gt(x.clone(), Expr::int(5)))?;
    session.push();
    session.assert_expr(&Expr::lt(x.clone(), Expr::int(5)))?;
    assert_eq!(session.check()?, SolveOutcome::Unsat);
    session.pop()?;
    assert_eq!(session.check()?, SolveOutcome::Sat);
    session.pop()?;
    assert_eq!(session.probe(&Expr::lt(x, Expr::int(5)))?, SolveOutcome::Sat);
    assert!(session.pop().is_err());
    Ok(())
}

/// Dropping the unsat core repeatedly relaxes a conflicting assumption set
#[test]
fn test_unsat_core_relaxation() -> Result<()> {
    let config = SolverConfig::new().with_unsat_cores(true);
    let mut session = SolverSession::new(config);
    let x = int("x");
    let y = int("y");
    session.assert_expr(&Expr::gt(x.clone(), Expr::int(10)))?;

    let keep = Expr::equals(y, Expr::int(1));
    let mut soft = vec![
        Expr::lt(x.clone(), Expr::int(5)),
        keep.clone(),
        Expr::lt(x, Expr::int(3)),
    ];

    let mut rounds = 0;
    while session.check_assumptions(&soft)? == SolveOutcome::Unsat {
        let core = session.unsat_core().to_vec();
        assert!(!core.is_empty());
        assert!(core.iter().all(|c| soft.contains(c)));
        soft.retain(|a| !core.contains(a));
        rounds += 1;
        assert!(rounds <= 3, "relaxation does not converge");
    }

    assert_eq!(soft, vec![keep]);
    assert_eq!(session.depth(), 0);
    Ok(())
}

/// Complex multiplication combines the parts as `(ac - bd) + (ad + bc)i`
#[test]
fn test_complex_product() -> Result<()> {
    let a = Expr::input("a", Type::Complex128);
    let b = Expr::input("b", Type::Complex128);
    let guard = Expr::create_and(
        Expr::equals(a.clone(), Expr::complex(1.0, 2.0, Type::Complex128)),
        Expr::equals(b.clone(), Expr::complex(3.0, 4.0, Type::Complex128)),
    );
    let product = Expr::binary(BinaryOp::Mul, a, b);

    let mut session = SolverSession::default();
    assert_eq!(
        testgen::check_result(&guard, &product, &mut session)?,
        Some(Concrete::complex(-5.0, 10.0, &Type::Complex128))
    );
    Ok(())
}

/// The NaN test splits float inputs into NaN and ordinary values
#[test]
fn test_nan_paths() -> Result<()> {
    let mut b = FunctionBuilder::new("classify");
    let x = b.param("x", Type::Float64);
    b.set_result(Type::Float64);
    let nan = b.new_block();
    let number = b.new_block();
    let is_nan = b
        .intrinsic(Intrinsic::IsNaN, vec![x.into()], Some(Type::Bool))
        .ok_or_else(|| Error::Solver("isNaN without result".to_string()))?;
    b.branch(is_nan, nan, number);
    b.switch_to(nan);
    b.ret(pathscope::ir::Constant::Float64(0.0));
    b.switch_to(number);
    let doubled = b.binop(BinaryOperator::Add, x, x);
    b.ret(doubled);

    let mut program = Program::new();
    program.add_function(b.build()?);
    let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("classify")?;
    assert_eq!(analysis.len(), 2);

    let mut session = SolverSession::default();
    let mut saw_nan = false;
    for path in analysis.paths().unwrap_or_default() {
        let case = testgen::generate(path, &mut session)?
            .ok_or_else(|| Error::Solver("no model".to_string()))?;
        let input = case.inputs[0].1.as_f64().unwrap_or_default();
        if input.is_nan() {
            saw_nan = true;
            assert_eq!(case.expected, Some(Concrete::Float64(0.0)));
        }
    }
    assert!(saw_nan);
    Ok(())
}

/// Solver counters track every probe
#[test]
fn test_solver_stats() -> Result<()> {
    let mut session = SolverSession::default();
    let x = int("x");
    session.probe(&Expr::gt(x.clone(), Expr::int(0)))?;
    session.probe(&Expr::create_and(
        Expr::gt(x.clone(), Expr::int(0)),
        Expr::lt(x, Expr::int(0)),
    ))?;
    // literals never reach the solver
    session.probe(&Expr::boolean(true))?;

    let stats = session.stats();
    assert_eq!(stats.queries, 2);
    assert_eq!(stats.sat, 1);
    assert_eq!(stats.unsat, 1);
    Ok(())
}
