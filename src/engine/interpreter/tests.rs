use std::sync::Arc;

use super::*;
use crate::{
    expr::BinaryOp,
    ir::{BinaryOperator, Constant, Function, FunctionBuilder, Intrinsic, StructDef, Type},
    smt::SolverConfig,
};

fn session() -> SolverSession {
    SolverSession::new(SolverConfig::default())
}

/// Runs every path of `state` to completion, splicing call results.
fn explore(
    interpreter: &mut Interpreter<'_>,
    state: ExecutionState,
    session: &mut SolverSession,
) -> Result<Vec<ExecutionState>> {
    let mut pending = vec![state];
    let mut done = Vec::new();
    while let Some(state) = pending.pop() {
        for mut next in interpreter.step(state, session)? {
            if next.is_complete() {
                done.push(next);
            } else {
                if next.has_completed_call() {
                    next.complete_call()?;
                }
                pending.push(next);
            }
        }
    }
    Ok(done)
}

fn single(program: &mut Program, b: FunctionBuilder) -> Result<Arc<Function>> {
    Ok(program.add_function(b.build()?))
}

#[test]
fn test_pure_values_are_built_lazily() -> Result<()> {
    let mut b = FunctionBuilder::new("inc");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let y = b.binop(BinaryOperator::Add, x, Constant::int(1));
    b.ret(y);
    let mut program = Program::new();
    let f = single(&mut program, b)?;

    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();
    let state = ExecutionState::entry(f)?;

    let after_add = interpreter.step(state, &mut session)?;
    assert_eq!(after_add.len(), 1);
    assert!(after_add[0].current_frame()?.lookup(y).is_none());

    let done = explore(&mut interpreter, after_add[0].clone(), &mut session)?;
    assert_eq!(
        done[0].return_value(),
        Some(&Expr::binary(BinaryOp::Add, Expr::input("x", Type::INT), Expr::int(1)))
    );
    assert_eq!(interpreter.stats().steps, 2);
    Ok(())
}

#[test]
fn test_symbolic_branch_forks() -> Result<()> {
    let mut b = FunctionBuilder::new("sign");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let positive = b.new_block();
    let other = b.new_block();
    let cond = b.binop(BinaryOperator::Gt, x, Constant::int(0));
    b.branch(cond, positive, other);
    b.switch_to(positive);
    b.ret(Constant::int(1));
    b.switch_to(other);
    b.ret(Constant::int(0));
    let mut program = Program::new();
    let f = single(&mut program, b)?;

    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();
    let forked = interpreter.step(ExecutionState::entry(f)?, &mut session)?;
    assert_eq!(forked.len(), 2);
    assert_eq!(forked[0].current_frame()?.block(), positive);
    assert_eq!(forked[1].current_frame()?.block(), other);
    assert_eq!(forked[0].decisions(), 1);

    let gt = Expr::gt(Expr::input("x", Type::INT), Expr::int(0));
    assert_eq!(forked[0].path_condition(), &gt);
    assert_eq!(forked[1].path_condition(), &Expr::create_not(gt));
    Ok(())
}

/// `if x > 5 { if x < 3 { 1 } else { 2 } } else { 3 }`
fn contradictory() -> Result<FunctionBuilder> {
    let mut b = FunctionBuilder::new("nested");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let outer = b.new_block();
    let inner = b.new_block();
    let second = b.new_block();
    let third = b.new_block();
    let big = b.binop(BinaryOperator::Gt, x, Constant::int(5));
    b.branch(big, outer, third);
    b.switch_to(outer);
    let small = b.binop(BinaryOperator::Lt, x, Constant::int(3));
    b.branch(small, inner, second);
    b.switch_to(inner);
    b.ret(Constant::int(1));
    b.switch_to(second);
    b.ret(Constant::int(2));
    b.switch_to(third);
    b.ret(Constant::int(3));
    Ok(b)
}

#[test]
fn test_infeasible_arm_is_pruned() -> Result<()> {
    let mut program = Program::new();
    let f = single(&mut program, contradictory()?)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    let mut results: Vec<i64> = done
        .iter()
        .filter_map(|s| s.return_value().and_then(Expr::as_int))
        .collect();
    results.sort_unstable();
    assert_eq!(results, vec![2, 3]);
    assert_eq!(interpreter.stats().pruned, 1);
    assert_eq!(session.depth(), 0);
    Ok(())
}

#[test]
fn test_static_strategy_keeps_every_arm() -> Result<()> {
    let mut program = Program::new();
    let f = single(&mut program, contradictory()?)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Static);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    assert_eq!(done.len(), 3);
    assert_eq!(interpreter.stats().pruned, 0);
    assert_eq!(session.stats().queries, 0);
    Ok(())
}

#[test]
fn test_call_result_is_delivered() -> Result<()> {
    let mut callee = FunctionBuilder::new("double");
    let v = callee.param("v", Type::INT);
    callee.set_result(Type::INT);
    let twice = callee.binop(BinaryOperator::Mul, v, Constant::int(2));
    callee.ret(twice);

    let mut caller = FunctionBuilder::new("main");
    let x = caller.param("x", Type::INT);
    caller.set_result(Type::INT);
    let r = caller
        .call(Callee::Function("double".into()), vec![x.into()], Some(Type::INT))
        .ok_or_else(|| malformed_error!("call without result"))?;
    let s = caller.binop(BinaryOperator::Add, r, Constant::int(1));
    caller.ret(s);

    let mut program = Program::new();
    program.add_function(callee.build()?);
    let main = single(&mut program, caller)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let pushed = interpreter.step(ExecutionState::entry(main.clone())?, &mut session)?;
    assert_eq!(pushed[0].call_depth(), 2);
    assert_eq!(pushed[0].frames()[0].cursor(), 0);

    let done = explore(&mut interpreter, ExecutionState::entry(main)?, &mut session)?;
    let x = Expr::input("x", Type::INT);
    let expected = Expr::binary(
        BinaryOp::Add,
        Expr::binary(BinaryOp::Mul, x, Expr::int(2)),
        Expr::int(1),
    );
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].return_value(), Some(&expected));
    Ok(())
}

#[test]
fn test_loop_phis_use_previous_iteration() -> Result<()> {
    // i, acc = 0, 0; while i < 3 { acc += i; i += 1 }; return acc
    let mut b = FunctionBuilder::new("sum");
    b.set_result(Type::INT);
    let head = b.new_block();
    let body = b.new_block();
    let exit = b.new_block();
    b.jump(head);

    b.switch_to(head);
    let i = b.phi(Type::INT, &[(Constant::int(0).into(), 0)]);
    let acc = b.phi(Type::INT, &[(Constant::int(0).into(), 0)]);
    let more = b.binop(BinaryOperator::Lt, i, Constant::int(3));
    b.branch(more, body, exit);

    b.switch_to(body);
    let next_acc = b.binop(BinaryOperator::Add, acc, i);
    let next_i = b.binop(BinaryOperator::Add, i, Constant::int(1));
    b.add_phi_edge(i, next_i, body);
    b.add_phi_edge(acc, next_acc, body);
    b.jump(head);

    b.switch_to(exit);
    b.ret(acc);

    let mut program = Program::new();
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].return_value(), Some(&Expr::int(3)));
    assert_eq!(interpreter.stats().forks, 0);
    Ok(())
}

#[test]
fn test_struct_fields_round_trip() -> Result<()> {
    let mut b = FunctionBuilder::new("point");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let p = b.alloc(Type::named("Point"));
    let px = b.field_addr(p, 0, Type::INT);
    b.store(px, x);
    let py = b.field_addr(p, 1, Type::INT);
    b.store(py, Constant::int(7));
    let loaded = b.load(px);
    b.ret(loaded);

    let mut program = Program::new();
    program.add_struct(StructDef::new("Point", [("x", Type::INT), ("y", Type::INT)]));
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    assert_eq!(done[0].return_value(), Some(&Expr::input("x", Type::INT)));
    assert!(done[0].heap().region("Point.y").is_some());
    Ok(())
}

#[test]
fn test_infeasible_assumption_drops_path() -> Result<()> {
    let mut b = FunctionBuilder::new("assume");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let neg = b.binop(BinaryOperator::Lt, x, Constant::int(0));
    b.intrinsic(Intrinsic::Assume, vec![neg.into()], None);
    let pos = b.binop(BinaryOperator::Gt, x, Constant::int(0));
    b.intrinsic(Intrinsic::Assume, vec![pos.into()], None);
    b.ret(x);

    let mut program = Program::new();
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    assert!(done.is_empty());
    assert_eq!(interpreter.stats().pruned, 1);
    Ok(())
}

#[test]
fn test_fresh_values_are_distinct() -> Result<()> {
    let mut b = FunctionBuilder::new("fresh");
    b.set_result(Type::Bool);
    let a = b
        .intrinsic(Intrinsic::Symbolic, Vec::new(), Some(Type::INT))
        .ok_or_else(|| malformed_error!("no result"))?;
    let c = b
        .intrinsic(Intrinsic::Symbolic, Vec::new(), Some(Type::INT))
        .ok_or_else(|| malformed_error!("no result"))?;
    let same = b.binop(BinaryOperator::Eq, a, c);
    b.ret(same);

    let mut program = Program::new();
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let done = explore(&mut interpreter, ExecutionState::entry(f)?, &mut session)?;
    let ret = done[0]
        .return_value()
        .ok_or_else(|| malformed_error!("no return value"))?;
    assert!(ret.as_bool().is_none());
    Ok(())
}

#[test]
fn test_unsupported_construct_is_fatal() -> Result<()> {
    let mut b = FunctionBuilder::new("chan");
    b.unsupported("MakeChan");
    b.ret_void();
    let mut program = Program::new();
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
    let mut session = session();

    let result = interpreter.step(ExecutionState::entry(f)?, &mut session);
    assert!(matches!(result, Err(Error::Unsupported(ref what)) if what.contains("MakeChan")));
    Ok(())
}

#[test]
fn test_unknown_callee_is_fatal() -> Result<()> {
    let mut b = FunctionBuilder::new("main");
    b.call(Callee::Function("missing".into()), Vec::new(), None);
    b.ret_void();
    let mut program = Program::new();
    let f = single(&mut program, b)?;
    let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);

    let result = interpreter.step(ExecutionState::entry(f)?, &mut session());
    assert!(matches!(result, Err(Error::UnknownFunction(_))));
    Ok(())
}
