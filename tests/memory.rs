//! Symbolic heap behavior: aliasing through handles, slices and fork isolation.

use pathscope::{
    engine::ExecutionState,
    expr::{BinaryOp, Expr},
    heap::SymbolicHeap,
    ir::{BinaryOperator, Constant, FunctionBuilder, Intrinsic, Program, StructDef, Type, UnaryOperator},
    smt::{SolveOutcome, SolverSession},
    AnalysisConfig, Analyzer, Result,
};

fn foo() -> StructDef {
    StructDef::new("Foo", [("f", Type::INT), ("g", Type::INT)])
}

fn returns(program: &Program, name: &str) -> Result<Vec<Expr>> {
    let analysis = Analyzer::new(program, AnalysisConfig::default()).analyze_function(name)?;
    Ok(analysis
        .paths()
        .unwrap_or_default()
        .iter()
        .filter_map(ExecutionState::return_value)
        .cloned()
        .collect())
}

/// A write through one copy of a handle is visible through every copy, and only there
#[test]
fn test_field_aliasing() -> Result<()> {
    let def = foo();
    let mut heap = SymbolicHeap::new();
    let first = heap.allocate_struct(&def);
    let second = heap.allocate_struct(&def);
    assert_eq!(first.to_string(), "Ref(1, *Foo)");
    assert_eq!(second.to_string(), "Ref(2, *Foo)");

    let alias = first.clone();
    heap.assign_field(&first, &def, 0, Expr::int(42))?;
    assert_eq!(heap.get_field(&alias, &def, 0)?, Expr::int(42));

    let other = heap.get_field(&second, &def, 0)?;
    assert_ne!(other, Expr::int(42));
    let mut session = SolverSession::default();
    let differs = Expr::create_not(Expr::equals(other, Expr::int(42)));
    assert_eq!(session.probe(&differs)?, SolveOutcome::Sat);

    // sibling field
    assert_ne!(heap.get_field(&alias, &def, 1)?, Expr::int(42));
    Ok(())
}

/// Reads at a symbolic index see a write at an equal index
#[test]
fn test_symbolic_index_aliasing() -> Result<()> {
    let mut heap = SymbolicHeap::new();
    let s = Expr::input("s", Type::slice(Type::INT));
    let i = Expr::input("i", Type::INT);
    let j = Expr::input("j", Type::INT);
    let x = Expr::input("x", Type::INT);
    heap.assign_to_array(&s, i.clone(), x.clone())?;
    let read = heap.get_from_array(&s, &j)?;

    let mut session = SolverSession::default();
    let contradiction = Expr::create_and(
        Expr::equals(i, j),
        Expr::create_not(Expr::equals(read.clone(), x.clone())),
    );
    assert_eq!(session.probe(&contradiction)?, SolveOutcome::Unsat);
    assert_eq!(
        session.probe(&Expr::create_not(Expr::equals(read, x)))?,
        SolveOutcome::Sat
    );
    Ok(())
}

/// Field stores and loads through the interpreter follow the same handle
#[test]
fn test_struct_program() -> Result<()> {
    let mut program = Program::new();
    program.add_struct(foo());

    let mut b = FunctionBuilder::new("touch");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let p = b.alloc(Type::named("Foo"));
    let q = b.alloc(Type::named("Foo"));
    let pf = b.field_addr(p, 0, Type::INT);
    b.store(pf, x);
    let qf = b.field_addr(q, 0, Type::INT);
    b.store(qf, Constant::int(7));
    let again = b.field_addr(p, 0, Type::INT);
    let loaded = b.load(again);
    b.ret(loaded);
    program.add_function(b.build()?);

    assert_eq!(returns(&program, "touch")?, vec![Expr::input("x", Type::INT)]);
    Ok(())
}

/// Slices remember their length and the values written into them
#[test]
fn test_slice_program() -> Result<()> {
    let mut b = FunctionBuilder::new("slot");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let s = b.make_slice(Type::INT, Constant::int(3));
    let slot = b.index_addr(s, Constant::int(1));
    b.store(slot, x);
    let read = b.index_addr(s, Constant::int(1));
    let value = b.load(read);
    let len = b
        .intrinsic(Intrinsic::Len, vec![s.into()], Some(Type::INT))
        .ok_or_else(|| pathscope::Error::Solver("len without result".to_string()))?;
    let total = b.binop(BinaryOperator::Add, value, len);
    b.ret(total);

    let mut program = Program::new();
    program.add_function(b.build()?);
    assert_eq!(
        returns(&program, "slot")?,
        vec![Expr::binary(BinaryOp::Add, Expr::input("x", Type::INT), Expr::int(3))]
    );
    Ok(())
}

/// Each arm writes its own value into the same cell without disturbing the other
#[test]
fn test_forked_paths_keep_their_own_heap() -> Result<()> {
    let mut b = FunctionBuilder::new("split");
    let x = b.param("x", Type::INT);
    b.set_result(Type::INT);
    let cell = b.alloc(Type::INT);
    b.store(cell, Constant::int(0));
    let positive = b.new_block();
    let other = b.new_block();
    let join = b.new_block();
    let cond = b.binop(BinaryOperator::Gt, x, Constant::int(0));
    b.branch(cond, positive, other);
    b.switch_to(positive);
    b.store(cell, Constant::int(1));
    b.jump(join);
    b.switch_to(other);
    b.store(cell, Constant::int(2));
    b.jump(join);
    b.switch_to(join);
    let value = b.unop(UnaryOperator::Deref, cell);
    b.ret(value);

    let mut program = Program::new();
    program.add_function(b.build()?);

    let mut found: Vec<i64> = returns(&program, "split")?
        .iter()
        .filter_map(Expr::as_int)
        .collect();
    found.sort_unstable();
    assert_eq!(found, vec![1, 2]);
    Ok(())
}

/// Forking a heap copies nothing observable back into the parent
#[test]
fn test_heap_fork_isolation() -> Result<()> {
    let def = foo();
    let mut parent = SymbolicHeap::new();
    let handle = parent.allocate_struct(&def);
    parent.assign_field(&handle, &def, 0, Expr::int(1))?;

    let mut child = parent.fork();
    child.assign_field(&handle, &def, 0, Expr::int(2))?;
    child.assign_field(&handle, &def, 1, Expr::int(3))?;

    assert_eq!(parent.get_field(&handle, &def, 0)?, Expr::int(1));
    assert_eq!(child.get_field(&handle, &def, 0)?, Expr::int(2));
    assert!(parent.region("Foo.g").is_none());
    assert_eq!(child.region("Foo.g").map(|r| r.len()), Some(1));
    Ok(())
}
