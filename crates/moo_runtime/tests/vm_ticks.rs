mod common;

use std::sync::Arc;

use common::{run_on, vm_with};
use moo_ir::{Codes, ExceptArm};
use moo_runtime::{MemoryStore, Opcode, ProgramBuilder, RunError, Value, VmConfig};

fn limited(limit: usize) -> moo_runtime::Vm {
    vm_with(Arc::new(MemoryStore::new()), VmConfig::default().with_tick_limit(limit))
}

fn adds(n: usize) -> ProgramBuilder {
    let mut b = ProgramBuilder::new();
    b.push_int(1);
    for _ in 0..n {
        b.push_int(1).emit(Opcode::Add);
    }
    b.emit(Opcode::Return);
    b
}

#[test]
fn exactly_the_limit_completes() {
    let mut vm = limited(3);
    assert_eq!(run_on(&mut vm, adds(3)).unwrap(), Value::Int(4));
    assert_eq!(vm.ticks(), 3);
    assert_eq!(vm.ticks_left(), 0);
}

#[test]
fn one_past_the_limit_aborts() {
    let mut vm = limited(3);
    assert_eq!(run_on(&mut vm, adds(4)), Err(RunError::TicksExhausted { limit: 3 }));
    assert_eq!(vm.ticks(), 3);
}

#[test]
fn infinite_back_edge_is_bounded() {
    let mut b = ProgramBuilder::new();
    let top = b.label();
    b.bind(top).jump(Opcode::Jump, top);
    let mut vm = limited(100);
    assert_eq!(run_on(&mut vm, b), Err(RunError::TicksExhausted { limit: 100 }));
    assert_eq!(vm.ticks(), 100);
}

#[test]
fn forward_jumps_and_shuffles_are_free() {
    let mut b = ProgramBuilder::new();
    let skip = b.label();
    b.push_int(1).assign("x").jump(Opcode::Jump, skip);
    b.push_int(2).assign("x");
    b.bind(skip)
        .emit(Opcode::MakeEmptyList)
        .push_var("x")
        .emit(Opcode::ListAddTail)
        .emit(Opcode::Return);
    let mut vm = limited(0);
    assert_eq!(run_on(&mut vm, b).unwrap(), Value::list([Value::Int(1)]));
    assert_eq!(vm.ticks(), 0);
}

#[test]
fn tick_exhaustion_cannot_be_caught() {
    let mut b = ProgramBuilder::new();
    let (handler, top, after) = (b.label(), b.label(), b.label());
    b.try_except(&[ExceptArm {
        codes: Codes::Any,
        var: None,
        resume: handler,
    }]);
    b.bind(top).push_int(1).emit(Opcode::Pop).jump(Opcode::Jump, top);
    b.jump(Opcode::EndExcept, after);
    b.bind(handler).push_str("caught").emit(Opcode::Return);
    b.bind(after);
    let mut vm = limited(50);
    assert_eq!(run_on(&mut vm, b), Err(RunError::TicksExhausted { limit: 50 }));
}

#[test]
fn builtins_see_remaining_ticks() {
    let mut b = ProgramBuilder::new();
    b.push_int(1)
        .push_int(1)
        .emit(Opcode::Add)
        .emit(Opcode::Pop)
        .emit(Opcode::MakeEmptyList)
        .call_builtin("ticks_left")
        .emit(Opcode::Return);
    let mut vm = limited(10);
    // The Add and the call itself are charged before the builtin runs.
    assert_eq!(run_on(&mut vm, b).unwrap(), Value::Int(8));
}

#[test]
fn budget_resets_between_runs() {
    let mut vm = limited(3);
    assert!(run_on(&mut vm, adds(3)).is_ok());
    assert!(run_on(&mut vm, adds(3)).is_ok());
    assert_eq!(vm.ticks(), 3);
}

#[test]
fn range_loop_is_bounded() {
    let mut b = ProgramBuilder::new();
    let (top, end) = (b.label(), b.label());
    b.push_int(1).push_literal(Value::Int(i64::MAX)).begin_for_range("i");
    b.bind(top).jump(Opcode::IterateForRange, end);
    b.jump(Opcode::Jump, top);
    b.bind(end);
    let mut vm = limited(1000);
    assert_eq!(run_on(&mut vm, b), Err(RunError::TicksExhausted { limit: 1000 }));
}
