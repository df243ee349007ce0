mod common;

use std::sync::Arc;

use common::{raised, run, run_on, vm, vm_with};
use moo_ir::ContextKind;
use moo_runtime::{ErrorCode, MemoryStore, Obj, Opcode, ProgramBuilder, Store, Value, VmConfig};

#[test]
fn vm_ir_add_numbers() {
    let mut b = ProgramBuilder::new();
    b.push_int(2).push_int(3).emit(Opcode::Add).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(5));
}

#[test]
fn vm_ir_immediates_cover_their_range() {
    let mut b = ProgramBuilder::new();
    b.push_int(-10)
        .push_int(133)
        .emit(Opcode::Add)
        .push_int(134)
        .emit(Opcode::Add)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(257));
}

#[test]
fn vm_ir_falling_off_the_end_returns_zero() {
    assert_eq!(run(ProgramBuilder::new()).unwrap(), Value::ZERO);

    let mut b = ProgramBuilder::new();
    b.push_int(7).emit(Opcode::Pop);
    assert_eq!(run(b).unwrap(), Value::ZERO);

    let mut b = ProgramBuilder::new();
    b.push_int(7).emit(Opcode::Return0);
    assert_eq!(run(b).unwrap(), Value::ZERO);
}

#[test]
fn vm_ir_return_discards_leftover_temporaries() {
    let mut b = ProgramBuilder::new();
    b.push_int(1).push_int(2).push_int(3).push_int(4).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(4));
}

#[test]
fn vm_ir_locals() {
    let mut b = ProgramBuilder::new();
    b.push_int(4)
        .assign("x")
        .push_var("x")
        .push_var("X")
        .emit(Opcode::Mul)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(16));
}

#[test]
fn vm_ir_while_loop() {
    // i = 0; sum = 0; while (i < 5) sum = sum + i; i = i + 1; endwhile; return sum;
    let mut b = ProgramBuilder::new();
    let (top, end) = (b.label(), b.label());
    b.push_int(0).assign("i").push_int(0).assign("sum");
    b.emit(Opcode::BeginWhile);
    b.bind(top).push_var("i").push_int(5).emit(Opcode::Lt).jump(Opcode::While, end);
    b.push_var("sum").push_var("i").emit(Opcode::Add).assign("sum");
    b.push_var("i").push_int(1).emit(Opcode::Add).assign("i");
    b.jump(Opcode::Jump, top);
    b.bind(end).push_var("sum").emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(10));
}

#[test]
fn vm_ir_if_else() {
    let mut b = ProgramBuilder::new();
    let (otherwise, end) = (b.label(), b.label());
    b.push_str("").jump(Opcode::If, otherwise);
    b.push_str("then").jump(Opcode::Jump, end);
    b.bind(otherwise).push_str("else");
    b.bind(end).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::str("else"));
}

#[test]
fn vm_ir_short_circuit_keeps_deciding_value() {
    let mut b = ProgramBuilder::new();
    let end = b.label();
    b.push_int(0).jump(Opcode::And, end).push_int(5);
    b.bind(end).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(0));

    let mut b = ProgramBuilder::new();
    let end = b.label();
    b.push_int(0).jump(Opcode::Or, end).push_int(7);
    b.bind(end).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(7));

    let mut b = ProgramBuilder::new();
    let end = b.label();
    b.push_str("yes").jump(Opcode::Or, end).push_int(7);
    b.bind(end).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::str("yes"));
}

#[test]
fn vm_ir_lists_and_splices() {
    // {1, @{2, 3}, "a"}
    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeEmptyList)
        .push_int(1)
        .emit(Opcode::ListAddTail)
        .push_literal(Value::list([Value::Int(2), Value::Int(3)]))
        .emit(Opcode::CheckListForSplice)
        .emit(Opcode::ListAppend)
        .push_str("a")
        .emit(Opcode::ListAddTail)
        .emit(Opcode::Return);
    let expected = Value::list([Value::Int(1), Value::Int(2), Value::Int(3), Value::str("a")]);
    assert_eq!(run(b).unwrap(), expected);
}

#[test]
fn vm_ir_splicing_a_non_list_is_a_type_error() {
    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeEmptyList).push_int(4).emit(Opcode::CheckListForSplice);
    assert_eq!(raised(run(b)), ErrorCode::Type);
}

#[test]
fn vm_ir_maps() {
    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeMap)
        .push_str("k")
        .push_int(5)
        .emit(Opcode::MapInsert)
        .push_str("k")
        .emit(Opcode::Ref)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(5));

    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeMap).push_str("nope").emit(Opcode::Ref);
    assert_eq!(raised(run(b)), ErrorCode::Range);
}

#[test]
fn vm_ir_index_set_copies() {
    // x = {1, 2, 3}; y = x; y[2] = 9; return {x, y};
    let mut b = ProgramBuilder::new();
    b.push_literal(Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]))
        .assign("x")
        .push_var("x")
        .assign("y")
        .push_var("y")
        .push_int(2)
        .push_int(9)
        .emit(Opcode::IndexSet)
        .assign("y")
        .push_var("x")
        .emit(Opcode::MakeSingletonList)
        .push_var("y")
        .emit(Opcode::ListAddTail)
        .emit(Opcode::Return);
    let x = Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]);
    let y = Value::list([Value::Int(1), Value::Int(9), Value::Int(3)]);
    assert_eq!(run(b).unwrap(), Value::list([x, y]));
}

#[test]
fn vm_ir_ranges() {
    let mut b = ProgramBuilder::new();
    b.push_str("abcdef")
        .push_int(2)
        .push_int(4)
        .emit(Opcode::RangeRef)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::str("bcd"));

    let mut b = ProgramBuilder::new();
    b.push_str("abc").push_int(1).push_int(9).emit(Opcode::RangeRef);
    assert_eq!(raised(run(b)), ErrorCode::Range);
}

#[test]
fn vm_ir_length_reads_a_frame_slot() {
    // x = {1, 2, 3}; x[$]
    let mut b = ProgramBuilder::new();
    b.push_literal(Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]))
        .length(0)
        .emit(Opcode::Ref)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(3));
}

#[test]
fn vm_ir_comparisons() {
    let mut b = ProgramBuilder::new();
    b.push_str("ABC").push_str("abc").emit(Opcode::Eq).emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(1));

    let mut b = ProgramBuilder::new();
    b.push_int(3)
        .push_literal(Value::list([Value::Int(1), Value::Int(2), Value::Int(3)]))
        .emit(Opcode::In)
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(3));

    let mut b = ProgramBuilder::new();
    b.push_int(1).push_str("a").emit(Opcode::Lt);
    assert_eq!(raised(run(b)), ErrorCode::Type);
}

#[test]
fn vm_ir_mixed_arithmetic_is_a_type_error() {
    let mut b = ProgramBuilder::new();
    b.push_int(1).push_str("a").emit(Opcode::Add);
    assert_eq!(raised(run(b)), ErrorCode::Type);
}

#[test]
fn vm_ir_top_level_identity_is_unestablished() {
    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeEmptyList);
    for kind in [ContextKind::This, ContextKind::Caller, ContextKind::Verb, ContextKind::Definer] {
        b.context(kind).emit(Opcode::ListAddTail);
    }
    b.emit(Opcode::Return);
    let expected = Value::list([
        Value::Obj(Obj::NOTHING),
        Value::Obj(Obj::NOTHING),
        Value::str(""),
        Value::Obj(Obj::NOTHING),
    ]);
    assert_eq!(run(b).unwrap(), expected);
}

#[test]
fn vm_ir_properties_go_through_the_store() {
    let store = Arc::new(MemoryStore::new());
    let thing = store.create(Obj::NOTHING);
    store.define_property(thing, "color", Value::str("red")).unwrap();

    // thing.color = "blue"; return thing.color;
    let mut b = ProgramBuilder::new();
    b.push_literal(Value::Obj(thing))
        .push_str("color")
        .push_str("blue")
        .emit(Opcode::PutProp)
        .emit(Opcode::Pop)
        .push_literal(Value::Obj(thing))
        .push_str("COLOR")
        .emit(Opcode::GetProp)
        .emit(Opcode::Return);
    let mut vm = vm_with(store.clone(), VmConfig::default());
    assert_eq!(run_on(&mut vm, b).unwrap(), Value::str("blue"));

    let mut b = ProgramBuilder::new();
    b.push_literal(Value::Obj(thing)).push_str("size").emit(Opcode::GetProp);
    assert_eq!(raised(run_on(&mut vm, b)), ErrorCode::PropNotFound);

    let mut b = ProgramBuilder::new();
    b.push_literal(Value::Obj(Obj(99))).push_str("color").emit(Opcode::GetProp);
    assert_eq!(raised(run_on(&mut vm, b)), ErrorCode::InvalidIndirection);
}

#[test]
fn vm_ir_push_get_prop_keeps_operands_for_update() {
    let store = Arc::new(MemoryStore::new());
    let thing = store.create(Obj::NOTHING);
    store.define_property(thing, "count", Value::Int(1)).unwrap();

    // thing.count = thing.count + 1
    let mut b = ProgramBuilder::new();
    b.push_literal(Value::Obj(thing))
        .push_str("count")
        .emit(Opcode::PushGetProp)
        .push_int(1)
        .emit(Opcode::Add)
        .emit(Opcode::PutProp)
        .emit(Opcode::Return);
    let mut vm = vm_with(store.clone(), VmConfig::default());
    assert_eq!(run_on(&mut vm, b).unwrap(), Value::Int(2));
    assert_eq!(store.get_property(thing, "count").unwrap(), Value::Int(2));
}

#[test]
fn vm_ir_builtins() {
    let mut b = ProgramBuilder::new();
    b.push_literal(Value::list([Value::str("abc")]))
        .call_builtin("length")
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::Int(3));

    let mut b = ProgramBuilder::new();
    b.push_literal(Value::list([Value::list([Value::Int(1), Value::str("x")])]))
        .call_builtin("TOLITERAL")
        .emit(Opcode::Return);
    assert_eq!(run(b).unwrap(), Value::str("{1, \"x\"}"));

    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeEmptyList).call_builtin("no_such_builtin");
    assert_eq!(raised(run(b)), ErrorCode::InvalidArg);

    let mut b = ProgramBuilder::new();
    b.emit(Opcode::MakeEmptyList).call_builtin("length");
    assert_eq!(raised(run(b)), ErrorCode::Args);
}

#[test]
fn vm_ir_vm_is_reusable_after_an_error() {
    let mut vm = vm();
    let mut b = ProgramBuilder::new();
    b.push_int(1).push_int(0).emit(Opcode::Div);
    assert_eq!(raised(run_on(&mut vm, b)), ErrorCode::Div);

    let mut b = ProgramBuilder::new();
    b.push_int(1).push_int(1).emit(Opcode::Add).emit(Opcode::Return);
    assert_eq!(run_on(&mut vm, b).unwrap(), Value::Int(2));
    assert_eq!(vm.ticks(), 1);
}
