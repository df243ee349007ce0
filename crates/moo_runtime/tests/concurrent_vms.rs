mod common;

use std::sync::Arc;
use std::thread;

use common::vm_with;
use moo_runtime::{MemoryStore, Obj, Opcode, ProgramBuilder, RunError, TaskContext, Value, VmConfig};

fn shared_world() -> (Arc<MemoryStore>, Obj) {
    let store = Arc::new(MemoryStore::new());
    let obj = store.create(Obj::NOTHING);
    store.define_property(obj, "base", Value::Int(1000)).unwrap();

    // return this.base + args[1];
    let mut b = ProgramBuilder::new();
    b.push_var("this")
        .push_str("base")
        .emit(Opcode::GetProp)
        .push_var("args")
        .push_int(1)
        .emit(Opcode::Ref)
        .emit(Opcode::Add)
        .emit(Opcode::Return);
    store.add_verb(obj, "offset", b.build().unwrap()).unwrap();

    let mut b = ProgramBuilder::new();
    let top = b.label();
    b.bind(top).jump(Opcode::Jump, top);
    store.add_verb(obj, "spin", b.build().unwrap()).unwrap();
    (store, obj)
}

#[test]
fn interpreters_share_only_the_store() {
    let (store, obj) = shared_world();
    thread::scope(|s| {
        let handles: Vec<_> = (0..4i64)
            .map(|id| {
                let store = store.clone();
                s.spawn(move || {
                    let mut vm = vm_with(store, VmConfig::default());
                    let task = TaskContext::new(id as u64, Obj(100 + id));
                    (0..50i64)
                        .map(|i| vm.call_verb(obj, "offset", vec![Value::Int(id * 100 + i)], &task))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for (id, handle) in handles.into_iter().enumerate() {
            let results = handle.join().unwrap();
            for (i, result) in results.into_iter().enumerate() {
                assert_eq!(result, Ok(Value::Int(1000 + id as i64 * 100 + i as i64)));
            }
        }
    });
}

#[test]
fn tick_budgets_are_per_interpreter() {
    let (store, obj) = shared_world();
    thread::scope(|s| {
        let spinner = s.spawn(|| {
            let mut vm = vm_with(store.clone(), VmConfig::default().with_tick_limit(10_000));
            let result = vm.call_verb(obj, "spin", vec![], &TaskContext::default());
            (result, vm.ticks())
        });
        let worker = s.spawn(|| {
            let mut vm = vm_with(store.clone(), VmConfig::default().with_tick_limit(10));
            let result = vm.call_verb(obj, "offset", vec![Value::Int(1)], &TaskContext::default());
            (result, vm.ticks())
        });
        let (spun, spin_ticks) = spinner.join().unwrap();
        assert_eq!(spun, Err(RunError::TicksExhausted { limit: 10_000 }));
        assert_eq!(spin_ticks, 10_000);
        let (worked, work_ticks) = worker.join().unwrap();
        assert_eq!(worked, Ok(Value::Int(1001)));
        assert_eq!(work_ticks, 3);
    });
}
