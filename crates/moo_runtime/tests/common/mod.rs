#![allow(dead_code)]

use std::sync::{Arc, Once};

use moo_runtime::{
    BuiltinRegistry, ErrorCode, MemoryStore, ProgramBuilder, RunError, TaskContext, Value, Vm, VmConfig,
};

/// Route interpreter logs to the test harness. `RUST_LOG` is not consulted;
/// run with `--nocapture` to see them.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    });
}

pub fn vm_with(store: Arc<MemoryStore>, config: VmConfig) -> Vm {
    init_tracing();
    Vm::new(store, Arc::new(BuiltinRegistry::with_std()), config)
}

pub fn vm() -> Vm {
    vm_with(Arc::new(MemoryStore::new()), VmConfig::default())
}

pub fn run_on(vm: &mut Vm, b: ProgramBuilder) -> Result<Value, RunError> {
    let program = b.build().unwrap();
    vm.run(Arc::new(program), &TaskContext::default())
}

pub fn run(b: ProgramBuilder) -> Result<Value, RunError> {
    run_on(&mut vm(), b)
}

/// The code of the uncaught error a run ended with.
pub fn raised(result: Result<Value, RunError>) -> ErrorCode {
    match result {
        Err(RunError::Raised(exc)) => exc.code,
        other => panic!("expected an uncaught error, got {other:?}"),
    }
}
