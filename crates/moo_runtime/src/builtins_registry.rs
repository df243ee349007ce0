use ahash::RandomState;
use hashbrown::HashMap;
use moo_core::{Obj, Value};

use super::builtins;
use crate::errors::Exception;
use crate::store::Store;
use crate::task::TaskContext;

/// What a builtin can see of the running verb.
pub struct BuiltinCtx<'a> {
    pub task: &'a TaskContext,
    pub store: &'a dyn Store,
    pub this: Obj,
    pub player: Obj,
    pub caller: Obj,
    pub verb: &'a str,
    pub ticks_left: usize,
}

pub type BuiltinFn = fn(&mut BuiltinCtx<'_>, &[Value]) -> Result<Value, Exception>;

/// Builtin functions by name. Names are case-insensitive.
pub struct BuiltinRegistry {
    entries: HashMap<Box<str>, BuiltinFn, RandomState>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }

    /// Registry holding the standard set.
    pub fn with_std() -> Self {
        let mut registry = Self::new();
        StdBuiltinProvider.install(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &str, fun: BuiltinFn) {
        self.entries.insert(name.to_ascii_lowercase().into_boxed_str(), fun);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        if let Some(f) = self.entries.get(name) {
            return Some(*f);
        }
        self.entries.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub trait BuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry);
}

pub struct StdBuiltinProvider;

impl BuiltinProvider for StdBuiltinProvider {
    fn install(&self, registry: &mut BuiltinRegistry) {
        registry.register("raise", builtins::builtin_raise);
        registry.register("typeof", builtins::builtin_typeof);
        registry.register("length", builtins::builtin_length);
        registry.register("tostr", builtins::builtin_tostr);
        registry.register("toliteral", builtins::builtin_toliteral);
        registry.register("valid", builtins::builtin_valid);
        registry.register("ticks_left", builtins::builtin_ticks_left);
    }
}
