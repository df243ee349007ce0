use moo_core::Value;

/// Names bound at frame entry when a program declares them.
pub const READY_VARS: [&str; 5] = ["this", "player", "caller", "verb", "args"];

/// A compiled verb: instruction bytes, a literal pool and a local count.
///
/// Programs come from the compiler (or `ProgramBuilder`) and are only ever
/// read by the interpreter. Jump targets, literal and local indices inside
/// `code` are expected to be in bounds; the interpreter reports a fault when
/// they are not.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub code: Vec<u8>,
    pub literals: Vec<Value>,
    pub num_locals: usize,
    /// Names of the first `var_names.len()` locals, for ready-variable binding
    /// and diagnostics.
    pub var_names: Vec<String>,
}

impl Program {
    pub fn new(code: Vec<u8>, literals: Vec<Value>, num_locals: usize) -> Self {
        Self {
            code,
            literals,
            num_locals,
            var_names: Vec::new(),
        }
    }

    pub fn with_var_names(mut self, names: Vec<String>) -> Self {
        self.num_locals = self.num_locals.max(names.len());
        self.var_names = names;
        self
    }

    /// Local slot of a named variable; names compare case-insensitively.
    pub fn var_slot(&self, name: &str) -> Option<usize> {
        self.var_names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn var_name(&self, slot: usize) -> Option<&str> {
        self.var_names.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_names_extend_locals() {
        let p = Program::new(vec![], vec![], 1).with_var_names(vec!["this".into(), "X".into()]);
        assert_eq!(p.num_locals, 2);
        assert_eq!(p.var_slot("x"), Some(1));
        assert_eq!(p.var_slot("args"), None);
        assert_eq!(p.var_name(0), Some("this"));
    }
}
