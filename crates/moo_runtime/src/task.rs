use moo_core::Obj;

/// Identity of the task a run belongs to.
///
/// Passed unchanged into every builtin call and used for the `player` of
/// each new frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskContext {
    pub task_id: u64,
    pub player: Obj,
    /// Object whose permissions the task runs with.
    pub progr: Obj,
}

impl TaskContext {
    pub fn new(task_id: u64, player: Obj) -> Self {
        Self {
            task_id,
            player,
            progr: player,
        }
    }

    pub fn with_progr(mut self, progr: Obj) -> Self {
        self.progr = progr;
        self
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::new(0, Obj::NOTHING)
    }
}
