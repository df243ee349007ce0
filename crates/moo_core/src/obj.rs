use std::fmt;

/// Reference to an object in the store, by object number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Obj(pub i64);

impl Obj {
    /// `#-1`, the absence of an object.
    pub const NOTHING: Obj = Obj(-1);
    pub const AMBIGUOUS: Obj = Obj(-2);
    pub const FAILED_MATCH: Obj = Obj(-3);

    pub fn id(self) -> i64 {
        self.0
    }

    pub fn is_nothing(self) -> bool {
        self == Self::NOTHING
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for Obj {
    fn from(id: i64) -> Self {
        Obj(id)
    }
}
