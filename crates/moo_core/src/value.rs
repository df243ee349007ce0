//! Runtime value representation.
//!
//! Values are immutable once built. Composite values (lists, maps) share their
//! storage through `Arc`; every "update" goes through `Arc::make_mut`, so a
//! value held elsewhere is never changed behind its owner's back.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;

use crate::error::ErrorCode;
use crate::obj::Obj;

/// Insertion-ordered association, the backing store of `Value::Map`.
pub type Map = IndexMap<Value, Value, RandomState>;

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<Map>),
    Obj(Obj),
    Err(ErrorCode),
}

/// Type codes as reported by `typeof()`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeCode {
    Int = 0,
    Obj = 1,
    Str = 2,
    Err = 3,
    List = 4,
    Float = 9,
    Map = 10,
}

impl Value {
    /// The canonical "no result" value: what a verb returns when it falls off
    /// the end of its instructions.
    pub const ZERO: Value = Value::Int(0);

    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    pub fn empty_list() -> Self {
        Value::List(Arc::new(Vec::new()))
    }

    pub fn empty_map() -> Self {
        Value::Map(Arc::new(Map::default()))
    }

    /// Build a map from pairs, rejecting keys that cannot be map keys.
    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Result<Self, ErrorCode> {
        let mut map = Map::default();
        for (k, v) in pairs {
            if !k.is_valid_key() {
                return Err(ErrorCode::Type);
            }
            map.insert(k, v);
        }
        Ok(Value::Map(Arc::new(map)))
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Int(_) => TypeCode::Int,
            Value::Float(_) => TypeCode::Float,
            Value::Str(_) => TypeCode::Str,
            Value::List(_) => TypeCode::List,
            Value::Map(_) => TypeCode::Map,
            Value::Obj(_) => TypeCode::Obj,
            Value::Err(_) => TypeCode::Err,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "STR",
            Value::List(_) => "LIST",
            Value::Map(_) => "MAP",
            Value::Obj(_) => "OBJ",
            Value::Err(_) => "ERR",
        }
    }

    /// Truthiness as used by conditionals, `!`, `&&` and `||`.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Obj(_) | Value::Err(_) => false,
        }
    }

    /// Lists and maps cannot key a map.
    pub fn is_valid_key(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<Obj> {
        match self {
            Value::Obj(o) => Some(*o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_err(&self) -> Option<ErrorCode> {
        match self {
            Value::Err(e) => Some(*e),
            _ => None,
        }
    }

    /// Equality as the `==` operator sees it: strings compare without regard
    /// to ASCII case, composites compare element-wise.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.eq_ignore_ascii_case(b),
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka.equals(kb) && va.equals(vb))
            }
            _ => self == other,
        }
    }
}

// Structural, case-sensitive identity. This is what map keys use; the `==`
// operator goes through `Value::equals`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Map(a), Value::Map(b)) => {
                Arc::ptr_eq(a, b) || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y))
            }
            (Value::Obj(a), Value::Obj(b)) => a == b,
            (Value::Err(a), Value::Err(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Map(m) => {
                m.len().hash(state);
                for (k, v) in m.iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Obj(o) => o.hash(state),
            Value::Err(e) => e.hash(state),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Obj> for Value {
    fn from(o: Obj) -> Self {
        Value::Obj(o)
    }
}

impl From<ErrorCode> for Value {
    fn from(e: ErrorCode) -> Self {
        Value::Err(e)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}
