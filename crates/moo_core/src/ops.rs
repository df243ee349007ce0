//! Operators on values: arithmetic, ordering, indexing and sequence updates.
//!
//! Every operation returns the error code the scripting language raises on
//! failure. Arithmetic is type-strict: integers and floats never mix.
//! Indexes are 1-based.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::ErrorCode;
use crate::value::Value;

type OpResult = Result<Value, ErrorCode>;

fn float_result(f: f64) -> OpResult {
    if f.is_finite() { Ok(Value::Float(f)) } else { Err(ErrorCode::Float) }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Convert a 1-based index into a 0-based offset below `len`.
fn offset(idx: &Value, len: usize) -> Result<usize, ErrorCode> {
    let Value::Int(i) = idx else {
        return Err(ErrorCode::Type);
    };
    if *i < 1 || *i as u64 > len as u64 {
        return Err(ErrorCode::Range);
    }
    Ok((*i - 1) as usize)
}

/// Validate a 1-based inclusive `from..to` range over a sequence of `len`.
/// An empty range (`from > to`) is allowed as long as `from` is at most
/// `len + 1` and `to` is not negative.
fn bounds(from: &Value, to: &Value, len: usize) -> Result<(usize, usize), ErrorCode> {
    let (Value::Int(from), Value::Int(to)) = (from, to) else {
        return Err(ErrorCode::Type);
    };
    let (from, to) = (*from, *to);
    let len = len as i64;
    if from > to {
        if from < 1 || from > len + 1 || to < 0 {
            return Err(ErrorCode::Range);
        }
        let start = (from - 1) as usize;
        return Ok((start, start));
    }
    if from < 1 || to > len {
        return Err(ErrorCode::Range);
    }
    Ok(((from - 1) as usize, to as usize))
}

impl Value {
    pub fn add(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Float(a), Value::Float(b)) => float_result(a + b),
            (Value::Str(a), Value::Str(b)) => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Ok(Value::from(s))
            }
            _ => Err(ErrorCode::Type),
        }
    }

    pub fn sub(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            (Value::Float(a), Value::Float(b)) => float_result(a - b),
            _ => Err(ErrorCode::Type),
        }
    }

    pub fn mul(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            (Value::Float(a), Value::Float(b)) => float_result(a * b),
            _ => Err(ErrorCode::Type),
        }
    }

    pub fn div(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ErrorCode::Div),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => Err(ErrorCode::Div),
            (Value::Float(a), Value::Float(b)) => float_result(a / b),
            _ => Err(ErrorCode::Type),
        }
    }

    /// `%`: the remainder takes the sign of the dividend.
    pub fn rem(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ErrorCode::Div),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => Err(ErrorCode::Div),
            (Value::Float(a), Value::Float(b)) => float_result(a % b),
            _ => Err(ErrorCode::Type),
        }
    }

    /// `^`. A float base accepts an integer or float exponent; an integer
    /// base only an integer one.
    pub fn pow(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let (a, b) = (*a, *b);
                if b < 0 {
                    return match a {
                        0 => Err(ErrorCode::Div),
                        1 => Ok(Value::Int(1)),
                        -1 => Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
                        _ => Ok(Value::Int(0)),
                    };
                }
                let exp = u32::try_from(b).unwrap_or(u32::MAX);
                Ok(Value::Int(a.wrapping_pow(exp)))
            }
            (Value::Float(a), Value::Int(b)) => {
                let exp = i32::try_from(*b).map_err(|_| ErrorCode::Float)?;
                float_result(a.powi(exp))
            }
            (Value::Float(a), Value::Float(b)) => float_result(a.powf(*b)),
            _ => Err(ErrorCode::Type),
        }
    }

    pub fn neg(&self) -> OpResult {
        match self {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            _ => Err(ErrorCode::Type),
        }
    }

    /// Ordering for `<`, `<=`, `>` and `>=`; only values of one type compare.
    pub fn compare(&self, rhs: &Value) -> Result<Ordering, ErrorCode> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).ok_or(ErrorCode::Float),
            (Value::Str(a), Value::Str(b)) => Ok(cmp_ignore_ascii_case(a, b)),
            (Value::Obj(a), Value::Obj(b)) => Ok(a.cmp(b)),
            (Value::Err(a), Value::Err(b)) => Ok(a.cmp(b)),
            _ => Err(ErrorCode::Type),
        }
    }

    /// Number of elements, characters or entries.
    pub fn len(&self) -> Result<usize, ErrorCode> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::List(l) => Ok(l.len()),
            Value::Map(m) => Ok(m.len()),
            _ => Err(ErrorCode::Type),
        }
    }

    /// `seq[idx]`.
    pub fn index(&self, idx: &Value) -> OpResult {
        match self {
            Value::List(l) => Ok(l[offset(idx, l.len())?].clone()),
            Value::Str(s) => {
                let at = offset(idx, s.chars().count())?;
                let c = s.chars().nth(at).ok_or(ErrorCode::Range)?;
                Ok(Value::from(c.to_string()))
            }
            Value::Map(m) => {
                if !idx.is_valid_key() {
                    return Err(ErrorCode::Type);
                }
                m.get(idx).cloned().ok_or(ErrorCode::Range)
            }
            _ => Err(ErrorCode::Type),
        }
    }

    /// `seq[idx] = value`, producing the updated sequence.
    pub fn index_set(self, idx: &Value, value: Value) -> OpResult {
        match self {
            Value::List(mut l) => {
                let at = offset(idx, l.len())?;
                Arc::make_mut(&mut l)[at] = value;
                Ok(Value::List(l))
            }
            Value::Str(s) => {
                let at = offset(idx, s.chars().count())?;
                let Value::Str(replacement) = &value else {
                    return Err(ErrorCode::Type);
                };
                let mut chars = replacement.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(ErrorCode::InvalidArg);
                };
                let updated: String = s
                    .chars()
                    .enumerate()
                    .map(|(i, orig)| if i == at { c } else { orig })
                    .collect();
                Ok(Value::from(updated))
            }
            Value::Map(mut m) => {
                if !idx.is_valid_key() {
                    return Err(ErrorCode::Type);
                }
                Arc::make_mut(&mut m).insert(idx.clone(), value);
                Ok(Value::Map(m))
            }
            _ => Err(ErrorCode::Type),
        }
    }

    /// `seq[from..to]`, inclusive on both ends.
    pub fn range(&self, from: &Value, to: &Value) -> OpResult {
        match self {
            Value::List(l) => {
                let (start, end) = bounds(from, to, l.len())?;
                Ok(Value::list(l[start..end].iter().cloned()))
            }
            Value::Str(s) => {
                let (start, end) = bounds(from, to, s.chars().count())?;
                let sub: String = s.chars().skip(start).take(end - start).collect();
                Ok(Value::from(sub))
            }
            _ => Err(ErrorCode::Type),
        }
    }

    /// `seq[from..to] = value`: splice `value` in place of the range.
    pub fn range_set(self, from: &Value, to: &Value, value: &Value) -> OpResult {
        match (self, value) {
            (Value::List(l), Value::List(with)) => {
                let (start, end) = bounds(from, to, l.len())?;
                let mut out = Vec::with_capacity(l.len() - (end - start) + with.len());
                out.extend_from_slice(&l[..start]);
                out.extend(with.iter().cloned());
                out.extend_from_slice(&l[end..]);
                Ok(Value::from(out))
            }
            (Value::Str(s), Value::Str(with)) => {
                let (start, end) = bounds(from, to, s.chars().count())?;
                let mut out: String = s.chars().take(start).collect();
                out.push_str(with);
                out.extend(s.chars().skip(end));
                Ok(Value::from(out))
            }
            _ => Err(ErrorCode::Type),
        }
    }

    /// `self in seq`: 1-based position of the first element equal to `self`,
    /// or 0. Maps are searched by value.
    pub fn position_in(&self, seq: &Value) -> Result<i64, ErrorCode> {
        let found = match seq {
            Value::List(l) => l.iter().position(|v| v.equals(self)),
            Value::Map(m) => m.values().position(|v| v.equals(self)),
            _ => return Err(ErrorCode::Type),
        };
        Ok(found.map_or(0, |i| i as i64 + 1))
    }

    /// Append one element to a list.
    pub fn push(self, item: Value) -> OpResult {
        let Value::List(mut l) = self else {
            return Err(ErrorCode::Type);
        };
        Arc::make_mut(&mut l).push(item);
        Ok(Value::List(l))
    }

    /// Concatenate two lists (the `@` splice).
    pub fn extend(self, items: &Value) -> OpResult {
        let (Value::List(mut l), Value::List(items)) = (self, items) else {
            return Err(ErrorCode::Type);
        };
        Arc::make_mut(&mut l).extend(items.iter().cloned());
        Ok(Value::List(l))
    }

    /// Insert or replace a map entry.
    pub fn insert(self, key: Value, value: Value) -> OpResult {
        let Value::Map(mut m) = self else {
            return Err(ErrorCode::Type);
        };
        if !key.is_valid_key() {
            return Err(ErrorCode::Type);
        }
        Arc::make_mut(&mut m).insert(key, value);
        Ok(Value::Map(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::Obj;

    fn ints(xs: &[i64]) -> Value {
        Value::list(xs.iter().map(|&i| Value::Int(i)))
    }

    #[test]
    fn arithmetic_is_type_strict() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(Value::Int(2).add(&Value::Float(3.0)), Err(ErrorCode::Type));
        assert_eq!(Value::str("ab").add(&Value::str("cd")), Ok(Value::str("abcd")));
        assert_eq!(Value::Obj(Obj(1)).mul(&Value::Int(2)), Err(ErrorCode::Type));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(Value::Int(10).div(&Value::Int(0)), Err(ErrorCode::Div));
        assert_eq!(Value::Int(10).rem(&Value::Int(0)), Err(ErrorCode::Div));
        assert_eq!(Value::Float(1.0).div(&Value::Float(0.0)), Err(ErrorCode::Div));
        assert_eq!(Value::Int(i64::MIN).div(&Value::Int(-1)), Ok(Value::Int(i64::MIN)));
        assert_eq!(Value::Int(-7).rem(&Value::Int(2)), Ok(Value::Int(-1)));
    }

    #[test]
    fn float_overflow_is_a_float_error() {
        assert_eq!(Value::Float(f64::MAX).mul(&Value::Float(2.0)), Err(ErrorCode::Float));
    }

    #[test]
    fn integer_power() {
        assert_eq!(Value::Int(2).pow(&Value::Int(10)), Ok(Value::Int(1024)));
        assert_eq!(Value::Int(2).pow(&Value::Int(-1)), Ok(Value::Int(0)));
        assert_eq!(Value::Int(-1).pow(&Value::Int(-3)), Ok(Value::Int(-1)));
        assert_eq!(Value::Int(0).pow(&Value::Int(-1)), Err(ErrorCode::Div));
        assert_eq!(Value::Float(2.0).pow(&Value::Int(3)), Ok(Value::Float(8.0)));
    }

    #[test]
    fn ordering_within_one_type() {
        assert_eq!(Value::str("abc").compare(&Value::str("ABD")), Ok(Ordering::Less));
        assert_eq!(Value::Obj(Obj(3)).compare(&Value::Obj(Obj(2))), Ok(Ordering::Greater));
        assert_eq!(Value::Int(1).compare(&Value::str("1")), Err(ErrorCode::Type));
    }

    #[test]
    fn one_based_indexing() {
        let l = ints(&[10, 20, 30]);
        assert_eq!(l.index(&Value::Int(1)), Ok(Value::Int(10)));
        assert_eq!(l.index(&Value::Int(0)), Err(ErrorCode::Range));
        assert_eq!(l.index(&Value::Int(4)), Err(ErrorCode::Range));
        assert_eq!(l.index(&Value::str("1")), Err(ErrorCode::Type));
        assert_eq!(Value::str("hey").index(&Value::Int(2)), Ok(Value::str("e")));
    }

    #[test]
    fn index_set_does_not_touch_shared_copies() {
        let original = ints(&[1, 2, 3]);
        let alias = original.clone();
        let updated = alias.index_set(&Value::Int(2), Value::Int(99)).unwrap();
        assert_eq!(updated, ints(&[1, 99, 3]));
        assert_eq!(original, ints(&[1, 2, 3]));
    }

    #[test]
    fn string_index_set_needs_one_character() {
        let s = Value::str("cat");
        assert_eq!(s.clone().index_set(&Value::Int(1), Value::str("b")), Ok(Value::str("bat")));
        assert_eq!(s.index_set(&Value::Int(1), Value::str("xy")), Err(ErrorCode::InvalidArg));
    }

    #[test]
    fn map_lookup_and_update() {
        let m = Value::map([(Value::str("a"), Value::Int(1))]).unwrap();
        assert_eq!(m.index(&Value::str("a")), Ok(Value::Int(1)));
        assert_eq!(m.index(&Value::str("b")), Err(ErrorCode::Range));
        let m = m.index_set(&Value::str("b"), Value::Int(2)).unwrap();
        assert_eq!(m.len(), Ok(2));
    }

    #[test]
    fn ranges() {
        let l = ints(&[1, 2, 3, 4]);
        assert_eq!(l.range(&Value::Int(2), &Value::Int(3)), Ok(ints(&[2, 3])));
        assert_eq!(l.range(&Value::Int(3), &Value::Int(2)), Ok(ints(&[])));
        assert_eq!(l.range(&Value::Int(0), &Value::Int(2)), Err(ErrorCode::Range));
        assert_eq!(l.range(&Value::Int(2), &Value::Int(5)), Err(ErrorCode::Range));
        assert_eq!(Value::str("hello").range(&Value::Int(2), &Value::Int(4)), Ok(Value::str("ell")));
        assert_eq!(
            l.range_set(&Value::Int(2), &Value::Int(3), &ints(&[9])),
            Ok(ints(&[1, 9, 4]))
        );
        assert_eq!(
            Value::str("hello").range_set(&Value::Int(1), &Value::Int(0), &Value::str(">")),
            Ok(Value::str(">hello"))
        );
    }

    #[test]
    fn membership() {
        let l = Value::list([Value::str("A"), Value::str("b")]);
        assert_eq!(Value::str("a").position_in(&l), Ok(1));
        assert_eq!(Value::str("c").position_in(&l), Ok(0));
        assert_eq!(Value::Int(1).position_in(&Value::Int(1)), Err(ErrorCode::Type));
    }

    #[test]
    fn list_building() {
        let l = Value::empty_list().push(Value::Int(1)).unwrap();
        let l = l.extend(&ints(&[2, 3])).unwrap();
        assert_eq!(l, ints(&[1, 2, 3]));
        assert_eq!(Value::Int(1).push(Value::Int(2)), Err(ErrorCode::Type));
    }
}
