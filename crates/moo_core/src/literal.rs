//! Printing values: `tostr` and `toliteral` forms.

use std::fmt;

use crate::value::Value;

/// Output sink shared by both printers.
trait Append {
    fn append_str(&mut self, s: &str);

    fn append_i64(&mut self, i: i64) {
        let mut buf = itoa::Buffer::new();
        self.append_str(buf.format(i));
    }

    fn append_f64(&mut self, f: f64) {
        let mut buf = ryu::Buffer::new();
        self.append_str(buf.format(f));
    }
}

impl Append for String {
    fn append_str(&mut self, s: &str) {
        self.push_str(s);
    }
}

fn append_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn append_literal(out: &mut String, v: &Value) {
    match v {
        Value::Int(i) => out.append_i64(*i),
        Value::Float(f) => out.append_f64(*f),
        Value::Str(s) => append_quoted(out, s),
        Value::Obj(o) => {
            out.push('#');
            out.append_i64(o.id());
        }
        Value::Err(e) => out.push_str(e.name()),
        Value::List(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                append_literal(out, item);
            }
            out.push('}');
        }
        Value::Map(m) => {
            out.push('[');
            for (i, (k, val)) in m.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                append_literal(out, k);
                out.push_str(" -> ");
                append_literal(out, val);
            }
            out.push(']');
        }
    }
}

impl Value {
    /// Source-code form: strings quoted and escaped, lists as `{a, b}`,
    /// maps as `[k -> v]`.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        append_literal(&mut out, self);
        out
    }

    /// Display form used by `tostr()`: strings verbatim, errors as their
    /// message, composites collapsed to `{list}` / `[map]`.
    pub fn to_str(&self) -> String {
        let mut out = String::new();
        match self {
            Value::Str(s) => out.push_str(s),
            Value::Err(e) => out.push_str(&e.to_string()),
            Value::List(_) => out.push_str("{list}"),
            Value::Map(_) => out.push_str("[map]"),
            other => append_literal(&mut out, other),
        }
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorCode, Obj, Value};

    #[test]
    fn literals() {
        let v = Value::list([
            Value::Int(-3),
            Value::Float(1.5),
            Value::str("say \"hi\""),
            Value::Obj(Obj(12)),
            Value::Err(ErrorCode::Div),
        ]);
        assert_eq!(v.to_literal(), r#"{-3, 1.5, "say \"hi\"", #12, E_DIV}"#);
    }

    #[test]
    fn map_literal_keeps_order() {
        let m = Value::map([(Value::str("b"), Value::Int(1)), (Value::Int(0), Value::empty_list())]).unwrap();
        assert_eq!(m.to_literal(), r#"["b" -> 1, 0 -> {}]"#);
    }

    #[test]
    fn tostr_forms() {
        assert_eq!(Value::str("plain").to_str(), "plain");
        assert_eq!(Value::Err(ErrorCode::Type).to_str(), "Type mismatch");
        assert_eq!(Value::empty_list().to_str(), "{list}");
        assert_eq!(Value::empty_map().to_str(), "[map]");
        assert_eq!(Value::Float(2.0).to_str(), "2.0");
        assert_eq!(Value::Obj(Obj::NOTHING).to_str(), "#-1");
    }
}
