//! Text output for JSON values.

use std::fmt::{self, Write as _};

use super::Value;

impl Value {
    /// Renders the value as text.
    ///
    /// Containers put each member on its own line, indented with
    /// `indent + 1` tabs; the closing bracket gets `indent` tabs. Empty
    /// containers stay on one line.
    #[must_use]
    pub fn serialize(&self, indent: usize) -> String {
        let mut out = String::new();
        write_value(&mut out, self, indent);
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(0))
    }
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(x) => write_float(out, *x),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_tabs(out, indent + 1);
                write_value(out, item, indent + 1);
            }
            out.push('\n');
            push_tabs(out, indent);
            out.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_tabs(out, indent + 1);
                write_string(out, key);
                out.push_str(": ");
                write_value(out, item, indent + 1);
            }
            out.push('\n');
            push_tabs(out, indent);
            out.push('}');
        }
    }
}

fn push_tabs(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\t', count));
}

// Six fixed decimals when that reads back exactly, otherwise the shortest
// text that does. Both forms contain '.' or 'e', so they parse as floats.
#[allow(clippy::float_cmp)]
fn write_float(out: &mut String, x: f64) {
    if !x.is_finite() {
        out.push_str("null");
        return;
    }
    let fixed = format!("{x:.6}");
    if fixed.parse::<f64>().is_ok_and(|y| y == x) {
        out.push_str(&fixed);
    } else {
        let _ = write!(out, "{x:?}");
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
