// This file is part of dotql, a JSON query tool.
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// dotql is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// dotql is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with dotql.  If not, see <http://www.gnu.org/licenses/>.

//! JSON serializer: compact or two-space-indented, with an optional
//! fixed ANSI color scheme.

use colored::Colorize;

use super::Value;

/// Serialization options.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub indent: bool,
    pub color: bool,
}

impl Options {
    pub const fn compact() -> Self {
        Self { indent: false, color: false }
    }

    pub const fn indented() -> Self {
        Self { indent: true, color: false }
    }

    pub fn colored(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Serializes `value` into a string per `options`.
pub fn serialize(value: &Value, options: Options) -> String {
    let mut out = String::new();
    write_value(&mut out, value, options, 0);
    out
}

fn write_value(out: &mut String, value: &Value, options: Options, depth: usize) {
    match value {
        Value::Null => out.push_str(&paint(options, "null", Paint::Null)),
        Value::Bool(b) => out.push_str(&paint(options, &b.to_string(), Paint::Bool)),
        Value::Number(n) => out.push_str(&paint(options, &format_number(*n), Paint::Number)),
        Value::String(s) => out.push_str(&paint(options, &format!("\"{s}\""), Paint::String)),
        Value::List(items) => write_list(out, items, options, depth),
        Value::Object(fields) => write_object(out, fields, options, depth),
    }
}

fn write_list(out: &mut String, items: &[Value], options: Options, depth: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }

    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        newline_indent(out, options, depth + 1);
        write_value(out, item, options, depth + 1);
    }
    newline_indent(out, options, depth);
    out.push(']');
}

fn write_object(out: &mut String, fields: &[(String, Value)], options: Options, depth: usize) {
    if fields.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push('{');
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        newline_indent(out, options, depth + 1);
        out.push_str(&paint(options, &format!("\"{key}\""), Paint::Key));
        out.push_str(": ");
        write_value(out, value, options, depth + 1);
    }
    newline_indent(out, options, depth);
    out.push('}');
}

fn newline_indent(out: &mut String, options: Options, depth: usize) {
    if options.indent {
        out.push('\n');
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
}

/// Minimum exact representation: integer syntax when the value is
/// exactly integral, decimal syntax trimming trailing zeros otherwise.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[derive(Clone, Copy)]
enum Paint {
    String,
    Number,
    Key,
    Bool,
    Null,
}

fn paint(options: Options, text: &str, kind: Paint) -> String {
    if !options.color {
        return text.to_string();
    }
    match kind {
        Paint::String => text.green().to_string(),
        Paint::Number => text.cyan().to_string(),
        Paint::Key => text.blue().bold().to_string(),
        Paint::Bool => text.red().to_string(),
        Paint::Null => text.black().italic().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_object_matches_fixture_spacing() {
        let value = Value::Object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::List(vec![Value::Number(1.0), Value::Number(2.0)])),
        ]);
        assert_eq!( serialize(&value, Options::compact()), r#"{"a": 1, "b": [1, 2]}"# );
    }

    #[test]
    fn compact_empty_collections() {
        assert_eq!( serialize(&Value::List(vec![]), Options::compact()), "[]" );
        assert_eq!( serialize(&Value::Object(vec![]), Options::compact()), "{}" );
    }

    #[test]
    fn number_formatting_trims_trailing_zeros() {
        assert_eq!( format_number(10.0), "10" );
        assert_eq!( format_number(10.2), "10.2" );
        assert_eq!( format_number(-3.5), "-3.5" );
    }

    #[test]
    fn indented_nests_with_two_spaces() {
        let value = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!( serialize(&value, Options::indented()), "[\n  1, \n  2\n]" );
    }

    #[test]
    fn color_wraps_with_ansi_codes() {
        let out = serialize(&Value::Bool(true), Options::compact().colored(true));
        assert!( out.contains("true") );
        assert_ne!( out, "true" );
    }
}
