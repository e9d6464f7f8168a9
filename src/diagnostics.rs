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

//! Caret-style diagnostic rendering: a line excerpt with ~5 characters
//! of margin, a `^~~~~` underline, and the error message.

use colored::Colorize;

use crate::eval::error::Error;
use crate::util::Range;

const MARGIN: usize = 5;

/// Renders `err` against the `source` text it was raised from.
pub fn render(source: &str, err: &Error, color: bool) -> String {
    format(source, err.range(), &err.to_string(), color)
}

fn format(source: &str, range: Range, message: &str, color: bool) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let line_idx = (range.start.line as usize).saturating_sub(1);
    let line = lines.get(line_idx).copied().unwrap_or("");

    let start_col = range.start.column as usize;
    let end_col = if range.end.line == range.start.line {
        range.end.column as usize
    } else {
        line.len().max(start_col)
    };

    // `Range` is inclusive; the underlined span is [start_col, end_col].
    let err_len = end_col.saturating_sub(start_col) + 1;

    let margin_start = start_col.saturating_sub(1).saturating_sub(MARGIN);
    let margin_end = (end_col + MARGIN).min(line.len());

    let excerpt = line.get(margin_start..margin_end).unwrap_or(line);
    let caret_offset = (start_col - 1).saturating_sub(margin_start);

    let mut caret = String::new();
    caret.push_str(&" ".repeat(caret_offset));
    caret.push('^');
    caret.push_str(&"~".repeat(err_len.saturating_sub(1)));

    let (excerpt_line, caret_line, message_line) = if color {
        (excerpt.to_string(), caret.red().bold().to_string(), message.red().to_string())
    } else {
        (excerpt.to_string(), caret, message.to_string())
    };

    format!("{excerpt_line}\n{caret_line}\n{message_line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Position;

    #[test]
    fn caret_points_at_single_char_range() {
        let range = Range::new(Position::new(1, 1), Position::new(1, 1));
        let rendered = format("x + 1", range, "boom", false);
        let mut lines = rendered.lines();
        assert_eq!( lines.next().unwrap(), "x + 1" );
        assert_eq!( lines.next().unwrap(), "^" );
        assert_eq!( lines.next().unwrap(), "boom" );
    }

    #[test]
    fn caret_spans_a_multi_char_range() {
        let range = Range::new(Position::new(1, 1), Position::new(1, 5));
        let rendered = format("-true + 1", range, "expected number, got bool", false);
        let mut lines = rendered.lines();
        lines.next();
        assert_eq!( lines.next().unwrap(), "^~~~~" );
    }

    #[test]
    fn margin_trims_long_lines() {
        let source = "a".repeat(50);
        let range = Range::new(Position::new(1, 25), Position::new(1, 25));
        let rendered = format(&source, range, "boom", false);
        let excerpt = rendered.lines().next().unwrap();
        assert!( excerpt.len() <= 2 * MARGIN + 1 );
    }
}
