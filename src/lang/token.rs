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

//! Lexical tokens, shared by the query parser and the JSON deserializer.

use crate::util::Range;

/// A lexical token: a kind, the source range it covers, and — for
/// idents/strings/numbers — its resolved payload.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
    pub payload: Payload,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range) -> Self {
        Self { kind, range, payload: Payload::None }
    }

    pub fn ident(range: Range, name: String) -> Self {
        Self { kind: TokenKind::Ident, range, payload: Payload::Ident(name) }
    }

    pub fn string(range: Range, text: String) -> Self {
        Self { kind: TokenKind::Str, range, payload: Payload::Str(text) }
    }

    pub fn number(range: Range, value: f64) -> Self {
        Self { kind: TokenKind::Num, range, payload: Payload::Num(value) }
    }

    /// Returns the ident/string payload as a `&str`, if this token carries one.
    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Ident(s) | Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number payload, if this token carries one.
    pub fn as_number(&self) -> Option<f64> {
        match self.payload {
            Payload::Num(n) => Some(n),
            _ => None,
        }
    }
}

/// The resolved literal payload of a token.
#[derive(Clone, PartialEq, Debug)]
pub enum Payload {
    None,
    Ident(String),
    Str(String),
    Num(f64),
}

/// The kind of a lexical token.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    // Literals and identifiers
    Ident,
    Str,
    Num,
    True,
    False,
    Null,

    // Single-char operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Bar,
    Amp,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Lt,
    Gt,
    LBracket,
    RBracket,

    // Two-char operators
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    OrOr,
    AndAnd,

    /// `...` — recognized by the lexer (greedy three-dot match) but not
    /// used by any production in the grammar; reaching it in the parser
    /// is always an "unexpected token" error.
    Ellipsis,

    Eof,
}
