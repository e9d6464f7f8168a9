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

//! Lexer: byte stream to token stream.
//!
//! One [`Lexer`] instance serves both the query parser
//! ([`crate::lang::parser`]) and the JSON deserializer
//! ([`crate::json::parse`]) — they differ only in which tokens their
//! grammars accept, not in how tokens are scanned.

use crate::eval::error::{LexError, LexResult};
use crate::util::with::With;
use crate::util::{Position, Range};

use super::token::{Token, TokenKind};

/// Scans a source string into a stream of [`Token`]s.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0, position: Position::START }
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> u8 {
        self.input.get(self.pos + n).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Consumes and returns the current byte, advancing line/column
    /// bookkeeping. Safe to call at end of input (returns `0` forever).
    fn advance(&mut self) -> u8 {
        if self.at_end() {
            return 0;
        }
        let c = self.input[self.pos];
        self.pos += 1;
        if c == b'\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), b' ' | b'\t' | b'\n' | b'\r') {
            self.advance();
        }
    }

    /// Scans and returns the next token. Returns an infinite stream of
    /// [`TokenKind::Eof`] once the input is exhausted.
    pub fn next(&mut self) -> LexResult<Token> {
        self.skip_whitespace();
        let start = self.position;

        if self.at_end() {
            return Ok(Token::new(TokenKind::Eof, Range::at(start)));
        }

        match self.peek() {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Ok(self.lex_ident(start)),
            b'"' => self.lex_string(start),
            b'0'..=b'9' => self.lex_number(start),

            b'+' => Ok(self.single(start, TokenKind::Plus)),
            b'-' => Ok(self.single(start, TokenKind::Minus)),
            b'*' => Ok(self.single(start, TokenKind::Star)),
            b'/' => Ok(self.single(start, TokenKind::Slash)),
            b'%' => Ok(self.single(start, TokenKind::Percent)),
            b',' => Ok(self.single(start, TokenKind::Comma)),
            b';' => Ok(self.single(start, TokenKind::Semicolon)),
            b':' => Ok(self.single(start, TokenKind::Colon)),
            b'{' => Ok(self.single(start, TokenKind::LBrace)),
            b'}' => Ok(self.single(start, TokenKind::RBrace)),
            b'(' => Ok(self.single(start, TokenKind::LParen)),
            b')' => Ok(self.single(start, TokenKind::RParen)),
            b'[' => Ok(self.single(start, TokenKind::LBracket)),
            b']' => Ok(self.single(start, TokenKind::RBracket)),

            b'!' => Ok(self.one_or_two(start, b'=', TokenKind::Bang, TokenKind::NotEq)),
            b'|' => Ok(self.one_or_two(start, b'|', TokenKind::Bar, TokenKind::OrOr)),
            b'&' => Ok(self.one_or_two(start, b'&', TokenKind::Amp, TokenKind::AndAnd)),
            b'<' => Ok(self.one_or_two(start, b'=', TokenKind::Lt, TokenKind::LtEq)),
            b'>' => Ok(self.one_or_two(start, b'=', TokenKind::Gt, TokenKind::GtEq)),
            b'=' => self.lex_equal(start),
            b'.' => Ok(self.lex_dot(start)),

            c => {
                self.advance();
                Err(LexError::IllegalChar(c as char).with(Range::at(start)))
            }
        }
    }

    fn single(&mut self, start: Position, kind: TokenKind) -> Token {
        self.advance();
        Token::new(kind, Range::at(start))
    }

    /// Consumes one char; if the following char is `next`, consumes it too
    /// and yields `double`, else yields `single` after only one char.
    fn one_or_two(&mut self, start: Position, next: u8, single: TokenKind, double: TokenKind) -> Token {
        self.advance();
        if self.peek() == next {
            self.advance();
            Token::new(double, Range::new(start, self.position))
        } else {
            Token::new(single, Range::at(start))
        }
    }

    /// `=` is only valid in the grammar as `==`; a bare `=` is never a
    /// legal token, matching `original_source/src/lexer.c`'s `TOKEN_INVALID`.
    fn lex_equal(&mut self, start: Position) -> LexResult<Token> {
        self.advance();
        if self.peek() == b'=' {
            self.advance();
            Ok(Token::new(TokenKind::EqEq, Range::new(start, self.position)))
        } else {
            Err(LexError::IllegalChar('=').with(Range::at(start)))
        }
    }

    /// `.` is a single dot, or — if followed by two more dots — an
    /// ellipsis. Exactly two dots is not a valid token.
    fn lex_dot(&mut self, start: Position) -> Token {
        self.advance();
        if self.peek() == b'.' && self.peek_at(1) == b'.' {
            self.advance();
            self.advance();
            Token::new(TokenKind::Ellipsis, Range::new(start, self.position))
        } else {
            Token::new(TokenKind::Dot, Range::at(start))
        }
    }

    fn lex_ident(&mut self, start: Position) -> Token {
        let mut name = String::new();
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            name.push(self.advance() as char);
        }
        let range = Range::new(start, self.position);

        match name.as_str() {
            "true" => Token::new(TokenKind::True, range),
            "false" => Token::new(TokenKind::False, range),
            "null" => Token::new(TokenKind::Null, range),
            _ => Token::ident(range, name),
        }
    }

    fn lex_string(&mut self, start: Position) -> LexResult<Token> {
        self.advance(); // opening quote
        let mut text = String::new();

        loop {
            if self.at_end() {
                return Err(LexError::UnterminatedString.with(Range::new(start, self.position)));
            }

            let c = self.advance();
            match c {
                b'"' => break,
                b'\\' => {
                    match self.peek() {
                        b'"' => { text.push('"'); self.advance(); },
                        b'\\' => { text.push('\\'); self.advance(); },
                        // Unknown escapes pass through unresolved: both
                        // the backslash and the following byte are kept.
                        _ => text.push('\\'),
                    }
                },
                _ => text.push(c as char),
            }
        }

        let range = Range::new(start, self.position);
        Ok(Token::string(range, text))
    }

    fn lex_number(&mut self, start: Position) -> LexResult<Token> {
        let mut text = String::new();
        let mut has_decimal = false;

        loop {
            match self.peek() {
                b'0'..=b'9' => text.push(self.advance() as char),
                b'.' if !has_decimal => {
                    has_decimal = true;
                    text.push(self.advance() as char);
                },
                b'.' => {
                    return Err(LexError::InvalidDecimalSuffix.with(Range::new(start, self.position)));
                },
                _ => break,
            }
        }

        let range = Range::new(start, self.position);
        // `text` is built only from ASCII digits and at most one '.', so
        // this always parses.
        let value: f64 = text.parse().expect("lexer only emits well-formed number text");
        Ok(Token::number(range, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = vec![];
        loop {
            let tok = lexer.next().expect("lex error in test input");
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexer_empty() {
        assert_eq!( kinds(""), vec![TokenKind::Eof] );
    }

    #[test]
    fn lexer_whitespace_only() {
        assert_eq!( kinds("  \t\n\r "), vec![TokenKind::Eof] );
    }

    #[test]
    fn lexer_ident() {
        let mut lexer = Lexer::new("foo_1");
        let tok = lexer.next().unwrap();

        assert_eq!( tok.kind, TokenKind::Ident   );
        assert_eq!( tok.as_text(), Some("foo_1") );
    }

    #[test]
    fn lexer_keywords() {
        assert_eq!( kinds("true false null"), vec![
            TokenKind::True, TokenKind::False, TokenKind::Null, TokenKind::Eof,
        ]);
    }

    #[test]
    fn lexer_string_simple() {
        let mut lexer = Lexer::new("\"hello\"");
        let tok = lexer.next().unwrap();

        assert_eq!( tok.kind, TokenKind::Str       );
        assert_eq!( tok.as_text(), Some("hello")   );
    }

    #[test]
    fn lexer_string_escapes() {
        let mut lexer = Lexer::new(r#""a\"b\\c""#);
        let tok = lexer.next().unwrap();

        assert_eq!( tok.as_text(), Some(r#"a"b\c"#) );
    }

    #[test]
    fn lexer_string_unknown_escape_passes_through() {
        let mut lexer = Lexer::new(r#""a\nb""#);
        let tok = lexer.next().unwrap();

        assert_eq!( tok.as_text(), Some(r"a\nb") );
    }

    #[test]
    fn lexer_string_unterminated_is_error() {
        let mut lexer = Lexer::new("\"abc");
        assert!( lexer.next().is_err() );
    }

    #[test]
    fn lexer_number_integer() {
        let mut lexer = Lexer::new("42");
        let tok = lexer.next().unwrap();

        assert_eq!( tok.as_number(), Some(42.0) );
    }

    #[test]
    fn lexer_number_decimal() {
        let mut lexer = Lexer::new("10.2");
        let tok = lexer.next().unwrap();

        assert_eq!( tok.as_number(), Some(10.2) );
    }

    #[test]
    fn lexer_number_double_dot_is_error() {
        let mut lexer = Lexer::new("1.2.3");
        assert!( lexer.next().is_err() );
    }

    #[test]
    fn lexer_operators_single_and_double() {
        assert_eq!( kinds("== != <= >= || && < > !"), vec![
            TokenKind::EqEq, TokenKind::NotEq, TokenKind::LtEq, TokenKind::GtEq,
            TokenKind::OrOr, TokenKind::AndAnd, TokenKind::Lt, TokenKind::Gt, TokenKind::Bang,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn lexer_bare_equal_is_error() {
        let mut lexer = Lexer::new("=");
        assert!( lexer.next().is_err() );
    }

    #[test]
    fn lexer_dot_and_ellipsis() {
        assert_eq!( kinds(". ..."), vec![TokenKind::Dot, TokenKind::Ellipsis, TokenKind::Eof] );
    }

    #[test]
    fn lexer_illegal_char() {
        let mut lexer = Lexer::new("`");
        assert!( lexer.next().is_err() );
    }

    #[test]
    fn lexer_access_chain() {
        assert_eq!( kinds(".foo.bar[0]"), vec![
            TokenKind::Dot, TokenKind::Ident, TokenKind::Dot, TokenKind::Ident,
            TokenKind::LBracket, TokenKind::Num, TokenKind::RBracket, TokenKind::Eof,
        ]);
    }
}
