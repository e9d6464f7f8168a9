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

//! JSON deserializer: a thin recursive-descent consumer over the shared
//! lexer's token stream, with a grammar distinct from the query
//! language's (string-only object keys, no access chains or operators
//! beyond unary minus on a numeric literal).

use crate::eval::error::{Error, ParseError};
use crate::lang::lexer::Lexer;
use crate::lang::token::{Token, TokenKind};
use crate::util::with::With;

use super::{object_insert, Value};

/// Parses a complete JSON document, requiring EOF after the value.
pub fn deserialize(input: &str) -> Result<Value, Error> {
    let mut parser = JsonParser::new(input)?;
    let value = parser.parse_value()?;
    parser.expect(TokenKind::Eof, ParseError::ExpectedEof)?;
    Ok(value)
}

struct JsonParser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> JsonParser<'a> {
    fn new(input: &'a str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next().map_err(Error::Lex)?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next().map_err(Error::Lex)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind, err: ParseError) -> Result<Token, Error> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.error(err))
        }
    }

    fn error(&self, err: ParseError) -> Error {
        Error::Parse(err.with(self.current.range))
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        match self.current.kind {
            TokenKind::True => { self.advance()?; Ok(Value::Bool(true)) },
            TokenKind::False => { self.advance()?; Ok(Value::Bool(false)) },
            TokenKind::Null => { self.advance()?; Ok(Value::Null) },
            TokenKind::Num => {
                let tok = self.advance()?;
                Ok(Value::Number(tok.as_number().expect("number token carries payload")))
            },
            TokenKind::Minus => {
                self.advance()?;
                let tok = self.expect(TokenKind::Num, ParseError::UnexpectedToken)?;
                Ok(Value::Number(-tok.as_number().expect("number token carries payload")))
            },
            TokenKind::Str => {
                let tok = self.advance()?;
                Ok(Value::String(tok.as_text().expect("string token carries payload").to_string()))
            },
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_object(),
            _ => Err(self.error(ParseError::UnexpectedToken)),
        }
    }

    fn parse_list(&mut self) -> Result<Value, Error> {
        self.advance()?; // '['
        let mut items = vec![];

        if self.current.kind != TokenKind::RBracket {
            loop {
                items.push(self.parse_value()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBracket, ParseError::MissingRBracket)?;
        Ok(Value::List(items))
    }

    fn parse_object(&mut self) -> Result<Value, Error> {
        self.advance()?; // '{'
        let mut fields = vec![];

        if self.current.kind != TokenKind::RBrace {
            loop {
                let key_tok = self.expect(TokenKind::Str, ParseError::ExpectedString)?;
                let key = key_tok.as_text().expect("string token carries payload").to_string();
                self.expect(TokenKind::Colon, ParseError::ExpectedColon)?;
                let value = self.parse_value()?;
                object_insert(&mut fields, key, value);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBrace, ParseError::MissingRBrace)?;
        Ok(Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_scalars() {
        assert_eq!( deserialize("true").unwrap(), Value::Bool(true) );
        assert_eq!( deserialize("null").unwrap(), Value::Null );
        assert_eq!( deserialize("42").unwrap(), Value::Number(42.0) );
        assert_eq!( deserialize("-3.5").unwrap(), Value::Number(-3.5) );
        assert_eq!( deserialize("\"hi\"").unwrap(), Value::String("hi".to_string()) );
    }

    #[test]
    fn deserializes_list() {
        assert_eq!(
            deserialize("[1, 2, 3]").unwrap(),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]),
        );
    }

    #[test]
    fn deserializes_nested_object() {
        let value = deserialize(r#"{"a":1,"b":[1,2]}"#).unwrap();
        assert_eq!( value, Value::Object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::List(vec![Value::Number(1.0), Value::Number(2.0)])),
        ]));
    }

    #[test]
    fn duplicate_keys_keep_first_position_last_value() {
        let value = deserialize(r#"{"foo":1,"foo":2}"#).unwrap();
        assert_eq!( value, Value::Object(vec![("foo".to_string(), Value::Number(2.0))]) );
    }

    #[test]
    fn object_key_must_be_string() {
        assert!( deserialize("{foo:1}").is_err() );
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert!( deserialize("1 2").is_err() );
    }

    #[test]
    fn unterminated_list_is_an_error() {
        assert!( deserialize("[1, 2").is_err() );
    }
}
