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

//! Recursive-descent, precedence-climbing parser: token stream to
//! [`Ast`].
//!
//! On the first error the parser stops; remaining tokens are not
//! consumed.

use crate::eval::builtins::is_builtin;
use crate::eval::error::{Error, ParseError};
use crate::util::Range;
use crate::util::with::With;

use super::ast::{Ast, BinaryOp, Field, Pattern, UnaryOp};
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

/// Parses a complete query expression, requiring EOF after it.
pub fn parse(input: &str) -> Result<Ast, Error> {
    Parser::new(input)?.parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next().map_err(Error::Lex)?;
        Ok(Self { lexer, current })
    }

    pub fn parse(mut self) -> Result<Ast, Error> {
        let ast = self.parse_or()?;
        self.expect(TokenKind::Eof, ParseError::ExpectedEof)?;
        Ok(ast)
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

    // -- precedence climbing -------------------------------------------

    fn parse_or(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_and()?;
        while self.current.kind == TokenKind::OrOr {
            self.advance()?;
            let rhs = self.parse_and()?;
            lhs = self.binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_eq()?;
        while self.current.kind == TokenKind::AndAnd {
            self.advance()?;
            let rhs = self.parse_eq()?;
            lhs = self.binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_cmp()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_cmp()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_add()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_mul()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn binary(&self, op: BinaryOp, lhs: Ast, rhs: Ast) -> Ast {
        let range = lhs.range().to(rhs.range());
        Ast::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), range }
    }

    fn parse_unary(&mut self) -> Result<Ast, Error> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.current.range;
        self.advance()?;
        let rhs = self.parse_unary()?;
        let range = start.to(rhs.range());
        Ok(Ast::Unary { op, rhs: Box::new(rhs), range })
    }

    // -- postfix: access chains and calls -------------------------------

    fn parse_postfix(&mut self) -> Result<Ast, Error> {
        let mut base = if self.current.kind == TokenKind::Dot {
            self.parse_dotted(None)?
        } else {
            self.parse_primary()?
        };

        loop {
            base = match self.current.kind {
                TokenKind::Dot => self.parse_dotted(Some(Box::new(base)))?,
                TokenKind::LBracket => self.parse_bracket(Box::new(base))?,
                _ => break,
            };
        }

        Ok(base)
    }

    /// Parses one `.accessor` or `.name(args)` segment, given the
    /// already-parsed `inner` (`None` for a leading dot, meaning "the
    /// input").
    fn parse_dotted(&mut self, inner: Option<Box<Ast>>) -> Result<Ast, Error> {
        let dot = self.expect(TokenKind::Dot, ParseError::UnexpectedToken)?;
        let start = inner.as_deref().map(Ast::range).unwrap_or(dot.range);

        match self.current.kind {
            TokenKind::Ident => {
                let tok = self.advance()?;
                let name = tok.as_text().expect("ident token carries text").to_string();

                if self.current.kind == TokenKind::LParen {
                    let (args, args_range) = self.parse_args()?;
                    Ok(Ast::FunctionCall { callee: inner, name, args, range: start.to(args_range) })
                } else if is_builtin(&name) {
                    // A built-in called with no arguments, e.g. the
                    // trailing `.collect` in `.foo.map(...).collect`.
                    Ok(Ast::FunctionCall { callee: inner, name, args: vec![], range: start.to(tok.range) })
                } else {
                    let accessor = Box::new(Ast::Primary(Token::string(tok.range, name)));
                    Ok(Ast::Access { inner, accessor, range: start.to(tok.range) })
                }
            },
            TokenKind::Num => {
                let tok = self.advance()?;
                let range = start.to(tok.range);
                Ok(Ast::Access { inner, accessor: Box::new(Ast::Primary(tok)), range })
            },
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_or()?;
                let rparen = self.expect(TokenKind::RParen, ParseError::MissingRParen)?;
                let range = start.to(rparen.range);
                Ok(Ast::Access { inner, accessor: Box::new(expr), range })
            },
            _ => Err(self.error(ParseError::UnexpectedToken)),
        }
    }

    fn parse_bracket(&mut self, inner: Box<Ast>) -> Result<Ast, Error> {
        let start = inner.range();
        self.advance()?; // '['
        let expr = self.parse_or()?;
        let rbracket = self.expect(TokenKind::RBracket, ParseError::MissingRBracket)?;
        let range = start.to(rbracket.range);
        Ok(Ast::Access { inner: Some(inner), accessor: Box::new(expr), range })
    }

    /// Parses a parenthesized, comma-separated argument list, returning
    /// the arguments and the range from `(` to `)`.
    fn parse_args(&mut self) -> Result<(Vec<Ast>, Range), Error> {
        let lparen = self.expect(TokenKind::LParen, ParseError::UnexpectedToken)?;
        let mut args = vec![];

        if self.current.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_or()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        let rparen = self.expect(TokenKind::RParen, ParseError::MissingRParen)?;
        Ok((args, lparen.range.to(rparen.range)))
    }

    // -- primary ---------------------------------------------------------

    fn parse_primary(&mut self) -> Result<Ast, Error> {
        match self.current.kind {
            TokenKind::Num | TokenKind::Str | TokenKind::Ident => {
                Ok(Ast::Primary(self.advance()?))
            },
            TokenKind::True => Ok(Ast::True(self.advance()?.range)),
            TokenKind::False => Ok(Ast::False(self.advance()?.range)),
            TokenKind::Null => Ok(Ast::NullLit(self.advance()?.range)),
            TokenKind::LParen => self.parse_grouping(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Bar => self.parse_closure(),
            _ => Err(self.error(ParseError::UnexpectedToken)),
        }
    }

    fn parse_grouping(&mut self) -> Result<Ast, Error> {
        let lparen = self.advance()?;
        let expr = self.parse_or()?;
        let rparen = self.expect(TokenKind::RParen, ParseError::MissingRParen)?;
        Ok(Ast::Grouping(Box::new(expr), lparen.range.to(rparen.range)))
    }

    fn parse_list(&mut self) -> Result<Ast, Error> {
        let lbracket = self.advance()?;
        let mut items = vec![];

        if self.current.kind != TokenKind::RBracket {
            loop {
                items.push(self.parse_or()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        let rbracket = self.expect(TokenKind::RBracket, ParseError::MissingRBracket)?;
        Ok(Ast::List(items, lbracket.range.to(rbracket.range)))
    }

    fn parse_object(&mut self) -> Result<Ast, Error> {
        let lbrace = self.advance()?;
        let mut fields = vec![];

        if self.current.kind != TokenKind::RBrace {
            loop {
                let key = self.parse_or()?;
                self.expect(TokenKind::Colon, ParseError::ExpectedColon)?;
                let value = self.parse_or()?;
                fields.push(Field { key, value });
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        let rbrace = self.expect(TokenKind::RBrace, ParseError::MissingRBrace)?;
        Ok(Ast::ObjectLiteral(fields, lbrace.range.to(rbrace.range)))
    }

    fn parse_closure(&mut self) -> Result<Ast, Error> {
        let lbar = self.advance()?;
        let mut params = vec![];

        if self.current.kind != TokenKind::Bar {
            loop {
                params.push(self.parse_pattern()?);
                if self.current.kind == TokenKind::Comma {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::Bar, ParseError::MissingBar)?;
        let body = self.parse_or()?;
        let range = lbar.range.to(body.range());
        Ok(Ast::Closure { params, body: Box::new(body), range })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, Error> {
        match self.current.kind {
            TokenKind::Ident => {
                let tok = self.advance()?;
                let name = tok.as_text().expect("ident token carries text").to_string();
                Ok(Pattern::Ident(name, tok.range))
            },
            TokenKind::LBracket => {
                let lbracket = self.advance()?;
                let mut pats = vec![];

                if self.current.kind != TokenKind::RBracket {
                    loop {
                        pats.push(self.parse_pattern()?);
                        if self.current.kind == TokenKind::Comma {
                            self.advance()?;
                        } else {
                            break;
                        }
                    }
                }

                let rbracket = self.expect(TokenKind::RBracket, ParseError::MissingRBracket)?;
                Ok(Pattern::List(pats, lbracket.range.to(rbracket.range)))
            },
            _ => Err(self.error(ParseError::InvalidPattern)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Ast {
        parse(src).unwrap_or_else(|e| panic!("parse error on {src:?}: {e}"))
    }

    #[test]
    fn parses_number_literal() {
        assert!( matches!(parse_ok("42"), Ast::Primary(_)) );
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let ast = parse_ok("10 + 10 * 2");
        match ast {
            Ast::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!( matches!(*rhs, Ast::Binary { op: BinaryOp::Mul, .. }) );
            },
            _ => panic!("expected Add at top level"),
        }
    }

    #[test]
    fn parses_leading_dot_access() {
        let ast = parse_ok(".foo");
        match ast {
            Ast::Access { inner, .. } => assert!( inner.is_none() ),
            _ => panic!("expected Access"),
        }
    }

    #[test]
    fn parses_chained_access() {
        let ast = parse_ok(".foo.bar");
        match ast {
            Ast::Access { inner: Some(inner), .. } => {
                assert!( matches!(*inner, Ast::Access { inner: None, .. }) );
            },
            _ => panic!("expected chained Access"),
        }
    }

    #[test]
    fn parses_index_access() {
        let ast = parse_ok("[10, [290, [465]]][1].1");
        assert!( matches!(ast, Ast::Access { .. }) );
    }

    #[test]
    fn parses_function_call_with_closure() {
        let ast = parse_ok(".foo.map(|x| x*2).collect");
        match ast {
            Ast::FunctionCall { name, callee, .. } => {
                assert_eq!( name, "collect" );
                assert!( callee.is_some() );
            },
            _ => panic!("expected FunctionCall"),
        }
    }

    #[test]
    fn parses_object_literal_duplicate_keys() {
        let ast = parse_ok(r#"{"foo": .a, "foo": .b}"#);
        match ast {
            Ast::ObjectLiteral(fields, _) => assert_eq!( fields.len(), 2 ),
            _ => panic!("expected ObjectLiteral"),
        }
    }

    #[test]
    fn parses_closure_destructuring_pattern() {
        let ast = parse_ok("|[a, b]| a + b");
        match ast {
            Ast::Closure { params, .. } => {
                assert_eq!( params.len(), 1 );
                assert!( matches!(&params[0], Pattern::List(inner, _) if inner.len() == 2) );
            },
            _ => panic!("expected Closure"),
        }
    }

    #[test]
    fn unexpected_trailing_token_is_error() {
        assert!( parse("1 2").is_err() );
    }

    #[test]
    fn unclosed_paren_is_error() {
        assert!( parse("(1 + 2").is_err() );
    }

    #[test]
    fn unary_neg_and_not() {
        let ast = parse_ok("-1");
        assert!( matches!(ast, Ast::Unary { op: UnaryOp::Neg, .. }) );

        let ast = parse_ok("!true");
        assert!( matches!(ast, Ast::Unary { op: UnaryOp::Not, .. }) );
    }
}
