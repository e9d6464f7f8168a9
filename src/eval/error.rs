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

//! Diagnostics for the three failing stages: lexing, parsing, and
//! evaluation. Every error is paired with a source [`Range`] via
//! [`Contexted`] at the point it is raised.

use thiserror::Error;

use crate::util::Range;
use crate::util::with::Contexted;

/// A lexical error.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum LexError {
    #[error("Illegal character '{0}'")]
    IllegalChar(char),

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Invalid suffix on decimal")]
    InvalidDecimalSuffix,
}

/// A syntax error, raised by the query parser or the JSON deserializer.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum ParseError {
    #[error("Expected identifier")]
    ExpectedIdent,

    #[error("Expected string")]
    ExpectedString,

    #[error("Expected colon ':'")]
    ExpectedColon,

    #[error("Missing closing parenthesis ')'")]
    MissingRParen,

    #[error("Missing closing bracket ']'")]
    MissingRBracket,

    #[error("Missing closing brace '}}'")]
    MissingRBrace,

    #[error("Missing closing bar '|'")]
    MissingBar,

    #[error("Expected eof")]
    ExpectedEof,

    #[error("Unexpected token")]
    UnexpectedToken,

    #[error("Invalid closure pattern")]
    InvalidPattern,
}

/// A runtime evaluation error.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum EvalError {
    #[error("wrong type for caller of {function}: expected {expected}, got {got}")]
    WrongCallerType { function: &'static str, expected: &'static str, got: &'static str },

    #[error("wrong type for argument {index} of {function}: expected {expected}, got {got}")]
    WrongArgType { function: &'static str, index: usize, expected: &'static str, got: &'static str },

    #[error("wrong number of arguments: expected {expected} got {got}")]
    WrongArgCount { expected: usize, got: usize },

    #[error("expected closure with {0} args")]
    WrongClosureArity(usize),

    #[error("expected number, got {0}")]
    ExpectedNumber(&'static str),

    #[error("expected bool, got {0}")]
    ExpectedBool(&'static str),

    #[error("unsupported operand types for {op}: {lhs} and {rhs}")]
    BadOperandTypes { op: &'static str, lhs: &'static str, rhs: &'static str },

    #[error("cannot access {base} with a {accessor} accessor")]
    IndexTypeError { base: &'static str, accessor: &'static str },

    #[error("Variable not in scope: {0}")]
    VarNotFound(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Expected string key in json literal")]
    KeyMustBeString,

    #[error("closure argument destructuring failed")]
    DestructureFailed,

    #[error("{0}")]
    Custom(String),
}

pub type LexResult<T>   = Result<T, Contexted<LexError, Range>>;
pub type ParseResult<T> = Result<T, Contexted<ParseError, Range>>;
pub type EvalResult<T>  = Result<T, Contexted<EvalError, Range>>;

/// The union of all three failing stages, used by the CLI driver to
/// render a single diagnostic regardless of which stage produced it.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] Contexted<LexError, Range>),

    #[error(transparent)]
    Parse(#[from] Contexted<ParseError, Range>),

    #[error(transparent)]
    Eval(#[from] Contexted<EvalError, Range>),
}

impl Error {
    /// The source range this error should be reported against.
    pub fn range(&self) -> Range {
        match self {
            Error::Lex(e) => e.context,
            Error::Parse(e) => e.context,
            Error::Eval(e) => e.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_message_formats_args() {
        let e = EvalError::WrongArgCount { expected: 1, got: 2 };
        assert_eq!( e.to_string(), "wrong number of arguments: expected 1 got 2" );
    }

    #[test]
    fn var_not_found_includes_name() {
        let e = EvalError::VarNotFound("foo".to_string());
        assert_eq!( e.to_string(), "Variable not in scope: foo" );
    }
}
