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

//! The query abstract syntax tree. Every node carries its source
//! [`Range`] so the evaluator can raise ranged diagnostics.

use crate::lang::token::Token;
use crate::util::Range;

/// A unary operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A binary operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Or, And,
    Eq, NotEq, Lt, LtEq, Gt, GtEq,
    Add, Sub, Mul, Div, Mod,
}

/// A query expression node.
#[derive(Clone, PartialEq, Debug)]
pub enum Ast {
    /// An identifier, string literal, or number literal.
    Primary(Token),

    Unary { op: UnaryOp, rhs: Box<Ast>, range: Range },

    Binary { op: BinaryOp, lhs: Box<Ast>, rhs: Box<Ast>, range: Range },

    Grouping(Box<Ast>, Range),

    List(Vec<Ast>, Range),

    ObjectLiteral(Vec<Field>, Range),

    /// `inner.accessor` / `inner[accessor]`. `inner` absent means "the
    /// input" — the head of an access chain.
    Access { inner: Option<Box<Ast>>, accessor: Box<Ast>, range: Range },

    /// `callee.name(args…)`. `callee` absent means the call applies to
    /// the input.
    FunctionCall { callee: Option<Box<Ast>>, name: String, args: Vec<Ast>, range: Range },

    /// `|params| body`. Only ever appears as a [`FunctionCall`] argument.
    Closure { params: Vec<Pattern>, body: Box<Ast>, range: Range },

    True(Range),
    False(Range),
    NullLit(Range),
}

impl Ast {
    /// The source range this node covers.
    pub fn range(&self) -> Range {
        match self {
            Ast::Primary(t) => t.range,
            Ast::Unary { range, .. }
            | Ast::Binary { range, .. }
            | Ast::Grouping(_, range)
            | Ast::List(_, range)
            | Ast::ObjectLiteral(_, range)
            | Ast::Access { range, .. }
            | Ast::FunctionCall { range, .. }
            | Ast::Closure { range, .. }
            | Ast::True(range)
            | Ast::False(range)
            | Ast::NullLit(range) => *range,
        }
    }
}

/// A `key: value` entry in an object literal. The key is itself an
/// expression; it must reduce to a string at evaluation time.
#[derive(Clone, PartialEq, Debug)]
pub struct Field {
    pub key: Ast,
    pub value: Ast,
}

/// A closure parameter pattern: a bare identifier, or a bracketed list
/// of patterns for destructuring.
#[derive(Clone, PartialEq, Debug)]
pub enum Pattern {
    Ident(String, Range),
    List(Vec<Pattern>, Range),
}

impl Pattern {
    pub fn range(&self) -> Range {
        match self {
            Pattern::Ident(_, range) | Pattern::List(_, range) => *range,
        }
    }
}
