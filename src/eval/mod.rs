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

//! The evaluator: walks the query AST against an input JSON value,
//! owns the lexical variable stack, and threads ranged errors out of
//! deep recursion via `Result`.

pub mod builtins;
pub mod error;
pub mod iter;

use std::cell::RefCell;

use crate::json::{object_insert, Value};
use crate::lang::ast::{Ast, BinaryOp, Field, Pattern, UnaryOp};
use crate::util::Range;
use crate::util::with::With;

use self::error::{EvalError, EvalResult};
use self::iter::{EntriesIter, JsonIter, ListIter};

/// The result of evaluating one AST node: either a materialized JSON
/// value, or a lazy iterator still borrowing the evaluator that can
/// produce its closure's body.
pub enum EvalData<'e> {
    Json(Value),
    Iter(Box<dyn JsonIter<'e> + 'e>),
}

impl<'e> EvalData<'e> {
    fn into_json(self) -> EvalResult<Value> {
        match self {
            EvalData::Json(v) => Ok(v),
            EvalData::Iter(it) => Ok(Value::List(iter::collect(it)?)),
        }
    }
}

/// Evaluates a query AST against a fixed input JSON value.
pub struct Evaluator {
    input: Value,
    vars: RefCell<Vec<(String, Value)>>,
}

impl Evaluator {
    pub fn new(input: Value) -> Self {
        Self { input, vars: RefCell::new(Vec::new()) }
    }

    /// Evaluates `ast` and coerces the result to a JSON value, draining
    /// any outstanding iterator via `collect`.
    pub fn eval_to_json<'e>(&'e self, ast: &'e Ast) -> EvalResult<Value> {
        self.eval(ast)?.into_json()
    }

    /// Evaluates `ast` to the internal sum of "json value" or
    /// "iterator", without forcing materialization.
    ///
    /// `ast` is tied to the same lifetime as `self`: a lazy iterator
    /// returned here (e.g. from `map`) may capture references into
    /// `ast`'s closure bodies, so it must live at least as long as any
    /// `EvalData` produced from it.
    pub fn eval<'e>(&'e self, ast: &'e Ast) -> EvalResult<EvalData<'e>> {
        match ast {
            Ast::Primary(tok) => self.eval_primary(tok),
            Ast::True(_) => Ok(EvalData::Json(Value::Bool(true))),
            Ast::False(_) => Ok(EvalData::Json(Value::Bool(false))),
            Ast::NullLit(_) => Ok(EvalData::Json(Value::Null)),
            Ast::Grouping(inner, _) => self.eval(inner),
            Ast::Unary { op, rhs, range } => self.eval_unary(*op, rhs, *range),
            Ast::Binary { op, lhs, rhs, range } => self.eval_binary(*op, lhs, rhs, *range),
            Ast::List(items, _) => self.eval_list(items),
            Ast::ObjectLiteral(fields, _) => self.eval_object(fields),
            Ast::Access { inner, accessor, range } => {
                self.eval_access(inner.as_deref(), accessor, *range)
            },
            Ast::FunctionCall { callee, name, args, range } => {
                builtins::dispatch(self, callee.as_deref(), name, args, *range)
            },
            Ast::Closure { .. } => {
                unreachable!("closures are only ever evaluated as a call argument")
            },
        }
    }

    fn eval_primary<'e>(&'e self, tok: &'e crate::lang::token::Token) -> EvalResult<EvalData<'e>> {
        use crate::lang::token::TokenKind;
        match tok.kind {
            TokenKind::Ident => {
                let name = tok.as_text().expect("ident token carries text");
                self.lookup(name)
                    .map(EvalData::Json)
                    .ok_or_else(|| EvalError::VarNotFound(name.to_string()).with(tok.range))
            },
            TokenKind::Str => {
                Ok(EvalData::Json(Value::String(tok.as_text().unwrap().to_string())))
            },
            TokenKind::Num => {
                Ok(EvalData::Json(Value::Number(tok.as_number().unwrap())))
            },
            _ => unreachable!("parser never produces a Primary with any other token kind"),
        }
    }

    fn eval_unary<'e>(&'e self, op: UnaryOp, rhs: &'e Ast, range: Range) -> EvalResult<EvalData<'e>> {
        let v = self.eval_to_json(rhs)?;
        match op {
            UnaryOp::Neg => match v {
                Value::Number(n) => Ok(EvalData::Json(Value::Number(-n))),
                other => Err(EvalError::ExpectedNumber(other.type_name()).with(range)),
            },
            UnaryOp::Not => match v {
                Value::Bool(b) => Ok(EvalData::Json(Value::Bool(!b))),
                other => Err(EvalError::ExpectedBool(other.type_name()).with(range)),
            },
        }
    }

    fn eval_binary<'e>(
        &'e self,
        op: BinaryOp,
        lhs: &'e Ast,
        rhs: &'e Ast,
        range: Range,
    ) -> EvalResult<EvalData<'e>> {
        use BinaryOp::*;

        let result = match op {
            Or | And => {
                let l = self.require_bool(lhs, range)?;
                if op == Or && l {
                    return Ok(EvalData::Json(Value::Bool(true)));
                }
                if op == And && !l {
                    return Ok(EvalData::Json(Value::Bool(false)));
                }
                Value::Bool(self.require_bool(rhs, range)?)
            },
            Eq | NotEq => {
                let l = self.eval_to_json(lhs)?;
                let r = self.eval_to_json(rhs)?;
                let eq = l == r;
                Value::Bool(if op == Eq { eq } else { !eq })
            },
            Lt | LtEq | Gt | GtEq | Add | Sub | Mul | Div | Mod => {
                let l = self.eval_to_json(lhs)?;
                let r = self.eval_to_json(rhs)?;
                let (a, b) = match (l.as_number(), r.as_number()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => {
                        return Err(EvalError::BadOperandTypes {
                            op: op_symbol(op),
                            lhs: l.type_name(),
                            rhs: r.type_name(),
                        }
                        .with(range))
                    },
                };
                match op {
                    Lt => Value::Bool(a < b),
                    LtEq => Value::Bool(a <= b),
                    Gt => Value::Bool(a > b),
                    GtEq => Value::Bool(a >= b),
                    Add => Value::Number(a + b),
                    Sub => Value::Number(a - b),
                    Mul => Value::Number(a * b),
                    Div => Value::Number(a / b),
                    Mod => Value::Number(a % b),
                    _ => unreachable!(),
                }
            },
        };

        Ok(EvalData::Json(result))
    }

    fn require_bool<'e>(&'e self, ast: &'e Ast, range: Range) -> EvalResult<bool> {
        match self.eval_to_json(ast)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::ExpectedBool(other.type_name()).with(range)),
        }
    }

    fn eval_list<'e>(&'e self, items: &'e [Ast]) -> EvalResult<EvalData<'e>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.eval_to_json(item)?);
        }
        Ok(EvalData::Json(Value::List(out)))
    }

    fn eval_object<'e>(&'e self, fields: &'e [Field]) -> EvalResult<EvalData<'e>> {
        let mut out: Vec<(String, Value)> = vec![];
        for field in fields {
            let key = match self.eval_to_json(&field.key)? {
                Value::String(s) => s,
                _ => return Err(EvalError::KeyMustBeString.with(field.key.range())),
            };
            let value = self.eval_to_json(&field.value)?;
            object_insert(&mut out, key, value);
        }
        Ok(EvalData::Json(Value::Object(out)))
    }

    fn eval_access<'e>(
        &'e self,
        inner: Option<&'e Ast>,
        accessor: &'e Ast,
        range: Range,
    ) -> EvalResult<EvalData<'e>> {
        let base = match inner {
            Some(ast) => self.eval_to_json(ast)?,
            None => self.input.clone(),
        };
        let acc = self.eval_to_json(accessor)?;

        match (&base, &acc) {
            (Value::List(items), Value::Number(n)) => {
                let idx = n.floor();
                let value = if idx < 0.0 {
                    Value::Null
                } else {
                    items.get(idx as usize).cloned().unwrap_or(Value::Null)
                };
                Ok(EvalData::Json(value))
            },
            (Value::Object(fields), Value::String(key)) => {
                let value = fields
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null);
                Ok(EvalData::Json(value))
            },
            _ => Err(EvalError::IndexTypeError {
                base: base.type_name(),
                accessor: acc.type_name(),
            }
            .with(range)),
        }
    }

    /// Coerces `data` to an iterator: a no-op if already one, else
    /// wraps a list or object. Any other JSON type is a caller-type
    /// error against `function`.
    pub(crate) fn coerce_iter<'e>(
        &'e self,
        data: EvalData<'e>,
        function: &'static str,
        range: Range,
    ) -> EvalResult<Box<dyn JsonIter<'e> + 'e>> {
        match data {
            EvalData::Iter(it) => Ok(it),
            EvalData::Json(Value::List(items)) => Ok(Box::new(ListIter::new(items))),
            EvalData::Json(Value::Object(fields)) => Ok(Box::new(EntriesIter::new(fields))),
            EvalData::Json(other) => Err(EvalError::WrongCallerType {
                function,
                expected: "iterator",
                got: other.type_name(),
            }
            .with(range)),
        }
    }

    /// Evaluates a call's callee, defaulting to the input value when
    /// absent (a leading dot).
    pub(crate) fn eval_callee_json<'e>(&'e self, callee: Option<&'e Ast>) -> EvalResult<Value> {
        match callee {
            Some(ast) => self.eval_to_json(ast),
            None => Ok(self.input.clone()),
        }
    }

    pub(crate) fn eval_callee_data<'e>(&'e self, callee: Option<&'e Ast>) -> EvalResult<EvalData<'e>> {
        match callee {
            Some(ast) => self.eval(ast),
            None => Ok(EvalData::Json(self.input.clone())),
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.vars.borrow().iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    /// Invokes a closure: binds `arg` against `params[0]`, evaluates
    /// `body`, then pops exactly the bindings it pushed — even on
    /// error, so variable-stack depth is always restored.
    pub(crate) fn call_closure(&self, params: &[Pattern], body: &Ast, arg: Value) -> EvalResult<Value> {
        debug_assert_eq!(params.len(), 1, "builtins only ever call closures of arity 1");
        let pushed = self.bind_pattern(&params[0], arg)?;
        let result = self.eval_to_json(body);
        self.pop_n(pushed);
        result
    }

    fn bind_pattern(&self, pattern: &Pattern, value: Value) -> EvalResult<usize> {
        match pattern {
            Pattern::Ident(name, _) => {
                self.vars.borrow_mut().push((name.clone(), value));
                Ok(1)
            },
            Pattern::List(patterns, range) => {
                let items = match value {
                    Value::List(items) if items.len() == patterns.len() => items,
                    _ => return Err(EvalError::DestructureFailed.with(*range)),
                };

                let mut pushed = 0;
                for (pat, val) in patterns.iter().zip(items) {
                    match self.bind_pattern(pat, val) {
                        Ok(n) => pushed += n,
                        Err(e) => {
                            self.pop_n(pushed);
                            return Err(e);
                        },
                    }
                }
                Ok(pushed)
            },
        }
    }

    fn pop_n(&self, n: usize) {
        let mut vars = self.vars.borrow_mut();
        for _ in 0..n {
            vars.pop();
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Or => "||", And => "&&",
        Eq => "==", NotEq => "!=",
        Lt => "<", LtEq => "<=", Gt => ">", GtEq => ">=",
        Add => "+", Sub => "-", Mul => "*", Div => "/", Mod => "%",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parser::parse;

    fn eval_str(query: &str, input: Value) -> EvalResult<Value> {
        let ast = parse(query).unwrap_or_else(|e| panic!("parse error: {e}"));
        Evaluator::new(input).eval_to_json(&ast)
    }

    #[test]
    fn empty_access_returns_input() {
        let input = Value::Object(vec![("a".to_string(), Value::Number(1.0))]);
        assert_eq!( eval_str(".a", input).unwrap(), Value::Number(1.0) );
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!( eval_str("10 + 10 * 2", Value::Null).unwrap(), Value::Number(30.0) );
    }

    #[test]
    fn nested_index_access() {
        let v = eval_str("[10, [290, [465]]][1].1", Value::Null).unwrap();
        assert_eq!( v, Value::List(vec![Value::Number(465.0)]) );
    }

    #[test]
    fn map_then_collect() {
        let input = Value::Object(vec![("foo".to_string(), Value::List(vec![
            Value::Number(1.0), Value::Number(2.0), Value::Number(3.0),
        ]))]);
        let v = eval_str(".foo.map(|x| x*2).collect", input).unwrap();
        assert_eq!( v, Value::List(vec![Value::Number(2.0), Value::Number(4.0), Value::Number(6.0)]) );
    }

    #[test]
    fn filter_then_sum() {
        let input = Value::Object(vec![("xs".to_string(), Value::List(vec![
            Value::Number(-1.0), Value::Number(2.0), Value::Number(-3.0), Value::Number(4.0),
        ]))]);
        let v = eval_str(".xs.filter(|x| x > 0).sum", input).unwrap();
        assert_eq!( v, Value::Number(6.0) );
    }

    #[test]
    fn duplicate_object_keys_last_wins_first_position() {
        let input = Value::Object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::Number(2.0)),
        ]);
        let v = eval_str(r#"{"foo": .a, "foo": .b}"#, input).unwrap();
        assert_eq!( v, Value::Object(vec![("foo".to_string(), Value::Number(2.0))]) );
    }

    #[test]
    fn unary_neg_on_bool_is_ranged_type_error() {
        let err = eval_str("-true", Value::Null).unwrap_err();
        assert!( err.value.to_string().contains("expected number, got bool") );
    }

    #[test]
    fn out_of_range_index_is_null_not_error() {
        let v = eval_str("[1,2,3][10]", Value::Null).unwrap();
        assert_eq!( v, Value::Null );
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        let v = eval_str("1 / 0", Value::Null).unwrap();
        assert_eq!( v, Value::Number(f64::INFINITY) );
    }

    #[test]
    fn variable_stack_restored_after_closure() {
        let input = Value::List(vec![Value::Number(1.0)]);
        let _ = eval_str(".map(|x| x).collect", input);
        // If push/pop weren't symmetric, a second independent evaluation
        // reusing the name `x` would see a stale binding rather than an
        // unbound-variable error.
        let err = eval_str("x", Value::Null).unwrap_err();
        assert!( err.value.to_string().contains("Variable not in scope") );
    }

    #[test]
    fn closure_destructuring_pattern() {
        let input = Value::List(vec![
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::List(vec![Value::Number(3.0), Value::Number(4.0)]),
        ]);
        let v = eval_str(".map(|[a, b]| a + b).collect", input).unwrap();
        assert_eq!( v, Value::List(vec![Value::Number(3.0), Value::Number(7.0)]) );
    }
}
