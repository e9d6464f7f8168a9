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

//! The fixed vocabulary of built-in functions. Each is dispatched by
//! name against a callee (the receiver before the dot) and a list of
//! unevaluated argument expressions, so that closure arguments are
//! only ever forced one element at a time by the iterator they drive.

use crate::json::Value;
use crate::lang::ast::{Ast, Pattern};
use crate::util::Range;
use crate::util::with::With;

use super::error::{EvalError, EvalResult};
use super::iter::{
    self, EnumerateIter, FilterIter, JsonIter, KeysIter, MapIter, SkipWhileIter,
    TakeWhileIter, ValuesIter, ZipIter,
};
use super::{EvalData, Evaluator};

/// Every recognized built-in name. Consulted by the parser so that a
/// trailing `.name` with no parentheses is still read as a call (e.g.
/// `.collect`) rather than an object-key access.
pub const BUILTIN_NAMES: &[&str] = &[
    "map", "filter", "iter", "collect", "enumerate", "zip",
    "skip_while", "take_while",
    "keys", "values", "sum", "product", "flatten", "join", "length",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Dispatches a function call to its implementation.
///
/// `callee` and `args` share the evaluator's own lifetime `'e`: the
/// lazy adapters built by `map`/`filter`/etc. capture closure bodies
/// borrowed from `args`, so those borrows must outlive the `EvalData`
/// returned here, exactly as the `Evaluator` itself must.
pub fn dispatch<'e>(
    eval: &'e Evaluator,
    callee: Option<&'e Ast>,
    name: &str,
    args: &'e [Ast],
    range: Range,
) -> EvalResult<EvalData<'e>> {
    match name {
        "map" => call_map(eval, callee, args, range),
        "filter" => call_filter(eval, callee, args, range),
        "iter" => call_iter(eval, callee, range),
        "collect" => call_collect(eval, callee, range),
        "enumerate" => call_enumerate(eval, callee, range),
        "zip" => call_zip(eval, callee, args, range),
        "skip_while" => call_skip_while(eval, callee, args, range),
        "take_while" => call_take_while(eval, callee, args, range),
        "keys" => call_keys(eval, callee, range),
        "values" => call_values(eval, callee, range),
        "sum" => call_sum(eval, callee, range),
        "product" => call_product(eval, callee, range),
        "flatten" => call_flatten(eval, callee, range),
        "join" => call_join(eval, callee, args, range),
        "length" => call_length(eval, callee, range),
        _ => Err(EvalError::UnknownFunction(name.to_string()).with(range)),
    }
}

fn expect_arity(function: &'static str, args: &[Ast], expected: usize, range: Range) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::WrongArgCount { expected, got: args.len() }.with(range))
    }
}

/// Extracts the single closure of arity 1 expected by `map`/`filter`/etc.
fn expect_closure<'e>(function: &'static str, arg: &'e Ast, index: usize) -> EvalResult<(&'e [Pattern], &'e Ast)> {
    match arg {
        Ast::Closure { params, body, .. } if params.len() == 1 => Ok((params, body)),
        Ast::Closure { range, .. } => Err(EvalError::WrongClosureArity(1).with(*range)),
        other => Err(EvalError::WrongArgType {
            function, index, expected: "closure", got: "expression",
        }
        .with(other.range())),
    }
}

fn make_predicate<'e>(
    eval: &'e Evaluator,
    params: &'e [Pattern],
    body: &'e Ast,
) -> impl FnMut(&Value) -> EvalResult<bool> + 'e {
    move |v: &Value| {
        let result = eval.call_closure(params, body, v.clone())?;
        match result {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::ExpectedBool(other.type_name()).with(body.range())),
        }
    }
}

fn call_map<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("map", args, 1, range)?;
    let (params, body) = expect_closure("map", &args[0], 0)?;
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "map", range)?;
    let apply = Box::new(move |v: Value| eval.call_closure(params, body, v));
    Ok(EvalData::Iter(Box::new(MapIter::new(upstream, apply))))
}

fn call_filter<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("filter", args, 1, range)?;
    let (params, body) = expect_closure("filter", &args[0], 0)?;
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "filter", range)?;
    let predicate = Box::new(make_predicate(eval, params, body));
    Ok(EvalData::Iter(Box::new(FilterIter::new(upstream, predicate))))
}

fn call_iter<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "iter", range)?;
    Ok(EvalData::Iter(upstream))
}

fn call_collect<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "collect", range)?;
    Ok(EvalData::Json(Value::List(iter::collect(upstream)?)))
}

fn call_enumerate<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "enumerate", range)?;
    Ok(EvalData::Iter(Box::new(EnumerateIter::new(upstream))))
}

fn call_zip<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("zip", args, 1, range)?;
    let a_data = eval.eval_callee_data(callee)?;
    let a = eval.coerce_iter(a_data, "zip", range)?;
    let b_list = match eval.eval_to_json(&args[0])? {
        Value::List(items) => items,
        other => return Err(EvalError::WrongArgType {
            function: "zip", index: 0, expected: "list", got: other.type_name(),
        }
        .with(args[0].range())),
    };
    let b: Box<dyn JsonIter<'e> + 'e> = Box::new(iter::ListIter::new(b_list));
    Ok(EvalData::Iter(Box::new(ZipIter::new(a, b))))
}

fn call_skip_while<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("skip_while", args, 1, range)?;
    let (params, body) = expect_closure("skip_while", &args[0], 0)?;
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "skip_while", range)?;
    let predicate = Box::new(make_predicate(eval, params, body));
    Ok(EvalData::Iter(Box::new(SkipWhileIter::new(upstream, predicate))))
}

fn call_take_while<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("take_while", args, 1, range)?;
    let (params, body) = expect_closure("take_while", &args[0], 0)?;
    let data = eval.eval_callee_data(callee)?;
    let upstream = eval.coerce_iter(data, "take_while", range)?;
    let predicate = Box::new(make_predicate(eval, params, body));
    Ok(EvalData::Iter(Box::new(TakeWhileIter::new(upstream, predicate))))
}

fn call_keys<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let value = eval.eval_callee_json(callee)?;
    match value {
        Value::Object(fields) => Ok(EvalData::Iter(Box::new(KeysIter::new(fields)))),
        other => Err(EvalError::WrongCallerType {
            function: "keys", expected: "object", got: other.type_name(),
        }
        .with(range)),
    }
}

fn call_values<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let value = eval.eval_callee_json(callee)?;
    match value {
        Value::Object(fields) => Ok(EvalData::Iter(Box::new(ValuesIter::new(fields)))),
        other => Err(EvalError::WrongCallerType {
            function: "values", expected: "object", got: other.type_name(),
        }
        .with(range)),
    }
}

fn eager_list<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, function: &'static str, range: Range) -> EvalResult<Vec<Value>> {
    let value = eval.eval_callee_json(callee)?;
    match value {
        Value::List(items) => Ok(items),
        other => Err(EvalError::WrongCallerType {
            function, expected: "list", got: other.type_name(),
        }
        .with(range)),
    }
}

fn require_list_of_number(function: &'static str, items: Vec<Value>, range: Range) -> EvalResult<Vec<f64>> {
    items.into_iter().map(|v| match v {
        Value::Number(n) => Ok(n),
        other => Err(EvalError::WrongCallerType {
            function, expected: "list of number", got: other.type_name(),
        }
        .with(range)),
    }).collect()
}

fn call_sum<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let items = eager_list(eval, callee, "sum", range)?;
    let nums = require_list_of_number("sum", items, range)?;
    Ok(EvalData::Json(Value::Number(nums.into_iter().sum())))
}

fn call_product<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let items = eager_list(eval, callee, "product", range)?;
    let nums = require_list_of_number("product", items, range)?;
    Ok(EvalData::Json(Value::Number(nums.into_iter().product())))
}

fn call_flatten<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let items = eager_list(eval, callee, "flatten", range)?;

    match items.first() {
        None => Ok(EvalData::Json(Value::List(vec![]))),
        Some(Value::Object(_)) => {
            let mut fields = vec![];
            for item in items {
                match item {
                    Value::Object(inner) => {
                        for (k, v) in inner {
                            crate::json::object_insert(&mut fields, k, v);
                        }
                    },
                    other => return Err(EvalError::WrongCallerType {
                        function: "flatten", expected: "list of object", got: other.type_name(),
                    }
                    .with(range)),
                }
            }
            Ok(EvalData::Json(Value::Object(fields)))
        },
        Some(_) => {
            let mut out = vec![];
            for item in items {
                match item {
                    Value::List(inner) => out.extend(inner),
                    other => return Err(EvalError::WrongCallerType {
                        function: "flatten", expected: "list of list", got: other.type_name(),
                    }
                    .with(range)),
                }
            }
            Ok(EvalData::Json(Value::List(out)))
        },
    }
}

fn call_join<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, args: &'e [Ast], range: Range) -> EvalResult<EvalData<'e>> {
    expect_arity("join", args, 1, range)?;
    let sep = match eval.eval_to_json(&args[0])? {
        Value::String(s) => s,
        other => return Err(EvalError::WrongArgType {
            function: "join", index: 0, expected: "string", got: other.type_name(),
        }
        .with(args[0].range())),
    };
    let items = eager_list(eval, callee, "join", range)?;
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s),
            other => return Err(EvalError::WrongCallerType {
                function: "join", expected: "list of string", got: other.type_name(),
            }
            .with(range)),
        }
    }
    Ok(EvalData::Json(Value::String(parts.join(&sep))))
}

fn call_length<'e>(eval: &'e Evaluator, callee: Option<&'e Ast>, range: Range) -> EvalResult<EvalData<'e>> {
    let value = eval.eval_callee_json(callee)?;
    let len = match &value {
        Value::List(items) => items.len(),
        Value::String(s) => s.len(),
        other => return Err(EvalError::WrongCallerType {
            function: "length", expected: "list or string", got: other.type_name(),
        }
        .with(range)),
    };
    Ok(EvalData::Json(Value::Number(len as f64)))
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
    fn is_builtin_recognizes_known_names() {
        assert!( is_builtin("map") );
        assert!( is_builtin("collect") );
        assert!( !is_builtin("frobnicate") );
    }

    #[test]
    fn keys_and_values() {
        let input = Value::Object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::Number(2.0)),
        ]);
        assert_eq!(
            eval_str(".keys", input.clone()).unwrap(),
            Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        assert_eq!(
            eval_str(".values", input).unwrap(),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)]),
        );
    }

    #[test]
    fn enumerate_zip_collect() {
        let input = Value::List(vec![Value::Number(10.0), Value::Number(20.0)]);
        let v = eval_str(".enumerate.collect", input).unwrap();
        assert_eq!( v, Value::List(vec![
            Value::List(vec![Value::Number(10.0), Value::Number(0.0)]),
            Value::List(vec![Value::Number(20.0), Value::Number(1.0)]),
        ]));
    }

    #[test]
    fn flatten_concatenates_sublists() {
        let input = Value::List(vec![
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::List(vec![Value::Number(3.0)]),
        ]);
        assert_eq!(
            eval_str(".flatten", input).unwrap(),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]),
        );
    }

    #[test]
    fn flatten_merges_objects_later_key_wins() {
        let input = Value::List(vec![
            Value::Object(vec![("a".to_string(), Value::Number(1.0))]),
            Value::Object(vec![("a".to_string(), Value::Number(2.0)), ("b".to_string(), Value::Number(3.0))]),
        ]);
        assert_eq!(
            eval_str(".flatten", input).unwrap(),
            Value::Object(vec![
                ("a".to_string(), Value::Number(2.0)),
                ("b".to_string(), Value::Number(3.0)),
            ]),
        );
    }

    #[test]
    fn join_requires_list_of_string() {
        let input = Value::List(vec![Value::String("a".into()), Value::String("b".into())]);
        assert_eq!( eval_str(r#".join(",")"#, input).unwrap(), Value::String("a,b".to_string()) );

        let bad = Value::List(vec![Value::Number(1.0)]);
        assert!( eval_str(r#".join(",")"#, bad).is_err() );
    }

    #[test]
    fn length_of_string_counts_chars() {
        assert_eq!( eval_str(".length", Value::String("hi".to_string())).unwrap(), Value::Number(2.0) );
    }

    #[test]
    fn skip_while_then_take_while() {
        let input = Value::List(vec![
            Value::Number(1.0), Value::Number(2.0), Value::Number(3.0),
            Value::Number(-1.0), Value::Number(4.0), Value::Number(5.0),
        ]);
        assert_eq!(
            eval_str(".skip_while(|x| x < 3).take_while(|x| x != 4).collect", input).unwrap(),
            Value::List(vec![Value::Number(3.0), Value::Number(-1.0)]),
        );
    }

    #[test]
    fn wrong_closure_arity_is_an_error() {
        let input = Value::List(vec![Value::Number(1.0)]);
        assert!( eval_str(".map(|a, b| a).collect", input).is_err() );
    }
}
