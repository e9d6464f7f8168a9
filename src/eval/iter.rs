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

//! The lazy iterator framework: a single trait, `JsonIter`, pulled one
//! value at a time, plus the adapters that back every iterator-returning
//! built-in. Each adapter owns its upstream.

use crate::eval::error::EvalResult;
use crate::json::Value;

/// Yields JSON values one at a time; `Ok(None)` signals exhaustion.
///
/// The lifetime `'e` ties a trait object to the borrow of the
/// [`Evaluator`](crate::eval::Evaluator) that may be needed to invoke a
/// captured closure.
pub trait JsonIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>>;
}

/// Iterates the elements of an owned list.
pub struct ListIter {
    inner: std::vec::IntoIter<Value>,
}

impl ListIter {
    pub fn new(values: Vec<Value>) -> Self {
        Self { inner: values.into_iter() }
    }
}

impl<'e> JsonIter<'e> for ListIter {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        Ok(self.inner.next())
    }
}

/// Iterates the keys of an owned object, each as a [`Value::String`].
pub struct KeysIter {
    inner: std::vec::IntoIter<(String, Value)>,
}

impl KeysIter {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { inner: fields.into_iter() }
    }
}

impl<'e> JsonIter<'e> for KeysIter {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        Ok(self.inner.next().map(|(k, _)| Value::String(k)))
    }
}

/// Iterates the values of an owned object.
pub struct ValuesIter {
    inner: std::vec::IntoIter<(String, Value)>,
}

impl ValuesIter {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { inner: fields.into_iter() }
    }
}

impl<'e> JsonIter<'e> for ValuesIter {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        Ok(self.inner.next().map(|(_, v)| v))
    }
}

/// Iterates the entries of an owned object, each as a two-element
/// `[key, value]` list.
pub struct EntriesIter {
    inner: std::vec::IntoIter<(String, Value)>,
}

impl EntriesIter {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { inner: fields.into_iter() }
    }
}

impl<'e> JsonIter<'e> for EntriesIter {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        Ok(self.inner.next().map(|(k, v)| Value::List(vec![Value::String(k), v])))
    }
}

/// `map(f)` — applies a closure to each upstream value.
pub struct MapIter<'e> {
    upstream: Box<dyn JsonIter<'e> + 'e>,
    apply: Box<dyn FnMut(Value) -> EvalResult<Value> + 'e>,
}

impl<'e> MapIter<'e> {
    pub fn new(
        upstream: Box<dyn JsonIter<'e> + 'e>,
        apply: Box<dyn FnMut(Value) -> EvalResult<Value> + 'e>,
    ) -> Self {
        Self { upstream, apply }
    }
}

impl<'e> JsonIter<'e> for MapIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        match self.upstream.next()? {
            None => Ok(None),
            Some(v) => Ok(Some((self.apply)(v)?)),
        }
    }
}

/// `filter(p)` — pulls from upstream until `p` accepts a value.
pub struct FilterIter<'e> {
    upstream: Box<dyn JsonIter<'e> + 'e>,
    predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
}

impl<'e> FilterIter<'e> {
    pub fn new(
        upstream: Box<dyn JsonIter<'e> + 'e>,
        predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
    ) -> Self {
        Self { upstream, predicate }
    }
}

impl<'e> JsonIter<'e> for FilterIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        loop {
            match self.upstream.next()? {
                None => return Ok(None),
                Some(v) => {
                    if (self.predicate)(&v)? {
                        return Ok(Some(v));
                    }
                },
            }
        }
    }
}

/// `enumerate` — yields `[value, index]` pairs.
pub struct EnumerateIter<'e> {
    upstream: Box<dyn JsonIter<'e> + 'e>,
    index: usize,
}

impl<'e> EnumerateIter<'e> {
    pub fn new(upstream: Box<dyn JsonIter<'e> + 'e>) -> Self {
        Self { upstream, index: 0 }
    }
}

impl<'e> JsonIter<'e> for EnumerateIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        match self.upstream.next()? {
            None => Ok(None),
            Some(v) => {
                let i = self.index;
                self.index += 1;
                Ok(Some(Value::List(vec![v, Value::Number(i as f64)])))
            },
        }
    }
}

/// `zip(other)` — yields `[a, b]` pairs; exhausted when either side is.
pub struct ZipIter<'e> {
    a: Box<dyn JsonIter<'e> + 'e>,
    b: Box<dyn JsonIter<'e> + 'e>,
}

impl<'e> ZipIter<'e> {
    pub fn new(a: Box<dyn JsonIter<'e> + 'e>, b: Box<dyn JsonIter<'e> + 'e>) -> Self {
        Self { a, b }
    }
}

impl<'e> JsonIter<'e> for ZipIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        match (self.a.next()?, self.b.next()?) {
            (Some(a), Some(b)) => Ok(Some(Value::List(vec![a, b]))),
            _ => Ok(None),
        }
    }
}

/// `take_while(p)` — passes values through until `p` is first false,
/// then is exhausted.
pub struct TakeWhileIter<'e> {
    upstream: Box<dyn JsonIter<'e> + 'e>,
    predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
    done: bool,
}

impl<'e> TakeWhileIter<'e> {
    pub fn new(
        upstream: Box<dyn JsonIter<'e> + 'e>,
        predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
    ) -> Self {
        Self { upstream, predicate, done: false }
    }
}

impl<'e> JsonIter<'e> for TakeWhileIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        if self.done {
            return Ok(None);
        }
        match self.upstream.next()? {
            None => { self.done = true; Ok(None) },
            Some(v) => {
                if (self.predicate)(&v)? {
                    Ok(Some(v))
                } else {
                    self.done = true;
                    Ok(None)
                }
            },
        }
    }
}

/// `skip_while(p)` — discards values while `p` holds, then passes the
/// triggering value and everything after it through unchanged.
pub struct SkipWhileIter<'e> {
    upstream: Box<dyn JsonIter<'e> + 'e>,
    predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
    skipping: bool,
}

impl<'e> SkipWhileIter<'e> {
    pub fn new(
        upstream: Box<dyn JsonIter<'e> + 'e>,
        predicate: Box<dyn FnMut(&Value) -> EvalResult<bool> + 'e>,
    ) -> Self {
        Self { upstream, predicate, skipping: true }
    }
}

impl<'e> JsonIter<'e> for SkipWhileIter<'e> {
    fn next(&mut self) -> EvalResult<Option<Value>> {
        loop {
            match self.upstream.next()? {
                None => return Ok(None),
                Some(v) => {
                    if self.skipping && (self.predicate)(&v)? {
                        continue;
                    }
                    self.skipping = false;
                    return Ok(Some(v));
                },
            }
        }
    }
}

/// Drains an iterator into a freshly allocated list.
pub fn collect<'e>(mut iter: Box<dyn JsonIter<'e> + 'e>) -> EvalResult<Vec<Value>> {
    let mut out = vec![];
    while let Some(v) = iter.next()? {
        out.push(v);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_iter_yields_in_order() {
        let mut it = ListIter::new(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!( JsonIter::next(&mut it).unwrap(), Some(Value::Number(1.0)) );
        assert_eq!( JsonIter::next(&mut it).unwrap(), Some(Value::Number(2.0)) );
        assert_eq!( JsonIter::next(&mut it).unwrap(), None );
    }

    #[test]
    fn enumerate_yields_value_index_pairs() {
        let inner = Box::new(ListIter::new(vec![Value::String("a".into()), Value::String("b".into())]));
        let mut it = EnumerateIter::new(inner);
        assert_eq!(
            JsonIter::next(&mut it).unwrap(),
            Some(Value::List(vec![Value::String("a".into()), Value::Number(0.0)])),
        );
        assert_eq!(
            JsonIter::next(&mut it).unwrap(),
            Some(Value::List(vec![Value::String("b".into()), Value::Number(1.0)])),
        );
    }

    #[test]
    fn zip_stops_at_shorter_side() {
        let a = Box::new(ListIter::new(vec![Value::Number(1.0), Value::Number(2.0)]));
        let b = Box::new(ListIter::new(vec![Value::Number(10.0)]));
        let mut it = ZipIter::new(a, b);
        assert!( JsonIter::next(&mut it).unwrap().is_some() );
        assert_eq!( JsonIter::next(&mut it).unwrap(), None );
    }

    #[test]
    fn skip_while_then_passes_rest_through() {
        let inner = Box::new(ListIter::new(vec![
            Value::Number(1.0), Value::Number(2.0), Value::Number(-1.0), Value::Number(3.0),
        ]));
        let mut it = SkipWhileIter::new(inner, Box::new(|v: &Value| {
            Ok(matches!(v, Value::Number(n) if *n > 0.0))
        }));
        let collected = collect(Box::new(it)).unwrap_or_else(|_| unreachable!());
        assert_eq!( collected, vec![Value::Number(-1.0), Value::Number(3.0)] );
        it = SkipWhileIter::new(
            Box::new(ListIter::new(vec![])),
            Box::new(|_: &Value| Ok(true)),
        );
        assert_eq!( JsonIter::next(&mut it).unwrap(), None );
    }

    #[test]
    fn collect_drains_all_values() {
        let it = Box::new(ListIter::new(vec![Value::Bool(true), Value::Bool(false)]));
        let values = collect(it).unwrap();
        assert_eq!( values, vec![Value::Bool(true), Value::Bool(false)] );
    }
}
