// Copyright 2026 The Clupy Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The self-describing wire codec (spec §6): a single MessagePack
//! (`rmp-serde`) encoding shared by every endpoint, and the [`Value`] enum
//! user functions take and return in place of arbitrary Python objects.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A data-model value capable of round-tripping through the wire codec:
/// integers, strings, lists, mappings and nested records (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// An ordered name→value mapping, used both for record-like values and
    /// for `packed_arguments` (spec §3).
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// `packed_arguments`: the wire shape of an `InvocationRequest`'s arguments
/// (spec §3) — an ordered name→value mapping built from the callee's
/// declared parameter names and the caller's positional arguments.
pub type PackedArguments = Vec<(String, Value)>;

/// Packs positional arguments into the name-keyed wire shape using a
/// function's declared parameter names, in order (spec §4.3, §9 — this
/// replaces the original's runtime `inspect.getargspec` introspection with
/// a statically supplied parameter list).
pub fn pack_arguments(param_names: &[&str], args: Vec<Value>) -> Result<PackedArguments> {
    if args.len() != param_names.len() {
        return Err(Error::Protocol(format!(
            "expected {} arguments, got {}",
            param_names.len(),
            args.len()
        )));
    }
    Ok(param_names
        .iter()
        .map(|name| name.to_string())
        .zip(args)
        .collect())
}

/// Encodes any serializable value with the canonical wire codec.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(Error::from)
}

/// Decodes a value previously produced by [`encode`].
pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrips_through_codec() {
        let value = Value::Map(vec![
            ("num".to_string(), Value::Int(10001)),
            (
                "tags".to_string(),
                Value::List(vec![Value::Str("a".into()), Value::Str("b".into())]),
            ),
            ("missing".to_string(), Value::Null),
        ]);
        let bytes = encode(&value).unwrap();
        let decoded: Value = decode(&bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn pack_arguments_zips_names_with_positional_values() {
        let packed = pack_arguments(&["num"], vec![Value::Int(10001)]).unwrap();
        assert_eq!(packed, vec![("num".to_string(), Value::Int(10001))]);
    }

    #[test]
    fn pack_arguments_rejects_arity_mismatch() {
        let err = pack_arguments(&["a", "b"], vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
