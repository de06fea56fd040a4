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

//! The worker's function table (spec §9, Design Notes — "Dynamic function
//! dispatch"). Arbitrary source-file shipping is out of scope for a
//! statically-typed port, so functions are registered ahead of time into a
//! name-keyed table instead of imported by basename at call time.

use clupy_common::value::{PackedArguments, Value};

/// Declared parameter names, in order, and the handler itself. The worker
/// unpacks `packed_arguments` positionally against `param_names` to
/// reconstruct the call the client made (spec §4.2's `execute` contract).
pub struct FunctionEntry {
    pub param_names: &'static [&'static str],
    pub handler: fn(&[Value]) -> Result<Value, String>,
}

/// Looks up a function by its `<source_file>:<function_name>` key (spec §3,
/// §9). Returns `None` for anything not in the fixed table.
pub fn lookup(function_key: &str) -> Option<FunctionEntry> {
    match function_key {
        "basic_test.py:primes" => Some(FunctionEntry {
            param_names: &["num"],
            handler: primes,
        }),
        _ => None,
    }
}

/// Unpacks `packed_arguments` into a positional `Vec<Value>` following
/// `entry.param_names`, then runs the handler, catching any `Err` the way
/// the original caught Python exceptions (spec §4.2 failure semantics).
pub fn invoke(function_key: &str, packed_arguments: &PackedArguments) -> Result<Value, String> {
    let entry = lookup(function_key).ok_or_else(|| format!("unknown function: {function_key}"))?;
    let mut args = Vec::with_capacity(entry.param_names.len());
    for name in entry.param_names {
        let value = packed_arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| format!("missing argument `{name}` for {function_key}"))?;
        args.push(value);
    }
    (entry.handler)(&args)
}

/// Finds the prime factors of `num` — the exact function from
/// `basic_test.py` in the original implementation, used end to end in
/// scenario 1 of spec §8. Matches the original's range construction, which
/// is simply empty for `num < 2` rather than an error.
fn primes(args: &[Value]) -> Result<Value, String> {
    let num = args
        .first()
        .and_then(Value::as_int)
        .ok_or_else(|| "expected an integer argument `num`".to_string())?;
    let divisors: Vec<i64> = (2..=num / 2).filter(|d| num % d == 0).collect();
    let prime_factors: Vec<Value> = divisors
        .iter()
        .filter(|&&d| divisors.iter().all(|&other| other == d || d % other != 0))
        .map(|&d| Value::Int(d))
        .collect();
    Ok(Value::List(prime_factors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primes_finds_prime_factors_of_10001() {
        let result = primes(&[Value::Int(10001)]).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(73), Value::Int(137)]));
    }

    #[test]
    fn primes_of_values_below_two_is_an_empty_list() {
        assert_eq!(primes(&[Value::Int(1)]).unwrap(), Value::List(vec![]));
        assert_eq!(primes(&[Value::Int(0)]).unwrap(), Value::List(vec![]));
    }

    #[test]
    fn invoke_packs_arguments_positionally_by_declared_name() {
        let packed = vec![("num".to_string(), Value::Int(10001))];
        let result = invoke("basic_test.py:primes", &packed).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(73), Value::Int(137)]));
    }

    #[test]
    fn invoke_rejects_unknown_function_keys() {
        let packed = vec![];
        let err = invoke("nope.py:nope", &packed).unwrap_err();
        assert!(err.contains("unknown function"));
    }
}
