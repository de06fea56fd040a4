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

//! Server-side remote execution support (spec §4.2). Sandboxes carry no
//! real isolation in this design (non-goal) — they are bookkeeping ids that
//! let repeated calls share a cached "module import" in spirit, mirroring
//! `create_sand_box` in the original.

use clupy_common::value::{PackedArguments, Value};

use crate::functions;

/// The execution service a worker process owns. Stateless today beyond the
/// function table, but kept as an explicitly-constructed object (spec §9
/// singleton note) rather than free functions, so a future cache of
/// per-sandbox state has somewhere to live.
#[derive(Default)]
pub struct ExecutionService;

impl ExecutionService {
    pub fn new() -> Self {
        ExecutionService
    }

    /// `create_sandbox(client_id, execution_id)` (spec §4.2).
    pub fn create_sandbox(&self, client_id: &str, execution_id: &str) -> String {
        format!("{client_id}_{execution_id}")
    }

    /// `execute(sandbox_id, source_file, function_name, packed_arguments)`
    /// (spec §4.2). Any failure from the looked-up handler is caught and
    /// returned as `Err` — the worker itself never panics on bad user code.
    pub fn execute(
        &self,
        sandbox_id: &str,
        source_file: &str,
        function_name: &str,
        packed_arguments: &PackedArguments,
    ) -> Result<Value, String> {
        let function_key = format!("{source_file}:{function_name}");
        tracing::debug!(sandbox_id, function_key, "executing");
        functions::invoke(&function_key, packed_arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sandbox_derives_a_deterministic_id() {
        let service = ExecutionService::new();
        assert_eq!(
            service.create_sandbox("client1:123", "exec-7"),
            "client1:123_exec-7"
        );
    }

    #[test]
    fn execute_runs_the_registered_function() {
        let service = ExecutionService::new();
        let packed = vec![("num".to_string(), Value::Int(10001))];
        let result = service
            .execute("sandbox-1", "basic_test.py", "primes", &packed)
            .unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(73), Value::Int(137)]));
    }

    #[test]
    fn execute_surfaces_handler_failures_without_panicking() {
        let service = ExecutionService::new();
        let packed = vec![("num".to_string(), Value::Str("not a number".to_string()))];
        let err = service
            .execute("sandbox-1", "basic_test.py", "primes", &packed)
            .unwrap_err();
        assert!(err.contains("integer argument"));
    }
}
