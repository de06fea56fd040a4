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

//! HTTP client for a worker's `sandbox`/`execute` endpoints (spec §6). Form
//! fields are base64-encoded MessagePack, matching the worker's HTTP surface.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clupy_common::value::{self, PackedArguments, Value};
use clupy_common::{Error, Result};

#[derive(Clone)]
pub struct WorkerClient {
    http: reqwest::Client,
}

impl WorkerClient {
    pub fn new() -> Self {
        WorkerClient {
            http: reqwest::Client::new(),
        }
    }

    pub async fn create_sandbox(&self, worker_url: &str, client_id: &str, execution_id: &str) -> Result<String> {
        let url = format!("{worker_url}/sandbox/{client_id}/{execution_id}");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::network(&url, e))?;
        if !response.status().is_success() {
            return Err(Error::Protocol(format!(
                "unexpected status {} from {url}",
                response.status()
            )));
        }
        response.text().await.map_err(|e| Error::network(&url, e))
    }

    /// Returns `Ok(value)` on a successful remote execution, or
    /// `Err(Error::RemoteExecution(..))` when the worker ran the function
    /// but it raised — distinct from [`Error::Network`], which means the
    /// worker itself could not be reached (spec §9, Open Question 2).
    pub async fn execute(
        &self,
        worker_url: &str,
        sandbox_id: &str,
        source_file: &str,
        function_name: &str,
        packed_arguments: &PackedArguments,
    ) -> Result<Value> {
        let url = format!("{worker_url}/execute/{sandbox_id}");
        let input_data = BASE64.encode(value::encode(packed_arguments)?);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("file_name", source_file),
                ("func_name", function_name),
                ("input_data", &input_data),
            ])
            .send()
            .await
            .map_err(|e| Error::network(&url, e))?;

        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::RemoteExecution(message));
        }
        if !response.status().is_success() {
            return Err(Error::Protocol(format!(
                "unexpected status {} from {url}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| Error::network(&url, e))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        let raw = BASE64
            .decode(body.as_bytes())
            .map_err(|e| Error::Protocol(format!("response from {url} is not valid base64: {e}")))?;
        value::decode(&raw)
    }
}

impl Default for WorkerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_sandbox_against_an_unreachable_worker_is_a_network_error() {
        let client = WorkerClient::new();
        let err = client
            .create_sandbox("http://127.0.0.1:1", "client1:1", "exec-1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }
}
