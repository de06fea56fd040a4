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

//! Drives the worker's real HTTP surface end to end (spec §6, §8 scenario 1).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clupy_common::value::{self, PackedArguments, Value};

async fn spawn_worker() -> (String, tokio::task::JoinHandle<()>) {
    let router = clupy_worker::build();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (base, _handle) = spawn_worker().await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "iamok");
}

#[tokio::test]
async fn create_sandbox_returns_a_deterministic_id() {
    let (base, _handle) = spawn_worker().await;
    let body = reqwest::get(format!("{base}/sandbox/client1:123/exec-1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "client1:123_exec-1");
}

#[tokio::test]
async fn execute_runs_the_registered_function_end_to_end() {
    let (base, _handle) = spawn_worker().await;
    let sandbox_id = reqwest::get(format!("{base}/sandbox/client1:123/exec-1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let packed: PackedArguments = vec![("num".to_string(), Value::Int(10001))];
    let input_data = BASE64.encode(value::encode(&packed).unwrap());

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/execute/{sandbox_id}"))
        .form(&[
            ("file_name", "basic_test.py"),
            ("func_name", "primes"),
            ("input_data", &input_data),
        ])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let body = resp.text().await.unwrap();
    let raw = BASE64.decode(body.as_bytes()).unwrap();
    let result: Value = value::decode(&raw).unwrap();
    assert_eq!(result, Value::List(vec![Value::Int(73), Value::Int(137)]));
}

#[tokio::test]
async fn execute_surfaces_handler_failure_as_unprocessable() {
    let (base, _handle) = spawn_worker().await;
    let packed: PackedArguments = vec![("num".to_string(), Value::Int(10001))];
    let input_data = BASE64.encode(value::encode(&packed).unwrap());

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/execute/sandbox-1"))
        .form(&[
            ("file_name", "unknown.py"),
            ("func_name", "nope"),
            ("input_data", &input_data),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}
