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

//! Drives master + worker + client engine end to end (spec §8 scenario 1:
//! "a client calls `parallel(primes, 2)(10001)` against a running
//! master+worker pair and observes a successful Future with value
//! `[73, 137]`").

use std::time::Duration;

use clupy_common::config::MasterConfig;
use clupy_common::value::Value;

async fn spawn_master() -> String {
    let config = MasterConfig {
        port: 0,
        registration_ttl: 300,
        reservation_ttl: 300,
        maintenance_period: 30,
        default_server_request_count: 10,
    };
    let (_registry, router) = clupy_master::build(&config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_worker() -> String {
    let router = clupy_worker::build();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn parallel_primes_call_completes_successfully() {
    let master_url = spawn_master().await;
    let worker_url = spawn_worker().await;

    reqwest::get(format!(
        "{master_url}/register/{}",
        clupy_common::util::encode_path_segment(&worker_url)
    ))
    .await
    .unwrap();

    let config = clupy_common::config::ClientConfig::new(master_url);
    let service = clupy_client::RemoteExecutionService::new(config);

    let primes = service.parallel("basic_test.py", "primes", vec!["num"], 1);
    let future = primes.call(vec![Value::Int(10001)]).unwrap();

    service.wait_all(&[future.clone()], Duration::from_secs(5));

    assert!(future.completed());
    assert!(future.successful(), "failure: {:?}", future.failure());
    assert_eq!(
        future.value(),
        Some(Value::List(vec![Value::Int(73), Value::Int(137)]))
    );

    service.stop();
}

#[tokio::test]
async fn allocation_failure_fails_the_future_when_no_workers_are_registered() {
    let master_url = spawn_master().await;
    let config = clupy_common::config::ClientConfig::new(master_url);
    let service = clupy_client::RemoteExecutionService::new(config);

    let primes = service.parallel("basic_test.py", "primes", vec!["num"], 1);
    let future = primes.call(vec![Value::Int(10001)]).unwrap();

    service.wait_all(&[future.clone()], Duration::from_secs(5));

    assert!(future.completed());
    assert!(!future.successful());
    assert!(future.failure().is_some());

    service.stop();
}
