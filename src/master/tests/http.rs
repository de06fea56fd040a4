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

//! Drives the master's real HTTP surface end to end (spec §6, §8 scenario 2).

use std::collections::HashMap;

use clupy_common::config::MasterConfig;
use clupy_master::registry::WorkerRegistration;

async fn spawn_master() -> (String, tokio::task::JoinHandle<()>) {
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
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (base, _handle) = spawn_master().await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "iamok");
}

#[tokio::test]
async fn register_then_info_lists_the_worker() {
    let (base, _handle) = spawn_master().await;
    let encoded = clupy_common::util::encode_path_segment("http://localhost:7877");
    reqwest::get(format!("{base}/register/{encoded}"))
        .await
        .unwrap();

    let bytes = reqwest::get(format!("{base}/info"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let registrations: HashMap<String, WorkerRegistration> =
        clupy_common::value::decode(&bytes).unwrap();
    assert!(registrations.contains_key("http://localhost:7877"));
}

#[tokio::test]
async fn alloc_without_workers_returns_406_mentioning_server_list() {
    let (base, _handle) = spawn_master().await;
    let resp = reqwest::get(format!("{base}/alloc/client1:123/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_ACCEPTABLE);
    let body = resp.text().await.unwrap();
    assert!(body.contains("server list"));
}

#[tokio::test]
async fn alloc_returns_registered_worker_and_retain_releases_it() {
    let (base, _handle) = spawn_master().await;
    let encoded = clupy_common::util::encode_path_segment("http://localhost:7877");
    reqwest::get(format!("{base}/register/{encoded}"))
        .await
        .unwrap();

    let bytes = reqwest::get(format!("{base}/alloc/client1:123/1"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let allocated: Vec<String> = clupy_common::value::decode(&bytes).unwrap();
    assert_eq!(allocated, vec!["http://localhost:7877".to_string()]);

    let body = clupy_common::value::encode(&allocated).unwrap();
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/retain/client1:123/1"))
        .body(body)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let bytes = reqwest::get(format!("{base}/info")).await.unwrap().bytes().await.unwrap();
    let registrations: HashMap<String, WorkerRegistration> =
        clupy_common::value::decode(&bytes).unwrap();
    assert!(registrations["http://localhost:7877"].holder_id.is_none());
}
