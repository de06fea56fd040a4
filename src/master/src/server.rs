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

//! The master's HTTP surface (spec §6): five GET operations over the
//! registry plus `/health`. Response bodies are opaque: plain text for
//! register/unregister/retain confirmations, MessagePack bytes for `/info`
//! and `/alloc`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clupy_common::util::decode_path_segment;
use clupy_common::value;

use crate::registry::{Registry, WorkerUrl};

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register/:worker_url", get(register))
        .route("/unregister/:worker_url", get(unregister))
        .route("/info", get(info))
        .route("/alloc/:client_id/:count", get(allocate))
        .route("/retain/:client_id/:to_free", get(retain))
        .with_state(registry)
}

async fn health() -> &'static str {
    "iamok"
}

async fn register(State(registry): State<Arc<Registry>>, Path(worker_url): Path<String>) -> String {
    let worker_url = decode_path_segment(&worker_url);
    tracing::info!(worker_url, "handling registration request");
    registry.register(worker_url.clone()).await;
    format!("{worker_url} successfully registered")
}

async fn unregister(
    State(registry): State<Arc<Registry>>,
    Path(worker_url): Path<String>,
) -> String {
    let worker_url = decode_path_segment(&worker_url);
    tracing::info!(worker_url, "handling unregistration request");
    registry.unregister(&worker_url).await;
    format!("{worker_url} successfully unregistered")
}

async fn info(State(registry): State<Arc<Registry>>) -> Response {
    let registrations = registry.info().await;
    match value::encode(&registrations) {
        Ok(bytes) => (StatusCode::OK, bytes).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn allocate(
    State(registry): State<Arc<Registry>>,
    Path((client_id, count)): Path<(String, String)>,
) -> Response {
    let requested_count: usize = count.parse().unwrap_or(0);
    tracing::info!(client_id, requested_count, "handling allocation request");
    match registry.allocate(&client_id, requested_count).await {
        Ok(workers) => match value::encode::<Vec<WorkerUrl>>(&workers) {
            Ok(bytes) => (StatusCode::OK, bytes).into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        },
        Err(err) => {
            tracing::error!(%err, "allocation request could not be satisfied");
            (
                StatusCode::NOT_ACCEPTABLE,
                format!(
                    "resource request can not be satisfied: requested {} but the server list only has {}",
                    err.requested, err.available
                ),
            )
                .into_response()
        }
    }
}

async fn retain(
    State(registry): State<Arc<Registry>>,
    Path((client_id, to_free)): Path<(String, String)>,
    body: axum::body::Bytes,
) -> Response {
    let to_free = to_free != "0";
    let worker_list: Vec<WorkerUrl> = if body.is_empty() {
        Vec::new()
    } else {
        match value::decode(&body) {
            Ok(list) => list,
            Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        }
    };
    tracing::info!(client_id, to_free, count = worker_list.len(), "handling retain request");
    registry.retain(&client_id, to_free, &worker_list).await;
    (StatusCode::OK, "server resources retained").into_response()
}
