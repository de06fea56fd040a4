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

//! The worker's HTTP surface (spec §6): `/health`, `/sandbox/:client_id/:execution_id`
//! and `/execute/:sandbox_id`. `execute`'s form fields carry base64-encoded
//! MessagePack — the original wire format needed a text-safe transport here,
//! unlike the master's raw-bytes bodies.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clupy_common::value::{self, PackedArguments};
use serde::Deserialize;

use crate::execution::ExecutionService;

pub fn router(execution: Arc<ExecutionService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sandbox/:client_id/:execution_id", get(create_sandbox))
        .route("/execute/:sandbox_id", post(execute))
        .with_state(execution)
}

async fn health() -> &'static str {
    "iamok"
}

async fn create_sandbox(
    State(execution): State<Arc<ExecutionService>>,
    Path((client_id, execution_id)): Path<(String, String)>,
) -> String {
    execution.create_sandbox(&client_id, &execution_id)
}

#[derive(Deserialize)]
struct ExecuteForm {
    file_name: String,
    func_name: String,
    input_data: String,
}

async fn execute(
    State(execution): State<Arc<ExecutionService>>,
    Path(sandbox_id): Path<String>,
    Form(form): Form<ExecuteForm>,
) -> Response {
    let raw = match BASE64.decode(form.input_data.as_bytes()) {
        Ok(raw) => raw,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("input_data is not valid base64: {err}"),
            )
                .into_response()
        }
    };
    let packed_arguments: PackedArguments = match value::decode(&raw) {
        Ok(packed) => packed,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("input_data is not a valid packed argument mapping: {err}"),
            )
                .into_response()
        }
    };

    tracing::info!(sandbox_id, file_name = form.file_name, func_name = form.func_name, "handling execute request");

    match execution.execute(&sandbox_id, &form.file_name, &form.func_name, &packed_arguments) {
        Ok(result) => match value::encode(&result) {
            Ok(bytes) => (StatusCode::OK, BASE64.encode(bytes)).into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        },
        Err(message) => {
            tracing::warn!(sandbox_id, message, "user function failed");
            (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
        }
    }
}
