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

//! The worker node: the registration heartbeat and the HTTP surface for
//! sandbox creation and remote execution (spec §4.2).

pub mod execution;
pub mod functions;
pub mod heartbeat;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use clupy_common::config::WorkerConfig;
use execution::ExecutionService;
use heartbeat::MasterClient;

/// Builds the axum router for a worker process, but does not bind a
/// listener — callers (the CLI binary, or tests) own the socket.
pub fn build() -> axum::Router {
    server::router(Arc::new(ExecutionService::new()))
}

/// Starts the registration heartbeat loop for `config`, normalizing both the
/// worker's own advertised URL and the master's URL (spec §6 URL scheme).
pub fn spawn_heartbeat(
    config: &WorkerConfig,
) -> (tokio::task::JoinHandle<()>, tokio::sync::oneshot::Sender<()>) {
    let master_url = clupy_common::util::normalize_url(&config.master_url);
    let server_url = clupy_common::util::normalize_url(&config.server_url);
    let client = MasterClient::new(master_url);
    heartbeat::start(
        client,
        server_url,
        Duration::from_secs(config.registration_interval),
        Duration::from_secs(config.failure_retry_interval),
    )
}
