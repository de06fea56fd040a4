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

//! The master node: membership registry, lease allocator, and the HTTP
//! surface and maintenance loop that drive them (spec §4.1).

pub mod registry;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use clupy_common::config::MasterConfig;
use registry::Registry;

/// Builds the registry and axum router for a master process, but does not
/// bind a listener — callers (the CLI binary, or tests) own the socket.
pub fn build(config: &MasterConfig) -> (Arc<Registry>, axum::Router) {
    let registry = Arc::new(Registry::new(
        config.registration_ttl,
        config.reservation_ttl,
        config.default_server_request_count,
    ));
    let router = server::router(registry.clone());
    (registry, router)
}

/// Spawns the periodic eviction sweep (spec §4.1) at `config.maintenance_period`.
pub fn spawn_maintenance(
    registry: Arc<Registry>,
    config: &MasterConfig,
) -> (tokio::task::JoinHandle<()>, tokio::sync::oneshot::Sender<()>) {
    registry.start_maintenance_loop(Duration::from_secs(config.maintenance_period))
}
