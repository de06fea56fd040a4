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

//! The membership registry and lease allocator (spec §3, §4.1). All
//! mutations go through [`Registry`], which owns a single map keyed by
//! worker URL — the key set is the sole source of membership truth.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub type WorkerUrl = String;

/// A worker's registration state (spec §3). `holder_id` is `None` iff
/// `reserved_at` is `None`; `updated_at >= registered_at` always;
/// `last_renewed_at >= reserved_at` whenever both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRegistration {
    pub worker_url: WorkerUrl,
    pub registered_at: u64,
    pub updated_at: u64,
    pub reserved_at: Option<u64>,
    pub last_renewed_at: Option<u64>,
    pub holder_id: Option<String>,
}

impl WorkerRegistration {
    fn new(worker_url: WorkerUrl, now: u64) -> Self {
        WorkerRegistration {
            worker_url,
            registered_at: now,
            updated_at: now,
            reserved_at: None,
            last_renewed_at: None,
            holder_id: None,
        }
    }

    fn is_free_or_expired(&self, reservation_ttl: u64, now: u64) -> bool {
        match (self.holder_id.as_ref(), self.last_renewed_at) {
            (None, _) => true,
            (Some(_), Some(last_renewed_at)) => {
                last_renewed_at + reservation_ttl < now
            }
            (Some(_), None) => true,
        }
    }

    fn reserve(&mut self, client_id: &str, now: u64) {
        self.reserved_at = Some(now);
        self.last_renewed_at = Some(now);
        self.holder_id = Some(client_id.to_string());
    }

    fn release(&mut self) {
        self.reserved_at = None;
        self.last_renewed_at = None;
        self.holder_id = None;
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Error returned when an `allocate` request cannot be satisfied (spec §4.1
/// — surfaced by the HTTP layer as a 406).
#[derive(Debug, thiserror::Error)]
#[error("requested {requested} workers but only {available} are registered")]
pub struct InsufficientWorkers {
    pub requested: usize,
    pub available: usize,
}

#[derive(Default)]
struct RegistryCore {
    workers: HashMap<WorkerUrl, WorkerRegistration>,
}

/// The master's registry and lease allocator. Conceptually single-threaded
/// (spec §5); the `RwLock` only exists to let axum's handler tasks share
/// ownership, not to express real contention — all five operations below
/// are implemented as one lock acquisition apiece.
pub struct Registry {
    core: RwLock<RegistryCore>,
    registration_ttl: u64,
    reservation_ttl: u64,
    default_server_request_count: usize,
}

impl Registry {
    pub fn new(registration_ttl: u64, reservation_ttl: u64, default_server_request_count: usize) -> Self {
        Registry {
            core: RwLock::new(RegistryCore::default()),
            registration_ttl,
            reservation_ttl,
            default_server_request_count,
        }
    }

    /// `register(worker_url)`: upserts, preserving reservation fields on an
    /// existing entry and only advancing `updated_at` (spec §4.1).
    pub async fn register(&self, worker_url: WorkerUrl) {
        let now = now_secs();
        let mut core = self.core.write().await;
        match core.workers.get_mut(&worker_url) {
            Some(existing) => {
                existing.updated_at = now;
            }
            None => {
                core.workers
                    .insert(worker_url.clone(), WorkerRegistration::new(worker_url, now));
            }
        }
    }

    /// `unregister(worker_url)`: idempotent removal.
    pub async fn unregister(&self, worker_url: &str) {
        let mut core = self.core.write().await;
        core.workers.remove(worker_url);
    }

    /// `info()`: the full registration map (spec §4.1), read-only.
    pub async fn info(&self) -> HashMap<WorkerUrl, WorkerRegistration> {
        self.core.read().await.workers.clone()
    }

    /// `allocate(client_id, requested_count)` (spec §4.1): two-pass
    /// selection — free-or-expired-lease workers first, then any remaining
    /// (knowingly busy) workers to make up the count. Scans in the map's
    /// iteration order, which for a `HashMap` is not insertion order; this
    /// only affects which workers tie-break into a partial allocation, not
    /// any invariant the spec asserts.
    pub async fn allocate(
        &self,
        client_id: &str,
        requested_count: usize,
    ) -> Result<Vec<WorkerUrl>, InsufficientWorkers> {
        let now = now_secs();
        let mut core = self.core.write().await;

        let requested_count = if requested_count == 0 {
            self.default_server_request_count
        } else {
            requested_count
        };

        if requested_count > core.workers.len() {
            return Err(InsufficientWorkers {
                requested: requested_count,
                available: core.workers.len(),
            });
        }

        let mut selected: Vec<WorkerUrl> = core
            .workers
            .values()
            .filter(|w| w.is_free_or_expired(self.reservation_ttl, now))
            .take(requested_count)
            .map(|w| w.worker_url.clone())
            .collect();

        if selected.len() < requested_count {
            for url in core.workers.keys() {
                if selected.len() >= requested_count {
                    break;
                }
                if !selected.contains(url) {
                    selected.push(url.clone());
                }
            }
        }

        for url in &selected {
            if let Some(worker) = core.workers.get_mut(url) {
                worker.reserve(client_id, now);
            }
        }

        Ok(selected)
    }

    /// `retain(client_id, to_free, worker_list)` (spec §4.1). Does not
    /// verify `holder_id == client_id` before mutating — an intentional
    /// simplification carried over unchanged (spec §9, Open Question 1).
    pub async fn retain(&self, _client_id: &str, to_free: bool, worker_list: &[WorkerUrl]) {
        let now = now_secs();
        let mut core = self.core.write().await;
        for url in worker_list {
            if let Some(worker) = core.workers.get_mut(url) {
                if to_free {
                    worker.release();
                } else {
                    worker.last_renewed_at = Some(now);
                }
            }
        }
    }

    /// One maintenance sweep: evicts any entry whose `updated_at` is older
    /// than `registration_ttl` (spec §4.1 — the sole eviction mechanism).
    pub async fn run_maintenance(&self) -> Vec<WorkerUrl> {
        let now = now_secs();
        let expiration = now.saturating_sub(self.registration_ttl);
        let mut core = self.core.write().await;
        let expired: Vec<WorkerUrl> = core
            .workers
            .values()
            .filter(|w| w.updated_at < expiration)
            .map(|w| w.worker_url.clone())
            .collect();
        for url in &expired {
            core.workers.remove(url);
        }
        expired
    }

    /// Spawns the maintenance loop onto the current tokio runtime, running
    /// `run_maintenance` every `maintenance_period` (spec §4.1). Returns a
    /// handle and a shutdown sender, mirroring the heartbeat-checker
    /// lifecycle used on the worker side.
    pub fn start_maintenance_loop(
        self: std::sync::Arc<Self>,
        period: Duration,
    ) -> (JoinHandle<()>, tokio::sync::oneshot::Sender<()>) {
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        let join_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = &mut shutdown_rx => {
                        tracing::info!("maintenance loop stopped");
                        return;
                    }
                }
                let expired = self.run_maintenance().await;
                if !expired.is_empty() {
                    tracing::info!(count = expired.len(), "evicted expired workers");
                }
            }
        });
        (join_handle, shutdown_tx)
    }
}
