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

//! The dispatch loop (spec §4.3): a single logical event loop, run on a
//! dedicated background thread so the caller's thread never blocks on I/O.
//! All `WorkerPool`/`WorkerSlot` state is owned exclusively here.

use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use clupy_common::Error;

use crate::master_client::MasterClient;
use crate::pool::{InvocationRequest, WorkerPool};
use crate::worker_client::WorkerClient;

/// A lease is released once its pool has been idle (no in-flight or pending
/// work) for this long (spec §4.3 step 4; matches the original's "30
/// seconds or more idle" release window).
const IDLE_RELEASE_THRESHOLD: Duration = Duration::from_secs(30);
const DISPATCH_TICK: Duration = Duration::from_millis(500);

pub enum Command {
    Enqueue {
        request: InvocationRequest,
        worker_count: usize,
    },
    Completed {
        function_key: String,
        worker_url: String,
    },
    /// Uses a std (not tokio) channel for the acknowledgement: `stop()` must
    /// be callable from a plain synchronous caller thread that blocks on
    /// `ack.recv()`, which would panic if it were a tokio oneshot awaited
    /// from outside a runtime.
    Stop {
        ack: std_mpsc::Sender<()>,
    },
}

struct DispatchState {
    client_id: String,
    master: MasterClient,
    worker: WorkerClient,
    pools: HashMap<String, WorkerPool>,
    self_tx: mpsc::UnboundedSender<Command>,
}

impl DispatchState {
    async fn handle_enqueue(&mut self, request: InvocationRequest, worker_count: usize) {
        if !self.pools.contains_key(&request.function_key) {
            match self.master.allocate(&self.client_id, worker_count).await {
                Ok(workers) => {
                    tracing::info!(
                        function_key = request.function_key,
                        count = workers.len(),
                        "allocated worker pool"
                    );
                    let mut pool = WorkerPool::new(request.function_key.clone(), workers);
                    for slot in &mut pool.slots {
                        match self
                            .worker
                            .create_sandbox(&slot.worker_url, &self.client_id, &pool.function_key)
                            .await
                        {
                            Ok(sandbox_id) => slot.sandbox_id = Some(sandbox_id),
                            Err(err) => {
                                tracing::warn!(worker_url = slot.worker_url, %err, "sandbox creation failed");
                            }
                        }
                    }
                    self.pools.insert(request.function_key.clone(), pool);
                }
                Err(err) => {
                    tracing::error!(function_key = request.function_key, %err, "allocation failed");
                    request.future.complete_failure(err.to_string());
                    return;
                }
            }
        }

        let function_key = request.function_key.clone();
        let pool = self.pools.get_mut(&function_key).expect("just inserted");
        pool.last_activity_at = Instant::now();
        pool.pending.push_back(request);
        self.dispatch_pending(&function_key);
    }

    fn dispatch_pending(&mut self, function_key: &str) {
        let pool = match self.pools.get_mut(function_key) {
            Some(pool) => pool,
            None => return,
        };
        loop {
            if pool.pending.is_empty() {
                break;
            }
            let slot_index = pool
                .slots
                .iter()
                .position(|s| s.is_free() && s.sandbox_id.is_some());
            let slot_index = match slot_index {
                Some(idx) => idx,
                None => break,
            };

            let request = pool.pending.pop_front().expect("checked non-empty above");
            let slot = &mut pool.slots[slot_index];
            slot.last_activity_at = Instant::now();
            let worker_url = slot.worker_url.clone();
            let sandbox_id = slot.sandbox_id.clone().expect("checked is_some above");
            slot.in_flight = Some(request.clone());

            let worker_client = self.worker.clone();
            let self_tx = self.self_tx.clone();
            let function_key = function_key.to_string();
            tokio::spawn(async move {
                let result = worker_client
                    .execute(
                        &worker_url,
                        &sandbox_id,
                        &request.source_file,
                        &request.function_name,
                        &request.packed_arguments,
                    )
                    .await;
                match result {
                    Ok(value) => request.future.complete_success(value),
                    Err(Error::RemoteExecution(message)) => request.future.complete_failure(message),
                    Err(other) => request.future.complete_failure(other.to_string()),
                }
                let _ = self_tx.send(Command::Completed {
                    function_key,
                    worker_url,
                });
            });
        }
    }

    fn handle_completed(&mut self, function_key: &str, worker_url: &str) {
        if let Some(pool) = self.pools.get_mut(function_key) {
            if let Some(slot) = pool.slots.iter_mut().find(|s| s.worker_url == worker_url) {
                slot.in_flight = None;
                slot.last_activity_at = Instant::now();
            }
            pool.last_activity_at = Instant::now();
        }
        self.dispatch_pending(function_key);
    }

    /// Retries sandbox creation for any slot that missed it when the pool
    /// was first built (e.g. a transient failure at allocation time), so a
    /// request stuck in `pending` for want of a usable slot isn't stuck
    /// forever. Re-dispatches any pool that gained a slot this way.
    async fn retry_missing_sandboxes(&mut self) {
        let mut ready = Vec::new();
        for (function_key, pool) in self.pools.iter_mut() {
            for slot in &mut pool.slots {
                if slot.sandbox_id.is_some() {
                    continue;
                }
                match self
                    .worker
                    .create_sandbox(&slot.worker_url, &self.client_id, function_key)
                    .await
                {
                    Ok(sandbox_id) => {
                        slot.sandbox_id = Some(sandbox_id);
                        ready.push(function_key.clone());
                    }
                    Err(err) => {
                        tracing::warn!(worker_url = slot.worker_url, %err, "sandbox retry failed");
                    }
                }
            }
        }
        for function_key in ready {
            self.dispatch_pending(&function_key);
        }
    }

    async fn run_maintenance(&mut self) {
        self.retry_missing_sandboxes().await;

        let now = Instant::now();
        let mut to_remove = Vec::new();
        for (function_key, pool) in self.pools.iter() {
            if pool.is_idle() && now.duration_since(pool.last_activity_at) >= IDLE_RELEASE_THRESHOLD {
                to_remove.push(function_key.clone());
            }
        }
        for function_key in to_remove {
            if let Some(pool) = self.pools.remove(&function_key) {
                let workers = pool.worker_urls();
                if let Err(err) = self.master.retain(&self.client_id, true, &workers).await {
                    tracing::warn!(function_key, %err, "release on idle failed");
                } else {
                    tracing::info!(function_key, "released idle worker pool");
                }
            }
        }

        for pool in self.pools.values() {
            if pool.is_idle() {
                continue;
            }
            let workers = pool.worker_urls();
            if let Err(err) = self.master.retain(&self.client_id, false, &workers).await {
                tracing::warn!(function_key = pool.function_key, %err, "lease renewal failed");
            }
        }
    }

    async fn drain_in_flight(&mut self, rx: &mut mpsc::UnboundedReceiver<Command>) {
        loop {
            let any_in_flight = self.pools.values().any(|p| p.slots.iter().any(|s| !s.is_free()));
            if !any_in_flight {
                break;
            }
            match rx.recv().await {
                Some(Command::Completed {
                    function_key,
                    worker_url,
                }) => self.handle_completed(&function_key, &worker_url),
                Some(Command::Enqueue { request, .. }) => {
                    request.future.complete_failure("engine is stopping");
                }
                Some(Command::Stop { ack }) => {
                    let _ = ack.send(());
                }
                None => break,
            }
        }
    }

    async fn release_all_leases(&mut self) {
        for (function_key, pool) in self.pools.drain() {
            let workers = pool.worker_urls();
            if let Err(err) = self.master.retain(&self.client_id, true, &workers).await {
                tracing::warn!(function_key, %err, "lease release on stop failed");
            }
        }
    }
}

/// Runs the dispatch loop until a [`Command::Stop`] is received. Intended to
/// be driven by [`crate::engine::spawn_dispatch_thread`] on a dedicated OS
/// thread with its own single-threaded tokio runtime.
pub async fn run(
    client_id: String,
    master: MasterClient,
    worker: WorkerClient,
    mut rx: mpsc::UnboundedReceiver<Command>,
    self_tx: mpsc::UnboundedSender<Command>,
) {
    let mut state = DispatchState {
        client_id,
        master,
        worker,
        pools: HashMap::new(),
        self_tx,
    };

    let mut ticker = tokio::time::interval(DISPATCH_TICK);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = rx.recv() => {
                match command {
                    Some(Command::Enqueue { request, worker_count }) => {
                        state.handle_enqueue(request, worker_count).await;
                    }
                    Some(Command::Completed { function_key, worker_url }) => {
                        state.handle_completed(&function_key, &worker_url);
                    }
                    Some(Command::Stop { ack }) => {
                        state.drain_in_flight(&mut rx).await;
                        state.release_all_leases().await;
                        let _ = ack.send(());
                        return;
                    }
                    None => return,
                }
            }
            _ = ticker.tick() => {
                state.run_maintenance().await;
            }
        }
    }
}
