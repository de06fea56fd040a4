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

//! Per-function worker pools owned exclusively by the dispatch context
//! (spec §3, §4.3). None of these types cross a thread boundary; only
//! [`crate::future::Future`] and [`InvocationRequest`] handoffs do.

use std::collections::VecDeque;
use std::time::Instant;

use clupy_common::value::PackedArguments;

use crate::future::Future;

/// A single queued or in-flight remote call.
#[derive(Clone)]
pub struct InvocationRequest {
    pub function_key: String,
    pub source_file: String,
    pub function_name: String,
    pub packed_arguments: PackedArguments,
    pub future: Future,
}

/// One allocated worker within a pool. Invariant: at most one `in_flight`
/// request at a time (spec §3 invariant (e)).
pub struct WorkerSlot {
    pub worker_url: String,
    pub sandbox_id: Option<String>,
    pub in_flight: Option<InvocationRequest>,
    pub last_activity_at: Instant,
}

impl WorkerSlot {
    fn new(worker_url: String) -> Self {
        WorkerSlot {
            worker_url,
            sandbox_id: None,
            in_flight: None,
            last_activity_at: Instant::now(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.in_flight.is_none()
    }
}

/// The worker pool allocated for a single `function_key` (spec §3).
pub struct WorkerPool {
    pub function_key: String,
    pub slots: Vec<WorkerSlot>,
    pub pending: VecDeque<InvocationRequest>,
    pub last_activity_at: Instant,
}

impl WorkerPool {
    pub fn new(function_key: String, worker_urls: Vec<String>) -> Self {
        WorkerPool {
            function_key,
            slots: worker_urls.into_iter().map(WorkerSlot::new).collect(),
            pending: VecDeque::new(),
            last_activity_at: Instant::now(),
        }
    }

    pub fn worker_urls(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.worker_url.clone()).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.slots.iter().all(WorkerSlot::is_free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_starts_free() {
        let slot = WorkerSlot::new("http://w1".to_string());
        assert!(slot.is_free());
    }

    #[test]
    fn pool_reports_idle_only_when_drained_and_unused() {
        let mut pool = WorkerPool::new("f.py:f".to_string(), vec!["http://w1".to_string()]);
        assert!(pool.is_idle());

        pool.slots[0].in_flight = Some(InvocationRequest {
            function_key: "f.py:f".to_string(),
            source_file: "f.py".to_string(),
            function_name: "f".to_string(),
            packed_arguments: vec![],
            future: Future::new(),
        });
        assert!(!pool.is_idle());
    }
}
