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

//! The cross-context shared state between the caller and dispatch loop
//! (spec §3, §5): a `Future` that latches monotonically from pending to
//! completed exactly once.

use clupy_common::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;

type SuccessCallback = Box<dyn FnOnce(&Value) + Send>;
type FailureCallback = Box<dyn FnOnce(&str) + Send>;

struct Inner {
    completed: bool,
    successful: bool,
    value: Option<Value>,
    failure: Option<String>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

/// A handle to a single remote invocation's outcome. Cheaply cloneable —
/// every clone shares the same underlying state (spec §3's `Future` record).
#[derive(Clone)]
pub struct Future {
    inner: Arc<Mutex<Inner>>,
}

impl Future {
    pub fn new() -> Self {
        Future {
            inner: Arc::new(Mutex::new(Inner {
                completed: false,
                successful: false,
                value: None,
                failure: None,
                on_success: None,
                on_failure: None,
            })),
        }
    }

    pub fn completed(&self) -> bool {
        self.inner.lock().completed
    }

    pub fn successful(&self) -> bool {
        self.inner.lock().successful
    }

    pub fn value(&self) -> Option<Value> {
        self.inner.lock().value.clone()
    }

    pub fn failure(&self) -> Option<String> {
        self.inner.lock().failure.clone()
    }

    /// Registers a callback invoked exactly once, on the dispatch context,
    /// when the future completes successfully. A future already completed
    /// by the time this is called fires the callback immediately.
    pub fn on_success(&self, callback: impl FnOnce(&Value) + Send + 'static) {
        let mut guard = self.inner.lock();
        if guard.completed {
            if guard.successful {
                if let Some(value) = guard.value.clone() {
                    drop(guard);
                    callback(&value);
                }
            }
            return;
        }
        guard.on_success = Some(Box::new(callback));
    }

    /// Registers a callback invoked exactly once when the future fails.
    pub fn on_failure(&self, callback: impl FnOnce(&str) + Send + 'static) {
        let mut guard = self.inner.lock();
        if guard.completed {
            if !guard.successful {
                if let Some(failure) = guard.failure.clone() {
                    drop(guard);
                    callback(&failure);
                }
            }
            return;
        }
        guard.on_failure = Some(Box::new(callback));
    }

    /// Completes the future with a value. A no-op if already completed —
    /// the latch only ever fires once (spec §3 invariant (f)).
    pub fn complete_success(&self, value: Value) {
        let callback = {
            let mut guard = self.inner.lock();
            if guard.completed {
                return;
            }
            guard.completed = true;
            guard.successful = true;
            guard.value = Some(value);
            guard.on_success.take()
        };
        if let Some(callback) = callback {
            let value = self.inner.lock().value.clone().expect("value set above");
            callback(&value);
        }
    }

    /// Completes the future with a failure message.
    pub fn complete_failure(&self, message: impl Into<String>) {
        let message = message.into();
        let callback = {
            let mut guard = self.inner.lock();
            if guard.completed {
                return;
            }
            guard.completed = true;
            guard.successful = false;
            guard.failure = Some(message);
            guard.on_failure.take()
        };
        if let Some(callback) = callback {
            let message = self.inner.lock().failure.clone().expect("failure set above");
            callback(&message);
        }
    }
}

impl Default for Future {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_exactly_once_and_latches() {
        let future = Future::new();
        future.complete_success(Value::Int(42));
        future.complete_failure("too late");

        assert!(future.completed());
        assert!(future.successful());
        assert_eq!(future.value(), Some(Value::Int(42)));
        assert_eq!(future.failure(), None);
    }

    #[test]
    fn on_success_fires_exactly_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let future = Future::new();
        let calls_clone = calls.clone();
        future.on_success(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        future.complete_success(Value::Int(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn on_failure_registered_after_completion_fires_immediately() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let future = Future::new();
        future.complete_failure("boom");

        let calls_clone = calls.clone();
        future.on_failure(move |msg| {
            assert_eq!(msg, "boom");
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
