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

//! The engine facade: `parallel`, `wrapped_call`, `wait_all`, `stop` (spec
//! §4.3). The dispatch loop runs on a dedicated background thread, mirroring
//! the worker-thread-plus-channel pattern used elsewhere in this codebase
//! for isolating blocking or long-running work from caller threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use clupy_common::config::ClientConfig;
use clupy_common::value::{pack_arguments, Value};
use clupy_common::{Error, Result};

use crate::dispatch::{self, Command};
use crate::future::Future;
use crate::master_client::MasterClient;
use crate::pool::InvocationRequest;
use crate::worker_client::WorkerClient;

struct EngineInner {
    client_id: String,
    command_tx: mpsc::UnboundedSender<Command>,
    thread: Option<JoinHandle<()>>,
    stopped: AtomicBool,
}

/// The client's remote execution engine (spec §9's singleton usage note: an
/// owned, explicitly-constructed object, not an ambient global).
#[derive(Clone)]
pub struct RemoteExecutionService {
    inner: Arc<EngineInner>,
}

impl RemoteExecutionService {
    pub fn new(config: ClientConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let self_tx = command_tx.clone();
        let client_id = config.client_id.clone();
        let master_url = config.master_url.clone();

        let thread = std::thread::Builder::new()
            .name("clupy-dispatch".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build dispatch runtime");
                runtime.block_on(async move {
                    let master = MasterClient::new(master_url);
                    let worker = WorkerClient::new();
                    dispatch::run(client_id, master, worker, command_rx, self_tx).await;
                });
            })
            .expect("failed to spawn dispatch thread");

        RemoteExecutionService {
            inner: Arc::new(EngineInner {
                client_id: config.client_id,
                command_tx,
                thread: Some(thread),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// `parallel(func, worker_count)` (spec §4.3): binds a function
    /// identity without contacting the master. `worker_count == 0` means
    /// "use master default".
    pub fn parallel(
        &self,
        source_file: impl Into<String>,
        function_name: impl Into<String>,
        param_names: Vec<&'static str>,
        worker_count: usize,
    ) -> RemoteFunction {
        let source_file = source_file.into();
        let function_name = function_name.into();
        let function_key = format!("{source_file}:{function_name}");
        RemoteFunction {
            engine: self.clone(),
            function_key,
            source_file,
            function_name,
            param_names,
            worker_count,
        }
    }

    /// `wait_all(futures, timeout)` (spec §4.3): polls every 100ms until all
    /// complete or the deadline elapses. Never raises on timeout.
    pub fn wait_all(&self, futures: &[Future], timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            if futures.iter().all(Future::completed) {
                return;
            }
            if Instant::now() >= deadline {
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// `stop()` (spec §4.3): drains in-flight executes, releases leases,
    /// joins the dispatch thread. Idempotent; subsequent `parallel(...)(...)`
    /// calls fail with [`Error::EngineStopped`].
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        if self.inner.command_tx.send(Command::Stop { ack: ack_tx }).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// A function bound to a pool by [`RemoteExecutionService::parallel`].
/// Calling it packs arguments and hands an [`InvocationRequest`] to the
/// dispatch loop, returning a [`Future`] immediately (spec §4.3
/// `wrapped_call`).
#[derive(Clone)]
pub struct RemoteFunction {
    engine: RemoteExecutionService,
    function_key: String,
    source_file: String,
    function_name: String,
    param_names: Vec<&'static str>,
    worker_count: usize,
}

impl RemoteFunction {
    pub fn call(&self, args: Vec<Value>) -> Result<Future> {
        if self.engine.inner.stopped.load(Ordering::SeqCst) {
            return Err(Error::EngineStopped);
        }
        let packed_arguments = pack_arguments(&self.param_names, args)?;
        let future = Future::new();
        let request = InvocationRequest {
            function_key: self.function_key.clone(),
            source_file: self.source_file.clone(),
            function_name: self.function_name.clone(),
            packed_arguments,
            future: future.clone(),
        };
        self.engine
            .inner
            .command_tx
            .send(Command::Enqueue {
                request,
                worker_count: self.worker_count,
            })
            .map_err(|_| Error::EngineStopped)?;
        Ok(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_before_any_call_is_a_no_op() {
        let config = ClientConfig::new("http://127.0.0.1:1");
        let service = RemoteExecutionService::new(config);
        assert!(service.client_id().contains(':'));
        service.stop();
        service.stop();
    }

    #[test]
    fn call_after_stop_is_rejected() {
        let config = ClientConfig::new("http://127.0.0.1:1");
        let service = RemoteExecutionService::new(config);
        service.stop();
        let func = service.parallel("basic_test.py", "primes", vec!["num"], 1);
        let err = func.call(vec![Value::Int(10001)]).unwrap_err();
        assert!(matches!(err, Error::EngineStopped));
    }
}
