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

//! The worker's registration heartbeat (spec §4.2): register on startup,
//! renew every `registration_interval`, retry on failure after
//! `failure_retry_interval`, and unregister on shutdown.

use std::time::Duration;

use clupy_common::util::encode_path_segment;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Client of the master's registration endpoints. Kept separate from
/// [`crate::execution::ExecutionService`] since it speaks to the master, not
/// to the worker's own callers.
#[derive(Clone)]
pub struct MasterClient {
    http: reqwest::Client,
    master_url: String,
}

impl MasterClient {
    pub fn new(master_url: impl Into<String>) -> Self {
        MasterClient {
            http: reqwest::Client::new(),
            master_url: master_url.into(),
        }
    }

    pub async fn register(&self, server_url: &str) -> clupy_common::Result<()> {
        let encoded = encode_path_segment(server_url);
        let url = format!("{}/register/{encoded}", self.master_url);
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| clupy_common::Error::network(&url, e))?;
        Ok(())
    }

    pub async fn unregister(&self, server_url: &str) -> clupy_common::Result<()> {
        let encoded = encode_path_segment(server_url);
        let url = format!("{}/unregister/{encoded}", self.master_url);
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| clupy_common::Error::network(&url, e))?;
        Ok(())
    }
}

/// Drives the heartbeat loop on the current tokio runtime. At most one
/// registration request is ever in flight: the loop awaits each attempt
/// before scheduling the next sleep, so overlapping timer firings cannot
/// happen by construction (spec §4.2).
///
/// Returns a join handle and a shutdown sender; dropping the loop early via
/// the sender issues a best-effort synchronous `unregister` before exiting.
pub fn start(
    client: MasterClient,
    server_url: String,
    registration_interval: Duration,
    failure_retry_interval: Duration,
) -> (JoinHandle<()>, oneshot::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let join_handle = tokio::spawn(async move {
        loop {
            let wait = match client.register(&server_url).await {
                Ok(()) => {
                    tracing::info!(server_url, "registered with master");
                    registration_interval
                }
                Err(err) => {
                    tracing::warn!(server_url, %err, "registration failed, retrying");
                    failure_retry_interval
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown_rx => {
                    if let Err(err) = client.unregister(&server_url).await {
                        tracing::warn!(server_url, %err, "unregister on shutdown failed");
                    } else {
                        tracing::info!(server_url, "unregistered on shutdown");
                    }
                    return;
                }
            }
        }
    });
    (join_handle, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_against_an_unreachable_master_is_a_network_error() {
        let client = MasterClient::new("http://127.0.0.1:1");
        let err = client.register("http://localhost:7877").await.unwrap_err();
        assert!(matches!(err, clupy_common::Error::Network { .. }));
    }
}
