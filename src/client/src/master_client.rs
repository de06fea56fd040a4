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

//! HTTP client for the master's `alloc`/`retain` endpoints (spec §6). `info`
//! is not needed by the dispatch loop and is intentionally omitted here.

use clupy_common::value;
use clupy_common::{Error, Result};

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

    /// `allocate(client_id, requested_count)` (spec §4.1, §4.3 step 1).
    /// Surfaces a 406 as [`Error::Resource`], everything else as
    /// [`Error::Network`] or [`Error::Protocol`].
    pub async fn allocate(&self, client_id: &str, requested_count: usize) -> Result<Vec<String>> {
        let url = format!("{}/alloc/{client_id}/{requested_count}", self.master_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::network(&url, e))?;

        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Resource(body));
        }
        if !response.status().is_success() {
            return Err(Error::Protocol(format!(
                "unexpected status {} from {url}",
                response.status()
            )));
        }
        let bytes = response.bytes().await.map_err(|e| Error::network(&url, e))?;
        value::decode(&bytes)
    }

    /// `retain(client_id, to_free, worker_list)` (spec §4.1, §4.3 step 4).
    pub async fn retain(&self, client_id: &str, to_free: bool, worker_list: &[String]) -> Result<()> {
        let flag = if to_free { "1" } else { "0" };
        let url = format!("{}/retain/{client_id}/{flag}", self.master_url);
        let body = value::encode(&worker_list.to_vec())?;
        let response = self
            .http
            .get(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::network(&url, e))?;
        if !response.status().is_success() {
            return Err(Error::Protocol(format!(
                "unexpected status {} from {url}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocate_against_an_unreachable_master_is_a_network_error() {
        let client = MasterClient::new("http://127.0.0.1:1");
        let err = client.allocate("client1:1", 1).await.unwrap_err();
        assert!(matches!(err, Error::Network { .. }));
    }
}
