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

//! YAML-shaped configuration for each process role (spec §6). Loading is
//! intentionally simple: one file, serde defaults for absent keys, no
//! hot-reload or multi-source merging (the loader's sophistication is out of
//! scope per spec §1 — only the shape of the config is ours to define).

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_master_port() -> u16 {
    7878
}

fn default_registration_ttl() -> u64 {
    300
}

fn default_reservation_ttl() -> u64 {
    300
}

fn default_maintenance_period() -> u64 {
    30
}

fn default_server_request_count() -> usize {
    10
}

/// Configuration for the master process.
#[derive(Debug, Clone, Deserialize)]
pub struct MasterConfig {
    #[serde(default = "default_master_port")]
    pub port: u16,
    #[serde(default = "default_registration_ttl")]
    pub registration_ttl: u64,
    #[serde(default = "default_reservation_ttl")]
    pub reservation_ttl: u64,
    #[serde(default = "default_maintenance_period")]
    pub maintenance_period: u64,
    #[serde(default = "default_server_request_count")]
    pub default_server_request_count: usize,
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            port: default_master_port(),
            registration_ttl: default_registration_ttl(),
            reservation_ttl: default_reservation_ttl(),
            maintenance_period: default_maintenance_period(),
            default_server_request_count: default_server_request_count(),
        }
    }
}

fn default_worker_port() -> u16 {
    7877
}

fn default_registration_interval() -> u64 {
    60
}

fn default_failure_retry_interval() -> u64 {
    5
}

/// Configuration for a worker process.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_port")]
    pub port: u16,
    pub server_url: String,
    pub master_url: String,
    #[serde(default = "default_registration_interval")]
    pub registration_interval: u64,
    #[serde(default = "default_failure_retry_interval")]
    pub failure_retry_interval: u64,
}

/// Configuration for the client engine. Unlike the master/worker configs
/// this is never loaded from a file: `master_url` is set by the embedding
/// program's API call and `client_id` is computed once per process
/// (`<hostname>:<pid>`, spec §6/glossary).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub master_url: String,
    pub client_id: String,
}

impl ClientConfig {
    pub fn new(master_url: impl Into<String>) -> Self {
        ClientConfig {
            master_url: crate::util::normalize_url(&master_url.into()),
            client_id: crate::util::client_id(),
        }
    }
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
        Error::Config(format!("reading {}: {e}", path.display()))
    })?;
    serde_yaml::from_str(&contents).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
        Error::Config(format!("parsing {}: {e}", path.display()))
    })
}

impl MasterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path.as_ref())
    }

    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }
}

impl WorkerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path.as_ref())
    }

    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }
}
