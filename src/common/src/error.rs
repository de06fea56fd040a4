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

use thiserror::Error;

/// The error taxonomy shared across master, worker and client (spec §7).
///
/// `NetworkError` and `ProtocolError` are transport-level; `ResourceError`
/// and `RemoteExecutionError` carry a message back to the caller as a
/// Future's `failure` payload; `EngineStoppedError` is raised for calls into
/// a client engine after `stop()`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("network error contacting {target}: {source}")]
    Network {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("engine has been stopped")]
    EngineStopped,

    #[error("config error: {0}")]
    Config(String),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn network(target: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Network {
            target: target.into(),
            source,
        }
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
