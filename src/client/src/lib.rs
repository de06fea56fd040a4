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

//! The client engine: per-function worker pools, a future-based call
//! facade, and a dedicated dispatch thread talking to the master and
//! workers over HTTP (spec §4.3).

pub mod dispatch;
pub mod engine;
pub mod future;
pub mod master_client;
pub mod pool;
pub mod worker_client;

pub use engine::{RemoteExecutionService, RemoteFunction};
pub use future::Future;
