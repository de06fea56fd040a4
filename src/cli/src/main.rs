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

//! Process entry point for the master and worker roles. Out of core scope
//! (spec §1) but still needed to run the system end to end.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clupy_common::config::{MasterConfig, WorkerConfig};

#[derive(Parser)]
#[command(name = "clupy", version, about = "Distributed compute framework processes")]
struct Cli {
    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Run the membership registry and lease allocator.
    Master {
        #[arg(long, default_value = "clupy.master.yaml")]
        config: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the registration heartbeat and execution endpoints.
    Worker {
        #[arg(long, default_value = "clupy.server.yaml")]
        config: String,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.role {
        Role::Master { config, port } => run_master(&config, port).await,
        Role::Worker { config, port } => run_worker(&config, port).await,
    }
}

async fn run_master(config_path: &str, port_override: Option<u16>) -> Result<()> {
    let mut config = if MasterConfig::exists(config_path) {
        MasterConfig::load(config_path).with_context(|| format!("loading {config_path}"))?
    } else {
        tracing::warn!(config_path, "no config file found, using defaults");
        MasterConfig::default()
    };
    if let Some(port) = port_override {
        config.port = port;
    }

    let (registry, router) = clupy_master::build(&config);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding master to port {}", config.port))?;
    tracing::info!(port = config.port, "master listening");

    let (maintenance_handle, maintenance_shutdown) = clupy_master::spawn_maintenance(registry, &config);
    let serve_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::error!(%err, "master server exited with an error");
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutting down master");

    serve_handle.abort();
    let _ = maintenance_shutdown.send(());
    let _ = maintenance_handle.await;
    Ok(())
}

async fn run_worker(config_path: &str, port_override: Option<u16>) -> Result<()> {
    let mut config = WorkerConfig::load(config_path).with_context(|| format!("loading {config_path}"))?;
    if let Some(port) = port_override {
        config.port = port;
    }

    let router = clupy_worker::build();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding worker to port {}", config.port))?;
    tracing::info!(port = config.port, "worker listening");

    let (heartbeat_handle, heartbeat_shutdown) = clupy_worker::spawn_heartbeat(&config);
    let serve_handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::error!(%err, "worker server exited with an error");
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutting down worker");

    serve_handle.abort();
    let _ = heartbeat_shutdown.send(());
    let _ = heartbeat_handle.await;
    Ok(())
}

