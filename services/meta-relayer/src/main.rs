// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Meta Relayer Binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;
use tokio::signal::unix;

use meta_relayer_config::cli::{create_store, load_config, setup_logger, Opts};
use meta_relayer_context::RelayerContext;

/// In-flight requests get this long to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The main entry point for the relayer.
///
/// # Arguments
///
/// * `args` - The command line arguments.
#[paw::main]
#[tokio::main]
async fn main(args: Opts) -> anyhow::Result<()> {
    setup_logger(args.verbose)?;
    match dotenv::dotenv() {
        Ok(_) => {
            tracing::trace!("Loaded .env file");
        }
        Err(e) => {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    // The configuration is validated and configured from the given directory
    let config = load_config(args.config_dir.clone())?;

    // persistent storage for the relayer
    let store = create_store(&args).await?;

    // The RelayerContext takes a configuration and the store, and builds the
    // chain reader and notifier that live for the lifetime of the relayer.
    let ctx = RelayerContext::new(config, store)?;

    let (addr, server) =
        meta_relayer::service::build_web_services(ctx.clone())?;
    tracing::info!("Starting the server on {}", addr);
    // start the server.
    let mut server_handle = tokio::spawn(server);
    tracing::event!(
        target: meta_relayer_utils::probe::TARGET,
        tracing::Level::DEBUG,
        kind = %meta_relayer_utils::probe::Kind::Lifecycle,
        started = true
    );
    // watch for signals
    let mut ctrlc_signal = unix::signal(unix::SignalKind::interrupt())?;
    let mut termination_signal = unix::signal(unix::SignalKind::terminate())?;
    let mut quit_signal = unix::signal(unix::SignalKind::quit())?;
    tokio::select! {
        _ = ctrlc_signal.recv() => {
            tracing::warn!("Interrupted (Ctrl+C) ...");
        },
        _ = termination_signal.recv() => {
            tracing::warn!("Got Terminate signal ...");
        },
        _ = quit_signal.recv() => {
            tracing::warn!("Quitting ...");
        },
        res = &mut server_handle => {
            // the server only returns on its own when it failed.
            res??;
            return Ok(());
        },
    }
    tracing::event!(
        target: meta_relayer_utils::probe::TARGET,
        tracing::Level::DEBUG,
        kind = %meta_relayer_utils::probe::Kind::Lifecycle,
        shutdown = true
    );
    tracing::warn!("Shutting down...");
    // send shutdown signal to all of the application.
    ctx.shutdown();
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut server_handle).await {
        Ok(res) => res??,
        Err(_) => {
            tracing::warn!("Requests still running, aborting the server");
            server_handle.abort();
        }
    }
    tracing::info!("Clean Exit ..");
    Ok(())
}
