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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use typed_builder::TypedBuilder;

use meta_relayer_chain_backends::{
    ChainReader, ContractAddresses, EthersChainReader,
};
use meta_relayer_config::MetaRelayerConfig;
use meta_relayer_eligibility::Validator;
use meta_relayer_notification_backends::{
    NoopNotifier, Notifier, WebhookNotifier,
};
use meta_relayer_store::{PendingTxStore, SledStore};

/// RelayerContext contains Relayer's configuration, its backends and
/// shutdown signal.
///
/// Tests build one with [`RelayerContext::builder`] and in-memory backends.
#[derive(Clone, TypedBuilder)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: MetaRelayerConfig,
    /// Eligibility rules, built once from `config`.
    #[builder(
        setter(skip),
        default = Arc::new(Validator::new(
            config.access.clone(),
            config.eligibility,
        ))
    )]
    validator: Arc<Validator>,
    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a graceful shutdown is initiated, a `()` value is sent via the
    /// broadcast::Sender and every subscribed task stops.
    #[builder(setter(skip), default = broadcast::channel(2).0)]
    notify_shutdown: broadcast::Sender<()>,
    /// The queue of admitted transactions.
    store: Arc<dyn PendingTxStore>,
    /// Read-only chain access.
    chain: Arc<dyn ChainReader>,
    /// Announces queued transactions.
    #[builder(default = Arc::new(NoopNotifier) as Arc<dyn Notifier>)]
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for RelayerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerContext")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl RelayerContext {
    /// Creates a new RelayerContext reading from the configured node and
    /// persisting to `store`.
    pub fn new(
        config: MetaRelayerConfig,
        store: SledStore,
    ) -> meta_relayer_utils::Result<Self> {
        let chain = EthersChainReader::new(
            config.evm.http_endpoint.as_url().clone(),
            ContractAddresses {
                token: config.evm.token_address,
                relay: config.evm.relay_address,
                governor: config.evm.governor_address,
            },
        );
        tracing::debug!(?chain, "chain reader ready");
        let notifier: Arc<dyn Notifier> =
            match config.notification.hook_url.clone() {
                Some(hook) => Arc::new(WebhookNotifier::new(hook)),
                None => Arc::new(NoopNotifier),
            };
        Ok(Self::builder()
            .config(config)
            .store(Arc::new(store))
            .chain(Arc::new(chain))
            .notifier(notifier)
            .build())
    }
    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }
    /// Sends a shutdown signal to all subscribed tasks/connections.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }

    /// Returns the pending transaction store.
    pub fn store(&self) -> Arc<dyn PendingTxStore> {
        self.store.clone()
    }

    /// Returns the chain reader.
    pub fn chain(&self) -> &dyn ChainReader {
        self.chain.as_ref()
    }

    /// Returns the notifier.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Returns the eligibility rules in force.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Upper bound on a single chain read.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.config.evm.rpc_timeout_ms)
    }

    /// Upper bound on a single store call.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.config.store_timeout_ms)
    }
}

/// Listens for the server shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the server
/// should shutdown.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }
}
