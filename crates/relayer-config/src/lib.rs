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

//! # Relayer Configuration Module 🕸️
//!
//! A module for configuring the relayer.
//!
//! ## Overview
//!
//! The relayer configuration module is responsible for configuring the relayer.
//! Possible configuration include:
//! * `port`: The port the relayer will listen on. Defaults to 9955
//! * `evm`: The node to read from and the three contracts the relayer reads.
//! * `access`: The restricted-access gate and its allow-list.
//! * `eligibility`: Test mode, which relaxes some of the eligibility checks.
//! * `notification`: Where to announce newly queued transactions.
//!
//! See [config/example](../../config/example) for an example.

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Utils for processing configuration
pub mod utils;

use ethers::types::Address;
use meta_relayer_eligibility::{AccessPolicy, EligibilityRules};
use meta_relayer_types::EnvUrl;
use serde::{Deserialize, Serialize};

/// The default port the relayer will listen on. Defaults to 9955.
const fn default_port() -> u16 {
    9955
}
/// Each chain read gets `5_000` ms by default.
const fn default_rpc_timeout_ms() -> u64 {
    5_000
}
/// Each store call gets `2_000` ms by default.
const fn default_store_timeout_ms() -> u64 {
    2_000
}
/// The body of `GET /`.
fn default_greeting() -> String {
    String::from(
        "Welcome to the meta-transaction relayer. POST signed delegations to /delegate and signed votes to /vote.",
    )
}

/// MetaRelayerConfig is the configuration for the meta-transaction relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetaRelayerConfig {
    /// HTTP Server Port number
    ///
    /// default to 9955
    #[serde(default = "default_port", skip_serializing)]
    pub port: u16,
    /// The node and contracts to read chain state from.
    pub evm: EvmConfig,
    /// Upper bound on a single call to the pending transaction store, in
    /// milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// The restricted-access gate.
    #[serde(default)]
    pub access: AccessPolicy,
    /// Switches relaxing the eligibility checks.
    #[serde(default)]
    pub eligibility: EligibilityRules,
    /// Where to announce queued transactions.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// The message returned by `GET /`.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

/// EvmConfig is the configuration for reading from the governance contracts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvmConfig {
    /// Http(s) Endpoint for quick Req/Res.
    ///
    /// Either a URL or `$VAR` naming an environment variable holding one.
    #[serde(skip_serializing)]
    pub http_endpoint: EnvUrl,
    /// The governance token.
    pub token_address: Address,
    /// The relay contract recovering signers from signatures.
    pub relay_address: Address,
    /// The governor holding proposals and receipts.
    pub governor_address: Address,
    /// Upper bound on a single chain read, in milliseconds.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

/// NotificationConfig configures the announcement of queued transactions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationConfig {
    /// The message is appended to this URL, urlencoded, and the result is
    /// fetched with `GET`. No hook means no notifications.
    #[serde(default, skip_serializing)]
    pub hook_url: Option<EnvUrl>,
}
