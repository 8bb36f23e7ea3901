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

//! Chain Backends
//!
//! A chain backend answers the handful of read-only questions the relayer
//! asks about a signer before it queues one of their signatures: who signed
//! it, what they hold, who they delegate to, and where a proposal stands.
//!
//! As of now, the following backends are supported:
//! - [`EthersChainReader`], talking to an EVM node over HTTP.
//! - [`MockedChainReader`], an in-memory chain used by tests.
//!
//! ## Usage
//! ```rust,ignore
//! use meta_relayer_chain_backends::{ChainReader, ContractAddresses, EthersChainReader};
//! let reader = EthersChainReader::new(endpoint, addresses);
//! let height = reader.current_block_height().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use ethers::types::{Address, U256};
use meta_relayer_types::{ProposalRecord, VoteReceipt, VrsSignature};
use meta_relayer_utils::Result;

/// Contract bindings.
mod contracts;
/// The ethers backend.
mod ethers_reader;
/// An in-memory chain.
mod mocked;

pub use ethers_reader::{ContractAddresses, EthersChainReader};
pub use mocked::{MockedCall, MockedChainReader};

/// Read-only view of the governance contracts.
///
/// Every method is a single call against current chain state. Nothing is
/// cached between calls.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Recovers who signed a `delegateBySig` message, using the relay
    /// contract.
    ///
    /// # Arguments
    ///
    /// * `delegatee` - The address the signer delegates to.
    /// * `nonce` - The nonce the signature commits to.
    /// * `expiry` - The expiry the signature commits to.
    /// * `signature` - The `(v, r, s)` triple.
    async fn recover_delegation_signer(
        &self,
        delegatee: Address,
        nonce: U256,
        expiry: U256,
        signature: &VrsSignature,
    ) -> Result<Address>;

    /// Recovers who signed a `castVoteBySig` message, using the relay
    /// contract.
    async fn recover_vote_signer(
        &self,
        proposal_id: U256,
        support: bool,
        signature: &VrsSignature,
    ) -> Result<Address>;

    /// Token balance of `account`.
    async fn token_balance_of(&self, account: Address) -> Result<U256>;

    /// The address `account` currently delegates to.
    async fn current_delegate_of(&self, account: Address) -> Result<Address>;

    /// The nonce the token expects in the next signature from `account`.
    async fn required_nonce_of(&self, account: Address) -> Result<U256>;

    /// Voting power of `account` as of `block`.
    async fn prior_voting_power(
        &self,
        account: Address,
        block: U256,
    ) -> Result<U256>;

    /// The governor's record for `proposal_id`. Unknown proposals come back
    /// zeroed rather than as an error.
    async fn proposal(&self, proposal_id: U256) -> Result<ProposalRecord>;

    /// Whether `voter` has already voted on `proposal_id`.
    async fn vote_receipt(
        &self,
        proposal_id: U256,
        voter: Address,
    ) -> Result<VoteReceipt>;

    /// The latest block number.
    async fn current_block_height(&self) -> Result<U256>;
}
