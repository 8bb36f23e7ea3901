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

use std::sync::Arc;

use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use meta_relayer_types::{ProposalRecord, VoteReceipt, VrsSignature};
use meta_relayer_utils::{Error, Result};

use crate::contracts::{GovernanceToken, GovernorAlpha, SigRelayer};
use crate::ChainReader;

/// Where the three contracts the relayer reads from live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// The governance token (balances, delegates, nonces, checkpoints).
    pub token: Address,
    /// The relay contract that recovers signers from signatures.
    pub relay: Address,
    /// The governor holding proposals and vote receipts.
    pub governor: Address,
}

/// A [`ChainReader`] backed by an ethers HTTP provider.
#[derive(Clone)]
pub struct EthersChainReader {
    provider: Arc<Provider<Http>>,
    token: GovernanceToken<Provider<Http>>,
    relay: SigRelayer<Provider<Http>>,
    governor: GovernorAlpha<Provider<Http>>,
}

impl std::fmt::Debug for EthersChainReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersChainReader")
            .field("token", &self.token.address())
            .field("relay", &self.relay.address())
            .field("governor", &self.governor.address())
            .finish()
    }
}

impl EthersChainReader {
    /// Creates a new reader talking to the node at `endpoint`.
    pub fn new(endpoint: url::Url, addresses: ContractAddresses) -> Self {
        let provider = Arc::new(Provider::new(Http::new(endpoint)));
        Self {
            token: GovernanceToken::new(addresses.token, provider.clone()),
            relay: SigRelayer::new(addresses.relay, provider.clone()),
            governor: GovernorAlpha::new(addresses.governor, provider.clone()),
            provider,
        }
    }
}

fn non_zero(signer: Address) -> Result<Address> {
    if signer.is_zero() {
        Err(Error::ZeroSignatory)
    } else {
        Ok(signer)
    }
}

#[async_trait::async_trait]
impl ChainReader for EthersChainReader {
    #[tracing::instrument(skip(self, signature))]
    async fn recover_delegation_signer(
        &self,
        delegatee: Address,
        nonce: U256,
        expiry: U256,
        signature: &VrsSignature,
    ) -> Result<Address> {
        let signer = self
            .relay
            .signatory_from_delegate_sig(
                delegatee,
                nonce,
                expiry,
                signature.v,
                signature.r.to_fixed_bytes(),
                signature.s.to_fixed_bytes(),
            )
            .call()
            .await?;
        non_zero(signer)
    }

    #[tracing::instrument(skip(self, signature))]
    async fn recover_vote_signer(
        &self,
        proposal_id: U256,
        support: bool,
        signature: &VrsSignature,
    ) -> Result<Address> {
        let signer = self
            .relay
            .signatory_from_vote_sig(
                proposal_id,
                support,
                signature.v,
                signature.r.to_fixed_bytes(),
                signature.s.to_fixed_bytes(),
            )
            .call()
            .await?;
        non_zero(signer)
    }

    async fn token_balance_of(&self, account: Address) -> Result<U256> {
        let balance = self.token.balance_of(account).call().await?;
        Ok(balance)
    }

    async fn current_delegate_of(&self, account: Address) -> Result<Address> {
        let delegate = self.token.delegates(account).call().await?;
        Ok(delegate)
    }

    async fn required_nonce_of(&self, account: Address) -> Result<U256> {
        let nonce = self.token.nonces(account).call().await?;
        Ok(nonce)
    }

    async fn prior_voting_power(
        &self,
        account: Address,
        block: U256,
    ) -> Result<U256> {
        let votes = self.token.get_prior_votes(account, block).call().await?;
        Ok(U256::from(votes))
    }

    async fn proposal(&self, proposal_id: U256) -> Result<ProposalRecord> {
        let (
            id,
            _proposer,
            _eta,
            start_block,
            end_block,
            _for_votes,
            _against_votes,
            canceled,
            _executed,
        ) = self.governor.proposals(proposal_id).call().await?;
        Ok(ProposalRecord {
            id,
            start_block,
            end_block,
            canceled,
        })
    }

    async fn vote_receipt(
        &self,
        proposal_id: U256,
        voter: Address,
    ) -> Result<VoteReceipt> {
        let (has_voted, _support, _votes) =
            self.governor.get_receipt(proposal_id, voter).call().await?;
        Ok(VoteReceipt { has_voted })
    }

    async fn current_block_height(&self) -> Result<U256> {
        let height = self.provider.get_block_number().await?;
        Ok(U256::from(height.as_u64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_signer_is_rejected() {
        assert!(matches!(
            non_zero(Address::zero()),
            Err(Error::ZeroSignatory)
        ));
        let signer = Address::from_low_u64_be(7);
        assert_eq!(non_zero(signer).unwrap(), signer);
    }

    #[tokio::test]
    async fn unreachable_node_is_a_read_error() {
        let endpoint = url::Url::parse("http://127.0.0.1:9").unwrap();
        let reader = EthersChainReader::new(
            endpoint,
            ContractAddresses {
                token: Address::from_low_u64_be(1),
                relay: Address::from_low_u64_be(2),
                governor: Address::from_low_u64_be(3),
            },
        );
        assert!(reader.current_block_height().await.is_err());
        assert!(reader
            .token_balance_of(Address::from_low_u64_be(4))
            .await
            .is_err());
    }
}
