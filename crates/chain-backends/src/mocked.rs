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

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ethers::types::{Address, U256};
use meta_relayer_types::{ProposalRecord, VoteReceipt, VrsSignature};
use meta_relayer_utils::{Error, Result};
use parking_lot::RwLock;

use crate::ChainReader;

/// A call that can be made to fail on a [`MockedChainReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockedCall {
    /// Both signer recovery calls.
    Recovery,
    /// `balanceOf`.
    TokenBalance,
    /// `delegates`.
    CurrentDelegate,
    /// `nonces`.
    AccountNonce,
    /// `getPriorVotes`.
    PriorVotes,
    /// `proposals`.
    Proposal,
    /// `getReceipt`.
    VoteReceipt,
    /// `eth_blockNumber`.
    CurrentBlock,
}

#[derive(Debug, Default)]
struct MockedState {
    signer: Option<Address>,
    balances: HashMap<Address, U256>,
    delegates: HashMap<Address, Address>,
    nonces: HashMap<Address, U256>,
    prior_votes: HashMap<(Address, U256), U256>,
    proposals: HashMap<U256, ProposalRecord>,
    voted: HashSet<(U256, Address)>,
    block: U256,
    failing: HashSet<MockedCall>,
    latency: Option<Duration>,
    prior_votes_blocks: Vec<U256>,
}

/// An in-memory chain.
///
/// Signer recovery returns whatever signer was configured with
/// [`MockedChainReader::recovers`], or fails when none was. Every read other
/// than recovery is counted, so tests can assert that nothing touched the
/// chain.
#[derive(Debug, Default)]
pub struct MockedChainReader {
    state: RwLock<MockedState>,
    reads: AtomicUsize,
}

impl MockedChainReader {
    /// Creates an empty chain at block zero that recovers no signer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes signer recovery return `signer`.
    pub fn recovers(&self, signer: Address) -> &Self {
        self.state.write().signer = Some(signer);
        self
    }

    /// Sets the token balance of `account`.
    pub fn set_balance(&self, account: Address, balance: U256) -> &Self {
        self.state.write().balances.insert(account, balance);
        self
    }

    /// Sets who `account` delegates to.
    pub fn set_delegate(&self, account: Address, delegate: Address) -> &Self {
        self.state.write().delegates.insert(account, delegate);
        self
    }

    /// Sets the nonce the token expects from `account`.
    pub fn set_nonce(&self, account: Address, nonce: U256) -> &Self {
        self.state.write().nonces.insert(account, nonce);
        self
    }

    /// Sets the voting power of `account` as of `block`. Other blocks report
    /// zero.
    pub fn set_prior_votes(
        &self,
        account: Address,
        block: U256,
        votes: U256,
    ) -> &Self {
        self.state
            .write()
            .prior_votes
            .insert((account, block), votes);
        self
    }

    /// Registers a proposal under its own id.
    pub fn add_proposal(&self, proposal: ProposalRecord) -> &Self {
        self.state.write().proposals.insert(proposal.id, proposal);
        self
    }

    /// Records a vote by `voter` on `proposal_id`.
    pub fn set_voted(&self, proposal_id: U256, voter: Address) -> &Self {
        self.state.write().voted.insert((proposal_id, voter));
        self
    }

    /// Moves the chain to `block`.
    pub fn set_block(&self, block: U256) -> &Self {
        self.state.write().block = block;
        self
    }

    /// Makes `call` fail from now on.
    pub fn fail(&self, call: MockedCall) -> &Self {
        self.state.write().failing.insert(call);
        self
    }

    /// Delays every read by `latency`.
    pub fn with_latency(&self, latency: Duration) -> &Self {
        self.state.write().latency = Some(latency);
        self
    }

    /// Number of reads served so far, recovery excluded.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The blocks `getPriorVotes` was asked about, in call order.
    pub fn prior_votes_blocks(&self) -> Vec<U256> {
        self.state.read().prior_votes_blocks.clone()
    }

    async fn enter(&self, call: MockedCall) -> Result<()> {
        if call != MockedCall::Recovery {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        let (latency, failing) = {
            let state = self.state.read();
            (state.latency, state.failing.contains(&call))
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if failing {
            tracing::debug!(?call, "mocked chain call fails");
            return Err(Error::Generic("mocked chain call failed"));
        }
        Ok(())
    }

    fn recovered(&self) -> Result<Address> {
        self.state.read().signer.ok_or(Error::ZeroSignatory)
    }
}

#[async_trait::async_trait]
impl ChainReader for MockedChainReader {
    async fn recover_delegation_signer(
        &self,
        _delegatee: Address,
        _nonce: U256,
        _expiry: U256,
        _signature: &VrsSignature,
    ) -> Result<Address> {
        self.enter(MockedCall::Recovery).await?;
        self.recovered()
    }

    async fn recover_vote_signer(
        &self,
        _proposal_id: U256,
        _support: bool,
        _signature: &VrsSignature,
    ) -> Result<Address> {
        self.enter(MockedCall::Recovery).await?;
        self.recovered()
    }

    async fn token_balance_of(&self, account: Address) -> Result<U256> {
        self.enter(MockedCall::TokenBalance).await?;
        let state = self.state.read();
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    async fn current_delegate_of(&self, account: Address) -> Result<Address> {
        self.enter(MockedCall::CurrentDelegate).await?;
        let state = self.state.read();
        Ok(state.delegates.get(&account).copied().unwrap_or_default())
    }

    async fn required_nonce_of(&self, account: Address) -> Result<U256> {
        self.enter(MockedCall::AccountNonce).await?;
        let state = self.state.read();
        Ok(state.nonces.get(&account).copied().unwrap_or_default())
    }

    async fn prior_voting_power(
        &self,
        account: Address,
        block: U256,
    ) -> Result<U256> {
        self.enter(MockedCall::PriorVotes).await?;
        let mut state = self.state.write();
        state.prior_votes_blocks.push(block);
        Ok(state
            .prior_votes
            .get(&(account, block))
            .copied()
            .unwrap_or_default())
    }

    async fn proposal(&self, proposal_id: U256) -> Result<ProposalRecord> {
        self.enter(MockedCall::Proposal).await?;
        let state = self.state.read();
        Ok(state.proposals.get(&proposal_id).copied().unwrap_or(
            ProposalRecord {
                id: U256::zero(),
                start_block: U256::zero(),
                end_block: U256::zero(),
                canceled: false,
            },
        ))
    }

    async fn vote_receipt(
        &self,
        proposal_id: U256,
        voter: Address,
    ) -> Result<VoteReceipt> {
        self.enter(MockedCall::VoteReceipt).await?;
        let state = self.state.read();
        Ok(VoteReceipt {
            has_voted: state.voted.contains(&(proposal_id, voter)),
        })
    }

    async fn current_block_height(&self) -> Result<U256> {
        self.enter(MockedCall::CurrentBlock).await?;
        Ok(self.state.read().block)
    }
}
