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

//! # Relayer Store Module 🕸️
//!
//! A module for managing the queue of signed requests waiting to be
//! submitted on chain.
//!
//! ## Overview
//!
//! Every admitted delegation or vote becomes a [`QueuedTransaction`]. The
//! store refuses a second pending delegation from the same signer, and a
//! second pending vote from the same signer on the same proposal. That check
//! happens inside [`PendingTxStore::insert_tx`], atomically with the insert,
//! so two concurrent identical requests can never both be queued.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use meta_relayer_types::{ActionKind, DelegateRequest, VoteRequest};
use meta_relayer_utils::QueueConflict;
use serde::{Deserialize, Serialize};

pub use meta_relayer_utils::Result;

/// A module for managing in-memory storage of the relayer.
pub mod mem;
/// A module for setting up and managing a [Sled](https://sled.rs)-based database.
#[cfg(feature = "sled")]
pub mod sled;

/// A store that uses in memory data structures as the backend.
pub use mem::InMemoryStore;
/// A store that uses [`sled`](https://sled.rs) as the backend.
#[cfg(feature = "sled")]
pub use self::sled::SledStore;

/// The signed payload of a queued transaction, tagged by its `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignedAction {
    /// A `delegateBySig` request.
    Delegate(DelegateRequest),
    /// A `castVoteBySig` request.
    Vote(VoteRequest),
}

impl SignedAction {
    /// The kind of action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Delegate(_) => ActionKind::Delegate,
            Self::Vote(_) => ActionKind::Vote,
        }
    }
}

/// An admitted request, before the store gives it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The recovered signer.
    pub from: Address,
    /// What was signed.
    pub action: SignedAction,
    /// When the request was admitted.
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    /// A new transaction admitted now.
    pub fn now(from: Address, action: SignedAction) -> Self {
        Self {
            from,
            action,
            created_at: Utc::now(),
        }
    }
}

/// A request waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTransaction {
    /// Store assigned id.
    pub id: u64,
    /// The recovered signer.
    pub from: Address,
    /// What was signed.
    #[serde(flatten)]
    pub action: SignedAction,
    /// When the request was admitted.
    pub created_at: DateTime<Utc>,
    /// Set once the execution side has submitted the transaction.
    pub executed: bool,
}

impl QueuedTransaction {
    /// Turns an admitted request into a pending record.
    pub fn from_new(id: u64, tx: NewTransaction) -> Self {
        Self {
            id,
            from: tx.from,
            action: tx.action,
            created_at: tx.created_at,
            executed: false,
        }
    }
}

/// The key under which a pending action blocks duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingKey {
    /// At most one pending delegation per signer.
    Delegation {
        /// The signer.
        from: Address,
    },
    /// At most one pending vote per signer and proposal.
    Vote {
        /// The signer.
        from: Address,
        /// The proposal voted on.
        proposal_id: U256,
    },
}

impl PendingKey {
    /// The key a new transaction would occupy.
    pub fn of(from: Address, action: &SignedAction) -> Self {
        match action {
            SignedAction::Delegate(_) => Self::Delegation { from },
            SignedAction::Vote(vote) => Self::Vote {
                from,
                proposal_id: vote.proposal_id,
            },
        }
    }

    /// The error returned when this key is already taken.
    pub fn conflict(&self) -> QueueConflict {
        match self {
            Self::Delegation { .. } => QueueConflict::DelegationPending,
            Self::Vote { .. } => QueueConflict::VotePending,
        }
    }
}

impl std::fmt::Display for PendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delegation { from } => write!(f, "delegate/{from:?}"),
            Self::Vote { from, proposal_id } => {
                write!(f, "vote/{from:?}/{proposal_id}")
            }
        }
    }
}

/// The queue of admitted requests.
pub trait PendingTxStore: Send + Sync + Debug {
    /// Fails with [`QueueConflict::DelegationPending`] while a delegation
    /// from `signer` is pending.
    fn delegation_allowed(&self, signer: Address) -> Result<()> {
        self.key_free(PendingKey::Delegation { from: signer })
    }

    /// Fails with [`QueueConflict::VotePending`] while a vote from `signer`
    /// on `proposal_id` is pending.
    fn vote_allowed(&self, signer: Address, proposal_id: U256) -> Result<()> {
        self.key_free(PendingKey::Vote {
            from: signer,
            proposal_id,
        })
    }

    /// Fails with the key's conflict while it is taken.
    fn key_free(&self, key: PendingKey) -> Result<()>;

    /// Queues `tx` unless its [`PendingKey`] is taken. The check and the
    /// insert happen atomically.
    fn insert_tx(&self, tx: NewTransaction) -> Result<QueuedTransaction>;

    /// Looks up a transaction by id, executed or not.
    fn get_tx(&self, id: u64) -> Result<Option<QueuedTransaction>>;

    /// Every transaction not yet executed, oldest first.
    fn pending_txs(&self) -> Result<Vec<QueuedTransaction>>;

    /// Marks a transaction as executed, freeing its [`PendingKey`].
    fn mark_executed(&self, id: u64) -> Result<QueuedTransaction>;
}

impl<S> PendingTxStore for Arc<S>
where
    S: PendingTxStore + ?Sized,
{
    fn key_free(&self, key: PendingKey) -> Result<()> {
        S::key_free(self, key)
    }

    fn insert_tx(&self, tx: NewTransaction) -> Result<QueuedTransaction> {
        S::insert_tx(self, tx)
    }

    fn get_tx(&self, id: u64) -> Result<Option<QueuedTransaction>> {
        S::get_tx(self, id)
    }

    fn pending_txs(&self) -> Result<Vec<QueuedTransaction>> {
        S::pending_txs(self)
    }

    fn mark_executed(&self, id: u64) -> Result<QueuedTransaction> {
        S::mark_executed(self, id)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use meta_relayer_types::VrsSignature;

    pub fn signature() -> VrsSignature {
        VrsSignature {
            v: 27,
            r: Default::default(),
            s: Default::default(),
        }
    }

    pub fn delegation(from: u64) -> NewTransaction {
        NewTransaction::now(
            Address::from_low_u64_be(from),
            SignedAction::Delegate(DelegateRequest {
                delegatee: Address::from_low_u64_be(0xde1e),
                nonce: U256::zero(),
                expiry: U256::from(u64::MAX),
                signature: signature(),
            }),
        )
    }

    pub fn vote(from: u64, proposal_id: u64) -> NewTransaction {
        NewTransaction::now(
            Address::from_low_u64_be(from),
            SignedAction::Vote(VoteRequest {
                proposal_id: proposal_id.into(),
                support: true,
                signature: signature(),
            }),
        )
    }
}
