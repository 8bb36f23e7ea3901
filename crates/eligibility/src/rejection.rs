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

use meta_relayer_types::ParseError;

/// The chain read that failed while gathering a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ChainField {
    /// `balanceOf(signer)` on the token.
    #[error("error fetching token balance")]
    TokenBalance,
    /// `delegates(signer)` on the token.
    #[error("error fetching delegate")]
    CurrentDelegate,
    /// `nonces(signer)` on the token.
    #[error("error fetching account nonce")]
    AccountNonce,
    /// `proposals(id)` on the governor, or a proposal whose id does not
    /// match the requested one.
    #[error("voting by signature is not available for this proposal")]
    Proposal,
    /// `getPriorVotes(signer, startBlock)` on the token.
    #[error("error fetching prior votes")]
    PriorVotes,
    /// `getReceipt(id, signer)` on the governor.
    #[error("error fetching vote receipt")]
    VoteReceipt,
    /// The current block number.
    #[error("error fetching current block")]
    CurrentBlock,
}

/// A signer that is well identified but not allowed to act for free.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    /// Token balance below one whole token.
    #[error("must have balance of at least 1 token to delegate for free")]
    InsufficientBalance,
    /// The signature commits to a stale or future nonce.
    #[error("required nonce is {0}")]
    NonceMismatch(ethers::types::U256),
    /// The signer already delegates to the requested delegatee.
    #[error("already delegating to given address")]
    AlreadyDelegating,
    /// The proposal is outside its voting window or was canceled.
    #[error("voting by signature is not available for this proposal")]
    VotingUnavailable,
    /// Voting power at the proposal's start block below one whole token.
    #[error("must have at least 1 token delegated to vote for free")]
    InsufficientVotingPower,
    /// The governor already holds a vote from the signer.
    #[error("already voted for this proposal")]
    AlreadyVoted,
}

/// Why a signed request was not admitted into the queue.
///
/// The `Display` output is the exact message sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// A required field is missing or has the wrong type.
    #[error("invalid input")]
    InvalidInput,
    /// The signature is malformed or recovers to no signer.
    #[error("invalid signature")]
    InvalidSignature,
    /// One of the chain reads failed or timed out.
    #[error(transparent)]
    ChainRead(#[from] ChainField),
    /// The chain state rules the request out.
    #[error(transparent)]
    Ineligible(#[from] Ineligible),
    /// Restricted mode is on and the signer is not on the allow-list.
    #[error("{0}")]
    AccessRestricted(String),
    /// The pending transaction store refused or failed the request.
    #[error("{0}")]
    Store(String),
}

impl From<ParseError> for Rejection {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::MalformedSignature => Rejection::InvalidSignature,
            ParseError::MissingField(_) | ParseError::InvalidField(_) => {
                Rejection::InvalidInput
            }
        }
    }
}
