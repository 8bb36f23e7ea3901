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
//! Types shared across the relayer crates: the signed actions users submit,
//! the governance records read from chain, and config wrappers.

use ethers::types::U256;

/// Signed delegation and vote requests, and how they are parsed from JSON.
pub mod action;
/// Governance records returned by the chain.
pub mod chain;
/// A URL that can be read from an environment variable.
pub mod env_url;

pub use action::{
    ActionKind, DelegateRequest, ParseError, RawDelegateRequest,
    RawVoteRequest, VoteRequest, VrsSignature,
};
pub use chain::{ProposalRecord, VoteReceipt};
pub use env_url::EnvUrl;

/// The number of base units in one whole governance token (18 decimals).
pub fn one_token() -> U256 {
    U256::exp10(18)
}
