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
//! # Eligibility rules
//!
//! Pure decision logic for signed delegation and vote requests. Nothing in
//! this crate performs I/O: the intake pipeline fetches a snapshot of chain
//! state, hands it to a [`Validator`], and gets back either `Ok(())` or the
//! first [`Rejection`] in the order the relayer has always reported them.

mod access;
mod rejection;
mod validator;

pub use access::{AccessPolicy, EligibilityRules};
pub use rejection::{ChainField, Ineligible, Rejection};
pub use validator::{
    check_nonce, check_proposal, Decision, DelegationSnapshot,
    DelegationSubmissionSnapshot, Fetched, Validator, VoteFlow, VoteSnapshot,
    END_BLOCK_MARGIN,
};
