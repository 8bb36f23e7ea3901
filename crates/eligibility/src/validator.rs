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

use ethers::types::{Address, U256};
use meta_relayer_types::{
    one_token, DelegateRequest, ProposalRecord, VoteReceipt,
};

use crate::{AccessPolicy, ChainField, EligibilityRules, Ineligible, Rejection};

/// Blocks kept clear of a proposal's end block, so a queued vote still has
/// time to land on chain.
pub const END_BLOCK_MARGIN: u64 = 5;

/// The outcome of a single chain read.
pub type Fetched<T> = Result<T, ChainField>;

/// `Ok(())` admits the request.
pub type Decision = Result<(), Rejection>;

/// Chain state behind a `canDelegate` dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationSnapshot {
    /// Token balance of the signer.
    pub balance: Fetched<U256>,
    /// Who the signer currently delegates to.
    pub current_delegate: Fetched<Address>,
}

/// Chain state behind a delegation submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationSubmissionSnapshot {
    /// The nonce the token expects in the signer's next signature.
    pub required_nonce: Fetched<U256>,
    /// Token balance of the signer.
    pub balance: Fetched<U256>,
    /// Who the signer currently delegates to.
    pub current_delegate: Fetched<Address>,
}

/// Chain state behind a vote, read once the proposal itself is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSnapshot {
    /// The proposal, already matched against the requested id.
    pub proposal: ProposalRecord,
    /// Voting power of the signer at `proposal.start_block`.
    pub prior_votes: Fetched<U256>,
    /// The signer's receipt for this proposal.
    pub receipt: Fetched<VoteReceipt>,
    /// Chain height at the time of the request.
    pub current_block: Fetched<U256>,
}

/// Which vote flow is being decided. The two report the closed-window and
/// already-voted reasons in opposite order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteFlow {
    /// `GET /canVote`.
    DryRun,
    /// `POST /vote`.
    Submission,
}

/// Checks the supplied nonce against the one the token expects.
pub fn check_nonce(supplied: U256, required: Fetched<U256>) -> Decision {
    let required = required?;
    if supplied != required {
        return Err(Ineligible::NonceMismatch(required).into());
    }
    Ok(())
}

/// Accepts the fetched proposal only when it was read successfully and its
/// on-chain id is the one requested.
pub fn check_proposal(
    requested: U256,
    fetched: Fetched<ProposalRecord>,
) -> Result<ProposalRecord, Rejection> {
    let proposal = fetched?;
    if proposal.id != requested {
        tracing::debug!(
            %requested,
            found = %proposal.id,
            "proposal id mismatch",
        );
        return Err(ChainField::Proposal.into());
    }
    Ok(proposal)
}

/// Decides whether a signer may use the relayer, given a chain snapshot.
///
/// Every check short-circuits, so the rejection returned is always the first
/// one in the flow's order. The access policy is consulted after all chain
/// checks.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    access: AccessPolicy,
    rules: EligibilityRules,
}

impl Validator {
    /// Creates a validator from the startup configuration.
    pub fn new(access: AccessPolicy, rules: EligibilityRules) -> Self {
        Self { access, rules }
    }

    /// The access policy in force.
    pub fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// The eligibility switches in force.
    pub fn rules(&self) -> EligibilityRules {
        self.rules
    }

    /// The `canDelegate` dry run.
    ///
    /// Test mode does not relax the balance check here.
    pub fn check_delegation(
        &self,
        signer: &Address,
        snapshot: &DelegationSnapshot,
    ) -> Decision {
        let balance = snapshot.balance?;
        if balance < one_token() {
            return Err(Ineligible::InsufficientBalance.into());
        }
        snapshot.current_delegate?;
        self.access.check(signer)
    }

    /// A delegation submission: nonce, balance, current delegate, access.
    pub fn check_delegation_submission(
        &self,
        signer: &Address,
        request: &DelegateRequest,
        snapshot: &DelegationSubmissionSnapshot,
    ) -> Decision {
        check_nonce(request.nonce, snapshot.required_nonce)?;
        let balance = snapshot.balance?;
        if balance < one_token() && !self.rules.testing {
            return Err(Ineligible::InsufficientBalance.into());
        }
        let current_delegate = snapshot.current_delegate?;
        if current_delegate == request.delegatee && !self.rules.testing {
            return Err(Ineligible::AlreadyDelegating.into());
        }
        self.access.check(signer)
    }

    /// A vote, either dry run or submission.
    pub fn check_vote(
        &self,
        signer: &Address,
        snapshot: &VoteSnapshot,
        flow: VoteFlow,
    ) -> Decision {
        let prior_votes = snapshot.prior_votes?;
        let receipt = snapshot.receipt?;
        let current_block = snapshot.current_block?;

        if prior_votes < one_token() && !self.rules.testing {
            return Err(Ineligible::InsufficientVotingPower.into());
        }
        let open = !snapshot.proposal.canceled
            && snapshot
                .proposal
                .window_open_at(current_block, END_BLOCK_MARGIN);
        let window = || {
            if open {
                Ok(())
            } else {
                Err(Rejection::from(Ineligible::VotingUnavailable))
            }
        };
        let not_voted = || {
            if receipt.has_voted {
                Err(Rejection::from(Ineligible::AlreadyVoted))
            } else {
                Ok(())
            }
        };
        match flow {
            VoteFlow::DryRun => {
                window()?;
                not_voted()?;
            }
            VoteFlow::Submission => {
                not_voted()?;
                window()?;
            }
        }
        self.access.check(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_relayer_types::VrsSignature;

    fn signer() -> Address {
        Address::from_low_u64_be(0x5157)
    }

    fn delegatee() -> Address {
        Address::from_low_u64_be(0xde1e)
    }

    fn request(nonce: u64) -> DelegateRequest {
        DelegateRequest {
            delegatee: delegatee(),
            nonce: nonce.into(),
            expiry: 10_000_000_000u64.into(),
            signature: VrsSignature {
                v: 27,
                r: Default::default(),
                s: Default::default(),
            },
        }
    }

    fn healthy_submission() -> DelegationSubmissionSnapshot {
        DelegationSubmissionSnapshot {
            required_nonce: Ok(5.into()),
            balance: Ok(one_token()),
            current_delegate: Ok(Address::zero()),
        }
    }

    fn proposal() -> ProposalRecord {
        ProposalRecord {
            id: 42.into(),
            start_block: 1_000.into(),
            end_block: 2_000.into(),
            canceled: false,
        }
    }

    fn healthy_vote() -> VoteSnapshot {
        VoteSnapshot {
            proposal: proposal(),
            prior_votes: Ok(one_token()),
            receipt: Ok(VoteReceipt::default()),
            current_block: Ok(1_500.into()),
        }
    }

    fn testing() -> Validator {
        Validator::new(
            AccessPolicy::open(),
            EligibilityRules { testing: true },
        )
    }

    #[test]
    fn healthy_delegation_is_admitted() {
        let v = Validator::default();
        assert_eq!(
            v.check_delegation_submission(
                &signer(),
                &request(5),
                &healthy_submission()
            ),
            Ok(())
        );
    }

    #[test]
    fn stale_nonce_reports_the_required_one() {
        let v = Validator::default();
        let err = v
            .check_delegation_submission(
                &signer(),
                &request(4),
                &healthy_submission(),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "required nonce is 5");
    }

    #[test]
    fn balance_boundary_is_inclusive() {
        let v = Validator::default();
        let mut snapshot = healthy_submission();
        snapshot.balance = Ok(one_token() - 1);
        assert_eq!(
            v.check_delegation_submission(&signer(), &request(5), &snapshot),
            Err(Ineligible::InsufficientBalance.into())
        );
        snapshot.balance = Ok(one_token());
        assert!(v
            .check_delegation_submission(&signer(), &request(5), &snapshot)
            .is_ok());
    }

    #[test]
    fn balances_beyond_u128_compare_exactly() {
        let v = Validator::default();
        let mut snapshot = healthy_submission();
        snapshot.balance = Ok(U256::MAX);
        assert!(v
            .check_delegation_submission(&signer(), &request(5), &snapshot)
            .is_ok());
    }

    #[test]
    fn nonce_is_checked_before_balance_read() {
        let v = Validator::default();
        let snapshot = DelegationSubmissionSnapshot {
            required_nonce: Ok(5.into()),
            balance: Err(ChainField::TokenBalance),
            current_delegate: Err(ChainField::CurrentDelegate),
        };
        assert_eq!(
            v.check_delegation_submission(&signer(), &request(3), &snapshot),
            Err(Ineligible::NonceMismatch(5.into()).into())
        );
        assert_eq!(
            v.check_delegation_submission(&signer(), &request(5), &snapshot),
            Err(ChainField::TokenBalance.into())
        );
    }

    #[test]
    fn already_delegating_is_rejected_outside_test_mode() {
        let mut snapshot = healthy_submission();
        snapshot.current_delegate = Ok(delegatee());
        assert_eq!(
            Validator::default().check_delegation_submission(
                &signer(),
                &request(5),
                &snapshot
            ),
            Err(Ineligible::AlreadyDelegating.into())
        );
        assert!(testing()
            .check_delegation_submission(&signer(), &request(5), &snapshot)
            .is_ok());
    }

    #[test]
    fn test_mode_skips_submission_balance_but_not_dry_run_balance() {
        let poor = DelegationSubmissionSnapshot {
            balance: Ok(U256::zero()),
            ..healthy_submission()
        };
        assert!(testing()
            .check_delegation_submission(&signer(), &request(5), &poor)
            .is_ok());
        let dry = DelegationSnapshot {
            balance: Ok(U256::zero()),
            current_delegate: Ok(Address::zero()),
        };
        assert_eq!(
            testing().check_delegation(&signer(), &dry),
            Err(Ineligible::InsufficientBalance.into())
        );
    }

    #[test]
    fn dry_run_delegation_requires_the_delegate_read() {
        let dry = DelegationSnapshot {
            balance: Ok(one_token()),
            current_delegate: Err(ChainField::CurrentDelegate),
        };
        assert_eq!(
            Validator::default()
                .check_delegation(&signer(), &dry)
                .unwrap_err()
                .to_string(),
            "error fetching delegate"
        );
    }

    #[test]
    fn access_gate_comes_after_chain_checks() {
        let mut policy = AccessPolicy::restricted_to(Vec::<Address>::new());
        policy.message = String::from("beta only");
        let v = Validator::new(policy, EligibilityRules::default());
        let dry = DelegationSnapshot {
            balance: Ok(U256::one()),
            current_delegate: Ok(Address::zero()),
        };
        assert_eq!(
            v.check_delegation(&signer(), &dry),
            Err(Ineligible::InsufficientBalance.into())
        );
        let dry = DelegationSnapshot {
            balance: Ok(one_token()),
            ..dry
        };
        assert_eq!(
            v.check_delegation(&signer(), &dry),
            Err(Rejection::AccessRestricted("beta only".into()))
        );
    }

    #[test]
    fn proposal_id_must_match() {
        assert_eq!(check_proposal(42.into(), Ok(proposal())), Ok(proposal()));
        let err = check_proposal(43.into(), Ok(proposal())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "voting by signature is not available for this proposal"
        );
        assert_eq!(
            check_proposal(42.into(), Err(ChainField::Proposal)),
            Err(ChainField::Proposal.into())
        );
    }

    #[test]
    fn canceled_proposal_is_never_votable() {
        let mut snapshot = healthy_vote();
        snapshot.proposal.canceled = true;
        for v in [Validator::default(), testing()] {
            for flow in [VoteFlow::DryRun, VoteFlow::Submission] {
                assert_eq!(
                    v.check_vote(&signer(), &snapshot, flow),
                    Err(Ineligible::VotingUnavailable.into())
                );
            }
        }
    }

    #[test]
    fn window_keeps_five_blocks_clear_of_the_end() {
        let v = Validator::default();
        let mut snapshot = healthy_vote();
        snapshot.current_block = Ok(1_995.into());
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::DryRun),
            Err(Ineligible::VotingUnavailable.into())
        );
        snapshot.current_block = Ok(1_994.into());
        assert!(v.check_vote(&signer(), &snapshot, VoteFlow::DryRun).is_ok());
        snapshot.current_block = Ok(1_000.into());
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::Submission),
            Err(Ineligible::VotingUnavailable.into())
        );
    }

    #[test]
    fn voting_power_boundary_and_test_mode() {
        let mut snapshot = healthy_vote();
        snapshot.prior_votes = Ok(one_token() - 1);
        assert_eq!(
            Validator::default().check_vote(
                &signer(),
                &snapshot,
                VoteFlow::Submission
            ),
            Err(Ineligible::InsufficientVotingPower.into())
        );
        assert!(testing()
            .check_vote(&signer(), &snapshot, VoteFlow::Submission)
            .is_ok());
    }

    #[test]
    fn flows_disagree_on_voted_versus_closed() {
        let v = Validator::default();
        let snapshot = VoteSnapshot {
            receipt: Ok(VoteReceipt { has_voted: true }),
            current_block: Ok(3_000.into()),
            ..healthy_vote()
        };
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::DryRun),
            Err(Ineligible::VotingUnavailable.into())
        );
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::Submission),
            Err(Ineligible::AlreadyVoted.into())
        );
    }

    #[test]
    fn vote_read_failures_are_reported_in_order() {
        let v = Validator::default();
        let snapshot = VoteSnapshot {
            proposal: proposal(),
            prior_votes: Ok(U256::zero()),
            receipt: Err(ChainField::VoteReceipt),
            current_block: Err(ChainField::CurrentBlock),
        };
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::DryRun),
            Err(ChainField::VoteReceipt.into())
        );
        let snapshot = VoteSnapshot {
            prior_votes: Err(ChainField::PriorVotes),
            ..snapshot
        };
        assert_eq!(
            v.check_vote(&signer(), &snapshot, VoteFlow::DryRun)
                .unwrap_err()
                .to_string(),
            "error fetching prior votes"
        );
    }

    #[test]
    fn restricted_policy_gates_votes_after_chain_checks() {
        let mut policy = AccessPolicy::restricted_to([delegatee()]);
        policy.message = String::from("beta only");
        let v = Validator::new(policy, EligibilityRules::default());
        for flow in [VoteFlow::DryRun, VoteFlow::Submission] {
            assert_eq!(
                v.check_vote(&signer(), &healthy_vote(), flow),
                Err(Rejection::AccessRestricted("beta only".into()))
            );
            assert_eq!(v.check_vote(&delegatee(), &healthy_vote(), flow), Ok(()));
        }
        let mut voted = healthy_vote();
        voted.receipt = Ok(VoteReceipt { has_voted: true });
        assert_eq!(
            v.check_vote(&signer(), &voted, VoteFlow::Submission),
            Err(Ineligible::AlreadyVoted.into())
        );
    }
}
