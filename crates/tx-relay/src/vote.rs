use super::*;
use ethers::types::U256;
use meta_relayer_eligibility::{check_proposal, VoteFlow, VoteSnapshot};
use meta_relayer_types::action::{parse_address, parse_uint};
use meta_relayer_types::RawVoteRequest;

/// Reads the proposal, then the signer's voting power at its start block,
/// their receipt, and the current height.
async fn vote_snapshot(
    ctx: &RelayerContext,
    signer: Address,
    proposal_id: U256,
) -> Result<VoteSnapshot, Rejection> {
    let chain = ctx.chain();
    let fetched =
        read(ctx, ChainField::Proposal, chain.proposal(proposal_id)).await;
    let proposal = check_proposal(proposal_id, fetched)?;
    // voting power counts as of the proposal's start block, not now.
    let (prior_votes, receipt, current_block) = tokio::join!(
        read(
            ctx,
            ChainField::PriorVotes,
            chain.prior_voting_power(signer, proposal.start_block)
        ),
        read(
            ctx,
            ChainField::VoteReceipt,
            chain.vote_receipt(proposal_id, signer)
        ),
        read(ctx, ChainField::CurrentBlock, chain.current_block_height()),
    );
    Ok(VoteSnapshot {
        proposal,
        prior_votes,
        receipt,
        current_block,
    })
}

/// Handles `GET /canVote`: whether `address` could vote on `proposal_id`
/// for free right now.
///
/// # Arguments
///
/// * `ctx` - RelayerContext reference that holds the configuration
/// * `address` - The voter, as sent by the client
/// * `proposal_id` - The proposal, as sent by the client
pub async fn can_vote(
    ctx: &RelayerContext,
    address: Option<&str>,
    proposal_id: Option<&str>,
) -> Outcome {
    let signer = address.and_then(parse_address);
    let proposal_id = proposal_id.and_then(parse_uint);
    let outcome = match (signer, proposal_id) {
        (Some(signer), Some(proposal_id)) => {
            check_vote(ctx, signer, proposal_id).await
        }
        _ => Err(Rejection::InvalidInput),
    };
    observe("canVote", signer.as_ref(), &outcome);
    outcome
}

async fn check_vote(
    ctx: &RelayerContext,
    signer: Address,
    proposal_id: U256,
) -> Outcome {
    let snapshot = vote_snapshot(ctx, signer, proposal_id).await?;
    ctx.validator()
        .check_vote(&signer, &snapshot, VoteFlow::DryRun)?;
    with_store(ctx, "checking pending votes", move |store| {
        store.vote_allowed(signer, proposal_id)
    })
    .await?;
    Ok(VOTING_ALLOWED)
}

/// Handles `POST /vote`: validates a signed vote and queues it.
///
/// # Arguments
///
/// * `ctx` - RelayerContext reference that holds the configuration
/// * `raw` - The request body
pub async fn submit_vote(ctx: &RelayerContext, raw: RawVoteRequest) -> Outcome {
    let request = match raw.parse() {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(%e, "unparseable vote");
            let outcome = Err(Rejection::from(e));
            observe("vote", None, &outcome);
            return outcome;
        }
    };
    let signer = match recover(
        ctx,
        ctx.chain().recover_vote_signer(
            request.proposal_id,
            request.support,
            &request.signature,
        ),
    )
    .await
    {
        Ok(signer) => signer,
        Err(reason) => {
            let outcome = Err(reason);
            observe("vote", None, &outcome);
            return outcome;
        }
    };
    tracing::trace!(?signer, proposal_id = %request.proposal_id, "vote signer");

    let outcome = match vote_snapshot(ctx, signer, request.proposal_id).await {
        Ok(snapshot) => {
            match ctx.validator().check_vote(
                &signer,
                &snapshot,
                VoteFlow::Submission,
            ) {
                Ok(()) => {
                    enqueue(
                        ctx,
                        signer,
                        SignedAction::Vote(request),
                        VOTE_NOTIFICATION,
                    )
                    .await
                }
                Err(reason) => Err(reason),
            }
        }
        Err(reason) => Err(reason),
    };
    observe("vote", Some(&signer), &outcome);
    outcome
}
