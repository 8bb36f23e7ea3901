use super::*;
use meta_relayer_eligibility::{DelegationSnapshot, DelegationSubmissionSnapshot};
use meta_relayer_types::action::parse_address;
use meta_relayer_types::RawDelegateRequest;

/// Handles `GET /canDelegate`: whether `address` could delegate for free
/// right now.
///
/// # Arguments
///
/// * `ctx` - RelayerContext reference that holds the configuration
/// * `address` - The address to check, as sent by the client
pub async fn can_delegate(
    ctx: &RelayerContext,
    address: Option<&str>,
) -> Outcome {
    let signer = address.and_then(parse_address);
    let outcome = match signer {
        Some(signer) => check_delegation(ctx, signer).await,
        None => Err(Rejection::InvalidInput),
    };
    observe("canDelegate", signer.as_ref(), &outcome);
    outcome
}

async fn check_delegation(ctx: &RelayerContext, signer: Address) -> Outcome {
    let chain = ctx.chain();
    let (balance, current_delegate) = tokio::join!(
        read(ctx, ChainField::TokenBalance, chain.token_balance_of(signer)),
        read(
            ctx,
            ChainField::CurrentDelegate,
            chain.current_delegate_of(signer)
        ),
    );
    let snapshot = DelegationSnapshot {
        balance,
        current_delegate,
    };
    ctx.validator().check_delegation(&signer, &snapshot)?;
    with_store(ctx, "checking pending delegations", move |store| {
        store.delegation_allowed(signer)
    })
    .await?;
    Ok(DELEGATION_ALLOWED)
}

/// Handles `POST /delegate`: validates a signed delegation and queues it.
///
/// # Arguments
///
/// * `ctx` - RelayerContext reference that holds the configuration
/// * `raw` - The request body
pub async fn submit_delegation(
    ctx: &RelayerContext,
    raw: RawDelegateRequest,
) -> Outcome {
    let request = match raw.parse() {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(%e, "unparseable delegation");
            let outcome = Err(Rejection::from(e));
            observe("delegate", None, &outcome);
            return outcome;
        }
    };
    let chain = ctx.chain();
    let signer = match recover(
        ctx,
        chain.recover_delegation_signer(
            request.delegatee,
            request.nonce,
            request.expiry,
            &request.signature,
        ),
    )
    .await
    {
        Ok(signer) => signer,
        Err(reason) => {
            let outcome = Err(reason);
            observe("delegate", None, &outcome);
            return outcome;
        }
    };
    tracing::trace!(?signer, delegatee = ?request.delegatee, "delegation signer");

    let (required_nonce, balance, current_delegate) = tokio::join!(
        read(ctx, ChainField::AccountNonce, chain.required_nonce_of(signer)),
        read(ctx, ChainField::TokenBalance, chain.token_balance_of(signer)),
        read(
            ctx,
            ChainField::CurrentDelegate,
            chain.current_delegate_of(signer)
        ),
    );
    let snapshot = DelegationSubmissionSnapshot {
        required_nonce,
        balance,
        current_delegate,
    };
    let outcome = match ctx
        .validator()
        .check_delegation_submission(&signer, &request, &snapshot)
    {
        Ok(()) => {
            enqueue(
                ctx,
                signer,
                SignedAction::Delegate(request),
                DELEGATION_NOTIFICATION,
            )
            .await
        }
        Err(reason) => Err(reason),
    };
    observe("delegate", Some(&signer), &outcome);
    outcome
}
