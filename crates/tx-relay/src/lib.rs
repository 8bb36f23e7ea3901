//! # Intake Pipeline
//!
//! Every signed request goes through the same stages:
//!
//! `Received -> Parsed -> SignatureRecovered -> ChainStateFetched -> Validated -> Queued | Rejected`
//!
//! No chain state is read before the signer is known. The reads of one
//! request run concurrently, each under the configured RPC timeout, and a
//! timeout counts as a failed read. Store checks run on the blocking pool
//! under the store timeout. The insert itself always runs to completion.

use std::future::Future;
use std::sync::Arc;

use ethers::types::Address;
use meta_relayer_context::RelayerContext;
use meta_relayer_eligibility::{ChainField, Fetched, Rejection};
use meta_relayer_store::{NewTransaction, PendingTxStore, SignedAction};
use meta_relayer_utils::{probe, Error};

/// Delegation intake.
pub mod delegate;
/// Vote intake.
pub mod vote;

pub use delegate::{can_delegate, submit_delegation};
pub use vote::{can_vote, submit_vote};

/// Reply to a successful `canDelegate`.
pub const DELEGATION_ALLOWED: &str = "delegation allowed";
/// Reply to a successful `canVote`.
pub const VOTING_ALLOWED: &str = "voting allowed";
/// Reply to a successful submission.
pub const TX_QUEUED: &str = "transaction queued";

/// Announced after a delegation is queued.
pub const DELEGATION_NOTIFICATION: &str = "New delegation signature queued";
/// Announced after a vote is queued.
pub const VOTE_NOTIFICATION: &str = "New vote signature queued";

/// The reply for an admitted request, or why it was turned away.
pub type Outcome = Result<&'static str, Rejection>;

/// Awaits a chain read under the RPC timeout.
async fn read<T, F>(ctx: &RelayerContext, field: ChainField, fut: F) -> Fetched<T>
where
    F: Future<Output = meta_relayer_utils::Result<T>>,
{
    match tokio::time::timeout(ctx.rpc_timeout(), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(?field, %e, "chain read failed");
            Err(field)
        }
        Err(_) => {
            tracing::warn!(?field, "chain read timed out");
            Err(field)
        }
    }
}

/// Awaits signer recovery under the RPC timeout. Any failure is reported as
/// an invalid signature.
async fn recover<F>(ctx: &RelayerContext, fut: F) -> Result<Address, Rejection>
where
    F: Future<Output = meta_relayer_utils::Result<Address>>,
{
    match tokio::time::timeout(ctx.rpc_timeout(), fut).await {
        Ok(Ok(signer)) => Ok(signer),
        Ok(Err(e)) => {
            tracing::debug!(%e, "signer recovery failed");
            Err(Rejection::InvalidSignature)
        }
        Err(_) => {
            tracing::warn!("signer recovery timed out");
            Err(Rejection::InvalidSignature)
        }
    }
}

/// Runs a read-only store call on the blocking pool under the store
/// timeout.
async fn with_store<T, F>(
    ctx: &RelayerContext,
    doing: &'static str,
    f: F,
) -> Result<T, Rejection>
where
    F: FnOnce(Arc<dyn PendingTxStore>) -> meta_relayer_utils::Result<T>
        + Send
        + 'static,
    T: Send + 'static,
{
    let store = ctx.store();
    let task = tokio::task::spawn_blocking(move || f(store));
    let res = match tokio::time::timeout(ctx.store_timeout(), task).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => Err(Error::from(e)),
        Err(_) => Err(Error::Timeout(doing)),
    };
    res.map_err(|e| {
        tracing::debug!(%e, doing, "store refused");
        Rejection::Store(e.to_string())
    })
}

/// Queues an admitted request and announces it.
///
/// An insert that outlives the store timeout is awaited rather than
/// abandoned, so the reply always matches what the store holds.
async fn enqueue(
    ctx: &RelayerContext,
    signer: Address,
    action: SignedAction,
    announcement: &'static str,
) -> Outcome {
    let tx = NewTransaction::now(signer, action);
    let store = ctx.store();
    let mut task = tokio::task::spawn_blocking(move || store.insert_tx(tx));
    let joined = match tokio::time::timeout(ctx.store_timeout(), &mut task).await
    {
        Ok(joined) => joined,
        Err(_) => {
            tracing::warn!(
                timeout = ?ctx.store_timeout(),
                "queueing the transaction is slow, waiting for the store",
            );
            task.await
        }
    };
    let queued = joined
        .map_err(Error::from)
        .and_then(|res| res)
        .map_err(|e| {
            tracing::debug!(%e, "store refused the transaction");
            Rejection::Store(e.to_string())
        })?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        id = queued.id,
        from = ?queued.from,
        action = %queued.action.kind(),
    );
    ctx.notifier().notify(announcement);
    Ok(TX_QUEUED)
}

/// Logs an intake decision on the probe target.
fn observe(flow: &'static str, signer: Option<&Address>, outcome: &Outcome) {
    match outcome {
        Ok(reply) => tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Intake,
            flow,
            signer = ?signer,
            admitted = true,
            reply,
        ),
        Err(reason) => tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Intake,
            flow,
            signer = ?signer,
            admitted = false,
            %reason,
        ),
    }
}
