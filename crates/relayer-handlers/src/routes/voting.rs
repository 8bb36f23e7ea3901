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

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use meta_relayer_context::RelayerContext;
use meta_relayer_types::RawVoteRequest;
use meta_relayer_utils::{HandlerError, MessageResponse};

use super::{invalid_input, respond};

/// Query of `GET /canVote`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanVoteQuery {
    address: Option<String>,
    proposal_id: Option<String>,
}

/// Handles `GET /canVote?address=..&proposalId=..`.
///
/// Returns `200 {"message": "voting allowed"}` or `400` with the reason.
///
/// # Arguments
///
/// * `ctx` - RelayerContext reference that holds the configuration
/// * `query` - The voter and the proposal
pub async fn handle_can_vote(
    State(ctx): State<Arc<RelayerContext>>,
    query: Result<Query<CanVoteQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, HandlerError> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return invalid_input(e),
    };
    respond(
        meta_relayer_tx_relay::can_vote(
            &ctx,
            query.address.as_deref(),
            query.proposal_id.as_deref(),
        )
        .await,
    )
}

/// Handles `POST /vote`.
///
/// Returns `200 {"message": "transaction queued"}` or `400` with the reason.
pub async fn handle_vote(
    State(ctx): State<Arc<RelayerContext>>,
    body: Result<Json<RawVoteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, HandlerError> {
    let Json(raw) = match body {
        Ok(body) => body,
        Err(e) => return invalid_input(e),
    };
    respond(meta_relayer_tx_relay::submit_vote(&ctx, raw).await)
}
