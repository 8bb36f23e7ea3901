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

use axum::extract::State;
use axum::Json;

use meta_relayer_context::RelayerContext;
use meta_relayer_tx_relay::Outcome;
use meta_relayer_utils::{HandlerError, MessageResponse};

/// Module for the signed delegation API
mod delegation;
pub use delegation::*;

/// Module for the signed vote API
mod voting;
pub use voting::*;

/// The reply to anything that could not be read as a request.
const INVALID_INPUT: &str = "invalid input";

/// Handles `GET /`.
///
/// Returns the configured greeting.
pub async fn handle_greeting(
    State(ctx): State<Arc<RelayerContext>>,
) -> Json<MessageResponse> {
    Json(MessageResponse::new(ctx.config.greeting.clone()))
}

/// Turns an intake outcome into the single response the client gets.
fn respond(outcome: Outcome) -> Result<Json<MessageResponse>, HandlerError> {
    match outcome {
        Ok(reply) => Ok(Json(MessageResponse::new(reply))),
        Err(reason) => Err(HandlerError::bad_request(reason.to_string())),
    }
}

fn invalid_input(
    rejection: impl std::fmt::Display,
) -> Result<Json<MessageResponse>, HandlerError> {
    tracing::debug!(%rejection, "unreadable request");
    Err(HandlerError::bad_request(INVALID_INPUT))
}
