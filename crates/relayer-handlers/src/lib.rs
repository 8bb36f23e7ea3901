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

//! Relayer handlers for HTTP calls

#![warn(missing_docs)]
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use meta_relayer_context::RelayerContext;

/// Module handles relayer API
pub mod routes;

pub use routes::*;

/// The relayer's routes, still waiting for their [`RelayerContext`].
///
/// The caller attaches the state and any middleware:
///
/// ```rust,ignore
/// let app = meta_relayer_handlers::routes().with_state(Arc::new(ctx));
/// ```
pub fn routes() -> Router<Arc<RelayerContext>> {
    Router::new()
        .route("/", get(handle_greeting))
        .route("/canDelegate", get(handle_can_delegate))
        .route("/canVote", get(handle_can_vote))
        .route("/delegate", post(handle_delegate))
        .route("/vote", post(handle_vote))
}
