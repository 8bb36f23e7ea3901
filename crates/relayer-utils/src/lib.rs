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
//! Shared error types and helpers for the meta-transaction relayer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};

/// A module used for debugging relayer lifecycle, intake decisions, or queue state.
pub mod probe;

/// A conflict raised by the pending transaction store when an action from the
/// same signer is already waiting to be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueConflict {
    /// A delegation signed by this address is already queued.
    #[error("a delegation signed by this address is already queued")]
    DelegationPending,
    /// A vote signed by this address is already queued for the proposal.
    #[error("a vote signed by this address is already queued for this proposal")]
    VotePending,
}

/// An enum of all possible errors that could be encountered during the execution of the
/// relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// HTTP Error
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ethers::providers::ProviderError),
    /// Smart contract error.
    #[error(transparent)]
    EthersContractCall(
        #[from] ethers::contract::ContractError<Provider<Http>>,
    ),
    /// Sled database error.
    #[error(transparent)]
    Sled(#[from] sled::Error),
    /// Reqwest error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// The pending transaction store refused the item.
    #[error(transparent)]
    QueueConflict(#[from] QueueConflict),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// A call to an external collaborator did not finish in time.
    #[error("Timed out while {}", _0)]
    Timeout(&'static str),
    /// A blocking task panicked or was cancelled.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    /// No queued transaction with the given id.
    #[error("Queued transaction {} not found", _0)]
    TxNotFound(u64),
    /// The signature relay contract returned the zero address.
    #[error("Recovered the zero address from the signature")]
    ZeroSignatory,
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
}

impl From<sled::transaction::TransactionError<QueueConflict>> for Error {
    fn from(e: sled::transaction::TransactionError<QueueConflict>) -> Self {
        match e {
            sled::transaction::TransactionError::Abort(conflict) => {
                Error::QueueConflict(conflict)
            }
            sled::transaction::TransactionError::Storage(e) => Error::Sled(e),
        }
    }
}

/// A type alias for the result for the relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

/// The body of every HTTP response the relayer sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a new response with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<Error> for HandlerError {
    fn from(value: Error) -> Self {
        HandlerError(StatusCode::BAD_REQUEST, value.to_string())
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct HandlerError(
    /// HTTP status code for response
    pub StatusCode,
    /// Response message
    pub String,
);

impl HandlerError {
    /// A `400 Bad Request` carrying the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.0, Json(MessageResponse { message: self.1 })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sled_abort_becomes_queue_conflict() {
        let err = Error::from(sled::transaction::TransactionError::Abort(
            QueueConflict::VotePending,
        ));
        assert!(matches!(
            err,
            Error::QueueConflict(QueueConflict::VotePending)
        ));
        assert_eq!(
            err.to_string(),
            "a vote signed by this address is already queued for this proposal"
        );
    }

    #[test]
    fn handler_error_defaults_to_bad_request() {
        let err = HandlerError::from(Error::Timeout("reading the chain"));
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "Timed out while reading the chain");
    }
}
