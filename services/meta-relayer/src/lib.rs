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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # Meta Relayer Crate 🕸️
//!
//! A relayer that lets token holders delegate and vote on a governor without
//! paying gas.
//!
//! ## Overview
//!
//! Holders sign a `delegateBySig` or `castVoteBySig` message off-chain and
//! send it over HTTP. The relayer recovers the signer, checks the token and
//! governor state on chain, and when the signer is eligible queues the
//! signature for a separate executor to submit in batches.
//!
//! Nothing is submitted on chain from here. The relayer only reads chain
//! state and writes to its own queue.
//!
//! # Features
//!
//! * `integration-tests`: Switches logs to JSON. By default, this is disabled.

/// The HTTP server and its middleware.
pub mod service;

pub use meta_relayer_utils::{Error, Result};
