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

//! Notification Backends
//!
//! After a signed request is queued the relayer tells somebody about it. The
//! notification is best effort: [`Notifier::notify`] never blocks the
//! request, never reports failure, and is never retried.
//!
//! As of now, the following backends are supported:
//! - [`WebhookNotifier`], an HTTP `GET` of the hook URL with the message
//!   appended.
//! - [`NoopNotifier`], when no hook is configured.
//! - [`RecordingNotifier`], which keeps every message in memory.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt::Debug;

/// A do-nothing notifier.
mod noop;
/// In-memory notifier.
mod recording;
/// HTTP webhook notifier.
mod webhook;

pub use noop::NoopNotifier;
pub use recording::RecordingNotifier;
pub use webhook::WebhookNotifier;

/// Something to tell about newly queued transactions.
pub trait Notifier: Send + Sync + Debug {
    /// Sends `message` without waiting for the outcome.
    fn notify(&self, message: &str);
}

impl<N> Notifier for std::sync::Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, message: &str) {
        N::notify(self, message)
    }
}
