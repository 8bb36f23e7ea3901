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

use std::collections::HashSet;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::Rejection;

/// Restricted-access gate, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccessPolicy {
    /// When `true`, only addresses in `allow_list` are admitted.
    #[serde(default)]
    pub restricted: bool,
    /// Addresses admitted while restricted mode is on.
    #[serde(default)]
    pub allow_list: HashSet<Address>,
    /// Message returned to signers outside the allow-list.
    #[serde(default = "defaults::restricted_message")]
    pub message: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            restricted: false,
            allow_list: HashSet::new(),
            message: defaults::restricted_message(),
        }
    }
}

impl AccessPolicy {
    /// An open policy admitting everyone.
    pub fn open() -> Self {
        Self::default()
    }

    /// A restricted policy admitting only `allowed`.
    pub fn restricted_to(allowed: impl IntoIterator<Item = Address>) -> Self {
        Self {
            restricted: true,
            allow_list: allowed.into_iter().collect(),
            message: defaults::restricted_message(),
        }
    }

    /// Whether `signer` may use the relayer under this policy.
    pub fn admits(&self, signer: &Address) -> bool {
        !self.restricted || self.allow_list.contains(signer)
    }

    /// Like [`AccessPolicy::admits`], as a [`Rejection`].
    pub fn check(&self, signer: &Address) -> Result<(), Rejection> {
        if self.admits(signer) {
            Ok(())
        } else {
            Err(Rejection::AccessRestricted(self.message.clone()))
        }
    }
}

/// Switches that relax the eligibility rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EligibilityRules {
    /// Test mode: skips the submission balance check, the
    /// already-delegating check, and the voting power check.
    #[serde(default)]
    pub testing: bool,
}

mod defaults {
    pub fn restricted_message() -> String {
        String::from(
            "the relayer is in restricted mode and this address is not on the allow-list",
        )
    }
}
