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

use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// The part of a governor proposal the relayer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    /// The id stored on chain. An unknown proposal comes back zeroed.
    pub id: U256,
    /// Voting opens after this block.
    pub start_block: U256,
    /// Voting closes at this block.
    pub end_block: U256,
    /// Whether the proposal was canceled.
    pub canceled: bool,
}

impl ProposalRecord {
    /// Whether `current_block` lies strictly inside the voting window, keeping
    /// `margin` blocks clear of the end block.
    ///
    /// `start_block < current_block < end_block - margin`, where the
    /// subtraction saturates at zero.
    pub fn window_open_at(&self, current_block: U256, margin: u64) -> bool {
        let last_open = self.end_block.saturating_sub(U256::from(margin));
        self.start_block < current_block && current_block < last_open
    }
}

/// A voter's receipt for one proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    /// Whether a vote has already been cast.
    pub has_voted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(start: u64, end: u64) -> ProposalRecord {
        ProposalRecord {
            id: U256::one(),
            start_block: start.into(),
            end_block: end.into(),
            canceled: false,
        }
    }

    #[test]
    fn window_excludes_both_edges_and_the_margin() {
        let p = proposal(100, 200);
        assert!(!p.window_open_at(100.into(), 5));
        assert!(p.window_open_at(101.into(), 5));
        assert!(p.window_open_at(194.into(), 5));
        assert!(!p.window_open_at(195.into(), 5));
        assert!(!p.window_open_at(250.into(), 5));
    }

    #[test]
    fn window_is_closed_when_end_block_is_below_margin() {
        let p = proposal(0, 3);
        assert!(!p.window_open_at(1.into(), 5));
    }
}
