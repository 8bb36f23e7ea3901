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

#![allow(missing_docs, clippy::all)]

use ethers::prelude::abigen;

abigen!(
    SigRelayer,
    r#"[
        function signatoryFromDelegateSig(address delegatee, uint256 nonce, uint256 expiry, uint8 v, bytes32 r, bytes32 s) external view returns (address)
        function signatoryFromVoteSig(uint256 proposalId, bool support, uint8 v, bytes32 r, bytes32 s) external view returns (address)
    ]"#,
);

abigen!(
    GovernanceToken,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function delegates(address account) external view returns (address)
        function nonces(address account) external view returns (uint256)
        function getPriorVotes(address account, uint256 blockNumber) external view returns (uint96)
    ]"#,
);

abigen!(
    GovernorAlpha,
    r#"[
        function proposals(uint256 proposalId) external view returns (uint256 id, address proposer, uint256 eta, uint256 startBlock, uint256 endBlock, uint256 forVotes, uint256 againstVotes, bool canceled, bool executed)
        function getReceipt(uint256 proposalId, address voter) external view returns (bool hasVoted, bool support, uint96 votes)
    ]"#,
);
