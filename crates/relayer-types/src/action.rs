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

use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of signed action a queued transaction carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A `delegateBySig` request.
    Delegate,
    /// A `castVoteBySig` request.
    Vote,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delegate => write!(f, "delegate"),
            Self::Vote => write!(f, "vote"),
        }
    }
}

/// An ECDSA signature split into the `(v, r, s)` triple the contracts take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrsSignature {
    /// Recovery id, usually 27 or 28.
    pub v: u8,
    /// The `r` half.
    pub r: H256,
    /// The `s` half.
    pub s: H256,
}

impl VrsSignature {
    fn from_values(v: &Value, r: &Value, s: &Value) -> Result<Self, ParseError> {
        let v = uint_from_value(v)
            .filter(|v| *v <= U256::from(u8::MAX))
            .map(|v| v.low_u32() as u8)
            .ok_or(ParseError::MalformedSignature)?;
        let r = h256_from_value(r).ok_or(ParseError::MalformedSignature)?;
        let s = h256_from_value(s).ok_or(ParseError::MalformedSignature)?;
        Ok(Self { v, r, s })
    }
}

/// A signed delegation, as queued for later submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateRequest {
    /// Who the signer wants to delegate to.
    pub delegatee: Address,
    /// The signer's token nonce the signature commits to.
    pub nonce: U256,
    /// Unix timestamp after which the signature is void.
    pub expiry: U256,
    /// The signature over the EIP-712 delegation message.
    pub signature: VrsSignature,
}

/// A signed vote, as queued for later submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// The governor proposal being voted on.
    pub proposal_id: U256,
    /// `true` for a vote in favour.
    pub support: bool,
    /// The signature over the EIP-712 ballot message.
    pub signature: VrsSignature,
}

/// Why a request body could not be turned into a typed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A required field is absent or `null`.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A field is present but has the wrong shape.
    #[error("invalid field `{0}`")]
    InvalidField(&'static str),
    /// `v`, `r` or `s` is not a well formed signature component.
    #[error("malformed signature")]
    MalformedSignature,
}

/// The body of `POST /delegate` before validation.
///
/// Every field is optional here so that a missing field can be told apart
/// from a malformed one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDelegateRequest {
    /// Delegatee address.
    pub delegatee: Option<Value>,
    /// Nonce, as a number or a decimal/hex string.
    pub nonce: Option<Value>,
    /// Expiry, as a number or a decimal/hex string.
    pub expiry: Option<Value>,
    /// Signature `v`.
    pub v: Option<Value>,
    /// Signature `r`.
    pub r: Option<Value>,
    /// Signature `s`.
    pub s: Option<Value>,
}

impl RawDelegateRequest {
    /// Checks that every field is present and well typed.
    pub fn parse(self) -> Result<DelegateRequest, ParseError> {
        let delegatee = required(self.delegatee, "delegatee")?;
        let nonce = required(self.nonce, "nonce")?;
        let expiry = required(self.expiry, "expiry")?;
        let v = required(self.v, "v")?;
        let r = required(self.r, "r")?;
        let s = required(self.s, "s")?;

        let delegatee = address_from_value(&delegatee)
            .ok_or(ParseError::InvalidField("delegatee"))?;
        let nonce =
            uint_from_value(&nonce).ok_or(ParseError::InvalidField("nonce"))?;
        let expiry = uint_from_value(&expiry)
            .ok_or(ParseError::InvalidField("expiry"))?;
        let signature = VrsSignature::from_values(&v, &r, &s)?;
        Ok(DelegateRequest {
            delegatee,
            nonce,
            expiry,
            signature,
        })
    }
}

/// The body of `POST /vote` before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVoteRequest {
    /// Proposal id, as a number or a decimal/hex string.
    #[serde(rename = "proposalId")]
    pub proposal_id: Option<Value>,
    /// `true`/`false`, `1`/`0`, or their string forms.
    pub support: Option<Value>,
    /// Signature `v`.
    pub v: Option<Value>,
    /// Signature `r`.
    pub r: Option<Value>,
    /// Signature `s`.
    pub s: Option<Value>,
}

impl RawVoteRequest {
    /// Checks that every field is present and well typed.
    pub fn parse(self) -> Result<VoteRequest, ParseError> {
        let proposal_id = required(self.proposal_id, "proposalId")?;
        let support = required(self.support, "support")?;
        let v = required(self.v, "v")?;
        let r = required(self.r, "r")?;
        let s = required(self.s, "s")?;

        let proposal_id = uint_from_value(&proposal_id)
            .ok_or(ParseError::InvalidField("proposalId"))?;
        let support = bool_from_value(&support)
            .ok_or(ParseError::InvalidField("support"))?;
        let signature = VrsSignature::from_values(&v, &r, &s)?;
        Ok(VoteRequest {
            proposal_id,
            support,
            signature,
        })
    }
}

fn required(
    value: Option<Value>,
    field: &'static str,
) -> Result<Value, ParseError> {
    match value {
        Some(Value::Null) | None => Err(ParseError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(ParseError::MissingField(field))
        }
        Some(v) => Ok(v),
    }
}

/// Reads an unsigned integer from a JSON number, a decimal string, or a
/// `0x`-prefixed hex string.
///
/// Numbers beyond `u64` arrive as floats and are accepted when they hold a
/// whole, non-negative value.
pub fn uint_from_value(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => Some(U256::from(n)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .and_then(|f| U256::from_dec_str(&format!("{f:.0}")).ok()),
        },
        Value::String(s) => parse_uint(s),
        _ => None,
    }
}

/// Reads an unsigned integer from a decimal or `0x`-prefixed hex string.
pub fn parse_uint(s: &str) -> Option<U256> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => U256::from_dec_str(s).ok(),
    }
}

/// Reads a 20 byte address from a hex string, with or without `0x`.
pub fn parse_address(s: &str) -> Option<Address> {
    let bytes = decode_hex(s)?;
    (bytes.len() == 20).then(|| Address::from_slice(&bytes))
}

fn address_from_value(value: &Value) -> Option<Address> {
    value.as_str().and_then(parse_address)
}

fn h256_from_value(value: &Value) -> Option<H256> {
    let bytes = decode_hex(value.as_str()?)?;
    (bytes.len() == 32).then(|| H256::from_slice(&bytes))
}

fn bool_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(s).ok()
}
