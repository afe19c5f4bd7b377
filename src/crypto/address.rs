use ethers::types::Address as EthAddress;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    constants::ADDRESS_LENGTH,
    error::{ExplorerError, Result},
};

/// An account or contract address that passed format and checksum checks.
///
/// Always held in its EIP-55 checksummed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw address string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        validate(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ExplorerError;

    fn try_from(value: String) -> Result<Self> {
        validate(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Validates a user-supplied address and normalizes it to checksum form.
///
/// All-lowercase and all-uppercase bodies carry no checksum and are accepted
/// as long as they are well-formed hex. Mixed case must match EIP-55 exactly.
pub fn validate(input: &str) -> Result<Address> {
    let raw = input.trim();
    if raw.len() < ADDRESS_LENGTH {
        return Err(ExplorerError::InvalidAddress(format!(
            "address must be {} characters, got {}",
            ADDRESS_LENGTH,
            raw.len()
        )));
    }
    if raw.len() > ADDRESS_LENGTH {
        return Err(ExplorerError::InvalidAddress(format!(
            "address exceeds {} characters",
            ADDRESS_LENGTH
        )));
    }
    let Some(body) = raw.strip_prefix("0x") else {
        return Err(ExplorerError::InvalidAddress(
            "address must start with 0x".to_string(),
        ));
    };
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ExplorerError::InvalidAddress(
            "address must be hex-encoded".to_string(),
        ));
    }

    let parsed = EthAddress::from_str(body)
        .map_err(|e| ExplorerError::InvalidAddress(e.to_string()))?;
    let checksummed = to_checksum(&parsed, None);

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksummed[2..] != *body {
        return Err(ExplorerError::InvalidAddress(
            "address checksum mismatch".to_string(),
        ));
    }

    Ok(Address(checksummed))
}
