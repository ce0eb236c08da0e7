//! Account address parsing.

use alloy::primitives::Address;

use crate::blockchain::types::{ChainError, ChainResult};

/// Parse a user-supplied account address.
///
/// Accepts `0x` followed by exactly 40 hex digits in any letter case and
/// returns the checksummed form (EIP-55) via `Display`. Anything else is an
/// [`ChainError::InvalidAddress`]; nothing here touches the network.
pub fn normalize_address(input: &str) -> ChainResult<Address> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ChainError::InvalidAddress(input.to_string()))?;

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ChainError::InvalidAddress(input.to_string()));
    }

    hex.parse::<Address>()
        .map_err(|_| ChainError::InvalidAddress(input.to_string()))
}
