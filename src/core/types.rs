//! Address, transaction hash, receipt, and hex quantity helpers.

use alloy_primitives::hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AtmError;

pub use alloy_primitives::{Address, B256, U256};

/// Balance and amount unit of the contract: the full `uint256` range.
pub type Units = U256;

/// Transaction hash as returned by the provider.
pub type TxHash = B256;

/// Parse a wallet or contract account.
///
/// Requires exactly 20 bytes of hex, `0x`-prefixed. Case is ignored, so a
/// checksummed and a lowercase spelling of one account compare equal.
pub fn parse_address(raw: &str) -> Result<Address, AtmError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
        return Err(AtmError::Address(format!("missing 0x prefix: '{}'", raw)));
    }
    trimmed.parse::<Address>().map_err(|e| AtmError::Address(format!("'{}': {}", raw, e)))
}

/// Parse a non-negative decimal integer amount.
pub fn parse_units(raw: &str) -> Result<Units, String> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a non-negative integer", raw));
    }
    Units::from_str_radix(digits, 10).map_err(|e| format!("'{}': {}", raw, e))
}

/// Confirmation record for an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<Units>,
    pub success: bool,
}

impl Receipt {
    /// Parse a JSON-RPC receipt object. Missing `status` (pre-Byzantium) counts as success.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let hash = value["transactionHash"]
            .as_str()
            .ok_or_else(|| "receipt without transactionHash".to_string())?;
        let transaction_hash = hash.parse::<TxHash>().map_err(|e| format!("transactionHash '{}': {}", hash, e))?;
        let block_number = match value["blockNumber"].as_str() {
            Some(q) => Some(u64::from_str_radix(quantity_digits(q)?, 16).map_err(|e| format!("blockNumber '{}': {}", q, e))?),
            None => None,
        };
        let gas_used = match value["gasUsed"].as_str() {
            Some(q) => Some(parse_quantity(q)?),
            None => None,
        };
        let success = match value["status"].as_str() {
            Some(q) => parse_quantity(q)? == U256::from(1),
            None => true,
        };
        Ok(Self { transaction_hash, block_number, gas_used, success })
    }
}

fn quantity_digits(raw: &str) -> Result<&str, String> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| format!("quantity without 0x: '{}'", raw))?;
    if digits.is_empty() {
        return Err(format!("empty quantity: '{}'", raw));
    }
    Ok(digits)
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<Units, String> {
    Units::from_str_radix(quantity_digits(raw)?, 16).map_err(|e| format!("quantity '{}': {}", raw, e))
}

/// Encode a quantity the way JSON-RPC expects it (no leading zeros).
pub fn to_quantity(value: Units) -> String { format!("0x{:x}", value) }

/// Decode `0x`-prefixed hex data.
pub fn parse_data(raw: &str) -> Result<Vec<u8>, String> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| format!("data without 0x: '{}'", raw))?;
    hex::decode(digits).map_err(|e| format!("data: {}", e))
}

pub fn to_data(bytes: &[u8]) -> String { hex::encode_prefixed(bytes) }
