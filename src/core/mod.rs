//! Shared vocabulary: addresses, hashes, receipts, quantity encoding, and the
//! message/method registry.

pub mod messages;
pub mod types;

pub use types::{parse_address, parse_units, Address, Receipt, TxHash, Units};
