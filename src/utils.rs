//! Identifier minting helpers

use bech32::Bech32m;
use uuid7::uuid7;

use crate::error::{CaseError, Result};

// mint a unique record id then encode using bech32
pub fn mint_id(hrp: &str) -> Result<String> {
    let hrp = bech32::Hrp::parse(hrp).map_err(|e| CaseError::Codec(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes()).map_err(|e| CaseError::Codec(e.to_string()))
}
