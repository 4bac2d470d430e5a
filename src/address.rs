//! Wallet address generation for ledgerd

use crate::error::{LedgerError, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes backing a wallet address.
pub const ADDRESS_BYTES: usize = 32;

/// Length of an address in hex characters.
pub const ADDRESS_HEX_LEN: usize = ADDRESS_BYTES * 2;

/// Generates a random wallet address: 32 bytes from the OS CSPRNG,
/// hex-encoded to a 64-character lowercase string.
///
/// A failing random source is fatal at bootstrap; callers propagate the
/// error and abort startup instead of retrying.
pub fn generate_address() -> Result<String> {
    let mut bytes = [0u8; ADDRESS_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| LedgerError::CryptoError(format!("OS random source failed: {}", e)))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_format() {
        let address = generate_address().unwrap();
        assert_eq!(address.len(), ADDRESS_HEX_LEN);
        assert!(address.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_addresses_are_unique() {
        let a = generate_address().unwrap();
        let b = generate_address().unwrap();
        // Distinct with overwhelming probability for 256-bit values
        assert_ne!(a, b);
    }
}
