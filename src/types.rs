//! Shared primitive types.

/// 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// Short hex rendering of a digest for logs and tables.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}
