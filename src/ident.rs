//! Opaque identifier and capability-token generation.

use rand_core::{OsRng, RngCore};

/// Generate a collision-resistant identifier for users, folders, files,
/// and shares.
///
/// Composed of the current time in microseconds (hex) followed by 8
/// random bytes, so ids sort roughly by creation time while remaining
/// unguessable enough to avoid collisions without coordination.
pub fn generate_id() -> String {
    let micros = chrono::Utc::now().timestamp_micros().max(0) as u64;
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    format!("{micros:x}{}", hex(&bytes))
}

/// Generate a share capability token: 16 random bytes, hex encoded.
///
/// Deliberately independent of the share id: knowing an id is not
/// enough to resolve a share.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex(&bytes)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn token_is_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
