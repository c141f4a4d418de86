use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a plaintext secret.
///
/// The digest is the only form in which a secret is ever stored or
/// compared; there is no way back to the plaintext.
pub fn digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest("hunter2"), digest("hunter2"));
    }

    #[test]
    fn digest_differs_per_secret() {
        assert_ne!(digest("hunter2"), digest("hunter3"));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let d = digest("");
        assert_eq!(d.len(), 64);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
        // well-known SHA-256 of the empty string
        assert_eq!(
            d,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
