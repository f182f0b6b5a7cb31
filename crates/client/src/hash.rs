//! Salted hashing for shares and recovered secrets.
//!
//! `salted_hash(m, s) = SHA-256(len(s) || s || m)` with `len(s)` encoded as
//! a single byte, which is why the salt length is capped at 255.

use sha2::{Digest, Sha256};

use crate::error::ClientError;

/// Computes the salted hash of `message`. The salt must be 1..=255 bytes.
pub(crate) fn salted_hash(message: &[u8], salt: &[u8]) -> Result<Vec<u8>, ClientError> {
    if salt.is_empty() || salt.len() > 255 {
        return Err(ClientError::InvalidArgument(
            "salt length must be in range 1..255".to_string(),
        ));
    }
    let mut hasher = Sha256::new();
    hasher.update([salt.len() as u8]);
    hasher.update(salt);
    hasher.update(message);
    Ok(hasher.finalize().to_vec())
}

/// Verifies that `expected` is the salted hash of `message`.
pub(crate) fn check_salted_hash(
    message: &[u8],
    salt: &[u8],
    expected: &[u8],
) -> Result<(), ClientError> {
    if salted_hash(message, salt)? != expected {
        return Err(ClientError::IncorrectHash);
    }
    Ok(())
}

/// XORs two byte strings of equal, nonzero length.
pub(crate) fn xor(x: &[u8], y: &[u8]) -> Result<Vec<u8>, ClientError> {
    if x.is_empty() || x.len() != y.len() {
        return Err(ClientError::InvalidArgument(
            "arrays must be non-empty and of the same length".to_string(),
        ));
    }
    Ok(x.iter().zip(y).map(|(a, b)| a ^ b).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    #[test]
    fn test_salted_hash_layout() {
        // The salt length byte and the salt precede the message in one
        // SHA-256 pass.
        let message = b"some message";
        let salt = [7u8; 10];
        let mut reference = Vec::new();
        reference.push(10u8);
        reference.extend_from_slice(&salt);
        reference.extend_from_slice(message);
        assert_eq!(
            salted_hash(message, &salt).unwrap(),
            Sha256::digest(&reference).to_vec()
        );
    }

    #[test]
    fn test_salt_bounds() {
        assert!(salted_hash(b"m", &[]).is_err());
        assert!(salted_hash(b"m", &[0; 256]).is_err());
        assert!(salted_hash(b"m", &[0; 255]).is_ok());
        assert!(salted_hash(b"m", &[0; 1]).is_ok());
    }

    #[test]
    fn test_check_salted_hash() {
        let salt = [1u8; 10];
        let hash = salted_hash(b"message", &salt).unwrap();
        assert!(check_salted_hash(b"message", &salt, &hash).is_ok());
        assert!(matches!(
            check_salted_hash(b"other message", &salt, &hash),
            Err(ClientError::IncorrectHash)
        ));
        let other_salt = [2u8; 10];
        assert!(matches!(
            check_salted_hash(b"message", &other_salt, &hash),
            Err(ClientError::IncorrectHash)
        ));
    }

    #[test]
    fn test_xor() {
        assert_eq!(xor(&[0xff, 0x0f], &[0x0f, 0xff]).unwrap(), vec![0xf0, 0xf0]);
        let value = vec![1, 2, 3];
        let mask = vec![4, 5, 6];
        let masked = xor(&value, &mask).unwrap();
        assert_eq!(xor(&masked, &mask).unwrap(), value);
        assert!(xor(&[], &[]).is_err());
        assert!(xor(&[1], &[1, 2]).is_err());
    }
}
