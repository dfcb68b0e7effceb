//! # secp256k1 Signature Scheme
//!
//! Default [`SignatureScheme`] for spork messages.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S signatures only; k256 rejects high-S on verification
//! - Operator secrets are zeroized after every use
//!
//! Keys: operator secret as 32-byte hex, public key as 33-byte compressed SEC1.
//! Signatures: 64 bytes, `r || s`, over SHA-256 of the message.

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroizing;

use crate::domain::{OperatorKey, SporkError};
use crate::ports::outbound::SignatureScheme;

/// ECDSA over secp256k1 using the k256 crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1SignatureScheme;

impl Secp256k1SignatureScheme {
    pub fn new() -> Self {
        Self
    }

    fn signing_key(key: &OperatorKey) -> Result<SigningKey, SporkError> {
        let secret = key.expose_secret().trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = Zeroizing::new(
            hex::decode(secret).map_err(|e| SporkError::InvalidSigningKey(e.to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(SporkError::InvalidSigningKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        SigningKey::from_slice(&bytes)
            .map_err(|_| SporkError::InvalidSigningKey("scalar out of range".to_string()))
    }
}

impl SignatureScheme for Secp256k1SignatureScheme {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key.verify(message, &sig).is_ok()
    }

    fn sign(&self, message: &[u8], key: &OperatorKey) -> Result<Vec<u8>, SporkError> {
        let signing_key = Self::signing_key(key)?;
        let sig: Signature = Signer::<Signature>::try_sign(&signing_key, message)
            .map_err(|e| SporkError::SigningFailed(e.to_string()))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn derive_public_key(&self, key: &OperatorKey) -> Result<Vec<u8>, SporkError> {
        let signing_key = Self::signing_key(key)?;
        Ok(signing_key.verifying_key().to_sec1_bytes().to_vec())
    }

    fn validate_public_key(&self, public_key: &[u8]) -> bool {
        VerifyingKey::from_sec1_bytes(public_key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> OperatorKey {
        let key = SigningKey::random(&mut rand::thread_rng());
        OperatorKey::new(hex::encode(key.to_bytes()))
    }

    #[test]
    fn test_sign_verify() {
        let scheme = Secp256k1SignatureScheme::new();
        let key = random_key();
        let public_key = scheme.derive_public_key(&key).unwrap();
        let sig = scheme.sign(b"1000110", &key).unwrap();

        assert_eq!(public_key.len(), 33);
        assert_eq!(sig.len(), 64);
        assert!(scheme.verify(b"1000110", &sig, &public_key));
    }

    #[test]
    fn test_wrong_message_fails() {
        let scheme = Secp256k1SignatureScheme::new();
        let key = random_key();
        let public_key = scheme.derive_public_key(&key).unwrap();
        let sig = scheme.sign(b"message1", &key).unwrap();

        assert!(!scheme.verify(b"message2", &sig, &public_key));
    }

    #[test]
    fn test_wrong_key_fails() {
        let scheme = Secp256k1SignatureScheme::new();
        let sig = scheme.sign(b"payload", &random_key()).unwrap();
        let other = scheme.derive_public_key(&random_key()).unwrap();

        assert!(!scheme.verify(b"payload", &sig, &other));
    }

    #[test]
    fn test_deterministic_signatures() {
        let scheme = Secp256k1SignatureScheme::new();
        let key = OperatorKey::new("ab".repeat(32));
        assert_eq!(
            scheme.sign(b"deterministic", &key).unwrap(),
            scheme.sign(b"deterministic", &key).unwrap()
        );
    }

    #[test]
    fn test_malformed_inputs_do_not_verify() {
        let scheme = Secp256k1SignatureScheme::new();
        let key = random_key();
        let public_key = scheme.derive_public_key(&key).unwrap();
        let sig = scheme.sign(b"payload", &key).unwrap();

        assert!(!scheme.verify(b"payload", &sig[..63], &public_key));
        assert!(!scheme.verify(b"payload", &[0u8; 64], &public_key));
        assert!(!scheme.verify(b"payload", &sig, &[0x02; 33]));
        assert!(!scheme.verify(b"payload", &sig, &[]));
    }

    #[test]
    fn test_bad_private_keys_are_rejected() {
        let scheme = Secp256k1SignatureScheme::new();
        let bad_keys = vec![
            String::new(),
            "zz".to_string(),
            "abcd".to_string(),
            "00".repeat(32),
            "ff".repeat(32),
        ];
        for bad in &bad_keys {
            let result = scheme.sign(b"x", &OperatorKey::new(bad.as_str()));
            assert!(
                matches!(result, Err(SporkError::InvalidSigningKey(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_public_key_validation() {
        let scheme = Secp256k1SignatureScheme::new();
        let public_key = scheme.derive_public_key(&random_key()).unwrap();
        assert!(scheme.validate_public_key(&public_key));

        assert!(!scheme.validate_public_key(&[]));
        assert!(!scheme.validate_public_key(&[0xAB, 0xCD]));
        assert!(!scheme.validate_public_key(&public_key[..32]));
        // Valid prefix and length, x coordinate past the field modulus.
        let mut off_curve = vec![0x02];
        off_curve.extend_from_slice(&[0xFF; 32]);
        assert!(!scheme.validate_public_key(&off_curve));
    }

    #[test]
    fn test_hex_prefix_accepted() {
        let scheme = Secp256k1SignatureScheme::new();
        let bare = OperatorKey::new("11".repeat(32));
        let prefixed = OperatorKey::new(format!("0x{}", "11".repeat(32)));
        assert_eq!(
            scheme.derive_public_key(&bare).unwrap(),
            scheme.derive_public_key(&prefixed).unwrap()
        );
    }
}
