use core::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use gatt_attest_primitives::evidence::{ATTESTATION_KEY_LEN, SIGNATURE_LEN};
use rand::{CryptoRng, RngCore};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AttestationError;

/// The key that signs quotes.
#[derive(Clone)]
pub struct AttestationKey {
    signing_key: SigningKey,
}

impl AttestationKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; ATTESTATION_KEY_LEN] {
        self.public_key().to_bytes()
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for AttestationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationKey")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

impl Serialize for AttestationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bs58::encode(self.signing_key.to_bytes()).into_string())
    }
}

impl<'de> Deserialize<'de> for AttestationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = AttestationKey;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a base58 encoded ed25519 secret key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let decoded = bs58::decode(v)
                    .into_vec()
                    .map_err(|_| E::custom("invalid base58"))?;

                let bytes: [u8; 32] = decoded
                    .as_slice()
                    .try_into()
                    .map_err(|_| E::custom("invalid attestation key length"))?;

                Ok(AttestationKey::from_bytes(&bytes))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}

/// Parse a hex encoded ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, AttestationError> {
    let bytes = hex::decode(hex_key.trim_start_matches("0x"))
        .map_err(|err| AttestationError::InvalidKey(err.to_string()))?;

    let bytes: [u8; ATTESTATION_KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
        AttestationError::InvalidKey(format!(
            "expected {ATTESTATION_KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;

    VerifyingKey::from_bytes(&bytes).map_err(|err| AttestationError::InvalidKey(err.to_string()))
}

pub(crate) fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> bool {
    key.verify_strict(message, &Signature::from_bytes(signature))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let key = AttestationKey::generate(&mut thread_rng());
        let signature = key.sign(b"quote");

        assert!(
            verify_signature(&key.public_key(), b"quote", &signature),
            "signature should verify"
        );
        assert!(
            !verify_signature(&key.public_key(), b"other", &signature),
            "signature must not verify other message"
        );
    }

    #[test]
    fn test_serde_base58_round_trip() {
        let key = AttestationKey::generate(&mut thread_rng());
        let json = serde_json::to_string(&key).unwrap();
        let back: AttestationKey = serde_json::from_str(&json).unwrap();

        assert_eq!(back.public_key(), key.public_key());
    }

    #[test]
    fn test_parse_public_key() {
        let key = AttestationKey::generate(&mut thread_rng());
        let parsed = parse_public_key(&hex::encode(key.public_key_bytes())).unwrap();

        assert_eq!(parsed, key.public_key());
        assert!(
            matches!(parse_public_key("abcd"), Err(AttestationError::InvalidKey(_))),
            "short key must be rejected"
        );
    }
}
