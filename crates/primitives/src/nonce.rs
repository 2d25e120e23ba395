use core::fmt;
use core::ops::Deref;
use core::str::FromStr;
use std::borrow::Cow;

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{CryptoRng, RngCore};

use crate::error::PrimitivesError;

pub const NONCE_LEN: usize = 32;

/// Verifier supplied freshness value. A quote only counts as fresh if it
/// embeds the nonce the verifier just wrote.
#[derive(Clone, Copy, Hash, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0; NONCE_LEN];

        loop {
            rng.fill_bytes(&mut bytes);

            if bytes != [0; NONCE_LEN] {
                return Self(bytes);
            }
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let bytes: [u8; NONCE_LEN] =
            bytes
                .try_into()
                .map_err(|_| PrimitivesError::InvalidNonceLength {
                    expected: NONCE_LEN,
                    actual: bytes.len(),
                })?;

        Self::try_from(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl TryFrom<[u8; NONCE_LEN]> for Nonce {
    type Error = PrimitivesError;

    fn try_from(bytes: [u8; NONCE_LEN]) -> Result<Self, Self::Error> {
        if bytes == [0; NONCE_LEN] {
            return Err(PrimitivesError::ZeroNonce);
        }

        Ok(Self(bytes))
    }
}

impl Deref for Nonce {
    type Target = [u8; NONCE_LEN];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Nonce {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;

        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&hex::encode(self.0))
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Nonce").field(&hex::encode(self.0)).finish()
    }
}

impl serde::Serialize for Nonce {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Nonce {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <Cow<'de, str> as serde::Deserialize<'de>>::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}
