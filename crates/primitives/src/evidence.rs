//! The signed quote and the evidence bundle read by a verifier.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::common::serde_hex;
use crate::error::PrimitivesError;
use crate::event_log::EventLogEntry;
use crate::nonce::Nonce;
use crate::pcr::{PcrBank, PcrIndex, PcrValue};

/// `TPM_GENERATED_VALUE`
pub const QUOTE_MAGIC: u32 = 0xff54_4347;

/// `TPM_ST_ATTEST_QUOTE`
pub const ATTEST_QUOTE: u16 = 0x8018;

pub const EVIDENCE_VERSION: u8 = 1;

pub const ATTESTATION_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// The structure covered by the quote signature.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInfo {
    pub magic: u32,
    pub attest_type: u16,
    pub bank: PcrBank,
    pub pcr_select: Vec<PcrIndex>,
    /// Digest over the selected PCR values, in selection order.
    #[serde(with = "serde_hex")]
    pub pcr_digest: Vec<u8>,
    /// The verifier's nonce.
    pub extra_data: Nonce,
    pub reset_count: u32,
    pub clock: u64,
}

impl QuoteInfo {
    pub fn signing_bytes(&self) -> Result<Vec<u8>, PrimitivesError> {
        borsh::to_vec(self).map_err(|err| PrimitivesError::Malformed(err.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub info: QuoteInfo,
    /// Ed25519 public half of the attestation key.
    #[serde(with = "serde_hex")]
    pub attestation_key: [u8; ATTESTATION_KEY_LEN],
    #[serde(with = "serde_hex")]
    pub signature: [u8; SIGNATURE_LEN],
}

/// Everything a verifier needs to appraise the device: the quote, the PCR
/// values it commits to and the event log those values are replayed from.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub version: u8,
    pub quote: Quote,
    pub pcrs: Vec<PcrValue>,
    pub event_log: Vec<EventLogEntry>,
}

impl Evidence {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PrimitivesError> {
        borsh::to_vec(self).map_err(|err| PrimitivesError::Malformed(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let evidence: Self =
            borsh::from_slice(bytes).map_err(|err| PrimitivesError::Malformed(err.to_string()))?;

        if evidence.version != EVIDENCE_VERSION {
            return Err(PrimitivesError::UnsupportedVersion(evidence.version));
        }

        Ok(evidence)
    }
}
