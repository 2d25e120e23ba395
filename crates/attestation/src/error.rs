use gatt_attest_primitives::pcr::PcrIndex;
use gatt_attest_primitives::PrimitivesError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttestationError {
    #[error("quote generation failed: {0}")]
    QuoteGenerationFailed(String),

    #[error("quote parsing failed: {0}")]
    QuoteParsingFailed(String),

    #[error("invalid pcr selection: {0}")]
    InvalidSelection(String),

    #[error("event {position} for pcr {pcr} has a {actual}-byte digest, bank needs {expected}")]
    EventDigestLength {
        position: usize,
        pcr: PcrIndex,
        expected: usize,
        actual: usize,
    },

    #[error("event {position} for pcr {pcr} does not match its data")]
    EventDigestMismatch { position: usize, pcr: PcrIndex },

    #[error("invalid attestation key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
