use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PrimitivesError {
    #[error("invalid uuid: {0}")]
    InvalidUuid(String),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("nonce must be exactly {expected} bytes, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("nonce must not be all zeroes")]
    ZeroNonce,

    #[error("pcr index {0} out of range")]
    InvalidPcrIndex(u8),

    #[error("unknown pcr bank: {0}")]
    UnknownPcrBank(String),

    #[error("unsupported evidence version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed evidence: {0}")]
    Malformed(String),
}
