//! ATT protocol pieces the characteristic needs: error codes, MTU and
//! connection identity.

use core::fmt;

use thiserror::Error;

/// ATT error responses returned by characteristic handlers.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttError {
    #[error("read not permitted")]
    ReadNotPermitted,

    #[error("write not permitted")]
    WriteNotPermitted,

    #[error("invalid offset")]
    InvalidOffset,

    #[error("invalid attribute value length")]
    InvalidAttributeValueLength,

    #[error("unlikely error")]
    UnlikelyError,

    #[error("value not allowed")]
    ValueNotAllowed,

    #[error("no nonce has been written on this connection")]
    NoNonce,

    #[error("nonce expired before evidence was read")]
    NonceExpired,

    #[error("nonce has already been used")]
    NonceReused,
}

impl AttError {
    /// Error code carried in the ATT_ERROR_RSP PDU.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::ReadNotPermitted => 0x02,
            Self::WriteNotPermitted => 0x03,
            Self::InvalidOffset => 0x07,
            Self::InvalidAttributeValueLength => 0x0d,
            Self::UnlikelyError => 0x0e,
            Self::ValueNotAllowed => 0x13,
            Self::NoNonce => 0x80,
            Self::NonceExpired => 0x81,
            Self::NonceReused => 0x82,
        }
    }
}

/// Negotiated ATT MTU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mtu(u16);

impl Mtu {
    pub const DEFAULT: Self = Self(23);
    pub const MAX: Self = Self(517);

    /// Clamp `value` into `23..=517`.
    #[must_use]
    pub fn new(value: u16) -> Self {
        Self(value.clamp(Self::DEFAULT.0, Self::MAX.0))
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Value bytes in a Read or Read Blob response (opcode).
    #[must_use]
    pub const fn read_payload(self) -> usize {
        self.0.saturating_sub(1) as usize
    }

    /// Value bytes in a Prepare Write request (opcode, handle, offset).
    #[must_use]
    pub const fn prepare_write_payload(self) -> usize {
        self.0.saturating_sub(5) as usize
    }
}

impl Default for Mtu {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Identifies one BLE connection.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}
