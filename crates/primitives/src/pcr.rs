use core::fmt;
use core::str::FromStr;
use std::io;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};

use crate::common::serde_hex;
use crate::error::PrimitivesError;

/// Number of PCRs in a TPM 2.0 bank.
pub const PCR_COUNT: usize = 24;

/// Hash algorithm backing a PCR bank.
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PcrBank {
    #[default]
    Sha256,
    Sha384,
}

impl PcrBank {
    #[must_use]
    pub const fn digest_size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
        }
    }

    #[must_use]
    pub fn zero(self) -> Vec<u8> {
        vec![0; self.digest_size()]
    }

    #[must_use]
    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
        }
    }

    /// `PCR_new = H(PCR_old || digest)`
    #[must_use]
    pub fn extend(self, current: &[u8], digest: &[u8]) -> Vec<u8> {
        self.hash_all([current, digest])
    }

    /// Digest over the concatenation of `parts`, in order.
    #[must_use]
    pub fn hash_all<'a, I>(self, parts: I) -> Vec<u8>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        fn run<'a, D: Digest, I: IntoIterator<Item = &'a [u8]>>(parts: I) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().to_vec()
        }

        match self {
            Self::Sha256 => run::<Sha256, I>(parts),
            Self::Sha384 => run::<Sha384, I>(parts),
        }
    }
}

impl fmt::Display for PcrBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
        })
    }
}

impl FromStr for PcrBank {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            _ => Err(PrimitivesError::UnknownPcrBank(s.to_owned())),
        }
    }
}

/// PCR index, `0..24`.
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, BorshSerialize, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct PcrIndex(u8);

impl PcrIndex {
    pub const FIRMWARE: Self = Self(0);
    pub const BOOT_LOADER: Self = Self(4);
    pub const KERNEL: Self = Self(8);
    pub const APPLICATION: Self = Self(10);

    pub const fn new(index: u8) -> Result<Self, PrimitivesError> {
        if index as usize >= PCR_COUNT {
            return Err(PrimitivesError::InvalidPcrIndex(index));
        }

        Ok(Self(index))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for PcrIndex {
    type Error = PrimitivesError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<PcrIndex> for u8 {
    fn from(index: PcrIndex) -> Self {
        index.0
    }
}

impl BorshDeserialize for PcrIndex {
    fn deserialize_reader<R: io::Read>(reader: &mut R) -> io::Result<Self> {
        let raw = u8::deserialize_reader(reader)?;

        Self::new(raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl fmt::Display for PcrIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PcrIndex {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .parse::<u8>()
            .map_err(|_| PrimitivesError::Malformed(format!("invalid PCR index {s:?}")))?;

        Self::new(index)
    }
}

/// A single reported PCR.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PcrValue {
    pub index: PcrIndex,
    #[serde(with = "serde_hex")]
    pub digest: Vec<u8>,
}
