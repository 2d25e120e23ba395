#[cfg(test)]
#[path = "tests/uuid.rs"]
mod tests;

use core::fmt;
use core::str::FromStr;

use crate::error::PrimitivesError;

const BYTES_LEN: usize = 16;

/// Bluetooth base UUID, `00000000-0000-1000-8000-00805f9b34fb`.
const BASE: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// A 128-bit Bluetooth UUID.
///
/// 16- and 32-bit SIG aliases are expanded against the Bluetooth base UUID, so
/// `"2901"` and `"00002901-0000-1000-8000-00805f9b34fb"` compare equal.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uuid {
    bytes: [u8; BYTES_LEN],
}

impl Uuid {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self {
            bytes: value.to_be_bytes(),
        }
    }

    #[must_use]
    pub const fn from_u16(value: u16) -> Self {
        Self::from_u32(value as u32)
    }

    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self::from_u128(BASE | ((value as u128) << 96))
    }

    #[must_use]
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BYTES_LEN] {
        &self.bytes
    }

    /// The 16-bit alias, if this UUID lives in the SIG-assigned range.
    #[must_use]
    pub fn short(&self) -> Option<u16> {
        let value = self.as_u128();
        let alias = value >> 96;

        if value & !(u128::from(u32::MAX) << 96) != BASE {
            return None;
        }

        u16::try_from(alias).ok()
    }
}

impl From<[u8; BYTES_LEN]> for Uuid {
    fn from(bytes: [u8; BYTES_LEN]) -> Self {
        Self { bytes }
    }
}

impl From<Uuid> for [u8; BYTES_LEN] {
    fn from(uuid: Uuid) -> Self {
        uuid.bytes
    }
}

impl FromStr for Uuid {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrimitivesError::InvalidUuid(s.to_owned());

        if !s.bytes().all(|b| b.is_ascii_hexdigit() || b == b'-') {
            return Err(invalid());
        }

        match s.len() {
            4 => u16::from_str_radix(s, 16)
                .map(Self::from_u16)
                .map_err(|_| invalid()),
            8 => u32::from_str_radix(s, 16)
                .map(Self::from_u32)
                .map_err(|_| invalid()),
            32 | 36 => {
                if s.len() == 36 {
                    let dashes = s
                        .char_indices()
                        .filter(|(_, c)| *c == '-')
                        .map(|(i, _)| i);

                    if !dashes.eq([8, 13, 18, 23]) {
                        return Err(invalid());
                    }
                }

                let compact: String = s.chars().filter(|c| *c != '-').collect();
                let mut bytes = [0; BYTES_LEN];
                hex::decode_to_slice(compact, &mut bytes).map_err(|_| invalid())?;

                Ok(Self { bytes })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;

        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16]),
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Uuid").field(&self.to_string()).finish()
    }
}

impl serde::Serialize for Uuid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Uuid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UuidVisitor;

        impl serde::de::Visitor<'_> for UuidVisitor {
            type Value = Uuid;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a bluetooth uuid")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(UuidVisitor)
    }
}
