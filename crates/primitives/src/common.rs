/// Hex (de)serialization for byte containers, used wherever raw bytes show up
/// in JSON output.
pub mod serde_hex {
    use core::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a hex encoded byte string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                hex::decode(v).map_err(E::custom)
            }
        }

        let bytes = deserializer.deserialize_str(HexVisitor)?;
        let len = bytes.len();

        T::try_from(bytes)
            .map_err(|_| de::Error::custom(format!("unexpected byte length {len}")))
    }
}
