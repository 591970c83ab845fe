use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a hex string, with or without the `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

/// Serialize bytes as a `0x`-prefixed hex string
pub fn as_hex<T, S>(bytes: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    s.serialize_str(&to_prefixed_hex(bytes.as_ref()))
}

/// Deserialize a hex string into a fixed-size byte array
pub fn from_hex_array<'de, D, const N: usize>(d: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    let bytes = decode_hex(&s).map_err(D::Error::custom)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| D::Error::custom(format!("expected {} bytes, got {}", N, len)))
}
