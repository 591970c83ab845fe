use crate::utils::serde_helpers::{as_hex, from_hex_array, to_prefixed_hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

pub type Slot = u64;
pub type Epoch = u64;
pub type ValidatorIndex = u64;
pub type Hash256 = [u8; 32];

/// Length of a compressed BLS public key.
pub const PUBKEY_BYTES_LEN: usize = 48;

pub const GENESIS_SLOT: Slot = 0;
pub const GENESIS_EPOCH: Epoch = 0;
pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;

/// Raw validator public key. Only compared and rendered here, never verified.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub [u8; PUBKEY_BYTES_LEN]);

impl PublicKey {
    /// The all-zero key used as a placeholder for the genesis slot.
    pub const fn zero() -> Self {
        PublicKey([0u8; PUBKEY_BYTES_LEN])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(PublicKey)
    }

    /// `0x`-prefixed lowercase hex, always `2 + 2 * PUBKEY_BYTES_LEN` chars.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }
}

impl Default for PublicKey {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        as_hex(&self.0, s)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        from_hex_array(d).map(PublicKey)
    }
}

/// sha256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}
