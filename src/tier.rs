use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported key strengths, bound to a fixed key length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTier {
    /// 128-bit key
    Small,
    /// 192-bit key
    Medium,
    /// 256-bit key
    Large,
    /// No supported tier fits the key material
    Invalid,
}

impl KeyTier {
    /// All tiers that carry a usable key length, smallest first
    pub const SUPPORTED: [KeyTier; 3] = [KeyTier::Small, KeyTier::Medium, KeyTier::Large];

    /// Key length in bytes, `None` for `Invalid`
    pub fn byte_len(self) -> Option<usize> {
        match self {
            KeyTier::Small => Some(16),
            KeyTier::Medium => Some(24),
            KeyTier::Large => Some(32),
            KeyTier::Invalid => None,
        }
    }

    /// Key length in bits, `None` for `Invalid`
    pub fn bits(self) -> Option<usize> {
        self.byte_len().map(|n| n * 8)
    }

    pub fn is_valid(self) -> bool {
        self != KeyTier::Invalid
    }
}

impl fmt::Display for KeyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "{} bits", bits),
            None => f.write_str("invalid"),
        }
    }
}

/// Map a raw key byte count onto the smallest tier that can hold it.
///
/// Upper bounds are inclusive: 0..=16 is `Small`, 17..=24 is `Medium`,
/// 25..=32 is `Large`, anything longer is `Invalid`.
pub fn classify(byte_count: u64) -> KeyTier {
    KeyTier::SUPPORTED
        .into_iter()
        .find(|tier| tier.byte_len().is_some_and(|len| byte_count <= len as u64))
        .unwrap_or(KeyTier::Invalid)
}
