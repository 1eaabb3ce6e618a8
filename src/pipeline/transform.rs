use crate::error::{HarnessError, Result};
use crate::key::KeyBuffer;
use crate::pipeline::chunk::ChunkLayout;
use crate::tier::KeyTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use twofish::cipher::generic_array::GenericArray;
use twofish::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use twofish::Twofish;

/// Direction of the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Encrypt,
    Decrypt,
}

impl Action {
    /// Exact, case-sensitive match on "encrypt"; anything else decrypts
    pub fn select(literal: &str) -> Self {
        if literal == "encrypt" {
            Self::Encrypt
        } else {
            Self::Decrypt
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = HarnessError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "encrypt" => Ok(Self::Encrypt),
            "decrypt" => Ok(Self::Decrypt),
            _ => Err(HarnessError::UnsupportedAction(s.to_string())),
        }
    }
}

/// In-place block transform driven by the stream processor.
///
/// Implementations mutate exactly `layout.block_count()` blocks at the front
/// of `data`, whatever portion of it holds real input. Short chunks therefore
/// reach the primitive with their zero padding included.
pub trait BlockTransform {
    fn encrypt(
        &self,
        data: &mut [u8],
        layout: ChunkLayout,
        key: &KeyBuffer,
        tier: KeyTier,
    ) -> Result<()>;

    fn decrypt(
        &self,
        data: &mut [u8],
        layout: ChunkLayout,
        key: &KeyBuffer,
        tier: KeyTier,
    ) -> Result<()>;

    fn apply(
        &self,
        action: Action,
        data: &mut [u8],
        layout: ChunkLayout,
        key: &KeyBuffer,
        tier: KeyTier,
    ) -> Result<()> {
        match action {
            Action::Encrypt => self.encrypt(data, layout, key, tier),
            Action::Decrypt => self.decrypt(data, layout, key, tier),
        }
    }
}

/// Twofish in ECB mode over every 128-bit cipher block of the chunk
#[derive(Debug, Clone, Copy, Default)]
pub struct TwofishTransform;

/// Twofish cipher block size in bytes
pub const TWOFISH_BLOCK_BYTES: usize = 16;

impl TwofishTransform {
    fn cipher(key: &KeyBuffer, tier: KeyTier) -> Result<Twofish> {
        let material = key
            .material(tier)
            .ok_or_else(|| HarnessError::Transform(format!("no key material for tier {}", tier)))?;
        Twofish::new_from_slice(material)
            .map_err(|_| HarnessError::Transform(format!("bad key length {}", material.len())))
    }

    fn region(data: &mut [u8], layout: ChunkLayout) -> Result<&mut [u8]> {
        let len = layout.capacity();
        if len % TWOFISH_BLOCK_BYTES != 0 {
            return Err(HarnessError::Transform(format!(
                "chunk of {} bytes is not a whole number of cipher blocks",
                len
            )));
        }
        let available = data.len();
        data.get_mut(..len).ok_or_else(|| {
            HarnessError::Transform(format!(
                "buffer holds {} bytes, {} blocks need {}",
                available,
                layout.block_count(),
                len
            ))
        })
    }
}

impl BlockTransform for TwofishTransform {
    fn encrypt(
        &self,
        data: &mut [u8],
        layout: ChunkLayout,
        key: &KeyBuffer,
        tier: KeyTier,
    ) -> Result<()> {
        let cipher = Self::cipher(key, tier)?;
        for block in Self::region(data, layout)?.chunks_exact_mut(TWOFISH_BLOCK_BYTES) {
            cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }

    fn decrypt(
        &self,
        data: &mut [u8],
        layout: ChunkLayout,
        key: &KeyBuffer,
        tier: KeyTier,
    ) -> Result<()> {
        let cipher = Self::cipher(key, tier)?;
        for block in Self::region(data, layout)?.chunks_exact_mut(TWOFISH_BLOCK_BYTES) {
            cipher.decrypt_block(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}
