use crate::error::Result;
use crate::fileio::{open_file, read_up_to, stream_len};
use crate::instrument::Instrumentation;
use crate::tier::{classify, KeyTier};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

/// Size of the buffer handed back when the key fits no tier
pub const PLACEHOLDER_KEY_BYTES: usize = 4;

/// Zero-padded key storage.
///
/// A valid buffer is one byte longer than its tier's key length; the extra
/// trailing byte is always zero and never reaches the cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyBuffer {
    bytes: Vec<u8>,
}

impl KeyBuffer {
    /// All-zero buffer sized for `tier` (tier length + 1), or the
    /// placeholder size for `Invalid`
    pub fn zeroed(tier: KeyTier) -> Self {
        let len = tier
            .byte_len()
            .map(|n| n + 1)
            .unwrap_or(PLACEHOLDER_KEY_BYTES);
        Self {
            bytes: vec![0u8; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key bytes the cipher consumes for `tier`
    pub fn material(&self, tier: KeyTier) -> Option<&[u8]> {
        tier.byte_len().and_then(|n| self.bytes.get(..n))
    }
}

impl std::fmt::Debug for KeyBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBuffer")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Load key material from `path` and classify it.
///
/// An unsupported key length is not an error: the returned tier is
/// `Invalid` and callers must check it before use.
pub fn load_key(path: &Path, sinks: &mut Instrumentation) -> Result<(KeyBuffer, KeyTier)> {
    let mut file = open_file("key", path)?;
    load_key_from(&mut file, sinks)
}

/// Same as [`load_key`] over any seekable reader
pub fn load_key_from<R: Read + Seek>(
    reader: &mut R,
    sinks: &mut Instrumentation,
) -> Result<(KeyBuffer, KeyTier)> {
    let file_size = stream_len(reader)?;
    let tier = classify(file_size);
    let mut key = KeyBuffer::zeroed(tier);

    match tier.byte_len() {
        Some(key_len) => {
            let read = read_up_to(reader, &mut key.bytes)?;
            debug!(file_size, read, %tier, "key loaded");
            sinks.log(format_args!("Loaded key - {} bytes.", file_size))?;
            if key_len as u64 != file_size {
                sinks.log(format_args!("Expanding key to {} bytes.", key_len))?;
            }
        }
        None => {
            warn!(file_size, "unsupported key size");
            sinks.console_and_log(format_args!("Not supported key - {} bytes.", file_size))?;
        }
    }

    Ok((key, tier))
}
