//! Store file header.

use crate::error::{CoreError, CoreResult};
use bow_codec::Format;

/// Magic bytes identifying a bow store file.
pub const FILE_MAGIC: [u8; 4] = *b"BOWD";

/// Current file format version.
pub const FILE_VERSION: u16 = 1;

/// Header at offset zero of every store file.
///
/// ```text
/// | magic (4) | version (2) | codec format (1) | reserved (1) | crc32 (4) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileHeader {
    /// Codec format the file was created with.
    pub format: Format,
}

impl FileHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12;

    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// Returns true if `bytes` could be the start of a header whose write
    /// was cut short.
    pub fn is_partial(bytes: &[u8]) -> bool {
        let magic_len = bytes.len().min(FILE_MAGIC.len());
        bytes.len() < Self::SIZE && bytes[..magic_len] == FILE_MAGIC[..magic_len]
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&FILE_MAGIC);
        buf[4..6].copy_from_slice(&FILE_VERSION.to_le_bytes());
        buf[6] = self.format.as_byte();
        let crc = crc32fast::hash(&buf[0..8]);
        buf[8..12].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(CoreError::corruption(format!(
                "file header too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0..4] != FILE_MAGIC {
            return Err(CoreError::corruption("not a bow store file (bad magic)"));
        }

        let stored_crc = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let computed_crc = crc32fast::hash(&bytes[0..8]);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                offset: 0,
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version > FILE_VERSION {
            return Err(CoreError::corruption(format!(
                "unsupported file version {version}"
            )));
        }

        let format = Format::from_byte(bytes[6]).ok_or_else(|| {
            CoreError::corruption(format!("unknown codec format tag {}", bytes[6]))
        })?;

        Ok(Self { format })
    }
}
