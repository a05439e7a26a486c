// SPDX-License-Identifier: MIT
//! Container wire format: fixed-size headers, field layout, validation
//!
//! All multi-byte integers are little-endian. The layout is the bit-exact
//! compatibility surface of the crate: two independent implementations must
//! produce identical buffers for the same entries.

use thiserror::Error;

/// Container magic bytes: family "F2P", version generation 1
pub const MAGIC: &[u8; 4] = b"F2P1";

/// Container format version accepted by this build
pub const FORMAT_VERSION: u8 = 1;

/// ContainerHeader size in bytes: magic + version + entry_count + reserved
pub const HEADER_SIZE: usize = 16;

/// Maximum number of entries a container can declare (entry_count is a u8)
pub const MAX_ENTRIES: usize = 255;

/// Stored capacity of an entry name, in bytes
pub const NAME_CAPACITY: usize = 64;

/// Stored capacity of an entry mime type, in bytes
pub const MIME_CAPACITY: usize = 32;

/// EntryHeader size in bytes:
/// name_length(1) + name(64) + mime_length(1) + mime(32) + byte_length(4) + data_offset(4)
pub const ENTRY_HEADER_SIZE: usize = 106;

/// Payload bytes carried per pixel (R, G, B; alpha never carries payload)
pub const BYTES_PER_PIXEL: usize = 3;

/// Header-level format violations. Fatal for the whole decode call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("container truncated: {len} bytes, fixed header needs 16")]
    Truncated { len: usize },

    #[error("bad magic bytes {found:?}, expected \"F2P1\"")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported format version {0}, this build supports version 1")]
    UnsupportedVersion(u8),
}

/// Fixed container header at offset 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Format version (currently 1)
    pub version: u8,

    /// Number of EntryHeaders declared to follow
    pub entry_count: u8,
}

impl ContainerHeader {
    /// Create a header for a container holding `entry_count` entries
    pub fn new(entry_count: u8) -> Self {
        Self {
            version: FORMAT_VERSION,
            entry_count,
        }
    }

    /// Parse and validate a header from the start of a buffer
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated { len: bytes.len() });
        }

        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[0..4]);
        if &found != MAGIC {
            return Err(FormatError::BadMagic { found });
        }

        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            entry_count: bytes[5],
        })
    }

    /// Append the 16-byte header to a buffer
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(HEADER_SIZE);
        buffer.extend_from_slice(MAGIC);
        buffer.push(self.version);
        buffer.push(self.entry_count);
        // Reserved tail, zero-filled for forward layout stability
        buffer.extend_from_slice(&[0u8; HEADER_SIZE - 6]);
    }

    /// Absolute offset of the data section for this header's entry count
    #[inline]
    pub fn data_section_start(&self) -> usize {
        data_section_start(self.entry_count)
    }
}

/// Absolute offset of the data section for a given entry count
#[inline]
pub fn data_section_start(entry_count: u8) -> usize {
    HEADER_SIZE + entry_count as usize * ENTRY_HEADER_SIZE
}

/// Fixed per-entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    /// Bytes of `name` actually used (<= 64)
    pub name_length: u8,

    /// UTF-8 name bytes, unused tail zero
    pub name: [u8; NAME_CAPACITY],

    /// Bytes of `mime` actually used (<= 32)
    pub mime_length: u8,

    /// UTF-8 mime bytes, unused tail zero
    pub mime: [u8; MIME_CAPACITY],

    /// Exact payload size in bytes
    pub byte_length: u32,

    /// Payload offset relative to the data section start (not the buffer)
    pub data_offset: u32,
}

impl EntryHeader {
    /// Build a header from already-truncated name/mime bytes
    pub fn new(name_bytes: &[u8], mime_bytes: &[u8], byte_length: u32, data_offset: u32) -> Self {
        debug_assert!(name_bytes.len() <= NAME_CAPACITY);
        debug_assert!(mime_bytes.len() <= MIME_CAPACITY);

        let mut name = [0u8; NAME_CAPACITY];
        name[..name_bytes.len()].copy_from_slice(name_bytes);
        let mut mime = [0u8; MIME_CAPACITY];
        mime[..mime_bytes.len()].copy_from_slice(mime_bytes);

        Self {
            name_length: name_bytes.len() as u8,
            name,
            mime_length: mime_bytes.len() as u8,
            mime,
            byte_length,
            data_offset,
        }
    }

    /// Parse an entry header from a 106-byte slice
    pub fn from_bytes(bytes: &[u8; ENTRY_HEADER_SIZE]) -> Self {
        let name_length = bytes[0];
        let mut name = [0u8; NAME_CAPACITY];
        name.copy_from_slice(&bytes[1..1 + NAME_CAPACITY]);

        let mime_length = bytes[65];
        let mut mime = [0u8; MIME_CAPACITY];
        mime.copy_from_slice(&bytes[66..66 + MIME_CAPACITY]);

        let byte_length = u32::from_le_bytes(bytes[98..102].try_into().unwrap());
        let data_offset = u32::from_le_bytes(bytes[102..106].try_into().unwrap());

        Self {
            name_length,
            name,
            mime_length,
            mime,
            byte_length,
            data_offset,
        }
    }

    /// Append the 106-byte entry header to a buffer
    pub fn write_to_buffer(&self, buffer: &mut Vec<u8>) {
        buffer.reserve(ENTRY_HEADER_SIZE);
        buffer.push(self.name_length);
        buffer.extend_from_slice(&self.name);
        buffer.push(self.mime_length);
        buffer.extend_from_slice(&self.mime);
        buffer.extend_from_slice(&self.byte_length.to_le_bytes());
        buffer.extend_from_slice(&self.data_offset.to_le_bytes());
    }

    /// Used portion of the name field, clamped to capacity for foreign buffers
    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        &self.name[..(self.name_length as usize).min(NAME_CAPACITY)]
    }

    /// Used portion of the mime field, clamped to capacity for foreign buffers
    #[inline]
    pub fn mime_bytes(&self) -> &[u8] {
        &self.mime[..(self.mime_length as usize).min(MIME_CAPACITY)]
    }

    /// End of this entry's payload relative to the data section start
    #[inline]
    pub fn data_end(&self) -> usize {
        self.data_offset as usize + self.byte_length as usize
    }
}
