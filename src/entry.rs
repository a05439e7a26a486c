// SPDX-License-Identifier: MIT
//! File entry value type and name/mime truncation rules

use serde::{Deserialize, Serialize};

use crate::format::{MIME_CAPACITY, NAME_CAPACITY};

/// One named, typed payload embedded in a container.
///
/// The entry itself is unbounded; the container stores at most 64 name bytes
/// and 32 mime bytes. Longer values are truncated on encode (lossy on encode,
/// exact on decode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub mime: String,
    pub payload: Vec<u8>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            payload,
        }
    }

    /// The name exactly as the container will store it
    pub fn stored_name(&self) -> &str {
        truncate_to_boundary(&self.name, NAME_CAPACITY)
    }

    /// The mime type exactly as the container will store it
    pub fn stored_mime(&self) -> &str {
        truncate_to_boundary(&self.mime, MIME_CAPACITY)
    }
}

impl std::fmt::Display for FileEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {} bytes)",
            self.name,
            self.mime,
            self.payload.len()
        )
    }
}

/// Longest prefix of `s` that fits in `cap` bytes and ends on a char boundary.
///
/// Multi-byte characters straddling the capacity limit are dropped whole, so
/// stored name/mime fields always hold valid UTF-8.
pub(crate) fn truncate_to_boundary(s: &str, cap: usize) -> &str {
    if s.len() <= cap {
        return s;
    }
    let mut end = cap;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
