// SPDX-License-Identifier: MIT
//! Container writer: serializes entries into a flat byte buffer

use crate::entry::FileEntry;
use crate::format::{ContainerHeader, EntryHeader, ENTRY_HEADER_SIZE, HEADER_SIZE, MAX_ENTRIES};

/// Builder for serializing a list of entries into one container buffer.
///
/// Serialization never fails. The two defensive behaviors are silent:
/// entry lists longer than 255 are truncated to the first 255, and name/mime
/// fields longer than their stored capacity are truncated on encode (see
/// [`FileEntry::stored_name`]).
#[derive(Debug, Default)]
pub struct ContainerWriter {
    entries: Vec<FileEntry>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add one entry. Entries are serialized in insertion order.
    pub fn add_entry(&mut self, entry: FileEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Add an entry, sniffing a mime type from payload magic bytes when the
    /// caller supplied an empty one
    #[cfg(feature = "mime-detection")]
    pub fn add_entry_sniffed(&mut self, mut entry: FileEntry) -> &mut Self {
        if entry.mime.is_empty() {
            if let Some(kind) = infer::get(&entry.payload) {
                entry.mime = kind.mime_type().to_string();
            }
        }
        self.add_entry(entry)
    }

    /// Number of entries currently queued (before the 255 cap)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact size of the buffer `finalize` will produce
    pub fn serialized_len(&self) -> usize {
        let retained = self.entries.len().min(MAX_ENTRIES);
        let payload: usize = self.entries[..retained]
            .iter()
            .map(|e| e.payload.len())
            .sum();
        HEADER_SIZE + retained * ENTRY_HEADER_SIZE + payload
    }

    /// Serialize all retained entries into one exact-size buffer
    pub fn finalize(self) -> Vec<u8> {
        let retained = self.entries.len().min(MAX_ENTRIES);
        if retained < self.entries.len() {
            tracing::warn!(
                dropped = self.entries.len() - retained,
                "container holds at most 255 entries, truncating list"
            );
        }
        let entries = &self.entries[..retained];

        let total = HEADER_SIZE
            + retained * ENTRY_HEADER_SIZE
            + entries.iter().map(|e| e.payload.len()).sum::<usize>();
        let mut buffer = Vec::with_capacity(total);

        ContainerHeader::new(retained as u8).write_to_buffer(&mut buffer);

        // Offsets are relative to the data section start: each entry begins
        // where the previous entry's payload ended.
        let mut offset = 0u32;
        for entry in entries {
            EntryHeader::new(
                entry.stored_name().as_bytes(),
                entry.stored_mime().as_bytes(),
                entry.payload.len() as u32,
                offset,
            )
            .write_to_buffer(&mut buffer);
            offset += entry.payload.len() as u32;
        }

        for entry in entries {
            buffer.extend_from_slice(&entry.payload);
        }

        debug_assert_eq!(buffer.len(), total);
        buffer
    }
}

/// Serialize a slice of entries in one call
pub fn serialize(entries: &[FileEntry]) -> Vec<u8> {
    let mut writer = ContainerWriter::new();
    for entry in entries {
        writer.add_entry(entry.clone());
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{data_section_start, MAGIC};

    #[test]
    fn test_empty_writer_produces_bare_header() {
        let buf = ContainerWriter::new().finalize();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], MAGIC);
        assert_eq!(buf[5], 0); // entry_count
    }

    #[test]
    fn test_serialized_len_is_exact() {
        let mut writer = ContainerWriter::new();
        writer.add_entry(FileEntry::new("a", "text/plain", vec![1, 2, 3]));
        writer.add_entry(FileEntry::new("b", "application/octet-stream", vec![]));

        let expected = writer.serialized_len();
        assert_eq!(expected, HEADER_SIZE + 2 * ENTRY_HEADER_SIZE + 3);
        assert_eq!(writer.finalize().len(), expected);
    }

    #[test]
    fn test_offsets_are_cumulative_payload_sizes() {
        let mut writer = ContainerWriter::new();
        writer.add_entry(FileEntry::new("a", "x", vec![0; 10]));
        writer.add_entry(FileEntry::new("b", "x", vec![0; 5]));
        writer.add_entry(FileEntry::new("c", "x", vec![0; 7]));
        let buf = writer.finalize();

        let offset_of = |i: usize| {
            let base = HEADER_SIZE + i * ENTRY_HEADER_SIZE + 102;
            u32::from_le_bytes(buf[base..base + 4].try_into().unwrap())
        };
        assert_eq!(offset_of(0), 0);
        assert_eq!(offset_of(1), 10);
        assert_eq!(offset_of(2), 15);
    }

    #[test]
    fn test_payloads_concatenated_in_order() {
        let mut writer = ContainerWriter::new();
        writer.add_entry(FileEntry::new("a", "x", vec![1, 2]));
        writer.add_entry(FileEntry::new("b", "x", vec![3]));
        let buf = writer.finalize();

        let data_start = data_section_start(2);
        assert_eq!(&buf[data_start..], &[1, 2, 3]);
    }

    #[test]
    fn test_entry_list_capped_at_255() {
        let mut writer = ContainerWriter::new();
        for i in 0..300 {
            writer.add_entry(FileEntry::new(format!("f{i}"), "x", vec![i as u8]));
        }
        let buf = writer.finalize();

        assert_eq!(buf[5], 255);
        assert_eq!(buf.len(), HEADER_SIZE + 255 * ENTRY_HEADER_SIZE + 255);
    }

    #[cfg(feature = "mime-detection")]
    #[test]
    fn test_sniffed_mime_fills_empty_field() {
        let png_payload = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let mut writer = ContainerWriter::new();
        writer.add_entry_sniffed(FileEntry::new("img", "", png_payload));
        let buf = writer.finalize();

        let mime_len = buf[HEADER_SIZE + 65] as usize;
        let mime = &buf[HEADER_SIZE + 66..HEADER_SIZE + 66 + mime_len];
        assert_eq!(mime, b"image/png");
    }

    #[cfg(feature = "mime-detection")]
    #[test]
    fn test_sniffed_mime_keeps_caller_value() {
        let png_payload = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let mut writer = ContainerWriter::new();
        writer.add_entry_sniffed(FileEntry::new("img", "application/custom", png_payload));
        let buf = writer.finalize();

        let mime_len = buf[HEADER_SIZE + 65] as usize;
        let mime = &buf[HEADER_SIZE + 66..HEADER_SIZE + 66 + mime_len];
        assert_eq!(mime, b"application/custom");
    }

    #[test]
    fn test_serialize_free_function_matches_builder() {
        let entries = vec![
            FileEntry::new("a.txt", "text/plain", vec![9, 8, 7]),
            FileEntry::new("b.bin", "application/octet-stream", vec![]),
        ];

        let mut writer = ContainerWriter::new();
        for e in &entries {
            writer.add_entry(e.clone());
        }
        assert_eq!(serialize(&entries), writer.finalize());
    }
}
