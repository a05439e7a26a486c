// SPDX-License-Identifier: MIT
//! Container reader: parses a flat byte buffer back into entries

use serde::Serialize;
use thiserror::Error;

use crate::entry::FileEntry;
use crate::format::{ContainerHeader, EntryHeader, FormatError, ENTRY_HEADER_SIZE, HEADER_SIZE};

/// Fatal decode failures. Per-entry bounds violations are not here: they are
/// recoverable, logged, and only become fatal as `NoValidEntries` when every
/// declared entry is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("container declares no entries")]
    EmptyContainer,

    #[error("no entries passed bounds validation")]
    NoValidEntries,
}

/// Size breakdown of a parsed container
#[derive(Debug, Clone, Serialize)]
pub struct ContainerStats {
    pub total_size: usize,
    pub header_size: usize,
    pub entry_headers_size: usize,
    pub payload_size: usize,
    /// Entries declared by the header
    pub declared_entries: usize,
    /// Entries that survived bounds validation
    pub valid_entries: usize,
}

/// Parsed view of a container buffer
#[derive(Debug)]
pub struct ContainerReader {
    entries: Vec<FileEntry>,
    stats: ContainerStats,
}

impl ContainerReader {
    /// Parse a container from a byte buffer.
    ///
    /// The entry-header loop stops early (without failing) if the buffer ends
    /// before `entry_count` headers have been read. Entries whose payload
    /// bounds exceed the buffer are skipped with a warning.
    pub fn from_slice(data: &[u8]) -> Result<Self, DecodeError> {
        let header = ContainerHeader::parse(data)?;
        if header.entry_count == 0 {
            return Err(DecodeError::EmptyContainer);
        }

        let data_start = header.data_section_start();
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        let mut payload_size = 0usize;
        let mut headers_read = 0usize;

        for index in 0..header.entry_count as usize {
            let start = HEADER_SIZE + index * ENTRY_HEADER_SIZE;
            let Some(raw) = data.get(start..start + ENTRY_HEADER_SIZE) else {
                tracing::warn!(
                    declared = header.entry_count,
                    read = index,
                    "buffer ends inside entry header table, stopping early"
                );
                break;
            };
            headers_read += 1;

            let entry = EntryHeader::from_bytes(raw.try_into().unwrap());
            let Some(payload) = data_start
                .checked_add(entry.data_offset as usize)
                .and_then(|abs| data.get(abs..abs + entry.byte_length as usize))
            else {
                tracing::warn!(
                    index,
                    offset = entry.data_offset,
                    len = entry.byte_length,
                    "entry payload exceeds buffer bounds, skipping"
                );
                continue;
            };

            payload_size += payload.len();
            entries.push(FileEntry {
                name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                mime: String::from_utf8_lossy(entry.mime_bytes()).into_owned(),
                payload: payload.to_vec(),
            });
        }

        if entries.is_empty() {
            return Err(DecodeError::NoValidEntries);
        }

        let stats = ContainerStats {
            total_size: data.len(),
            header_size: HEADER_SIZE,
            entry_headers_size: headers_read * ENTRY_HEADER_SIZE,
            payload_size,
            declared_entries: header.entry_count as usize,
            valid_entries: entries.len(),
        };

        Ok(Self { entries, stats })
    }

    /// Entries in declared order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }

    pub fn stats(&self) -> &ContainerStats {
        &self.stats
    }
}

/// Deserialize a container buffer into its entries in one call
pub fn deserialize(data: &[u8]) -> Result<Vec<FileEntry>, DecodeError> {
    ContainerReader::from_slice(data).map(ContainerReader::into_entries)
}

/// Full container length declared by a header-region prefix.
///
/// The prefix must cover the fixed header; entry headers present in the
/// prefix contribute their payload end offsets. Used for the phased image
/// read: parse the header region first, then fetch exactly this many bytes.
pub fn required_container_len(prefix: &[u8]) -> Result<usize, DecodeError> {
    let header = ContainerHeader::parse(prefix)?;
    if header.entry_count == 0 {
        return Err(DecodeError::EmptyContainer);
    }

    let mut data_len = 0usize;
    for index in 0..header.entry_count as usize {
        let start = HEADER_SIZE + index * ENTRY_HEADER_SIZE;
        let Some(raw) = prefix.get(start..start + ENTRY_HEADER_SIZE) else {
            break;
        };
        let entry = EntryHeader::from_bytes(raw.try_into().unwrap());
        data_len = data_len.max(entry.data_end());
    }

    Ok(header.data_section_start() + data_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::data_section_start;
    use crate::writer::serialize;

    fn two_entries() -> Vec<FileEntry> {
        vec![
            FileEntry::new("a.txt", "text/plain", vec![1, 2, 3]),
            FileEntry::new("b.bin", "application/octet-stream", vec![]),
        ]
    }

    #[test]
    fn test_roundtrip_two_entries() {
        let entries = two_entries();
        let decoded = deserialize(&serialize(&entries)).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_empty_payload_survives() {
        let decoded = deserialize(&serialize(&two_entries())).unwrap();
        assert_eq!(decoded[1].payload, Vec::<u8>::new());
    }

    #[test]
    fn test_entries_keep_declared_order() {
        let entries: Vec<_> = (0..20)
            .map(|i| FileEntry::new(format!("f{i}"), "x", vec![i as u8; i]))
            .collect();
        let decoded = deserialize(&serialize(&entries)).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_short_buffer_is_format_error() {
        let err = deserialize(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, DecodeError::Format(FormatError::Truncated { .. })));
    }

    #[test]
    fn test_bad_magic_is_format_error() {
        let mut buf = serialize(&two_entries());
        buf[0..4].copy_from_slice(b"ZZZZ");
        let err = deserialize(&buf).unwrap_err();
        assert!(matches!(err, DecodeError::Format(FormatError::BadMagic { .. })));
    }

    #[test]
    fn test_zero_entries_is_empty_container() {
        let buf = serialize(&[]);
        assert_eq!(deserialize(&buf).unwrap_err(), DecodeError::EmptyContainer);
    }

    #[test]
    fn test_out_of_bounds_entry_skipped_not_fatal() {
        let mut buf = serialize(&two_entries());
        // Corrupt the first entry's byte_length so its payload overruns the buffer
        let len_field = HEADER_SIZE + 98;
        buf[len_field..len_field + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let reader = ContainerReader::from_slice(&buf).unwrap();
        assert_eq!(reader.entries().len(), 1);
        assert_eq!(reader.entries()[0].name, "b.bin");
        assert_eq!(reader.stats().declared_entries, 2);
        assert_eq!(reader.stats().valid_entries, 1);
    }

    #[test]
    fn test_all_entries_out_of_bounds_is_fatal() {
        let mut buf = serialize(&[FileEntry::new("a", "x", vec![1])]);
        let len_field = HEADER_SIZE + 98;
        buf[len_field..len_field + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        assert_eq!(deserialize(&buf).unwrap_err(), DecodeError::NoValidEntries);
    }

    #[test]
    fn test_truncated_header_table_stops_early() {
        let entries = vec![
            FileEntry::new("a", "x", vec![1]),
            FileEntry::new("b", "x", vec![2]),
        ];
        let buf = serialize(&entries);
        // Cut inside the second entry header: its payload bytes are gone too,
        // so only the declared-but-unreadable tail is lost. The first entry's
        // payload offset now points past the truncated end, so nothing is
        // recoverable and decode fails rather than reading past the buffer.
        let cut = HEADER_SIZE + ENTRY_HEADER_SIZE + 10;
        let err = deserialize(&buf[..cut]).unwrap_err();
        assert_eq!(err, DecodeError::NoValidEntries);
    }

    #[test]
    fn test_truncation_roundtrip_keeps_prefix() {
        let long_name = "n".repeat(100);
        let entries = vec![FileEntry::new(long_name.clone(), "text/plain", vec![5])];
        let decoded = deserialize(&serialize(&entries)).unwrap();

        assert_eq!(decoded[0].name.len(), 64);
        assert!(long_name.starts_with(&decoded[0].name));
    }

    #[test]
    fn test_required_container_len_matches_buffer() {
        let entries = two_entries();
        let buf = serialize(&entries);
        let headers_end = data_section_start(entries.len() as u8);

        assert_eq!(required_container_len(&buf[..headers_end]).unwrap(), buf.len());
        assert_eq!(required_container_len(&buf).unwrap(), buf.len());
    }

    #[test]
    fn test_required_container_len_rejects_bad_header() {
        assert!(matches!(
            required_container_len(&[0u8; 2]).unwrap_err(),
            DecodeError::Format(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_stats_sizes_add_up() {
        let entries = two_entries();
        let buf = serialize(&entries);
        let reader = ContainerReader::from_slice(&buf).unwrap();
        let stats = reader.stats();

        assert_eq!(
            stats.header_size + stats.entry_headers_size + stats.payload_size,
            stats.total_size
        );
    }
}
