// SPDX-License-Identifier: MIT
//! End-to-end pipeline: entries → container → canvas → pixel grid, and back
//!
//! Encode: serialize the entries, plan the smallest canvas for the buffer,
//! map the buffer onto pixels. Decode runs phased: the fixed header region
//! is read first to validate the format and learn the entry count, then the
//! entry-header region to learn the full container length, then the full
//! container. Each phase checks grid capacity before reading.

use image::RgbaImage;
use thiserror::Error;

use crate::entry::FileEntry;
use crate::format::{data_section_start, ContainerHeader, HEADER_SIZE};
use crate::mapper::{read_pixels, write_pixels, MapControl, MapError};
use crate::planner::plan_canvas;
use crate::reader::{required_container_len, ContainerReader, DecodeError};
use crate::writer::serialize;

/// Umbrella error for the encode/decode pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Map(#[from] MapError),
}

impl CodecError {
    /// True when the operation ended by caller request, not by failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CodecError::Map(MapError::Cancelled))
    }
}

/// Encode entries into a pixel grid sized by the planner
pub fn encode(entries: &[FileEntry]) -> Result<RgbaImage, CodecError> {
    encode_with(entries, &mut MapControl::new())
}

/// Encode with caller-supplied progress/cancellation wiring
pub fn encode_with(
    entries: &[FileEntry],
    ctl: &mut MapControl<'_>,
) -> Result<RgbaImage, CodecError> {
    let buffer = serialize(entries);
    let dims = plan_canvas(buffer.len());
    tracing::debug!(bytes = buffer.len(), canvas = %dims, "encoding container");
    Ok(write_pixels(&buffer, dims, ctl)?)
}

/// Decode a pixel grid back into its entries
pub fn decode(img: &RgbaImage) -> Result<Vec<FileEntry>, CodecError> {
    decode_with(img, &mut MapControl::new())
}

/// Decode with caller-supplied progress/cancellation wiring.
///
/// Progress is reported for the final full-container read; the two header
/// phases are at most a few KiB and only honor the cancel token.
pub fn decode_with(
    img: &RgbaImage,
    ctl: &mut MapControl<'_>,
) -> Result<Vec<FileEntry>, CodecError> {
    let mut header_ctl = match ctl.cancel_token() {
        Some(token) => MapControl::new().with_cancel(token),
        None => MapControl::new(),
    };

    // Phase 1: fixed header, validates magic/version and yields entry_count
    let header_prefix = read_pixels(img, HEADER_SIZE, &mut header_ctl)?;
    let header = ContainerHeader::parse(&header_prefix).map_err(DecodeError::Format)?;
    if header.entry_count == 0 {
        return Err(DecodeError::EmptyContainer.into());
    }

    // Phase 2: entry-header table, yields the declared container length
    let table_prefix = read_pixels(img, data_section_start(header.entry_count), &mut header_ctl)?;
    let total_len = required_container_len(&table_prefix).map_err(CodecError::Decode)?;

    // Phase 3: the full container
    let buffer = read_pixels(img, total_len, ctl)?;
    let reader = ContainerReader::from_slice(&buffer).map_err(CodecError::Decode)?;
    tracing::debug!(
        declared = reader.stats().declared_entries,
        valid = reader.stats().valid_entries,
        "decoded container"
    );
    Ok(reader.into_entries())
}
