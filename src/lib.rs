// SPDX-License-Identifier: MIT
//! # Pixelpack
//!
//! Embeds arbitrary binary files into the pixel data of a lossless raster
//! image and recovers them byte-exactly. Files are packed into a flat
//! container buffer, the buffer is mapped onto the R, G and B channels of an
//! RGBA pixel grid (three payload bytes per pixel, alpha opaque), and the
//! grid can be persisted by any lossless codec such as PNG.
//!
//! ## Format Specification
//!
//! ```text
//! Pixelpack Container Format v1
//! =============================
//!
//! ContainerHeader (16 bytes, little-endian):
//! - Magic: "F2P1" (4 bytes)
//! - Version: 1 (1 byte)
//! - Entry count: 0-255 (1 byte)
//! - Reserved: zero-filled (10 bytes)
//!
//! EntryHeader (106 bytes, one per entry, in order):
//! - Name length (1 byte) + name bytes (64 bytes, zero-padded)
//! - Mime length (1 byte) + mime bytes (32 bytes, zero-padded)
//! - Payload length (4 bytes)
//! - Payload offset, relative to the data section start (4 bytes)
//!
//! Data section (variable size):
//! - All entry payloads concatenated in entry order
//! ```
//!
//! Names longer than 64 bytes and mime types longer than 32 bytes are
//! truncated on encode at a UTF-8 character boundary; decode returns exactly
//! what was stored.
//!
//! ## Usage
//!
//! ```rust
//! use pixelpack::{decode, encode, FileEntry};
//!
//! let entries = vec![
//!     FileEntry::new("notes.txt", "text/plain", b"hello".to_vec()),
//!     FileEntry::new("raw.bin", "application/octet-stream", vec![0, 1, 2]),
//! ];
//!
//! let image = encode(&entries).unwrap();
//! // image.save("packed.png") with a lossless codec, later reload, then:
//! let recovered = decode(&image).unwrap();
//! assert_eq!(recovered, entries);
//! ```
//!
//! Long-running calls can report progress and be cancelled between chunks,
//! either inline through [`MapControl`] or on a dedicated thread through
//! [`spawn_encode`]/[`spawn_decode`]. The codec holds no global state;
//! concurrent calls do not interfere.

pub mod codec;
pub mod entry;
pub mod format;
pub mod mapper;
pub mod planner;
pub mod reader;
pub mod worker;
pub mod writer;

// Re-export main types
pub use codec::{decode, decode_with, encode, encode_with, CodecError};
pub use entry::FileEntry;
pub use format::{FormatError, ENTRY_HEADER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    MAX_ENTRIES, MIME_CAPACITY, NAME_CAPACITY};
pub use mapper::{read_pixels, write_pixels, CancelToken, MapControl, MapError, CHUNK_SIZE};
pub use planner::{plan_canvas, CanvasDimensions};
pub use reader::{deserialize, required_container_len, ContainerReader, ContainerStats, DecodeError};
pub use worker::{spawn_decode, spawn_encode, TaskHandle};
pub use writer::{serialize, ContainerWriter};
