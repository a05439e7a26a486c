// SPDX-License-Identifier: MIT
//! Chunked mapping between byte buffers and RGBA pixel grids
//!
//! Byte `i` lands in pixel `i / 3`, channel `i % 3` (R, G, B); the alpha
//! channel is forced opaque and never carries payload. Work proceeds in
//! fixed-size chunks aligned to whole pixels: between chunks the operation
//! reports progress, polls for cancellation, and yields the thread so a
//! cooperative scheduler stays responsive. Nothing is checked mid-chunk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::format::BYTES_PER_PIXEL;
use crate::planner::CanvasDimensions;

/// Upper bound on bytes processed per chunk. Tunable, independent of canvas
/// dimensions; the effective stride is rounded down to whole pixels.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunk stride in bytes, aligned so no pixel's triplet straddles a boundary
const CHUNK_BYTES: usize = CHUNK_SIZE - CHUNK_SIZE % BYTES_PER_PIXEL;

/// Pixel-mapping failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("canvas holds {capacity} payload bytes, cannot fit {required}")]
    InsufficientCapacity { capacity: usize, required: usize },

    #[error("pixel grid holds {available} usable bytes, {required} requested")]
    InsufficientData { available: usize, required: usize },

    /// Caller-initiated, distinct from failure: no partial result is kept
    #[error("operation cancelled")]
    Cancelled,
}

/// Shared cancellation flag, checked only at chunk boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next chunk boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-call progress and cancellation wiring.
///
/// The progress sink is invoked synchronously at chunk boundaries with
/// `bytes_done / total_bytes`; fractions are non-decreasing and a completed
/// call always ends on exactly 1.0 (including zero-length work).
#[derive(Default)]
pub struct MapControl<'a> {
    progress: Option<&'a mut dyn FnMut(f64)>,
    cancel: Option<CancelToken>,
}

impl<'a> MapControl<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, sink: &'a mut dyn FnMut(f64)) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.cancel.clone()
    }

    fn report(&mut self, done: usize, total: usize) {
        if let Some(sink) = self.progress.as_mut() {
            let fraction = if total == 0 {
                1.0
            } else {
                done as f64 / total as f64
            };
            sink(fraction);
        }
    }

    fn ensure_live(&self) -> Result<(), MapError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(MapError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Map a byte buffer onto a fresh pixel grid of the given dimensions.
///
/// Trailing capacity beyond the buffer stays black; alpha is opaque
/// everywhere.
pub fn write_pixels(
    buf: &[u8],
    dims: CanvasDimensions,
    ctl: &mut MapControl<'_>,
) -> Result<RgbaImage, MapError> {
    let capacity = dims.capacity_bytes();
    if capacity < buf.len() {
        return Err(MapError::InsufficientCapacity {
            capacity,
            required: buf.len(),
        });
    }

    let mut img = RgbaImage::from_pixel(dims.width, dims.height, Rgba([0, 0, 0, 0xFF]));
    let width = dims.width as usize;
    let total = buf.len();

    let mut start = 0;
    while start < total {
        ctl.ensure_live()?;
        let end = (start + CHUNK_BYTES).min(total);

        for i in (start..end).step_by(BYTES_PER_PIXEL) {
            let pixel = i / BYTES_PER_PIXEL;
            let x = (pixel % width) as u32;
            let y = (pixel / width) as u32;
            // The final pixel may be fed fewer than 3 bytes; missing
            // channels keep the black fill.
            let r = buf[i];
            let g = buf.get(i + 1).copied().unwrap_or(0);
            let b = buf.get(i + 2).copied().unwrap_or(0);
            img.put_pixel(x, y, Rgba([r, g, b, 0xFF]));
        }

        start = end;
        ctl.report(start, total);
        std::thread::yield_now();
    }

    if total == 0 {
        ctl.ensure_live()?;
        ctl.report(0, 0);
    }

    Ok(img)
}

/// Read exactly `expected_len` bytes back out of a pixel grid.
///
/// Callers learn `expected_len` by first reading a header-sized prefix; see
/// [`crate::codec::decode`]. Fails rather than silently truncating when the
/// grid cannot hold that many payload bytes.
pub fn read_pixels(
    img: &RgbaImage,
    expected_len: usize,
    ctl: &mut MapControl<'_>,
) -> Result<Vec<u8>, MapError> {
    let dims = CanvasDimensions::new(img.width(), img.height());
    let available = dims.capacity_bytes();
    if available < expected_len {
        return Err(MapError::InsufficientData {
            available,
            required: expected_len,
        });
    }

    const CHUNK_PIXELS: usize = CHUNK_BYTES / BYTES_PER_PIXEL;
    let width = img.width() as usize;
    let total_pixels = expected_len.div_ceil(BYTES_PER_PIXEL);
    let mut out = Vec::with_capacity(expected_len);

    let mut pixel = 0;
    while pixel < total_pixels {
        ctl.ensure_live()?;
        let chunk_end = (pixel + CHUNK_PIXELS).min(total_pixels);

        for p in pixel..chunk_end {
            let x = (p % width) as u32;
            let y = (p / width) as u32;
            let px = img.get_pixel(x, y);
            for channel in 0..BYTES_PER_PIXEL {
                if out.len() < expected_len {
                    out.push(px[channel]);
                }
            }
        }

        pixel = chunk_end;
        ctl.report(out.len(), expected_len);
        std::thread::yield_now();
    }

    if expected_len == 0 {
        ctl.ensure_live()?;
        ctl.report(0, 0);
    }

    debug_assert_eq!(out.len(), expected_len);
    Ok(out)
}
