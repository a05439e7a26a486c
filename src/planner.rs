// SPDX-License-Identifier: MIT
//! Canvas dimension planner
//!
//! Sizes the smallest near-square canvas able to hold a payload at three
//! bytes per pixel. Width is rounded up to an even value so downstream image
//! encoders never face row-padding ambiguity.

use serde::{Deserialize, Serialize};

use crate::format::BYTES_PER_PIXEL;

/// Width and height of a pixel grid, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
}

impl CanvasDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Payload bytes this canvas can carry
    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for CanvasDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Smallest even-width, near-square canvas holding `total_len` payload bytes.
///
/// Deterministic and pure: `plan_canvas(n).capacity_bytes() >= n` for all n.
pub fn plan_canvas(total_len: usize) -> CanvasDimensions {
    let pixels = total_len.div_ceil(BYTES_PER_PIXEL) as u64;
    if pixels == 0 {
        return CanvasDimensions::new(0, 0);
    }

    // ceil(sqrt(pixels)): float sqrt as a first guess, then exact correction
    let mut side = (pixels as f64).sqrt().ceil() as u64;
    while side > 1 && (side - 1) * (side - 1) >= pixels {
        side -= 1;
    }
    while side * side < pixels {
        side += 1;
    }

    let width = if side % 2 == 0 { side } else { side + 1 };
    let height = pixels.div_ceil(width);

    CanvasDimensions::new(width as u32, height as u32)
}
