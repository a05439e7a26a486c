// SPDX-License-Identifier: MIT
//! Caller-owned background tasks for encode/decode
//!
//! One thread per call, owned by an explicit handle with a start/cancel/join
//! lifecycle; no global worker singletons. The worker exclusively owns its
//! buffers and grid; the only traffic is start parameters in, progress
//! fractions and a final result out over an mpsc channel.

use std::sync::mpsc;
use std::thread;

use image::RgbaImage;

use crate::codec::{decode_with, encode_with, CodecError};
use crate::entry::FileEntry;
use crate::mapper::{CancelToken, MapControl};

/// Handle to one in-flight encode or decode task
pub struct TaskHandle<T> {
    progress: mpsc::Receiver<f64>,
    cancel: CancelToken,
    join: thread::JoinHandle<Result<T, CodecError>>,
}

impl<T> TaskHandle<T> {
    /// Progress fractions reported so far, drained without blocking
    pub fn drain_progress(&self) -> Vec<f64> {
        self.progress.try_iter().collect()
    }

    /// Blocking stream of progress fractions; ends when the task finishes
    pub fn progress(&self) -> &mpsc::Receiver<f64> {
        &self.progress
    }

    /// Request cooperative cancellation; the task stops at its next chunk
    /// boundary and `join` returns a cancelled error
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task and take its result
    pub fn join(self) -> Result<T, CodecError> {
        match self.join.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn spawn<T, F>(job: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&mut MapControl<'_>) -> Result<T, CodecError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let join = thread::spawn(move || {
        let mut sink = move |fraction: f64| {
            // The receiver may be gone if the caller dropped the handle early
            let _ = tx.send(fraction);
        };
        let mut ctl = MapControl::new().with_progress(&mut sink).with_cancel(token);
        job(&mut ctl)
    });

    TaskHandle {
        progress: rx,
        cancel,
        join,
    }
}

/// Encode entries on a dedicated thread
pub fn spawn_encode(entries: Vec<FileEntry>) -> TaskHandle<RgbaImage> {
    spawn(move |ctl| encode_with(&entries, ctl))
}

/// Decode a pixel grid on a dedicated thread
pub fn spawn_decode(img: RgbaImage) -> TaskHandle<Vec<FileEntry>> {
    spawn(move |ctl| decode_with(&img, ctl))
}
