use crate::models::error::RecorderError;

/// Fixed-capacity staging arena between the real-time capture loop and the
/// slower medium drain.
///
/// Wrap in `Arc<parking_lot::Mutex<SampleArena>>`; the capture context and
/// the drain context lock it briefly and never across a medium write. The
/// write discipline is enforced by the API: `append`, `mark_drain_pending`
/// and `complete_drain` belong to the capture context (which owns the
/// capture cursor), `drain_block` to the drain context (which owns the
/// drain cursor). Each side only reads the other's cursor.
///
/// The arena is one-shot per epoch: filled from offset 0 towards capacity,
/// drained, then both cursors reset together and the epoch counter bumps.
/// Once the capture cursor wraps while a drain is outstanding it must stay
/// strictly behind the drain cursor; `append` detects a violation and
/// returns [`RecorderError::CaptureOverrun`] instead of silently
/// overwriting audio that has not reached the medium yet.
#[derive(Debug)]
pub struct SampleArena {
    data: Vec<i16>,
    capture_cursor: usize,
    drain_cursor: usize,
    capacity: usize,
    epoch: u64,
    drain_pending: bool,
    wrapped: bool,
}

impl SampleArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            capture_cursor: 0,
            drain_cursor: 0,
            capacity,
            epoch: 0,
            drain_pending: false,
            wrapped: false,
        }
    }

    /// Append freshly captured interleaved stereo samples.
    ///
    /// Keeps the first sample of each frame (channel selection is fixed by
    /// the hardware wiring) and advances the capture cursor modulo the
    /// arena capacity.
    pub fn append(&mut self, frames: &[i16]) -> Result<(), RecorderError> {
        for &sample in frames.iter().step_by(2) {
            if self.wrapped && self.capture_cursor >= self.drain_cursor {
                return Err(RecorderError::CaptureOverrun {
                    capture: self.capture_cursor,
                    drain: self.drain_cursor,
                });
            }
            self.data[self.capture_cursor] = sample;
            self.capture_cursor += 1;
            if self.capture_cursor == self.capacity {
                self.capture_cursor = 0;
                self.wrapped = true;
            }
        }
        Ok(())
    }

    /// Whole capture chunks that still fit before the arena wraps.
    pub fn cycles_until_full(&self, chunk: usize) -> usize {
        (self.capacity - self.capture_cursor) / chunk
    }

    /// Record that a drain has been requested for the current epoch.
    pub fn mark_drain_pending(&mut self) {
        self.drain_pending = true;
    }

    /// Copy out the next drain block, at most `max_samples` long, up to the
    /// exclusive bound `upto`. Returns `None` once the bound is reached.
    pub fn drain_block(&mut self, max_samples: usize, upto: usize) -> Option<Vec<i16>> {
        if self.drain_cursor >= upto {
            return None;
        }
        let end = (self.drain_cursor + max_samples).min(upto);
        let block = self.data[self.drain_cursor..end].to_vec();
        self.drain_cursor = end;
        Some(block)
    }

    /// Reset both cursors for the next epoch. Only legal once the drain
    /// context has reported completion — never while a drain is in flight.
    pub fn complete_drain(&mut self) {
        self.capture_cursor = 0;
        self.drain_cursor = 0;
        self.drain_pending = false;
        self.wrapped = false;
        self.epoch += 1;
    }

    /// Samples filled this epoch: the full arena once the capture cursor
    /// has wrapped, otherwise the capture cursor itself.
    pub fn filled_extent(&self) -> usize {
        if self.wrapped {
            self.capacity
        } else {
            self.capture_cursor
        }
    }

    pub fn capture_cursor(&self) -> usize {
        self.capture_cursor
    }

    pub fn drain_cursor(&self) -> usize {
        self.drain_cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn drain_pending(&self) -> bool {
        self.drain_pending
    }
}
