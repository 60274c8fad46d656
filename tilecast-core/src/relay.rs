//! Single-slot frame hand-off between the backend thread and the sampler.
//!
//! The backend submits every frame it completes; the session's sampling
//! task periodically asks for the latest one. Only the freshest frame is
//! kept, so a fast producer and a slow consumer never queue up work.
//!
//! Synchronisation is one `parking_lot::Mutex` critical section around a
//! full-frame copy. The sequence counter is also kept in an atomic so the
//! consumer can detect "nothing new" without touching the lock.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::TilecastError;

// ── FrameRelay ───────────────────────────────────────────────────

/// Last-write-wins frame buffer shared by one producer and one consumer.
///
/// Pixels are 24-bit RGB values (`0x00RRGGBB`) stored one per `u32`.
#[derive(Debug)]
pub struct FrameRelay {
    width: u32,
    height: u32,
    pixel_count: usize,
    buffer: Mutex<Box<[u32]>>,
    sequence: AtomicU64,
}

impl FrameRelay {
    /// Allocate a relay for frames of `width × height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, TilecastError> {
        if width == 0 || height == 0 {
            return Err(TilecastError::InvalidDimensions { width, height });
        }
        let pixel_count = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            pixel_count,
            buffer: Mutex::new(vec![0; pixel_count].into_boxed_slice()),
            sequence: AtomicU64::new(0),
        })
    }

    /// Copy a completed frame into the slot, replacing whatever is there.
    ///
    /// Extra pixels beyond `pixel_count` are ignored; a short frame only
    /// overwrites its own length.
    pub fn submit(&self, pixels: &[u32]) {
        let len = pixels.len().min(self.pixel_count);
        let mut buffer = self.buffer.lock();
        buffer[..len].copy_from_slice(&pixels[..len]);
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Copy the current frame into `dest` if it is newer than `last_seen`.
    ///
    /// Returns the sequence number of the copied frame, or `None` when the
    /// frame has not changed since `last_seen` (no lock, no copy). Passing
    /// `None` for `last_seen` always copies.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is shorter than [`pixel_count`](Self::pixel_count).
    pub fn latest(&self, dest: &mut [u32], last_seen: Option<u64>) -> Option<u64> {
        if Some(self.sequence.load(Ordering::Acquire)) == last_seen {
            return None;
        }

        let buffer = self.buffer.lock();
        dest[..self.pixel_count].copy_from_slice(&buffer);
        // Submitters bump the counter while holding the lock, so this value
        // matches the frame just copied.
        Some(self.sequence.load(Ordering::Acquire))
    }

    /// Number of frames submitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels per frame (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            FrameRelay::new(0, 144),
            Err(TilecastError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn first_read_copies_blank_frame() {
        let relay = FrameRelay::new(4, 2).unwrap();
        let mut dest = vec![0xDEAD; 8];
        assert_eq!(relay.latest(&mut dest, None), Some(0));
        assert!(dest.iter().all(|&p| p == 0));
    }

    #[test]
    fn no_update_without_submit() {
        let relay = FrameRelay::new(4, 2).unwrap();
        let mut dest = vec![0; 8];
        relay.submit(&[7; 8]);
        let seq = relay.latest(&mut dest, None);
        assert_eq!(seq, Some(1));
        assert_eq!(relay.latest(&mut dest, seq), None);
        assert_eq!(relay.latest(&mut dest, seq), None);
    }

    #[test]
    fn submit_strictly_increases_sequence() {
        let relay = FrameRelay::new(2, 2).unwrap();
        let mut last = relay.sequence();
        for i in 0..10u32 {
            relay.submit(&[i; 4]);
            let seq = relay.sequence();
            assert!(seq > last);
            last = seq;
        }
    }

    #[test]
    fn last_write_wins() {
        let relay = FrameRelay::new(2, 2).unwrap();
        let mut dest = vec![0; 4];
        relay.submit(&[1; 4]);
        relay.submit(&[2; 4]);
        relay.submit(&[3, 3, 3, 4]);
        assert_eq!(relay.latest(&mut dest, Some(0)), Some(3));
        assert_eq!(dest, vec![3, 3, 3, 4]);
    }

    #[test]
    fn short_and_long_frames() {
        let relay = FrameRelay::new(2, 2).unwrap();
        let mut dest = vec![0; 4];
        relay.submit(&[9; 4]);
        relay.submit(&[5, 5]);
        relay.latest(&mut dest, None);
        assert_eq!(dest, vec![5, 5, 9, 9]);

        relay.submit(&[6; 10]);
        relay.latest(&mut dest, None);
        assert_eq!(dest, vec![6; 4]);
    }

    #[test]
    fn reader_never_sees_torn_frame() {
        let relay = Arc::new(FrameRelay::new(64, 64).unwrap());
        let writer = {
            let relay = Arc::clone(&relay);
            std::thread::spawn(move || {
                let mut frame = vec![0u32; 64 * 64];
                for value in 1..=500u32 {
                    frame.fill(value);
                    relay.submit(&frame);
                }
            })
        };

        let mut dest = vec![0u32; 64 * 64];
        let mut last = None;
        for _ in 0..2000 {
            if let Some(seq) = relay.latest(&mut dest, last) {
                let first = dest[0];
                assert!(dest.iter().all(|&p| p == first), "torn frame at seq {seq}");
                last = Some(seq);
            }
        }
        writer.join().unwrap();
    }
}
