//! Capture thread -> tick loop handoff
//!
//! Single-producer/single-consumer ring buffer. The capture callback pushes
//! without ever blocking; the tick loop drains to the newest frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ringbuf::traits::*;
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{AudioFrame, AudioSource, SourceError};

/// State visible to both halves
#[derive(Debug, Default)]
struct Shared {
    /// Frames rejected because the ring was full
    dropped: AtomicU64,
    /// Set when the sender is dropped
    closed: AtomicBool,
}

/// Create a bounded frame channel holding at most `capacity` frames (min 1).
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    let rb = HeapRb::<AudioFrame>::new(capacity.max(1));
    let (prod, cons): (HeapProd<AudioFrame>, HeapCons<AudioFrame>) = rb.split();
    let shared = Arc::new(Shared::default());

    (
        FrameSender {
            prod,
            shared: shared.clone(),
        },
        FrameReceiver {
            cons,
            shared,
            seen_dropped: 0,
        },
    )
}

/// Capture-side half. Move this into the audio callback.
pub struct FrameSender {
    prod: HeapProd<AudioFrame>,
    shared: Arc<Shared>,
}

impl FrameSender {
    /// Queue a frame. Returns `false` (and counts the loss) when the ring is full.
    pub fn push(&mut self, frame: AudioFrame) -> bool {
        match self.prod.try_push(frame) {
            Ok(()) => true,
            Err(_) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Total frames lost to overflow so far
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for FrameSender {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}

/// Tick-side half
pub struct FrameReceiver {
    cons: HeapCons<AudioFrame>,
    shared: Arc<Shared>,
    seen_dropped: u64,
}

impl FrameReceiver {
    /// Frames currently waiting
    pub fn pending(&self) -> usize {
        self.cons.occupied_len()
    }
}

impl AudioSource for FrameReceiver {
    /// Yields the newest queued frame; older ones are stale and discarded.
    fn pull_frame(&mut self) -> Result<Option<AudioFrame>, SourceError> {
        // Read the flag before draining so every push made before the close is seen
        let closed = self.shared.closed.load(Ordering::Acquire);

        let mut latest = None;
        let mut stale = 0usize;
        while let Some(frame) = self.cons.try_pop() {
            if latest.replace(frame).is_some() {
                stale += 1;
            }
        }
        if stale > 0 {
            log::trace!("Skipped {} stale capture frame(s)", stale);
        }

        let dropped = self.shared.dropped.load(Ordering::Relaxed);
        if dropped > self.seen_dropped {
            log::debug!(
                "Capture queue overflowed: {} frame(s) dropped",
                dropped - self.seen_dropped
            );
            self.seen_dropped = dropped;
        }

        match latest {
            Some(frame) => Ok(Some(frame)),
            None if closed => Err(SourceError::Disconnected),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_yields_newest_frame() {
        let (mut tx, mut rx) = frame_channel(4);
        assert!(tx.push(AudioFrame::dc(0.1, 8)));
        assert!(tx.push(AudioFrame::dc(0.2, 8)));
        assert!(tx.push(AudioFrame::dc(0.3, 8)));
        assert_eq!(rx.pending(), 3);

        let frame = rx.pull_frame().unwrap().unwrap();
        assert_eq!(frame, AudioFrame::dc(0.3, 8));
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn test_empty_queue_is_not_an_error() {
        let (_tx, mut rx) = frame_channel(2);
        assert_eq!(rx.pull_frame(), Ok(None));
    }

    #[test]
    fn test_overflow_drops_without_blocking() {
        let (mut tx, mut rx) = frame_channel(2);
        assert!(tx.push(AudioFrame::dc(0.1, 4)));
        assert!(tx.push(AudioFrame::dc(0.2, 4)));
        assert!(!tx.push(AudioFrame::dc(0.3, 4)));
        assert_eq!(tx.dropped(), 1);

        // Oldest survivors are delivered, newest of them wins
        assert_eq!(rx.pull_frame().unwrap(), Some(AudioFrame::dc(0.2, 4)));
    }

    #[test]
    fn test_disconnect_after_drain() {
        let (mut tx, mut rx) = frame_channel(2);
        tx.push(AudioFrame::dc(0.5, 4));
        drop(tx);

        assert_eq!(rx.pull_frame().unwrap(), Some(AudioFrame::dc(0.5, 4)));
        assert_eq!(rx.pull_frame(), Err(SourceError::Disconnected));
    }

    #[test]
    fn test_cross_thread_handoff() {
        let (mut tx, mut rx) = frame_channel(64);
        let producer = std::thread::spawn(move || {
            for i in 0..32 {
                tx.push(AudioFrame::dc(i as f32 / 32.0, 16));
            }
        });
        producer.join().unwrap();

        let frame = rx.pull_frame().unwrap().unwrap();
        assert_eq!(frame, AudioFrame::dc(31.0 / 32.0, 16));
        assert_eq!(rx.pull_frame(), Err(SourceError::Disconnected));
    }
}
