use crate::capture::Frame;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Rolling window of the most recent frames.
///
/// The tick path pushes and the export path drains; both go through one lock
/// so a drain sees a consistent snapshot and no push is lost or counted twice.
pub struct FrameBuffer {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest when full. Returns true on eviction.
    pub fn push(&self, frame: Frame) -> bool {
        let mut frames = self.frames.lock();
        frames.push_back(frame);
        if frames.len() > self.capacity {
            frames.pop_front();
            true
        } else {
            false
        }
    }

    /// Remove and return every frame in capture order.
    pub fn drain_all(&self) -> Vec<Frame> {
        let mut frames = self.frames.lock();
        frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(seq: u64) -> Frame {
        Frame::new(vec![0; 3], 1, 1, Duration::from_millis(seq * 33), seq).unwrap()
    }

    #[test]
    fn size_is_min_of_pushes_and_capacity() {
        for n in [0u64, 1, 450, 899, 900, 901, 2000] {
            let buffer = FrameBuffer::new(900);
            for i in 0..n {
                buffer.push(frame(i));
            }
            assert_eq!(buffer.len(), (n as usize).min(900), "after {} pushes", n);
        }
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let buffer = FrameBuffer::new(900);
        let mut evictions = 0;
        for i in 1..=901 {
            if buffer.push(frame(i)) {
                evictions += 1;
            }
        }
        assert_eq!(evictions, 1);

        let seqs: Vec<u64> = buffer.drain_all().iter().map(|f| f.sequence).collect();
        assert_eq!(seqs, (2..=901).collect::<Vec<_>>());
    }

    #[test]
    fn drain_leaves_buffer_empty() {
        let buffer = FrameBuffer::new(4);
        for i in 0..3 {
            buffer.push(frame(i));
        }
        assert_eq!(buffer.drain_all().len(), 3);
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());

        buffer.push(frame(42));
        let rest = buffer.drain_all();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].sequence, 42);
    }

    #[test]
    fn concurrent_push_and_drain_lose_nothing() {
        let buffer = Arc::new(FrameBuffer::new(100_000));
        let total = 20_000u64;

        let producer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for i in 0..total {
                    buffer.push(frame(i));
                }
            })
        };

        let mut seen = Vec::new();
        while !producer.is_finished() {
            seen.extend(buffer.drain_all().into_iter().map(|f| f.sequence));
        }
        producer.join().unwrap();
        seen.extend(buffer.drain_all().into_iter().map(|f| f.sequence));

        assert_eq!(seen, (0..total).collect::<Vec<_>>());
    }
}
