/// Circular window over the most recent audio samples.
///
/// Wrap in `parking_lot::Mutex` for cross-thread access. Writers never
/// block on readers: overflow drops the oldest samples, and reads copy the
/// newest samples without consuming them.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    write_index: usize,
    available: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            available: 0,
        }
    }

    /// Append samples, dropping the oldest on overflow.
    ///
    /// If `samples` is larger than capacity, only the last `capacity` samples are kept.
    pub fn write(&mut self, samples: &[f32]) {
        let capacity = self.buffer.len();
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available = (self.available + samples.len()).min(capacity);
    }

    /// Append the per-frame mean of an interleaved block.
    pub fn write_downmixed(&mut self, samples: &[f32], channels: usize) {
        if channels <= 1 {
            self.write(samples);
            return;
        }
        let capacity = self.buffer.len();
        let scale = 1.0 / channels as f32;
        let frame_count = samples.len() / channels;
        let skip = frame_count.saturating_sub(capacity);
        for frame in samples.chunks_exact(channels).skip(skip) {
            self.buffer[self.write_index] = frame.iter().sum::<f32>() * scale;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available = (self.available + frame_count - skip).min(capacity);
    }

    /// Fill `out` with the newest samples, oldest first.
    ///
    /// When fewer than `out.len()` samples have been written, the front of
    /// `out` is zero-filled so the newest sample always lands last.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let capacity = self.buffer.len();
        let wanted = out.len().min(capacity);
        let copied = wanted.min(self.available);
        let pad = out.len() - copied;
        out[..pad].fill(0.0);

        let start = (self.write_index + capacity - copied) % capacity;
        for (i, slot) in out[pad..].iter_mut().enumerate() {
            *slot = self.buffer[(start + i) % capacity];
        }
    }

    /// Number of valid samples held (at most capacity).
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_after_partial_fill_is_front_padded() {
        let mut buf = RingBuffer::new(8);
        buf.write(&[1.0, 2.0, 3.0]);

        let mut out = [9.0; 5];
        buf.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buf.count(), 3);
    }

    #[test]
    fn overflow_keeps_newest() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1.0, 2.0, 3.0, 4.0]);
        buf.write(&[5.0, 6.0]);

        let mut out = [0.0; 4];
        buf.copy_latest(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buf.count(), 4);
    }

    #[test]
    fn write_larger_than_capacity() {
        let mut buf = RingBuffer::new(3);
        buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut out = [0.0; 3];
        buf.copy_latest(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn reading_does_not_consume() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1.0, 2.0]);

        let mut first = [0.0; 2];
        let mut second = [0.0; 2];
        buf.copy_latest(&mut first);
        buf.copy_latest(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn shorter_read_takes_newest_tail() {
        let mut buf = RingBuffer::new(6);
        buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut out = [0.0; 2];
        buf.copy_latest(&mut out);
        assert_eq!(out, [4.0, 5.0]);
    }

    #[test]
    fn downmix_averages_frames() {
        let mut buf = RingBuffer::new(4);
        buf.write_downmixed(&[0.2, 0.8, 0.4, 0.6, 1.0], 2);

        assert_eq!(buf.count(), 2);
        let mut out = [0.0; 2];
        buf.copy_latest(&mut out);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_overflow_keeps_newest_frames() {
        let mut buf = RingBuffer::new(2);
        buf.write_downmixed(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0], 2);

        let mut out = [0.0; 2];
        buf.copy_latest(&mut out);
        assert_eq!(out, [2.0, 3.0]);
    }

    #[test]
    fn reset_clears_window() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1.0, 2.0]);
        buf.reset();

        assert!(buf.is_empty());
        let mut out = [7.0; 2];
        buf.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0]);
    }
}
