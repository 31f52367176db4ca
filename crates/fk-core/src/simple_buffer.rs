//! Real-valued sample buffer

use crate::{BufferKind, FkError, FkResult, Release, Sample, SampleBuffer, check_index};

const KIND: BufferKind = BufferKind::Simple;

/// Fixed-length vector of real samples
///
/// The length is set at construction and never changes until the buffer is
/// released. Bulk loads copy `min(len, data.len())` elements and leave the
/// remaining tail as it was.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleBuffer {
    samples: Vec<Sample>,
    released: bool,
}

impl SimpleBuffer {
    /// Allocate a zeroed buffer of `size` samples
    pub fn new(size: usize) -> Self {
        Self {
            samples: vec![0.0; size],
            released: false,
        }
    }

    /// Allocate a buffer of `size` samples and load `data` into it
    pub fn from_data(size: usize, data: &[Sample]) -> Self {
        let mut buf = Self::new(size);
        let n = size.min(data.len());
        buf.samples[..n].copy_from_slice(&data[..n]);
        buf
    }

    #[inline]
    fn live(&self) -> FkResult<()> {
        if self.released {
            Err(FkError::Released(KIND.name()))
        } else {
            Ok(())
        }
    }

    /// Number of samples (0 once released)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Read one sample
    pub fn get(&self, index: usize) -> FkResult<Sample> {
        self.live()?;
        check_index(index, self.samples.len())?;
        Ok(self.samples[index])
    }

    /// Write one sample
    pub fn set(&mut self, index: usize, value: Sample) -> FkResult<()> {
        self.live()?;
        check_index(index, self.samples.len())?;
        self.samples[index] = value;
        Ok(())
    }

    /// Load f64 data
    pub fn set_data(&mut self, data: &[f64]) -> FkResult<()> {
        self.live()?;
        let n = self.samples.len().min(data.len());
        self.samples[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    /// Load f32 data one element at a time
    #[allow(clippy::needless_range_loop)]
    pub fn set_data_f32(&mut self, data: &[f32]) -> FkResult<()> {
        self.live()?;
        let n = self.samples.len().min(data.len());
        for i in 0..n {
            self.samples[i] = Sample::from(data[i]);
        }
        Ok(())
    }

    /// Load f32 data without per-index bounds checks
    ///
    /// Produces exactly the same contents as [`set_data_f32`](Self::set_data_f32).
    pub fn set_data_fast(&mut self, data: &[f32]) -> FkResult<()> {
        self.live()?;
        for (dst, &src) in self.samples.iter_mut().zip(data) {
            *dst = Sample::from(src);
        }
        Ok(())
    }

    /// Copy another buffer of the same length into this one
    pub fn copy_from(&mut self, other: &SimpleBuffer) -> FkResult<()> {
        self.live()?;
        other.live()?;
        FkError::check_len(self.samples.len(), other.samples.len())?;
        self.samples.copy_from_slice(&other.samples);
        Ok(())
    }

    /// Copy of the contents, unaffected by later writes to this buffer
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.clone()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    /// Set every sample to `value`
    pub fn fill(&mut self, value: Sample) {
        self.samples.fill(value);
    }

    pub fn zeros(&mut self) {
        self.fill(0.0);
    }

    pub fn ones(&mut self) {
        self.fill(1.0);
    }
}

impl Release for SimpleBuffer {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.samples = Vec::new();
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl SampleBuffer for SimpleBuffer {
    fn kind(&self) -> BufferKind {
        KIND
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn clear(&mut self) {
        self.samples.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        for size in [0, 1, 7, 512, 4096] {
            let buf = SimpleBuffer::new(size);
            assert_eq!(buf.len(), size);
            assert!(buf.as_slice().iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_set_data_round_trip() {
        let mut buf = SimpleBuffer::new(4);
        buf.set_data(&[1.0, -2.0, 3.5, 0.25]).unwrap();
        assert_eq!(buf.to_vec(), vec![1.0, -2.0, 3.5, 0.25]);
    }

    #[test]
    fn test_set_data_length_policy() {
        let mut buf = SimpleBuffer::new(4);
        buf.set_data(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(buf.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);

        // shorter data leaves the tail alone
        buf.set_data(&[9.0]).unwrap();
        assert_eq!(buf.to_vec(), vec![9.0, 2.0, 3.0, 4.0]);

        let fresh = SimpleBuffer::from_data(5, &[1.0, 2.0]);
        assert_eq!(fresh.to_vec(), vec![1.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fast_load_matches_per_element_load() {
        let data: Vec<f32> = (0..300).map(|i| (i as f32 * 0.37).sin() * 1e3).collect();
        let mut slow = SimpleBuffer::new(256);
        let mut fast = SimpleBuffer::new(256);
        slow.set_data_f32(&data).unwrap();
        fast.set_data_fast(&data).unwrap();

        for (a, b) in slow.as_slice().iter().zip(fast.as_slice()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_copy_out_is_independent() {
        let mut buf = SimpleBuffer::from_data(3, &[1.0, 2.0, 3.0]);
        let before = buf.to_vec();
        buf.set(1, 42.0).unwrap();
        assert_eq!(before, vec![1.0, 2.0, 3.0]);
        assert_eq!(buf.get(1).unwrap(), 42.0);
    }

    #[test]
    fn test_index_checked() {
        let mut buf = SimpleBuffer::new(8);
        assert_eq!(
            buf.get(8),
            Err(FkError::IndexOutOfRange { index: 8, len: 8 })
        );
        assert!(buf.set(100, 1.0).is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut buf = SimpleBuffer::new(64);
        buf.release();
        buf.release();
        assert!(buf.is_released());
        assert_eq!(buf.len(), 0);
        assert!(buf.to_vec().is_empty());
        assert_eq!(buf.get(0), Err(FkError::Released("SimpleBuffer")));
        assert!(buf.set_data(&[1.0]).is_err());
    }

    #[test]
    fn test_copy_from_checks_length() {
        let src = SimpleBuffer::from_data(4, &[1.0, 2.0, 3.0, 4.0]);
        let mut dst = SimpleBuffer::new(3);
        assert_eq!(
            dst.copy_from(&src),
            Err(FkError::SizeMismatch { expected: 3, actual: 4 })
        );
    }
}
