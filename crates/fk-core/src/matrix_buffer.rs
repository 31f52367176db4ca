//! Height × length sample grid

use crate::{BufferKind, FkError, FkResult, Release, Sample, SampleBuffer, check_index};

const KIND: BufferKind = BufferKind::Matrix;

/// Fixed grid of `height` channels, each `length` samples long
///
/// Stored row-major: channel `c` occupies `[c * length, (c + 1) * length)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatrixBuffer {
    data: Vec<Sample>,
    height: usize,
    length: usize,
    released: bool,
}

impl MatrixBuffer {
    /// Allocate a zeroed `height` × `length` grid
    pub fn new(height: usize, length: usize) -> Self {
        Self {
            data: vec![0.0; height * length],
            height,
            length,
            released: false,
        }
    }

    /// Build a matrix from equally long channels
    pub fn from_channels(channels: &[Vec<Sample>]) -> FkResult<Self> {
        let length = channels.first().map_or(0, Vec::len);
        let mut mat = Self::new(channels.len(), length);
        for (c, channel) in channels.iter().enumerate() {
            FkError::check_len(length, channel.len())?;
            mat.data[c * length..(c + 1) * length].copy_from_slice(channel);
        }
        Ok(mat)
    }

    #[inline]
    fn live(&self) -> FkResult<()> {
        if self.released {
            Err(FkError::Released(KIND.name()))
        } else {
            Ok(())
        }
    }

    /// Number of channels (0 once released)
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples per channel (0 once released)
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Total element count
    #[inline]
    pub fn size(&self) -> usize {
        self.height * self.length
    }

    /// Same `height` and `length`
    #[inline]
    pub fn same_shape(&self, other: &MatrixBuffer) -> bool {
        self.height == other.height && self.length == other.length
    }

    #[inline]
    fn offset(&self, channel: usize, index: usize) -> FkResult<usize> {
        self.live()?;
        check_index(channel, self.height)?;
        check_index(index, self.length)?;
        Ok(channel * self.length + index)
    }

    pub fn get(&self, channel: usize, index: usize) -> FkResult<Sample> {
        let at = self.offset(channel, index)?;
        Ok(self.data[at])
    }

    pub fn set(&mut self, channel: usize, index: usize, value: Sample) -> FkResult<()> {
        let at = self.offset(channel, index)?;
        self.data[at] = value;
        Ok(())
    }

    /// Borrow one channel
    pub fn channel_slice(&self, channel: usize) -> FkResult<&[Sample]> {
        self.live()?;
        check_index(channel, self.height)?;
        let start = channel * self.length;
        Ok(&self.data[start..start + self.length])
    }

    /// Borrow one channel mutably
    pub fn channel_mut(&mut self, channel: usize) -> FkResult<&mut [Sample]> {
        self.live()?;
        check_index(channel, self.height)?;
        let start = channel * self.length;
        Ok(&mut self.data[start..start + self.length])
    }

    /// Copy of one channel
    pub fn channel(&self, channel: usize) -> FkResult<Vec<Sample>> {
        self.channel_slice(channel).map(<[Sample]>::to_vec)
    }

    /// Copy of every channel, `[height][length]`
    pub fn channels(&self) -> Vec<Vec<Sample>> {
        self.rows().map(<[Sample]>::to_vec).collect()
    }

    /// Overwrite one channel; `data` must be exactly `length` long
    pub fn set_channel(&mut self, channel: usize, data: &[Sample]) -> FkResult<()> {
        let length = self.length;
        let dst = self.channel_mut(channel)?;
        FkError::check_len(length, data.len())?;
        dst.copy_from_slice(data);
        Ok(())
    }

    /// Iterate over channels in order
    pub fn rows(&self) -> impl Iterator<Item = &[Sample]> {
        self.data.chunks_exact(self.length.max(1)).take(self.height)
    }

    /// Iterate mutably over channels in order
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [Sample]> {
        let height = self.height;
        self.data.chunks_exact_mut(self.length.max(1)).take(height)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Sample] {
        &self.data
    }
}

impl Release for MatrixBuffer {
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.data = Vec::new();
        self.height = 0;
        self.length = 0;
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl SampleBuffer for MatrixBuffer {
    fn kind(&self) -> BufferKind {
        KIND
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let mat = MatrixBuffer::new(3, 5);
        assert_eq!(mat.height(), 3);
        assert_eq!(mat.length(), 5);
        assert_eq!(mat.size(), 15);
        assert_eq!(mat.channels(), vec![vec![0.0; 5]; 3]);
    }

    #[test]
    fn test_channel_access() {
        let mut mat = MatrixBuffer::new(2, 3);
        mat.set(1, 2, 7.0).unwrap();
        mat.set_channel(0, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(mat.channel(0).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(mat.channel(1).unwrap(), vec![0.0, 0.0, 7.0]);
        assert_eq!(mat.get(1, 2).unwrap(), 7.0);
        assert!(mat.get(2, 0).is_err());
        assert!(mat.get(0, 3).is_err());
        assert!(mat.set_channel(0, &[1.0]).is_err());
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        let ok = MatrixBuffer::from_channels(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(ok.channels(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(MatrixBuffer::from_channels(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn test_copies_are_independent() {
        let mut mat = MatrixBuffer::new(1, 2);
        let snapshot = mat.channels();
        mat.set(0, 0, 5.0).unwrap();
        assert_eq!(snapshot, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_release() {
        let mut mat = MatrixBuffer::new(4, 4);
        mat.release();
        mat.release();
        assert_eq!(mat.size(), 0);
        assert!(mat.channels().is_empty());
        assert!(mat.channel(0).is_err());
    }
}
