//! High-precision vector used for filter coefficients

use crate::{BufferKind, FkError, FkResult, Release, SampleBuffer, check_index};

const KIND: BufferKind = BufferKind::Long;

/// Fixed-length f64 vector
///
/// Filters hand these out as read-only views of their feedback and
/// feedforward coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LongBuffer {
    values: Vec<f64>,
    released: bool,
}

impl LongBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            values: vec![0.0; size],
            released: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> FkResult<f64> {
        if self.released {
            return Err(FkError::Released(KIND.name()));
        }
        check_index(index, self.values.len())?;
        Ok(self.values[index])
    }

    pub fn set(&mut self, index: usize, value: f64) -> FkResult<()> {
        if self.released {
            return Err(FkError::Released(KIND.name()));
        }
        check_index(index, self.values.len())?;
        self.values[index] = value;
        Ok(())
    }

    /// Copy of the contents
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.clone()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

impl Release for LongBuffer {
    fn release(&mut self) {
        if !self.released {
            self.values = Vec::new();
            self.released = true;
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl SampleBuffer for LongBuffer {
    fn kind(&self) -> BufferKind {
        KIND
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn clear(&mut self) {
        self.values.fill(0.0);
    }
}
