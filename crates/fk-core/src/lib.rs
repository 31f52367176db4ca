//! fk-core: Buffers and shared types for FrameKit
//!
//! This crate provides the fixed-size buffers every FrameKit stage consumes
//! and produces, the explicit release model and the shared error type.
//!
//! ## Buffer kinds
//! - [`SimpleBuffer`] - real-valued sample vector
//! - [`ComplexBuffer`] - spectrum as norm/phase pairs
//! - [`LongBuffer`] - high-precision vector (filter coefficients)
//! - [`MatrixBuffer`] - height × length grid (per-channel coefficients)
//!
//! Lengths are fixed at construction. Accessors named `to_vec`, `norm`,
//! `phase` and `channel(s)` copy data out, so retained frames never change
//! when the buffer is later overwritten.

mod complex_buffer;
mod error;
mod lifetime;
mod long_buffer;
mod math;
mod matrix_buffer;
mod simple_buffer;

pub use complex_buffer::*;
pub use error::*;
pub use lifetime::*;
pub use long_buffer::*;
pub use matrix_buffer::*;
pub use simple_buffer::*;

/// Type alias for samples (always f64)
pub type Sample = f64;

/// The closed set of buffer representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Simple,
    Complex,
    Long,
    Matrix,
}

impl BufferKind {
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simple => "SimpleBuffer",
            Self::Complex => "ComplexBuffer",
            Self::Long => "LongBuffer",
            Self::Matrix => "MatrixBuffer",
        }
    }
}

/// Operations shared by every buffer kind
pub trait SampleBuffer: Release {
    /// Which representation this buffer is
    fn kind(&self) -> BufferKind;

    /// Number of addressable elements (0 once released)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero the contents without reallocating
    fn clear(&mut self);

    /// `Err(Released(kind))` once the buffer has been released
    #[inline]
    fn check_live(&self) -> FkResult<()> {
        if self.is_released() {
            Err(FkError::Released(self.kind().name()))
        } else {
            Ok(())
        }
    }
}

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> FkResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(FkError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_clears_and_releases() {
        let mut simple = SimpleBuffer::from_data(4, &[1.0; 4]);
        let mut complex = ComplexBuffer::from_norm(3, &[1.0; 3]);
        let mut long = LongBuffer::new(5);
        long.set(2, 7.0).unwrap();
        let mut matrix = MatrixBuffer::from_channels(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

        let buffers: [(&mut dyn SampleBuffer, BufferKind, usize); 4] = [
            (&mut simple, BufferKind::Simple, 4),
            (&mut complex, BufferKind::Complex, 3),
            (&mut long, BufferKind::Long, 5),
            (&mut matrix, BufferKind::Matrix, 4),
        ];
        for (buf, kind, len) in buffers {
            assert_eq!(buf.kind(), kind);
            assert_eq!(buf.len(), len);
            buf.clear();
            assert_eq!(buf.len(), len);
            assert_eq!(buf.check_live(), Ok(()));

            buf.release();
            assert!(buf.is_empty());
            assert_eq!(buf.check_live(), Err(FkError::Released(kind.name())));
        }

        assert_eq!(long.to_vec(), Vec::<f64>::new());
        assert!(complex.norm().is_empty());
    }
}
