//! Orthonormal DCT-II over a fixed input size
//!
//! Only the first `outputs` coefficients are kept, so the transform is a
//! precomputed `outputs × size` cosine table.

use fk_core::{FkError, FkResult};

pub(crate) struct Dct {
    size: usize,
    outputs: usize,
    /// Row-major `outputs × size`, scaling folded in
    table: Vec<f64>,
}

impl Dct {
    pub(crate) fn new(size: usize, outputs: usize) -> FkResult<Self> {
        if size == 0 || outputs == 0 || outputs > size {
            return Err(FkError::Construction(format!(
                "DCT needs 0 < outputs <= size, got {outputs} of {size}"
            )));
        }

        let n = size as f64;
        let mut table = Vec::with_capacity(outputs * size);
        for k in 0..outputs {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            for i in 0..size {
                let angle = std::f64::consts::PI * k as f64 * (i as f64 + 0.5) / n;
                table.push(scale * angle.cos());
            }
        }

        Ok(Self { size, outputs, table })
    }

    #[inline]
    pub(crate) fn outputs(&self) -> usize {
        self.outputs
    }

    /// `output.len()` must be `outputs`, `input.len()` must be `size`
    pub(crate) fn forward(&self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), self.size);
        for (out, row) in output.iter_mut().zip(self.table.chunks_exact(self.size)) {
            *out = row.iter().zip(input).map(|(c, x)| c * x).sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant_input_only_has_dc() {
        let dct = Dct::new(8, 8).unwrap();
        let mut out = [0.0; 8];
        dct.forward(&[1.0; 8], &mut out);
        assert_abs_diff_eq!(out[0], 8f64.sqrt(), epsilon = 1e-12);
        for &c in &out[1..] {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_orthonormal_preserves_energy() {
        let dct = Dct::new(16, 16).unwrap();
        let input: Vec<f64> = (0..16).map(|i| (i as f64 * 1.3).cos() - 0.2).collect();
        let mut out = [0.0; 16];
        dct.forward(&input, &mut out);
        let e_in: f64 = input.iter().map(|x| x * x).sum();
        let e_out: f64 = out.iter().map(|x| x * x).sum();
        assert_abs_diff_eq!(e_in, e_out, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_more_outputs_than_inputs() {
        assert!(Dct::new(4, 5).is_err());
        assert!(Dct::new(0, 0).is_err());
        assert_eq!(Dct::new(40, 13).unwrap().outputs(), 13);
    }
}
