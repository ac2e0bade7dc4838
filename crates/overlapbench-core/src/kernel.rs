//! Placeholder device workload.

/// Elementwise placeholder kernel: add `increment` to every element of a
/// device buffer, `iterations` times.
///
/// Stands in for any data-parallel elementwise workload (blocks of a large
/// matrix multiplication, say). Its only required property is that the
/// duration is measurable, which the iteration count controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementwiseKernel {
    /// Value added to every element per iteration.
    pub increment: f64,
    /// Number of passes over the buffer.
    pub iterations: u32,
}

impl ElementwiseKernel {
    /// Create a kernel description.
    #[must_use]
    pub const fn new(increment: f64, iterations: u32) -> Self {
        Self {
            increment,
            iterations,
        }
    }

    /// Result of the kernel for a single input element.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        let mut v = value;
        for _ in 0..self.iterations {
            v += self.increment;
        }
        v
    }

    /// Run the kernel over a whole buffer, iteration-outer like the device
    /// loop.
    pub fn apply_slice(&self, data: &mut [f64]) {
        for _ in 0..self.iterations {
            for v in data.iter_mut() {
                *v += self.increment;
            }
        }
    }
}

impl Default for ElementwiseKernel {
    fn default() -> Self {
        Self::new(1.0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_single_iteration() {
        let kernel = ElementwiseKernel::new(1.0, 1);
        assert_eq!(kernel.apply(0.0), 1.0);
        assert_eq!(kernel.apply(41.0), 42.0);
    }

    #[test]
    fn test_apply_many_iterations() {
        let kernel = ElementwiseKernel::new(0.5, 10);
        assert_eq!(kernel.apply(1.0), 6.0);
    }

    #[test]
    fn test_apply_slice_matches_apply() {
        let kernel = ElementwiseKernel::new(1.0, 3);
        let mut data = vec![0.0, 1.5, -2.0, 100.0];
        let expected: Vec<f64> = data.iter().map(|&v| kernel.apply(v)).collect();

        kernel.apply_slice(&mut data);
        assert_eq!(data, expected);
    }
}
