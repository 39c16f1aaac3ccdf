use crate::error::FilterError;

/// A discrete 1D kernel with odd support `2 * radius + 1`, centered at offset zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kernel1d {
    radius: usize,
    coeffs: Vec<f32>,
}

impl Kernel1d {
    /// Create a kernel from its coefficients, ordered from offset `-radius` to `+radius`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernelLength`] unless the length is odd.
    pub fn new(coeffs: Vec<f32>) -> Result<Self, FilterError> {
        if coeffs.len() % 2 == 0 {
            return Err(FilterError::InvalidKernelLength(coeffs.len()));
        }
        Ok(Self {
            radius: coeffs.len() / 2,
            coeffs,
        })
    }

    fn from_f64(radius: usize, coeffs: &[f64]) -> Self {
        Self {
            radius,
            coeffs: coeffs.iter().map(|&c| c as f32).collect(),
        }
    }

    /// The radius `r` of the kernel.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// The number of coefficients, `2 * radius + 1`.
    #[inline]
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Always false, a kernel has at least its center tap.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The coefficients ordered from offset `-radius` to `+radius`.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.coeffs
    }

    /// The coefficient at a signed offset from the center, if inside the support.
    pub fn at(&self, offset: isize) -> Option<f32> {
        let idx = offset.checked_add(self.radius as isize)?;
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.coeffs.get(i).copied())
    }
}

/// The Gaussian kernel and its first and second derivatives for one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernels {
    scale: f64,
    smoothing: Kernel1d,
    first_derivative: Kernel1d,
    second_derivative: Kernel1d,
}

impl GaussianKernels {
    /// The scale the kernels were generated for.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Order-0 kernel: symmetric, sums to one.
    pub fn smoothing(&self) -> &Kernel1d {
        &self.smoothing
    }

    /// Order-1 kernel: antisymmetric, unit first moment.
    pub fn first_derivative(&self) -> &Kernel1d {
        &self.first_derivative
    }

    /// Order-2 kernel: symmetric, zero sum, second moment of two.
    pub fn second_derivative(&self) -> &Kernel1d {
        &self.second_derivative
    }

    /// The widest radius of the three kernels.
    pub fn max_radius(&self) -> usize {
        self.smoothing
            .radius
            .max(self.first_derivative.radius)
            .max(self.second_derivative.radius)
    }
}

/// Check that `scale` is a finite value greater than zero.
pub fn validate_scale(scale: f64) -> Result<(), FilterError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(FilterError::InvalidScale(scale))
    }
}

/// Widest kernel radius that is generated, reached at `scale = 16384`.
pub const MAX_KERNEL_RADIUS: usize = 1 << 16;

/// Radii of the order-0, order-1 and order-2 kernels for a scale.
///
/// Higher derivative orders decay slower relative to their peak, so they get a wider support.
///
/// # Errors
///
/// Returns [`FilterError::InvalidScale`] if the scale is not finite and positive, or if
/// the order-2 radius would exceed [`MAX_KERNEL_RADIUS`].
pub fn kernel_radii(scale: f64) -> Result<[usize; 3], FilterError> {
    validate_scale(scale)?;
    if (4.0 * scale).ceil() > MAX_KERNEL_RADIUS as f64 {
        return Err(FilterError::InvalidScale(scale));
    }
    Ok([
        (3.0 * scale).ceil() as usize,
        (3.5 * scale).ceil() as usize,
        (4.0 * scale).ceil() as usize,
    ])
}

fn sample(radius: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    let r = radius as isize;
    (-r..=r).map(|x| f(x as f64)).collect()
}

fn offsets(radius: usize) -> impl Iterator<Item = f64> {
    let r = radius as isize;
    (-r..=r).map(|x| x as f64)
}

/// A normalization divisor, rejected when the sampled Gaussian under- or overflowed.
fn normalizer(value: f64, scale: f64) -> Result<f64, FilterError> {
    if value.is_normal() {
        Ok(value)
    } else {
        Err(FilterError::InvalidScale(scale))
    }
}

/// Create the Gaussian derivative kernels of order 0, 1 and 2 for a scale.
///
/// The continuous functions are sampled at integer offsets and then corrected for
/// discretization and truncation:
///
/// * order 0 is divided by its sum.
/// * order 1 is divided by `|Σ x·k1(x)|`.
/// * order 2 has its mean removed and is divided by `Σ x²·k2(x) / 2`.
///
/// The sums are evaluated in `f64`, the stored coefficients are `f32`.
///
/// # Errors
///
/// Returns [`FilterError::InvalidScale`] if the scale is rejected by [`kernel_radii`],
/// or if it is so small (below about `0.026`) that the samples next to the center
/// underflow and a normalization sum is no longer a normal float.
///
/// # Arguments
///
/// * `scale` - The standard deviation of the Gaussian, finite and > 0.
///
/// # Example
///
/// ```
/// use fastfilters_filter::kernels::gaussian_derivative_kernels;
///
/// let kernels = gaussian_derivative_kernels(1.0).unwrap();
/// assert_eq!(kernels.smoothing().radius(), 3);
/// assert_eq!(kernels.first_derivative().radius(), 4);
/// assert_eq!(kernels.second_derivative().radius(), 4);
/// ```
pub fn gaussian_derivative_kernels(scale: f64) -> Result<GaussianKernels, FilterError> {
    let [r0, r1, r2] = kernel_radii(scale)?;

    let scale2 = scale * scale;
    let a0 = 1.0 / ((std::f64::consts::TAU).sqrt() * scale);
    let a1 = -a0 / scale2;
    let a2 = -a1 / scale2;
    let b = -0.5 / scale2;

    let mut k0 = sample(r0, |x| a0 * (b * x * x).exp());
    let sum0 = normalizer(k0.iter().sum::<f64>(), scale)?;
    k0.iter_mut().for_each(|k| *k /= sum0);

    let mut k1 = sample(r1, |x| a1 * x * (b * x * x).exp());
    let moment1 = offsets(r1)
        .zip(k1.iter())
        .map(|(x, &k)| x * k)
        .sum::<f64>()
        .abs();
    let moment1 = normalizer(moment1, scale)?;
    k1.iter_mut().for_each(|k| *k /= moment1);

    let mut k2 = sample(r2, |x| (a1 + a2 * x * x) * (b * x * x).exp());
    let mean2 = k2.iter().sum::<f64>() / k2.len() as f64;
    k2.iter_mut().for_each(|k| *k -= mean2);
    let moment2 = offsets(r2)
        .zip(k2.iter())
        .map(|(x, &k)| x * x * k)
        .sum::<f64>()
        / 2.0;
    let moment2 = normalizer(moment2, scale)?;
    k2.iter_mut().for_each(|k| *k /= moment2);

    Ok(GaussianKernels {
        scale,
        smoothing: Kernel1d::from_f64(r0, &k0),
        first_derivative: Kernel1d::from_f64(r1, &k1),
        second_derivative: Kernel1d::from_f64(r2, &k2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCALES: [f64; 7] = [0.3, 0.7, 1.0, 1.6, 3.5, 5.0, 10.0];

    fn moment(kernel: &Kernel1d, power: i32) -> f64 {
        offsets(kernel.radius())
            .zip(kernel.as_slice())
            .map(|(x, &k)| x.powi(power) * k as f64)
            .sum()
    }

    #[test]
    fn test_kernel_radii() -> Result<(), FilterError> {
        assert_eq!(kernel_radii(0.3)?, [1, 2, 2]);
        assert_eq!(kernel_radii(1.0)?, [3, 4, 4]);
        assert_eq!(kernel_radii(1.6)?, [5, 6, 7]);
        assert_eq!(kernel_radii(3.5)?, [11, 13, 14]);
        Ok(())
    }

    #[test]
    fn test_invalid_scale() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                gaussian_derivative_kernels(scale),
                Err(FilterError::InvalidScale(_))
            ));
        }
    }

    #[test]
    fn test_huge_scale_rejected() -> Result<(), FilterError> {
        assert_eq!(kernel_radii(16384.0)?[2], MAX_KERNEL_RADIUS);
        assert_eq!(
            kernel_radii(16384.5),
            Err(FilterError::InvalidScale(16384.5))
        );
        assert_eq!(
            gaussian_derivative_kernels(1e12),
            Err(FilterError::InvalidScale(1e12))
        );
        Ok(())
    }

    #[test]
    fn test_tiny_scale_rejected() {
        // exp(-0.5 / s²) underflows at x = ±1, the first moment would be zero
        for scale in [0.02, 0.026, 1e-10, f64::MIN_POSITIVE] {
            assert_eq!(
                gaussian_derivative_kernels(scale),
                Err(FilterError::InvalidScale(scale))
            );
        }
    }

    #[test]
    fn test_small_scale_limit_kernels() -> Result<(), FilterError> {
        let k = gaussian_derivative_kernels(0.03)?;
        for kernel in [k.smoothing(), k.first_derivative(), k.second_derivative()] {
            assert!(kernel.as_slice().iter().all(|c| c.is_finite()));
        }
        assert_relative_eq!(k.first_derivative().as_slice()[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(k.first_derivative().as_slice()[2], -0.5, epsilon = 1e-6);
        assert_relative_eq!(moment(k.smoothing(), 0), 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_smoothing_sums_to_one() -> Result<(), FilterError> {
        for scale in SCALES {
            let k = gaussian_derivative_kernels(scale)?;
            assert_relative_eq!(moment(k.smoothing(), 0), 1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_first_derivative_antisymmetric() -> Result<(), FilterError> {
        for scale in SCALES {
            let k = gaussian_derivative_kernels(scale)?;
            let k1 = k.first_derivative();
            let r = k1.radius() as isize;
            for i in 0..=r {
                assert_eq!(k1.at(i), k1.at(-i).map(|v| -v));
            }
            // a unit ascending ramp has derivative +1 under out[p] = Σ k[j]·in[p - j]
            assert_relative_eq!(moment(k1, 1), -1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_second_derivative_symmetric() -> Result<(), FilterError> {
        for scale in SCALES {
            let k = gaussian_derivative_kernels(scale)?;
            let k2 = k.second_derivative();
            let r = k2.radius() as isize;
            for i in 0..=r {
                assert_eq!(k2.at(i), k2.at(-i));
            }
            assert_relative_eq!(moment(k2, 0), 0.0, epsilon = 1e-5);
            assert_relative_eq!(moment(k2, 2), 2.0, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_kernel_at_outside_support() -> Result<(), FilterError> {
        let k = gaussian_derivative_kernels(1.0)?;
        let k0 = k.smoothing();
        assert_eq!(k0.len(), 7);
        assert!(k0.at(3).is_some());
        assert!(k0.at(4).is_none());
        assert!(k0.at(-4).is_none());
        assert!(k0.at(isize::MIN).is_none());
        Ok(())
    }

    #[test]
    fn test_kernel_new_requires_odd_length() -> Result<(), FilterError> {
        assert_eq!(
            Kernel1d::new(vec![0.5, 0.5]),
            Err(FilterError::InvalidKernelLength(2))
        );
        assert_eq!(Kernel1d::new(vec![]), Err(FilterError::InvalidKernelLength(0)));
        let k = Kernel1d::new(vec![0.25, 0.5, 0.25])?;
        assert_eq!(k.radius(), 1);
        assert_eq!(k.at(-1), Some(0.25));
        Ok(())
    }

    #[test]
    fn test_max_radius() -> Result<(), FilterError> {
        let k = gaussian_derivative_kernels(5.0)?;
        assert_eq!(k.max_radius(), 20);
        assert_eq!(k.scale(), 5.0);
        Ok(())
    }
}
