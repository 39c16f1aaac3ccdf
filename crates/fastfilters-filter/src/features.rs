use fastfilters_tensor::Tensor;
use num_traits::AsPrimitive;

use crate::cache::KernelCache;
use crate::error::FilterError;
use crate::kernels::{kernel_radii, GaussianKernels};
use crate::parallel::{for_each_chunk_mut, ExecutionStrategy};
use crate::separable_filter::{
    axis_responses_impl, separable_filter_impl, AxisResponses, ResponseSet,
};

/// Number of channels appended by [`compute_features`].
pub const NUM_FEATURES: usize = 3;

/// The channels of a feature map, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureChannel {
    /// Gaussian smoothing along every axis.
    Smoothing,
    /// Euclidean norm of the Gaussian first derivatives.
    GradientMagnitude,
    /// Sum of the Gaussian second derivatives.
    LaplacianOfGaussian,
}

impl FeatureChannel {
    /// All channels, ordered by their index in the trailing axis.
    pub const ALL: [FeatureChannel; NUM_FEATURES] = [
        FeatureChannel::Smoothing,
        FeatureChannel::GradientMagnitude,
        FeatureChannel::LaplacianOfGaussian,
    ];

    /// Index of the channel along the trailing axis of the output.
    pub fn index(self) -> usize {
        match self {
            FeatureChannel::Smoothing => 0,
            FeatureChannel::GradientMagnitude => 1,
            FeatureChannel::LaplacianOfGaussian => 2,
        }
    }
}

/// Options for a feature computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureOptions {
    /// How the axis passes and the composition are scheduled.
    pub strategy: ExecutionStrategy,
}

impl FeatureOptions {
    /// Options with the given execution strategy.
    pub fn with_strategy(strategy: ExecutionStrategy) -> Self {
        Self { strategy }
    }
}

/// Check the scale and the image shape against each other.
///
/// Runs before any kernel is looked up, so nothing is generated or allocated for
/// an input that is going to be rejected.
fn validate(shape: &[usize], scale: f64) -> Result<(), FilterError> {
    let [_, _, radius] = kernel_radii(scale)?;

    if shape.is_empty() {
        return Err(FilterError::ZeroDimensional);
    }

    if let Some(axis) = shape.iter().position(|&extent| extent == 0) {
        return Err(FilterError::EmptyAxis { axis });
    }

    // the order-2 kernel is the widest one
    if let Some(axis) = shape.iter().position(|&extent| radius >= extent) {
        return Err(FilterError::KernelTooLarge {
            axis,
            radius,
            extent: shape[axis],
        });
    }

    Ok(())
}

/// Validate, fetch the kernels and run `op` on the image converted to `f64`.
fn run<T, R, F>(
    image: &Tensor<T>,
    scale: f64,
    cache: &KernelCache,
    options: &FeatureOptions,
    op: F,
) -> Result<R, FilterError>
where
    T: AsPrimitive<f64> + Sync,
    R: Send,
    F: FnOnce(&[f64], &GaussianKernels, bool) -> Result<R, FilterError> + Send,
{
    validate(image.shape(), scale)?;
    let kernels = cache.get_or_create(scale)?;

    let strategy = options.strategy;
    let parallel = strategy.is_parallel(image.numel());
    log::debug!(
        "computing features for shape {:?} at scale {} ({:?}, parallel: {})",
        image.shape(),
        scale,
        strategy,
        parallel
    );

    strategy.install(|| {
        let src = image.iter().map(|v| v.as_()).collect::<Vec<f64>>();
        op(&src, &kernels, parallel)
    })?
}

/// Euclidean norm of the first derivatives at position `i`.
fn magnitude(first_derivatives: &[Vec<f64>], i: usize) -> f64 {
    first_derivatives
        .iter()
        .map(|d| d[i] * d[i])
        .sum::<f64>()
        .sqrt()
}

/// Combine the axis responses into interleaved `[smoothing, gradient, laplacian]` pixels.
fn compose(responses: &AxisResponses, parallel: bool) -> Result<Vec<f32>, FilterError> {
    let mut dst = vec![0.0f32; responses.smoothed.len() * NUM_FEATURES];

    for_each_chunk_mut(&mut dst, NUM_FEATURES, parallel, |i, pixel| {
        let gradient = magnitude(&responses.first_derivatives, i);
        pixel[FeatureChannel::Smoothing.index()] = responses.smoothed[i] as f32;
        pixel[FeatureChannel::GradientMagnitude.index()] = gradient as f32;
        pixel[FeatureChannel::LaplacianOfGaussian.index()] = responses.laplacian[i] as f32;
    })?;

    Ok(dst)
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

/// Compute the multi-scale feature map of an N-D image.
///
/// The output has the shape of the image with a trailing axis of [`NUM_FEATURES`]
/// channels ordered as [`FeatureChannel::ALL`]: Gaussian smoothing, gradient
/// magnitude and Laplacian of Gaussian. Edges are handled by mirroring about the
/// edge sample.
///
/// Kernels come from [`KernelCache::global`] and the work is scheduled with the
/// default [`FeatureOptions`].
///
/// # Arguments
///
/// * `image` - The input image with at least one axis. Any element type convertible to `f64`.
/// * `scale` - The standard deviation of the Gaussian, finite and > 0.
///
/// # Errors
///
/// * [`FilterError::InvalidScale`] if the scale is not finite and positive.
/// * [`FilterError::ZeroDimensional`] or [`FilterError::EmptyAxis`] for an empty image.
/// * [`FilterError::KernelTooLarge`] if some axis is not longer than `ceil(4 * scale)`.
///
/// # Example
///
/// ```
/// use fastfilters_filter::features::compute_features;
/// use fastfilters_tensor::Tensor;
///
/// let image = Tensor::from_shape_val(&[16, 16], 7u8);
/// let features = compute_features(&image, 1.0).unwrap();
/// assert_eq!(features.shape(), &[16, 16, 3]);
/// ```
pub fn compute_features<T>(image: &Tensor<T>, scale: f64) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    compute_features_with(
        image,
        scale,
        KernelCache::global(),
        &FeatureOptions::default(),
    )
}

/// Compute the multi-scale feature map of an N-D image with an explicit cache and options.
///
/// Same as [`compute_features`], but kernels are looked up in (and added to) `cache`.
pub fn compute_features_with<T>(
    image: &Tensor<T>,
    scale: f64,
    cache: &KernelCache,
    options: &FeatureOptions,
) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    let data = run(image, scale, cache, options, |src, kernels, parallel| {
        let responses =
            axis_responses_impl(src, image.shape(), kernels, ResponseSet::ALL, parallel)?;
        compose(&responses, parallel)
    })?;

    let mut shape = image.shape().to_vec();
    shape.push(NUM_FEATURES);
    Ok(Tensor::from_shape_vec(&shape, data)?)
}

/// Smooth an N-D image with the Gaussian of the given scale.
///
/// Equal to the [`FeatureChannel::Smoothing`] channel of [`compute_features`], without
/// the derivative passes.
pub fn gaussian_smoothing<T>(image: &Tensor<T>, scale: f64) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    gaussian_smoothing_with(
        image,
        scale,
        KernelCache::global(),
        &FeatureOptions::default(),
    )
}

/// Same as [`gaussian_smoothing`] with an explicit cache and options.
pub fn gaussian_smoothing_with<T>(
    image: &Tensor<T>,
    scale: f64,
    cache: &KernelCache,
    options: &FeatureOptions,
) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    let data = run(image, scale, cache, options, |src, kernels, parallel| {
        let axes = (0..image.ndim()).collect::<Vec<_>>();
        let mut dst = vec![0.0; src.len()];
        separable_filter_impl(
            src,
            &mut dst,
            image.shape(),
            kernels.smoothing(),
            &axes,
            parallel,
        )?;
        Ok(to_f32(&dst))
    })?;
    Ok(Tensor::from_shape_vec(image.shape(), data)?)
}

/// Gradient magnitude of an N-D image at the given scale.
///
/// Equal to the [`FeatureChannel::GradientMagnitude`] channel of [`compute_features`].
pub fn gradient_magnitude<T>(image: &Tensor<T>, scale: f64) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    gradient_magnitude_with(
        image,
        scale,
        KernelCache::global(),
        &FeatureOptions::default(),
    )
}

/// Same as [`gradient_magnitude`] with an explicit cache and options.
///
/// Only the first-derivative responses are computed.
pub fn gradient_magnitude_with<T>(
    image: &Tensor<T>,
    scale: f64,
    cache: &KernelCache,
    options: &FeatureOptions,
) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    let outputs = ResponseSet {
        smoothed: false,
        first_derivatives: true,
        laplacian: false,
    };
    let data = run(image, scale, cache, options, |src, kernels, parallel| {
        let responses = axis_responses_impl(src, image.shape(), kernels, outputs, parallel)?;
        let mut dst = vec![0.0f32; src.len()];
        for_each_chunk_mut(&mut dst, 1, parallel, |i, value| {
            value[0] = magnitude(&responses.first_derivatives, i) as f32;
        })?;
        Ok(dst)
    })?;
    Ok(Tensor::from_shape_vec(image.shape(), data)?)
}

/// Laplacian of Gaussian of an N-D image at the given scale.
///
/// Equal to the [`FeatureChannel::LaplacianOfGaussian`] channel of [`compute_features`].
pub fn laplacian_of_gaussian<T>(
    image: &Tensor<T>,
    scale: f64,
) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    laplacian_of_gaussian_with(
        image,
        scale,
        KernelCache::global(),
        &FeatureOptions::default(),
    )
}

/// Same as [`laplacian_of_gaussian`] with an explicit cache and options.
///
/// Only the second-derivative responses are computed.
pub fn laplacian_of_gaussian_with<T>(
    image: &Tensor<T>,
    scale: f64,
    cache: &KernelCache,
    options: &FeatureOptions,
) -> Result<Tensor<f32>, FilterError>
where
    T: AsPrimitive<f64> + Sync,
{
    let outputs = ResponseSet {
        smoothed: false,
        first_derivatives: false,
        laplacian: true,
    };
    let data = run(image, scale, cache, options, |src, kernels, parallel| {
        let responses = axis_responses_impl(src, image.shape(), kernels, outputs, parallel)?;
        Ok(to_f32(&responses.laplacian))
    })?;
    Ok(Tensor::from_shape_vec(image.shape(), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn channel(features: &Tensor<f32>, channel: FeatureChannel) -> Vec<f32> {
        features
            .as_slice()
            .chunks_exact(NUM_FEATURES)
            .map(|pixel| pixel[channel.index()])
            .collect()
    }

    #[test]
    fn test_channel_order() {
        for (i, channel) in FeatureChannel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn test_output_shape() -> Result<(), FilterError> {
        let image = Tensor::from_shape_fn(&[12, 9], |idx| (idx[0] * idx[1]) as u16);
        let features = compute_features(&image, 0.7)?;
        assert_eq!(features.shape(), &[12, 9, 3]);

        let signal = Tensor::from_shape_fn(&[20], |idx| idx[0] as f32);
        let features = compute_features(&signal, 1.0)?;
        assert_eq!(features.shape(), &[20, 3]);
        Ok(())
    }

    #[test]
    fn test_constant_image() -> Result<(), FilterError> {
        let image = Tensor::from_shape_val(&[10, 11], 42.0f64);
        let features = compute_features(&image, 1.0)?;
        for pixel in features.as_slice().chunks_exact(NUM_FEATURES) {
            assert_relative_eq!(pixel[0], 42.0, epsilon = 1e-4);
            assert_relative_eq!(pixel[1], 0.0, epsilon = 1e-4);
            assert_relative_eq!(pixel[2], 0.0, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_validation_order() {
        let empty = Tensor::<f32>::from_shape_vec(&[], vec![0.0]);
        assert!(empty.is_ok());
        if let Ok(empty) = empty {
            // the scale is checked first
            assert_eq!(
                compute_features(&empty, -1.0),
                Err(FilterError::InvalidScale(-1.0))
            );
            assert_eq!(
                compute_features(&empty, 1.0),
                Err(FilterError::ZeroDimensional)
            );
        }

        let image = Tensor::<f32>::zeros(&[8, 0]);
        assert_eq!(
            compute_features(&image, 1.0),
            Err(FilterError::EmptyAxis { axis: 1 })
        );

        let image = Tensor::<f32>::zeros(&[8, 6]);
        assert_eq!(
            compute_features(&image, 1.5),
            Err(FilterError::KernelTooLarge {
                axis: 1,
                radius: 6,
                extent: 6
            })
        );

        let image = Tensor::<f32>::zeros(&[1, 64]);
        assert!(matches!(
            compute_features(&image, 0.3),
            Err(FilterError::KernelTooLarge { axis: 0, .. })
        ));
    }

    #[test]
    fn test_rejected_scale_is_not_cached() {
        let cache = KernelCache::new();
        let image = Tensor::<f32>::zeros(&[4, 4]);
        let res = compute_features_with(&image, 2.0, &cache, &FeatureOptions::default());
        assert!(matches!(res, Err(FilterError::KernelTooLarge { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_explicit_cache_and_strategy() -> Result<(), FilterError> {
        let cache = KernelCache::new();
        let image = Tensor::from_shape_fn(&[14, 15], |idx| ((idx[0] * 7 + idx[1] * 3) % 5) as u8);
        let serial = compute_features_with(
            &image,
            1.25,
            &cache,
            &FeatureOptions::with_strategy(ExecutionStrategy::Serial),
        )?;
        assert!(cache.contains(1.25));
        let fixed = compute_features_with(
            &image,
            1.25,
            &cache,
            &FeatureOptions::with_strategy(ExecutionStrategy::Fixed(3)),
        )?;
        assert_eq!(serial, fixed);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_single_features_match_channels() -> Result<(), FilterError> {
        let image =
            Tensor::from_shape_fn(&[11, 13], |idx| ((idx[0] * 31 + idx[1] * 17) % 23) as f32);
        let features = compute_features(&image, 1.0)?;

        let smoothed = gaussian_smoothing(&image, 1.0)?;
        let gradient = gradient_magnitude(&image, 1.0)?;
        let laplacian = laplacian_of_gaussian(&image, 1.0)?;
        assert_eq!(smoothed.shape(), image.shape());

        let expected = [
            (smoothed, FeatureChannel::Smoothing),
            (gradient, FeatureChannel::GradientMagnitude),
            (laplacian, FeatureChannel::LaplacianOfGaussian),
        ];
        for (single, ch) in expected {
            for (&a, b) in single.as_slice().iter().zip(channel(&features, ch)) {
                assert_relative_eq!(a, b, epsilon = 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn test_single_features_with_explicit_cache() -> Result<(), FilterError> {
        let cache = KernelCache::new();
        let serial = FeatureOptions::with_strategy(ExecutionStrategy::Serial);
        let fixed = FeatureOptions::with_strategy(ExecutionStrategy::Fixed(2));
        let image = Tensor::from_shape_fn(&[9, 8, 10], |idx| (idx[0] * idx[1] + idx[2]) as u8);
        let features = compute_features_with(&image, 0.7, &cache, &serial)?;

        let smoothed = gaussian_smoothing_with(&image, 0.7, &cache, &fixed)?;
        let gradient = gradient_magnitude_with(&image, 0.7, &cache, &fixed)?;
        let laplacian = laplacian_of_gaussian_with(&image, 0.7, &cache, &serial)?;
        assert_eq!(cache.len(), 1);

        assert_eq!(smoothed.as_slice(), channel(&features, FeatureChannel::Smoothing));
        assert_eq!(
            gradient.as_slice(),
            channel(&features, FeatureChannel::GradientMagnitude)
        );
        assert_eq!(
            laplacian.as_slice(),
            channel(&features, FeatureChannel::LaplacianOfGaussian)
        );
        Ok(())
    }

    #[test]
    fn test_tiny_scale_gradient_is_finite() -> Result<(), FilterError> {
        let image = Tensor::from_shape_fn(&[8, 8], |idx| (idx[0] * 8 + idx[1]) as u8);
        let cache = KernelCache::new();
        let options = FeatureOptions::default();

        assert_eq!(
            compute_features_with(&image, 0.02, &cache, &options),
            Err(FilterError::InvalidScale(0.02))
        );
        assert!(cache.is_empty());

        let features = compute_features_with(&image, 0.03, &cache, &options)?;
        for magnitude in channel(&features, FeatureChannel::GradientMagnitude) {
            assert!(magnitude.is_finite() && magnitude >= 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_huge_scale_is_invalid() {
        let image = Tensor::<f32>::zeros(&[16, 16]);
        assert_eq!(
            compute_features(&image, 1e12),
            Err(FilterError::InvalidScale(1e12))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_serde() -> Result<(), Box<dyn std::error::Error>> {
        let options = FeatureOptions::with_strategy(ExecutionStrategy::Fixed(4));
        let json = serde_json::to_string(&options)?;
        assert_eq!(serde_json::from_str::<FeatureOptions>(&json)?, options);
        Ok(())
    }

    #[test]
    fn test_integer_and_float_inputs_agree() -> Result<(), FilterError> {
        let ints = Tensor::from_shape_fn(&[9, 10], |idx| (idx[0] * 10 + idx[1]) as i32);
        let floats = ints.map(|&v| v as f64);
        assert_eq!(compute_features(&ints, 0.7)?, compute_features(&floats, 0.7)?);
        Ok(())
    }
}
