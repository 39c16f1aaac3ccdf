#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
/// mirror boundary index mapping.
pub mod border;

/// per-scale kernel cache.
pub mod cache;

/// error types for the feature engine.
pub mod error;

/// feature maps: smoothing, gradient magnitude and laplacian of gaussian.
pub mod features;

/// gaussian derivative kernel generation.
pub mod kernels;

/// module containing parallization utilities.
pub mod parallel;

/// separable N-D correlation along individual axes.
pub mod separable_filter;

pub use crate::cache::{KernelCache, DEFAULT_SCALES};
pub use crate::error::FilterError;
pub use crate::features::{
    compute_features, compute_features_with, gaussian_smoothing, gaussian_smoothing_with,
    gradient_magnitude, gradient_magnitude_with, laplacian_of_gaussian,
    laplacian_of_gaussian_with, FeatureChannel, FeatureOptions, NUM_FEATURES,
};
pub use crate::kernels::{
    gaussian_derivative_kernels, GaussianKernels, Kernel1d, MAX_KERNEL_RADIUS,
};
pub use crate::parallel::ExecutionStrategy;
