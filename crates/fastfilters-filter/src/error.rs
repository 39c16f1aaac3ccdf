use fastfilters_tensor::TensorError;

use crate::parallel::ParallelError;

/// An error type for the feature engine.
///
/// Every variant is raised by validation before any kernel is generated or any
/// convolution pass runs, so an error never comes with a partially filled output.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The scale is not a finite value greater than zero, or gives kernels that are
    /// too wide or too narrow to be represented.
    #[error("Invalid scale {0}: scale must be finite, > 0 and give a representable kernel")]
    InvalidScale(f64),

    /// A kernel must have an odd number of coefficients.
    #[error("Invalid kernel length {0}: must be odd")]
    InvalidKernelLength(usize),

    /// The image has no axes.
    #[error("Image has zero dimensions")]
    ZeroDimensional,

    /// The image has an axis of extent zero.
    #[error("Image axis {axis} has zero length")]
    EmptyAxis {
        /// The offending axis.
        axis: usize,
    },

    /// The kernel support does not fit inside the image along an axis.
    #[error("Kernel radius {radius} is too large for axis {axis} with extent {extent}")]
    KernelTooLarge {
        /// The offending axis.
        axis: usize,
        /// The widest kernel radius for the requested scale.
        radius: usize,
        /// The extent of the image along `axis`.
        extent: usize,
    },

    /// Error from the tensor container.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Error while setting up parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
