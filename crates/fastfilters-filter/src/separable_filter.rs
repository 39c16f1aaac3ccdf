use fastfilters_tensor::TensorError;

use crate::border::mirror_index;
use crate::error::FilterError;
use crate::kernels::{GaussianKernels, Kernel1d};
use crate::parallel::{for_each_chunk_mut, ExecutionStrategy};

/// The per-axis responses that the feature channels are composed from.
///
/// All buffers are row-major with the shape of the input and hold `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisResponses {
    /// Order-0 kernel applied along every axis.
    pub smoothed: Vec<f64>,
    /// For every axis `i`, order-1 along `i` and order-0 along all other axes.
    pub first_derivatives: Vec<Vec<f64>>,
    /// Sum over axes `i` of order-2 along `i` and order-0 along all other axes.
    pub laplacian: Vec<f64>,
}

/// Which [`AxisResponses`] buffers a schedule has to produce; the others are left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResponseSet {
    pub(crate) smoothed: bool,
    pub(crate) first_derivatives: bool,
    pub(crate) laplacian: bool,
}

impl ResponseSet {
    pub(crate) const ALL: Self = Self {
        smoothed: true,
        first_derivatives: true,
        laplacian: true,
    };
}

fn check_axis(shape: &[usize], axis: usize, radius: usize) -> Result<(), FilterError> {
    let extent = *shape.get(axis).ok_or_else(|| {
        TensorError::dimension_mismatch(
            format!("axis {axis} does not exist"),
            &[axis + 1],
            &[shape.len()],
        )
    })?;
    if radius >= extent {
        return Err(FilterError::KernelTooLarge {
            axis,
            radius,
            extent,
        });
    }
    Ok(())
}

fn check_len(shape: &[usize], len: usize) -> Result<(), FilterError> {
    let numel = shape.iter().product::<usize>();
    if numel != len {
        return Err(TensorError::invalid_shape(numel, len).into());
    }
    Ok(())
}

/// Correlate one contiguous line with the kernel weights, `out[p] = Σ_j w[j]·src[p - j]`.
fn correlate_line(src: &[f64], dst: &mut [f64], weights: &[f64], radius: usize) {
    let n = src.len();
    for (p, out) in dst.iter_mut().enumerate() {
        let mut acc = 0.0;
        if p >= radius && p + radius < n {
            // weights run from offset -r to +r, the samples from p + r down to p - r
            let window = &src[p - radius..=p + radius];
            for (&w, &s) in weights.iter().zip(window.iter().rev()) {
                acc += w * s;
            }
        } else {
            for (t, &w) in weights.iter().enumerate() {
                let j = t as isize - radius as isize;
                acc += w * src[mirror_index(p as isize - j, n)];
            }
        }
        *out = acc;
    }
}

/// One correlation pass along `axis`, reading `src` and writing every element of `dst`.
///
/// `src` and `dst` are distinct buffers, a pass never reads its own output.
pub(crate) fn correlate_axis_impl(
    src: &[f64],
    dst: &mut [f64],
    shape: &[usize],
    axis: usize,
    kernel: &Kernel1d,
    parallel: bool,
) -> Result<(), FilterError> {
    check_len(shape, src.len())?;
    check_len(shape, dst.len())?;
    check_axis(shape, axis, kernel.radius())?;

    let extent = shape[axis];
    let inner = shape[axis + 1..].iter().product::<usize>();
    let radius = kernel.radius();
    let weights = kernel
        .as_slice()
        .iter()
        .map(|&k| k as f64)
        .collect::<Vec<_>>();

    log::trace!(
        "correlating axis {} (extent {}, inner {}) with radius {}",
        axis,
        extent,
        inner,
        radius
    );

    if inner == 1 {
        // the axis is the innermost one: every line is contiguous
        for_each_chunk_mut(dst, extent, parallel, |line, dst_line| {
            let src_line = &src[line * extent..(line + 1) * extent];
            correlate_line(src_line, dst_line, &weights, radius);
        })?;
    } else {
        // one chunk per position along the axis, each a contiguous row of `inner` lanes
        for_each_chunk_mut(dst, inner, parallel, |row, dst_row| {
            let block = (row / extent) * extent * inner;
            let p = (row % extent) as isize;
            dst_row.fill(0.0);
            for (t, &w) in weights.iter().enumerate() {
                let j = t as isize - radius as isize;
                let q = mirror_index(p - j, extent);
                let src_row = &src[block + q * inner..block + (q + 1) * inner];
                dst_row
                    .iter_mut()
                    .zip(src_row)
                    .for_each(|(d, &s)| *d += w * s);
            }
        })?;
    }

    Ok(())
}

/// Correlate an N-D buffer with a 1D kernel along a single axis.
///
/// The output at position `p` is `Σ_{j=-r..r} kernel[j] · src[p - j along axis]`, with
/// out-of-range positions mirrored about the edge samples. All other axes are passed
/// through unchanged.
///
/// # Arguments
///
/// * `src` - The source buffer, row-major with the given shape.
/// * `dst` - The destination buffer, same length as `src`.
/// * `shape` - The extent of every axis.
/// * `axis` - The axis to correlate along.
/// * `kernel` - The kernel, its radius must be smaller than the extent of `axis`.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, `Auto` or `Fixed`.
pub fn correlate_axis(
    src: &[f64],
    dst: &mut [f64],
    shape: &[usize],
    axis: usize,
    kernel: &Kernel1d,
    strategy: ExecutionStrategy,
) -> Result<(), FilterError> {
    let parallel = strategy.is_parallel(src.len());
    strategy.install(|| correlate_axis_impl(src, dst, shape, axis, kernel, parallel))?
}

pub(crate) fn separable_filter_impl(
    src: &[f64],
    dst: &mut [f64],
    shape: &[usize],
    kernel: &Kernel1d,
    axes: &[usize],
    parallel: bool,
) -> Result<(), FilterError> {
    check_len(shape, src.len())?;
    check_len(shape, dst.len())?;
    for &axis in axes {
        check_axis(shape, axis, kernel.radius())?;
    }

    // ping-pong between two buffers so no pass reads values it already overwrote
    let mut current = src.to_vec();
    let mut scratch = vec![0.0; src.len()];
    for &axis in axes {
        correlate_axis_impl(&current, &mut scratch, shape, axis, kernel, parallel)?;
        std::mem::swap(&mut current, &mut scratch);
    }
    dst.copy_from_slice(&current);

    Ok(())
}

/// Apply the same 1D kernel along each of `axes`, in the given order.
///
/// Each pass consumes the output of the previous one. With all axes listed this is
/// the separable N-D filter of the kernel; the order of the axes does not change the
/// result beyond rounding.
///
/// # Arguments
///
/// * `src` - The source buffer, row-major with the given shape.
/// * `dst` - The destination buffer, same length as `src`.
/// * `shape` - The extent of every axis.
/// * `kernel` - The kernel applied along every listed axis.
/// * `axes` - The axes to filter, in application order.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, `Auto` or `Fixed`.
pub fn separable_filter(
    src: &[f64],
    dst: &mut [f64],
    shape: &[usize],
    kernel: &Kernel1d,
    axes: &[usize],
    strategy: ExecutionStrategy,
) -> Result<(), FilterError> {
    let parallel = strategy.is_parallel(src.len());
    strategy.install(|| separable_filter_impl(src, dst, shape, kernel, axes, parallel))?
}

pub(crate) fn axis_responses_impl(
    src: &[f64],
    shape: &[usize],
    kernels: &GaussianKernels,
    outputs: ResponseSet,
    parallel: bool,
) -> Result<AxisResponses, FilterError> {
    check_len(shape, src.len())?;
    for axis in 0..shape.len() {
        check_axis(shape, axis, kernels.max_radius())?;
    }

    let len = src.len();
    let ndim = shape.len();
    let k0 = kernels.smoothing();
    let k1 = kernels.first_derivative();
    let k2 = kernels.second_derivative();

    // After processing axes 0..a: `smoothed` holds order 0 along all of them,
    // `first_derivatives[i]` order 1 along i and order 0 along the rest, and
    // `laplacian` the sum of the order-2 responses (convolution is linear).
    let mut smoothed = src.to_vec();
    let mut first_derivatives: Vec<Vec<f64>> = Vec::new();
    let mut laplacian = if outputs.laplacian {
        vec![0.0; len]
    } else {
        Vec::new()
    };
    let mut scratch = vec![0.0; len];

    for axis in 0..ndim {
        for derivative in first_derivatives.iter_mut() {
            correlate_axis_impl(derivative.as_slice(), &mut scratch, shape, axis, k0, parallel)?;
            std::mem::swap(derivative, &mut scratch);
        }

        if outputs.laplacian {
            if axis > 0 {
                correlate_axis_impl(&laplacian, &mut scratch, shape, axis, k0, parallel)?;
                std::mem::swap(&mut laplacian, &mut scratch);
            }
            correlate_axis_impl(&smoothed, &mut scratch, shape, axis, k2, parallel)?;
            laplacian
                .iter_mut()
                .zip(scratch.iter())
                .for_each(|(l, &s)| *l += s);
        }

        if outputs.first_derivatives {
            let mut derivative = vec![0.0; len];
            correlate_axis_impl(&smoothed, &mut derivative, shape, axis, k1, parallel)?;
            first_derivatives.push(derivative);
        }

        // the pass along the last axis only feeds the smoothed output
        if axis + 1 < ndim || outputs.smoothed {
            correlate_axis_impl(&smoothed, &mut scratch, shape, axis, k0, parallel)?;
            std::mem::swap(&mut smoothed, &mut scratch);
        }
    }

    if !outputs.smoothed {
        smoothed = Vec::new();
    }

    Ok(AxisResponses {
        smoothed,
        first_derivatives,
        laplacian,
    })
}

/// Compute the per-axis responses needed by the three feature channels.
///
/// Axes are processed in order; at each axis every partial response so far is smoothed
/// along it, and the smoothing-only response is additionally correlated with the
/// derivative kernels to start the responses for that axis. The number of passes is
/// quadratic in the number of axes but every pass is a plain 1D correlation.
///
/// # Arguments
///
/// * `src` - The source buffer, row-major with the given shape.
/// * `shape` - The extent of every axis; every extent must exceed the widest kernel radius.
/// * `kernels` - The kernels for the scale.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, `Auto` or `Fixed`.
pub fn axis_responses(
    src: &[f64],
    shape: &[usize],
    kernels: &GaussianKernels,
    strategy: ExecutionStrategy,
) -> Result<AxisResponses, FilterError> {
    let parallel = strategy.is_parallel(src.len());
    strategy.install(|| axis_responses_impl(src, shape, kernels, ResponseSet::ALL, parallel))?
}
