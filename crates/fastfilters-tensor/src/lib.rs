#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `fastfilters-tensor` provides the array container consumed and produced by the
//! feature engine: an owned, row-major buffer with a shape whose rank is only known
//! at runtime. Images (2-D), volumes (3-D) and signals (1-D) share the same type, and
//! feature outputs append one trailing axis to the input shape.
//!
//! ```rust
//! use fastfilters_tensor::Tensor;
//!
//! let image = Tensor::from_shape_fn(&[4, 5], |idx| (idx[0] + idx[1]) as u8);
//! assert_eq!(image.ndim(), 2);
//! assert_eq!(image.strides(), &[5, 1]);
//!
//! let image = image.map(|&v| v as f32);
//! assert_eq!(image.get(&[3, 4]), Some(&7.0));
//! ```

/// Conversion between tensors and `ndarray` arrays.
#[cfg(feature = "ndarray")]
mod interop;

/// Serde module for JSON/other format serialization and deserialization.
///
/// Enabled with the `serde` feature.
#[cfg(feature = "serde")]
pub mod serde;

/// Tensor module containing the main tensor implementation and error types.
pub mod tensor;

pub use crate::tensor::{get_strides_from_shape, Tensor, TensorError};
