use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::FilterError;
use crate::kernels::{gaussian_derivative_kernels, validate_scale, GaussianKernels};

/// Scales generated ahead of time by [`KernelCache::global`].
pub const DEFAULT_SCALES: [f64; 7] = [0.3, 0.7, 1.0, 1.6, 3.5, 5.0, 10.0];

static GLOBAL: OnceLock<KernelCache> = OnceLock::new();

/// Memoizes [`GaussianKernels`] by scale.
///
/// Entries are keyed by the exact bit pattern of the scale and are never replaced once
/// inserted, so every lookup of a scale returns the same kernels. Hits only take the
/// read lock. Two threads missing on the same scale may both generate the kernels;
/// the first insertion wins and both get identical values.
#[derive(Debug, Default)]
pub struct KernelCache {
    entries: RwLock<HashMap<u64, Arc<GaussianKernels>>>,
}

impl KernelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding the kernels for `scales`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidScale`] if any of the scales is invalid.
    pub fn with_scales(scales: &[f64]) -> Result<Self, FilterError> {
        let cache = Self::new();
        for &scale in scales {
            cache.get_or_create(scale)?;
        }
        Ok(cache)
    }

    /// The process-wide cache, pre-populated with [`DEFAULT_SCALES`] on first use.
    pub fn global() -> &'static KernelCache {
        GLOBAL.get_or_init(|| Self::with_scales(&DEFAULT_SCALES).unwrap_or_default())
    }

    /// Look up the kernels for `scale` without generating them.
    pub fn get(&self, scale: f64) -> Option<Arc<GaussianKernels>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&scale.to_bits())
            .cloned()
    }

    /// Return the kernels for `scale`, generating and storing them on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidScale`] if the scale is not finite and positive, or
    /// if [`gaussian_derivative_kernels`] cannot represent its kernels.
    pub fn get_or_create(&self, scale: f64) -> Result<Arc<GaussianKernels>, FilterError> {
        validate_scale(scale)?;

        if let Some(kernels) = self.get(scale) {
            return Ok(kernels);
        }

        // generate outside the lock, it is a pure function of the scale
        let kernels = Arc::new(gaussian_derivative_kernels(scale)?);
        log::debug!(
            "generated gaussian kernels for scale {} with radii ({}, {}, {})",
            scale,
            kernels.smoothing().radius(),
            kernels.first_derivative().radius(),
            kernels.second_derivative().radius(),
        );

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(scale.to_bits()).or_insert(kernels).clone())
    }

    /// Whether the kernels for `scale` are resident.
    pub fn contains(&self, scale: f64) -> bool {
        self.get(scale).is_some()
    }

    /// Number of cached scales.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no scales.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
