use rayon::prelude::*;
use thiserror::Error;

/// Number of elements from which [`ExecutionStrategy::Auto`] switches to parallel execution.
pub const PARALLEL_THRESHOLD: usize = 100_000;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The chunk length used to split a buffer must be valid.
    #[error("chunk length must be > 0, got {0}")]
    InvalidChunkLength(usize),
}

/// Controls how the axis passes and the feature composition are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the caller already runs many
    /// feature computations concurrently.
    Serial,

    /// Use the global Rayon thread pool.
    Parallel,

    /// Parallel for inputs with at least [`PARALLEL_THRESHOLD`] elements, serial otherwise.
    #[default]
    Auto,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether work over `num_elements` elements should be split across threads.
    pub fn is_parallel(&self, num_elements: usize) -> bool {
        match self {
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel | ExecutionStrategy::Fixed(_) => true,
            ExecutionStrategy::Auto => num_elements >= PARALLEL_THRESHOLD,
        }
    }

    /// Run `op` inside the thread pool selected by the strategy.
    ///
    /// Only [`ExecutionStrategy::Fixed`] builds a dedicated pool, every other strategy
    /// runs `op` on the calling thread (and the global pool, if it goes parallel).
    pub fn install<R, F>(&self, op: F) -> Result<R, ParallelError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match *self {
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }
}

/// Apply `op` to every `chunk_len` sized chunk of `dst`, passing the chunk index.
///
/// The chunks are disjoint, so `op` may run on them in any order.
pub(crate) fn for_each_chunk_mut<T, F>(
    dst: &mut [T],
    chunk_len: usize,
    parallel: bool,
    op: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if chunk_len == 0 {
        return Err(ParallelError::InvalidChunkLength(chunk_len));
    }

    if parallel {
        dst.par_chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| op(i, chunk));
    } else {
        dst.chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| op(i, chunk));
    }
    Ok(())
}
