//! Strided-batch views and banded-Hermitian storage layout.
//!
//! A single contiguous allocation can hold `batch_count` same-shaped
//! matrices or vectors, one every `stride` elements. This crate provides
//! the addressing for such buffers and the compact band layout of a
//! Hermitian matrix.
//!
//! # Core Types
//!
//! - [`StridedBatchView`] / [`StridedBatchViewMut`]: zero-copy batch views over borrowed slices
//! - [`ItemShape`]: shape of one batch item (matrix with leading dimension, or vector with increment)
//! - [`BandedLayout`] / [`Fill`]: compact `(K+1) x N` storage of one triangle of a Hermitian band
//!
//! # Addressing
//!
//! - [`batch_offset`]: start of batch item `i`; negative strides address ascending regions
//!   in reverse batch order
//! - [`vector_offset`]: position of element `i` in a vector with signed increment
//!
//! # Example
//!
//! ```rust
//! use strided_view::{ItemShape, StridedBatchView};
//!
//! // Three length-2 vectors, stored back to front with stride -4.
//! let data = vec![20.0, 21.0, 0.0, 0.0, 10.0, 11.0, 0.0, 0.0, 0.0, 1.0];
//! let item = ItemShape::vector(2, 1).unwrap();
//! let view = StridedBatchView::new(&data, item, -4, 3).unwrap();
//!
//! assert_eq!(view.offset_of(0), 8);
//! assert_eq!(view.at(0), &[0.0, 1.0]);
//! assert_eq!(view.at(2), &[20.0, 21.0]);
//! ```

pub mod banded;
pub mod batch;

pub use banded::{BandedLayout, Fill};
pub use batch::{
    batch_offset, element_count, required_len, vector_offset, ItemShape, StridedBatchView,
    StridedBatchViewMut,
};

pub use strided_traits::{Conj, ElementOp, ElementOpApply, HermitianScalar, Identity, RealPart};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while describing strided batches.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// A vector increment of zero would alias every element.
    #[error("invalid increment 0")]
    ZeroIncrement,

    /// Leading dimension smaller than the number of stored rows.
    #[error("leading dimension {ld} is smaller than {rows} rows")]
    LeadingDimensionTooSmall { ld: usize, rows: usize },

    /// The borrowed buffer does not cover every batch item.
    #[error("buffer too small: {required} elements required, {actual} available")]
    BufferTooSmall { required: usize, actual: usize },

    /// Integer overflow while computing a buffer extent.
    #[error("offset overflow while computing buffer extent")]
    OffsetOverflow,

    /// Batch items overlap, so they cannot be handed out as disjoint slices.
    #[error("batch items overlap: |stride| {stride} < item span {span}")]
    OverlappingBatches { stride: usize, span: usize },

    /// The fill mode does not name a single triangle.
    #[error("fill mode {0:?} does not select a stored triangle")]
    InvalidFill(Fill),

    /// Band storage needs at least `k + 1` rows per column.
    #[error("leading dimension {lda} must exceed bandwidth {k}")]
    BandTooNarrow { lda: usize, k: usize },
}

/// Result type for strided batch operations.
pub type Result<T> = std::result::Result<T, StridedError>;
