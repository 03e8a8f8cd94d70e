//! Batched banded Hermitian matrix-vector product.
//!
//! For every batch index `b`, computes
//!
//! ```text
//! y_b := alpha * A_b * x_b + beta * y_b
//! ```
//!
//! where each `A_b` is an `N x N` Hermitian band of half-bandwidth `K` kept
//! in compact storage (see [`BandedLayout`]). Operands come either as one
//! strided buffer per operand ([`hbmv_strided_batched`]) or as one buffer
//! per batch element ([`hbmv_batched`]).
//!
//! # Example
//!
//! ```
//! use strided_hbmv::{hbmv_strided_batched, Coefficient, Fill, Handle, StridedBatchedHbmv};
//!
//! // 2x2 real band, K = 1, upper storage: A = [[2, 1], [1, 3]]
//! let a = [0.0, 2.0, 1.0, 3.0];
//! let x = [1.0, 1.0];
//! let mut y = [0.0, 0.0];
//!
//! let handle = Handle::new();
//! let args = StridedBatchedHbmv::single(
//!     Fill::Upper, 2, 1,
//!     Coefficient::Host(1.0), &a, 2,
//!     &x, 1,
//!     Coefficient::Host(0.0), &mut y, 1,
//! );
//! hbmv_strided_batched(Some(&handle), args).unwrap();
//! assert_eq!(y, [3.0, 4.0]);
//! ```

/// Alpha/beta coefficients and where they live.
pub mod coefficient;
mod dispatch;
/// Operation counts for throughput reporting.
pub mod flops;
/// Execution context and configuration.
pub mod handle;
/// Per-batch-element kernels.
pub mod kernel;
pub mod maybe_sync;
/// Argument checks shared by the batched entry points.
pub mod validate;

pub use coefficient::{Coefficient, PointerMode};
pub use flops::{hbmv_gbyte_count, hbmv_gflop_count};
pub use handle::{Handle, HandleConfig, ENV_NUM_THREADS, ENV_PARALLEL_MIN_WORK};
pub use validate::{validate, Presence, Shape, Validation};

pub use strided_device::{Device, DeviceBuffer, DeviceConfig, DeviceError, DeviceStats};
pub use strided_traits::HermitianScalar;
pub use strided_view::{BandedLayout, Fill, StridedError};

use maybe_sync::MaybeSendSync;

// ============================================================================
// Status and errors
// ============================================================================

/// Coarse outcome of a call, one per error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidHandle,
    InvalidValue,
    InvalidSize,
    InvalidPointer,
    MemoryError,
    InternalError,
}

impl Status {
    /// Status of a finished call.
    pub fn of(result: &Result<()>) -> Status {
        match result {
            Ok(()) => Status::Success,
            Err(e) => e.status(),
        }
    }
}

/// Errors returned by the HBMV entry points.
#[derive(Debug, thiserror::Error)]
pub enum HbmvError {
    #[error("no handle supplied")]
    InvalidHandle,

    #[error("fill mode {0:?} is not a stored triangle")]
    InvalidFill(Fill),

    #[error("invalid size: {param} = {value}")]
    InvalidSize { param: &'static str, value: i64 },

    #[error("{operand}: {required} elements required, {actual} available")]
    BufferTooSmall {
        operand: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("missing operand {0}")]
    NullPointer(&'static str),

    #[error(transparent)]
    Strided(#[from] StridedError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HbmvError {
    pub fn status(&self) -> Status {
        match self {
            HbmvError::InvalidHandle => Status::InvalidHandle,
            HbmvError::InvalidFill(_) => Status::InvalidValue,
            HbmvError::InvalidSize { .. } | HbmvError::BufferTooSmall { .. } => Status::InvalidSize,
            HbmvError::NullPointer(_) => Status::InvalidPointer,
            HbmvError::Strided(e) => strided_status(e),
            HbmvError::Device(e) => match e {
                DeviceError::OutOfMemory { .. }
                | DeviceError::EmptyAllocation
                | DeviceError::ForeignBuffer => Status::MemoryError,
                DeviceError::SizeMismatch { .. } | DeviceError::LayoutMismatch => {
                    Status::InvalidSize
                }
                DeviceError::Strided(e) => strided_status(e),
            },
            HbmvError::Internal(_) => Status::InternalError,
        }
    }
}

fn strided_status(e: &StridedError) -> Status {
    match e {
        StridedError::InvalidFill(_) => Status::InvalidValue,
        _ => Status::InvalidSize,
    }
}

/// Result type for HBMV operations.
pub type Result<T> = std::result::Result<T, HbmvError>;

// ============================================================================
// Arguments
// ============================================================================

/// Arguments of a strided-batched HBMV.
///
/// Each operand is one buffer holding every batch element, consecutive
/// elements `stride_*` apart. Sizes are signed so that invalid values can be
/// reported instead of being unrepresentable.
#[derive(Debug)]
pub struct StridedBatchedHbmv<'a, T> {
    pub fill: Fill,
    pub n: i64,
    pub k: i64,
    pub alpha: Option<Coefficient<'a, T>>,
    pub a: Option<&'a [T]>,
    pub lda: i64,
    pub stride_a: isize,
    pub x: Option<&'a [T]>,
    pub incx: i64,
    pub stride_x: isize,
    pub beta: Option<Coefficient<'a, T>>,
    pub y: Option<&'a mut [T]>,
    pub incy: i64,
    pub stride_y: isize,
    pub batch_count: i64,
}

impl<'a, T> StridedBatchedHbmv<'a, T> {
    /// Arguments with every operand absent, unit increments, zero strides,
    /// `lda = k + 1` and one batch element.
    pub fn new(fill: Fill, n: i64, k: i64) -> Self {
        Self {
            fill,
            n,
            k,
            alpha: None,
            a: None,
            lda: k + 1,
            stride_a: 0,
            x: None,
            incx: 1,
            stride_x: 0,
            beta: None,
            y: None,
            incy: 1,
            stride_y: 0,
            batch_count: 1,
        }
    }

    /// Plain (non-batched) HBMV.
    #[allow(clippy::too_many_arguments)]
    pub fn single(
        fill: Fill,
        n: i64,
        k: i64,
        alpha: Coefficient<'a, T>,
        a: &'a [T],
        lda: i64,
        x: &'a [T],
        incx: i64,
        beta: Coefficient<'a, T>,
        y: &'a mut [T],
        incy: i64,
    ) -> Self {
        Self::new(fill, n, k)
            .alpha(alpha)
            .beta(beta)
            .a(a, lda, 0)
            .x(x, incx, 0)
            .y(y, incy, 0)
    }

    pub fn alpha(mut self, alpha: Coefficient<'a, T>) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn beta(mut self, beta: Coefficient<'a, T>) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn a(mut self, a: &'a [T], lda: i64, stride_a: isize) -> Self {
        self.a = Some(a);
        self.lda = lda;
        self.stride_a = stride_a;
        self
    }

    pub fn x(mut self, x: &'a [T], incx: i64, stride_x: isize) -> Self {
        self.x = Some(x);
        self.incx = incx;
        self.stride_x = stride_x;
        self
    }

    pub fn y(mut self, y: &'a mut [T], incy: i64, stride_y: isize) -> Self {
        self.y = Some(y);
        self.incy = incy;
        self.stride_y = stride_y;
        self
    }

    pub fn batch_count(mut self, batch_count: i64) -> Self {
        self.batch_count = batch_count;
        self
    }

    fn shape(&self) -> Shape {
        Shape {
            n: self.n,
            k: self.k,
            lda: self.lda,
            incx: self.incx,
            incy: self.incy,
            batch_count: self.batch_count,
        }
    }

    fn presence(&self) -> Presence {
        Presence {
            a: self.a.is_some(),
            x: self.x.is_some(),
            y: self.y.is_some(),
        }
    }
}

/// Arguments of a pointer-array batched HBMV.
///
/// Every batch element has its own `A`, `x` and `y` buffer; the arrays must
/// hold at least `batch_count` entries.
#[derive(Debug)]
pub struct BatchedHbmv<'a, 'b, T> {
    pub fill: Fill,
    pub n: i64,
    pub k: i64,
    pub alpha: Option<Coefficient<'a, T>>,
    pub a: Option<&'a [&'b [T]]>,
    pub lda: i64,
    pub x: Option<&'a [&'b [T]]>,
    pub incx: i64,
    pub beta: Option<Coefficient<'a, T>>,
    pub y: Option<&'a mut [&'b mut [T]]>,
    pub incy: i64,
    pub batch_count: i64,
}

impl<'a, 'b, T> BatchedHbmv<'a, 'b, T> {
    fn shape(&self) -> Shape {
        Shape {
            n: self.n,
            k: self.k,
            lda: self.lda,
            incx: self.incx,
            incy: self.incy,
            batch_count: self.batch_count,
        }
    }

    fn presence(&self) -> Presence {
        Presence {
            a: self.a.is_some(),
            x: self.x.is_some(),
            y: self.y.is_some(),
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Strided-batched HBMV: `y_b := alpha * A_b * x_b + beta * y_b` for every
/// batch index `b`.
///
/// `N == 0` or `batch_count == 0` returns immediately, even when every
/// operand is absent. When `alpha` and `beta` are host values, `alpha == 0`
/// leaves `A` and `x` unread and `alpha == 0, beta == 1` leaves `y` untouched.
///
/// # Errors
/// See [`HbmvError`]; [`HbmvError::status`] gives the matching [`Status`].
pub fn hbmv_strided_batched<T>(handle: Option<&Handle>, args: StridedBatchedHbmv<'_, T>) -> Result<()>
where
    T: HermitianScalar + MaybeSendSync,
{
    let validation = validate(
        handle,
        args.fill,
        &args.shape(),
        args.alpha.as_ref(),
        args.beta.as_ref(),
        args.presence(),
    )?;
    let handle = match (validation, handle) {
        (Validation::NoOp, _) => return Ok(()),
        (_, Some(h)) => h,
        (_, None) => return Err(HbmvError::InvalidHandle),
    };
    dispatch::strided(handle, validation, args)
}

/// Pointer-array batched HBMV with the same semantics as
/// [`hbmv_strided_batched`].
///
/// # Errors
/// As [`hbmv_strided_batched`], plus [`HbmvError::BufferTooSmall`] when an
/// array holds fewer than `batch_count` buffers or a buffer is shorter than
/// one operand.
pub fn hbmv_batched<T>(handle: Option<&Handle>, args: BatchedHbmv<'_, '_, T>) -> Result<()>
where
    T: HermitianScalar + MaybeSendSync,
{
    let validation = validate(
        handle,
        args.fill,
        &args.shape(),
        args.alpha.as_ref(),
        args.beta.as_ref(),
        args.presence(),
    )?;
    let handle = match (validation, handle) {
        (Validation::NoOp, _) => return Ok(()),
        (_, Some(h)) => h,
        (_, None) => return Err(HbmvError::InvalidHandle),
    };
    dispatch::batched(handle, validation, args)
}
