//! Scalar type bounds for the batched band kernels.

use num_complex::Complex;

use crate::element_op::ElementOpApply;

/// Shared arithmetic bounds for every element type a kernel can run on.
///
/// Thread-safety is not part of this bound; parallel entry points add it
/// where batches actually cross threads.
pub trait ScalarBase:
    Copy
    + std::ops::Mul<Output = Self>
    + std::ops::Add<Output = Self>
    + num_traits::Zero
    + num_traits::One
    + PartialEq
{
}

impl<T> ScalarBase for T where
    T: Copy
        + std::ops::Mul<Output = T>
        + std::ops::Add<Output = T>
        + num_traits::Zero
        + num_traits::One
        + PartialEq
{
}

/// Element types accepted by the Hermitian band-matrix kernels.
///
/// Real types give the symmetric special case (conjugation is a no-op).
pub trait HermitianScalar: ScalarBase + ElementOpApply + std::fmt::Debug + 'static {
    /// `true` for complex element types.
    const IS_COMPLEX: bool;
}

impl HermitianScalar for f32 {
    const IS_COMPLEX: bool = false;
}

impl HermitianScalar for f64 {
    const IS_COMPLEX: bool = false;
}

impl HermitianScalar for Complex<f32> {
    const IS_COMPLEX: bool = true;
}

impl HermitianScalar for Complex<f64> {
    const IS_COMPLEX: bool = true;
}
