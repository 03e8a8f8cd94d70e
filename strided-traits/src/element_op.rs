//! Element-wise operations applied when reading a Hermitian band.
//!
//! A Hermitian matrix stores one triangle. Every logical element is produced
//! from a stored value through one of three operations:
//! - `Identity`: the value lies in the stored triangle
//! - `Conj`: the value mirrors a stored entry across the diagonal
//! - `RealPart`: the value sits on the diagonal, whose imaginary part is
//!   zero by definition
//!
//! The operations are zero-sized types so the choice is made at the call
//! site without runtime dispatch on element type.

use num_complex::Complex;
use num_traits::Num;

// ---------------------------------------------------------------------------
// ElementOpApply: trait for types that support conj / real part
// ---------------------------------------------------------------------------

/// Trait for types that support the Hermitian element operations.
///
/// Default implementations return `self` unchanged, so real-valued types
/// can simply write:
/// ```ignore
/// impl ElementOpApply for MyType {}
/// ```
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }
    #[inline(always)]
    fn real_part(self) -> Self {
        self
    }
}

macro_rules! impl_element_op_apply_real {
    ($($t:ty),*) => {
        $(impl ElementOpApply for $t {})*
    };
}

impl_element_op_apply_real!(f32, f64);

impl<T: Num + Copy + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    #[inline(always)]
    fn real_part(self) -> Self {
        Complex::new(self.re, T::zero())
    }
}

// ---------------------------------------------------------------------------
// Marker types
// ---------------------------------------------------------------------------

/// Identity operation: f(x) = x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// Complex conjugate operation: f(x) = conj(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// Real-part projection: f(x) = re(x) + 0i.
/// For real numbers, this is identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealPart;

/// Trait for element-wise operations applied to stored band values.
///
/// `Identity` implements this for any `T: Copy`; `Conj` and `RealPart`
/// require `T: ElementOpApply`.
pub trait ElementOp<T>: Copy + Default + 'static {
    /// Apply the operation to a value.
    fn apply(value: T) -> T;
}

impl<T: Copy> ElementOp<T> for Identity {
    #[inline(always)]
    fn apply(value: T) -> T {
        value
    }
}

impl<T: ElementOpApply> ElementOp<T> for Conj {
    #[inline(always)]
    fn apply(value: T) -> T {
        value.conj()
    }
}

impl<T: ElementOpApply> ElementOp<T> for RealPart {
    #[inline(always)]
    fn apply(value: T) -> T {
        value.real_part()
    }
}
