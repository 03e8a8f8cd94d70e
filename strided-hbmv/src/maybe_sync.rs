//! Feature-gated thread-safety bound for element types.
//!
//! With the `parallel` feature, batch elements may run on rayon workers, so
//! the element type must be [`Send`] + [`Sync`]. Without it the bound is
//! blanket-implemented and the entry points accept any [`HermitianScalar`].
//!
//! [`HermitianScalar`]: strided_traits::HermitianScalar

#[cfg(feature = "parallel")]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(feature = "parallel")]
impl<T: Send + Sync> MaybeSendSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSendSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSendSync for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    fn check<T: MaybeSendSync>() {}

    #[test]
    fn test_element_types_satisfy_bound() {
        check::<f32>();
        check::<f64>();
        check::<Complex32>();
        check::<Complex64>();
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_sequential_build_accepts_non_send_types() {
        check::<std::rc::Rc<f64>>();
        check::<std::cell::Cell<f64>>();
    }
}
