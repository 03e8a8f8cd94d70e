//! The checks run in a fixed order so that every call with several problems
//! reports the same one: handle, fill, sizes, quick returns, then operands.
//! Nothing here reads operand memory, and device-resident coefficients are
//! never dereferenced.

use num_traits::{One, Zero};
use strided_view::Fill;

use crate::coefficient::{Coefficient, PointerMode};
use crate::handle::Handle;
use crate::{HbmvError, Result};

/// Scalar arguments in the signed form callers pass them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub n: i64,
    pub k: i64,
    pub lda: i64,
    pub incx: i64,
    pub incy: i64,
    pub batch_count: i64,
}

/// Which array operands were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub a: bool,
    pub x: bool,
    pub y: bool,
}

/// What a valid call has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Nothing; `y` is left untouched.
    NoOp,
    /// `y := beta * y`; `A` and `x` are not read.
    ScaleOnly,
    /// The full product.
    Compute,
}

/// Check the arguments of a batched HBMV call.
///
/// # Errors
/// The first failing check, in this order: missing handle, fill mode,
/// sizes, missing coefficient, missing `y`, missing `A` or `x`.
pub fn validate<T>(
    handle: Option<&Handle>,
    fill: Fill,
    shape: &Shape,
    alpha: Option<&Coefficient<'_, T>>,
    beta: Option<&Coefficient<'_, T>>,
    present: Presence,
) -> Result<Validation>
where
    T: Copy + PartialEq + Zero + One,
{
    if handle.is_none() {
        return Err(HbmvError::InvalidHandle);
    }
    if !fill.is_triangle() {
        return Err(HbmvError::InvalidFill(fill));
    }
    check_sizes(shape)?;

    if shape.n == 0 || shape.batch_count == 0 {
        log::trace!("hbmv: empty problem (n={}, batch_count={})", shape.n, shape.batch_count);
        return Ok(Validation::NoOp);
    }

    let alpha = alpha.ok_or(HbmvError::NullPointer("alpha"))?;
    let beta = beta.ok_or(HbmvError::NullPointer("beta"))?;

    let alpha_zero = host_equals(alpha, T::zero());
    let beta_one = host_equals(beta, T::one());
    if alpha_zero && beta_one {
        log::trace!("hbmv: alpha == 0 and beta == 1, nothing to do");
        return Ok(Validation::NoOp);
    }

    if !present.y {
        return Err(HbmvError::NullPointer("y"));
    }
    if !alpha_zero {
        if !present.a {
            return Err(HbmvError::NullPointer("A"));
        }
        if !present.x {
            return Err(HbmvError::NullPointer("x"));
        }
    }

    Ok(if alpha_zero {
        Validation::ScaleOnly
    } else {
        Validation::Compute
    })
}

/// Only host coefficients can be compared; device values are unknown here.
fn host_equals<T: Copy + PartialEq>(c: &Coefficient<'_, T>, value: T) -> bool {
    match c.mode() {
        PointerMode::Host => c.host_value() == Some(value),
        PointerMode::Device => false,
    }
}

fn check_sizes(shape: &Shape) -> Result<()> {
    let invalid = |param, value| Err(HbmvError::InvalidSize { param, value });
    if shape.n < 0 {
        return invalid("n", shape.n);
    }
    if shape.k < 0 {
        return invalid("k", shape.k);
    }
    if shape.lda <= shape.k {
        return invalid("lda", shape.lda);
    }
    if shape.incx == 0 {
        return invalid("incx", 0);
    }
    if shape.incy == 0 {
        return invalid("incy", 0);
    }
    if shape.batch_count < 0 {
        return invalid("batch_count", shape.batch_count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    const ALL: Presence = Presence {
        a: true,
        x: true,
        y: true,
    };
    const NONE: Presence = Presence {
        a: false,
        x: false,
        y: false,
    };

    fn shape() -> Shape {
        Shape {
            n: 4,
            k: 1,
            lda: 2,
            incx: 1,
            incy: 1,
            batch_count: 3,
        }
    }

    fn check(
        handle: Option<&Handle>,
        fill: Fill,
        shape: Shape,
        alpha: Option<f64>,
        beta: Option<f64>,
        present: Presence,
    ) -> std::result::Result<Validation, Status> {
        let alpha = alpha.map(Coefficient::Host);
        let beta = beta.map(Coefficient::Host);
        validate(handle, fill, &shape, alpha.as_ref(), beta.as_ref(), present)
            .map_err(|e| e.status())
    }

    #[test]
    fn test_precedence_handle_first() {
        let bad = Shape { n: -1, ..shape() };
        assert_eq!(
            check(None, Fill::Full, bad, None, None, NONE),
            Err(Status::InvalidHandle)
        );
    }

    #[test]
    fn test_fill_before_size() {
        let h = Handle::new();
        let bad = Shape { n: -1, ..shape() };
        assert_eq!(
            check(Some(&h), Fill::Full, bad, Some(1.0), Some(1.0), ALL),
            Err(Status::InvalidValue)
        );
    }

    #[test]
    fn test_size_checks() {
        let h = Handle::new();
        let cases = [
            Shape { n: -1, ..shape() },
            Shape { k: -1, ..shape() },
            Shape { lda: 1, ..shape() },
            Shape { lda: 0, k: 0, ..shape() },
            Shape { incx: 0, ..shape() },
            Shape { incy: 0, ..shape() },
            Shape {
                batch_count: -1,
                ..shape()
            },
        ];
        for s in cases {
            assert_eq!(
                check(Some(&h), Fill::Upper, s, Some(1.0), Some(1.0), ALL),
                Err(Status::InvalidSize),
                "{s:?}"
            );
        }
    }

    #[test]
    fn test_size_before_pointers() {
        let h = Handle::new();
        let bad = Shape { incy: 0, ..shape() };
        assert_eq!(
            check(Some(&h), Fill::Lower, bad, None, None, NONE),
            Err(Status::InvalidSize)
        );
    }

    #[test]
    fn test_empty_problem_needs_no_operands() {
        let h = Handle::new();
        for s in [Shape { n: 0, ..shape() }, Shape { batch_count: 0, ..shape() }] {
            assert_eq!(
                check(Some(&h), Fill::Upper, s, None, None, NONE),
                Ok(Validation::NoOp)
            );
        }
    }

    #[test]
    fn test_missing_coefficients() {
        let h = Handle::new();
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), None, Some(1.0), ALL),
            Err(Status::InvalidPointer)
        );
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), Some(1.0), None, ALL),
            Err(Status::InvalidPointer)
        );
    }

    #[test]
    fn test_alpha_zero_beta_one_quick_return() {
        let h = Handle::new();
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), Some(0.0), Some(1.0), NONE),
            Ok(Validation::NoOp)
        );
    }

    #[test]
    fn test_alpha_zero_needs_only_y() {
        let h = Handle::new();
        let only_y = Presence { y: true, ..NONE };
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), Some(0.0), Some(2.0), only_y),
            Ok(Validation::ScaleOnly)
        );
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), Some(0.0), Some(2.0), NONE),
            Err(Status::InvalidPointer)
        );
    }

    #[test]
    fn test_compute_needs_every_operand() {
        let h = Handle::new();
        for p in [
            Presence { a: false, ..ALL },
            Presence { x: false, ..ALL },
            Presence { y: false, ..ALL },
        ] {
            assert_eq!(
                check(Some(&h), Fill::Upper, shape(), Some(1.0), Some(0.0), p),
                Err(Status::InvalidPointer),
                "{p:?}"
            );
        }
        assert_eq!(
            check(Some(&h), Fill::Upper, shape(), Some(1.0), Some(0.0), ALL),
            Ok(Validation::Compute)
        );
    }

    #[test]
    fn test_device_coefficients_are_not_inspected() {
        let h = Handle::new();
        let zero = h.device().scalar(0.0f64).unwrap();
        let one = h.device().scalar(1.0f64).unwrap();
        let alpha = Coefficient::Device(&zero);
        let beta = Coefficient::Device(&one);

        let v = validate(
            Some(&h),
            Fill::Upper,
            &shape(),
            Some(&alpha),
            Some(&beta),
            ALL,
        );
        assert_eq!(v.unwrap(), Validation::Compute);

        let err = validate(
            Some(&h),
            Fill::Upper,
            &shape(),
            Some(&alpha),
            Some(&beta),
            Presence { a: false, ..ALL },
        )
        .unwrap_err();
        assert_eq!(err.status(), Status::InvalidPointer);
        assert_eq!(h.device().stats().scalar_loads, 0);
    }

    #[test]
    fn test_mixed_pointer_modes() {
        let h = Handle::new();
        let one = h.device().scalar(1.0f64).unwrap();
        let zero = h.device().scalar(0.0f64).unwrap();
        let only_y = Presence { y: true, ..NONE };

        // host alpha == 0 with a device beta: scale path, beta never read
        let v = validate(
            Some(&h),
            Fill::Lower,
            &shape(),
            Some(&Coefficient::Host(0.0)),
            Some(&Coefficient::Device(&one)),
            only_y,
        );
        assert_eq!(v.unwrap(), Validation::ScaleOnly);

        // device alpha with host beta == 1: A and x still required
        let err = validate(
            Some(&h),
            Fill::Lower,
            &shape(),
            Some(&Coefficient::Device(&zero)),
            Some(&Coefficient::Host(1.0)),
            only_y,
        )
        .unwrap_err();
        assert_eq!(err.status(), Status::InvalidPointer);
        assert_eq!(h.device().stats().scalar_loads, 0);
    }
}
