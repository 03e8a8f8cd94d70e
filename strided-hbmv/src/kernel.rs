//! Kernels for one batch element.
//!
//! `x` and `y` are the slices starting at the element's base offset; entry
//! `i` is read at [`vector_offset`]`(i, n, inc)`. Row sums run over the band
//! columns in ascending order on a single thread, so results do not depend
//! on how batches are scheduled.

use strided_traits::HermitianScalar;
use strided_view::{vector_offset, BandedLayout};

/// `y := alpha * A * x + beta * y` for one batch element.
///
/// When `beta == 0`, `y` is overwritten without being read.
#[allow(clippy::too_many_arguments)]
pub fn hbmv<T: HermitianScalar>(
    layout: &BandedLayout,
    alpha: T,
    a: &[T],
    x: &[T],
    incx: isize,
    beta: T,
    y: &mut [T],
    incy: isize,
) {
    let n = layout.n();
    let is_beta_zero = beta == T::zero();
    let is_beta_one = beta == T::one();
    let is_alpha_one = alpha == T::one();

    for row in 0..n {
        let mut acc = T::zero();
        for col in layout.band_columns(row) {
            acc = acc + layout.read(a, row, col) * x[vector_offset(col, n, incx)];
        }
        let y_elem = &mut y[vector_offset(row, n, incy)];
        let scaled = if is_alpha_one { acc } else { alpha * acc };
        *y_elem = if is_beta_zero {
            scaled
        } else if is_beta_one {
            scaled + *y_elem
        } else {
            scaled + beta * *y_elem
        };
    }
}

/// `y := beta * y` for one batch element. `beta == 0` writes zeros without
/// reading `y`; `beta == 1` leaves `y` untouched.
pub fn scale<T: HermitianScalar>(n: usize, beta: T, y: &mut [T], incy: isize) {
    if beta == T::one() {
        return;
    }
    let is_beta_zero = beta == T::zero();
    for i in 0..n {
        let y_elem = &mut y[vector_offset(i, n, incy)];
        *y_elem = if is_beta_zero {
            T::zero()
        } else {
            beta * *y_elem
        };
    }
}
