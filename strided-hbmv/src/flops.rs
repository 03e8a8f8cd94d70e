use std::mem::size_of;

use strided_traits::HermitianScalar;

/// Stored entries of one triangle of an `n x n` band of half-bandwidth `k`.
fn stored_entries(n: usize, k: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let k = k.min(n - 1);
    n * (k + 1) - k * (k + 1) / 2
}

/// Floating-point operations of one HBMV, in units of 10^9.
///
/// Every logical matrix entry costs one multiply-add; each row adds the
/// `alpha` and `beta` scaling.
pub fn hbmv_gflop_count<T: HermitianScalar>(n: usize, k: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let logical = (2 * stored_entries(n, k) - n) as f64;
    let n = n as f64;
    let flops = if T::IS_COMPLEX {
        // complex mul = 6, complex add = 2
        8.0 * logical + 14.0 * n
    } else {
        2.0 * logical + 3.0 * n
    };
    flops / 1e9
}

/// Bytes moved by one HBMV, in units of 10^9: the stored band and `x` read
/// once, `y` read and written.
pub fn hbmv_gbyte_count<T: HermitianScalar>(n: usize, k: usize) -> f64 {
    let elems = stored_entries(n, k) + 3 * n;
    (elems * size_of::<T>()) as f64 / 1e9
}
