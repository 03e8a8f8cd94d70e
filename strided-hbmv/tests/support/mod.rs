#![allow(dead_code)]

use approx::assert_relative_eq;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use strided_hbmv::{Fill, HermitianScalar};
use strided_traits::ElementOpApply;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Element types exercised by the integration tests.
pub trait TestScalar: HermitianScalar + Send + Sync {
    fn sample(rng: &mut StdRng) -> Self;
    fn parts(self) -> (f64, f64);
    fn nan() -> Self;
}

impl TestScalar for f64 {
    fn sample(rng: &mut StdRng) -> Self {
        rng.sample(StandardNormal)
    }
    fn parts(self) -> (f64, f64) {
        (self, 0.0)
    }
    fn nan() -> Self {
        f64::NAN
    }
}

impl TestScalar for Complex64 {
    fn sample(rng: &mut StdRng) -> Self {
        Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
    }
    fn parts(self) -> (f64, f64) {
        (self.re, self.im)
    }
    fn nan() -> Self {
        Complex64::new(f64::NAN, f64::NAN)
    }
}

pub fn random_vec<T: TestScalar>(rng: &mut StdRng, len: usize) -> Vec<T> {
    (0..len).map(|_| T::sample(rng)).collect()
}

/// Position of element `i` of a length-`n` vector with increment `inc`.
fn elem(i: usize, n: usize, inc: isize) -> usize {
    if inc > 0 {
        i * inc as usize
    } else {
        (n - 1 - i) * inc.unsigned_abs()
    }
}

/// Start of batch `b` in a buffer holding `batch_count` items.
pub fn batch_start(b: usize, stride: isize, batch_count: usize) -> usize {
    if stride >= 0 {
        b * stride as usize
    } else {
        (batch_count - 1 - b) * stride.unsigned_abs()
    }
}

/// Expand one compact band into a dense row-major Hermitian matrix.
pub fn dense_hermitian<T: TestScalar>(fill: Fill, n: usize, k: usize, ab: &[T], lda: usize) -> Vec<T> {
    let mut dense = vec![T::zero(); n * n];
    for c in 0..n {
        let rows: Vec<usize> = match fill {
            Fill::Upper => (c.saturating_sub(k)..=c).collect(),
            _ => (c..n.min(c + k + 1)).collect(),
        };
        for r in rows {
            let slot = match fill {
                Fill::Upper => k + r - c,
                _ => r - c,
            };
            let v = ab[slot + c * lda];
            if r == c {
                dense[r * n + c] = v.real_part();
            } else {
                dense[r * n + c] = v;
                dense[c * n + r] = v.conj();
            }
        }
    }
    dense
}

/// Dense reference for one batch element, `y` updated in place.
#[allow(clippy::too_many_arguments)]
pub fn ref_hbmv<T: TestScalar>(
    fill: Fill,
    n: usize,
    k: usize,
    alpha: T,
    ab: &[T],
    lda: usize,
    x: &[T],
    incx: isize,
    beta: T,
    y: &mut [T],
    incy: isize,
) {
    let a = dense_hermitian(fill, n, k, ab, lda);
    for r in 0..n {
        let mut acc = T::zero();
        for c in 0..n {
            acc = acc + a[r * n + c] * x[elem(c, n, incx)];
        }
        let yi = &mut y[elem(r, n, incy)];
        *yi = if beta == T::zero() {
            alpha * acc
        } else {
            alpha * acc + beta * *yi
        };
    }
}

/// Random band storage for `batch_count` matrices, padding included.
pub fn random_band<T: TestScalar>(
    rng: &mut StdRng,
    n: usize,
    lda: usize,
    stride: isize,
    batch_count: usize,
) -> Vec<T> {
    let len = lda * n + (batch_count - 1) * stride.unsigned_abs();
    random_vec(rng, len)
}

/// Buffer for `batch_count` vectors of `n` elements with increment `inc`.
pub fn random_vector_batch<T: TestScalar>(
    rng: &mut StdRng,
    n: usize,
    inc: isize,
    stride: isize,
    batch_count: usize,
) -> Vec<T> {
    let len = n * inc.unsigned_abs() + (batch_count - 1) * stride.unsigned_abs();
    random_vec(rng, len)
}

pub fn assert_close<T: TestScalar>(actual: &[T], expected: &[T]) {
    assert_eq!(actual.len(), expected.len());
    for (&a, &e) in actual.iter().zip(expected) {
        let (ar, ai) = a.parts();
        let (er, ei) = e.parts();
        assert_relative_eq!(ar, er, epsilon = 1e-10, max_relative = 1e-10);
        assert_relative_eq!(ai, ei, epsilon = 1e-10, max_relative = 1e-10);
    }
}

pub fn bits<T: TestScalar>(v: &[T]) -> Vec<(u64, u64)> {
    v.iter()
        .map(|&e| {
            let (re, im) = e.parts();
            (re.to_bits(), im.to_bits())
        })
        .collect()
}
