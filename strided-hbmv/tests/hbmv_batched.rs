mod support;

use num_complex::Complex64;
use strided_hbmv::{
    hbmv_batched, hbmv_strided_batched, BatchedHbmv, Coefficient, Fill, Handle, HandleConfig,
    HbmvError, Status, StridedBatchedHbmv,
};
use support::{assert_close, bits, init_logger, random_vec, ref_hbmv, rng, TestScalar};

#[allow(clippy::too_many_arguments)]
fn args<'a, 'b, T>(
    fill: Fill,
    n: i64,
    k: i64,
    lda: i64,
    a: Option<&'a [&'b [T]]>,
    x: Option<&'a [&'b [T]]>,
    y: Option<&'a mut [&'b mut [T]]>,
    batch_count: i64,
) -> BatchedHbmv<'a, 'b, T>
where
    T: TestScalar,
{
    BatchedHbmv {
        fill,
        n,
        k,
        alpha: Some(Coefficient::Host(T::one())),
        a,
        lda,
        x,
        incx: 1,
        beta: Some(Coefficient::Host(T::zero())),
        y,
        incy: 1,
        batch_count,
    }
}

#[test]
fn test_bad_arg() {
    init_logger();
    let handle = Handle::new();
    let a0 = vec![1.0f64; 8];
    let x0 = vec![1.0f64; 4];
    let mut y0 = vec![0.0f64; 4];
    let a = [a0.as_slice()];
    let x = [x0.as_slice()];

    {
        let mut y = [y0.as_mut_slice()];
        let res = hbmv_batched(
            None,
            args(Fill::Upper, 4, 1, 2, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidHandle);
    }
    {
        let mut y = [y0.as_mut_slice()];
        let res = hbmv_batched(
            Some(&handle),
            args(Fill::Full, 4, 1, 2, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidValue);
    }
    {
        let mut y = [y0.as_mut_slice()];
        let res = hbmv_batched(
            Some(&handle),
            args(Fill::Upper, 4, 1, 1, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidSize);
    }
    {
        let res = hbmv_batched(
            Some(&handle),
            args::<f64>(Fill::Upper, 4, 1, 2, Some(&a[..]), Some(&x[..]), None, 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidPointer);
    }
    {
        let mut y = [y0.as_mut_slice()];
        let res = hbmv_batched(
            Some(&handle),
            args(Fill::Upper, 4, 1, 2, None, Some(&x[..]), Some(&mut y[..]), 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidPointer);
    }
    // empty problems need no operands
    let res = hbmv_batched(Some(&handle), args::<f64>(Fill::Upper, 0, 1, 2, None, None, None, 3));
    assert!(res.is_ok());
    let res = hbmv_batched(Some(&handle), args::<f64>(Fill::Upper, 4, 1, 2, None, None, None, 0));
    assert!(res.is_ok());
}

#[test]
fn test_short_pointer_arrays() {
    let handle = Handle::new();
    let a0 = vec![1.0f64; 8];
    let x0 = vec![1.0f64; 4];
    let mut y0 = vec![0.0f64; 4];
    let a = [a0.as_slice()];
    let x = [x0.as_slice()];
    let mut y = [y0.as_mut_slice()];
    let err = hbmv_batched(
        Some(&handle),
        args(Fill::Upper, 4, 1, 2, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 2),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HbmvError::BufferTooSmall {
            operand: "y",
            required: 2,
            actual: 1
        }
    ));
    assert_eq!(err.status(), Status::InvalidSize);
}

#[test]
fn test_short_buffer() {
    let handle = Handle::new();
    let a0 = vec![1.0f64; 7];
    let x0 = vec![1.0f64; 4];
    let mut y0 = vec![0.0f64; 4];
    let a = [a0.as_slice()];
    let x = [x0.as_slice()];
    let mut y = [y0.as_mut_slice()];
    // K = 1, lda = 3: the last column ends at 3 * 3 + 2 = 11
    let err = hbmv_batched(
        Some(&handle),
        args(Fill::Upper, 4, 1, 3, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 1),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HbmvError::BufferTooSmall {
            operand: "A",
            required: 11,
            actual: 7
        }
    ));
}

#[test]
fn test_huge_lda_is_invalid_size() {
    let handle = Handle::new();
    let a0 = vec![1.0f64; 8];
    let x0 = vec![1.0f64; 4];
    let mut y0 = vec![7.0f64; 4];
    let a = [a0.as_slice()];
    let x = [x0.as_slice()];
    {
        let mut y = [y0.as_mut_slice()];
        let res = hbmv_batched(
            Some(&handle),
            args(Fill::Upper, 4, 0, i64::MAX, Some(&a[..]), Some(&x[..]), Some(&mut y[..]), 1),
        );
        assert_eq!(Status::of(&res), Status::InvalidSize);
    }
    assert_eq!(y0, [7.0; 4]);
}

#[test]
fn test_alpha_zero_needs_only_y() {
    let handle = Handle::new();
    let mut y0 = vec![1.0f64, 2.0];
    let mut y1 = vec![3.0f64, 4.0];
    let mut y = [y0.as_mut_slice(), y1.as_mut_slice()];
    let mut batched = args::<f64>(Fill::Lower, 2, 0, 1, None, None, Some(&mut y[..]), 2);
    batched.alpha = Some(Coefficient::Host(0.0));
    batched.beta = Some(Coefficient::Host(0.5));
    hbmv_batched(Some(&handle), batched).unwrap();
    assert_eq!(y0, [0.5, 1.0]);
    assert_eq!(y1, [1.5, 2.0]);
}

fn check_against_reference<T: TestScalar>(seed: u64, handle: &Handle) {
    let mut rng = rng(seed);
    let (n, k, lda, bc) = (7usize, 2usize, 4usize, 5usize);
    for fill in [Fill::Upper, Fill::Lower] {
        let a_bufs: Vec<Vec<T>> = (0..bc).map(|_| random_vec(&mut rng, lda * n)).collect();
        let x_bufs: Vec<Vec<T>> = (0..bc).map(|_| random_vec(&mut rng, 2 * n)).collect();
        let y_bufs: Vec<Vec<T>> = (0..bc).map(|_| random_vec(&mut rng, n)).collect();
        let alpha = T::sample(&mut rng);
        let beta = T::sample(&mut rng);

        let mut expected = y_bufs.clone();
        for b in 0..bc {
            ref_hbmv(fill, n, k, alpha, &a_bufs[b], lda, &x_bufs[b], -2, beta, &mut expected[b], 1);
        }

        let mut actual = y_bufs.clone();
        let a: Vec<&[T]> = a_bufs.iter().map(Vec::as_slice).collect();
        let x: Vec<&[T]> = x_bufs.iter().map(Vec::as_slice).collect();
        let mut y: Vec<&mut [T]> = actual.iter_mut().map(Vec::as_mut_slice).collect();
        let batched = BatchedHbmv {
            fill,
            n: n as i64,
            k: k as i64,
            alpha: Some(Coefficient::Host(alpha)),
            a: Some(&a[..]),
            lda: lda as i64,
            x: Some(&x[..]),
            incx: -2,
            beta: Some(Coefficient::Host(beta)),
            y: Some(&mut y[..]),
            incy: 1,
            batch_count: bc as i64,
        };
        hbmv_batched(Some(handle), batched).unwrap();

        for b in 0..bc {
            assert_close(&actual[b], &expected[b]);
        }
    }
}

#[test]
fn test_matches_reference() {
    init_logger();
    let handle = Handle::new();
    check_against_reference::<f64>(21, &handle);
    check_against_reference::<Complex64>(22, &handle);
}

#[test]
fn test_matches_reference_in_parallel() {
    init_logger();
    let handle = Handle::with_config(HandleConfig {
        num_threads: Some(2),
        parallel_min_work: 0,
        ..HandleConfig::default()
    })
    .unwrap();
    check_against_reference::<Complex64>(23, &handle);
}

#[test]
fn test_agrees_with_strided_form() {
    let handle = Handle::new();
    let mut rng = rng(9);
    let (n, k, lda, bc) = (6usize, 1usize, 2usize, 3usize);
    let a_flat: Vec<f64> = random_vec(&mut rng, lda * n * bc);
    let x_flat: Vec<f64> = random_vec(&mut rng, n * bc);
    let y_flat: Vec<f64> = random_vec(&mut rng, n * bc);

    let mut strided = y_flat.clone();
    let args = StridedBatchedHbmv::new(Fill::Upper, n as i64, k as i64)
        .alpha(Coefficient::Host(-1.5))
        .beta(Coefficient::Host(0.75))
        .a(&a_flat, lda as i64, (lda * n) as isize)
        .x(&x_flat, 1, n as isize)
        .y(&mut strided, 1, n as isize)
        .batch_count(bc as i64);
    hbmv_strided_batched(Some(&handle), args).unwrap();

    let mut pointer = y_flat.clone();
    let a: Vec<&[f64]> = a_flat.chunks(lda * n).collect();
    let x: Vec<&[f64]> = x_flat.chunks(n).collect();
    let mut y: Vec<&mut [f64]> = pointer.chunks_mut(n).collect();
    let batched = BatchedHbmv {
        fill: Fill::Upper,
        n: n as i64,
        k: k as i64,
        alpha: Some(Coefficient::Host(-1.5)),
        a: Some(&a[..]),
        lda: lda as i64,
        x: Some(&x[..]),
        incx: 1,
        beta: Some(Coefficient::Host(0.75)),
        y: Some(&mut y[..]),
        incy: 1,
        batch_count: bc as i64,
    };
    hbmv_batched(Some(&handle), batched).unwrap();

    assert_eq!(bits(&strided), bits(&pointer));
}
