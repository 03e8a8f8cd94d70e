//! Runs the per-element kernels over every batch index.
//!
//! Batch elements are independent. With the `parallel` feature they are
//! spread over rayon workers when the `y` elements are disjoint and the
//! call carries enough work; otherwise they run in batch order on the
//! calling thread. Elements already written are not rolled back if a later
//! step fails.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use strided_view::{BandedLayout, ItemShape, StridedBatchView, StridedBatchViewMut, StridedError};

use crate::coefficient::Coefficient;
use crate::handle::Handle;
use crate::kernel;
use crate::maybe_sync::MaybeSendSync;
use crate::validate::Validation;
use crate::{BatchedHbmv, HbmvError, HermitianScalar, Result, StridedBatchedHbmv};

/// What remains to be done once the coefficients are known.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Plan<T> {
    Scale { beta: T },
    Compute { alpha: T, beta: T },
}

/// Read device-resident coefficients (once per call) and pick the kernel.
/// `None` means `y` stays untouched.
fn plan<T: HermitianScalar>(
    handle: &Handle,
    validation: Validation,
    alpha: Option<&Coefficient<'_, T>>,
    beta: Option<&Coefficient<'_, T>>,
) -> Result<Option<Plan<T>>> {
    let alpha = alpha.ok_or(HbmvError::NullPointer("alpha"))?;
    let beta = beta.ok_or(HbmvError::NullPointer("beta"))?;
    let device = handle.device();
    let alpha = alpha.resolve(device)?;
    let beta = beta.resolve(device)?;

    if alpha == T::zero() {
        if beta == T::one() {
            log::trace!("hbmv: resolved alpha == 0 and beta == 1, nothing to do");
            return Ok(None);
        }
        return Ok(Some(Plan::Scale { beta }));
    }
    Ok(Some(match validation {
        Validation::Compute => Plan::Compute { alpha, beta },
        Validation::ScaleOnly => Plan::Scale { beta },
        Validation::NoOp => return Ok(None),
    }))
}

fn to_usize(param: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| HbmvError::InvalidSize { param, value })
}

fn to_isize(param: &'static str, value: i64) -> Result<isize> {
    isize::try_from(value).map_err(|_| HbmvError::InvalidSize { param, value })
}

fn operand_error(operand: &'static str, e: StridedError) -> HbmvError {
    match e {
        StridedError::BufferTooSmall { required, actual } => HbmvError::BufferTooSmall {
            operand,
            required,
            actual,
        },
        e => HbmvError::Strided(e),
    }
}

/// Multiply-adds of the whole call, used to decide on parallel dispatch.
fn work(batch_count: usize, n: usize, k: usize) -> usize {
    batch_count
        .saturating_mul(n)
        .saturating_mul(k.saturating_mul(2).saturating_add(1))
}

pub(crate) fn strided<T>(
    handle: &Handle,
    validation: Validation,
    args: StridedBatchedHbmv<'_, T>,
) -> Result<()>
where
    T: HermitianScalar + MaybeSendSync,
{
    let StridedBatchedHbmv {
        fill,
        n,
        k,
        alpha,
        a,
        lda,
        stride_a,
        x,
        incx,
        stride_x,
        beta,
        y,
        incy,
        stride_y,
        batch_count,
    } = args;

    let n = to_usize("n", n)?;
    let k = to_usize("k", k)?;
    let lda = to_usize("lda", lda)?;
    let incx = to_isize("incx", incx)?;
    let incy = to_isize("incy", incy)?;
    let batch_count = to_usize("batch_count", batch_count)?;
    let layout = BandedLayout::new(n, k, lda, fill)?;

    let y = y.ok_or(HbmvError::NullPointer("y"))?;
    let y = StridedBatchViewMut::new(y, ItemShape::vector(n, incy)?, stride_y, batch_count)
        .map_err(|e| operand_error("y", e))?;

    let operands = if validation == Validation::Compute {
        let a = a.ok_or(HbmvError::NullPointer("A"))?;
        let x = x.ok_or(HbmvError::NullPointer("x"))?;
        let a = StridedBatchView::new(a, layout.item_shape(), stride_a, batch_count)
            .map_err(|e| operand_error("A", e))?;
        let x = StridedBatchView::new(x, ItemShape::vector(n, incx)?, stride_x, batch_count)
            .map_err(|e| operand_error("x", e))?;
        Some((a, x))
    } else {
        None
    };

    let Some(plan) = plan(handle, validation, alpha.as_ref(), beta.as_ref())? else {
        return Ok(());
    };
    log::debug!(
        "hbmv_strided_batched: {plan:?} fill={fill:?} n={n} k={k} batch_count={batch_count} stride_y={stride_y}"
    );

    match (plan, operands) {
        (Plan::Compute { alpha, beta }, Some((a, x))) => {
            let work = work(batch_count, n, k);
            run_strided(handle, y, work, |b, yb| {
                kernel::hbmv(&layout, alpha, a.at(b), x.at(b), incx, beta, yb, incy)
            })
        }
        (Plan::Scale { beta }, _) => {
            run_strided(handle, y, batch_count.saturating_mul(n), |_, yb| {
                kernel::scale(n, beta, yb, incy)
            })
        }
        (Plan::Compute { .. }, None) => Err(HbmvError::Internal(
            "compute plan without operands".to_string(),
        )),
    }
}

pub(crate) fn batched<T>(
    handle: &Handle,
    validation: Validation,
    args: BatchedHbmv<'_, '_, T>,
) -> Result<()>
where
    T: HermitianScalar + MaybeSendSync,
{
    let BatchedHbmv {
        fill,
        n,
        k,
        alpha,
        a,
        lda,
        x,
        incx,
        beta,
        y,
        incy,
        batch_count,
    } = args;

    let n = to_usize("n", n)?;
    let k = to_usize("k", k)?;
    let lda = to_usize("lda", lda)?;
    let incx = to_isize("incx", incx)?;
    let incy = to_isize("incy", incy)?;
    let batch_count = to_usize("batch_count", batch_count)?;
    let layout = BandedLayout::new(n, k, lda, fill)?;

    let ys = y.ok_or(HbmvError::NullPointer("y"))?;
    let y_span = ItemShape::vector(n, incy)?.span()?;
    check_buffers("y", ys.len(), ys.iter().map(|b| b.len()), batch_count, y_span)?;
    let ys = &mut ys[..batch_count];

    let operands = if validation == Validation::Compute {
        let a = a.ok_or(HbmvError::NullPointer("A"))?;
        let x = x.ok_or(HbmvError::NullPointer("x"))?;
        let x_span = ItemShape::vector(n, incx)?.span()?;
        let a_span = layout.item_shape().span()?;
        check_buffers("A", a.len(), a.iter().map(|b| b.len()), batch_count, a_span)?;
        check_buffers("x", x.len(), x.iter().map(|b| b.len()), batch_count, x_span)?;
        Some((a, x))
    } else {
        None
    };

    let Some(plan) = plan(handle, validation, alpha.as_ref(), beta.as_ref())? else {
        return Ok(());
    };
    log::debug!("hbmv_batched: {plan:?} fill={fill:?} n={n} k={k} batch_count={batch_count}");

    match (plan, operands) {
        (Plan::Compute { alpha, beta }, Some((a, x))) => {
            for_each_batch(handle, ys, work(batch_count, n, k), |b, yb| {
                kernel::hbmv(&layout, alpha, a[b], x[b], incx, beta, yb, incy)
            });
            Ok(())
        }
        (Plan::Scale { beta }, _) => {
            for_each_batch(handle, ys, batch_count.saturating_mul(n), |_, yb| {
                kernel::scale(n, beta, yb, incy)
            });
            Ok(())
        }
        (Plan::Compute { .. }, None) => Err(HbmvError::Internal(
            "compute plan without operands".to_string(),
        )),
    }
}

/// Every batch element needs its own buffer of at least `span` elements.
fn check_buffers(
    operand: &'static str,
    count: usize,
    lens: impl Iterator<Item = usize>,
    batch_count: usize,
    span: usize,
) -> Result<()> {
    if count < batch_count {
        return Err(HbmvError::BufferTooSmall {
            operand,
            required: batch_count,
            actual: count,
        });
    }
    for len in lens.take(batch_count) {
        if len < span {
            return Err(HbmvError::BufferTooSmall {
                operand,
                required: span,
                actual: len,
            });
        }
    }
    Ok(())
}

fn run_strided<T, F>(handle: &Handle, mut y: StridedBatchViewMut<'_, T>, work: usize, f: F) -> Result<()>
where
    T: MaybeSendSync,
    F: Fn(usize, &mut [T]) + MaybeSendSync,
{
    if y.is_disjoint() {
        let mut batches = y.into_batches()?;
        for_each_batch(handle, &mut batches, work, f);
        return Ok(());
    }
    log::warn!(
        "hbmv: y batches overlap (stride {}, span {}), running sequentially",
        y.stride(),
        y.span()
    );
    for b in 0..y.batch_count() {
        f(b, y.at_mut(b));
    }
    Ok(())
}

fn for_each_batch<T, F>(handle: &Handle, batches: &mut [&mut [T]], work: usize, f: F)
where
    T: MaybeSendSync,
    F: Fn(usize, &mut [T]) + MaybeSendSync,
{
    #[cfg(feature = "parallel")]
    if batches.len() > 1 && work >= handle.config().parallel_min_work {
        log::debug!("hbmv: {} batches in parallel (work {work})", batches.len());
        handle.install(|| {
            batches
                .par_iter_mut()
                .enumerate()
                .for_each(|(b, yb)| f(b, &mut **yb))
        });
        return;
    }

    log::debug!(
        "hbmv: {} batches sequentially (work {work}, threshold {})",
        batches.len(),
        handle.config().parallel_min_work
    );
    for (b, yb) in batches.iter_mut().enumerate() {
        f(b, &mut **yb);
    }
}
