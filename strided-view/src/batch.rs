//! Strided-batch views over borrowed buffers.
//!
//! A strided batch is `batch_count` items (matrices or vectors) of identical
//! shape inside one slice, consecutive items `stride` elements apart. The
//! views never own or copy the data; they only resolve where each item
//! starts.

use crate::{Result, StridedError};

/// Shape of a single batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemShape {
    /// Column-major matrix: column `j` starts at `j * ld`.
    Matrix { rows: usize, cols: usize, ld: usize },
    /// Vector whose element `i` sits at [`vector_offset`]`(i, len, inc)`.
    Vector { len: usize, inc: isize },
}

impl ItemShape {
    /// Describe a column-major matrix item.
    ///
    /// # Errors
    /// Returns an error if `ld < rows`.
    pub fn matrix(rows: usize, cols: usize, ld: usize) -> Result<Self> {
        if ld < rows {
            return Err(StridedError::LeadingDimensionTooSmall { ld, rows });
        }
        Ok(ItemShape::Matrix { rows, cols, ld })
    }

    /// Describe a vector item.
    ///
    /// # Errors
    /// Returns an error if `inc == 0`.
    pub fn vector(len: usize, inc: isize) -> Result<Self> {
        if inc == 0 {
            return Err(StridedError::ZeroIncrement);
        }
        Ok(ItemShape::Vector { len, inc })
    }

    /// Allocation size of one item: `ld * cols` or `len * |inc|`.
    ///
    /// # Errors
    /// Returns [`StridedError::OffsetOverflow`] when the size does not fit in `usize`.
    #[inline]
    pub fn footprint(&self) -> Result<usize> {
        match *self {
            ItemShape::Matrix { cols, ld, .. } => ld.checked_mul(cols),
            ItemShape::Vector { len, inc } => len.checked_mul(inc.unsigned_abs()),
        }
        .ok_or(StridedError::OffsetOverflow)
    }

    /// Number of elements from the item start up to and including the last
    /// addressed element. Zero for empty items.
    ///
    /// # Errors
    /// Returns [`StridedError::OffsetOverflow`] when the extent does not fit in `usize`.
    #[inline]
    pub fn span(&self) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        match *self {
            ItemShape::Matrix { rows, cols, ld } => ld
                .checked_mul(cols - 1)
                .and_then(|last_col| last_col.checked_add(rows)),
            ItemShape::Vector { len, inc } => (len - 1)
                .checked_mul(inc.unsigned_abs())
                .and_then(|last| last.checked_add(1)),
        }
        .ok_or(StridedError::OffsetOverflow)
    }

    /// Returns true if the item addresses no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        match *self {
            ItemShape::Matrix { rows, cols, .. } => rows == 0 || cols == 0,
            ItemShape::Vector { len, .. } => len == 0,
        }
    }
}

/// Offset of batch item `index`.
///
/// Non-negative strides place item `i` at `i * stride`. Negative strides
/// place it at `(i + 1 - batch_count) * stride`, so the items still occupy
/// `batch_count` ascending regions starting at offset 0, with the last item
/// first in memory.
#[inline]
pub fn batch_offset(index: usize, stride: isize, batch_count: usize) -> usize {
    debug_assert!(index < batch_count, "batch index out of range");
    if stride >= 0 {
        index * stride as usize
    } else {
        (batch_count - 1 - index) * stride.unsigned_abs()
    }
}

/// Offset of element `index` within a vector of `len` elements.
///
/// A negative increment walks the vector backwards from the end of its
/// storage, matching the BLAS convention.
#[inline]
pub fn vector_offset(index: usize, len: usize, inc: isize) -> usize {
    debug_assert!(index < len, "vector index out of range");
    if inc > 0 {
        index * inc as usize
    } else {
        (len - 1 - index) * inc.unsigned_abs()
    }
}

/// Minimum allocation size for `batch_count` items:
/// `footprint + (batch_count - 1) * |stride|`, or zero with no items.
///
/// # Errors
/// Returns [`StridedError::OffsetOverflow`] when the size does not fit in `usize`.
pub fn element_count(item: &ItemShape, stride: isize, batch_count: usize) -> Result<usize> {
    if batch_count == 0 {
        return Ok(0);
    }
    tail_len(item.footprint()?, stride, batch_count)
}

/// Number of elements a borrowed buffer must hold so that every batch item
/// is addressable.
///
/// # Errors
/// Returns [`StridedError::OffsetOverflow`] when the extent does not fit in `usize`.
pub fn required_len(item: &ItemShape, stride: isize, batch_count: usize) -> Result<usize> {
    let span = item.span()?;
    if batch_count == 0 || span == 0 {
        return Ok(0);
    }
    tail_len(span, stride, batch_count)
}

/// `head + (batch_count - 1) * |stride|`, checked. `batch_count` must be non-zero.
fn tail_len(head: usize, stride: isize, batch_count: usize) -> Result<usize> {
    stride
        .unsigned_abs()
        .checked_mul(batch_count - 1)
        .and_then(|tail| tail.checked_add(head))
        .ok_or(StridedError::OffsetOverflow)
}

/// Checks `len` against [`required_len`] and returns the item span.
fn validate_len(len: usize, item: &ItemShape, stride: isize, batch_count: usize) -> Result<usize> {
    let required = required_len(item, stride, batch_count)?;
    if len < required {
        return Err(StridedError::BufferTooSmall {
            required,
            actual: len,
        });
    }
    item.span()
}

/// An immutable view of `batch_count` strided items in a borrowed slice.
///
/// # Example
/// ```
/// use strided_view::{ItemShape, StridedBatchView};
///
/// // Two 2x2 column-major matrices, 4 elements apart.
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let item = ItemShape::matrix(2, 2, 2).unwrap();
/// let view = StridedBatchView::new(&data, item, 4, 2).unwrap();
/// assert_eq!(view.at(1), &[5.0, 6.0, 7.0, 8.0]);
/// ```
#[derive(Debug)]
pub struct StridedBatchView<'a, T> {
    data: &'a [T],
    item: ItemShape,
    span: usize,
    stride: isize,
    batch_count: usize,
}

impl<T> Clone for StridedBatchView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StridedBatchView<'_, T> {}

impl<'a, T> StridedBatchView<'a, T> {
    /// Create a new batch view.
    ///
    /// # Errors
    /// Returns an error if `data` is too short to hold every item.
    pub fn new(data: &'a [T], item: ItemShape, stride: isize, batch_count: usize) -> Result<Self> {
        let span = validate_len(data.len(), &item, stride, batch_count)?;
        Ok(Self {
            data,
            item,
            span,
            stride,
            batch_count,
        })
    }

    /// Shape of every item.
    #[inline]
    pub fn item(&self) -> ItemShape {
        self.item
    }

    /// Distance in elements between consecutive items.
    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Number of items.
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Returns the borrowed buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Offset of item `batch` in the buffer.
    #[inline]
    pub fn offset_of(&self, batch: usize) -> usize {
        batch_offset(batch, self.stride, self.batch_count)
    }

    /// Returns true if no two items share an element.
    #[inline]
    pub fn is_disjoint(&self) -> bool {
        self.batch_count <= 1 || self.stride.unsigned_abs() >= self.span
    }

    /// Slice holding item `batch`, starting at its base offset.
    ///
    /// # Panics
    /// Panics if `batch >= batch_count`.
    #[inline]
    pub fn at(&self, batch: usize) -> &'a [T] {
        assert!(batch < self.batch_count, "batch index out of bounds");
        let span = self.span;
        if span == 0 {
            return &[];
        }
        let start = self.offset_of(batch);
        &self.data[start..start + span]
    }
}

/// A mutable view of `batch_count` strided items in a borrowed slice.
#[derive(Debug)]
pub struct StridedBatchViewMut<'a, T> {
    data: &'a mut [T],
    item: ItemShape,
    span: usize,
    stride: isize,
    batch_count: usize,
}

impl<'a, T> StridedBatchViewMut<'a, T> {
    /// Create a new mutable batch view.
    ///
    /// # Errors
    /// Returns an error if `data` is too short to hold every item.
    pub fn new(
        data: &'a mut [T],
        item: ItemShape,
        stride: isize,
        batch_count: usize,
    ) -> Result<Self> {
        let span = validate_len(data.len(), &item, stride, batch_count)?;
        Ok(Self {
            data,
            item,
            span,
            stride,
            batch_count,
        })
    }

    /// Shape of every item.
    #[inline]
    pub fn item(&self) -> ItemShape {
        self.item
    }

    /// Distance in elements between consecutive items.
    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Elements addressed by one item.
    #[inline]
    pub fn span(&self) -> usize {
        self.span
    }

    /// Number of items.
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Offset of item `batch` in the buffer.
    #[inline]
    pub fn offset_of(&self, batch: usize) -> usize {
        batch_offset(batch, self.stride, self.batch_count)
    }

    /// Returns true if no two items share an element.
    #[inline]
    pub fn is_disjoint(&self) -> bool {
        self.batch_count <= 1 || self.stride.unsigned_abs() >= self.span
    }

    /// Slice holding item `batch`.
    ///
    /// # Panics
    /// Panics if `batch >= batch_count`.
    #[inline]
    pub fn at(&self, batch: usize) -> &[T] {
        assert!(batch < self.batch_count, "batch index out of bounds");
        let span = self.span;
        if span == 0 {
            return &[];
        }
        let start = self.offset_of(batch);
        &self.data[start..start + span]
    }

    /// Mutable slice holding item `batch`.
    ///
    /// # Panics
    /// Panics if `batch >= batch_count`.
    #[inline]
    pub fn at_mut(&mut self, batch: usize) -> &mut [T] {
        assert!(batch < self.batch_count, "batch index out of bounds");
        let span = self.span;
        if span == 0 {
            return &mut [];
        }
        let start = self.offset_of(batch);
        &mut self.data[start..start + span]
    }

    /// Reborrow as an immutable view.
    #[inline]
    pub fn as_view(&self) -> StridedBatchView<'_, T> {
        StridedBatchView {
            data: &*self.data,
            item: self.item,
            span: self.span,
            stride: self.stride,
            batch_count: self.batch_count,
        }
    }

    /// Split into one mutable slice per item, in batch order.
    ///
    /// # Errors
    /// Returns [`StridedError::OverlappingBatches`] if items share elements.
    pub fn into_batches(self) -> Result<Vec<&'a mut [T]>> {
        let span = self.span;
        let step = self.stride.unsigned_abs();
        if !self.is_disjoint() {
            return Err(StridedError::OverlappingBatches { stride: step, span });
        }
        if span == 0 {
            return Ok((0..self.batch_count).map(|_| <&mut [T]>::default()).collect());
        }

        // Regions ascend in memory; region j holds batch j, or batch
        // batch_count - 1 - j when the stride is negative.
        let mut rest: &'a mut [T] = self.data;
        let mut out = Vec::with_capacity(self.batch_count);
        for j in 0..self.batch_count {
            let cut = if j + 1 < self.batch_count { step } else { span };
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(cut);
            let (region, _) = chunk.split_at_mut(span);
            out.push(region);
            rest = tail;
        }
        if self.stride < 0 {
            out.reverse();
        }
        Ok(out)
    }
}
