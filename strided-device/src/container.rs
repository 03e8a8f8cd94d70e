//! Owning strided-batch containers on the host and on a device.
//!
//! Both containers allocate `footprint + (batch_count - 1) * |stride|`
//! elements and reject layouts that would allocate nothing.

use strided_view::{batch_offset, element_count, ItemShape, StridedBatchView, StridedBatchViewMut};

use crate::{Device, DeviceBuffer, DeviceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BatchLayout {
    item: ItemShape,
    stride: isize,
    batch_count: usize,
    footprint: usize,
    len: usize,
}

impl BatchLayout {
    fn new(item: ItemShape, stride: isize, batch_count: usize) -> Result<Self> {
        let footprint = item.footprint()?;
        let len = element_count(&item, stride, batch_count)?;
        Ok(Self {
            item,
            stride,
            batch_count,
            footprint,
            len,
        })
    }

    /// Storage of item `batch`; ends at or before `len`.
    fn range(&self, batch: usize) -> std::ops::Range<usize> {
        assert!(batch < self.batch_count, "batch index out of bounds");
        let start = batch_offset(batch, self.stride, self.batch_count);
        start..start + self.footprint
    }
}

/// Strided batch owned in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStridedBatch<T> {
    data: Vec<T>,
    layout: BatchLayout,
}

impl<T: Copy + Default> HostStridedBatch<T> {
    /// `batch_count` column-major `rows x cols` matrices with leading dimension `ld`.
    pub fn matrix(
        rows: usize,
        cols: usize,
        ld: usize,
        stride: isize,
        batch_count: usize,
    ) -> Result<Self> {
        Self::with_item(ItemShape::matrix(rows, cols, ld)?, stride, batch_count)
    }

    /// `batch_count` vectors of `len` elements with increment `inc`.
    pub fn vector(len: usize, inc: isize, stride: isize, batch_count: usize) -> Result<Self> {
        Self::with_item(ItemShape::vector(len, inc)?, stride, batch_count)
    }

    fn with_item(item: ItemShape, stride: isize, batch_count: usize) -> Result<Self> {
        let layout = BatchLayout::new(item, stride, batch_count)?;
        let len = layout.len;
        if len == 0 {
            return Err(DeviceError::EmptyAllocation);
        }
        Ok(Self {
            data: vec![T::default(); len],
            layout,
        })
    }
}

impl<T> HostStridedBatch<T> {
    #[inline]
    pub fn item(&self) -> ItemShape {
        self.layout.item
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.layout.stride
    }

    #[inline]
    pub fn batch_count(&self) -> usize {
        self.layout.batch_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Storage of item `batch` (`footprint` elements).
    ///
    /// # Panics
    /// Panics if `batch >= batch_count`.
    pub fn batch(&self, batch: usize) -> &[T] {
        &self.data[self.layout.range(batch)]
    }

    /// Mutable storage of item `batch`.
    ///
    /// # Panics
    /// Panics if `batch >= batch_count`.
    pub fn batch_mut(&mut self, batch: usize) -> &mut [T] {
        let range = self.layout.range(batch);
        &mut self.data[range]
    }

    pub fn view(&self) -> Result<StridedBatchView<'_, T>> {
        let l = self.layout;
        Ok(StridedBatchView::new(
            &self.data,
            l.item,
            l.stride,
            l.batch_count,
        )?)
    }

    pub fn view_mut(&mut self) -> Result<StridedBatchViewMut<'_, T>> {
        let l = self.layout;
        Ok(StridedBatchViewMut::new(
            &mut self.data,
            l.item,
            l.stride,
            l.batch_count,
        )?)
    }
}

/// Strided batch owned in device memory.
#[derive(Debug)]
pub struct DeviceStridedBatch<T> {
    buffer: DeviceBuffer<T>,
    layout: BatchLayout,
}

impl<T: Copy + Default> DeviceStridedBatch<T> {
    pub fn matrix(
        device: &Device,
        rows: usize,
        cols: usize,
        ld: usize,
        stride: isize,
        batch_count: usize,
    ) -> Result<Self> {
        Self::with_item(
            device,
            ItemShape::matrix(rows, cols, ld)?,
            stride,
            batch_count,
        )
    }

    pub fn vector(
        device: &Device,
        len: usize,
        inc: isize,
        stride: isize,
        batch_count: usize,
    ) -> Result<Self> {
        Self::with_item(device, ItemShape::vector(len, inc)?, stride, batch_count)
    }

    /// Device batch with the same layout as `host`, filled from it.
    pub fn from_host(device: &Device, host: &HostStridedBatch<T>) -> Result<Self> {
        let mut out = Self::with_item(device, host.item(), host.stride(), host.batch_count())?;
        out.transfer_from(host)?;
        Ok(out)
    }

    fn with_item(device: &Device, item: ItemShape, stride: isize, batch_count: usize) -> Result<Self> {
        let layout = BatchLayout::new(item, stride, batch_count)?;
        let buffer = device.alloc::<T>(layout.len)?;
        Ok(Self { buffer, layout })
    }

    /// Copy the whole host container to the device.
    ///
    /// # Errors
    /// [`DeviceError::LayoutMismatch`] unless both describe the same batch layout.
    pub fn transfer_from(&mut self, host: &HostStridedBatch<T>) -> Result<()> {
        if host.layout != self.layout {
            return Err(DeviceError::LayoutMismatch);
        }
        self.buffer.copy_from_host(host.as_slice())
    }

    /// Copy the whole device container back to the host.
    pub fn copy_to(&self, host: &mut HostStridedBatch<T>) -> Result<()> {
        if host.layout != self.layout {
            return Err(DeviceError::LayoutMismatch);
        }
        self.buffer.copy_to_host(host.as_mut_slice())
    }
}

impl<T> DeviceStridedBatch<T> {
    #[inline]
    pub fn item(&self) -> ItemShape {
        self.layout.item
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.layout.stride
    }

    #[inline]
    pub fn batch_count(&self) -> usize {
        self.layout.batch_count
    }

    #[inline]
    pub fn device(&self) -> &Device {
        self.buffer.device()
    }

    #[inline]
    pub fn buffer(&self) -> &DeviceBuffer<T> {
        &self.buffer
    }

    /// Device-side storage for kernels.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buffer.as_mut_slice()
    }

    pub fn batch(&self, batch: usize) -> &[T] {
        &self.buffer.as_slice()[self.layout.range(batch)]
    }

    pub fn batch_mut(&mut self, batch: usize) -> &mut [T] {
        let range = self.layout.range(batch);
        &mut self.buffer.as_mut_slice()[range]
    }

    pub fn view(&self) -> Result<StridedBatchView<'_, T>> {
        let l = self.layout;
        Ok(StridedBatchView::new(
            self.buffer.as_slice(),
            l.item,
            l.stride,
            l.batch_count,
        )?)
    }

    pub fn view_mut(&mut self) -> Result<StridedBatchViewMut<'_, T>> {
        let l = self.layout;
        Ok(StridedBatchViewMut::new(
            self.buffer.as_mut_slice(),
            l.item,
            l.stride,
            l.batch_count,
        )?)
    }
}
