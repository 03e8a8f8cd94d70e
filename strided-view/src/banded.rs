//! Compact band storage of a Hermitian matrix.
//!
//! Only one triangle of the band is stored, column-major in a `lda x n`
//! array with `lda > k`:
//!
//! - [`Fill::Upper`]: entry `(r, c)` with `0 <= c - r <= k` lives at row
//!   `k + r - c` of column `c`, so the diagonal is row `k`.
//! - [`Fill::Lower`]: entry `(r, c)` with `0 <= r - c <= k` lives at row
//!   `r - c` of column `c`, so the diagonal is row 0.
//!
//! The other triangle is implied by Hermitian symmetry.

use std::ops::Range;

use strided_traits::{Conj, ElementOp, HermitianScalar, Identity, RealPart};

use crate::{ItemShape, Result, StridedError};

/// Which triangle of a Hermitian matrix is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fill {
    Upper,
    Lower,
    /// Both triangles. Not a valid band storage mode.
    Full,
}

impl Fill {
    /// Parse the BLAS `uplo` character (`'U'`, `'L'`, `'F'`, case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Fill::Upper),
            'L' => Some(Fill::Lower),
            'F' => Some(Fill::Full),
            _ => None,
        }
    }

    /// Returns true for [`Fill::Upper`] and [`Fill::Lower`].
    #[inline]
    pub fn is_triangle(self) -> bool {
        !matches!(self, Fill::Full)
    }
}

/// Geometry of one banded Hermitian matrix in compact storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandedLayout {
    n: usize,
    k: usize,
    lda: usize,
    fill: Fill,
}

impl BandedLayout {
    /// Describe an `n x n` Hermitian band of half-bandwidth `k`.
    ///
    /// # Errors
    /// Returns an error if `fill` is [`Fill::Full`], `lda <= k`, or the last
    /// stored element lies beyond `usize::MAX`.
    pub fn new(n: usize, k: usize, lda: usize, fill: Fill) -> Result<Self> {
        if !fill.is_triangle() {
            return Err(StridedError::InvalidFill(fill));
        }
        if lda <= k {
            return Err(StridedError::BandTooNarrow { lda, k });
        }
        let layout = Self { n, k, lda, fill };
        // every stored offset is below the span
        layout.item_shape().span()?;
        Ok(layout)
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn lda(&self) -> usize {
        self.lda
    }

    #[inline]
    pub fn fill(&self) -> Fill {
        self.fill
    }

    /// Shape of one band array as a batch item.
    #[inline]
    pub fn item_shape(&self) -> ItemShape {
        ItemShape::Matrix {
            rows: self.k + 1,
            cols: self.n,
            ld: self.lda,
        }
    }

    /// Returns true if `(row, col)` is held directly in storage.
    #[inline]
    pub fn stores(&self, row: usize, col: usize) -> bool {
        match self.fill {
            Fill::Upper => row <= col && col - row <= self.k,
            Fill::Lower => col <= row && row - col <= self.k,
            Fill::Full => false,
        }
    }

    /// Storage offset of `(row, col)`, or `None` if that entry lies in the
    /// implied triangle or outside the band.
    #[inline]
    pub fn stored_offset(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.n || col >= self.n || !self.stores(row, col) {
            return None;
        }
        Some(self.offset_unchecked(row, col))
    }

    #[inline]
    fn offset_unchecked(&self, row: usize, col: usize) -> usize {
        match self.fill {
            Fill::Upper => (self.k + row - col) + col * self.lda,
            _ => (row - col) + col * self.lda,
        }
    }

    /// Columns of row `row` that fall inside the band, in ascending order.
    #[inline]
    pub fn band_columns(&self, row: usize) -> Range<usize> {
        let lo = row.saturating_sub(self.k);
        let hi = (row + self.k + 1).min(self.n);
        lo..hi
    }

    /// Value of the full Hermitian matrix at `(row, col)`.
    ///
    /// The diagonal is read as its real part, entries of the unstored
    /// triangle as the conjugate of their mirror, and entries outside the
    /// band as zero.
    #[inline]
    pub fn read<T: HermitianScalar>(&self, ab: &[T], row: usize, col: usize) -> T {
        debug_assert!(row < self.n && col < self.n, "index out of range");
        let (r, c, mirrored) = if self.stores(row, col) {
            (row, col, false)
        } else if self.stores(col, row) {
            (col, row, true)
        } else {
            return T::zero();
        };
        let v = ab[self.offset_unchecked(r, c)];
        if r == c {
            <RealPart as ElementOp<T>>::apply(v)
        } else if mirrored {
            <Conj as ElementOp<T>>::apply(v)
        } else {
            <Identity as ElementOp<T>>::apply(v)
        }
    }
}
