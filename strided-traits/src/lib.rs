//! Shared traits for the strided batch crates.
//!
//! This crate provides the scalar bounds and element operations used by
//! `strided-view` (band reads) and `strided-hbmv` (kernels), so that other
//! crates can implement them for their own types without orphan rule
//! violations.

pub mod element_op;
pub mod scalar;

pub use element_op::{Conj, ElementOp, ElementOpApply, Identity, RealPart};
pub use scalar::{HermitianScalar, ScalarBase};
