//! # DRIVE Core
//!
//! Bias-corrected k-bit vector quantization for distributed mean estimation.
//!
//! DRIVE compresses a (randomly rotated) real vector into `bits` bits per
//! coordinate plus one `f32` scale. Coordinates are normalized to unit RMS
//! and bucketized against a codebook built from expected half-normal order
//! statistics; the scale is chosen so that the reconstruction keeps the
//! magnitude information lost by normalization.
//!
//! ## Features
//!
//! - **1 to 8 bits** per coordinate, with a dedicated sign code for 1 bit
//! - **Bias correction**: scale selection that compensates for the
//!   systematic magnitude loss of discretization
//! - **Outlier clamping** to `mean ± f * std` before quantizing
//! - **Row-wise mode**: independent scales per row of a batch, rows
//!   processed in parallel
//! - **Compact wire form**: `bits` bits per coordinate plus a small header
//!
//! ## Quick Start
//!
//! ```rust
//! use drive_core::{CodebookCache, DriveConfig, DriveStage};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = CodebookCache::new();
//!     let stage = DriveStage::new(&DriveConfig::new(2).with_std_outlier_factor(3.0), &cache)?;
//!
//!     let gradient = vec![0.12, -0.53, 0.08, 1.9, -0.77, 0.31, -0.02, 0.44];
//!     let code = stage.encode(&gradient)?;
//!     let bytes = code.to_bytes();
//!
//!     let received = drive_core::DriveCode::from_bytes(&bytes)?;
//!     let estimate = stage.decode(&received)?;
//!     assert_eq!(estimate.len(), gradient.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_lossless,
        clippy::manual_assert
    )
)]

pub mod codebook;
pub mod config;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod pipeline;
pub mod quantization;

pub use codebook::{Codebook, CodebookCache, CodebookTables, Device};
pub use config::{ConfigError, DriveConfig, ReductionMode};
pub use error::{Error, Result};
pub use pipeline::{DrivePipeline, IdentityRotation, Rotation, Transform};
pub use quantization::{Code, DriveCode, DriveStage, OutlierClamp, Reduction};
