//! DRIVE quantization: maps a rotated vector onto a half-normal codebook.
//!
//! ## Pipeline
//!
//! 1. Optional outlier clamp to `mean ± f * std` ([`OutlierClamp`])
//! 2. 1-bit: sign per coordinate plus one scale
//! 3. k-bit: normalize to unit RMS, bucketize ([`assign`]), then compute the
//!    reconstruction scale ([`scale`])
//!
//! Decoding multiplies each centroid (or ±1 for signs) by its row's scale.
//!
//! ## Wire size
//!
//! | Bits | Payload/coordinate | 4096-d vector |
//! |------|--------------------|---------------|
//! | f32 | 32 bits | 16 KB |
//! | 1 | 1 bit | 525 bytes |
//! | 4 | 4 bits | 2061 bytes |
//! | 8 | 8 bits | 4109 bytes |

pub mod assign;
mod clamp;
mod code;
pub mod scale;
mod stage;

pub use clamp::OutlierClamp;
pub use code::{Code, DriveCode};
pub use stage::{DriveStage, Reduction};
