//! Quantizer configuration.
//!
//! Values are layered with figment, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (4 bits, bias correction on, no clamp, whole vector)
//! 2. An optional TOML file
//! 3. `DRIVE_*` environment variables (e.g. `DRIVE_BITS=2`)
//!
//! ```toml
//! bits = 2
//! bias_correction = true
//! std_outlier_factor = 3.0
//! reduction = "row_wise"
//! row_len = 1024
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codebook::{self, CodebookCache, Device};
use crate::error::Error;
use crate::quantization::{DriveStage, Reduction};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DRIVE_";

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provider (file, env) could not be read or extracted.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A field holds an unacceptable value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Serialization to TOML failed.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Reduction mode as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// One scale for the whole input.
    #[default]
    Whole,
    /// One scale per row of `row_len` coordinates.
    RowWise,
}

/// DRIVE quantizer configuration. Immutable once a stage is built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Bits per coordinate (1..=8).
    pub bits: u8,
    /// Use the bias-corrected scale.
    pub bias_correction: bool,
    /// Clamp to `mean ± factor * std` before quantizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_outlier_factor: Option<f32>,
    /// Whole-vector or per-row reductions.
    pub reduction: ReductionMode,
    /// Row length, required for [`ReductionMode::RowWise`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_len: Option<usize>,
    /// Device the codebook tables are materialized for.
    pub device: Device,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            bits: 4,
            bias_correction: true,
            std_outlier_factor: None,
            reduction: ReductionMode::Whole,
            row_len: None,
            device: Device::Cpu,
        }
    }
}

impl DriveConfig {
    /// Default configuration with the given bit-width.
    #[must_use]
    pub fn new(bits: u8) -> Self {
        Self {
            bits,
            ..Self::default()
        }
    }

    /// Sets bias correction.
    #[must_use]
    pub fn with_bias_correction(mut self, enabled: bool) -> Self {
        self.bias_correction = enabled;
        self
    }

    /// Enables outlier clamping with `factor` standard deviations.
    #[must_use]
    pub fn with_std_outlier_factor(mut self, factor: f32) -> Self {
        self.std_outlier_factor = Some(factor);
        self
    }

    /// Switches to row-wise reductions over rows of `row_len`.
    #[must_use]
    pub fn with_row_len(mut self, row_len: usize) -> Self {
        self.reduction = ReductionMode::RowWise;
        self.row_len = Some(row_len);
        self
    }

    /// Sets the codebook device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Loads defaults, then `path` if given, then `DRIVE_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file_exact(path));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Parses a TOML document on top of the defaults (no environment).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml)))
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        tracing::debug!(
            bits = config.bits,
            bias_correction = config.bias_correction,
            reduction = ?config.reduction,
            "loaded drive configuration"
        );
        Ok(config)
    }

    /// Checks every field and field combination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !codebook::is_supported(self.bits) {
            return Err(ConfigError::InvalidValue {
                field: "bits",
                message: format!(
                    "unsupported bit-width {}, expected {}..={}",
                    self.bits,
                    codebook::MIN_BITS,
                    codebook::MAX_BITS
                ),
            });
        }

        if let Some(factor) = self.std_outlier_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "std_outlier_factor",
                    message: format!("must be finite and > 0, got {factor}"),
                });
            }
        }

        if self.reduction == ReductionMode::RowWise {
            match self.row_len {
                None | Some(0) => {
                    return Err(ConfigError::InvalidValue {
                        field: "row_len",
                        message: "row_wise reduction needs row_len >= 1".to_string(),
                    });
                }
                Some(1) if self.std_outlier_factor.is_some() => {
                    return Err(ConfigError::InvalidValue {
                        field: "row_len",
                        message: "outlier clamping needs row_len >= 2 (std of one value)"
                            .to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Resolves the reduction strategy.
    pub fn reduction(&self) -> Result<Reduction, ConfigError> {
        self.validate()?;
        Ok(match (self.reduction, self.row_len) {
            (ReductionMode::RowWise, Some(row_len)) => Reduction::RowWise { row_len },
            _ => Reduction::Whole,
        })
    }

    /// Validates and builds a quantization stage backed by `cache`.
    pub fn build_stage(&self, cache: &CodebookCache) -> crate::error::Result<DriveStage> {
        DriveStage::new(self, cache)
    }
}
