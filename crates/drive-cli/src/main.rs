#![allow(clippy::doc_markdown)]
//! `drive` - command-line front end for DRIVE vector quantization.
//!
//! Reads vectors as JSON, writes codes as packed bytes or JSON, and prints
//! reconstructions as JSON on stdout. Logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_core::{Codebook, CodebookCache, DriveCode, DriveConfig, ReductionMode};

/// DRIVE - bias-corrected k-bit vector quantization
#[derive(Parser, Debug)]
#[command(name = "drive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the centroids and boundaries of a codebook
    Codebook {
        /// Bits per coordinate (1..=8)
        #[arg(short, long)]
        bits: u8,
    },

    /// Encode a JSON vector (or array of rows) into a DRIVE code
    Encode {
        /// JSON file holding `[x, ...]` or `[[x, ...], ...]`
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long, env = "DRIVE_CONFIG")]
        config: Option<PathBuf>,

        /// Override the configured bit-width
        #[arg(short, long)]
        bits: Option<u8>,

        /// Write the packed code to this file
        #[arg(short, long, conflicts_with = "json", required_unless_present = "json")]
        out: Option<PathBuf>,

        /// Print the code as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Decode a DRIVE code and print the reconstruction as JSON
    Decode {
        /// Packed code file (or JSON with --json-input)
        #[arg(short, long)]
        input: PathBuf,

        /// Input is a JSON code rather than packed bytes
        #[arg(long)]
        json_input: bool,

        /// TOML configuration file
        #[arg(short, long, env = "DRIVE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Encode and decode a seeded Gaussian vector and report the error
    Roundtrip {
        /// Bits per coordinate (1..=8)
        #[arg(short, long, default_value = "4")]
        bits: u8,

        /// Vector length
        #[arg(short, long, default_value = "4096")]
        dim: usize,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Disable bias correction
        #[arg(long)]
        no_bias_correction: bool,
    },
}

/// Vector file contents: one vector, or equal-length rows.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum VectorInput {
    Flat(Vec<f32>),
    Rows(Vec<Vec<f32>>),
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Codebook { bits } => codebook(bits),
        Command::Encode {
            input,
            config,
            bits,
            out,
            json,
        } => encode(&input, config.as_deref(), bits, out.as_deref(), json),
        Command::Decode {
            input,
            json_input,
            config,
        } => decode(&input, json_input, config.as_deref()),
        Command::Roundtrip {
            bits,
            dim,
            seed,
            no_bias_correction,
        } => roundtrip(bits, dim, seed, !no_bias_correction),
    }
}

fn codebook(bits: u8) -> Result<()> {
    let codebook = Codebook::generate(bits)?;
    let doc = json!({
        "bits": codebook.bits(),
        "centroids": codebook.centroids(),
        "boundaries": codebook.boundaries(),
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn encode(
    input: &Path,
    config: Option<&Path>,
    bits: Option<u8>,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut config = DriveConfig::load(config).context("Failed to load configuration")?;
    if let Some(bits) = bits {
        config.bits = bits;
    }

    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let vector: VectorInput = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON vector", input.display()))?;

    let values = match vector {
        VectorInput::Flat(values) => values,
        VectorInput::Rows(rows) => {
            let Some(row_len) = rows.first().map(Vec::len) else {
                bail!("{} holds no rows", input.display());
            };
            if let Some(r) = rows.iter().position(|row| row.len() != row_len) {
                bail!(
                    "row {r} has {} values, expected {row_len}",
                    rows[r].len()
                );
            }
            config = config.with_row_len(row_len);
            rows.concat()
        }
    };

    let stage = config.build_stage(&CodebookCache::new())?;
    let code = stage.encode(&values)?;
    tracing::info!(
        bits = code.bits(),
        rows = code.rows(),
        len = code.len(),
        bytes = code.memory_size(),
        "encoded vector"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&code)?);
    } else if let Some(out) = out {
        fs::write(out, code.to_bytes())
            .with_context(|| format!("Failed to write {}", out.display()))?;
    }
    Ok(())
}

fn decode(input: &Path, json_input: bool, config: Option<&Path>) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let code = if json_input {
        serde_json::from_slice::<DriveCode>(&bytes)
            .with_context(|| format!("{} is not a JSON DRIVE code", input.display()))?
    } else {
        DriveCode::from_bytes(&bytes)
            .with_context(|| format!("{} is not a DRIVE code", input.display()))?
    };

    // Decoding only needs the codebook and the layout, both carried by the code.
    let mut config = DriveConfig::load(config).context("Failed to load configuration")?;
    config.bits = code.bits();
    config.std_outlier_factor = None;
    if code.rows() > 1 || config.reduction == ReductionMode::RowWise {
        config = config.with_row_len(code.row_len());
    }

    let stage = config.build_stage(&CodebookCache::new())?;
    let decoded = stage.decode(&code)?;
    tracing::info!(bits = code.bits(), rows = code.rows(), len = decoded.len(), "decoded vector");

    let doc = if code.rows() > 1 {
        serde_json::to_string_pretty(&decoded.chunks(code.row_len()).collect::<Vec<_>>())?
    } else {
        serde_json::to_string_pretty(&decoded)?
    };
    println!("{doc}");
    Ok(())
}

fn roundtrip(bits: u8, dim: usize, seed: u64, bias_correction: bool) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0_f32, 1.0)?;
    let x: Vec<f32> = (0..dim).map(|_| normal.sample(&mut rng)).collect();

    let stage = DriveConfig::new(bits)
        .with_bias_correction(bias_correction)
        .build_stage(&CodebookCache::new())?;
    let code = stage.encode(&x)?;
    let decoded = stage.decode(&code)?;

    let energy: f64 = x.iter().map(|&v| f64::from(v).powi(2)).sum();
    let decoded_energy: f64 = decoded.iter().map(|&v| f64::from(v).powi(2)).sum();
    let squared_error: f64 = x
        .iter()
        .zip(&decoded)
        .map(|(&a, &b)| (f64::from(a) - f64::from(b)).powi(2))
        .sum();

    let report = json!({
        "bits": bits,
        "dim": dim,
        "seed": seed,
        "bias_correction": bias_correction,
        "bytes": code.memory_size(),
        "energy_ratio": decoded_energy / energy,
        "relative_l2_error": (squared_error / energy).sqrt(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
