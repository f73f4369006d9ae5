//! Encoded DRIVE representation and its compact wire form.
//!
//! A [`DriveCode`] holds one code per coordinate plus one scale per row.
//! The wire form packs each code into exactly `bits` bits:
//!
//! | Field | Size |
//! |-------|------|
//! | bits | 1 byte |
//! | rows | 4 bytes (LE u32) |
//! | row_len | 4 bytes (LE u32) |
//! | scales | 4 bytes (LE f32) per row |
//! | payload | `ceil(rows * row_len * bits / 8)` bytes, LSB-first |

use std::io;

use serde::{Deserialize, Serialize};

use crate::codebook;
use crate::error::{Error, Result};

const HEADER_LEN: usize = 9;

/// Per-coordinate codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// 1-bit code: `true` for non-negative coordinates.
    Signs(Vec<bool>),
    /// k-bit code: centroid indices.
    Indices(Vec<u8>),
}

impl Code {
    /// Number of coded coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Signs(s) => s.len(),
            Self::Indices(i) => i.len(),
        }
    }

    /// Returns `true` if no coordinate is coded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, i: usize) -> u8 {
        match self {
            Self::Signs(s) => u8::from(s[i]),
            Self::Indices(idx) => idx[i],
        }
    }
}

/// Output of a DRIVE encode: codes plus the per-row reconstruction scales.
///
/// Deserialization goes through [`DriveCode::new`], so every instance is
/// consistent and fits the wire header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DriveCodeFields")]
pub struct DriveCode {
    bits: u8,
    row_len: usize,
    scales: Vec<f32>,
    code: Code,
}

/// Unchecked serde image of [`DriveCode`].
#[derive(Deserialize)]
struct DriveCodeFields {
    bits: u8,
    row_len: usize,
    scales: Vec<f32>,
    code: Code,
}

impl TryFrom<DriveCodeFields> for DriveCode {
    type Error = Error;

    fn try_from(fields: DriveCodeFields) -> Result<Self> {
        Self::new(fields.bits, fields.row_len, fields.scales, fields.code)
    }
}

impl DriveCode {
    /// Assembles a code, checking that its parts agree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unsupported bit-width and
    /// [`Error::InvalidCode`] if the code kind, scale count or code length
    /// do not match.
    pub fn new(bits: u8, row_len: usize, scales: Vec<f32>, code: Code) -> Result<Self> {
        let value = Self {
            bits,
            row_len,
            scales,
            code,
        };
        value.validate()?;
        Ok(value)
    }

    /// Checks internal consistency, including that the row count and row
    /// length fit the u32 fields of the wire header.
    pub fn validate(&self) -> Result<()> {
        if !codebook::is_supported(self.bits) {
            return Err(Error::unsupported_bits(self.bits));
        }
        let max_dim = u32::MAX as usize;
        if self.row_len > max_dim || self.scales.len() > max_dim {
            return Err(Error::InvalidCode(format!(
                "{} rows of length {} exceed the u32 wire header",
                self.scales.len(),
                self.row_len
            )));
        }
        match (&self.code, self.bits) {
            (Code::Signs(_), 1) => {}
            (Code::Indices(indices), bits) if bits > 1 => {
                let limit = codebook::num_centroids(bits);
                if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= limit) {
                    return Err(Error::InvalidCode(format!(
                        "index {bad} out of range for {bits}-bit codebook"
                    )));
                }
            }
            _ => {
                return Err(Error::InvalidCode(format!(
                    "code kind does not match bit-width {}",
                    self.bits
                )))
            }
        }

        let expected = self
            .scales
            .len()
            .checked_mul(self.row_len)
            .ok_or_else(|| Error::InvalidCode("rows * row_len overflows".to_string()))?;
        if self.row_len == 0 || self.scales.is_empty() || expected != self.code.len() {
            return Err(Error::InvalidCode(format!(
                "{} codes do not fill {} rows of length {}",
                self.code.len(),
                self.scales.len(),
                self.row_len
            )));
        }
        Ok(())
    }

    /// Bit-width of the code.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of rows (1 for a single vector).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.scales.len()
    }

    /// Coordinates per row.
    #[must_use]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Total number of coded coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns `true` if nothing is coded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Reconstruction scale of each row.
    #[must_use]
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Per-coordinate codes.
    #[must_use]
    pub fn code(&self) -> &Code {
        &self.code
    }

    /// Centroid indices, if this is a k-bit code.
    #[must_use]
    pub fn indices(&self) -> Option<&[u8]> {
        match &self.code {
            Code::Indices(i) => Some(i),
            Code::Signs(_) => None,
        }
    }

    /// Sign bits, if this is a 1-bit code.
    #[must_use]
    pub fn signs(&self) -> Option<&[bool]> {
        match &self.code {
            Code::Signs(s) => Some(s),
            Code::Indices(_) => None,
        }
    }

    /// Size of the packed code payload in bytes.
    #[must_use]
    pub fn packed_len(&self) -> usize {
        (self.len() * usize::from(self.bits)).div_ceil(8)
    }

    /// Size of the wire form in bytes.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        HEADER_LEN + 4 * self.rows() + self.packed_len()
    }

    /// Serializes to the compact wire form.
    // SAFETY: every DriveCode passes validate() on construction, which
    // bounds both dimensions by u32::MAX.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let rows = self.rows() as u32;
        let row_len = self.row_len as u32;

        let mut bytes = Vec::with_capacity(self.memory_size());
        bytes.push(self.bits);
        bytes.extend_from_slice(&rows.to_le_bytes());
        bytes.extend_from_slice(&row_len.to_le_bytes());
        for scale in &self.scales {
            bytes.extend_from_slice(&scale.to_le_bytes());
        }

        let mut payload = vec![0u8; self.packed_len()];
        let width = usize::from(self.bits);
        for i in 0..self.len() {
            let value = self.code.value(i);
            for bit in 0..width {
                if (value >> bit) & 1 == 1 {
                    let pos = i * width + bit;
                    payload[pos / 8] |= 1 << (pos % 8);
                }
            }
        }
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Deserializes from the compact wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated or describe an invalid code.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Not enough bytes for DriveCode header",
            ));
        }

        let bits = bytes[0];
        if !codebook::is_supported(bits) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported bit-width in DriveCode header: {bits}"),
            ));
        }
        let rows = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
        let row_len = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
        let width = usize::from(bits);

        let count = rows.checked_mul(row_len).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "DriveCode dimensions overflow")
        })?;
        let payload_len = count
            .checked_mul(width)
            .map(|b| b.div_ceil(8))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "DriveCode dimensions overflow")
            })?;
        let expected_len = HEADER_LEN + 4 * rows + payload_len;
        if bytes.len() < expected_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Not enough bytes for DriveCode data: expected {}, got {}",
                    expected_len,
                    bytes.len()
                ),
            ));
        }

        let scales = bytes[HEADER_LEN..HEADER_LEN + 4 * rows]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let payload = &bytes[HEADER_LEN + 4 * rows..expected_len];
        let values = (0..count).map(|i| {
            (0..width).fold(0u8, |acc, bit| {
                let pos = i * width + bit;
                acc | (((payload[pos / 8] >> (pos % 8)) & 1) << bit)
            })
        });
        let code = if bits == 1 {
            Code::Signs(values.map(|v| v == 1).collect())
        } else {
            Code::Indices(values.collect())
        };

        Self::new(bits, row_len, scales, code)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}
