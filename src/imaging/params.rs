//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which validates
//! settings and picks a backend) and the [`backend`](super::backend)
//! implementations (which do the pixel work or build the external command).
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality (0-100, default 100). Clamped on construction.
//! - [`Gamma`]: Gamma adjustment (default 1.0, identity).
//! - [`Gravity`]: Named anchor point. Stored and reported, not used by the arithmetic.
//! - [`Mode`]: Which backend runs the operation.
//! - [`Offset`]: Crop offset, coerced to its absolute value.
//! - [`ScaleParams`] / [`CropParams`]: Everything one operation needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gamma adjustment applied after resampling.
///
/// Pixel values are mapped as `out = in^(1/gamma)` on the normalized `[0, 1]`
/// range, the same direction as ImageMagick's `-gamma`. Values above 1.0
/// brighten midtones. The value is stored exactly as given, including 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gamma(pub f64);

impl Gamma {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }

    /// 256-entry lookup table for 8-bit channels.
    pub fn lookup_table(self) -> [u8; 256] {
        let mut table = [0u8; 256];
        let exponent = 1.0 / self.0;
        for (i, slot) in table.iter_mut().enumerate() {
            let normalized = i as f64 / 255.0;
            *slot = (normalized.powf(exponent) * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        table
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compass anchor for crop placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    Northwest,
    North,
    Northeast,
    West,
    Center,
    East,
    Southwest,
    South,
    Southeast,
}

impl Gravity {
    pub fn as_str(self) -> &'static str {
        match self {
            Gravity::Northwest => "northwest",
            Gravity::North => "north",
            Gravity::Northeast => "northeast",
            Gravity::West => "west",
            Gravity::Center => "center",
            Gravity::East => "east",
            Gravity::Southwest => "southwest",
            Gravity::South => "south",
            Gravity::Southeast => "southeast",
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend performs scale and crop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Mode {
    /// In-process decode/resample/encode with the `image` crate.
    #[serde(rename = "gd", alias = "library")]
    #[value(name = "gd", alias = "library")]
    Library,
    /// External ImageMagick `convert` process.
    #[default]
    #[serde(rename = "imagemagick", alias = "convert")]
    #[value(name = "imagemagick", alias = "convert")]
    Convert,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Library => f.write_str("gd"),
            Mode::Convert => f.write_str("imagemagick"),
        }
    }
}

/// Non-negative crop offset.
///
/// Negative input is folded to its absolute value: `-20` and `20` address the
/// same pixel column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset(u32);

impl Offset {
    pub fn coerce(value: i64) -> Self {
        Self(value.unsigned_abs().min(u32::MAX as u64) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Parameters for a scale operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Bounding target; see [`proportional_fit`](super::proportional_fit).
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub gamma: Gamma,
}

/// Parameters for a crop operation (proportional resample, then extract).
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Intermediate resample target.
    pub scale_width: u32,
    pub scale_height: u32,
    /// Final output dimensions.
    pub crop_width: u32,
    pub crop_height: u32,
    pub x: Offset,
    pub y: Offset,
    pub quality: Quality,
    pub gamma: Gamma,
}
