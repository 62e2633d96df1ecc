//! In-process image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Detect media type | `image::ImageReader::with_guessed_format` (magic bytes) |
//! | Decode (PNG, JPEG, GIF) | `image` crate decoders |
//! | Resample | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `image::imageops::replace` onto a black canvas |
//! | Gamma | 8-bit lookup table from [`Gamma::lookup_table`] |
//! | Encode | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//!
//! Output is always JPEG, whatever the destination extension says.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::proportional_fit;
use super::params::{CropParams, Gamma, Quality, ScaleParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::debug;

/// Formats this backend will decode, with the MIME type each maps to.
const DECODABLE: &[(ImageFormat, &str)] = &[
    (ImageFormat::Png, "image/png"),
    (ImageFormat::Jpeg, "image/jpeg"),
    (ImageFormat::Gif, "image/gif"),
];

/// Reader whose format comes from magic bytes only, never the extension.
fn content_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    let reader = ImageReader::new(BufReader::new(File::open(path)?));
    Ok(reader.with_guessed_format()?)
}

/// Detect the media type from file content.
///
/// Returns `Ok(None)` when the content is not one of PNG, JPEG or GIF.
/// Errors only when the file itself cannot be opened or read.
pub fn detect_format(path: &Path) -> Result<Option<(ImageFormat, &'static str)>, BackendError> {
    let reader = content_reader(path)?;
    Ok(reader
        .format()
        .and_then(|fmt| DECODABLE.iter().find(|(known, _)| *known == fmt).copied()))
}

/// Read pixel dimensions from the file header without a full decode.
pub fn identify(path: &Path) -> Result<Dimensions, BackendError> {
    let (width, height) = content_reader(path)?
        .into_dimensions()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(Dimensions { width, height })
}

/// Load and decode a PNG, JPEG or GIF from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let Some((format, _)) = detect_format(path)? else {
        return Err(BackendError::UnsupportedFormat(path.to_path_buf()));
    };
    let mut reader = ImageReader::new(BufReader::new(File::open(path)?));
    reader.set_format(format);
    reader.decode().map_err(|e| BackendError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Encode RGB pixels as JPEG into any writer.
pub fn encode_jpeg<W: Write>(img: &RgbImage, writer: W, quality: Quality) -> image::ImageResult<()> {
    // The JPEG quantizer divides by quality; 0 is promoted to 1.
    let mut encoder = JpegEncoder::new_with_quality(writer, quality.value().max(1));
    encoder.encode_image(img)
}

fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    encode_jpeg(img, writer, quality).map_err(|e| BackendError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn apply_gamma(img: &mut RgbImage, gamma: Gamma) {
    if gamma.is_identity() {
        return;
    }
    let table = gamma.lookup_table();
    for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = table[*channel as usize];
        }
    }
}

/// Decode and resample to the proportional fit of `target`.
fn load_fitted(source: &Path, target: (u32, u32)) -> Result<RgbImage, BackendError> {
    let img = load_image(source)?;
    let (width, height) = proportional_fit((img.width(), img.height()), target);
    debug!(
        source = %source.display(),
        from = ?(img.width(), img.height()),
        to = ?(width, height),
        "resampling"
    );
    Ok(img.resize_exact(width, height, FilterType::Lanczos3).to_rgb8())
}

/// In-process backend (mode `gd`).
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct LibraryBackend;

impl LibraryBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LibraryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for LibraryBackend {
    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError> {
        let mut scaled = load_fitted(&params.source, (params.width, params.height))?;
        apply_gamma(&mut scaled, params.gamma);
        save_jpeg(&scaled, &params.output, params.quality)
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        let scaled = load_fitted(&params.source, (params.scale_width, params.scale_height))?;

        // Anything outside the intermediate stays black.
        let mut canvas = RgbImage::new(params.crop_width, params.crop_height);
        image::imageops::replace(
            &mut canvas,
            &scaled,
            -i64::from(params.x.value()),
            -i64::from(params.y.value()),
        );

        apply_gamma(&mut canvas, params.gamma);
        save_jpeg(&canvas, &params.output, params.quality)
    }
}
