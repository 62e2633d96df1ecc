//! Re-encode an image for display as an HTTP-style response.
//!
//! The media type is detected from file content. PNG, JPEG and GIF are
//! decoded and re-encoded in their own format; anything else yields no
//! preview at all.

use super::backend::BackendError;
use super::library_backend::{detect_format, encode_jpeg, load_image};
use super::params::Quality;
use image::codecs::gif::GifEncoder;
use image::codecs::png::PngEncoder;
use image::{Frame, ImageFormat};
use std::io::Write;
use std::path::Path;

/// An encoded image together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Preview {
    /// Write a CGI-style response: `Content-Type` header, blank line, body.
    pub fn write_response<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "Content-Type: {}\r\n\r\n", self.content_type)?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

/// Build a preview of `path`.
///
/// Returns `Ok(None)` for unsupported or undetectable media types.
pub fn render(path: &Path, quality: Quality) -> Result<Option<Preview>, BackendError> {
    let Some((format, content_type)) = detect_format(path)? else {
        return Ok(None);
    };
    let img = load_image(path)?;

    let mut body = Vec::new();
    let encoded = match format {
        ImageFormat::Jpeg => encode_jpeg(&img.to_rgb8(), &mut body, quality),
        ImageFormat::Png => img.write_with_encoder(PngEncoder::new(&mut body)),
        ImageFormat::Gif => GifEncoder::new(&mut body).encode_frame(Frame::new(img.to_rgba8())),
        _ => return Ok(None),
    };
    encoded.map_err(|e| BackendError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(Some(Preview { content_type, body }))
}
