//! ImageMagick backend: runs the external `convert` binary.
//!
//! Arguments are passed as a vector straight to [`Command`], never through a
//! shell, so paths containing spaces or quotes need no escaping.
//!
//! The source is read first, then every invocation applies the same fidelity
//! flags, which the in-process backend does not replicate:
//!
//! ```text
//! convert SOURCE -strip -density 72 +profile * -colorspace sRGB ... DEST
//! ```
//!
//! Geometry is computed with the same proportional fit as the library
//! backend and forced with `!`, so both modes agree on output size. When the
//! source header cannot be read here (a format the `image` crate was not
//! built with), the raw target box is passed and ImageMagick fits it itself.

use super::backend::{BackendError, ImageBackend};
use super::calculations::proportional_fit;
use super::library_backend::identify;
use super::params::{CropParams, ScaleParams};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Default location of the ImageMagick `convert` executable.
pub const DEFAULT_CONVERT_PATH: &str = "/opt/ImageMagick/bin/convert";

const FIDELITY_FLAGS: &[&str] = &[
    "-strip",
    "-density",
    "72",
    "+profile",
    "*",
    "-colorspace",
    "sRGB",
];

/// External-tool backend (mode `imagemagick`).
#[derive(Debug, Clone)]
pub struct ConvertBackend {
    convert_path: PathBuf,
}

impl ConvertBackend {
    pub fn new(convert_path: impl Into<PathBuf>) -> Self {
        Self {
            convert_path: convert_path.into(),
        }
    }

    pub fn convert_path(&self) -> &Path {
        &self.convert_path
    }

    /// Argument vector for a scale, excluding the program name.
    pub fn scale_args(&self, params: &ScaleParams) -> Vec<OsString> {
        let geometry = fit_geometry(&params.source, (params.width, params.height));

        let mut args = leading_args(&params.source);
        args.extend(
            [
                "-quality".to_string(),
                params.quality.to_string(),
                "-resize".to_string(),
                geometry,
                "-gamma".to_string(),
                params.gamma.to_string(),
            ]
            .map(OsString::from),
        );
        args.push(params.output.clone().into_os_string());
        args
    }

    /// Argument vector for a crop, excluding the program name.
    pub fn crop_args(&self, params: &CropParams) -> Vec<OsString> {
        let geometry = fit_geometry(&params.source, (params.scale_width, params.scale_height));
        let size = format!("{}x{}", params.crop_width, params.crop_height);
        let region = format!("{size}+{}+{}", params.x.value(), params.y.value());

        let mut args = leading_args(&params.source);
        args.extend(
            [
                "-quality".to_string(),
                params.quality.to_string(),
                "-gamma".to_string(),
                params.gamma.to_string(),
                "-resize".to_string(),
                geometry,
                "-crop".to_string(),
                region,
                "+repage".to_string(),
                "-background".to_string(),
                "black".to_string(),
                "-extent".to_string(),
                size,
            ]
            .map(OsString::from),
        );
        args.push(params.output.clone().into_os_string());
        args
    }

    /// Spawn `convert`, wait for it, and surface any failure.
    fn run(&self, args: &[OsString]) -> Result<(), BackendError> {
        info!(
            program = %self.convert_path.display(),
            args = ?args,
            "running image tool"
        );
        let output = Command::new(&self.convert_path)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => BackendError::ToolMissing {
                    path: self.convert_path.clone(),
                },
                _ => BackendError::Io(e),
            })?;

        if !output.status.success() {
            return Err(BackendError::ToolFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ConvertBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERT_PATH)
    }
}

/// `SOURCE` followed by the fidelity flags.
fn leading_args(source: &Path) -> Vec<OsString> {
    let mut args = vec![source.as_os_str().to_os_string()];
    args.extend(FIDELITY_FLAGS.iter().map(OsString::from));
    args
}

/// `WxH!` for the proportional fit, or the raw box when the header is unreadable.
fn fit_geometry(source: &Path, target: (u32, u32)) -> String {
    match identify(source) {
        Ok(dims) => {
            let (w, h) = proportional_fit((dims.width, dims.height), target);
            format!("{w}x{h}!")
        }
        Err(e) => {
            debug!(source = %source.display(), error = %e, "header unreadable, letting convert fit");
            format!("{}x{}", target.0, target.1)
        }
    }
}

impl ImageBackend for ConvertBackend {
    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError> {
        self.run(&self.scale_args(params))
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        self.run(&self.crop_args(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Gamma, Offset, Quality};
    use image::{Rgb, RgbImage};

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([90, 90, 90]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    fn scale_params(source: &Path) -> ScaleParams {
        ScaleParams {
            source: source.to_path_buf(),
            output: "/out/dest image.jpg".into(),
            width: 80,
            height: 160,
            quality: Quality::new(85),
            gamma: Gamma(1.2),
        }
    }

    fn crop_params(source: &Path, x: i64, y: i64) -> CropParams {
        CropParams {
            source: source.to_path_buf(),
            output: "/out/crop.jpg".into(),
            scale_width: 300,
            scale_height: 300,
            crop_width: 100,
            crop_height: 50,
            x: Offset::coerce(x),
            y: Offset::coerce(y),
            quality: Quality::default(),
            gamma: Gamma::default(),
        }
    }

    #[test]
    fn scale_args_use_proportional_geometry() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("portrait.png");
        write_png(&source, 100, 200);

        let backend = ConvertBackend::default();
        let args = strings(&backend.scale_args(&scale_params(&source)));

        assert_eq!(
            args,
            vec![
                source.to_str().unwrap(),
                "-strip",
                "-density",
                "72",
                "+profile",
                "*",
                "-colorspace",
                "sRGB",
                "-quality",
                "85",
                "-resize",
                "80x160!",
                "-gamma",
                "1.2",
                "/out/dest image.jpg",
            ]
        );
    }

    #[test]
    fn scale_args_fall_back_to_box_when_unreadable() {
        let backend = ConvertBackend::default();
        let args = strings(&backend.scale_args(&scale_params(Path::new("/nonexistent.tif"))));

        let idx = args.iter().position(|a| a == "-resize").unwrap();
        assert_eq!(args[idx + 1], "80x160");
    }

    #[test]
    fn paths_are_single_arguments() {
        let backend = ConvertBackend::default();
        let args = backend.scale_args(&scale_params(Path::new("/in/it's \"odd\".png")));

        assert_eq!(args[0], OsString::from("/in/it's \"odd\".png"));
        assert_eq!(args[args.len() - 1], OsString::from("/out/dest image.jpg"));
    }

    #[test]
    fn crop_args_coerce_negative_offsets() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("landscape.png");
        write_png(&source, 600, 300);

        let backend = ConvertBackend::default();
        let args = strings(&backend.crop_args(&crop_params(&source, -15, -7)));

        let idx = args.iter().position(|a| a == "-crop").unwrap();
        assert_eq!(args[idx + 1], "100x50+15+7");
        let idx = args.iter().position(|a| a == "-resize").unwrap();
        assert_eq!(args[idx + 1], "300x150!");
        let idx = args.iter().position(|a| a == "-extent").unwrap();
        assert_eq!(args[idx + 1], "100x50");
        assert!(args.contains(&"+repage".to_string()));
    }

    #[test]
    fn crop_args_keep_fidelity_flags() {
        let backend = ConvertBackend::default();
        let args = strings(&backend.crop_args(&crop_params(Path::new("/missing.png"), 0, 0)));

        assert_eq!(args[0], "/missing.png");
        assert_eq!(&args[1..8], FIDELITY_FLAGS);
        let idx = args.iter().position(|a| a == "-quality").unwrap();
        assert_eq!(args[idx + 1], "100");
        let idx = args.iter().position(|a| a == "-gamma").unwrap();
        assert_eq!(args[idx + 1], "1");
    }

    #[test]
    fn missing_binary_is_reported() {
        let backend = ConvertBackend::new("/nonexistent/bin/convert");
        let result = backend.scale(&scale_params(Path::new("/missing.png")));

        assert!(matches!(
            result,
            Err(BackendError::ToolMissing { path }) if path == Path::new("/nonexistent/bin/convert")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_reported() {
        let backend = ConvertBackend::new("false");
        let result = backend.scale(&scale_params(Path::new("/missing.png")));

        match result {
            Err(BackendError::ToolFailed { status, .. }) => assert!(!status.success()),
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    /// Runs only when ImageMagick is installed.
    #[test]
    fn real_convert_scales_when_available() {
        let available = Command::new("convert")
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !available {
            return;
        }

        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        let output = tmp.path().join("scaled.jpg");
        write_png(&source, 200, 100);

        ConvertBackend::new("convert")
            .scale(&ScaleParams {
                source,
                output: output.clone(),
                width: 160,
                height: 80,
                quality: Quality::new(90),
                gamma: Gamma::default(),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (160, 80));
    }
}
