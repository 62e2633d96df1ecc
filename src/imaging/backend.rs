//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: scale and crop. Two implementations exist:
//!
//! | Mode | Backend | Pixel work |
//! |---|---|---|
//! | `gd` | [`LibraryBackend`](super::library_backend::LibraryBackend) | in-process, `image` crate |
//! | `imagemagick` | [`ConvertBackend`](super::convert_backend::ConvertBackend) | external `convert` process |
//!
//! Both compute the same proportional fit before resampling, so switching
//! modes changes fidelity details (metadata stripping, colorspace) but not
//! output geometry.

use super::params::{CropParams, ScaleParams};
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported media type: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("Image tool not found at {}", path.display())]
    ToolMissing { path: PathBuf },
    #[error("Image tool exited with {status}: {stderr}")]
    ToolFailed { status: ExitStatus, stderr: String },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Selected once from [`Mode`](super::Mode) when an
/// [`ImageProcessor`](super::ImageProcessor) is built.
pub trait ImageBackend: Sync {
    /// Resample `source` to the proportional fit of the target box, apply
    /// gamma, and write `output`.
    fn scale(&self, params: &ScaleParams) -> Result<(), BackendError>;

    /// Resample to the proportional fit of the scale box, then extract a
    /// region of exactly `crop_width × crop_height`.
    fn crop(&self, params: &CropParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Gamma, Offset, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_with: Mutex<Option<BackendError>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Scale {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u8,
            gamma: f64,
        },
        Crop {
            source: String,
            output: String,
            scale: (u32, u32),
            crop: (u32, u32),
            offset: (u32, u32),
            quality: u8,
            gamma: f64,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(error: BackendError) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                fail_with: Mutex::new(Some(error)),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn result(&self) -> Result<(), BackendError> {
            match self.fail_with.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    impl ImageBackend for MockBackend {
        fn scale(&self, params: &ScaleParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Scale {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                gamma: params.gamma.value(),
            });
            self.result()
        }

        fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Crop {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                scale: (params.scale_width, params.scale_height),
                crop: (params.crop_width, params.crop_height),
                offset: (params.x.value(), params.y.value()),
                quality: params.quality.value(),
                gamma: params.gamma.value(),
            });
            self.result()
        }
    }

    #[test]
    fn mock_records_scale() {
        let backend = MockBackend::new();

        backend
            .scale(&ScaleParams {
                source: "/source.jpg".into(),
                output: "/output.jpg".into(),
                width: 800,
                height: 600,
                quality: Quality::new(90),
                gamma: Gamma::default(),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Scale {
                width: 800,
                height: 600,
                quality: 90,
                ..
            }
        ));
    }

    #[test]
    fn mock_records_crop_offsets() {
        let backend = MockBackend::new();

        backend
            .crop(&CropParams {
                source: "/source.jpg".into(),
                output: "/crop.jpg".into(),
                scale_width: 400,
                scale_height: 400,
                crop_width: 100,
                crop_height: 50,
                x: Offset::coerce(-10),
                y: Offset::coerce(5),
                quality: Quality::default(),
                gamma: Gamma(1.8),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Crop {
                crop: (100, 50),
                offset: (10, 5),
                ..
            }
        ));
    }

    #[test]
    fn mock_failure_is_returned_once() {
        let backend = MockBackend::failing(BackendError::UnsupportedFormat("/x.bmp".into()));
        let params = ScaleParams {
            source: "/x.bmp".into(),
            output: "/y.jpg".into(),
            width: 10,
            height: 10,
            quality: Quality::default(),
            gamma: Gamma::default(),
        };

        assert!(backend.scale(&params).is_err());
        assert!(backend.scale(&params).is_ok());
        assert_eq!(backend.get_operations().len(), 2);
    }
}
