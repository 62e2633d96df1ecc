//! Image processing: proportional scaling and cropping over two backends.
//!
//! | Operation | `gd` mode | `imagemagick` mode |
//! |---|---|---|
//! | **Scale** | `resize_exact` (Lanczos3) + gamma LUT + JPEG | `convert -resize WxH! -gamma G` |
//! | **Crop** | scale, then copy region onto a black canvas | `convert -resize … -crop … -extent …` |
//! | **Show** | content-sniffed decode + re-encode | same (always in-process) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Value types describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`LibraryBackend`] / [`ConvertBackend`]
//! - **Operations**: [`Settings`] and [`ImageProcessor`], which validate and dispatch
//! - **Preview**: media-type detection and re-encoding for `show`

pub mod backend;
mod calculations;
pub mod convert_backend;
pub mod library_backend;
pub mod operations;
mod params;
pub mod preview;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::proportional_fit;
pub use convert_backend::{ConvertBackend, DEFAULT_CONVERT_PATH};
pub use library_backend::LibraryBackend;
pub use operations::{ImageProcessor, ProcessError, Settings, SettingsBuilder};
pub use params::{CropParams, Gamma, Gravity, Mode, Offset, Quality, ScaleParams};
pub use preview::Preview;
