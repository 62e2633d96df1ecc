//! High-level image operations.
//!
//! [`Settings`] is an immutable snapshot built with [`SettingsBuilder`].
//! [`ImageProcessor`] pairs it with the backend selected by
//! [`Mode`], validates each request, and turns it into backend parameters.

use super::backend::{BackendError, ImageBackend};
use super::convert_backend::{ConvertBackend, DEFAULT_CONVERT_PATH};
use super::library_backend::LibraryBackend;
use super::params::{CropParams, Gamma, Gravity, Mode, Offset, Quality, ScaleParams};
use super::preview::{self, Preview};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("No source image set")]
    MissingSource,
    #[error("No destination set")]
    MissingDestination,
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Immutable configuration for one or more image operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    quality: Quality,
    gamma: Gamma,
    gravity: Gravity,
    mode: Mode,
    convert_path: PathBuf,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn dest(&self) -> Option<&Path> {
        self.dest.as_deref()
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn gamma(&self) -> Gamma {
        self.gamma
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn convert_path(&self) -> &Path {
        &self.convert_path
    }

    /// Start a builder seeded with these values.
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            source: self.source.clone(),
            dest: self.dest.clone(),
            quality: Some(self.quality),
            gamma: Some(self.gamma),
            gravity: Some(self.gravity),
            mode: Some(self.mode),
            convert_path: Some(self.convert_path.clone()),
        }
    }

    fn paths(&self) -> Result<(&Path, &Path)> {
        let source = self.source().ok_or(ProcessError::MissingSource)?;
        let dest = self.dest().ok_or(ProcessError::MissingDestination)?;
        Ok((source, dest))
    }
}

impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::default().build()
    }
}

/// Builder for [`Settings`].
///
/// Every setter stores its value as given. Defaults fill in only what was
/// never set: quality 100, gamma 1.0, gravity `northwest`, mode
/// `imagemagick`.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    quality: Option<Quality>,
    gamma: Option<Gamma>,
    gravity: Option<Gravity>,
    mode: Option<Mode>,
    convert_path: Option<PathBuf>,
}

impl SettingsBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn dest(mut self, path: impl Into<PathBuf>) -> Self {
        self.dest = Some(path.into());
        self
    }

    pub fn quality(mut self, value: u32) -> Self {
        self.quality = Some(Quality::new(value));
        self
    }

    pub fn gamma(mut self, value: f64) -> Self {
        self.gamma = Some(Gamma(value));
        self
    }

    pub fn gravity(mut self, value: Gravity) -> Self {
        self.gravity = Some(value);
        self
    }

    pub fn mode(mut self, value: Mode) -> Self {
        self.mode = Some(value);
        self
    }

    pub fn convert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.convert_path = Some(path.into());
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            source: self.source,
            dest: self.dest,
            quality: self.quality.unwrap_or_default(),
            gamma: self.gamma.unwrap_or_default(),
            gravity: self.gravity.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            convert_path: self
                .convert_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONVERT_PATH)),
        }
    }
}

/// Runs scale, crop and show against one [`Settings`] snapshot.
pub struct ImageProcessor {
    settings: Settings,
    backend: Box<dyn ImageBackend>,
}

impl ImageProcessor {
    /// Select the backend for `settings.mode()`.
    pub fn new(settings: Settings) -> Self {
        let backend: Box<dyn ImageBackend> = match settings.mode {
            Mode::Library => Box::new(LibraryBackend::new()),
            Mode::Convert => Box::new(ConvertBackend::new(settings.convert_path.clone())),
        };
        Self { settings, backend }
    }

    /// Use an explicit backend regardless of mode.
    pub fn with_backend(settings: Settings, backend: Box<dyn ImageBackend>) -> Self {
        Self { settings, backend }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Plan a scale without executing it.
    pub fn plan_scale(&self, width: u32, height: u32) -> Result<ScaleParams> {
        let (source, dest) = self.settings.paths()?;
        check_positive("scale", width, height)?;
        Ok(ScaleParams {
            source: source.to_path_buf(),
            output: dest.to_path_buf(),
            width,
            height,
            quality: self.settings.quality,
            gamma: self.settings.gamma,
        })
    }

    /// Plan a crop without executing it.
    ///
    /// Negative offsets are folded to their absolute value.
    pub fn plan_crop(
        &self,
        source_size: (u32, u32),
        crop_size: (u32, u32),
        x: i64,
        y: i64,
    ) -> Result<CropParams> {
        let (source, dest) = self.settings.paths()?;
        check_positive("scale", source_size.0, source_size.1)?;
        check_positive("crop", crop_size.0, crop_size.1)?;
        if x < 0 || y < 0 {
            warn!(x, y, "negative crop offset coerced to absolute value");
        }
        Ok(CropParams {
            source: source.to_path_buf(),
            output: dest.to_path_buf(),
            scale_width: source_size.0,
            scale_height: source_size.1,
            crop_width: crop_size.0,
            crop_height: crop_size.1,
            x: Offset::coerce(x),
            y: Offset::coerce(y),
            quality: self.settings.quality,
            gamma: self.settings.gamma,
        })
    }

    /// Write a proportionally scaled copy of the source to the destination.
    pub fn scale(&self, width: u32, height: u32) -> Result<()> {
        let params = self.plan_scale(width, height)?;
        info!(
            mode = %self.settings.mode,
            source = %params.source.display(),
            dest = %params.output.display(),
            width,
            height,
            "scale"
        );
        self.backend.scale(&params)?;
        Ok(())
    }

    /// Scale to the proportional fit of `source_w × source_h`, then write the
    /// `crop_w × crop_h` region at `(x, y)` to the destination.
    pub fn crop(
        &self,
        source_w: u32,
        source_h: u32,
        crop_w: u32,
        crop_h: u32,
        x: i64,
        y: i64,
    ) -> Result<()> {
        let params = self.plan_crop((source_w, source_h), (crop_w, crop_h), x, y)?;
        info!(
            mode = %self.settings.mode,
            gravity = %self.settings.gravity,
            source = %params.source.display(),
            dest = %params.output.display(),
            crop = ?(crop_w, crop_h),
            offset = ?(params.x.value(), params.y.value()),
            "crop"
        );
        self.backend.crop(&params)?;
        Ok(())
    }

    /// Re-encode `file` (or the destination when `None` or empty) for display.
    ///
    /// Returns `Ok(None)` when the media type is not PNG, JPEG or GIF.
    pub fn show(&self, file: Option<&Path>) -> Result<Option<Preview>> {
        let path = match file {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => self.settings.dest().ok_or(ProcessError::MissingDestination)?,
        };
        let preview = preview::render(path, self.settings.quality)?;
        if preview.is_none() {
            warn!(file = %path.display(), "unsupported media type, nothing to show");
        }
        Ok(preview)
    }
}

fn check_positive(what: &str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ProcessError::InvalidDimensions(format!(
            "{what} size {width}x{height} must be non-zero"
        )));
    }
    Ok(())
}
