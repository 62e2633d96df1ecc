//! # processimage
//!
//! Scale and crop images either in-process or by handing the work to an
//! external ImageMagick `convert` binary.
//!
//! ```no_run
//! use processimage::imaging::{ImageProcessor, Mode, Settings};
//!
//! # fn main() -> Result<(), processimage::imaging::ProcessError> {
//! let settings = Settings::builder()
//!     .source("photo.jpg")
//!     .dest("photo-small.jpg")
//!     .mode(Mode::Library)
//!     .quality(85)
//!     .build();
//!
//! let processor = ImageProcessor::new(settings);
//! processor.scale(800, 600)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Proportional-fit math, the two backends, settings, and the processor |
//! | [`config`] | `processimage.toml` loading, merging, and validation |
//!
//! # Design Decisions
//!
//! ## One Fit Rule, Two Backends
//!
//! Both backends resample to the same [`imaging::proportional_fit`] result.
//! The orientation of the source picks the binding dimension: portraits pin
//! height, landscapes (and squares) pin width. The ImageMagick backend
//! receives that size as a forced `WxH!` resize geometry instead of letting
//! `convert` apply its own fit, so switching modes never changes output
//! dimensions.
//!
//! ## Backend-Specific Fidelity
//!
//! The ImageMagick path strips metadata, forces sRGB, and writes 72 dpi. The
//! in-process path does none of that and always writes JPEG. These are kept
//! as properties of each backend rather than unified.
//!
//! ## Immutable Settings
//!
//! [`imaging::Settings`] is built once and never mutated. Defaults fill only
//! unset values, so an explicit `gamma = 0.0` stays `0.0`.
//!
//! ## No Shell
//!
//! `convert` is spawned with an argument vector. Its exit status and stderr
//! are checked; a missing binary or a non-zero exit is an error.

pub mod config;
pub mod imaging;
