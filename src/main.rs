use clap::{ArgAction, Parser, Subcommand};
use processimage::config::{self, ProcessConfig};
use processimage::imaging::{Gravity, ImageProcessor, Mode, SettingsBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Input and output paths for commands that write an image.
#[derive(clap::Args, Clone)]
struct PathArgs {
    /// Source image
    #[arg(long)]
    source: PathBuf,

    /// Destination image
    #[arg(long)]
    dest: PathBuf,
}

#[derive(Parser)]
#[command(name = "processimage")]
#[command(about = "Scale and crop images with the in-process or ImageMagick backend")]
#[command(long_about = "\
Scale and crop images with the in-process or ImageMagick backend

Sizes are fitted to the source orientation: portrait sources pin the target
height, landscape and square sources pin the target width, and the other
side follows the aspect ratio.

Settings are read from ./processimage.toml (or --config) and can be
overridden with flags. Run 'processimage gen-config' for a documented file.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Overrides layered on top of the config file.
#[derive(clap::Args, Clone)]
struct SettingsArgs {
    /// Config file (default: ./processimage.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend for scale and crop
    #[arg(long, value_enum, global = true)]
    mode: Option<Mode>,

    /// Output quality, 0-100
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,

    /// Gamma adjustment (1.0 = unchanged)
    #[arg(long, global = true)]
    gamma: Option<f64>,

    /// Anchor name recorded with crop requests
    #[arg(long, value_enum, global = true)]
    gravity: Option<Gravity>,

    /// Path to the ImageMagick convert executable
    #[arg(long, global = true)]
    convert_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a proportionally scaled copy of the source
    Scale {
        #[command(flatten)]
        paths: PathArgs,
        /// Target width
        width: u32,
        /// Target height
        height: u32,
    },
    /// Scale, then cut a fixed-size region out of the result
    Crop {
        #[command(flatten)]
        paths: PathArgs,
        /// Intermediate scale width
        source_width: u32,
        /// Intermediate scale height
        source_height: u32,
        /// Output width
        crop_width: u32,
        /// Output height
        crop_height: u32,
        /// Left offset into the scaled image (negative values are made positive)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        x: i64,
        /// Top offset into the scaled image (negative values are made positive)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        y: i64,
    },
    /// Write an image to stdout as a Content-Type header plus body
    Show {
        /// Image to show (default: --dest)
        file: Option<PathBuf>,
        /// Destination used when no file is given
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Print a stock processimage.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Scale {
            paths,
            width,
            height,
        } => {
            let settings = settings_builder(&cli.settings)?
                .source(paths.source)
                .dest(paths.dest)
                .build();
            ImageProcessor::new(settings).scale(width, height)?;
        }
        Command::Crop {
            paths,
            source_width,
            source_height,
            crop_width,
            crop_height,
            x,
            y,
        } => {
            let settings = settings_builder(&cli.settings)?
                .source(paths.source)
                .dest(paths.dest)
                .build();
            ImageProcessor::new(settings).crop(
                source_width,
                source_height,
                crop_width,
                crop_height,
                x,
                y,
            )?;
        }
        Command::Show { file, dest } => {
            let mut builder = settings_builder(&cli.settings)?;
            if let Some(dest) = dest {
                builder = builder.dest(dest);
            }
            let processor = ImageProcessor::new(builder.build());
            let Some(preview) = processor.show(file.as_deref())? else {
                return Err("unsupported media type, nothing to show".into());
            };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            preview.write_response(&mut out)?;
            out.flush()?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; stdout is reserved for `show`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file, apply flag overrides, and validate the result.
fn settings_builder(args: &SettingsArgs) -> Result<SettingsBuilder, config::ConfigError> {
    let mut config: ProcessConfig = match &args.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(gamma) = args.gamma {
        config.gamma = gamma;
    }
    if let Some(gravity) = args.gravity {
        config.gravity = gravity;
    }
    if let Some(path) = &args.convert_path {
        config.convert.path = path.clone();
    }

    config.validate()?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config.settings_builder())
}
