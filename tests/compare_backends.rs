//! Runs the same requests through both backends and compares the outputs.
//!
//! Needs ImageMagick's `convert` on `PATH`; every test returns early without
//! it. Run with: cargo test --test compare_backends -- --nocapture

use image::{Rgb, RgbImage};
use processimage::imaging::{ImageProcessor, Mode, Settings};
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;

fn magick_available() -> bool {
    Command::new("convert")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn write_gradient(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    })
    .save(path)
    .unwrap();
}

fn processor(mode: Mode, source: &Path, dest: &Path) -> ImageProcessor {
    ImageProcessor::new(
        Settings::builder()
            .mode(mode)
            .convert_path("convert")
            .source(source)
            .dest(dest)
            .quality(90)
            .build(),
    )
}

fn file_kb(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len() / 1024).unwrap_or(0)
}

#[test]
fn scale_dimensions_agree() {
    if !magick_available() {
        eprintln!("ImageMagick not found - skipping comparison");
        return;
    }
    let tmp = TempDir::new().unwrap();

    for (name, (w, h), target) in [
        ("portrait", (300, 600), (100, 250)),
        ("landscape", (640, 360), (320, 999)),
        ("square", (400, 400), (150, 90)),
    ] {
        let source = tmp.path().join(format!("{name}.png"));
        write_gradient(&source, w, h);

        let gd = tmp.path().join(format!("{name}_gd.jpg"));
        let magick = tmp.path().join(format!("{name}_magick.jpg"));

        let t = Instant::now();
        processor(Mode::Library, &source, &gd)
            .scale(target.0, target.1)
            .unwrap();
        let gd_ms = t.elapsed().as_millis();

        let t = Instant::now();
        processor(Mode::Convert, &source, &magick)
            .scale(target.0, target.1)
            .unwrap();
        let magick_ms = t.elapsed().as_millis();

        println!(
            "  {name}: gd={}KB/{gd_ms}ms  magick={}KB/{magick_ms}ms",
            file_kb(&gd),
            file_kb(&magick)
        );
        assert_eq!(
            image::image_dimensions(&gd).unwrap(),
            image::image_dimensions(&magick).unwrap(),
            "{name}"
        );
    }
}

#[test]
fn crop_dimensions_agree() {
    if !magick_available() {
        eprintln!("ImageMagick not found - skipping comparison");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("source.png");
    write_gradient(&source, 800, 600);

    // The second window runs past the intermediate's right and bottom edges.
    for (x, y) in [(10, 20), (-350, 250)] {
        let gd = tmp.path().join(format!("crop_{x}_{y}_gd.jpg"));
        let magick = tmp.path().join(format!("crop_{x}_{y}_magick.jpg"));

        processor(Mode::Library, &source, &gd)
            .crop(400, 400, 120, 80, x, y)
            .unwrap();
        processor(Mode::Convert, &source, &magick)
            .crop(400, 400, 120, 80, x, y)
            .unwrap();

        assert_eq!(image::image_dimensions(&gd).unwrap(), (120, 80));
        assert_eq!(image::image_dimensions(&magick).unwrap(), (120, 80));
    }
}
