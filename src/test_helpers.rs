//! Shared test utilities: synthetic images and fixture directories.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_input_dir(&[
//!     ("a.png", Fixture::Framed(400, 300, 20)),
//!     ("b.jpg", Fixture::Corrupt),
//! ]);
//! let input_dir = tmp.path().join("in");
//! ```

use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;
use tempfile::TempDir;

/// Colour used for the content block inside [`framed_rgb`] images.
pub const CONTENT: Rgb<u8> = Rgb([30, 60, 90]);

/// White canvas with a dark block inset by `border` pixels on every side.
pub fn framed_rgb(width: u32, height: u32, border: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= border && y >= border && x < width - border && y < height - border;
        if inside { CONTENT } else { Rgb([255, 255, 255]) }
    })
}

pub fn write_png(path: &Path, img: &RgbImage) {
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

pub fn write_jpeg(path: &Path, img: &RgbImage) {
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new_with_quality(writer, 95)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )
        .unwrap();
}

/// Bytes that no decoder accepts.
pub fn write_corrupt(path: &Path) {
    std::fs::write(path, b"this is not an image, only a truncated upload").unwrap();
}

/// Synthetic input files for [`setup_input_dir`].
pub enum Fixture {
    /// PNG/JPEG (by extension) `framed_rgb(w, h, border)`.
    Framed(u32, u32, u32),
    Corrupt,
    Text(&'static str),
}

/// Create a temp dir with an `in/` directory populated from `files`.
pub fn setup_input_dir(files: &[(&str, Fixture)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    std::fs::create_dir_all(&input).unwrap();

    for (name, fixture) in files {
        let path = input.join(name);
        match fixture {
            Fixture::Framed(w, h, border) => {
                let img = framed_rgb(*w, *h, *border);
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if ext == "jpg" || ext == "jpeg" {
                    write_jpeg(&path, &img);
                } else {
                    write_png(&path, &img);
                }
            }
            Fixture::Corrupt => write_corrupt(&path),
            Fixture::Text(body) => std::fs::write(&path, body).unwrap(),
        }
    }
    tmp
}
