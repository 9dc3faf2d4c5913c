//! In-memory RGBA canvas: the drawing surface every card is built on.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbaImage};

use crate::fingerprint::{full_fingerprint, random_fingerprint_slice};
use crate::text::{TextPainter, TextStyle};

/// JPEG quality used by [`Canvas::save`].
pub const MAX_QUALITY: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let image = ImageReader::open(path)
            .with_context(|| format!("failed to open image {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("failed to detect image format of {}", path.display()))?
            .decode()
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        Ok(Self {
            image: image.into_rgba8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Scales to exactly `width`x`height`, ignoring aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() == (width, height) {
            return;
        }
        self.image = imageops::resize(&self.image, width, height, FilterType::Lanczos3);
    }

    /// Keeps the `width`x`height` region at (`x`, `y`); the region is clipped to
    /// the canvas.
    pub fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        if x >= self.width() || y >= self.height() {
            bail!(
                "crop origin ({}, {}) lies outside the {}x{} canvas",
                x,
                y,
                self.width(),
                self.height()
            );
        }
        self.image = imageops::crop_imm(&self.image, x, y, width, height).to_image();
        Ok(())
    }

    /// Source-over blend of `source` with its top-left corner at (`x`, `y`).
    ///
    /// With `resize` set, `source` is scaled to that size first. A zero width or
    /// height disables resizing.
    pub fn composite(&mut self, source: &Canvas, x: i64, y: i64, resize: Option<(u32, u32)>) {
        match resize {
            Some((width, height)) if width > 0 && height > 0 => {
                let scaled = imageops::resize(&source.image, width, height, FilterType::Lanczos3);
                imageops::overlay(&mut self.image, &scaled, x, y);
            }
            _ => imageops::overlay(&mut self.image, &source.image, x, y),
        }
    }

    /// [`Canvas::composite`] for an image file.
    pub fn composite_file(
        &mut self,
        path: &Path,
        x: i64,
        y: i64,
        resize: Option<(u32, u32)>,
    ) -> Result<()> {
        let source = Self::open(path)?;
        self.composite(&source, x, y, resize);
        Ok(())
    }

    pub fn draw_text(
        &mut self,
        painter: &mut TextPainter,
        text: &str,
        style: &TextStyle,
        x: f32,
        y: f32,
    ) -> Result<()> {
        painter
            .draw(&mut self.image, text, style, x, y)
            .with_context(|| format!("failed to draw text '{text}'"))
    }

    pub fn full_fingerprint(&self) -> Result<String> {
        full_fingerprint(&self.image)
    }

    pub fn random_fingerprint_slice(&self, length: usize) -> Result<String> {
        random_fingerprint_slice(&self.image, length)
    }

    /// Writes the canvas, format chosen by extension. JPEG output uses
    /// [`MAX_QUALITY`] and drops the alpha channel.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| anyhow!("output path {} has no file extension", path.display()))?;

        match extension.as_str() {
            "jpg" | "jpeg" => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                let rgb = DynamicImage::ImageRgba8(self.image.clone()).into_rgb8();
                JpegEncoder::new_with_quality(BufWriter::new(file), MAX_QUALITY)
                    .encode_image(&rgb)
                    .with_context(|| format!("failed to write jpeg {}", path.display()))
            }
            _ => self
                .image
                .save(path)
                .with_context(|| format!("failed to write image {}", path.display())),
        }
    }
}
