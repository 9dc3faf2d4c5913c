//! TrueType text drawing for card overlays.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use fontdue::layout::TextStyle as GlyphRun;
use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, VerticalAlign,
    WrapStyle,
};
use fontdue::{Font, FontSettings};
use image::{Pixel, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error_codes::{CodedError, INVALID_COLOR};

/// Where (`x`, `y`) anchors the drawn line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    /// `y` is the baseline.
    #[default]
    Undefined,
    /// `x` is an offset from the horizontal centre of the canvas and `y` is
    /// the top of the line box.
    North,
    /// `y` is the middle of the line box.
    Center,
    /// `y` is the bottom of the line box.
    South,
}

/// Horizontal anchoring of the drawn line relative to `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Undefined,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: [u8; 4],
    pub point_size: f32,
    pub font: Option<PathBuf>,
    pub gravity: Gravity,
    pub align: Align,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            point_size: 12.0,
            font: None,
            gravity: Gravity::Undefined,
            align: Align::Undefined,
        }
    }
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or one of a few colour names.
pub fn parse_color(raw: &str) -> Result<[u8; 4]> {
    let value = raw.trim().to_ascii_lowercase();
    let named = match value.as_str() {
        "black" | "default" => Some([0, 0, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        _ => None,
    };
    if let Some(color) = named {
        return Ok(color);
    }

    let invalid = || {
        anyhow!(CodedError::rejected(
            INVALID_COLOR,
            format!("invalid color '{raw}'"),
            raw,
        ))
    };
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let byte = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).map_err(|_| invalid());

    let color = match hex.len() {
        3 => {
            let mut out = [255; 4];
            for (slot, ch) in out.iter_mut().zip(hex.chars()) {
                let nibble = ch.to_digit(16).ok_or_else(invalid)? as u8;
                *slot = nibble * 17;
            }
            out
        }
        6 => [byte(0)?, byte(2)?, byte(4)?, 255],
        8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
        _ => return Err(invalid()),
    };
    Ok(color)
}

#[derive(Debug, Clone)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

/// Draws text with fonts loaded on first use and rasterized glyphs cached.
#[derive(Default)]
pub struct TextPainter {
    fonts: HashMap<PathBuf, Font>,
    glyph_cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl TextPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_font(&mut self, path: &Path) -> Result<&Font> {
        if !self.fonts.contains_key(path) {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read font file {}", path.display()))?;
            let font = Font::from_bytes(bytes, FontSettings::default())
                .map_err(|error| anyhow!("failed to parse font {}: {error}", path.display()))?;
            debug!(font = %path.display(), "loaded font");
            self.fonts.insert(path.to_path_buf(), font);
        }
        self.fonts
            .get(path)
            .ok_or_else(|| anyhow!("font {} missing from cache", path.display()))
    }

    /// Width in pixels of `text` laid out on one line.
    pub fn measure(&mut self, text: &str, style: &TextStyle) -> Result<f32> {
        let font_path = style_font(style)?;
        let font = self.load_font(font_path)?;
        Ok(text
            .chars()
            .map(|ch| font.metrics(ch, style.point_size).advance_width)
            .sum())
    }

    pub fn draw(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        style: &TextStyle,
        x: f32,
        y: f32,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let font_path = style_font(style)?.to_path_buf();
        let line_width = self.measure(text, style)?;
        self.load_font(&font_path)?;
        let Some(font) = self.fonts.get(&font_path) else {
            bail!("font {} missing from cache", font_path.display());
        };

        let missing = text
            .chars()
            .filter(|ch| !ch.is_control() && font.lookup_glyph_index(*ch) == 0)
            .collect::<String>();
        if !missing.is_empty() {
            warn!(font = %font_path.display(), missing = %missing, "font lacks glyphs");
        }

        let size = style.point_size;
        let (ascent, descent) = font
            .horizontal_line_metrics(size)
            .map(|metrics| (metrics.ascent, metrics.descent))
            .unwrap_or((size, 0.0));
        let top = match style.gravity {
            Gravity::Undefined => y - ascent,
            Gravity::North => y,
            Gravity::Center => y - (ascent - descent) / 2.0,
            Gravity::South => y - (ascent - descent),
        };
        let anchor = match style.gravity {
            Gravity::North => canvas.width() as f32 / 2.0 + x,
            Gravity::Undefined | Gravity::Center | Gravity::South => x,
        };
        let left = match style.align {
            Align::Undefined | Align::Left => anchor,
            Align::Center => anchor - line_width / 2.0,
            Align::Right => anchor - line_width,
        };

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: left,
            y: top,
            max_width: None,
            max_height: None,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            wrap_style: WrapStyle::Letter,
            wrap_hard_breaks: true,
        });
        layout.append(&[font], &GlyphRun::new(text, size, 0));

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let glyph_bitmap = self.glyph_cache.entry(glyph.key).or_insert_with(|| {
                let (_, bitmap) = font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    bitmap,
                }
            });
            blend_glyph(
                canvas,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
                glyph_bitmap,
                style.color,
            );
        }
        Ok(())
    }
}

fn style_font(style: &TextStyle) -> Result<&Path> {
    style
        .font
        .as_deref()
        .ok_or_else(|| anyhow!("text style has no font file"))
}

fn blend_glyph(canvas: &mut RgbaImage, x: i64, y: i64, glyph: &GlyphBitmap, color: [u8; 4]) {
    let (width, height) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for row in 0..glyph.height {
        let py = y + row as i64;
        if py < 0 || py >= height {
            continue;
        }
        for col in 0..glyph.width {
            let px = x + col as i64;
            if px < 0 || px >= width {
                continue;
            }
            let coverage = glyph.bitmap[row * glyph.width + col];
            if coverage == 0 {
                continue;
            }
            let alpha = ((u16::from(coverage) * u16::from(color[3])) / 255) as u8;
            canvas
                .get_pixel_mut(px as u32, py as u32)
                .blend(&Rgba([color[0], color[1], color[2], alpha]));
        }
    }
}
