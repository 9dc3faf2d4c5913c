//! Fixed-layout stat card.
//!
//! The card is a 1080x1920 portrait canvas: background and dimming overlay,
//! framed profile/data/signature boxes, avatar and icons, then the text
//! overlays. When a previous snapshot is present every statistic also gets a
//! delta drawn next to it, coloured by direction.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::canvas::Canvas;
use crate::config::RendererConfig;
use crate::error_codes::{CodedError, INVALID_OPACITY};
use crate::fingerprint::DEFAULT_SLICE_LEN;
use crate::format::{
    arrow_delta, bracketed_arrow_count, magnitude, signed_count, signed_decimal, signed_magnitude,
    Trend,
};
use crate::panel::{PanelData, PlayerSnapshot, StatSnapshot};
use crate::text::{parse_color, Align, Gravity, TextPainter, TextStyle};

pub const CARD_WIDTH: u32 = 1080;
pub const CARD_HEIGHT: u32 = 1920;

const BIG_POINTSIZE: f32 = 54.0;
const MID_POINTSIZE: f32 = 43.0;
const SMALL_POINTSIZE: f32 = 29.0;

const NO_AVATAR_FILE: &str = "no-avatar.png";
const UNKNOWN_COUNTRY: &str = "__";
const RANK_ICON_FILES: [&str; 5] = [
    "ranking-X-small.png",
    "ranking-XH-small.png",
    "ranking-S-small.png",
    "ranking-SH-small.png",
    "ranking-A-small.png",
];

/// Chat-message reference to a local image file.
pub fn cq_image_reference(path: &Path) -> String {
    format!("[CQ:image, file=file://{}]", path.display())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardOutput {
    pub path: PathBuf,
    pub cq_reference: String,
}

pub struct CardRenderer {
    config: RendererConfig,
    painter: TextPainter,
}

impl CardRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            painter: TextPainter::new(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Renders `panel` and saves it to `output`, or to
    /// `<output dir>/<fingerprint slice>.jpg` when no path is given.
    pub fn render(&mut self, panel: &PanelData, output: Option<&Path>) -> Result<CardOutput> {
        let canvas = self.compose(panel)?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => {
                let name = canvas.random_fingerprint_slice(DEFAULT_SLICE_LEN)?;
                self.config.output_dir().join(format!("{name}.jpg"))
            }
        };
        canvas.save(&path)?;
        info!(
            user_id = panel.current.user_id,
            path = %path.display(),
            "rendered stat card"
        );

        Ok(CardOutput {
            cq_reference: cq_image_reference(&path),
            path,
        })
    }

    /// Draws the full card without saving it.
    pub fn compose(&mut self, panel: &PanelData) -> Result<Canvas> {
        let opacity = panel.config.opacity;
        if opacity > 100 || opacity % 5 != 0 {
            return Err(anyhow!(CodedError::rejected(
                INVALID_OPACITY,
                format!("opacity must be a multiple of 5 within 0-100, got {opacity}"),
                opacity,
            )));
        }

        let mut canvas = Canvas::new(CARD_WIDTH, CARD_HEIGHT);
        self.draw_artwork(&mut canvas, panel)?;
        self.draw_footer(&mut canvas, panel)?;
        self.draw_profile(&mut canvas, panel)?;
        self.draw_data_block(&mut canvas, panel)?;
        self.draw_ranks(&mut canvas, panel)?;
        Ok(canvas)
    }

    fn draw_artwork(&self, canvas: &mut Canvas, panel: &PanelData) -> Result<()> {
        let paths = &self.config.paths;
        let user = &panel.config;

        canvas.composite_file(&paths.background.join(&user.background), 0, 0, None)?;
        canvas.composite_file(
            &paths.overlay.join(format!("fx{}.png", user.opacity)),
            0,
            0,
            None,
        )?;
        canvas.composite_file(&paths.edge.join(&user.edge.profile), 50, 20, Some((970, 600)))?;

        let data_edge = Canvas::open(&paths.edge.join(&user.edge.data))?;
        for i in 0..6_i64 {
            // Boxes step right by 33.5px; the half pixel truncates.
            let x = (56.0 + 33.5 * i as f64) as i64;
            canvas.composite(&data_edge, x, 980 + 140 * i, Some((820, 140)));
        }
        canvas.composite_file(&paths.edge.join(&user.edge.sign), 125, 570, Some((825, 150)))?;

        let avatar = paths.avatar.join(format!("{}.png", panel.current.user_id));
        if let Err(error) = canvas.composite_file(&avatar, 165, 150, Some((350, 350))) {
            warn!(
                avatar = %avatar.display(),
                error = %error,
                "avatar unavailable, using default"
            );
            canvas.composite_file(&paths.avatar.join(NO_AVATAR_FILE), 165, 150, Some((350, 350)))?;
        }

        let skin = paths.skin.join(&user.skin);
        canvas.composite_file(&skin.join(panel.mode.icon_file()), 165, 150, Some((80, 80)))?;
        canvas.composite_file(&paths.global, 510, 150, Some((100, 100)))?;

        let country = if panel.current.country.is_empty() {
            UNKNOWN_COUNTRY
        } else {
            panel.current.country.as_str()
        };
        canvas.composite_file(
            &paths.country.join(format!("{country}.png")),
            560,
            425,
            Some((80, 80)),
        )?;

        for (i, file) in RANK_ICON_FILES.iter().enumerate() {
            let x = 165 + 120 * i as i64;
            let y = if i % 2 == 1 { 870 } else { 720 };
            canvas.composite_file(&skin.join(file), x, y, Some((82, 98)))?;
        }
        debug!("card artwork composited");
        Ok(())
    }

    fn draw_footer(&mut self, canvas: &mut Canvas, panel: &PanelData) -> Result<()> {
        let style = self.style(&panel.config.color.time, &self.config.fonts.time, SMALL_POINTSIZE)?;
        if panel.compare_days != 0 {
            let text = format!("compare with {} days ago", panel.compare_days);
            canvas.draw_text(&mut self.painter, &text, &style, 30.0, 1840.0)?;
        }
        let stamp = Local::now().format("%F %a %T by statcard").to_string();
        canvas.draw_text(&mut self.painter, &stamp, &style, 30.0, 1880.0)
    }

    fn draw_profile(&mut self, canvas: &mut Canvas, panel: &PanelData) -> Result<()> {
        let current = &panel.current;
        let colors = &panel.config.color;
        let style = self.style(&colors.profile, &self.config.fonts.profile, SMALL_POINTSIZE)?;

        let uid = format!("UID: {}", current.user_id);
        canvas.draw_text(&mut self.painter, &uid, &style, 585.0, 365.0)?;
        let qq = match panel.config.qq {
            Some(qq) => format!("QQ: {qq}"),
            None => "QQ: unknown".to_owned(),
        };
        canvas.draw_text(&mut self.painter, &qq, &style, 585.0, 395.0)?;

        let country_rank = match &panel.previous {
            Some(previous) => {
                let delta = current.country_rank.saturating_sub(previous.country_rank);
                format!(
                    "#{}{}",
                    current.country_rank,
                    bracketed_arrow_count(delta, Trend::of_rank(delta))
                )
            }
            None => format!("#{}", current.country_rank),
        };
        canvas.draw_text(&mut self.painter, &country_rank, &style, 660.0, 460.0)?;

        if let Some(previous) = &panel.previous {
            let delta = current.global_rank.saturating_sub(previous.global_rank);
            let trend = Trend::of_rank(delta);
            let color = match trend {
                Trend::Up => &colors.arrowup,
                Trend::Down => &colors.arrowdown,
            };
            let style = self.style(color, &self.config.fonts.arrow, BIG_POINTSIZE)?;
            let text = bracketed_arrow_count(delta, trend);
            canvas.draw_text(&mut self.painter, &text, &style, 660.0, 270.0)?;
        }

        let name_style = self.style(&colors.name, &self.config.fonts.name, BIG_POINTSIZE)?;
        let global_rank = current.global_rank.to_string();
        canvas.draw_text(&mut self.painter, &global_rank, &name_style, 600.0, 220.0)?;
        canvas.draw_text(&mut self.painter, &current.username, &name_style, 555.0, 325.0)?;

        let mut sign_style = self.style(&colors.sign, &self.config.fonts.sign, BIG_POINTSIZE)?;
        sign_style.gravity = Gravity::North;
        sign_style.align = Align::Center;
        canvas.draw_text(&mut self.painter, &panel.config.sign, &sign_style, 0.0, 660.0)
    }

    fn draw_data_block(&mut self, canvas: &mut Canvas, panel: &PanelData) -> Result<()> {
        let current = &panel.current;
        let style = self.style(&panel.config.color.data, &self.config.fonts.data, MID_POINTSIZE)?;

        let lines = [
            (format!("PPoint :     {:.2}", current.pp), 140.0, 1210.0),
            (
                format!("Ranked Score : {}", magnitude(current.ranked_score)),
                106.0,
                1070.0,
            ),
            (
                format!("Total Hits :    {}", magnitude(current.total_hits)),
                240.0,
                1630.0,
            ),
            (format!("Playcount :    {}", current.playcount), 173.0, 1350.0),
            (format!("Current Level :   {:.2}", current.level), 274.0, 1770.0),
            (format!("Hit Accuracy : {:.2}%", current.accuracy), 207.0, 1490.0),
        ];
        for (text, x, y) in &lines {
            canvas.draw_text(&mut self.painter, text, &style, *x, *y)?;
        }

        let Some(previous) = &panel.previous else {
            return Ok(());
        };
        for delta in data_deltas(panel, previous) {
            let color = match delta.trend {
                Trend::Up => &panel.config.color.arrowup,
                Trend::Down => &panel.config.color.arrowdown,
            };
            let mut style = style.clone();
            style.color = parse_color(color)?;
            canvas.draw_text(&mut self.painter, &delta.text, &style, delta.x, delta.y)?;
        }
        Ok(())
    }

    fn draw_ranks(&mut self, canvas: &mut Canvas, panel: &PanelData) -> Result<()> {
        let current = &panel.current;
        let style = self.style(&panel.config.color.name, &self.config.fonts.name, BIG_POINTSIZE)?;

        if let Some(previous) = &panel.previous {
            let deltas = grade_deltas(current, previous);
            let columns = [253.0, 494.0, 735.0];
            for (delta, x) in deltas.into_iter().zip(columns) {
                let text = bracketed_arrow_count(delta, Trend::of(delta));
                canvas.draw_text(&mut self.painter, &text, &style, x, 860.0)?;
            }
        }

        let counts = [
            current.count_ss,
            current.count_ssh,
            current.count_s,
            current.count_sh,
            current.count_a,
        ];
        for (i, count) in counts.iter().enumerate() {
            let x = 253.0 + 120.0 * i as f32;
            let y = if i % 2 == 1 { 940.0 } else { 790.0 };
            canvas.draw_text(&mut self.painter, &count.to_string(), &style, x, y)?;
        }
        Ok(())
    }

    fn style(&self, color: &str, font_file: &str, point_size: f32) -> Result<TextStyle> {
        let color = parse_color(color).with_context(|| format!("bad card color '{color}'"))?;
        Ok(TextStyle {
            color,
            point_size,
            font: Some(self.config.font_path(font_file)),
            ..TextStyle::default()
        })
    }
}

/// Changes in the SS (incl. silver), S (incl. silver) and A grade counts.
fn grade_deltas(current: &PlayerSnapshot, previous: &StatSnapshot) -> [i64; 3] {
    let ss = current.count_ssh.saturating_add(current.count_ss);
    let s = current.count_sh.saturating_add(current.count_s);
    [
        ss.saturating_sub(previous.xh.saturating_add(previous.x)),
        s.saturating_sub(previous.sh.saturating_add(previous.s)),
        current.count_a.saturating_sub(previous.a),
    ]
}

/// A change to draw beside one statistic of the data block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataDelta {
    pub text: String,
    pub trend: Trend,
    pub x: f32,
    pub y: f32,
}

/// Deltas between the live and previous snapshot, one per data line.
pub fn data_deltas(panel: &PanelData, previous: &StatSnapshot) -> Vec<DataDelta> {
    let current = &panel.current;
    let delta = |text: String, trend: Trend, x: f32, y: f32| DataDelta { text, trend, x, y };

    let pp = current.pp - previous.pp;
    let ranked = current.ranked_score.saturating_sub(previous.ranked_score);
    let hits = current.judged_hits().saturating_sub(previous.total_hits);
    let playcount = current.playcount.saturating_sub(previous.playcount);
    let accuracy = current.accuracy - previous.accuracy;
    let level = current.level - previous.level;

    vec![
        delta(arrow_delta(pp), Trend::of(pp), 670.0, 1210.0),
        delta(signed_magnitude(ranked), Trend::of(ranked), 626.0, 1070.0),
        delta(signed_magnitude(hits), Trend::of(hits), 780.0, 1630.0),
        delta(signed_count(playcount), Trend::of(playcount), 713.0, 1350.0),
        delta(format!("{}%", arrow_delta(accuracy)), Trend::of(accuracy), 747.0, 1490.0),
        delta(signed_decimal(level), Trend::of(level), 814.0, 1770.0),
    ]
}
