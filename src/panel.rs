//! The data record a card is rendered from.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::parse_yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    #[serde(alias = "osu")]
    Std,
    Taiko,
    #[serde(alias = "fruits")]
    Ctb,
    Mania,
}

impl GameMode {
    pub fn icon_file(self) -> &'static str {
        match self {
            Self::Std => "mode-osu-med.png",
            Self::Taiko => "mode-taiko-med.png",
            Self::Ctb => "mode-fruits-med.png",
            Self::Mania => "mode-mania-med.png",
        }
    }
}

/// Live statistics of the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSnapshot {
    pub user_id: i64,
    pub username: String,
    /// Two-letter country code; empty means unknown.
    pub country: String,
    pub n300: i64,
    pub n100: i64,
    pub n50: i64,
    pub playcount: i64,
    pub total_score: i64,
    pub ranked_score: i64,
    pub total_hits: i64,
    pub pp: f64,
    pub country_rank: i64,
    pub global_rank: i64,
    pub count_ssh: i64,
    pub count_ss: i64,
    pub count_sh: i64,
    pub count_s: i64,
    pub count_a: i64,
    pub playtime_seconds: i64,
    pub level: f64,
    pub accuracy: f64,
}

impl PlayerSnapshot {
    pub fn judged_hits(&self) -> i64 {
        self.n300.saturating_add(self.n100).saturating_add(self.n50)
    }
}

/// A stored earlier snapshot the card compares against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatSnapshot {
    pub total_score: i64,
    pub ranked_score: i64,
    pub total_hits: i64,
    pub accuracy: f64,
    pub pp: f64,
    pub level: f64,
    pub global_rank: i64,
    pub country_rank: i64,
    pub playcount: i64,
    pub xh: i64,
    pub x: i64,
    pub sh: i64,
    pub s: i64,
    pub a: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeSet {
    pub profile: String,
    pub data: String,
    pub sign: String,
}

impl Default for EdgeSet {
    fn default() -> Self {
        Self {
            profile: "default0.png".to_owned(),
            data: "default1.png".to_owned(),
            sign: "default2.png".to_owned(),
        }
    }
}

/// Colour strings as accepted by [`crate::text::parse_color`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorSet {
    pub profile: String,
    pub data: String,
    pub sign: String,
    pub time: String,
    pub arrowup: String,
    pub arrowdown: String,
    pub name: String,
}

impl Default for ColorSet {
    fn default() -> Self {
        let black = || "#000000".to_owned();
        Self {
            profile: black(),
            data: black(),
            sign: black(),
            time: black(),
            arrowup: black(),
            arrowdown: black(),
            name: black(),
        }
    }
}

/// Per-user appearance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserCardConfig {
    pub qq: Option<i64>,
    pub sign: String,
    pub background: String,
    pub edge: EdgeSet,
    pub color: ColorSet,
    pub skin: String,
    /// Dimming overlay step, a multiple of 5 in 0..=100.
    pub opacity: u32,
}

impl Default for UserCardConfig {
    fn default() -> Self {
        Self {
            qq: None,
            sign: String::new(),
            background: "default.png".to_owned(),
            edge: EdgeSet::default(),
            color: ColorSet::default(),
            skin: "sbk".to_owned(),
            opacity: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelData {
    pub mode: GameMode,
    pub current: PlayerSnapshot,
    /// Absent when there is nothing to compare against; no deltas are drawn.
    pub previous: Option<StatSnapshot>,
    pub config: UserCardConfig,
    pub compare_days: u32,
}

pub fn load_panel(path: &Path) -> Result<PanelData> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read panel data {}", path.display()))?;
    parse_yaml(&contents, path)
}
