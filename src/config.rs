//! Renderer configuration: where assets live and which font files draw which
//! parts of the card.
//!
//! Every renderer owns its own [`RendererConfig`]; there is no process-wide
//! path state. Values come from defaults, an optional YAML file, and
//! `key=value` overrides, applied in that order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error_codes::{CodedError, INVALID_OVERRIDE, UNKNOWN_FONT_KEY, UNKNOWN_PATH_KEY};

pub const PATH_KEYS: [&str; 8] = [
    "background",
    "edge",
    "font",
    "skin",
    "country",
    "global",
    "avatar",
    "overlay",
];

pub const FONT_KEYS: [&str; 6] = ["profile", "data", "sign", "time", "arrow", "name"];

const DEFAULT_FONT_FILE: &str = "10014.ttf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetPaths {
    pub background: PathBuf,
    pub edge: PathBuf,
    pub font: PathBuf,
    pub skin: PathBuf,
    pub country: PathBuf,
    /// A single image, not a directory.
    pub global: PathBuf,
    pub avatar: PathBuf,
    /// Directory holding the `fx<opacity>.png` dimming overlays.
    pub overlay: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            background: PathBuf::from("../png/stat/"),
            edge: PathBuf::from("../png/tk/"),
            font: PathBuf::from("../fonts/"),
            skin: PathBuf::from("../png/rank/"),
            country: PathBuf::from("../png/country/"),
            global: PathBuf::from("../png/world/s.png"),
            avatar: PathBuf::from("../png/avatars/"),
            overlay: PathBuf::from("../png/"),
        }
    }
}

impl AssetPaths {
    pub fn get(&self, key: &str) -> Result<&Path> {
        let path = match key {
            "background" => &self.background,
            "edge" => &self.edge,
            "font" => &self.font,
            "skin" => &self.skin,
            "country" => &self.country,
            "global" => &self.global,
            "avatar" => &self.avatar,
            "overlay" => &self.overlay,
            _ => return Err(unknown_key(UNKNOWN_PATH_KEY, "path", key, &PATH_KEYS)),
        };
        Ok(path)
    }

    /// Replaces one base path and returns the value now in effect.
    pub fn set(&mut self, key: &str, value: impl Into<PathBuf>) -> Result<&Path> {
        let slot = match key {
            "background" => &mut self.background,
            "edge" => &mut self.edge,
            "font" => &mut self.font,
            "skin" => &mut self.skin,
            "country" => &mut self.country,
            "global" => &mut self.global,
            "avatar" => &mut self.avatar,
            "overlay" => &mut self.overlay,
            _ => return Err(unknown_key(UNKNOWN_PATH_KEY, "path", key, &PATH_KEYS)),
        };
        *slot = value.into();
        Ok(slot.as_path())
    }
}

/// Font file names, resolved against [`AssetPaths::font`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSet {
    pub profile: String,
    pub data: String,
    pub sign: String,
    pub time: String,
    pub arrow: String,
    pub name: String,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            profile: DEFAULT_FONT_FILE.to_owned(),
            data: DEFAULT_FONT_FILE.to_owned(),
            sign: DEFAULT_FONT_FILE.to_owned(),
            time: DEFAULT_FONT_FILE.to_owned(),
            arrow: DEFAULT_FONT_FILE.to_owned(),
            name: DEFAULT_FONT_FILE.to_owned(),
        }
    }
}

impl FontSet {
    pub fn get(&self, key: &str) -> Result<&str> {
        let font = match key {
            "profile" => &self.profile,
            "data" => &self.data,
            "sign" => &self.sign,
            "time" => &self.time,
            "arrow" => &self.arrow,
            "name" => &self.name,
            _ => return Err(unknown_key(UNKNOWN_FONT_KEY, "font", key, &FONT_KEYS)),
        };
        Ok(font)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<&str> {
        let slot = match key {
            "profile" => &mut self.profile,
            "data" => &mut self.data,
            "sign" => &mut self.sign,
            "time" => &mut self.time,
            "arrow" => &mut self.arrow,
            "name" => &mut self.name,
            _ => return Err(unknown_key(UNKNOWN_FONT_KEY, "font", key, &FONT_KEYS)),
        };
        *slot = value.into();
        Ok(slot.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub paths: AssetPaths,
    pub fonts: FontSet,
    /// Directory for cards rendered without an explicit output path.
    pub output_dir: Option<PathBuf>,
}

impl RendererConfig {
    pub fn font_path(&self, file_name: &str) -> PathBuf {
        self.paths.font.join(file_name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data/image"))
    }

    pub fn apply_override(&mut self, item: &ConfigOverride) -> Result<()> {
        match item.section {
            OverrideSection::Path => {
                self.paths.set(&item.key, item.value.as_str())?;
            }
            OverrideSection::Font => {
                self.fonts.set(&item.key, item.value.as_str())?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSection {
    Path,
    Font,
}

/// One `--set path.<key>=<value>` or `--set font.<key>=<value>` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverride {
    pub section: OverrideSection,
    pub key: String,
    pub value: String,
}

impl ConfigOverride {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || {
            anyhow!(CodedError::rejected(
                INVALID_OVERRIDE,
                format!("invalid override '{raw}', expected path.<key>=<value> or font.<key>=<value>"),
                raw,
            ))
        };

        let (name, value) = raw.split_once('=').ok_or_else(invalid)?;
        let (section, key) = name.trim().split_once('.').ok_or_else(invalid)?;
        let section = match section {
            "path" => OverrideSection::Path,
            "font" => OverrideSection::Font,
            _ => return Err(invalid()),
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            section,
            key: key.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

pub fn load_config(path: &Path) -> Result<RendererConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_yaml(&contents, path)
}

/// Defaults, then the optional file, then each override in order.
pub fn resolve_config(path: Option<&Path>, overrides: &[ConfigOverride]) -> Result<RendererConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => RendererConfig::default(),
    };
    for item in overrides {
        config
            .apply_override(item)
            .with_context(|| format!("failed applying override for '{}'", item.key))?;
    }
    Ok(config)
}

pub(crate) fn parse_yaml<T: serde::de::DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    serde_yaml::from_str(contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })
}

fn unknown_key(code: &'static str, kind: &str, key: &str, allowed: &[&str]) -> anyhow::Error {
    anyhow!(CodedError::unknown_key(code, kind, key, allowed))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{AssetPaths, ConfigOverride, FontSet, OverrideSection, RendererConfig};
    use crate::error_codes::{find_coded_error, INVALID_OVERRIDE, UNKNOWN_FONT_KEY, UNKNOWN_PATH_KEY};

    #[test]
    fn set_path_returns_new_value() {
        let mut paths = AssetPaths::default();
        let now = paths.set("avatar", "/srv/avatars").unwrap().to_path_buf();
        assert_eq!(now, Path::new("/srv/avatars"));
        assert_eq!(paths.get("avatar").unwrap(), Path::new("/srv/avatars"));
        assert_eq!(paths.get("edge").unwrap(), Path::new("../png/tk/"));
    }

    #[test]
    fn unknown_keys_are_coded_errors() {
        let mut paths = AssetPaths::default();
        let err = paths.set("wallpaper", "x").unwrap_err();
        assert_eq!(find_coded_error(&err).unwrap().code, UNKNOWN_PATH_KEY);

        let err = FontSet::default().get("title").unwrap_err();
        assert_eq!(find_coded_error(&err).unwrap().code, UNKNOWN_FONT_KEY);
    }

    #[test]
    fn override_parses_section_key_and_value() {
        let item = ConfigOverride::parse("font.sign = Sign.ttf").unwrap();
        assert_eq!(item.section, OverrideSection::Font);
        assert_eq!(item.key, "sign");
        assert_eq!(item.value, "Sign.ttf");

        let mut config = RendererConfig::default();
        config.apply_override(&item).unwrap();
        assert_eq!(config.fonts.sign, "Sign.ttf");
        assert_eq!(config.font_path(&config.fonts.sign), Path::new("../fonts/Sign.ttf"));
    }

    #[test]
    fn malformed_override_is_rejected() {
        for raw in ["avatar=/x", "path.avatar", "theme.avatar=x", "path.=x"] {
            let err = ConfigOverride::parse(raw).unwrap_err();
            assert_eq!(find_coded_error(&err).unwrap().code, INVALID_OVERRIDE, "{raw}");
        }
    }
}
