use std::fs;
use std::path::{Path, PathBuf};

use statcard::config::{load_config, resolve_config, ConfigOverride, RendererConfig};
use statcard::error_codes::{find_coded_error, UNKNOWN_PATH_KEY};
use statcard::panel::{load_panel, GameMode};
use tempfile::tempdir;

fn write(path: &Path, yaml: &str) {
    fs::write(path, yaml).expect("yaml should write");
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("statcard.yaml");
    write(
        &path,
        r#"
paths:
  avatar: /srv/avatars/
fonts:
  sign: Sign.ttf
output_dir: /srv/cards
"#,
    );

    let config = load_config(&path).unwrap();
    let defaults = RendererConfig::default();
    assert_eq!(config.paths.avatar, PathBuf::from("/srv/avatars/"));
    assert_eq!(config.paths.edge, defaults.paths.edge);
    assert_eq!(config.fonts.sign, "Sign.ttf");
    assert_eq!(config.fonts.data, defaults.fonts.data);
    assert_eq!(config.output_dir(), PathBuf::from("/srv/cards"));
}

#[test]
fn unknown_config_field_reports_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("statcard.yaml");
    write(&path, "paths:\n  wallpaper: /x\n");

    let err = load_config(&path).unwrap_err().to_string();
    assert!(err.contains("line 2"), "unexpected error: {err}");
    assert!(err.contains("wallpaper"), "unexpected error: {err}");
}

#[test]
fn overrides_apply_after_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("statcard.yaml");
    write(&path, "paths:\n  skin: /from/file/\n");

    let overrides = [
        ConfigOverride::parse("path.skin=/from/cli/").unwrap(),
        ConfigOverride::parse("font.name=Name.ttf").unwrap(),
    ];
    let config = resolve_config(Some(&path), &overrides).unwrap();
    assert_eq!(config.paths.skin, PathBuf::from("/from/cli/"));
    assert_eq!(config.fonts.name, "Name.ttf");
}

#[test]
fn unknown_override_key_is_coded() {
    let overrides = [ConfigOverride::parse("path.wallpaper=/x").unwrap()];
    let err = resolve_config(None, &overrides).unwrap_err();
    assert_eq!(find_coded_error(&err).unwrap().code, UNKNOWN_PATH_KEY);
}

#[test]
fn panel_without_previous_snapshot_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("panel.yaml");
    write(
        &path,
        r##"
mode: mania
current:
  user_id: 1234
  username: someone
  country: JP
  pp: 4321.5
  global_rank: 9001
config:
  qq: 10001
  sign: hello
  color:
    name: "#ffffff"
compare_days: 0
"##,
    );

    let panel = load_panel(&path).unwrap();
    assert_eq!(panel.mode, GameMode::Mania);
    assert_eq!(panel.current.user_id, 1234);
    assert_eq!(panel.current.global_rank, 9001);
    assert!(panel.previous.is_none());
    assert_eq!(panel.config.qq, Some(10001));
    assert_eq!(panel.config.color.name, "#ffffff");
    assert_eq!(panel.config.color.data, "#000000");
    assert_eq!(panel.config.skin, "sbk");
}

#[test]
fn panel_accepts_mode_aliases_and_previous_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("panel.yaml");
    write(
        &path,
        r#"
mode: fruits
previous:
  pp: 100.0
  xh: 3
compare_days: 7
"#,
    );

    let panel = load_panel(&path).unwrap();
    assert_eq!(panel.mode, GameMode::Ctb);
    assert_eq!(panel.mode.icon_file(), "mode-fruits-med.png");
    let previous = panel.previous.expect("previous snapshot should load");
    assert_eq!(previous.xh, 3);
    assert_eq!(panel.compare_days, 7);
}
