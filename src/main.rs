use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use statcard::canvas::Canvas;
use statcard::card::CardRenderer;
use statcard::config::{resolve_config, ConfigOverride};
use statcard::error_codes::{exit_code, find_coded_error, ErrorEnvelope};
use statcard::logging;
use statcard::panel::load_panel;
use statcard::similarity::{hamming_distance, is_similar, SIMILARITY_THRESHOLD_PERCENT};

#[derive(Debug, Parser)]
#[command(name = "statcard")]
#[command(about = "Render player stat cards and compare image fingerprints")]
#[command(version, long_version = env!("STATCARD_LONG_VERSION"))]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a stat card from a YAML panel file.
    Render {
        panel: PathBuf,
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Override one setting, e.g. `path.avatar=/srv/avatars/`.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the perceptual fingerprint of an image.
    Hash {
        image: PathBuf,
        /// Print a random slice of this many characters instead.
        #[arg(long, num_args = 0..=1, default_missing_value = "16")]
        slice: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Compare two images or fingerprints.
    Compare {
        first: String,
        second: String,
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Self::Render { json, .. } | Self::Hash { json, .. } | Self::Compare { json, .. } => {
                *json
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let json = cli.command.json();

    let result = match cli.command {
        Commands::Render {
            panel,
            config,
            overrides,
            output,
            json,
        } => run_render(&panel, config.as_deref(), &overrides, output.as_deref(), json),
        Commands::Hash { image, slice, json } => run_hash(&image, slice, json),
        Commands::Compare {
            first,
            second,
            json,
        } => run_compare(&first, &second, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report_error(&error, json),
    }
}

fn report_error(error: &anyhow::Error, json: bool) -> ExitCode {
    let envelope = find_coded_error(error)
        .filter(|_| json)
        .and_then(|coded| serde_json::to_string(&ErrorEnvelope::from(coded)).ok());
    match envelope {
        Some(envelope) => eprintln!("{envelope}"),
        None => eprintln!("error: {error:#}"),
    }
    ExitCode::from(exit_code(error))
}

fn run_render(
    panel_path: &Path,
    config_path: Option<&Path>,
    raw_overrides: &[String],
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let overrides = raw_overrides
        .iter()
        .map(|raw| ConfigOverride::parse(raw))
        .collect::<Result<Vec<_>>>()?;
    let config = resolve_config(config_path, &overrides)?;
    let panel = load_panel(panel_path)?;

    let mut renderer = CardRenderer::new(config);
    let card = renderer
        .render(&panel, output)
        .with_context(|| format!("failed to render card for {}", panel_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        println!("{}", card.cq_reference);
    }
    Ok(())
}

fn run_hash(image_path: &Path, slice: Option<usize>, json: bool) -> Result<()> {
    let canvas = Canvas::open(image_path)?;
    let fingerprint = match slice {
        Some(length) => canvas.random_fingerprint_slice(length)?,
        None => canvas.full_fingerprint()?,
    };

    if json {
        let body = json!({
            "image": image_path.display().to_string(),
            "fingerprint": fingerprint,
            "length": fingerprint.len(),
            "slice": slice.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{fingerprint}");
    }
    Ok(())
}

fn run_compare(first: &str, second: &str, json: bool) -> Result<()> {
    let first = resolve_fingerprint(first)?;
    let second = resolve_fingerprint(second)?;
    let distance = hamming_distance(&first, &second);
    let comparable = distance >= 0.0;

    if json {
        let body = json!({
            "comparable": comparable,
            "distance": comparable.then_some(distance),
            "similar": is_similar(distance),
            "threshold": SIMILARITY_THRESHOLD_PERCENT,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if comparable {
        let verdict = if is_similar(distance) { "similar" } else { "different" };
        println!("{distance:.2}% ({verdict})");
    } else {
        println!(
            "incomparable: fingerprint lengths differ ({} vs {})",
            first.chars().count(),
            second.chars().count()
        );
    }
    Ok(())
}

/// An existing file is fingerprinted; anything else is taken as a fingerprint.
fn resolve_fingerprint(raw: &str) -> Result<String> {
    let path = Path::new(raw);
    if path.is_file() {
        return Canvas::open(path)?.full_fingerprint();
    }
    Ok(raw.trim().to_owned())
}
