use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lumaedit_bridge::{Adjustment, CropRequest, EditorBridge, EditorConfig, Preview};
use lumaedit_core::config::ConfigError;
use tracing_subscriber::EnvFilter;

/// Apply a chain of adjustments to an image and export it as JPEG.
///
/// Adjustments run in the order listed below; each one starts from the
/// result of the previous.
#[derive(Parser, Debug)]
#[command(name = "lumaedit", version)]
struct Cli {
    /// Image to edit (JPEG or PNG)
    input: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export directory, overriding the config
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Exposure gamma (> 0, 1 is neutral)
    #[arg(long)]
    exposure: Option<f32>,

    /// Contrast factor (> 0, 1 is neutral)
    #[arg(long)]
    contrast: Option<f32>,

    /// Shadow band factor
    #[arg(long)]
    shadow: Option<f32>,

    /// Midtone band factor
    #[arg(long)]
    midtone: Option<f32>,

    /// Highlight band factor
    #[arg(long)]
    highlight: Option<f32>,

    /// Noise reduction amount (0 is off)
    #[arg(long)]
    noise: Option<f32>,

    /// Sharpen strength (0 is off)
    #[arg(long)]
    sharpen: Option<f32>,

    /// Crop as RATIO or RATIO,X,Y
    #[arg(long, value_parser = parse_crop, allow_hyphen_values = true)]
    crop: Option<CropRequest>,

    /// Clockwise rotation in degrees
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f64>,

    /// Mirror horizontally
    #[arg(long)]
    flip: bool,

    /// Also write the last adjustment's preview JPEG here
    #[arg(long)]
    preview_out: Option<PathBuf>,
}

impl Cli {
    fn adjustments(&self) -> Vec<Adjustment> {
        let mut chain = Vec::new();
        if let Some(gamma) = self.exposure {
            chain.push(Adjustment::Exposure { gamma });
        }
        if let Some(factor) = self.contrast {
            chain.push(Adjustment::Contrast { factor });
        }
        if let Some(factor) = self.shadow {
            chain.push(Adjustment::Shadow { factor });
        }
        if let Some(factor) = self.midtone {
            chain.push(Adjustment::Midtone { factor });
        }
        if let Some(factor) = self.highlight {
            chain.push(Adjustment::Highlight { factor });
        }
        if let Some(factor) = self.noise {
            chain.push(Adjustment::Noise { factor });
        }
        if let Some(strength) = self.sharpen {
            chain.push(Adjustment::Sharpen { strength });
        }
        if let Some(crop) = self.crop {
            chain.push(Adjustment::Crop(crop));
        }
        if let Some(degrees) = self.rotate {
            chain.push(Adjustment::Rotate { degrees });
        }
        if self.flip {
            chain.push(Adjustment::Flip);
        }
        chain
    }
}

fn parse_crop(value: &str) -> Result<CropRequest, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let ratio = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("invalid ratio {:?}: {e}", parts[0]))?;
    match parts.as_slice() {
        [_] => Ok(CropRequest::new(ratio, 0, 0)),
        [_, x, y] => {
            let x = x.parse().map_err(|e| format!("invalid x {x:?}: {e}"))?;
            let y = y.parse().map_err(|e| format!("invalid y {y:?}: {e}"))?;
            Ok(CropRequest::new(ratio, x, y))
        }
        _ => Err("expected RATIO or RATIO,X,Y".to_string()),
    }
}

enum Outcome {
    Applied(&'static str, Preview),
    Exported(PathBuf),
    Failed(String),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EditorConfig::default(),
    };
    if let Some(dir) = &cli.out_dir {
        config.export_dir = dir.clone();
    }
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Validation(problems).into());
    }

    let bridge = EditorBridge::new(config).context("starting editor worker")?;
    bridge
        .open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let chain = cli.adjustments();
    for &adjustment in &chain {
        let name = adjustment.control().as_str();
        let tx = tx.clone();
        bridge.apply(adjustment, move |result| {
            let outcome = match result {
                Ok(preview) => Outcome::Applied(name, preview),
                Err(err) => Outcome::Failed(format!("{name}: {err}")),
            };
            let _ = tx.send(outcome);
        });
    }
    bridge.export(move |result| {
        let outcome = match result {
            Ok(path) => Outcome::Exported(path),
            Err(err) => Outcome::Failed(format!("export: {err}")),
        };
        let _ = tx.send(outcome);
    });

    let expected = chain.len() + 1;
    let mut received = 0;
    let mut exported = None;
    let mut last_preview = None;
    let mut failures = Vec::new();
    while received < expected {
        if bridge.wait_for_completion(Duration::from_secs(60)) == 0 {
            bail!("timed out waiting for the editor worker");
        }
        for outcome in rx.try_iter() {
            received += 1;
            match outcome {
                Outcome::Applied(name, preview) => {
                    tracing::info!(control = name, width = preview.width, height = preview.height, "applied");
                    last_preview = Some(preview);
                }
                Outcome::Exported(path) => exported = Some(path),
                Outcome::Failed(msg) => failures.push(msg),
            }
        }
    }

    if !failures.is_empty() {
        bail!("{}", failures.join("\n"));
    }
    if let (Some(path), Some(preview)) = (&cli.preview_out, &last_preview) {
        let bytes = preview.jpeg_bytes().context("decoding preview")?;
        std::fs::write(path, bytes).with_context(|| format!("writing preview {}", path.display()))?;
    }
    match exported {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("export produced no file"),
    }
}
