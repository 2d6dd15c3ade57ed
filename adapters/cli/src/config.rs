//! Launch configuration assembled from command-line flags and an optional TOML file.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pattern_loom_system_anomalies::AnomalyTuning;
use serde::Deserialize;

/// Command-line arguments accepted by the Pattern Loom binary.
#[derive(Debug, Default, Parser)]
#[command(
    name = "pattern-loom",
    version,
    about = "Reproduce the target pattern before the anomalies unravel the grid"
)]
pub(crate) struct CliArgs {
    /// Seed for anomaly placement and corruption; random when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// TOML file providing defaults for the other options.
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// Number of anomalies spawned on every reset.
    #[arg(long, value_name = "COUNT")]
    pub(crate) anomalies: Option<usize>,
    /// Probability that an active anomaly corrupts its cell on a tick.
    #[arg(long, value_name = "PROBABILITY")]
    pub(crate) corruption_chance: Option<f64>,
    /// Log frame timing once per second.
    #[arg(long)]
    pub(crate) show_fps: bool,
    /// Present frames without waiting for the display refresh.
    #[arg(long)]
    pub(crate) no_vsync: bool,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    seed: Option<u64>,
    #[serde(default)]
    anomalies: AnomalySection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct AnomalySection {
    count: Option<usize>,
    corruption_chance: Option<f64>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Fully resolved settings used to start a session.
#[derive(Debug, PartialEq)]
pub(crate) struct LaunchConfig {
    pub(crate) seed: Option<u64>,
    pub(crate) tuning: AnomalyTuning,
    pub(crate) show_fps: bool,
    pub(crate) vsync: bool,
}

impl LaunchConfig {
    /// Loads the referenced config file, if any, and merges it beneath the flags.
    pub(crate) fn from_args(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Flags win over the file; the file wins over built-in defaults.
    fn merge(args: &CliArgs, file: FileConfig) -> Result<Self> {
        let defaults = AnomalyTuning::default();
        let count = args
            .anomalies
            .or(file.anomalies.count)
            .unwrap_or(defaults.count());
        let chance = args
            .corruption_chance
            .or(file.anomalies.corruption_chance)
            .unwrap_or(defaults.corruption_chance());
        let tuning = AnomalyTuning::new(count, chance).context("invalid anomaly tuning")?;

        Ok(Self {
            seed: args.seed.or(file.seed),
            tuning,
            show_fps: args.show_fps,
            vsync: !args.no_vsync,
        })
    }
}
