// Command routing and dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kswatch_common::{logging, LogLevel};
use kswatch_config::{AppConfig, ConfigManager, ConfigManagerTrait, StorageBackend};

use crate::commands::{self, replay, show, ReplayOptions};

/// kswatch - KS fingerprint anomaly detection for metric streams
#[derive(Parser, Debug)]
#[command(name = "kswatch")]
#[command(about = "Replay metric samples through the KS fingerprint detector")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: <config dir>/kswatch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Store fingerprints on disk in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Classify the fixed-width windows of a CSV sample file that hold data
    Replay {
        /// CSV with a `metric,timestamp,value` header
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Rotation prefix namespacing the stored fingerprints
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Window width in seconds
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        window: u64,
    },

    /// Print stored fingerprints
    Show {
        /// Rotation prefix namespacing the stored fingerprints
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Only this metric
        #[arg(short, long)]
        metric: Option<String>,
    },
}

pub struct CommandRouter;

impl CommandRouter {
    /// Parse arguments and run the selected command
    pub async fn route() -> Result<()> {
        let cli = Cli::parse();
        Self::execute(cli).await
    }

    pub async fn execute(cli: Cli) -> Result<()> {
        let config = Self::load_config(&cli)?;

        let level: LogLevel = cli
            .log_level
            .as_deref()
            .unwrap_or(config.logging.level.as_str())
            .parse()?;
        logging::init(level);

        let store = commands::open_store(&config.persistence.backend);
        match cli.command {
            Commands::Replay {
                input,
                prefix,
                window,
            } => {
                let options = ReplayOptions {
                    input,
                    prefix,
                    window_secs: window,
                };
                let report = replay::run(&options, &config, store).await?;
                replay::print(&report);
            }
            Commands::Show { prefix, metric } => {
                let set = show::run(&prefix, metric.as_deref(), &config, store).await;
                show::print(&set);
            }
        }
        Ok(())
    }

    fn load_config(cli: &Cli) -> Result<AppConfig> {
        let mut manager = match &cli.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new(),
        };
        let mut config = manager
            .load_config()
            .with_context(|| format!("cannot load {}", manager.config_path().display()))?;
        if let Some(dir) = &cli.data_dir {
            config.persistence.backend = StorageBackend::Disk { path: dir.clone() };
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "kswatch", "replay", "samples.csv", "--prefix", "1h_1m.", "--window", "300",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay {
                input,
                prefix,
                window,
            } => {
                assert_eq!(input, PathBuf::from("samples.csv"));
                assert_eq!(prefix, "1h_1m.");
                assert_eq!(window, 300);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(Cli::try_parse_from(["kswatch", "replay", "x.csv", "--window", "0"]).is_err());
    }

    #[test]
    fn test_data_dir_selects_disk_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "kswatch",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--data-dir",
            dir.path().to_str().unwrap(),
            "show",
        ])
        .unwrap();

        let config = CommandRouter::load_config(&cli).unwrap();
        assert_eq!(
            config.persistence.backend,
            StorageBackend::Disk {
                path: dir.path().to_path_buf()
            }
        );
    }

    #[tokio::test]
    async fn test_replay_to_disk_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("samples.csv");
        let rows: String = (0..120).map(|s| format!("mem,{},{}\n", s, s % 7)).collect();
        std::fs::write(&input, format!("metric,timestamp,value\n{}", rows)).unwrap();
        let data_dir = dir.path().join("data");

        let cli = Cli::try_parse_from([
            "kswatch",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--data-dir",
            data_dir.to_str().unwrap(),
            "replay",
            input.to_str().unwrap(),
            "--prefix",
            "1h_1m.",
        ])
        .unwrap();
        CommandRouter::execute(cli).await.unwrap();

        let config = AppConfig::default();
        let store = commands::open_store(&StorageBackend::Disk { path: data_dir });
        let set = show::run("1h_1m.", Some("mem"), &config, store).await;
        let fingerprints = set.get(&"mem".into()).unwrap();
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].count, 2);
    }
}
