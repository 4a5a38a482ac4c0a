pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
use crate::domain::model::TimelineYear;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "historic-borders")]
#[command(about = "Historical country borders on a timeline: browse or export per-year borders and labels")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override [dataset] base_url
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log CPU and memory per pipeline phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch, partition and write borders/labels for one or more years
    Export(ExportArgs),
    /// Scrub the timeline interactively from stdin
    Browse(BrowseArgs),
    /// List the timeline years with their labels and dataset tokens
    Years,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Years to export, e.g. `--years=-2000,400`
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub years: Vec<TimelineYear>,

    /// Export every year on the timeline
    #[arg(long, conflicts_with = "years")]
    pub all: bool,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Comma-separated output formats: geojson, csv
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Bundle each year's files into one zip archive
    #[arg(long)]
    pub zip: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct BrowseArgs {
    /// Starting timeline index (clamped to the timeline)
    #[arg(long)]
    pub index: Option<usize>,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// File configuration (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.dataset.base_url = base_url.clone();
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }

        match &self.command {
            Command::Export(args) => {
                if let Some(output_path) = &args.output_path {
                    config.load.output_path = output_path.clone();
                }
                if !args.formats.is_empty() {
                    config.load.output_formats = args.formats.clone();
                }
                if args.zip {
                    config.load.compress = true;
                }
            }
            Command::Browse(args) => {
                if let Some(index) = args.index {
                    config.timeline.initial_index = Some(index);
                }
            }
            Command::Years => {}
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_export_overrides() {
        let cli = CliConfig::parse_from([
            "historic-borders",
            "export",
            "--years=-2000,400",
            "--formats",
            "geojson,csv",
            "--zip",
            "--output-path",
            "./maps",
        ]);

        let Command::Export(args) = &cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.years, vec![-2000, 400]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.output_path(), "./maps");
        assert!(config.compress());
        assert_eq!(config.load.output_formats, vec!["geojson", "csv"]);
    }

    #[test]
    fn test_browse_index_and_global_flags() {
        let cli = CliConfig::parse_from([
            "historic-borders",
            "browse",
            "--index",
            "12",
            "--base-url",
            "http://localhost:9000/",
            "--monitor",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.timeline.initial_index, Some(12));
        assert_eq!(config.dataset_base_url(), "http://localhost:9000/");
        assert!(config.monitoring_enabled());
    }
}
