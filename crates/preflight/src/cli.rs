//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Preflight - check installation recipes against a host before installing
#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to preflight.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter recipes down to the ones compatible with a host
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Recipe catalog (YAML)
    #[arg(short, long)]
    pub recipes: Utf8PathBuf,

    /// Host snapshot (YAML or JSON)
    #[arg(long)]
    pub host: Utf8PathBuf,

    /// Evaluate up to N recipes at once (overrides config)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "preflight",
            "-vv",
            "check",
            "--recipes",
            "recipes.yaml",
            "--host",
            "host.json",
            "-j",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        let Commands::Check(args) = cli.command;
        assert_eq!(args.recipes.as_str(), "recipes.yaml");
        assert_eq!(args.host.as_str(), "host.json");
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.format, OutputFormat::Human);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "preflight",
            "check",
            "--recipes",
            "r.yaml",
            "--host",
            "h.yaml",
            "--config",
            "custom.yaml",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref().map(|p| p.as_str()), Some("custom.yaml"));
        let Commands::Check(args) = cli.command;
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_check_requires_inputs() {
        assert!(Cli::try_parse_from(["preflight", "check", "--recipes", "r.yaml"]).is_err());
    }
}
