//! Command-line interface for kws-harness.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run and profile the generated keyword-spotting classifier.
#[derive(Parser, Debug)]
#[command(name = "kws-harness")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to optional YAML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Engine to drive.
    #[arg(short, long, global = true, value_enum, default_value_t = EngineKind::Dummy)]
    pub engine: EngineKind,

    #[command(subcommand)]
    pub command: Commands,
}

/// Engine backing the model wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Deterministic pure-Rust engine configured from the `dummy` section.
    Dummy,
    /// Generated model linked into the binary (feature `linked-engine`).
    Linked,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print ports, shapes and metadata.
    Info {
        /// Metadata keys to look up.
        #[arg(short, long)]
        metadata: Vec<String>,
    },

    /// Run one prediction on an input file.
    Predict {
        /// Input JSON: { "data": [...] }.
        #[arg(short, long)]
        input: PathBuf,

        /// Output format (json, pretty).
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Time repeated predictions.
    Bench {
        /// Timed iterations (overrides config).
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from([
            "kws-harness",
            "predict",
            "--input",
            "frame.json",
            "--format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(cli.engine, EngineKind::Dummy);
        match cli.command {
            Commands::Predict { input, format } => {
                assert_eq!(input, PathBuf::from("frame.json"));
                assert_eq!(format, "pretty");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kws-harness",
            "bench",
            "-n",
            "20",
            "--engine",
            "linked",
            "--config",
            "kws.yaml",
        ])
        .unwrap();
        assert_eq!(cli.engine, EngineKind::Linked);
        assert_eq!(cli.config, Some(PathBuf::from("kws.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Bench {
                iterations: Some(20)
            }
        ));
    }
}
