use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_PROJECT_ID, ENV_PUBLIC_KEY, ENV_SEEN_TRACES_MAX_ENTRIES,
    ENV_SEEN_TRACES_TTL_SECS,
};

#[derive(Parser)]
#[command(name = "otel-ingest")]
#[command(
    version,
    about = "Convert OTel trace exports into Langfuse ingestion events",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Public key of the ingesting project (checked against Langfuse SDK scopes)
    #[arg(long, global = true, env = ENV_PUBLIC_KEY)]
    pub public_key: Option<String>,

    /// ID of the ingesting project
    #[arg(long, global = true, env = ENV_PROJECT_ID)]
    pub project_id: Option<String>,

    /// Maximum number of trace IDs remembered between batches
    #[arg(long, global = true, env = ENV_SEEN_TRACES_MAX_ENTRIES)]
    pub seen_traces_max_entries: Option<u64>,

    /// Seconds a remembered trace ID stays valid (0 = no expiry)
    #[arg(long, global = true, env = ENV_SEEN_TRACES_TTL_SECS)]
    pub seen_traces_ttl_secs: Option<u64>,
}

/// Wire encoding of an input file
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// `{"resourceSpans": [...]}` or a bare array of resource spans
    #[default]
    Json,
    /// Binary `ExportTraceServiceRequest`
    Protobuf,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Convert an exported trace payload into ingestion events (printed as JSON)
    Convert {
        /// Input file
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Input encoding
        #[arg(long, short = 'f', value_enum, default_value_t = InputFormat::Json)]
        format: InputFormat,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Count the spans in a JSON payload (-1 if the payload is malformed)
    Count {
        /// Input file
        #[arg(long, short = 'i')]
        input: PathBuf,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub public_key: Option<String>,
    pub project_id: Option<String>,
    pub seen_traces_max_entries: Option<u64>,
    pub seen_traces_ttl_secs: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        public_key: cli.public_key,
        project_id: cli.project_id,
        seen_traces_max_entries: cli.seen_traces_max_entries,
        seen_traces_ttl_secs: cli.seen_traces_ttl_secs,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_with_globals() {
        let cli = Cli::try_parse_from([
            "otel-ingest",
            "convert",
            "--input",
            "spans.json",
            "--public-key",
            "pk-lf-1",
            "--format",
            "protobuf",
        ])
        .unwrap();
        assert_eq!(cli.public_key.as_deref(), Some("pk-lf-1"));
        match cli.command {
            Commands::Convert { input, format, pretty } => {
                assert_eq!(input, PathBuf::from("spans.json"));
                assert_eq!(format, InputFormat::Protobuf);
                assert!(!pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["otel-ingest"]).is_err());
    }
}
