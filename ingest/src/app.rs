//! Core application

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;

use crate::core::cli::{self, Commands, InputFormat};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::data::cache::SharedSeenTraces;
use crate::data::types::ResourceSpan;
use crate::domain::traces::{OtelIngestProcessor, count_spans};
use crate::utils::otlp::{resource_spans_from_json, resource_spans_from_proto};

pub struct CoreApp {
    pub processor: OtelIngestProcessor,
    pub seen_traces: SharedSeenTraces,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(app = APP_NAME, "Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(&config);

        match command {
            Commands::Convert {
                input,
                format,
                pretty,
            } => app.convert(&input, format, pretty),
            Commands::Count { input } => Self::count(&input),
        }
    }

    fn init(config: &AppConfig) -> Self {
        let processor = OtelIngestProcessor::new(config.ingest.clone());
        let seen_traces = SharedSeenTraces::new(&config.seen_traces);
        tracing::debug!(
            max_entries = config.seen_traces.max_entries,
            ttl_secs = config.seen_traces.ttl_secs,
            "Seen-traces cache initialized"
        );
        Self {
            processor,
            seen_traces,
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries the converted events
        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn convert(mut self, input: &Path, format: InputFormat, pretty: bool) -> Result<()> {
        let resource_spans = Self::load_resource_spans(input, format)?;
        let events = self
            .processor
            .process(&resource_spans, &mut self.seen_traces)
            .with_context(|| format!("Failed to convert {}", input.display()))?;

        tracing::info!(
            input = %input.display(),
            resource_spans = resource_spans.len(),
            events = events.len(),
            "Converted spans"
        );

        let output = if pretty {
            serde_json::to_string_pretty(&events)?
        } else {
            serde_json::to_string(&events)?
        };
        println!("{output}");
        Ok(())
    }

    fn count(input: &Path) -> Result<()> {
        let payload = Self::read_json(input)?;
        println!("{}", count_spans(&payload));
        Ok(())
    }

    fn load_resource_spans(input: &Path, format: InputFormat) -> Result<Vec<ResourceSpan>> {
        match format {
            InputFormat::Json => {
                let payload = Self::read_json(input)?;
                resource_spans_from_json(payload)
                    .with_context(|| format!("Invalid OTLP JSON payload: {}", input.display()))
            }
            InputFormat::Protobuf => {
                let bytes = fs::read(input)
                    .with_context(|| format!("Failed to read input file: {}", input.display()))?;
                let request = ExportTraceServiceRequest::decode(bytes.as_slice())
                    .with_context(|| format!("Invalid OTLP protobuf payload: {}", input.display()))?;
                Ok(resource_spans_from_proto(&request))
            }
        }
    }

    fn read_json(input: &Path) -> Result<serde_json::Value> {
        let content = fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {}", input.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON: {}", input.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn app() -> CoreApp {
        CoreApp::init(&AppConfig::default())
    }

    #[test]
    fn test_load_json_and_protobuf_inputs() {
        let mut json_file = tempfile::NamedTempFile::new().unwrap();
        write!(json_file, r#"{{"resourceSpans": [{{"scopeSpans": [{{"spans": []}}]}}]}}"#).unwrap();
        let spans = CoreApp::load_resource_spans(json_file.path(), InputFormat::Json).unwrap();
        assert_eq!(spans.len(), 1);

        let request = ExportTraceServiceRequest {
            resource_spans: vec![Default::default(), Default::default()],
        };
        let mut proto_file = tempfile::NamedTempFile::new().unwrap();
        proto_file.write_all(&request.encode_to_vec()).unwrap();
        let spans = CoreApp::load_resource_spans(proto_file.path(), InputFormat::Protobuf).unwrap();
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_invalid_input_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = CoreApp::load_resource_spans(file.path(), InputFormat::Json).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse JSON"));
    }

    #[test]
    fn test_convert_rejects_foreign_sdk_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"resourceSpans": [{{"scopeSpans": [{{"scope": {{"name": "langfuse-sdk", "attributes": [{{"key": "public_key", "value": {{"stringValue": "pk-lf-other"}}}}]}}, "spans": []}}]}}]}}"#
        )
        .unwrap();
        let err = app()
            .convert(file.path(), InputFormat::Json, false)
            .unwrap_err();
        assert!(format!("{err:#}").contains("public key mismatch"));
    }
}
