//! Runs every configured target over one extraction of the source.

use crate::config::{Config, TargetSpec};
use crate::ir::{Extraction, SchemaError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Post-processes generated text, e.g. by running an external formatter.
pub trait Formatter {
    fn format(&self, text: &str, language: &str) -> Result<String, String>;
}

/// Leaves text unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Formatter for Passthrough {
    fn format(&self, text: &str, _language: &str) -> Result<String, String> {
        Ok(text.to_string())
    }
}

pub trait Writer {
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// Writes to the filesystem, creating parent directories as needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl Writer for FsWriter {
    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("format failed: {0}")]
    Format(String),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct TargetOutcome {
    pub target: &'static str,
    pub output: PathBuf,
    pub result: Result<(), TargetError>,
}

/// Per-target results, in config order.
#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<TargetOutcome>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Extract `source` once and emit every target in `config`.
///
/// Extraction errors abort before anything is written. Target failures are
/// recorded in the report and do not affect other targets.
pub fn run(
    config: &Config,
    source: &str,
    formatter: &dyn Formatter,
    writer: &dyn Writer,
) -> Result<Report, SchemaError> {
    let extraction = Extraction::from_source(source)?;

    let outcomes = config
        .targets()
        .into_iter()
        .map(|spec| {
            let result = emit_target(&extraction, &spec, formatter, writer);
            match &result {
                Ok(()) => info!(
                    kind = spec.target.name(),
                    output = %spec.output.display(),
                    "generated"
                ),
                Err(e) => warn!(kind = spec.target.name(), error = %e, "target failed"),
            }
            TargetOutcome {
                target: spec.target.name(),
                output: spec.output,
                result,
            }
        })
        .collect();

    Ok(Report { outcomes })
}

fn emit_target(
    extraction: &Extraction,
    spec: &TargetSpec,
    formatter: &dyn Formatter,
    writer: &dyn Writer,
) -> Result<(), TargetError> {
    let model = extraction.schema(spec.target.dialect());
    let text = spec.target.render(&model, spec.options);
    let text = formatter
        .format(&text, spec.target.language())
        .map_err(TargetError::Format)?;

    writer
        .write(&spec.output, &text)
        .map_err(|source| TargetError::Write {
            path: spec.output.clone(),
            source,
        })
}
