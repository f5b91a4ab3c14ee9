//! `tablegen.yml` loading and validation.

use crate::dialect::Dialect;
use crate::emit::{EmitOptions, Target, ZodVariant};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "tablegen.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing `input` path")]
    MissingInput,
    #[error("no output targets configured")]
    NoTargets,
    #[error("{target}: output '{path}' must end with {expected}")]
    BadSuffix {
        target: &'static str,
        path: String,
        expected: &'static str,
    },
    #[error("{0}: `variant` is only supported for zod")]
    UnsupportedVariant(&'static str),
}

/// Per-library validator output.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ValidatorTarget {
    pub output: PathBuf,
    #[serde(default)]
    pub comment: bool,
    #[serde(default, rename = "type")]
    pub include_type: bool,
    #[serde(default, rename = "relation")]
    pub include_relations: bool,
    #[serde(default)]
    pub variant: Option<ZodVariant>,
}

impl ValidatorTarget {
    pub fn options(&self) -> EmitOptions {
        EmitOptions {
            comment: self.comment,
            include_type: self.include_type,
            include_relations: self.include_relations,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MermaidTarget {
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub input: Option<PathBuf>,
    pub zod: Option<ValidatorTarget>,
    pub valibot: Option<ValidatorTarget>,
    pub arktype: Option<ValidatorTarget>,
    pub effect: Option<ValidatorTarget>,
    pub mermaid: Option<MermaidTarget>,
}

/// A fully resolved output: what to render, with which flags, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub target: Target,
    pub options: EmitOptions,
    pub output: PathBuf,
}

impl Config {
    /// Read and validate a config file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve(root))
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The source file to read. A config may leave it out when the caller
    /// supplies one through [`Config::with_input`].
    pub fn input(&self) -> Result<&Path, ConfigError> {
        self.input.as_deref().ok_or(ConfigError::MissingInput)
    }

    /// Replace the configured input, e.g. with a command-line override.
    pub fn with_input(mut self, input: PathBuf) -> Self {
        self.input = Some(input);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let validators = self.validators();
        if validators.is_empty() && self.mermaid.is_none() {
            return Err(ConfigError::NoTargets);
        }

        for (dialect, target) in validators {
            if dialect != Dialect::Zod && target.variant.is_some() {
                return Err(ConfigError::UnsupportedVariant(dialect.name()));
            }
            check_suffix(dialect.name(), &target.output, &["ts"], ".ts")?;
        }
        if let Some(mermaid) = &self.mermaid {
            check_suffix("mermaid", &mermaid.output, &["md", "mmd"], ".md or .mmd")?;
        }
        Ok(())
    }

    fn validators(&self) -> Vec<(Dialect, &ValidatorTarget)> {
        [
            (Dialect::Zod, &self.zod),
            (Dialect::Valibot, &self.valibot),
            (Dialect::ArkType, &self.arktype),
            (Dialect::Effect, &self.effect),
        ]
        .into_iter()
        .filter_map(|(dialect, target)| target.as_ref().map(|t| (dialect, t)))
        .collect()
    }

    fn resolve(mut self, root: &Path) -> Self {
        self.input = self.input.map(|p| resolve_path(root, &p));
        for target in [
            &mut self.zod,
            &mut self.valibot,
            &mut self.arktype,
            &mut self.effect,
        ]
        .into_iter()
        .flatten()
        {
            target.output = resolve_path(root, &target.output);
        }
        if let Some(mermaid) = &mut self.mermaid {
            mermaid.output = resolve_path(root, &mermaid.output);
        }
        self
    }

    /// Configured targets in fixed order: zod, valibot, arktype, effect, mermaid.
    pub fn targets(&self) -> Vec<TargetSpec> {
        let mut specs: Vec<TargetSpec> = self
            .validators()
            .into_iter()
            .map(|(dialect, t)| TargetSpec {
                target: match dialect {
                    Dialect::Zod => Target::Zod(t.variant.unwrap_or_default()),
                    Dialect::Valibot => Target::Valibot,
                    Dialect::ArkType => Target::ArkType,
                    Dialect::Effect => Target::Effect,
                },
                options: t.options(),
                output: t.output.clone(),
            })
            .collect();

        if let Some(mermaid) = &self.mermaid {
            specs.push(TargetSpec {
                target: Target::Mermaid {
                    fenced: has_extension(&mermaid.output, "md"),
                },
                options: EmitOptions::default(),
                output: mermaid.output.clone(),
            });
        }
        specs
    }
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

fn check_suffix(
    target: &'static str,
    path: &Path,
    allowed: &[&str],
    expected: &'static str,
) -> Result<(), ConfigError> {
    if allowed.iter().any(|ext| has_extension(path, ext)) {
        Ok(())
    } else {
        Err(ConfigError::BadSuffix {
            target,
            path: path.display().to_string(),
            expected,
        })
    }
}
