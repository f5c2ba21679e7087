//! Settings for one run: the config file with command-line flags on top.

use crate::args::TailArgs;
use crate::types::AnnotationFormat;
use anyhow::{Context, Result};
use utptrace_runtime::{AnnotationStyle, Config, TailConfig, resolve_config_path};

pub const DEFAULT_COLUMNS: usize = 120;

#[derive(Debug, Clone)]
pub struct Settings {
    pub tail: TailConfig,
    pub annotations: AnnotationFormat,
    /// Width used when the terminal size cannot be queried
    pub fallback_columns: usize,
}

impl Settings {
    pub fn load(
        explicit_config: Option<&str>,
        args: &TailArgs,
        annotations: Option<AnnotationFormat>,
    ) -> Result<Self> {
        let path = resolve_config_path(explicit_config)?;
        let config = Config::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(Self::from_config(&config, args, annotations, |key| {
            std::env::var(key).ok()
        }))
    }

    /// Merge `config` with the flags; `env` looks up environment variables
    pub fn from_config(
        config: &Config,
        args: &TailArgs,
        annotations: Option<AnnotationFormat>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut tail = config.tail_config();
        if let Some(root) = &args.project_root {
            tail.project_root = Some(root.clone());
        }
        if args.telemetry_only {
            tail.telemetry_only = true;
        }
        if args.sidecar {
            tail.write_sidecar = true;
        }

        let annotations = annotations
            .unwrap_or_else(|| resolve_annotation_format(config.display.annotations, &env));

        let fallback_columns = env("COLUMNS")
            .and_then(|columns| columns.trim().parse::<usize>().ok())
            .filter(|columns| *columns > 0)
            .or(config.display.fallback_columns)
            .unwrap_or(DEFAULT_COLUMNS);

        Self {
            tail,
            annotations,
            fallback_columns,
        }
    }
}

/// Pick the annotation syntax for `style`, detecting the CI system when `Auto`
pub fn resolve_annotation_format(
    style: AnnotationStyle,
    env: impl Fn(&str) -> Option<String>,
) -> AnnotationFormat {
    match style {
        AnnotationStyle::Github => AnnotationFormat::Github,
        AnnotationStyle::Azure => AnnotationFormat::Azure,
        AnnotationStyle::Plain => AnnotationFormat::Plain,
        AnnotationStyle::Auto => {
            if env("GITHUB_ACTIONS").is_some_and(|v| v == "true") {
                AnnotationFormat::Github
            } else if env("TF_BUILD").is_some_and(|v| !v.is_empty()) {
                AnnotationFormat::Azure
            } else {
                AnnotationFormat::Plain
            }
        }
    }
}

/// True when the `CI` variable marks a continuous-integration run
pub fn is_ci(env: impl Fn(&str) -> Option<String>) -> bool {
    match env("CI") {
        None => false,
        Some(value) => {
            let value = value.trim();
            !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
        }
    }
}
