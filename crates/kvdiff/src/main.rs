//! kvdiff - compare JSON objects key by key

mod cli;
mod config;
mod logging;
mod render;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, OutputFormat};
use config::{Config, Settings};
use kvdiff_core::{mapping_from_value, ChangeKind, DiffEngine, Mapping};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logger();

    let config = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, &config);
    let mappings = load_mappings(&args.files)?;

    let output = run(&args, settings, &mappings)?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn load_mapping(path: &Path) -> Result<Mapping> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_mapping(&content).with_context(|| format!("{} must hold a JSON object", path.display()))
}

fn parse_mapping(content: &str) -> Result<Mapping> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    mapping_from_value(value).context("expected a JSON object")
}

fn load_mappings(paths: &[impl AsRef<Path>]) -> Result<Vec<Mapping>> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let mapping = load_mapping(path)?;
            tracing::debug!(path = %path.display(), keys = mapping.len(), "loaded mapping");
            Ok(mapping)
        })
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// Produce the output text for the parsed arguments
fn run(args: &Args, settings: Settings, mappings: &[Mapping]) -> Result<String> {
    let engine = DiffEngine::new();

    if args.flat {
        let [alpha, beta] = mappings else {
            bail!("--flat compares exactly two files, got {}", mappings.len());
        };
        let changes = engine.diff(alpha, beta);
        return match settings.format {
            OutputFormat::Json => to_json(&changes, settings.pretty),
            OutputFormat::Text => Ok(render::render_changes(&changes)),
        };
    }

    let result = engine.results(mappings)?;

    if let (Some(label), Some(index)) = (args.pairing.as_deref(), args.index) {
        let value = result.get_single(label, index, args.field.as_deref())?;
        return match (settings.format, &value) {
            (OutputFormat::Text, serde_json::Value::String(s)) => Ok(s.clone()),
            _ => to_json(&value, settings.pretty),
        };
    }

    if let Some(filter) = args.only {
        let kind = ChangeKind::from(filter);
        let view = result.filter_by_action(kind, !settings.keys_only);
        return match settings.format {
            OutputFormat::Json => to_json(&view, settings.pretty),
            OutputFormat::Text => Ok(render::render_view(kind, &view)),
        };
    }

    match settings.format {
        OutputFormat::Json if settings.pretty => Ok(result.to_json_pretty()?),
        OutputFormat::Json => Ok(result.to_json()?),
        OutputFormat::Text => Ok(render::render_result(&result)),
    }
}
