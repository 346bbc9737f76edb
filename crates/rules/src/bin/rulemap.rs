//! rulemap: index ruleset projects and query them from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use rulemap_core::config::{
    load_dotenv, DEFAULT_LOCALE, DEFAULT_RULE_FILES_PATTERN, DEFAULT_TRANSLATION_FILES_PATTERN,
};
use rulemap_core::{ByteRange, RuleType, Settings};
use rulemap_rules::loader::{discover_project_files, line_endings, LoadEvent};
use rulemap_rules::{find_anchor, resolve_at_range, RulesetLoader};

// ── CLI ─────────────────────────────────────────────────────────────

/// Cross-reference index for ruleset projects.
#[derive(Parser, Debug)]
#[command(name = "rulemap", version, about)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Glob for ruleset files, relative to a project root.
    #[arg(long, global = true, env = "RULEMAP_RULE_FILES_PATTERN", default_value = DEFAULT_RULE_FILES_PATTERN)]
    rule_files: String,

    /// Glob for language files, relative to a project root.
    #[arg(long, global = true, env = "RULEMAP_LANGUAGE_PATTERN", default_value = DEFAULT_TRANSLATION_FILES_PATTERN)]
    language_files: String,

    /// Locale used for translation lookups.
    #[arg(long, global = true, env = "RULEMAP_LOCALE", default_value = DEFAULT_LOCALE)]
    locale: String,

    /// Report ranges against the original CRLF text.
    #[arg(long, global = true, env = "RULEMAP_CRLF_FIX")]
    crlf_fix: bool,

    /// Loader threads (0 = one per core).
    #[arg(long, global = true, env = "RULEMAP_MAX_PARALLEL", default_value_t = 0)]
    max_parallel: usize,
}

impl From<SettingsArgs> for Settings {
    fn from(args: SettingsArgs) -> Self {
        Settings {
            rule_files_pattern: args.rule_files,
            translation_files_pattern: args.language_files,
            locale: args.locale,
            crlf_fix: args.crlf_fix,
            max_parallel: args.max_parallel,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load project roots and print a summary.
    Index {
        #[arg(long = "root", required = true)]
        roots: Vec<PathBuf>,
    },
    /// List the definitions a name resolves to.
    Find {
        #[arg(long)]
        root: PathBuf,
        name: String,
        /// Rule type of the entry the name was found in.
        #[arg(long, requires = "source_key")]
        source_type: Option<String>,
        /// Dotted field path the name was found at.
        #[arg(long, requires = "source_type")]
        source_key: Option<String>,
    },
    /// Resolve the token at a byte range of a file.
    Resolve {
        file: PathBuf,
        start: usize,
        end: usize,
    },
    /// Print the range of the node anchored as NAME (`&NAME`).
    Anchor { file: PathBuf, name: String },
    /// Look up a translation key.
    Translate {
        #[arg(long)]
        root: PathBuf,
        key: String,
    },
    /// Load a project and reload files as they change, until Ctrl-C.
    Watch {
        #[arg(long)]
        root: PathBuf,
    },
}

// ── Main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from(cli.settings);
    settings.log_summary();

    match cli.command {
        Command::Index { roots } => {
            let loader = load_roots(settings, &roots)?;
            let tree = loader.tree();
            for root in &roots {
                let (names, files, variables) = tree.with_index(root, |index| {
                    (index.name_count(), index.file_count(), index.variables().len())
                });
                println!(
                    "{}: {files} files, {names} names, {variables} variables",
                    root.display()
                );
            }
        }
        Command::Find {
            root,
            name,
            source_type,
            source_key,
        } => {
            let loader = load_roots(settings, std::slice::from_ref(&root))?;
            let source = source_type
                .zip(source_key)
                .map(|(rule_type, key)| RuleType::new(rule_type, key));
            let found = loader.tree().find_definitions(&root, &name, source.as_ref());
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Resolve { file, start, end } => {
            let found = resolve_file(&file, ByteRange::new(start, end))?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Anchor { file, name } => {
            let found = anchor_in_file(&file, &name)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Translate { root, key } => {
            let loader = load_roots(settings, std::slice::from_ref(&root))?;
            println!("{}", loader.tree().translation(&root, &key));
        }
        Command::Watch { root } => {
            let mut loader = load_roots(settings, std::slice::from_ref(&root))?;
            loader.watch(&root, |event| {
                if let LoadEvent::FileLoaded(progress) = event {
                    info!(path = %progress.relative_path.display(), "reloaded");
                }
            })?;
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("shutting down");
        }
    }

    Ok(())
}

fn load_roots(settings: Settings, roots: &[PathBuf]) -> Result<RulesetLoader> {
    let projects = roots
        .iter()
        .map(|root| {
            discover_project_files(root, &settings)
                .with_context(|| format!("failed to scan {}", root.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let loader = RulesetLoader::new(settings);
    let report = loader.load(&projects, |event| match event {
        LoadEvent::FileLoaded(progress) => tracing::debug!(
            path = %progress.relative_path.display(),
            done = progress.files_done,
            total = progress.total_files,
            "loaded file"
        ),
        LoadEvent::Complete => info!("load complete"),
    })?;
    for failed in report.results.iter().filter(|r| !r.is_loaded()) {
        tracing::warn!(path = %failed.path.display(), status = ?failed.status, "file not loaded");
    }
    Ok(loader)
}

/// Resolve a range given in the file's own offsets.
fn resolve_file(file: &Path, range: ByteRange) -> Result<Option<RuleType>> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let normalized = line_endings::normalize(&text);
    let range = if line_endings::uses_crlf(&text) {
        line_endings::normalize_range(&text, range)
    } else {
        range
    };
    Ok(resolve_at_range(&normalized, range))
}

/// Anchor range in the file's own offsets.
fn anchor_in_file(file: &Path, name: &str) -> Result<Option<ByteRange>> {
    let text = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let normalized = line_endings::normalize(&text);
    let found = find_anchor(&normalized, name);
    Ok(if line_endings::uses_crlf(&text) {
        found.map(|range| line_endings::adjust_range(&normalized, range))
    } else {
        found
    })
}
