use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pulsecfg_core::binding::{FlushOutcome, FlushScope};
use pulsecfg_core::{
    codec, markup, render, sample, BindMode, BindingEngine, Document, EditorConfig, EntitySlot,
    FieldBinding, FormState, RawValue, ReferenceGraph, Scope, Section, ValueKind,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod exporter;
mod viewer;

#[derive(Debug, Parser)]
#[command(name = "pulsecfg")]
#[command(about = "Schema-driven editor for uptime monitor configuration files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, value_enum, default_value = "batched", global = true)]
    bind_mode: BindModeArg,

    #[arg(long, default_value_t = 50, global = true)]
    token_length: usize,

    #[arg(long, default_value_t = 3000, global = true)]
    notice_ttl_ms: u64,

    #[arg(long, default_value_t = 8, global = true)]
    notice_capacity: usize,

    /// Timestamped backups kept next to an overwritten output file.
    #[arg(long, default_value_t = 5, global = true)]
    keep_backups: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the bundled example configuration.
    Example,
    /// Import a file, summarize it and report dangling references.
    Check { file: PathBuf },
    /// Render one section as HTML markup.
    Render {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "general")]
        tab: Tab,
    },
    Graph {
        file: PathBuf,
        /// Restrict to what this status page reaches.
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, value_enum, default_value = "dot")]
        format: GraphFormat,
    },
    /// Write one field through the binding engine and export the result.
    Set {
        file: PathBuf,
        #[arg(long)]
        path: String,
        #[arg(long)]
        value: String,
        #[arg(long, value_enum, default_value = "text")]
        kind: KindArg,
        #[arg(long)]
        empty_as_absent: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Normalize a file and write it out.
    Export {
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Browse a file in the terminal.
    View {
        file: Option<PathBuf>,
        /// Where `w` writes the export.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BindModeArg {
    Immediate,
    Batched,
}

impl From<BindModeArg> for BindMode {
    fn from(arg: BindModeArg) -> Self {
        match arg {
            BindModeArg::Immediate => BindMode::Immediate,
            BindModeArg::Batched => BindMode::Batched,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tab {
    General,
    Monitors,
    Groups,
    StatusPages,
    Notifications,
    Agents,
}

impl From<Tab> for Section {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::General => Section::General,
            Tab::Monitors => Section::Monitors,
            Tab::Groups => Section::Groups,
            Tab::StatusPages => Section::StatusPages,
            Tab::Notifications => Section::Notifications,
            Tab::Agents => Section::RemoteAgents,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Text,
    Number,
    Boolean,
    Csv,
}

impl From<KindArg> for ValueKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Text => ValueKind::Text,
            KindArg::Number => ValueKind::Number,
            KindArg::Boolean => ValueKind::Boolean,
            KindArg::Csv => ValueKind::List,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GraphFormat {
    Dot,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let config = EditorConfig {
        bind_mode: cli.bind_mode.into(),
        token_length: cli.token_length,
        notice_ttl: Duration::from_millis(cli.notice_ttl_ms),
        notice_capacity: cli.notice_capacity,
        ..EditorConfig::default()
    };

    match cli.command {
        Command::Example => {
            print!("{}", sample::SAMPLE_TOML);
        }
        Command::Check { file } => {
            let doc = load(&file).await?;
            println!("{}", serde_json::to_string_pretty(&doc.counts())?);
            let dangling = doc.dangling_references();
            if !dangling.is_empty() {
                for reference in &dangling {
                    println!("dangling: {reference}");
                }
                bail!("{} dangling reference(s) in {}", dangling.len(), file.display());
            }
        }
        Command::Render { file, tab } => {
            let doc = load(&file).await?;
            println!("{}", markup::to_html(&render::section(&doc, tab.into()))?);
        }
        Command::Graph { file, scope, format } => {
            let doc = load(&file).await?;
            let scope = match scope.as_deref() {
                Some(id) => Scope::StatusPage(id),
                None => Scope::All,
            };
            let graph = ReferenceGraph::build(&doc).select(scope);
            match format {
                GraphFormat::Dot => print!("{}", graph.to_dot()),
                GraphFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
            }
        }
        Command::Set {
            file,
            path,
            value,
            kind,
            empty_as_absent,
            output,
        } => {
            let mut doc = load(&file).await?;
            let mut binding = FieldBinding::parse(&path)?.with_kind(kind.into());
            if empty_as_absent {
                binding = binding.empty_as_absent();
            }
            if EntitySlot::from_id_path(&binding.path).is_some() {
                binding = binding.entity_id();
            }
            set_field(&mut doc, config.bind_mode, &binding, RawValue::Text(value))?;
            emit(&doc, output.as_deref(), &config, cli.keep_backups)?;
        }
        Command::Export { file, output } => {
            let doc = load(&file).await?;
            emit(&doc, output.as_deref(), &config, cli.keep_backups)?;
        }
        Command::View { file, output } => {
            let text = match &file {
                Some(file) => Some(read(file).await?),
                None => None,
            };
            viewer::run_viewer(config, text, output, cli.keep_backups).await?;
        }
    }

    Ok(())
}

async fn read(file: &Path) -> Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))
}

async fn load(file: &Path) -> Result<Document> {
    let text = read(file).await?;
    let doc = codec::import(&text).with_context(|| format!("Failed to parse TOML in {}", file.display()))?;
    Ok(doc)
}

fn set_field(doc: &mut Document, mode: BindMode, binding: &FieldBinding, raw: RawValue) -> Result<()> {
    let engine = BindingEngine::new(mode);
    let mut surface = FormState::new();
    surface.set(&binding.path, raw);

    let mut dirty = engine.change(doc, &surface, binding)?;
    if let FlushOutcome::Applied(report) = engine.flush(doc, &surface, FlushScope::All) {
        if let Some((path, err)) = report.rejected.into_iter().next() {
            bail!("{path}: {err}");
        }
        dirty.merge(report.dirty);
    }
    info!(path = %binding.path, sections = dirty.iter().count(), "field updated");
    Ok(())
}

fn emit(doc: &Document, output: Option<&Path>, config: &EditorConfig, keep_backups: usize) -> Result<()> {
    let dangling = doc.dangling_references().len();
    if dangling > 0 {
        warn!(dangling, "exporting a document with dangling references");
    }
    let contents = codec::export(doc)?;
    match output {
        Some(target) => {
            let target = if target.is_dir() {
                target.join(&config.export_file_name)
            } else {
                target.to_path_buf()
            };
            let written = exporter::write_export(&target, &contents, Utc::now(), keep_backups)?;
            eprintln!("Configuration exported as {}", written.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}
