//! # Multicode - Editor State Tool
//!
//! Works with the state files the embedded multicode editor persists,
//! without a browser.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show what a saved state contains
//! cargo run -- inspect project.xml
//!
//! # Write each language's code to its own file
//! cargo run -- export project.xml --out build/ --name robot
//!
//! # Build a state file from source files
//! cargo run -- pack main.py ui.js --out project.xml
//! ```

mod saver;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use multicode_core::{
    Collaborators, Config, EditorController, EditorOptions, EditorState, HeadlessHost, Language,
};
use multicode_syntax::SyntaxEngine;
use saver::{DirectorySaver, LogNotifier};

/// Element the headless editor is mounted in.
const HOST_ELEMENT: &str = "editor";

/// Multicode - inspect, export and pack editor state files
#[derive(Parser, Debug)]
#[command(name = "multicode")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the code stored in a state file
    Inspect {
        /// State file to read
        #[arg(value_name = "STATE")]
        state: PathBuf,

        /// Print the buffers as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Save every non-empty buffer as a source file
    Export {
        /// State file to read
        #[arg(value_name = "STATE")]
        state: PathBuf,

        /// Directory to write into
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// File name without extension
        #[arg(short, long, default_value = "program")]
        name: String,
    },

    /// Build a state file from source files, by extension
    Pack {
        /// Source files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// State file to write
        #[arg(short, long, value_name = "STATE")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting multicode v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    match args.command {
        Command::Inspect { state, json } => {
            print!("{}", inspect(&config.editor, &state, json)?);
        }
        Command::Export { state, out, name } => {
            for path in export(&config.editor, &state, &out, &name)? {
                println!("{}", path.display());
            }
        }
        Command::Pack { files, out } => pack(&config.editor, &files, &out)?,
    }

    Ok(())
}

/// Mounts a headless editor that saves into `save_dir`.
fn open_editor(options: &EditorOptions, save_dir: &Path) -> anyhow::Result<EditorController> {
    let host = HeadlessHost::with_elements([HOST_ELEMENT]);
    let collaborators = Collaborators::new(DirectorySaver::new(save_dir), LogNotifier);
    let controller = EditorController::new(
        HOST_ELEMENT,
        options,
        host,
        SyntaxEngine::new(),
        collaborators,
    )?;
    Ok(controller)
}

/// Reads a state file into a fresh editor.
fn load(
    options: &EditorOptions,
    path: &Path,
    save_dir: &Path,
) -> anyhow::Result<(EditorController, EditorState)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let state = EditorState::parse(&source)
        .with_context(|| format!("{} is not an editor state file", path.display()))?;

    let controller = open_editor(options, save_dir)?;
    controller.load_state_from_xml(&state)?;
    Ok((controller, state))
}

fn inspect(options: &EditorOptions, path: &Path, json: bool) -> anyhow::Result<String> {
    let (controller, state) = load(options, path, Path::new("."))?;

    if json {
        let mut map = serde_json::Map::new();
        for entry in &state.entries {
            let code = match entry.id.parse::<Language>() {
                Ok(lang) => controller.buffer(lang),
                Err(_) => controller.foreign(&entry.id).unwrap_or_default(),
            };
            map.insert(entry.id.clone(), serde_json::Value::String(code));
        }
        return Ok(format!("{}\n", serde_json::to_string_pretty(&map)?));
    }

    let mut out = String::new();
    for descriptor in controller.languages().iter() {
        if descriptor.value.is_workspace_owned() {
            continue;
        }
        let code = controller.buffer(descriptor.value);
        out.push_str(&format!(
            "{:<12} {:>5} lines {:>7} bytes\n",
            descriptor.display_text,
            code.lines().count(),
            code.len()
        ));
    }
    for entry in &state.entries {
        if entry.id.parse::<Language>().is_err() {
            out.push_str(&format!("{:<12} (unknown language)\n", entry.id));
        }
    }
    Ok(out)
}

fn export(
    options: &EditorOptions,
    path: &Path,
    out: &Path,
    name: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let (controller, _) = load(options, path, out)?;

    let languages: Vec<_> = controller
        .languages()
        .iter()
        .filter(|d| !d.value.is_workspace_owned())
        .map(|d| (d.value, d.file_extension.clone()))
        .collect();

    let mut written = Vec::new();
    for (language, extension) in languages {
        if controller.buffer(language).is_empty() {
            continue;
        }
        controller.change_language(language)?;
        controller
            .save_code(name)
            .with_context(|| format!("Failed to export {language}"))?;
        written.push(out.join(format!("{}{}", name.trim(), extension)));
    }

    if written.is_empty() {
        tracing::warn!("{} holds no code", path.display());
    }
    Ok(written)
}

fn pack(options: &EditorOptions, files: &[PathBuf], out: &Path) -> anyhow::Result<()> {
    let controller = open_editor(options, Path::new("."))?;

    for file in files {
        let extension = file.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(descriptor) = controller.languages().by_extension(extension) else {
            bail!("No editable language uses the extension of {}", file.display());
        };
        if descriptor.value.is_workspace_owned() {
            bail!("{} code is kept by the block workspace", descriptor.display_text);
        }
        let code = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        tracing::info!("Packing {} as {}", file.display(), descriptor.value);
        controller.add_code_to_editor(code, descriptor.value);
    }

    std::fs::write(out, controller.state_as_xml_string())
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(())
}
