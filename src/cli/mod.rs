//! FR-009: CLI subcommands — validate, show, normalize, init.

use crate::core::store::{SettingsStore, DEFAULT_CONFIG};
use crate::core::types::{Category, Value};
use crate::core::{persist, writer};
use clap::Subcommand;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a configuration file and report what it resolves to
    Validate {
        /// Configuration file (default: per-user preferences)
        file: Option<PathBuf>,
    },

    /// Dump resolved items as JSON, references inlined
    Show {
        /// Configuration file (default: per-user preferences)
        file: Option<PathBuf>,

        /// Only this category (tool, process, bounds, task)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Re-serialize a configuration through default factoring
    Normalize {
        /// Configuration file (default: per-user preferences)
        file: Option<PathBuf>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the built-in default configuration
    Init {
        /// Target file (default: per-user preferences)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Validate { file } => cmd_validate(&resolve_file(file)?),
        Commands::Show { file, category } => {
            cmd_show(&resolve_file(file)?, category.as_deref())
        }
        Commands::Normalize { file, output } => {
            cmd_normalize(&resolve_file(file)?, output.as_deref())
        }
        Commands::Init { path, force } => cmd_init(&resolve_file(path)?, force),
    }
}

fn resolve_file(file: Option<PathBuf>) -> Result<PathBuf, String> {
    match file {
        Some(path) => Ok(path),
        None => persist::config_file_path(None)
            .ok_or_else(|| "cannot determine the user configuration directory".to_string()),
    }
}

fn load_store(path: &Path) -> Result<SettingsStore, String> {
    let text = persist::read_config(path)?;
    let mut store = SettingsStore::new();
    if !store.load_from_text(&text) {
        return Err(format!("{}: malformed configuration", path.display()));
    }
    Ok(store)
}

fn cmd_validate(path: &Path) -> Result<(), String> {
    let store = load_store(path)?;
    println!(
        "OK: {} ({} tools, {} processes, {} bounds, {} tasks)",
        path.display(),
        store.tools().len(),
        store.processes().len(),
        store.bounds().len(),
        store.tasks().len()
    );
    Ok(())
}

fn cmd_show(path: &Path, category: Option<&str>) -> Result<(), String> {
    let store = load_store(path)?;

    let selected: Vec<Category> = match category {
        Some(name) => vec![Category::from_name(name)
            .ok_or_else(|| format!("unknown category '{}'", name))?],
        None => Category::ALL.to_vec(),
    };

    let mut dump: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for cat in selected {
        dump.insert(cat.prefix(), store.category_entries(cat));
    }
    let json = serde_json::to_string_pretty(&dump)
        .map_err(|e| format!("JSON serialize error: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn cmd_normalize(path: &Path, output: Option<&Path>) -> Result<(), String> {
    let store = load_store(path)?;
    let text = writer::config_text(
        &store.tools(),
        &store.processes(),
        &store.bounds(),
        &store.tasks(),
    );
    match output {
        Some(out) => {
            persist::write_config(out, &text)?;
            println!("Wrote {}", out.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force)", path.display()));
    }
    persist::write_config(path, DEFAULT_CONFIG)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
