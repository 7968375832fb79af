use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use inv_sdk::{Element, FsDocumentSource, Inventory, InventoryConfig, Key};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let db = cli.db.as_deref();
    let mut inventory = open_inventory(&cli.config, db)?;
    match cli.command {
        Command::Get(args) => {
            let element = inventory.get_element(&args.name, args.key.as_slice())?;
            print_element(&cli.format, &label(&args), element.as_deref())
        }
        Command::List(args) => cmd_list(&mut inventory, &cli.format, &args),
        Command::Alteration(args) => {
            let element = inventory.get_alteration(&args.name, args.key.as_slice());
            print_element(&cli.format, &label(&args), element.as_deref())
        }
        Command::Base(args) => {
            let element = inventory.get_base(&args.name, args.key.as_slice());
            print_element(&cli.format, &label(&args), element.as_deref())
        }
        Command::Persist(args) => cmd_persist(&mut inventory, &cli.format, &args, db),
        Command::ClearOverrides => {
            let removed = inventory.delete_all_overrides(db)?;
            match cli.format {
                OutputFormat::Json => println!("{}", json!({ "removed": removed })),
                OutputFormat::Text => println!("{} Removed {} override file(s).", "✓".green().bold(), removed),
            }
            Ok(())
        }
        Command::Files => cmd_files(&inventory, &cli.format),
    }
}

/// Load the configured documents, then the user overrides if a user
/// settings directory is configured.
fn open_inventory(config_path: &Path, db: Option<&str>) -> anyhow::Result<Inventory> {
    debug!(config = %config_path.display(), db, "opening inventory");
    let config = InventoryConfig::from_file(config_path)
        .with_context(|| format!("reading configuration {}", config_path.display()))?;
    let version = config.app_version;
    let has_user_dir = config.user_settings_dir.is_some();
    let mut inventory = Inventory::load(config, Arc::new(FsDocumentSource::new()))
        .context("loading inventory")?;
    if has_user_dir {
        inventory
            .load_user_overrides(version, db)
            .context("loading user overrides")?;
    }
    Ok(inventory)
}

fn label(args: &KeyArgs) -> String {
    Key::of(args.name.as_str(), args.key.as_slice()).to_string()
}

fn print_element(format: &OutputFormat, label: &str, element: Option<&Element>) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&element)?),
        OutputFormat::Text => match element {
            Some(element) => {
                println!("{}", label.cyan().bold());
                print!("{}", inv_codec::write_document(element)?);
            }
            None => println!("{} {}", "not found:".yellow(), label),
        },
    }
    Ok(())
}

fn cmd_list(inventory: &mut Inventory, format: &OutputFormat, args: &KeyArgs) -> anyhow::Result<()> {
    let elements = inventory.get_elements(&args.name, args.key.as_slice())?;
    match format {
        OutputFormat::Json => {
            let all: Vec<&Element> = elements.iter().map(|e| e.as_ref()).collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        OutputFormat::Text => {
            println!("{} element(s) matching {}", elements.len().to_string().bold(), label(args).cyan());
            for element in &elements {
                println!("  {}", inventory.registry().key_of(element).to_string().yellow());
            }
        }
    }
    Ok(())
}

fn cmd_persist(
    inventory: &mut Inventory,
    format: &OutputFormat,
    args: &PersistArgs,
    db: Option<&str>,
) -> anyhow::Result<()> {
    let root = inv_codec::load_file(&args.file)?;
    let selected = inventory.selection().select(&root);
    let nodes: Vec<Element> = if selected.is_empty() {
        vec![root.clone()]
    } else {
        selected.into_iter().cloned().collect()
    };

    let mut written = Vec::new();
    for node in &nodes {
        let path = inventory
            .persist_override(node, db)
            .with_context(|| format!("persisting <{}>", node.name()))?;
        written.push((inventory.registry().key_of(node), path));
    }

    match format {
        OutputFormat::Json => {
            let report: Vec<_> = written
                .iter()
                .map(|(key, path)| json!({ "key": key.to_string(), "file": path.display().to_string() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for (key, path) in &written {
                println!("{} {} → {}", "✓".green().bold(), key.to_string().yellow(), path.display());
            }
        }
    }
    Ok(())
}

fn cmd_files(inventory: &Inventory, format: &OutputFormat) -> anyhow::Result<()> {
    let files = inventory.loaded_files();
    match format {
        OutputFormat::Json => {
            let paths: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        OutputFormat::Text => {
            if files.is_empty() {
                println!("No documents found.");
            }
            for file in files {
                println!("  {}", file.path.display());
            }
        }
    }
    Ok(())
}
