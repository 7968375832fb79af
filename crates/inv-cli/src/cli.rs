use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "inv",
    about = "Element inventory: query layered, derived configuration elements",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Inventory configuration file
    #[arg(short, long, global = true, default_value = "inventory.toml")]
    pub config: PathBuf,

    /// Database discriminator selecting the user override set
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the effective element for a full key
    Get(KeyArgs),
    /// List effective elements matching a key prefix
    List(KeyArgs),
    /// Show a derived or overriding element as written
    Alteration(KeyArgs),
    /// Show an overridden element as it was before the override
    Base(KeyArgs),
    /// Persist the elements of an XML file as user overrides
    Persist(PersistArgs),
    /// Delete every user override file
    ClearOverrides,
    /// List the documents read by the inventory
    Files,
}

#[derive(Args)]
pub struct KeyArgs {
    /// Element name, e.g. `layout`
    pub name: String,
    /// Key attribute values in registry order
    pub key: Vec<String>,
}

#[derive(Args)]
pub struct PersistArgs {
    /// XML file holding one element or a document of elements
    pub file: PathBuf,
}
