use std::path::PathBuf;

use inv_types::Key;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("no base {base:?} found for {key}{}", origin(.file))]
    MissingBase {
        key: Key,
        base: String,
        file: Option<PathBuf>,
    },

    #[error("no base found to override {key}{}", origin(.file))]
    NoBaseToOverride { key: Key, file: Option<PathBuf> },

    #[error("only one level of override is allowed: {key} is already overridden{}", origin(.file))]
    DuplicateOverride { key: Key, file: Option<PathBuf> },

    #[error("derivation cycle through {key}")]
    DerivationCycle { key: Key },

    #[error("<{element}> has no `{attribute}` attribute to name its override file")]
    MissingKeyAttribute { element: String, attribute: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("type error: {0}")]
    Type(#[from] inv_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] inv_store::StoreError),

    #[error("merge error: {0}")]
    Merge(#[from] inv_merge::MergeError),

    #[error("codec error: {0}")]
    Codec(#[from] inv_codec::CodecError),

    #[error("invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn origin(file: &Option<PathBuf>) -> String {
    match file {
        Some(path) => format!(" (in {})", path.display()),
        None => String::new(),
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;
