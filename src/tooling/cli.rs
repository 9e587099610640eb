//! CLI Tooling
//!
//! Command-line interface over a local tree store. Every command runs as the
//! `--user` identity against the `--owner` tree, through the same authorization
//! guard the boundary layer uses.

use crate::api::{DriveApi, OwnerScope};
use crate::config::{ConfigLoader, DriveConfig};
use crate::error::ApiError;
use crate::tree::{Node, TreePath};
use crate::types::{BlobId, OwnerId};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::path::{Path, PathBuf};
use tracing::info;

/// Treedrive CLI - per-owner folder/file trees
#[derive(Parser)]
#[command(name = "treedrive")]
#[command(about = "Per-owner folder/file trees with transactional edits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Identity the commands run as
    #[arg(long, default_value = "local")]
    pub user: String,

    /// Owner whose tree is addressed (defaults to --user)
    #[arg(long)]
    pub owner: Option<String>,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides storage.path)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create the owner's record if it does not exist yet
    Init,
    /// Show the owner's tree
    Tree {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a folder under PARENT (empty for the root)
    Mkdir {
        #[arg(default_value = "")]
        parent: String,
        /// Folder label
        #[arg(long)]
        text: Option<String>,
    },
    /// Create a file under PARENT with inline or file-sourced content
    Put {
        #[arg(default_value = "")]
        parent: String,
        /// Inline content
        #[arg(long, conflicts_with = "from")]
        content: Option<String>,
        /// Read content from a local file
        #[arg(long)]
        from: Option<PathBuf>,
        /// File label
        #[arg(long)]
        text: Option<String>,
    },
    /// Replace the label of the entry at PATH
    SetText { path: String, text: String },
    /// Delete the entry at PATH
    Rm { path: String },
    /// Print a file's content by blob id
    Cat { id: u64 },
    /// Replace a file's content by blob id
    Write {
        id: u64,
        #[arg(long, conflicts_with = "from")]
        content: Option<String>,
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

/// CLI context for executing commands
pub struct CliContext {
    api: DriveApi,
    config: DriveConfig,
    caller: OwnerId,
    owner: String,
}

impl CliContext {
    /// Load the effective configuration, applying the `--store` override.
    ///
    /// Kept separate from opening the store so logging can start first.
    pub fn load_config(
        config_path: Option<&Path>,
        store: Option<PathBuf>,
    ) -> Result<DriveConfig, ApiError> {
        let mut config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(store) = store {
            config.storage.path = Some(store);
        }
        Ok(config)
    }

    /// Open the store named by `config` and bind the caller and target owner
    pub fn with_config(
        config: DriveConfig,
        user: String,
        owner: Option<String>,
    ) -> Result<Self, ApiError> {
        let api = DriveApi::open(&config)?;
        let owner = owner.unwrap_or_else(|| user.clone());
        Ok(Self {
            api,
            config,
            caller: OwnerId::new(user),
            owner,
        })
    }

    fn scope(&self) -> Result<OwnerScope, ApiError> {
        self.api.authorize(&self.caller, &self.owner)
    }

    /// Execute a command and return its printable output
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(user = %self.caller, owner = %self.owner, command = ?command, "Executing command");
        match command {
            Commands::Init => {
                let scope = self.scope()?;
                let record = self.api.open_session(scope.owner())?;
                Ok(format!(
                    "Owner {} ready (next id {}, revision {})",
                    record.owner, record.next_id, record.revision
                ))
            }
            Commands::Tree { format } => {
                let scope = self.scope()?;
                let tree = self.api.fetch_tree(&scope)?;
                match format.as_str() {
                    "json" => serde_json::to_string_pretty(&tree)
                        .map_err(|e| ApiError::Internal(format!("encode failed: {}", e))),
                    "text" => Ok(format_tree_table(&tree)),
                    other => Err(ApiError::InvalidPayload(format!(
                        "unknown format {:?} (expected text or json)",
                        other
                    ))),
                }
            }
            Commands::Mkdir { parent, text } => {
                let created = self.api.create_folder(&self.scope()?, parent, text.clone())?;
                Ok(format!("{}", TreePath::parse(parent, true)?.child(created.key)))
            }
            Commands::Put {
                parent,
                content,
                from,
                text,
            } => {
                let content = read_content(content.as_deref(), from.as_ref())?;
                let created = self
                    .api
                    .create_file(&self.scope()?, parent, content, text.clone())?;
                let link = match &created.value {
                    Node::File(file) => file.link,
                    Node::Folder(_) => {
                        return Err(ApiError::Internal("file entry came back as folder".into()))
                    }
                };
                Ok(format!(
                    "{} (blob {})",
                    TreePath::parse(parent, true)?.child(created.key),
                    link
                ))
            }
            Commands::SetText { path, text } => {
                self.api
                    .update_text(&self.scope()?, path, Some(text.clone()))?;
                Ok(format!("Updated {}", path))
            }
            Commands::Rm { path } => {
                self.api.delete_entry(&self.scope()?, path)?;
                Ok(format!("Deleted {}", path))
            }
            Commands::Cat { id } => self.api.fetch_file(&self.scope()?, BlobId(*id)),
            Commands::Write { id, content, from } => {
                let content = read_content(content.as_deref(), from.as_ref())?;
                self.api.update_file(&self.scope()?, BlobId(*id), content)?;
                Ok(format!("Wrote blob {}", id))
            }
            Commands::Config => self.config.to_toml(),
        }
    }
}

fn read_content(inline: Option<&str>, from: Option<&PathBuf>) -> Result<String, ApiError> {
    match (inline, from) {
        (Some(content), _) => Ok(content.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidPayload(format!("Failed to read {}: {}", path.display(), e))
        }),
        (None, None) => Err(ApiError::InvalidPayload(
            "either --content or --from is required".to_string(),
        )),
    }
}

fn format_tree_table(tree: &Node) -> String {
    let mut rows = Vec::new();
    collect_rows(tree, &TreePath::root(), &mut rows);
    if rows.is_empty() {
        return "(empty)".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec!["Path", "Type", "Text", "Blob"]);
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

fn collect_rows(node: &Node, path: &TreePath, rows: &mut Vec<Vec<String>>) {
    let Some(folder) = node.as_folder() else {
        return;
    };
    for (key, child) in &folder.entries {
        let child_path = path.child(*key);
        let blob = match child {
            Node::File(file) => file.link.to_string(),
            Node::Folder(_) => String::new(),
        };
        rows.push(vec![
            child_path.to_string(),
            child.kind_name().to_string(),
            child.text().to_string(),
            blob,
        ]);
        collect_rows(child, &child_path, rows);
    }
}
