use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Command line client for the warehouse admin REST API")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Override the profile's API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[arg(long, global = true, env = "STOCKROOM_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Answer yes to delete confirmations
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show one page of a resource
    List {
        resource: String,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Server-side search term
        #[arg(long)]
        search: Option<String>,
    },
    /// Show every record of a resource, unpaginated
    All { resource: String },
    /// Show a single record
    Show { resource: String, id: String },
    /// Create a record
    Create {
        resource: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Update a record
    Update {
        resource: String,
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a record after confirmation
    Delete { resource: String, id: String },
    /// Download the resource's PDF report
    Export {
        resource: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Interactive list with search, paging and delete
    Browse { resource: String },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct FieldArgs {
    /// Field assignment, repeatable
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
    /// File upload, repeatable; switches the request to multipart
    #[arg(long = "file", value_name = "KEY=PATH")]
    pub files: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a value on the active profile
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}
