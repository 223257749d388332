//! Command-line interface

pub mod chat;
pub mod index;
pub mod run;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adjutant", version, about = "Local agentic assistant with tool orchestration and RAG")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive chat with the assistant
    Chat(ChatArgs),

    /// Run a single message non-interactively
    Run(RunArgs),

    /// Start the HTTP API server
    Serve(ServeArgs),

    /// Index a document or directory into the knowledge base
    Index(IndexArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ChatArgs {
    /// Model override (e.g. "llama3.2", "mistral")
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    /// The message to process
    pub message: String,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address override (e.g. "0.0.0.0:8080")
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct IndexArgs {
    /// File or directory to index
    pub path: PathBuf,

    /// Do not recurse into subdirectories
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default global config file
    Init,

    /// Print the effective configuration
    Show,
}
