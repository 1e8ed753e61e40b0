//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "digital-twin")]
#[command(about = "Ask questions to a retrieval-augmented digital twin of a profile")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging for the workspace crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive chat (type `exit` or `quit` to leave)
    Chat {
        /// Hits retrieved per question (defaults to RAG_TOP_K)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Ingest the profile first when the index is empty
        #[arg(long)]
        auto_ingest: bool,
    },
    /// Answer a single question and exit
    Ask {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the retrieved chunks after the answer
        #[arg(long)]
        show_context: bool,
    },
    /// Load the profile document into the vector store
    Ingest {
        /// Profile JSON (defaults to DIGITALTWIN_JSON)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Clear the index before writing
        #[arg(long)]
        reset: bool,
    },
    /// Check the embedder, the vector store and the chat model
    Health,
}
