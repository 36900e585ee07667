// Command-line interface
//
// Three independent entry points with no flags of their own; everything else
// comes from environment variables and `config::constants`.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "medchat", about = "Medical chat assistant", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the training corpus (hosted datasets + CDC scrape) as JSONL
    Prepare,
    /// Fine-tune the pretrained seq2seq model on the corpus file
    Train,
    /// Start the chat server
    Serve,
}
