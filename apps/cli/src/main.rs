//! docground CLI: question answering grounded in a Confluence page tree.
//!
//! Walks a bounded subtree of pages, hands the flattened text to a language
//! model, and maps the answer's cited titles back to the pages. The same
//! flow is exposed over HTTP by `docground serve`.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
