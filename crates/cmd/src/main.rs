// SPDX-FileCopyrightText: 2026 Great Jones
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::attachments::{AttachmentsArgs, attachments_command};
use commands::export::{ExportArgs, export_command};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "silo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a schema's tables to CSV shards and sink them
    Export(ExportArgs),
    /// Mirror file attachments referenced by the report API
    Attachments(AttachmentsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match cli.command {
        Commands::Export(args) => export_command(args).await,
        Commands::Attachments(args) => attachments_command(args).await,
    }
}
