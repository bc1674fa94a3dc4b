//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pacestream")]
#[command(about = "One Pace addon for Stremio with official, debrid and torrent streams")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the addon HTTP server (the default)
    Serve {
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the catalog/meta/stream JSON files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// TorBox API key for this run (overrides config and env)
        #[arg(long)]
        torbox_api_key: Option<String>,
    },
    /// Verify and store a TorBox API key
    Configure {
        /// The API key to verify and save; omit with --clear to remove it
        #[arg(long)]
        torbox_api_key: Option<String>,

        /// Remove the stored API key
        #[arg(long)]
        clear: bool,
    },
}
