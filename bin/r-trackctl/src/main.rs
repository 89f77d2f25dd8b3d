//! ---
//! trk_section: "05-networking-external-interfaces"
//! trk_subsection: "binary"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Control CLI for operators driving the R-TRACK store."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};
use r_track_logging as logging;

mod config;
mod layout;
mod render;
mod session;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "R-TRACK station tracking control utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the demo state as JSON.
    Seed(session::SeedCommand),
    /// Apply an action script to a configured store and print the views.
    Run(session::RunCommand),
    /// Rebuild the state from an action journal and print the views.
    Replay(session::ReplayCommand),
    #[command(subcommand, about = "Dashboard layout record")]
    Layout(layout::LayoutCommand),
    #[command(subcommand, about = "Configuration file helpers")]
    Config(config::ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Scripted runs set up tracing from the loaded configuration.
    if !matches!(cli.command, Commands::Run(_)) {
        logging::init();
    }
    match cli.command {
        Commands::Seed(cmd) => cmd.execute(),
        Commands::Run(cmd) => cmd.execute(),
        Commands::Replay(cmd) => cmd.execute(),
        Commands::Layout(cmd) => layout::run(cmd),
        Commands::Config(cmd) => config::run(cmd),
    }
}
