//! ---
//! trk_section: "05-networking-external-interfaces"
//! trk_subsection: "binary"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Control CLI for operators driving the R-TRACK store."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use r_track_common::AppConfig;
use r_track_logging::{log_system_event, SystemEventOutcome};

/// Files inspected when neither `--config` nor `R_TRACK_CONFIG` is given.
pub const CONFIG_CANDIDATES: [&str; 2] = ["r-track.toml", "configs/r-track.toml"];

/// Explicit path, else `R_TRACK_CONFIG` or the first candidate present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_path(path);
    }
    let env_set = std::env::var(AppConfig::ENV_CONFIG_PATH)
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if env_set || CONFIG_CANDIDATES.iter().any(|path| Path::new(path).exists()) {
        AppConfig::load(&CONFIG_CANDIDATES)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init(cmd) => cmd.execute(),
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a configuration file populated with the defaults.
    #[command(name = "init")]
    Init(InitCommand),
}

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Destination file.
    #[arg(long = "output", value_name = "FILE", default_value = "r-track.toml")]
    output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    force: bool,
}

impl InitCommand {
    pub fn execute(self) -> Result<()> {
        write_default_config(&self.output, self.force)?;
        log_system_event(
            None,
            "config.init",
            &format!("default configuration written to {}", self.output.display()),
            SystemEventOutcome::Success,
        );
        println!("configuration written to {}", self.output.display());
        Ok(())
    }
}

pub fn write_default_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "{} already exists; pass --force to overwrite",
            output.display()
        ));
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }
    }
    let rendered = AppConfig::default().to_toml()?;
    fs::write(output, rendered).with_context(|| format!("unable to write {}", output.display()))
}
