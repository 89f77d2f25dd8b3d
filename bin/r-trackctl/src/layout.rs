//! ---
//! trk_section: "05-networking-external-interfaces"
//! trk_subsection: "binary"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Control CLI for operators driving the R-TRACK store."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use r_track_persistence::{LayoutChange, LayoutStore, LocalStorage, WidgetRect};

use crate::config::load_config;
use crate::render;

pub fn run(command: LayoutCommand) -> Result<()> {
    match command {
        LayoutCommand::Show(args) => show(&args),
        LayoutCommand::Set(cmd) => cmd.execute(),
        LayoutCommand::Reset(args) => reset(&args),
    }
}

#[derive(Debug, Subcommand)]
pub enum LayoutCommand {
    /// Print the saved layout merged over the defaults.
    #[command(name = "show")]
    Show(StorageArgs),
    /// Move or resize one widget, as the dashboard grid would report it.
    #[command(name = "set")]
    Set(SetCommand),
    /// Delete the saved layout and print the defaults.
    #[command(name = "reset")]
    Reset(StorageArgs),
}

#[derive(Debug, Args)]
pub struct StorageArgs {
    /// Storage directory (defaults to dashboard.storage_dir from the configuration).
    #[arg(long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Configuration file used to resolve the storage directory.
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

impl StorageArgs {
    fn layout_store(&self) -> Result<LayoutStore> {
        let root = match &self.dir {
            Some(dir) => dir.clone(),
            None => load_config(self.config.as_deref())?.dashboard.storage_dir,
        };
        Ok(LayoutStore::new(LocalStorage::new(root)))
    }
}

fn show(args: &StorageArgs) -> Result<()> {
    println!("{}", render::layout(&args.layout_store()?.load()));
    Ok(())
}

fn reset(args: &StorageArgs) -> Result<()> {
    let widgets = args
        .layout_store()?
        .reset()
        .context("failed to reset dashboard layout")?;
    println!("{}", render::layout(&widgets));
    Ok(())
}

#[derive(Debug, Args)]
pub struct SetCommand {
    /// Widget id (board, matrix, table or create).
    #[arg(value_name = "WIDGET")]
    widget: String,
    #[arg(long)]
    x: u32,
    #[arg(long)]
    y: u32,
    #[arg(long)]
    w: u32,
    #[arg(long)]
    h: u32,
    #[command(flatten)]
    storage: StorageArgs,
}

impl SetCommand {
    pub fn execute(self) -> Result<()> {
        let store = self.storage.layout_store()?;
        let current = store.load();
        let Some(existing) = current.iter().find(|widget| widget.id == self.widget) else {
            return Err(anyhow!("unknown widget {:?}", self.widget));
        };
        let rect = WidgetRect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            ..existing.layout
        };
        let widgets = store
            .update(&[LayoutChange::new(self.widget.as_str(), rect)])
            .context("failed to save dashboard layout")?;
        println!("{}", render::layout(&widgets));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_track_persistence::LAYOUT_KEY;
    use tempfile::tempdir;

    fn args(dir: &std::path::Path) -> StorageArgs {
        StorageArgs {
            dir: Some(dir.to_path_buf()),
            config: None,
        }
    }

    #[test]
    fn set_then_reset_round_trips_the_record() {
        let dir = tempdir().unwrap();
        SetCommand {
            widget: "table".into(),
            x: 1,
            y: 2,
            w: 6,
            h: 7,
            storage: args(dir.path()),
        }
        .execute()
        .unwrap();

        let table = args(dir.path())
            .layout_store()
            .unwrap()
            .load()
            .into_iter()
            .find(|widget| widget.id == "table")
            .unwrap();
        assert_eq!((table.layout.x, table.layout.h), (1, 7));
        assert_eq!(table.layout.min_w, Some(6));

        reset(&args(dir.path())).unwrap();
        assert!(LocalStorage::new(dir.path()).get(LAYOUT_KEY).unwrap().is_none());
    }

    #[test]
    fn unknown_widget_is_rejected() {
        let dir = tempdir().unwrap();
        let err = SetCommand {
            widget: "chart".into(),
            x: 0,
            y: 0,
            w: 1,
            h: 1,
            storage: args(dir.path()),
        }
        .execute()
        .unwrap_err();
        assert!(err.to_string().contains("chart"));
    }
}
