//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Persistence abstractions and storage bindings."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Dashboard widget layout record.
//!
//! The record is presentation state only: it maps a widget id to its grid
//! rectangle and is merged over the built-in default layout on every load.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{PersistenceError, Result};

/// Storage key the layout record lives under.
pub const LAYOUT_KEY: &str = "dashboard.widgets.v1";

/// Grid rectangle of a widget, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRect {
    /// Column of the top-left corner.
    pub x: u32,
    /// Row of the top-left corner.
    pub y: u32,
    /// Width in columns.
    pub w: u32,
    /// Height in rows.
    pub h: u32,
    /// Minimum width the widget may be resized to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    /// Minimum height the widget may be resized to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
}

impl WidgetRect {
    const fn sized(x: u32, y: u32, w: u32, h: u32, min_w: u32, min_h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            min_w: Some(min_w),
            min_h: Some(min_h),
        }
    }

    /// Overlay the fields present in `patch`.
    pub fn merged(self, patch: &RectPatch) -> Self {
        Self {
            x: patch.x.unwrap_or(self.x),
            y: patch.y.unwrap_or(self.y),
            w: patch.w.unwrap_or(self.w),
            h: patch.h.unwrap_or(self.h),
            min_w: patch.min_w.or(self.min_w),
            min_h: patch.min_h.or(self.min_h),
        }
    }
}

/// Partial rectangle as found in a saved record; absent fields keep defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectPatch {
    #[serde(default)]
    x: Option<u32>,
    #[serde(default)]
    y: Option<u32>,
    #[serde(default)]
    w: Option<u32>,
    #[serde(default)]
    h: Option<u32>,
    #[serde(default)]
    min_w: Option<u32>,
    #[serde(default)]
    min_h: Option<u32>,
}

impl From<WidgetRect> for RectPatch {
    fn from(rect: WidgetRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            w: Some(rect.w),
            h: Some(rect.h),
            min_w: rect.min_w,
            min_h: rect.min_h,
        }
    }
}

/// Widget id paired with its rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetLayout {
    /// Stable widget identifier (`board`, `matrix`, `table`, `create`).
    pub id: String,
    /// Grid rectangle.
    pub layout: WidgetRect,
}

#[derive(Debug, Clone, Deserialize)]
struct SavedWidget {
    id: String,
    #[serde(default)]
    layout: RectPatch,
}

/// A rectangle reported by the grid after a drag or resize, keyed by widget id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutChange {
    /// Widget identifier.
    pub i: String,
    /// New rectangle.
    #[serde(flatten)]
    pub rect: RectPatch,
}

impl LayoutChange {
    /// Build a change carrying a full rectangle.
    pub fn new(id: impl Into<String>, rect: WidgetRect) -> Self {
        Self {
            i: id.into(),
            rect: rect.into(),
        }
    }
}

/// The built-in layout: board and matrix side by side, table and create form below.
pub fn default_widgets() -> Vec<WidgetLayout> {
    [
        ("board", WidgetRect::sized(0, 0, 6, 9, 4, 5)),
        ("matrix", WidgetRect::sized(6, 0, 6, 9, 4, 5)),
        ("table", WidgetRect::sized(0, 9, 12, 12, 6, 8)),
        ("create", WidgetRect::sized(0, 21, 12, 8, 4, 4)),
    ]
    .into_iter()
    .map(|(id, layout)| WidgetLayout {
        id: id.to_owned(),
        layout,
    })
    .collect()
}

/// Merge a raw saved record over `defaults`.
///
/// Saved fields override default fields by widget id, unknown ids are
/// ignored and widgets missing from the record keep their defaults. A record
/// that does not parse yields the defaults unchanged.
pub fn merge_saved_layout(defaults: Vec<WidgetLayout>, raw: &str) -> Vec<WidgetLayout> {
    let saved: Vec<SavedWidget> = match serde_json::from_str(raw) {
        Ok(saved) => saved,
        Err(err) => {
            warn!(error = %err, "ignoring unreadable dashboard layout record");
            return defaults;
        }
    };
    defaults
        .into_iter()
        .map(|widget| match saved.iter().find(|s| s.id == widget.id) {
            Some(found) => WidgetLayout {
                layout: widget.layout.merged(&found.layout),
                id: widget.id,
            },
            None => widget,
        })
        .collect()
}

/// Apply grid-reported changes to the current widgets, matched by id.
pub fn apply_layout_changes(
    widgets: &[WidgetLayout],
    changes: &[LayoutChange],
) -> Vec<WidgetLayout> {
    widgets
        .iter()
        .map(|widget| match changes.iter().find(|c| c.i == widget.id) {
            Some(change) => WidgetLayout {
                id: widget.id.clone(),
                layout: widget.layout.merged(&change.rect),
            },
            None => widget.clone(),
        })
        .collect()
}

/// Minimal key/value store backed by one JSON file per key.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Use `root` as the storage directory; it is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    /// Read the raw value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        fs::write(path, value)?;
        Ok(())
    }

    /// Remove the value stored under `key`; removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Loads, saves and resets the dashboard layout record.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    storage: LocalStorage,
}

impl LayoutStore {
    /// Bind the layout record to a storage backend.
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Current layout: the saved record merged over the defaults.
    ///
    /// Never fails; storage errors fall back to the defaults.
    pub fn load(&self) -> Vec<WidgetLayout> {
        match self.storage.get(LAYOUT_KEY) {
            Ok(Some(raw)) => merge_saved_layout(default_widgets(), &raw),
            Ok(None) => default_widgets(),
            Err(err) => {
                warn!(error = %err, "dashboard layout unavailable; using defaults");
                default_widgets()
            }
        }
    }

    /// Persist the given widgets.
    pub fn save(&self, widgets: &[WidgetLayout]) -> Result<()> {
        let raw = serde_json::to_string(widgets)?;
        self.storage.set(LAYOUT_KEY, &raw)?;
        debug!(widgets = widgets.len(), "dashboard layout saved");
        Ok(())
    }

    /// Apply grid changes to the current layout and persist the result.
    pub fn update(&self, changes: &[LayoutChange]) -> Result<Vec<WidgetLayout>> {
        let widgets = apply_layout_changes(&self.load(), changes);
        self.save(&widgets)?;
        Ok(widgets)
    }

    /// Drop the saved record and return the defaults.
    pub fn reset(&self) -> Result<Vec<WidgetLayout>> {
        self.storage.remove(LAYOUT_KEY)?;
        Ok(default_widgets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rect_of<'a>(widgets: &'a [WidgetLayout], id: &str) -> &'a WidgetRect {
        &widgets.iter().find(|w| w.id == id).unwrap().layout
    }

    #[test]
    fn defaults_cover_four_widgets_in_order() {
        let ids: Vec<_> = default_widgets().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["board", "matrix", "table", "create"]);
    }

    #[test]
    fn saved_fields_override_defaults_by_id() {
        let raw = r#"[
            {"id": "matrix", "layout": {"x": 0, "y": 30, "w": 12}},
            {"id": "ghost", "layout": {"x": 1, "y": 1, "w": 1, "h": 1}}
        ]"#;
        let merged = merge_saved_layout(default_widgets(), raw);

        assert_eq!(merged.len(), 4);
        let matrix = rect_of(&merged, "matrix");
        assert_eq!((matrix.x, matrix.y, matrix.w, matrix.h), (0, 30, 12, 9));
        assert_eq!(matrix.min_w, Some(4));
        assert_eq!(rect_of(&merged, "board"), rect_of(&default_widgets(), "board"));
        assert!(merged.iter().all(|w| w.id != "ghost"));
    }

    #[test]
    fn unreadable_record_yields_defaults() {
        assert_eq!(merge_saved_layout(default_widgets(), "{not json"), default_widgets());
    }

    #[test]
    fn grid_changes_merge_by_id() {
        let changes = vec![LayoutChange::new("table", WidgetRect::sized(2, 3, 8, 10, 6, 8))];
        let widgets = apply_layout_changes(&default_widgets(), &changes);
        assert_eq!(rect_of(&widgets, "table").x, 2);
        assert_eq!(rect_of(&widgets, "create"), rect_of(&default_widgets(), "create"));
    }

    #[test]
    fn storage_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(matches!(
            storage.set("../outside", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(storage.get("").is_err());
    }

    #[test]
    fn save_load_and_reset() {
        let dir = tempdir().unwrap();
        let store = LayoutStore::new(LocalStorage::new(dir.path().join("storage")));
        assert_eq!(store.load(), default_widgets());

        let moved = store
            .update(&[LayoutChange::new("board", WidgetRect::sized(6, 9, 6, 9, 4, 5))])
            .unwrap();
        assert_eq!(store.load(), moved);
        assert_eq!(rect_of(&store.load(), "board").y, 9);

        assert_eq!(store.reset().unwrap(), default_widgets());
        assert_eq!(store.load(), default_widgets());
        assert!(store.reset().is_ok());
    }
}
