//! ---
//! trk_section: "05-networking-external-interfaces"
//! trk_subsection: "binary"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Control CLI for operators driving the R-TRACK store."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Plain-text rendering of the store views.

use std::fmt::Write;

use r_track_core::view::{entity_table, station_board, workflow_matrix, EMPTY_COLUMN};
use r_track_core::AppState;
use r_track_persistence::WidgetLayout;

fn grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_owned()
    };
    let mut out = line(headers);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

pub fn board(state: &AppState) -> String {
    let mut out = String::from("Board posizioni attuali\n");
    for column in station_board(state) {
        let names = if column.entities.is_empty() {
            EMPTY_COLUMN.to_owned()
        } else {
            column
                .entities
                .iter()
                .map(|entity| entity.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(out, "  {} ({}): {}", column.title(), column.count(), names);
    }
    out
}

pub fn matrix(state: &AppState) -> String {
    let view = workflow_matrix(state);
    let mut headers = vec![view.entity_header.to_owned()];
    headers.extend(view.stations.iter().map(|station| station.name.clone()));
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.entity.name.clone())
                .chain(row.labels().into_iter().map(str::to_owned))
                .collect()
        })
        .collect();
    format!("Matrice lavorazioni\n{}\n", grid(&headers, &rows))
}

pub fn entities(state: &AppState) -> String {
    let table = entity_table(state);
    let headers: Vec<String> = table.headers.iter().map(|h| (*h).to_owned()).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let name = if row.has_description {
                format!("{} [info]", row.entity.name)
            } else {
                row.entity.name.clone()
            };
            [name, row.station.to_owned()]
                .into_iter()
                .chain(row.values.iter().cloned())
                .collect()
        })
        .collect();
    format!("{}\n{}\n", table.title, grid(&headers, &rows))
}

/// Board, matrix and entity table separated by blank lines.
pub fn all_views(state: &AppState) -> String {
    format!("{}\n{}\n{}", board(state), matrix(state), entities(state))
}

pub fn layout(widgets: &[WidgetLayout]) -> String {
    let headers: Vec<String> = ["widget", "x", "y", "w", "h", "minW", "minH"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    let optional = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
    let rows: Vec<Vec<String>> = widgets
        .iter()
        .map(|widget| {
            let rect = &widget.layout;
            vec![
                widget.id.clone(),
                rect.x.to_string(),
                rect.y.to_string(),
                rect.w.to_string(),
                rect.h.to_string(),
                optional(rect.min_w),
                optional(rect.min_h),
            ]
        })
        .collect();
    grid(&headers, &rows)
}
