//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Read-only projections of a snapshot, ready for a renderer.
//!
//! Nothing here mutates state. Dangling station references resolve to
//! "no station" everywhere.

use crate::model::{
    AttributeDefinition, AttributeKind, AttributeValue, Configuration, Entity, Station, StepStatus,
};
use crate::state::AppState;

/// Label shown when the configured entity label is empty.
pub const DEFAULT_ENTITY_LABEL: &str = "Entità";
/// Rendered in place of a missing value.
pub const EMPTY_CELL: &str = "-";
/// Title of the board column collecting entities without a station.
pub const UNASSIGNED_COLUMN: &str = "Senza stazione";
/// Placeholder for an empty board column.
pub const EMPTY_COLUMN: &str = "—";

fn or_default_label(label: &str) -> &str {
    if label.is_empty() {
        DEFAULT_ENTITY_LABEL
    } else {
        label
    }
}

pub fn singular_label(config: &Configuration) -> &str {
    or_default_label(&config.singular_label)
}

pub fn plural_label(config: &Configuration) -> &str {
    or_default_label(&config.plural_label)
}

/// Format a number the way JavaScript's `String(n)` does: shortest round-trip
/// digits, exponent notation below `1e-6` and from `1e21` up.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let magnitude = value.abs();
    if magnitude.is_nan() || (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let scientific = format!("{value:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => scientific,
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Sì" } else { "No" }.to_owned()
}

/// Display text for an attribute value in tables and read-only views.
///
/// Absent or empty values render as `-`; booleans as `Sì`/`No`.
pub fn render_attr_value(
    definition: &AttributeDefinition,
    value: Option<&AttributeValue>,
) -> String {
    let Some(value) = value.filter(|value| !value.is_blank()) else {
        return EMPTY_CELL.to_owned();
    };
    match (&definition.kind, value) {
        (_, AttributeValue::Boolean(flag)) => yes_no(*flag),
        (AttributeKind::Boolean, AttributeValue::Number(number)) => {
            yes_no(*number != 0.0 && !number.is_nan())
        }
        // Non-empty text under a boolean definition is truthy.
        (AttributeKind::Boolean, AttributeValue::Text(_) | AttributeValue::Choice(_)) => {
            yes_no(true)
        }
        (AttributeKind::Number, AttributeValue::Text(raw) | AttributeValue::Choice(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(format_number)
            .unwrap_or_else(|_| "NaN".to_owned()),
        (_, AttributeValue::Number(number)) => format_number(*number),
        (_, AttributeValue::Text(text) | AttributeValue::Choice(text)) => text.clone(),
    }
}

/// Input control a form shows for an attribute kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControl<'a> {
    TextInput,
    NumberInput,
    /// Blank, `Sì`, `No`.
    BooleanSelect,
    /// Blank followed by the options in order.
    OptionSelect(&'a [String]),
}

/// Placeholder entry offered first by select controls.
pub const BLANK_CHOICE: &str = "--";

impl<'a> FieldControl<'a> {
    pub fn for_kind(kind: &'a AttributeKind) -> Self {
        match kind {
            AttributeKind::Text => FieldControl::TextInput,
            AttributeKind::Number => FieldControl::NumberInput,
            AttributeKind::Boolean => FieldControl::BooleanSelect,
            AttributeKind::Select { options } => FieldControl::OptionSelect(options),
        }
    }

    /// `(value, label)` pairs for select controls; empty for free inputs.
    pub fn choices(&self) -> Vec<(&'a str, &'a str)> {
        match self {
            FieldControl::TextInput | FieldControl::NumberInput => Vec::new(),
            FieldControl::BooleanSelect => {
                vec![("", BLANK_CHOICE), ("true", "Sì"), ("false", "No")]
            }
            FieldControl::OptionSelect(options) => std::iter::once(("", BLANK_CHOICE))
                .chain(options.iter().map(|option| (option.as_str(), option.as_str())))
                .collect(),
        }
    }
}

/// One board column: a station, or the trailing unassigned column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn<'a> {
    pub station: Option<&'a Station>,
    pub entities: Vec<&'a Entity>,
}

impl BoardColumn<'_> {
    pub fn title(&self) -> &str {
        self.station
            .map(|station| station.name.as_str())
            .unwrap_or(UNASSIGNED_COLUMN)
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }
}

/// Station columns in order, then entities with no (or a dangling) station.
pub fn station_board(state: &AppState) -> Vec<BoardColumn<'_>> {
    let mut columns: Vec<BoardColumn<'_>> = state
        .stations
        .iter()
        .map(|station| BoardColumn {
            station: Some(station),
            entities: state
                .entities
                .iter()
                .filter(|entity| entity.current_station_id.as_ref() == Some(&station.id))
                .collect(),
        })
        .collect();
    columns.push(BoardColumn {
        station: None,
        entities: state
            .entities
            .iter()
            .filter(|entity| state.station_of(entity).is_none())
            .collect(),
    });
    columns
}

/// Short label for a matrix cell.
pub fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pass => "OK",
        StepStatus::Fail => "KO",
        StepStatus::Unset => "—",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow<'a> {
    pub entity: &'a Entity,
    /// One status per station, in station order.
    pub cells: Vec<StepStatus>,
}

impl MatrixRow<'_> {
    pub fn labels(&self) -> Vec<&'static str> {
        self.cells.iter().copied().map(status_label).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixView<'a> {
    /// Header of the entity column.
    pub entity_header: &'a str,
    pub stations: Vec<&'a Station>,
    pub rows: Vec<MatrixRow<'a>>,
}

/// Entity × station grid. Entities without a matrix row show all cells unset.
pub fn workflow_matrix(state: &AppState) -> MatrixView<'_> {
    let rows = state
        .entities
        .iter()
        .map(|entity| MatrixRow {
            entity,
            cells: state
                .stations
                .iter()
                .map(|station| state.status(&entity.id, &station.id))
                .collect(),
        })
        .collect();
    MatrixView {
        entity_header: singular_label(&state.config),
        stations: state.stations.iter().collect(),
        rows,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow<'a> {
    pub entity: &'a Entity,
    pub has_description: bool,
    /// Station name, or `-` when unassigned or dangling.
    pub station: &'a str,
    /// Rendered attribute values in schema order.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityTable<'a> {
    pub title: String,
    pub headers: Vec<&'a str>,
    pub rows: Vec<EntityRow<'a>>,
}

pub fn entity_table(state: &AppState) -> EntityTable<'_> {
    let attributes = &state.config.attributes;
    let mut headers = vec!["Nome", "Stazione"];
    headers.extend(attributes.iter().map(|definition| definition.label.as_str()));

    let rows = state
        .entities
        .iter()
        .map(|entity| EntityRow {
            entity,
            has_description: entity
                .description
                .as_deref()
                .is_some_and(|text| !text.is_empty()),
            station: state
                .station_of(entity)
                .map(|station| station.name.as_str())
                .unwrap_or(EMPTY_CELL),
            values: attributes
                .iter()
                .map(|definition| render_attr_value(definition, entity.attribute(&definition.key)))
                .collect(),
        })
        .collect();

    EntityTable {
        title: format!("Elenco {}", plural_label(&state.config)),
        headers,
        rows,
    }
}
