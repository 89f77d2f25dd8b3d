//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Domain data model: attribute schema, stations, entities and the status matrix.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`Station`].
    StationId
);
string_id!(
    /// Identifier of an [`Entity`].
    EntityId
);

/// Kind of a dynamic attribute; `Select` carries its ordered option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeKind {
    Text,
    Number,
    Boolean,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
}

impl AttributeKind {
    /// Tag name as used in configuration (`text`, `number`, ...).
    pub fn tag(&self) -> AttributeTag {
        match self {
            AttributeKind::Text => AttributeTag::Text,
            AttributeKind::Number => AttributeTag::Number,
            AttributeKind::Boolean => AttributeTag::Boolean,
            AttributeKind::Select { .. } => AttributeTag::Select,
        }
    }

    /// Whether `value` has the shape this kind expects.
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (AttributeKind::Text, AttributeValue::Text(_))
            | (AttributeKind::Number, AttributeValue::Number(_))
            | (AttributeKind::Boolean, AttributeValue::Boolean(_)) => true,
            (AttributeKind::Select { options }, AttributeValue::Choice(choice)) => {
                options.iter().any(|opt| opt == choice)
            }
            _ => false,
        }
    }
}

/// Payload-free discriminant of [`AttributeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttributeTag {
    Text,
    Number,
    Boolean,
    Select,
}

/// One field of the entity attribute schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl AttributeDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, AttributeKind::Text)
    }

    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, AttributeKind::Number)
    }

    pub fn boolean(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, AttributeKind::Boolean)
    }

    pub fn select<I, S>(key: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            key,
            label,
            AttributeKind::Select {
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }
}

/// Value stored in an entity's attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// One of a select attribute's options.
    Choice(String),
}

impl AttributeValue {
    /// Empty text counts as "no value set".
    pub fn is_blank(&self) -> bool {
        match self {
            AttributeValue::Text(text) | AttributeValue::Choice(text) => text.is_empty(),
            AttributeValue::Number(_) | AttributeValue::Boolean(_) => false,
        }
    }
}

/// Entity labels and the dynamic attribute schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub singular_label: String,
    pub plural_label: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl Configuration {
    pub fn attribute(&self, key: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|def| def.key == key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }
}

/// A processing station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Station {
    pub fn new(id: impl Into<StationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            image_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// A tracked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub current_station_id: Option<StationId>,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            current_station_id: None,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn at_station(mut self, station: impl Into<StationId>) -> Self {
        self.current_station_id = Some(station.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// The attribute value, treating blank values as unset.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key).filter(|value| !value.is_blank())
    }
}

/// Outcome of an entity at a station.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Unset,
    Pass,
    Fail,
}

impl StepStatus {
    /// Next state in the fixed cycle `unset -> pass -> fail -> unset`.
    pub fn next(self) -> Self {
        match self {
            StepStatus::Unset => StepStatus::Pass,
            StepStatus::Pass => StepStatus::Fail,
            StepStatus::Fail => StepStatus::Unset,
        }
    }
}

/// One matrix row: station id to status.
pub type StatusRow = IndexMap<StationId, StepStatus>;

/// Sparse entity x station status record; absent cells are [`StepStatus::Unset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMatrix {
    rows: IndexMap<EntityId, StatusRow>,
}

impl StatusMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of one cell; missing rows and cells read as unset.
    pub fn status(&self, entity: &EntityId, station: &StationId) -> StepStatus {
        self.rows
            .get(entity)
            .and_then(|row| row.get(station))
            .copied()
            .unwrap_or_default()
    }

    pub fn row(&self, entity: &EntityId) -> Option<&StatusRow> {
        self.rows.get(entity)
    }

    pub fn has_row(&self, entity: &EntityId) -> bool {
        self.rows.contains_key(entity)
    }

    /// Make sure a row exists for `entity`, keeping an existing one intact.
    pub fn ensure_row(&mut self, entity: &EntityId) -> &mut StatusRow {
        self.rows.entry(entity.clone()).or_default()
    }

    /// Advance one cell through the status cycle and return the new status.
    pub fn toggle(&mut self, entity: &EntityId, station: &StationId) -> StepStatus {
        let cell = self
            .ensure_row(entity)
            .entry(station.clone())
            .or_default();
        *cell = cell.next();
        *cell
    }

    /// Drop the whole row of `entity`; returns whether a row existed.
    pub fn remove_row(&mut self, entity: &EntityId) -> bool {
        self.rows.shift_remove(entity).is_some()
    }

    /// Drop the `station` column from every row; returns the number of cells removed.
    pub fn remove_column(&mut self, station: &StationId) -> usize {
        self.rows
            .values_mut()
            .filter_map(|row| row.shift_remove(station))
            .count()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&EntityId, &StatusRow)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
