//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Turning raw form input into records the store accepts.
//!
//! Drafts return `None` when the form would keep its submit button disabled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::IdSource;
use crate::model::{
    AttributeDefinition, AttributeKind, AttributeTag, AttributeValue, Configuration, Entity,
    Station, StationId,
};

/// Reasons a raw attribute input cannot become a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeInputError {
    #[error("{0:?} is not a number")]
    NotANumber(String),
    #[error("{0:?} is not a boolean")]
    NotABoolean(String),
    #[error("{value:?} is not one of the options {options:?}")]
    UnknownOption { value: String, options: Vec<String> },
}

/// Coerce a raw input string for an attribute of `kind`.
///
/// Blank input means "no value" and yields `Ok(None)`.
pub fn parse_attr_input(
    kind: &AttributeKind,
    raw: &str,
) -> Result<Option<AttributeValue>, AttributeInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = match kind {
        AttributeKind::Text => AttributeValue::Text(raw.to_owned()),
        AttributeKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(AttributeValue::Number)
            .ok_or_else(|| AttributeInputError::NotANumber(raw.to_owned()))?,
        AttributeKind::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "sì" | "si" | "yes" => AttributeValue::Boolean(true),
            "false" | "no" => AttributeValue::Boolean(false),
            _ => return Err(AttributeInputError::NotABoolean(raw.to_owned())),
        },
        AttributeKind::Select { options } => {
            if options.iter().any(|option| option == trimmed) {
                AttributeValue::Choice(trimmed.to_owned())
            } else {
                return Err(AttributeInputError::UnknownOption {
                    value: raw.to_owned(),
                    options: options.clone(),
                });
            }
        }
    };
    Ok(Some(value))
}

/// Split comma separated select options, trimming and dropping empties.
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// Input of the "create entity" form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDraft {
    pub name: String,
    pub description: Option<String>,
    pub station: Option<StationId>,
    pub attributes: IndexMap<String, AttributeValue>,
}

impl EntityDraft {
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Build the entity with a fresh id; blank values are left out.
    pub fn into_entity(self, ids: &mut dyn IdSource, prefix: &str) -> Option<Entity> {
        if !self.can_submit() {
            return None;
        }
        let mut entity = Entity::new(ids.next_id(prefix), self.name.trim());
        entity.description = non_empty(self.description);
        entity.current_station_id = self.station.filter(|id| !id.as_str().is_empty());
        entity.attributes = self
            .attributes
            .into_iter()
            .filter(|(_, value)| !value.is_blank())
            .collect();
        Some(entity)
    }

    /// Set attributes from raw strings against the configured schema.
    ///
    /// Keys missing from the schema are ignored; the first coercion error is returned.
    pub fn with_raw_attributes<'a, I>(
        mut self,
        config: &Configuration,
        raw: I,
    ) -> Result<Self, AttributeInputError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, input) in raw {
            let Some(definition) = config.attribute(key) else {
                continue;
            };
            match parse_attr_input(&definition.kind, input)? {
                Some(value) => {
                    self.attributes.insert(key.to_owned(), value);
                }
                None => {
                    self.attributes.shift_remove(key);
                }
            }
        }
        Ok(self)
    }
}

/// Input of the "add station" form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationDraft {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl StationDraft {
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn into_station(self, ids: &mut dyn IdSource, prefix: &str) -> Option<Station> {
        if !self.can_submit() {
            return None;
        }
        let mut station = Station::new(ids.next_id(prefix), self.name.trim());
        station.description = non_empty(self.description);
        station.image_url = non_empty(self.image_url);
        Some(station)
    }
}

/// Input of the "new attribute" form. Options are only read for `select`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeDraft {
    pub key: String,
    pub label: String,
    pub kind: Option<AttributeTag>,
    pub options: String,
}

impl AttributeDraft {
    pub fn into_definition(self) -> Option<AttributeDefinition> {
        let key = self.key.trim();
        if key.is_empty() || self.label.is_empty() {
            return None;
        }
        let kind = match self.kind? {
            AttributeTag::Text => AttributeKind::Text,
            AttributeTag::Number => AttributeKind::Number,
            AttributeTag::Boolean => AttributeKind::Boolean,
            AttributeTag::Select => AttributeKind::Select {
                options: parse_options(&self.options),
            },
        };
        Some(AttributeDefinition::new(key, self.label, kind))
    }
}

/// Label pair from the labels form; empty input is replaced by the fallback label.
pub fn labels_from_input(singular: &str, plural: &str) -> (String, String) {
    let pick = |raw: &str| {
        if raw.is_empty() {
            crate::view::DEFAULT_ENTITY_LABEL.to_owned()
        } else {
            raw.to_owned()
        }
    };
    (pick(singular), pick(plural))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::seed::initial_config;

    #[test]
    fn coerces_by_kind() {
        let material = AttributeKind::Select {
            options: vec!["Acciaio".into(), "Carta".into()],
        };
        assert_eq!(
            parse_attr_input(&AttributeKind::Number, " 12.5 "),
            Ok(Some(AttributeValue::Number(12.5)))
        );
        assert_eq!(parse_attr_input(&AttributeKind::Number, "  "), Ok(None));
        assert!(matches!(
            parse_attr_input(&AttributeKind::Number, "dodici"),
            Err(AttributeInputError::NotANumber(_))
        ));
        assert_eq!(
            parse_attr_input(&AttributeKind::Boolean, "Sì"),
            Ok(Some(AttributeValue::Boolean(true)))
        );
        assert_eq!(
            parse_attr_input(&material, "Carta"),
            Ok(Some(AttributeValue::Choice("Carta".into())))
        );
        assert!(parse_attr_input(&material, "Legno").is_err());
    }

    #[test]
    fn options_are_trimmed_and_filtered() {
        assert_eq!(parse_options(" Acciaio, ,Plastica,,Carta "), ["Acciaio", "Plastica", "Carta"]);
        assert!(parse_options("").is_empty());
    }

    #[test]
    fn entity_draft_requires_a_name() {
        let mut ids = SequentialIds::new();
        let blank = EntityDraft {
            name: "   ".into(),
            ..EntityDraft::default()
        };
        assert!(blank.into_entity(&mut ids, "en_").is_none());

        let draft = EntityDraft {
            name: "  Fusto B ".into(),
            description: Some(String::new()),
            station: Some(StationId::new("")),
            ..EntityDraft::default()
        }
        .with_raw_attributes(
            &initial_config(),
            [("weightKg", "3"), ("unknown", "x"), ("material", "")],
        )
        .unwrap();
        let entity = draft.into_entity(&mut ids, "en_").unwrap();
        assert_eq!(entity.id.as_str(), "en_1");
        assert_eq!(entity.name, "Fusto B");
        assert!(entity.description.is_none());
        assert!(entity.current_station_id.is_none());
        assert_eq!(entity.attributes.len(), 1);
    }

    #[test]
    fn station_draft_drops_empty_optionals() {
        let station = StationDraft {
            name: "Etichettatura".into(),
            description: Some("Applica etichette".into()),
            image_url: Some(String::new()),
        }
        .into_station(&mut SequentialIds::new(), "ws_")
        .unwrap();
        assert_eq!(station.description.as_deref(), Some("Applica etichette"));
        assert!(station.image_url.is_none());
    }

    #[test]
    fn attribute_draft_needs_key_label_and_kind() {
        let incomplete = AttributeDraft {
            key: "color".into(),
            label: String::new(),
            kind: Some(AttributeTag::Text),
            ..AttributeDraft::default()
        };
        assert!(incomplete.into_definition().is_none());

        let select = AttributeDraft {
            key: " color ".into(),
            label: "Colore".into(),
            kind: Some(AttributeTag::Select),
            options: "Rosso, Blu".into(),
        }
        .into_definition()
        .unwrap();
        assert_eq!(select.key, "color");
        assert_eq!(
            select.kind,
            AttributeKind::Select {
                options: vec!["Rosso".into(), "Blu".into()]
            }
        );
    }

    #[test]
    fn empty_labels_use_fallback() {
        assert_eq!(
            labels_from_input("", "Fusti"),
            ("Entità".to_owned(), "Fusti".to_owned())
        );
    }
}
