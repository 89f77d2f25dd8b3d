//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Demo data the store starts with when nothing is hydrated.

use crate::ids::IdSource;
use crate::model::{AttributeDefinition, AttributeValue, Configuration, Entity, Station};
use crate::state::AppState;

/// Prefixes applied to generated ids.
#[derive(Debug, Clone)]
pub struct IdPrefixes {
    pub station: String,
    pub entity: String,
}

impl Default for IdPrefixes {
    fn default() -> Self {
        Self {
            station: "ws_".to_owned(),
            entity: "en_".to_owned(),
        }
    }
}

/// Labels "Oggetto"/"Oggetti" with weight, cleanliness and material attributes.
pub fn initial_config() -> Configuration {
    Configuration {
        singular_label: "Oggetto".to_owned(),
        plural_label: "Oggetti".to_owned(),
        attributes: vec![
            AttributeDefinition::number("weightKg", "Peso (kg)"),
            AttributeDefinition::boolean("isClean", "Pulito"),
            AttributeDefinition::select("material", "Materiale", ["Acciaio", "Plastica", "Carta"]),
        ],
    }
}

/// Washing, filling and sealing, in that order.
pub fn initial_stations(ids: &mut dyn IdSource, prefixes: &IdPrefixes) -> Vec<Station> {
    [
        ("Lavaggio", "Pulisce i pezzi"),
        ("Riempimento", "Riempie i contenitori"),
        ("Sigillatura", "Chiude/sigilla"),
    ]
    .into_iter()
    .map(|(name, description)| {
        Station::new(ids.next_id(&prefixes.station), name).with_description(description)
    })
    .collect()
}

pub fn initial_entities(ids: &mut dyn IdSource, prefixes: &IdPrefixes) -> Vec<Entity> {
    vec![Entity::new(ids.next_id(&prefixes.entity), "Fusto A")
        .with_description("Primo lotto")
        .with_attribute("weightKg", AttributeValue::Number(12.5))
        .with_attribute("isClean", AttributeValue::Boolean(false))
        .with_attribute("material", AttributeValue::Choice("Acciaio".to_owned()))]
}

/// The full demo state. Seeded entities get their matrix rows like any added entity.
pub fn initial_state(ids: &mut dyn IdSource, prefixes: &IdPrefixes) -> AppState {
    let mut state = AppState::with_config(initial_config());
    for station in initial_stations(ids, prefixes) {
        state.add_station(station);
    }
    for entity in initial_entities(ids, prefixes) {
        state.add_entity(entity);
    }
    state
}

/// Labels and schema only.
pub fn empty_state() -> AppState {
    AppState::with_config(initial_config())
}
