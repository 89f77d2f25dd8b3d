//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use r_track_core::seed::{initial_state, IdPrefixes};
use r_track_core::view::{entity_table, render_attr_value, station_board, workflow_matrix};
use r_track_core::{
    Action, ActionOutcome, AppState, AppStore, AttributeDefinition, AttributeValue,
    Configuration, Entity, NoOpReason, SequentialIds, Station, StepStatus,
};
use serde_json::json;

fn demo_store() -> AppStore {
    AppStore::new(initial_state(&mut SequentialIds::new(), &IdPrefixes::default()))
}

fn station_names(store: &AppStore) -> Vec<String> {
    store
        .state()
        .stations
        .iter()
        .map(|station| station.name.clone())
        .collect()
}

#[test]
fn removing_an_attribute_strips_entity_values() {
    let mut store = AppStore::new(AppState::with_config(Configuration {
        singular_label: "Fusto".into(),
        plural_label: "Fusti".into(),
        attributes: vec![AttributeDefinition::number("weightKg", "Peso (kg)")],
    }));
    store.add_entity(
        Entity::new("en_a", "Fusto A").with_attribute("weightKg", AttributeValue::Number(12.5)),
    );

    assert!(store.remove_attribute("weightKg").is_applied());

    let state = store.snapshot();
    let fusto = state.entity(&"en_a".into()).unwrap();
    assert!(!fusto.attributes.contains_key("weightKg"));
    let weight = AttributeDefinition::number("weightKg", "Peso (kg)");
    assert_eq!(render_attr_value(&weight, fusto.attribute("weightKg")), "-");
}

#[test]
fn moving_a_station_up_swaps_with_its_neighbour() {
    let mut store = demo_store();
    let riempimento = store.state().stations[1].id.clone();

    assert!(store.move_station_up(&riempimento).is_applied());
    assert_eq!(station_names(&store), ["Riempimento", "Lavaggio", "Sigillatura"]);

    let first = store.state().stations[0].id.clone();
    let last = store.state().stations[2].id.clone();
    assert_eq!(
        store.move_station_up(&first),
        ActionOutcome::NoOp(NoOpReason::AtBoundary)
    );
    assert_eq!(
        store.move_station_down(&last),
        ActionOutcome::NoOp(NoOpReason::AtBoundary)
    );
    assert_eq!(station_names(&store), ["Riempimento", "Lavaggio", "Sigillatura"]);
}

#[test]
fn removing_the_assigned_station_detaches_the_entity() {
    let mut store = demo_store();
    let fusto = store.state().entities[0].id.clone();
    let station = Station::new("ws_x", "Controllo");
    store.add_station(station.clone());
    store.set_entity_station(&fusto, Some(&station.id));
    store.toggle_matrix_cell(&fusto, &station.id);

    assert!(store.remove_station(&station.id).is_applied());

    let state = store.snapshot();
    assert!(state.entity(&fusto).unwrap().current_station_id.is_none());
    assert!(!state.statuses.row(&fusto).unwrap().contains_key(&station.id));
    assert_eq!(
        store.remove_station(&station.id),
        ActionOutcome::NoOp(NoOpReason::UnknownStation)
    );
}

#[test]
fn first_toggle_creates_the_row() {
    let mut store = AppStore::new(AppState::with_config(Configuration {
        singular_label: String::new(),
        plural_label: String::new(),
        attributes: Vec::new(),
    }));
    let entity = "en_lonely".into();
    let station = "ws_lonely".into();
    assert!(!store.state().statuses.has_row(&entity));

    assert_eq!(store.toggle_matrix_cell(&entity, &station), StepStatus::Pass);
    assert!(store.state().statuses.has_row(&entity));
}

#[test]
fn deleting_an_entity_drops_its_row() {
    let mut store = demo_store();
    let fusto = store.state().entities[0].id.clone();
    store.delete_entity(&fusto);
    assert!(store.state().entities.is_empty());
    assert!(!store.state().statuses.has_row(&fusto));
    assert_eq!(
        store.delete_entity(&fusto),
        ActionOutcome::NoOp(NoOpReason::UnknownEntity)
    );
}

#[test]
fn duplicate_attribute_is_ignored() {
    let mut store = demo_store();
    let outcome = store.add_attribute(AttributeDefinition::text("weightKg", "Altro"));
    assert_eq!(outcome, ActionOutcome::NoOp(NoOpReason::DuplicateAttributeKey));
    assert_eq!(store.state().config.attributes.len(), 3);
}

#[test]
fn dangling_station_reads_as_unassigned() {
    let mut store = demo_store();
    let fusto = store.state().entities[0].id.clone();
    assert!(store
        .set_entity_station(&fusto, Some(&"ws_missing".into()))
        .is_applied());

    let state = store.snapshot();
    assert!(state.station_of(&state.entities[0]).is_none());
    assert_eq!(entity_table(&state).rows[0].station, "-");
    assert_eq!(station_board(&state).last().unwrap().count(), 1);
}

#[test]
fn scripted_actions_drive_the_views() {
    let mut store = demo_store();
    let script = [
        json!({"type": "set_entity_labels", "singular": "Fusto", "plural": "Fusti"}),
        json!({"type": "set_entity_station", "id": "en_4", "station": "ws_2"}),
        json!({"type": "toggle_matrix_cell", "entity": "en_4", "station": "ws_1"}),
        json!({"type": "toggle_matrix_cell", "entity": "en_4", "station": "ws_3"}),
        json!({"type": "toggle_matrix_cell", "entity": "en_4", "station": "ws_3"}),
    ];
    for value in script {
        let action: Action = serde_json::from_value(value).unwrap();
        assert!(store.dispatch(action).is_applied());
    }
    assert_eq!(store.revision(), 5);

    let state = store.snapshot();
    let matrix = workflow_matrix(&state);
    assert_eq!(matrix.entity_header, "Fusto");
    assert_eq!(matrix.rows[0].labels(), ["OK", "—", "KO"]);
    assert_eq!(station_board(&state)[1].entities[0].name, "Fusto A");
    assert_eq!(entity_table(&state).title, "Elenco Fusti");
}
