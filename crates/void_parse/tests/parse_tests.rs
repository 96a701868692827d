//! Integration tests for void_parse
//!
//! Worlds built from JSON documents, helper dispatch rules, and loader errors

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::Vec4;
use serde_json::{Map, Value};
use void_core::register;
use void_parse::*;
use void_scope::{DatumType, ScopeId};
use void_world::action::{ActionListIf, ActionPrint, ELSE, THEN};
use void_world::{Entity, Factories, GameObject, Sector, World, ACTIONS, NAME};

fn world() -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut factories = Factories::with_builtins().unwrap();
    register!(factories.entities, "EntityClass" => Entity as dyn GameObject).unwrap();
    World::new("Loaded", factories).unwrap()
}

fn load(json: &str) -> World {
    load_world(json, world()).unwrap()
}

fn only(ids: Vec<ScopeId>) -> ScopeId {
    assert_eq!(ids.len(), 1, "expected exactly one table, got {:?}", ids);
    ids[0]
}

#[test]
fn test_sector_entity_and_leaf() {
    let world = load(
        r#"{"Sector_MySector": {"Entity_EntityClass_E1": {"Health": {"Type": "Integer", "Value": 10}}}}"#,
    );

    let sector = only(world.sectors());
    assert_eq!(world.object_as::<Sector>(sector).unwrap().name(), "MySector");

    let entity = only(world.entities(sector));
    assert_eq!(world.object_as::<Entity>(entity).unwrap().name(), "E1");

    let health = world.tree().find(entity, "Health").unwrap();
    assert_eq!(health.datum_type(), DatumType::Integer);
    assert_eq!(health.len(), 1);
    assert_eq!(*health, 10);
    assert!(world.tree().is_auxiliary_attribute(entity, "Health"));
}

#[test]
fn test_nested_tables_and_arrays() {
    let world = load(
        r#"{
            "Sector_Yard": {
                "Entity_Entity_Crate": {
                    "Loot": {
                        "Coins": {"Type": "Integer", "Value": [1, 2, 3]},
                        "Label": {"Type": "String", "Value": "gold"}
                    },
                    "Offset": {"Type": "Vector4", "Value": "vec4(1, 2, 3, 4)"},
                    "Weight": {"Type": "Float", "Value": 2.5}
                }
            }
        }"#,
    );

    let crate_id = only(world.entities(only(world.sectors())));
    let loot = only(world.children_at(crate_id, "Loot"));
    let coins = world.tree().find(loot, "Coins").unwrap();
    assert_eq!(coins.values::<i32>().unwrap(), vec![1, 2, 3]);
    assert_eq!(*world.tree().find(loot, "Label").unwrap(), "gold");
    assert_eq!(
        world.tree().find(crate_id, "Offset").unwrap().get::<Vec4>(0).unwrap(),
        Vec4::new(1.0, 2.0, 3.0, 4.0)
    );
    assert_eq!(*world.tree().find(crate_id, "Weight").unwrap(), 2.5f32);
}

#[test]
fn test_repeated_leaf_appends_to_owned_datum() {
    let mut master = world_master(world()).unwrap();
    master
        .parse(r#"{"Sector_S": {"Entity_Entity_E": {"Tags": {"Type": "String", "Value": ["a", "b"]}}}}"#)
        .unwrap();

    let data = master.shared_data_mut::<ScopeSharedData>().unwrap();
    let entity = only(data.world().entities(only(data.world().sectors())));
    data.set_focus(entity);

    // a document applied at an entity focus
    let mut helper = ScopeParseHelper::new();
    let leaf: Map<String, Value> = serde_json::from_str(r#"{"Type": "String", "Value": "c"}"#).unwrap();
    assert!(helper.start_handler("Tags", &leaf, &mut *data).unwrap());
    assert!(helper.value_handler("Type", &leaf["Type"], &mut *data).unwrap());
    assert!(helper.value_handler("Value", &leaf["Value"], &mut *data).unwrap());
    assert!(helper.end_handler("Tags", &leaf, &mut *data).unwrap());

    let tags = data.world().tree().find(entity, "Tags").unwrap();
    assert_eq!(tags.values::<String>().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_leaf_overwrites_external_attribute() {
    let world = load(r#"{"Sector_Old": {"Name": {"Type": "String", "Value": "Renamed"}}}"#);

    let sector = only(world.sectors());
    assert_eq!(world.object_as::<Sector>(sector).unwrap().name(), "Renamed");
    let name = world.tree().find(sector, NAME).unwrap();
    assert!(name.is_external());
    assert_eq!(name.len(), 1);
}

#[test]
fn test_action_list_if_branches() {
    let world = load(
        r#"{"Sector_S": {"Entity_Entity_E": {"Action_ActionListIf_Choice": {
            "Condition": {"Type": "Integer", "Value": 1},
            "Action_ActionPrint_Yes_Then": {"Log": {"Type": "String", "Value": "yes"}},
            "Action_ActionPrint_No_Else": {"Log": {"Type": "String", "Value": "no"}},
            "Action_ActionPrint_Always": {"Log": {"Type": "String", "Value": "listed"}}
        }}}}"#,
    );

    let entity = only(world.entities(only(world.sectors())));
    let choice = only(world.actions(entity));
    assert_eq!(world.object_as::<ActionListIf>(choice).unwrap().condition(), 1);

    let then = only(world.children_at(choice, THEN));
    let otherwise = only(world.children_at(choice, ELSE));
    let listed = only(world.children_at(choice, ACTIONS));
    assert_eq!(world.object_as::<ActionPrint>(then).unwrap().message(), "yes");
    assert_eq!(world.object_as::<ActionPrint>(otherwise).unwrap().message(), "no");
    assert_eq!(world.object_as::<ActionPrint>(listed).unwrap().message(), "listed");
    assert_eq!(world.name_of(then).as_deref(), Some("Yes"));
}

#[test]
fn test_loaded_event_reaches_loaded_reaction() {
    let mut world = load(
        r#"{
            "Reaction_ReactionAttributed_Guard": {
                "SubType": {"Type": "String", "Value": "Alarm"},
                "Action_ActionPrint_Shout": {"Log": {"Type": "String", "Value": "intruder!"}}
            },
            "Sector_S": {"Entity_Entity_E": {"Action_ActionEvent_Raise": {
                "Delay": {"Type": "Integer", "Value": 0},
                "SubType": {"Type": "String", "Value": "Alarm"},
                "Volume": {"Type": "Integer", "Value": 3}
            }}}
        }"#,
    );

    let guard = only(world.reactions());
    assert_eq!(world.actions(guard).len(), 1);
    assert!(world.tree().find(guard, "Volume").is_none());

    world.tick(Duration::from_millis(16)).unwrap();
    assert_eq!(*world.tree().find(guard, "Volume").unwrap(), 3);
}

#[test]
fn test_unclaimed_members_are_skipped() {
    let world = load(r#"{"Comment": "ignored", "Sector_S": {"Entity_Entity_E": {}, "Loose": 7}}"#);

    let sector = only(world.sectors());
    assert!(world.tree().find(world.root(), "Comment").is_none());
    assert!(world.tree().find(sector, "Loose").is_none());
}

#[test]
fn test_master_without_helpers_changes_nothing() {
    let mut master = ParseMaster::new(ScopeSharedData::new(world()));
    master.parse(r#"{"Sector_S": {}}"#).unwrap();
    let data = master.into_shared::<ScopeSharedData>().unwrap();
    assert!(data.world().sectors().is_empty());
}

#[test]
fn test_placement_errors() {
    let cases = [
        r#"{"Entity_Entity_E": {}}"#,
        r#"{"Sector_S": {"Sector_T": {}}}"#,
        r#"{"Sector_S": {"Reaction_ReactionAttributed_R": {}}}"#,
        r#"{"Sector_S": {"Action_ActionPrint_P": {}}}"#,
    ];
    for json in cases {
        let result = load_world(json, world());
        assert!(
            matches!(result, Err(ParseError::UnexpectedContainer { .. })),
            "{} gave {:?}",
            json,
            result
        );
    }
}

#[test]
fn test_key_and_leaf_errors() {
    assert!(matches!(
        load_world(r#"{"Sector_S": {"Entity_OnlyClass": {}}}"#, world()),
        Err(ParseError::MalformedKey(key)) if key == "Entity_OnlyClass"
    ));
    assert!(matches!(
        load_world(r#"{"Sector_S": {"Count": {"Value": 3}}}"#, world()),
        Err(ParseError::MissingType(key)) if key == "Count"
    ));
    assert!(matches!(
        load_world(r#"{"Sector_S": {"Spin": {"Type": "Quaternion", "Value": 1}}}"#, world()),
        Err(ParseError::UnknownType { type_name, .. }) if type_name == "Quaternion"
    ));
    assert!(matches!(
        load_world(r#"{"Sector_S": {"Count": {"Type": "Integer", "Value": 1.5}}}"#, world()),
        Err(ParseError::Datum(_))
    ));
    assert!(matches!(
        load_world(r#"{"Sector_S": {"Entity_Missing_E": {}}}"#, world()),
        Err(ParseError::World(_))
    ));
    assert!(matches!(load_world("[]", world()), Err(ParseError::RootNotObject)));
    assert!(matches!(load_world("{\"a\":", world()), Err(ParseError::Json(_))));
}

#[test]
fn test_clone_parses_independently() {
    let master = world_master(world()).unwrap();
    let mut clone = master.clone_master();
    assert!(clone.is_clone());
    assert!(matches!(
        clone.add_helper(Box::new(ScopeParseHelper::new())),
        Err(ParseError::CloneLocked)
    ));

    let handle = std::thread::spawn(move || {
        clone.parse(r#"{"Sector_A": {}, "Sector_B": {}}"#).unwrap();
        let data = clone.shared_data::<ScopeSharedData>().unwrap();
        assert!(data.is_clone());
        data.world().sectors().len()
    });
    assert_eq!(handle.join().unwrap(), 2);

    let data = master.shared_data::<ScopeSharedData>().unwrap();
    assert!(data.world().sectors().is_empty());
}

/// Claims `Sector_*` objects before the world grammar sees them
#[derive(Clone, Default)]
struct SectorVeto {
    vetoed: Arc<AtomicUsize>,
}

impl ParseHelper for SectorVeto {
    fn start_handler(&mut self, key: &str, _: &Map<String, Value>, _: &mut dyn SharedData) -> ParseResult<bool> {
        Ok(key.starts_with("Sector_"))
    }

    fn value_handler(&mut self, _: &str, _: &Value, _: &mut dyn SharedData) -> ParseResult<bool> {
        Ok(false)
    }

    fn end_handler(&mut self, _: &str, _: &Map<String, Value>, _: &mut dyn SharedData) -> ParseResult<bool> {
        self.vetoed.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn priority(&self) -> i32 {
        10
    }

    fn clone_helper(&self) -> Box<dyn ParseHelper> {
        Box::new(self.clone())
    }
}

#[test]
fn test_higher_priority_helper_claims_first() {
    let veto = SectorVeto::default();
    let vetoed = veto.vetoed.clone();

    let mut master = world_master(world()).unwrap();
    master.add_helper(Box::new(veto)).unwrap();
    master.parse(r#"{"Sector_S": {}, "Reaction_ReactionAttributed_R": {}}"#).unwrap();

    assert_eq!(vetoed.load(Ordering::SeqCst), 1);
    let data = master.shared_data::<ScopeSharedData>().unwrap();
    assert!(data.world().sectors().is_empty());
    assert_eq!(data.world().reactions().len(), 1);
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("void_parse_{}.json", std::process::id()));
    std::fs::write(&path, r#"{"Sector_FromDisk": {}}"#).unwrap();

    let mut master = world_master(world()).unwrap();
    master.parse_file(&path).unwrap();
    assert_eq!(master.file_name(), Some(path.as_path()));

    let world = load_world_file(&path, world()).unwrap();
    let sector = only(world.sectors());
    assert_eq!(world.name_of(sector).as_deref(), Some("FromDisk"));
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        load_world_file(&path, self::world()),
        Err(ParseError::Io { .. })
    ));
}
