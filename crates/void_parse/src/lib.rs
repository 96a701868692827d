//! # Void Parse
//!
//! Loads worlds from JSON documents.
//!
//! A [`ParseMaster`] walks the document and offers each member to its
//! [`ParseHelper`]s, which share one [`SharedData`]. The
//! [`ScopeParseHelper`] understands the world grammar (sectors, entities,
//! actions, reactions and typed datums) and writes into a
//! [`ScopeSharedData`].
//!
//! ```ignore
//! let world = World::new("Demo", Factories::with_builtins()?)?;
//! let world = void_parse::load_world(r#"{"Sector_Main": {}}"#, world)?;
//! ```

use std::path::Path;

use void_world::World;

mod error;
mod helper;
mod master;
mod shared;

pub use error::{ParseError, ParseResult};
pub use helper::{ScopeParseHelper, TYPE, VALUE};
pub use master::{ParseHelper, ParseMaster, SharedData};
pub use shared::ScopeSharedData;

/// A master wired with the world grammar
pub fn world_master(world: World) -> ParseResult<ParseMaster> {
    let mut master = ParseMaster::new(ScopeSharedData::new(world));
    master.add_helper(Box::new(ScopeParseHelper::new()))?;
    Ok(master)
}

/// Populate `world` from a JSON document
pub fn load_world(json: &str, world: World) -> ParseResult<World> {
    let mut master = world_master(world)?;
    master.parse(json)?;
    finish(master)
}

/// Populate `world` from a JSON file
pub fn load_world_file(path: impl AsRef<Path>, world: World) -> ParseResult<World> {
    let mut master = world_master(world)?;
    master.parse_file(path)?;
    finish(master)
}

fn finish(master: ParseMaster) -> ParseResult<World> {
    let world = master
        .into_shared::<ScopeSharedData>()
        .map(ScopeSharedData::into_world)
        .ok_or(ParseError::SharedDataType("ScopeSharedData"))?;
    log::info!(
        "loaded world '{}': {} sectors, {} reactions",
        world.name(),
        world.sectors().len(),
        world.reactions().len()
    );
    Ok(world)
}

pub mod prelude {
    pub use crate::{
        load_world, load_world_file, world_master, ParseError, ParseHelper, ParseMaster, ParseResult,
        ScopeParseHelper, ScopeSharedData, SharedData,
    };
}
