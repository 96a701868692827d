//! # void_world - Game Object Hierarchy
//!
//! Worlds, sectors, entities, and actions built on reflected tables:
//! - **World**: owns the table tree, the clock, the event queue, and the
//!   class registries
//! - **Sector** / **Entity**: containers updated every frame
//! - **Actions**: lists, conditionals, printing, creation, destruction, and
//!   event raising
//! - **Reactions**: action lists triggered by event messages
//!
//! Each object is a [`GameObject`]: an [`Attributed`](void_scope::Attributed)
//! native type whose table lives in the world's tree.

pub mod action;
mod entity;
mod error;
mod factory;
mod object;
mod reaction;
mod sector;
mod state;
mod world;

pub use action::{
    Action, ActionCreateAction, ActionDestroyAction, ActionEvent, ActionList, ActionListIf,
    ActionPrint,
};
pub use entity::Entity;
pub use error::{WorldError, WorldResult};
pub use factory::Factories;
pub use object::{GameObject, GameObjectClone, ACTIONS, ENTITIES, NAME, REACTIONS, SECTORS};
pub use reaction::{EventMessage, ReactionAttributed, ReactionRelay, SUBTYPE};
pub use sector::Sector;
pub use state::{GameTime, WorldState};
pub use world::{World, WorldRoot};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{Factories, GameObject, World, WorldError, WorldResult};
}
