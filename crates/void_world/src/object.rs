//! The game object family stored in a world's tree

use std::sync::Arc;

use void_core::RttiRef;
use void_scope::{Attributed, Object, ScopeId};

use crate::error::WorldResult;
use crate::reaction::EventMessage;
use crate::world::World;

/// Key of the external name every game object carries
pub const NAME: &str = "Name";
pub const SECTORS: &str = "Sectors";
pub const REACTIONS: &str = "Reactions";
pub const ENTITIES: &str = "Entities";
pub const ACTIONS: &str = "Actions";

/// A reflected object that takes part in the world update
///
/// `this` is the table reflecting `self`. Objects receive the whole world
/// mutably, so they can create, adopt, and queue tables for destruction.
pub trait GameObject: Attributed + GameObjectClone {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()>;

    /// Handle an event message delivered to the world's reactions
    fn react(&self, _this: ScopeId, _world: &mut World, _message: &EventMessage) -> WorldResult<()> {
        Ok(())
    }
}

/// Object-safe cloning for [`GameObject`] trait objects
pub trait GameObjectClone {
    fn clone_game_object(&self) -> Arc<dyn GameObject>;
}

impl<T: GameObject + Clone> GameObjectClone for T {
    fn clone_game_object(&self) -> Arc<dyn GameObject> {
        Arc::new(self.clone())
    }
}

impl Object for dyn GameObject {
    fn attributed(&self) -> &dyn Attributed {
        self
    }

    fn duplicate(&self) -> Arc<Self> {
        self.clone_game_object()
    }

    fn into_rtti(self: Arc<Self>) -> RttiRef {
        self
    }
}
