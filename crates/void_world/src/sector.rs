use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use crate::error::WorldResult;
use crate::object::{GameObject, ENTITIES, NAME};
use crate::world::World;

/// A region of the world holding entities
#[derive(Debug, Clone, Default)]
pub struct Sector {
    name: Field<String>,
}

impl Sector {
    pub fn named(name: &str) -> Self {
        Self {
            name: Field::new(name.to_string()),
        }
    }

    pub fn name(&self) -> String {
        self.name.get()
    }
}

impl Rtti for Sector {}

impl Attributed for Sector {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        signatures.table(ENTITIES).external(NAME, &self.name);
    }
}

impl GameObject for Sector {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_sector = Some(this);
        world.update_children(this, ENTITIES)
    }
}
