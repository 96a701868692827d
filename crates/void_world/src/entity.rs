use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use crate::error::WorldResult;
use crate::object::{GameObject, ACTIONS, NAME};
use crate::world::World;

/// Something that lives in a sector and runs actions every frame
#[derive(Debug, Clone, Default)]
pub struct Entity {
    name: Field<String>,
}

impl Entity {
    pub fn name(&self) -> String {
        self.name.get()
    }
}

impl Rtti for Entity {}

impl Attributed for Entity {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        signatures.table(ACTIONS).external(NAME, &self.name);
    }
}

impl GameObject for Entity {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_entity = Some(this);
        world.update_children(this, ACTIONS)
    }
}
