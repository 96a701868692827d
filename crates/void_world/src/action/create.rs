use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use super::Action;
use crate::error::{WorldError, WorldResult};
use crate::object::GameObject;
use crate::world::World;

pub const CLASS_NAME: &str = "ClassName";
pub const INSTANCE_NAME: &str = "InstanceName";

/// Creates an action of class `ClassName` named `InstanceName` beside itself
#[derive(Debug, Clone, Default)]
pub struct ActionCreateAction {
    action: Action,
    class_name: Field<String>,
    instance_name: Field<String>,
}

impl Rtti for ActionCreateAction {}

impl Attributed for ActionCreateAction {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.action.declare(signatures);
        signatures
            .external(CLASS_NAME, &self.class_name)
            .external(INSTANCE_NAME, &self.instance_name);
    }
}

impl GameObject for ActionCreateAction {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        let parent = world.tree().parent(this).ok_or(WorldError::Detached(this))?;
        world.create_action(parent, &self.class_name.get(), &self.instance_name.get())?;
        Ok(())
    }
}
