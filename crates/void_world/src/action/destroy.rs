use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use super::create::INSTANCE_NAME;
use super::Action;
use crate::error::WorldResult;
use crate::object::GameObject;
use crate::world::World;

/// Destroys the nearest action named `InstanceName`, searching the `Actions`
/// of each ancestor in turn. Destruction happens at the end of the frame.
#[derive(Debug, Clone, Default)]
pub struct ActionDestroyAction {
    action: Action,
    instance_name: Field<String>,
}

impl Rtti for ActionDestroyAction {}

impl Attributed for ActionDestroyAction {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.action.declare(signatures);
        signatures.external(INSTANCE_NAME, &self.instance_name);
    }
}

impl GameObject for ActionDestroyAction {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        let target = self.instance_name.get();
        let ancestors: Vec<ScopeId> = world.tree().ancestors(this).collect();

        for ancestor in ancestors {
            let victim = world
                .actions(ancestor)
                .into_iter()
                .find(|&action| world.name_of(action).as_deref() == Some(target.as_str()));
            if let Some(victim) = victim {
                world.queue_destroy(victim);
                return Ok(());
            }
        }
        log::debug!("no action named '{}' above {}", target, this);
        Ok(())
    }
}
