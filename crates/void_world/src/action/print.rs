use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use super::Action;
use crate::error::WorldResult;
use crate::object::GameObject;
use crate::world::World;

pub const LOG: &str = "Log";

/// Writes its `Log` attribute to the log every frame
#[derive(Debug, Clone, Default)]
pub struct ActionPrint {
    action: Action,
    log: Field<String>,
}

impl ActionPrint {
    pub fn message(&self) -> String {
        self.log.get()
    }
}

impl Rtti for ActionPrint {}

impl Attributed for ActionPrint {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.action.declare(signatures);
        signatures.external(LOG, &self.log);
    }
}

impl GameObject for ActionPrint {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        log::info!("[{}] {}", self.action.name(), self.log.get());
        Ok(())
    }
}
