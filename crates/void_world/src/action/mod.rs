//! Actions - the units of per-frame behaviour
//!
//! Every action reflects an external `Name`. Lists hold further actions
//! under `Actions` and update them in order.

mod create;
mod destroy;
mod event;
mod list_if;
mod print;

pub use create::{ActionCreateAction, CLASS_NAME, INSTANCE_NAME};
pub use destroy::ActionDestroyAction;
pub use event::{ActionEvent, DELAY};
pub use list_if::{ActionListIf, CONDITION, ELSE, THEN};
pub use print::{ActionPrint, LOG};

use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use crate::error::WorldResult;
use crate::object::{GameObject, ACTIONS, NAME};
use crate::world::World;

/// State shared by every action
#[derive(Debug, Clone, Default)]
pub struct Action {
    name: Field<String>,
}

impl Action {
    pub fn name(&self) -> String {
        self.name.get()
    }

    pub fn declare(&self, signatures: &mut Signatures) {
        signatures.external(NAME, &self.name);
    }
}

/// Runs each of its child actions in order
#[derive(Debug, Clone, Default)]
pub struct ActionList {
    action: Action,
}

impl ActionList {
    pub fn name(&self) -> String {
        self.action.name()
    }
}

impl Rtti for ActionList {}

impl Attributed for ActionList {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.action.declare(signatures);
        signatures.table(ACTIONS);
    }
}

impl GameObject for ActionList {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        world.update_children(this, ACTIONS)
    }
}
