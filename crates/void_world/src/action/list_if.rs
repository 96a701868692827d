use void_core::Rtti;
use void_scope::{Attributed, Field, ScopeId, Signatures};

use super::ActionList;
use crate::error::{WorldError, WorldResult};
use crate::object::GameObject;
use crate::world::World;

pub const THEN: &str = "Then";
pub const ELSE: &str = "Else";
pub const CONDITION: &str = "Condition";

/// Runs the first action of `Then` when `Condition` is 1, the first action of
/// `Else` when it is 0, and nothing otherwise
#[derive(Debug, Clone, Default)]
pub struct ActionListIf {
    list: ActionList,
    condition: Field<i32>,
}

impl ActionListIf {
    pub fn condition(&self) -> i32 {
        self.condition.get()
    }

    pub fn set_condition(&self, condition: i32) {
        self.condition.set(condition);
    }
}

impl Rtti for ActionListIf {}

impl Attributed for ActionListIf {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.list.initialize_attributes(signatures);
        signatures
            .table(THEN)
            .table(ELSE)
            .external(CONDITION, &self.condition);
    }
}

impl GameObject for ActionListIf {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        let branch = match self.condition.get() {
            1 => THEN,
            0 => ELSE,
            _ => return Ok(()),
        };
        let target = world
            .children_at(this, branch)
            .first()
            .copied()
            .ok_or(WorldError::InvalidBranch { id: this, branch })?;
        world.update_object(target)
    }
}
