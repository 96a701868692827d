use std::sync::Arc;
use std::time::Duration;

use void_core::Rtti;
use void_event::Event;
use void_scope::{Attributed, DatumType, Field, ScopeId, Signatures};

use super::Action;
use crate::error::WorldResult;
use crate::object::GameObject;
use crate::reaction::{EventMessage, SUBTYPE};
use crate::world::World;

pub const DELAY: &str = "Delay";

/// Raises an event carrying its auxiliary attributes as arguments.
/// `Delay` is in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct ActionEvent {
    action: Action,
    subtype: Field<String>,
    delay: Field<i32>,
}

impl ActionEvent {
    pub fn subtype(&self) -> String {
        self.subtype.get()
    }

    pub fn set_subtype(&self, subtype: &str) {
        self.subtype.set(subtype.to_string());
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay.get().max(0) as u64)
    }

    pub fn set_delay(&self, millis: i32) {
        self.delay.set(millis);
    }
}

impl Rtti for ActionEvent {}

impl Attributed for ActionEvent {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.action.declare(signatures);
        signatures
            .external(SUBTYPE, &self.subtype)
            .external(DELAY, &self.delay);
    }
}

impl GameObject for ActionEvent {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.state_mut().current_action = Some(this);
        let arguments = world
            .tree()
            .auxiliary_attributes(this)
            .into_iter()
            .filter(|(_, datum)| datum.datum_type() != DatumType::Table)
            .map(|(key, datum)| (key.to_string(), datum.detached()))
            .collect();
        let message = EventMessage::new(self.subtype.get(), arguments);

        let event = Arc::new(Event::new(message, world.subscribers()));
        let now = world.state().game_time.total;
        world.events().enqueue(event, now, self.delay());
        log::trace!("{} raised '{}'", this, self.subtype.get());
        Ok(())
    }
}
