//! Reactions to event messages
//!
//! [`ActionEvent`](crate::ActionEvent) raises an `Event<EventMessage>`. When it
//! is delivered, the world's [`ReactionRelay`] keeps a copy; after delivery
//! has finished the world hands each message to every reaction on its own
//! thread, so tables are never touched from a delivery thread.

use parking_lot::Mutex;
use void_core::Rtti;
use void_event::{EventPublisher, EventSubscriber};
use void_scope::{Attributed, Datum, Field, ScopeId, Signatures};

use crate::action::ActionList;
use crate::error::WorldResult;
use crate::object::GameObject;
use crate::world::World;

pub const SUBTYPE: &str = "SubType";

/// Payload of the events raised by actions
#[derive(Debug, Clone, Default)]
pub struct EventMessage {
    subtype: String,
    arguments: Vec<(String, Datum)>,
}

impl EventMessage {
    pub fn new(subtype: impl Into<String>, arguments: Vec<(String, Datum)>) -> Self {
        Self {
            subtype: subtype.into(),
            arguments,
        }
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Named values copied from the raising action
    pub fn arguments(&self) -> &[(String, Datum)] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Datum> {
        self.arguments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, datum)| datum)
    }
}

/// Subscriber that collects delivered messages for the world's reactions
#[derive(Debug, Default)]
pub struct ReactionRelay {
    inbox: Mutex<Vec<EventMessage>>,
}

impl ReactionRelay {
    /// Take every message collected so far
    pub fn drain(&self) -> Vec<EventMessage> {
        std::mem::take(&mut *self.inbox.lock())
    }

    pub fn len(&self) -> usize {
        self.inbox.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inbox.lock().is_empty()
    }
}

impl EventSubscriber for ReactionRelay {
    fn notify(&self, event: &dyn EventPublisher) {
        if let Some(message) = event.message::<EventMessage>() {
            self.inbox.lock().push(message.clone());
        }
    }
}

/// An action list that runs when a message of its `SubType` arrives.
/// Message arguments are copied onto the reaction first.
#[derive(Debug, Clone, Default)]
pub struct ReactionAttributed {
    list: ActionList,
    subtype: Field<String>,
}

impl ReactionAttributed {
    pub fn subtype(&self) -> String {
        self.subtype.get()
    }

    pub fn set_subtype(&self, subtype: &str) {
        self.subtype.set(subtype.to_string());
    }
}

impl Rtti for ReactionAttributed {}

impl Attributed for ReactionAttributed {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        self.list.initialize_attributes(signatures);
        signatures.external(SUBTYPE, &self.subtype);
    }
}

impl GameObject for ReactionAttributed {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        self.list.update(this, world)
    }

    fn react(&self, this: ScopeId, world: &mut World, message: &EventMessage) -> WorldResult<()> {
        for (key, datum) in message.arguments() {
            if world.tree().is_prescribed_attribute(this, key) {
                log::warn!("reaction {} ignores argument '{}': name is prescribed", this, key);
                continue;
            }
            *world.tree_mut().append(this, key)? = datum.clone();
        }
        if message.subtype() == self.subtype.get() {
            self.update(this, world)?;
        }
        Ok(())
    }
}
