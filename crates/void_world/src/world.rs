//! World - the root of a game's table tree
//!
//! The world owns the [`ScopeTree`] holding every sector, entity, action, and
//! reaction, along with the clock, the event queue, and the class registries
//! used to instantiate objects by name.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use void_core::Rtti;
use void_event::{EventQueue, Subscribers};
use void_scope::{Attributed, Field, ScopeId, ScopeTree, Signatures};

use crate::error::{WorldError, WorldResult};
use crate::factory::Factories;
use crate::object::{GameObject, ACTIONS, ENTITIES, NAME, REACTIONS, SECTORS};
use crate::reaction::ReactionRelay;
use crate::sector::Sector;
use crate::state::WorldState;

/// Native object reflected by the world's root table
#[derive(Debug, Clone, Default)]
pub struct WorldRoot {
    name: Field<String>,
}

impl WorldRoot {
    pub fn named(name: &str) -> Self {
        Self {
            name: Field::new(name.to_string()),
        }
    }

    pub fn name(&self) -> String {
        self.name.get()
    }
}

impl Rtti for WorldRoot {}

impl Attributed for WorldRoot {
    fn initialize_attributes(&self, signatures: &mut Signatures) {
        signatures
            .table(SECTORS)
            .table(REACTIONS)
            .external(NAME, &self.name);
    }
}

impl GameObject for WorldRoot {
    fn update(&self, this: ScopeId, world: &mut World) -> WorldResult<()> {
        world.update_children(this, SECTORS)
    }
}

/// A game world: the table tree plus everything needed to run it
pub struct World {
    /// Every table of the world
    tree: ScopeTree<dyn GameObject>,
    /// Table reflecting the world itself
    root: ScopeId,
    /// Clock and update focus
    state: WorldState,
    /// Events waiting for their delay to pass
    events: EventQueue,
    /// Subscribers to event messages raised in this world
    subscribers: Subscribers,
    /// Collects delivered messages for the reactions
    relay: Arc<ReactionRelay>,
    /// Class registries
    factories: Factories,
    /// Tables to destroy at the end of the frame
    doomed: Vec<ScopeId>,
}

impl World {
    /// Create an empty world
    pub fn new(name: &str, factories: Factories) -> WorldResult<Self> {
        let mut tree: ScopeTree<dyn GameObject> = ScopeTree::new();
        let root = tree.create_attributed(Arc::new(WorldRoot::named(name)))?;
        log::debug!("created world '{}'", name);
        Ok(Self::assemble(tree, root, WorldState::new(), factories))
    }

    fn assemble(
        tree: ScopeTree<dyn GameObject>,
        root: ScopeId,
        state: WorldState,
        factories: Factories,
    ) -> Self {
        let subscribers = Subscribers::new();
        let relay = Arc::new(ReactionRelay::default());
        subscribers.subscribe(relay.clone());
        Self {
            tree,
            root,
            state,
            events: EventQueue::new(),
            subscribers,
            relay,
            factories,
            doomed: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        self.name_of(self.root).unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) -> WorldResult<()> {
        self.set_name_of(self.root, name)
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn tree(&self) -> &ScopeTree<dyn GameObject> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ScopeTree<dyn GameObject> {
        &mut self.tree
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Subscribers notified of every event message raised in this world
    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    pub fn factories(&self) -> &Factories {
        &self.factories
    }

    /// The `Name` attribute of any table that has one
    pub fn name_of(&self, id: ScopeId) -> Option<String> {
        self.tree.find(id, NAME)?.get::<String>(0).ok()
    }

    pub fn set_name_of(&mut self, id: ScopeId, name: &str) -> WorldResult<()> {
        let datum = self.tree.append(id, NAME)?;
        if datum.is_empty() {
            datum.assign(name.to_string())?;
        } else {
            datum.set(0, name.to_string())?;
        }
        Ok(())
    }

    /// The game object reflected by `id`
    pub fn game_object(&self, id: ScopeId) -> WorldResult<Arc<dyn GameObject>> {
        self.tree
            .object(id)
            .cloned()
            .ok_or(WorldError::NotAGameObject(id))
    }

    pub fn object_as<T: 'static>(&self, id: ScopeId) -> Option<&T> {
        self.tree.object_as(id)
    }

    fn expect_kind<T: 'static>(&self, id: ScopeId, expected: &'static str) -> WorldResult<()> {
        if !self.tree.contains(id) {
            return Err(void_scope::ScopeError::InvalidHandle(id).into());
        }
        match self.object_as::<T>(id) {
            Some(_) => Ok(()),
            None => Err(WorldError::WrongKind { id, expected }),
        }
    }

    fn spawn(
        &mut self,
        object: Option<Arc<dyn GameObject>>,
        family: &'static str,
        class: &str,
        name: &str,
    ) -> WorldResult<ScopeId> {
        let object = object.ok_or_else(|| WorldError::UnknownClass {
            family,
            class: class.to_string(),
        })?;
        let id = self.tree.create_attributed(object)?;
        self.set_name_of(id, name)?;
        Ok(id)
    }

    // adopt a freshly spawned table, releasing it if adoption fails
    fn attach(&mut self, parent: ScopeId, child: ScopeId, key: &str) -> WorldResult<ScopeId> {
        if let Err(err) = self.tree.adopt(parent, child, key) {
            self.tree.destroy(child)?;
            return Err(err.into());
        }
        Ok(child)
    }

    pub fn create_sector(&mut self, name: &str) -> WorldResult<ScopeId> {
        let sector = self.tree.create_attributed(Arc::new(Sector::named(name)))?;
        log::debug!("created sector '{}' as {}", name, sector);
        self.attach(self.root, sector, SECTORS)
    }

    /// Instantiate an entity class and place it in `sector`
    pub fn create_entity(&mut self, sector: ScopeId, class: &str, name: &str) -> WorldResult<ScopeId> {
        self.expect_kind::<Sector>(sector, "Sector")?;
        let object = self.factories.entities.create(class);
        let entity = self.spawn(object, "entity", class, name)?;
        log::debug!("created entity {} '{}' as {}", class, name, entity);
        self.attach(sector, entity, ENTITIES)
    }

    /// Instantiate an action class under `parent`'s `Actions`
    pub fn create_action(&mut self, parent: ScopeId, class: &str, name: &str) -> WorldResult<ScopeId> {
        self.create_action_in(parent, class, name, ACTIONS)
    }

    /// Instantiate an action class under `parent`'s `key` (a branch, for instance)
    pub fn create_action_in(
        &mut self,
        parent: ScopeId,
        class: &str,
        name: &str,
        key: &str,
    ) -> WorldResult<ScopeId> {
        if !self.tree.contains(parent) {
            return Err(void_scope::ScopeError::InvalidHandle(parent).into());
        }
        let object = self.factories.actions.create(class);
        let action = self.spawn(object, "action", class, name)?;
        log::debug!("created action {} '{}' as {} under '{}'", class, name, action, key);
        self.attach(parent, action, key)
    }

    /// Instantiate a reaction class under the world's `Reactions`
    pub fn create_reaction(&mut self, class: &str, name: &str) -> WorldResult<ScopeId> {
        let object = self.factories.reactions.create(class);
        let reaction = self.spawn(object, "reaction", class, name)?;
        log::debug!("created reaction {} '{}' as {}", class, name, reaction);
        self.attach(self.root, reaction, REACTIONS)
    }

    /// Move an entity into another sector
    pub fn set_sector(&mut self, entity: ScopeId, sector: ScopeId) -> WorldResult<()> {
        self.expect_kind::<Sector>(sector, "Sector")?;
        self.tree.adopt(sector, entity, ENTITIES)?;
        Ok(())
    }

    /// Child tables under `key`
    pub fn children_at(&self, id: ScopeId, key: &str) -> Vec<ScopeId> {
        self.tree.find(id, key).map(|d| d.scopes()).unwrap_or_default()
    }

    pub fn sectors(&self) -> Vec<ScopeId> {
        self.children_at(self.root, SECTORS)
    }

    pub fn entities(&self, sector: ScopeId) -> Vec<ScopeId> {
        self.children_at(sector, ENTITIES)
    }

    pub fn actions(&self, parent: ScopeId) -> Vec<ScopeId> {
        self.children_at(parent, ACTIONS)
    }

    pub fn reactions(&self) -> Vec<ScopeId> {
        self.children_at(self.root, REACTIONS)
    }

    /// First table named `name`, depth first from the root
    pub fn find_by_name(&self, name: &str) -> Option<ScopeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.name_of(id).as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(self.tree.children(id).into_iter().rev());
        }
        None
    }

    /// Destroy `id` once the current update has finished
    pub fn queue_destroy(&mut self, id: ScopeId) {
        if !self.doomed.contains(&id) {
            log::debug!("queued {} for destruction", id);
            self.doomed.push(id);
        }
    }

    /// Tables waiting to be destroyed at the end of the frame
    pub fn pending_destroy(&self) -> &[ScopeId] {
        &self.doomed
    }

    /// Run the update of the object reflected by `id`
    pub fn update_object(&mut self, id: ScopeId) -> WorldResult<()> {
        let object = self.game_object(id)?;
        object.update(id, self)
    }

    /// Update every live child under `key`, in order
    pub fn update_children(&mut self, parent: ScopeId, key: &str) -> WorldResult<()> {
        for child in self.children_at(parent, key) {
            if self.tree.contains(child) {
                self.update_object(child)?;
            }
        }
        Ok(())
    }

    /// Run one frame at the current game time
    pub fn update(&mut self) -> WorldResult<()> {
        self.state.current_world = Some(self.root);
        self.update_object(self.root)?;

        let delivered = self.events.update(self.state.game_time.total);
        if delivered > 0 {
            log::trace!("delivered {} events", delivered);
        }
        self.apply_messages()?;
        self.destroy_queued()
    }

    /// Advance the clock by `elapsed`, then run one frame
    pub fn tick(&mut self, elapsed: Duration) -> WorldResult<()> {
        self.state.game_time.advance(elapsed);
        self.update()
    }

    fn apply_messages(&mut self) -> WorldResult<()> {
        for message in self.relay.drain() {
            for reaction in self.reactions() {
                let object = self.game_object(reaction)?;
                object.react(reaction, self, &message)?;
            }
        }
        Ok(())
    }

    fn destroy_queued(&mut self) -> WorldResult<()> {
        for id in std::mem::take(&mut self.doomed) {
            if self.tree.contains(id) {
                self.tree.destroy(id)?;
            }
        }
        Ok(())
    }
}

impl Clone for World {
    /// Deep copy of the tree and clock. Pending events and queued destroys
    /// stay with the source world.
    fn clone(&self) -> Self {
        Self::assemble(
            self.tree.clone(),
            self.root,
            self.state.clone(),
            self.factories.clone(),
        )
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("name", &self.name())
            .field("root", &self.root)
            .field("tree", &self.tree)
            .field("state", &self.state)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    fn world() -> World {
        World::new("Test", Factories::with_builtins().unwrap()).unwrap()
    }

    #[test]
    fn test_world_name_is_reflected() {
        let mut world = world();
        assert_eq!(world.name(), "Test");

        world.set_name("Renamed").unwrap();
        assert_eq!(world.object_as::<WorldRoot>(world.root()).unwrap().name(), "Renamed");
        assert!(world.tree().is_prescribed_attribute(world.root(), SECTORS));
        assert!(world.tree().is_prescribed_attribute(world.root(), REACTIONS));
    }

    #[test]
    fn test_create_hierarchy() {
        let mut world = world();
        let sector = world.create_sector("Hub").unwrap();
        let entity = world.create_entity(sector, "Entity", "Guard").unwrap();
        let action = world.create_action(entity, "ActionList", "Patrol").unwrap();

        assert_eq!(world.sectors(), vec![sector]);
        assert_eq!(world.entities(sector), vec![entity]);
        assert_eq!(world.actions(entity), vec![action]);
        assert_eq!(world.tree().parent(action), Some(entity));
        assert_eq!(world.name_of(entity).as_deref(), Some("Guard"));
        assert!(world.object_as::<Entity>(entity).is_some());
        assert_eq!(world.find_by_name("Patrol"), Some(action));
    }

    #[test]
    fn test_unknown_class() {
        let mut world = world();
        let sector = world.create_sector("Hub").unwrap();
        let before = world.tree().len();

        assert_eq!(
            world.create_entity(sector, "Dragon", "Smaug"),
            Err(WorldError::UnknownClass {
                family: "entity",
                class: "Dragon".into()
            })
        );
        assert_eq!(world.tree().len(), before);
    }

    #[test]
    fn test_entity_needs_sector() {
        let mut world = world();
        let root = world.root();
        assert_eq!(
            world.create_entity(root, "Entity", "Lost"),
            Err(WorldError::WrongKind {
                id: root,
                expected: "Sector"
            })
        );
    }

    #[test]
    fn test_set_sector_moves_entity() {
        let mut world = world();
        let a = world.create_sector("A").unwrap();
        let b = world.create_sector("B").unwrap();
        let entity = world.create_entity(a, "Entity", "Walker").unwrap();

        world.set_sector(entity, b).unwrap();
        assert!(world.entities(a).is_empty());
        assert_eq!(world.entities(b), vec![entity]);
    }

    #[test]
    fn test_queued_destroy_runs_after_update() {
        let mut world = world();
        let sector = world.create_sector("Hub").unwrap();
        let entity = world.create_entity(sector, "Entity", "Doomed").unwrap();

        world.queue_destroy(entity);
        world.queue_destroy(entity);
        assert_eq!(world.pending_destroy(), &[entity]);
        assert!(world.tree().contains(entity));

        world.update().unwrap();
        assert!(!world.tree().contains(entity));
        assert!(world.entities(sector).is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut world = world();
        let sector = world.create_sector("Hub").unwrap();

        let mut copy = world.clone();
        copy.set_name_of(sector, "Elsewhere").unwrap();

        assert_eq!(world.name_of(sector).as_deref(), Some("Hub"));
        assert_eq!(copy.name_of(sector).as_deref(), Some("Elsewhere"));
        assert_eq!(
            copy.object_as::<Sector>(sector).unwrap().name(),
            "Elsewhere"
        );
    }
}
