use void_scope::ScopeId;
use void_world::World;

use crate::master::SharedData;

/// The world being populated and the table new members land in
#[derive(Debug)]
pub struct ScopeSharedData {
    world: World,
    focus: ScopeId,
    depth: usize,
    is_clone: bool,
}

impl ScopeSharedData {
    pub fn new(world: World) -> Self {
        let focus = world.root();
        Self {
            world,
            focus,
            depth: 0,
            is_clone: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    /// Table that receives the next member
    pub fn focus(&self) -> ScopeId {
        self.focus
    }

    pub fn set_focus(&mut self, focus: ScopeId) {
        self.focus = focus;
    }
}

impl SharedData for ScopeSharedData {
    fn initialize(&mut self) {
        self.depth = 0;
        self.focus = self.world.root();
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    fn clone_shared(&self) -> Box<dyn SharedData> {
        let world = self.world.clone();
        let focus = world.root();
        Box::new(ScopeSharedData {
            world,
            focus,
            depth: 0,
            is_clone: true,
        })
    }

    fn is_clone(&self) -> bool {
        self.is_clone
    }
}
