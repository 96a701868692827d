use void_core::{register, CoreResult, Factory};

use crate::action::{
    ActionCreateAction, ActionDestroyAction, ActionEvent, ActionList, ActionListIf, ActionPrint,
};
use crate::entity::Entity;
use crate::object::GameObject;
use crate::reaction::ReactionAttributed;

/// Class registries a world instantiates objects from
#[derive(Debug, Clone, Default)]
pub struct Factories {
    pub entities: Factory<dyn GameObject>,
    pub actions: Factory<dyn GameObject>,
    pub reactions: Factory<dyn GameObject>,
}

impl Factories {
    /// Empty registries
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries holding every built-in class
    pub fn with_builtins() -> CoreResult<Self> {
        let mut factories = Self::new();
        register!(factories.entities, "Entity" => Entity as dyn GameObject)?;

        register!(factories.actions, "ActionList" => ActionList as dyn GameObject)?;
        register!(factories.actions, "ActionListIf" => ActionListIf as dyn GameObject)?;
        register!(factories.actions, "ActionPrint" => ActionPrint as dyn GameObject)?;
        register!(factories.actions, "ActionCreateAction" => ActionCreateAction as dyn GameObject)?;
        register!(factories.actions, "ActionDestroyAction" => ActionDestroyAction as dyn GameObject)?;
        register!(factories.actions, "ActionEvent" => ActionEvent as dyn GameObject)?;

        register!(factories.reactions, "ReactionAttributed" => ReactionAttributed as dyn GameObject)?;
        Ok(factories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let factories = Factories::with_builtins().unwrap();

        assert_eq!(factories.entities.names(), ["Entity"]);
        assert_eq!(factories.actions.len(), 6);
        assert!(factories.actions.contains("ActionListIf"));
        assert!(factories.reactions.create("ReactionAttributed").is_some());
        assert!(factories.entities.create("Sector").is_none());
    }
}
