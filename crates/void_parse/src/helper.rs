//! World grammar
//!
//! Object keys name what they build, with parts separated by `_`:
//!
//! | key                                  | placed in                  | builds                      |
//! |--------------------------------------|----------------------------|-----------------------------|
//! | `Sector_<name>`                      | the world                  | a sector                    |
//! | `Entity_<class>_<name>`              | a sector                   | an entity of `class`        |
//! | `Action_<class>_<name>`              | anything with `Actions`    | an action of `class`        |
//! | `Action_<class>_<name>_<branch>`     | an `ActionListIf`          | an action under `branch`    |
//! | `Reaction_<class>_<name>`            | the world                  | a reaction of `class`       |
//! | anything else                        | anywhere                   | a nested table              |
//!
//! An object whose first member (in key order) is not itself an object is a
//! leaf: `{"Type": "Integer", "Value": 10}` appends a datum named after the
//! key. `Value` may be an array. Leaves are appended to owned datums and
//! overwrite external ones starting at index 0.

use serde_json::{Map, Value};
use void_scope::{DatumType, ScopeId};
use void_world::action::ActionListIf;
use void_world::{Sector, ACTIONS};

use crate::error::{ParseError, ParseResult};
use crate::master::{ParseHelper, SharedData};
use crate::shared::ScopeSharedData;

pub const TYPE: &str = "Type";
pub const VALUE: &str = "Value";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    /// A table was opened; restore `parent` as focus on close
    Container { parent: ScopeId },
    Leaf,
}

/// A leaf being collected
#[derive(Debug, Clone, Default)]
struct Element {
    type_name: Option<String>,
    value: Option<Value>,
}

/// Builds sectors, entities, actions, reactions and datums into a
/// [`ScopeSharedData`] world
#[derive(Debug, Clone, Default)]
pub struct ScopeParseHelper {
    frames: Vec<Frame>,
    element: Element,
    is_clone: bool,
}

impl ScopeParseHelper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clone(&self) -> bool {
        self.is_clone
    }

    fn in_leaf(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Leaf))
    }

    fn open(&self, key: &str, data: &mut ScopeSharedData) -> ParseResult<ScopeId> {
        let focus = data.focus();
        let tokens: Vec<&str> = key.split('_').collect();
        let world = data.world_mut();
        let misplaced = || ParseError::UnexpectedContainer {
            key: key.to_string(),
            focus,
        };

        let id = match tokens[0] {
            "Sector" => {
                expect_parts(key, &tokens, 2)?;
                if focus != world.root() {
                    return Err(misplaced());
                }
                world.create_sector(&tokens[1..].join("_"))?
            }
            "Entity" => {
                expect_parts(key, &tokens, 3)?;
                if world.object_as::<Sector>(focus).is_none() {
                    return Err(misplaced());
                }
                world.create_entity(focus, tokens[1], &tokens[2..].join("_"))?
            }
            "Action" => {
                expect_parts(key, &tokens, 3)?;
                let last = tokens.len() - 1;
                if tokens.len() > 3 && world.object_as::<ActionListIf>(focus).is_some() {
                    let name = tokens[2..last].join("_");
                    world.create_action_in(focus, tokens[1], &name, tokens[last])?
                } else {
                    let holds_actions = world
                        .tree()
                        .find(focus, ACTIONS)
                        .is_some_and(|d| d.datum_type() == DatumType::Table);
                    if !holds_actions {
                        return Err(misplaced());
                    }
                    world.create_action(focus, tokens[1], &tokens[2..].join("_"))?
                }
            }
            "Reaction" => {
                expect_parts(key, &tokens, 3)?;
                if focus != world.root() {
                    return Err(misplaced());
                }
                world.create_reaction(tokens[1], &tokens[2..].join("_"))?
            }
            _ => world.tree_mut().append_scope(focus, key)?,
        };
        log::trace!("opened '{}' as {}", key, id);
        Ok(id)
    }

    fn commit(&self, key: &str, element: Element, data: &mut ScopeSharedData) -> ParseResult<()> {
        let type_name = element
            .type_name
            .ok_or_else(|| ParseError::MissingType(key.to_string()))?;
        let datum_type = type_name
            .parse::<DatumType>()
            .ok()
            .filter(|t| {
                matches!(
                    t,
                    DatumType::Integer
                        | DatumType::Float
                        | DatumType::Vector4
                        | DatumType::Matrix4x4
                        | DatumType::String
                )
            })
            .ok_or_else(|| ParseError::UnknownType {
                key: key.to_string(),
                type_name: type_name.clone(),
            })?;
        let values: Vec<String> = match element.value {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
            Some(value) => vec![scalar_text(&value)],
        };

        let focus = data.focus();
        let datum = data.world_mut().tree_mut().append(focus, key)?;
        datum.set_type(datum_type)?;
        let start = if datum.is_external() {
            0
        } else {
            let start = datum.len();
            datum.resize(start + values.len())?;
            start
        };
        for (offset, text) in values.iter().enumerate() {
            datum.set_from_string(text, start + offset)?;
        }
        log::trace!("'{}' <- {} x {}", key, values.len(), datum_type);
        Ok(())
    }
}

fn expect_parts(key: &str, tokens: &[&str], count: usize) -> ParseResult<()> {
    if tokens.len() < count || tokens[1..].iter().any(|t| t.is_empty()) {
        return Err(ParseError::MalformedKey(key.to_string()));
    }
    Ok(())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn scope_data(shared: &mut dyn SharedData) -> Option<&mut ScopeSharedData> {
    (*shared).as_any_mut().downcast_mut::<ScopeSharedData>()
}

impl ParseHelper for ScopeParseHelper {
    fn initialize(&mut self) {
        self.frames.clear();
        self.element = Element::default();
    }

    fn start_handler(
        &mut self,
        key: &str,
        node: &Map<String, Value>,
        shared: &mut dyn SharedData,
    ) -> ParseResult<bool> {
        if self.in_leaf() {
            return Ok(false);
        }
        let Some(data) = scope_data(shared) else {
            return Ok(false);
        };

        let is_container = node.values().next().map_or(true, Value::is_object);
        if !is_container {
            self.element = Element::default();
            self.frames.push(Frame::Leaf);
            return Ok(true);
        }

        let parent = data.focus();
        let child = self.open(key, data)?;
        data.set_focus(child);
        self.frames.push(Frame::Container { parent });
        Ok(true)
    }

    fn value_handler(&mut self, key: &str, value: &Value, shared: &mut dyn SharedData) -> ParseResult<bool> {
        if !self.in_leaf() || scope_data(shared).is_none() {
            return Ok(false);
        }
        match key {
            TYPE => self.element.type_name = Some(scalar_text(value)),
            VALUE => self.element.value = Some(value.clone()),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn end_handler(
        &mut self,
        key: &str,
        _node: &Map<String, Value>,
        shared: &mut dyn SharedData,
    ) -> ParseResult<bool> {
        let Some(data) = scope_data(shared) else {
            return Ok(false);
        };
        match self.frames.pop() {
            Some(Frame::Container { parent }) => {
                data.set_focus(parent);
                Ok(true)
            }
            Some(Frame::Leaf) => {
                let element = std::mem::take(&mut self.element);
                self.commit(key, element, data)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clone_helper(&self) -> Box<dyn ParseHelper> {
        Box::new(ScopeParseHelper {
            frames: Vec::new(),
            element: Element::default(),
            is_clone: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_parts() {
        assert!(expect_parts("Entity_A_B", &["Entity", "A", "B"], 3).is_ok());
        assert!(matches!(
            expect_parts("Entity_A", &["Entity", "A"], 3),
            Err(ParseError::MalformedKey(_))
        ));
        assert!(expect_parts("Sector_", &["Sector", ""], 2).is_err());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&Value::from(10)), "10");
        assert_eq!(scalar_text(&Value::from(1.5)), "1.5");
        assert_eq!(scalar_text(&Value::from("vec4(1, 2, 3, 4)")), "vec4(1, 2, 3, 4)");
        assert_eq!(scalar_text(&Value::Null), "");
    }

    #[test]
    fn test_clone_starts_clean() {
        let mut helper = ScopeParseHelper::new();
        helper.frames.push(Frame::Leaf);
        let clone = helper.clone_helper();
        assert_eq!(clone.priority(), 0);
        assert!(!helper.is_clone());
    }
}
