//! Document dispatch
//!
//! A [`ParseMaster`] walks a JSON document and hands every member to its
//! helpers. For an object member the first helper whose `start_handler`
//! returns true claims it: the master recurses into the object and finally
//! calls `end_handler` on that same helper. For any other member the first
//! helper whose `value_handler` returns true wins. Members nobody claims are
//! skipped.
//!
//! Object members are visited in sorted key order.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use void_core::AsAny;

use crate::error::{ParseError, ParseResult};

/// State shared by the helpers of one master
pub trait SharedData: AsAny + Send {
    /// Reset before a parse
    fn initialize(&mut self) {
        self.set_depth(0);
    }

    /// Nesting depth of the object currently being parsed
    fn depth(&self) -> usize;

    fn set_depth(&mut self, depth: usize);

    /// Independent copy for a cloned master
    fn clone_shared(&self) -> Box<dyn SharedData>;

    fn is_clone(&self) -> bool;
}

/// Interprets part of a document
pub trait ParseHelper: Send {
    /// Reset before a parse
    fn initialize(&mut self) {}

    /// Offer an object member. Returning true claims it.
    fn start_handler(
        &mut self,
        key: &str,
        node: &Map<String, Value>,
        shared: &mut dyn SharedData,
    ) -> ParseResult<bool>;

    /// Offer a non-object member. Returning true claims it.
    fn value_handler(&mut self, key: &str, value: &Value, shared: &mut dyn SharedData) -> ParseResult<bool>;

    /// Close an object member this helper claimed
    fn end_handler(
        &mut self,
        key: &str,
        node: &Map<String, Value>,
        shared: &mut dyn SharedData,
    ) -> ParseResult<bool>;

    /// Helpers with a higher priority are offered members first
    fn priority(&self) -> i32 {
        0
    }

    fn clone_helper(&self) -> Box<dyn ParseHelper>;
}

/// Walks documents and delegates to helpers
pub struct ParseMaster {
    /// Ordered by priority, then registration
    helpers: Vec<Box<dyn ParseHelper>>,
    shared: Box<dyn SharedData>,
    file_name: Option<PathBuf>,
    is_clone: bool,
}

impl ParseMaster {
    pub fn new<S: SharedData>(shared: S) -> Self {
        Self {
            helpers: Vec::new(),
            shared: Box::new(shared),
            file_name: None,
            is_clone: false,
        }
    }

    /// Register a helper behind every helper of equal or higher priority
    pub fn add_helper(&mut self, helper: Box<dyn ParseHelper>) -> ParseResult<()> {
        if self.is_clone {
            return Err(ParseError::CloneLocked);
        }
        let priority = helper.priority();
        let at = self
            .helpers
            .iter()
            .position(|h| h.priority() < priority)
            .unwrap_or(self.helpers.len());
        self.helpers.insert(at, helper);
        Ok(())
    }

    /// Remove the helper at `index` in dispatch order
    pub fn remove_helper(&mut self, index: usize) -> ParseResult<Box<dyn ParseHelper>> {
        if self.is_clone {
            return Err(ParseError::CloneLocked);
        }
        if index >= self.helpers.len() {
            return Err(ParseError::NoHelper {
                index,
                len: self.helpers.len(),
            });
        }
        Ok(self.helpers.remove(index))
    }

    pub fn helpers_len(&self) -> usize {
        self.helpers.len()
    }

    /// Deep copy with its own helpers and shared data. The copy's helper
    /// list is fixed.
    pub fn clone_master(&self) -> ParseMaster {
        ParseMaster {
            helpers: self.helpers.iter().map(|h| h.clone_helper()).collect(),
            shared: self.shared.clone_shared(),
            file_name: None,
            is_clone: true,
        }
    }

    pub fn is_clone(&self) -> bool {
        self.is_clone
    }

    pub fn parse(&mut self, text: &str) -> ParseResult<()> {
        let root: Value = serde_json::from_str(text)?;
        self.parse_value(&root)
    }

    pub fn parse_reader<R: Read>(&mut self, reader: R) -> ParseResult<()> {
        let root: Value = serde_json::from_reader(reader)?;
        self.parse_value(&root)
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> ParseResult<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.file_name = Some(path.to_path_buf());
        log::debug!("parsing {}", path.display());
        self.parse_reader(BufReader::new(file))
    }

    /// The file most recently handed to [`parse_file`](Self::parse_file)
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Dispatch an already decoded document
    pub fn parse_value(&mut self, root: &Value) -> ParseResult<()> {
        let Value::Object(members) = root else {
            return Err(ParseError::RootNotObject);
        };
        for helper in &mut self.helpers {
            helper.initialize();
        }
        self.shared.initialize();
        self.delegate(members, 0)
    }

    fn delegate(&mut self, members: &Map<String, Value>, depth: usize) -> ParseResult<()> {
        for (key, value) in members {
            match value {
                Value::Object(node) => {
                    let Some(index) = self.claim_object(key, node)? else {
                        log::debug!("no helper claimed object '{}'; skipped", key);
                        continue;
                    };
                    self.shared.set_depth(depth + 1);
                    self.delegate(node, depth + 1)?;
                    self.helpers[index].end_handler(key, node, &mut *self.shared)?;
                    self.shared.set_depth(depth);
                }
                other => {
                    if !self.claim_value(key, other)? {
                        log::debug!("no helper claimed value '{}'; skipped", key);
                    }
                }
            }
        }
        Ok(())
    }

    fn claim_object(&mut self, key: &str, node: &Map<String, Value>) -> ParseResult<Option<usize>> {
        for (index, helper) in self.helpers.iter_mut().enumerate() {
            if helper.start_handler(key, node, &mut *self.shared)? {
                log::trace!("helper {} claimed object '{}'", index, key);
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn claim_value(&mut self, key: &str, value: &Value) -> ParseResult<bool> {
        for helper in &mut self.helpers {
            if helper.value_handler(key, value, &mut *self.shared)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn shared_data<T: 'static>(&self) -> Option<&T> {
        (*self.shared).as_any().downcast_ref()
    }

    pub fn shared_data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        (*self.shared).as_any_mut().downcast_mut()
    }

    pub fn into_shared_data(self) -> Box<dyn SharedData> {
        self.shared
    }

    /// Take the shared data back as its concrete type
    pub fn into_shared<T: 'static>(self) -> Option<T> {
        let shared: Box<dyn std::any::Any> = self.shared;
        shared.downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for ParseMaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseMaster")
            .field("helpers", &self.helpers.len())
            .field("file_name", &self.file_name)
            .field("is_clone", &self.is_clone)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, Clone)]
    struct Tally {
        depth: usize,
        max_depth: usize,
        values: usize,
        is_clone: bool,
    }

    impl SharedData for Tally {
        fn depth(&self) -> usize {
            self.depth
        }

        fn set_depth(&mut self, depth: usize) {
            self.depth = depth;
            self.max_depth = self.max_depth.max(depth);
        }

        fn clone_shared(&self) -> Box<dyn SharedData> {
            Box::new(Tally {
                is_clone: true,
                ..Tally::default()
            })
        }

        fn is_clone(&self) -> bool {
            self.is_clone
        }
    }

    /// Claims everything and counts scalar members
    #[derive(Clone)]
    struct Counting {
        ends: Arc<AtomicUsize>,
        priority: i32,
    }

    impl ParseHelper for Counting {
        fn start_handler(&mut self, _: &str, _: &Map<String, Value>, _: &mut dyn SharedData) -> ParseResult<bool> {
            Ok(true)
        }

        fn value_handler(&mut self, _: &str, _: &Value, shared: &mut dyn SharedData) -> ParseResult<bool> {
            if let Some(tally) = (*shared).as_any_mut().downcast_mut::<Tally>() {
                tally.values += 1;
            }
            Ok(true)
        }

        fn end_handler(&mut self, _: &str, _: &Map<String, Value>, _: &mut dyn SharedData) -> ParseResult<bool> {
            self.ends.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn clone_helper(&self) -> Box<dyn ParseHelper> {
            Box::new(self.clone())
        }
    }

    fn counting(priority: i32) -> (Box<dyn ParseHelper>, Arc<AtomicUsize>) {
        let ends = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Counting {
                ends: ends.clone(),
                priority,
            }),
            ends,
        )
    }

    #[test]
    fn test_recursion_and_depth() {
        let mut master = ParseMaster::new(Tally::default());
        let (helper, ends) = counting(0);
        master.add_helper(helper).unwrap();

        master.parse(r#"{"a": {"b": {"c": 1}, "d": 2}, "e": [1, 2]}"#).unwrap();

        let tally = master.shared_data::<Tally>().unwrap();
        assert_eq!(tally.values, 3);
        assert_eq!(tally.max_depth, 2);
        assert_eq!(tally.depth(), 0);
        assert_eq!(ends.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_root_must_be_object() {
        let mut master = ParseMaster::new(Tally::default());
        assert!(matches!(master.parse("[1, 2]"), Err(ParseError::RootNotObject)));
        assert!(matches!(master.parse("{"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_helpers_ordered_by_priority() {
        let mut master = ParseMaster::new(Tally::default());
        let (low, low_ends) = counting(0);
        let (high, high_ends) = counting(5);
        master.add_helper(low).unwrap();
        master.add_helper(high).unwrap();

        master.parse(r#"{"a": {}}"#).unwrap();
        assert_eq!(high_ends.load(Ordering::SeqCst), 1);
        assert_eq!(low_ends.load(Ordering::SeqCst), 0);

        let removed = master.remove_helper(0).unwrap();
        assert_eq!(removed.priority(), 5);
        assert!(matches!(
            master.remove_helper(3),
            Err(ParseError::NoHelper { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_clone_is_locked() {
        let mut master = ParseMaster::new(Tally::default());
        let (helper, _) = counting(0);
        master.add_helper(helper).unwrap();

        let mut clone = master.clone_master();
        assert!(clone.is_clone());
        assert!(!master.is_clone());
        assert_eq!(clone.helpers_len(), 1);
        assert!(clone.shared_data::<Tally>().unwrap().is_clone());

        let (extra, _) = counting(0);
        assert!(matches!(clone.add_helper(extra), Err(ParseError::CloneLocked)));
        assert!(matches!(clone.remove_helper(0), Err(ParseError::CloneLocked)));
    }

    #[test]
    fn test_into_shared() {
        let master = ParseMaster::new(Tally::default());
        assert!(master.into_shared::<Tally>().is_some());
    }
}
