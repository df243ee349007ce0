//! Object store interface and an in-memory implementation.

use std::error::Error as StdError;
use std::sync::Arc;

use ahash::RandomState;
use hashbrown::HashMap;
use moo_core::{ErrorCode, Obj, Value};
use moo_ir::Program;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object {0}")]
    ObjectNotFound(Obj),
    #[error("property {1:?} not found on {0}")]
    PropertyNotFound(Obj, String),
    #[error("verb {1:?} not found on {0}")]
    VerbNotFound(Obj, String),
    #[error("permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::ObjectNotFound(_) => ErrorCode::InvalidIndirection,
            StoreError::PropertyNotFound(..) => ErrorCode::PropNotFound,
            StoreError::VerbNotFound(..) => ErrorCode::VerbNotFound,
            StoreError::PermissionDenied => ErrorCode::Perm,
            StoreError::Backend(_) => ErrorCode::None,
        }
    }
}

/// A verb resolved for execution.
#[derive(Clone, Debug)]
pub struct ResolvedVerb {
    /// Object the verb is defined on (the receiver or an ancestor).
    pub definer: Obj,
    /// The verb's full name string, aliases included.
    pub name: Arc<str>,
    pub program: Arc<Program>,
}

/// Persistent object world, as seen by the interpreter.
///
/// Several interpreters may share one store, so implementations must be
/// safe for concurrent use.
pub trait Store: Send + Sync {
    fn valid(&self, obj: Obj) -> bool;

    /// Parent of `obj`; `Obj::NOTHING` at the root of a chain.
    fn parent(&self, obj: Obj) -> Result<Obj, StoreError>;

    /// Property value, looked up through the parent chain.
    fn get_property(&self, obj: Obj, name: &str) -> Result<Value, StoreError>;

    /// Set a property defined on `obj` or one of its ancestors.
    fn set_property(&self, obj: Obj, name: &str, value: Value) -> Result<(), StoreError>;

    /// Verb named `name` on `obj` or its nearest ancestor defining one.
    fn find_verb(&self, obj: Obj, name: &str) -> Result<ResolvedVerb, StoreError>;
}

/// Match a verb name against a verb's name string.
///
/// The name string holds space-separated aliases. In an alias, `*` marks
/// the shortest accepted abbreviation: `co*nnect` accepts `co`, `con` and
/// so on up to `connect`. A trailing `*` accepts any continuation, and a
/// lone `*` accepts every name.
pub fn verb_name_matches(names: &str, name: &str) -> bool {
    names.split_whitespace().any(|alias| alias_matches(alias, name))
}

fn alias_matches(alias: &str, name: &str) -> bool {
    let Some(star) = alias.find('*') else {
        return alias.eq_ignore_ascii_case(name);
    };
    let head = &alias[..star];
    let tail = &alias[star + 1..];
    let name = name.as_bytes();
    if name.len() < head.len() || !name[..head.len()].eq_ignore_ascii_case(head.as_bytes()) {
        return false;
    }
    if tail.is_empty() {
        return true;
    }
    let full: Vec<u8> = head.bytes().chain(tail.bytes()).collect();
    name.len() <= full.len() && name.eq_ignore_ascii_case(&full[..name.len()])
}

struct VerbDef {
    names: Arc<str>,
    program: Arc<Program>,
}

struct ObjectData {
    parent: Obj,
    properties: HashMap<String, Value, RandomState>,
    verbs: Vec<VerbDef>,
}

#[derive(Default)]
struct World {
    objects: HashMap<Obj, ObjectData, RandomState>,
    next_id: i64,
}

impl World {
    fn get(&self, obj: Obj) -> Result<&ObjectData, StoreError> {
        self.objects.get(&obj).ok_or(StoreError::ObjectNotFound(obj))
    }

    /// First object in the chain starting at `obj` that defines `name`.
    fn property_owner(&self, obj: Obj, name: &str) -> Result<Option<Obj>, StoreError> {
        let mut cur = obj;
        while !cur.is_nothing() {
            let data = self.get(cur)?;
            if data.properties.contains_key(name) {
                return Ok(Some(cur));
            }
            cur = data.parent;
        }
        Ok(None)
    }
}

/// Store kept entirely in memory, guarded by a read-write lock.
#[derive(Default)]
pub struct MemoryStore {
    world: RwLock<World>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object with the next free number.
    pub fn create(&self, parent: Obj) -> Obj {
        let mut world = self.world.write();
        let obj = Obj(world.next_id);
        world.next_id += 1;
        world.objects.insert(
            obj,
            ObjectData {
                parent,
                properties: HashMap::default(),
                verbs: Vec::new(),
            },
        );
        obj
    }

    /// Define (or redefine) a property on `obj` itself.
    pub fn define_property(&self, obj: Obj, name: &str, value: Value) -> Result<(), StoreError> {
        let mut world = self.world.write();
        let data = world.objects.get_mut(&obj).ok_or(StoreError::ObjectNotFound(obj))?;
        data.properties.insert(name.to_ascii_lowercase(), value);
        Ok(())
    }

    pub fn add_verb(&self, obj: Obj, names: &str, program: Program) -> Result<(), StoreError> {
        let mut world = self.world.write();
        let data = world.objects.get_mut(&obj).ok_or(StoreError::ObjectNotFound(obj))?;
        data.verbs.push(VerbDef {
            names: Arc::from(names),
            program: Arc::new(program),
        });
        Ok(())
    }
}

impl Store for MemoryStore {
    fn valid(&self, obj: Obj) -> bool {
        self.world.read().objects.contains_key(&obj)
    }

    fn parent(&self, obj: Obj) -> Result<Obj, StoreError> {
        Ok(self.world.read().get(obj)?.parent)
    }

    fn get_property(&self, obj: Obj, name: &str) -> Result<Value, StoreError> {
        let world = self.world.read();
        let key = name.to_ascii_lowercase();
        let mut cur = obj;
        world.get(obj)?;
        while !cur.is_nothing() {
            let data = world.get(cur)?;
            if let Some(v) = data.properties.get(&key) {
                return Ok(v.clone());
            }
            cur = data.parent;
        }
        Err(StoreError::PropertyNotFound(obj, name.to_string()))
    }

    fn set_property(&self, obj: Obj, name: &str, value: Value) -> Result<(), StoreError> {
        let mut world = self.world.write();
        let key = name.to_ascii_lowercase();
        world.get(obj)?;
        if world.property_owner(obj, &key)?.is_none() {
            return Err(StoreError::PropertyNotFound(obj, name.to_string()));
        }
        if let Some(data) = world.objects.get_mut(&obj) {
            data.properties.insert(key, value);
        }
        Ok(())
    }

    fn find_verb(&self, obj: Obj, name: &str) -> Result<ResolvedVerb, StoreError> {
        let world = self.world.read();
        world.get(obj)?;
        let mut cur = obj;
        while !cur.is_nothing() {
            let data = world.get(cur)?;
            if let Some(verb) = data.verbs.iter().find(|v| verb_name_matches(&v.names, name)) {
                return Ok(ResolvedVerb {
                    definer: cur,
                    name: verb.names.clone(),
                    program: verb.program.clone(),
                });
            }
            cur = data.parent;
        }
        Err(StoreError::VerbNotFound(obj, name.to_string()))
    }
}
