//! The class table: resolved descriptors for every loaded class.
//!
//! Descriptors are built once, before any instance exists, by the passes in
//! [`build`]. Each descriptor carries the per-class *resolved view* of the
//! hierarchy: for every visible field and method name, the entry that a use
//! site sees when its declared (or runtime) type is this class. Binding at
//! execution time is then a single map lookup: the tables are the cache.

pub mod build;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::decl::{Block, Expr, MethodKind, Param, TypeExpr};
use crate::diagnostics::RuntimeError;
use crate::value::Value;

pub use build::build;

/// Identity of one storage cell: the class that declared the field plus the
/// field name. Shadowed redeclarations produce distinct slots that differ
/// only in the declaring class; keying storage by bare name would alias
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub class: String,
    pub name: String,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// A slot together with its declared type, as seen from some class's view.
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub slot: Slot,
    pub ty: TypeExpr,
}

/// The method entry visible from a given class: the nearest declaration
/// found walking the ancestor chain upward. Bodies are shared, not cloned.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub name: String,
    pub declaring_class: String,
    pub kind: MethodKind,
    pub params: Rc<Vec<Param>>,
    pub ret: Option<TypeExpr>,
    pub body: Rc<Block>,
}

#[derive(Debug, Clone)]
pub struct CtorEntry {
    pub params: Rc<Vec<Param>>,
    pub super_args: Option<Rc<Vec<Expr>>>,
    pub body: Rc<Block>,
}

/// One step of a class's static initialization sequence: a static field
/// initializer or a static block, in declaration order.
#[derive(Debug, Clone)]
pub enum InitStep {
    Field {
        name: String,
        ty: TypeExpr,
        value: Rc<Expr>,
    },
    Block(Rc<Block>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    InProgress,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub parent: Option<String>,
    /// Root-first ancestor chain, ending with this class itself.
    pub chain: Vec<String>,
    /// Visible static field name -> owning slot, nearest declarer first.
    pub static_slots: HashMap<String, SlotInfo>,
    /// Visible instance field name -> the slot a use site with this
    /// declared type binds to.
    pub instance_slots: HashMap<String, SlotInfo>,
    /// Every instance slot in the chain, shadowed duplicates included.
    /// This is the allocation recipe for objects of this exact class.
    pub instance_layout: Vec<(Slot, TypeExpr)>,
    /// Visible method name -> nearest entry walking up from this class.
    pub methods: HashMap<String, MethodEntry>,
    pub ctor: Option<CtorEntry>,
    /// Instance-field initializers declared by this class, in order.
    pub field_inits: Vec<(String, TypeExpr, Rc<Expr>)>,
    /// Static field initializers and static blocks, merged in declaration
    /// order.
    pub init_sequence: Rc<Vec<InitStep>>,
    pub init_state: InitState,
    /// Storage for the static fields this class itself declares. Defaults
    /// are installed at build time; the initialization scheduler overwrites
    /// them on first active use.
    pub static_storage: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<String, ClassDescriptor>,
    /// Parent-before-child ordering, fixed at build time.
    order: Vec<String>,
}

impl ClassTable {
    pub(crate) fn insert(&mut self, descriptor: ClassDescriptor) {
        self.order.push(descriptor.name.clone());
        self.classes.insert(descriptor.name.clone(), descriptor);
    }

    pub fn class(&self, name: &str) -> Result<&ClassDescriptor, RuntimeError> {
        self.classes.get(name).ok_or_else(|| RuntimeError::UnknownClass {
            name: name.to_string(),
        })
    }

    pub(crate) fn class_mut(&mut self, name: &str) -> Result<&mut ClassDescriptor, RuntimeError> {
        self.classes.get_mut(name).ok_or_else(|| RuntimeError::UnknownClass {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names in parent-before-child order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// True when `class` is `ancestor` or a descendant of it.
    pub fn is_subclass(&self, class: &str, ancestor: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|d| d.chain.iter().any(|c| c == ancestor))
    }

    /// Test-isolation reset: static storage back to declared defaults,
    /// every class back to `Uninitialized`. Objects already allocated keep
    /// their instance storage.
    pub fn reset_statics(&mut self) {
        for descriptor in self.classes.values_mut() {
            descriptor.init_state = InitState::Uninitialized;
            for info in descriptor.static_slots.values() {
                if info.slot.class == descriptor.name {
                    descriptor
                        .static_storage
                        .insert(info.slot.name.clone(), Value::default_for(&info.ty));
                }
            }
        }
    }
}
