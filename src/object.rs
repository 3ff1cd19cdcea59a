//! Object and array storage, plus the allocator.
//!
//! An object's exact runtime class is fixed at creation. Instance storage
//! holds one cell per `(declaring class, field name)` pair across the full
//! ancestor chain, shadowed duplicates included, so a supertype-typed
//! view and a subtype-typed view of the same object can address different
//! cells for the same name. Handles are `Rc<RefCell<…>>`: assignment copies
//! the handle, never the storage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::classes::{CtorEntry, Slot};
use crate::decl::{Expr, TypeExpr};
use crate::diagnostics::RuntimeError;
use crate::interp::{Engine, Flow, Frame};
use crate::value::{self, Value};

#[derive(Debug)]
struct Instance {
    id: u64,
    class: String,
    fields: RefCell<HashMap<Slot, Value>>,
}

/// Shared handle to one object.
#[derive(Debug, Clone)]
pub struct ObjectRef(Rc<Instance>);

impl ObjectRef {
    pub(crate) fn new(id: u64, class: &str, fields: HashMap<Slot, Value>) -> Self {
        Self(Rc::new(Instance {
            id,
            class: class.to_string(),
            fields: RefCell::new(fields),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The exact runtime class, fixed at creation.
    pub fn class_name(&self) -> String {
        self.0.class.clone()
    }

    pub fn get(&self, slot: &Slot) -> Option<Value> {
        self.0.fields.borrow().get(slot).cloned()
    }

    pub(crate) fn put(&self, slot: &Slot, value: Value) {
        self.0.fields.borrow_mut().insert(slot.clone(), value);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug)]
struct ArrayInner {
    id: u64,
    cells: RefCell<Vec<i32>>,
}

/// Shared handle to one int array.
#[derive(Debug, Clone)]
pub struct ArrayRef(Rc<ArrayInner>);

impl ArrayRef {
    pub(crate) fn new(id: u64, len: usize) -> Self {
        Self(Rc::new(ArrayInner {
            id,
            cells: RefCell::new(vec![0; len]),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn len(&self) -> usize {
        self.0.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: i32) -> Result<i32, RuntimeError> {
        let cells = self.0.cells.borrow();
        if index < 0 || index as usize >= cells.len() {
            return Err(RuntimeError::IndexOutOfBounds {
                index,
                len: cells.len(),
            });
        }
        Ok(cells[index as usize])
    }

    pub fn set(&self, index: i32, value: i32) -> Result<(), RuntimeError> {
        let mut cells = self.0.cells.borrow_mut();
        if index < 0 || index as usize >= cells.len() {
            return Err(RuntimeError::IndexOutOfBounds {
                index,
                len: cells.len(),
            });
        }
        cells[index as usize] = value;
        Ok(())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Engine {
    /// Allocate an object of `class` and run its constructor chain.
    ///
    /// Instantiation is an active-use trigger for the full ancestor chain
    /// of the exact class. Storage is allocated fully defaulted, then each
    /// class's constructor step runs root-first: parent chain, own
    /// instance-field initializers in declaration order, own body.
    pub fn instantiate(&mut self, class: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.ensure_initialized(class)?;

        let layout = self.table().class(class)?.instance_layout.clone();
        let mut fields = HashMap::with_capacity(layout.len());
        for (slot, ty) in &layout {
            fields.insert(slot.clone(), Value::default_for(ty));
        }
        let object = ObjectRef::new(self.next_object_id(), class, fields);
        debug!("allocated {}#{} ({} slots)", class, object.id(), layout.len());

        self.run_constructor(&object, class, args)?;
        Ok(Value::Ref(object))
    }

    fn run_constructor(
        &mut self,
        object: &ObjectRef,
        class: &str,
        args: Vec<Value>,
    ) -> Result<(), RuntimeError> {
        let descriptor = self.table().class(class)?;
        let ctor = descriptor.ctor.clone();
        let parent = descriptor.parent.clone();
        let field_inits = descriptor.field_inits.clone();

        let expected = ctor.as_ref().map_or(0, |c| c.params.len());
        if args.len() != expected {
            return Err(RuntimeError::ArityMismatch {
                class: class.to_string(),
                method: "constructor".to_string(),
                expected,
                found: args.len(),
            });
        }

        self.push_frame_info(class, "constructor")?;
        let result = self.run_constructor_step(object, class, ctor, parent, field_inits, args);
        self.pop_frame_info();
        result.map_err(|e| e.at(class, "constructor"))
    }

    fn run_constructor_step(
        &mut self,
        object: &ObjectRef,
        class: &str,
        ctor: Option<CtorEntry>,
        parent: Option<String>,
        field_inits: Vec<(String, TypeExpr, Rc<Expr>)>,
        args: Vec<Value>,
    ) -> Result<(), RuntimeError> {
        let mut frame = Frame::new(class, "constructor", Some(object.clone()));
        if let Some(ctor) = &ctor {
            for (param, arg) in ctor.params.iter().zip(args) {
                let value = value::coerce(self.table(), &param.ty, arg)?;
                frame.declare(param.name.clone(), value);
            }
        }

        // Super arguments are evaluated in this frame, before the parent
        // runs; the default chain passes none.
        if let Some(parent) = parent {
            let super_args = match ctor.as_ref().and_then(|c| c.super_args.clone()) {
                Some(exprs) => {
                    let mut values = Vec::with_capacity(exprs.len());
                    for expr in exprs.iter() {
                        values.push(self.eval_expr(expr, &mut frame)?);
                    }
                    values
                }
                None => Vec::new(),
            };
            self.run_constructor(object, &parent, super_args)?;
        }

        for (name, ty, init) in &field_inits {
            let value = self.eval_expr(init, &mut frame)?;
            let value = value::coerce(self.table(), ty, value)?;
            object.put(
                &Slot {
                    class: class.to_string(),
                    name: name.clone(),
                },
                value,
            );
        }

        if let Some(ctor) = &ctor {
            match self.exec_block(&ctor.body, &mut frame)? {
                Flow::Normal | Flow::Return(_) => {}
                Flow::Break(label) => return Err(Engine::jump_fault("break", label)),
                Flow::Continue(label) => return Err(Engine::jump_fault("continue", label)),
            }
        }
        Ok(())
    }
}
