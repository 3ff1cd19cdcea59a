//! The execution engine: statement and expression evaluation over the
//! resolved class table.
//!
//! Evaluation order is left-to-right and eager, except for `&&`, `||` and
//! conditional expressions. Control flow inside a method travels as a
//! [`Flow`] value; faults travel as `Err` and abort every enclosing call.

pub mod frame;

use log::trace;

use crate::arith;
use crate::classes::{ClassTable, MethodEntry};
use crate::decl::{BinOp, Block, Expr, Stmt, UnaryOp};
use crate::diagnostics::RuntimeError;
use crate::dispatch;
use crate::object::{ArrayRef, ObjectRef};
use crate::sink::{CollectSink, OutputSink};
use crate::value::{self, Value};

pub use frame::{CallStack, Frame};

/// Default call-depth capacity. Generous enough for the deep mutual
/// recursion real programs exhibit, small enough to fault long before the
/// native stack is at risk.
pub const DEFAULT_MAX_FRAMES: usize = 2048;

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_frames: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Result of executing a statement or block: either fall through, or an
/// unwinding jump travelling to the construct that absorbs it.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break(Option<String>),
    Continue(Option<String>),
    Return(Option<Value>),
}

pub struct Engine {
    table: ClassTable,
    stack: CallStack,
    sink: Box<dyn OutputSink>,
    next_object_id: u64,
}

impl Engine {
    pub fn with_sink(table: ClassTable, sink: Box<dyn OutputSink>) -> Self {
        Self::with_options(table, sink, EngineOptions::default())
    }

    pub fn with_options(
        table: ClassTable,
        sink: Box<dyn OutputSink>,
        options: EngineOptions,
    ) -> Self {
        Self {
            table,
            stack: CallStack::new(options.max_frames),
            sink,
            next_object_id: 0,
        }
    }

    /// Engine plus a handle onto its collected output.
    pub fn collecting(table: ClassTable) -> (Self, CollectSink) {
        let sink = CollectSink::default();
        let engine = Self::with_sink(table, Box::new(sink.clone()));
        (engine, sink)
    }

    pub fn table(&self) -> &ClassTable {
        &self.table
    }

    pub(crate) fn table_mut(&mut self) -> &mut ClassTable {
        &mut self.table
    }

    /// Test-isolation reset: statics back to defaults, init states back to
    /// `Uninitialized`. See [`ClassTable::reset_statics`].
    pub fn reset_statics(&mut self) {
        self.table.reset_statics();
    }

    /// Invoke a method through the external interface.
    ///
    /// With no receiver the call binds statically through `declared_class`
    /// (hiding rule); with a receiver it binds through the receiver's
    /// runtime class (overriding rule), after checking the receiver is of
    /// the declared type.
    pub fn invoke(
        &mut self,
        receiver: Option<&Value>,
        declared_class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            None => self.call_static(declared_class, method, args),
            Some(value) => self.call_virtual(value.clone(), declared_class, method, args),
        }
    }

    pub(crate) fn next_object_id(&mut self) -> u64 {
        self.next_object_id += 1;
        self.next_object_id
    }

    pub(crate) fn push_frame_info(&mut self, class: &str, method: &str) -> Result<(), RuntimeError> {
        self.stack.push(class, method)
    }

    pub(crate) fn pop_frame_info(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn jump_fault(kind: &str, label: Option<String>) -> RuntimeError {
        let kind = match label {
            None => kind.to_string(),
            Some(label) => format!("{kind} '{label}'"),
        };
        RuntimeError::JumpOutsideLoop { kind }
    }

    pub(crate) fn emit(&mut self, value: Value) {
        trace!("emit {value}");
        self.sink.emit(value);
    }

    // ---- calls ----------------------------------------------------------

    /// Static call: bind through the declared class only, then trigger the
    /// declaring class's initialization before the body runs.
    pub(crate) fn call_static(
        &mut self,
        declared: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let entry = dispatch::resolve_static_method(&self.table, declared, method)?;
        self.ensure_initialized(&entry.declaring_class)?;
        self.run_method(&entry, None, args)
    }

    /// Virtual call: validate the receiver against the declared type, then
    /// bind through its runtime class. Instantiation already initialized
    /// the runtime chain, so no further trigger fires here.
    pub(crate) fn call_virtual(
        &mut self,
        receiver: Value,
        declared: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let object = match receiver {
            Value::Ref(object) => object,
            Value::Null => {
                return Err(RuntimeError::NullReceiver {
                    method: method.to_string(),
                });
            }
            other => return Err(RuntimeError::type_mismatch("object", other.type_name())),
        };
        let runtime_class = object.class_name();
        if !self.table.is_subclass(&runtime_class, declared) {
            return Err(RuntimeError::type_mismatch(declared, runtime_class));
        }
        // The declared type must see the method at all; its entry also
        // fixes the kind, so a static method never reaches this path.
        dispatch::resolve_virtual_method(&self.table, declared, method)?;
        let entry = dispatch::resolve_virtual_method(&self.table, &runtime_class, method)?;
        self.run_method(&entry, Some(object), args)
    }

    fn run_method(
        &mut self,
        entry: &MethodEntry,
        this: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if args.len() != entry.params.len() {
            return Err(RuntimeError::ArityMismatch {
                class: entry.declaring_class.clone(),
                method: entry.name.clone(),
                expected: entry.params.len(),
                found: args.len(),
            });
        }
        self.push_frame_info(&entry.declaring_class, &entry.name)?;
        let result = self.run_method_body(entry, this, args);
        self.pop_frame_info();
        result.map_err(|e| e.at(&entry.declaring_class, &entry.name))
    }

    fn run_method_body(
        &mut self,
        entry: &MethodEntry,
        this: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let mut frame = Frame::new(&entry.declaring_class, &entry.name, this);
        for (param, arg) in entry.params.iter().zip(args) {
            let value = value::coerce(&self.table, &param.ty, arg)?;
            frame.declare(param.name.clone(), value);
        }
        let body = entry.body.clone();
        match self.exec_block(&body, &mut frame)? {
            Flow::Return(Some(result)) => match &entry.ret {
                Some(ty) => value::coerce(&self.table, ty, result),
                None => Ok(result),
            },
            Flow::Return(None) | Flow::Normal => Ok(Value::Null),
            Flow::Break(label) => Err(Self::jump_fault("break", label)),
            Flow::Continue(label) => Err(Self::jump_fault("continue", label)),
        }
    }

    // ---- statements -----------------------------------------------------

    pub(crate) fn exec_block(
        &mut self,
        block: &Block,
        frame: &mut Frame,
    ) -> Result<Flow, RuntimeError> {
        frame.push_scope();
        let mut flow = Flow::Normal;
        for stmt in &block.stmts {
            flow = self.exec_stmt(stmt, frame)?;
            if !matches!(flow, Flow::Normal) {
                break;
            }
        }
        frame.pop_scope();
        Ok(flow)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Local { name, ty, value } => {
                let mut value = self.eval_expr(value, frame)?;
                if let Some(ty) = ty {
                    value = value::coerce(&self.table, ty, value)?;
                }
                frame.declare(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval_expr(value, frame)?;
                if !frame.assign(name, value) {
                    return Err(RuntimeError::UndefinedLocal { name: name.clone() });
                }
                Ok(Flow::Normal)
            }
            Stmt::SetField {
                object,
                declared,
                field,
                value,
            } => {
                let receiver = self.eval_expr(object, frame)?;
                let value = self.eval_expr(value, frame)?;
                self.set_field(receiver, declared, field, value)?;
                Ok(Flow::Normal)
            }
            Stmt::SetStatic {
                class,
                field,
                value,
            } => {
                let value = self.eval_expr(value, frame)?;
                let info = dispatch::resolve_static_slot(&self.table, class, field)?;
                self.ensure_initialized(&info.slot.class)?;
                let value = value::coerce(&self.table, &info.ty, value)?;
                self.table_mut()
                    .class_mut(&info.slot.class)?
                    .static_storage
                    .insert(info.slot.name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::SetIndex {
                array,
                index,
                value,
            } => {
                let array = self.eval_expr(array, frame)?;
                let index = self.eval_expr(index, frame)?.as_int()?;
                let value = self.eval_expr(value, frame)?.as_int()?;
                array.as_array()?.set(index, value)?;
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then, els } => {
                if self.eval_expr(cond, frame)?.as_bool()? {
                    self.exec_block(then, frame)
                } else if let Some(els) = els {
                    self.exec_block(els, frame)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { label, cond, body } => {
                loop {
                    if !self.eval_expr(cond, frame)?.as_bool()? {
                        break;
                    }
                    match self.exec_block(body, frame)? {
                        Flow::Normal => {}
                        Flow::Break(l) if targets(&l, label) => break,
                        Flow::Continue(l) if targets(&l, label) => {}
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { label, body, cond } => {
                loop {
                    match self.exec_block(body, frame)? {
                        Flow::Normal => {}
                        Flow::Break(l) if targets(&l, label) => break,
                        Flow::Continue(l) if targets(&l, label) => {}
                        other => return Ok(other),
                    }
                    if !self.eval_expr(cond, frame)?.as_bool()? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                label,
                init,
                cond,
                update,
                body,
            } => {
                // The init section gets its own scope so loop variables
                // vanish with the loop.
                frame.push_scope();
                let result = self.exec_for(label, init, cond.as_ref(), update, body, frame);
                frame.pop_scope();
                result
            }
            Stmt::Break(label) => Ok(Flow::Break(label.clone())),
            Stmt::Continue(label) => Ok(Flow::Continue(label.clone())),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => Some(self.eval_expr(expr, frame)?),
                    None => None,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Emit(expr) => {
                let value = self.eval_expr(expr, frame)?;
                self.emit(value);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr, frame)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_for(
        &mut self,
        label: &Option<String>,
        init: &[Stmt],
        cond: Option<&Expr>,
        update: &[Stmt],
        body: &Block,
        frame: &mut Frame,
    ) -> Result<Flow, RuntimeError> {
        for stmt in init {
            match self.exec_stmt(stmt, frame)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        loop {
            if let Some(cond) = cond
                && !self.eval_expr(cond, frame)?.as_bool()?
            {
                break;
            }
            match self.exec_block(body, frame)? {
                Flow::Normal => {}
                Flow::Break(l) if targets(&l, label) => break,
                // A continue aimed at this loop falls through to the
                // update section below, never to an inner loop's.
                Flow::Continue(l) if targets(&l, label) => {}
                other => return Ok(other),
            }
            for stmt in update {
                match self.exec_stmt(stmt, frame)? {
                    Flow::Normal => {}
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn set_field(
        &mut self,
        receiver: Value,
        declared: &str,
        field: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let object = match receiver {
            Value::Ref(object) => object,
            Value::Null => {
                return Err(RuntimeError::NullFieldAccess {
                    field: field.to_string(),
                });
            }
            other => return Err(RuntimeError::type_mismatch("object", other.type_name())),
        };
        let runtime_class = object.class_name();
        if !self.table.is_subclass(&runtime_class, declared) {
            return Err(RuntimeError::type_mismatch(declared, runtime_class));
        }
        let info = dispatch::resolve_instance_slot(&self.table, declared, field)?;
        let value = value::coerce(&self.table, &info.ty, value)?;
        object.put(&info.slot, value);
        Ok(())
    }

    // ---- expressions ----------------------------------------------------

    pub(crate) fn eval_expr(
        &mut self,
        expr: &Expr,
        frame: &mut Frame,
    ) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Local(name) => frame
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedLocal { name: name.clone() }),
            Expr::This => match &frame.this {
                Some(object) => Ok(Value::Ref(object.clone())),
                None => Err(RuntimeError::UndefinedLocal {
                    name: "this".to_string(),
                }),
            },
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, frame)?;
                match op {
                    UnaryOp::Neg => Ok(Value::Int(arith::neg(value.as_int()?))),
                    UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, frame),
            Expr::Cond { cond, then, els } => {
                if self.eval_expr(cond, frame)?.as_bool()? {
                    self.eval_expr(then, frame)
                } else {
                    self.eval_expr(els, frame)
                }
            }
            Expr::Convert { to, value } => {
                let value = self.eval_expr(value, frame)?.as_int()?;
                Ok(Value::Int(arith::convert(*to, value)))
            }
            Expr::GetField {
                object,
                declared,
                field,
            } => {
                let receiver = self.eval_expr(object, frame)?;
                self.get_field(receiver, declared, field)
            }
            Expr::GetStatic { class, field } => {
                let info = dispatch::resolve_static_slot(&self.table, class, field)?;
                self.ensure_initialized(&info.slot.class)?;
                self.table
                    .class(&info.slot.class)?
                    .static_storage
                    .get(&info.slot.name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UnknownField {
                        class: info.slot.class.clone(),
                        field: info.slot.name.clone(),
                    })
            }
            Expr::CallStatic {
                class,
                method,
                args,
            } => {
                let args = self.eval_args(args, frame)?;
                self.call_static(class, method, args)
            }
            Expr::CallVirtual {
                object,
                declared,
                method,
                args,
            } => {
                let receiver = self.eval_expr(object, frame)?;
                let args = self.eval_args(args, frame)?;
                self.call_virtual(receiver, declared, method, args)
            }
            Expr::New { class, args } => {
                let args = self.eval_args(args, frame)?;
                self.instantiate(class, args)
            }
            Expr::NewArray { len } => {
                let len = self.eval_expr(len, frame)?.as_int()?;
                if len < 0 {
                    return Err(RuntimeError::NegativeArraySize { len });
                }
                let id = self.next_object_id();
                Ok(Value::Array(ArrayRef::new(id, len as usize)))
            }
            Expr::Index { array, index } => {
                let array = self.eval_expr(array, frame)?;
                let index = self.eval_expr(index, frame)?.as_int()?;
                Ok(Value::Int(array.as_array()?.get(index)?))
            }
            Expr::Length { array } => {
                let array = self.eval_expr(array, frame)?;
                Ok(Value::Int(array.as_array()?.len() as i32))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], frame: &mut Frame) -> Result<Vec<Value>, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, frame)?);
        }
        Ok(values)
    }

    fn get_field(
        &mut self,
        receiver: Value,
        declared: &str,
        field: &str,
    ) -> Result<Value, RuntimeError> {
        let object = match receiver {
            Value::Ref(object) => object,
            Value::Null => {
                return Err(RuntimeError::NullFieldAccess {
                    field: field.to_string(),
                });
            }
            other => return Err(RuntimeError::type_mismatch("object", other.type_name())),
        };
        let runtime_class = object.class_name();
        if !self.table.is_subclass(&runtime_class, declared) {
            return Err(RuntimeError::type_mismatch(declared, runtime_class));
        }
        let info = dispatch::resolve_instance_slot(&self.table, declared, field)?;
        object.get(&info.slot).ok_or_else(|| RuntimeError::UnknownField {
            class: runtime_class,
            field: field.to_string(),
        })
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        frame: &mut Frame,
    ) -> Result<Value, RuntimeError> {
        // Short-circuit forms evaluate the right operand conditionally;
        // everything else is strict left-to-right.
        match op {
            BinOp::And => {
                if !self.eval_expr(lhs, frame)?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval_expr(rhs, frame)?.as_bool()?));
            }
            BinOp::Or => {
                if self.eval_expr(lhs, frame)?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval_expr(rhs, frame)?.as_bool()?));
            }
            _ => {}
        }

        let lhs = self.eval_expr(lhs, frame)?;
        let rhs = self.eval_expr(rhs, frame)?;
        match op {
            BinOp::Add => Ok(Value::Int(arith::add(lhs.as_int()?, rhs.as_int()?))),
            BinOp::Sub => Ok(Value::Int(arith::sub(lhs.as_int()?, rhs.as_int()?))),
            BinOp::Mul => Ok(Value::Int(arith::mul(lhs.as_int()?, rhs.as_int()?))),
            BinOp::Div => Ok(Value::Int(arith::div(lhs.as_int()?, rhs.as_int()?)?)),
            BinOp::Rem => Ok(Value::Int(arith::rem(lhs.as_int()?, rhs.as_int()?)?)),
            BinOp::Lt => Ok(Value::Bool(lhs.as_int()? < rhs.as_int()?)),
            BinOp::Le => Ok(Value::Bool(lhs.as_int()? <= rhs.as_int()?)),
            BinOp::Gt => Ok(Value::Bool(lhs.as_int()? > rhs.as_int()?)),
            BinOp::Ge => Ok(Value::Bool(lhs.as_int()? >= rhs.as_int()?)),
            BinOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs)?)),
            BinOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs)?)),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }
}

/// Does an unwinding jump with label `jump` target a loop labeled
/// `loop_label`? An unlabeled jump targets the innermost loop, which is
/// always the one asking.
fn targets(jump: &Option<String>, loop_label: &Option<String>) -> bool {
    match jump {
        None => true,
        Some(label) => loop_label.as_deref() == Some(label.as_str()),
    }
}

/// Equality as the object language defines it: structural for ints and
/// bools, handle identity for objects and arrays, null only equals null.
/// Comparing across value kinds (other than the reference kinds) is a
/// type error, not `false`.
fn values_equal(lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Ref(a), Value::Ref(b)) => Ok(a.ptr_eq(b)),
        (Value::Array(a), Value::Array(b)) => Ok(a.ptr_eq(b)),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, Value::Ref(_) | Value::Array(_)) => Ok(false),
        (Value::Ref(_) | Value::Array(_), Value::Null) => Ok(false),
        (lhs, rhs) => Err(RuntimeError::type_mismatch(lhs.type_name(), rhs.type_name())),
    }
}
