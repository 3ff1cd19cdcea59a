//! Runtime values and the coercion applied on every typed store.

use std::fmt;

use crate::arith::{self, Width};
use crate::classes::ClassTable;
use crate::decl::TypeExpr;
use crate::diagnostics::RuntimeError;
use crate::object::{ArrayRef, ObjectRef};

/// A value as seen by the interpreter and the output sink. References are
/// cheap handles; cloning a `Value` never clones object or array storage.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Ref(ObjectRef),
    Array(ArrayRef),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Ref(_) => "object",
            Value::Array(_) => "array",
            Value::Null => "null",
        }
    }

    pub fn as_int(&self) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(RuntimeError::type_mismatch("int", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(RuntimeError::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayRef, RuntimeError> {
        match self {
            Value::Array(a) => Ok(a),
            Value::Null => Err(RuntimeError::NullArray),
            other => Err(RuntimeError::type_mismatch("array", other.type_name())),
        }
    }

    /// Default contents of freshly allocated storage of the given type.
    pub fn default_for(ty: &TypeExpr) -> Value {
        match ty {
            TypeExpr::Byte | TypeExpr::Short | TypeExpr::Char | TypeExpr::Int => Value::Int(0),
            TypeExpr::Bool => Value::Bool(false),
            TypeExpr::Class(_) | TypeExpr::IntArray => Value::Null,
        }
    }
}

/// Reference equality for objects and arrays, structural for the rest.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Ref(obj) => write!(f, "{}#{}", obj.class_name(), obj.id()),
            Value::Array(arr) => write!(f, "int[{}]#{}", arr.len(), arr.id()),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Check and adapt a value for a store into storage declared as `ty`.
/// Narrow integer widths truncate; reference stores verify the runtime
/// class is the declared class or a descendant.
pub(crate) fn coerce(
    table: &ClassTable,
    ty: &TypeExpr,
    value: Value,
) -> Result<Value, RuntimeError> {
    match ty {
        TypeExpr::Int => Ok(Value::Int(value.as_int()?)),
        TypeExpr::Byte => Ok(Value::Int(arith::convert(Width::Byte, value.as_int()?))),
        TypeExpr::Short => Ok(Value::Int(arith::convert(Width::Short, value.as_int()?))),
        TypeExpr::Char => Ok(Value::Int(arith::convert(Width::Char, value.as_int()?))),
        TypeExpr::Bool => Ok(Value::Bool(value.as_bool()?)),
        TypeExpr::IntArray => match value {
            Value::Array(_) | Value::Null => Ok(value),
            other => Err(RuntimeError::type_mismatch("array", other.type_name())),
        },
        TypeExpr::Class(class) => match value {
            Value::Null => Ok(Value::Null),
            Value::Ref(ref obj) => {
                if table.is_subclass(&obj.class_name(), class) {
                    Ok(value)
                } else {
                    Err(RuntimeError::type_mismatch(class.clone(), obj.class_name()))
                }
            }
            other => Err(RuntimeError::type_mismatch(class.clone(), other.type_name())),
        },
    }
}
