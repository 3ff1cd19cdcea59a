//! Call-site and field-site resolution.
//!
//! Every descriptor already caches, per class, the nearest visible entry
//! for each name, so resolution is one map lookup; the only decision made
//! here is which class keys the lookup. Static members and all fields bind
//! through the *declared* type of the use site; virtual methods bind
//! through the receiver's *runtime* class. The two never mix: a method's
//! kind is fixed at declaration time.

use log::trace;

use crate::classes::{ClassTable, MethodEntry, SlotInfo};
use crate::decl::MethodKind;
use crate::diagnostics::RuntimeError;

/// Bind a static call through the declared class of the call site. The
/// runtime type of any receiver expression is irrelevant: a subclass
/// redeclaration is a hiding entry, reached only through the subclass's
/// own declared type.
pub fn resolve_static_method(
    table: &ClassTable,
    declared: &str,
    method: &str,
) -> Result<MethodEntry, RuntimeError> {
    let entry = lookup_method(table, declared, method)?;
    if entry.kind != MethodKind::Static {
        return Err(RuntimeError::NotStatic {
            class: entry.declaring_class.clone(),
            method: method.to_string(),
        });
    }
    trace!(
        "static call {declared}.{method} binds to {}.{method}",
        entry.declaring_class
    );
    Ok(entry)
}

/// Bind a virtual call through the receiver's exact runtime class: the
/// nearest override walking upward wins, regardless of the declared type
/// the call was made through.
pub fn resolve_virtual_method(
    table: &ClassTable,
    runtime_class: &str,
    method: &str,
) -> Result<MethodEntry, RuntimeError> {
    let entry = lookup_method(table, runtime_class, method)?;
    if entry.kind != MethodKind::Virtual {
        return Err(RuntimeError::NotVirtual {
            class: entry.declaring_class.clone(),
            method: method.to_string(),
        });
    }
    trace!(
        "virtual call on runtime class {runtime_class} binds {method} to {}.{method}",
        entry.declaring_class
    );
    Ok(entry)
}

/// Bind an instance field access through the declared type of the
/// accessing expression, never the runtime type. A shadowing
/// redeclaration lower in the chain is invisible from an ancestor-typed
/// view.
pub fn resolve_instance_slot(
    table: &ClassTable,
    declared: &str,
    field: &str,
) -> Result<SlotInfo, RuntimeError> {
    table
        .class(declared)?
        .instance_slots
        .get(field)
        .cloned()
        .ok_or_else(|| RuntimeError::UnknownField {
            class: declared.to_string(),
            field: field.to_string(),
        })
}

/// Bind a static field access through the named class, walking up to the
/// nearest declaring ancestor. The slot identifies storage owned by that
/// ancestor, shared with every descendant that does not redeclare the name.
pub fn resolve_static_slot(
    table: &ClassTable,
    declared: &str,
    field: &str,
) -> Result<SlotInfo, RuntimeError> {
    table
        .class(declared)?
        .static_slots
        .get(field)
        .cloned()
        .ok_or_else(|| RuntimeError::UnknownField {
            class: declared.to_string(),
            field: field.to_string(),
        })
}

fn lookup_method(
    table: &ClassTable,
    class: &str,
    method: &str,
) -> Result<MethodEntry, RuntimeError> {
    table
        .class(class)?
        .methods
        .get(method)
        .cloned()
        .ok_or_else(|| RuntimeError::UnknownMethod {
            class: class.to_string(),
            method: method.to_string(),
        })
}
