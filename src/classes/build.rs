//! Descriptor builder: class declarations in, resolved [`ClassTable`] out.
//!
//! Classes are processed parent-before-child regardless of declaration
//! order. Each pass validates one concern and fails fast with the first
//! offending declaration.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::decl::{ClassDecl, FieldKind, MethodDecl, Param, TypeExpr};
use crate::diagnostics::LoadError;
use crate::value::Value;

use super::{
    ClassDescriptor, ClassTable, CtorEntry, InitState, InitStep, MethodEntry, Slot, SlotInfo,
};

/// Build a resolved class table from loader declarations.
pub fn build(decls: &[ClassDecl]) -> Result<ClassTable, LoadError> {
    let by_name = register_names(decls)?;
    validate_members(decls, &by_name)?;
    let order = link_parents(decls, &by_name)?;

    let mut table = ClassTable::default();
    for name in &order {
        let decl = by_name[name.as_str()];
        let descriptor = resolve_class(decl, &table)?;
        table.insert(descriptor);
    }
    Ok(table)
}

/// Pass 0: reject duplicate class names, index declarations by name.
fn register_names(decls: &[ClassDecl]) -> Result<HashMap<&str, &ClassDecl>, LoadError> {
    let mut by_name = HashMap::new();
    for decl in decls {
        if by_name.insert(decl.name.as_str(), decl).is_some() {
            return Err(LoadError::DuplicateClass {
                name: decl.name.clone(),
            });
        }
    }
    Ok(by_name)
}

/// Pass 1: per-class member validation — duplicate fields and methods,
/// duplicate parameters, static block positions, super arguments, and
/// class references in declared types.
fn validate_members(
    decls: &[ClassDecl],
    by_name: &HashMap<&str, &ClassDecl>,
) -> Result<(), LoadError> {
    for decl in decls {
        let mut seen_fields = HashSet::new();
        for field in &decl.fields {
            if !seen_fields.insert(field.name.as_str()) {
                return Err(LoadError::DuplicateField {
                    class: decl.name.clone(),
                    field: field.name.clone(),
                });
            }
            check_type_ref(&decl.name, &field.ty, by_name)?;
        }

        let mut seen_methods = HashSet::new();
        for method in &decl.methods {
            if !seen_methods.insert(method.name.as_str()) {
                return Err(LoadError::DuplicateMethod {
                    class: decl.name.clone(),
                    method: method.name.clone(),
                });
            }
            check_params(&decl.name, &method.name, &method.params, by_name)?;
            if let Some(ret) = &method.ret {
                check_type_ref(&decl.name, ret, by_name)?;
            }
        }

        if let Some(ctor) = &decl.ctor {
            check_params(&decl.name, "constructor", &ctor.params, by_name)?;
            if ctor.super_args.is_some() && decl.parent.is_none() {
                return Err(LoadError::SuperArgsWithoutParent {
                    class: decl.name.clone(),
                });
            }
        }

        for block in &decl.static_blocks {
            if block.position > decl.fields.len() {
                return Err(LoadError::StaticBlockOutOfRange {
                    class: decl.name.clone(),
                    position: block.position,
                    fields: decl.fields.len(),
                });
            }
        }
    }
    Ok(())
}

fn check_params(
    class: &str,
    method: &str,
    params: &[Param],
    by_name: &HashMap<&str, &ClassDecl>,
) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(LoadError::DuplicateParam {
                class: class.to_string(),
                method: method.to_string(),
                param: param.name.clone(),
            });
        }
        check_type_ref(class, &param.ty, by_name)?;
    }
    Ok(())
}

fn check_type_ref(
    class: &str,
    ty: &TypeExpr,
    by_name: &HashMap<&str, &ClassDecl>,
) -> Result<(), LoadError> {
    if let TypeExpr::Class(referenced) = ty
        && !by_name.contains_key(referenced.as_str())
    {
        return Err(LoadError::UnknownTypeRef {
            class: class.to_string(),
            referenced: referenced.clone(),
        });
    }
    Ok(())
}

/// Pass 2: resolve parent references and compute a parent-before-child
/// ordering. Declarations left over after the walk are on a cycle.
fn link_parents(
    decls: &[ClassDecl],
    by_name: &HashMap<&str, &ClassDecl>,
) -> Result<Vec<String>, LoadError> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots = Vec::new();
    for decl in decls {
        match &decl.parent {
            None => roots.push(decl.name.as_str()),
            Some(parent) => {
                if !by_name.contains_key(parent.as_str()) {
                    return Err(LoadError::UnknownParent {
                        class: decl.name.clone(),
                        parent: parent.clone(),
                    });
                }
                children.entry(parent.as_str()).or_default().push(decl.name.as_str());
            }
        }
    }

    let mut order = Vec::with_capacity(decls.len());
    let mut queue: VecDeque<&str> = roots.into_iter().collect();
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        if let Some(kids) = children.get(name) {
            queue.extend(kids.iter().copied());
        }
    }

    if order.len() != decls.len() {
        let reached: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut remaining: Vec<&str> = decls
            .iter()
            .map(|d| d.name.as_str())
            .filter(|n| !reached.contains(n))
            .collect();
        remaining.sort_unstable();
        return Err(LoadError::CyclicHierarchy {
            chain: cycle_chain(remaining[0], by_name),
        });
    }
    Ok(order)
}

/// Walk parent links from `start` until a class repeats, rendering the
/// actual cycle for the error message.
fn cycle_chain(start: &str, by_name: &HashMap<&str, &ClassDecl>) -> String {
    let mut path = vec![start];
    let mut current = start;
    loop {
        let parent = by_name[current]
            .parent
            .as_deref()
            .expect("a class on a cycle always has a parent");
        if path.contains(&parent) {
            path.push(parent);
            return path.join(" -> ");
        }
        path.push(parent);
        current = parent;
    }
}

/// Pass 3: build one resolved descriptor. The parent, if any, is already in
/// the table, so every inherited view is a clone-and-extend of the parent's.
fn resolve_class(decl: &ClassDecl, table: &ClassTable) -> Result<ClassDescriptor, LoadError> {
    let parent = decl.parent.as_ref().map(|p| {
        table
            .class(p)
            .expect("parents are resolved before children")
    });

    let mut chain = parent.map(|p| p.chain.clone()).unwrap_or_default();
    chain.push(decl.name.clone());

    let mut static_slots = parent.map(|p| p.static_slots.clone()).unwrap_or_default();
    let mut instance_slots = parent.map(|p| p.instance_slots.clone()).unwrap_or_default();
    let mut instance_layout = parent.map(|p| p.instance_layout.clone()).unwrap_or_default();
    let mut methods = parent.map(|p| p.methods.clone()).unwrap_or_default();

    let mut static_storage = HashMap::new();
    let mut field_inits = Vec::new();

    for field in &decl.fields {
        let slot = Slot {
            class: decl.name.clone(),
            name: field.name.clone(),
        };
        let info = SlotInfo {
            slot: slot.clone(),
            ty: field.ty.clone(),
        };
        match field.kind {
            FieldKind::Static => {
                // A redeclared name shadows the ancestor's view; the
                // ancestor's slot and storage stay untouched.
                static_slots.insert(field.name.clone(), info);
                static_storage.insert(field.name.clone(), Value::default_for(&field.ty));
            }
            FieldKind::Instance => {
                instance_slots.insert(field.name.clone(), info);
                instance_layout.push((slot, field.ty.clone()));
                if let Some(init) = &field.init {
                    field_inits.push((field.name.clone(), field.ty.clone(), Rc::new(init.clone())));
                }
            }
        }
    }

    for method in &decl.methods {
        if let Some(inherited) = methods.get(&method.name)
            && inherited.kind != method.kind
        {
            return Err(LoadError::MethodKindMismatch {
                class: decl.name.clone(),
                method: method.name.clone(),
                kind: method.kind.as_str(),
                ancestor: inherited.declaring_class.clone(),
                ancestor_kind: inherited.kind.as_str(),
            });
        }
        methods.insert(method.name.clone(), method_entry(&decl.name, method));
    }

    let ctor = decl.ctor.as_ref().map(|c| CtorEntry {
        params: Rc::new(c.params.clone()),
        super_args: c.super_args.as_ref().map(|args| Rc::new(args.clone())),
        body: Rc::new(c.body.clone()),
    });

    Ok(ClassDescriptor {
        name: decl.name.clone(),
        parent: decl.parent.clone(),
        chain,
        static_slots,
        instance_slots,
        instance_layout,
        methods,
        ctor,
        field_inits,
        init_sequence: Rc::new(init_sequence(decl)),
        init_state: InitState::Uninitialized,
        static_storage,
    })
}

fn method_entry(class: &str, method: &MethodDecl) -> MethodEntry {
    MethodEntry {
        name: method.name.clone(),
        declaring_class: class.to_string(),
        kind: method.kind,
        params: Rc::new(method.params.clone()),
        ret: method.ret.clone(),
        body: Rc::new(method.body.clone()),
    }
}

/// Merge static field initializers and static blocks into one sequence.
/// A block at position `p` runs before the initializer of field `p`; the
/// whole sequence preserves declaration order.
fn init_sequence(decl: &ClassDecl) -> Vec<InitStep> {
    let mut steps = Vec::new();
    for index in 0..=decl.fields.len() {
        for block in decl.static_blocks.iter().filter(|b| b.position == index) {
            steps.push(InitStep::Block(Rc::new(block.body.clone())));
        }
        if let Some(field) = decl.fields.get(index)
            && field.kind == FieldKind::Static
            && let Some(init) = &field.init
        {
            steps.push(InitStep::Field {
                name: field.name.clone(),
                ty: field.ty.clone(),
                value: Rc::new(init.clone()),
            });
        }
    }
    steps
}
