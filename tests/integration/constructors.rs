mod common;
use charon::diagnostics::RuntimeError;
use common::{engine_for, ints, run_entry};

#[test]
fn chain_runs_root_first() {
    // Four levels with explicit super arguments, evaluated in the child
    // frame before the parent runs: root body first, then each descendant.
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Ctor",
             "ctor": {
                "params": [{"name": "x", "ty": "int"}, {"name": "y", "ty": "int"}, {"name": "z", "ty": "int"}],
                "body": [{"emit": {"local": "x"}}, {"emit": {"local": "y"}}, {"emit": {"local": "z"}}]
             }},
            {"name": "CtorA", "parent": "Ctor",
             "ctor": {
                "params": [{"name": "x", "ty": "int"}, {"name": "y", "ty": "int"}, {"name": "z", "ty": "int"}],
                "super_args": [{"local": "x"}, {"local": "y"}, {"local": "z"}],
                "body": [{"emit": {"local": "x"}}, {"emit": {"local": "y"}}, {"emit": {"local": "z"}}]
             }},
            {"name": "CtorB", "parent": "CtorA",
             "ctor": {
                "params": [{"name": "x", "ty": "int"}, {"name": "y", "ty": "int"}],
                "super_args": [{"local": "x"}, {"local": "y"}, {"int": 2}],
                "body": [{"emit": {"local": "x"}}, {"emit": {"local": "y"}}]
             }},
            {"name": "CtorC", "parent": "CtorB",
             "ctor": {
                "params": [{"name": "x", "ty": "int"}],
                "super_args": [{"local": "x"}, {"int": 1}],
                "body": [{"emit": {"local": "x"}}]
             }},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"local": {"name": "o", "value": {"new": {"class": "CtorC", "args": [{"int": 2}]}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[2, 1, 2, 2, 1, 2, 2, 1, 2]));
}

#[test]
fn classes_without_constructors_still_chain() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Root", "ctor": {"body": [{"emit": {"int": 1}}]}},
            {"name": "Mid", "parent": "Root"},
            {"name": "Leaf", "parent": "Mid", "ctor": {"body": [{"emit": {"int": 3}}]}},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"local": {"name": "o", "value": {"new": {"class": "Leaf"}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[1, 3]));
}

#[test]
fn chain_runs_once_per_construction() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Root", "ctor": {"body": [{"emit": {"int": 1}}]}},
            {"name": "Leaf", "parent": "Root", "ctor": {"body": [{"emit": {"int": 2}}]}},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"local": {"name": "a", "value": {"new": {"class": "Leaf"}}}},
                {"local": {"name": "b", "value": {"new": {"class": "Leaf"}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[1, 2, 1, 2]));
}

#[test]
fn field_initializers_run_before_the_body_of_their_class() {
    // Each class's instance-field initializers run in its own constructor
    // step: after the parent's body, before its own body.
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Root",
             "ctor": {"body": [{"emit": {"int": 1}}]}},
            {"name": "Leaf", "parent": "Root",
             "fields": [{"name": "f", "ty": "int", "init": {"int": 5}}],
             "ctor": {"body": [
                {"emit": {"get_field": {"object": "this", "declared": "Leaf", "field": "f"}}}
             ]}},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"local": {"name": "o", "value": {"new": {"class": "Leaf"}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[1, 5]));
}

#[test]
fn parent_body_sees_defaulted_child_fields() {
    // Storage is fully allocated and defaulted before any constructor runs,
    // but a child's field initializer has not run while the parent's body
    // executes.
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Root", "methods": [
                {"name": "probe", "kind": "virtual", "ret": "int",
                 "body": [{"return": {"int": 0}}]}
            ],
             "ctor": {"body": [
                {"emit": {"call_virtual": {"object": "this", "declared": "Root", "method": "probe"}}}
             ]}},
            {"name": "Leaf", "parent": "Root",
             "fields": [{"name": "f", "ty": "int", "init": {"int": 9}}],
             "methods": [
                {"name": "probe", "kind": "virtual", "ret": "int",
                 "body": [{"return": {"get_field": {"object": "this", "declared": "Leaf", "field": "f"}}}]}
            ]},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"local": {"name": "o", "value": {"new": {"class": "Leaf"}}}},
                {"emit": {"call_virtual": {"object": {"local": "o"}, "declared": "Root", "method": "probe"}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    // During Root's body the override already dispatches, but Leaf.f still
    // holds its default; afterwards the initializer has filled it in.
    assert_eq!(out, ints(&[0, 9]));
}

#[test]
fn constructor_arity_is_checked() {
    let (mut engine, _sink) = engine_for(
        r#"{
        "classes": [
            {"name": "P", "ctor": {"params": [{"name": "x", "ty": "int"}], "body": []}}
        ]
    }"#,
    );
    let fault = engine.instantiate("P", Vec::new()).unwrap_err();
    match fault.root() {
        RuntimeError::ArityMismatch {
            expected, found, ..
        } => {
            assert_eq!(*expected, 1);
            assert_eq!(*found, 0);
        }
        other => panic!("expected ArityMismatch, got {other}"),
    }
}
