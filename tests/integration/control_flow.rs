mod common;
use charon::Value;
use common::{ints, run_entry};

fn emit_program(body: &str) -> String {
    format!(
        r#"{{
        "classes": [
            {{"name": "Main", "methods": [{{"name": "main", "kind": "static", "body": {body}}}]}}
        ],
        "entry": {{"class": "Main", "method": "main"}}
    }}"#
    )
}

#[test]
fn if_else_branches() {
    let out = run_entry(&emit_program(
        r#"[
            {"if": {"cond": {"bool": true}, "then": [{"emit": {"int": 1}}], "else": [{"emit": {"int": 2}}]}},
            {"if": {"cond": {"bool": false}, "then": [{"emit": {"int": 3}}], "else": [{"emit": {"int": 4}}]}},
            {"if": {"cond": {"bool": false}, "then": [{"emit": {"int": 5}}]}},
            {"emit": {"int": 6}}
        ]"#,
    ));
    assert_eq!(out, ints(&[1, 4, 6]));
}

#[test]
fn while_loop_accumulates() {
    let out = run_entry(&emit_program(
        r#"[
            {"local": {"name": "i", "value": {"int": 0}}},
            {"local": {"name": "total", "value": {"int": 0}}},
            {"while": {"cond": {"binary": {"op": "lt", "lhs": {"local": "i"}, "rhs": {"int": 5}}},
                       "body": [
                {"assign": {"name": "total", "value": {"binary": {"op": "add", "lhs": {"local": "total"}, "rhs": {"local": "i"}}}}},
                {"assign": {"name": "i", "value": {"binary": {"op": "add", "lhs": {"local": "i"}, "rhs": {"int": 1}}}}}
            ]}},
            {"emit": {"local": "total"}}
        ]"#,
    ));
    assert_eq!(out, ints(&[10]));
}

#[test]
fn do_while_runs_the_body_before_the_condition() {
    let out = run_entry(&emit_program(
        r#"[
            {"do_while": {"body": [{"emit": {"int": 1}}], "cond": {"bool": false}}}
        ]"#,
    ));
    assert_eq!(out, ints(&[1]));
}

#[test]
fn for_loop_over_signs() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Main", "methods": [
                {"name": "sign", "kind": "static",
                 "params": [{"name": "n", "ty": "int"}], "ret": "int",
                 "body": [
                    {"if": {"cond": {"binary": {"op": "lt", "lhs": {"local": "n"}, "rhs": {"int": 0}}},
                            "then": [{"return": {"int": -1}}]}},
                    {"if": {"cond": {"binary": {"op": "gt", "lhs": {"local": "n"}, "rhs": {"int": 0}}},
                            "then": [{"return": {"int": 1}}]}},
                    {"return": {"int": 0}}
                 ]},
                {"name": "main", "kind": "static", "body": [
                    {"for": {
                        "init": [{"local": {"name": "i", "value": {"int": -3}}}],
                        "cond": {"binary": {"op": "le", "lhs": {"local": "i"}, "rhs": {"int": 3}}},
                        "update": [{"assign": {"name": "i", "value": {"binary": {"op": "add", "lhs": {"local": "i"}, "rhs": {"int": 1}}}}}],
                        "body": [{"emit": {"call_static": {"class": "Main", "method": "sign", "args": [{"local": "i"}]}}}]
                    }}
                ]}
            ]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[-1, -1, -1, 0, 1, 1, 1]));
}

#[test]
fn labeled_continue_resumes_the_labeled_loops_update() {
    // The inner loop's continue targets the outer loop by label; the outer
    // loop's update must run, never the inner one's.
    let out = run_entry(&emit_program(
        r#"[
            {"for": {"label": "outer",
                "init": [{"local": {"name": "i", "value": {"int": 0}}}],
                "cond": {"binary": {"op": "lt", "lhs": {"local": "i"}, "rhs": {"int": 3}}},
                "update": [{"assign": {"name": "i", "value": {"binary": {"op": "add", "lhs": {"local": "i"}, "rhs": {"int": 1}}}}}],
                "body": [
                    {"for": {
                        "init": [{"local": {"name": "j", "value": {"int": 0}}}],
                        "cond": {"binary": {"op": "lt", "lhs": {"local": "j"}, "rhs": {"int": 4}}},
                        "update": [{"assign": {"name": "j", "value": {"binary": {"op": "add", "lhs": {"local": "j"}, "rhs": {"int": 1}}}}}],
                        "body": [
                            {"if": {"cond": {"binary": {"op": "gt", "lhs": {"local": "j"}, "rhs": {"local": "i"}}},
                                    "then": [{"continue": "outer"}]}},
                            {"emit": {"binary": {"op": "add",
                                "lhs": {"binary": {"op": "mul", "lhs": {"local": "i"}, "rhs": {"int": 10}}},
                                "rhs": {"local": "j"}}}}
                        ]
                    }}
                ]
            }}
        ]"#,
    ));
    assert_eq!(out, ints(&[0, 10, 11, 20, 21, 22]));
}

#[test]
fn labeled_break_exits_the_labeled_loop() {
    let out = run_entry(&emit_program(
        r#"[
            {"for": {"label": "outer",
                "init": [{"local": {"name": "i", "value": {"int": 0}}}],
                "cond": {"binary": {"op": "lt", "lhs": {"local": "i"}, "rhs": {"int": 10}}},
                "update": [{"assign": {"name": "i", "value": {"binary": {"op": "add", "lhs": {"local": "i"}, "rhs": {"int": 1}}}}}],
                "body": [
                    {"local": {"name": "j", "value": {"int": 0}}},
                    {"while": {"cond": {"bool": true}, "body": [
                        {"if": {"cond": {"binary": {"op": "eq", "lhs": {"local": "i"}, "rhs": {"int": 2}}},
                                "then": [{"break": "outer"}]}},
                        {"if": {"cond": {"binary": {"op": "ge", "lhs": {"local": "j"}, "rhs": {"int": 2}}},
                                "then": [{"break": null}]}},
                        {"emit": {"binary": {"op": "add",
                            "lhs": {"binary": {"op": "mul", "lhs": {"local": "i"}, "rhs": {"int": 10}}},
                            "rhs": {"local": "j"}}}},
                        {"assign": {"name": "j", "value": {"binary": {"op": "add", "lhs": {"local": "j"}, "rhs": {"int": 1}}}}}
                    ]}}
                ]
            }},
            {"emit": {"int": 99}}
        ]"#,
    ));
    assert_eq!(out, ints(&[0, 1, 10, 11, 99]));
}

#[test]
fn short_circuit_skips_the_right_operand() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Tag", "methods": [
                {"name": "mark", "kind": "static", "ret": "bool",
                 "body": [{"emit": {"int": 99}}, {"return": {"bool": true}}]}
            ]},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"emit": {"binary": {"op": "and", "lhs": {"bool": false},
                          "rhs": {"call_static": {"class": "Tag", "method": "mark"}}}}},
                {"emit": {"binary": {"op": "or", "lhs": {"bool": true},
                          "rhs": {"call_static": {"class": "Tag", "method": "mark"}}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, vec![Value::Bool(false), Value::Bool(true)]);
}

#[test]
fn conditional_expression_evaluates_one_branch() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Tag", "methods": [
                {"name": "mark", "kind": "static",
                 "params": [{"name": "n", "ty": "int"}], "ret": "int",
                 "body": [{"emit": {"local": "n"}}, {"return": {"local": "n"}}]}
            ]},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"emit": {"cond": {"cond": {"bool": true},
                    "then": {"call_static": {"class": "Tag", "method": "mark", "args": [{"int": 1}]}},
                    "else": {"call_static": {"class": "Tag", "method": "mark", "args": [{"int": 2}]}}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[1, 1]));
}

#[test]
fn arguments_evaluate_left_to_right() {
    let out = run_entry(
        r#"{
        "classes": [
            {"name": "Tag", "methods": [
                {"name": "mark", "kind": "static",
                 "params": [{"name": "n", "ty": "int"}], "ret": "int",
                 "body": [{"emit": {"local": "n"}}, {"return": {"local": "n"}}]},
                {"name": "pair", "kind": "static",
                 "params": [{"name": "a", "ty": "int"}, {"name": "b", "ty": "int"}], "ret": "int",
                 "body": [{"return": {"binary": {"op": "sub", "lhs": {"local": "a"}, "rhs": {"local": "b"}}}}]}
            ]},
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"emit": {"call_static": {"class": "Tag", "method": "pair", "args": [
                    {"call_static": {"class": "Tag", "method": "mark", "args": [{"int": 1}]}},
                    {"call_static": {"class": "Tag", "method": "mark", "args": [{"int": 2}]}}
                ]}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    );
    assert_eq!(out, ints(&[1, 2, -1]));
}

#[test]
fn block_scopes_shadow_and_expire() {
    let out = run_entry(&emit_program(
        r#"[
            {"local": {"name": "x", "value": {"int": 1}}},
            {"if": {"cond": {"bool": true}, "then": [
                {"local": {"name": "x", "value": {"int": 2}}},
                {"emit": {"local": "x"}}
            ]}},
            {"emit": {"local": "x"}}
        ]"#,
    ));
    assert_eq!(out, ints(&[2, 1]));
}
