use std::process::Command;

fn charon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_charon"))
}

const COUNTER: &str = r#"{
    "classes": [
        {"name": "Counter",
         "fields": [{"name": "n", "ty": "int"}],
         "methods": [
            {"name": "bump", "kind": "virtual", "ret": "int", "body": [
                {"set_field": {"object": "this", "declared": "Counter", "field": "n",
                 "value": {"binary": {"op": "add",
                    "lhs": {"get_field": {"object": "this", "declared": "Counter", "field": "n"}},
                    "rhs": {"int": 1}}}}},
                {"return": {"get_field": {"object": "this", "declared": "Counter", "field": "n"}}}
            ]}
        ]},
        {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
            {"local": {"name": "c", "value": {"new": {"class": "Counter"}}}},
            {"emit": {"call_virtual": {"object": {"local": "c"}, "declared": "Counter", "method": "bump"}}},
            {"emit": {"call_virtual": {"object": {"local": "c"}, "declared": "Counter", "method": "bump"}}},
            {"emit": {"call_virtual": {"object": {"local": "c"}, "declared": "Counter", "method": "bump"}}}
        ]}]}
    ],
    "entry": {"class": "Main", "method": "main"}
}"#;

#[test]
fn run_prints_emitted_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, COUNTER).unwrap();

    let output = charon().arg("run").arg(&path).output().unwrap();
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n2\n3\n");
}

#[test]
fn check_loads_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, COUNTER).unwrap();

    let output = charon().arg("check").arg(&path).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("loaded 2 classes"), "got: {stdout}");
}

#[test]
fn runtime_faults_exit_nonzero_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boom.json");
    std::fs::write(
        &path,
        r#"{
        "classes": [
            {"name": "Main", "methods": [{"name": "main", "kind": "static", "body": [
                {"emit": {"binary": {"op": "div", "lhs": {"int": 1}, "rhs": {"int": 0}}}}
            ]}]}
        ],
        "entry": {"class": "Main", "method": "main"}
    }"#,
    )
    .unwrap();

    let output = charon().arg("run").arg(&path).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("division by zero"), "got: {stderr}");
    assert!(stderr.contains("Main.main"), "got: {stderr}");
}

#[test]
fn load_rejections_exit_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.json");
    std::fs::write(
        &path,
        r#"{"classes": [{"name": "A", "parent": "B"}, {"name": "B", "parent": "A"}]}"#,
    )
    .unwrap();

    let output = charon().arg("check").arg(&path).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cyclic hierarchy"), "got: {stderr}");
}

#[test]
fn missing_entry_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_entry.json");
    std::fs::write(&path, r#"{"classes": [{"name": "A"}]}"#).unwrap();

    let output = charon().arg("run").arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("entry point"));
}

#[test]
fn unreadable_programs_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "not json").unwrap();

    let output = charon().arg("run").arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to parse"));
}
