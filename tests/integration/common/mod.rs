#![allow(dead_code)]

use charon::decl::ProgramDecl;
use charon::diagnostics::{LoadError, ProgramError, RuntimeError};
use charon::{ClassTable, Engine, Value, load_classes};

pub fn parse_program(json: &str) -> ProgramDecl {
    serde_json::from_str(json).expect("program JSON should parse")
}

pub fn load_table(json: &str) -> ClassTable {
    let program = parse_program(json);
    load_classes(&program.classes).expect("classes should load")
}

/// Build an engine with a collected sink over the program's classes.
pub fn engine_for(json: &str) -> (Engine, charon::CollectSink) {
    Engine::collecting(load_table(json))
}

/// Run the program's entry point and return everything it emitted.
pub fn run_entry(json: &str) -> Vec<Value> {
    let program = parse_program(json);
    charon::run_program(&program).expect("program should run")
}

/// Run the program's entry point and return the fault it raised.
pub fn run_entry_err(json: &str) -> RuntimeError {
    let program = parse_program(json);
    match charon::run_program(&program) {
        Err(ProgramError::Runtime(fault)) => fault,
        Err(other) => panic!("expected a runtime fault, got: {other}"),
        Ok(out) => panic!("expected a runtime fault, program emitted {out:?}"),
    }
}

/// Load the program's classes and return the load rejection.
pub fn load_err(json: &str) -> LoadError {
    let program = parse_program(json);
    match load_classes(&program.classes) {
        Err(e) => e,
        Ok(_) => panic!("load should have failed"),
    }
}

pub fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().map(|&n| Value::Int(n)).collect()
}
