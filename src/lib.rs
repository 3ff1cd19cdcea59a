pub mod arith;
pub mod classes;
pub mod decl;
pub mod diagnostics;
pub mod dispatch;
pub mod init;
pub mod interp;
pub mod object;
pub mod sink;
pub mod value;

pub use classes::ClassTable;
pub use interp::{Engine, EngineOptions};
pub use sink::{CollectSink, OutputSink, StdoutSink};
pub use value::Value;

use decl::{ClassDecl, ProgramDecl};
use diagnostics::{LoadError, ProgramError};

/// Build a resolved class table from loader declarations. Fails at load
/// time on malformed hierarchies (cycles, unknown parents, duplicate
/// members); nothing executes yet.
pub fn load_classes(decls: &[ClassDecl]) -> Result<ClassTable, LoadError> {
    classes::build(decls)
}

/// Load a whole program and run its entry point, returning everything it
/// emitted. Convenience wrapper used by the CLI and tests; callers that
/// need a custom sink or options drive [`Engine`] directly.
pub fn run_program(program: &ProgramDecl) -> Result<Vec<Value>, ProgramError> {
    let entry = program.entry.as_ref().ok_or(ProgramError::MissingEntry)?;
    let table = load_classes(&program.classes)?;
    let (mut engine, sink) = Engine::collecting(table);
    engine.invoke(None, &entry.class, &entry.method, Vec::new())?;
    Ok(sink.take())
}
