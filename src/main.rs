use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use charon::decl::ProgramDecl;
use charon::{Engine, EngineOptions, StdoutSink, load_classes};

#[derive(Parser)]
#[command(name = "charon", version, about = "The charon class runtime")]
struct Cli {
    /// Call-depth capacity before a stack-overflow fault
    #[arg(long, global = true)]
    max_frames: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a program file and run its entry point
    Run {
        /// Program file path (JSON class declarations)
        file: PathBuf,
    },
    /// Load a program file and build the class table without executing
    Check {
        /// Program file path (JSON class declarations)
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { file } => run(file, &cli),
        Commands::Check { file } => check(file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn read_program(file: &Path) -> Result<ProgramDecl, String> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("failed to parse '{}': {e}", file.display()))
}

fn run(file: &Path, cli: &Cli) -> Result<(), String> {
    let program = read_program(file)?;
    let entry = program
        .entry
        .as_ref()
        .ok_or_else(|| format!("'{}' has no entry point", file.display()))?;

    let table = load_classes(&program.classes).map_err(|e| e.to_string())?;

    let mut options = EngineOptions::default();
    if let Some(max_frames) = cli.max_frames {
        options.max_frames = max_frames;
    }
    let mut engine = Engine::with_options(table, Box::new(StdoutSink), options);
    engine
        .invoke(None, &entry.class, &entry.method, Vec::new())
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn check(file: &Path) -> Result<(), String> {
    let program = read_program(file)?;
    let table = load_classes(&program.classes).map_err(|e| e.to_string())?;
    println!("loaded {} classes", table.len());
    Ok(())
}
