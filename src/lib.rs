pub mod ast;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod parser;
pub mod repl;
pub mod scanner;

use std::path::Path;

// Re-export error types for convenience
pub use error::{CompileError, Error, RuntimeError, Warning};

use interpreter::Interpreter;
use interpreter::value::Value;

/// Parse `path` together with everything it includes and load the result
/// into `interpreter`. Returns the non-fatal warnings raised on the way.
pub fn load_file(
    path: impl AsRef<Path>,
    interpreter: &mut Interpreter,
) -> Result<Vec<Warning>, CompileError> {
    let parsed = parser::parse_file(path)?;
    interpreter.load(&parsed.program)?;
    Ok(parsed.warnings)
}

/// Load `path` and call its `entry` function.
pub fn run_file(
    path: impl AsRef<Path>,
    entry: &str,
    interpreter: &mut Interpreter,
) -> Result<Option<Value>, Error> {
    load_file(path, interpreter)?;
    Ok(interpreter.run(entry)?)
}
