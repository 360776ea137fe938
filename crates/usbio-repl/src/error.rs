//! Error types for scripting

use thiserror::Error;

use crate::dispatch::DispatchError;

/// Errors that end a script or REPL session
#[derive(Error, Debug)]
pub enum ReplError {
    /// I/O error (script file, terminal or history)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Steel evaluation error, including commands that failed inside a script
    #[error("Scheme error: {0}")]
    SteelError(String),

    /// Command failed outside of the script engine
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
