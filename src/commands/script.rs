//! Script and REPL command implementation

use std::path::Path;

#[cfg(feature = "repl")]
fn dispatcher(
    backend: &str,
    frequency: Option<u64>,
) -> Result<usbio_repl::Dispatcher, Box<dyn std::error::Error>> {
    let provider = crate::backends::open_provider(backend)?;
    let mut dispatcher = usbio_repl::Dispatcher::new(provider);
    if let Some(khz) = frequency {
        dispatcher.session_mut().set_frequency(khz);
    }
    Ok(dispatcher)
}

/// Evaluate a script file
#[cfg(feature = "repl")]
pub fn cmd_run(
    backend: &str,
    frequency: Option<u64>,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = dispatcher(backend, frequency)?;
    let script = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read script {}: {}", file.display(), e))?;
    log::debug!("running {}", file.display());
    usbio_repl::run_script(dispatcher, script)?;
    Ok(())
}

/// Start the interactive REPL, optionally with an adapter already open
#[cfg(feature = "repl")]
pub fn cmd_repl(
    backend: &str,
    frequency: Option<u64>,
    open: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dispatcher = dispatcher(backend, frequency)?;
    if let Some(index) = open {
        dispatcher
            .open_adapter(index as i64)
            .map_err(usbio_repl::ReplError::from)?;
    }
    usbio_repl::run_repl(dispatcher)?;
    Ok(())
}

#[cfg(not(feature = "repl"))]
pub fn cmd_run(
    _backend: &str,
    _frequency: Option<u64>,
    _file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("script support not compiled in (enable the 'repl' feature)".into())
}

#[cfg(not(feature = "repl"))]
pub fn cmd_repl(
    _backend: &str,
    _frequency: Option<u64>,
    _open: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("REPL not compiled in (enable the 'repl' feature)".into())
}
