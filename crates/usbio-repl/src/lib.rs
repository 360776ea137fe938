//! Steel Scheme scripting for the usbio bridge commands
//!
//! Scripts and the interactive REPL see every bridge command as a Scheme
//! procedure of the same name. Commands run in order against one
//! [`Dispatcher`]; the first failing command aborts a script.
//!
//! # Example Session
//!
//! ```scheme
//! λ > (adapter_open 0)
//! λ > (set_frequency 30000)
//! λ > (spi_init 1 0 0)
//! λ > (spi_write (list #x9F) 1 cs_keep)
//! λ > (spi_read 3)
//! => (239 64 24)
//!
//! λ > (i2c_init 400)
//! λ > (i2c_write_ex #x50 (list 0) 1 START)
//! λ > (i2c_read_ex #x50 4 REPEATED_START)
//! => (255 255 255 255)
//! ```

pub mod dispatch;
mod error;
pub mod highlight;
pub mod script;

pub use dispatch::{Arg, DispatchError, Dispatcher, Reply, COMMANDS};
pub use error::ReplError;
pub use script::SharedDispatcher;

use crate::highlight::ReplHelper;
use colored::Colorize;
use directories::ProjectDirs;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use steel::rvals::SteelVal;
use steel::steel_vm::engine::Engine;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn get_banner() -> String {
    format!(
        r#"
                 _
   _  _ ___ ___| |__ (_)___
  | || (_-</ __| '_ \| / _ \     Version {}
   \_,_/__/\___|_.__/|_\___/     :? for help
"#,
        VERSION
    )
    .bright_yellow()
    .bold()
    .to_string()
}

fn get_history_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "usbio") {
        let mut path = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&path).ok();
        path.push("repl_history");
        path
    } else {
        PathBuf::from(".usbio_history")
    }
}

/// Build an engine with both usbio modules and the command wrappers loaded
pub fn create_engine(dispatcher: SharedDispatcher) -> Result<Engine, ReplError> {
    let mut engine = Engine::new();
    engine.register_module(script::create_command_module(dispatcher));
    engine.register_module(script::create_constants_module());
    engine
        .run(script::prelude())
        .map_err(|e| ReplError::SteelError(format!("{}", e)))?;
    Ok(engine)
}

fn print_results(results: Vec<SteelVal>) {
    for result in results {
        if !matches!(result, SteelVal::Void) {
            print!("{} ", "=>".bright_blue().bold());
            println!("{}", result);
        }
    }
}

/// Evaluate a whole script, stopping at the first error
pub fn run_script(dispatcher: Dispatcher, script: String) -> Result<(), ReplError> {
    let mut engine = create_engine(Arc::new(Mutex::new(dispatcher)))?;
    let results = engine
        .run(script)
        .map_err(|e| ReplError::SteelError(format!("{}", e)))?;
    print_results(results);
    Ok(())
}

/// Run the interactive REPL
pub fn run_repl(dispatcher: Dispatcher) -> Result<(), ReplError> {
    let mut engine = create_engine(Arc::new(Mutex::new(dispatcher)))?;

    let mut rl = Editor::<ReplHelper, FileHistory>::new()
        .map_err(|e| ReplError::IoError(std::io::Error::other(e)))?;
    rl.set_helper(Some(ReplHelper::new()));
    rl.set_check_cursor_position(true);

    let history_path = get_history_path();
    if rl.load_history(&history_path).is_err() {
        log::debug!("no history at {}", history_path.display());
    }

    println!("{}", get_banner());
    println!(
        "Type {} for available commands, {} or {} to exit.",
        "(usbio-help)".bright_cyan(),
        "(quit)".bright_cyan(),
        "(exit)".bright_cyan()
    );
    println!();

    let prompt = format!("{} ", "λ >".bright_green().bold());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match input {
                    "(quit)" | "(exit)" | ":q" | ":quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    ":?" | ":help" => {
                        print_help();
                        continue;
                    }
                    _ => {}
                }

                // a failed command only ends the current expression
                match engine.run(line.clone()) {
                    Ok(results) => print_results(results),
                    Err(e) => eprintln!("{}: {}", "Error".bright_red().bold(), e),
                }

                let _ = std::io::stdout().flush();
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "Error".bright_red().bold(), err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        eprintln!(
            "{}: Failed to save history: {}",
            "Warning".bright_yellow(),
            e
        );
    }

    Ok(())
}

fn print_help() {
    println!(
        "
    {} -- displays help dialog
    {}    -- exits the REPL

    {}       -- show bridge commands
    ",
        ":? | :help".bright_cyan(),
        ":q | :quit".bright_cyan(),
        "(usbio-help)".bright_cyan(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbio_core::OutcomeStatus;
    use usbio_dummy::DummyProvider;

    fn shared() -> SharedDispatcher {
        Arc::new(Mutex::new(Dispatcher::new(Box::new(DummyProvider::default()))))
    }

    #[test]
    fn test_script_runs_commands_in_order() {
        let dispatcher = shared();
        let mut engine = create_engine(Arc::clone(&dispatcher)).unwrap();
        let results = engine
            .run(
                r#"
            (adapter_open 0)
            (set_frequency 100)
            (spi_init 1 0 0)
            (spi_read_write (list 1 2 3) 3 cs_keep)
        "#,
            )
            .unwrap();
        let last = results.last().unwrap();
        assert_eq!(format!("{}", last), "(1 2 3)");

        let d = dispatcher.lock().unwrap();
        assert!(d.session().is_open());
        assert_eq!(d.session().clock().achieved_hz, 93_750);
    }

    #[test]
    fn test_failing_command_aborts_script() {
        let dispatcher = shared();
        let mut engine = create_engine(Arc::clone(&dispatcher)).unwrap();
        let err = engine
            .run("(adapter_open 0) (i2c_init 400) (i2c_read_ex #x50 1 \"RESTART\") (set_frequency 100)")
            .unwrap_err();
        assert!(format!("{}", err).contains("condition"));
        // the command after the failure never ran
        let d = dispatcher.lock().unwrap();
        assert_eq!(d.session().clock().achieved_hz, 10_000_000);
    }

    #[test]
    fn test_arity_error_from_script() {
        let mut engine = create_engine(shared()).unwrap();
        let err = engine.run("(spi_set_mode 0)").unwrap_err();
        assert!(format!("{}", err).contains("wrong # args"));
    }

    #[test]
    fn test_run_script_reports_hardware_error() {
        let dispatcher = Dispatcher::new(Box::new(DummyProvider::default()));
        let err = run_script(dispatcher, "(spi_reset)".to_string()).unwrap_err();
        assert!(matches!(err, ReplError::SteelError(_)));
        assert!(err.to_string().contains(OutcomeStatus::DeviceNotOpened.name()));
    }
}
