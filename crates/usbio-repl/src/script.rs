//! Steel bindings for the bridge commands
//!
//! Every command of the dispatch table is reachable from Scheme under its
//! own name. The prelude defines one variadic wrapper per command around
//! `usbio-dispatch`, so arity errors come from the dispatcher with the
//! command's usage string.

use std::sync::{Arc, Mutex};
use steel::rvals::SteelVal;
use steel::steel_vm::builtin::BuiltInModule;
use steel::steel_vm::register_fn::RegisterFn;
use usbio_core::{I2cCondition, DEFAULT_FREQUENCY_KHZ, TRANSFER_BUFFER_SIZE};

use crate::dispatch::{Arg, Dispatcher, Reply, COMMANDS, CS_KEEP};

/// Dispatcher shared with the engine's closures
pub type SharedDispatcher = Arc<Mutex<Dispatcher>>;

/// Names of the byte helpers, for completion
pub const UTILITIES: &[&str] = &[
    "make-bytes",
    "bytes-length",
    "bytes-ref",
    "bytes->hex",
    "hex->bytes",
    "list->bytes",
    "usbio-help",
];

/// Names bound by the constants module
pub fn constant_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = I2cCondition::ALL.iter().map(|c| c.token()).collect();
    names.extend(["Repeated_START", "cs_keep", "CS_KEEP", "TRANSFER_BUFFER_SIZE", "DEFAULT_FREQUENCY_KHZ"]);
    names
}

/// Create the command module bound to `dispatcher`
pub fn create_command_module(dispatcher: SharedDispatcher) -> BuiltInModule {
    let mut module = BuiltInModule::new("usbio/commands");

    let d = Arc::clone(&dispatcher);
    module.register_fn("usbio-dispatch", move |name: String, args: SteelVal| {
        dispatch(&d, &name, args)
    });

    register_byte_utilities(&mut module);

    module.register_fn("usbio-help", || {
        print_help();
        SteelVal::Void
    });

    module
}

/// Create the module of condition tokens and limits
pub fn create_constants_module() -> BuiltInModule {
    let mut module = BuiltInModule::new("usbio/constants");

    for condition in I2cCondition::ALL {
        module.register_value(condition.token(), SteelVal::StringV(condition.token().into()));
    }
    module.register_value(
        "Repeated_START",
        SteelVal::StringV(I2cCondition::RepeatedStart.token().into()),
    );
    module.register_value("cs_keep", SteelVal::StringV(CS_KEEP.into()));
    module.register_value("CS_KEEP", SteelVal::StringV(CS_KEEP.into()));
    module.register_value("TRANSFER_BUFFER_SIZE", SteelVal::IntV(TRANSFER_BUFFER_SIZE as isize));
    module.register_value(
        "DEFAULT_FREQUENCY_KHZ",
        SteelVal::IntV(DEFAULT_FREQUENCY_KHZ as isize),
    );

    module
}

/// Scheme source that imports both modules and defines the command wrappers
pub fn prelude() -> String {
    let mut prelude = String::from("(require-builtin usbio/commands)\n(require-builtin usbio/constants)\n");
    for spec in COMMANDS {
        prelude.push_str(&format!(
            "(define ({name} . args) (usbio-dispatch \"{name}\" args))\n",
            name = spec.name
        ));
    }
    prelude
}

fn dispatch(dispatcher: &SharedDispatcher, name: &str, args: SteelVal) -> Result<SteelVal, String> {
    let args = match args {
        SteelVal::ListV(items) => items.iter().map(steel_to_arg).collect::<Vec<_>>(),
        SteelVal::Void => Vec::new(),
        other => vec![steel_to_arg(&other)],
    };
    let mut d = dispatcher.lock().map_err(|e| format!("lock error: {}", e))?;
    d.dispatch(name, &args)
        .map(reply_to_steel)
        .map_err(|e| e.to_string())
}

fn steel_to_arg(val: &SteelVal) -> Arg {
    match val {
        SteelVal::IntV(i) => Arg::Int(*i as i64),
        SteelVal::BoolV(b) => Arg::Bool(*b),
        SteelVal::StringV(s) => Arg::Text(s.to_string()),
        SteelVal::SymbolV(s) => Arg::Text(s.to_string()),
        SteelVal::ListV(items) => Arg::List(items.iter().map(steel_to_arg).collect()),
        other => Arg::Other(format!("{}", other)),
    }
}

fn reply_to_steel(reply: Reply) -> SteelVal {
    match reply {
        Reply::Unit => SteelVal::Void,
        Reply::Int(value) => SteelVal::IntV(value as isize),
        Reply::Bytes(bytes) => bytes_to_steel(&bytes),
        Reply::Ints(values) => SteelVal::ListV(values.into_iter().map(|v| SteelVal::IntV(v as isize)).collect()),
    }
}

fn bytes_to_steel(bytes: &[u8]) -> SteelVal {
    SteelVal::ListV(bytes.iter().map(|&b| SteelVal::IntV(b as isize)).collect())
}

fn steel_to_bytes(val: &SteelVal) -> Result<Vec<u8>, String> {
    match val {
        SteelVal::ListV(items) => items
            .iter()
            .map(|v| match v {
                SteelVal::IntV(i) => u8::try_from(*i).map_err(|_| format!("{} is not a byte", i)),
                _ => Err("expected list of integers".to_string()),
            })
            .collect(),
        SteelVal::StringV(s) => Ok(s.as_bytes().to_vec()),
        _ => Err("expected list or string".to_string()),
    }
}

fn register_byte_utilities(module: &mut BuiltInModule) {
    module.register_fn("make-bytes", |len: isize, fill: isize| -> Result<SteelVal, String> {
        let len = usize::try_from(len).map_err(|_| format!("make-bytes: negative length {}", len))?;
        let fill = u8::try_from(fill).map_err(|_| format!("make-bytes: {} is not a byte", fill))?;
        Ok(bytes_to_steel(&vec![fill; len]))
    });

    module.register_fn("bytes-length", |data: SteelVal| -> Result<isize, String> {
        Ok(steel_to_bytes(&data)?.len() as isize)
    });

    module.register_fn("bytes-ref", |data: SteelVal, index: isize| -> Result<isize, String> {
        let bytes = steel_to_bytes(&data)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| bytes.get(i))
            .map(|&b| b as isize)
            .ok_or_else(|| format!("index {} out of bounds", index))
    });

    module.register_fn("list->bytes", |list: SteelVal| -> Result<SteelVal, String> {
        match list {
            SteelVal::ListV(_) => Ok(bytes_to_steel(&steel_to_bytes(&list)?)),
            _ => Err("list->bytes: expected list".to_string()),
        }
    });

    module.register_fn("bytes->hex", |data: SteelVal| -> Result<String, String> {
        Ok(to_hex(&steel_to_bytes(&data)?))
    });

    module.register_fn("hex->bytes", |hex: String| -> Result<SteelVal, String> {
        from_hex(&hex).map(|bytes| bytes_to_steel(&bytes))
    });
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn from_hex(hex: &str) -> Result<Vec<u8>, String> {
    let hex = hex.replace("0x", "").replace([' ', ','], "");
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex at offset {}", i))
        })
        .collect()
}

fn print_help() {
    println!("Bridge commands:");
    for spec in COMMANDS {
        println!("  {:<58} {}", format!("({})", spec.usage()), spec.summary);
    }
    println!();
    println!("Byte utilities:");
    println!("  (make-bytes len fill)     - Create a byte list");
    println!("  (bytes-length data)       - Length of a byte list");
    println!("  (bytes-ref data i)        - Byte at index i");
    println!("  (list->bytes list)        - Validate a list as bytes");
    println!("  (bytes->hex data)         - Format as hex string");
    println!("  (hex->bytes \"de ad\")      - Parse a hex string");
    println!();
    println!("Constants:");
    println!("  START REPEATED_START STOP START_AND_STOP  - I2C framing conditions");
    println!("  cs_keep                                  - Keep chip-select asserted");
    println!("  TRANSFER_BUFFER_SIZE DEFAULT_FREQUENCY_KHZ");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_wraps_every_command() {
        let prelude = prelude();
        for spec in COMMANDS {
            let wrapper = format!("(define ({} . args) (usbio-dispatch \"{}\" args))", spec.name, spec.name);
            assert!(prelude.contains(&wrapper), "missing {}", spec.name);
        }
    }

    #[test]
    fn test_hex() {
        assert_eq!(to_hex(&[0xDE, 0xAD, 0x01]), "de ad 01");
        assert_eq!(from_hex("de ad,0x01").unwrap(), vec![0xDE, 0xAD, 0x01]);
        assert!(from_hex("abc").is_err());
        assert!(from_hex("zz").is_err());
    }

    #[test]
    fn test_argument_conversion() {
        let list = SteelVal::ListV(vec![SteelVal::IntV(1), SteelVal::BoolV(true)].into_iter().collect());
        assert_eq!(steel_to_arg(&list), Arg::List(vec![Arg::Int(1), Arg::Bool(true)]));
        assert_eq!(steel_to_arg(&SteelVal::StringV("cs_keep".into())), Arg::Text("cs_keep".to_string()));
    }

    #[test]
    fn test_constant_names() {
        let names = constant_names();
        assert!(names.contains(&"REPEATED_START"));
        assert!(names.contains(&"START_AND_STOP"));
        assert!(names.contains(&"cs_keep"));
    }
}
