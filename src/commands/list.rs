//! List commands implementation

use crate::backends;

/// List the adapters of the selected backend
pub fn list_adapters(backend: &str) -> Result<(), Box<dyn std::error::Error>> {
    let provider = backends::open_provider(backend)?;
    let adapters = provider.adapters();
    if adapters.is_empty() {
        return Err("no adapter detected".into());
    }

    println!("{} adapter(s) found:", adapters.len());
    println!();
    for adapter in &adapters {
        println!("  {}", adapter);
    }
    Ok(())
}

/// List all backends enabled at compile time
pub fn list_backends() {
    let backends = backends::available_backends();
    if backends.is_empty() {
        println!("No backends available (recompile with backend features enabled)");
        return;
    }

    println!("Available backends:");
    println!();
    for b in &backends {
        let aliases = if b.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", b.aliases.join(", "))
        };
        println!("  {:10} - {}{}", b.name, b.description, aliases);
    }
}
