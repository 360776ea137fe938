//! Backend registration and selection
//!
//! A backend is an [`AdapterProvider`] chosen by a `name[:key=value,...]`
//! string. Each one is gated behind its cargo feature.

use std::collections::HashMap;
use thiserror::Error;
use usbio_core::AdapterProvider;

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Backend name and its key=value options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    pub name: String,
    pub params: HashMap<String, String>,
}

impl BackendParams {
    /// Options sorted by key, for deterministic parsing
    pub fn options(&self) -> Vec<(&str, &str)> {
        let mut options: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        options.sort();
        options
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParam(String),

    #[error("Unknown backend '{name}' [available: {available}]")]
    Unknown { name: String, available: String },

    #[cfg(feature = "dummy")]
    #[error(transparent)]
    Dummy(#[from] usbio_dummy::OptionError),
}

/// All backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["sim"],
        description: "Simulated FT4222H (adapters=<n>,i2c=<addr>[+<addr>],miso=<byte>,loopback=<bool>)",
    });

    backends
}

/// Short list of backend names for messages
pub fn backend_names_short() -> String {
    let names: Vec<&str> = available_backends().iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Split `name:key=value,...` into a name and its options
pub fn parse_backend_params(s: &str) -> Result<BackendParams, BackendError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            let (key, value) = opt
                .split_once('=')
                .ok_or_else(|| BackendError::InvalidParam(opt.to_string()))?;
            params.insert(key.to_string(), value.to_string());
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

/// Resolve a `name[:key=value,...]` string to its adapter provider
pub fn open_provider(spec: &str) -> Result<Box<dyn AdapterProvider + Send>, BackendError> {
    let params = parse_backend_params(spec)?;
    let info = available_backends()
        .into_iter()
        .find(|b| b.name == params.name || b.aliases.contains(&params.name.as_str()))
        .ok_or_else(|| BackendError::Unknown {
            name: params.name.clone(),
            available: backend_names_short(),
        })?;
    log::debug!("using backend {} with {:?}", info.name, params.options());

    match info.name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let config = usbio_dummy::parse_options(&params.options())?;
            Ok(Box::new(usbio_dummy::DummyProvider::new(config)))
        }
        _ => Err(BackendError::Unknown {
            name: params.name,
            available: backend_names_short(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_params() {
        let params = parse_backend_params("dummy:adapters=2,miso=0x00").unwrap();
        assert_eq!(params.name, "dummy");
        assert_eq!(params.options(), vec![("adapters", "2"), ("miso", "0x00")]);

        let params = parse_backend_params("dummy").unwrap();
        assert!(params.params.is_empty());

        assert!(matches!(
            parse_backend_params("dummy:adapters"),
            Err(BackendError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_unknown_backend() {
        assert!(matches!(
            open_provider("ch341a"),
            Err(BackendError::Unknown { .. })
        ));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_provider() {
        let provider = open_provider("dummy:adapters=3").unwrap();
        assert_eq!(provider.adapters().len(), 3);
        let provider = open_provider("sim").unwrap();
        assert_eq!(provider.adapters().len(), 1);
        assert!(matches!(
            open_provider("dummy:adapters=many"),
            Err(BackendError::Dummy(_))
        ));
    }
}
