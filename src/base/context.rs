//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO and JSON errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding configuration context to Results.
pub trait ConfigResultExt<T> {
    /// Attach the source of the configuration to the error.
    ///
    /// # Example
    /// ```ignore
    /// use xhrnet::base::context::ConfigResultExt;
    ///
    /// let text = std::fs::read_to_string(path).config_context(path)?;
    /// // Error: "Invalid configuration: defaults.json: No such file or directory"
    /// ```
    fn config_context(self, source: &Path) -> Result<T, NetError>;
}

impl<T> ConfigResultExt<T> for Result<T, io::Error> {
    fn config_context(self, source: &Path) -> Result<T, NetError> {
        self.map_err(|e| NetError::invalid_config(format!("{}: {}", source.display(), e)))
    }
}

impl<T> ConfigResultExt<T> for Result<T, serde_json::Error> {
    fn config_context(self, source: &Path) -> Result<T, NetError> {
        self.map_err(|e| {
            NetError::invalid_config(format!(
                "{}:{}:{}: {}",
                source.display(),
                e.line(),
                e.column(),
                e
            ))
        })
    }
}
