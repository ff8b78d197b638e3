//! Error types for message rendering.

use std::path::PathBuf;

/// Failure reported by a source or tree plugin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("plugin `{plugin}` failed: {message}")]
pub struct PluginError {
    /// Name of the failing plugin.
    pub plugin: String,
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

/// Error returned by [`TextRenderer::render`](crate::TextRenderer::render).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// A plugin in one of the chains failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// The same plugin name appears twice in one chain.
    #[error("plugin `{0}` is registered more than once")]
    DuplicatePlugin(String),
}

/// Error loading a [`MessageConfig`](crate::MessageConfig).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}
