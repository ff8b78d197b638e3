//! Message rendering configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! # Replace the default allow-list entirely (optional)
//! allowed_tag_names = ["p", "a", "em", "strong", "emoji", "mention"]
//! # Added to the allow-list
//! extra_allowed_tag_names = ["h1", "h2"]
//! # Removed from the allow-list
//! disallowed_tag_names = ["blockquote"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::filter::DEFAULT_ALLOWED_TAG_NAMES;

/// Allow-list configuration for a [`TextRenderer`](crate::TextRenderer).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageConfig {
    /// Replaces the built-in allow-list when set.
    pub allowed_tag_names: Option<Vec<String>>,
    pub extra_allowed_tag_names: Vec<String>,
    pub disallowed_tag_names: Vec<String>,
}

impl MessageConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded message config");
        Ok(config)
    }

    /// Resolved allow-list, in order, without duplicates.
    ///
    /// ```
    /// use rw_message::MessageConfig;
    ///
    /// let config = MessageConfig::from_toml_str(r#"
    ///     allowed_tag_names = ["p", "a"]
    ///     extra_allowed_tag_names = ["h1", "p"]
    ///     disallowed_tag_names = ["a"]
    /// "#).unwrap();
    /// assert_eq!(config.allowed_tag_names(), vec!["p", "h1"]);
    /// ```
    #[must_use]
    pub fn allowed_tag_names(&self) -> Vec<String> {
        let base = match &self.allowed_tag_names {
            Some(names) => names.clone(),
            None => DEFAULT_ALLOWED_TAG_NAMES
                .iter()
                .map(|&tag| tag.to_owned())
                .collect(),
        };
        let mut resolved: Vec<String> = Vec::with_capacity(base.len());
        for name in base.into_iter().chain(self.extra_allowed_tag_names.iter().cloned()) {
            if !self.disallowed_tag_names.contains(&name) && !resolved.contains(&name) {
                resolved.push(name);
            }
        }
        resolved
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let names = self
            .allowed_tag_names
            .iter()
            .flatten()
            .chain(&self.extra_allowed_tag_names)
            .chain(&self.disallowed_tag_names);
        for name in names {
            if !is_valid_tag_name(name) {
                return Err(ConfigError::Validation(format!("invalid tag name `{name}`")));
            }
        }
        Ok(())
    }
}

/// Lowercase ASCII letter followed by lowercase letters, digits or `-`.
fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
