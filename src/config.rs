//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Optional TOML file passed to [`Settings::load`]
//! 3. Environment variables: `JSONAPI_DOM_*` prefix, `__` as nesting separator

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::error::DocumentError;

const ENV_PREFIX: &str = "JSONAPI_DOM";

/// Order of resources returned for a to-many relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedOrder {
    /// Order of the identifiers in the relationship linkage.
    #[default]
    Linkage,
    /// Document order of the matching resources.
    Document,
}

impl RelatedOrder {
    fn parse(value: &str) -> Result<Self, DocumentError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linkage" => Ok(RelatedOrder::Linkage),
            "document" => Ok(RelatedOrder::Document),
            other => Err(DocumentError::Config {
                message: format!("invalid related_order: {other} (expected linkage or document)"),
            }),
        }
    }
}

/// Settings for assembling and reading documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Order of related resource collections
    pub related_order: RelatedOrder,
    /// Reject wire attributes and relationships the resource type does not declare
    pub strict_attributes: bool,
    /// `jsonapi.version` emitted when a built document carries none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonapi_version: Option<String>,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and the environment.
    ///
    /// A given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, DocumentError> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, DocumentError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("related_order", "linkage")
            .map_err(config_err)?
            .set_default("strict_attributes", defaults.strict_attributes)
            .map_err(config_err)?;

        if let Some(path) = path {
            debug!(path = %path.display(), "loading settings file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;

        Self::apply_env_overrides(settings, environment)
    }

    /// Apply environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, environment: Environment) -> Result<Self, DocumentError> {
        let config = Config::builder()
            .add_source(environment.prefix_separator("_").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("related_order") {
            settings.related_order = RelatedOrder::parse(&val)?;
        }
        if let Ok(val) = config.get_bool("strict_attributes") {
            settings.strict_attributes = val;
        }
        if let Ok(val) = config.get_string("jsonapi_version") {
            settings.jsonapi_version = Some(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, DocumentError> {
        toml::to_string_pretty(self).map_err(|e| DocumentError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# jsonapi-dom configuration
#
# Env: JSONAPI_DOM_* environment variables override file values.

# Order of related resource collections: "linkage" or "document"
# related_order = "linkage"

# Fail on wire attributes/relationships the resource type does not declare
# strict_attributes = false

# Version emitted in the top-level jsonapi member of built documents
# jsonapi_version = "1.1"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> DocumentError {
    DocumentError::Config {
        message: e.to_string(),
    }
}
