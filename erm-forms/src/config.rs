//! Form configuration loaded with figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. An optional YAML, TOML or JSON file
//! 3. `ERM_FORMS_` environment variables, e.g. `ERM_FORMS_MAX_DECIMAL_PLACES=4`

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FormsError, Result};
use crate::logging::Pretty;

/// Prefix of the environment variables read by [`FormsConfig::load`].
pub const ENV_PREFIX: &str = "ERM_FORMS_";

/// Settings shared by the editors of one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Path under which custom property values are stored.
    pub custom_properties_name: String,
    /// Translation namespace for row titles and the add button.
    pub translation_key: String,
    /// Decimal places accepted for decimal custom properties.
    pub max_decimal_places: u32,
    pub primary_section_label: String,
    pub optional_section_label: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            custom_properties_name: "customProperties".to_string(),
            translation_key: "customProperty".to_string(),
            max_decimal_places: 2,
            primary_section_label: "Primary properties".to_string(),
            optional_section_label: "Optional properties".to_string(),
        }
    }
}

impl FormsConfig {
    /// Defaults overridden by environment variables.
    pub fn load() -> Result<Self> {
        Self::extract(Self::defaults().merge(Self::env()))
    }

    /// Defaults, then the file at `path`, then environment variables.
    ///
    /// The format follows the extension; anything other than `.toml` or
    /// `.json` is read as YAML.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FormsError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        trace!(path = %path.display(), "loading forms config file");

        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Figment::from(Toml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => Figment::from(Yaml::file(path)),
        };
        Self::extract(Self::defaults().merge(file).merge(Self::env()))
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(FormsConfig::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: FormsConfig = figment.extract()?;
        debug!("forms config: {}", Pretty(&config));
        Ok(config)
    }
}
