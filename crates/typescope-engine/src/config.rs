//! Engine configuration
//!
//! ```json
//! {
//!     "backing_fields": [{ "prefix": "_" }, { "prefix": "m_" }],
//!     "generated_type": { "assembly_name": "Stubs", "type_name": "Stub" }
//! }
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conventions::{BackingFieldConventions, BackingFieldResolver};
use crate::error::{ConfigError, ReflectResult};
use crate::synth::GeneratedTypeSpec;

/// Backing-field conventions and default generated-type names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectConfig {
    /// Conventions used to recognise backing fields
    pub backing_fields: BackingFieldConventions,
    /// Names used when synthesizing without an explicit spec
    pub generated_type: GeneratedTypeSpec,
}

impl ReflectConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: ReflectConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            conventions = config.backing_fields.len(),
            "loaded reflection config"
        );
        Ok(config)
    }

    /// Reject blank names and bare conventions
    pub fn validate(&self) -> ReflectResult<()> {
        self.backing_fields.validate()?;
        self.generated_type.validate()
    }

    /// Resolver over the configured conventions
    pub fn resolver(&self) -> BackingFieldResolver {
        BackingFieldResolver::new(self.backing_fields.clone())
    }
}
