//! Catalog configuration.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, TabdefError};

use super::geometry::{GeometryFormat, GeometryKind};

/// Default threshold separating `varchar` from `text`.
pub const DEFAULT_MAX_VARCHAR_LENGTH: usize = 50;

/// Literal tokens recognised as boolean values. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanTokens {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl BooleanTokens {
    /// Create a token set from explicit truthy and falsy lists.
    pub fn new<T: Into<String>>(
        truthy: impl IntoIterator<Item = T>,
        falsy: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            truthy: truthy.into_iter().map(Into::into).collect(),
            falsy: falsy.into_iter().map(Into::into).collect(),
        }
    }

    /// The German survey tokens (`Ja`/`Nein`).
    pub fn german() -> Self {
        Self::new(["Ja", "ja", "1"], ["Nein", "nein", "0"])
    }

    /// Whether `value` is one of the tokens.
    pub fn contains(&self, value: &str) -> bool {
        self.interpret(value).is_some()
    }

    /// Map a token to its truth value.
    pub fn interpret(&self, value: &str) -> Option<bool> {
        if self.truthy.iter().any(|t| t == value) {
            Some(true)
        } else if self.falsy.iter().any(|t| t == value) {
            Some(false)
        } else {
            None
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.truthy.is_empty() && self.falsy.is_empty() {
            return Err(ConfigError::EmptyBooleanTokens);
        }
        let truthy: HashSet<&str> = self.truthy.iter().map(String::as_str).collect();
        if let Some(token) = self.falsy.iter().find(|t| truthy.contains(t.as_str())) {
            return Err(ConfigError::AmbiguousBooleanToken(token.clone()));
        }
        Ok(())
    }
}

impl Default for BooleanTokens {
    fn default() -> Self {
        Self::new(
            ["Yes", "yes", "Y", "y", "1"],
            ["No", "no", "N", "n", "0"],
        )
    }
}

/// How geometry values are recognised and which column type they produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Geometry kind used in the column type, e.g. `geometry(multipolygon)`.
    pub kind: GeometryKind,
    /// Spatial reference identifier appended to the column type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srid: Option<u32>,
    /// Accepted encodings.
    pub format: GeometryFormat,
    /// Reject values whose kind differs from `kind`.
    pub enforce_kind: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            kind: GeometryKind::MultiPolygon,
            srid: None,
            format: GeometryFormat::Any,
            enforce_kind: false,
        }
    }
}

/// Configuration injected into [`TypeCatalog`](super::TypeCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Tokens accepted by the boolean type and refused by `varchar`.
    pub boolean_tokens: BooleanTokens,
    /// Values shorter than this are `varchar`, longer ones `text`.
    pub max_varchar_length: usize,
    /// Geometry recognition.
    pub geometry: GeometryConfig,
    /// Cell values treated as missing and skipped during classification.
    pub null_tokens: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            boolean_tokens: BooleanTokens::default(),
            max_varchar_length: DEFAULT_MAX_VARCHAR_LENGTH,
            geometry: GeometryConfig::default(),
            null_tokens: vec![String::new()],
        }
    }
}

impl CatalogConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TabdefError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: CatalogConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the boolean tokens.
    pub fn with_boolean_tokens(mut self, tokens: BooleanTokens) -> Self {
        self.boolean_tokens = tokens;
        self
    }

    /// Set the varchar length threshold.
    pub fn with_max_varchar_length(mut self, length: usize) -> Self {
        self.max_varchar_length = length;
        self
    }

    /// Set the geometry kind.
    pub fn with_geometry_kind(mut self, kind: GeometryKind) -> Self {
        self.geometry.kind = kind;
        self
    }

    /// Set the geometry SRID.
    pub fn with_srid(mut self, srid: u32) -> Self {
        self.geometry.srid = Some(srid);
        self
    }

    /// Set the accepted geometry encodings.
    pub fn with_geometry_format(mut self, format: GeometryFormat) -> Self {
        self.geometry.format = format;
        self
    }

    /// Set the missing-value tokens.
    pub fn with_null_tokens<T: Into<String>>(
        mut self,
        tokens: impl IntoIterator<Item = T>,
    ) -> Self {
        self.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Check the configuration for values the catalog cannot work with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_varchar_length == 0 {
            return Err(ConfigError::ZeroVarcharLength);
        }
        self.boolean_tokens.validate()?;
        if let Some(token) = self
            .null_tokens
            .iter()
            .find(|t| self.boolean_tokens.contains(t))
        {
            return Err(ConfigError::Invalid(format!(
                "'{}' cannot be both a null token and a boolean token",
                token
            )));
        }
        Ok(())
    }

    /// Whether a cell counts as missing.
    pub fn is_missing(&self, value: &str) -> bool {
        self.null_tokens.iter().any(|t| t == value)
    }
}
