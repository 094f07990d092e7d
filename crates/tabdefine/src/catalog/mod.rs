//! The ordered catalog of candidate column types.
//!
//! Types are tried narrowest first; the first type that accepts every value
//! of a column wins:
//!
//! 1. `boolean`
//! 2. `integer`
//! 3. `double precision`
//! 4. `numeric`
//! 5. `geometry(<kind>[,<srid>])`
//! 6. `varchar` (with `character_maximum_length`)
//! 7. `text`

mod config;
mod descriptor;
pub mod geometry;
mod numeric;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConfigError, NameFormatError};

pub use config::{BooleanTokens, CatalogConfig, GeometryConfig, DEFAULT_MAX_VARCHAR_LENGTH};
pub use descriptor::{CanonicalType, TypeDescriptor, TypeKind, Verdict};
pub use geometry::{
    GeometryFormat, GeometryInfo, GeometryKind, GeometryParser, StandardGeometryParser,
};

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]*$").unwrap());

/// Immutable, ordered list of type descriptors built from a [`CatalogConfig`].
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    config: CatalogConfig,
    descriptors: Vec<TypeDescriptor>,
}

impl TypeCatalog {
    /// Build a catalog, using the built-in geometry parser for the configured format.
    pub fn new(config: CatalogConfig) -> Result<Self, ConfigError> {
        let parser = Arc::new(StandardGeometryParser::new(config.geometry.format));
        Self::with_geometry_parser(config, parser)
    }

    /// Build a catalog with a custom geometry parser.
    pub fn with_geometry_parser(
        config: CatalogConfig,
        parser: Arc<dyn GeometryParser>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, parser))
    }

    fn build(config: CatalogConfig, parser: Arc<dyn GeometryParser>) -> Self {
        let tokens = config.boolean_tokens.clone();
        let max_length = config.max_varchar_length;
        let geometry = &config.geometry;

        let descriptors = vec![
            TypeDescriptor::boolean(tokens.clone()),
            TypeDescriptor::integer(),
            TypeDescriptor::double_precision(),
            TypeDescriptor::numeric(),
            TypeDescriptor::geometry(parser, geometry.kind, geometry.srid, geometry.enforce_kind),
            TypeDescriptor::varchar(max_length, tokens.clone()),
            TypeDescriptor::text(max_length, tokens),
        ];

        Self {
            config,
            descriptors,
        }
    }

    /// Descriptors in precedence order.
    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.descriptors
    }

    /// Look up the descriptor of a kind.
    pub fn get(&self, kind: TypeKind) -> &TypeDescriptor {
        // Descriptors are stored in `TypeKind::ORDER`.
        &self.descriptors[kind as usize]
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Whether a cell counts as missing.
    pub fn is_missing(&self, value: &str) -> bool {
        self.config.is_missing(value)
    }

    /// Check that a column name can be bound to a type.
    pub fn check_name(name: &str) -> Result<(), NameFormatError> {
        if name.is_empty() {
            Err(NameFormatError::Empty)
        } else if !NAME_PATTERN.is_match(name) {
            Err(NameFormatError::InvalidCharacters(name.to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        let config = CatalogConfig::default();
        let parser = Arc::new(StandardGeometryParser::new(config.geometry.format));
        Self::build(config, parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let catalog = TypeCatalog::default();
        let kinds: Vec<TypeKind> = catalog.descriptors().iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, TypeKind::ORDER.to_vec());
        for kind in TypeKind::ORDER {
            assert_eq!(catalog.get(kind).kind(), kind);
        }
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = CatalogConfig::default().with_max_varchar_length(0);
        assert!(TypeCatalog::new(config).is_err());
    }

    #[test]
    fn test_geometry_type_uses_config() {
        let config = CatalogConfig::default()
            .with_geometry_kind(GeometryKind::Point)
            .with_srid(25832);
        let catalog = TypeCatalog::new(config).unwrap();
        assert_eq!(
            catalog.get(TypeKind::Geometry).canonical_type().data_type(),
            "geometry(point,25832)"
        );
    }

    #[test]
    fn test_check_name() {
        assert!(TypeCatalog::check_name("Widerstand").is_ok());
        assert!(TypeCatalog::check_name("protest_art").is_ok());
        assert_eq!(TypeCatalog::check_name(""), Err(NameFormatError::Empty));
        assert!(matches!(
            TypeCatalog::check_name("Jahr 2015"),
            Err(NameFormatError::InvalidCharacters(_))
        ));
        assert!(TypeCatalog::check_name("col1").is_err());
        assert!(TypeCatalog::check_name("straße").is_err());
    }
}
