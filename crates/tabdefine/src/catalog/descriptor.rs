//! Type descriptors: a target column type paired with a value predicate.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValueFormatError;

use super::config::BooleanTokens;
use super::geometry::{GeometryKind, GeometryParser};
use super::numeric;

/// Candidate types, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Boolean,
    Integer,
    DoublePrecision,
    Numeric,
    Geometry,
    Varchar,
    Text,
}

impl TypeKind {
    /// All kinds in precedence order, narrowest first.
    pub const ORDER: [TypeKind; 7] = [
        TypeKind::Boolean,
        TypeKind::Integer,
        TypeKind::DoublePrecision,
        TypeKind::Numeric,
        TypeKind::Geometry,
        TypeKind::Varchar,
        TypeKind::Text,
    ];

    /// Identifier of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Integer => "integer",
            TypeKind::DoublePrecision => "double_precision",
            TypeKind::Numeric => "numeric",
            TypeKind::Geometry => "geometry",
            TypeKind::Varchar => "varchar",
            TypeKind::Text => "text",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column type as written into the schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalType {
    Boolean,
    Integer,
    DoublePrecision,
    Numeric,
    Geometry {
        kind: GeometryKind,
        srid: Option<u32>,
    },
    Varchar {
        max_length: usize,
    },
    Text,
    /// Auto-incrementing integer, used for the identity column.
    Serial,
}

impl CanonicalType {
    /// The `data_type` string of the schema document.
    pub fn data_type(&self) -> String {
        match self {
            CanonicalType::Boolean => "boolean".to_string(),
            CanonicalType::Integer => "integer".to_string(),
            CanonicalType::DoublePrecision => "double precision".to_string(),
            CanonicalType::Numeric => "numeric".to_string(),
            CanonicalType::Geometry { kind, srid: None } => format!("geometry({})", kind),
            CanonicalType::Geometry {
                kind,
                srid: Some(srid),
            } => format!("geometry({},{})", kind, srid),
            CanonicalType::Varchar { .. } => "varchar".to_string(),
            CanonicalType::Text => "text".to_string(),
            CanonicalType::Serial => "serial".to_string(),
        }
    }

    /// `character_maximum_length`, for bounded text only.
    pub fn character_maximum_length(&self) -> Option<usize> {
        match self {
            CanonicalType::Varchar { max_length } => Some(*max_length),
            _ => None,
        }
    }
}

/// Outcome of checking one value against one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The value belongs to the type.
    Matches,
    /// The value is well-formed but violates a rule of the type.
    DoesNotMatch(&'static str),
    /// The value cannot be read as the type at all.
    InvalidInput(ValueFormatError),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matches)
    }

    /// Human-readable reason for a non-match.
    pub fn reason(&self) -> Option<String> {
        match self {
            Verdict::Matches => None,
            Verdict::DoesNotMatch(reason) => Some((*reason).to_string()),
            Verdict::InvalidInput(error) => Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
enum Rule {
    Boolean(BooleanTokens),
    Integer,
    DoublePrecision,
    Numeric,
    Geometry {
        parser: Arc<dyn GeometryParser>,
        kind: GeometryKind,
        srid: Option<u32>,
        enforce_kind: bool,
    },
    Varchar {
        max_length: usize,
        tokens: BooleanTokens,
    },
    Text {
        max_length: usize,
        tokens: BooleanTokens,
    },
}

/// A catalog entry: type kind, canonical type and validation rule.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    kind: TypeKind,
    canonical: CanonicalType,
    rule: Rule,
}

impl TypeDescriptor {
    pub(crate) fn boolean(tokens: BooleanTokens) -> Self {
        Self {
            kind: TypeKind::Boolean,
            canonical: CanonicalType::Boolean,
            rule: Rule::Boolean(tokens),
        }
    }

    pub(crate) fn integer() -> Self {
        Self {
            kind: TypeKind::Integer,
            canonical: CanonicalType::Integer,
            rule: Rule::Integer,
        }
    }

    pub(crate) fn double_precision() -> Self {
        Self {
            kind: TypeKind::DoublePrecision,
            canonical: CanonicalType::DoublePrecision,
            rule: Rule::DoublePrecision,
        }
    }

    pub(crate) fn numeric() -> Self {
        Self {
            kind: TypeKind::Numeric,
            canonical: CanonicalType::Numeric,
            rule: Rule::Numeric,
        }
    }

    pub(crate) fn geometry(
        parser: Arc<dyn GeometryParser>,
        kind: GeometryKind,
        srid: Option<u32>,
        enforce_kind: bool,
    ) -> Self {
        Self {
            kind: TypeKind::Geometry,
            canonical: CanonicalType::Geometry { kind, srid },
            rule: Rule::Geometry {
                parser,
                kind,
                srid,
                enforce_kind,
            },
        }
    }

    pub(crate) fn varchar(max_length: usize, tokens: BooleanTokens) -> Self {
        Self {
            kind: TypeKind::Varchar,
            canonical: CanonicalType::Varchar { max_length },
            rule: Rule::Varchar { max_length, tokens },
        }
    }

    pub(crate) fn text(max_length: usize, tokens: BooleanTokens) -> Self {
        Self {
            kind: TypeKind::Text,
            canonical: CanonicalType::Text,
            rule: Rule::Text { max_length, tokens },
        }
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn canonical_type(&self) -> &CanonicalType {
        &self.canonical
    }

    /// Extra schema attributes contributed by this type.
    pub fn extra_attributes(&self) -> Option<usize> {
        self.canonical.character_maximum_length()
    }

    /// Check a single, non-missing value.
    pub fn validate(&self, value: &str) -> Verdict {
        match &self.rule {
            Rule::Boolean(tokens) => {
                if tokens.contains(value) {
                    Verdict::Matches
                } else {
                    Verdict::DoesNotMatch("not a boolean token")
                }
            }
            Rule::Integer => numeric::check_integer(value),
            Rule::DoublePrecision => numeric::check_double(value),
            Rule::Numeric => numeric::check_numeric(value),
            Rule::Geometry {
                parser,
                kind,
                srid,
                enforce_kind,
            } => match parser.parse(value) {
                Err(e) => Verdict::InvalidInput(e),
                Ok(info)
                    if *enforce_kind && *kind != GeometryKind::Geometry && info.kind != *kind =>
                {
                    Verdict::DoesNotMatch("geometry kind differs")
                }
                Ok(info) if srid.is_some() && info.srid.is_some() && info.srid != *srid => {
                    Verdict::DoesNotMatch("SRID differs")
                }
                Ok(_) => Verdict::Matches,
            },
            Rule::Varchar { max_length, tokens } => {
                if value.chars().count() >= *max_length {
                    Verdict::DoesNotMatch("too long for varchar")
                } else if tokens.contains(value) {
                    Verdict::DoesNotMatch("boolean token")
                } else {
                    Verdict::Matches
                }
            }
            Rule::Text { max_length, tokens } => {
                if value.chars().count() >= *max_length || !tokens.contains(value) {
                    Verdict::Matches
                } else {
                    Verdict::DoesNotMatch("boolean token")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::geometry::StandardGeometryParser;

    fn geometry(srid: Option<u32>, enforce_kind: bool) -> TypeDescriptor {
        TypeDescriptor::geometry(
            Arc::new(StandardGeometryParser::default()),
            GeometryKind::MultiPolygon,
            srid,
            enforce_kind,
        )
    }

    #[test]
    fn test_data_types() {
        assert_eq!(CanonicalType::DoublePrecision.data_type(), "double precision");
        assert_eq!(
            CanonicalType::Geometry {
                kind: GeometryKind::MultiPolygon,
                srid: None
            }
            .data_type(),
            "geometry(multipolygon)"
        );
        assert_eq!(
            CanonicalType::Geometry {
                kind: GeometryKind::Point,
                srid: Some(4326)
            }
            .data_type(),
            "geometry(point,4326)"
        );
        assert_eq!(CanonicalType::Serial.data_type(), "serial");
    }

    #[test]
    fn test_boolean_is_case_sensitive() {
        let d = TypeDescriptor::boolean(BooleanTokens::german());
        assert!(d.validate("Ja").is_match());
        assert!(d.validate("nein").is_match());
        assert!(!d.validate("JA").is_match());
    }

    #[test]
    fn test_varchar_limits() {
        let d = TypeDescriptor::varchar(5, BooleanTokens::default());
        assert!(d.validate("abcd").is_match());
        assert_eq!(d.validate("abcde"), Verdict::DoesNotMatch("too long for varchar"));
        assert_eq!(d.validate("yes"), Verdict::DoesNotMatch("boolean token"));
        // Length counts characters, not bytes.
        assert!(d.validate("äöüß").is_match());
        assert_eq!(d.extra_attributes(), Some(5));
    }

    #[test]
    fn test_text_accepts_long_and_non_token_values() {
        let d = TypeDescriptor::text(5, BooleanTokens::default());
        assert!(d.validate("abcdefgh").is_match());
        assert!(d.validate("abc").is_match());
        assert!(!d.validate("no").is_match());
        assert_eq!(d.extra_attributes(), None);
    }

    #[test]
    fn test_geometry_srid_and_kind() {
        let point = "SRID=3857;POINT(1 2)";
        assert!(geometry(None, false).validate(point).is_match());
        assert!(!geometry(Some(4326), false).validate(point).is_match());
        assert!(geometry(Some(3857), false).validate(point).is_match());
        assert!(!geometry(None, true).validate(point).is_match());
        assert!(matches!(
            geometry(None, false).validate("not a shape"),
            Verdict::InvalidInput(ValueFormatError::Geometry(_))
        ));
    }

    #[test]
    fn test_kind_order() {
        let mut sorted = TypeKind::ORDER;
        sorted.sort();
        assert_eq!(sorted, TypeKind::ORDER);
    }
}
