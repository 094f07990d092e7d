//! First-match-wins classification of a single column.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{TypeCatalog, TypeDescriptor, TypeKind};
use crate::error::NameFormatError;

/// A column as read from the source: header and raw cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    pub name: &'a str,
    pub values: Vec<&'a str>,
}

impl<'a> Column<'a> {
    pub fn new(name: &'a str, values: Vec<&'a str>) -> Self {
        Self { name, values }
    }
}

/// The first value that made a type fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// The type that was ruled out.
    #[serde(rename = "type")]
    pub type_kind: TypeKind,
    /// Zero-based data row of the offending value.
    pub row: usize,
    pub value: String,
    pub reason: String,
}

/// Why a column received no type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoMatchReason {
    /// The column has no non-missing values.
    Empty,
    /// The column name cannot be bound to any type.
    InvalidName(NameFormatError),
    /// Every type rejected at least one value, in catalog order.
    Rejected(Vec<Rejection>),
}

/// Result of classifying a column.
#[derive(Debug, Clone)]
pub enum Classification<'c> {
    Matched(&'c TypeDescriptor),
    NoMatch(NoMatchReason),
}

impl<'c> Classification<'c> {
    /// The inferred type, if any.
    pub fn descriptor(&self) -> Option<&'c TypeDescriptor> {
        match self {
            Classification::Matched(d) => Some(d),
            Classification::NoMatch(_) => None,
        }
    }
}

/// Tries each catalog type in order against every non-missing value.
pub struct ColumnClassifier<'c> {
    catalog: &'c TypeCatalog,
}

impl<'c> ColumnClassifier<'c> {
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Classify a column.
    pub fn classify(&self, column: &Column<'_>) -> Classification<'c> {
        if let Err(e) = TypeCatalog::check_name(column.name) {
            debug!("Column '{}' has an invalid name: {}", column.name, e);
            return Classification::NoMatch(NoMatchReason::InvalidName(e));
        }

        let present: Vec<(usize, &str)> = column
            .values
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !self.catalog.is_missing(v))
            .collect();

        if present.is_empty() {
            debug!("Column '{}' has no values", column.name);
            return Classification::NoMatch(NoMatchReason::Empty);
        }

        let mut rejections = Vec::new();
        for descriptor in self.catalog.descriptors() {
            match first_rejection(descriptor, &present) {
                None => {
                    debug!(
                        "Column '{}' classified as {} ({} value(s))",
                        column.name,
                        descriptor.kind(),
                        present.len()
                    );
                    return Classification::Matched(descriptor);
                }
                Some(rejection) => rejections.push(rejection),
            }
        }

        debug!("Column '{}' matched no type", column.name);
        Classification::NoMatch(NoMatchReason::Rejected(rejections))
    }
}

fn first_rejection(descriptor: &TypeDescriptor, values: &[(usize, &str)]) -> Option<Rejection> {
    values.iter().find_map(|&(row, value)| {
        descriptor.validate(value).reason().map(|reason| Rejection {
            type_kind: descriptor.kind(),
            row,
            value: value.to_string(),
            reason,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    fn classify_with(catalog: &TypeCatalog, values: &[&str]) -> Option<TypeKind> {
        let column = Column::new("col", values.to_vec());
        ColumnClassifier::new(catalog)
            .classify(&column)
            .descriptor()
            .map(|d| d.kind())
    }

    fn classify(values: &[&str]) -> Option<TypeKind> {
        classify_with(&TypeCatalog::default(), values)
    }

    #[test]
    fn test_boolean_tokens() {
        assert_eq!(classify(&["yes", "no", "y", "n"]), Some(TypeKind::Boolean));
        assert_eq!(classify(&["1", "0", "1"]), Some(TypeKind::Boolean));
    }

    #[test]
    fn test_integers() {
        assert_eq!(classify(&["3", "42", "-7"]), Some(TypeKind::Integer));
        assert_eq!(classify(&["0", "17"]), Some(TypeKind::Integer));
    }

    #[test]
    fn test_double_precision() {
        assert_eq!(classify(&["1.5", "2.75"]), Some(TypeKind::DoublePrecision));
    }

    #[test]
    fn test_numeric() {
        assert_eq!(classify(&["0.1", "2.3"]), Some(TypeKind::Numeric));
        assert_eq!(classify(&["3.14159"]), Some(TypeKind::Numeric));
    }

    #[test]
    fn test_long_values_keep_numeric_types() {
        assert_eq!(
            classify(&["0.12345678901234567890123456789", "2.3"]),
            Some(TypeKind::Numeric)
        );
        // 2^70 is exact as a double.
        assert_eq!(classify(&["1180591620717411303424", "12"]), Some(TypeKind::Integer));
    }

    #[test]
    fn test_fractions_split_between_double_and_numeric_fall_through() {
        // "2.5" is exact as a double, "0.1" is not: neither type accepts both.
        assert_eq!(classify(&["0.1", "2.5"]), Some(TypeKind::Varchar));
    }

    #[test]
    fn test_mixed_integer_and_fraction_is_text() {
        // No numeric type accepts both integral and fractional values.
        assert_eq!(classify(&["1.5", "2"]), Some(TypeKind::Varchar));
    }

    #[test]
    fn test_geometry() {
        assert_eq!(
            classify(&["POINT(1 2)", "SRID=4326;MULTIPOLYGON(((0 0,1 0,1 1,0 0)))"]),
            Some(TypeKind::Geometry)
        );
    }

    #[test]
    fn test_varchar_and_text() {
        assert_eq!(classify(&["Berlin", "Hamburg"]), Some(TypeKind::Varchar));
        let long = "x".repeat(50);
        assert_eq!(classify(&[&long]), Some(TypeKind::Text));
        assert_eq!(classify(&["short", &long]), Some(TypeKind::Text));
    }

    #[test]
    fn test_postal_codes_fall_through_to_varchar() {
        assert_eq!(classify(&["01067", "10115"]), Some(TypeKind::Varchar));
    }

    #[test]
    fn test_mixed_boolean_and_text_matches_nothing() {
        let catalog = TypeCatalog::default();
        let column = Column::new("col", vec!["yes", "maybe"]);
        match ColumnClassifier::new(&catalog).classify(&column) {
            Classification::NoMatch(NoMatchReason::Rejected(rejections)) => {
                let kinds: Vec<TypeKind> = rejections.iter().map(|r| r.type_kind).collect();
                assert_eq!(kinds, TypeKind::ORDER.to_vec());
                assert_eq!(rejections[0].row, 1);
                assert_eq!(rejections[0].value, "maybe");
                assert_eq!(rejections[5].value, "yes");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_missing_values_are_skipped() {
        assert_eq!(classify(&["", "5", ""]), Some(TypeKind::Integer));
    }

    #[test]
    fn test_empty_column() {
        let catalog = TypeCatalog::default();
        for values in [vec![], vec!["", ""]] {
            let column = Column::new("col", values);
            assert!(matches!(
                ColumnClassifier::new(&catalog).classify(&column),
                Classification::NoMatch(NoMatchReason::Empty)
            ));
        }
    }

    #[test]
    fn test_invalid_name() {
        let catalog = TypeCatalog::default();
        let column = Column::new("Jahr 2015", vec!["1"]);
        assert!(matches!(
            ColumnClassifier::new(&catalog).classify(&column),
            Classification::NoMatch(NoMatchReason::InvalidName(_))
        ));
    }

    #[test]
    fn test_custom_null_tokens() {
        let catalog =
            TypeCatalog::new(CatalogConfig::default().with_null_tokens(["", "NA"])).unwrap();
        assert_eq!(classify_with(&catalog, &["NA", "12"]), Some(TypeKind::Integer));
        assert_eq!(classify(&["NA", "12"]), Some(TypeKind::Varchar));
    }
}
