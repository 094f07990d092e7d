//! End-to-end tests: data file in, definition document out.

use std::fs;
use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use tabdefine::api::{MockTableApi, UploadConfig, Uploader};
use tabdefine::catalog::{BooleanTokens, GeometryKind};
use tabdefine::inference::{ColumnStatus, DropReason};
use tabdefine::{
    CatalogConfig, ReaderConfig, SchemaWriter, TabdefConfig, TabdefError, TableDefiner,
    UnmatchedPolicy,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Protest survey data with one column of every kind.
fn protest_data() -> NamedTempFile {
    let long = "Bürgerinitiative gegen den Ausbau der Stromtrasse im Landkreis";
    let content = format!(
        "Ort,Teilnehmer,Anteil,Quote,Genehmigt,Flaeche,Bemerkung,Status,Jahr 2015\n\
         Berlin,120,1.5,0.1,yes,\"MULTIPOLYGON(((0 0,1 0,1 1,0 0)))\",kurz,yes,1\n\
         Hamburg,85,2.75,2.3,no,\"MULTIPOLYGON(((2 2,3 2,3 3,2 2)))\",{},vertagt,2\n\
         Leipzig,,0.5,,n,,,,3\n",
        long
    );
    create_test_file(&content)
}

// =============================================================================
// Definition Tests
// =============================================================================

#[test]
fn test_define_protest_data() {
    let file = protest_data();
    let result = TableDefiner::new().define(file.path()).unwrap();
    let doc = &result.document;

    assert_eq!(
        doc.column_names(),
        vec![
            "ort",
            "teilnehmer",
            "anteil",
            "quote",
            "genehmigt",
            "flaeche",
            "bemerkung",
            "id"
        ]
    );

    let types: Vec<&str> = doc.columns().iter().map(|c| c.data_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "varchar",
            "integer",
            "double precision",
            "numeric",
            "boolean",
            "geometry(multipolygon)",
            "text",
            "serial"
        ]
    );
    assert_eq!(doc.get_column("ort").unwrap().character_maximum_length, Some(50));
    assert_eq!(doc.get_column("bemerkung").unwrap().character_maximum_length, None);
}

#[test]
fn test_unmatched_columns_reported() {
    let file = protest_data();
    let result = TableDefiner::new().define(file.path()).unwrap();

    let dropped: Vec<(&str, &ColumnStatus)> = result
        .report
        .dropped()
        .map(|c| (c.source_name.as_str(), &c.status))
        .collect();
    assert_eq!(dropped.len(), 2);

    assert_eq!(dropped[0].0, "Status");
    assert!(matches!(
        dropped[0].1,
        ColumnStatus::Dropped {
            cause: DropReason::NoMatchingType { .. }
        }
    ));

    assert_eq!(dropped[1].0, "Jahr 2015");
    assert!(matches!(
        dropped[1].1,
        ColumnStatus::Dropped {
            cause: DropReason::InvalidName { .. }
        }
    ));

    assert_eq!(result.summary.total_columns, 9);
    assert_eq!(result.summary.typed, 7);
    assert_eq!(result.summary.dropped, 2);
}

#[test]
fn test_missing_cells_counted() {
    let file = protest_data();
    let result = TableDefiner::new().define(file.path()).unwrap();
    let teilnehmer = result
        .report
        .columns
        .iter()
        .find(|c| c.name == "teilnehmer")
        .unwrap();
    assert_eq!(teilnehmer.missing, 1);
}

#[test]
fn test_fallback_to_text() {
    let file = protest_data();
    let config = TabdefConfig::default().with_policy(UnmatchedPolicy::FallbackToText);
    let result = TableDefiner::with_config(config)
        .unwrap()
        .define(file.path())
        .unwrap();

    assert_eq!(result.document.get_column("status").unwrap().data_type, "text");
    // Invalid names are never recoverable.
    assert_eq!(result.summary.dropped, 1);
    assert_eq!(result.summary.fallbacks, 1);
}

#[test]
fn test_fail_fast() {
    let file = protest_data();
    let config = TabdefConfig::default().with_policy(UnmatchedPolicy::FailFast);
    let err = TableDefiner::with_config(config)
        .unwrap()
        .define(file.path())
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("2 column(s) could not be typed"));
    assert!(message.contains("Status"));
    assert!(message.contains("Jahr 2015"));
}

// =============================================================================
// Output Tests
// =============================================================================

#[test]
fn test_written_definition_is_byte_stable() {
    let file = protest_data();
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    let definer = TableDefiner::new();
    SchemaWriter::save(&definer.define(file.path()).unwrap().document, &first).unwrap();
    SchemaWriter::save(&definer.define(file.path()).unwrap().document, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    let loaded = SchemaWriter::load(&first).unwrap();
    assert_eq!(loaded, definer.define(file.path()).unwrap().document);
}

#[test]
fn test_small_definition_exact_output() {
    let file = create_test_file("Menge,Aktiv\n3,Y\n4,N\n");
    let result = TableDefiner::new().define(file.path()).unwrap();
    let json = SchemaWriter::to_json_string(&result.document).unwrap();

    let expected = r#"{
    "query": {
        "columns": [
            {
                "data_type": "integer",
                "name": "menge"
            },
            {
                "data_type": "boolean",
                "name": "aktiv"
            },
            {
                "data_type": "serial",
                "is_nullable": "NO",
                "name": "id"
            }
        ],
        "constraints": [
            {
                "constraint_parameter": "id",
                "constraint_type": "PRIMARY KEY"
            }
        ]
    }
}"#;
    assert_eq!(json, expected);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_config_file() {
    let config_file = create_test_file(
        r#"{
            "boolean_tokens": {"truthy": ["Ja", "ja"], "falsy": ["Nein", "nein"]},
            "max_varchar_length": 20,
            "geometry": {"kind": "point", "srid": 4326},
            "null_tokens": ["", "k.A."]
        }"#,
    );
    let catalog = CatalogConfig::from_file(config_file.path()).unwrap();
    assert_eq!(catalog.max_varchar_length, 20);
    assert_eq!(catalog.geometry.kind, GeometryKind::Point);

    // EWKT contains ';', so the file uses '|'.
    let data = create_test_file(
        "Zustimmung|Ort|Lage\nJa|Berlin|SRID=4326;POINT(13.4 52.5)\nnein|k.A.|\n",
    );
    let config = TabdefConfig::default()
        .with_reader(ReaderConfig::default().with_delimiter(b'|'))
        .with_catalog(catalog);
    let result = TableDefiner::with_config(config)
        .unwrap()
        .define(data.path())
        .unwrap();

    let doc = result.document;
    assert_eq!(doc.get_column("zustimmung").unwrap().data_type, "boolean");
    assert_eq!(doc.get_column("ort").unwrap().data_type, "varchar");
    assert_eq!(doc.get_column("ort").unwrap().character_maximum_length, Some(20));
    assert_eq!(doc.get_column("lage").unwrap().data_type, "geometry(point,4326)");
}

#[test]
fn test_invalid_config_file() {
    let config_file = create_test_file(
        r#"{"boolean_tokens": {"truthy": ["x"], "falsy": ["x"]}}"#,
    );
    assert!(matches!(
        CatalogConfig::from_file(config_file.path()),
        Err(TabdefError::Config(_))
    ));
}

#[test]
fn test_german_tokens_builder() {
    let file = create_test_file("Einverstanden\nJa\nNein\n");
    let config = TabdefConfig::default()
        .with_catalog(CatalogConfig::default().with_boolean_tokens(BooleanTokens::german()));
    let result = TableDefiner::with_config(config)
        .unwrap()
        .define(file.path())
        .unwrap();
    assert_eq!(
        result.document.get_column("einverstanden").unwrap().data_type,
        "boolean"
    );
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_header_only_file() {
    let file = create_test_file("a,b,c\n");
    assert!(matches!(
        TableDefiner::new().define(file.path()),
        Err(TabdefError::EmptyData(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        TableDefiner::new().define("/nonexistent/protests.csv"),
        Err(TabdefError::Io { .. })
    ));
}

// =============================================================================
// Upload Tests
// =============================================================================

#[test]
fn test_define_then_upload() {
    let file = protest_data();
    let result = TableDefiner::new().define(file.path()).unwrap();

    let api = MockTableApi::new("protests");
    let report = Uploader::with_config(&api, UploadConfig::default())
        .upload(&result.document, &result.data)
        .unwrap();

    assert_eq!(report.inserted, 3);
    assert_eq!(api.created(), Some(result.document.clone()));

    let rows = api.rows();
    let keys: Vec<&str> = rows[0].1.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["ort", "teilnehmer", "anteil", "quote", "genehmigt", "flaeche", "bemerkung"]
    );
    assert_eq!(rows[2].1["teilnehmer"], None);
    assert_eq!(rows[2].1["ort"], Some("Leipzig".to_string()));
    assert_eq!(rows[1].1["genehmigt"], Some("false".to_string()));
}
