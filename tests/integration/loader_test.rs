use std::fs;

use mortality_views::config::{BoundarySource, PipelineConfig, TableSource};
use mortality_views::loader::{load_boundaries, load_lookup, load_records, load_sources};
use mortality_views::schema::columns;
use mortality_views::utils::arrow::without_columns;
use mortality_views::utils::io::{write_batch, write_views};
use mortality_views::utils::test::{LookupRow, lookup_batch, record, records_batch};
use mortality_views::{LoadError, MortalityViews, ViewOptions, run_pipeline};

use crate::utils::{cleanup, column_values, scratch_dir};

const GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": { "NOMBRE_DPT": "RISARALDA" },
            "geometry": { "type": "Point", "coordinates": [-75.7, 4.8] }
        }
    ]
}"#;

#[test]
fn test_records_sheet_round_trip() {
    let dir = scratch_dir("records-round-trip");
    let batch = records_batch(&[
        record("001", 2019, 3, "Homicidio", 1, "30"),
        record("001", 2019, 4, "Natural", 2, "70"),
    ])
    .unwrap();
    write_batch(&dir.join("No_Fetales_2019.parquet"), &batch).unwrap();

    let loaded = load_records(&TableSource::new(&dir, Some("No_Fetales_2019"))).unwrap();
    assert_eq!(loaded.schema(), batch.schema());
    assert_eq!(loaded.num_rows(), 2);
    assert_eq!(
        column_values(&loaded, columns::CAUSE),
        vec![Some("Homicidio".to_string()), Some("Natural".to_string())]
    );

    cleanup(&dir);
}

#[test]
fn test_missing_sheet_is_reported() {
    let dir = scratch_dir("missing-sheet");
    let batch = lookup_batch(&[LookupRow::new("001", "Pereira", "D1", "Risaralda")]).unwrap();
    write_batch(&dir.join("Hoja1.parquet"), &batch).unwrap();

    let err = load_lookup(&TableSource::new(&dir, Some("Hoja2"))).unwrap_err();
    assert!(matches!(err, LoadError::MissingSheet { ref sheet, .. } if sheet == "Hoja2"));

    // A single file only holds the sheet named by its stem
    let err = load_lookup(&TableSource::new(dir.join("Hoja1.parquet"), Some("Hoja2"))).unwrap_err();
    assert!(matches!(err, LoadError::MissingSheet { .. }));

    cleanup(&dir);
}

#[test]
fn test_missing_column_is_reported() {
    let dir = scratch_dir("missing-column");
    let batch = lookup_batch(&[LookupRow::new("001", "Pereira", "D1", "Risaralda")]).unwrap();
    let batch = without_columns(&batch, &[columns::DEPARTMENT]).unwrap();
    write_batch(&dir.join("Hoja1.parquet"), &batch).unwrap();

    let err = load_lookup(&TableSource::new(&dir, Some("Hoja1"))).unwrap_err();
    assert!(
        matches!(err, LoadError::MissingColumn { ref column, .. } if column == columns::DEPARTMENT)
    );

    cleanup(&dir);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = scratch_dir("missing-file");
    let err = load_records(&TableSource::new(dir.join("nope.parquet"), None)).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));

    let err = load_boundaries(&BoundarySource {
        path: dir.join("nope.geojson"),
        name_property: "NOMBRE_DPT".to_string(),
    })
    .unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. } | LoadError::Io { .. }));

    cleanup(&dir);
}

#[test]
fn test_load_sources_from_config_file() {
    let dir = scratch_dir("config-file");
    fs::create_dir_all(dir.join("datos")).unwrap();
    write_batch(
        &dir.join("datos").join("No_Fetales_2019.parquet"),
        &records_batch(&[record("001", 2019, 3, "Natural", 1, "30")]).unwrap(),
    )
    .unwrap();
    write_batch(
        &dir.join("divipola.parquet"),
        &lookup_batch(&[LookupRow::new("001", "Pereira", "D1", "Risaralda")]).unwrap(),
    )
    .unwrap();
    fs::write(dir.join("deptos.geojson"), GEOJSON).unwrap();
    fs::write(
        dir.join("config.json"),
        r#"{
            "records": { "path": "datos", "sheet": "No_Fetales_2019" },
            "lookup": { "path": "divipola.parquet" },
            "boundaries": { "path": "deptos.geojson" },
            "output_dir": "out"
        }"#,
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(&dir.join("config.json")).unwrap();
    let sources = load_sources(&config).unwrap();
    assert_eq!(sources.records.num_rows(), 1);
    assert_eq!(sources.lookup.num_rows(), 1);
    assert_eq!(sources.boundaries.num_rows(), 1);

    let views = run_pipeline(&sources, &ViewOptions::default()).unwrap();
    let departments = views.department_totals().unwrap();
    assert_eq!(departments[0].department.as_deref(), Some("risaralda"));
    assert!(departments[0].geometry.as_deref().unwrap().contains("Point"));

    let out = config.output_dir.clone().unwrap();
    let written = write_views(&views, &out).unwrap();
    assert_eq!(written.len(), MortalityViews::NAMES.len());
    assert!(written.iter().all(|path| path.is_file()));

    let reloaded = load_records(&TableSource::new(dir.join("datos"), Some("No_Fetales_2019")))
        .unwrap();
    assert_eq!(reloaded.num_rows(), 1);

    cleanup(&dir);
}
