//! Source table loading
//!
//! The death records and the DIVIPOLA lookup arrive as Parquet exports of
//! spreadsheet sheets; the department boundaries arrive as GeoJSON. Each loader
//! returns a single record batch conformed to the table's schema.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use crate::config::{BoundarySource, PipelineConfig, TableSource};
use crate::error::LoadError;
use crate::error::util::{safe_open_file, safe_read_to_string};
use crate::schema::{boundary_schema, conform_batch, lookup_schema, records_schema};
use crate::utils::logging::{log_load_complete, log_load_start, log_warning};

/// The three loaded source tables
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub records: RecordBatch,
    pub lookup: RecordBatch,
    pub boundaries: RecordBatch,
}

/// Resolve a table source to the Parquet file holding its sheet
pub fn resolve_source(source: &TableSource) -> Result<PathBuf, LoadError> {
    let path = &source.path;
    if !path.exists() {
        return Err(LoadError::NotFound { path: path.clone() });
    }

    if path.is_dir() {
        let Some(sheet) = source.sheet.as_deref() else {
            return Err(LoadError::MissingSheet {
                path: path.clone(),
                sheet: String::new(),
            });
        };
        let file = path.join(format!("{sheet}.parquet"));
        if !file.is_file() {
            return Err(LoadError::MissingSheet {
                path: path.clone(),
                sheet: sheet.to_string(),
            });
        }
        return Ok(file);
    }

    match source.sheet.as_deref() {
        Some(sheet) if path.file_stem().is_none_or(|stem| stem != sheet) => {
            Err(LoadError::MissingSheet {
                path: path.clone(),
                sheet: sheet.to_string(),
            })
        }
        _ => Ok(path.clone()),
    }
}

/// Read a parquet file into Arrow record batches
///
/// When `schema` is given only the columns it names are decoded; columns it
/// names that the file lacks are left for schema conformance to report.
pub fn read_parquet(path: &Path, schema: Option<&Schema>) -> Result<Vec<RecordBatch>, LoadError> {
    let file = safe_open_file(path)?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|source| {
        LoadError::Parquet {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let builder = if let Some(schema) = schema {
        let file_schema = builder.schema().clone();
        let projection: Vec<usize> = schema
            .fields()
            .iter()
            .filter_map(|f| file_schema.index_of(f.name()).ok())
            .collect();
        let mask = ProjectionMask::roots(builder.parquet_schema(), projection);
        builder.with_projection(mask)
    } else {
        builder
    };

    let reader = builder.build().map_err(|source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    })?;

    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Load one tabular source and conform it to `schema`
pub fn load_table(
    source: &TableSource,
    schema: &Schema,
    table: &str,
) -> Result<RecordBatch, LoadError> {
    let path = resolve_source(source)?;
    log_load_start(table, &path);
    let start = Instant::now();

    let batches = read_parquet(&path, Some(schema))?;
    let batch = combine_batches(&batches, schema, table)?;

    log_load_complete(table, &path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Concatenate batches read from one file and conform them to `schema`
pub fn combine_batches(
    batches: &[RecordBatch],
    schema: &Schema,
    table: &str,
) -> Result<RecordBatch, LoadError> {
    let Some(first) = batches.first() else {
        return Ok(RecordBatch::new_empty(Arc::new(schema.clone())));
    };

    let combined = concat_batches(&first.schema(), batches).map_err(|e| {
        LoadError::IncompatibleColumn {
            table: table.to_string(),
            column: "*".to_string(),
            expected: "one schema across row groups".to_string(),
            reason: e.to_string(),
        }
    })?;
    conform_batch(&combined, schema, table)
}

/// Load the death records table
pub fn load_records(source: &TableSource) -> Result<RecordBatch, LoadError> {
    load_table(source, &records_schema(), "records")
}

/// Load the DIVIPOLA lookup table
pub fn load_lookup(source: &TableSource) -> Result<RecordBatch, LoadError> {
    load_table(source, &lookup_schema(), "lookup")
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    geometry: Option<serde_json::Value>,
}

/// Load the department boundaries from a GeoJSON feature collection
pub fn load_boundaries(source: &BoundarySource) -> Result<RecordBatch, LoadError> {
    log_load_start("boundaries", &source.path);
    let start = Instant::now();

    let text = safe_read_to_string(&source.path)?;
    let batch = boundaries_from_geojson(&text, &source.name_property).map_err(|e| match e {
        BoundaryParseError::Json(source_err) => LoadError::Json {
            path: source.path.clone(),
            source: source_err,
        },
        BoundaryParseError::Load(err) => err,
    })?;

    log_load_complete("boundaries", &source.path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Failure while turning GeoJSON text into the boundaries table
#[derive(Debug)]
pub enum BoundaryParseError {
    Json(serde_json::Error),
    Load(LoadError),
}

/// Build the boundaries table from GeoJSON text
///
/// Each feature must carry `name_property` as a string. The geometry is kept as
/// its JSON text.
pub fn boundaries_from_geojson(
    text: &str,
    name_property: &str,
) -> Result<RecordBatch, BoundaryParseError> {
    let collection: FeatureCollection =
        serde_json::from_str(text).map_err(BoundaryParseError::Json)?;

    let mut names = Vec::with_capacity(collection.features.len());
    let mut geometries = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(name_property))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                BoundaryParseError::Load(LoadError::MissingColumn {
                    table: "boundaries".to_string(),
                    column: name_property.to_string(),
                })
            })?;
        names.push(name.to_string());
        geometries.push(
            feature
                .geometry
                .as_ref()
                .filter(|g| !g.is_null())
                .map(serde_json::Value::to_string),
        );
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names)),
        Arc::new(StringArray::from(geometries)),
    ];
    RecordBatch::try_new(boundary_schema(), columns).map_err(|e| {
        BoundaryParseError::Load(LoadError::IncompatibleColumn {
            table: "boundaries".to_string(),
            column: "*".to_string(),
            expected: "boundary schema".to_string(),
            reason: e.to_string(),
        })
    })
}

/// Load all three sources named by `config`
pub fn load_sources(config: &PipelineConfig) -> Result<SourceTables, LoadError> {
    let records = load_records(&config.records)?;
    let lookup = load_lookup(&config.lookup)?;
    let boundaries = load_boundaries(&config.boundaries)?;

    if records.num_rows() == 0 {
        log_warning("Records table is empty", Some(&config.records.path));
    }

    Ok(SourceTables {
        records,
        lookup,
        boundaries,
    })
}
