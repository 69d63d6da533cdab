//! Configuration for loading sources and building views.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::error::util::safe_read_to_string;

/// Default GeoJSON property holding the department name
pub const DEFAULT_BOUNDARY_NAME_PROPERTY: &str = "NOMBRE_DPT";

/// A tabular source exported as Parquet
///
/// Spreadsheet sheets are exported one file per sheet, so a source is either a
/// single Parquet file or a directory holding `<sheet>.parquet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<&str>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.map(str::to_string),
        }
    }
}

/// A GeoJSON feature collection of department boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySource {
    pub path: PathBuf,
    /// Feature property holding the department name
    #[serde(default = "default_name_property")]
    pub name_property: String,
}

fn default_name_property() -> String {
    DEFAULT_BOUNDARY_NAME_PROPERTY.to_string()
}

/// What to do with ages that cannot be placed in a 5-year band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgePolicy {
    /// Fail the pipeline with a `DerivationError`
    #[default]
    Reject,
    /// Count the record in the unknown band
    Bucket,
}

/// Options controlling how the views are built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Value of `MANERA_MUERTE` that marks a homicide
    pub homicide_label: String,
    /// Number of municipalities in the homicide ranking
    pub top_homicides: usize,
    /// Number of municipalities in the lowest-deaths ranking
    pub least_deaths: usize,
    /// Number of causes in the cause ranking
    pub top_causes: usize,
    pub age_policy: AgePolicy,
    /// Zero-pad municipality codes on both sides of the lookup join
    pub municipality_code_width: Option<usize>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            homicide_label: "Homicidio".to_string(),
            top_homicides: 5,
            least_deaths: 10,
            top_causes: 10,
            age_policy: AgePolicy::Reject,
            municipality_code_width: None,
        }
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub records: TableSource,
    pub lookup: TableSource,
    pub boundaries: BoundarySource,
    #[serde(default)]
    pub views: ViewOptions,
    /// Directory the views are exported to as Parquet, if any
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            records: TableSource::new("datos_mortalidad", Some("No_Fetales_2019")),
            lookup: TableSource::new("divipola", Some("Hoja1")),
            boundaries: BoundarySource {
                path: PathBuf::from("colombia_departamentos.geojson"),
                name_property: default_name_property(),
            },
            views: ViewOptions::default(),
            output_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let content = safe_read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.with_base_dir(base_dir))
    }

    /// Resolve every relative path against `base_dir`
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        resolve(&mut self.records.path);
        resolve(&mut self.lookup.path);
        resolve(&mut self.boundaries.path);
        if let Some(dir) = self.output_dir.as_mut() {
            resolve(dir);
        }
        self
    }
}
