//! Typed rows of the aggregate views.
//!
//! The views are Arrow record batches; consumers that prefer plain structs can
//! read them through these row types, deserialized with `serde_arrow`.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::MortalityViews;

/// Deserialize every row of a view
pub fn rows<T: DeserializeOwned>(view: &RecordBatch) -> Result<Vec<T>> {
    Ok(serde_arrow::from_record_batch::<Vec<T>>(view)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalityTotal {
    /// Null for records without a municipality code
    #[serde(rename = "COD_MUNICIPIO")]
    pub code: Option<String>,
    #[serde(rename = "TOTAL_MUERTES")]
    pub total: i64,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: Option<String>,
    #[serde(rename = "COD_DEPARTAMENTO")]
    pub department_code: Option<String>,
    #[serde(rename = "DEPARTAMENTO")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTotal {
    /// Normalized department name
    #[serde(rename = "DEPARTAMENTO")]
    pub department: Option<String>,
    #[serde(rename = "TOTAL_MUERTES")]
    pub total: i64,
    /// GeoJSON geometry of the department, if a boundary matched
    pub geometry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    #[serde(rename = "FECHA")]
    pub month: NaiveDate,
    #[serde(rename = "TOTAL_MUERTES_MENSUALES")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomicideTotal {
    /// Null for records without a municipality code
    #[serde(rename = "COD_MUNICIPIO")]
    pub code: Option<String>,
    #[serde(rename = "TOTAL_HOMICIDIOS")]
    pub total: i64,
    #[serde(rename = "MUNICIPIO")]
    pub municipality: Option<String>,
    #[serde(rename = "DEPARTAMENTO")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseTotal {
    #[serde(rename = "MANERA_MUERTE")]
    pub cause: Option<String>,
    #[serde(rename = "TOTAL_MUERTES")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBandTotal {
    #[serde(rename = "EDAD_RANGO")]
    pub band: String,
    #[serde(rename = "TOTAL_MUERTES")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSexTotals {
    #[serde(rename = "COD_DEPARTAMENTO")]
    pub department_code: Option<String>,
    #[serde(rename = "DEPARTAMENTO")]
    pub department: Option<String>,
    #[serde(rename = "Masculino")]
    pub male: i64,
    #[serde(rename = "Femenino")]
    pub female: i64,
    #[serde(rename = "Indeterminado")]
    pub undetermined: i64,
}

impl MortalityViews {
    pub fn municipality_totals(&self) -> Result<Vec<MunicipalityTotal>> {
        rows(&self.deaths_by_municipality)
    }

    pub fn department_totals(&self) -> Result<Vec<DepartmentTotal>> {
        rows(&self.deaths_by_department)
    }

    pub fn monthly_totals(&self) -> Result<Vec<MonthlyTotal>> {
        rows(&self.deaths_by_month)
    }

    pub fn homicide_ranking(&self) -> Result<Vec<HomicideTotal>> {
        rows(&self.top_homicide_municipalities)
    }

    pub fn least_deaths(&self) -> Result<Vec<MunicipalityTotal>> {
        rows(&self.least_deaths_municipalities)
    }

    pub fn cause_ranking(&self) -> Result<Vec<CauseTotal>> {
        rows(&self.top_causes)
    }

    pub fn age_histogram(&self) -> Result<Vec<AgeBandTotal>> {
        rows(&self.deaths_by_age_band)
    }

    pub fn department_sex_totals(&self) -> Result<Vec<DepartmentSexTotals>> {
        rows(&self.deaths_by_department_sex)
    }
}
