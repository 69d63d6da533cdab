//! Column contracts for the source tables and the derived views.
//!
//! The registry exports use Spanish column names; they are kept verbatim so
//! the views line up with the labels the reports show.

pub mod conform;

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, SchemaRef};

pub use conform::conform_batch;

/// Column names shared by the source tables and the views
pub mod columns {
    pub const MUNICIPALITY_CODE: &str = "COD_MUNICIPIO";
    pub const YEAR: &str = "AÑO";
    pub const MONTH: &str = "MES";
    pub const CAUSE: &str = "MANERA_MUERTE";
    pub const SEX: &str = "SEXO";
    pub const AGE_GROUP: &str = "GRUPO_EDAD";

    pub const MUNICIPALITY: &str = "MUNICIPIO";
    pub const DEPARTMENT_CODE: &str = "COD_DEPARTAMENTO";
    pub const DEPARTMENT: &str = "DEPARTAMENTO";

    pub const BOUNDARY_NAME: &str = "NOMBRE_DPT";
    pub const GEOMETRY: &str = "geometry";

    pub const DATE: &str = "FECHA";
    pub const AGE_BAND: &str = "EDAD_RANGO";

    pub const TOTAL_DEATHS: &str = "TOTAL_MUERTES";
    pub const MONTHLY_DEATHS: &str = "TOTAL_MUERTES_MENSUALES";
    pub const TOTAL_HOMICIDES: &str = "TOTAL_HOMICIDIOS";
}

/// Schema of the death records table
///
/// One row per non-fetal death.
#[must_use]
pub fn records_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::MUNICIPALITY_CODE, DataType::Utf8, true),
        Field::new(columns::YEAR, DataType::Int32, true),
        Field::new(columns::MONTH, DataType::Int32, true),
        Field::new(columns::CAUSE, DataType::Utf8, true),
        Field::new(columns::SEX, DataType::Int32, true),
        Field::new(columns::AGE_GROUP, DataType::Utf8, true),
    ]))
}

/// Schema of the DIVIPOLA lookup table
#[must_use]
pub fn lookup_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::MUNICIPALITY_CODE, DataType::Utf8, true),
        Field::new(columns::MUNICIPALITY, DataType::Utf8, true),
        Field::new(columns::DEPARTMENT_CODE, DataType::Utf8, true),
        Field::new(columns::DEPARTMENT, DataType::Utf8, true),
    ]))
}

/// Schema of the department boundaries table
#[must_use]
pub fn boundary_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::BOUNDARY_NAME, DataType::Utf8, true),
        Field::new(columns::GEOMETRY, DataType::Utf8, true),
    ]))
}
