//! The view-building pipeline.
//!
//! [`run_pipeline`] turns the loaded source tables into [`MortalityViews`],
//! the immutable bundle the report layer renders. It either builds every view
//! or fails; there is no partial result.

pub mod views;

use arrow::record_batch::RecordBatch;

use crate::config::{AgePolicy, ViewOptions};
use crate::error::{PipelineError, Result};
use crate::loader::SourceTables;
use crate::schema::columns;
use crate::transform::{
    AGE_BANDS, JoinKey, UNKNOWN_AGE_BAND, bottom_n, complete_categories, dedup_on_key,
    derive_age_band_column, derive_month_column, derive_sex_label_column, filter_equals,
    group_count, left_join, normalize_column, pad_code_column, pivot_counts, sex_labels,
    sort_by_column, top_n, total_count,
};
use crate::utils::arrow::without_columns;
use crate::utils::logging::{log_view_built, log_warning};

pub use views::{
    AgeBandTotal, CauseTotal, DepartmentSexTotals, DepartmentTotal, HomicideTotal, MonthlyTotal,
    MunicipalityTotal,
};

/// The aggregate views built from one registry export
#[derive(Debug, Clone)]
pub struct MortalityViews {
    /// Deaths per municipality with municipality and department names
    pub deaths_by_municipality: RecordBatch,
    /// Deaths per department with the department's boundary geometry
    pub deaths_by_department: RecordBatch,
    /// Deaths per calendar month, in date order
    pub deaths_by_month: RecordBatch,
    /// Municipalities with the most homicides
    pub top_homicide_municipalities: RecordBatch,
    /// Municipalities with the fewest deaths
    pub least_deaths_municipalities: RecordBatch,
    /// Most frequent manners of death
    pub top_causes: RecordBatch,
    /// Deaths per 5-year age band, in band order
    pub deaths_by_age_band: RecordBatch,
    /// Deaths per department with one column per sex
    pub deaths_by_department_sex: RecordBatch,
}

impl MortalityViews {
    /// Names of the views, in the order [`MortalityViews::iter`] yields them
    pub const NAMES: [&'static str; 8] = [
        "deaths_by_municipality",
        "deaths_by_department",
        "deaths_by_month",
        "top_homicide_municipalities",
        "least_deaths_municipalities",
        "top_causes",
        "deaths_by_age_band",
        "deaths_by_department_sex",
    ];

    /// Iterate over `(name, view)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RecordBatch)> {
        Self::NAMES.into_iter().zip([
            &self.deaths_by_municipality,
            &self.deaths_by_department,
            &self.deaths_by_month,
            &self.top_homicide_municipalities,
            &self.least_deaths_municipalities,
            &self.top_causes,
            &self.deaths_by_age_band,
            &self.deaths_by_department_sex,
        ])
    }
}

/// Build every view from the source tables
pub fn run_pipeline(sources: &SourceTables, options: &ViewOptions) -> Result<MortalityViews> {
    let (records, lookup) = align_codes(&sources.records, &sources.lookup, options)?;
    let lookup = unique_lookup(&lookup)?;
    let boundaries = unique_boundaries(&sources.boundaries)?;
    let expected = i64::try_from(records.num_rows())
        .map_err(|_| PipelineError::schema("record count exceeds i64"))?;

    let deaths_by_municipality = municipality_totals(&records, &lookup)?;
    verify_total("deaths_by_municipality", &deaths_by_municipality, columns::TOTAL_DEATHS, expected)?;

    // Records carrying the names of their municipality and department
    let enriched = left_join(&records, &lookup, &[JoinKey::on(columns::MUNICIPALITY_CODE)])?;

    let deaths_by_department = department_totals(&enriched, &boundaries)?;
    verify_total("deaths_by_department", &deaths_by_department, columns::TOTAL_DEATHS, expected)?;

    let deaths_by_month = monthly_totals(&records)?;
    verify_total("deaths_by_month", &deaths_by_month, columns::MONTHLY_DEATHS, expected)?;

    let top_homicide_municipalities = homicide_ranking(&records, &lookup, options)?;

    let least_deaths_municipalities = bottom_n(
        &deaths_by_municipality,
        columns::TOTAL_DEATHS,
        options.least_deaths,
    )?;

    let causes = group_count(&records, &[columns::CAUSE], columns::TOTAL_DEATHS)?;
    verify_total("top_causes", &causes, columns::TOTAL_DEATHS, expected)?;
    let top_causes = top_n(&causes, columns::TOTAL_DEATHS, options.top_causes)?;

    let deaths_by_age_band = age_histogram(&records, options.age_policy)?;
    verify_total("deaths_by_age_band", &deaths_by_age_band, columns::TOTAL_DEATHS, expected)?;

    let deaths_by_department_sex = department_sex_totals(&enriched)?;

    let views = MortalityViews {
        deaths_by_municipality,
        deaths_by_department,
        deaths_by_month,
        top_homicide_municipalities,
        least_deaths_municipalities,
        top_causes,
        deaths_by_age_band,
        deaths_by_department_sex,
    };
    for (name, view) in views.iter() {
        log_view_built(name, view.num_rows());
    }
    Ok(views)
}

/// Pad municipality codes on both sides of the lookup join
fn align_codes(
    records: &RecordBatch,
    lookup: &RecordBatch,
    options: &ViewOptions,
) -> Result<(RecordBatch, RecordBatch)> {
    match options.municipality_code_width {
        Some(width) => Ok((
            pad_code_column(records, columns::MUNICIPALITY_CODE, width)?,
            pad_code_column(lookup, columns::MUNICIPALITY_CODE, width)?,
        )),
        None => Ok((records.clone(), lookup.clone())),
    }
}

fn unique_lookup(lookup: &RecordBatch) -> Result<RecordBatch> {
    let (lookup, dropped) = dedup_on_key(lookup, &[columns::MUNICIPALITY_CODE], false)?;
    if dropped > 0 {
        log_warning(
            &format!("Dropped {dropped} duplicate municipality codes from the lookup table"),
            None,
        );
    }
    Ok(lookup)
}

fn unique_boundaries(boundaries: &RecordBatch) -> Result<RecordBatch> {
    let (boundaries, dropped) = dedup_on_key(boundaries, &[columns::BOUNDARY_NAME], true)?;
    if dropped > 0 {
        log_warning(
            &format!("Dropped {dropped} boundary features with a repeated department name"),
            None,
        );
    }
    Ok(boundaries)
}

fn municipality_totals(records: &RecordBatch, lookup: &RecordBatch) -> Result<RecordBatch> {
    let counts = group_count(records, &[columns::MUNICIPALITY_CODE], columns::TOTAL_DEATHS)?;
    left_join(&counts, lookup, &[JoinKey::on(columns::MUNICIPALITY_CODE)])
}

fn department_totals(enriched: &RecordBatch, boundaries: &RecordBatch) -> Result<RecordBatch> {
    // Department names are grouped in normalized form so spellings from
    // different lookup rows fall into one group
    let normalized = normalize_column(enriched, columns::DEPARTMENT)?;
    let counts = group_count(&normalized, &[columns::DEPARTMENT], columns::TOTAL_DEATHS)?;
    left_join(
        &counts,
        boundaries,
        &[JoinKey::new(columns::DEPARTMENT, columns::BOUNDARY_NAME).normalized()],
    )
}

fn monthly_totals(records: &RecordBatch) -> Result<RecordBatch> {
    let dated = derive_month_column(records, columns::YEAR, columns::MONTH, columns::DATE)?;
    let counts = group_count(&dated, &[columns::DATE], columns::MONTHLY_DEATHS)?;
    sort_by_column(&counts, columns::DATE, true)
}

fn homicide_ranking(
    records: &RecordBatch,
    lookup: &RecordBatch,
    options: &ViewOptions,
) -> Result<RecordBatch> {
    let homicides = filter_equals(records, columns::CAUSE, &options.homicide_label)?;
    let counts = group_count(&homicides, &[columns::MUNICIPALITY_CODE], columns::TOTAL_HOMICIDES)?;
    let names = without_columns(lookup, &[columns::DEPARTMENT_CODE])?;
    let named = left_join(&counts, &names, &[JoinKey::on(columns::MUNICIPALITY_CODE)])?;
    top_n(&named, columns::TOTAL_HOMICIDES, options.top_homicides)
}

fn age_histogram(records: &RecordBatch, policy: AgePolicy) -> Result<RecordBatch> {
    let banded = derive_age_band_column(records, columns::AGE_GROUP, columns::AGE_BAND, policy)?;
    let counts = group_count(&banded, &[columns::AGE_BAND], columns::TOTAL_DEATHS)?;

    let mut bands = AGE_BANDS.to_vec();
    if policy == AgePolicy::Bucket {
        bands.push(UNKNOWN_AGE_BAND);
    }
    complete_categories(&counts, columns::AGE_BAND, &bands, columns::TOTAL_DEATHS)
}

fn department_sex_totals(enriched: &RecordBatch) -> Result<RecordBatch> {
    let labeled = derive_sex_label_column(enriched, columns::SEX, columns::SEX)?;
    let counts = group_count(
        &labeled,
        &[columns::DEPARTMENT_CODE, columns::DEPARTMENT, columns::SEX],
        columns::TOTAL_DEATHS,
    )?;
    pivot_counts(
        &counts,
        &[columns::DEPARTMENT_CODE, columns::DEPARTMENT],
        columns::SEX,
        &sex_labels(),
        columns::TOTAL_DEATHS,
    )
}

fn verify_total(view: &'static str, table: &RecordBatch, count: &str, expected: i64) -> Result<()> {
    let actual = total_count(table, count)?;
    if actual == expected {
        Ok(())
    } else {
        Err(PipelineError::Inconsistent {
            view,
            expected,
            actual,
        })
    }
}
