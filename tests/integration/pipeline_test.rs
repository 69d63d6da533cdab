use mortality_views::error::DerivationError;
use mortality_views::pipeline::{AgeBandTotal, CauseTotal};
use mortality_views::schema::columns;
use mortality_views::transform::{AGE_BANDS, UNKNOWN_AGE_BAND};
use mortality_views::utils::test::{BoundaryRow, LookupRow, RecordRow, record, source_tables};
use mortality_views::{AgePolicy, MortalityViews, PipelineError, ViewOptions, run_pipeline};

use crate::utils::{column_values, print_view_sizes};

fn lookup_rows() -> Vec<LookupRow> {
    vec![
        LookupRow::new("001", "Pereira", "D1", "Risaralda"),
        LookupRow::new("002", "Dosquebradas", "D1", "Risaralda"),
        LookupRow::new("003", "Quibdó", "D2", "Chocó"),
    ]
}

fn boundary_rows() -> Vec<BoundaryRow> {
    vec![
        BoundaryRow::new("RISARALDA", Some(r#"{"type":"Polygon","coordinates":[]}"#)),
        BoundaryRow::new("CHOCÓ", None),
    ]
}

fn build(records: &[RecordRow], options: &ViewOptions) -> mortality_views::Result<MortalityViews> {
    let sources = source_tables(records, &lookup_rows(), &boundary_rows())?;
    run_pipeline(&sources, options)
}

fn build_default(records: &[RecordRow]) -> MortalityViews {
    build(records, &ViewOptions::default()).expect("pipeline should succeed")
}

#[test]
fn test_end_to_end_two_records() {
    let views = build_default(&[
        record("001", 2019, 3, "Homicidio", 1, "30"),
        record("001", 2019, 3, "Natural", 2, "70"),
    ]);
    print_view_sizes(&views);

    let municipalities = views.municipality_totals().unwrap();
    assert_eq!(municipalities.len(), 1);
    assert_eq!(municipalities[0].code.as_deref(), Some("001"));
    assert_eq!(municipalities[0].municipality.as_deref(), Some("Pereira"));
    assert_eq!(municipalities[0].department.as_deref(), Some("Risaralda"));
    assert_eq!(municipalities[0].total, 2);

    let causes = views.cause_ranking().unwrap();
    assert_eq!(
        causes,
        vec![
            CauseTotal {
                cause: Some("Homicidio".to_string()),
                total: 1
            },
            CauseTotal {
                cause: Some("Natural".to_string()),
                total: 1
            },
        ]
    );

    let by_sex = views.department_sex_totals().unwrap();
    assert_eq!(by_sex.len(), 1);
    assert_eq!(by_sex[0].department_code.as_deref(), Some("D1"));
    assert_eq!(by_sex[0].male, 1);
    assert_eq!(by_sex[0].female, 1);
    assert_eq!(by_sex[0].undetermined, 0);
}

#[test]
fn test_municipality_totals_sum_to_record_count() {
    let records = vec![
        record("001", 2019, 1, "Natural", 1, "30"),
        record("002", 2019, 2, "Natural", 2, "45"),
        record("002", 2019, 2, "Homicidio", 1, "22"),
        record("003", 2019, 5, "Accidente de tránsito", 1, "19"),
        record("999", 2019, 7, "Natural", 2, "88"),
    ];
    let views = build_default(&records);

    let total: i64 = views
        .municipality_totals()
        .unwrap()
        .iter()
        .map(|row| row.total)
        .sum();
    assert_eq!(total, records.len() as i64);

    let department_total: i64 = views
        .department_totals()
        .unwrap()
        .iter()
        .map(|row| row.total)
        .sum();
    assert_eq!(department_total, records.len() as i64);
}

#[test]
fn test_missing_lookup_row_keeps_count_with_null_names() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "30"),
        record("777", 2019, 1, "Natural", 1, "31"),
        record("777", 2019, 2, "Natural", 2, "32"),
    ]);

    let rows = views.municipality_totals().unwrap();
    let unmatched = rows
        .iter()
        .find(|row| row.code.as_deref() == Some("777"))
        .unwrap();
    assert_eq!(unmatched.total, 2);
    assert_eq!(unmatched.municipality, None);
    assert_eq!(unmatched.department_code, None);
    assert_eq!(unmatched.department, None);
}

#[test]
fn test_department_view_carries_geometry() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "30"),
        record("003", 2019, 1, "Natural", 1, "30"),
    ]);

    let rows = views.department_totals().unwrap();
    assert_eq!(rows.len(), 2);

    let risaralda = rows
        .iter()
        .find(|row| row.department.as_deref() == Some("risaralda"))
        .unwrap();
    assert!(risaralda.geometry.as_deref().unwrap().contains("Polygon"));

    // Chocó matches its boundary, which has no geometry
    let choco = rows
        .iter()
        .find(|row| row.department.as_deref() == Some("chocó"))
        .unwrap();
    assert_eq!(choco.total, 1);
    assert_eq!(choco.geometry, None);
}

#[test]
fn test_monthly_view_is_chronological() {
    let views = build_default(&[
        record("001", 2019, 11, "Natural", 1, "30"),
        record("001", 2019, 2, "Natural", 1, "30"),
        record("002", 2019, 11, "Natural", 2, "30"),
        record("003", 2019, 7, "Natural", 1, "30"),
    ]);

    let month = &views.deaths_by_month;
    assert_eq!(
        column_values(month, columns::DATE),
        vec![
            Some("2019-02-01".to_string()),
            Some("2019-07-01".to_string()),
            Some("2019-11-01".to_string()),
        ]
    );
    assert_eq!(
        column_values(month, columns::MONTHLY_DEATHS),
        vec![
            Some("1".to_string()),
            Some("1".to_string()),
            Some("2".to_string()),
        ]
    );
}

#[test]
fn test_invalid_month_fails_the_run() {
    let err = build(
        &[record("001", 2019, 13, "Natural", 1, "30")],
        &ViewOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Derivation(_)));
}

#[test]
fn test_top_five_of_three_returns_three() {
    let views = build_default(&[
        record("001", 2019, 1, "Homicidio", 1, "30"),
        record("002", 2019, 1, "Homicidio", 1, "30"),
        record("002", 2019, 2, "Homicidio", 1, "30"),
        record("003", 2019, 1, "Homicidio", 2, "30"),
        record("003", 2019, 1, "Natural", 2, "30"),
    ]);

    let ranking = views.homicide_ranking().unwrap();
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0].code.as_deref(), Some("002"));
    assert_eq!(ranking[0].total, 2);
    assert_eq!(ranking[0].municipality.as_deref(), Some("Dosquebradas"));
    assert!(ranking.iter().all(|row| row.total >= 1));
}

#[test]
fn test_least_deaths_is_ascending() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "30"),
        record("001", 2019, 1, "Natural", 1, "30"),
        record("002", 2019, 1, "Natural", 1, "30"),
        record("003", 2019, 1, "Natural", 1, "30"),
        record("003", 2019, 1, "Natural", 1, "30"),
        record("003", 2019, 1, "Natural", 1, "30"),
    ]);

    let totals: Vec<i64> = views
        .least_deaths()
        .unwrap()
        .iter()
        .map(|row| row.total)
        .collect();
    assert_eq!(totals, vec![1, 2, 3]);
}

#[test]
fn test_age_band_boundaries() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "0"),
        record("001", 2019, 1, "Natural", 1, "4"),
        record("001", 2019, 1, "Natural", 1, "5"),
        record("001", 2019, 1, "Natural", 1, "100"),
    ]);

    let histogram = views.age_histogram().unwrap();
    let bands: Vec<&str> = histogram.iter().map(|row| row.band.as_str()).collect();
    assert_eq!(bands, AGE_BANDS.to_vec());
    assert_eq!(histogram[0].total, 2);
    assert_eq!(histogram[1].total, 1);
    assert_eq!(histogram[AGE_BANDS.len() - 1].total, 1);
    assert!(histogram[2..AGE_BANDS.len() - 1].iter().all(|row| row.total == 0));
}

#[test]
fn test_out_of_range_ages_rejected() {
    for age in ["-1", "101"] {
        let err = build(
            &[record("001", 2019, 1, "Natural", 1, age)],
            &ViewOptions::default(),
        )
        .unwrap_err();
        let PipelineError::Derivation(DerivationError::InRow { row, source }) = &err else {
            panic!("expected a row-level derivation error for age {age}, got {err:?}");
        };
        assert_eq!(*row, 0);
        assert!(matches!(**source, DerivationError::AgeOutOfRange { .. }));
    }
}

#[test]
fn test_bucket_policy_counts_unknown_ages() {
    let options = ViewOptions {
        age_policy: AgePolicy::Bucket,
        ..ViewOptions::default()
    };
    let views = build(
        &[
            record("001", 2019, 1, "Natural", 1, "30"),
            record("001", 2019, 1, "Natural", 1, "101"),
            record("001", 2019, 1, "Natural", 1, "sin dato"),
        ],
        &options,
    )
    .unwrap();

    let histogram = views.age_histogram().unwrap();
    assert_eq!(histogram.len(), AGE_BANDS.len() + 1);
    assert_eq!(
        histogram.last(),
        Some(&AgeBandTotal {
            band: UNKNOWN_AGE_BAND.to_string(),
            total: 2
        })
    );
}

#[test]
fn test_department_without_female_records_has_zero() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "30"),
        record("002", 2019, 1, "Natural", 1, "30"),
        record("003", 2019, 1, "Natural", 2, "30"),
        record("003", 2019, 1, "Natural", 3, "30"),
    ]);

    let rows = views.department_sex_totals().unwrap();
    let d1 = rows
        .iter()
        .find(|row| row.department_code.as_deref() == Some("D1"))
        .unwrap();
    assert_eq!((d1.male, d1.female, d1.undetermined), (2, 0, 0));

    let d2 = rows
        .iter()
        .find(|row| row.department_code.as_deref() == Some("D2"))
        .unwrap();
    assert_eq!((d2.male, d2.female, d2.undetermined), (0, 1, 1));
}

#[test]
fn test_homicide_label_is_configurable() {
    let options = ViewOptions {
        homicide_label: "Violenta".to_string(),
        ..ViewOptions::default()
    };
    let views = build(
        &[
            record("001", 2019, 1, "Violenta", 1, "30"),
            record("002", 2019, 1, "Homicidio", 1, "30"),
        ],
        &options,
    )
    .unwrap();

    let ranking = views.homicide_ranking().unwrap();
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].code.as_deref(), Some("001"));
}

#[test]
fn test_null_municipality_code_is_counted_and_readable() {
    let records = vec![
        record("001", 2019, 1, "Homicidio", 1, "30"),
        record("001", 2019, 2, "Homicidio", 2, "40").without_code(),
        record("002", 2019, 3, "Natural", 1, "50"),
    ];
    let views = build_default(&records);

    let municipalities = views.municipality_totals().unwrap();
    assert_eq!(municipalities.len(), 3);
    assert_eq!(
        municipalities.iter().map(|row| row.total).sum::<i64>(),
        records.len() as i64
    );
    let missing = municipalities.iter().find(|row| row.code.is_none()).unwrap();
    assert_eq!(missing.total, 1);
    assert_eq!(missing.municipality, None);

    let ranking = views.homicide_ranking().unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].code.as_deref(), Some("001"));
    assert_eq!(ranking[1].code, None);

    assert_eq!(views.least_deaths().unwrap().len(), 3);

    let departments = views.department_totals().unwrap();
    assert_eq!(departments.iter().map(|row| row.total).sum::<i64>(), 3);
    assert!(departments.iter().any(|row| row.department.is_none() && row.total == 1));

    let by_sex = views.department_sex_totals().unwrap();
    let unknown = by_sex.iter().find(|row| row.department_code.is_none()).unwrap();
    assert_eq!((unknown.male, unknown.female), (0, 1));
}

#[test]
fn test_null_cause_is_its_own_group() {
    let views = build_default(&[
        record("001", 2019, 1, "Natural", 1, "30"),
        record("001", 2019, 1, "Natural", 1, "30").without_cause(),
    ]);

    let causes = views.cause_ranking().unwrap();
    assert_eq!(causes.len(), 2);
    assert_eq!(causes[1].cause, None);
    assert_eq!(causes[1].total, 1);
    assert!(views.homicide_ranking().unwrap().is_empty());
}

#[test]
fn test_null_sex_code_fails_the_run() {
    let err = build(
        &[
            record("001", 2019, 1, "Natural", 1, "30"),
            record("001", 2019, 1, "Natural", 1, "30").without_sex(),
        ],
        &ViewOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownCode(ref e) if e.code == "null"));
}

#[test]
fn test_null_age_follows_age_policy() {
    let records = [
        record("001", 2019, 1, "Natural", 1, "30"),
        record("001", 2019, 1, "Natural", 1, "30").without_age(),
    ];

    let err = build(&records, &ViewOptions::default()).unwrap_err();
    let PipelineError::Derivation(DerivationError::InRow { row, source }) = &err else {
        panic!("expected a row-level derivation error, got {err:?}");
    };
    assert_eq!(*row, 1);
    assert!(matches!(**source, DerivationError::MissingValue { .. }));

    let options = ViewOptions {
        age_policy: AgePolicy::Bucket,
        ..ViewOptions::default()
    };
    let histogram = build(&records, &options).unwrap().age_histogram().unwrap();
    assert_eq!(histogram.last().map(|row| row.total), Some(1));
    assert_eq!(histogram.last().map(|row| row.band.as_str()), Some(UNKNOWN_AGE_BAND));
}
