//! Table transformations: normalization, joins, derivations, aggregation and selection.
//!
//! Every function takes record batches with named columns and returns a new
//! batch; nothing is modified in place.

pub mod aggregate;
pub mod derive;
pub mod join;
pub mod normalize;
pub mod select;

pub use aggregate::{complete_categories, group_count, pivot_counts, sort_by_column, total_count};
pub use derive::{
    AGE_BANDS, UNKNOWN_AGE_BAND, age_band, age_band_for, derive_age_band_column, derive_month_column,
    derive_sex_label_column, month_start, parse_age, sex_label, sex_labels,
};
pub use join::{JoinKey, dedup_on_key, left_join};
pub use normalize::{normalize_column, normalize_key, normalize_key_column, pad_code, pad_code_column};
pub use select::{bottom_n, filter_equals, top_n};
