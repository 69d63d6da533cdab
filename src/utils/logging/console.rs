//! Console output utilities
//!
//! This module provides utilities for formatted console output of the views.

use std::time::Duration;

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::pipeline::MortalityViews;

/// Print one line per view with its row count
pub fn print_views_summary(views: &MortalityViews, elapsed: Duration) {
    println!("Built {} views in {elapsed:?}", MortalityViews::NAMES.len());
    for (name, view) in views.iter() {
        println!("  - {name}: {} rows", view.num_rows());
    }
}

/// Print a view as a text table
///
/// Only the first `max_rows` rows are shown.
pub fn print_view(name: &str, view: &RecordBatch, max_rows: usize) {
    println!("{name}:");
    let shown = view.slice(0, max_rows.min(view.num_rows()));
    match pretty_format_batches(&[shown]) {
        Ok(table) => println!("{table}"),
        Err(e) => println!("  <unprintable: {e}>"),
    }
    if view.num_rows() > max_rows {
        println!("  ... {} more rows", view.num_rows() - max_rows);
    }
}
