//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use serde::Deserialize;

/// Optional calendar day (`?date=YYYY-MM-DD`); handlers default it to today.
#[derive(Debug, Deserialize)]
pub struct DayParams {
    pub date: Option<NaiveDate>,
}

impl DayParams {
    pub fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(custodia_core::types::today)
    }
}
