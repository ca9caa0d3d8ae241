/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (assignment day, decommission day) carry no time zone.
pub type Date = chrono::NaiveDate;

/// Today's calendar date in the server's local time zone.
///
/// Folio numbering is scoped by the local calendar day, not the UTC day.
pub fn today() -> Date {
    chrono::Local::now().date_naive()
}
