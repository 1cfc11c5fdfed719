use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Search direction for resolving an event date onto the trading calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlignDirection {
    /// Greatest trading date <= the event date.
    #[default]
    Backward,
    /// Least trading date >= the event date.
    Forward,
}

/// A labeled batch of free-text event dates, one date per line. The label
/// is opaque to the core (the UI uses calendar years) and only organizes
/// output and error reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGroup {
    pub label: String,
    pub dates: String,
}

/// An event date resolved against the trading calendar. Only produced when
/// resolution succeeds; events with no qualifying trading date are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedEvent {
    pub event_date: NaiveDate,
    pub trading_date: NaiveDate,
    pub position: usize,
}
