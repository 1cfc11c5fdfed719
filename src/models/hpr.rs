use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which side of the event a return window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pre,
    Post,
}

impl Phase {
    /// Wire tag. Also the table sort key, so `post` rows order before
    /// `pre` rows for the same event, matching the original output order.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

/// One computed holding-period return. `start_date`/`end_date` are the
/// calendar dates at the window endpoints, kept for provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HprRecord {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub trading_date: NaiveDate,
    pub phase: Phase,
    pub horizon_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hpr: f64,
}

/// Flat record collection, canonically ordered by
/// (event_date, phase tag, horizon_days).
#[derive(Debug, Clone, Serialize, Default)]
pub struct HprTable {
    pub records: Vec<HprRecord>,
}

/// Event x horizon reshape of one phase of an HprTable. Rows are keyed by
/// the aligned trading date, ascending; columns follow the caller-supplied
/// horizon order. A `None` cell marks a window that fell outside the
/// series range — zero is a real return and never stands in for missing.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayMatrix {
    pub phase: Phase,
    pub horizons: Vec<u32>,
    pub rows: Vec<OverlayRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayRow {
    pub trading_date: NaiveDate,
    pub cells: Vec<Option<f64>>,
}
