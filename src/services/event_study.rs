use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{
    AlignDirection, AlignedEvent, EventGroup, HprRecord, HprTable, OverlayMatrix, OverlayRow,
    Phase, PriceSeries,
};
use crate::services::{alignment, event_dates, series};

/// How one (event, phase, horizon) window evaluated. Only `Computed`
/// produces a table row; the other variants keep the omission paths
/// explicit instead of burying them in conditionals.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Computed(HprRecord),
    OutOfRange,
    InvalidPrice { date: NaiveDate },
}

/// A window that was dropped because an endpoint price was non-positive.
/// Unlike out-of-range windows these are reported, not silent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidPriceIncident {
    pub event_date: NaiveDate,
    pub phase: Phase,
    pub horizon_days: u32,
    pub date: NaiveDate,
}

/// Evaluates a single return window around an aligned event at position
/// `t` for horizon `n`:
///   pre:  [t-n, t-1], defined iff t-n >= 0 and t-1 >= 0
///   post: [t, t+n],   defined iff t+n < series length
/// The pre window at n=1 spans a single observation and yields a zero
/// return; that asymmetry is inherited behavior and kept as-is.
pub fn evaluate_window(
    series: &PriceSeries,
    event: &AlignedEvent,
    phase: Phase,
    horizon: u32,
) -> WindowOutcome {
    let t = event.position as i64;
    let n = horizon as i64;

    let (start, end) = match phase {
        Phase::Pre => (t - n, t - 1),
        Phase::Post => (t, t + n),
    };

    let in_range = match phase {
        Phase::Pre => start >= 0 && end >= 0,
        Phase::Post => end < series.len() as i64,
    };
    if !in_range {
        return WindowOutcome::OutOfRange;
    }

    let (start, end) = (start as usize, end as usize);
    let start_price = series.price_at(start);
    let end_price = series.price_at(end);

    if start_price <= 0.0 {
        return WindowOutcome::InvalidPrice {
            date: series.date_at(start),
        };
    }
    if end_price <= 0.0 {
        return WindowOutcome::InvalidPrice {
            date: series.date_at(end),
        };
    }

    WindowOutcome::Computed(HprRecord {
        ticker: series.ticker.clone(),
        event_date: event.event_date,
        trading_date: event.trading_date,
        phase,
        horizon_days: horizon,
        start_date: series.date_at(start),
        end_date: series.date_at(end),
        hpr: end_price / start_price - 1.0,
    })
}

/// Computes the full HPR table for a set of aligned events. Out-of-range
/// windows are omitted; invalid-price windows are omitted and returned as
/// incidents. Records come back in the canonical
/// (event_date, phase tag, horizon_days) order regardless of input order.
pub fn compute_event_hprs(
    series: &PriceSeries,
    events: &[AlignedEvent],
    horizons: &[u32],
) -> (HprTable, Vec<InvalidPriceIncident>) {
    let mut records = Vec::new();
    let mut invalid = Vec::new();

    for event in events {
        for &horizon in horizons {
            for phase in [Phase::Pre, Phase::Post] {
                match evaluate_window(series, event, phase, horizon) {
                    WindowOutcome::Computed(record) => records.push(record),
                    WindowOutcome::OutOfRange => {}
                    WindowOutcome::InvalidPrice { date } => invalid.push(InvalidPriceIncident {
                        event_date: event.event_date,
                        phase,
                        horizon_days: horizon,
                        date,
                    }),
                }
            }
        }
    }

    records.sort_by(|a, b| {
        a.event_date
            .cmp(&b.event_date)
            .then_with(|| a.phase.as_str().cmp(b.phase.as_str()))
            .then_with(|| a.horizon_days.cmp(&b.horizon_days))
    });

    (HprTable { records }, invalid)
}

/// Reshapes one phase of an HPR table into an event x horizon matrix.
/// Rows are keyed by the aligned trading date (deduplicated, ascending);
/// columns follow the caller-supplied horizon order. Cells with no record
/// stay `None`.
pub fn build_overlay(table: &HprTable, phase: Phase, horizons: &[u32]) -> OverlayMatrix {
    let mut row_dates: Vec<NaiveDate> = table
        .records
        .iter()
        .filter(|r| r.phase == phase)
        .map(|r| r.trading_date)
        .collect();
    row_dates.sort();
    row_dates.dedup();

    let rows = row_dates
        .into_iter()
        .map(|trading_date| {
            let cells = horizons
                .iter()
                .map(|&horizon| {
                    table
                        .records
                        .iter()
                        .find(|r| {
                            r.phase == phase
                                && r.trading_date == trading_date
                                && r.horizon_days == horizon
                        })
                        .map(|r| r.hpr)
                })
                .collect();
            OverlayRow {
                trading_date,
                cells,
            }
        })
        .collect();

    OverlayMatrix {
        phase,
        horizons: horizons.to_vec(),
        rows,
    }
}

fn default_horizons() -> Vec<u32> {
    vec![1, 5, 10, 20]
}

fn default_phase() -> Phase {
    Phase::Post
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventStudyRequest {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub groups: Vec<EventGroup>,
    #[serde(default = "default_horizons")]
    pub horizons: Vec<u32>,
    #[serde(default)]
    pub direction: AlignDirection,
    #[serde(default = "default_phase")]
    pub phase: Phase,
}

#[derive(Debug, Serialize)]
pub struct GroupResult {
    pub label: String,
    pub table: HprTable,
    pub overlay: OverlayMatrix,
    pub invalid_prices: Vec<InvalidPriceIncident>,
}

#[derive(Debug, Serialize)]
pub struct GroupError {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct EventStudyResponse {
    pub ticker: String,
    pub phase: Phase,
    pub horizons: Vec<u32>,
    pub groups: Vec<GroupResult>,
    pub errors: Vec<GroupError>,
}

fn validate(req: &EventStudyRequest) -> Result<(), AppError> {
    if req.ticker.trim().is_empty() {
        return Err(AppError::Validation("ticker is required".to_string()));
    }
    if req.start > req.end {
        return Err(AppError::Validation(
            "start date must not be after end date".to_string(),
        ));
    }
    if req.groups.is_empty() {
        return Err(AppError::Validation(
            "at least one event date group is required".to_string(),
        ));
    }
    if req.horizons.is_empty() {
        return Err(AppError::Validation(
            "at least one horizon is required".to_string(),
        ));
    }
    if req.horizons.iter().any(|&h| h == 0) {
        return Err(AppError::Validation(
            "horizons must be positive trading-day counts".to_string(),
        ));
    }
    Ok(())
}

fn compute_group(
    series: &PriceSeries,
    label: &str,
    text: &str,
    horizons: &[u32],
    direction: AlignDirection,
    phase: Phase,
) -> Result<GroupResult, AppError> {
    let event_dates = event_dates::parse_group(label, text)?;
    let aligned = alignment::align_events(series, &event_dates, direction);

    let (table, invalid_prices) = compute_event_hprs(series, &aligned, horizons);
    for incident in &invalid_prices {
        warn!(
            "Dropped HPR window for {} ({} {}d): non-positive price at {}",
            incident.event_date,
            incident.phase.as_str(),
            incident.horizon_days,
            incident.date,
        );
    }

    // a group whose every window hit a bad price has nothing to report
    // beyond the failure itself
    if table.records.is_empty() && !invalid_prices.is_empty() {
        return Err(AppError::InvalidPrice {
            ticker: series.ticker.clone(),
            date: invalid_prices[0].date,
        });
    }

    let overlay = build_overlay(&table, phase, horizons);

    Ok(GroupResult {
        label: label.to_string(),
        table,
        overlay,
        invalid_prices,
    })
}

/// Full event-study computation for one ticker: fetch the price history,
/// normalize it once, then run every labeled date group against the shared
/// immutable series. Groups are independent, so they are computed
/// concurrently; a parse failure in one group is reported alongside the
/// results of the others.
pub async fn run_event_study(
    provider: &dyn PriceProvider,
    req: EventStudyRequest,
) -> Result<EventStudyResponse, AppError> {
    validate(&req)?;

    let bars = provider
        .fetch_daily_history(&req.ticker, req.start, req.end)
        .await?;
    let series = Arc::new(series::normalize(&req.ticker, bars)?);

    info!(
        "Computing event study for {}: {} observations, {} groups",
        series.ticker,
        series.len(),
        req.groups.len(),
    );

    let tasks = req.groups.iter().map(|group| {
        let series = Arc::clone(&series);
        let label = group.label.clone();
        let text = group.dates.clone();
        let horizons = req.horizons.clone();
        let direction = req.direction;
        let phase = req.phase;
        tokio::task::spawn_blocking(move || {
            let outcome = compute_group(&series, &label, &text, &horizons, direction, phase);
            (label, outcome)
        })
    });

    let mut groups = Vec::new();
    let mut errors = Vec::new();

    for joined in join_all(tasks).await {
        let (label, outcome) =
            joined.map_err(|e| AppError::External(format!("group computation failed: {}", e)))?;
        match outcome {
            Ok(result) => groups.push(result),
            Err(e) => {
                warn!("Event date group '{}' failed: {}", label, e);
                errors.push(GroupError {
                    label,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(EventStudyResponse {
        ticker: series.ticker.clone(),
        phase: req.phase,
        horizons: req.horizons,
        groups,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series_of(prices: &[f64]) -> PriceSeries {
        // contiguous weekdays starting Mon 2024-01-08
        let start = date("2024-01-08");
        PriceSeries {
            ticker: "TEST".to_string(),
            points: prices
                .iter()
                .enumerate()
                .map(|(i, &adj_close)| PricePoint {
                    date: start + chrono::Duration::days(i as i64),
                    adj_close,
                    daily_return: None,
                })
                .collect(),
        }
    }

    fn event_at(series: &PriceSeries, position: usize) -> AlignedEvent {
        AlignedEvent {
            event_date: series.date_at(position),
            trading_date: series.date_at(position),
            position,
        }
    }

    // Reference scenario: prices [100, 101, 99, 103, 107], event at
    // position 2.
    #[test]
    fn test_reference_scenario_horizon_one() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);

        let (table, invalid) = compute_event_hprs(&s, &[event], &[1]);
        assert!(invalid.is_empty());
        assert_eq!(table.records.len(), 2);

        // pre window [1,1]: 101/101 - 1 = 0
        let pre = table
            .records
            .iter()
            .find(|r| r.phase == Phase::Pre)
            .unwrap();
        assert_eq!(pre.hpr, 0.0);
        assert_eq!(pre.start_date, s.date_at(1));
        assert_eq!(pre.end_date, s.date_at(1));

        // post window [2,3]: 103/99 - 1
        let post = table
            .records
            .iter()
            .find(|r| r.phase == Phase::Post)
            .unwrap();
        assert!((post.hpr - (103.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert!((post.hpr - 0.0404).abs() < 1e-4);
    }

    #[test]
    fn test_reference_scenario_horizon_two() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);

        let (table, _) = compute_event_hprs(&s, &[event], &[2]);

        let pre = table
            .records
            .iter()
            .find(|r| r.phase == Phase::Pre)
            .unwrap();
        assert!((pre.hpr - 0.01).abs() < 1e-12); // 101/100 - 1

        let post = table
            .records
            .iter()
            .find(|r| r.phase == Phase::Post)
            .unwrap();
        assert!((post.hpr - (107.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert!((post.hpr - 0.0808).abs() < 1e-4);
    }

    #[test]
    fn test_pre_record_exists_iff_enough_history() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);

        // t=2: pre exists for n<=2, not for n=3
        for (horizon, expect) in [(1u32, true), (2, true), (3, false)] {
            let outcome = evaluate_window(&s, &event, Phase::Pre, horizon);
            assert_eq!(
                matches!(outcome, WindowOutcome::Computed(_)),
                expect,
                "pre horizon {}",
                horizon
            );
        }
    }

    #[test]
    fn test_post_record_exists_iff_enough_future() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);

        // t=2, len=5: post exists for n<=2, not for n=3
        for (horizon, expect) in [(2u32, true), (3, false)] {
            let outcome = evaluate_window(&s, &event, Phase::Post, horizon);
            assert_eq!(
                matches!(outcome, WindowOutcome::Computed(_)),
                expect,
                "post horizon {}",
                horizon
            );
        }
    }

    #[test]
    fn test_out_of_range_windows_are_omitted_not_errors() {
        let s = series_of(&[100.0, 101.0, 99.0]);
        let event = event_at(&s, 0);

        // no history before position 0 and only 2 future observations
        let (table, invalid) = compute_event_hprs(&s, &[event], &[1, 5, 10, 20]);
        assert!(invalid.is_empty());
        assert_eq!(table.records.len(), 1); // post n=1 only
        assert_eq!(table.records[0].phase, Phase::Post);
        assert_eq!(table.records[0].horizon_days, 1);
    }

    #[test]
    fn test_hpr_is_scale_invariant() {
        let base = [100.0, 101.0, 99.0, 103.0, 107.0];
        let scaled: Vec<f64> = base.iter().map(|p| p * 37.5).collect();

        let s1 = series_of(&base);
        let s2 = series_of(&scaled);
        let horizons = [1, 2];

        let (t1, _) = compute_event_hprs(&s1, &[event_at(&s1, 2)], &horizons);
        let (t2, _) = compute_event_hprs(&s2, &[event_at(&s2, 2)], &horizons);

        assert_eq!(t1.records.len(), t2.records.len());
        for (a, b) in t1.records.iter().zip(t2.records.iter()) {
            assert!((a.hpr - b.hpr).abs() < 1e-12);
        }
    }

    #[test]
    fn test_non_positive_price_is_reported_not_computed() {
        let s = series_of(&[100.0, 0.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);

        let (table, invalid) = compute_event_hprs(&s, &[event], &[1]);

        // pre window [1,1] hits the zero price; post [2,3] is fine
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].phase, Phase::Post);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].phase, Phase::Pre);
        assert_eq!(invalid[0].date, s.date_at(1));
        assert!(table.records.iter().all(|r| r.hpr.is_finite()));
    }

    #[test]
    fn test_canonical_ordering_post_before_pre() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0, 110.0, 112.0]);
        let early = event_at(&s, 2);
        let late = event_at(&s, 4);

        // supply events and horizons out of order
        let (table, _) = compute_event_hprs(&s, &[late, early], &[2, 1]);

        let keys: Vec<(NaiveDate, &str, u32)> = table
            .records
            .iter()
            .map(|r| (r.event_date, r.phase.as_str(), r.horizon_days))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        // within one event the "post" tag sorts before "pre"
        let first_phases: Vec<&str> = table
            .records
            .iter()
            .filter(|r| r.event_date == early.event_date)
            .map(|r| r.phase.as_str())
            .collect();
        assert_eq!(first_phases, vec!["post", "post", "pre", "pre"]);
    }

    #[test]
    fn test_overlay_filters_phase_and_keeps_caller_horizon_order() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        let event = event_at(&s, 2);
        let horizons = [20, 1, 2];

        let (table, _) = compute_event_hprs(&s, &[event], &horizons);
        let overlay = build_overlay(&table, Phase::Post, &horizons);

        assert_eq!(overlay.horizons, vec![20, 1, 2]);
        assert_eq!(overlay.rows.len(), 1);

        let row = &overlay.rows[0];
        assert_eq!(row.trading_date, event.trading_date);
        // 20 is out of range -> explicit missing, not zero
        assert_eq!(row.cells[0], None);
        assert!(row.cells[1].is_some());
        assert!(row.cells[2].is_some());
    }

    #[test]
    fn test_overlay_rows_dedup_shared_trading_dates() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0]);
        // two raw event dates aligned onto the same trading day
        let a = AlignedEvent {
            event_date: date("2024-01-13"),
            trading_date: s.date_at(2),
            position: 2,
        };
        let b = AlignedEvent {
            event_date: date("2024-01-14"),
            trading_date: s.date_at(2),
            position: 2,
        };

        let (table, _) = compute_event_hprs(&s, &[a, b], &[1]);
        let overlay = build_overlay(&table, Phase::Post, &[1]);
        assert_eq!(overlay.rows.len(), 1);
    }

    #[test]
    fn test_overlay_round_trip_recovers_filtered_records() {
        let s = series_of(&[100.0, 101.0, 99.0, 103.0, 107.0, 110.0]);
        let horizons = [1, 2, 5];
        let events = [event_at(&s, 1), event_at(&s, 3)];

        let (table, _) = compute_event_hprs(&s, &events, &horizons);
        let overlay = build_overlay(&table, Phase::Post, &horizons);

        // flatten the matrix back to (trading_date, horizon, hpr) triples
        let mut flattened: Vec<(NaiveDate, u32, f64)> = overlay
            .rows
            .iter()
            .flat_map(|row| {
                overlay
                    .horizons
                    .iter()
                    .zip(row.cells.iter())
                    .filter_map(move |(&h, cell)| cell.map(|hpr| (row.trading_date, h, hpr)))
            })
            .collect();
        flattened.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut expected: Vec<(NaiveDate, u32, f64)> = table
            .records
            .iter()
            .filter(|r| r.phase == Phase::Post)
            .map(|r| (r.trading_date, r.horizon_days, r.hpr))
            .collect();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert_eq!(flattened, expected);
    }

    #[test]
    fn test_unaligned_events_produce_no_records() {
        let s = series_of(&[100.0, 101.0, 99.0]);
        // event predating the whole calendar, backward alignment
        let aligned = alignment::align_events(&s, &[date("2020-01-01")], AlignDirection::Backward);
        assert!(aligned.is_empty());

        let (table, invalid) = compute_event_hprs(&s, &aligned, &[1, 5]);
        assert!(table.records.is_empty());
        assert!(invalid.is_empty());
    }

    #[tokio::test]
    async fn test_run_event_study_scopes_parse_errors_to_their_group() {
        use crate::external::mock::MockProvider;

        let provider = MockProvider::new();
        let req = EventStudyRequest {
            ticker: "NVDA".to_string(),
            start: date("2024-01-01"),
            end: date("2024-06-30"),
            groups: vec![
                EventGroup {
                    label: "good".to_string(),
                    dates: "2024-02-21\n2024-05-22".to_string(),
                },
                EventGroup {
                    label: "bad".to_string(),
                    dates: "2024-02-21\ngarbage".to_string(),
                },
            ],
            horizons: vec![1, 5],
            direction: AlignDirection::Backward,
            phase: Phase::Post,
        };

        let resp = run_event_study(&provider, req).await.unwrap();

        assert_eq!(resp.groups.len(), 1);
        assert_eq!(resp.groups[0].label, "good");
        assert!(!resp.groups[0].table.records.is_empty());

        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].label, "bad");
        assert!(resp.errors[0].error.contains("garbage"));
    }

    #[tokio::test]
    async fn test_run_event_study_rejects_zero_horizon() {
        use crate::external::mock::MockProvider;

        let provider = MockProvider::new();
        let req = EventStudyRequest {
            ticker: "NVDA".to_string(),
            start: date("2024-01-01"),
            end: date("2024-06-30"),
            groups: vec![EventGroup {
                label: "2024".to_string(),
                dates: "2024-02-21".to_string(),
            }],
            horizons: vec![1, 0],
            direction: AlignDirection::Backward,
            phase: Phase::Post,
        };

        let err = run_event_study(&provider, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
