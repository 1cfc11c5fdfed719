use chrono::NaiveDate;

use crate::models::{AlignDirection, AlignedEvent, PriceSeries};

/// Outcome of resolving one event date against the calendar. Unresolved
/// events produce no output row, but the variant keeps the drop path
/// explicit and testable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignOutcome {
    Aligned(AlignedEvent),
    Unresolved,
}

/// As-of lookup into a sorted date slice: index of the greatest date <=
/// `target` (backward) or the least date >= `target` (forward). `None`
/// when no date satisfies the direction constraint.
pub fn asof(dates: &[NaiveDate], target: NaiveDate, direction: AlignDirection) -> Option<usize> {
    match direction {
        AlignDirection::Backward => {
            let idx = dates.partition_point(|d| *d <= target);
            if idx == 0 {
                None
            } else {
                Some(idx - 1)
            }
        }
        AlignDirection::Forward => {
            let idx = dates.partition_point(|d| *d < target);
            if idx == dates.len() {
                None
            } else {
                Some(idx)
            }
        }
    }
}

/// Resolves one event date onto the series' trading calendar.
pub fn resolve_event(
    series: &PriceSeries,
    calendar: &[NaiveDate],
    event_date: NaiveDate,
    direction: AlignDirection,
) -> AlignOutcome {
    let Some(idx) = asof(calendar, event_date, direction) else {
        return AlignOutcome::Unresolved;
    };

    let trading_date = calendar[idx];
    match series.position(trading_date) {
        Some(position) => AlignOutcome::Aligned(AlignedEvent {
            event_date,
            trading_date,
            position,
        }),
        // Every calendar date carries a position; an unresolvable one is
        // treated like a no-match rather than a panic.
        None => AlignOutcome::Unresolved,
    }
}

/// Maps a batch of event dates onto the calendar. Events with no qualifying
/// trading date are dropped, matching the no-match semantics of an as-of
/// join; distinct event dates resolving to the same trading date stay
/// separate.
pub fn align_events(
    series: &PriceSeries,
    event_dates: &[NaiveDate],
    direction: AlignDirection,
) -> Vec<AlignedEvent> {
    let calendar = series.calendar();

    event_dates
        .iter()
        .filter_map(
            |&event_date| match resolve_event(series, &calendar, event_date, direction) {
                AlignOutcome::Aligned(event) => Some(event),
                AlignOutcome::Unresolved => None,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(dates: &[&str]) -> PriceSeries {
        PriceSeries {
            ticker: "TEST".to_string(),
            points: dates
                .iter()
                .map(|d| PricePoint {
                    date: date(d),
                    adj_close: 100.0,
                    daily_return: None,
                })
                .collect(),
        }
    }

    // Mon 2024-01-08, Tue 2024-01-09, Fri 2024-01-12 (gap over Wed/Thu)
    fn gapped() -> PriceSeries {
        series(&["2024-01-08", "2024-01-09", "2024-01-12"])
    }

    #[test]
    fn test_backward_picks_greatest_date_at_or_before() {
        let s = gapped();
        let aligned = align_events(&s, &[date("2024-01-10")], AlignDirection::Backward);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].trading_date, date("2024-01-09"));
        assert_eq!(aligned[0].position, 1);
        assert!(aligned[0].trading_date <= aligned[0].event_date);
    }

    #[test]
    fn test_forward_picks_least_date_at_or_after() {
        let s = gapped();
        let aligned = align_events(&s, &[date("2024-01-10")], AlignDirection::Forward);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].trading_date, date("2024-01-12"));
        assert_eq!(aligned[0].position, 2);
        assert!(aligned[0].trading_date >= aligned[0].event_date);
    }

    #[test]
    fn test_exact_hit_resolves_to_itself_in_both_directions() {
        let s = gapped();
        for direction in [AlignDirection::Backward, AlignDirection::Forward] {
            let aligned = align_events(&s, &[date("2024-01-09")], direction);
            assert_eq!(aligned[0].trading_date, date("2024-01-09"));
        }
    }

    #[test]
    fn test_event_before_calendar_is_dropped_backward() {
        let s = gapped();
        let aligned = align_events(&s, &[date("2024-01-05")], AlignDirection::Backward);
        assert!(aligned.is_empty());
    }

    #[test]
    fn test_event_after_calendar_is_dropped_forward() {
        let s = gapped();
        let aligned = align_events(&s, &[date("2024-01-15")], AlignDirection::Forward);
        assert!(aligned.is_empty());
    }

    #[test]
    fn test_event_before_calendar_resolves_forward() {
        let s = gapped();
        let aligned = align_events(&s, &[date("2024-01-05")], AlignDirection::Forward);
        assert_eq!(aligned[0].trading_date, date("2024-01-08"));
        assert_eq!(aligned[0].position, 0);
    }

    #[test]
    fn test_distinct_events_may_share_a_trading_date() {
        let s = gapped();
        let aligned = align_events(
            &s,
            &[date("2024-01-10"), date("2024-01-11")],
            AlignDirection::Backward,
        );
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].trading_date, date("2024-01-09"));
        assert_eq!(aligned[1].trading_date, date("2024-01-09"));
        assert_ne!(aligned[0].event_date, aligned[1].event_date);
    }

    #[test]
    fn test_asof_on_empty_calendar() {
        assert_eq!(asof(&[], date("2024-01-10"), AlignDirection::Backward), None);
        assert_eq!(asof(&[], date("2024-01-10"), AlignDirection::Forward), None);
    }
}
