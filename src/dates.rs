//! Date arithmetic for the schedule lifecycle. Pure functions, no I/O.
//!
//! Everything takes an explicit `today` so callers (and tests) control the
//! clock; only the orchestrator reaches for `Local::now()`.

use chrono::{Duration, NaiveDate};

use crate::error::LifecycleError;
use crate::models::enums::ResumeStrategy;
use crate::models::{MissedExecution, Schedule};

fn weeks(n: u32) -> Duration {
    Duration::weeks(n as i64)
}

/// The next due date a resuming schedule should land on.
///
/// `immediate` resumes today, `next_cycle` one full interval from today,
/// `custom` uses the operator-supplied date and fails validation when that
/// date is absent.
pub fn calculate_next_due_date(
    schedule: &Schedule,
    strategy: ResumeStrategy,
    custom_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate, LifecycleError> {
    match strategy {
        ResumeStrategy::Immediate => Ok(today),
        ResumeStrategy::NextCycle => Ok(today + weeks(schedule.interval_weeks)),
        ResumeStrategy::Custom => custom_date.ok_or_else(|| {
            LifecycleError::validation("custom resume strategy requires a custom date")
        }),
    }
}

/// Occurrences that fell inside the pause window.
///
/// Steps from the schedule's `next_due_date` at pause time in
/// `interval_weeks` strides while strictly before `resume_at`; every step on
/// or after `paused_at` is a missed occurrence.
pub fn missed_executions(
    schedule: &Schedule,
    paused_at: NaiveDate,
    resume_at: NaiveDate,
) -> Vec<MissedExecution> {
    let mut missed = Vec::new();
    let mut due = schedule.next_due_date;
    while due < resume_at {
        if due >= paused_at {
            missed.push(MissedExecution {
                due_date: due,
                weeks_overdue: (resume_at - due).num_weeks(),
            });
        }
        due = due + weeks(schedule.interval_weeks);
    }
    missed
}

/// Catch-up dates at a compressed cadence of `max(1, interval/2)` weeks,
/// starting today. Dates past the schedule's end date are dropped.
pub fn catch_up_dates(schedule: &Schedule, missed_count: i64, today: NaiveDate) -> Vec<NaiveDate> {
    if missed_count <= 0 {
        return Vec::new();
    }
    let compressed = (schedule.interval_weeks / 2).max(1);

    let mut dates = Vec::with_capacity(missed_count as usize);
    let mut date = today;
    for _ in 0..missed_count {
        if schedule.end_date.is_some_and(|end| date > end) {
            break;
        }
        dates.push(date);
        date = date + weeks(compressed);
    }
    dates
}

/// How many occurrences remain before the end date; `None` when unbounded.
pub fn remaining_executions(schedule: &Schedule, from_date: NaiveDate) -> Option<i64> {
    let end = schedule.end_date?;
    if from_date > end {
        return Some(0);
    }
    Some((end - from_date).num_weeks() / schedule.interval_weeks as i64 + 1)
}

/// Reject a proposed due date that is in the past, beyond the end date, or
/// less than one week after the last execution.
pub fn validate_next_due_date(
    schedule: &Schedule,
    proposed: NaiveDate,
    today: NaiveDate,
) -> Result<(), LifecycleError> {
    let mut reasons = Vec::new();

    if proposed < today {
        reasons.push(format!("proposed due date {proposed} is in the past"));
    }
    if let Some(end) = schedule.end_date {
        if proposed > end {
            reasons.push(format!("proposed due date {proposed} is after end date {end}"));
        }
    }
    if let Some(last) = schedule.last_executed_date {
        if proposed < last + Duration::weeks(1) {
            reasons.push(format!(
                "proposed due date {proposed} is less than one week after last execution {last}"
            ));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(LifecycleError::Validation { reasons })
    }
}

/// Heuristic resume strategy from the pause length.
///
/// Shorter than one interval: pick up immediately. Longer than four
/// intervals: start a fresh cycle. In between the call is genuinely
/// ambiguous and left to the operator as `custom`.
pub fn suggest_resume_strategy(schedule: &Schedule, pause_duration_weeks: i64) -> ResumeStrategy {
    let interval = schedule.interval_weeks as i64;
    if pause_duration_weeks < interval {
        ResumeStrategy::Immediate
    } else if pause_duration_weeks > 4 * interval {
        ResumeStrategy::NextCycle
    } else {
        ResumeStrategy::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_schedule;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn immediate_resumes_today() {
        let s = test_schedule(2, None);
        let today = day(2025, 6, 2);
        let due = calculate_next_due_date(&s, ResumeStrategy::Immediate, None, today).unwrap();
        assert_eq!(due, today);
    }

    #[test]
    fn next_cycle_adds_one_interval() {
        let s = test_schedule(3, None);
        let today = day(2025, 6, 2);
        let due = calculate_next_due_date(&s, ResumeStrategy::NextCycle, None, today).unwrap();
        assert_eq!(due, day(2025, 6, 23));
    }

    #[test]
    fn custom_without_date_is_validation_error() {
        let s = test_schedule(2, None);
        let err =
            calculate_next_due_date(&s, ResumeStrategy::Custom, None, day(2025, 6, 2)).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation { .. }));
    }

    #[test]
    fn custom_uses_supplied_date() {
        let s = test_schedule(2, None);
        let due = calculate_next_due_date(
            &s,
            ResumeStrategy::Custom,
            Some(day(2025, 7, 1)),
            day(2025, 6, 2),
        )
        .unwrap();
        assert_eq!(due, day(2025, 7, 1));
    }

    #[test]
    fn missed_executions_in_pause_window() {
        let mut s = test_schedule(2, None);
        s.next_due_date = day(2025, 1, 1);
        let missed = missed_executions(&s, day(2025, 1, 1), day(2025, 2, 26));
        assert_eq!(missed.len(), 4);
        assert_eq!(missed[0].due_date, day(2025, 1, 1));
        assert_eq!(missed[3].due_date, day(2025, 2, 12));
        assert!(missed.iter().all(|m| m.weeks_overdue >= 0));
        assert_eq!(missed[0].weeks_overdue, 8);
    }

    #[test]
    fn missed_executions_empty_when_due_after_resume() {
        let mut s = test_schedule(2, None);
        s.next_due_date = day(2025, 3, 1);
        assert!(missed_executions(&s, day(2025, 1, 1), day(2025, 2, 1)).is_empty());
    }

    #[test]
    fn occurrences_before_pause_are_not_missed() {
        let mut s = test_schedule(2, None);
        s.next_due_date = day(2025, 1, 1);
        // Pause began Jan 20: Jan 1 and Jan 15 predate it.
        let missed = missed_executions(&s, day(2025, 1, 20), day(2025, 2, 26));
        assert_eq!(missed.len(), 3);
        assert_eq!(missed[0].due_date, day(2025, 1, 29));
    }

    #[test]
    fn catch_up_uses_compressed_interval() {
        let s = test_schedule(4, None);
        let dates = catch_up_dates(&s, 2, day(2025, 6, 2));
        assert_eq!(dates, vec![day(2025, 6, 2), day(2025, 6, 16)]);
    }

    #[test]
    fn catch_up_interval_never_below_one_week() {
        let s = test_schedule(1, None);
        let dates = catch_up_dates(&s, 3, day(2025, 6, 2));
        assert_eq!(dates, vec![day(2025, 6, 2), day(2025, 6, 9), day(2025, 6, 16)]);
    }

    #[test]
    fn catch_up_empty_for_zero_or_negative() {
        let s = test_schedule(4, None);
        assert!(catch_up_dates(&s, 0, day(2025, 6, 2)).is_empty());
        assert!(catch_up_dates(&s, -1, day(2025, 6, 2)).is_empty());
    }

    #[test]
    fn catch_up_drops_dates_past_end() {
        let s = test_schedule(4, Some(day(2025, 6, 20)));
        let dates = catch_up_dates(&s, 3, day(2025, 6, 2));
        // Third date (Jun 30) falls past the end date.
        assert_eq!(dates, vec![day(2025, 6, 2), day(2025, 6, 16)]);
    }

    #[test]
    fn remaining_unbounded_without_end_date() {
        let s = test_schedule(2, None);
        assert_eq!(remaining_executions(&s, day(2025, 6, 2)), None);
    }

    #[test]
    fn remaining_zero_after_end() {
        let s = test_schedule(2, Some(day(2025, 6, 1)));
        assert_eq!(remaining_executions(&s, day(2025, 6, 2)), Some(0));
    }

    #[test]
    fn remaining_counts_inclusive_start() {
        // 8 weeks of runway at a 2-week cadence: occurrences now, +2, +4, +6, +8.
        let s = test_schedule(2, Some(day(2025, 7, 28)));
        assert_eq!(remaining_executions(&s, day(2025, 6, 2)), Some(5));
    }

    #[test]
    fn validate_rejects_past_date() {
        let s = test_schedule(2, None);
        let err = validate_next_due_date(&s, day(2025, 5, 30), day(2025, 6, 2)).unwrap_err();
        assert!(matches!(err, LifecycleError::Validation { .. }));
    }

    #[test]
    fn validate_rejects_date_after_end() {
        let s = test_schedule(2, Some(day(2025, 6, 30)));
        assert!(validate_next_due_date(&s, day(2025, 7, 1), day(2025, 6, 2)).is_err());
    }

    #[test]
    fn validate_rejects_too_soon_after_last_execution() {
        let mut s = test_schedule(2, None);
        s.last_executed_date = Some(day(2025, 6, 1));
        assert!(validate_next_due_date(&s, day(2025, 6, 5), day(2025, 6, 2)).is_err());
        assert!(validate_next_due_date(&s, day(2025, 6, 8), day(2025, 6, 2)).is_ok());
    }

    #[test]
    fn suggest_strategy_bands() {
        let s = test_schedule(2, None);
        assert_eq!(suggest_resume_strategy(&s, 1), ResumeStrategy::Immediate);
        assert_eq!(suggest_resume_strategy(&s, 2), ResumeStrategy::Custom);
        assert_eq!(suggest_resume_strategy(&s, 8), ResumeStrategy::Custom);
        assert_eq!(suggest_resume_strategy(&s, 9), ResumeStrategy::NextCycle);
    }
}
