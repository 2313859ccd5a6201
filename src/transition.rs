//! Schedule status transition rules.
//!
//! The state graph is closed: the five edges below are the only legal
//! transitions, `completed` and `cancelled` are terminal, and a
//! self-transition is an accepted no-op surfaced as a warning.
//!
//! ```text
//! active  -> paused     (data sync)
//! active  -> completed
//! active  -> cancelled  (data sync)
//! paused  -> active     (date recalculation + data sync)
//! paused  -> cancelled
//! ```

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::enums::ScheduleStatus;
use crate::models::Schedule;

/// Side effect a transition obliges the orchestrator to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequiredAction {
    /// Dependent execution/notification records must be synchronized.
    DataSync,
    /// A new `next_due_date` must be computed before activation.
    DateRecalculation,
}

/// Outcome of validating a requested transition.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub required_actions: Vec<RequiredAction>,
}

impl ValidationResult {
    fn ok(required_actions: Vec<RequiredAction>) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            required_actions,
        }
    }

    fn noop(warning: String) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: vec![warning],
            required_actions: Vec::new(),
        }
    }

    fn invalid(error: String) -> Self {
        Self {
            is_valid: false,
            errors: vec![error],
            warnings: Vec::new(),
            required_actions: Vec::new(),
        }
    }
}

/// Decide whether `from -> to` is a legal edge and what it implies.
pub fn validate_transition(from: ScheduleStatus, to: ScheduleStatus) -> ValidationResult {
    use RequiredAction::*;
    use ScheduleStatus::*;

    if from == to {
        return ValidationResult::noop(format!(
            "schedule is already {to}; transition is a no-op"
        ));
    }

    match (from, to) {
        (Active, Paused) => ValidationResult::ok(vec![DataSync]),
        (Active, Completed) => ValidationResult::ok(vec![]),
        (Active, Cancelled) => ValidationResult::ok(vec![DataSync]),
        (Paused, Active) => ValidationResult::ok(vec![DateRecalculation, DataSync]),
        (Paused, Cancelled) => ValidationResult::ok(vec![]),
        (from, to) if from.is_terminal() => {
            ValidationResult::invalid(format!("{from} is terminal; cannot transition to {to}"))
        }
        (from, to) => ValidationResult::invalid(format!("no transition from {from} to {to}")),
    }
}

/// A schedule can pause while active and not past its end date.
pub fn can_pause(schedule: &Schedule, today: NaiveDate) -> bool {
    schedule.status == ScheduleStatus::Active && !schedule.has_ended(today)
}

/// A schedule can resume while paused and not past its end date.
pub fn can_resume(schedule: &Schedule, today: NaiveDate) -> bool {
    schedule.status == ScheduleStatus::Paused && !schedule.has_ended(today)
}

/// Everything standing between this schedule and `target`, as operator-facing
/// reasons. Empty means the transition may proceed.
pub fn blocking_reasons(
    schedule: &Schedule,
    target: ScheduleStatus,
    today: NaiveDate,
) -> Vec<String> {
    let mut reasons = validate_transition(schedule.status, target).errors;

    match target {
        ScheduleStatus::Paused if schedule.status != ScheduleStatus::Active => {
            reasons.push(format!(
                "only an active schedule can be paused (currently {})",
                schedule.status
            ));
        }
        ScheduleStatus::Active if schedule.status != ScheduleStatus::Paused => {
            reasons.push(format!(
                "only a paused schedule can be resumed (currently {})",
                schedule.status
            ));
        }
        _ => {}
    }

    if let Some(end) = schedule.end_date {
        if end < today && !target.is_terminal() {
            reasons.push(format!(
                "schedule ended on {end}; only completion or cancellation remain"
            ));
        }
    }

    if schedule.status == ScheduleStatus::Active && target == ScheduleStatus::Completed {
        // The engine does not verify execution completeness itself.
        reasons.push(
            "confirm all planned executions are completed or skipped before completing".into(),
        );
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_schedule;
    use ScheduleStatus::*;

    const ALL: [ScheduleStatus; 4] = [Active, Paused, Completed, Cancelled];

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exactly_five_edges_are_valid() {
        let legal = [
            (Active, Paused),
            (Active, Completed),
            (Active, Cancelled),
            (Paused, Active),
            (Paused, Cancelled),
        ];
        for from in ALL {
            for to in ALL {
                let result = validate_transition(from, to);
                if from == to {
                    assert!(result.is_valid, "{from}->{to} self-transition must pass");
                    assert!(!result.warnings.is_empty());
                } else if legal.contains(&(from, to)) {
                    assert!(result.is_valid, "{from}->{to} must be legal");
                    assert!(result.errors.is_empty());
                } else {
                    assert!(!result.is_valid, "{from}->{to} must be rejected");
                    assert!(!result.errors.is_empty());
                }
            }
        }
    }

    #[test]
    fn pause_requires_data_sync() {
        let result = validate_transition(Active, Paused);
        assert_eq!(result.required_actions, vec![RequiredAction::DataSync]);
    }

    #[test]
    fn resume_requires_recalculation_then_sync() {
        let result = validate_transition(Paused, Active);
        assert_eq!(
            result.required_actions,
            vec![RequiredAction::DateRecalculation, RequiredAction::DataSync]
        );
    }

    #[test]
    fn completion_needs_no_sync() {
        assert!(validate_transition(Active, Completed).required_actions.is_empty());
        assert!(validate_transition(Paused, Cancelled).required_actions.is_empty());
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [Completed, Cancelled] {
            for to in ALL {
                if from != to {
                    assert!(!validate_transition(from, to).is_valid);
                }
            }
        }
    }

    #[test]
    fn can_pause_only_active_not_ended() {
        let today = day(2025, 6, 1);
        let mut s = test_schedule(2, None);
        assert!(can_pause(&s, today));

        s.end_date = Some(day(2025, 5, 31));
        assert!(!can_pause(&s, today));

        s.end_date = Some(day(2025, 6, 1));
        assert!(can_pause(&s, today));

        s.end_date = None;
        s.status = Paused;
        assert!(!can_pause(&s, today));
    }

    #[test]
    fn can_resume_only_paused_not_ended() {
        let today = day(2025, 6, 1);
        let mut s = test_schedule(2, None);
        assert!(!can_resume(&s, today));

        s.status = Paused;
        assert!(can_resume(&s, today));

        s.end_date = Some(day(2025, 5, 20));
        assert!(!can_resume(&s, today));
    }

    #[test]
    fn blocking_reasons_for_ended_schedule() {
        let today = day(2025, 6, 1);
        let mut s = test_schedule(2, Some(day(2025, 5, 1)));
        s.status = Paused;
        let reasons = blocking_reasons(&s, Active, today);
        assert!(reasons.iter().any(|r| r.contains("ended on 2025-05-01")));
    }

    #[test]
    fn completing_reminds_about_execution_completeness() {
        let s = test_schedule(2, None);
        let reasons = blocking_reasons(&s, Completed, day(2025, 6, 1));
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("planned executions"));
    }
}
