//! Orchestration of the pause/resume workflows.
//!
//! Each operation runs its steps strictly in order: load, validate (fail
//! fast, before any mutation), compute dates, persist the schedule row,
//! synchronize dependent records, append the audit entry. Dependent-record
//! failures ride along in the returned [`SyncReport`]; only a fault on the
//! schedule row itself aborts the workflow.
//!
//! No locks are taken: concurrent calls against the same schedule race
//! last-writer-wins on the schedule row, with the store's unique keys as the
//! safety net against duplicate dependent rows.

use chrono::{Local, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::dates;
use crate::error::LifecycleError;
use crate::models::enums::{MissedHandling, ResumeStrategy, ScheduleStatus};
use crate::models::{
    Execution, ExecutionStatus, MissedExecution, NewSchedule, Notification, Schedule,
    TransitionLogEntry,
};
use crate::store::Store;
use crate::sync::{DataSynchronizer, SyncReport};
use crate::transition;

/// Per-call identity scope, injected rather than cached process-wide.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub tenant_id: String,
    pub user_id: Option<Uuid>,
}

impl EngineContext {
    pub fn new(tenant_id: impl Into<String>, user_id: Option<Uuid>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id,
        }
    }

    /// Resolve the tenant scope for a user through the store.
    pub fn for_user<S: Store>(store: &S, user_id: Uuid) -> Result<Self, LifecycleError> {
        let tenant_id = store
            .tenant_for_user(&user_id)?
            .ok_or_else(|| LifecycleError::validation(format!("no tenant scope for user {user_id}")))?;
        Ok(Self::new(tenant_id, Some(user_id)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PauseOptions {
    pub reason: Option<String>,
    pub notify_assignee: bool,
}

#[derive(Debug, Clone)]
pub struct ResumeOptions {
    pub strategy: ResumeStrategy,
    pub custom_date: Option<NaiveDate>,
    pub handle_missed: MissedHandling,
}

#[derive(Debug)]
pub struct PauseOutcome {
    pub schedule: Schedule,
    pub sync: SyncReport,
}

#[derive(Debug)]
pub struct ResumeOutcome {
    pub schedule: Schedule,
    pub new_next_due_date: NaiveDate,
    pub missed: Vec<MissedExecution>,
    pub catch_up_dates: Vec<NaiveDate>,
    pub sync: SyncReport,
}

pub struct LifecycleManager<S: Store> {
    store: S,
    context: EngineContext,
}

impl<S: Store> LifecycleManager<S> {
    pub fn new(store: S, context: EngineContext) -> Self {
        Self { store, context }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn load(&self, id: &Uuid) -> Result<Schedule, LifecycleError> {
        self.store
            .fetch_schedule(id)?
            .ok_or_else(|| LifecycleError::NotFound { id: id.to_string() })
    }

    fn check_transition(
        &self,
        schedule: &Schedule,
        target: ScheduleStatus,
    ) -> Result<(), LifecycleError> {
        let result = transition::validate_transition(schedule.status, target);
        if !result.is_valid {
            return Err(LifecycleError::Validation {
                reasons: result.errors,
            });
        }
        for warning in &result.warnings {
            tracing::warn!(schedule_id = %schedule.id, %warning, "transition warning");
        }
        Ok(())
    }

    /// Create a schedule, its first planned execution, and (when applicable)
    /// its first reminder. The schedule starts active with
    /// `next_due_date = start_date`.
    pub fn create_schedule(&self, new: NewSchedule) -> Result<Schedule, LifecycleError> {
        let mut reasons = Vec::new();
        if new.interval_weeks < 1 {
            reasons.push("interval must be at least one week".to_string());
        }
        if let Some(end) = new.end_date {
            if end < new.start_date {
                reasons.push(format!(
                    "end date {end} is before start date {}",
                    new.start_date
                ));
            }
        }
        if !reasons.is_empty() {
            return Err(LifecycleError::Validation { reasons });
        }

        let now = self.now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            tenant_id: self.context.tenant_id.clone(),
            patient_id: new.patient_id,
            item_id: new.item_id,
            interval_weeks: new.interval_weeks,
            start_date: new.start_date,
            end_date: new.end_date,
            last_executed_date: None,
            next_due_date: new.start_date,
            status: ScheduleStatus::Active,
            assigned_user_id: new.assigned_user_id,
            priority: new.priority,
            requires_notification: new.requires_notification,
            notification_days_before: new.notification_days_before,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_schedule(&schedule)?;

        self.store.upsert_execution(&Execution::planned(
            &schedule.tenant_id,
            schedule.id,
            schedule.next_due_date,
        ))?;
        if let Some(notify_date) = schedule.notify_date() {
            if notify_date >= now.date() {
                self.store.upsert_notification(&Notification::pending(
                    &schedule.tenant_id,
                    schedule.id,
                    notify_date,
                ))?;
            }
        }

        tracing::info!(schedule_id = %schedule.id, "schedule created");
        Ok(schedule)
    }

    /// Pause an active schedule: skip its planned executions, cancel its
    /// pending reminders, record the transition.
    pub fn pause_schedule(
        &self,
        id: &Uuid,
        options: PauseOptions,
    ) -> Result<PauseOutcome, LifecycleError> {
        let schedule = self.load(id)?;
        let now = self.now();
        let today = now.date();

        self.check_transition(&schedule, ScheduleStatus::Paused)?;
        if !transition::can_pause(&schedule, today) {
            return Err(LifecycleError::Validation {
                reasons: transition::blocking_reasons(&schedule, ScheduleStatus::Paused, today),
            });
        }

        self.store
            .update_schedule_status(id, ScheduleStatus::Paused, None, now)?;

        let sync = DataSynchronizer::new(&self.store).sync_on_pause(id);

        let entry = TransitionLogEntry::new(
            schedule.id,
            schedule.status,
            ScheduleStatus::Paused,
            now,
            self.context.user_id,
            options.reason.clone(),
        )
        .with_meta("executions_skipped", sync.executions_skipped.into())
        .with_meta("notifications_cancelled", sync.notifications_cancelled.into())
        .with_meta("sync_issues", sync.issues.len().into());
        self.store.append_transition(&entry)?;

        if options.notify_assignee {
            self.notify_assignee_best_effort(&schedule, &options);
        }

        tracing::info!(schedule_id = %id, issues = sync.issues.len(), "schedule paused");
        let schedule = self.load(id)?;
        Ok(PauseOutcome { schedule, sync })
    }

    /// Resume a paused schedule onto a freshly computed due date, optionally
    /// catching up or flagging the occurrences missed during the pause.
    pub fn resume_schedule(
        &self,
        id: &Uuid,
        options: ResumeOptions,
    ) -> Result<ResumeOutcome, LifecycleError> {
        let schedule = self.load(id)?;
        let now = self.now();
        let today = now.date();

        self.check_transition(&schedule, ScheduleStatus::Active)?;
        if !transition::can_resume(&schedule, today) {
            return Err(LifecycleError::Validation {
                reasons: transition::blocking_reasons(&schedule, ScheduleStatus::Active, today),
            });
        }

        let new_next_due_date =
            dates::calculate_next_due_date(&schedule, options.strategy, options.custom_date, today)?;
        dates::validate_next_due_date(&schedule, new_next_due_date, today)?;

        // updated_at doubles as the pause timestamp while paused.
        let paused_at = schedule.updated_at.date();
        let mut missed = Vec::new();
        let mut catch_up = Vec::new();
        let mut sync = SyncReport::default();
        if options.handle_missed != MissedHandling::Skip {
            missed = dates::missed_executions(&schedule, paused_at, today);
            match options.handle_missed {
                MissedHandling::CatchUp => {
                    catch_up = dates::catch_up_dates(&schedule, missed.len() as i64, today);
                    for date in &catch_up {
                        let exec = Execution::planned(&schedule.tenant_id, schedule.id, *date);
                        if let Err(e) = self.store.upsert_execution(&exec) {
                            sync.issues.push(crate::sync::SyncIssue {
                                record: "executions".into(),
                                message: e.to_string(),
                            });
                        } else {
                            sync.executions_upserted += 1;
                        }
                    }
                }
                MissedHandling::MarkOverdue => {
                    for m in &missed {
                        let mut exec =
                            Execution::planned(&schedule.tenant_id, schedule.id, m.due_date);
                        exec.status = ExecutionStatus::Overdue;
                        if let Err(e) = self.store.upsert_execution(&exec) {
                            sync.issues.push(crate::sync::SyncIssue {
                                record: "executions".into(),
                                message: e.to_string(),
                            });
                        } else {
                            sync.executions_upserted += 1;
                        }
                    }
                }
                MissedHandling::Skip => unreachable!(),
            }
        }

        self.store.update_schedule_status(
            id,
            ScheduleStatus::Active,
            Some(new_next_due_date),
            now,
        )?;

        let resumed = self.load(id)?;
        let resume_sync =
            DataSynchronizer::new(&self.store).sync_on_resume(&resumed, new_next_due_date, today);
        merge_reports(&mut sync, resume_sync);

        let entry = TransitionLogEntry::new(
            schedule.id,
            schedule.status,
            ScheduleStatus::Active,
            now,
            self.context.user_id,
            None,
        )
        .with_meta("strategy", options.strategy.as_str().into())
        .with_meta("handle_missed", options.handle_missed.as_str().into())
        .with_meta("next_due_date", new_next_due_date.to_string().into())
        .with_meta("missed_count", missed.len().into())
        .with_meta("catch_up_count", catch_up.len().into())
        .with_meta("executions_upserted", sync.executions_upserted.into())
        .with_meta("notifications_upserted", sync.notifications_upserted.into())
        .with_meta("sync_issues", sync.issues.len().into());
        self.store.append_transition(&entry)?;

        tracing::info!(
            schedule_id = %id,
            strategy = options.strategy.as_str(),
            %new_next_due_date,
            missed = missed.len(),
            "schedule resumed"
        );
        Ok(ResumeOutcome {
            schedule: resumed,
            new_next_due_date,
            missed,
            catch_up_dates: catch_up,
            sync,
        })
    }

    /// Complete an active schedule. The engine does not verify execution
    /// completeness; that confirmation is the caller's.
    pub fn complete_schedule(
        &self,
        id: &Uuid,
        reason: Option<String>,
    ) -> Result<Schedule, LifecycleError> {
        self.terminate(id, ScheduleStatus::Completed, reason)
    }

    /// Cancel a schedule from active or paused. Cancelling an active
    /// schedule also halts its dependent records.
    pub fn cancel_schedule(
        &self,
        id: &Uuid,
        reason: Option<String>,
    ) -> Result<Schedule, LifecycleError> {
        self.terminate(id, ScheduleStatus::Cancelled, reason)
    }

    fn terminate(
        &self,
        id: &Uuid,
        target: ScheduleStatus,
        reason: Option<String>,
    ) -> Result<Schedule, LifecycleError> {
        let schedule = self.load(id)?;
        let now = self.now();

        self.check_transition(&schedule, target)?;
        if schedule.status == target {
            return Ok(schedule); // accepted no-op
        }

        self.store.update_schedule_status(id, target, None, now)?;

        // Only active -> cancelled carries a data-sync obligation.
        let mut entry =
            TransitionLogEntry::new(schedule.id, schedule.status, target, now, self.context.user_id, reason);
        if target == ScheduleStatus::Cancelled && schedule.status == ScheduleStatus::Active {
            let sync = DataSynchronizer::new(&self.store).sync_on_cancel(id);
            entry = entry
                .with_meta("executions_skipped", sync.executions_skipped.into())
                .with_meta("notifications_cancelled", sync.notifications_cancelled.into())
                .with_meta("sync_issues", sync.issues.len().into());
        }
        self.store.append_transition(&entry)?;

        tracing::info!(schedule_id = %id, status = target.as_str(), "schedule terminated");
        self.load(id)
    }

    /// Record that the current planned occurrence was performed. Advances
    /// `next_due_date` by one interval and plans the next occurrence, or
    /// completes the schedule when the advanced date passes the end date.
    pub fn record_execution_completed(
        &self,
        id: &Uuid,
        executed_date: NaiveDate,
    ) -> Result<Schedule, LifecycleError> {
        let schedule = self.load(id)?;
        let now = self.now();

        if schedule.status != ScheduleStatus::Active {
            return Err(LifecycleError::validation(format!(
                "cannot record execution on a {} schedule",
                schedule.status
            )));
        }

        self.store
            .complete_execution(id, schedule.next_due_date, executed_date)?;

        let advanced = schedule.next_due_date + chrono::Duration::weeks(schedule.interval_weeks as i64);
        if schedule.end_date.is_some_and(|end| advanced > end) {
            self.store
                .update_schedule_after_execution(id, executed_date, schedule.next_due_date, now)?;
            return self.complete_schedule(id, Some("recurrence reached end date".into()));
        }

        self.store
            .update_schedule_after_execution(id, executed_date, advanced, now)?;

        let updated = self.load(id)?;
        let sync =
            DataSynchronizer::new(&self.store).sync_on_resume(&updated, advanced, now.date());
        if !sync.is_clean() {
            tracing::warn!(schedule_id = %id, issues = sync.issues.len(), "post-execution sync issues");
        }
        Ok(updated)
    }

    /// Reconciliation sweep for the eventual-consistency window: re-aligns
    /// an active schedule's dependent records with its current due date.
    pub fn repair_schedule(&self, id: &Uuid) -> Result<SyncReport, LifecycleError> {
        let schedule = self.load(id)?;
        if schedule.status != ScheduleStatus::Active {
            return Ok(SyncReport::default());
        }
        let today = self.now().date();
        Ok(DataSynchronizer::new(&self.store).sync_on_resume(
            &schedule,
            schedule.next_due_date,
            today,
        ))
    }

    /// Transition history, newest first.
    pub fn transition_history(&self, id: &Uuid) -> Result<Vec<TransitionLogEntry>, LifecycleError> {
        Ok(self.store.transition_history(id)?)
    }

    /// Whole weeks since the pause began; zero when not paused.
    pub fn pause_duration_weeks(&self, schedule: &Schedule) -> i64 {
        if schedule.status != ScheduleStatus::Paused {
            return 0;
        }
        (self.now().date() - schedule.updated_at.date()).num_weeks()
    }

    /// Recommend how a paused schedule should resume.
    pub fn suggest_resume_strategy(&self, schedule: &Schedule) -> ResumeStrategy {
        dates::suggest_resume_strategy(schedule, self.pause_duration_weeks(schedule))
    }

    /// Fire-and-forget notice to the assignee; never fails the workflow.
    fn notify_assignee_best_effort(&self, schedule: &Schedule, options: &PauseOptions) {
        let Some(assignee) = schedule.assigned_user_id else {
            return;
        };
        let message = match &options.reason {
            Some(reason) => format!("schedule {} paused: {reason}", schedule.id),
            None => format!("schedule {} paused", schedule.id),
        };
        if let Err(e) =
            self.store
                .enqueue_assignee_notice(&schedule.tenant_id, &schedule.id, &assignee, &message)
        {
            tracing::warn!(schedule_id = %schedule.id, %e, "assignee notice not queued");
        }
    }
}

fn merge_reports(into: &mut SyncReport, from: SyncReport) {
    into.executions_skipped += from.executions_skipped;
    into.executions_upserted += from.executions_upserted;
    into.notifications_cancelled += from.notifications_cancelled;
    into.notifications_upserted += from.notifications_upserted;
    into.issues.extend(from.issues);
}
