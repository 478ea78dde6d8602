//! Repository for the `schedules` table, including the transactional
//! delivery-confirmation write.

use atelie_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::schedule::Schedule;

/// Column list for `schedules` queries.
const COLUMNS: &str =
    "id, project_id, date, time, meeting_type, status, notes, created_at, updated_at";

/// Outcome of a delivery confirmation.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub schedule: Schedule,
    /// Set when the success path marked the project finished.
    pub project_finished: bool,
}

/// Provides CRUD operations and the delivery transition for schedules.
pub struct ScheduleRepo;

impl ScheduleRepo {
    /// Book the delivery appointment for a project. The
    /// `uq_schedules_project` constraint rejects a second appointment with
    /// a conflict.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        date: NaiveDate,
        time: &str,
        meeting_type: &str,
    ) -> Result<Schedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedules (project_id, date, time, meeting_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(project_id)
            .bind(date)
            .bind(time)
            .bind(meeting_type)
            .fetch_one(pool)
            .await
    }

    /// Find the appointment for a project.
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedules WHERE project_id = $1");
        sqlx::query_as::<_, Schedule>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Re-book an appointment that is waiting for a new date.
    ///
    /// Guarded on `pending_reschedule`; returns `None` when the appointment
    /// is not in that state.
    pub async fn rebook(
        pool: &PgPool,
        project_id: DbId,
        date: NaiveDate,
        time: &str,
        meeting_type: &str,
    ) -> Result<Option<Schedule>, sqlx::Error> {
        let query = format!(
            "UPDATE schedules SET
                date = $2, time = $3, meeting_type = $4,
                status = 'scheduled', updated_at = NOW()
             WHERE project_id = $1 AND status = 'pending_reschedule'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Schedule>(&query)
            .bind(project_id)
            .bind(date)
            .bind(time)
            .bind(meeting_type)
            .fetch_optional(pool)
            .await
    }

    /// Apply a delivery confirmation in one transaction.
    ///
    /// Success: schedule → `completed`, project → `finished` with
    /// `completed_at`, budget → `completed`.
    /// Failure: schedule → `pending_reschedule` with `failure_note`
    /// appended to (never replacing) the notes, and the budget rolled back
    /// to `final_payment_paid`; the project is left untouched.
    ///
    /// Returns `None` when the project has no appointment in the
    /// `scheduled` state (the caller maps that to a conflict).
    pub async fn confirm_delivery(
        pool: &PgPool,
        project_id: DbId,
        success: bool,
        failure_note: Option<&str>,
    ) -> Result<Option<DeliveryOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let schedule = if success {
            let query = format!(
                "UPDATE schedules SET status = 'completed', updated_at = NOW()
                 WHERE project_id = $1 AND status = 'scheduled'
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, Schedule>(&query)
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?
        } else {
            // Append the failure reason below any prior notes.
            let query = format!(
                "UPDATE schedules SET
                    status = 'pending_reschedule',
                    notes = CASE
                        WHEN notes IS NULL OR btrim(notes) = '' THEN $2
                        ELSE notes || E'\\n' || $2
                    END,
                    updated_at = NOW()
                 WHERE project_id = $1 AND status = 'scheduled'
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, Schedule>(&query)
                .bind(project_id)
                .bind(failure_note.unwrap_or_default())
                .fetch_optional(&mut *tx)
                .await?
        };

        let Some(schedule) = schedule else {
            // Wrong state or missing appointment; nothing was written.
            return Ok(None);
        };

        let mut project_finished = false;
        if success {
            let updated = sqlx::query(
                "UPDATE projects SET \
                    status = 'finished', progress = 100, completed_at = NOW(), \
                    updated_at = NOW() \
                 WHERE id = $1 AND status <> 'finished'",
            )
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
            project_finished = updated.rows_affected() > 0;

            sqlx::query(
                "UPDATE budgets SET status = 'completed', updated_at = NOW() \
                 WHERE project_id = $1 AND status = 'final_payment_paid'",
            )
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        } else {
            // Undo the implicit "ready to deliver" assumption.
            sqlx::query(
                "UPDATE budgets SET status = 'final_payment_paid', updated_at = NOW() \
                 WHERE project_id = $1 AND status = 'completed'",
            )
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(DeliveryOutcome {
            schedule,
            project_finished,
        }))
    }
}
