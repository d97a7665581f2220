// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transactional status transitions.
//!
//! [`transition`] is the only code path that changes a job's status. It
//! locks the row, validates the edge against the state machine in
//! [`crate::status`], applies the write-once timestamp rules, bumps the
//! blocked counter, and records the audit event, all in one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::events;
use crate::model::{Job, JobStatus, truncate_message};
use crate::status::is_legal_transition;

/// The committed result of a status transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The job that transitioned.
    pub job_uuid: Uuid,
    /// Status before the transition.
    pub previous: JobStatus,
    /// Status after the transition.
    pub current: JobStatus,
    /// The truncated status message stored with the transition.
    pub message: Option<String>,
    /// New `last_updated` stamp.
    pub last_updated: DateTime<Utc>,
    /// Terminal stamp after the transition (unchanged if already set).
    pub ended: Option<DateTime<Utc>>,
    /// Remote start stamp after the transition (unchanged if already set).
    pub remote_started: Option<DateTime<Utc>>,
    /// Blocked counter after the transition.
    pub blocked_count: i32,
}

impl TransitionOutcome {
    /// Fold the committed transition into an in-memory job row.
    pub fn apply_to(&self, job: &mut Job) {
        job.status = self.current.as_str().to_string();
        job.last_message = self.message.clone();
        job.last_updated = self.last_updated;
        job.ended = self.ended;
        job.remote_started = self.remote_started;
        job.blocked_count = self.blocked_count;
    }
}

#[derive(sqlx::FromRow)]
struct LockedJobRow {
    id: i64,
    status: String,
    blocked_count: i32,
    remote_started: Option<DateTime<Utc>>,
    ended: Option<DateTime<Utc>>,
}

/// Atomically move a job to `new_status`.
///
/// The update is guarded on the status value read under the row lock, so a
/// concurrent writer that slips in between produces [`JobsError::ConcurrentUpdate`]
/// rather than a lost update. Rules applied on the way through:
///
/// - the edge must be legal per [`is_legal_transition`]
/// - `ended` is stamped on the first entry into a terminal status, never
///   overwritten
/// - `remote_started` is stamped on the first entry into RUNNING, never
///   overwritten
/// - `blocked_count` increments only when entering BLOCKED from a different
///   status; BLOCKED re-entry is a legal no-increment transition
/// - the message is truncated to [`crate::model::MAX_LAST_MESSAGE_LEN`]
/// - a `JOB_NEW_STATUS` event commits with the transition or not at all
#[instrument(skip(pool, message), fields(job_uuid = %job_uuid, to = new_status.as_str()))]
pub async fn transition(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    new_status: JobStatus,
    message: Option<&str>,
) -> Result<TransitionOutcome> {
    let mut tx = pool.begin().await?;

    let row: Option<LockedJobRow> = sqlx::query_as(
        r#"
        SELECT id, status, blocked_count, remote_started, ended
        FROM jobs
        WHERE tenant = $1 AND uuid = $2
        FOR UPDATE
        "#,
    )
    .bind(tenant)
    .bind(job_uuid)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Err(JobsError::NotFound {
            entity: "job",
            id: job_uuid.to_string(),
        });
    };

    let previous: JobStatus = row.status.parse()?;
    if !is_legal_transition(previous, new_status) {
        return Err(JobsError::IllegalTransition {
            job_uuid: job_uuid.to_string(),
            from: previous.as_str().to_string(),
            to: new_status.as_str().to_string(),
        });
    }

    let now = Utc::now();
    let message = message.map(truncate_message);

    let blocked_count = if new_status == JobStatus::Blocked && previous != JobStatus::Blocked {
        row.blocked_count + 1
    } else {
        row.blocked_count
    };
    let remote_started = match (new_status, row.remote_started) {
        (JobStatus::Running, None) => Some(now),
        (_, existing) => existing,
    };
    let ended = match (new_status.is_terminal(), row.ended) {
        (true, None) => Some(now),
        (_, existing) => existing,
    };

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1,
            last_message = $2,
            last_updated = $3,
            blocked_count = $4,
            remote_started = $5,
            ended = $6
        WHERE id = $7 AND status = $8
        "#,
    )
    .bind(new_status.as_str())
    .bind(&message)
    .bind(now)
    .bind(blocked_count)
    .bind(remote_started)
    .bind(ended)
    .bind(row.id)
    .bind(previous.as_str())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() != 1 {
        return Err(JobsError::ConcurrentUpdate {
            entity: "job",
            id: job_uuid.to_string(),
        });
    }

    events::record_status_event(&mut *tx, job_uuid, previous, new_status, message.as_deref())
        .await?;

    tx.commit().await?;

    tracing::debug!(
        from = previous.as_str(),
        to = new_status.as_str(),
        "job status transition committed"
    );

    Ok(TransitionOutcome {
        job_uuid,
        previous,
        current: new_status,
        message,
        last_updated: now,
        ended,
        remote_started,
        blocked_count,
    })
}
