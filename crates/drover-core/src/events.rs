// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Append-only job event recorder.
//!
//! Every significant job action leaves an immutable [`JobEventRecord`].
//! Insert functions take a `&mut PgConnection` so callers can record events
//! inside the same transaction that performs the mutation: the event commits
//! or rolls back with its cause, never on its own.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{JobEventRecord, JobEventType, JobStatus};

/// Record an event on the given connection.
///
/// Returns the stored record with its assigned id and creation time.
pub async fn record_event(
    conn: &mut PgConnection,
    job_uuid: Uuid,
    event_type: JobEventType,
    description: &str,
    other_uuid: Option<Uuid>,
) -> Result<JobEventRecord> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO job_events (job_uuid, other_uuid, event_type, description, created)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(job_uuid)
    .bind(other_uuid)
    .bind(event_type.as_str())
    .bind(description)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(JobEventRecord {
        id: Some(id),
        job_uuid,
        other_uuid,
        event_type: event_type.as_str().to_string(),
        description: description.to_string(),
        created: now,
    })
}

/// Record a status-transition event with the canonical description format.
pub async fn record_status_event(
    conn: &mut PgConnection,
    job_uuid: Uuid,
    previous: JobStatus,
    current: JobStatus,
    message: Option<&str>,
) -> Result<JobEventRecord> {
    let description = match message {
        Some(message) => format!(
            "Job status changed from {} to {}: {}",
            previous.as_str(),
            current.as_str(),
            message
        ),
        None => format!(
            "Job status changed from {} to {}",
            previous.as_str(),
            current.as_str()
        ),
    };
    record_event(conn, job_uuid, JobEventType::JobNewStatus, &description, None).await
}

/// Record the event marking a newly created job in its initial status.
pub async fn record_creation_event(
    conn: &mut PgConnection,
    job_uuid: Uuid,
) -> Result<JobEventRecord> {
    let description = format!("Job created in status {}", JobStatus::INITIAL.as_str());
    record_event(conn, job_uuid, JobEventType::JobNewStatus, &description, None).await
}

/// List a job's events in chronological order, oldest first.
///
/// `limit` follows the store convention: negative means unlimited, `0` is an
/// empty page. Negative `skip` is normalized to zero.
pub async fn list_job_events(
    pool: &PgPool,
    job_uuid: Uuid,
    limit: i64,
    skip: i64,
) -> Result<Vec<JobEventRecord>> {
    let skip = skip.max(0);
    let rows = if limit < 0 {
        sqlx::query_as::<_, JobEventRecord>(
            r#"
            SELECT id, job_uuid, other_uuid, event_type, description, created
            FROM job_events
            WHERE job_uuid = $1
            ORDER BY id ASC
            OFFSET $2
            "#,
        )
        .bind(job_uuid)
        .bind(skip)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, JobEventRecord>(
            r#"
            SELECT id, job_uuid, other_uuid, event_type, description, created
            FROM job_events
            WHERE job_uuid = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(job_uuid)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?
    };
    Ok(rows)
}

/// Count a job's events.
pub async fn count_job_events(pool: &PgPool, job_uuid: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_events WHERE job_uuid = $1")
        .bind(job_uuid)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
