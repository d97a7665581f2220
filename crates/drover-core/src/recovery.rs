// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blocked-job recovery: deduplicated failure conditions with back-off.
//!
//! Jobs that hit a recoverable failure are attached to a recovery record
//! keyed by `(tenant, tester_hash)`. Many jobs blocked on the same
//! condition share one record, so the condition is probed once per back-off
//! interval no matter how many jobs are waiting on it. The hash is a
//! deterministic digest of the tester parameters, independent of the order
//! they were supplied in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::events;
use crate::model::{
    JobBlockedRecord, JobEventType, JobRecoveryRecord, JobRecoveryWithBlocked, JobStatus,
    truncate_message,
};

/// A job's recoverable-failure report, ready to attach to a recovery record.
#[derive(Debug, Clone)]
pub struct RecoverableJob {
    /// Tenant isolation boundary.
    pub tenant: String,
    /// The job that blocked.
    pub job_uuid: Uuid,
    /// Classifies why recovery is needed.
    pub condition_code: String,
    /// Tester implementation that probes whether the condition cleared.
    pub tester_type: String,
    /// Tester parameters; also the dedup identity via [`tester_hash`].
    pub tester_parms: BTreeMap<String, String>,
    /// Back-off policy implementation.
    pub policy_type: String,
    /// Policy parameters as JSON.
    pub policy_parms: serde_json::Value,
    /// Status to restore the job to when the condition clears.
    pub success_status: JobStatus,
    /// Message describing the failure.
    pub status_message: String,
}

/// Deterministic digest of tester parameters.
///
/// A `BTreeMap` iterates in key order, so two parameter sets with the same
/// entries hash identically regardless of insertion order. The digest is
/// over `key=value` lines, hex-encoded.
pub fn tester_hash(parms: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in parms {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Attach a blocked job to its recovery record, creating the record if this
/// is the first job to hit the condition.
///
/// Dedup is two-level and idempotent: the record is unique per
/// `(tenant, tester_hash)` and the attachment is unique per
/// `(recovery_id, job_uuid)`. Reporting the same job against the same
/// condition twice touches nothing and logs a warning. Returns the recovery
/// record id.
#[instrument(skip(pool, report), fields(tenant = %report.tenant, job_uuid = %report.job_uuid))]
pub async fn record_recoverable(pool: &PgPool, report: &RecoverableJob) -> Result<i64> {
    let hash = tester_hash(&report.tester_parms);
    let tester_parms = serde_json::to_value(&report.tester_parms)?;
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    // Lock the condition's record if it exists so two reporters of the same
    // condition serialize instead of double-inserting.
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM job_recovery WHERE tenant = $1 AND tester_hash = $2 FOR UPDATE",
    )
    .bind(&report.tenant)
    .bind(&hash)
    .fetch_optional(&mut *tx)
    .await?;

    let recovery_id = match existing {
        Some(id) => {
            sqlx::query("UPDATE job_recovery SET last_updated = $1 WHERE id = $2")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            id
        }
        None => {
            sqlx::query_scalar(
                r#"
                INSERT INTO job_recovery (
                    tenant, condition_code, tester_type, tester_parms,
                    policy_type, policy_parms, num_attempts, next_attempt,
                    created, last_updated, tester_hash
                )
                VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $7, $7, $8)
                RETURNING id
                "#,
            )
            .bind(&report.tenant)
            .bind(&report.condition_code)
            .bind(&report.tester_type)
            .bind(&tester_parms)
            .bind(&report.policy_type)
            .bind(&report.policy_parms)
            .bind(now)
            .bind(&hash)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    if recovery_id <= 0 {
        return Err(JobsError::CorruptRecoveryState {
            tenant: report.tenant.clone(),
            tester_hash: hash,
        });
    }

    let attached = sqlx::query(
        r#"
        INSERT INTO job_blocked (recovery_id, created, success_status, job_uuid, status_message)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (recovery_id, job_uuid) DO NOTHING
        "#,
    )
    .bind(recovery_id)
    .bind(now)
    .bind(report.success_status.as_str())
    .bind(report.job_uuid)
    .bind(truncate_message(&report.status_message))
    .execute(&mut *tx)
    .await?;

    if attached.rows_affected() == 0 {
        tracing::warn!(
            recovery_id,
            job_uuid = %report.job_uuid,
            "job already attached to recovery record, ignoring duplicate report"
        );
    } else {
        let description = format!(
            "Job blocked on condition {} (recovery record {})",
            report.condition_code, recovery_id
        );
        events::record_event(
            &mut *tx,
            report.job_uuid,
            JobEventType::JobBlockedEvent,
            &description,
            None,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(recovery_id)
}

/// Advance a recovery record's attempt counter and schedule the next probe.
///
/// The update is guarded on the attempt count the caller observed, so two
/// recovery workers racing on the same record cannot both claim an attempt.
pub async fn update_attempts(
    pool: &PgPool,
    recovery_id: i64,
    observed_attempts: i32,
    next_attempt: DateTime<Utc>,
) -> Result<i32> {
    let result = sqlx::query(
        r#"
        UPDATE job_recovery
        SET num_attempts = $1, next_attempt = $2, last_updated = $3
        WHERE id = $4 AND num_attempts = $5
        "#,
    )
    .bind(observed_attempts + 1)
    .bind(next_attempt)
    .bind(Utc::now())
    .bind(recovery_id)
    .bind(observed_attempts)
    .execute(pool)
    .await?;

    if result.rows_affected() != 1 {
        return Err(JobsError::ConcurrentUpdate {
            entity: "recovery record",
            id: recovery_id.to_string(),
        });
    }
    Ok(observed_attempts + 1)
}

/// Delete a recovery record and return the blocked jobs it released.
///
/// Scoped to the tenant: a record id from another tenant is NotFound. The
/// blocked rows cascade-delete with the record; they are read first in the
/// same transaction so the caller can resume each job to its
/// `success_status`.
pub async fn delete_job_recovery(
    pool: &PgPool,
    tenant: &str,
    recovery_id: i64,
) -> Result<Vec<JobBlockedRecord>> {
    let mut tx = pool.begin().await?;

    let blocked = sqlx::query_as::<_, JobBlockedRecord>(
        r#"
        SELECT b.id, b.recovery_id, b.created, b.success_status, b.job_uuid, b.status_message
        FROM job_blocked b
        JOIN job_recovery r ON r.id = b.recovery_id
        WHERE b.recovery_id = $1 AND r.tenant = $2
        ORDER BY b.id ASC
        "#,
    )
    .bind(recovery_id)
    .bind(tenant)
    .fetch_all(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM job_recovery WHERE id = $1 AND tenant = $2")
        .bind(recovery_id)
        .bind(tenant)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(JobsError::NotFound {
            entity: "recovery record",
            id: recovery_id.to_string(),
        });
    }

    tx.commit().await?;
    Ok(blocked)
}

/// List a tenant's recovery records with their blocked jobs, soonest probe
/// first.
pub async fn get_recovery_jobs(pool: &PgPool, tenant: &str) -> Result<Vec<JobRecoveryWithBlocked>> {
    let records = sqlx::query_as::<_, JobRecoveryRecord>(
        r#"
        SELECT id, tenant, condition_code, tester_type, tester_parms,
               policy_type, policy_parms, num_attempts, next_attempt,
               created, last_updated, tester_hash
        FROM job_recovery
        WHERE tenant = $1
        ORDER BY next_attempt ASC
        "#,
    )
    .bind(tenant)
    .fetch_all(pool)
    .await?;

    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let blocked_rows = sqlx::query_as::<_, JobBlockedRecord>(
        r#"
        SELECT id, recovery_id, created, success_status, job_uuid, status_message
        FROM job_blocked
        WHERE recovery_id = ANY($1)
        ORDER BY id ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<JobRecoveryWithBlocked> = records
        .into_iter()
        .map(|recovery| JobRecoveryWithBlocked {
            recovery,
            blocked: Vec::new(),
        })
        .collect();
    for row in blocked_rows {
        if let Some(group) = grouped.iter_mut().find(|g| g.recovery.id == row.recovery_id) {
            group.blocked.push(row);
        }
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tester_hash_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("system".to_string(), "hpc-1".to_string());
        a.insert("queue".to_string(), "normal".to_string());

        let mut b = BTreeMap::new();
        b.insert("queue".to_string(), "normal".to_string());
        b.insert("system".to_string(), "hpc-1".to_string());

        assert_eq!(tester_hash(&a), tester_hash(&b));
    }

    #[test]
    fn test_tester_hash_distinguishes_values() {
        let mut a = BTreeMap::new();
        a.insert("system".to_string(), "hpc-1".to_string());
        let mut b = BTreeMap::new();
        b.insert("system".to_string(), "hpc-2".to_string());
        assert_ne!(tester_hash(&a), tester_hash(&b));
    }

    #[test]
    fn test_tester_hash_key_value_boundary() {
        // "ab"="c" and "a"="bc" must not collide.
        let mut a = BTreeMap::new();
        a.insert("ab".to_string(), "c".to_string());
        let mut b = BTreeMap::new();
        b.insert("a".to_string(), "bc".to_string());
        assert_ne!(tester_hash(&a), tester_hash(&b));
    }

    #[test]
    fn test_tester_hash_empty() {
        let empty = BTreeMap::new();
        // SHA-256 of the empty input, stable by construction.
        assert_eq!(
            tester_hash(&empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
