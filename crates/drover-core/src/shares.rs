// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sharing ledger: per-resource grants on jobs.
//!
//! A grant gives one user read access to one resource category of one job.
//! Grants are idempotent upserts keyed by
//! `(tenant, job_uuid, grantee, job_resource, job_permission)`; regranting
//! refreshes `last_updated` instead of duplicating the row.

use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::events;
use crate::model::{JobEventType, JobPermission, JobResource, JobSharedRecord};

/// A grant request.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// Tenant isolation boundary.
    pub tenant: String,
    /// User granting access (the job owner or creator).
    pub grantor: String,
    /// The job being shared.
    pub job_uuid: Uuid,
    /// User receiving access.
    pub grantee: String,
    /// Resource category shared.
    pub job_resource: JobResource,
    /// Permission granted.
    pub job_permission: JobPermission,
}

/// Create or refresh a grant, recording a share event in the same
/// transaction.
#[instrument(skip(pool, share), fields(job_uuid = %share.job_uuid, grantee = %share.grantee))]
pub async fn create_share(pool: &PgPool, share: &NewShare) -> Result<JobSharedRecord> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let record: JobSharedRecord = sqlx::query_as(
        r#"
        INSERT INTO job_shared (
            tenant, grantor, job_uuid, grantee, job_resource, job_permission,
            created, last_updated
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        ON CONFLICT (tenant, job_uuid, grantee, job_resource, job_permission)
        DO UPDATE SET grantor = EXCLUDED.grantor, last_updated = EXCLUDED.last_updated
        RETURNING id, tenant, grantor, job_uuid, grantee, job_resource, job_permission,
                  created, last_updated
        "#,
    )
    .bind(&share.tenant)
    .bind(&share.grantor)
    .bind(share.job_uuid)
    .bind(&share.grantee)
    .bind(share.job_resource.as_str())
    .bind(share.job_permission.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let description = format!(
        "Granted {} {} on {} to {}",
        share.job_permission.as_str(),
        share.job_resource.as_str(),
        share.job_uuid,
        share.grantee
    );
    events::record_event(
        &mut *tx,
        share.job_uuid,
        JobEventType::JobShareEvent,
        &description,
        None,
    )
    .await?;

    tx.commit().await?;
    Ok(record)
}

/// Whether `grantee` holds a grant on the given resource of the job with the
/// given permission.
pub async fn is_shared(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    grantee: &str,
    resource: JobResource,
    permission: JobPermission,
) -> Result<bool> {
    let shared: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM job_shared
            WHERE tenant = $1 AND job_uuid = $2 AND grantee = $3
              AND job_resource = $4 AND job_permission = $5
        )
        "#,
    )
    .bind(tenant)
    .bind(job_uuid)
    .bind(grantee)
    .bind(resource.as_str())
    .bind(permission.as_str())
    .fetch_one(pool)
    .await?;
    Ok(shared)
}

/// List all grants on a job.
pub async fn list_shares_for_job(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
) -> Result<Vec<JobSharedRecord>> {
    let rows = sqlx::query_as::<_, JobSharedRecord>(
        r#"
        SELECT id, tenant, grantor, job_uuid, grantee, job_resource, job_permission,
               created, last_updated
        FROM job_shared
        WHERE tenant = $1 AND job_uuid = $2
        ORDER BY grantee ASC, job_resource ASC
        "#,
    )
    .bind(tenant)
    .bind(job_uuid)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Revoke all of a grantee's grants on a job, recording a share event in the
/// same transaction.
///
/// Returns the number of grants removed; revoking a grantee with no grants
/// is a [`JobsError::NotFound`].
#[instrument(skip(pool), fields(job_uuid = %job_uuid, grantee = %grantee))]
pub async fn delete_shares_for_grantee(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    grantee: &str,
) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "DELETE FROM job_shared WHERE tenant = $1 AND job_uuid = $2 AND grantee = $3",
    )
    .bind(tenant)
    .bind(job_uuid)
    .bind(grantee)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(JobsError::NotFound {
            entity: "share grant",
            id: format!("{}/{}", job_uuid, grantee),
        });
    }

    let description = format!("Revoked access to {} from {}", job_uuid, grantee);
    events::record_event(
        &mut *tx,
        job_uuid,
        JobEventType::JobShareEvent,
        &description,
        None,
    )
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}
