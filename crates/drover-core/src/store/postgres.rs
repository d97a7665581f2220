// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL job store.
//!
//! Free functions over `&PgPool` do the actual work; [`JobStore`] is a thin
//! facade that owns the pool. Multi-row mutations run in a single
//! transaction. Listing, searching, and counting share one WHERE-clause
//! builder so a count with a filter always agrees with the list it pairs
//! with.

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::events;
use crate::model::{
    Job, JobResubmitRecord, JobStatus, truncate_message,
};
use crate::search::{
    CompiledCondition, FilterNode, FilterValue, SearchOperator, resolve_column,
};
use crate::store::{JobListParams, JobSummary, ListMode, NewJob, OrderBy, SortDirection};

/// Full job projection, in [`Job`] field order.
const JOB_COLUMNS: &str = "id, uuid, tenant, owner, created_by, created_by_tenant, name, \
    description, status, last_message, visible, created, last_updated, ended, \
    app_id, app_version, job_type, \
    exec_system_id, exec_system_exec_dir, exec_system_input_dir, exec_system_output_dir, \
    exec_system_logical_queue, archive_system_id, archive_system_dir, dtn_system_id, \
    node_count, cores_per_node, memory_mb, max_minutes, \
    file_inputs, parameter_set, exec_system_constraints, subscriptions, tags, \
    is_mpi, mpi_cmd, shared_app_ctx, shared_app_ctx_attribs, \
    remote_job_id, remote_job_id2, remote_outcome, remote_queue, \
    remote_submitted, remote_started, remote_ended, \
    remote_checks_success, remote_checks_failed, remote_last_status_check, \
    blocked_count, input_transaction_id, archive_transaction_id";

/// Summary projection, in [`JobSummary`] field order.
const SUMMARY_COLUMNS: &str = "uuid, tenant, owner, name, status, app_id, app_version, \
    exec_system_id, archive_system_id, created, last_updated, ended, remote_started";

// ============================================================================
// Creation
// ============================================================================

/// Persist a new job, its resubmit payload, and its creation event in one
/// transaction.
///
/// The job starts in the initial status with `visible = true` and zeroed
/// counters. `job_definition` is the validated submission JSON, stored
/// verbatim for later byte-identical resubmission.
pub async fn create_job(pool: &PgPool, new_job: &NewJob, job_definition: &str) -> Result<Job> {
    new_job.validate()?;

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let insert = format!(
        r#"
        INSERT INTO jobs (
            uuid, tenant, owner, created_by, created_by_tenant, name, description,
            status, last_message, visible, created, last_updated, ended,
            app_id, app_version, job_type,
            exec_system_id, exec_system_exec_dir, exec_system_input_dir,
            exec_system_output_dir, exec_system_logical_queue,
            archive_system_id, archive_system_dir, dtn_system_id,
            node_count, cores_per_node, memory_mb, max_minutes,
            file_inputs, parameter_set, exec_system_constraints, subscriptions, tags,
            is_mpi, mpi_cmd, shared_app_ctx, shared_app_ctx_attribs,
            remote_checks_success, remote_checks_failed, blocked_count
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            $8, NULL, TRUE, $9, $9, NULL,
            $10, $11, $12,
            $13, $14, $15, $16, $17,
            $18, $19, $20,
            $21, $22, $23, $24,
            $25, $26, $27, $28, $29,
            $30, $31, $32, $33,
            0, 0, 0
        )
        RETURNING {JOB_COLUMNS}
        "#
    );

    let job: Job = sqlx::query_as(&insert)
        .bind(new_job.uuid)
        .bind(&new_job.tenant)
        .bind(&new_job.owner)
        .bind(&new_job.created_by)
        .bind(&new_job.created_by_tenant)
        .bind(&new_job.name)
        .bind(&new_job.description)
        .bind(JobStatus::INITIAL.as_str())
        .bind(now)
        .bind(&new_job.app_id)
        .bind(&new_job.app_version)
        .bind(new_job.job_type.as_str())
        .bind(&new_job.exec_system_id)
        .bind(&new_job.exec_system_exec_dir)
        .bind(&new_job.exec_system_input_dir)
        .bind(&new_job.exec_system_output_dir)
        .bind(&new_job.exec_system_logical_queue)
        .bind(&new_job.archive_system_id)
        .bind(&new_job.archive_system_dir)
        .bind(&new_job.dtn_system_id)
        .bind(new_job.node_count)
        .bind(new_job.cores_per_node)
        .bind(new_job.memory_mb)
        .bind(new_job.max_minutes)
        .bind(&new_job.file_inputs)
        .bind(&new_job.parameter_set)
        .bind(&new_job.exec_system_constraints)
        .bind(&new_job.subscriptions)
        .bind(&new_job.tags)
        .bind(new_job.is_mpi)
        .bind(&new_job.mpi_cmd)
        .bind(new_job.shared_app_ctx)
        .bind(&new_job.shared_app_ctx_attribs)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO job_resubmit (job_uuid, job_definition)
        VALUES ($1, $2)
        "#,
    )
    .bind(new_job.uuid)
    .bind(job_definition)
    .execute(&mut *tx)
    .await?;

    events::record_creation_event(&mut *tx, new_job.uuid).await?;

    tx.commit().await?;
    Ok(job)
}

// ============================================================================
// Retrieval
// ============================================================================

/// Fetch a job by its caller-stable uuid, scoped to a tenant.
pub async fn get_job_by_uuid(pool: &PgPool, tenant: &str, job_uuid: Uuid) -> Result<Job> {
    let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE tenant = $1 AND uuid = $2");
    sqlx::query_as(&query)
        .bind(tenant)
        .bind(job_uuid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| JobsError::NotFound {
            entity: "job",
            id: job_uuid.to_string(),
        })
}

/// Fetch a job by its store-assigned numeric id.
pub async fn get_job_by_id(pool: &PgPool, id: i64) -> Result<Job> {
    let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
    sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| JobsError::NotFound {
            entity: "job",
            id: id.to_string(),
        })
}

/// Lightweight status probe: fetch only the status column and parse it.
pub async fn get_job_status(pool: &PgPool, tenant: &str, job_uuid: Uuid) -> Result<JobStatus> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM jobs WHERE tenant = $1 AND uuid = $2")
            .bind(tenant)
            .bind(job_uuid)
            .fetch_optional(pool)
            .await?;
    match status {
        Some(status) => status.parse(),
        None => Err(JobsError::NotFound {
            entity: "job",
            id: job_uuid.to_string(),
        }),
    }
}

/// Fetch the stored resubmit payload for a job.
pub async fn get_resubmit(pool: &PgPool, job_uuid: Uuid) -> Result<JobResubmitRecord> {
    sqlx::query_as::<_, JobResubmitRecord>(
        "SELECT id, job_uuid, job_definition FROM job_resubmit WHERE job_uuid = $1",
    )
    .bind(job_uuid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| JobsError::NotFound {
        entity: "resubmit record",
        id: job_uuid.to_string(),
    })
}

// ============================================================================
// Listing and search
// ============================================================================

/// List full job rows matching the parameters.
pub async fn list_jobs(pool: &PgPool, params: &JobListParams) -> Result<Vec<Job>> {
    let order = validate_order_by(&params.order_by)?;
    let mut qb = QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE "));
    push_scope(&mut qb, params);
    push_filter_clause(&mut qb, params.filter.as_ref());
    push_order(&mut qb, &order);
    push_page(&mut qb, params.limit, params.skip);
    let rows = qb.build_query_as::<Job>().fetch_all(pool).await?;
    Ok(rows)
}

/// List summary projections matching the parameters.
pub async fn list_job_summaries(pool: &PgPool, params: &JobListParams) -> Result<Vec<JobSummary>> {
    let order = validate_order_by(&params.order_by)?;
    let mut qb = QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM jobs WHERE "));
    push_scope(&mut qb, params);
    push_filter_clause(&mut qb, params.filter.as_ref());
    push_order(&mut qb, &order);
    push_page(&mut qb, params.limit, params.skip);
    let rows = qb.build_query_as::<JobSummary>().fetch_all(pool).await?;
    Ok(rows)
}

/// Count jobs matching the parameters, ignoring pagination and ordering.
///
/// Uses the identical scope and filter rendering as the listing queries, so
/// a count always matches the length of the corresponding unlimited list.
pub async fn count_jobs(pool: &PgPool, params: &JobListParams) -> Result<i64> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs WHERE ");
    push_scope(&mut qb, params);
    push_filter_clause(&mut qb, params.filter.as_ref());
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Resolve each requested order attribute against the searchable column set.
fn validate_order_by(order_by: &[OrderBy]) -> Result<Vec<(&'static str, SortDirection)>> {
    order_by
        .iter()
        .map(|o| Ok((resolve_column(&o.attribute)?.name, o.direction)))
        .collect()
}

/// Render the boundary condition for the listing mode.
fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, params: &JobListParams) {
    qb.push("tenant = ").push_bind(params.tenant.clone());
    match params.mode {
        ListMode::Owner => {
            qb.push(" AND owner = ").push_bind(params.user.clone());
            if !params.include_hidden {
                qb.push(" AND visible = TRUE");
            }
        }
        // Shared-with-me drops the owner filter entirely: the boundary is the
        // tenant plus visibility, and per-resource access is checked against
        // the grant ledger when a specific job is touched.
        ListMode::SharedWithMe => {
            qb.push(" AND visible = TRUE");
        }
    }
}

fn push_filter_clause(qb: &mut QueryBuilder<'_, Postgres>, filter: Option<&FilterNode>) {
    if let Some(node) = filter {
        qb.push(" AND ");
        push_filter(qb, node);
    }
}

/// Render a predicate tree. Every value goes through a bound parameter; the
/// only interpolated identifiers are the validated static column names.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, node: &FilterNode) {
    match node {
        FilterNode::And(left, right) => {
            qb.push("(");
            push_filter(qb, left);
            qb.push(" AND ");
            push_filter(qb, right);
            qb.push(")");
        }
        FilterNode::Or(left, right) => {
            qb.push("(");
            push_filter(qb, left);
            qb.push(" OR ");
            push_filter(qb, right);
            qb.push(")");
        }
        FilterNode::Cond(cond) => push_condition(qb, cond),
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FilterValue::Int(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Bool(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Timestamp(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Uuid(v) => {
            qb.push_bind(*v);
        }
    }
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, cond: &CompiledCondition) {
    let col = cond.column.name;
    match cond.op {
        SearchOperator::Eq
        | SearchOperator::Neq
        | SearchOperator::Lt
        | SearchOperator::Lte
        | SearchOperator::Gt
        | SearchOperator::Gte => {
            let sql_op = match cond.op {
                SearchOperator::Eq => "=",
                SearchOperator::Neq => "<>",
                SearchOperator::Lt => "<",
                SearchOperator::Lte => "<=",
                SearchOperator::Gt => ">",
                _ => ">=",
            };
            qb.push(col).push(" ").push(sql_op).push(" ");
            push_value(qb, &cond.values[0]);
        }
        SearchOperator::Like | SearchOperator::Nlike => {
            qb.push(col);
            qb.push(if cond.op == SearchOperator::Like {
                " LIKE "
            } else {
                " NOT LIKE "
            });
            push_value(qb, &cond.values[0]);
        }
        SearchOperator::Between | SearchOperator::Nbetween => {
            qb.push(col);
            qb.push(if cond.op == SearchOperator::Between {
                " BETWEEN "
            } else {
                " NOT BETWEEN "
            });
            push_value(qb, &cond.values[0]);
            qb.push(" AND ");
            push_value(qb, &cond.values[1]);
        }
        SearchOperator::In | SearchOperator::Nin => {
            qb.push(col);
            qb.push(if cond.op == SearchOperator::In {
                " IN ("
            } else {
                " NOT IN ("
            });
            let mut first = true;
            for value in &cond.values {
                if !first {
                    qb.push(", ");
                }
                first = false;
                push_value(qb, value);
            }
            qb.push(")");
        }
        SearchOperator::Contains | SearchOperator::Ncontains => {
            // Array overlap against a single bound text[] parameter.
            let items: Vec<String> = cond
                .values
                .iter()
                .filter_map(|v| match v {
                    FilterValue::Text(t) => Some(t.clone()),
                    _ => None,
                })
                .collect();
            if cond.op == SearchOperator::Ncontains {
                qb.push("NOT (");
            }
            qb.push(col).push(" && ").push_bind(items);
            if cond.op == SearchOperator::Ncontains {
                qb.push(")");
            }
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[(&'static str, SortDirection)]) {
    qb.push(" ORDER BY ");
    if order.is_empty() {
        qb.push("last_updated DESC");
        return;
    }
    let mut first = true;
    for (col, direction) in order {
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(*col).push(" ").push(direction.as_sql());
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, limit: i64, skip: i64) {
    if limit >= 0 {
        qb.push(" LIMIT ").push_bind(limit);
    }
    qb.push(" OFFSET ").push_bind(skip.max(0));
}

// ============================================================================
// Targeted field updates
// ============================================================================

/// Record the primary remote scheduler id and the submission time.
pub async fn set_remote_job_id(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    remote_job_id: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET remote_job_id = $1,
            remote_submitted = COALESCE(remote_submitted, $2),
            last_updated = $2
        WHERE tenant = $3 AND uuid = $4
        "#,
    )
    .bind(remote_job_id)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Record the remote scheduler queue the job landed in.
pub async fn set_remote_queue(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    remote_queue: &str,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE jobs SET remote_queue = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(remote_queue)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Record the secondary remote id (e.g. the pid of a forked job).
pub async fn set_remote_job_id2(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    remote_job_id2: &str,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE jobs SET remote_job_id2 = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(remote_job_id2)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Record the remote scheduler's reported outcome and end time.
pub async fn set_remote_outcome(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    outcome: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET remote_outcome = $1,
            remote_ended = COALESCE(remote_ended, $2),
            last_updated = $2
        WHERE tenant = $3 AND uuid = $4
        "#,
    )
    .bind(outcome)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Record a remote status-check attempt, bumping the matching counter.
pub async fn record_remote_status_check(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    success: bool,
) -> Result<()> {
    let query = if success {
        r#"
        UPDATE jobs
        SET remote_checks_success = remote_checks_success + 1,
            remote_last_status_check = $1,
            last_updated = $1
        WHERE tenant = $2 AND uuid = $3
        "#
    } else {
        r#"
        UPDATE jobs
        SET remote_checks_failed = remote_checks_failed + 1,
            remote_last_status_check = $1,
            last_updated = $1
        WHERE tenant = $2 AND uuid = $3
        "#
    };
    let result = sqlx::query(query)
        .bind(Utc::now())
        .bind(tenant)
        .bind(job_uuid)
        .execute(pool)
        .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Record the input-staging transfer id and its progress event in one
/// transaction.
pub async fn set_input_transaction_id(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    transaction_id: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE jobs SET input_transaction_id = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(transaction_id)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(&mut *tx)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)?;

    let description = format!("Input staging transfer assigned id {}", transaction_id);
    events::record_event(
        &mut *tx,
        job_uuid,
        crate::model::JobEventType::JobInputTransactionId,
        &description,
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Record the archiving transfer id and its progress event in one transaction.
pub async fn set_archive_transaction_id(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    transaction_id: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE jobs SET archive_transaction_id = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(transaction_id)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(&mut *tx)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)?;

    let description = format!("Archive transfer assigned id {}", transaction_id);
    events::record_event(
        &mut *tx,
        job_uuid,
        crate::model::JobEventType::JobArchiveTransactionId,
        &description,
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Flip the soft-hide flag. Jobs are never physically deleted.
pub async fn set_visible(pool: &PgPool, tenant: &str, job_uuid: Uuid, visible: bool) -> Result<()> {
    let result = sqlx::query(
        "UPDATE jobs SET visible = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(visible)
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

/// Update the last status message without changing the status itself.
pub async fn set_last_message(
    pool: &PgPool,
    tenant: &str,
    job_uuid: Uuid,
    message: &str,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE jobs SET last_message = $1, last_updated = $2 WHERE tenant = $3 AND uuid = $4",
    )
    .bind(truncate_message(message))
    .bind(Utc::now())
    .bind(tenant)
    .bind(job_uuid)
    .execute(pool)
    .await?;
    require_job_row(result.rows_affected(), job_uuid)
}

fn require_job_row(rows_affected: u64, job_uuid: Uuid) -> Result<()> {
    if rows_affected == 0 {
        return Err(JobsError::NotFound {
            entity: "job",
            id: job_uuid.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Facade
// ============================================================================

/// Pool-owning facade over the free store functions.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that compose their own transactions.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// See [`create_job`].
    pub async fn create_job(&self, new_job: &NewJob, job_definition: &str) -> Result<Job> {
        create_job(&self.pool, new_job, job_definition).await
    }

    /// See [`get_job_by_uuid`].
    pub async fn get_job_by_uuid(&self, tenant: &str, job_uuid: Uuid) -> Result<Job> {
        get_job_by_uuid(&self.pool, tenant, job_uuid).await
    }

    /// See [`get_job_by_id`].
    pub async fn get_job_by_id(&self, id: i64) -> Result<Job> {
        get_job_by_id(&self.pool, id).await
    }

    /// See [`get_job_status`].
    pub async fn get_job_status(&self, tenant: &str, job_uuid: Uuid) -> Result<JobStatus> {
        get_job_status(&self.pool, tenant, job_uuid).await
    }

    /// See [`get_resubmit`].
    pub async fn get_resubmit(&self, job_uuid: Uuid) -> Result<JobResubmitRecord> {
        get_resubmit(&self.pool, job_uuid).await
    }

    /// See [`list_jobs`].
    pub async fn list_jobs(&self, params: &JobListParams) -> Result<Vec<Job>> {
        list_jobs(&self.pool, params).await
    }

    /// See [`list_job_summaries`].
    pub async fn list_job_summaries(&self, params: &JobListParams) -> Result<Vec<JobSummary>> {
        list_job_summaries(&self.pool, params).await
    }

    /// See [`count_jobs`].
    pub async fn count_jobs(&self, params: &JobListParams) -> Result<i64> {
        count_jobs(&self.pool, params).await
    }

    /// See [`set_remote_job_id`].
    pub async fn set_remote_job_id(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        remote_job_id: &str,
    ) -> Result<()> {
        set_remote_job_id(&self.pool, tenant, job_uuid, remote_job_id).await
    }

    /// See [`set_remote_queue`].
    pub async fn set_remote_queue(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        remote_queue: &str,
    ) -> Result<()> {
        set_remote_queue(&self.pool, tenant, job_uuid, remote_queue).await
    }

    /// See [`set_remote_job_id2`].
    pub async fn set_remote_job_id2(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        remote_job_id2: &str,
    ) -> Result<()> {
        set_remote_job_id2(&self.pool, tenant, job_uuid, remote_job_id2).await
    }

    /// See [`set_remote_outcome`].
    pub async fn set_remote_outcome(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        outcome: &str,
    ) -> Result<()> {
        set_remote_outcome(&self.pool, tenant, job_uuid, outcome).await
    }

    /// See [`record_remote_status_check`].
    pub async fn record_remote_status_check(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        success: bool,
    ) -> Result<()> {
        record_remote_status_check(&self.pool, tenant, job_uuid, success).await
    }

    /// See [`set_input_transaction_id`].
    pub async fn set_input_transaction_id(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        transaction_id: &str,
    ) -> Result<()> {
        set_input_transaction_id(&self.pool, tenant, job_uuid, transaction_id).await
    }

    /// See [`set_archive_transaction_id`].
    pub async fn set_archive_transaction_id(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        transaction_id: &str,
    ) -> Result<()> {
        set_archive_transaction_id(&self.pool, tenant, job_uuid, transaction_id).await
    }

    /// See [`set_visible`].
    pub async fn set_visible(&self, tenant: &str, job_uuid: Uuid, visible: bool) -> Result<()> {
        set_visible(&self.pool, tenant, job_uuid, visible).await
    }

    /// See [`set_last_message`].
    pub async fn set_last_message(&self, tenant: &str, job_uuid: Uuid, message: &str) -> Result<()> {
        set_last_message(&self.pool, tenant, job_uuid, message).await
    }
}
