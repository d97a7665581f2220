// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestration service: the operations a request layer calls.
//!
//! [`JobService`] composes the store, the state machine, the recovery
//! subsystem, and the sharing ledger behind one surface. The external seams
//! are traits: [`JobQueue`] hands accepted jobs to whatever executes them,
//! [`Notifier`] brokers event subscriptions, and [`ZombieAlerter`] is the
//! last-resort channel for jobs the service could neither start nor fail.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::events;
use crate::lifecycle::{self, TransitionOutcome};
use crate::model::{
    Job, JobEventRecord, JobPermission, JobResource, JobResubmitRecord, JobRecoveryWithBlocked,
    JobSharedRecord, JobStatus,
};
use crate::recovery::{self, RecoverableJob};
use crate::search::{QueryNode, compile_ast, compile_strings};
use crate::shares::{self, NewShare};
use crate::store::{JobListParams, JobStore, JobSummary, NewJob};

/// Hands accepted jobs to the execution side.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a freshly persisted job for processing.
    async fn enqueue(&self, job: &Job) -> anyhow::Result<()>;
}

/// Outbound seam to a notification service.
///
/// The service only brokers the subscription: it forwards the request and
/// hands the returned acknowledgment URL back to the caller. Delivery is
/// entirely the notification side's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Create a subscription on job events and return an acknowledgment URL.
    async fn create_subscription(
        &self,
        job_uuid: Uuid,
        event_type_filter: &str,
        delivery_target: &str,
    ) -> anyhow::Result<String>;
}

/// Last-resort notification channel.
///
/// Fired when a job could not be enqueued AND could not be moved to FAILED:
/// the job is alive in the store but nothing will ever process it. Alerting
/// must not itself fail the operation, so the method is infallible.
#[async_trait]
pub trait ZombieAlerter: Send + Sync {
    /// Report a job that is stranded in the store.
    async fn alert(&self, job_uuid: Uuid, detail: &str);
}

/// The orchestration service facade.
#[derive(Clone)]
pub struct JobService {
    store: JobStore,
    queue: Arc<dyn JobQueue>,
    alerter: Arc<dyn ZombieAlerter>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService")
            .field("store", &self.store)
            .field("queue", &"...")
            .field("alerter", &"...")
            .field("notifier", &self.notifier.as_ref().map(|_| "..."))
            .finish()
    }
}

impl JobService {
    /// Compose a service from its parts.
    pub fn new(store: JobStore, queue: Arc<dyn JobQueue>, alerter: Arc<dyn ZombieAlerter>) -> Self {
        Self {
            store,
            queue,
            alerter,
            notifier: None,
        }
    }

    /// Attach a notification seam. Without one, [`subscribe`] is rejected.
    ///
    /// [`subscribe`]: JobService::subscribe
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Validate, persist, and enqueue a new job.
    ///
    /// Persistence and enqueueing are deliberately not atomic: the queue is
    /// an external system. If the enqueue fails, the job is moved to FAILED
    /// so it does not linger in PENDING; if even that fails, the zombie
    /// alerter fires. The enqueue error is returned either way.
    #[instrument(skip(self, new_job, job_definition), fields(job_uuid = %new_job.uuid, tenant = %new_job.tenant))]
    pub async fn submit(&self, new_job: &NewJob, job_definition: &str) -> Result<Job> {
        let job = self.store.create_job(new_job, job_definition).await?;

        if let Err(enqueue_err) = self.queue.enqueue(&job).await {
            warn!(error = %enqueue_err, "enqueue failed, failing the job");
            let message = format!("Could not hand job to the execution queue: {}", enqueue_err);
            let failed = lifecycle::transition(
                self.store.pool(),
                &job.tenant,
                job.uuid,
                JobStatus::Failed,
                Some(&message),
            )
            .await;
            if let Err(transition_err) = failed {
                error!(
                    error = %transition_err,
                    "could not fail un-enqueued job, alerting"
                );
                self.alerter
                    .alert(job.uuid, "job persisted but neither enqueued nor failed")
                    .await;
            }
            return Err(JobsError::Store {
                operation: "enqueue".to_string(),
                details: enqueue_err.to_string(),
            });
        }

        Ok(job)
    }

    /// Fetch the stored resubmit payload: the submission JSON verbatim.
    pub async fn get_resubmit(&self, tenant: &str, job_uuid: Uuid) -> Result<JobResubmitRecord> {
        // Tenant check happens through the job lookup.
        self.store.get_job_by_uuid(tenant, job_uuid).await?;
        self.store.get_resubmit(job_uuid).await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Move a job to a new status through the state machine.
    pub async fn set_status(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        new_status: JobStatus,
        message: Option<&str>,
    ) -> Result<TransitionOutcome> {
        lifecycle::transition(self.store.pool(), tenant, job_uuid, new_status, message).await
    }

    /// Cancel a job.
    #[instrument(skip(self), fields(job_uuid = %job_uuid))]
    pub async fn cancel(&self, tenant: &str, job_uuid: Uuid) -> Result<TransitionOutcome> {
        lifecycle::transition(
            self.store.pool(),
            tenant,
            job_uuid,
            JobStatus::Cancelled,
            Some("Job cancelled by user request"),
        )
        .await
    }

    /// Lightweight status probe.
    pub async fn get_status(&self, tenant: &str, job_uuid: Uuid) -> Result<JobStatus> {
        self.store.get_job_status(tenant, job_uuid).await
    }

    /// Fetch a full job row.
    pub async fn get_job(&self, tenant: &str, job_uuid: Uuid) -> Result<Job> {
        self.store.get_job_by_uuid(tenant, job_uuid).await
    }

    /// Soft-hide a job from default listings.
    pub async fn hide(&self, tenant: &str, job_uuid: Uuid) -> Result<()> {
        self.store.set_visible(tenant, job_uuid, false).await
    }

    /// Undo a soft-hide.
    pub async fn unhide(&self, tenant: &str, job_uuid: Uuid) -> Result<()> {
        self.store.set_visible(tenant, job_uuid, true).await
    }

    // ========================================================================
    // Listing and search
    // ========================================================================

    /// List full job rows.
    pub async fn list_jobs(&self, params: &JobListParams) -> Result<Vec<Job>> {
        self.store.list_jobs(params).await
    }

    /// List summary projections.
    pub async fn list_job_summaries(&self, params: &JobListParams) -> Result<Vec<JobSummary>> {
        self.store.list_job_summaries(params).await
    }

    /// Count jobs under the same scope and filter as a listing.
    pub async fn count_jobs(&self, params: &JobListParams) -> Result<i64> {
        self.store.count_jobs(params).await
    }

    /// Compile `attribute.operator.value` condition strings into listing
    /// parameters.
    pub fn params_from_strings(
        &self,
        mut params: JobListParams,
        conditions: &[String],
    ) -> Result<JobListParams> {
        params.filter = compile_strings(conditions)?;
        Ok(params)
    }

    /// Compile a parsed query tree into listing parameters.
    pub fn params_from_ast(
        &self,
        mut params: JobListParams,
        query: &QueryNode,
    ) -> Result<JobListParams> {
        params.filter = Some(compile_ast(query)?);
        Ok(params)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// List a job's event history, oldest first.
    pub async fn list_job_events(
        &self,
        job_uuid: Uuid,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<JobEventRecord>> {
        events::list_job_events(self.store.pool(), job_uuid, limit, skip).await
    }

    /// Count a job's events.
    pub async fn count_job_events(&self, job_uuid: Uuid) -> Result<i64> {
        events::count_job_events(self.store.pool(), job_uuid).await
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Subscribe a delivery target to a job's events.
    ///
    /// The job must exist in the tenant. Returns the acknowledgment URL the
    /// notification service issued for the subscription.
    #[instrument(skip(self), fields(job_uuid = %job_uuid))]
    pub async fn subscribe(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        event_type_filter: &str,
        delivery_target: &str,
    ) -> Result<String> {
        self.store.get_job_by_uuid(tenant, job_uuid).await?;
        let notifier = self.notifier.as_ref().ok_or_else(|| JobsError::Store {
            operation: "create_subscription".to_string(),
            details: "no notification service is configured".to_string(),
        })?;
        notifier
            .create_subscription(job_uuid, event_type_filter, delivery_target)
            .await
            .map_err(|err| JobsError::Store {
                operation: "create_subscription".to_string(),
                details: err.to_string(),
            })
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Block a job on a recoverable condition.
    ///
    /// Moves the job to BLOCKED, then attaches it to the deduplicated
    /// recovery record for its condition. The two writes are separate
    /// transactions; if the attach fails the job is moved back to the status
    /// it came from, so it never sits BLOCKED with nothing watching it. If
    /// even that write fails, the zombie alerter fires. Returns the recovery
    /// record id.
    #[instrument(skip(self, report), fields(job_uuid = %report.job_uuid))]
    pub async fn block_job(&self, report: &RecoverableJob) -> Result<i64> {
        let outcome = lifecycle::transition(
            self.store.pool(),
            &report.tenant,
            report.job_uuid,
            JobStatus::Blocked,
            Some(&report.status_message),
        )
        .await?;

        match recovery::record_recoverable(self.store.pool(), report).await {
            Ok(recovery_id) => Ok(recovery_id),
            Err(attach_err) => {
                warn!(error = %attach_err, "recovery attach failed, resuming the job");
                let resumed = lifecycle::transition(
                    self.store.pool(),
                    &report.tenant,
                    report.job_uuid,
                    outcome.previous,
                    Some("Recovery attachment failed"),
                )
                .await;
                if let Err(resume_err) = resumed {
                    error!(
                        error = %resume_err,
                        "could not resume job after failed recovery attach, alerting"
                    );
                    self.alerter
                        .alert(report.job_uuid, "job blocked but no recovery record attached")
                        .await;
                }
                Err(attach_err)
            }
        }
    }

    /// Record a recovery probe attempt and schedule the next one.
    pub async fn record_recovery_attempt(
        &self,
        recovery_id: i64,
        observed_attempts: i32,
        next_attempt: chrono::DateTime<chrono::Utc>,
    ) -> Result<i32> {
        recovery::update_attempts(self.store.pool(), recovery_id, observed_attempts, next_attempt)
            .await
    }

    /// A recovery condition cleared: delete the record and resume its jobs.
    ///
    /// Each released job transitions from BLOCKED back to the status it was
    /// in when it blocked. A job that cannot be resumed (e.g. cancelled in
    /// the meantime) is logged and skipped; the rest still resume. Returns
    /// the number of jobs resumed.
    #[instrument(skip(self))]
    pub async fn resolve_recovery(&self, tenant: &str, recovery_id: i64) -> Result<usize> {
        let released = recovery::delete_job_recovery(self.store.pool(), tenant, recovery_id).await?;
        let mut resumed = 0;
        for blocked in &released {
            let target: JobStatus = match blocked.success_status.parse() {
                Ok(status) => status,
                Err(err) => {
                    error!(
                        job_uuid = %blocked.job_uuid,
                        status = %blocked.success_status,
                        error = %err,
                        "blocked row carries an unparseable success status"
                    );
                    continue;
                }
            };
            match lifecycle::transition(
                self.store.pool(),
                tenant,
                blocked.job_uuid,
                target,
                Some("Recovery condition cleared"),
            )
            .await
            {
                Ok(_) => resumed += 1,
                Err(err) => {
                    warn!(
                        job_uuid = %blocked.job_uuid,
                        error = %err,
                        "released job could not be resumed"
                    );
                }
            }
        }
        Ok(resumed)
    }

    /// List a tenant's recovery records with their blocked jobs.
    pub async fn get_recovery_jobs(&self, tenant: &str) -> Result<Vec<JobRecoveryWithBlocked>> {
        recovery::get_recovery_jobs(self.store.pool(), tenant).await
    }

    // ========================================================================
    // Sharing
    // ========================================================================

    /// Grant a user access to a job resource.
    pub async fn share(&self, grant: &NewShare) -> Result<JobSharedRecord> {
        // The job must exist in the grant's tenant.
        self.store
            .get_job_by_uuid(&grant.tenant, grant.job_uuid)
            .await?;
        shares::create_share(self.store.pool(), grant).await
    }

    /// Revoke all of a grantee's grants on a job.
    pub async fn unshare(&self, tenant: &str, job_uuid: Uuid, grantee: &str) -> Result<u64> {
        shares::delete_shares_for_grantee(self.store.pool(), tenant, job_uuid, grantee).await
    }

    /// List all grants on a job.
    pub async fn list_shares(&self, tenant: &str, job_uuid: Uuid) -> Result<Vec<JobSharedRecord>> {
        shares::list_shares_for_job(self.store.pool(), tenant, job_uuid).await
    }

    /// Whether a user holds a grant on a job resource with a permission.
    pub async fn is_shared(
        &self,
        tenant: &str,
        job_uuid: Uuid,
        grantee: &str,
        resource: JobResource,
        permission: JobPermission,
    ) -> Result<bool> {
        shares::is_shared(
            self.store.pool(),
            tenant,
            job_uuid,
            grantee,
            resource,
            permission,
        )
        .await
    }
}
