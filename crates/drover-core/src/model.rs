// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Data model for drover-core.
//!
//! Row types for the jobs, job_events, job_recovery, job_blocked, job_shared,
//! and job_resubmit tables, plus the status and classification enums shared
//! across the store, state machine, and recovery subsystems.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobsError;

/// Maximum stored length of a job's last_message; longer text is truncated.
pub const MAX_LAST_MESSAGE_LEN: usize = 2048;

// ============================================================================
// Status
// ============================================================================

/// Job lifecycle status.
///
/// A job is created in `Pending` and moves forward through input processing,
/// staging, submission, queueing, and execution. `Blocked` and `Paused` are
/// holding states from which execution can resume. `Finished`, `Cancelled`,
/// and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job accepted and persisted, not yet picked up by a worker.
    Pending,
    /// Worker is resolving and validating the job's inputs.
    ProcessingInputs,
    /// Input files are being transferred to the execution system.
    StagingInputs,
    /// All inputs are in place on the execution system.
    Staged,
    /// Job is being handed to the remote scheduler.
    Submitting,
    /// Remote scheduler accepted the job and queued it.
    Queued,
    /// Job is executing on the remote system.
    Running,
    /// Job output is being archived.
    Archiving,
    /// Job hit a recoverable condition and waits under a recovery record.
    Blocked,
    /// Job was administratively paused.
    Paused,
    /// Terminal: job completed successfully.
    Finished,
    /// Terminal: job was cancelled.
    Cancelled,
    /// Terminal: job failed.
    Failed,
}

impl JobStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [JobStatus; 13] = [
        JobStatus::Pending,
        JobStatus::ProcessingInputs,
        JobStatus::StagingInputs,
        JobStatus::Staged,
        JobStatus::Submitting,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Archiving,
        JobStatus::Blocked,
        JobStatus::Paused,
        JobStatus::Finished,
        JobStatus::Cancelled,
        JobStatus::Failed,
    ];

    /// The status assigned at job creation.
    pub const INITIAL: JobStatus = JobStatus::Pending;

    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Cancelled | JobStatus::Failed
        )
    }

    /// Whether this status is an active (non-holding, non-terminal) state.
    pub fn is_active(self) -> bool {
        !self.is_terminal() && !matches!(self, JobStatus::Blocked | JobStatus::Paused)
    }

    /// The database representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::ProcessingInputs => "PROCESSING_INPUTS",
            JobStatus::StagingInputs => "STAGING_INPUTS",
            JobStatus::Staged => "STAGED",
            JobStatus::Submitting => "SUBMITTING",
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Archiving => "ARCHIVING",
            JobStatus::Blocked => "BLOCKED",
            JobStatus::Paused => "PAUSED",
            JobStatus::Finished => "FINISHED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = JobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING_INPUTS" => Ok(JobStatus::ProcessingInputs),
            "STAGING_INPUTS" => Ok(JobStatus::StagingInputs),
            "STAGED" => Ok(JobStatus::Staged),
            "SUBMITTING" => Ok(JobStatus::Submitting),
            "QUEUED" => Ok(JobStatus::Queued),
            "RUNNING" => Ok(JobStatus::Running),
            "ARCHIVING" => Ok(JobStatus::Archiving),
            "BLOCKED" => Ok(JobStatus::Blocked),
            "PAUSED" => Ok(JobStatus::Paused),
            "FINISHED" => Ok(JobStatus::Finished),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(JobsError::InvalidValue {
                column: "status".to_string(),
                value: other.to_string(),
                reason: "unknown job status".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job execution flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Job runs through a remote batch scheduler.
    Batch,
    /// Job runs as a forked process on the execution system.
    Fork,
}

impl JobType {
    /// The database representation of this job type.
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Batch => "BATCH",
            JobType::Fork => "FORK",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = JobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BATCH" => Ok(JobType::Batch),
            "FORK" => Ok(JobType::Fork),
            other => Err(JobsError::InvalidValue {
                column: "job_type".to_string(),
                value: other.to_string(),
                reason: "unknown job type".to_string(),
            }),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Classification of job events in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobEventType {
    /// A status transition committed (including the initial PENDING).
    JobNewStatus,
    /// Input staging made progress.
    JobInputTransactionId,
    /// Archiving made progress.
    JobArchiveTransactionId,
    /// The job record was shared with another user.
    JobShareEvent,
    /// A recoverable failure attached the job to a recovery record.
    JobBlockedEvent,
    /// Administrative or diagnostic note.
    JobUserEvent,
}

impl JobEventType {
    /// The database representation of this event type.
    pub fn as_str(self) -> &'static str {
        match self {
            JobEventType::JobNewStatus => "JOB_NEW_STATUS",
            JobEventType::JobInputTransactionId => "JOB_INPUT_TRANSACTION_ID",
            JobEventType::JobArchiveTransactionId => "JOB_ARCHIVE_TRANSACTION_ID",
            JobEventType::JobShareEvent => "JOB_SHARE_EVENT",
            JobEventType::JobBlockedEvent => "JOB_BLOCKED_EVENT",
            JobEventType::JobUserEvent => "JOB_USER_EVENT",
        }
    }
}

/// Immutable audit record for a significant job action.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobEventRecord {
    /// Database primary key (None when inserting new events).
    #[sqlx(default)]
    pub id: Option<i64>,
    /// Job this event belongs to.
    pub job_uuid: Uuid,
    /// Related entity (recovery record, share grant) if applicable.
    pub other_uuid: Option<Uuid>,
    /// Event classification.
    pub event_type: String,
    /// Free-text description of what happened.
    pub description: String,
    /// When the event occurred.
    pub created: DateTime<Utc>,
}

// ============================================================================
// Job
// ============================================================================

/// A job row, the central entity of the orchestration core.
///
/// Mutated exclusively through the state machine and the store's targeted
/// field updates. Never physically deleted; terminal jobs are soft-hidden
/// via `visible = false`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Job {
    /// Store-assigned numeric id.
    pub id: i64,
    /// Caller-stable, globally unique identifier.
    pub uuid: Uuid,
    /// Tenant isolation boundary.
    pub tenant: String,
    /// Effective owner of the job.
    pub owner: String,
    /// Identity that created the job (may differ from owner under OBO).
    pub created_by: String,
    /// Tenant of the creator, which may differ from the job's tenant.
    pub created_by_tenant: String,
    /// Human-readable job name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Current lifecycle status (see [`JobStatus`]).
    pub status: String,
    /// Most recent status message, truncated to [`MAX_LAST_MESSAGE_LEN`].
    pub last_message: Option<String>,
    /// Soft-hide flag; hidden jobs are excluded from default listings.
    pub visible: bool,
    /// When the job was created.
    pub created: DateTime<Utc>,
    /// When the job row was last updated.
    pub last_updated: DateTime<Utc>,
    /// When the job reached a terminal state. Write-once.
    pub ended: Option<DateTime<Utc>>,

    /// Application reference id.
    pub app_id: String,
    /// Application reference version.
    pub app_version: String,
    /// Execution flavor (BATCH or FORK).
    pub job_type: String,

    /// Execution system id.
    pub exec_system_id: String,
    /// Working directory on the execution system.
    pub exec_system_exec_dir: Option<String>,
    /// Input directory on the execution system.
    pub exec_system_input_dir: Option<String>,
    /// Output directory on the execution system.
    pub exec_system_output_dir: Option<String>,
    /// Logical queue on the execution system.
    pub exec_system_logical_queue: Option<String>,
    /// Archive system id.
    pub archive_system_id: Option<String>,
    /// Archive directory.
    pub archive_system_dir: Option<String>,
    /// Data-transfer-node system used for staging, if any.
    pub dtn_system_id: Option<String>,

    /// Requested node count.
    pub node_count: i32,
    /// Requested cores per node.
    pub cores_per_node: i32,
    /// Requested memory per node in MB.
    pub memory_mb: i32,
    /// Requested maximum runtime in minutes.
    pub max_minutes: i32,

    /// Opaque JSON: file input definitions.
    pub file_inputs: serde_json::Value,
    /// Opaque JSON: application parameter set.
    pub parameter_set: serde_json::Value,
    /// Opaque JSON: resource constraints.
    pub exec_system_constraints: serde_json::Value,
    /// Opaque JSON: notification subscriptions requested at submit.
    pub subscriptions: serde_json::Value,
    /// Caller-supplied tags.
    pub tags: Vec<String>,

    /// Whether the launch command is MPI-wrapped.
    pub is_mpi: bool,
    /// MPI launch command override, if any.
    pub mpi_cmd: Option<String>,
    /// Marker that the job runs in a shared application context.
    pub shared_app_ctx: bool,
    /// Attributes resolved from the shared application context.
    pub shared_app_ctx_attribs: Vec<String>,

    /// Primary remote scheduler job id.
    pub remote_job_id: Option<String>,
    /// Secondary remote id (e.g. process id of a forked job).
    pub remote_job_id2: Option<String>,
    /// Remote scheduler's reported outcome.
    pub remote_outcome: Option<String>,
    /// Remote queue the job landed in.
    pub remote_queue: Option<String>,
    /// When the job was submitted to the remote scheduler.
    pub remote_submitted: Option<DateTime<Utc>>,
    /// When the remote job started running. Write-once.
    pub remote_started: Option<DateTime<Utc>>,
    /// When the remote job ended.
    pub remote_ended: Option<DateTime<Utc>>,
    /// Successful remote status checks.
    pub remote_checks_success: i32,
    /// Failed remote status checks.
    pub remote_checks_failed: i32,
    /// When the remote status was last checked.
    pub remote_last_status_check: Option<DateTime<Utc>>,

    /// Times this job has entered BLOCKED from another state.
    pub blocked_count: i32,
    /// Transfer correlation id for input staging.
    pub input_transaction_id: Option<String>,
    /// Transfer correlation id for archiving.
    pub archive_transaction_id: Option<String>,
}

impl Job {
    /// Parse the persisted status string.
    pub fn status(&self) -> crate::error::Result<JobStatus> {
        self.status.parse()
    }
}

// ============================================================================
// Recovery
// ============================================================================

/// Groups blocked jobs that share a recoverable failure condition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRecoveryRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Tenant isolation boundary.
    pub tenant: String,
    /// Classifies why recovery is needed.
    pub condition_code: String,
    /// Tester implementation that probes whether the condition cleared.
    pub tester_type: String,
    /// Tester parameters as JSON (ordered key/value map).
    pub tester_parms: serde_json::Value,
    /// Back-off policy implementation.
    pub policy_type: String,
    /// Policy parameters as JSON.
    pub policy_parms: serde_json::Value,
    /// Recovery attempts made so far.
    pub num_attempts: i32,
    /// When the next recovery attempt is due.
    pub next_attempt: DateTime<Utc>,
    /// When the record was created.
    pub created: DateTime<Utc>,
    /// When the record was last touched.
    pub last_updated: DateTime<Utc>,
    /// Deterministic hash of the tester parameters; dedup key per tenant.
    pub tester_hash: String,
}

/// One row per job currently blocked under a recovery record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobBlockedRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Owning recovery record (cascade-deleted with it).
    pub recovery_id: i64,
    /// When the job was attached.
    pub created: DateTime<Utc>,
    /// Status to restore the job to when recovery succeeds.
    pub success_status: String,
    /// The blocked job.
    pub job_uuid: Uuid,
    /// Status message recorded when the job blocked.
    pub status_message: String,
}

/// A recovery record together with its attached blocked jobs.
#[derive(Debug, Clone)]
pub struct JobRecoveryWithBlocked {
    /// The recovery record.
    pub recovery: JobRecoveryRecord,
    /// Jobs currently blocked under it.
    pub blocked: Vec<JobBlockedRecord>,
}

// ============================================================================
// Sharing
// ============================================================================

/// Shareable resource categories on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobResource {
    /// The job's output files.
    JobOutput,
    /// The job's event history.
    JobHistory,
    /// The resubmit payload.
    JobResubmitRequest,
}

impl JobResource {
    /// The database representation of this resource category.
    pub fn as_str(self) -> &'static str {
        match self {
            JobResource::JobOutput => "JOB_OUTPUT",
            JobResource::JobHistory => "JOB_HISTORY",
            JobResource::JobResubmitRequest => "JOB_RESUBMIT_REQUEST",
        }
    }
}

/// Permission granted on a shared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPermission {
    /// Read access.
    Read,
}

impl JobPermission {
    /// The database representation of this permission.
    pub fn as_str(self) -> &'static str {
        match self {
            JobPermission::Read => "READ",
        }
    }
}

/// A grant of a resource/permission pair on a job to another user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobSharedRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Tenant isolation boundary.
    pub tenant: String,
    /// The job owner or creator who granted access.
    pub grantor: String,
    /// The job being shared.
    pub job_uuid: Uuid,
    /// The user receiving access.
    pub grantee: String,
    /// Resource category shared.
    pub job_resource: String,
    /// Permission granted.
    pub job_permission: String,
    /// When the grant was created.
    pub created: DateTime<Utc>,
    /// When the grant was last updated.
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// Resubmit
// ============================================================================

/// The exact validated submission JSON, stored for byte-identical resubmission.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobResubmitRecord {
    /// Store-assigned id.
    pub id: i64,
    /// The job this payload created.
    pub job_uuid: Uuid,
    /// The validated submission JSON, verbatim.
    pub job_definition: String,
}

/// Truncate a status message to the store's maximum length.
///
/// Truncation is on a char boundary so the result is always valid UTF-8.
pub fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_LAST_MESSAGE_LEN {
        return message.to_string();
    }
    let mut end = MAX_LAST_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
