// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job store interfaces and the Postgres backend.
//!
//! All mutations run inside explicit transactions with commit-or-rollback
//! discipline; every listing variant has a paired count variant that applies
//! the identical filter.

pub mod postgres;

pub use self::postgres::JobStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::model::JobType;
use crate::search::FilterNode;

/// Sentinel limit meaning "return all matching rows".
///
/// Any negative limit is treated as unlimited; `0` is an empty page. This is
/// the single convention used by every query in the store.
pub const NO_LIMIT: i64 = -1;

/// Which boundary condition a listing applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Jobs owned by the requesting user.
    Owner,
    /// Jobs shared with the requesting user: tenant-scoped and visible only,
    /// with no owner filter.
    SharedWithMe,
}

/// Sort direction for an order-by attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending (default).
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One requested ordering attribute with an explicit direction.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Attribute name (camelCase accepted, validated against the column set).
    pub attribute: String,
    /// Sort direction.
    pub direction: SortDirection,
}

/// Parameters for job listing, searching, and counting.
///
/// The same parameter set drives the summary projection, the full-row
/// projection, and the count query, so filters always agree.
#[derive(Debug, Clone)]
pub struct JobListParams {
    /// Tenant scope (always applied).
    pub tenant: String,
    /// Requesting user; the owner filter in [`ListMode::Owner`].
    pub user: String,
    /// Boundary condition mode.
    pub mode: ListMode,
    /// Include soft-hidden jobs (owner mode only).
    pub include_hidden: bool,
    /// Compiled search predicate, if any.
    pub filter: Option<FilterNode>,
    /// Requested ordering; empty means `last_updated DESC`.
    pub order_by: Vec<OrderBy>,
    /// Page size; [`NO_LIMIT`] (or any negative value) means unlimited.
    pub limit: i64,
    /// Rows to skip; negative values are normalized to zero.
    pub skip: i64,
}

impl JobListParams {
    /// Listing of the user's own jobs.
    pub fn for_owner(tenant: &str, user: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            user: user.to_string(),
            mode: ListMode::Owner,
            include_hidden: false,
            filter: None,
            order_by: Vec::new(),
            limit: NO_LIMIT,
            skip: 0,
        }
    }

    /// Listing of jobs shared with the user.
    pub fn shared_with(tenant: &str, user: &str) -> Self {
        Self {
            mode: ListMode::SharedWithMe,
            ..Self::for_owner(tenant, user)
        }
    }

    /// Attach a compiled search predicate.
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set pagination.
    pub fn paged(mut self, limit: i64, skip: i64) -> Self {
        self.limit = limit;
        self.skip = skip;
        self
    }
}

/// Fixed-subset projection of a job row for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobSummary {
    /// Caller-stable identifier.
    pub uuid: Uuid,
    /// Tenant.
    pub tenant: String,
    /// Effective owner.
    pub owner: String,
    /// Job name.
    pub name: String,
    /// Current status.
    pub status: String,
    /// Application id.
    pub app_id: String,
    /// Application version.
    pub app_version: String,
    /// Execution system id.
    pub exec_system_id: String,
    /// Archive system id.
    pub archive_system_id: Option<String>,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last update time.
    pub last_updated: DateTime<Utc>,
    /// Terminal time, if reached.
    pub ended: Option<DateTime<Utc>>,
    /// Remote execution start time, if recorded.
    pub remote_started: Option<DateTime<Utc>>,
}

/// A validated job submission, ready for persistence.
///
/// The surrounding request layer has already schema-checked the payload;
/// [`NewJob::validate`] re-asserts the required-field invariants the store
/// depends on.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Caller-stable identifier for the new job.
    pub uuid: Uuid,
    /// Tenant isolation boundary.
    pub tenant: String,
    /// Effective owner (the OBO user).
    pub owner: String,
    /// Raw creator identity.
    pub created_by: String,
    /// Tenant of the creator.
    pub created_by_tenant: String,
    /// Human-readable job name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Application reference id.
    pub app_id: String,
    /// Application reference version.
    pub app_version: String,
    /// Execution flavor.
    pub job_type: JobType,
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
    /// Data-transfer-node system, if routing through one.
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
    /// Opaque JSON: notification subscriptions.
    pub subscriptions: serde_json::Value,
    /// Caller-supplied tags.
    pub tags: Vec<String>,
    /// Whether the launch command is MPI-wrapped.
    pub is_mpi: bool,
    /// MPI launch command override.
    pub mpi_cmd: Option<String>,
    /// Shared application context marker.
    pub shared_app_ctx: bool,
    /// Attributes resolved from the shared application context.
    pub shared_app_ctx_attribs: Vec<String>,
}

impl NewJob {
    /// Assert the required-field invariants for job creation.
    pub fn validate(&self) -> Result<()> {
        fn require(field: &'static str, value: &str) -> Result<()> {
            if value.trim().is_empty() {
                return Err(JobsError::Validation {
                    field: field.to_string(),
                    message: "must not be blank".to_string(),
                });
            }
            Ok(())
        }

        require("tenant", &self.tenant)?;
        require("owner", &self.owner)?;
        require("createdBy", &self.created_by)?;
        require("createdByTenant", &self.created_by_tenant)?;
        require("name", &self.name)?;
        require("appId", &self.app_id)?;
        require("appVersion", &self.app_version)?;
        require("execSystemId", &self.exec_system_id)?;

        for (field, value) in [
            ("nodeCount", self.node_count),
            ("coresPerNode", self.cores_per_node),
            ("memoryMB", self.memory_mb),
            ("maxMinutes", self.max_minutes),
        ] {
            if value < 1 {
                return Err(JobsError::Validation {
                    field: field.to_string(),
                    message: format!("must be positive, got {}", value),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_job() -> NewJob {
        NewJob {
            uuid: Uuid::new_v4(),
            tenant: "dev".to_string(),
            owner: "alice".to_string(),
            created_by: "alice".to_string(),
            created_by_tenant: "dev".to_string(),
            name: "sim-run".to_string(),
            description: None,
            app_id: "sim".to_string(),
            app_version: "1.0".to_string(),
            job_type: JobType::Batch,
            exec_system_id: "hpc-1".to_string(),
            exec_system_exec_dir: None,
            exec_system_input_dir: None,
            exec_system_output_dir: None,
            exec_system_logical_queue: None,
            archive_system_id: None,
            archive_system_dir: None,
            dtn_system_id: None,
            node_count: 1,
            cores_per_node: 4,
            memory_mb: 1024,
            max_minutes: 30,
            file_inputs: serde_json::json!([]),
            parameter_set: serde_json::json!({}),
            exec_system_constraints: serde_json::json!([]),
            subscriptions: serde_json::json!([]),
            tags: Vec::new(),
            is_mpi: false,
            mpi_cmd: None,
            shared_app_ctx: false,
            shared_app_ctx_attribs: Vec::new(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_new_job().validate().is_ok());
    }

    #[test]
    fn test_validate_blank_required_field() {
        let mut job = valid_new_job();
        job.owner = "  ".to_string();
        let err = job.validate().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("owner"));
    }

    #[test]
    fn test_validate_nonpositive_resources() {
        let mut job = valid_new_job();
        job.node_count = 0;
        let err = job.validate().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("nodeCount"));
    }

    #[test]
    fn test_params_constructors() {
        let params = JobListParams::for_owner("dev", "alice");
        assert_eq!(params.mode, ListMode::Owner);
        assert_eq!(params.limit, NO_LIMIT);
        assert_eq!(params.skip, 0);

        let params = JobListParams::shared_with("dev", "alice");
        assert_eq!(params.mode, ListMode::SharedWithMe);
    }

    #[test]
    fn test_sort_direction_sql() {
        assert_eq!(SortDirection::Asc.as_sql(), "ASC");
        assert_eq!(SortDirection::Desc.as_sql(), "DESC");
        assert_eq!(SortDirection::default(), SortDirection::Desc);
    }
}
