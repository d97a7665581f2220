// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Drover Core - Job Execution Orchestration
//!
//! This crate is the orchestration core for remote job execution. It owns the
//! job status state machine, the transactional job store, blocked-job
//! recovery with deduplication and back-off, a restricted search compiler,
//! an append-only event log, and a per-resource sharing ledger, all persisted
//! to PostgreSQL.
//!
//! The crate has no transport surface of its own. A request layer (HTTP,
//! message bus, CLI) embeds [`runtime::DroverRuntime`] and calls
//! [`service::JobService`].
//!
//! # Job Status State Machine
//!
//! ```text
//!  PENDING → PROCESSING_INPUTS → STAGING_INPUTS → STAGED → SUBMITTING
//!                                                              │
//!                                                              ▼
//!                               ARCHIVING ← RUNNING ← QUEUED ──┘
//!                                   │          │
//!                                   └────┬─────┘
//!                                        ▼
//!                                    FINISHED
//! ```
//!
//! Forward movement along the chain may skip stages, but never moves
//! backward. Any non-terminal status can divert to the holding states
//! BLOCKED and PAUSED (and return to any chain stage from them), or to the
//! terminal states CANCELLED and FAILED. FINISHED is reachable only from
//! RUNNING or ARCHIVING.
//!
//! ## Status Descriptions
//!
//! | Status | Description |
//! |--------|-------------|
//! | `PENDING` | Accepted and persisted, nothing processed yet |
//! | `PROCESSING_INPUTS` | Input definitions being resolved |
//! | `STAGING_INPUTS` | Input files moving to the execution system |
//! | `STAGED` | All inputs in place |
//! | `SUBMITTING` | Being handed to the remote scheduler |
//! | `QUEUED` | Accepted by the remote scheduler, waiting |
//! | `RUNNING` | Executing remotely |
//! | `ARCHIVING` | Outputs moving to the archive system |
//! | `BLOCKED` | Held on a recoverable failure, awaiting recovery |
//! | `PAUSED` | Held by explicit request |
//! | `FINISHED` | Completed successfully (terminal) |
//! | `CANCELLED` | Cancelled by request (terminal) |
//! | `FAILED` | Failed permanently (terminal) |
//!
//! # Recovery
//!
//! Jobs that hit a recoverable failure move to BLOCKED and attach to a
//! recovery record deduplicated by `(tenant, tester_hash)`: one record per
//! failure condition no matter how many jobs are waiting on it. A recovery
//! worker probes each condition on its back-off schedule and, when a
//! condition clears, every attached job resumes to the status it blocked in.
//!
//! # Search
//!
//! Listings accept either `attribute.operator.value` condition strings
//! (AND-combined) or a boolean expression tree. Conditions compile against a
//! fixed column set with per-type operator allow-lists; values are typed and
//! always bound, never spliced into SQL.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `DROVER_DATABASE_URL` | Yes | - | PostgreSQL connection string |
//! | `DROVER_MAX_DB_CONNECTIONS` | No | `10` | Maximum pool connections |
//! | `DROVER_DEFAULT_PAGE_SIZE` | No | `100` | Default listing page size |
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types with stable error codes
//! - [`model`]: Job, event, recovery, sharing, and resubmit records
//! - [`status`]: The status transition rules
//! - [`lifecycle`]: Transactional status transitions
//! - [`events`]: Append-only event recorder
//! - [`search`]: Condition string / query tree compiler
//! - [`store`]: PostgreSQL job store
//! - [`recovery`]: Deduplicated blocked-job recovery
//! - [`shares`]: Per-resource sharing ledger
//! - [`service`]: The orchestration service facade
//! - [`runtime`]: Embeddable runtime builder
//! - [`migrations`]: Embedded database migrations

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod migrations;
pub mod model;
pub mod recovery;
pub mod runtime;
pub mod search;
pub mod service;
pub mod shares;
pub mod status;
pub mod store;

pub use error::{JobsError, Result};
pub use model::{Job, JobStatus};
pub use service::JobService;
