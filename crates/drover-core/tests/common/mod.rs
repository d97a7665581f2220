// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for drover-core integration tests.
//!
//! Provides TestContext for setting up the database, the service, and
//! recording doubles for the queue and alerter seams.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use drover_core::model::Job;
use drover_core::service::{JobQueue, JobService, Notifier, ZombieAlerter};
use drover_core::store::{JobStore, NewJob};

/// Test context: a migrated database plus a fully wired service.
pub struct TestContext {
    pub pool: PgPool,
    pub service: JobService,
    pub queue: Arc<RecordingQueue>,
    pub alerter: Arc<RecordingAlerter>,
}

impl TestContext {
    /// Connect to `TEST_DATABASE_URL`, run migrations, and wire the service.
    ///
    /// Returns None when the database is unavailable so tests can skip.
    pub async fn new() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&database_url).await.ok()?;
        drover_core::migrations::run_postgres(&pool).await.ok()?;

        let queue = Arc::new(RecordingQueue::default());
        let alerter = Arc::new(RecordingAlerter::default());
        let service = JobService::new(
            JobStore::new(pool.clone()),
            queue.clone(),
            alerter.clone(),
        );
        Some(Self {
            pool,
            service,
            queue,
            alerter,
        })
    }
}

/// Queue double that records enqueued jobs and can be told to fail.
#[derive(Default)]
pub struct RecordingQueue {
    pub enqueued: Mutex<Vec<Uuid>>,
    pub fail: Mutex<bool>,
}

impl RecordingQueue {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn enqueued_uuids(&self) -> Vec<Uuid> {
        self.enqueued.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: &Job) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("queue unavailable");
        }
        self.enqueued.lock().unwrap().push(job.uuid);
        Ok(())
    }
}

/// Alerter double that records stranded-job reports.
#[derive(Default)]
pub struct RecordingAlerter {
    pub alerts: Mutex<Vec<(Uuid, String)>>,
}

#[async_trait]
impl ZombieAlerter for RecordingAlerter {
    async fn alert(&self, job_uuid: Uuid, detail: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((job_uuid, detail.to_string()));
    }
}

/// Notifier double that records subscriptions and returns a canned URL.
#[derive(Default)]
pub struct RecordingNotifier {
    pub subscriptions: Mutex<Vec<(Uuid, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn create_subscription(
        &self,
        job_uuid: Uuid,
        event_type_filter: &str,
        delivery_target: &str,
    ) -> anyhow::Result<String> {
        self.subscriptions.lock().unwrap().push((
            job_uuid,
            event_type_filter.to_string(),
            delivery_target.to_string(),
        ));
        Ok(format!("https://notifications.test/subscriptions/{}", job_uuid))
    }
}

/// A unique tenant name so tests never see each other's rows.
pub fn unique_tenant(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// A valid submission with fresh uuid, ready to customize.
pub fn new_job(tenant: &str, owner: &str, name: &str) -> NewJob {
    NewJob {
        uuid: Uuid::new_v4(),
        tenant: tenant.to_string(),
        owner: owner.to_string(),
        created_by: owner.to_string(),
        created_by_tenant: tenant.to_string(),
        name: name.to_string(),
        description: None,
        app_id: "test-app".to_string(),
        app_version: "1.0".to_string(),
        job_type: drover_core::model::JobType::Batch,
        exec_system_id: "test-exec".to_string(),
        exec_system_exec_dir: None,
        exec_system_input_dir: None,
        exec_system_output_dir: None,
        exec_system_logical_queue: None,
        archive_system_id: None,
        archive_system_dir: None,
        dtn_system_id: None,
        node_count: 1,
        cores_per_node: 2,
        memory_mb: 512,
        max_minutes: 15,
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

/// The submission JSON stored for resubmission in tests.
pub fn job_definition(name: &str) -> String {
    serde_json::json!({
        "name": name,
        "appId": "test-app",
        "appVersion": "1.0",
    })
    .to_string()
}

/// Helper macro to skip tests if TEST_DATABASE_URL is not set.
#[macro_export]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        }
    };
}
