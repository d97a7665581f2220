// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for the sharing ledger and shared-with-me listings.

mod common;

use common::*;
use drover_core::model::{JobPermission, JobResource};
use drover_core::shares::NewShare;
use drover_core::store::JobListParams;

fn output_grant(tenant: &str, job_uuid: uuid::Uuid, grantee: &str) -> NewShare {
    NewShare {
        tenant: tenant.to_string(),
        grantor: "alice".to_string(),
        job_uuid,
        grantee: grantee.to_string(),
        job_resource: JobResource::JobOutput,
        job_permission: JobPermission::Read,
    }
}

#[tokio::test]
async fn test_share_grant_and_check() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("share");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "shared"), &job_definition("shared"))
        .await
        .unwrap();

    let grant = ctx
        .service
        .share(&output_grant(&tenant, job.uuid, "bob"))
        .await
        .unwrap();
    assert_eq!(grant.grantee, "bob");
    assert_eq!(grant.job_resource, "JOB_OUTPUT");

    assert!(
        ctx.service
            .is_shared(&tenant, job.uuid, "bob", JobResource::JobOutput, JobPermission::Read)
            .await
            .unwrap()
    );
    assert!(
        !ctx.service
            .is_shared(&tenant, job.uuid, "bob", JobResource::JobHistory, JobPermission::Read)
            .await
            .unwrap()
    );
    assert!(
        !ctx.service
            .is_shared(&tenant, job.uuid, "carol", JobResource::JobOutput, JobPermission::Read)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_regrant_is_upsert() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("regrant");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "twice"), &job_definition("twice"))
        .await
        .unwrap();

    let first = ctx
        .service
        .share(&output_grant(&tenant, job.uuid, "bob"))
        .await
        .unwrap();
    let second = ctx
        .service
        .share(&output_grant(&tenant, job.uuid, "bob"))
        .await
        .unwrap();
    assert_eq!(first.id, second.id, "regranting must not duplicate the row");

    let grants = ctx.service.list_shares(&tenant, job.uuid).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn test_shared_with_me_listing() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("swm");
    let alice_job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "from-alice"), &job_definition("from-alice"))
        .await
        .unwrap();
    let carol_job = ctx
        .service
        .submit(&new_job(&tenant, "carol", "from-carol"), &job_definition("from-carol"))
        .await
        .unwrap();

    // Shared-with-me drops the owner filter: the boundary is tenant plus
    // visibility. Bob sees every visible job in the tenant regardless of
    // owner; specific resource access goes through the grant ledger.
    let params = JobListParams::shared_with(&tenant, "bob");
    let jobs = ctx.service.list_jobs(&params).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(ctx.service.count_jobs(&params).await.unwrap(), 2);

    // Hiding a job removes it from the shared view.
    ctx.service.hide(&tenant, carol_job.uuid).await.unwrap();
    let jobs = ctx.service.list_jobs(&params).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].uuid, alice_job.uuid);

    // The owner view is still owner-filtered.
    let owner_params = JobListParams::for_owner(&tenant, "alice");
    let owned = ctx.service.list_jobs(&owner_params).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].uuid, alice_job.uuid);
}

#[tokio::test]
async fn test_unshare_revokes_all_grants() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("unshare");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "revoked"), &job_definition("revoked"))
        .await
        .unwrap();

    ctx.service
        .share(&output_grant(&tenant, job.uuid, "bob"))
        .await
        .unwrap();
    let mut history = output_grant(&tenant, job.uuid, "bob");
    history.job_resource = JobResource::JobHistory;
    ctx.service.share(&history).await.unwrap();

    let removed = ctx.service.unshare(&tenant, job.uuid, "bob").await.unwrap();
    assert_eq!(removed, 2);
    assert!(
        !ctx.service
            .is_shared(&tenant, job.uuid, "bob", JobResource::JobOutput, JobPermission::Read)
            .await
            .unwrap()
    );

    let err = ctx
        .service
        .unshare(&tenant, job.uuid, "bob")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_share_events_recorded() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("share-events");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "audited"), &job_definition("audited"))
        .await
        .unwrap();

    ctx.service
        .share(&output_grant(&tenant, job.uuid, "bob"))
        .await
        .unwrap();
    ctx.service.unshare(&tenant, job.uuid, "bob").await.unwrap();

    let events = ctx.service.list_job_events(job.uuid, -1, 0).await.unwrap();
    let share_events: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == "JOB_SHARE_EVENT")
        .collect();
    assert_eq!(share_events.len(), 2);
}

#[tokio::test]
async fn test_share_unknown_job_rejected() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("no-job");
    let err = ctx
        .service
        .share(&output_grant(&tenant, uuid::Uuid::new_v4(), "bob"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}
