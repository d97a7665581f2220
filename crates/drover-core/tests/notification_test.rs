// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for the event subscription seam.

mod common;

use std::sync::Arc;

use common::*;
use uuid::Uuid;

#[tokio::test]
async fn test_subscribe_returns_acknowledgment_url() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("sub");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "watched"), &job_definition("watched"))
        .await
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let service = ctx.service.clone().with_notifier(notifier.clone());

    let url = service
        .subscribe(&tenant, job.uuid, "JOB_NEW_STATUS", "https://example.test/hook")
        .await
        .unwrap();
    assert!(url.contains(&job.uuid.to_string()));

    let recorded = notifier.subscriptions.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, job.uuid);
    assert_eq!(recorded[0].1, "JOB_NEW_STATUS");
    assert_eq!(recorded[0].2, "https://example.test/hook");
}

#[tokio::test]
async fn test_subscribe_without_notifier_is_rejected() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let tenant = unique_tenant("sub-none");
    let job = ctx
        .service
        .submit(&new_job(&tenant, "alice", "unwatched"), &job_definition("unwatched"))
        .await
        .unwrap();

    let err = ctx
        .service
        .subscribe(&tenant, job.uuid, "JOB_NEW_STATUS", "https://example.test/hook")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STORE_ERROR");
}

#[tokio::test]
async fn test_subscribe_unknown_job_is_not_found() {
    skip_if_no_db!();
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: failed to create test context");
        return;
    };

    let notifier = Arc::new(RecordingNotifier::default());
    let service = ctx.service.clone().with_notifier(notifier.clone());

    let err = service
        .subscribe(
            &unique_tenant("sub-missing"),
            Uuid::new_v4(),
            "JOB_NEW_STATUS",
            "https://example.test/hook",
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
    assert!(notifier.subscriptions.lock().unwrap().is_empty());
}
