//! Workflow engine integration tests: order numbering, broadcast
//! idempotency, commit validation, withdraw and delete guards, completion.

mod common;

use std::collections::HashSet;

use broker_server::db;
use broker_server::workflow::{forwarding, orders, submissions};
use common::*;
use shared::error::ErrorCode;
use shared::models::{OrderRef, OrderStatus, SubmissionStatus};

#[tokio::test]
async fn concurrent_submits_allocate_distinct_order_numbers() {
    let ctx = TestCtx::new().await;

    let mut draft_ids = Vec::new();
    for _ in 0..6 {
        let order = orders::create_draft(&ctx.pool, BUYER, rice_draft())
            .await
            .unwrap();
        draft_ids.push(order.id);
    }

    let mut handles = Vec::new();
    for id in draft_ids {
        let pool = ctx.pool.clone();
        let sink = ctx.sink.clone();
        handles.push(tokio::spawn(async move {
            orders::submit(&pool, sink.as_ref(), BUYER, id).await
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        let no = order.order_no.unwrap();
        assert!(no.starts_with("ORD-"), "unexpected order number {no}");
        assert!(numbers.insert(no), "duplicate order number allocated");
    }
    assert_eq!(numbers.len(), 6);
}

#[tokio::test]
async fn resubmit_does_not_reallocate_number() {
    let ctx = TestCtx::new().await;
    let order = orders::create_draft(&ctx.pool, BUYER, rice_draft())
        .await
        .unwrap();
    let submitted = orders::submit(&ctx.pool, ctx.sink(), BUYER, order.id)
        .await
        .unwrap();

    let err = orders::submit(&ctx.pool, ctx.sink(), BUYER, order.id)
        .await
        .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::InvalidStatusTransition);

    let head = db::orders::head(&ctx.pool, OrderRef::buyer(order.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(head.order_no, submitted.order_no);
}

async fn submitted_order(ctx: &TestCtx) -> OrderRef {
    let order = orders::create_draft(&ctx.pool, BUYER, rice_draft())
        .await
        .unwrap();
    orders::submit(&ctx.pool, ctx.sink(), BUYER, order.id)
        .await
        .unwrap();
    OrderRef::buyer(order.id)
}

#[tokio::test]
async fn rebroadcast_is_idempotent() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;

    let offered = orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A])
        .await
        .unwrap();
    assert_eq!(offered, 1);

    // Widening the pool only creates the missing row.
    let offered = submissions::broadcast(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();
    assert_eq!(offered, 1);

    // Full repeat creates nothing.
    let offered = submissions::broadcast(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();
    assert_eq!(offered, 0);

    let rows = db::submissions::list_for_order(&ctx.pool, order)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Only the two inserts produced supplier notifications.
    assert_eq!(ctx.sink.kinds_for(SUPPLIER_A).len(), 1);
    assert_eq!(ctx.sink.kinds_for(SUPPLIER_B).len(), 1);
}

async fn submission_for(ctx: &TestCtx, order: OrderRef, supplier_id: i64) -> i64 {
    db::submissions::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.supplier_id == supplier_id)
        .map(|r| r.id)
        .unwrap()
}

#[tokio::test]
async fn commit_rejects_cross_tenant_driver_and_vehicle() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A])
        .await
        .unwrap();
    let submission_id = submission_for(&ctx, order, SUPPLIER_A).await;

    let err = submissions::commit(
        &ctx.pool,
        ctx.sink(),
        SUPPLIER_A,
        submission_id,
        DRIVER_B,
        VEHICLE_A,
    )
    .await
    .unwrap_err();
    let err = app_error(err);
    assert_eq!(err.code, ErrorCode::CrossTenantReference);
    assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);

    let err = submissions::commit(
        &ctx.pool,
        ctx.sink(),
        SUPPLIER_A,
        submission_id,
        DRIVER_A,
        VEHICLE_B,
    )
    .await
    .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::CrossTenantReference);

    // Nothing was written.
    let row = db::submissions::by_id(&ctx.pool, submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.parsed_status().unwrap(), SubmissionStatus::New);
    assert!(!db::confirmations::any_for_order(&ctx.pool, order)
        .await
        .unwrap());
}

#[tokio::test]
async fn commit_twice_is_terminal() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A])
        .await
        .unwrap();
    let submission_id = submission_for(&ctx, order, SUPPLIER_A).await;

    submissions::commit(&ctx.pool, ctx.sink(), SUPPLIER_A, submission_id, DRIVER_A, VEHICLE_A)
        .await
        .unwrap();
    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::Confirmed);

    let err = submissions::commit(
        &ctx.pool,
        ctx.sink(),
        SUPPLIER_A,
        submission_id,
        DRIVER_A,
        VEHICLE_A,
    )
    .await
    .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::SubmissionTerminal);
}

#[tokio::test]
async fn withdraw_after_forward_is_refused() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A])
        .await
        .unwrap();
    let submission_id = submission_for(&ctx, order, SUPPLIER_A).await;
    let confirmation = submissions::commit(
        &ctx.pool,
        ctx.sink(),
        SUPPLIER_A,
        submission_id,
        DRIVER_A,
        VEHICLE_A,
    )
    .await
    .unwrap();
    forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), confirmation.id, BUYER)
        .await
        .unwrap();

    let err = submissions::withdraw(&ctx.pool, ctx.sink(), SUPPLIER_A, submission_id)
        .await
        .unwrap_err();
    let err = app_error(err);
    assert_eq!(err.code, ErrorCode::WithdrawAfterForward);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn withdraw_before_forward_supersedes_nothing_else() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();
    let submission_id = submission_for(&ctx, order, SUPPLIER_A).await;

    submissions::withdraw(&ctx.pool, ctx.sink(), SUPPLIER_A, submission_id)
        .await
        .unwrap();
    let row = db::submissions::by_id(&ctx.pool, submission_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.parsed_status().unwrap(), SubmissionStatus::Withdrawn);

    // The sibling submission is untouched.
    let other = submission_for(&ctx, order, SUPPLIER_B).await;
    let row = db::submissions::by_id(&ctx.pool, other).await.unwrap().unwrap();
    assert_eq!(row.parsed_status().unwrap(), SubmissionStatus::New);
}

#[tokio::test]
async fn delete_refused_while_references_live() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A])
        .await
        .unwrap();

    let err = orders::delete(&ctx.pool, order).await.unwrap_err();
    let err = app_error(err);
    assert_eq!(err.code, ErrorCode::OrderHasLiveReferences);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

    // Draft with no references deletes cleanly.
    let lone = orders::create_draft(&ctx.pool, BUYER, rice_draft())
        .await
        .unwrap();
    orders::delete(&ctx.pool, OrderRef::buyer(lone.id))
        .await
        .unwrap();
    assert!(db::orders::buyer_by_id(&ctx.pool, lone.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn completion_closes_buyer_order_and_ledger() {
    let ctx = TestCtx::new().await;
    let order = submitted_order(&ctx).await;
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();

    for (supplier, driver, vehicle) in [
        (SUPPLIER_A, DRIVER_A, VEHICLE_A),
        (SUPPLIER_B, DRIVER_B, VEHICLE_B),
    ] {
        let sid = submission_for(&ctx, order, supplier).await;
        submissions::commit(&ctx.pool, ctx.sink(), supplier, sid, driver, vehicle)
            .await
            .unwrap();
    }
    let entries = db::confirmations::list_for_order(&ctx.pool, order)
        .await
        .unwrap();
    let chosen = entries
        .iter()
        .find(|e| e.supplier_id == SUPPLIER_A)
        .map(|e| e.id)
        .unwrap();
    forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), chosen, BUYER)
        .await
        .unwrap();

    forwarding::complete(&ctx.pool, ctx.sink(), order).await.unwrap();

    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::Completed);
    for entry in db::confirmations::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
    {
        assert_eq!(entry.status, "completed");
    }

    let err = forwarding::complete(&ctx.pool, ctx.sink(), order)
        .await
        .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::OrderAlreadyCompleted);
}

#[tokio::test]
async fn completion_closes_manual_order() {
    let ctx = TestCtx::new().await;
    let order = orders::admin_create(&ctx.pool, ctx.sink(), 999, rice_draft(), Some(SUPPLIER_A))
        .await
        .unwrap();
    let order_ref = OrderRef::manual(order.id);
    assert_eq!(order.status, OrderStatus::Pending);

    orders::assign(&ctx.pool, ctx.sink(), order_ref, &[SUPPLIER_A])
        .await
        .unwrap();
    let sid = submission_for(&ctx, order_ref, SUPPLIER_A).await;
    let confirmation =
        submissions::commit(&ctx.pool, ctx.sink(), SUPPLIER_A, sid, DRIVER_A, VEHICLE_A)
            .await
            .unwrap();
    forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), confirmation.id, BUYER)
        .await
        .unwrap();
    forwarding::complete(&ctx.pool, ctx.sink(), order_ref)
        .await
        .unwrap();

    let head = db::orders::head(&ctx.pool, order_ref).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::Completed);
}
