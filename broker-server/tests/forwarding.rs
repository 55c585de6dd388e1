//! Forwarding tests: the end-to-end brokering scenario, the concurrent
//! double-forward race, and sink-failure isolation.

mod common;

use broker_server::db;
use broker_server::workflow::{forwarding, orders, submissions};
use common::*;
use shared::error::ErrorCode;
use shared::models::{OrderRef, OrderStatus, SubmissionStatus};

/// Drives an order to the point where both suppliers have committed.
/// Returns the order ref and the two confirmation entry ids (A then B).
async fn both_committed(ctx: &TestCtx) -> (OrderRef, i64, i64) {
    let order = orders::create_draft(&ctx.pool, BUYER, rice_draft())
        .await
        .unwrap();
    orders::submit(&ctx.pool, ctx.sink(), BUYER, order.id)
        .await
        .unwrap();
    let order = OrderRef::buyer(order.id);
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();

    let mut entry_ids = [0i64; 2];
    for (i, (supplier, driver, vehicle)) in [
        (SUPPLIER_A, DRIVER_A, VEHICLE_A),
        (SUPPLIER_B, DRIVER_B, VEHICLE_B),
    ]
    .into_iter()
    .enumerate()
    {
        let sid = db::submissions::list_for_order(&ctx.pool, order)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.supplier_id == supplier)
            .map(|r| r.id)
            .unwrap();
        let confirmation =
            submissions::commit(&ctx.pool, ctx.sink(), supplier, sid, driver, vehicle)
                .await
                .unwrap();
        entry_ids[i] = confirmation.id;
    }
    (order, entry_ids[0], entry_ids[1])
}

#[tokio::test]
async fn brokering_scenario_end_to_end() {
    let ctx = TestCtx::new().await;

    let order = orders::create_draft(&ctx.pool, BUYER, rice_draft())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Draft);
    assert!(order.order_no.is_none());

    let submitted = orders::submit(&ctx.pool, ctx.sink(), BUYER, order.id)
        .await
        .unwrap();
    let order_no = submitted.order_no.unwrap();
    assert!(order_no.starts_with("ORD-"));
    assert_eq!(ctx.sink.kinds_for(0), vec!["order_submitted"]);

    let order = OrderRef::buyer(order.id);
    orders::assign(&ctx.pool, ctx.sink(), order, &[SUPPLIER_A, SUPPLIER_B])
        .await
        .unwrap();

    // Supplier A views, responds, then commits a driver and vehicle.
    let sid_a = db::submissions::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.supplier_id == SUPPLIER_A)
        .map(|r| r.id)
        .unwrap();
    submissions::mark_viewed(&ctx.pool, SUPPLIER_A, sid_a).await.unwrap();
    submissions::respond(&ctx.pool, ctx.sink(), SUPPLIER_A, sid_a, SubmissionStatus::Responded)
        .await
        .unwrap();
    let confirmation =
        submissions::commit(&ctx.pool, ctx.sink(), SUPPLIER_A, sid_a, DRIVER_A, VEHICLE_A)
            .await
            .unwrap();
    assert_eq!(confirmation.load_type, "Rice");
    assert_eq!(confirmation.tonnage, 20.0);
    assert_eq!(confirmation.supplier_company, "Sharma Logistics");
    assert!(!confirmation.forwarded_to_buyer);

    // Admin forwards the confirmation; the buyer sees exactly one.
    let forwarded = forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), confirmation.id, BUYER)
        .await
        .unwrap();
    assert!(forwarded.forwarded_to_buyer);
    assert_eq!(forwarded.buyer_id, Some(BUYER));
    assert_eq!(forwarded.order_no, Some(order_no));

    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::SentToBuyer);

    // Supplier B's untouched submission got superseded.
    let sid_b = db::submissions::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.supplier_id == SUPPLIER_B)
        .map(|r| r.id)
        .unwrap();
    let row = db::submissions::by_id(&ctx.pool, sid_b).await.unwrap().unwrap();
    assert_eq!(row.parsed_status().unwrap(), SubmissionStatus::Superseded);
    assert!(ctx
        .sink
        .kinds_for(SUPPLIER_B)
        .contains(&"submission_superseded".to_string()));

    forwarding::complete(&ctx.pool, ctx.sink(), order).await.unwrap();
    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::Completed);
    assert!(ctx
        .sink
        .kinds_for(BUYER)
        .contains(&"order_completed".to_string()));
}

#[tokio::test]
async fn concurrent_forwards_pick_exactly_one() {
    let ctx = TestCtx::new().await;
    let (order, entry_a, entry_b) = both_committed(&ctx).await;

    let mut handles = Vec::new();
    for entry_id in [entry_a, entry_b] {
        let pool = ctx.pool.clone();
        let sink = ctx.sink.clone();
        handles.push(tokio::spawn(async move {
            forwarding::forward_to_buyer(&pool, sink.as_ref(), entry_id, BUYER).await
        }));
    }

    let mut ok = 0usize;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(forwarded) => {
                ok += 1;
                assert!(forwarded.forwarded_to_buyer);
            }
            Err(e) => {
                let err = app_error(e);
                assert_eq!(
                    err.http_status(),
                    http::StatusCode::CONFLICT,
                    "loser must get a conflict, got {:?}",
                    err.code
                );
            }
        }
    }
    assert_eq!(ok, 1, "exactly one forward must win");

    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::SentToBuyer);

    let forwarded: Vec<_> = db::confirmations::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.forwarded_to_buyer)
        .collect();
    assert_eq!(forwarded.len(), 1, "exactly one forwarded ledger entry");
}

#[tokio::test]
async fn double_forward_of_same_entry_conflicts() {
    let ctx = TestCtx::new().await;
    let (_, entry_a, _) = both_committed(&ctx).await;

    forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), entry_a, BUYER)
        .await
        .unwrap();
    let err = forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), entry_a, BUYER)
        .await
        .unwrap_err();
    let err = app_error(err);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn failing_sink_does_not_block_forward() {
    let ctx = TestCtx::new().await;
    let (order, entry_a, _) = both_committed(&ctx).await;

    let forwarded = forwarding::forward_to_buyer(&ctx.pool, &FailingSink, entry_a, BUYER)
        .await
        .unwrap();
    assert!(forwarded.forwarded_to_buyer);

    let head = db::orders::head(&ctx.pool, order).await.unwrap().unwrap();
    assert_eq!(head.status, OrderStatus::SentToBuyer);

    let forwarded_rows: Vec<_> = db::confirmations::list_for_order(&ctx.pool, order)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.forwarded_to_buyer)
        .collect();
    assert_eq!(forwarded_rows.len(), 1);
}

#[tokio::test]
async fn forward_to_unknown_buyer_is_refused() {
    let ctx = TestCtx::new().await;
    let (_, entry_a, _) = both_committed(&ctx).await;

    let err = forwarding::forward_to_buyer(&ctx.pool, ctx.sink(), entry_a, 404_404)
        .await
        .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::BuyerNotFound);
}
