//! Forwarding a confirmation to the buyer, and order completion.
//!
//! Forwarding appends a copy of the chosen ledger entry with
//! `forwarded_to_buyer = 1`. The partial unique index on
//! `(order_kind, order_id) WHERE forwarded_to_buyer = 1` makes "at most one
//! forwarded entry per order" a database fact rather than an application
//! check, so two concurrent forwards cannot both succeed no matter how the
//! requests interleave.

use shared::error::{AppError, ErrorCode};
use shared::models::{Confirmation, NotifyPriority, OrderRef, OrderStatus, Role};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::db;
use crate::error::{is_unique_violation, ServiceResult};
use crate::notify::{self, NotificationSink, ADMIN_INBOX};

/// Admin forwards one confirmation ledger entry to a buyer. The order moves
/// `confirmed → sent_to_buyer` and every other live submission on the order
/// is marked `superseded`, all in one transaction.
pub async fn forward_to_buyer(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    entry_id: i64,
    buyer_id: i64,
) -> ServiceResult<Confirmation> {
    let Some(row) = db::confirmations::by_id(pool, entry_id).await? else {
        return Err(AppError::new(ErrorCode::ConfirmationNotFound).into());
    };
    let entry = row.into_model()?;
    if entry.forwarded_to_buyer {
        return Err(AppError::with_message(
            ErrorCode::InvalidRequest,
            "entry is itself a forwarded copy",
        )
        .into());
    }
    if db::fleet::buyer_by_id(pool, buyer_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::BuyerNotFound).into());
    }
    let Some(head) = db::orders::head(pool, entry.order).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };

    let forwarded_id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;

    // First statement takes the write lock and decides the race: the INSERT
    // copies the entry only while its submission is still confirmed, and the
    // partial unique index rejects a second forwarded row for the order.
    let insert = sqlx::query(
        "INSERT INTO confirmations
            (id, submission_id, order_kind, order_id, order_no, supplier_id, supplier_company,
             driver_name, driver_mobile, vehicle_number, vehicle_type, load_type, tonnage,
             origin, destination, required_date, forwarded_to_buyer, buyer_id, status, created_at)
         SELECT ?1, c.submission_id, c.order_kind, c.order_id, c.order_no, c.supplier_id,
                c.supplier_company, c.driver_name, c.driver_mobile, c.vehicle_number,
                c.vehicle_type, c.load_type, c.tonnage, c.origin, c.destination,
                c.required_date, 1, ?2, 'active', ?3
         FROM confirmations c
         JOIN submissions s ON s.id = c.submission_id
         WHERE c.id = ?4 AND c.forwarded_to_buyer = 0 AND s.status = 'confirmed'",
    )
    .bind(forwarded_id)
    .bind(buyer_id)
    .bind(now)
    .bind(entry_id)
    .execute(&mut *tx)
    .await;
    match insert {
        Ok(result) if result.rows_affected() == 0 => {
            return Err(AppError::conflict("submission is no longer confirmed").into());
        }
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::AlreadyForwarded).into());
        }
        Err(e) => return Err(e.into()),
    }

    let moved = sqlx::query(db::orders::status_update_sql(entry.order.kind))
        .bind(OrderStatus::SentToBuyer.as_str())
        .bind(now)
        .bind(entry.order.id)
        .bind(OrderStatus::Confirmed.as_str())
        .execute(&mut *tx)
        .await?;
    if moved.rows_affected() == 0 {
        return Err(AppError::conflict("order status changed concurrently").into());
    }

    let superseded: Vec<(i64,)> = sqlx::query_as(
        "UPDATE submissions SET status = 'superseded'
         WHERE order_kind = ?1 AND order_id = ?2 AND id != ?3
           AND status IN ('new', 'viewed', 'responded', 'confirmed')
         RETURNING supplier_id",
    )
    .bind(entry.order.kind.as_str())
    .bind(entry.order.id)
    .bind(entry.submission_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        entry_id,
        forwarded_id,
        buyer_id,
        order = %entry.order,
        superseded = superseded.len(),
        "confirmation forwarded to buyer"
    );

    let order_label = entry.order_no.clone().unwrap_or_else(|| entry.order.to_string());
    notify::fan_out(
        sink,
        notify::request(
            Role::Buyer,
            buyer_id,
            "order_confirmed",
            "Transport confirmed",
            format!(
                "Order {order_label}: {} with {} ({}), driver {} {}",
                entry.supplier_company,
                entry.vehicle_number,
                entry.vehicle_type,
                entry.driver_name,
                entry.driver_mobile
            ),
            NotifyPriority::High,
            Some(entry.order),
        ),
    )
    .await;
    notify::fan_out(
        sink,
        notify::request(
            Role::Supplier,
            entry.supplier_id,
            "confirmation_forwarded",
            "Confirmation sent to buyer",
            format!("Your confirmation for order {order_label} was sent to the buyer"),
            NotifyPriority::Normal,
            Some(entry.order),
        ),
    )
    .await;
    for (supplier_id,) in superseded {
        notify::fan_out(
            sink,
            notify::request(
                Role::Supplier,
                supplier_id,
                "submission_superseded",
                "Order filled elsewhere",
                format!("Order {order_label} was assigned to another supplier"),
                NotifyPriority::Low,
                Some(entry.order),
            ),
        )
        .await;
    }

    Ok(Confirmation {
        id: forwarded_id,
        forwarded_to_buyer: true,
        buyer_id: Some(buyer_id),
        created_at: now,
        ..entry
    })
}

/// Close out an order: `sent_to_buyer → completed`, and every ledger entry
/// on the order becomes `completed` with it. Works for both buyer orders
/// and manually created ones.
pub async fn complete(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    order: OrderRef,
) -> ServiceResult<()> {
    let Some(head) = db::orders::head(pool, order).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };
    if head.status == OrderStatus::Completed {
        return Err(AppError::new(ErrorCode::OrderAlreadyCompleted).into());
    }
    if !head.status.can_transition(OrderStatus::Completed) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("cannot complete order in status {}", head.status),
        )
        .into());
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let moved = sqlx::query(db::orders::status_update_sql(order.kind))
        .bind(OrderStatus::Completed.as_str())
        .bind(now)
        .bind(order.id)
        .bind(OrderStatus::SentToBuyer.as_str())
        .execute(&mut *tx)
        .await?;
    if moved.rows_affected() == 0 {
        return Err(AppError::conflict("order status changed concurrently").into());
    }
    sqlx::query(
        "UPDATE confirmations SET status = 'completed'
         WHERE order_kind = ?1 AND order_id = ?2",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(order = %order, "order completed");

    let order_label = head.order_no.clone().unwrap_or_else(|| order.to_string());
    let forwarded = db::confirmations::forwarded_for_order(pool, order).await?;
    if let Some(entry) = forwarded {
        let entry = entry.into_model()?;
        if let Some(buyer_id) = entry.buyer_id {
            notify::fan_out(
                sink,
                notify::request(
                    Role::Buyer,
                    buyer_id,
                    "order_completed",
                    "Order completed",
                    format!("Order {order_label} has been completed"),
                    NotifyPriority::Normal,
                    Some(order),
                ),
            )
            .await;
        }
        notify::fan_out(
            sink,
            notify::request(
                Role::Supplier,
                entry.supplier_id,
                "order_completed",
                "Order completed",
                format!("Order {order_label} has been completed"),
                NotifyPriority::Normal,
                Some(order),
            ),
        )
        .await;
    } else if let Some(buyer_id) = head.buyer_id {
        notify::fan_out(
            sink,
            notify::request(
                Role::Buyer,
                buyer_id,
                "order_completed",
                "Order completed",
                format!("Order {order_label} has been completed"),
                NotifyPriority::Normal,
                Some(order),
            ),
        )
        .await;
    }
    notify::fan_out(
        sink,
        notify::request(
            Role::Admin,
            ADMIN_INBOX,
            "order_completed",
            "Order completed",
            format!("Order {order_label} is closed"),
            NotifyPriority::Low,
            Some(order),
        ),
    )
    .await;

    Ok(())
}
