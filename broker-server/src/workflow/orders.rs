//! Order Store operations: draft, submit, admin create, assign, status
//! transitions, cancel/reject, delete.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    BuyerOrder, Location, LoadDetails, ManualOrder, NotifyPriority, OrderRef, OrderStatus, Role,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::db::orders::BuyerOrderRow;
use crate::db::{self, orders::OrderHead};
use crate::error::ServiceResult;
use crate::notify::{self, NotificationSink, ADMIN_INBOX};
use crate::workflow::{submissions, ORDER_PREFIX};

/// Fields common to both order variants at creation time.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub load: LoadDetails,
    pub origin: Location,
    pub destination: Location,
    pub required_date: String,
    pub instructions: Option<String>,
}

/// Create a buyer draft. No order number yet; that is allocated on submit.
pub async fn create_draft(
    pool: &SqlitePool,
    buyer_id: i64,
    draft: OrderDraft,
) -> ServiceResult<BuyerOrder> {
    if db::fleet::buyer_by_id(pool, buyer_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::BuyerNotFound).into());
    }

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO buyer_orders
            (id, buyer_id, load_type, tonnage, unit_count,
             origin_state, origin_district, origin_place, origin_sub_area,
             dest_state, dest_district, dest_place, dest_sub_area,
             required_date, instructions, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 'draft', ?16, ?16)",
    )
    .bind(id)
    .bind(buyer_id)
    .bind(&draft.load.load_type)
    .bind(draft.load.tonnage)
    .bind(draft.load.unit_count)
    .bind(&draft.origin.state)
    .bind(&draft.origin.district)
    .bind(&draft.origin.place)
    .bind(&draft.origin.sub_area)
    .bind(&draft.destination.state)
    .bind(&draft.destination.district)
    .bind(&draft.destination.place)
    .bind(&draft.destination.sub_area)
    .bind(&draft.required_date)
    .bind(&draft.instructions)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!(order_id = id, buyer_id, "buyer draft created");

    Ok(BuyerOrder {
        id,
        order_no: None,
        buyer_id,
        load: draft.load,
        origin: draft.origin,
        destination: draft.destination,
        required_date: draft.required_date,
        instructions: draft.instructions,
        status: OrderStatus::Draft,
        created_at: now,
        updated_at: now,
    })
}

/// Submit a draft: allocates the order number and moves `draft → submitted`.
///
/// The counter bump is the first statement of the transaction, so concurrent
/// submits serialize on the write lock and never read a stale sequence —
/// allocation is collision-free.
pub async fn submit(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    buyer_id: i64,
    order_id: i64,
) -> ServiceResult<BuyerOrder> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let seq: i64 = sqlx::query_scalar(
        "UPDATE order_counters SET next_seq = next_seq + 1 WHERE prefix = ?1 RETURNING next_seq",
    )
    .bind(ORDER_PREFIX)
    .fetch_one(&mut *tx)
    .await?;

    let row: Option<BuyerOrderRow> = sqlx::query_as("SELECT * FROM buyer_orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };
    let order = row.into_model()?;

    if order.buyer_id != buyer_id {
        return Err(AppError::forbidden("order belongs to another buyer").into());
    }
    if !order.status.can_transition(OrderStatus::Submitted) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("cannot submit order in status {}", order.status),
        )
        .into());
    }

    let order_no = match &order.order_no {
        Some(existing) => existing.clone(),
        None => format!("{ORDER_PREFIX}-{seq}"),
    };

    sqlx::query(
        "UPDATE buyer_orders SET order_no = ?1, status = 'submitted', updated_at = ?2
         WHERE id = ?3",
    )
    .bind(&order_no)
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(order_id, order_no = %order_no, "order submitted");

    notify::fan_out(
        sink,
        notify::request(
            Role::Admin,
            ADMIN_INBOX,
            "order_submitted",
            "New order submitted",
            format!(
                "Order {order_no}: {} ({} t), {} to {}",
                order.load.load_type,
                order.load.tonnage,
                order.origin.summary(),
                order.destination.summary()
            ),
            NotifyPriority::Normal,
            Some(OrderRef::buyer(order_id)),
        ),
    )
    .await;

    Ok(BuyerOrder {
        order_no: Some(order_no),
        status: OrderStatus::Submitted,
        updated_at: now,
        ..order
    })
}

/// Admin-created ("manual") order. Starts at `pending` with the order number
/// already allocated; an optional direct supplier assignment also creates
/// the corresponding submission.
pub async fn admin_create(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    admin_id: i64,
    draft: OrderDraft,
    assigned_supplier_id: Option<i64>,
) -> ServiceResult<ManualOrder> {
    if let Some(supplier_id) = assigned_supplier_id {
        if db::fleet::supplier_by_id(pool, supplier_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::SupplierNotFound).into());
        }
    }

    let id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let seq: i64 = sqlx::query_scalar(
        "UPDATE order_counters SET next_seq = next_seq + 1 WHERE prefix = ?1 RETURNING next_seq",
    )
    .bind(ORDER_PREFIX)
    .fetch_one(&mut *tx)
    .await?;
    let order_no = format!("{ORDER_PREFIX}-{seq}");

    sqlx::query(
        "INSERT INTO manual_orders
            (id, order_no, created_by, assigned_supplier_id, load_type, tonnage, unit_count,
             origin_state, origin_district, origin_place, origin_sub_area,
             dest_state, dest_district, dest_place, dest_sub_area,
             required_date, instructions, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 'pending', ?18, ?18)",
    )
    .bind(id)
    .bind(&order_no)
    .bind(admin_id)
    .bind(assigned_supplier_id)
    .bind(&draft.load.load_type)
    .bind(draft.load.tonnage)
    .bind(draft.load.unit_count)
    .bind(&draft.origin.state)
    .bind(&draft.origin.district)
    .bind(&draft.origin.place)
    .bind(&draft.origin.sub_area)
    .bind(&draft.destination.state)
    .bind(&draft.destination.district)
    .bind(&draft.destination.place)
    .bind(&draft.destination.sub_area)
    .bind(&draft.required_date)
    .bind(&draft.instructions)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if let Some(supplier_id) = assigned_supplier_id {
        submissions::insert_candidates(&mut tx, OrderRef::manual(id), &[supplier_id], now).await?;
    }

    tx.commit().await?;

    tracing::info!(order_id = id, order_no = %order_no, "manual order created");

    if let Some(supplier_id) = assigned_supplier_id {
        notify::fan_out(
            sink,
            notify::request(
                Role::Supplier,
                supplier_id,
                "order_offered",
                "New transport order",
                format!(
                    "Order {order_no}: {} ({} t), {} to {}",
                    draft.load.load_type,
                    draft.load.tonnage,
                    draft.origin.summary(),
                    draft.destination.summary()
                ),
                NotifyPriority::Normal,
                Some(OrderRef::manual(id)),
            ),
        )
        .await;
    }

    Ok(ManualOrder {
        id,
        order_no: Some(order_no),
        created_by: admin_id,
        assigned_supplier_id,
        load: draft.load,
        origin: draft.origin,
        destination: draft.destination,
        required_date: draft.required_date,
        instructions: draft.instructions,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

/// Admin assigns suppliers: advances the order to `assigned` (through
/// `pending` for a freshly submitted buyer order) and broadcasts, all in one
/// transaction. Returns the number of submissions actually created.
pub async fn assign(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    order: OrderRef,
    supplier_ids: &[i64],
) -> ServiceResult<usize> {
    if supplier_ids.is_empty() {
        return Err(AppError::validation("at least one supplier is required").into());
    }
    let Some(head) = db::orders::head(pool, order).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };
    for &supplier_id in supplier_ids {
        if db::fleet::supplier_by_id(pool, supplier_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::SupplierNotFound)
                .with_detail("supplier_id", supplier_id)
                .into());
        }
    }

    // Path to `assigned` from the current status; re-broadcast of an already
    // assigned order adds suppliers without a status change.
    let steps: &[OrderStatus] = match head.status {
        OrderStatus::Submitted => &[OrderStatus::Pending, OrderStatus::Assigned],
        OrderStatus::Pending => &[OrderStatus::Assigned],
        OrderStatus::Assigned => &[],
        other => {
            return Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("cannot assign order in status {other}"),
            )
            .into());
        }
    };

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let mut current = head.status;
    for &next in steps {
        let result = sqlx::query(db::orders::status_update_sql(order.kind))
            .bind(next.as_str())
            .bind(now)
            .bind(order.id)
            .bind(current.as_str())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::conflict("order status changed concurrently").into());
        }
        current = next;
    }

    let inserted = submissions::insert_candidates(&mut tx, order, supplier_ids, now).await?;
    tx.commit().await?;

    tracing::info!(
        order = %order,
        suppliers = supplier_ids.len(),
        created = inserted.len(),
        "order assigned and broadcast"
    );

    let order_label = head.order_no.clone().unwrap_or_else(|| order.to_string());
    for supplier_id in &inserted {
        notify::fan_out(
            sink,
            notify::request(
                Role::Supplier,
                *supplier_id,
                "order_offered",
                "New transport order",
                format!(
                    "Order {order_label}: {} ({} t), {} to {}",
                    head.load_type, head.tonnage, head.origin, head.destination
                ),
                NotifyPriority::Normal,
                Some(order),
            ),
        )
        .await;
    }
    if let Some(buyer_id) = head.buyer_id {
        notify::fan_out(
            sink,
            notify::request(
                Role::Buyer,
                buyer_id,
                "order_assigned",
                "Order in progress",
                format!("Order {order_label} has been sent to suppliers"),
                NotifyPriority::Normal,
                Some(order),
            ),
        )
        .await;
    }

    Ok(inserted.len())
}

/// Guarded status transition. Advances exactly one rung or terminates with
/// cancel/reject; anything that would skip admin mediation is rejected.
/// Buyers are only notified from `assigned` upward.
pub async fn update_status(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    order: OrderRef,
    next: OrderStatus,
) -> ServiceResult<OrderHead> {
    let Some(head) = db::orders::head(pool, order).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };
    if !head.status.can_transition(next) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("cannot move order from {} to {}", head.status, next),
        )
        .into());
    }

    let now = now_millis();
    let result = sqlx::query(db::orders::status_update_sql(order.kind))
        .bind(next.as_str())
        .bind(now)
        .bind(order.id)
        .bind(head.status.as_str())
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::conflict("order status changed concurrently").into());
    }

    tracing::info!(order = %order, from = %head.status, to = %next, "order status updated");

    if let Some(buyer_id) = head.buyer_id {
        if buyer_visible(head.status, next) {
            let order_label = head.order_no.clone().unwrap_or_else(|| order.to_string());
            notify::fan_out(
                sink,
                notify::request(
                    Role::Buyer,
                    buyer_id,
                    "order_status",
                    "Order update",
                    format!("Order {order_label} is now {next}"),
                    NotifyPriority::Normal,
                    Some(order),
                ),
            )
            .await;
        }
    }

    Ok(OrderHead {
        status: next,
        ..head
    })
}

/// Buyer-facing visibility rule: transitions below `pending` stay silent,
/// transitions at or above `assigned` notify; terminal failures notify once
/// the order had reached the buyer-visible stage.
fn buyer_visible(from: OrderStatus, next: OrderStatus) -> bool {
    match next {
        OrderStatus::Cancelled | OrderStatus::Rejected => matches!(
            from,
            OrderStatus::Assigned | OrderStatus::Confirmed | OrderStatus::SentToBuyer
        ),
        OrderStatus::Draft | OrderStatus::Submitted | OrderStatus::Pending => false,
        _ => true,
    }
}

pub async fn cancel(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    order: OrderRef,
) -> ServiceResult<()> {
    update_status(pool, sink, order, OrderStatus::Cancelled).await?;
    Ok(())
}

pub async fn reject(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    order: OrderRef,
) -> ServiceResult<()> {
    update_status(pool, sink, order, OrderStatus::Rejected).await?;
    Ok(())
}

/// Delete an order. Refused with `Conflict` while submissions or ledger
/// entries still reference it; the ledger's audit value outlives the order.
pub async fn delete(pool: &SqlitePool, order: OrderRef) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let referenced: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM submissions WHERE order_kind = ?1 AND order_id = ?2
         UNION ALL
         SELECT 1 FROM confirmations WHERE order_kind = ?1 AND order_id = ?2
         LIMIT 1",
    )
    .bind(order.kind.as_str())
    .bind(order.id)
    .fetch_optional(&mut *tx)
    .await?;
    if referenced.is_some() {
        return Err(AppError::new(ErrorCode::OrderHasLiveReferences).into());
    }

    let result = sqlx::query(db::orders::delete_sql(order.kind))
        .bind(order.id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    }

    tx.commit().await?;
    tracing::info!(order = %order, "order deleted");
    Ok(())
}
