//! Submission Store operations: broadcast, viewed/respond, commit, withdraw.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Confirmation, ConfirmationStatus, NotifyPriority, OrderRef, OrderStatus, Role, Submission,
    SubmissionStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db;
use crate::error::{is_unique_violation, ServiceResult};
use crate::notify::{self, NotificationSink, ADMIN_INBOX};

/// Insert one submission row per supplier, skipping pairs that already
/// exist — re-broadcast is a no-op, not a duplicate. Returns the supplier
/// ids that actually received a new row.
pub(crate) async fn insert_candidates(
    tx: &mut Transaction<'_, Sqlite>,
    order: OrderRef,
    supplier_ids: &[i64],
    now: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    let mut inserted = Vec::new();
    for &supplier_id in supplier_ids {
        let result = sqlx::query(
            "INSERT INTO submissions (id, order_kind, order_id, supplier_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'new', ?5)
             ON CONFLICT (order_kind, order_id, supplier_id) DO NOTHING",
        )
        .bind(snowflake_id())
        .bind(order.kind.as_str())
        .bind(order.id)
        .bind(supplier_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() > 0 {
            inserted.push(supplier_id);
        }
    }
    Ok(inserted)
}

/// Broadcast an order to a set of suppliers. The order must already be open
/// for fulfillment (`assigned`, or `confirmed` when widening the pool after
/// a first commit). Returns the number of submissions created.
pub async fn broadcast(
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
    if !matches!(head.status, OrderStatus::Assigned | OrderStatus::Confirmed) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("cannot broadcast order in status {}", head.status),
        )
        .into());
    }
    for &supplier_id in supplier_ids {
        if db::fleet::supplier_by_id(pool, supplier_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::SupplierNotFound)
                .with_detail("supplier_id", supplier_id)
                .into());
        }
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;
    let inserted = insert_candidates(&mut tx, order, supplier_ids, now).await?;
    tx.commit().await?;

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

    Ok(inserted.len())
}

/// Load a submission and check it belongs to the calling supplier.
async fn owned_submission(
    pool: &SqlitePool,
    supplier_id: i64,
    submission_id: i64,
) -> ServiceResult<Submission> {
    let Some(row) = db::submissions::by_id(pool, submission_id).await? else {
        return Err(AppError::new(ErrorCode::SubmissionNotFound).into());
    };
    let submission = row.into_model()?;
    if submission.supplier_id != supplier_id {
        return Err(AppError::forbidden("submission belongs to another supplier").into());
    }
    Ok(submission)
}

/// Supplier opened the offer: `new → viewed`. Idempotent for later statuses.
pub async fn mark_viewed(
    pool: &SqlitePool,
    supplier_id: i64,
    submission_id: i64,
) -> ServiceResult<Submission> {
    let submission = owned_submission(pool, supplier_id, submission_id).await?;
    if submission.status != SubmissionStatus::New {
        return Ok(submission);
    }
    sqlx::query("UPDATE submissions SET status = 'viewed' WHERE id = ?1 AND status = 'new'")
        .bind(submission_id)
        .execute(pool)
        .await?;
    Ok(Submission {
        status: SubmissionStatus::Viewed,
        ..submission
    })
}

/// Supplier responds without committing a vehicle yet: interest
/// (`responded`) or decline (`rejected`).
pub async fn respond(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    supplier_id: i64,
    submission_id: i64,
    response: SubmissionStatus,
) -> ServiceResult<Submission> {
    if !matches!(
        response,
        SubmissionStatus::Responded | SubmissionStatus::Rejected
    ) {
        return Err(AppError::validation(format!(
            "response must be responded or rejected, got {response}"
        ))
        .into());
    }
    let submission = owned_submission(pool, supplier_id, submission_id).await?;
    if !submission.status.can_commit() {
        return Err(AppError::with_message(
            ErrorCode::SubmissionTerminal,
            format!("submission is already {}", submission.status),
        )
        .into());
    }

    let now = now_millis();
    let result = sqlx::query(
        "UPDATE submissions SET status = ?1, responded_at = ?2
         WHERE id = ?3 AND status IN ('new', 'viewed', 'responded')",
    )
    .bind(response.as_str())
    .bind(now)
    .bind(submission_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::SubmissionTerminal).into());
    }

    notify::fan_out(
        sink,
        notify::request(
            Role::Admin,
            ADMIN_INBOX,
            "submission_response",
            "Supplier responded",
            format!("Supplier {supplier_id} marked submission {response}"),
            NotifyPriority::Normal,
            Some(submission.order),
        ),
    )
    .await;

    Ok(Submission {
        status: response,
        responded_at: Some(now),
        ..submission
    })
}

/// Supplier commits a driver and vehicle: the submission becomes
/// `confirmed` and the confirmation snapshot is appended to the ledger, in
/// one transaction. Driver and vehicle must belong to the committing
/// supplier; a cross-tenant reference is a validation error.
pub async fn commit(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    supplier_id: i64,
    submission_id: i64,
    driver_id: i64,
    vehicle_id: i64,
) -> ServiceResult<Confirmation> {
    let submission = owned_submission(pool, supplier_id, submission_id).await?;
    if !submission.status.can_commit() {
        return Err(AppError::with_message(
            ErrorCode::SubmissionTerminal,
            format!("cannot commit submission in status {}", submission.status),
        )
        .into());
    }

    let Some(driver) = db::fleet::driver_by_id(pool, driver_id).await? else {
        return Err(AppError::new(ErrorCode::DriverNotFound).into());
    };
    let Some(vehicle) = db::fleet::vehicle_by_id(pool, vehicle_id).await? else {
        return Err(AppError::new(ErrorCode::VehicleNotFound).into());
    };
    if driver.supplier_id != supplier_id {
        return Err(AppError::with_message(
            ErrorCode::CrossTenantReference,
            format!("driver {driver_id} belongs to supplier {}", driver.supplier_id),
        )
        .into());
    }
    if vehicle.supplier_id != supplier_id {
        return Err(AppError::with_message(
            ErrorCode::CrossTenantReference,
            format!(
                "vehicle {vehicle_id} belongs to supplier {}",
                vehicle.supplier_id
            ),
        )
        .into());
    }
    let Some(supplier) = db::fleet::supplier_by_id(pool, supplier_id).await? else {
        return Err(AppError::new(ErrorCode::SupplierNotFound).into());
    };
    let Some(head) = db::orders::head(pool, submission.order).await? else {
        return Err(AppError::new(ErrorCode::OrderNotFound).into());
    };
    if head.status.is_terminal() {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!("order is already {}", head.status),
        )
        .into());
    }

    let confirmation_id = snowflake_id();
    let now = now_millis();
    let mut tx = pool.begin().await?;

    // Guarded write first: the status re-check closes the race against a
    // concurrent respond/withdraw between the read above and this point.
    let result = sqlx::query(
        "UPDATE submissions
         SET status = 'confirmed', driver_id = ?1, vehicle_id = ?2, responded_at = ?3
         WHERE id = ?4 AND status IN ('new', 'viewed', 'responded')",
    )
    .bind(driver_id)
    .bind(vehicle_id)
    .bind(now)
    .bind(submission_id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::SubmissionTerminal).into());
    }

    let insert = sqlx::query(
        "INSERT INTO confirmations
            (id, submission_id, order_kind, order_id, order_no, supplier_id, supplier_company,
             driver_name, driver_mobile, vehicle_number, vehicle_type, load_type, tonnage,
             origin, destination, required_date, forwarded_to_buyer, buyer_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 0, NULL, 'active', ?17)",
    )
    .bind(confirmation_id)
    .bind(submission_id)
    .bind(submission.order.kind.as_str())
    .bind(submission.order.id)
    .bind(&head.order_no)
    .bind(supplier_id)
    .bind(&supplier.company)
    .bind(&driver.name)
    .bind(&driver.mobile)
    .bind(&vehicle.number)
    .bind(&vehicle.vehicle_type)
    .bind(&head.load_type)
    .bind(head.tonnage)
    .bind(&head.origin)
    .bind(&head.destination)
    .bind(&head.required_date)
    .bind(now)
    .execute(&mut *tx)
    .await;
    if let Err(e) = insert {
        if is_unique_violation(&e) {
            return Err(AppError::new(ErrorCode::DuplicateConfirmation).into());
        }
        return Err(e.into());
    }

    // First confirmation advances the order; later ones leave it alone.
    sqlx::query(db::orders::status_update_sql(submission.order.kind))
        .bind(OrderStatus::Confirmed.as_str())
        .bind(now)
        .bind(submission.order.id)
        .bind(OrderStatus::Assigned.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        submission_id,
        confirmation_id,
        order = %submission.order,
        "supplier committed driver/vehicle"
    );

    let order_label = head.order_no.clone().unwrap_or_else(|| submission.order.to_string());
    notify::fan_out(
        sink,
        notify::request(
            Role::Admin,
            ADMIN_INBOX,
            "submission_confirmed",
            "Supplier confirmed",
            format!(
                "{} confirmed order {order_label} with {} ({})",
                supplier.company, driver.name, vehicle.number
            ),
            NotifyPriority::High,
            Some(submission.order),
        ),
    )
    .await;

    Ok(Confirmation {
        id: confirmation_id,
        submission_id,
        order: submission.order,
        order_no: head.order_no,
        supplier_id,
        supplier_company: supplier.company,
        driver_name: driver.name,
        driver_mobile: driver.mobile,
        vehicle_number: vehicle.number,
        vehicle_type: vehicle.vehicle_type,
        load_type: head.load_type,
        tonnage: head.tonnage,
        origin: head.origin,
        destination: head.destination,
        required_date: head.required_date,
        forwarded_to_buyer: false,
        buyer_id: None,
        status: ConfirmationStatus::Active,
        created_at: now,
    })
}

/// Supplier retracts a submission. Permitted only while no forwarded ledger
/// entry references it; after forwarding it fails with a conflict.
pub async fn withdraw(
    pool: &SqlitePool,
    sink: &dyn NotificationSink,
    supplier_id: i64,
    submission_id: i64,
) -> ServiceResult<()> {
    let submission = owned_submission(pool, supplier_id, submission_id).await?;
    if db::confirmations::forwarded_for_submission(pool, submission_id).await? {
        return Err(AppError::new(ErrorCode::WithdrawAfterForward).into());
    }

    let result = sqlx::query(
        "UPDATE submissions SET status = 'withdrawn'
         WHERE id = ?1
           AND status IN ('new', 'viewed', 'responded', 'confirmed')
           AND NOT EXISTS (
               SELECT 1 FROM confirmations
               WHERE submission_id = ?1 AND forwarded_to_buyer = 1
           )",
    )
    .bind(submission_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        // Either terminal already, or a forward landed since the check above.
        if db::confirmations::forwarded_for_submission(pool, submission_id).await? {
            return Err(AppError::new(ErrorCode::WithdrawAfterForward).into());
        }
        return Err(AppError::new(ErrorCode::SubmissionTerminal).into());
    }

    tracing::info!(submission_id, supplier_id, "submission withdrawn");

    notify::fan_out(
        sink,
        notify::request(
            Role::Admin,
            ADMIN_INBOX,
            "submission_withdrawn",
            "Supplier withdrew",
            format!("Supplier {supplier_id} withdrew submission {submission_id}"),
            NotifyPriority::Normal,
            Some(submission.order),
        ),
    )
    .await;

    Ok(())
}
