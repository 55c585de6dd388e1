//! API routes for broker-server

pub mod admin;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod submissions;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use shared::error::{AppError, ErrorCode};
use shared::models::OrderRef;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Parse a `{kind}/{id}` path pair into an order reference.
pub(crate) fn parse_order_ref(kind: &str, id: i64) -> Result<OrderRef, AppError> {
    let kind = kind
        .parse()
        .map_err(|_| AppError::with_message(ErrorCode::InvalidRequest, "unknown order kind"))?;
    Ok(OrderRef { kind, id })
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let buyer = Router::new()
        .route("/api/orders", post(orders::create_order).get(orders::list_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/submit", post(orders::submit_order))
        .route("/api/confirmations", get(orders::list_confirmations));

    let supplier = Router::new()
        .route("/api/supplier/fleet", get(submissions::list_fleet))
        .route(
            "/api/supplier/submissions",
            get(submissions::list_submissions),
        )
        .route(
            "/api/supplier/submissions/{id}/viewed",
            post(submissions::mark_viewed),
        )
        .route(
            "/api/supplier/submissions/{id}/respond",
            post(submissions::respond),
        )
        .route(
            "/api/supplier/submissions/{id}/commit",
            post(submissions::commit),
        )
        .route(
            "/api/supplier/submissions/{id}/withdraw",
            post(submissions::withdraw),
        );

    let admin = Router::new()
        .route("/api/admin/orders", post(admin::create_order))
        .route(
            "/api/admin/orders/{kind}/{id}",
            delete(admin::delete_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/assign",
            post(admin::assign_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/broadcast",
            post(admin::broadcast_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/cancel",
            post(admin::cancel_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/reject",
            post(admin::reject_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/complete",
            post(admin::complete_order),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/submissions",
            get(admin::list_order_submissions),
        )
        .route(
            "/api/admin/orders/{kind}/{id}/confirmations",
            get(admin::list_order_confirmations),
        )
        .route(
            "/api/admin/confirmations/{id}/forward",
            post(admin::forward_confirmation),
        );

    let inbox = Router::new()
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        .route("/api/notifications/clear", post(notifications::clear));

    let authed = Router::new()
        .merge(buyer)
        .merge(supplier)
        .merge(admin)
        .merge(inbox)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
