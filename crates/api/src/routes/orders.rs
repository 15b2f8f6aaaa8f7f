//! Order issue, lookup and status update endpoints.

use std::sync::Arc;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::Json;
use common::OrderId;
use domain::Order;
use message_bus::MessageBus;
use order_store::OrderStore;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

/// Form body of `POST /users/{user_id}/orders`.
///
/// Fields stay raw strings so the configured input policy decides how
/// malformed numbers are treated.
#[derive(Debug, Deserialize)]
pub struct IssueOrderForm {
    #[serde(default)]
    pub total_items: String,
    #[serde(default)]
    pub subtotal: String,
}

/// Form body of `PUT|PATCH /orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    #[serde(default)]
    pub order_status: String,
}

pub(crate) fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse()
        .map_err(|e: common::ParseOrderIdError| ApiError::BadRequest(e.to_string()))
}

// -- Handlers --

/// POST /users/{user_id}/orders: issue a new order.
#[tracing::instrument(skip(state, form))]
pub async fn issue<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    Path(user_id): Path<String>,
    Form(form): Form<IssueOrderForm>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let order = state
        .orders
        .issue_from_input(user_id, &form.total_items, &form.subtotal)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: load an order.
#[tracing::instrument(skip(state))]
pub async fn get<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get(order_id).await?;
    Ok(Json(order))
}

/// PUT|PATCH /orders/{id}: change an order's status.
#[tracing::instrument(skip(state, form), fields(order_status = %form.order_status))]
pub async fn update_status<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    Path(id): Path<String>,
    Form(form): Form<UpdateStatusForm>,
) -> Result<(StatusCode, Json<Order>), ApiError>
where
    S: OrderStore + 'static,
    B: MessageBus + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .update_status_from_input(order_id, &form.order_status)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_id() {
        let id = OrderId::new();
        assert_eq!(parse_order_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_order_id("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_forms_tolerate_missing_fields() {
        let form: IssueOrderForm = serde_json::from_str("{}").unwrap();
        assert!(form.total_items.is_empty());
        assert!(form.subtotal.is_empty());
    }
}
