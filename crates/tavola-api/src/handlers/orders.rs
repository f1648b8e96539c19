//! Order handlers
//!
//! A minimal order intake endpoint. Fulfillment lives in another
//! system; this one only accepts the order behind the full guard chain
//! and acknowledges it.

use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extractors::{Authenticated, ValidatedJson};
use crate::response::{ApiResult, Created};

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItem {
    #[validate(length(min = 1, max = 120, message = "Item name must be 1-120 characters"))]
    pub name: String,

    #[validate(range(min = 1, max = 99, message = "Quantity must be 1-99"))]
    pub quantity: u32,
}

/// Place an order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 50, message = "Order must have 1-50 items"))]
    #[validate(nested)]
    pub items: Vec<OrderItem>,
}

/// Acknowledgement for an accepted order
#[derive(Debug, Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: Uuid,
    pub status: &'static str,
    pub placed_by: Uuid,
}

/// Place an order for the caller's tenant
///
/// POST /orders
pub async fn place_order(
    Authenticated(auth): Authenticated,
    ValidatedJson(request): ValidatedJson<PlaceOrderRequest>,
) -> ApiResult<Created<Json<OrderPlacedResponse>>> {
    tracing::info!(
        user_id = %auth.user_id,
        tenant_id = %auth.tenant_id,
        items = request.items.len(),
        "Order accepted"
    );

    Ok(Created(Json(OrderPlacedResponse {
        order_id: Uuid::new_v4(),
        status: "received",
        placed_by: auth.user_id.as_uuid(),
    })))
}
