use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cart::{Cart, CartLine};
use crate::money;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Signed; a delta that takes the quantity to zero or below removes the line.
    pub delta: i32,
}

/// Wholesale cart payload, used both for the save upsert and the login-time
/// merge.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemsRequest {
    pub items: Vec<CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_cents: i64,
    pub total_display: String,
    pub count: i64,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total_cents = cart.total_cents();
        Self {
            total_cents,
            total_display: money::format_usd(total_cents),
            count: cart.count(),
            items: cart.into_lines(),
        }
    }
}
