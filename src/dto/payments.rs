use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PaymentMethod;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPaymentMethodRequest {
    pub card_brand: String,
    pub last_four: String,
    pub exp_month: i32,
    pub exp_year: i32,
    pub cardholder_name: Option<String>,
    /// The caller decides whether a new card becomes the default (the
    /// storefront flags the user's first card); the gateway does not infer it.
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentMethodList {
    #[schema(value_type = Vec<PaymentMethod>)]
    pub items: Vec<PaymentMethod>,
}
