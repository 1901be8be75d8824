use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{AddPaymentMethodRequest, PaymentMethodList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PaymentMethod,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payment_methods).post(add_payment_method))
        .route("/{id}", axum::routing::delete(delete_payment_method))
        .route("/{id}/default", post(set_default_payment_method))
}

#[utoipa::path(
    get,
    path = "/api/payment-methods",
    responses(
        (status = 200, description = "Saved cards, default first", body = ApiResponse<PaymentMethodList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PaymentMethodList>>> {
    let resp = payment_service::list_methods(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment-methods",
    request_body = AddPaymentMethodRequest,
    responses(
        (status = 200, description = "Save card display metadata", body = ApiResponse<PaymentMethod>),
        (status = 400, description = "Bad card fields")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn add_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddPaymentMethodRequest>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp = payment_service::add_method(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/payment-methods/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment method ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not the caller's card")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn delete_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = payment_service::delete_method(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment-methods/{id}/default",
    params(
        ("id" = Uuid, Path, description = "Payment method ID")
    ),
    responses(
        (status = 200, description = "Exactly one default afterwards", body = ApiResponse<PaymentMethod>),
        (status = 404, description = "Not the caller's card")
    ),
    security(("bearer_auth" = [])),
    tag = "Payment Methods"
)]
pub async fn set_default_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp = payment_service::set_default_method(&state, &user, id).await?;
    Ok(Json(resp))
}
