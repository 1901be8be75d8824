use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{AddPaymentMethodRequest, PaymentMethodList},
    entity::payment_methods::{
        ActiveModel as MethodActive, Column as MethodCol, Entity as PaymentMethods,
        Model as MethodModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::PaymentMethod,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// The caller's saved cards, default-flagged entries first.
pub async fn list_methods(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PaymentMethodList>> {
    let items = PaymentMethods::find()
        .filter(MethodCol::UserId.eq(user.user_id))
        .order_by_desc(MethodCol::IsDefault)
        .order_by_desc(MethodCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(method_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        PaymentMethodList { items },
        None,
    ))
}

pub async fn add_method(
    state: &AppState,
    user: &AuthUser,
    payload: AddPaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    if payload.last_four.len() != 4 || !payload.last_four.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "last_four must be exactly four digits".into(),
        ));
    }
    if !(1..=12).contains(&payload.exp_month) {
        return Err(AppError::BadRequest("exp_month must be 1-12".into()));
    }

    let method = MethodActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        card_brand: Set(payload.card_brand),
        last_four: Set(payload.last_four),
        exp_month: Set(payload.exp_month),
        exp_year: Set(payload.exp_year),
        cardholder_name: Set(payload.cardholder_name),
        is_default: Set(payload.is_default),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_method_add",
        Some("payment_methods"),
        Some(serde_json::json!({ "payment_method_id": method.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Card added",
        method_from_entity(method),
        Some(Meta::empty()),
    ))
}

/// Deletion is scoped to the caller's own rows; there is no row-level
/// security below this layer.
pub async fn delete_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = PaymentMethods::delete_many()
        .filter(
            Condition::all()
                .add(MethodCol::Id.eq(id))
                .add(MethodCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_method_delete",
        Some("payment_methods"),
        Some(serde_json::json!({ "payment_method_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Card removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Unset-all then set-one, inside a single transaction so no reader can
/// observe zero or two default cards.
pub async fn set_default_method(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PaymentMethod>> {
    let txn = state.orm.begin().await?;

    let target = PaymentMethods::find()
        .filter(
            Condition::all()
                .add(MethodCol::Id.eq(id))
                .add(MethodCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;
    let target = match target {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    PaymentMethods::update_many()
        .col_expr(MethodCol::IsDefault, Expr::value(false))
        .filter(MethodCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    let mut active: MethodActive = target.into();
    active.is_default = Set(true);
    let method = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_method_set_default",
        Some("payment_methods"),
        Some(serde_json::json!({ "payment_method_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Default card updated",
        method_from_entity(method),
        Some(Meta::empty()),
    ))
}

fn method_from_entity(model: MethodModel) -> PaymentMethod {
    PaymentMethod {
        id: model.id,
        card_brand: model.card_brand,
        last_four: model.last_four,
        exp_month: model.exp_month,
        exp_year: model.exp_year,
        cardholder_name: model.cardholder_name,
        is_default: model.is_default,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
