use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{Cart, CartLine},
    dto::cart::CartView,
    entity::saved_carts::{ActiveModel as SavedCartActive, Column as CartCol, Entity as SavedCarts},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Read the user's persisted cart, or an empty one when no row exists.
/// Generic over the connection so checkout can call it inside its
/// transaction.
pub async fn load_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Cart> {
    let saved = SavedCarts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?;

    match saved {
        Some(model) => {
            let lines: Vec<CartLine> = serde_json::from_value(model.items)
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
            Ok(Cart::from_lines(lines))
        }
        None => Ok(Cart::new()),
    }
}

/// Wholesale upsert keyed by user id; a second save overwrites.
async fn persist_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid, cart: &Cart) -> AppResult<()> {
    let items =
        serde_json::to_value(cart.lines()).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let active = SavedCartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        items: Set(items),
        updated_at: Set(Utc::now().into()),
    };

    SavedCarts::insert(active)
        .on_conflict(
            OnConflict::column(CartCol::UserId)
                .update_columns([CartCol::Items, CartCol::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;

    Ok(())
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("OK", cart.into(), None))
}

pub async fn save_cart(
    state: &AppState,
    user: &AuthUser,
    items: Vec<CartLine>,
) -> AppResult<ApiResponse<CartView>> {
    let cart = Cart::from_lines(items);
    persist_cart(&state.orm, user.user_id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_save",
        Some("saved_carts"),
        Some(serde_json::json!({ "count": cart.count() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Cart saved", cart.into(), None))
}

/// Add one unit of a catalog product, snapshotting title, price and image.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
) -> AppResult<ApiResponse<CartView>> {
    let product = crate::entity::Products::find_by_id(product_id)
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => super::product_service::product_from_entity(p),
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };

    let mut cart = load_cart(&state.orm, user.user_id).await?;
    cart.add(&product);
    persist_cart(&state.orm, user.user_id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("saved_carts"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", cart.into(), None))
}

/// Apply a signed quantity delta; unknown product ids are a no-op and a
/// quantity at or below zero removes the line.
pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
    delta: i32,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(&state.orm, user.user_id).await?;
    cart.update_quantity(product_id, delta);
    persist_cart(&state.orm, user.user_id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("saved_carts"),
        Some(serde_json::json!({ "product_id": product_id, "delta": delta })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Cart updated", cart.into(), None))
}

/// Remove a line; an absent product id is not an error.
pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: i32,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(&state.orm, user.user_id).await?;
    cart.remove(product_id);
    persist_cart(&state.orm, user.user_id, &cart).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("saved_carts"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Removed from cart", cart.into(), None))
}

/// Login-time reconciliation. The persisted cart wins when it is non-empty;
/// an empty (or missing) persisted cart never overwrites the submitted
/// local cart, which is saved instead when it has lines.
pub async fn merge_cart(
    state: &AppState,
    user: &AuthUser,
    items: Vec<CartLine>,
) -> AppResult<ApiResponse<CartView>> {
    let remote = load_cart(&state.orm, user.user_id).await?;
    if !remote.is_empty() {
        return Ok(ApiResponse::success(
            "Saved cart restored",
            remote.into(),
            Some(Meta::empty()),
        ));
    }

    let local = Cart::from_lines(items);
    if !local.is_empty() {
        persist_cart(&state.orm, user.user_id, &local).await?;
    }

    Ok(ApiResponse::success(
        "Local cart kept",
        local.into(),
        Some(Meta::empty()),
    ))
}
