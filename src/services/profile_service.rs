use crate::{
    db::DbPool,
    dto::profile::UpdateProfileRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
};

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;

    match profile {
        Some(p) => Ok(ApiResponse::success("OK", p, None)),
        None => Err(AppError::NotFound),
    }
}

/// Merge the provided fields into the stored profile; absent fields are
/// left untouched.
pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let profile: Option<Profile> = sqlx::query_as(
        r#"
        UPDATE profiles
        SET full_name = COALESCE($2, full_name),
            company_name = COALESCE($3, company_name),
            phone = COALESCE($4, phone),
            address = COALESCE($5, address),
            city = COALESCE($6, city),
            state = COALESCE($7, state),
            zip_code = COALESCE($8, zip_code),
            country = COALESCE($9, country),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.full_name)
    .bind(payload.company_name)
    .bind(payload.phone)
    .bind(payload.address)
    .bind(payload.city)
    .bind(payload.state)
    .bind(payload.zip_code)
    .bind(payload.country)
    .fetch_optional(pool)
    .await?;

    match profile {
        Some(p) => Ok(ApiResponse::success(
            "Profile updated",
            p,
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}
