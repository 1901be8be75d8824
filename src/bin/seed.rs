use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use nursery_storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;
    let user_id = ensure_user(&pool, "demo@nasholi.example", "grower123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let id = Uuid::new_v4();
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => {
            sqlx::query(
                r#"
                INSERT INTO profiles (id, email, full_name)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(email)
            .bind("Demo Grower")
            .execute(pool)
            .await?;
            id
        }
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email}");
    Ok(user_id)
}

/// The storefront catalog: three nursery lines with display tags and
/// per-plant pricing in cents.
async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            1,
            "Cavendish Banana (G9)",
            "Ready for Dispatch",
            "bg-emerald-500",
            250,
            "/plant",
            "products/banana.jpg",
        ),
        (
            2,
            "Aloe Vera Offshoots",
            "Limited Stock",
            "bg-amber-500",
            175,
            "/plant",
            "products/aloe.jpg",
        ),
        (
            3,
            "Strawberry Runners",
            "New Arrival",
            "bg-lime-500",
            95,
            "/plant",
            "products/strawberry.jpg",
        ),
    ];

    for (id, title, tag, tag_color, price_cents, price_unit, image) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, tag, tag_color, price_cents, price_unit, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(tag)
        .bind(tag_color)
        .bind(price_cents as i64)
        .bind(price_unit)
        .bind(image)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
