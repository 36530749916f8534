use crate::models::{NewUser, ProfileChanges, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, avatar_url, avatar_key, bio, created_at";

/// Insert a user; a taken email surfaces as a unique violation
pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO users (id, name, email, password_hash, bio, avatar_url, avatar_key)
        VALUES ($1, $2, LOWER($3), $4, $5, $6, $7)
        RETURNING {USER_COLUMNS}
        "#
    );
    let avatar = user.avatar.as_ref();
    sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.bio)
        .bind(avatar.map(|a| a.url.as_str()))
        .bind(avatar.map(|a| a.key.as_str()))
        .fetch_one(pool)
        .await
}

pub async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)");
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Batch lookup used when populating authors
pub async fn find_users_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
    sqlx::query_as::<_, User>(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await
}

/// Apply non-empty profile fields; the avatar replaces url and key together
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> Result<Option<User>, sqlx::Error> {
    let avatar = changes.avatar.as_ref();
    let sql = format!(
        r#"
        UPDATE users
        SET name       = COALESCE($2, name),
            bio        = COALESCE($3, bio),
            avatar_url = COALESCE($4, avatar_url),
            avatar_key = COALESCE($5, avatar_key)
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .bind(&changes.name)
        .bind(&changes.bio)
        .bind(avatar.map(|a| a.url.as_str()))
        .bind(avatar.map(|a| a.key.as_str()))
        .fetch_optional(pool)
        .await
}
