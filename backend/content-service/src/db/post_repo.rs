use crate::models::{NewPost, Post, PostChanges};
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, owner_id, media_url, media_key, thumbnail_url, thumbnail_key, \
     title, description, hashtags, likes, views, created_at, updated_at";

/// Insert a new post with empty likes and zero views
pub async fn insert_post(pool: &PgPool, post: &NewPost) -> Result<Post, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO posts (id, owner_id, media_url, media_key, thumbnail_url, thumbnail_key,
                           title, description, hashtags)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {POST_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Post>(&sql)
        .bind(Uuid::new_v4())
        .bind(post.owner_id)
        .bind(&post.media.url)
        .bind(&post.media.key)
        .bind(&post.media.thumbnail_url)
        .bind(&post.media.thumbnail_key)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.hashtags)
        .fetch_one(pool)
        .await
}

/// Get a post by ID
pub async fn find_post(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Partial update guarded by ownership; thumbnail follows the media swap
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    owner_id: Uuid,
    changes: &PostChanges,
) -> Result<Option<Post>, sqlx::Error> {
    let media = changes.media.as_ref();
    let sql = format!(
        r#"
        UPDATE posts
        SET title         = COALESCE($3, title),
            description   = COALESCE($4, description),
            hashtags      = COALESCE($5, hashtags),
            media_url     = COALESCE($6, media_url),
            media_key     = COALESCE($7, media_key),
            thumbnail_url = CASE WHEN $6::text IS NULL THEN thumbnail_url ELSE $8 END,
            thumbnail_key = CASE WHEN $6::text IS NULL THEN thumbnail_key ELSE $9 END,
            updated_at    = NOW()
        WHERE id = $1 AND owner_id = $2
        RETURNING {POST_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .bind(owner_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.hashtags)
        .bind(media.map(|m| m.url.as_str()))
        .bind(media.map(|m| m.key.as_str()))
        .bind(media.and_then(|m| m.thumbnail_url.as_deref()))
        .bind(media.and_then(|m| m.thumbnail_key.as_deref()))
        .fetch_optional(pool)
        .await
}

/// Delete a post owned by `owner_id`; comments cascade
pub async fn delete_post(
    pool: &PgPool,
    post_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!("DELETE FROM posts WHERE id = $1 AND owner_id = $2 RETURNING {POST_COLUMNS}");
    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// Feed page, newest first with id tie-break so pages never overlap
pub async fn list_posts(pool: &PgPool, offset: i64, limit: i64) -> Result<Vec<Post>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#
    );
    sqlx::query_as::<_, Post>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_posts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
}

/// Posts of a single owner, same order as the feed
pub async fn list_posts_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
    offset: i64,
    limit: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        WHERE owner_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    );
    sqlx::query_as::<_, Post>(&sql)
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_posts_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await
}

pub async fn increment_views(pool: &PgPool, post_id: Uuid) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views")
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Flip `user_id`'s membership in the like set in a single statement.
///
/// The row lock taken by UPDATE serialises concurrent toggles on the same post.
pub async fn toggle_like(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Vec<Uuid>>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE posts
        SET likes = CASE
                WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                ELSE array_append(likes, $2)
            END
        WHERE id = $1
        RETURNING likes
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
