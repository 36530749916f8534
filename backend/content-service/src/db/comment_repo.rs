use crate::models::Comment;
use sqlx::PgPool;
use uuid::Uuid;

/// Append a comment if the post exists, in one statement
pub async fn append_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO post_comments (id, post_id, author_id, text)
        SELECT $4, id, $2, $3 FROM posts WHERE id = $1
        RETURNING id, post_id, author_id, text, created_at
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .bind(Uuid::new_v4())
    .fetch_optional(pool)
    .await
}

/// Get a single comment of a post
pub async fn find_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, text, created_at
        FROM post_comments
        WHERE id = $1 AND post_id = $2
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Delete a comment written by `author_id`; returns whether a row went away
pub async fn delete_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment_id: Uuid,
    author_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM post_comments WHERE id = $1 AND post_id = $2 AND author_id = $3",
    )
    .bind(comment_id)
    .bind(post_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All comments of a post, newest first
pub async fn list_comments(pool: &PgPool, post_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, text, created_at
        FROM post_comments
        WHERE post_id = $1
        ORDER BY seq DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Comments of several posts at once (feed pages), newest first per post
pub async fn list_comments_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<Vec<Comment>, sqlx::Error> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, text, created_at
        FROM post_comments
        WHERE post_id = ANY($1)
        ORDER BY post_id, seq DESC
        "#,
    )
    .bind(post_ids)
    .fetch_all(pool)
    .await
}
