use pgvector::Vector;
use sqlx::{PgPool, Result};

use super::{FocalRecord, PoolRecord};

/// 查询焦点画作的嵌入
///
/// 只接受可采样的行（嵌入存在且可展示），不存在则返回 None。
pub async fn get_focal(pool: &PgPool, id: i32) -> Result<Option<FocalRecord>> {
    sqlx::query_as::<_, FocalRecord>(
        r#"
        SELECT id, embedding FROM artwork
        WHERE id = $1 AND embedding IS NOT NULL AND displayable
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 以余弦距离升序检索最近邻候选池
pub async fn nn_pool(
    pool: &PgPool,
    query: Vector,
    limit: i64,
    exclude: &[i32],
) -> Result<Vec<PoolRecord>> {
    sqlx::query_as::<_, PoolRecord>(
        r#"
        SELECT id, object_id, title, artist,
               local_image_url, small_image_url, original_image_url,
               1 - (embedding <=> $1) AS similarity
        FROM artwork
        WHERE embedding IS NOT NULL AND displayable AND id <> ALL($2)
        ORDER BY embedding <=> $1
        LIMIT $3
        "#,
    )
    .bind(query)
    .bind(exclude.to_vec())
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// 以种子化的伪随机顺序检索随机候选池
///
/// setseed 与查询必须在同一连接上执行，id 升序作为稳定的平局裁决。
pub async fn random_pool(
    pool: &PgPool,
    seed: f64,
    limit: i64,
    exclude: &[i32],
) -> Result<Vec<PoolRecord>> {
    let mut conn = pool.acquire().await?;

    sqlx::query("SELECT setseed($1)").bind(seed).execute(&mut *conn).await?;

    sqlx::query_as::<_, PoolRecord>(
        r#"
        SELECT id, object_id, title, artist,
               local_image_url, small_image_url, original_image_url,
               NULL::float8 AS similarity
        FROM artwork
        WHERE embedding IS NOT NULL AND displayable AND id <> ALL($1)
        ORDER BY random(), id ASC
        LIMIT $2
        "#,
    )
    .bind(exclude.to_vec())
    .bind(limit)
    .fetch_all(&mut *conn)
    .await
}

/// 统计画作总数与可采样数量
pub async fn get_count(pool: &PgPool) -> Result<(i64, i64)> {
    sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE embedding IS NOT NULL AND displayable)
        FROM artwork
        "#,
    )
    .fetch_one(pool)
    .await
}
