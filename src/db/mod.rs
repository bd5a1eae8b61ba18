use log::info;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod crud;
pub mod model;

pub use model::*;

pub type Database = PgPool;

pub async fn init_db(url: &str) -> Result<Database, sqlx::Error> {
    info!("初始化数据库连接");

    let pool = PgPoolOptions::new().max_connections(16).connect(url).await?;

    info!("检查数据库迁移");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
