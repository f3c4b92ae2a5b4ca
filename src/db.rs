use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::error::AppError;

pub async fn init_pool(database_url: &str, max_size: usize) -> Result<Pool, AppError> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e| AppError::Config(format!("DATABASE_URL parse: {e}")))?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    let pool = Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| AppError::StartServer(format!("build pool: {e}")))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    client
        .batch_execute(include_str!("../migrations/0001_init.sql"))
        .await
        .map_err(|e| AppError::StartServer(format!("migrations: {e}")))?;
    tracing::info!("database schema up to date");
    Ok(())
}
