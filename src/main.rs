use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rideboard::auth::TokenAuthority;
use rideboard::config::Config;
use rideboard::db::PgPool;
use rideboard::engine::Engine;
use rideboard::error::Error;
use rideboard::{server, sweeper};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let PgPool(pool) = PgPool::new(&config.database_url, config.database_max_connections).await?;

    let engine = Engine::new(pool)?;
    engine.migrate().await?;

    let engine = Arc::new(engine);

    if let Some(every) = config.expiry_sweep_interval {
        sweeper::spawn(engine.clone(), every);
    }

    let authority = TokenAuthority::new(config.jwt_secret.as_bytes());

    server::serve(engine, authority, config.bind_addr).await
}
