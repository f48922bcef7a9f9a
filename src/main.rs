use std::io;

use dotenvy::dotenv;
use quote_orders::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;
    log::debug!("loaded {:?}", config);

    let pool = create_pool(&config.database_url).map_err(|e| {
        log::error!("failed to create database pool: {}", e);
        io::Error::other(e)
    })?;
    run_migrations(&pool).map_err(|e| {
        log::error!("failed to run database migrations: {}", e);
        io::Error::other(e)
    })?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, &config)?.await
}
