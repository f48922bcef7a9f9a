pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::catalog_service::CatalogService;
use crate::application::order_service::OrderService;
use crate::domain::ports::Authenticator;
use crate::infrastructure::jwt::JwtAuthenticator;
use crate::infrastructure::notifier::LogNotifier;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselProductRepository;
use crate::openapi::ApiDoc;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Build and return an actix-web `Server` bound to the configured address.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: &AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let order_service = web::Data::new(
        OrderService::new(DieselOrderRepository::new(pool.clone()), Arc::new(LogNotifier))
            .with_page_size(config.orders_page_size),
    );
    let catalog_service = web::Data::new(CatalogService::new(DieselProductRepository::new(pool)));
    let authenticator: web::Data<dyn Authenticator> = web::Data::from(
        Arc::new(JwtAuthenticator::new(&config.jwt_secret)) as Arc<dyn Authenticator>,
    );
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(handlers::configure(
                order_service.clone(),
                catalog_service.clone(),
                authenticator.clone(),
            ))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
