pub mod auth;
pub mod orders;
pub mod products;

use actix_web::web;

use crate::application::catalog_service::CatalogService;
use crate::application::order_service::OrderService;
use crate::domain::ports::{Authenticator, OrderRepository, ProductRepository};
use crate::errors::AppError;

/// Registers shared state, extractor error shapes and every route.
pub fn configure<R, P>(
    order_service: web::Data<OrderService<R>>,
    catalog_service: web::Data<CatalogService<P>>,
    authenticator: web::Data<dyn Authenticator>,
) -> impl FnOnce(&mut web::ServiceConfig)
where
    R: OrderRepository,
    P: ProductRepository,
{
    move |cfg| {
        cfg.app_data(order_service)
            .app_data(catalog_service)
            .app_data(authenticator)
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::BadRequest(format!("invalid JSON body: {err}")).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::BadRequest(format!("invalid query string: {err}")).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                AppError::BadRequest(format!("invalid path: {err}")).into()
            }))
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::create_order::<R>))
                    .route("", web::get().to(orders::list_orders::<R>))
                    .route("/mine", web::get().to(orders::list_my_orders::<R>))
                    .route("/{id}", web::get().to(orders::get_order::<R>))
                    .route("/{id}", web::patch().to(orders::update_order_as_admin::<R>))
                    .route("/{id}/items", web::patch().to(orders::update_order_items::<R>)),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(products::create_product::<P>))
                    .route("", web::get().to(products::list_products::<P>))
                    .route("/{id}", web::get().to(products::get_product::<P>))
                    .route("/{id}", web::put().to(products::update_product::<P>))
                    .route("/{id}", web::delete().to(products::delete_product::<P>)),
            );
    }
}
