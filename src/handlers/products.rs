use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::catalog_service::CatalogService;
use crate::domain::auth::Principal;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub sale_price: i64,
    pub gross_price: i64,
    pub last_restocked: NaiveDate,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name,
            sale_price: req.sale_price,
            gross_price: req.gross_price,
            last_restocked: req.last_restocked,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sale_price: Option<i64>,
    pub gross_price: Option<i64>,
    pub last_restocked: Option<NaiveDate>,
    pub available: Option<bool>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            sale_price: req.sale_price,
            gross_price: req.gross_price,
            last_restocked: req.last_restocked,
            available: req.available,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub sale_price: i64,
    pub gross_price: i64,
    pub available: bool,
    pub last_restocked: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            sale_price: p.sale_price,
            gross_price: p.gross_price,
            available: p.available,
            last_restocked: p.last_restocked,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Administrator role required"),
    ),
    tag = "products"
)]
pub async fn create_product<P: ProductRepository>(
    catalog: web::Data<CatalogService<P>>,
    principal: Principal,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = NewProduct::from(body.into_inner());

    let created = web::block(move || catalog.create_product(&principal, product))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Every product in the catalog", body = [ProductResponse]),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "products"
)]
pub async fn list_products<P: ProductRepository>(
    catalog: web::Data<CatalogService<P>>,
    _principal: Principal,
) -> Result<HttpResponse, AppError> {
    let products = web::block(move || catalog.list_products())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product<P: ProductRepository>(
    catalog: web::Data<CatalogService<P>>,
    _principal: Principal,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let product = web::block(move || catalog.get_product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PUT /products/{id}
///
/// Partial update; omitted fields keep their value.
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product<P: ProductRepository>(
    catalog: web::Data<CatalogService<P>>,
    principal: Principal,
    path: web::Path<i32>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let patch = ProductPatch::from(body.into_inner());

    let updated = web::block(move || catalog.update_product(&principal, id, patch))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(updated)))
}

/// DELETE /products/{id}
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product id"),
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Product is referenced by orders"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product<P: ProductRepository>(
    catalog: web::Data<CatalogService<P>>,
    principal: Principal,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || catalog.delete_product(&principal, id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
