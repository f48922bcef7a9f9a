use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::order_service::OrderService;
use crate::domain::auth::Principal;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    AdminOrderUpdate, CreateOrder, DetailLine, LineChange, NewLine, Order, OrderDetail,
    OrderPage, OrderPatch, ShippingDetails,
};
use crate::domain::ports::OrderRepository;
use crate::errors::AppError;

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Missing text fields deserialize as empty and are reported together.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateOrderRequest {
    pub city: String,
    pub address: String,
    pub recipient_tax_id: String,
    pub company: String,
    pub shipping_type: String,
    pub payment_method: String,
    pub document_type: String,
    pub items: Vec<OrderItemRequest>,
}

impl From<CreateOrderRequest> for CreateOrder {
    fn from(req: CreateOrderRequest) -> Self {
        CreateOrder {
            shipping: ShippingDetails {
                city: req.city,
                address: req.address,
                recipient_tax_id: req.recipient_tax_id,
                company: req.company,
                shipping_type: req.shipping_type,
                payment_method: req.payment_method,
                document_type: req.document_type,
            },
            items: req
                .items
                .into_iter()
                .map(|i| NewLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

/// One entry of a partial item list. Without `id` the entry is a new line;
/// with `id` and `remove` the line is deleted; with `id` alone it is
/// rewritten from `product_id` and `quantity`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemChangeRequest {
    pub id: Option<i32>,
    pub product_id: Option<i32>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub remove: bool,
}

impl TryFrom<ItemChangeRequest> for LineChange {
    type Error = DomainError;

    fn try_from(item: ItemChangeRequest) -> Result<Self, Self::Error> {
        match (item.id, item.remove) {
            (Some(line_id), true) => Ok(LineChange::Remove { line_id }),
            (id, _) => {
                let (Some(product_id), Some(quantity)) = (item.product_id, item.quantity) else {
                    return Err(DomainError::InvalidInput(match id {
                        Some(line_id) => {
                            format!("line {line_id}: product_id and quantity are required")
                        }
                        None => "new items need product_id and quantity".to_string(),
                    }));
                };
                Ok(match id {
                    Some(line_id) => LineChange::Update {
                        line_id,
                        product_id,
                        quantity,
                    },
                    None => LineChange::Insert {
                        product_id,
                        quantity,
                    },
                })
            }
        }
    }
}

fn into_changes(items: Vec<ItemChangeRequest>) -> Result<Vec<LineChange>, DomainError> {
    items.into_iter().map(LineChange::try_from).collect()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemsRequest {
    pub items: Vec<ItemChangeRequest>,
}

/// Blank text fields are ignored, except `company`, which an empty string
/// clears.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AdminUpdateOrderRequest {
    pub status: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub recipient_tax_id: Option<String>,
    pub company: Option<String>,
    pub shipping_type: Option<String>,
    pub payment_method: Option<String>,
    pub document_type: Option<String>,
    pub items: Vec<ItemChangeRequest>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<AdminUpdateOrderRequest> for AdminOrderUpdate {
    type Error = DomainError;

    fn try_from(req: AdminUpdateOrderRequest) -> Result<Self, Self::Error> {
        Ok(AdminOrderUpdate {
            patch: OrderPatch {
                status: non_blank(req.status),
                shipped_at: req.shipped_at,
                city: non_blank(req.city),
                address: non_blank(req.address),
                recipient_tax_id: non_blank(req.recipient_tax_id),
                company: req.company,
                shipping_type: non_blank(req.shipping_type),
                payment_method: non_blank(req.payment_method),
                document_type: non_blank(req.document_type),
            },
            items: into_changes(req.items)?,
        })
    }
}

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub owner_user_id: i32,
    /// Minor currency units.
    pub total: i64,
    pub status: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub city: String,
    pub address: String,
    pub recipient_tax_id: String,
    pub company: String,
    pub shipping_type: String,
    pub payment_method: String,
    pub document_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id,
            owner_user_id: o.owner_user_id,
            total: o.total,
            status: o.status,
            shipped_at: o.shipped_at,
            city: o.shipping.city,
            address: o.shipping.address,
            recipient_tax_id: o.shipping.recipient_tax_id,
            company: o.shipping.company,
            shipping_type: o.shipping.shipping_type,
            payment_method: o.shipping.payment_method,
            document_type: o.shipping.document_type,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl From<DetailLine> for OrderLineResponse {
    fn from(l: DetailLine) -> Self {
        OrderLineResponse {
            id: l.id,
            product_id: l.product_id,
            product_name: l.product_name,
            quantity: l.quantity,
            unit_price: l.unit_price,
            line_total: l.line_total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        OrderDetailResponse {
            order: d.order.into(),
            lines: d.lines.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<OrderPage> for ListOrdersResponse {
    fn from(p: OrderPage) -> Self {
        ListOrdersResponse {
            total_pages: p.total_pages(),
            has_next: p.has_next(),
            has_prev: p.has_prev(),
            total: p.total,
            page: p.page,
            page_size: p.page_size,
            items: p.orders.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places a pending order for the caller. Prices come from the catalog; the
/// order and its lines are stored in one transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderDetailResponse),
        (status = 400, description = "Invalid order"),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "orders"
)]
pub async fn create_order<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = CreateOrder::from(body.into_inner());

    let detail = web::block(move || service.create_order(&principal, request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderDetailResponse::from(detail)))
}

/// GET /orders
///
/// Administrator listing of every order, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Administrator role required"),
    ),
    tag = "orders"
)]
pub async fn list_orders<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let page = query.into_inner().page;

    let result = web::block(move || service.list_orders(&principal, page))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::from(result)))
}

/// GET /orders/mine
#[utoipa::path(
    get,
    path = "/orders/mine",
    responses(
        (status = 200, description = "Orders owned by the caller", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "orders"
)]
pub async fn list_my_orders<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_my_orders(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Returns the order together with its lines and product names.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderDetailResponse),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let detail = web::block(move || service.get_order_detail(&principal, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

/// PATCH /orders/{id}
///
/// Administrator update: order fields and, optionally, a partial item list.
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    request_body = AdminUpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderDetailResponse),
        (status = 400, description = "Invalid item list"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Order or product not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_as_admin<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
    path: web::Path<i32>,
    body: web::Json<AdminUpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let update = AdminOrderUpdate::try_from(body.into_inner())?;

    let detail = web::block(move || service.update_order_as_admin(&principal, order_id, update))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}

/// PATCH /orders/{id}/items
///
/// Reconciles a partial item list against the caller's pending order. Lines
/// not mentioned are kept as they are.
#[utoipa::path(
    patch,
    path = "/orders/{id}/items",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    request_body = UpdateItemsRequest,
    responses(
        (status = 200, description = "Items reconciled", body = OrderDetailResponse),
        (status = 400, description = "Invalid item list or order no longer pending"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order or product not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_items<R: OrderRepository>(
    service: web::Data<OrderService<R>>,
    principal: Principal,
    path: web::Path<i32>,
    body: web::Json<UpdateItemsRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let items = into_changes(body.into_inner().items)?;

    let detail = web::block(move || service.update_order_as_client(&principal, order_id, items))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderDetailResponse::from(detail)))
}
