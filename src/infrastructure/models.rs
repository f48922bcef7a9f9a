use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::order::{
    LineUpdate, NewOrder, Order, OrderChanges, OrderLine, PricedLine, ShippingDetails,
};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::schema::{order_lines, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i32,
    pub owner_user_id: i32,
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

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            owner_user_id: row.owner_user_id,
            total: row.total,
            status: row.status,
            shipped_at: row.shipped_at,
            shipping: ShippingDetails {
                city: row.city,
                address: row.address,
                recipient_tax_id: row.recipient_tax_id,
                company: row.company,
                shipping_type: row.shipping_type,
                payment_method: row.payment_method,
                document_type: row.document_type,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub owner_user_id: i32,
    pub total: i64,
    pub status: &'a str,
    pub city: &'a str,
    pub address: &'a str,
    pub recipient_tax_id: &'a str,
    pub company: &'a str,
    pub shipping_type: &'a str,
    pub payment_method: &'a str,
    pub document_type: &'a str,
}

impl<'a> From<&'a NewOrder> for NewOrderRow<'a> {
    fn from(order: &'a NewOrder) -> Self {
        NewOrderRow {
            owner_user_id: order.owner_user_id,
            total: order.total,
            status: &order.status,
            city: &order.shipping.city,
            address: &order.shipping.address,
            recipient_tax_id: &order.shipping.recipient_tax_id,
            company: &order.shipping.company,
            shipping_type: &order.shipping.shipping_type,
            payment_method: &order.shipping.payment_method,
            document_type: &order.shipping.document_type,
        }
    }
}

/// `None` fields are left out of the UPDATE.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderChangeset<'a> {
    pub total: Option<i64>,
    pub status: Option<&'a str>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub city: Option<&'a str>,
    pub address: Option<&'a str>,
    pub recipient_tax_id: Option<&'a str>,
    pub company: Option<&'a str>,
    pub shipping_type: Option<&'a str>,
    pub payment_method: Option<&'a str>,
    pub document_type: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> OrderChangeset<'a> {
    pub fn new(changes: &'a OrderChanges, now: DateTime<Utc>) -> Self {
        let patch = &changes.patch;
        OrderChangeset {
            total: changes.total,
            status: patch.status.as_deref(),
            shipped_at: patch.shipped_at,
            city: patch.city.as_deref(),
            address: patch.address.as_deref(),
            recipient_tax_id: patch.recipient_tax_id.as_deref(),
            company: patch.company.as_deref(),
            shipping_type: patch.shipping_type.as_deref(),
            payment_method: patch.payment_method.as_deref(),
            document_type: patch.document_type.as_deref(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

impl NewOrderLineRow {
    pub fn new(order_id: i32, line: &PricedLine) -> Self {
        NewOrderLineRow {
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = order_lines)]
pub struct OrderLineChangeset {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub updated_at: DateTime<Utc>,
}

impl OrderLineChangeset {
    pub fn new(update: &LineUpdate, now: DateTime<Utc>) -> Self {
        OrderLineChangeset {
            product_id: update.product_id,
            quantity: update.quantity,
            unit_price: update.unit_price,
            line_total: update.line_total,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub sale_price: i64,
    pub gross_price: i64,
    pub available: bool,
    pub last_restocked: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            sale_price: row.sale_price,
            gross_price: row.gross_price,
            available: row.available,
            last_restocked: row.last_restocked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow<'a> {
    pub name: &'a str,
    pub sale_price: i64,
    pub gross_price: i64,
    pub available: bool,
    pub last_restocked: NaiveDate,
}

impl<'a> From<&'a NewProduct> for NewProductRow<'a> {
    fn from(product: &'a NewProduct) -> Self {
        NewProductRow {
            name: &product.name,
            sale_price: product.sale_price,
            gross_price: product.gross_price,
            available: true,
            last_restocked: product.last_restocked,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChangeset<'a> {
    pub name: Option<&'a str>,
    pub sale_price: Option<i64>,
    pub gross_price: Option<i64>,
    pub available: Option<bool>,
    pub last_restocked: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> ProductChangeset<'a> {
    pub fn new(patch: &'a ProductPatch, now: DateTime<Utc>) -> Self {
        ProductChangeset {
            name: patch.name.as_deref(),
            sale_price: patch.sale_price,
            gross_price: patch.gross_price,
            available: patch.available,
            last_restocked: patch.last_restocked,
            updated_at: now,
        }
    }
}
