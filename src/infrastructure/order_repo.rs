use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    DetailLine, LineUpdate, NewOrder, Order, OrderChanges, OrderLine, PricedLine,
};
use crate::domain::ports::{OrderRepository, OrderTx};
use crate::domain::product::Product;
use crate::schema::{order_lines, orders, products};

use super::models::{
    NewOrderLineRow, NewOrderRow, OrderChangeset, OrderLineChangeset, OrderLineRow, OrderRow,
    ProductRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTx) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| f(&mut PgOrderTx { conn }))
    }
}

/// Transaction handle bound to one pooled connection.
struct PgOrderTx<'a> {
    conn: &'a mut PgConnection,
}

impl OrderTx for PgOrderTx<'_> {
    fn lock_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Order::from))
    }

    fn find_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Order::from))
    }

    fn find_product(&mut self, id: i32) -> Result<Option<Product>, DomainError> {
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        let rows = order_lines::table
            .filter(order_lines::order_id.eq(order_id))
            .order(order_lines::id.asc())
            .select(OrderLineRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    fn list_detail_lines(&mut self, order_id: i32) -> Result<Vec<DetailLine>, DomainError> {
        let rows: Vec<(OrderLineRow, String)> = order_lines::table
            .inner_join(products::table)
            .filter(order_lines::order_id.eq(order_id))
            .order(order_lines::id.asc())
            .select((OrderLineRow::as_select(), products::name))
            .load(self.conn)?;

        Ok(rows
            .into_iter()
            .map(|(line, product_name)| DetailLine {
                id: line.id,
                product_id: line.product_id,
                product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect())
    }

    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError> {
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow::from(order))
            .returning(OrderRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn update_order(&mut self, id: i32, changes: &OrderChanges) -> Result<Order, DomainError> {
        let row = diesel::update(orders::table.find(id))
            .set(&OrderChangeset::new(changes, Utc::now()))
            .returning(OrderRow::as_returning())
            .get_result(self.conn)
            .optional()?;
        row.map(Order::from)
            .ok_or_else(|| DomainError::NotFound(format!("order {id} not found")))
    }

    fn insert_lines(
        &mut self,
        order_id: i32,
        lines: &[PricedLine],
    ) -> Result<Vec<OrderLine>, DomainError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let new_rows: Vec<NewOrderLineRow> = lines
            .iter()
            .map(|l| NewOrderLineRow::new(order_id, l))
            .collect();
        let rows = diesel::insert_into(order_lines::table)
            .values(&new_rows)
            .returning(OrderLineRow::as_returning())
            .get_results(self.conn)?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    fn update_line(&mut self, update: &LineUpdate) -> Result<(), DomainError> {
        let affected = diesel::update(order_lines::table.find(update.id))
            .set(&OrderLineChangeset::new(update, Utc::now()))
            .execute(self.conn)?;
        if affected == 0 {
            return Err(DomainError::Internal(format!(
                "line {} vanished during update",
                update.id
            )));
        }
        Ok(())
    }

    fn delete_lines(&mut self, order_id: i32, ids: &[i32]) -> Result<usize, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = diesel::delete(
            order_lines::table
                .filter(order_lines::order_id.eq(order_id))
                .filter(order_lines::id.eq_any(ids)),
        )
        .execute(self.conn)?;
        Ok(deleted)
    }

    fn count_orders(&mut self) -> Result<i64, DomainError> {
        Ok(orders::table.count().get_result(self.conn)?)
    }

    fn list_orders_paged(&mut self, offset: i64, limit: i64) -> Result<Vec<Order>, DomainError> {
        let rows = orders::table
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .limit(limit)
            .offset(offset)
            .load(self.conn)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn list_orders_for_owner(&mut self, owner_user_id: i32) -> Result<Vec<Order>, DomainError> {
        let rows = orders::table
            .filter(orders::owner_user_id.eq(owner_user_id))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.desc()))
            .load(self.conn)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }
}
