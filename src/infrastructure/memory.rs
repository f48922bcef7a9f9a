//! Process-local implementation of the repository ports.
//!
//! A transaction works on a copy of the whole state and swaps it in only when
//! the closure succeeds. The store mutex is held for the duration of the
//! transaction, so all transactions are serialized.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    DetailLine, LineUpdate, NewOrder, Order, OrderChanges, OrderLine, PricedLine,
};
use crate::domain::ports::{OrderRepository, OrderTx, ProductRepository};
use crate::domain::product::{NewProduct, Product, ProductPatch};

#[derive(Debug, Clone, Default)]
struct State {
    products: BTreeMap<i32, Product>,
    orders: BTreeMap<i32, Order>,
    lines: BTreeMap<i32, OrderLine>,
    last_product_id: i32,
    last_order_id: i32,
    last_line_id: i32,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store poisoned".to_string()))
    }
}

struct MemoryTx<'a> {
    state: &'a mut State,
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

impl OrderTx for MemoryTx<'_> {
    fn lock_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        self.find_order(id)
    }

    fn find_order(&mut self, id: i32) -> Result<Option<Order>, DomainError> {
        Ok(self.state.orders.get(&id).cloned())
    }

    fn find_product(&mut self, id: i32) -> Result<Option<Product>, DomainError> {
        Ok(self.state.products.get(&id).cloned())
    }

    fn list_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError> {
        Ok(self
            .state
            .lines
            .values()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    fn list_detail_lines(&mut self, order_id: i32) -> Result<Vec<DetailLine>, DomainError> {
        self.list_lines(order_id)?
            .into_iter()
            .map(|l| {
                let product = self.state.products.get(&l.product_id).ok_or_else(|| {
                    DomainError::Internal(format!("line {} references a missing product", l.id))
                })?;
                Ok(DetailLine {
                    id: l.id,
                    product_id: l.product_id,
                    product_name: product.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    line_total: l.line_total,
                })
            })
            .collect()
    }

    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError> {
        self.state.last_order_id += 1;
        let now = Utc::now();
        let row = Order {
            id: self.state.last_order_id,
            owner_user_id: order.owner_user_id,
            total: order.total,
            status: order.status.clone(),
            shipped_at: None,
            shipping: order.shipping.clone(),
            created_at: now,
            updated_at: now,
        };
        self.state.orders.insert(row.id, row.clone());
        Ok(row)
    }

    fn update_order(&mut self, id: i32, changes: &OrderChanges) -> Result<Order, DomainError> {
        let order = self
            .state
            .orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("order {id} not found")))?;
        let patch = &changes.patch;

        if let Some(total) = changes.total {
            order.total = total;
        }
        if let Some(status) = &patch.status {
            order.status = status.clone();
        }
        if let Some(shipped_at) = patch.shipped_at {
            order.shipped_at = Some(shipped_at);
        }
        let shipping = &mut order.shipping;
        for (field, value) in [
            (&mut shipping.city, &patch.city),
            (&mut shipping.address, &patch.address),
            (&mut shipping.recipient_tax_id, &patch.recipient_tax_id),
            (&mut shipping.company, &patch.company),
            (&mut shipping.shipping_type, &patch.shipping_type),
            (&mut shipping.payment_method, &patch.payment_method),
            (&mut shipping.document_type, &patch.document_type),
        ] {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    fn insert_lines(
        &mut self,
        order_id: i32,
        lines: &[PricedLine],
    ) -> Result<Vec<OrderLine>, DomainError> {
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(lines.len());
        for line in lines {
            self.state.last_line_id += 1;
            let row = OrderLine {
                id: self.state.last_line_id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
                created_at: now,
                updated_at: now,
            };
            self.state.lines.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    fn update_line(&mut self, update: &LineUpdate) -> Result<(), DomainError> {
        let line = self
            .state
            .lines
            .get_mut(&update.id)
            .ok_or_else(|| DomainError::Internal(format!("line {} vanished", update.id)))?;
        line.product_id = update.product_id;
        line.quantity = update.quantity;
        line.unit_price = update.unit_price;
        line.line_total = update.line_total;
        line.updated_at = Utc::now();
        Ok(())
    }

    fn delete_lines(&mut self, order_id: i32, ids: &[i32]) -> Result<usize, DomainError> {
        let before = self.state.lines.len();
        self.state
            .lines
            .retain(|id, line| !(line.order_id == order_id && ids.contains(id)));
        Ok(before - self.state.lines.len())
    }

    fn count_orders(&mut self) -> Result<i64, DomainError> {
        Ok(self.state.orders.len() as i64)
    }

    fn list_orders_paged(&mut self, offset: i64, limit: i64) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self.state.orders.values().cloned().collect();
        newest_first(&mut orders);
        Ok(orders
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    fn list_orders_for_owner(&mut self, owner_user_id: i32) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .values()
            .filter(|o| o.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }
}

impl OrderRepository for InMemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTx) -> Result<T, DomainError>,
    {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let result = f(&mut MemoryTx {
            state: &mut working,
        })?;
        *guard = working;
        Ok(result)
    }
}

impl ProductRepository for InMemoryStore {
    fn create(&self, product: &NewProduct) -> Result<Product, DomainError> {
        let mut state = self.lock()?;
        state.last_product_id += 1;
        let now = Utc::now();
        let row = Product {
            id: state.last_product_id,
            name: product.name.clone(),
            sale_price: product.sale_price,
            gross_price: product.gross_price,
            available: true,
            last_restocked: product.last_restocked,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(row.id, row.clone());
        Ok(row)
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Product>, DomainError> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.lock()?.products.values().cloned().collect())
    }

    fn update(&self, id: i32, patch: &ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut state = self.lock()?;
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            product.name = name.clone();
        }
        if let Some(price) = patch.sale_price {
            product.sale_price = price;
        }
        if let Some(price) = patch.gross_price {
            product.gross_price = price;
        }
        if let Some(date) = patch.last_restocked {
            product.last_restocked = date;
        }
        if let Some(available) = patch.available {
            product.available = available;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        if !state.products.contains_key(&id) {
            return Ok(false);
        }
        if state.lines.values().any(|l| l.product_id == id) {
            return Err(DomainError::InvalidInput(format!(
                "product {id} is referenced by existing order lines"
            )));
        }
        state.products.remove(&id);
        Ok(true)
    }
}
