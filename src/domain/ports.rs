use super::auth::Principal;
use super::errors::DomainError;
use super::order::{
    DetailLine, LineUpdate, NewOrder, Order, OrderChanges, OrderLine, PricedLine,
};
use super::product::{NewProduct, Product, ProductPatch};

/// Operations available inside one order transaction.
///
/// A handle is only ever obtained through [`OrderRepository::transaction`];
/// nothing written through it is visible to other callers until the closure
/// returns `Ok`.
pub trait OrderTx {
    /// Load an order and hold a write lock on it until the transaction ends.
    fn lock_order(&mut self, id: i32) -> Result<Option<Order>, DomainError>;
    fn find_order(&mut self, id: i32) -> Result<Option<Order>, DomainError>;
    fn find_product(&mut self, id: i32) -> Result<Option<Product>, DomainError>;
    fn list_lines(&mut self, order_id: i32) -> Result<Vec<OrderLine>, DomainError>;
    /// Lines ordered by id, each joined to its product name.
    fn list_detail_lines(&mut self, order_id: i32) -> Result<Vec<DetailLine>, DomainError>;

    fn insert_order(&mut self, order: &NewOrder) -> Result<Order, DomainError>;
    fn update_order(&mut self, id: i32, changes: &OrderChanges) -> Result<Order, DomainError>;
    fn insert_lines(
        &mut self,
        order_id: i32,
        lines: &[PricedLine],
    ) -> Result<Vec<OrderLine>, DomainError>;
    fn update_line(&mut self, line: &LineUpdate) -> Result<(), DomainError>;
    fn delete_lines(&mut self, order_id: i32, ids: &[i32]) -> Result<usize, DomainError>;

    fn count_orders(&mut self) -> Result<i64, DomainError>;
    /// Orders by `created_at` descending.
    fn list_orders_paged(&mut self, offset: i64, limit: i64) -> Result<Vec<Order>, DomainError>;
    /// Orders of one owner by `created_at` descending.
    fn list_orders_for_owner(&mut self, owner_user_id: i32) -> Result<Vec<Order>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Run `f` in a single transaction: commit if it returns `Ok`, roll back
    /// otherwise.
    fn transaction<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderTx) -> Result<T, DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, product: &NewProduct) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: i32) -> Result<Option<Product>, DomainError>;
    fn list(&self) -> Result<Vec<Product>, DomainError>;
    fn update(&self, id: i32, patch: &ProductPatch) -> Result<Option<Product>, DomainError>;
    /// `Ok(false)` when the product does not exist.
    fn delete(&self, id: i32) -> Result<bool, DomainError>;
}

/// Resolves a bearer credential into the calling principal.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, token: &str) -> Result<Principal, DomainError>;
}

/// Side channel told about placed orders. Failures never fail the order.
pub trait OrderNotifier: Send + Sync + 'static {
    fn order_placed(&self, order: &Order) -> Result<(), DomainError>;
}
