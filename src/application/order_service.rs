use std::sync::Arc;

use crate::config::DEFAULT_ORDERS_PAGE_SIZE;
use crate::domain::auth::Principal;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    AdminOrderUpdate, CreateOrder, LineChange, NewOrder, Order, OrderChanges, OrderDetail,
    OrderPage, OrderPatch, STATUS_PENDING,
};
use crate::domain::ports::{OrderNotifier, OrderRepository, OrderTx};
use crate::domain::reconcile::{plan_reconciliation, price_new_order};

pub struct OrderService<R> {
    repo: R,
    notifier: Arc<dyn OrderNotifier>,
    page_size: i64,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self {
            repo,
            notifier,
            page_size: DEFAULT_ORDERS_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Place a new pending order owned by the caller. Either the order and
    /// every line are stored, or nothing is.
    pub fn create_order(
        &self,
        caller: &Principal,
        request: CreateOrder,
    ) -> Result<OrderDetail, DomainError> {
        request.shipping.validate()?;

        let detail = self.repo.transaction(|tx| {
            let (lines, total) =
                price_new_order(&request.items, caller, |id| tx.find_product(id))?;

            let order = tx.insert_order(&NewOrder {
                owner_user_id: caller.user_id,
                total,
                status: STATUS_PENDING.to_string(),
                shipping: request.shipping.clone(),
            })?;
            tx.insert_lines(order.id, &lines)?;

            let lines = tx.list_detail_lines(order.id)?;
            Ok(OrderDetail { order, lines })
        })?;

        log::info!(
            "order {} placed by user {} with {} line(s), total {}",
            detail.order.id,
            caller.user_id,
            detail.lines.len(),
            detail.order.total
        );

        if let Err(e) = self.notifier.order_placed(&detail.order) {
            log::warn!("order {} notification failed: {}", detail.order.id, e);
        }

        Ok(detail)
    }

    /// Admin listing, newest first. Pages are 1-based; anything below 1 is
    /// treated as the first page.
    pub fn list_orders(&self, caller: &Principal, page: i64) -> Result<OrderPage, DomainError> {
        caller.require_admin()?;

        let page = page.max(1);
        let page_size = self.page_size;
        let offset = (page - 1).saturating_mul(page_size);

        self.repo.transaction(|tx| {
            let total = tx.count_orders()?;
            let orders = tx.list_orders_paged(offset, page_size)?;
            Ok(OrderPage {
                orders,
                total,
                page,
                page_size,
            })
        })
    }

    pub fn list_my_orders(&self, caller: &Principal) -> Result<Vec<Order>, DomainError> {
        self.repo
            .transaction(|tx| tx.list_orders_for_owner(caller.user_id))
    }

    pub fn get_order_detail(
        &self,
        caller: &Principal,
        order_id: i32,
    ) -> Result<OrderDetail, DomainError> {
        self.repo.transaction(|tx| {
            let order = tx
                .find_order(order_id)?
                .ok_or_else(|| order_not_found(order_id))?;
            caller.ensure_can_view(&order)?;
            let lines = tx.list_detail_lines(order_id)?;
            Ok(OrderDetail { order, lines })
        })
    }

    /// Reconcile the caller's item list against the stored lines. Clients
    /// are limited to their own pending orders.
    pub fn update_order_as_client(
        &self,
        caller: &Principal,
        order_id: i32,
        items: Vec<LineChange>,
    ) -> Result<OrderDetail, DomainError> {
        let detail = self.repo.transaction(|tx| {
            let order = tx
                .lock_order(order_id)?
                .ok_or_else(|| order_not_found(order_id))?;
            if let Err(e) = caller.ensure_can_edit_items(&order) {
                log::debug!(
                    "user {} denied item update on order {}: {}",
                    caller.user_id,
                    order_id,
                    e
                );
                return Err(e);
            }

            let total = reconcile_lines(tx, caller, order_id, &items)?;
            let order = tx.update_order(
                order_id,
                &OrderChanges {
                    patch: OrderPatch::default(),
                    total: Some(total),
                },
            )?;
            let lines = tx.list_detail_lines(order_id)?;
            Ok(OrderDetail { order, lines })
        })?;

        log::info!(
            "order {} items reconciled by user {}, total {}",
            order_id,
            caller.user_id,
            detail.order.total
        );
        Ok(detail)
    }

    /// Patch order fields and, when items are given, reconcile them, all in
    /// one transaction.
    pub fn update_order_as_admin(
        &self,
        caller: &Principal,
        order_id: i32,
        update: AdminOrderUpdate,
    ) -> Result<OrderDetail, DomainError> {
        caller.require_admin()?;
        update.patch.validate()?;

        let detail = self.repo.transaction(|tx| {
            tx.lock_order(order_id)?
                .ok_or_else(|| order_not_found(order_id))?;

            let total = if update.items.is_empty() {
                None
            } else {
                Some(reconcile_lines(tx, caller, order_id, &update.items)?)
            };

            let order = tx.update_order(
                order_id,
                &OrderChanges {
                    patch: update.patch.clone(),
                    total,
                },
            )?;
            let lines = tx.list_detail_lines(order_id)?;
            Ok(OrderDetail { order, lines })
        })?;

        log::info!(
            "order {} updated by admin {}, status '{}', total {}",
            order_id,
            caller.user_id,
            detail.order.status,
            detail.order.total
        );
        Ok(detail)
    }
}

/// Plan against the locked lines, then delete, update and insert. Returns
/// the new order total; the caller writes it.
fn reconcile_lines(
    tx: &mut dyn OrderTx,
    caller: &Principal,
    order_id: i32,
    items: &[LineChange],
) -> Result<i64, DomainError> {
    let current = tx.list_lines(order_id)?;
    let plan = plan_reconciliation(&current, items, caller, |id| tx.find_product(id))?;

    if !plan.deletions.is_empty() {
        tx.delete_lines(order_id, &plan.deletions)?;
    }
    for update in &plan.updates {
        tx.update_line(update)?;
    }
    if !plan.insertions.is_empty() {
        tx.insert_lines(order_id, &plan.insertions)?;
    }

    log::debug!(
        "order {}: {} deleted, {} updated, {} inserted",
        order_id,
        plan.deletions.len(),
        plan.updates.len(),
        plan.insertions.len()
    );
    Ok(plan.new_total)
}

fn order_not_found(order_id: i32) -> DomainError {
    DomainError::NotFound(format!("order {order_id} not found"))
}
