use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::OrderNotifier;

/// Records placed orders in the application log.
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn order_placed(&self, order: &Order) -> Result<(), DomainError> {
        log::info!(
            "order {} placed by user {} for {} ({})",
            order.id,
            order.owner_user_id,
            order.total,
            order.shipping.city
        );
        Ok(())
    }
}
