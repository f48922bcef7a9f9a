//! Caller identity and the ownership/status policy applied to orders.

use super::errors::DomainError;
use super::order::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Admin,
}

impl Role {
    /// Anything other than `"admin"` is treated as a client.
    pub fn from_claim(role: &str) -> Self {
        if role.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Client
        }
    }
}

/// Authenticated caller as resolved by an `Authenticator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
}

impl Principal {
    pub fn client(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Client,
        }
    }

    pub fn admin(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "administrator role required".to_string(),
            ))
        }
    }

    /// Owners and administrators may read an order.
    pub fn ensure_can_view(&self, order: &Order) -> Result<(), DomainError> {
        if self.is_admin() || order.owner_user_id == self.user_id {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "order {} belongs to another user",
                order.id
            )))
        }
    }

    /// Clients may edit items of their own pending orders; administrators
    /// are not restricted.
    pub fn ensure_can_edit_items(&self, order: &Order) -> Result<(), DomainError> {
        if self.is_admin() {
            return Ok(());
        }
        if order.owner_user_id != self.user_id {
            return Err(DomainError::Forbidden(format!(
                "order {} belongs to another user",
                order.id
            )));
        }
        if !order.is_pending() {
            return Err(DomainError::InvalidState(format!(
                "order {} is '{}'; only pending orders can be modified",
                order.id, order.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::order::{ShippingDetails, STATUS_PENDING};

    fn order(owner: i32, status: &str) -> Order {
        Order {
            id: 10,
            owner_user_id: owner,
            total: 0,
            status: status.to_string(),
            shipped_at: None,
            shipping: ShippingDetails::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_claim_parsing() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("cliente"), Role::Client);
        assert_eq!(Role::from_claim(""), Role::Client);
    }

    #[test]
    fn owner_and_admin_can_view() {
        let o = order(1, STATUS_PENDING);
        assert!(Principal::client(1).ensure_can_view(&o).is_ok());
        assert!(Principal::admin(99).ensure_can_view(&o).is_ok());
        assert!(matches!(
            Principal::client(2).ensure_can_view(&o),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn client_cannot_edit_someone_elses_order() {
        let o = order(1, STATUS_PENDING);
        assert!(matches!(
            Principal::client(2).ensure_can_edit_items(&o),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn client_cannot_edit_non_pending_order() {
        let o = order(1, "shipped");
        assert!(matches!(
            Principal::client(1).ensure_can_edit_items(&o),
            Err(DomainError::InvalidState(_))
        ));
        assert!(Principal::admin(5).ensure_can_edit_items(&o).is_ok());
    }

    #[test]
    fn require_admin_rejects_clients() {
        assert!(Principal::admin(1).require_admin().is_ok());
        assert!(matches!(
            Principal::client(1).require_admin(),
            Err(DomainError::Forbidden(_))
        ));
    }
}
